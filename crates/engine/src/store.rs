// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! In-memory job store.
//!
//! The store exclusively owns every [`JobRecord`]; consumers receive cloned
//! snapshots. Live (non-terminal) jobs sit in a map; terminal jobs move to a
//! bounded history ring via [`JobStore::archive`]. Lifetime counters survive
//! ring eviction so stats stay accurate.

use std::collections::{HashMap, VecDeque};
use sweep_core::job::{JobId, JobRecord, JobStatus};

/// Aggregate job counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StoreStats {
    pub total: u64,
    pub queued: u64,
    pub running: u64,
    pub paused: u64,
    pub completed: u64,
    pub failed: u64,
    pub cancelled: u64,
}

/// Query filter for [`JobStore::list`].
#[derive(Debug, Clone, Default)]
pub struct JobFilter {
    pub status: Option<JobStatus>,
    pub kind: Option<String>,
    pub limit: Option<usize>,
}

/// Map of live jobs plus a bounded ring of recent terminal jobs.
pub struct JobStore {
    live: HashMap<JobId, JobRecord>,
    history: VecDeque<JobRecord>,
    history_cap: usize,
    created_total: u64,
    completed_total: u64,
    failed_total: u64,
    cancelled_total: u64,
}

impl JobStore {
    pub fn new(history_cap: usize) -> Self {
        Self {
            live: HashMap::new(),
            history: VecDeque::new(),
            history_cap: history_cap.max(1),
            created_total: 0,
            completed_total: 0,
            failed_total: 0,
            cancelled_total: 0,
        }
    }

    /// Insert a fresh record. Rejects id reuse.
    pub fn insert(&mut self, record: JobRecord) -> Result<(), JobId> {
        if self.live.contains_key(&record.id) {
            return Err(record.id);
        }
        self.created_total += 1;
        self.live.insert(record.id.clone(), record);
        Ok(())
    }

    /// Snapshot of a job, live or archived.
    pub fn get(&self, id: &JobId) -> Option<JobRecord> {
        if let Some(record) = self.live.get(id) {
            return Some(record.clone());
        }
        self.history.iter().rev().find(|r| &r.id == id).cloned()
    }

    pub fn contains_live(&self, id: &JobId) -> bool {
        self.live.contains_key(id)
    }

    /// Apply a mutator to a live record. Returns `None` if absent.
    pub fn update<R>(&mut self, id: &JobId, mutate: impl FnOnce(&mut JobRecord) -> R) -> Option<R> {
        self.live.get_mut(id).map(mutate)
    }

    /// Move a terminal live record into the history ring.
    ///
    /// Non-terminal records stay put (archiving a running job would lose the
    /// single source of truth mid-flight).
    pub fn archive(&mut self, id: &JobId) -> bool {
        let terminal = self
            .live
            .get(id)
            .map(|r| r.status.is_terminal())
            .unwrap_or(false);
        if !terminal {
            return false;
        }
        if let Some(record) = self.live.remove(id) {
            match record.status {
                JobStatus::Completed => self.completed_total += 1,
                JobStatus::Failed => self.failed_total += 1,
                JobStatus::Cancelled => self.cancelled_total += 1,
                _ => {}
            }
            if self.history.len() == self.history_cap {
                self.history.pop_front();
            }
            self.history.push_back(record);
        }
        true
    }

    /// Matching snapshots, newest first.
    pub fn list(&self, filter: &JobFilter) -> Vec<JobRecord> {
        let matches = |record: &JobRecord| {
            filter.status.map(|s| record.status == s).unwrap_or(true)
                && filter
                    .kind
                    .as_deref()
                    .map(|k| record.kind == k)
                    .unwrap_or(true)
        };
        let mut records: Vec<JobRecord> = self
            .live
            .values()
            .chain(self.history.iter())
            .filter(|r| matches(r))
            .cloned()
            .collect();
        records.sort_by(|a, b| {
            b.created_at_ms
                .cmp(&a.created_at_ms)
                .then_with(|| b.id.as_str().cmp(a.id.as_str()))
        });
        if let Some(limit) = filter.limit {
            records.truncate(limit);
        }
        records
    }

    /// Live jobs of a kind in the given status.
    pub fn count_live(&self, kind: &str, status: JobStatus) -> usize {
        self.live
            .values()
            .filter(|r| r.kind == kind && r.status == status)
            .count()
    }

    /// Non-terminal jobs spawned by the named cron entry.
    pub fn count_active_cron_jobs(&self, cron_name: &str) -> usize {
        self.live
            .values()
            .filter(|r| r.cron.as_deref() == Some(cron_name) && !r.is_terminal())
            .count()
    }

    /// Queued jobs spawned by the named cron entry.
    pub fn count_queued_cron_jobs(&self, cron_name: &str) -> usize {
        self.live
            .values()
            .filter(|r| {
                r.cron.as_deref() == Some(cron_name)
                    && matches!(r.status, JobStatus::Queued | JobStatus::Paused)
            })
            .count()
    }

    pub fn stats(&self) -> StoreStats {
        let mut stats = StoreStats {
            total: self.created_total,
            completed: self.completed_total,
            failed: self.failed_total,
            cancelled: self.cancelled_total,
            ..StoreStats::default()
        };
        for record in self.live.values() {
            match record.status {
                JobStatus::Queued => stats.queued += 1,
                JobStatus::Running => stats.running += 1,
                JobStatus::Paused => stats.paused += 1,
                // Terminal records awaiting archive
                JobStatus::Completed => stats.completed += 1,
                JobStatus::Failed => stats.failed += 1,
                JobStatus::Cancelled => stats.cancelled += 1,
            }
        }
        stats
    }

    /// Stats scoped to one job kind (live map plus the history ring; jobs
    /// evicted from the ring fall out of these counts).
    pub fn stats_for_kind(&self, kind: &str) -> StoreStats {
        let mut stats = StoreStats::default();
        for record in self.live.values().chain(self.history.iter()) {
            if record.kind != kind {
                continue;
            }
            stats.total += 1;
            match record.status {
                JobStatus::Queued => stats.queued += 1,
                JobStatus::Running => stats.running += 1,
                JobStatus::Paused => stats.paused += 1,
                JobStatus::Completed => stats.completed += 1,
                JobStatus::Failed => stats.failed += 1,
                JobStatus::Cancelled => stats.cancelled += 1,
            }
        }
        stats
    }

    pub fn live_len(&self) -> usize {
        self.live.len()
    }

    pub fn history_len(&self) -> usize {
        self.history.len()
    }
}

#[cfg(test)]
#[path = "store_tests.rs"]
mod tests;
