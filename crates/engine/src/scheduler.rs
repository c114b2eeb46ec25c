// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Bounded-concurrency dispatcher state.
//!
//! Owns the FIFO ready queue, the active set, pause flags at process/kind/
//! job granularity, and the timer table for delayed work (retry re-enqueues,
//! cron fires, ledger sweeps). The scheduler is pure state; the orchestrator
//! drives it under the engine mutex and performs the actual spawning.

use crate::timer::TimerId;
use std::collections::{HashMap, HashSet, VecDeque};
use std::time::{Duration, Instant};
use sweep_core::JobId;

/// One waiting job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueEntry {
    pub job_id: JobId,
    pub kind: String,
    pub enqueued_at_ms: u64,
    /// Monotonic insertion sequence; the FIFO tie-break.
    pub seq: u64,
}

/// Ready-queue, admission control, and timers.
pub struct Scheduler {
    ready: VecDeque<QueueEntry>,
    seq: u64,
    active: HashSet<JobId>,
    active_by_kind: HashMap<String, usize>,
    max_concurrent: usize,
    kind_caps: HashMap<String, usize>,
    paused: bool,
    paused_kinds: HashSet<String>,
    paused_jobs: HashSet<JobId>,
    timers: HashMap<TimerId, Instant>,
}

impl Scheduler {
    pub fn new(max_concurrent: usize) -> Self {
        Self {
            ready: VecDeque::new(),
            seq: 0,
            active: HashSet::new(),
            active_by_kind: HashMap::new(),
            max_concurrent: max_concurrent.max(1),
            kind_caps: HashMap::new(),
            paused: false,
            paused_kinds: HashSet::new(),
            paused_jobs: HashSet::new(),
            timers: HashMap::new(),
        }
    }

    /// Cap concurrent jobs of one kind below the global limit.
    pub fn set_kind_cap(&mut self, kind: impl Into<String>, cap: usize) {
        self.kind_caps.insert(kind.into(), cap.max(1));
    }

    /// Append to the queue tail. Strictly FIFO on `enqueued_at_ms`, with the
    /// insertion sequence as the tie-break.
    pub fn enqueue(&mut self, job_id: JobId, kind: impl Into<String>, enqueued_at_ms: u64) {
        self.seq += 1;
        self.ready.push_back(QueueEntry {
            job_id,
            kind: kind.into(),
            enqueued_at_ms,
            seq: self.seq,
        });
    }

    /// Remove a queued entry (cancellation). Returns true when found.
    pub fn remove(&mut self, job_id: &JobId) -> bool {
        let before = self.ready.len();
        self.ready.retain(|e| &e.job_id != job_id);
        self.paused_jobs.remove(job_id);
        self.ready.len() != before
    }

    /// Pop the first admissible entry and mark it active.
    ///
    /// Paused entries (job- or kind-level) keep their queue position and are
    /// skipped; FIFO order is preserved among admissible entries.
    pub fn pop_ready(&mut self) -> Option<QueueEntry> {
        if self.paused || self.active.len() >= self.max_concurrent {
            return None;
        }
        let pos = self.ready.iter().position(|e| {
            !self.paused_jobs.contains(&e.job_id)
                && !self.paused_kinds.contains(&e.kind)
                && self.kind_has_capacity(&e.kind)
        })?;
        let entry = self.ready.remove(pos)?;
        self.active.insert(entry.job_id.clone());
        *self.active_by_kind.entry(entry.kind.clone()).or_insert(0) += 1;
        Some(entry)
    }

    /// Release an active slot after the attempt reported back.
    pub fn finish(&mut self, job_id: &JobId, kind: &str) {
        if self.active.remove(job_id) {
            if let Some(count) = self.active_by_kind.get_mut(kind) {
                *count = count.saturating_sub(1);
            }
        }
    }

    fn kind_has_capacity(&self, kind: &str) -> bool {
        match self.kind_caps.get(kind) {
            Some(cap) => self.active_by_kind.get(kind).copied().unwrap_or(0) < *cap,
            None => true,
        }
    }

    // ── pause flags ─────────────────────────────────────────────────────

    pub fn pause_all(&mut self) {
        self.paused = true;
    }

    pub fn resume_all(&mut self) {
        self.paused = false;
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn pause_kind(&mut self, kind: &str) {
        self.paused_kinds.insert(kind.to_string());
    }

    pub fn resume_kind(&mut self, kind: &str) {
        self.paused_kinds.remove(kind);
    }

    pub fn pause_job(&mut self, job_id: &JobId) {
        self.paused_jobs.insert(job_id.clone());
    }

    pub fn resume_job(&mut self, job_id: &JobId) {
        self.paused_jobs.remove(job_id);
    }

    // ── introspection ───────────────────────────────────────────────────

    pub fn queued_len(&self) -> usize {
        self.ready.len()
    }

    pub fn active_len(&self) -> usize {
        self.active.len()
    }

    pub fn is_active(&self, job_id: &JobId) -> bool {
        self.active.contains(job_id)
    }

    pub fn is_queued(&self, job_id: &JobId) -> bool {
        self.ready.iter().any(|e| &e.job_id == job_id)
    }

    // ── timers ──────────────────────────────────────────────────────────

    pub fn set_timer(&mut self, id: TimerId, delay: Duration, now: Instant) {
        self.timers.insert(id, now + delay);
    }

    pub fn cancel_timer(&mut self, id: &TimerId) -> bool {
        self.timers.remove(id).is_some()
    }

    pub fn has_timers(&self) -> bool {
        !self.timers.is_empty()
    }

    /// Earliest pending deadline.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.timers.values().min().copied()
    }

    /// Remove and return all due timers, earliest first.
    pub fn fired_timers(&mut self, now: Instant) -> Vec<TimerId> {
        let mut due: Vec<(TimerId, Instant)> = self
            .timers
            .iter()
            .filter(|(_, deadline)| **deadline <= now)
            .map(|(id, deadline)| (id.clone(), *deadline))
            .collect();
        due.sort_by_key(|(_, deadline)| *deadline);
        for (id, _) in &due {
            self.timers.remove(id);
        }
        due.into_iter().map(|(id, _)| id).collect()
    }
}

#[cfg(test)]
#[path = "scheduler_tests.rs"]
mod tests;
