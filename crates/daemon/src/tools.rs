// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Tool-surface dispatcher.
//!
//! Routes parsed [`ToolRequest`]s to the control surface and the scan
//! cache; every tool returns a JSON summary or the uniform error body.

use crate::pipelines::{MULTI_SCAN_KIND, SCAN_KIND};
use std::path::Path;
use sweep_core::{Clock, Event, Fingerprint, JobId, SystemClock};
use sweep_engine::{JobFilter, ScanCache, SystemOrchestrator};
use sweep_wire::{
    ErrorBody, JobSnapshot, JobsQuery, ScanCreated, StatsBody, ToolCall, ToolRequest,
};

/// Bridges the MCP-style tool caller to the orchestrator.
pub struct ToolDispatcher {
    orchestrator: SystemOrchestrator,
    cache: ScanCache,
    clock: SystemClock,
}

impl ToolDispatcher {
    pub fn new(orchestrator: SystemOrchestrator, cache: ScanCache) -> Self {
        Self {
            orchestrator,
            cache,
            clock: SystemClock,
        }
    }

    /// Execute one tool call end to end.
    pub fn dispatch(&self, call: &ToolCall) -> Result<serde_json::Value, ErrorBody> {
        let now = self.clock.epoch_ms();
        let request = ToolRequest::parse(call)
            .map_err(|e| ErrorBody::invalid(e.to_string(), now))?;
        match request {
            ToolRequest::ScanRepository(scan) => self.create_scan(SCAN_KIND, scan, now),
            ToolRequest::ScanMultipleRepositories(scan) => {
                self.create_scan(MULTI_SCAN_KIND, scan, now)
            }
            ToolRequest::GetScanResults { scan_id } => {
                let id = JobId::new(&scan_id);
                match self.orchestrator.get_job(&id) {
                    Some(record) => to_json(&JobSnapshot::from(&record), now),
                    None => Err(ErrorBody::not_found(format!("scan {}", scan_id), now)),
                }
            }
            ToolRequest::ListJobs(query) => {
                let snapshots: Vec<JobSnapshot> = self
                    .orchestrator
                    .list_jobs(&to_filter(&query))
                    .iter()
                    .map(JobSnapshot::from)
                    .collect();
                to_json(&snapshots, now)
            }
            ToolRequest::GetCacheStatus => to_json(&self.cache.status(), now),
            ToolRequest::InvalidateCache {
                fingerprint,
                repository_path,
            } => {
                let mut removed = 0;
                if let Some(fp) = &fingerprint {
                    removed += self.cache.invalidate(&Fingerprint::new(fp.clone()));
                }
                if let Some(repo) = &repository_path {
                    removed += self.cache.invalidate_repo(Path::new(repo));
                }
                self.orchestrator.bus().publish(Event::CacheInvalidated {
                    fingerprint: fingerprint.map(Fingerprint::new),
                    repository: repository_path,
                    removed,
                });
                Ok(serde_json::json!({ "removed": removed }))
            }
        }
    }

    /// Current stats in the control-surface shape.
    pub fn stats(&self) -> StatsBody {
        let stats = self.orchestrator.get_stats();
        StatsBody {
            total: stats.total,
            queued: stats.queued,
            running: stats.running,
            completed: stats.completed,
            failed: stats.failed,
        }
    }

    fn create_scan<T: serde::Serialize>(
        &self,
        kind: &str,
        request: T,
        now: u64,
    ) -> Result<serde_json::Value, ErrorBody> {
        let data = serde_json::to_value(&request)
            .map_err(|e| ErrorBody::internal(e.to_string(), now))?;
        let id = self
            .orchestrator
            .create_job(kind, data)
            .map_err(|e| ErrorBody::invalid(e.to_string(), now))?;
        to_json(
            &ScanCreated {
                scan_id: id.to_string(),
                status: sweep_core::JobStatus::Queued,
                timestamp: now,
            },
            now,
        )
    }
}

fn to_filter(query: &JobsQuery) -> JobFilter {
    JobFilter {
        status: query.status,
        kind: query.kind.clone(),
        limit: query.limit,
    }
}

fn to_json<T: serde::Serialize>(value: &T, now: u64) -> Result<serde_json::Value, ErrorBody> {
    serde_json::to_value(value).map_err(|e| ErrorBody::internal(e.to_string(), now))
}

#[cfg(test)]
#[path = "tools_tests.rs"]
mod tests;
