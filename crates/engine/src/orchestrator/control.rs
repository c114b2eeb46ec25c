// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The control surface exposed to outer layers (HTTP, MCP, workers).
//!
//! Every operation is idempotent on terminal states: acting on a finished
//! job returns `{ok: false, reason: "already terminal"}` without mutation.

use super::{job_fingerprint, CtlResult, Inner, Orchestrator};
use crate::error::EngineError;
use crate::store::{JobFilter, StoreStats};
use crate::timer::TimerId;
use sweep_core::{Clock, Event, JobId, JobRecord, JobStatus};

impl<C: Clock> Orchestrator<C> {
    /// Create and enqueue a job. Publishes `job:created` at insert time;
    /// enqueueing itself is a pure state-machine step.
    pub fn create_job(
        &self,
        kind: &str,
        data: serde_json::Value,
    ) -> Result<JobId, EngineError> {
        self.inner.create_job_inner(kind, data, None)
    }

    /// Snapshot of a job, live or archived.
    pub fn get_job(&self, id: &JobId) -> Option<JobRecord> {
        self.inner.state.lock().store.get(id)
    }

    pub fn list_jobs(&self, filter: &JobFilter) -> Vec<JobRecord> {
        self.inner.state.lock().store.list(filter)
    }

    pub fn get_stats(&self) -> StoreStats {
        self.inner.state.lock().store.stats()
    }

    pub fn stats_for_kind(&self, kind: &str) -> StoreStats {
        self.inner.state.lock().store.stats_for_kind(kind)
    }

    pub fn cancel_job(&self, id: &JobId) -> Result<CtlResult, EngineError> {
        self.inner.cancel_job(id)
    }

    pub fn pause_job(&self, id: &JobId) -> Result<CtlResult, EngineError> {
        self.inner.pause_job(id)
    }

    pub fn resume_job(&self, id: &JobId) -> Result<CtlResult, EngineError> {
        self.inner.resume_job(id)
    }

    /// Process-wide pause: blocks all dispatch until [`resume`](Self::resume).
    pub fn pause(&self) -> CtlResult {
        self.inner.state.lock().scheduler.pause_all();
        CtlResult::ok()
    }

    pub fn resume(&self) -> CtlResult {
        self.inner.state.lock().scheduler.resume_all();
        self.inner.wake();
        CtlResult::ok()
    }

    pub fn is_paused(&self) -> bool {
        self.inner.state.lock().scheduler.is_paused()
    }

    /// Per-kind pause (worker-level). The process-wide pause always wins.
    pub fn pause_kind(&self, kind: &str) -> CtlResult {
        self.inner.state.lock().scheduler.pause_kind(kind);
        CtlResult::ok()
    }

    pub fn resume_kind(&self, kind: &str) -> CtlResult {
        self.inner.state.lock().scheduler.resume_kind(kind);
        self.inner.wake();
        CtlResult::ok()
    }
}

impl<C: Clock> Inner<C> {
    pub(crate) fn create_job_inner(
        &self,
        kind: &str,
        data: serde_json::Value,
        cron: Option<String>,
    ) -> Result<JobId, EngineError> {
        if self.shutdown.is_cancelled() {
            return Err(EngineError::ShuttingDown);
        }
        let handler = self
            .handlers
            .lock()
            .get(kind)
            .cloned()
            .ok_or_else(|| EngineError::UnknownJobType(kind.to_string()))?;
        let id = JobId::generate();
        let fingerprint = job_fingerprint(kind, &data, handler.version());
        let epoch = self.clock.epoch_ms();
        let mut record = JobRecord::new(id.clone(), kind, data, fingerprint.clone(), epoch);
        record.cron = cron.clone();
        {
            let mut state = self.state.lock();
            state
                .store
                .insert(record)
                .map_err(EngineError::DuplicateJob)?;
            self.bus.publish(Event::JobCreated {
                id: id.clone(),
                kind: kind.to_string(),
                fingerprint,
                created_at_ms: epoch,
                cron,
            });
            state.scheduler.enqueue(id.clone(), kind, epoch);
            self.push_stats(&state);
        }
        self.wake();
        tracing::info!(job = %id, kind, "job created");
        Ok(id)
    }

    fn cancel_job(&self, id: &JobId) -> Result<CtlResult, EngineError> {
        let mut state = self.state.lock();
        let epoch = self.clock.epoch_ms();

        // A pending retry child anywhere in this id's lineage is cancelled
        // first: the chain closes even though the child was never enqueued.
        let lineage = id.lineage_root();
        let pending_child = state
            .pending_retries
            .keys()
            .find(|child| child.lineage_root() == lineage)
            .cloned();
        if let Some(child_id) = pending_child {
            if let Some(pending) = state.pending_retries.remove(&child_id) {
                state.scheduler.cancel_timer(&TimerId::retry(&child_id));
                let mut record = JobRecord::new(
                    child_id.clone(),
                    pending.kind.clone(),
                    pending.data,
                    pending.fingerprint.clone(),
                    epoch,
                );
                record.attempts = pending.attempt + 1;
                record.cron = pending.cron;
                record.cancel(epoch)?;
                let kind = record.kind.clone();
                if state.store.insert(record).is_ok() {
                    self.bus.publish(Event::JobCancelled {
                        id: child_id.clone(),
                        kind,
                    });
                    self.finalize_terminal(&mut state, &child_id);
                }
                if state.retry.on_cancel(&pending.fingerprint) {
                    self.bus.publish(Event::CircuitClosed {
                        fingerprint: pending.fingerprint,
                    });
                }
                self.push_stats(&state);
            }
            return Ok(CtlResult::ok());
        }

        let Some(record) = state.store.get(id) else {
            return Err(EngineError::JobNotFound(id.to_string()));
        };
        match record.status {
            JobStatus::Queued | JobStatus::Paused => {
                state.scheduler.remove(id);
                state.store.update(id, |r| r.cancel(epoch)).transpose()?;
                self.bus.publish(Event::JobCancelled {
                    id: id.clone(),
                    kind: record.kind.clone(),
                });
                if state.retry.on_cancel(&record.fingerprint) {
                    self.bus.publish(Event::CircuitClosed {
                        fingerprint: record.fingerprint.clone(),
                    });
                }
                self.finalize_terminal(&mut state, id);
                self.push_stats(&state);
                Ok(CtlResult::ok())
            }
            JobStatus::Running => {
                // Cooperative: flag the record and fire the token; the
                // terminal event is emitted when the attempt settles.
                state.store.update(id, |r| r.cancel_requested = true);
                if let Some(token) = state.cancel_tokens.get(id) {
                    token.cancel();
                }
                Ok(CtlResult::accepted("cancellation requested"))
            }
            JobStatus::Completed | JobStatus::Failed | JobStatus::Cancelled => {
                Ok(CtlResult::already_terminal())
            }
        }
    }

    fn pause_job(&self, id: &JobId) -> Result<CtlResult, EngineError> {
        let mut state = self.state.lock();
        let Some(record) = state.store.get(id) else {
            return Err(EngineError::JobNotFound(id.to_string()));
        };
        match record.status {
            JobStatus::Queued => {
                state.store.update(id, |r| r.pause()).transpose()?;
                state.scheduler.pause_job(id);
                self.bus.publish(Event::JobPaused { id: id.clone() });
                Ok(CtlResult::ok())
            }
            JobStatus::Paused => Ok(CtlResult::rejected("already paused")),
            JobStatus::Running => {
                // Advisory: the running handler is not interrupted; the
                // pause applies to the next retry or is moot on completion.
                state.store.update(id, |r| r.pause_requested = true);
                Ok(CtlResult::accepted("advisory: applies on next retry"))
            }
            JobStatus::Completed | JobStatus::Failed | JobStatus::Cancelled => {
                Ok(CtlResult::already_terminal())
            }
        }
    }

    fn resume_job(&self, id: &JobId) -> Result<CtlResult, EngineError> {
        let mut state = self.state.lock();
        let Some(record) = state.store.get(id) else {
            return Err(EngineError::JobNotFound(id.to_string()));
        };
        let result = match record.status {
            JobStatus::Paused => {
                state.store.update(id, |r| r.resume()).transpose()?;
                state.scheduler.resume_job(id);
                self.bus.publish(Event::JobResumed { id: id.clone() });
                CtlResult::ok()
            }
            JobStatus::Running if record.pause_requested => {
                state.store.update(id, |r| r.pause_requested = false);
                CtlResult::ok()
            }
            JobStatus::Queued | JobStatus::Running => CtlResult::rejected("not paused"),
            JobStatus::Completed | JobStatus::Failed | JobStatus::Cancelled => {
                CtlResult::already_terminal()
            }
        };
        drop(state);
        if result.ok {
            self.wake();
        }
        Ok(result)
    }
}
