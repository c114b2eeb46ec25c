// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The worker contract.
//!
//! The orchestrator owns every job's lifecycle; a worker only supplies
//! behavior through [`JobHandler`]. Registration returns a [`WorkerHandle`],
//! the thin per-pipeline adapter over the control surface.

use crate::bus::{EventBus, EventStream};
use crate::error::EngineError;
use crate::orchestrator::{CtlResult, Orchestrator};
use crate::store::StoreStats;
use async_trait::async_trait;
use std::sync::Arc;
use sweep_core::{Clock, Event, JobError, JobId, JobRecord};
use tokio_util::sync::CancellationToken;

/// Everything a handler invocation gets to work with.
pub struct JobContext {
    /// Immutable snapshot of the record at dispatch time.
    pub job: JobRecord,
    cancel: CancellationToken,
    bus: EventBus,
}

impl JobContext {
    pub(crate) fn new(job: JobRecord, cancel: CancellationToken, bus: EventBus) -> Self {
        Self { job, cancel, bus }
    }

    pub fn cancel_token(&self) -> &CancellationToken {
        &self.cancel
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Cooperative cancellation checkpoint for handler I/O boundaries.
    pub fn checkpoint(&self) -> Result<(), JobError> {
        if self.cancel.is_cancelled() {
            return Err(JobError::cancelled());
        }
        Ok(())
    }

    /// Publish a progress event (e.g. `scan:progress`) through the bus.
    pub fn publish(&self, event: Event) {
        self.bus.publish(event);
    }
}

/// Context for the pull request a git-enabled worker opens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrContext {
    pub title: String,
    pub body: String,
}

/// Behavior supplied by each pipeline flavor.
///
/// `job_type` and `run` are the whole required surface; everything else is
/// an optional override.
#[async_trait]
pub trait JobHandler: Send + Sync + 'static {
    /// Symbolic pipeline kind, e.g. "duplicate-scan".
    fn job_type(&self) -> &str;

    /// Execute one attempt. Errors are classified and fed to the retry
    /// controller; the returned value becomes the job's result.
    async fn run(&self, ctx: JobContext) -> Result<serde_json::Value, JobError>;

    /// Per-kind concurrency cap below the global limit.
    fn max_concurrent(&self) -> Option<usize> {
        None
    }

    /// Per-kind deadline override (milliseconds).
    fn timeout_ms(&self) -> Option<u64> {
        None
    }

    /// Opt into the Git side-effect protocol.
    fn wants_git(&self) -> bool {
        false
    }

    /// Handler version, folded into fingerprints.
    fn version(&self) -> &str {
        "1"
    }

    fn commit_message(&self, job: &JobRecord) -> String {
        format!("{}: automated changes for {}", self.job_type(), job.id)
    }

    fn pr_context(&self, job: &JobRecord) -> PrContext {
        PrContext {
            title: format!("{}: {}", self.job_type(), job.id),
            body: format!(
                "Automated changes produced by the `{}` pipeline (job `{}`).",
                self.job_type(),
                job.id
            ),
        }
    }
}

/// Thin per-pipeline adapter over the orchestrator.
///
/// All lifecycle accounting happens centrally; this handle only scopes the
/// shared control surface to one job kind.
pub struct WorkerHandle<C: Clock> {
    kind: String,
    orchestrator: Orchestrator<C>,
}

impl<C: Clock> WorkerHandle<C> {
    pub(crate) fn new(kind: String, orchestrator: Orchestrator<C>) -> Self {
        Self { kind, orchestrator }
    }

    pub fn kind(&self) -> &str {
        &self.kind
    }

    /// Enqueue a job of this worker's kind.
    pub fn create_job(&self, data: serde_json::Value) -> Result<JobId, EngineError> {
        self.orchestrator.create_job(&self.kind, data)
    }

    /// Stats scoped to this worker's kind.
    pub fn stats(&self) -> StoreStats {
        self.orchestrator.stats_for_kind(&self.kind)
    }

    /// Pause dispatch for this kind. The process-wide pause always wins;
    /// resuming a kind does not override it.
    pub fn pause(&self) -> CtlResult {
        self.orchestrator.pause_kind(&self.kind)
    }

    pub fn resume(&self) -> CtlResult {
        self.orchestrator.resume_kind(&self.kind)
    }

    pub fn set_paused(&self, paused: bool) -> CtlResult {
        if paused {
            self.pause()
        } else {
            self.resume()
        }
    }

    /// Bus subscription filtered to this worker's job kind.
    pub fn subscribe(&self) -> EventStream {
        let kind = self.kind.clone();
        self.orchestrator
            .bus()
            .subscribe_filtered(move |event| event.job_kind() == Some(kind.as_str()))
    }

    /// The underlying orchestrator, for composed pipelines.
    pub fn orchestrator(&self) -> &Orchestrator<C> {
        &self.orchestrator
    }
}

/// Registry shared between the orchestrator and the dispatch path.
pub(crate) type HandlerRegistry = std::collections::HashMap<String, Arc<dyn JobHandler>>;
