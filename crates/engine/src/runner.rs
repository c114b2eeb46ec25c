// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Job runner: executes one attempt off the critical section.
//!
//! The orchestrator marks the record running and publishes `job:started`
//! under the state lock, then hands off to [`spawn_attempt`]. Everything
//! here happens on a spawned task: the optional Git protocol around the
//! handler, the deadline + cancellation grace window, scoped workdir
//! cleanup, and finally one [`FinishedAttempt`] message back to the engine
//! loop. A handler panic is captured and normalized like any other failure.

use crate::bus::EventBus;
use crate::git::{GitProtocol, GitSession};
use crate::orchestrator::EngineMsg;
use crate::worker::{JobContext, JobHandler};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use sweep_adapters::ScopedWorkdir;
use sweep_core::{GitInfo, JobError, JobId, JobRecord};
use tokio::sync::mpsc;
use tokio::task::{JoinError, JoinHandle};
use tokio_util::sync::CancellationToken;

/// Terminal result of one attempt, as observed by the runner.
#[derive(Debug)]
pub(crate) enum AttemptOutcome {
    Completed { result: serde_json::Value },
    Failed { error: JobError },
    Cancelled,
    TimedOut,
}

/// Message sent back to the engine loop when an attempt settles.
#[derive(Debug)]
pub(crate) struct FinishedAttempt {
    pub job_id: JobId,
    pub kind: String,
    pub outcome: AttemptOutcome,
    pub git: Option<GitInfo>,
}

/// Everything an attempt needs, bundled at dispatch time.
pub(crate) struct AttemptParams {
    pub job: JobRecord,
    pub handler: Arc<dyn JobHandler>,
    pub bus: EventBus,
    pub cancel: CancellationToken,
    pub deadline: Duration,
    pub grace: Duration,
    pub git: Option<GitProtocol>,
    pub workdir_base: Option<PathBuf>,
    pub outcome_tx: mpsc::Sender<EngineMsg>,
}

pub(crate) fn spawn_attempt(params: AttemptParams) -> JoinHandle<()> {
    tokio::spawn(run_attempt(params))
}

enum RawOutcome {
    Finished(Result<serde_json::Value, JobError>),
    Cancelled,
    TimedOut,
}

async fn run_attempt(params: AttemptParams) {
    let AttemptParams {
        job,
        handler,
        bus,
        cancel,
        deadline,
        grace,
        git,
        workdir_base,
        outcome_tx,
    } = params;
    let job_id = job.id.clone();
    let kind = job.kind.clone();

    // Scratch space scoped to this attempt; removed on every exit path.
    let _workdir = workdir_base.as_ref().and_then(|base| {
        match ScopedWorkdir::create(base, job_id.as_str()) {
            Ok(workdir) => Some(workdir),
            Err(e) => {
                tracing::warn!(job = %job_id, error = %e, "workdir creation failed");
                None
            }
        }
    });

    // Git pre-steps before the handler body.
    let mut session: Option<GitSession> = None;
    if let Some(protocol) = &git {
        match protocol.begin(&job).await {
            Ok(s) => session = Some(s),
            Err(e) => {
                let error = JobError::new(e.class(), format!("git setup failed: {}", e))
                    .with_code("git");
                finish(
                    outcome_tx,
                    FinishedAttempt {
                        job_id,
                        kind,
                        outcome: AttemptOutcome::Failed { error },
                        git: None,
                    },
                )
                .await;
                return;
            }
        }
    }

    let ctx = JobContext::new(job.clone(), cancel.clone(), bus.clone());
    let mut handler_task = tokio::spawn({
        let handler = Arc::clone(&handler);
        async move { handler.run(ctx).await }
    });

    let raw = tokio::select! {
        res = &mut handler_task => RawOutcome::Finished(flatten(res)),
        _ = cancel.cancelled() => {
            // Cooperative: give the handler the grace window to observe the
            // token. Whatever it returns, cancelled wins.
            if tokio::time::timeout(grace, &mut handler_task).await.is_err() {
                handler_task.abort();
            }
            RawOutcome::Cancelled
        }
        _ = tokio::time::sleep(deadline) => {
            cancel.cancel();
            if tokio::time::timeout(grace, &mut handler_task).await.is_err() {
                handler_task.abort();
            }
            RawOutcome::TimedOut
        }
    };

    let outcome = match raw {
        RawOutcome::Finished(result) if cancel.is_cancelled() => {
            // Cancellation raced handler completion; result is discarded.
            drop(result);
            AttemptOutcome::Cancelled
        }
        RawOutcome::Finished(Ok(value)) => {
            match (&git, session.as_mut()) {
                (Some(protocol), Some(session)) => {
                    let message = handler.commit_message(&job);
                    let pr = handler.pr_context(&job);
                    match protocol.finish(session, message, pr).await {
                        Ok(()) => AttemptOutcome::Completed { result: value },
                        Err(e) => {
                            // Handler output is retained in the error details.
                            let error =
                                JobError::new(e.class(), format!("git finalize failed: {}", e))
                                    .with_code("git")
                                    .with_partial_result(value);
                            AttemptOutcome::Failed { error }
                        }
                    }
                }
                _ => AttemptOutcome::Completed { result: value },
            }
        }
        RawOutcome::Finished(Err(error)) => AttemptOutcome::Failed { error },
        RawOutcome::Cancelled => AttemptOutcome::Cancelled,
        RawOutcome::TimedOut => AttemptOutcome::TimedOut,
    };

    // Working-tree restoration on every exit path.
    if let (Some(protocol), Some(session)) = (&git, &session) {
        protocol.restore(session).await;
    }

    finish(
        outcome_tx,
        FinishedAttempt {
            job_id,
            kind,
            outcome,
            git: session.map(|s| s.info),
        },
    )
    .await;
}

fn flatten(res: Result<Result<serde_json::Value, JobError>, JoinError>) -> Result<serde_json::Value, JobError> {
    match res {
        Ok(inner) => inner,
        Err(join) if join.is_panic() => {
            Err(JobError::internal(format!("handler panicked: {}", join)))
        }
        Err(join) => Err(JobError::internal(format!("handler task failed: {}", join))),
    }
}

async fn finish(outcome_tx: mpsc::Sender<EngineMsg>, finished: FinishedAttempt) {
    if outcome_tx
        .send(EngineMsg::Finished(finished))
        .await
        .is_err()
    {
        tracing::warn!("engine loop gone, dropping attempt outcome");
    }
}
