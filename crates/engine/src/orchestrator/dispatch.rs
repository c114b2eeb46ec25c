// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The engine loop: dispatch, completion handling, and timers.

use super::{EngineMsg, EngineState, Inner, PendingRetry};
use crate::git::GitProtocol;
use crate::retry::{GiveUpReason, RetryDecision};
use crate::runner::{self, AttemptOutcome, AttemptParams, FinishedAttempt};
use crate::timer::{TimerId, TimerKind};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use sweep_core::{Clock, ErrorClass, Event, JobError, JobId, JobRecord};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

/// Single consumer of engine messages; drives timers and dispatch.
pub(crate) async fn run_loop<C: Clock>(
    inner: Arc<Inner<C>>,
    mut msg_rx: mpsc::Receiver<EngineMsg>,
) {
    tracing::info!("engine loop started");
    loop {
        inner.dispatch_ready();
        let wait = {
            let state = inner.state.lock();
            state
                .scheduler
                .next_deadline()
                .map(|deadline| deadline.saturating_duration_since(inner.clock.now()))
        };
        tokio::select! {
            _ = inner.shutdown.cancelled() => break,
            msg = msg_rx.recv() => match msg {
                Some(EngineMsg::Finished(finished)) => inner.handle_finished(finished),
                Some(EngineMsg::Wake) => {}
                None => break,
            },
            _ = sleep_or_forever(wait) => inner.handle_due_timers(),
        }
    }
    tracing::info!("engine loop stopped");
}

async fn sleep_or_forever(wait: Option<Duration>) {
    match wait {
        Some(duration) => tokio::time::sleep(duration).await,
        None => std::future::pending().await,
    }
}

impl<C: Clock> Inner<C> {
    /// Admit queued jobs while capacity allows, spawning one runner task per
    /// admission. Events are published under the state lock so per-job
    /// lifecycle order is globally consistent.
    pub(crate) fn dispatch_ready(&self) {
        loop {
            let mut state = self.state.lock();
            let Some(entry) = state.scheduler.pop_ready() else {
                return;
            };
            let Some(handler) = self.handlers.lock().get(&entry.kind).cloned() else {
                state.scheduler.finish(&entry.job_id, &entry.kind);
                self.fail_in_place(
                    &mut state,
                    &entry.job_id,
                    JobError::internal(format!("no handler registered for {}", entry.kind)),
                );
                continue;
            };

            let epoch = self.clock.epoch_ms();
            match state.store.update(&entry.job_id, |r| r.start(epoch)) {
                Some(Ok(())) => {}
                Some(Err(e)) => {
                    tracing::error!(job = %entry.job_id, error = %e, "dispatch start rejected");
                    state.scheduler.finish(&entry.job_id, &entry.kind);
                    continue;
                }
                None => {
                    state.scheduler.finish(&entry.job_id, &entry.kind);
                    continue;
                }
            }

            let Some(snapshot) = state.store.get(&entry.job_id) else {
                state.scheduler.finish(&entry.job_id, &entry.kind);
                continue;
            };
            let token = CancellationToken::new();
            state
                .cancel_tokens
                .insert(entry.job_id.clone(), token.clone());
            self.bus.publish(Event::JobStarted {
                id: snapshot.id.clone(),
                kind: snapshot.kind.clone(),
                attempt: snapshot.attempts,
            });

            let git = if handler.wants_git() {
                match self.git_protocol_for(&snapshot) {
                    Ok(protocol) => Some(protocol),
                    Err(error) => {
                        state.scheduler.finish(&entry.job_id, &entry.kind);
                        state.cancel_tokens.remove(&entry.job_id);
                        self.fail_in_place(&mut state, &entry.job_id, error);
                        continue;
                    }
                }
            } else {
                None
            };
            drop(state);

            let deadline = handler
                .timeout_ms()
                .map(Duration::from_millis)
                .unwrap_or_else(|| self.config.handler.timeout_for(&snapshot.kind));
            runner::spawn_attempt(AttemptParams {
                job: snapshot,
                handler,
                bus: self.bus.clone(),
                cancel: token,
                deadline,
                grace: Duration::from_millis(self.config.handler.cancel_grace_ms),
                git,
                workdir_base: self.workdir_base.clone(),
                outcome_tx: self.msg_tx.clone(),
            });
        }
    }

    /// Git protocol driver for a job, requiring `repository_path` in its
    /// data and a configured adapter.
    fn git_protocol_for(&self, job: &JobRecord) -> Result<GitProtocol, JobError> {
        let Some(adapter) = &self.git else {
            return Err(JobError::internal(
                "git protocol requested but no adapter configured",
            ));
        };
        let repo = job
            .data
            .get("repository_path")
            .and_then(|v| v.as_str())
            .map(PathBuf::from)
            .ok_or_else(|| {
                JobError::permanent("git protocol requires repository_path in job data")
            })?;
        Ok(GitProtocol::new(
            Arc::clone(adapter),
            self.config.git.clone(),
            repo,
        ))
    }

    /// Fail a job in place, emitting the terminal failure immediately
    /// (orchestrator fault, never retried).
    fn fail_in_place(&self, state: &mut EngineState, id: &JobId, error: JobError) {
        let epoch = self.clock.epoch_ms();
        let kind = match state.store.get(id) {
            Some(record) => record.kind,
            None => return,
        };
        state.store.update(id, |r| {
            if r.status == sweep_core::JobStatus::Queued {
                let _ = r.start(epoch);
            }
            let _ = r.fail(error.clone(), epoch);
        });
        self.bus.publish(Event::JobFailed {
            id: id.clone(),
            kind,
            error,
        });
        self.finalize_terminal(state, id);
        self.push_stats(state);
    }

    /// Apply a settled attempt to the canonical state.
    pub(crate) fn handle_finished(&self, finished: FinishedAttempt) {
        let FinishedAttempt {
            job_id,
            kind,
            outcome,
            git,
        } = finished;
        let mut state = self.state.lock();
        state.scheduler.finish(&job_id, &kind);
        state.cancel_tokens.remove(&job_id);
        if let Some(info) = git {
            state.store.update(&job_id, |r| r.git = Some(info));
        }
        let Some(record) = state.store.get(&job_id) else {
            tracing::error!(job = %job_id, "attempt settled for unknown job");
            return;
        };
        let epoch = self.clock.epoch_ms();
        let cancel_requested = record.cancel_requested;

        match outcome {
            // A cancelled job that completes or fails anyway: cancelled
            // wins, the late result is discarded.
            AttemptOutcome::Completed { .. } | AttemptOutcome::Failed { .. }
                if cancel_requested =>
            {
                self.apply_cancelled(&mut state, &job_id, &record, epoch);
            }
            AttemptOutcome::Cancelled => {
                self.apply_cancelled(&mut state, &job_id, &record, epoch);
            }
            AttemptOutcome::Completed { result } => {
                state
                    .store
                    .update(&job_id, |r| r.complete(result.clone(), epoch));
                self.bus.publish(Event::JobCompleted {
                    id: job_id.clone(),
                    kind,
                    result,
                });
                state.retry.on_success(&record.fingerprint);
                self.finalize_terminal(&mut state, &job_id);
            }
            AttemptOutcome::TimedOut => {
                let error = JobError::timeout("handler deadline exceeded");
                self.apply_failure(&mut state, &record, error, epoch);
            }
            AttemptOutcome::Failed { error } => {
                self.apply_failure(&mut state, &record, error, epoch);
            }
        }
        self.push_stats(&state);
    }

    fn apply_cancelled(
        &self,
        state: &mut EngineState,
        job_id: &JobId,
        record: &JobRecord,
        epoch: u64,
    ) {
        state.store.update(job_id, |r| r.cancel(epoch));
        self.bus.publish(Event::JobCancelled {
            id: job_id.clone(),
            kind: record.kind.clone(),
        });
        if state.retry.on_cancel(&record.fingerprint) {
            self.bus.publish(Event::CircuitClosed {
                fingerprint: record.fingerprint.clone(),
            });
        }
        self.finalize_terminal(state, job_id);
    }

    /// Classify, consult the retry controller, and either arm a delayed
    /// re-enqueue or surface the terminal failure.
    fn apply_failure(
        &self,
        state: &mut EngineState,
        record: &JobRecord,
        mut error: JobError,
        epoch: u64,
    ) {
        error.class = self.classifier.classify(&error);
        let fingerprint = record.fingerprint.clone();
        let decision =
            state
                .retry
                .on_failure(&fingerprint, error.class, error.retry_after_ms, epoch);
        match decision {
            RetryDecision::Retry { attempt, delay } => {
                // The attempt record ends failed, but retry:scheduled
                // replaces job:failed for the logical job.
                let class = error.class;
                state.store.update(&record.id, |r| r.fail(error, epoch));
                self.bus.publish(Event::RetryScheduled {
                    job_id: record.id.clone(),
                    attempt,
                    delay_ms: delay.as_millis() as u64,
                    class,
                });
                let child_id = record.id.retry_child(attempt);
                state.scheduler.set_timer(
                    TimerId::retry(&child_id),
                    delay,
                    self.clock.now(),
                );
                state.pending_retries.insert(
                    child_id.clone(),
                    PendingRetry {
                        child_id,
                        kind: record.kind.clone(),
                        data: record.data.clone(),
                        fingerprint,
                        attempt,
                        cron: record.cron.clone(),
                        paused: record.pause_requested,
                    },
                );
                self.finalize_terminal(state, &record.id);
            }
            RetryDecision::GiveUp {
                reason,
                circuit_opened,
                attempts,
            } => {
                if reason == GiveUpReason::CircuitOpen {
                    error.class = ErrorClass::CircuitOpen;
                }
                state
                    .store
                    .update(&record.id, |r| r.fail(error.clone(), epoch));
                if circuit_opened {
                    self.bus.publish(Event::RetryExhausted {
                        job_id: record.id.clone(),
                        attempts,
                    });
                    self.bus.publish(Event::CircuitOpened {
                        fingerprint: fingerprint.clone(),
                    });
                }
                self.bus.publish(Event::JobFailed {
                    id: record.id.clone(),
                    kind: record.kind.clone(),
                    error,
                });
                self.finalize_terminal(state, &record.id);
            }
        }
    }

    /// Route fired timers to their handlers.
    pub(crate) fn handle_due_timers(&self) {
        let fired = {
            let mut state = self.state.lock();
            state.scheduler.fired_timers(self.clock.now())
        };
        for timer in fired {
            let routed = match timer.kind() {
                Some(TimerKind::Retry { child_id }) => Some(JobId::new(child_id)),
                Some(TimerKind::Cron { name }) => {
                    let name = name.to_string();
                    self.fire_cron(&name);
                    None
                }
                Some(TimerKind::LedgerSweep) => {
                    self.sweep_ledger();
                    None
                }
                None => {
                    tracing::warn!(timer = %timer, "unrecognized timer fired");
                    None
                }
            };
            if let Some(child_id) = routed {
                self.promote_retry(&child_id);
            }
        }
    }

    /// Timer fire: the delayed retry child becomes a real queued job.
    fn promote_retry(&self, child_id: &JobId) {
        let mut state = self.state.lock();
        let Some(pending) = state.pending_retries.remove(child_id) else {
            return;
        };
        let epoch = self.clock.epoch_ms();
        let mut record = JobRecord::new(
            pending.child_id.clone(),
            pending.kind.clone(),
            pending.data,
            pending.fingerprint.clone(),
            epoch,
        );
        record.attempts = pending.attempt + 1;
        record.cron = pending.cron.clone();
        if state.store.insert(record).is_err() {
            tracing::error!(job = %child_id, "retry child id already exists");
            return;
        }
        self.bus.publish(Event::JobCreated {
            id: child_id.clone(),
            kind: pending.kind.clone(),
            fingerprint: pending.fingerprint,
            created_at_ms: epoch,
            cron: pending.cron,
        });
        state
            .scheduler
            .enqueue(child_id.clone(), pending.kind, epoch);
        if pending.paused {
            state.store.update(child_id, |r| r.pause());
            state.scheduler.pause_job(child_id);
            self.bus.publish(Event::JobPaused {
                id: child_id.clone(),
            });
        }
        self.push_stats(&state);
    }

    /// Timer fire: produce a job from a cron entry unless its guards skip it.
    pub(crate) fn fire_cron(&self, name: &str) {
        let entry = {
            let mut state = self.state.lock();
            let Some(entry) = state.cron.get(name).cloned() else {
                return;
            };
            // Re-arm first so a skipped fire still recurs.
            state
                .scheduler
                .set_timer(TimerId::cron(name), entry.every, self.clock.now());
            let skip = (entry.skip_if_queued && state.store.count_queued_cron_jobs(name) > 0)
                || (entry.max_active > 0
                    && state.store.count_active_cron_jobs(name) >= entry.max_active as usize);
            if skip {
                tracing::debug!(cron = name, "fire skipped by concurrency guard");
                return;
            }
            entry
        };
        if let Err(e) =
            self.create_job_inner(&entry.kind, entry.data.clone(), Some(entry.name.clone()))
        {
            tracing::warn!(cron = name, error = %e, "cron job creation failed");
        }
    }

    /// Timer fire: prune idle ledger entries; expired open circuits close.
    fn sweep_ledger(&self) {
        let mut state = self.state.lock();
        let closed = state.retry.prune_expired(self.clock.epoch_ms());
        for fingerprint in closed {
            self.bus.publish(Event::CircuitClosed { fingerprint });
        }
        state.scheduler.set_timer(
            TimerId::ledger_sweep(),
            self.sweep_interval(),
            self.clock.now(),
        );
    }
}
