// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The orchestrator: canonical state, control surface, and the engine loop.
//!
//! All shared mutable state (store, scheduler, retry ledger, pending
//! retries) lives behind one mutex; every transition is atomic with respect
//! to observers, and per-job events are published in lifecycle order under
//! that lock. Handlers run off the critical section on spawned tasks and
//! report back through the engine message channel.

mod control;
mod dispatch;

use crate::activity::ActivityLog;
use crate::broadcast::BroadcastAdapter;
use crate::bus::{EventBus, EventStream};
use crate::cron::CronEntry;
use crate::retry::RetryController;
use crate::runner::FinishedAttempt;
use crate::scheduler::Scheduler;
use crate::store::JobStore;
use crate::timer::TimerId;
use crate::worker::{HandlerRegistry, JobHandler, WorkerHandle};
use parking_lot::Mutex;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use sweep_adapters::{GitAdapter, HistorySink};
use sweep_core::{
    Clock, DefaultClassifier, EngineConfig, ErrorClassifier, Event, Fingerprint, JobId,
    SystemClock,
};
use sweep_wire::{OutboundMessage, StatsBody};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Result of a control operation (`{ok, reason?}`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CtlResult {
    pub ok: bool,
    pub reason: Option<String>,
}

impl CtlResult {
    pub fn ok() -> Self {
        Self {
            ok: true,
            reason: None,
        }
    }

    pub fn accepted(reason: impl Into<String>) -> Self {
        Self {
            ok: true,
            reason: Some(reason.into()),
        }
    }

    pub fn rejected(reason: impl Into<String>) -> Self {
        Self {
            ok: false,
            reason: Some(reason.into()),
        }
    }

    pub fn already_terminal() -> Self {
        Self::rejected("already terminal")
    }
}

impl From<CtlResult> for sweep_wire::ControlAck {
    fn from(result: CtlResult) -> Self {
        Self {
            ok: result.ok,
            reason: result.reason,
        }
    }
}

/// External collaborators, constructed at startup and passed in explicitly.
pub struct EngineDeps {
    pub git: Option<Arc<dyn GitAdapter>>,
    pub history: Option<HistorySink>,
    pub classifier: Box<dyn ErrorClassifier>,
    /// Base directory for per-job scratch dirs.
    pub workdir_base: Option<PathBuf>,
}

impl Default for EngineDeps {
    fn default() -> Self {
        Self {
            git: None,
            history: None,
            classifier: Box::new(DefaultClassifier::default()),
            workdir_base: None,
        }
    }
}

/// Messages into the engine loop.
#[derive(Debug)]
pub(crate) enum EngineMsg {
    /// An attempt settled off the critical section.
    Finished(FinishedAttempt),
    /// Level-triggered nudge: re-check timers and dispatch.
    Wake,
}

/// A retry child awaiting its delayed enqueue.
pub(crate) struct PendingRetry {
    pub child_id: JobId,
    pub kind: String,
    pub data: serde_json::Value,
    pub fingerprint: Fingerprint,
    /// Retry number (1-based); the child record's `attempts` is this + 1.
    pub attempt: u32,
    pub cron: Option<String>,
    /// Inherited advisory pause from the failed attempt.
    pub paused: bool,
}

/// Everything guarded by the single engine mutex.
pub(crate) struct EngineState {
    pub store: JobStore,
    pub scheduler: Scheduler,
    pub retry: RetryController,
    pub cron: HashMap<String, CronEntry>,
    pub pending_retries: HashMap<JobId, PendingRetry>,
    pub cancel_tokens: HashMap<JobId, CancellationToken>,
}

pub(crate) struct Inner<C: Clock> {
    pub config: EngineConfig,
    pub clock: C,
    pub bus: EventBus,
    pub state: Mutex<EngineState>,
    pub handlers: Mutex<HandlerRegistry>,
    pub classifier: Box<dyn ErrorClassifier>,
    pub git: Option<Arc<dyn GitAdapter>>,
    pub history: Option<HistorySink>,
    pub activity: ActivityLog,
    pub broadcast: Mutex<Option<BroadcastAdapter>>,
    pub msg_tx: mpsc::Sender<EngineMsg>,
    msg_rx: Mutex<Option<mpsc::Receiver<EngineMsg>>>,
    pub workdir_base: Option<PathBuf>,
    pub shutdown: CancellationToken,
}

/// Shared orchestrator handle.
pub struct Orchestrator<C: Clock = SystemClock> {
    pub(crate) inner: Arc<Inner<C>>,
}

impl<C: Clock> Clone for Orchestrator<C> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<C: Clock> Orchestrator<C> {
    pub fn new(config: EngineConfig, deps: EngineDeps, clock: C) -> Self {
        let (msg_tx, msg_rx) = mpsc::channel(256);
        let bus = EventBus::new(config.bus.subscriber_buffer);
        let activity = ActivityLog::new(config.activity.ring_size);
        let state = EngineState {
            store: JobStore::new(config.history.ring_size),
            scheduler: Scheduler::new(config.max_concurrent()),
            retry: RetryController::new(config.retry.clone()),
            cron: HashMap::new(),
            pending_retries: HashMap::new(),
            cancel_tokens: HashMap::new(),
        };
        Self {
            inner: Arc::new(Inner {
                config,
                clock,
                bus,
                state: Mutex::new(state),
                handlers: Mutex::new(HandlerRegistry::new()),
                classifier: deps.classifier,
                git: deps.git,
                history: deps.history,
                activity,
                broadcast: Mutex::new(None),
                msg_tx,
                msg_rx: Mutex::new(Some(msg_rx)),
                workdir_base: deps.workdir_base,
                shutdown: CancellationToken::new(),
            }),
        }
    }

    /// Register a pipeline worker. Its per-kind concurrency cap (if any) is
    /// installed in the scheduler.
    pub fn register(&self, handler: Arc<dyn JobHandler>) -> WorkerHandle<C> {
        let kind = handler.job_type().to_string();
        if let Some(cap) = handler.max_concurrent() {
            self.inner.state.lock().scheduler.set_kind_cap(&kind, cap);
        }
        self.inner.handlers.lock().insert(kind.clone(), handler);
        WorkerHandle::new(kind, self.clone())
    }

    /// Install a cron entry. Takes effect at [`start`](Self::start), or
    /// immediately when the engine is already running.
    pub fn add_cron(&self, entry: CronEntry) {
        let name = entry.name.clone();
        let every = entry.every;
        {
            let mut state = self.inner.state.lock();
            state.cron.insert(name.clone(), entry);
            state
                .scheduler
                .set_timer(TimerId::cron(&name), every, self.inner.clock.now());
        }
        self.inner.wake();
    }

    /// Spawn the engine loop and the activity pump, arm cron and sweep
    /// timers, and run any `run_on_startup` cron entries once.
    pub fn start(&self) -> JoinHandle<()> {
        self.inner
            .activity
            .attach(&self.inner.bus, self.inner.clock.clone());

        let startup_fires: Vec<String> = {
            let mut state = self.inner.state.lock();
            let now = self.inner.clock.now();
            let entries: Vec<(String, Duration, bool)> = state
                .cron
                .values()
                .map(|e| (e.name.clone(), e.every, e.run_on_startup))
                .collect();
            for (name, every, _) in &entries {
                state
                    .scheduler
                    .set_timer(TimerId::cron(name), *every, now);
            }
            state.scheduler.set_timer(
                TimerId::ledger_sweep(),
                self.inner.sweep_interval(),
                now,
            );
            entries
                .into_iter()
                .filter(|(_, _, startup)| *startup)
                .map(|(name, _, _)| name)
                .collect()
        };
        for name in startup_fires {
            self.inner.fire_cron(&name);
        }

        let inner = Arc::clone(&self.inner);
        let msg_rx = self.inner.msg_rx.lock().take();
        match msg_rx {
            Some(rx) => tokio::spawn(dispatch::run_loop(inner, rx)),
            None => {
                tracing::error!("engine loop already started");
                tokio::spawn(async {})
            }
        }
    }

    /// Stop the engine loop and cancel all running handlers.
    pub fn shutdown(&self) {
        {
            let state = self.inner.state.lock();
            for token in state.cancel_tokens.values() {
                token.cancel();
            }
        }
        self.inner.shutdown.cancel();
    }

    /// Create the outbound broadcast queue and attach the adapter to the
    /// bus. The transport drains the returned receiver.
    pub fn broadcast(&self, capacity: usize) -> mpsc::Receiver<OutboundMessage> {
        let (adapter, out_rx) = BroadcastAdapter::new(capacity);
        adapter.attach(&self.inner.bus, self.inner.clock.clone());
        *self.inner.broadcast.lock() = Some(adapter);
        out_rx
    }

    pub fn bus(&self) -> &EventBus {
        &self.inner.bus
    }

    /// Subscribe to the full event stream.
    pub fn subscribe(&self) -> EventStream {
        self.inner.bus.subscribe()
    }

    /// Subscribe with a predicate.
    pub fn subscribe_filtered(
        &self,
        predicate: impl Fn(&Event) -> bool + Send + 'static,
    ) -> EventStream {
        self.inner.bus.subscribe_filtered(predicate)
    }

    /// Subscribe to the events of one broadcast channel.
    pub fn subscribe_channel(&self, channel: sweep_wire::Channel) -> EventStream {
        self.inner
            .bus
            .subscribe_filtered(move |event| crate::broadcast::channel_for(event) == channel)
    }

    pub fn activity(&self) -> &ActivityLog {
        &self.inner.activity
    }
}

impl<C: Clock> Inner<C> {
    pub(crate) fn wake(&self) {
        // try_send: a full channel already has a wake pending.
        let _ = self.msg_tx.try_send(EngineMsg::Wake);
    }

    pub(crate) fn sweep_interval(&self) -> Duration {
        Duration::from_millis((self.config.retry.ledger_ttl_ms / 4).clamp(1_000, 300_000))
    }

    /// Publish and mirror a stats snapshot to the broadcast fabric.
    pub(crate) fn push_stats(&self, state: &EngineState) {
        if let Some(adapter) = &*self.broadcast.lock() {
            let stats = state.store.stats();
            adapter.send_stats(
                &StatsBody {
                    total: stats.total,
                    queued: stats.queued,
                    running: stats.running,
                    completed: stats.completed,
                    failed: stats.failed,
                },
                self.clock.epoch_ms(),
            );
        }
    }

    /// Append a terminal record to the history sink and archive it.
    pub(crate) fn finalize_terminal(&self, state: &mut EngineState, id: &JobId) {
        if let Some(record) = state.store.get(id) {
            if record.is_terminal() {
                if let Some(history) = &self.history {
                    history.append(&record);
                }
            }
        }
        state.store.archive(id);
    }
}

/// Fingerprint for a generic job request:
/// `sha256(kind, canonical data, handler_version)`.
///
/// Scan pipelines use the commit-addressed [`crate::cache::scan_fingerprint`]
/// for cache lookups; this one keys retry accounting, where the request
/// payload is what identifies the logical work.
pub fn job_fingerprint(kind: &str, data: &serde_json::Value, handler_version: &str) -> Fingerprint {
    let mut hasher = Sha256::new();
    hasher.update(kind.as_bytes());
    hasher.update(b"\n");
    hasher.update(data.to_string().as_bytes());
    hasher.update(b"\n");
    hasher.update(handler_version.as_bytes());
    Fingerprint::new(format!("{:x}", hasher.finalize()))
}

// Re-exported for handler snapshots in control results.
pub use crate::store::JobFilter;

/// Convenience alias used by the daemon.
pub type SystemOrchestrator = Orchestrator<SystemClock>;

#[cfg(test)]
#[path = "../orchestrator_tests/mod.rs"]
mod tests;
