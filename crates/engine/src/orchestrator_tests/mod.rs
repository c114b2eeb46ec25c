// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! End-to-end orchestrator tests.

mod cancel;
mod cron;
mod lifecycle;
mod ordering;
mod pause;
mod retry;
mod single_flight;

use super::*;
use crate::bus::EventStream;
use crate::worker::{JobContext, JobHandler};
use async_trait::async_trait;
use std::sync::atomic::{AtomicU32, Ordering as AtomicOrdering};
use sweep_core::{JobError, JobStatus, RetryConfig};

/// Millisecond-scale config so retry/backoff tests run in real time.
pub(crate) fn fast_config() -> EngineConfig {
    let mut config = EngineConfig::default();
    config.retry = RetryConfig {
        base_ms: 10,
        cap_ms: 100,
        jitter: 0.0,
        absolute_max: 10,
        timeout_max: 2,
        ledger_ttl_ms: 60_000,
        no_retry_codes: Vec::new(),
    };
    config.handler.cancel_grace_ms = 500;
    config
}

pub(crate) fn engine(config: EngineConfig) -> Orchestrator<SystemClock> {
    Orchestrator::new(config, EngineDeps::default(), SystemClock)
}

/// Scriptable handler: optional delay (cancellation-aware or not), a number
/// of scripted failures before success, and a call counter.
pub(crate) struct TestWorker {
    kind: String,
    delay: Duration,
    respect_cancel: bool,
    fail_first: AtomicU32,
    timeout_ms: Option<u64>,
    calls: Arc<AtomicU32>,
}

impl TestWorker {
    pub(crate) fn new(kind: &str) -> Self {
        Self {
            kind: kind.to_string(),
            delay: Duration::ZERO,
            respect_cancel: true,
            fail_first: AtomicU32::new(0),
            timeout_ms: None,
            calls: Arc::new(AtomicU32::new(0)),
        }
    }

    pub(crate) fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub(crate) fn ignoring_cancel(mut self) -> Self {
        self.respect_cancel = false;
        self
    }

    pub(crate) fn failing_first(self, n: u32) -> Self {
        self.fail_first.store(n, AtomicOrdering::SeqCst);
        self
    }

    pub(crate) fn with_timeout_ms(mut self, ms: u64) -> Self {
        self.timeout_ms = Some(ms);
        self
    }

    pub(crate) fn call_counter(&self) -> Arc<AtomicU32> {
        Arc::clone(&self.calls)
    }
}

#[async_trait]
impl JobHandler for TestWorker {
    fn job_type(&self) -> &str {
        &self.kind
    }

    fn timeout_ms(&self) -> Option<u64> {
        self.timeout_ms
    }

    async fn run(&self, ctx: JobContext) -> Result<serde_json::Value, JobError> {
        self.calls.fetch_add(1, AtomicOrdering::SeqCst);
        if !self.delay.is_zero() {
            if self.respect_cancel {
                tokio::select! {
                    _ = tokio::time::sleep(self.delay) => {}
                    _ = ctx.cancel_token().cancelled() => return Err(JobError::cancelled()),
                }
            } else {
                tokio::time::sleep(self.delay).await;
            }
        }
        let remaining = self.fail_first.load(AtomicOrdering::SeqCst);
        if remaining > 0 {
            self.fail_first.store(remaining - 1, AtomicOrdering::SeqCst);
            return Err(JobError::transient("scripted failure"));
        }
        Ok(serde_json::json!({ "ok": true }))
    }
}

/// Poll until the job reaches `status` or the timeout trips.
pub(crate) async fn wait_for_status(
    orch: &Orchestrator<SystemClock>,
    id: &JobId,
    status: JobStatus,
    timeout: Duration,
) -> sweep_core::JobRecord {
    let deadline = tokio::time::Instant::now() + timeout;
    loop {
        if let Some(record) = orch.get_job(id) {
            if record.status == status {
                return record;
            }
        }
        assert!(
            tokio::time::Instant::now() < deadline,
            "timed out waiting for {} on {}",
            status,
            id
        );
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
}

pub(crate) async fn wait_until(check: impl Fn() -> bool, timeout: Duration, what: &str) {
    let deadline = tokio::time::Instant::now() + timeout;
    while !check() {
        assert!(
            tokio::time::Instant::now() < deadline,
            "timed out waiting for {}",
            what
        );
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
}

/// Drain everything currently buffered on the stream.
pub(crate) fn drain(stream: &mut EventStream) -> Vec<Event> {
    let mut events = Vec::new();
    while let Some(event) = stream.try_recv() {
        events.push(event);
    }
    events
}

/// Event tags for one job id, in delivery order.
pub(crate) fn tags_for<'a>(events: &'a [Event], id: &JobId) -> Vec<&'a str> {
    events
        .iter()
        .filter(|e| e.job_id() == Some(id))
        .map(|e| e.tag())
        .collect()
}
