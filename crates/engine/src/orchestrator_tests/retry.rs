// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Retry-with-backoff, circuit breaker, and timeout classification.

use super::*;
use sweep_core::ErrorClass;

#[tokio::test]
async fn retryable_failure_then_success() {
    let orch = engine(fast_config());
    orch.register(Arc::new(TestWorker::new("flaky").failing_first(1)));
    orch.start();
    let mut stream = orch.subscribe();

    let id = orch.create_job("flaky", serde_json::json!({})).unwrap();
    let child_id = id.retry_child(1);
    let child =
        wait_for_status(&orch, &child_id, JobStatus::Completed, Duration::from_secs(5)).await;

    // The logical job ends completed on attempt 2.
    assert_eq!(child.attempts, 2);
    assert_eq!(child.result, Some(serde_json::json!({ "ok": true })));

    let events = drain(&mut stream);
    assert_eq!(
        tags_for(&events, &id),
        vec!["job:created", "job:started", "retry:scheduled"],
        "retry:scheduled replaces job:failed for the logical job"
    );
    assert_eq!(
        tags_for(&events, &child_id),
        vec!["job:created", "job:started", "job:completed"]
    );

    // delay == base_ms with jitter 0
    let scheduled = events
        .iter()
        .find_map(|e| match e {
            Event::RetryScheduled {
                attempt, delay_ms, ..
            } => Some((*attempt, *delay_ms)),
            _ => None,
        })
        .unwrap();
    assert_eq!(scheduled, (1, 10));

    orch.shutdown();
}

#[tokio::test]
async fn retry_lineage_shares_the_fingerprint() {
    let orch = engine(fast_config());
    orch.register(Arc::new(TestWorker::new("flaky").failing_first(2)));
    orch.start();

    let id = orch.create_job("flaky", serde_json::json!({})).unwrap();
    let final_id = id.retry_child(1).retry_child(2);
    let final_record =
        wait_for_status(&orch, &final_id, JobStatus::Completed, Duration::from_secs(5)).await;

    let original = orch.get_job(&id).unwrap();
    assert_eq!(final_record.fingerprint, original.fingerprint);
    assert_eq!(final_id.lineage_root(), id);
    assert_eq!(final_record.attempts, 3);

    orch.shutdown();
}

#[tokio::test]
async fn circuit_opens_after_absolute_max_retries() {
    let mut config = fast_config();
    config.retry.base_ms = 1;
    config.retry.cap_ms = 2;
    config.retry.absolute_max = 3;
    let orch = engine(config);
    orch.register(Arc::new(TestWorker::new("doomed").failing_first(u32::MAX)));
    orch.start();
    let mut stream = orch.subscribe();

    let id = orch.create_job("doomed", serde_json::json!({})).unwrap();
    // Chain: id fails -> retry1..retry3; the 4th attempt trips the breaker.
    let last_id = id.retry_child(1).retry_child(2).retry_child(3);
    let last =
        wait_for_status(&orch, &last_id, JobStatus::Failed, Duration::from_secs(5)).await;

    let error = last.error.unwrap();
    assert_eq!(error.class, ErrorClass::CircuitOpen);

    let events = drain(&mut stream);
    let scheduled: Vec<u32> = events
        .iter()
        .filter_map(|e| match e {
            Event::RetryScheduled { attempt, .. } => Some(*attempt),
            _ => None,
        })
        .collect();
    assert_eq!(scheduled, vec![1, 2, 3], "exactly absolute_max retries scheduled");

    assert!(events
        .iter()
        .any(|e| matches!(e, Event::CircuitOpened { .. })));
    assert!(events
        .iter()
        .any(|e| matches!(e, Event::RetryExhausted { attempts: 3, .. })));
    // Exactly one terminal job:failed across the whole chain
    let failed: Vec<&Event> = events
        .iter()
        .filter(|e| matches!(e, Event::JobFailed { .. }))
        .collect();
    assert_eq!(failed.len(), 1);

    orch.shutdown();
}

#[tokio::test]
async fn permanent_failures_surface_immediately() {
    let orch = engine(fast_config());

    struct PermanentWorker;
    #[async_trait]
    impl JobHandler for PermanentWorker {
        fn job_type(&self) -> &str {
            "broken"
        }
        async fn run(&self, _ctx: JobContext) -> Result<serde_json::Value, JobError> {
            Err(JobError::permanent("repository does not exist"))
        }
    }

    orch.register(Arc::new(PermanentWorker));
    orch.start();
    let mut stream = orch.subscribe();

    let id = orch.create_job("broken", serde_json::json!({})).unwrap();
    let record = wait_for_status(&orch, &id, JobStatus::Failed, Duration::from_secs(5)).await;

    assert_eq!(record.error.unwrap().class, ErrorClass::Permanent);
    let events = drain(&mut stream);
    assert_eq!(
        tags_for(&events, &id),
        vec!["job:created", "job:started", "job:failed"]
    );

    orch.shutdown();
}

#[tokio::test]
async fn no_retry_codes_override_classification() {
    let mut config = fast_config();
    config.retry.no_retry_codes = vec!["ENOREPO".to_string()];
    let deps = EngineDeps {
        classifier: Box::new(sweep_core::DefaultClassifier::new(["ENOREPO".to_string()])),
        ..EngineDeps::default()
    };
    let orch = Orchestrator::new(config, deps, SystemClock);

    struct CodedWorker;
    #[async_trait]
    impl JobHandler for CodedWorker {
        fn job_type(&self) -> &str {
            "coded"
        }
        async fn run(&self, _ctx: JobContext) -> Result<serde_json::Value, JobError> {
            Err(JobError::transient("gone").with_code("ENOREPO"))
        }
    }

    orch.register(Arc::new(CodedWorker));
    orch.start();

    let id = orch.create_job("coded", serde_json::json!({})).unwrap();
    let record = wait_for_status(&orch, &id, JobStatus::Failed, Duration::from_secs(5)).await;
    // Transient by the handler, permanent by the no-retry code set.
    assert_eq!(record.error.unwrap().class, ErrorClass::Permanent);

    orch.shutdown();
}

#[tokio::test]
async fn deadline_exceeded_fails_with_timeout_classification() {
    let mut config = fast_config();
    config.retry.timeout_max = 0;
    config.handler.cancel_grace_ms = 50;
    let orch = engine(config);
    orch.register(Arc::new(
        TestWorker::new("sleepy")
            .with_delay(Duration::from_secs(30))
            .ignoring_cancel()
            .with_timeout_ms(50),
    ));
    orch.start();

    let id = orch.create_job("sleepy", serde_json::json!({})).unwrap();
    let record = wait_for_status(&orch, &id, JobStatus::Failed, Duration::from_secs(5)).await;
    assert_eq!(record.error.unwrap().class, ErrorClass::Timeout);

    orch.shutdown();
}
