// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Cancellation: queued, running, terminal idempotence, retry chains.

use super::*;

#[tokio::test]
async fn cancel_while_queued_never_starts() {
    let mut config = fast_config();
    config.max_concurrent = Some(1);
    let orch = engine(config);
    orch.register(Arc::new(TestWorker::new("slow").with_delay(Duration::from_secs(2))));
    orch.start();
    let mut stream = orch.subscribe();

    // Fill the single slot, then queue the victim behind it.
    let blocker = orch.create_job("slow", serde_json::json!({})).unwrap();
    wait_for_status(&orch, &blocker, JobStatus::Running, Duration::from_secs(5)).await;
    let victim = orch.create_job("slow", serde_json::json!({})).unwrap();

    let running_before = orch.get_stats().running;
    let result = orch.cancel_job(&victim).unwrap();
    assert!(result.ok);

    let record = orch.get_job(&victim).unwrap();
    assert_eq!(record.status, JobStatus::Cancelled);
    assert!(record.started_at_ms.is_none());
    assert_eq!(orch.get_stats().running, running_before);

    let events = drain(&mut stream);
    assert_eq!(tags_for(&events, &victim), vec!["job:created", "job:cancelled"]);

    orch.cancel_job(&blocker).unwrap();
    orch.shutdown();
}

#[tokio::test]
async fn cancel_while_running_is_cooperative() {
    let orch = engine(fast_config());
    orch.register(Arc::new(TestWorker::new("slow").with_delay(Duration::from_secs(10))));
    orch.start();
    let mut stream = orch.subscribe();

    let id = orch.create_job("slow", serde_json::json!({})).unwrap();
    wait_for_status(&orch, &id, JobStatus::Running, Duration::from_secs(5)).await;
    tokio::time::sleep(Duration::from_millis(100)).await;

    let result = orch.cancel_job(&id).unwrap();
    assert!(result.ok);
    assert_eq!(result.reason.as_deref(), Some("cancellation requested"));

    let record =
        wait_for_status(&orch, &id, JobStatus::Cancelled, Duration::from_secs(2)).await;
    assert!(record.result.is_none());

    let events = drain(&mut stream);
    let tags = tags_for(&events, &id);
    assert_eq!(tags.last(), Some(&"job:cancelled"));
    assert!(!tags.contains(&"job:completed"));
    assert!(!tags.contains(&"job:failed"));

    orch.shutdown();
}

#[tokio::test]
async fn cancel_on_terminal_job_is_a_no_op() {
    let orch = engine(fast_config());
    orch.register(Arc::new(TestWorker::new("noop")));
    orch.start();

    let id = orch.create_job("noop", serde_json::json!({})).unwrap();
    wait_for_status(&orch, &id, JobStatus::Completed, Duration::from_secs(5)).await;

    let first = orch.cancel_job(&id).unwrap();
    assert!(!first.ok);
    assert_eq!(first.reason.as_deref(), Some("already terminal"));

    // Still completed, still idempotent on repeat.
    assert_eq!(orch.get_job(&id).unwrap().status, JobStatus::Completed);
    assert_eq!(orch.cancel_job(&id).unwrap(), first);

    orch.shutdown();
}

#[tokio::test]
async fn cancel_of_unknown_job_is_an_error() {
    let orch = engine(fast_config());
    let err = orch.cancel_job(&JobId::new("job-missing")).unwrap_err();
    assert!(matches!(err, crate::error::EngineError::JobNotFound(_)));
}

#[tokio::test]
async fn cancelling_a_retry_chain_cancels_the_pending_child() {
    let mut config = fast_config();
    // Long retry delay so the pending child is still waiting when we cancel.
    config.retry.base_ms = 30_000;
    config.retry.cap_ms = 60_000;
    let orch = engine(config);
    orch.register(Arc::new(TestWorker::new("flaky").failing_first(u32::MAX)));
    orch.start();
    let mut stream = orch.subscribe();

    let id = orch.create_job("flaky", serde_json::json!({})).unwrap();
    let child_id = id.retry_child(1);

    // Wait until the retry is armed.
    wait_until(
        || orch.get_job(&id).map(|r| r.is_terminal()).unwrap_or(false),
        Duration::from_secs(5),
        "first attempt to settle",
    )
    .await;

    // Cancel by the original id; the chain closes.
    let result = orch.cancel_job(&id).unwrap();
    assert!(result.ok);

    let child = orch.get_job(&child_id).unwrap();
    assert_eq!(child.status, JobStatus::Cancelled);

    let events = drain(&mut stream);
    assert!(events
        .iter()
        .any(|e| matches!(e, Event::JobCancelled { id, .. } if *id == child_id)));

    // The child never runs, even well past where a short delay would fire.
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(orch.get_job(&child_id).unwrap().status, JobStatus::Cancelled);

    orch.shutdown();
}
