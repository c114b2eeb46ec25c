// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Pause/resume at job, kind, and process scope.

use super::*;

#[tokio::test]
async fn paused_queued_job_skips_dispatch_until_resume() {
    let orch = engine(fast_config());
    orch.register(Arc::new(TestWorker::new("noop")));
    // Process-wide pause keeps the job queued long enough to pause it.
    orch.pause();
    orch.start();
    let mut stream = orch.subscribe();

    let id = orch.create_job("noop", serde_json::json!({})).unwrap();
    assert!(orch.pause_job(&id).unwrap().ok);
    assert_eq!(orch.get_job(&id).unwrap().status, JobStatus::Paused);

    // Unpause the process; the job itself is still paused.
    orch.resume();
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(orch.get_job(&id).unwrap().status, JobStatus::Paused);

    assert!(orch.resume_job(&id).unwrap().ok);
    wait_for_status(&orch, &id, JobStatus::Completed, Duration::from_secs(5)).await;

    let events = drain(&mut stream);
    let tags = tags_for(&events, &id);
    assert_eq!(
        tags,
        vec![
            "job:created",
            "job:paused",
            "job:resumed",
            "job:started",
            "job:completed"
        ]
    );

    orch.shutdown();
}

#[tokio::test]
async fn process_pause_blocks_everything() {
    let orch = engine(fast_config());
    orch.register(Arc::new(TestWorker::new("noop")));
    orch.start();

    orch.pause();
    assert!(orch.is_paused());
    let id = orch.create_job("noop", serde_json::json!({})).unwrap();

    tokio::time::sleep(Duration::from_millis(150)).await;
    assert_eq!(orch.get_job(&id).unwrap().status, JobStatus::Queued);

    orch.resume();
    wait_for_status(&orch, &id, JobStatus::Completed, Duration::from_secs(5)).await;

    orch.shutdown();
}

#[tokio::test]
async fn process_wide_pause_wins_over_worker_resume() {
    let orch = engine(fast_config());
    let worker = orch.register(Arc::new(TestWorker::new("scan")));
    orch.start();

    orch.pause();
    worker.pause();
    let id = worker.create_job(serde_json::json!({})).unwrap();

    // Worker-level resume alone must not dispatch anything.
    worker.resume();
    tokio::time::sleep(Duration::from_millis(150)).await;
    assert_eq!(orch.get_job(&id).unwrap().status, JobStatus::Queued);

    orch.resume();
    wait_for_status(&orch, &id, JobStatus::Completed, Duration::from_secs(5)).await;

    orch.shutdown();
}

#[tokio::test]
async fn worker_pause_only_blocks_its_kind() {
    let orch = engine(fast_config());
    let scans = orch.register(Arc::new(TestWorker::new("scan")));
    orch.register(Arc::new(TestWorker::new("cleanup")));
    orch.start();

    scans.set_paused(true);
    let scan_id = scans.create_job(serde_json::json!({})).unwrap();
    let cleanup_id = orch.create_job("cleanup", serde_json::json!({})).unwrap();

    wait_for_status(&orch, &cleanup_id, JobStatus::Completed, Duration::from_secs(5)).await;
    assert_eq!(orch.get_job(&scan_id).unwrap().status, JobStatus::Queued);

    scans.set_paused(false);
    wait_for_status(&orch, &scan_id, JobStatus::Completed, Duration::from_secs(5)).await;

    orch.shutdown();
}

#[tokio::test]
async fn pausing_a_running_job_is_advisory() {
    let orch = engine(fast_config());
    orch.register(Arc::new(TestWorker::new("slow").with_delay(Duration::from_millis(200))));
    orch.start();

    let id = orch.create_job("slow", serde_json::json!({})).unwrap();
    wait_for_status(&orch, &id, JobStatus::Running, Duration::from_secs(5)).await;

    let result = orch.pause_job(&id).unwrap();
    assert!(result.ok);
    assert!(result.reason.unwrap().contains("advisory"));

    // The handler is not interrupted; completion wins.
    wait_for_status(&orch, &id, JobStatus::Completed, Duration::from_secs(5)).await;

    orch.shutdown();
}

#[tokio::test]
async fn advisory_pause_applies_to_the_retry_child() {
    let mut config = fast_config();
    config.retry.base_ms = 50;
    let orch = engine(config);
    orch.register(Arc::new(
        TestWorker::new("flaky")
            .failing_first(1)
            .with_delay(Duration::from_millis(200)),
    ));
    orch.start();

    let id = orch.create_job("flaky", serde_json::json!({})).unwrap();
    wait_for_status(&orch, &id, JobStatus::Running, Duration::from_secs(5)).await;
    assert!(orch.pause_job(&id).unwrap().ok);

    // First attempt fails; the retry child inherits the pause.
    let child_id = id.retry_child(1);
    wait_for_status(&orch, &child_id, JobStatus::Paused, Duration::from_secs(5)).await;

    assert!(orch.resume_job(&child_id).unwrap().ok);
    wait_for_status(&orch, &child_id, JobStatus::Completed, Duration::from_secs(5)).await;

    orch.shutdown();
}

#[tokio::test]
async fn pause_on_terminal_job_is_rejected() {
    let orch = engine(fast_config());
    orch.register(Arc::new(TestWorker::new("noop")));
    orch.start();

    let id = orch.create_job("noop", serde_json::json!({})).unwrap();
    wait_for_status(&orch, &id, JobStatus::Completed, Duration::from_secs(5)).await;

    let result = orch.pause_job(&id).unwrap();
    assert!(!result.ok);
    assert_eq!(result.reason.as_deref(), Some("already terminal"));

    orch.shutdown();
}
