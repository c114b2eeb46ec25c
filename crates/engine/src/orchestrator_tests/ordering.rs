// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! FIFO admission and per-subscriber delivery order.

use super::*;

#[tokio::test]
async fn fifo_start_order_at_cap_one() {
    let mut config = fast_config();
    config.max_concurrent = Some(1);
    let orch = engine(config);
    orch.register(Arc::new(TestWorker::new("noop").with_delay(Duration::from_millis(30))));
    orch.start();
    let mut stream = orch.subscribe();

    let first = orch.create_job("noop", serde_json::json!({ "n": 1 })).unwrap();
    let second = orch.create_job("noop", serde_json::json!({ "n": 2 })).unwrap();
    let third = orch.create_job("noop", serde_json::json!({ "n": 3 })).unwrap();

    wait_for_status(&orch, &third, JobStatus::Completed, Duration::from_secs(5)).await;

    let events = drain(&mut stream);
    let started: Vec<&JobId> = events
        .iter()
        .filter_map(|e| match e {
            Event::JobStarted { id, .. } => Some(id),
            _ => None,
        })
        .collect();
    assert_eq!(started, vec![&first, &second, &third]);

    // With cap 1, started_at stamps are strictly ordered too.
    let t1 = orch.get_job(&first).unwrap().started_at_ms.unwrap();
    let t2 = orch.get_job(&second).unwrap().started_at_ms.unwrap();
    let t3 = orch.get_job(&third).unwrap().started_at_ms.unwrap();
    assert!(t1 <= t2 && t2 <= t3);

    orch.shutdown();
}

#[tokio::test]
async fn per_job_lifecycle_order_is_preserved_for_subscribers() {
    let orch = engine(fast_config());
    orch.register(Arc::new(TestWorker::new("noop")));
    orch.start();
    let mut stream = orch.subscribe();

    let ids: Vec<JobId> = (0..5)
        .map(|i| orch.create_job("noop", serde_json::json!({ "n": i })).unwrap())
        .collect();
    for id in &ids {
        wait_for_status(&orch, id, JobStatus::Completed, Duration::from_secs(5)).await;
    }

    let events = drain(&mut stream);
    for id in &ids {
        assert_eq!(
            tags_for(&events, id),
            vec!["job:created", "job:started", "job:completed"],
            "lifecycle order violated for {id}"
        );
    }

    orch.shutdown();
}

#[tokio::test]
async fn concurrency_cap_bounds_running_jobs() {
    let mut config = fast_config();
    config.max_concurrent = Some(2);
    let orch = engine(config);
    orch.register(Arc::new(TestWorker::new("slow").with_delay(Duration::from_millis(150))));
    orch.start();

    let ids: Vec<JobId> = (0..5)
        .map(|_| orch.create_job("slow", serde_json::json!({})).unwrap())
        .collect();

    // Sample the running count while the queue drains.
    let mut max_running = 0;
    for _ in 0..100 {
        max_running = max_running.max(orch.get_stats().running);
        if ids
            .iter()
            .all(|id| orch.get_job(id).map(|r| r.is_terminal()).unwrap_or(false))
        {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    assert!(max_running <= 2, "running count exceeded the cap: {max_running}");
    assert!(max_running > 0);

    orch.shutdown();
}

#[tokio::test]
async fn per_kind_cap_holds_while_other_kinds_proceed() {
    let mut config = fast_config();
    config.max_concurrent = Some(4);
    let orch = engine(config);

    struct CappedWorker(TestWorker);
    #[async_trait]
    impl JobHandler for CappedWorker {
        fn job_type(&self) -> &str {
            self.0.job_type()
        }
        fn max_concurrent(&self) -> Option<usize> {
            Some(1)
        }
        async fn run(&self, ctx: JobContext) -> Result<serde_json::Value, JobError> {
            self.0.run(ctx).await
        }
    }

    orch.register(Arc::new(CappedWorker(
        TestWorker::new("scan").with_delay(Duration::from_millis(100)),
    )));
    orch.register(Arc::new(TestWorker::new("cleanup")));
    orch.start();

    let scan_a = orch.create_job("scan", serde_json::json!({})).unwrap();
    let scan_b = orch.create_job("scan", serde_json::json!({})).unwrap();
    let cleanup = orch.create_job("cleanup", serde_json::json!({})).unwrap();

    // The second scan must wait for the first even though global capacity
    // is free; cleanup passes it.
    wait_for_status(&orch, &cleanup, JobStatus::Completed, Duration::from_secs(5)).await;
    let scans_running = orch.stats_for_kind("scan").running;
    assert!(scans_running <= 1);

    wait_for_status(&orch, &scan_a, JobStatus::Completed, Duration::from_secs(5)).await;
    wait_for_status(&orch, &scan_b, JobStatus::Completed, Duration::from_secs(5)).await;

    orch.shutdown();
}
