// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Cron trigger: interval fires, startup fires, and concurrency guards.

use super::*;
use crate::cron::CronEntry;
use crate::store::JobFilter;

fn entry(name: &str, every: Duration) -> CronEntry {
    CronEntry {
        name: name.to_string(),
        kind: "noop".to_string(),
        every,
        data: serde_json::json!({ "from": name }),
        run_on_startup: false,
        skip_if_queued: false,
        max_active: 0,
    }
}

fn cron_jobs(orch: &Orchestrator<SystemClock>, name: &str) -> Vec<sweep_core::JobRecord> {
    orch.list_jobs(&JobFilter::default())
        .into_iter()
        .filter(|r| r.cron.as_deref() == Some(name))
        .collect()
}

#[tokio::test]
async fn interval_fire_creates_a_job() {
    let orch = engine(fast_config());
    orch.register(Arc::new(TestWorker::new("noop")));
    orch.add_cron(entry("ticker", Duration::from_millis(60)));
    orch.start();

    wait_until(
        || !cron_jobs(&orch, "ticker").is_empty(),
        Duration::from_secs(5),
        "first cron fire",
    )
    .await;

    let jobs = cron_jobs(&orch, "ticker");
    assert!(jobs.iter().all(|r| r.kind == "noop"));
    assert_eq!(jobs[0].data["from"], "ticker");

    orch.shutdown();
}

#[tokio::test]
async fn run_on_startup_fires_immediately_once() {
    let orch = engine(fast_config());
    orch.register(Arc::new(TestWorker::new("noop")));
    let mut startup = entry("boot", Duration::from_secs(600));
    startup.run_on_startup = true;
    orch.add_cron(startup);
    orch.start();

    wait_until(
        || !cron_jobs(&orch, "boot").is_empty(),
        Duration::from_secs(2),
        "startup fire",
    )
    .await;
    tokio::time::sleep(Duration::from_millis(150)).await;
    assert_eq!(cron_jobs(&orch, "boot").len(), 1);

    orch.shutdown();
}

#[tokio::test]
async fn skip_if_queued_coalesces_while_saturated() {
    let orch = engine(fast_config());
    orch.register(Arc::new(TestWorker::new("noop")));
    // Paused process keeps the first job queued; subsequent fires skip.
    orch.pause();
    let mut guarded = entry("guarded", Duration::from_millis(40));
    guarded.skip_if_queued = true;
    orch.add_cron(guarded);
    orch.start();

    wait_until(
        || !cron_jobs(&orch, "guarded").is_empty(),
        Duration::from_secs(2),
        "first fire",
    )
    .await;
    tokio::time::sleep(Duration::from_millis(300)).await;
    assert_eq!(cron_jobs(&orch, "guarded").len(), 1, "fires were skipped");

    orch.resume();
    orch.shutdown();
}

#[tokio::test]
async fn max_active_bounds_spawned_jobs() {
    let orch = engine(fast_config());
    orch.register(Arc::new(TestWorker::new("noop").with_delay(Duration::from_secs(5))));
    let mut bounded = entry("bounded", Duration::from_millis(40));
    bounded.max_active = 1;
    orch.add_cron(bounded);
    orch.start();

    wait_until(
        || !cron_jobs(&orch, "bounded").is_empty(),
        Duration::from_secs(2),
        "first fire",
    )
    .await;
    tokio::time::sleep(Duration::from_millis(300)).await;
    // The first job is still running; every later fire was skipped.
    assert_eq!(cron_jobs(&orch, "bounded").len(), 1);

    orch.shutdown();
}

#[tokio::test]
async fn without_guards_cron_keeps_producing() {
    let orch = engine(fast_config());
    orch.register(Arc::new(TestWorker::new("noop")));
    orch.add_cron(entry("steady", Duration::from_millis(40)));
    orch.start();

    wait_until(
        || cron_jobs(&orch, "steady").len() >= 3,
        Duration::from_secs(5),
        "repeated fires",
    )
    .await;

    orch.shutdown();
}
