// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use std::time::Duration;

fn id(s: &str) -> JobId {
    JobId::new(s)
}

#[test]
fn fifo_pop_order() {
    let mut sched = Scheduler::new(2);
    sched.enqueue(id("job-1"), "noop", 1_000);
    sched.enqueue(id("job-2"), "noop", 1_000);
    sched.enqueue(id("job-3"), "noop", 2_000);

    assert_eq!(sched.pop_ready().unwrap().job_id, "job-1");
    assert_eq!(sched.pop_ready().unwrap().job_id, "job-2");
    // At capacity now
    assert!(sched.pop_ready().is_none());

    sched.finish(&id("job-1"), "noop");
    assert_eq!(sched.pop_ready().unwrap().job_id, "job-3");
}

#[test]
fn concurrency_cap_is_hard() {
    let mut sched = Scheduler::new(1);
    sched.enqueue(id("job-1"), "noop", 1_000);
    sched.enqueue(id("job-2"), "noop", 1_000);

    assert!(sched.pop_ready().is_some());
    assert!(sched.pop_ready().is_none());
    assert_eq!(sched.active_len(), 1);
    assert_eq!(sched.queued_len(), 1);
}

#[test]
fn kind_cap_limits_without_blocking_other_kinds() {
    let mut sched = Scheduler::new(10);
    sched.set_kind_cap("scan", 1);
    sched.enqueue(id("job-1"), "scan", 1_000);
    sched.enqueue(id("job-2"), "scan", 1_000);
    sched.enqueue(id("job-3"), "cleanup", 1_000);

    assert_eq!(sched.pop_ready().unwrap().job_id, "job-1");
    // Second scan blocked by the kind cap; cleanup admitted past it.
    assert_eq!(sched.pop_ready().unwrap().job_id, "job-3");
    assert!(sched.pop_ready().is_none());

    sched.finish(&id("job-1"), "scan");
    assert_eq!(sched.pop_ready().unwrap().job_id, "job-2");
}

#[test]
fn process_pause_blocks_all_dispatch() {
    let mut sched = Scheduler::new(2);
    sched.enqueue(id("job-1"), "noop", 1_000);
    sched.pause_all();
    assert!(sched.pop_ready().is_none());
    sched.resume_all();
    assert!(sched.pop_ready().is_some());
}

#[test]
fn paused_job_keeps_queue_position() {
    let mut sched = Scheduler::new(1);
    sched.enqueue(id("job-1"), "noop", 1_000);
    sched.enqueue(id("job-2"), "noop", 1_000);
    sched.pause_job(&id("job-1"));

    // job-2 dispatches past the paused head
    assert_eq!(sched.pop_ready().unwrap().job_id, "job-2");
    sched.finish(&id("job-2"), "noop");
    assert!(sched.pop_ready().is_none());

    // Resuming restores job-1 at its original position
    sched.resume_job(&id("job-1"));
    assert_eq!(sched.pop_ready().unwrap().job_id, "job-1");
}

#[test]
fn paused_kind_blocks_only_that_kind() {
    let mut sched = Scheduler::new(4);
    sched.enqueue(id("job-1"), "scan", 1_000);
    sched.enqueue(id("job-2"), "cleanup", 1_000);
    sched.pause_kind("scan");

    assert_eq!(sched.pop_ready().unwrap().job_id, "job-2");
    assert!(sched.pop_ready().is_none());

    sched.resume_kind("scan");
    assert_eq!(sched.pop_ready().unwrap().job_id, "job-1");
}

#[test]
fn remove_drops_queued_entry() {
    let mut sched = Scheduler::new(1);
    sched.enqueue(id("job-1"), "noop", 1_000);
    assert!(sched.remove(&id("job-1")));
    assert!(!sched.remove(&id("job-1")));
    assert!(sched.pop_ready().is_none());
}

#[test]
fn timer_lifecycle() {
    let mut sched = Scheduler::new(1);
    let start = Instant::now();

    sched.set_timer(TimerId::cron("nightly"), Duration::from_secs(10), start);
    assert!(sched.has_timers());
    assert_eq!(sched.next_deadline(), Some(start + Duration::from_secs(10)));

    // Not due yet
    assert!(sched.fired_timers(start + Duration::from_secs(5)).is_empty());
    assert!(sched.has_timers());

    // Fires once
    let fired = sched.fired_timers(start + Duration::from_secs(11));
    assert_eq!(fired.len(), 1);
    assert_eq!(fired[0], TimerId::cron("nightly"));
    assert!(!sched.has_timers());
}

#[test]
fn cancelled_timer_never_fires() {
    let mut sched = Scheduler::new(1);
    let start = Instant::now();
    let timer = TimerId::retry(&id("job-1-retry1"));

    sched.set_timer(timer.clone(), Duration::from_millis(10), start);
    assert!(sched.cancel_timer(&timer));
    assert!(sched.fired_timers(start + Duration::from_secs(1)).is_empty());
}

#[test]
fn fired_timers_come_back_earliest_first() {
    let mut sched = Scheduler::new(1);
    let start = Instant::now();
    sched.set_timer(TimerId::cron("b"), Duration::from_millis(20), start);
    sched.set_timer(TimerId::cron("a"), Duration::from_millis(10), start);

    let fired = sched.fired_timers(start + Duration::from_millis(30));
    assert_eq!(fired, vec![TimerId::cron("a"), TimerId::cron("b")]);
}
