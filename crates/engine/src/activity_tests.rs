// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use sweep_core::test_support::{completed_event, created_event, failed_event};
use sweep_core::{FakeClock, JobError, Severity};

#[test]
fn ring_is_bounded_and_newest_first() {
    let log = ActivityLog::new(3);
    for i in 0..5 {
        log.push(ActivityRecord::from_event(
            &created_event(&format!("job-{i}"), "noop"),
            i,
        ));
    }
    assert_eq!(log.len(), 3);
    let recent = log.recent(10);
    assert_eq!(recent.len(), 3);
    assert_eq!(recent[0].job_id.as_ref().unwrap(), "job-4");
    assert_eq!(recent[2].job_id.as_ref().unwrap(), "job-2");
}

#[test]
fn recent_respects_requested_count() {
    let log = ActivityLog::new(10);
    for i in 0..4 {
        log.push(ActivityRecord::from_event(
            &completed_event(&format!("job-{i}"), "noop"),
            i,
        ));
    }
    assert_eq!(log.recent(2).len(), 2);
}

#[tokio::test]
async fn attach_pumps_bus_events_into_the_ring() {
    let bus = EventBus::new(16);
    let log = ActivityLog::new(10);
    let handle = log.attach(&bus, FakeClock::at(9_000));

    bus.publish(created_event("job-1", "noop"));
    bus.publish(failed_event("job-1", "noop", JobError::transient("boom")));

    // Wait for the pump task to drain both events
    for _ in 0..100 {
        if log.len() == 2 {
            break;
        }
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
    }

    let recent = log.recent(10);
    assert_eq!(recent.len(), 2);
    assert_eq!(recent[0].kind, "job:failed");
    assert_eq!(recent[0].severity, Severity::Error);
    assert_eq!(recent[0].timestamp_ms, 9_000);
    assert_eq!(recent[1].kind, "job:created");

    handle.abort();
}
