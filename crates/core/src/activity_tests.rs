// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::error::JobError;
use crate::test_support::{completed_event, created_event, failed_event};

#[test]
fn info_for_lifecycle_events() {
    let record = ActivityRecord::from_event(&created_event("job-1", "noop"), 1_000);
    assert_eq!(record.kind, "job:created");
    assert_eq!(record.severity, Severity::Info);
    assert_eq!(record.job_id.as_ref().map(|id| id.as_str()), Some("job-1"));
    assert_eq!(record.job_kind.as_deref(), Some("noop"));
    assert_eq!(record.payload["type"], "job:created");
}

#[test]
fn error_severity_for_failures() {
    let event = failed_event("job-1", "noop", JobError::transient("disk full"));
    let record = ActivityRecord::from_event(&event, 2_000);
    assert_eq!(record.severity, Severity::Error);
    assert!(record.message.contains("disk full"));
}

#[test]
fn completed_is_info_with_summary() {
    let record = ActivityRecord::from_event(&completed_event("job-1", "noop"), 3_000);
    assert_eq!(record.severity, Severity::Info);
    assert!(record.message.contains("job-1"));
}

#[test]
fn bus_drop_record_is_warning() {
    let record = ActivityRecord::bus_drop(17, 4_000);
    assert_eq!(record.kind, "bus:drop");
    assert_eq!(record.severity, Severity::Warning);
    assert!(record.message.contains("17"));
    assert_eq!(record.payload["dropped"], 17);
}

#[test]
fn record_serde_round_trip() {
    let record = ActivityRecord::from_event(&created_event("job-1", "noop"), 1_000);
    let json = serde_json::to_string(&record).unwrap();
    let back: ActivityRecord = serde_json::from_str(&json).unwrap();
    assert_eq!(back, record);
}
