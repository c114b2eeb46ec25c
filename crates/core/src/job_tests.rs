// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::test_support::{queued_record, running_record};
use yare::parameterized;

// ── Retry lineage ───────────────────────────────────────────────────────

#[parameterized(
    plain = { "job-abc", "job-abc" },
    one_level = { "job-abc-retry1", "job-abc" },
    two_levels = { "job-abc-retry1-retry2", "job-abc" },
    deep = { "job-abc-retry1-retry2-retry9", "job-abc" },
    not_a_suffix = { "job-retrya", "job-retrya" },
    digits_in_body = { "job-retry1x-retry3", "job-retry1x" },
)]
fn lineage_root_strips_repeated_suffixes(id: &str, root: &str) {
    assert_eq!(JobId::new(id).lineage_root(), JobId::new(root));
}

#[test]
fn retry_child_and_root_round_trip() {
    let id = JobId::new("job-orig");
    let child = id.retry_child(1);
    let grandchild = child.retry_child(2);
    assert_eq!(child.as_str(), "job-orig-retry1");
    assert_eq!(grandchild.as_str(), "job-orig-retry1-retry2");
    assert!(grandchild.is_retry());
    assert!(!id.is_retry());
    assert_eq!(grandchild.lineage_root(), id);
}

// ── Status machine ──────────────────────────────────────────────────────

#[test]
fn fresh_record_has_queued_invariants() {
    let record = queued_record("job-1", "noop");
    assert_eq!(record.status, JobStatus::Queued);
    assert!(record.started_at_ms.is_none());
    assert!(record.completed_at_ms.is_none());
    assert!(record.result.is_none());
    assert!(record.error.is_none());
}

#[test]
fn start_stamps_and_counts() {
    let mut record = queued_record("job-1", "noop");
    record.start(2_000).unwrap();
    assert_eq!(record.status, JobStatus::Running);
    assert_eq!(record.started_at_ms, Some(2_000));
    assert!(record.attempts >= 1);
    assert!(record.completed_at_ms.is_none());
}

#[test]
fn complete_sets_result_only() {
    let mut record = running_record("job-1", "noop");
    record.complete(serde_json::json!({"ok": true}), 2_000_000).unwrap();
    assert_eq!(record.status, JobStatus::Completed);
    assert!(record.result.is_some());
    assert!(record.error.is_none());
    assert!(record.completed_at_ms.unwrap() >= record.started_at_ms.unwrap());
}

#[test]
fn fail_sets_error_only() {
    let mut record = running_record("job-1", "noop");
    record
        .fail(crate::error::JobError::transient("boom"), 2_000_000)
        .unwrap();
    assert_eq!(record.status, JobStatus::Failed);
    assert!(record.error.is_some());
    assert!(record.result.is_none());
}

#[test]
fn completion_stamp_never_precedes_start() {
    let mut record = queued_record("job-1", "noop");
    record.start(5_000).unwrap();
    // A clock running behind the start stamp still yields completed >= started.
    record.complete(serde_json::json!(null), 4_000).unwrap();
    assert_eq!(record.completed_at_ms, Some(5_000));
}

#[test]
fn cancel_wins_from_any_non_terminal_state() {
    let mut queued = queued_record("job-1", "noop");
    queued.cancel(3_000).unwrap();
    assert_eq!(queued.status, JobStatus::Cancelled);

    let mut running = running_record("job-2", "noop");
    running.cancel(3_000).unwrap();
    assert_eq!(running.status, JobStatus::Cancelled);

    let mut paused = queued_record("job-3", "noop");
    paused.pause().unwrap();
    paused.cancel(3_000).unwrap();
    assert_eq!(paused.status, JobStatus::Cancelled);
}

#[test]
fn terminal_states_are_final() {
    let mut record = running_record("job-1", "noop");
    record.complete(serde_json::json!({}), 2_000_000).unwrap();

    assert!(record.start(9_999_999).is_err());
    assert!(record.cancel(9_999_999).is_err());
    assert!(record
        .fail(crate::error::JobError::transient("late"), 9_999_999)
        .is_err());
    assert_eq!(record.status, JobStatus::Completed);
}

#[test]
fn pause_resume_cycle() {
    let mut record = queued_record("job-1", "noop");
    record.pause().unwrap();
    assert_eq!(record.status, JobStatus::Paused);
    record.resume().unwrap();
    assert_eq!(record.status, JobStatus::Queued);
}

#[test]
fn pause_rejected_while_running() {
    let mut record = running_record("job-1", "noop");
    let err = record.pause().unwrap_err();
    assert_eq!(err.from, JobStatus::Running);
}

#[test]
fn record_serde_round_trip() {
    let mut record = queued_record("job-1", "duplicate-scan");
    record.git = Some(GitInfo {
        branch_name: Some("sweep/duplicate-scan/job-1".into()),
        base_branch: Some("main".into()),
        ..GitInfo::default()
    });
    let json = serde_json::to_string(&record).unwrap();
    let back: JobRecord = serde_json::from_str(&json).unwrap();
    assert_eq!(back, record);
}
