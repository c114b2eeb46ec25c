// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use sweep_core::test_support::queued_record;

fn completed(id: &str, kind: &str, at_ms: u64) -> JobRecord {
    let mut record = queued_record(id, kind);
    record.created_at_ms = at_ms;
    record.start(at_ms + 1).unwrap();
    record.complete(serde_json::json!({}), at_ms + 2).unwrap();
    record
}

#[test]
fn insert_get_round_trip() {
    let mut store = JobStore::new(10);
    let record = queued_record("job-1", "noop");
    store.insert(record.clone()).unwrap();
    assert_eq!(store.get(&record.id), Some(record));
}

#[test]
fn duplicate_insert_rejected() {
    let mut store = JobStore::new(10);
    store.insert(queued_record("job-1", "noop")).unwrap();
    assert!(store.insert(queued_record("job-1", "noop")).is_err());
}

#[test]
fn archive_moves_terminal_records_to_history() {
    let mut store = JobStore::new(10);
    store.insert(completed("job-1", "noop", 1_000)).unwrap();
    let id = sweep_core::JobId::new("job-1");

    assert!(store.archive(&id));
    assert!(!store.contains_live(&id));
    assert_eq!(store.history_len(), 1);
    // Still queryable after archive
    assert_eq!(store.get(&id).unwrap().status, JobStatus::Completed);
}

#[test]
fn archive_refuses_non_terminal_records() {
    let mut store = JobStore::new(10);
    store.insert(queued_record("job-1", "noop")).unwrap();
    let id = sweep_core::JobId::new("job-1");
    assert!(!store.archive(&id));
    assert!(store.contains_live(&id));
}

#[test]
fn history_ring_is_bounded() {
    let mut store = JobStore::new(3);
    for i in 0..5 {
        let id = format!("job-{i}");
        store.insert(completed(&id, "noop", 1_000 + i)).unwrap();
        store.archive(&sweep_core::JobId::new(&id));
    }
    assert_eq!(store.history_len(), 3);
    // Oldest two evicted from the ring
    assert!(store.get(&sweep_core::JobId::new("job-0")).is_none());
    assert!(store.get(&sweep_core::JobId::new("job-4")).is_some());
    // Counters survive eviction
    assert_eq!(store.stats().completed, 5);
    assert_eq!(store.stats().total, 5);
}

#[test]
fn list_filters_and_orders_newest_first() {
    let mut store = JobStore::new(10);
    let mut a = queued_record("job-a", "scan");
    a.created_at_ms = 1_000;
    let mut b = queued_record("job-b", "cleanup");
    b.created_at_ms = 2_000;
    let mut c = queued_record("job-c", "scan");
    c.created_at_ms = 3_000;
    store.insert(a).unwrap();
    store.insert(b).unwrap();
    store.insert(c).unwrap();

    let scans = store.list(&JobFilter {
        kind: Some("scan".to_string()),
        ..JobFilter::default()
    });
    assert_eq!(scans.len(), 2);
    assert_eq!(scans[0].id, "job-c");
    assert_eq!(scans[1].id, "job-a");

    let limited = store.list(&JobFilter {
        limit: Some(1),
        ..JobFilter::default()
    });
    assert_eq!(limited.len(), 1);
    assert_eq!(limited[0].id, "job-c");

    let queued = store.list(&JobFilter {
        status: Some(JobStatus::Queued),
        ..JobFilter::default()
    });
    assert_eq!(queued.len(), 3);
}

#[test]
fn stats_track_live_and_terminal() {
    let mut store = JobStore::new(10);
    store.insert(queued_record("job-1", "noop")).unwrap();
    let mut running = queued_record("job-2", "noop");
    running.start(1_000).unwrap();
    store.insert(running).unwrap();
    store.insert(completed("job-3", "noop", 1_000)).unwrap();
    store.archive(&sweep_core::JobId::new("job-3"));

    let stats = store.stats();
    assert_eq!(stats.total, 3);
    assert_eq!(stats.queued, 1);
    assert_eq!(stats.running, 1);
    assert_eq!(stats.completed, 1);
    assert_eq!(stats.failed, 0);
}

#[test]
fn cron_job_counting() {
    let mut store = JobStore::new(10);
    let mut a = queued_record("job-1", "scan");
    a.cron = Some("nightly".to_string());
    let mut b = queued_record("job-2", "scan");
    b.cron = Some("nightly".to_string());
    b.start(1_000).unwrap();
    store.insert(a).unwrap();
    store.insert(b).unwrap();

    assert_eq!(store.count_active_cron_jobs("nightly"), 2);
    assert_eq!(store.count_queued_cron_jobs("nightly"), 1);
    assert_eq!(store.count_active_cron_jobs("other"), 0);
}
