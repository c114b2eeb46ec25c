// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use sweep_core::test_support::running_record;

#[test]
fn appends_one_line_per_record() {
    let dir = tempfile::tempdir().unwrap();
    let sink = HistorySink::new(dir.path().to_path_buf());

    let mut first = running_record("job-1", "noop");
    first.complete(serde_json::json!({"ok": true}), 2_000_000).unwrap();
    let mut second = running_record("job-2", "noop");
    second
        .fail(sweep_core::JobError::transient("boom"), 2_000_000)
        .unwrap();

    sink.append(&first);
    sink.append(&second);

    let text = std::fs::read_to_string(dir.path().join("history.ndjson")).unwrap();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines.len(), 2);

    let parsed: serde_json::Value = serde_json::from_str(lines[0]).unwrap();
    assert_eq!(parsed["id"], "job-1");
    assert_eq!(parsed["status"], "completed");
    assert!(parsed["recorded_at"].as_str().unwrap().ends_with('Z'));

    let parsed: serde_json::Value = serde_json::from_str(lines[1]).unwrap();
    assert_eq!(parsed["status"], "failed");
    assert_eq!(parsed["error"]["message"], "boom");
}

#[test]
fn creates_parent_directories() {
    let dir = tempfile::tempdir().unwrap();
    let sink = HistorySink::new(dir.path().join("nested/logs"));
    let mut record = running_record("job-1", "noop");
    record.complete(serde_json::json!(null), 2_000_000).unwrap();
    sink.append(&record);
    assert!(dir.path().join("nested/logs/history.ndjson").exists());
}
