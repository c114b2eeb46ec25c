// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use crate::job::JobId;

#[test]
fn generated_ids_carry_prefix_and_are_unique() {
    let a = JobId::generate();
    let b = JobId::generate();
    assert!(a.as_str().starts_with("job-"));
    assert_ne!(a, b);
    assert_eq!(a.suffix().len(), 19);
}

#[test]
fn from_string_round_trips() {
    let id = JobId::new("job-abc123");
    assert_eq!(id.as_str(), "job-abc123");
    assert_eq!(id.suffix(), "abc123");
    assert_eq!(id, "job-abc123");
}

#[test]
fn serde_is_transparent() {
    let id = JobId::new("job-xyz");
    let json = serde_json::to_string(&id).unwrap();
    assert_eq!(json, "\"job-xyz\"");
    let back: JobId = serde_json::from_str(&json).unwrap();
    assert_eq!(back, id);
}

#[test]
fn short_truncates() {
    assert_eq!(crate::id::short("abcdef", 3), "abc");
    assert_eq!(crate::id::short("ab", 3), "ab");
}
