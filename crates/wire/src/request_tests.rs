// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn scan_request_defaults_options() {
    let request: CreateScanRequest =
        serde_json::from_str(r#"{ "repository_path": "/repos/a" }"#).unwrap();
    assert_eq!(request.repository_path, PathBuf::from("/repos/a"));
    assert!(!request.options.force_refresh);
    assert!(request.options.cache_enabled);
    assert_eq!(request.options.max_depth, None);
}

#[test]
fn scan_request_rejects_unknown_fields() {
    let result: Result<CreateScanRequest, _> =
        serde_json::from_str(r#"{ "repository_path": "/a", "bogus": 1 }"#);
    assert!(result.is_err());
}

#[test]
fn multi_scan_request_parses() {
    let request: CreateMultiScanRequest = serde_json::from_str(
        r#"{
            "repository_paths": ["/repos/a", "/repos/b"],
            "group_name": "frontends",
            "options": { "include_tests": true }
        }"#,
    )
    .unwrap();
    assert_eq!(request.repository_paths.len(), 2);
    assert_eq!(request.group_name.as_deref(), Some("frontends"));
    assert!(request.options.include_tests);
}

#[test]
fn jobs_query_maps_type_key() {
    let query: JobsQuery =
        serde_json::from_str(r#"{ "status": "running", "type": "duplicate-scan", "limit": 5 }"#)
            .unwrap();
    assert_eq!(query.status, Some(JobStatus::Running));
    assert_eq!(query.kind.as_deref(), Some("duplicate-scan"));
    assert_eq!(query.limit, Some(5));

    let empty: JobsQuery = serde_json::from_str("{}").unwrap();
    assert_eq!(empty, JobsQuery::default());
}
