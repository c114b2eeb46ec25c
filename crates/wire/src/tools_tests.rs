// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use serde_json::json;

fn call(name: &str, arguments: serde_json::Value) -> ToolCall {
    ToolCall {
        name: name.to_string(),
        arguments,
    }
}

#[test]
fn descriptor_list_is_the_enumerated_surface() {
    let names: Vec<&str> = tool_descriptors().iter().map(|d| d.name).collect();
    assert_eq!(
        names,
        vec![
            "scan_repository",
            "scan_multiple_repositories",
            "get_scan_results",
            "list_jobs",
            "get_cache_status",
            "invalidate_cache",
        ]
    );
}

#[test]
fn scan_repository_parses_into_request() {
    let parsed = ToolRequest::parse(&call(
        "scan_repository",
        json!({ "repository_path": "/repos/a", "options": { "force_refresh": true } }),
    ))
    .unwrap();
    match parsed {
        ToolRequest::ScanRepository(request) => {
            assert_eq!(request.repository_path, PathBuf::from("/repos/a"));
            assert!(request.options.force_refresh);
        }
        other => panic!("unexpected parse: {other:?}"),
    }
}

#[test]
fn get_scan_results_requires_scan_id() {
    let parsed = ToolRequest::parse(&call("get_scan_results", json!({ "scan_id": "job-1" })));
    assert_eq!(
        parsed.unwrap(),
        ToolRequest::GetScanResults {
            scan_id: "job-1".to_string()
        }
    );

    let missing = ToolRequest::parse(&call("get_scan_results", json!({})));
    assert!(matches!(missing, Err(ToolError::BadArguments { .. })));
}

#[test]
fn list_jobs_accepts_empty_arguments() {
    let parsed = ToolRequest::parse(&call("list_jobs", json!({}))).unwrap();
    assert_eq!(parsed, ToolRequest::ListJobs(JobsQuery::default()));
}

#[test]
fn invalidate_cache_requires_a_target() {
    let by_repo = ToolRequest::parse(&call(
        "invalidate_cache",
        json!({ "repository_path": "/repos/a" }),
    ))
    .unwrap();
    assert_eq!(
        by_repo,
        ToolRequest::InvalidateCache {
            fingerprint: None,
            repository_path: Some(PathBuf::from("/repos/a")),
        }
    );

    let neither = ToolRequest::parse(&call("invalidate_cache", json!({})));
    assert!(matches!(neither, Err(ToolError::BadArguments { .. })));
}

#[test]
fn unknown_tool_is_rejected() {
    let parsed = ToolRequest::parse(&call("launch_missiles", json!({})));
    assert!(matches!(parsed, Err(ToolError::UnknownTool(name)) if name == "launch_missiles"));
}

#[test]
fn get_cache_status_takes_no_arguments() {
    let parsed = ToolRequest::parse(&call("get_cache_status", json!({}))).unwrap();
    assert_eq!(parsed, ToolRequest::GetCacheStatus);
}
