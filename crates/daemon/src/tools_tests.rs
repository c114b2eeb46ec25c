// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::pipelines::test_helpers::{scan_fixture, wait_for_status};
use serde_json::json;
use sweep_core::JobStatus;
use sweep_wire::ToolCall;

fn call(name: &str, arguments: serde_json::Value) -> ToolCall {
    ToolCall {
        name: name.to_string(),
        arguments,
    }
}

#[tokio::test]
async fn scan_repository_tool_queues_a_job() {
    let fixture = scan_fixture();
    fixture.orchestrator.start();
    let tools = ToolDispatcher::new(fixture.orchestrator.clone(), fixture.cache.clone());

    let response = tools
        .dispatch(&call(
            "scan_repository",
            json!({ "repository_path": "/repos/a" }),
        ))
        .unwrap();
    assert_eq!(response["status"], "queued");
    let scan_id = response["scanId"].as_str().unwrap().to_string();

    let id = JobId::new(&scan_id);
    wait_for_status(&fixture.orchestrator, &id, JobStatus::Completed).await;

    // get_scan_results returns the snapshot
    let snapshot = tools
        .dispatch(&call("get_scan_results", json!({ "scan_id": scan_id })))
        .unwrap();
    assert_eq!(snapshot["status"], "completed");
    assert_eq!(snapshot["type"], "duplicate-scan");

    fixture.orchestrator.shutdown();
}

#[tokio::test]
async fn unknown_scan_id_is_a_404_shaped_error() {
    let fixture = scan_fixture();
    let tools = ToolDispatcher::new(fixture.orchestrator.clone(), fixture.cache.clone());

    let error = tools
        .dispatch(&call("get_scan_results", json!({ "scan_id": "job-missing" })))
        .unwrap_err();
    assert_eq!(error.error, "not_found");
    assert_eq!(error.status, Some(404));
    assert!(error.timestamp > 0);
}

#[tokio::test]
async fn list_jobs_tool_filters_by_status() {
    let fixture = scan_fixture();
    fixture.orchestrator.start();
    let tools = ToolDispatcher::new(fixture.orchestrator.clone(), fixture.cache.clone());

    let id = fixture
        .orchestrator
        .create_job("duplicate-scan", json!({ "repository_path": "/repos/a" }))
        .unwrap();
    wait_for_status(&fixture.orchestrator, &id, JobStatus::Completed).await;

    let listed = tools
        .dispatch(&call("list_jobs", json!({ "status": "completed" })))
        .unwrap();
    assert_eq!(listed.as_array().unwrap().len(), 1);

    let empty = tools
        .dispatch(&call("list_jobs", json!({ "status": "running" })))
        .unwrap();
    assert!(empty.as_array().unwrap().is_empty());

    fixture.orchestrator.shutdown();
}

#[tokio::test]
async fn cache_status_and_invalidation_tools() {
    let fixture = scan_fixture();
    fixture.orchestrator.start();
    let tools = ToolDispatcher::new(fixture.orchestrator.clone(), fixture.cache.clone());

    let id = fixture
        .orchestrator
        .create_job("duplicate-scan", json!({ "repository_path": "/repos/a" }))
        .unwrap();
    wait_for_status(&fixture.orchestrator, &id, JobStatus::Completed).await;

    let status = tools.dispatch(&call("get_cache_status", json!({}))).unwrap();
    assert_eq!(status["entries"], 1);
    assert_eq!(status["repositories"][0], "/repos/a");

    let removed = tools
        .dispatch(&call(
            "invalidate_cache",
            json!({ "repository_path": "/repos/a" }),
        ))
        .unwrap();
    assert_eq!(removed["removed"], 1);

    let status = tools.dispatch(&call("get_cache_status", json!({}))).unwrap();
    assert_eq!(status["entries"], 0);

    fixture.orchestrator.shutdown();
}

#[tokio::test]
async fn bad_tool_calls_return_the_uniform_error_shape() {
    let fixture = scan_fixture();
    let tools = ToolDispatcher::new(fixture.orchestrator.clone(), fixture.cache.clone());

    let unknown = tools.dispatch(&call("launch_missiles", json!({}))).unwrap_err();
    assert_eq!(unknown.error, "invalid_request");
    assert_eq!(unknown.status, Some(400));

    let bad_args = tools
        .dispatch(&call("scan_repository", json!({ "bogus": true })))
        .unwrap_err();
    assert_eq!(bad_args.status, Some(400));
}

#[tokio::test]
async fn stats_mirror_the_store() {
    let fixture = scan_fixture();
    fixture.orchestrator.start();
    let tools = ToolDispatcher::new(fixture.orchestrator.clone(), fixture.cache.clone());

    let id = fixture
        .orchestrator
        .create_job("duplicate-scan", json!({ "repository_path": "/repos/a" }))
        .unwrap();
    wait_for_status(&fixture.orchestrator, &id, JobStatus::Completed).await;

    let stats = tools.stats();
    assert_eq!(stats.total, 1);
    assert_eq!(stats.completed, 1);

    fixture.orchestrator.shutdown();
}
