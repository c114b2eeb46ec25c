// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::pipelines::test_helpers::{scan_fixture, wait_for_status};
use sweep_core::JobStatus;

fn scan_data(repo: &str) -> serde_json::Value {
    serde_json::json!({ "repository_path": repo })
}

#[tokio::test]
async fn scan_completes_and_writes_output() {
    let fixture = scan_fixture();
    fixture.orchestrator.start();
    let mut stream = fixture.orchestrator.subscribe();

    let id = fixture
        .orchestrator
        .create_job(SCAN_KIND, scan_data("/repos/a"))
        .unwrap();
    let record = wait_for_status(&fixture.orchestrator, &id, JobStatus::Completed).await;

    let result = record.result.unwrap();
    assert_eq!(result["cached"], false);
    assert_eq!(result["repository"], "/repos/a");
    assert!(result["fingerprint"].as_str().unwrap().len() == 64);

    // Result JSON written under the output dir
    let output_path = std::path::PathBuf::from(result["output_path"].as_str().unwrap());
    assert!(output_path.starts_with(fixture.output_dir.path()));
    let body: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&output_path).unwrap()).unwrap();
    assert_eq!(body["job_id"], id.as_str());
    assert_eq!(body["schema_version"], 1);

    // scan:started → cache:miss → scan:completed on the bus
    let mut tags = Vec::new();
    while let Some(event) = stream.try_recv() {
        if event.job_id() == Some(&id) {
            tags.push(event.tag().to_string());
        }
    }
    assert!(tags.contains(&"scan:started".to_string()));
    assert!(tags.contains(&"cache:miss".to_string()));
    assert!(tags.contains(&"scan:completed".to_string()));

    fixture.orchestrator.shutdown();
}

#[tokio::test]
async fn repeat_scan_is_served_from_cache() {
    let fixture = scan_fixture();
    fixture.orchestrator.start();

    let first = fixture
        .orchestrator
        .create_job(SCAN_KIND, scan_data("/repos/a"))
        .unwrap();
    wait_for_status(&fixture.orchestrator, &first, JobStatus::Completed).await;

    let second = fixture
        .orchestrator
        .create_job(SCAN_KIND, scan_data("/repos/a"))
        .unwrap();
    let record = wait_for_status(&fixture.orchestrator, &second, JobStatus::Completed).await;

    assert_eq!(fixture.analyzer.calls(), 1, "cache hit skipped the analyzer");
    assert_eq!(record.result.unwrap()["cached"], true);

    fixture.orchestrator.shutdown();
}

#[tokio::test]
async fn force_refresh_rebuilds_and_invalidates() {
    let fixture = scan_fixture();
    fixture.orchestrator.start();

    let first = fixture
        .orchestrator
        .create_job(SCAN_KIND, scan_data("/repos/a"))
        .unwrap();
    wait_for_status(&fixture.orchestrator, &first, JobStatus::Completed).await;

    let mut stream = fixture.orchestrator.subscribe();
    let second = fixture
        .orchestrator
        .create_job(
            SCAN_KIND,
            serde_json::json!({
                "repository_path": "/repos/a",
                "options": { "force_refresh": true }
            }),
        )
        .unwrap();
    wait_for_status(&fixture.orchestrator, &second, JobStatus::Completed).await;

    // The cached entry was invalidated and rebuilt.
    assert_eq!(fixture.analyzer.calls(), 2);
    let mut saw_invalidated = false;
    let mut saw_miss = false;
    while let Some(event) = stream.try_recv() {
        match event.tag() {
            "cache:invalidated" => saw_invalidated = true,
            "cache:miss" => saw_miss = true,
            _ => {}
        }
    }
    assert!(saw_invalidated);
    assert!(saw_miss);

    fixture.orchestrator.shutdown();
}

#[tokio::test]
async fn invalid_scan_request_fails_permanently() {
    let fixture = scan_fixture();
    fixture.orchestrator.start();

    let id = fixture
        .orchestrator
        .create_job(SCAN_KIND, serde_json::json!({ "nonsense": true }))
        .unwrap();
    let record = wait_for_status(&fixture.orchestrator, &id, JobStatus::Failed).await;
    assert_eq!(
        record.error.unwrap().class,
        sweep_core::ErrorClass::Permanent
    );

    fixture.orchestrator.shutdown();
}

#[tokio::test]
async fn multi_scan_covers_every_repository() {
    let fixture = scan_fixture();
    fixture.orchestrator.start();

    let id = fixture
        .orchestrator
        .create_job(
            MULTI_SCAN_KIND,
            serde_json::json!({
                "repository_paths": ["/repos/a", "/repos/b"],
                "group_name": "frontends"
            }),
        )
        .unwrap();
    let record = wait_for_status(&fixture.orchestrator, &id, JobStatus::Completed).await;

    let result = record.result.unwrap();
    assert_eq!(result["group_name"], "frontends");
    assert_eq!(result["total"], 2);
    assert_eq!(result["failed"], 0);
    assert_eq!(result["scans"].as_array().unwrap().len(), 2);
    // Two distinct repositories, two builds
    assert_eq!(fixture.analyzer.calls(), 2);

    fixture.orchestrator.shutdown();
}

#[tokio::test]
async fn multi_scan_with_no_repositories_is_rejected() {
    let fixture = scan_fixture();
    fixture.orchestrator.start();

    let id = fixture
        .orchestrator
        .create_job(MULTI_SCAN_KIND, serde_json::json!({ "repository_paths": [] }))
        .unwrap();
    let record = wait_for_status(&fixture.orchestrator, &id, JobStatus::Failed).await;
    assert_eq!(
        record.error.unwrap().class,
        sweep_core::ErrorClass::Permanent
    );

    fixture.orchestrator.shutdown();
}

#[tokio::test]
async fn multi_scan_reports_partial_failures() {
    let fixture = scan_fixture();
    // First analyze call fails, second succeeds.
    fixture.analyzer.set_fail_next(1);
    fixture.orchestrator.start();

    let id = fixture
        .orchestrator
        .create_job(
            MULTI_SCAN_KIND,
            serde_json::json!({ "repository_paths": ["/repos/a", "/repos/b"] }),
        )
        .unwrap();
    let record = wait_for_status(&fixture.orchestrator, &id, JobStatus::Completed).await;

    let result = record.result.unwrap();
    assert_eq!(result["failed"], 1);
    let scans = result["scans"].as_array().unwrap();
    assert_eq!(scans.iter().filter(|s| s["ok"] == true).count(), 1);
    assert_eq!(scans.iter().filter(|s| s["ok"] == false).count(), 1);

    fixture.orchestrator.shutdown();
}
