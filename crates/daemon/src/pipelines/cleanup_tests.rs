// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use std::sync::Arc;
use sweep_core::{EngineConfig, JobStatus, SystemClock};
use sweep_engine::{EngineDeps, Orchestrator, SystemOrchestrator};

struct CleanupFixture {
    orchestrator: SystemOrchestrator,
    output_dir: tempfile::TempDir,
    workdir_base: tempfile::TempDir,
}

fn fixture() -> CleanupFixture {
    let output_dir = tempfile::tempdir().unwrap();
    let workdir_base = tempfile::tempdir().unwrap();
    let orchestrator =
        Orchestrator::new(EngineConfig::default(), EngineDeps::default(), SystemClock);
    orchestrator.register(Arc::new(RepoCleanupWorker::new(
        Some(output_dir.path().to_path_buf()),
        Some(workdir_base.path().to_path_buf()),
    )));
    CleanupFixture {
        orchestrator,
        output_dir,
        workdir_base,
    }
}

async fn run_cleanup(fixture: &CleanupFixture, data: serde_json::Value) -> serde_json::Value {
    let id = fixture
        .orchestrator
        .create_job(CLEANUP_KIND, data)
        .unwrap();
    let record = crate::pipelines::test_helpers::wait_for_status(
        &fixture.orchestrator,
        &id,
        JobStatus::Completed,
    )
    .await;
    record.result.unwrap()
}

#[tokio::test]
async fn zero_age_prunes_everything() {
    let fixture = fixture();
    std::fs::write(fixture.output_dir.path().join("scan-old.json"), b"{}").unwrap();
    std::fs::write(fixture.output_dir.path().join("scan-older.json"), b"{}").unwrap();
    std::fs::create_dir(fixture.workdir_base.path().join("job-stale")).unwrap();
    fixture.orchestrator.start();

    let result = run_cleanup(&fixture, serde_json::json!({ "max_age_ms": 0 })).await;

    assert_eq!(result["removed_outputs"], 2);
    assert_eq!(result["removed_workdirs"], 1);
    assert!(!fixture.output_dir.path().join("scan-old.json").exists());
    assert!(!fixture.workdir_base.path().join("job-stale").exists());

    fixture.orchestrator.shutdown();
}

#[tokio::test]
async fn fresh_files_survive_the_default_age() {
    let fixture = fixture();
    std::fs::write(fixture.output_dir.path().join("scan-new.json"), b"{}").unwrap();
    fixture.orchestrator.start();

    let result = run_cleanup(&fixture, serde_json::json!({})).await;

    assert_eq!(result["removed_outputs"], 0);
    assert!(fixture.output_dir.path().join("scan-new.json").exists());

    fixture.orchestrator.shutdown();
}

#[tokio::test]
async fn missing_directories_are_a_clean_no_op() {
    let orchestrator =
        Orchestrator::new(EngineConfig::default(), EngineDeps::default(), SystemClock);
    orchestrator.register(Arc::new(RepoCleanupWorker::new(
        Some("/nonexistent/outputs".into()),
        None,
    )));
    orchestrator.start();

    let id = orchestrator
        .create_job(CLEANUP_KIND, serde_json::json!({}))
        .unwrap();
    let record =
        crate::pipelines::test_helpers::wait_for_status(&orchestrator, &id, JobStatus::Completed).await;
    assert_eq!(record.result.unwrap()["removed_outputs"], 0);

    orchestrator.shutdown();
}
