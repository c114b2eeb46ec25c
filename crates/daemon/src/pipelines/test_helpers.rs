// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared fixtures for pipeline tests.

use std::sync::Arc;
use std::time::Duration;
use sweep_adapters::{FakeAnalyzer, FakeGit};
use sweep_core::{EngineConfig, JobId, JobStatus, SystemClock};
use sweep_engine::{EngineDeps, Orchestrator, ScanCache, SystemOrchestrator};

pub(crate) struct ScanFixture {
    pub orchestrator: SystemOrchestrator,
    pub cache: ScanCache,
    pub analyzer: Arc<FakeAnalyzer>,
    pub git: FakeGit,
    pub output_dir: tempfile::TempDir,
}

/// Orchestrator with the scan pipelines registered over fakes.
pub(crate) fn scan_fixture() -> ScanFixture {
    let mut config = EngineConfig::default();
    config.retry.base_ms = 10;
    config.retry.cap_ms = 50;
    config.retry.jitter = 0.0;
    let orchestrator = Orchestrator::new(config.clone(), EngineDeps::default(), SystemClock);
    let cache = ScanCache::new();
    let analyzer = Arc::new(FakeAnalyzer::new());
    let git = FakeGit::new();
    let output_dir = tempfile::tempdir().unwrap_or_else(|e| panic!("tempdir: {e}"));

    let scanner = Arc::new(super::DuplicateScanWorker::new(
        cache.clone(),
        Arc::clone(&analyzer) as Arc<dyn sweep_adapters::ScanAnalyzer>,
        Arc::new(git.clone()),
        config.cache.clone(),
        Some(output_dir.path().to_path_buf()),
    ));
    orchestrator.register(Arc::clone(&scanner) as Arc<dyn sweep_engine::JobHandler>);
    orchestrator.register(Arc::new(super::MultiScanWorker::new(scanner)));

    ScanFixture {
        orchestrator,
        cache,
        analyzer,
        git,
        output_dir,
    }
}

pub(crate) async fn wait_for_status(
    orchestrator: &SystemOrchestrator,
    id: &JobId,
    status: JobStatus,
) -> sweep_core::JobRecord {
    let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
    loop {
        if let Some(record) = orchestrator.get_job(id) {
            if record.status == status {
                return record;
            }
        }
        assert!(
            tokio::time::Instant::now() < deadline,
            "timed out waiting for {status} on {id}"
        );
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
}
