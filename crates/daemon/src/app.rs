// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Application assembly and lifecycle.

use crate::pipelines::{DuplicateScanWorker, MultiScanWorker, RepoCleanupWorker};
use crate::tools::ToolDispatcher;
use std::path::PathBuf;
use std::sync::Arc;
use sweep_adapters::{CommandAnalyzer, CommandGit, GitAdapter, HistorySink, ScanAnalyzer};
use sweep_core::{DefaultClassifier, EngineConfig, SystemClock};
use sweep_engine::{CronEntry, EngineDeps, Orchestrator, ScanCache, SystemOrchestrator};
use thiserror::Error;
use tokio::task::JoinHandle;

/// Startup failures, mapped to exit codes in main.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("configuration error: {0}")]
    Config(#[from] sweep_core::ConfigError),

    #[error("initialization failed: {0}")]
    Init(String),
}

/// The assembled daemon: orchestrator, cache, and pipelines.
pub struct App {
    pub orchestrator: SystemOrchestrator,
    pub cache: ScanCache,
    engine: Option<JoinHandle<()>>,
}

impl App {
    /// Wire adapters, register pipelines, and install cron entries.
    pub fn build(config: EngineConfig, state_dir: PathBuf) -> Result<Self, AppError> {
        let output_dir = config
            .output_dir
            .clone()
            .or_else(|| Some(crate::env::default_output_dir(&state_dir)));
        let workdir_base = crate::env::workdir_base(&state_dir);
        std::fs::create_dir_all(&state_dir)
            .map_err(|e| AppError::Init(format!("state dir {}: {}", state_dir.display(), e)))?;

        let git: Arc<dyn GitAdapter> = Arc::new(CommandGit::new());
        let history = config.history.dir.clone().map(HistorySink::new);
        let deps = EngineDeps {
            git: Some(Arc::clone(&git)),
            history,
            classifier: Box::new(DefaultClassifier::new(
                config.retry.no_retry_codes.iter().cloned(),
            )),
            workdir_base: Some(workdir_base.clone()),
        };
        let orchestrator = Orchestrator::new(config.clone(), deps, SystemClock);
        let cache = ScanCache::new();

        match &config.scan.command {
            Some(command) => {
                let version = config
                    .scan
                    .analyzer_version
                    .clone()
                    .unwrap_or_else(|| "1".to_string());
                let analyzer: Arc<dyn ScanAnalyzer> =
                    Arc::new(CommandAnalyzer::new(command.clone(), version));
                let scanner = Arc::new(DuplicateScanWorker::new(
                    cache.clone(),
                    analyzer,
                    Arc::clone(&git),
                    config.cache.clone(),
                    output_dir.clone(),
                ));
                orchestrator.register(Arc::clone(&scanner) as Arc<dyn sweep_engine::JobHandler>);
                orchestrator.register(Arc::new(MultiScanWorker::new(scanner)));
            }
            None => {
                tracing::warn!("scan.command not configured; scan pipelines disabled");
            }
        }
        orchestrator.register(Arc::new(RepoCleanupWorker::new(
            output_dir,
            Some(workdir_base),
        )));

        for entry in &config.cron {
            let entry = CronEntry::from_config(entry)?;
            orchestrator.add_cron(entry);
        }

        Ok(Self {
            orchestrator,
            cache,
            engine: None,
        })
    }

    /// Start the engine loop.
    pub fn start(&mut self) {
        self.engine = Some(self.orchestrator.start());
    }

    pub fn tools(&self) -> ToolDispatcher {
        ToolDispatcher::new(self.orchestrator.clone(), self.cache.clone())
    }

    /// Block until ctrl-c, then stop the engine.
    pub async fn run_until_interrupted(&mut self) -> std::io::Result<()> {
        tokio::signal::ctrl_c().await?;
        tracing::info!("interrupt received, shutting down");
        self.shutdown().await;
        Ok(())
    }

    pub async fn shutdown(&mut self) {
        self.orchestrator.shutdown();
        if let Some(engine) = self.engine.take() {
            let _ = engine.await;
        }
    }
}
