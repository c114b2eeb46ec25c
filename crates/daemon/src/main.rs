// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! sweepd: the pipeline daemon binary.
//!
//! Exit codes: 0 normal, 1 initialization failure, 2 invalid
//! configuration, 130 interrupted.

use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use sweep_core::EngineConfig;
use sweep_daemon::{App, AppError};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "sweepd", about = "Cron-driven repository scan pipeline daemon")]
struct Args {
    /// Path to the TOML configuration file.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Override the state directory.
    #[arg(long)]
    state_dir: Option<PathBuf>,
}

const EXIT_INIT_FAILURE: u8 = 1;
const EXIT_CONFIG_INVALID: u8 = 2;
const EXIT_INTERRUPTED: u8 = 130;

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();

    let config = match load_config(&args) {
        Ok(config) => config,
        Err(e) => {
            tracing::error!(error = %e, "invalid configuration");
            return ExitCode::from(EXIT_CONFIG_INVALID);
        }
    };

    let Some(state_dir) = args.state_dir.or_else(sweep_daemon::env::state_dir) else {
        tracing::error!("could not determine a state directory");
        return ExitCode::from(EXIT_INIT_FAILURE);
    };

    let mut app = match App::build(config, state_dir) {
        Ok(app) => app,
        Err(AppError::Config(e)) => {
            tracing::error!(error = %e, "invalid configuration");
            return ExitCode::from(EXIT_CONFIG_INVALID);
        }
        Err(e) => {
            tracing::error!(error = %e, "startup failed");
            return ExitCode::from(EXIT_INIT_FAILURE);
        }
    };

    app.start();
    tracing::info!("sweepd running");

    match app.run_until_interrupted().await {
        Ok(()) => ExitCode::from(EXIT_INTERRUPTED),
        Err(e) => {
            tracing::error!(error = %e, "signal handling failed");
            ExitCode::from(EXIT_INIT_FAILURE)
        }
    }
}

fn load_config(args: &Args) -> Result<EngineConfig, sweep_core::ConfigError> {
    match &args.config {
        Some(path) => EngineConfig::load(path),
        None => Ok(EngineConfig::default()),
    }
}
