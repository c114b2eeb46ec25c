// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Repo-cleanup pipeline: prunes aged scan outputs and leftover scratch
//! directories.

use async_trait::async_trait;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};
use sweep_core::JobError;
use sweep_engine::{JobContext, JobHandler};

pub const CLEANUP_KIND: &str = "repo-cleanup";

const DEFAULT_MAX_AGE_MS: u64 = 7 * 24 * 3600 * 1000;

#[derive(Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct CleanupRequest {
    max_age_ms: u64,
}

impl Default for CleanupRequest {
    fn default() -> Self {
        Self {
            max_age_ms: DEFAULT_MAX_AGE_MS,
        }
    }
}

/// Removes scan output files and scratch directories older than the
/// requested age.
pub struct RepoCleanupWorker {
    output_dir: Option<PathBuf>,
    workdir_base: Option<PathBuf>,
}

impl RepoCleanupWorker {
    pub fn new(output_dir: Option<PathBuf>, workdir_base: Option<PathBuf>) -> Self {
        Self {
            output_dir,
            workdir_base,
        }
    }

    fn prune_dir(
        &self,
        ctx: &JobContext,
        dir: &Path,
        max_age: Duration,
        remove_dirs: bool,
    ) -> Result<u32, JobError> {
        let entries = match std::fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(0),
            Err(e) => {
                return Err(JobError::transient(format!(
                    "read_dir {} failed: {}",
                    dir.display(),
                    e
                )))
            }
        };
        let mut removed = 0;
        for entry in entries.flatten() {
            ctx.checkpoint()?;
            let path = entry.path();
            if !is_older_than(&path, max_age) {
                continue;
            }
            let result = if path.is_dir() {
                if !remove_dirs {
                    continue;
                }
                std::fs::remove_dir_all(&path)
            } else {
                std::fs::remove_file(&path)
            };
            match result {
                Ok(()) => removed += 1,
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "cleanup removal failed")
                }
            }
        }
        Ok(removed)
    }
}

fn is_older_than(path: &Path, max_age: Duration) -> bool {
    let Ok(metadata) = std::fs::metadata(path) else {
        return false;
    };
    let Ok(modified) = metadata.modified() else {
        return false;
    };
    SystemTime::now()
        .duration_since(modified)
        .map(|age| age >= max_age)
        .unwrap_or(false)
}

#[async_trait]
impl JobHandler for RepoCleanupWorker {
    fn job_type(&self) -> &str {
        CLEANUP_KIND
    }

    async fn run(&self, ctx: JobContext) -> Result<serde_json::Value, JobError> {
        let request: CleanupRequest = serde_json::from_value(ctx.job.data.clone())
            .map_err(|e| JobError::permanent(format!("invalid cleanup request: {}", e)))?;
        let max_age = Duration::from_millis(request.max_age_ms);

        let mut removed_outputs = 0;
        if let Some(dir) = &self.output_dir {
            removed_outputs = self.prune_dir(&ctx, dir, max_age, false)?;
        }
        let mut removed_workdirs = 0;
        if let Some(base) = &self.workdir_base {
            removed_workdirs = self.prune_dir(&ctx, base, max_age, true)?;
        }

        tracing::info!(removed_outputs, removed_workdirs, "cleanup finished");
        Ok(serde_json::json!({
            "removed_outputs": removed_outputs,
            "removed_workdirs": removed_workdirs,
        }))
    }
}

#[cfg(test)]
#[path = "cleanup_tests.rs"]
mod tests;
