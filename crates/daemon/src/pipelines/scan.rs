// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Duplicate-detection scan pipelines.
//!
//! The handlers own the cache interaction (fingerprint, single-flight,
//! TTL) and the `scan:*`/`cache:*` event traffic; the analysis itself stays
//! behind the [`ScanAnalyzer`] seam. Result JSON lands under the configured
//! output directory, the only artifact the pipeline persists.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use sweep_adapters::{GitAdapter, ScanAnalyzer, ScanArtifact, ScanRequest};
use sweep_core::{CacheConfig, Clock, Event, JobError, JobId, SystemClock};
use sweep_engine::cache::option_hash;
use sweep_engine::{scan_fingerprint, Acquired, JobContext, JobHandler, ScanCache};
use sweep_wire::{CreateMultiScanRequest, CreateScanRequest, ScanOptions};

pub const SCAN_KIND: &str = "duplicate-scan";
pub const MULTI_SCAN_KIND: &str = "multi-scan";

/// Scans one repository through the content-addressed cache.
pub struct DuplicateScanWorker {
    cache: ScanCache,
    analyzer: Arc<dyn ScanAnalyzer>,
    git: Arc<dyn GitAdapter>,
    cache_config: CacheConfig,
    output_dir: Option<PathBuf>,
    clock: SystemClock,
}

impl DuplicateScanWorker {
    pub fn new(
        cache: ScanCache,
        analyzer: Arc<dyn ScanAnalyzer>,
        git: Arc<dyn GitAdapter>,
        cache_config: CacheConfig,
        output_dir: Option<PathBuf>,
    ) -> Self {
        Self {
            cache,
            analyzer,
            git,
            cache_config,
            output_dir,
            clock: SystemClock,
        }
    }

    /// Scan a single repository; shared with the multi-scan pipeline.
    pub(crate) async fn scan_one(
        &self,
        ctx: &JobContext,
        repository: &Path,
        options: &ScanOptions,
    ) -> Result<serde_json::Value, JobError> {
        ctx.checkpoint()?;
        ctx.publish(Event::ScanStarted {
            job_id: ctx.job.id.clone(),
            repository: repository.to_path_buf(),
        });

        let commit = self
            .git
            .head_sha(repository)
            .await
            .map_err(|e| JobError::new(e.class(), format!("resolve HEAD failed: {}", e)))?;
        // Only options that change the artifact participate in the
        // fingerprint; cache directives (force_refresh, cache_enabled) do
        // not, so a forced rescan replaces the same entry.
        let options_value = serde_json::json!({
            "include_tests": options.include_tests,
            "max_depth": options.max_depth,
        });
        let fingerprint = scan_fingerprint(
            repository,
            &commit,
            self.analyzer.version(),
            &option_hash(&options_value),
        );
        let now = self.clock.epoch_ms();
        let ttl = self.cache_config.ttl_for(SCAN_KIND);

        if options.force_refresh {
            let removed = self.cache.invalidate(&fingerprint);
            if removed > 0 {
                ctx.publish(Event::CacheInvalidated {
                    fingerprint: Some(fingerprint.clone()),
                    repository: Some(repository.to_path_buf()),
                    removed,
                });
            }
        }

        if !options.cache_enabled {
            let artifact = self.analyze(ctx, repository, &commit, options).await?;
            return self.finish_scan(ctx, repository, fingerprint, artifact, false);
        }

        match self.cache.acquire(&fingerprint, now) {
            Acquired::Hit(artifact) => {
                ctx.publish(Event::CacheHit {
                    fingerprint: fingerprint.clone(),
                    job_id: ctx.job.id.clone(),
                });
                self.finish_scan(ctx, repository, fingerprint, artifact, true)
            }
            Acquired::Leader(guard) => {
                ctx.publish(Event::CacheMiss {
                    fingerprint: fingerprint.clone(),
                    job_id: ctx.job.id.clone(),
                });
                match self.analyze(ctx, repository, &commit, options).await {
                    Ok(artifact) => {
                        guard.complete(repository.to_path_buf(), artifact.clone(), ttl, now);
                        self.finish_scan(ctx, repository, fingerprint, artifact, false)
                    }
                    Err(error) => {
                        guard.fail(error.clone());
                        ctx.publish(Event::ScanFailed {
                            job_id: ctx.job.id.clone(),
                            repository: repository.to_path_buf(),
                            error: error.clone(),
                        });
                        Err(error)
                    }
                }
            }
            Acquired::Waiter(waiter) => match waiter.await {
                Ok(Ok(artifact)) => self.finish_scan(ctx, repository, fingerprint, artifact, true),
                Ok(Err(error)) => Err(error),
                Err(_) => Err(JobError::internal("scan leader went away")),
            },
        }
    }

    async fn analyze(
        &self,
        ctx: &JobContext,
        repository: &Path,
        commit: &str,
        options: &ScanOptions,
    ) -> Result<ScanArtifact, JobError> {
        let request = ScanRequest {
            repository_path: repository.to_path_buf(),
            commit_sha: commit.to_string(),
            include_tests: options.include_tests,
            max_depth: options.max_depth,
        };
        let job_id = ctx.job.id.clone();
        let repo = repository.to_path_buf();
        let progress = move |(completed, total, detail): (u32, u32, Option<String>)| {
            ctx.publish(Event::ScanProgress {
                job_id: job_id.clone(),
                repository: repo.clone(),
                completed,
                total,
                detail,
            });
        };
        self.analyzer
            .analyze(&request, &progress, ctx.cancel_token())
            .await
    }

    fn finish_scan(
        &self,
        ctx: &JobContext,
        repository: &Path,
        fingerprint: sweep_core::Fingerprint,
        artifact: ScanArtifact,
        cached: bool,
    ) -> Result<serde_json::Value, JobError> {
        let output_path = self.write_output(&ctx.job.id, repository, &artifact);
        ctx.publish(Event::ScanCompleted {
            job_id: ctx.job.id.clone(),
            repository: repository.to_path_buf(),
            output_path: output_path.clone(),
        });
        Ok(serde_json::json!({
            "repository": repository,
            "fingerprint": fingerprint,
            "cached": cached,
            "schema_version": artifact.schema_version,
            "artifact": artifact.data,
            "output_path": output_path,
        }))
    }

    /// Best-effort result file; a write failure costs the artifact on disk,
    /// not the job.
    fn write_output(
        &self,
        job_id: &JobId,
        repository: &Path,
        artifact: &ScanArtifact,
    ) -> Option<PathBuf> {
        let dir = self.output_dir.as_ref()?;
        let path = dir.join(format!("scan-{}.json", job_id.suffix()));
        let body = serde_json::json!({
            "job_id": job_id,
            "repository": repository,
            "schema_version": artifact.schema_version,
            "result": artifact.data,
        });
        let written = std::fs::create_dir_all(dir).and_then(|_| {
            let text = serde_json::to_string_pretty(&body)
                .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
            std::fs::write(&path, text)
        });
        match written {
            Ok(()) => Some(path),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "scan output write failed");
                None
            }
        }
    }
}

#[async_trait]
impl JobHandler for DuplicateScanWorker {
    fn job_type(&self) -> &str {
        SCAN_KIND
    }

    fn version(&self) -> &str {
        self.analyzer.version()
    }

    async fn run(&self, ctx: JobContext) -> Result<serde_json::Value, JobError> {
        let request: CreateScanRequest = serde_json::from_value(ctx.job.data.clone())
            .map_err(|e| JobError::permanent(format!("invalid scan request: {}", e)))?;
        self.scan_one(&ctx, &request.repository_path, &request.options)
            .await
    }
}

/// Sequential per-repository scans under one job.
pub struct MultiScanWorker {
    scanner: Arc<DuplicateScanWorker>,
}

impl MultiScanWorker {
    pub fn new(scanner: Arc<DuplicateScanWorker>) -> Self {
        Self { scanner }
    }
}

#[async_trait]
impl JobHandler for MultiScanWorker {
    fn job_type(&self) -> &str {
        MULTI_SCAN_KIND
    }

    fn version(&self) -> &str {
        self.scanner.analyzer.version()
    }

    async fn run(&self, ctx: JobContext) -> Result<serde_json::Value, JobError> {
        let request: CreateMultiScanRequest = serde_json::from_value(ctx.job.data.clone())
            .map_err(|e| JobError::permanent(format!("invalid multi-scan request: {}", e)))?;
        if request.repository_paths.is_empty() {
            return Err(JobError::permanent("repository_paths is empty"));
        }

        let total = request.repository_paths.len();
        let mut results = Vec::with_capacity(total);
        let mut first_error: Option<JobError> = None;
        let mut failures = 0u32;

        for (index, repository) in request.repository_paths.iter().enumerate() {
            ctx.checkpoint()?;
            ctx.publish(Event::ScanProgress {
                job_id: ctx.job.id.clone(),
                repository: repository.clone(),
                completed: index as u32,
                total: total as u32,
                detail: Some(format!("scanning {}", repository.display())),
            });
            match self.scanner.scan_one(&ctx, repository, &request.options).await {
                Ok(result) => results.push(serde_json::json!({
                    "repository": repository,
                    "ok": true,
                    "result": result,
                })),
                Err(error) => {
                    failures += 1;
                    results.push(serde_json::json!({
                        "repository": repository,
                        "ok": false,
                        "error": error.to_string(),
                    }));
                    first_error.get_or_insert(error);
                }
            }
        }

        // The grouped job fails only when no repository scanned cleanly;
        // partial failures are reported in the summary.
        if failures as usize == total {
            if let Some(error) = first_error {
                return Err(error);
            }
        }
        Ok(serde_json::json!({
            "group_name": request.group_name,
            "total": total,
            "failed": failures,
            "scans": results,
        }))
    }
}

#[cfg(test)]
#[path = "scan_tests.rs"]
mod tests;
