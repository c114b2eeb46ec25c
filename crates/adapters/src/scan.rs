// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The opaque analysis contract.
//!
//! The engine never sees AST walking or similarity math; it hands a
//! [`ScanRequest`] to whatever [`ScanAnalyzer`] was wired in at startup and
//! gets back an artifact or an error.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use sweep_core::JobError;
use tokio_util::sync::CancellationToken;

/// Input to a single repository scan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanRequest {
    pub repository_path: PathBuf,
    pub commit_sha: String,
    #[serde(default)]
    pub include_tests: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_depth: Option<u32>,
}

/// Progress callback payload: `(completed, total, detail)`.
pub type ProgressReport = (u32, u32, Option<String>);

/// Result blob produced by an analyzer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanArtifact {
    pub schema_version: u32,
    pub data: serde_json::Value,
}

impl ScanArtifact {
    pub const SCHEMA_VERSION: u32 = 1;

    pub fn new(data: serde_json::Value) -> Self {
        Self {
            schema_version: Self::SCHEMA_VERSION,
            data,
        }
    }
}

/// Performs the actual duplicate-detection analysis (out of engine scope).
#[async_trait]
pub trait ScanAnalyzer: Send + Sync {
    /// Analyzer version, folded into scan fingerprints so upgrades
    /// invalidate cached artifacts by construction.
    fn version(&self) -> &str;

    /// Run the analysis. Implementations should check `cancel` at natural
    /// I/O boundaries and may report progress as often as they like.
    async fn analyze(
        &self,
        request: &ScanRequest,
        progress: &(dyn Fn(ProgressReport) + Send + Sync),
        cancel: &CancellationToken,
    ) -> Result<ScanArtifact, JobError>;
}

/// Analyzer that shells out to a configured command.
///
/// The command receives the scan parameters through `SWEEP_*` environment
/// variables and must print the result JSON on stdout. The subprocess is
/// killed when the job is cancelled.
pub struct CommandAnalyzer {
    command: String,
    version: String,
    timeout: std::time::Duration,
}

impl CommandAnalyzer {
    pub fn new(command: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            version: version.into(),
            timeout: std::time::Duration::from_secs(600),
        }
    }

    pub fn with_timeout(mut self, timeout: std::time::Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

#[async_trait]
impl ScanAnalyzer for CommandAnalyzer {
    fn version(&self) -> &str {
        &self.version
    }

    async fn analyze(
        &self,
        request: &ScanRequest,
        _progress: &(dyn Fn(ProgressReport) + Send + Sync),
        cancel: &CancellationToken,
    ) -> Result<ScanArtifact, JobError> {
        let mut cmd = tokio::process::Command::new("bash");
        cmd.arg("-c")
            .arg(&self.command)
            .env("SWEEP_REPOSITORY", &request.repository_path)
            .env("SWEEP_COMMIT", &request.commit_sha)
            .env("SWEEP_INCLUDE_TESTS", if request.include_tests { "1" } else { "0" });
        if let Some(depth) = request.max_depth {
            cmd.env("SWEEP_MAX_DEPTH", depth.to_string());
        }

        let run = crate::subprocess::run_with_timeout(cmd, self.timeout, "scan command");
        let output = tokio::select! {
            result = run => result.map_err(|e| {
                if e.kind() == std::io::ErrorKind::TimedOut {
                    JobError::timeout(e.to_string())
                } else {
                    JobError::transient(e.to_string())
                }
            })?,
            _ = cancel.cancelled() => return Err(JobError::cancelled()),
        };
        if !output.status.success() {
            return Err(JobError::transient(format!(
                "scan command exited {}: {}",
                output.status.code().unwrap_or(-1),
                crate::subprocess::stderr_text(&output)
            ))
            .with_code("scan_command"));
        }
        let stdout = crate::subprocess::stdout_text(&output);
        let data: serde_json::Value = serde_json::from_str(&stdout).map_err(|e| {
            JobError::permanent(format!("scan command produced invalid JSON: {}", e))
        })?;
        Ok(ScanArtifact::new(data))
    }
}

/// Scriptable analyzer for tests: fixed artifact, optional scripted
/// failures, call counting (for single-flight assertions).
#[cfg(any(test, feature = "test-support"))]
pub struct FakeAnalyzer {
    version: String,
    delay: std::time::Duration,
    fail_first: std::sync::atomic::AtomicU32,
    calls: std::sync::atomic::AtomicU32,
}

#[cfg(any(test, feature = "test-support"))]
impl FakeAnalyzer {
    pub fn new() -> Self {
        Self {
            version: "fake-1".to_string(),
            delay: std::time::Duration::ZERO,
            fail_first: std::sync::atomic::AtomicU32::new(0),
            calls: std::sync::atomic::AtomicU32::new(0),
        }
    }

    pub fn with_delay(mut self, delay: std::time::Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Fail the first `n` analyze calls with a transient error.
    pub fn fail_first(self, n: u32) -> Self {
        self.set_fail_next(n);
        self
    }

    /// Script the next `n` analyze calls to fail (usable mid-test).
    pub fn set_fail_next(&self, n: u32) {
        self.fail_first
            .store(n, std::sync::atomic::Ordering::SeqCst);
    }

    pub fn calls(&self) -> u32 {
        self.calls.load(std::sync::atomic::Ordering::SeqCst)
    }
}

#[cfg(any(test, feature = "test-support"))]
impl Default for FakeAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(any(test, feature = "test-support"))]
#[async_trait]
impl ScanAnalyzer for FakeAnalyzer {
    fn version(&self) -> &str {
        &self.version
    }

    async fn analyze(
        &self,
        request: &ScanRequest,
        progress: &(dyn Fn(ProgressReport) + Send + Sync),
        cancel: &CancellationToken,
    ) -> Result<ScanArtifact, JobError> {
        self.calls.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::select! {
                _ = tokio::time::sleep(self.delay) => {}
                _ = cancel.cancelled() => return Err(JobError::cancelled()),
            }
        }
        let remaining = self.fail_first.load(std::sync::atomic::Ordering::SeqCst);
        if remaining > 0 {
            self.fail_first
                .store(remaining - 1, std::sync::atomic::Ordering::SeqCst);
            return Err(JobError::transient("scripted analyzer failure"));
        }
        progress((1, 1, None));
        Ok(ScanArtifact::new(serde_json::json!({
            "repository": request.repository_path,
            "commit": request.commit_sha,
            "duplicates": [],
        })))
    }
}
