// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Engine configuration.
//!
//! Loaded from TOML; every key is optional and falls back to the documented
//! default. `validate()` runs after parsing; an invalid configuration maps
//! to exit code 2 in the daemon.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {0}: {1}")]
    Io(PathBuf, #[source] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config: {0}")]
    Invalid(String),

    #[error("invalid duration {0:?} (expected e.g. \"250ms\", \"90s\", \"10m\", \"6h\")")]
    InvalidDuration(String),
}

/// Top-level engine configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    pub max_concurrent: Option<usize>,
    pub retry: RetryConfig,
    pub handler: HandlerConfig,
    pub activity: ActivityConfig,
    pub history: HistoryConfig,
    pub cache: CacheConfig,
    pub git: GitConfig,
    pub bus: BusConfig,
    pub scan: ScanConfig,
    /// Directory for scan result JSON files written by handlers.
    pub output_dir: Option<PathBuf>,
    pub cron: Vec<CronEntryConfig>,
}

impl EngineConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text =
            std::fs::read_to_string(path).map_err(|e| ConfigError::Io(path.to_path_buf(), e))?;
        Self::from_toml_str(&text)
    }

    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: EngineConfig = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn max_concurrent(&self) -> usize {
        self.max_concurrent.unwrap_or(3)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_concurrent() == 0 {
            return Err(ConfigError::Invalid("max_concurrent must be >= 1".into()));
        }
        if self.bus.subscriber_buffer == 0 {
            return Err(ConfigError::Invalid(
                "bus.subscriber_buffer must be >= 1".into(),
            ));
        }
        if self.retry.base_ms == 0 || self.retry.cap_ms < self.retry.base_ms {
            return Err(ConfigError::Invalid(
                "retry.base_ms must be >= 1 and <= retry.cap_ms".into(),
            ));
        }
        if !(0.0..1.0).contains(&self.retry.jitter) {
            return Err(ConfigError::Invalid(
                "retry.jitter must be in [0, 1)".into(),
            ));
        }
        if self.activity.ring_size == 0 || self.history.ring_size == 0 {
            return Err(ConfigError::Invalid("ring sizes must be >= 1".into()));
        }
        for entry in &self.cron {
            if entry.name.is_empty() {
                return Err(ConfigError::Invalid("cron entry with empty name".into()));
            }
            if entry.kind.is_empty() {
                return Err(ConfigError::Invalid(format!(
                    "cron entry '{}' has empty kind",
                    entry.name
                )));
            }
            entry.every_duration()?;
        }
        Ok(())
    }
}

/// Retry and circuit-breaker tuning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RetryConfig {
    pub base_ms: u64,
    pub cap_ms: u64,
    pub jitter: f64,
    /// Absolute retry ceiling per fingerprint lifetime.
    pub absolute_max: u32,
    /// Sub-cap for timeout-classified failures.
    pub timeout_max: u32,
    /// Ledger entry lifetime after last activity.
    pub ledger_ttl_ms: u64,
    /// Error codes that surface immediately regardless of class.
    pub no_retry_codes: Vec<String>,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            base_ms: 60_000,
            cap_ms: 1_800_000,
            jitter: 0.2,
            absolute_max: 10,
            timeout_max: 2,
            ledger_ttl_ms: 3_600_000,
            no_retry_codes: Vec::new(),
        }
    }
}

/// Handler execution limits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HandlerConfig {
    pub default_timeout_ms: u64,
    /// Grace period after cancellation before the handler is orphaned.
    pub cancel_grace_ms: u64,
    /// Per-kind deadline overrides.
    pub timeouts_ms: HashMap<String, u64>,
}

impl Default for HandlerConfig {
    fn default() -> Self {
        Self {
            default_timeout_ms: 600_000,
            cancel_grace_ms: 30_000,
            timeouts_ms: HashMap::new(),
        }
    }
}

impl HandlerConfig {
    pub fn timeout_for(&self, kind: &str) -> Duration {
        Duration::from_millis(
            self.timeouts_ms
                .get(kind)
                .copied()
                .unwrap_or(self.default_timeout_ms),
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ActivityConfig {
    pub ring_size: usize,
}

impl Default for ActivityConfig {
    fn default() -> Self {
        Self { ring_size: 200 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HistoryConfig {
    /// Terminal jobs retained in the in-memory ring.
    pub ring_size: usize,
    /// When set, terminal jobs are appended as NDJSON under this directory.
    pub dir: Option<PathBuf>,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            ring_size: 500,
            dir: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CacheConfig {
    pub default_ttl_ms: u64,
    /// Per-kind TTL overrides.
    pub ttl_ms: HashMap<String, u64>,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            default_ttl_ms: 3_600_000,
            ttl_ms: HashMap::new(),
        }
    }
}

impl CacheConfig {
    pub fn ttl_for(&self, kind: &str) -> Duration {
        Duration::from_millis(self.ttl_ms.get(kind).copied().unwrap_or(self.default_ttl_ms))
    }
}

/// Git side-effect protocol configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GitConfig {
    pub branch_prefix: String,
    pub base_branch: String,
    /// Log and skip all Git mutations.
    pub dry_run: bool,
}

impl Default for GitConfig {
    fn default() -> Self {
        Self {
            branch_prefix: "sweep".to_string(),
            base_branch: "main".to_string(),
            dry_run: false,
        }
    }
}

/// Analyzer invocation for scan pipelines.
///
/// The duplicate-detection analysis itself is an external collaborator; the
/// daemon shells out to this command and reads the result JSON from stdout.
/// Scan pipelines are not registered when no command is configured.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ScanConfig {
    pub command: Option<String>,
    /// Version tag folded into fingerprints; bump to invalidate cached
    /// artifacts after an analyzer upgrade.
    pub analyzer_version: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BusConfig {
    pub subscriber_buffer: usize,
}

impl Default for BusConfig {
    fn default() -> Self {
        Self {
            subscriber_buffer: 1024,
        }
    }
}

/// A scheduled job producer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CronEntryConfig {
    pub name: String,
    /// Pipeline kind the factory enqueues.
    pub kind: String,
    /// Interval string, e.g. "90s", "10m", "6h".
    pub every: String,
    #[serde(default = "default_cron_data")]
    pub data: serde_json::Value,
    #[serde(default)]
    pub run_on_startup: bool,
    /// Skip a fire when a job from this entry is already queued.
    #[serde(default)]
    pub skip_if_queued: bool,
    /// Skip a fire when this many jobs from this entry are still active
    /// (0 = unlimited).
    #[serde(default)]
    pub max_active: u32,
}

fn default_cron_data() -> serde_json::Value {
    serde_json::json!({})
}

impl CronEntryConfig {
    pub fn every_duration(&self) -> Result<Duration, ConfigError> {
        parse_duration(&self.every)
    }
}

/// Parse a duration string: bare digits are milliseconds; `ms`, `s`, `m`,
/// and `h` suffixes are accepted.
pub fn parse_duration(text: &str) -> Result<Duration, ConfigError> {
    let text = text.trim();
    let err = || ConfigError::InvalidDuration(text.to_string());
    let (digits, unit) = match text.find(|c: char| !c.is_ascii_digit()) {
        Some(idx) => text.split_at(idx),
        None => (text, "ms"),
    };
    let value: u64 = digits.parse().map_err(|_| err())?;
    let duration = match unit {
        "ms" => Duration::from_millis(value),
        "s" => Duration::from_secs(value),
        "m" => Duration::from_secs(value * 60),
        "h" => Duration::from_secs(value * 3600),
        _ => return Err(err()),
    };
    if duration.is_zero() {
        return Err(err());
    }
    Ok(duration)
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
