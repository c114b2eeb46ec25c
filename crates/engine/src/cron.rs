// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Cron trigger: interval-driven job producers.
//!
//! Cron does not run jobs; each fire invokes the entry's factory data into
//! `create_job` and re-arms its timer. Scheduling is best-effort wall-clock;
//! `skip_if_queued` and `max_active` are the idempotence defenses against
//! double fires and slow pipelines.

use std::time::Duration;
use sweep_core::config::{ConfigError, CronEntryConfig};

/// One scheduled job producer.
#[derive(Debug, Clone)]
pub struct CronEntry {
    pub name: String,
    pub kind: String,
    pub every: Duration,
    pub data: serde_json::Value,
    pub run_on_startup: bool,
    /// Skip a fire while a previous job from this entry is still queued.
    pub skip_if_queued: bool,
    /// Skip a fire while this many jobs from this entry are still active
    /// (0 = unlimited).
    pub max_active: u32,
}

impl CronEntry {
    pub fn from_config(config: &CronEntryConfig) -> Result<Self, ConfigError> {
        Ok(Self {
            name: config.name.clone(),
            kind: config.kind.clone(),
            every: config.every_duration()?,
            data: config.data.clone(),
            run_on_startup: config.run_on_startup,
            skip_if_queued: config.skip_if_queued,
            max_active: config.max_active,
        })
    }
}

#[cfg(test)]
#[path = "cron_tests.rs"]
mod tests;
