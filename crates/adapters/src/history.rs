// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Append-only NDJSON job history.
//!
//! One record per terminal job, written under the configured directory and
//! never read back by the engine. Write failures are logged and swallowed;
//! history is an optional sink, not a durability guarantee.

use chrono::{SecondsFormat, Utc};
use serde::Serialize;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;
use sweep_core::JobRecord;

/// Appends terminal job records to `<dir>/history.ndjson`.
pub struct HistorySink {
    path: PathBuf,
}

#[derive(Serialize)]
struct HistoryLine<'a> {
    recorded_at: String,
    #[serde(flatten)]
    job: &'a JobRecord,
}

impl HistorySink {
    pub fn new(dir: PathBuf) -> Self {
        Self {
            path: dir.join("history.ndjson"),
        }
    }

    /// Append one terminal record as a single NDJSON line.
    pub fn append(&self, record: &JobRecord) {
        let line = HistoryLine {
            recorded_at: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
            job: record,
        };
        if let Err(e) = self.write_line(&line) {
            tracing::warn!(
                path = %self.path.display(),
                job = %record.id,
                error = %e,
                "history append failed"
            );
        }
    }

    fn write_line(&self, line: &HistoryLine<'_>) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string(line)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        writeln!(file, "{}", json)
    }
}

#[cfg(test)]
#[path = "history_tests.rs"]
mod tests;
