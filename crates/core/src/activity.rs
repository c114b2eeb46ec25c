// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Normalized, user-visible activity records for the dashboard feed.

use crate::error::JobError;
use crate::event::Event;
use crate::job::JobId;
use serde::{Deserialize, Serialize};

/// Display severity of an activity record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Info,
    Warning,
    Error,
}

crate::simple_display! {
    Severity {
        Info => "info",
        Warning => "warning",
        Error => "error",
    }
}

/// A normalized event suitable for the activity feed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityRecord {
    /// Event tag, e.g. "job:completed".
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub job_id: Option<JobId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub job_kind: Option<String>,
    pub timestamp_ms: u64,
    pub severity: Severity,
    /// Human-readable one-liner.
    pub message: String,
    /// The full event, as a tagged JSON value.
    pub payload: serde_json::Value,
}

impl ActivityRecord {
    pub fn from_event(event: &Event, timestamp_ms: u64) -> Self {
        Self {
            kind: event.tag().to_string(),
            job_id: event.job_id().cloned(),
            job_kind: event.job_kind().map(str::to_string),
            timestamp_ms,
            severity: severity_of(event),
            message: message_of(event),
            payload: serde_json::to_value(event).unwrap_or(serde_json::Value::Null),
        }
    }

    /// Synthetic record for bus overflow, so drops stay visible in the feed.
    pub fn bus_drop(dropped: u64, timestamp_ms: u64) -> Self {
        Self {
            kind: "bus:drop".to_string(),
            job_id: None,
            job_kind: None,
            timestamp_ms,
            severity: Severity::Warning,
            message: format!("event bus dropped {} event(s) for a slow subscriber", dropped),
            payload: serde_json::json!({ "dropped": dropped }),
        }
    }
}

fn severity_of(event: &Event) -> Severity {
    match event {
        Event::JobFailed { .. }
        | Event::ScanFailed { .. }
        | Event::RetryExhausted { .. }
        | Event::CircuitOpened { .. } => Severity::Error,
        Event::RetryScheduled { .. }
        | Event::JobCancelled { .. }
        | Event::CacheInvalidated { .. } => Severity::Warning,
        _ => Severity::Info,
    }
}

fn message_of(event: &Event) -> String {
    match event {
        Event::JobFailed { id, error, .. } => {
            format!("job {} failed: {}", id, JobError::message_of(Some(error)))
        }
        Event::ScanFailed { job_id, error, .. } => {
            format!("scan {} failed: {}", job_id, JobError::message_of(Some(error)))
        }
        other => other.log_summary(),
    }
}

#[cfg(test)]
#[path = "activity_tests.rs"]
mod tests;
