// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Lifecycle events published on the engine bus.
//!
//! Serializes with `{"type": "job:created", ...fields}` format.

use crate::error::{ErrorClass, JobError};
use crate::fingerprint::Fingerprint;
use crate::job::JobId;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Events fanned out to every bus subscriber.
///
/// Per-job events are published in lifecycle order
/// (`created -> started -> {completed | failed | retry:scheduled}`); there is
/// no ordering guarantee across jobs beyond ready-queue FIFO.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    // -- job lifecycle --
    #[serde(rename = "job:created")]
    JobCreated {
        id: JobId,
        kind: String,
        fingerprint: Fingerprint,
        created_at_ms: u64,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        cron: Option<String>,
    },

    #[serde(rename = "job:started")]
    JobStarted {
        id: JobId,
        kind: String,
        attempt: u32,
    },

    #[serde(rename = "job:completed")]
    JobCompleted {
        id: JobId,
        kind: String,
        result: serde_json::Value,
    },

    #[serde(rename = "job:failed")]
    JobFailed {
        id: JobId,
        kind: String,
        error: JobError,
    },

    #[serde(rename = "job:cancelled")]
    JobCancelled { id: JobId, kind: String },

    #[serde(rename = "job:paused")]
    JobPaused { id: JobId },

    #[serde(rename = "job:resumed")]
    JobResumed { id: JobId },

    // -- retry / circuit --
    #[serde(rename = "retry:scheduled")]
    RetryScheduled {
        job_id: JobId,
        attempt: u32,
        delay_ms: u64,
        class: ErrorClass,
    },

    #[serde(rename = "retry:exhausted")]
    RetryExhausted { job_id: JobId, attempts: u32 },

    #[serde(rename = "circuit:opened")]
    CircuitOpened { fingerprint: Fingerprint },

    #[serde(rename = "circuit:closed")]
    CircuitClosed { fingerprint: Fingerprint },

    // -- scan (emitted by scan handlers through the bus) --
    #[serde(rename = "scan:started")]
    ScanStarted { job_id: JobId, repository: PathBuf },

    #[serde(rename = "scan:progress")]
    ScanProgress {
        job_id: JobId,
        repository: PathBuf,
        completed: u32,
        total: u32,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        detail: Option<String>,
    },

    #[serde(rename = "scan:completed")]
    ScanCompleted {
        job_id: JobId,
        repository: PathBuf,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        output_path: Option<PathBuf>,
    },

    #[serde(rename = "scan:failed")]
    ScanFailed {
        job_id: JobId,
        repository: PathBuf,
        error: JobError,
    },

    // -- cache --
    #[serde(rename = "cache:hit")]
    CacheHit {
        fingerprint: Fingerprint,
        job_id: JobId,
    },

    #[serde(rename = "cache:miss")]
    CacheMiss {
        fingerprint: Fingerprint,
        job_id: JobId,
    },

    #[serde(rename = "cache:invalidated")]
    CacheInvalidated {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        fingerprint: Option<Fingerprint>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        repository: Option<PathBuf>,
        removed: u32,
    },
}

impl Event {
    /// The serialized type tag (e.g. "job:created").
    pub fn tag(&self) -> &'static str {
        match self {
            Event::JobCreated { .. } => "job:created",
            Event::JobStarted { .. } => "job:started",
            Event::JobCompleted { .. } => "job:completed",
            Event::JobFailed { .. } => "job:failed",
            Event::JobCancelled { .. } => "job:cancelled",
            Event::JobPaused { .. } => "job:paused",
            Event::JobResumed { .. } => "job:resumed",
            Event::RetryScheduled { .. } => "retry:scheduled",
            Event::RetryExhausted { .. } => "retry:exhausted",
            Event::CircuitOpened { .. } => "circuit:opened",
            Event::CircuitClosed { .. } => "circuit:closed",
            Event::ScanStarted { .. } => "scan:started",
            Event::ScanProgress { .. } => "scan:progress",
            Event::ScanCompleted { .. } => "scan:completed",
            Event::ScanFailed { .. } => "scan:failed",
            Event::CacheHit { .. } => "cache:hit",
            Event::CacheMiss { .. } => "cache:miss",
            Event::CacheInvalidated { .. } => "cache:invalidated",
        }
    }

    /// The job this event concerns, if any.
    pub fn job_id(&self) -> Option<&JobId> {
        match self {
            Event::JobCreated { id, .. }
            | Event::JobStarted { id, .. }
            | Event::JobCompleted { id, .. }
            | Event::JobFailed { id, .. }
            | Event::JobCancelled { id, .. }
            | Event::JobPaused { id }
            | Event::JobResumed { id } => Some(id),
            Event::RetryScheduled { job_id, .. }
            | Event::RetryExhausted { job_id, .. }
            | Event::ScanStarted { job_id, .. }
            | Event::ScanProgress { job_id, .. }
            | Event::ScanCompleted { job_id, .. }
            | Event::ScanFailed { job_id, .. }
            | Event::CacheHit { job_id, .. }
            | Event::CacheMiss { job_id, .. } => Some(job_id),
            Event::CircuitOpened { .. }
            | Event::CircuitClosed { .. }
            | Event::CacheInvalidated { .. } => None,
        }
    }

    /// The job kind carried by this event, if any.
    pub fn job_kind(&self) -> Option<&str> {
        match self {
            Event::JobCreated { kind, .. }
            | Event::JobStarted { kind, .. }
            | Event::JobCompleted { kind, .. }
            | Event::JobFailed { kind, .. }
            | Event::JobCancelled { kind, .. } => Some(kind),
            _ => None,
        }
    }

    /// One-line summary for log spans.
    pub fn log_summary(&self) -> String {
        match self {
            Event::JobCreated { id, kind, .. } => format!("job:created {} kind={}", id, kind),
            Event::JobStarted { id, attempt, .. } => {
                format!("job:started {} attempt={}", id, attempt)
            }
            Event::JobCompleted { id, .. } => format!("job:completed {}", id),
            Event::JobFailed { id, error, .. } => format!("job:failed {} {}", id, error),
            Event::JobCancelled { id, .. } => format!("job:cancelled {}", id),
            Event::JobPaused { id } => format!("job:paused {}", id),
            Event::JobResumed { id } => format!("job:resumed {}", id),
            Event::RetryScheduled {
                job_id,
                attempt,
                delay_ms,
                ..
            } => format!(
                "retry:scheduled {} attempt={} delay_ms={}",
                job_id, attempt, delay_ms
            ),
            Event::RetryExhausted { job_id, attempts } => {
                format!("retry:exhausted {} attempts={}", job_id, attempts)
            }
            Event::CircuitOpened { fingerprint } => {
                format!("circuit:opened {}", crate::id::short(fingerprint.as_str(), 12))
            }
            Event::CircuitClosed { fingerprint } => {
                format!("circuit:closed {}", crate::id::short(fingerprint.as_str(), 12))
            }
            Event::ScanStarted { job_id, repository } => {
                format!("scan:started {} repo={}", job_id, repository.display())
            }
            Event::ScanProgress {
                job_id,
                completed,
                total,
                ..
            } => format!("scan:progress {} {}/{}", job_id, completed, total),
            Event::ScanCompleted { job_id, .. } => format!("scan:completed {}", job_id),
            Event::ScanFailed { job_id, error, .. } => {
                format!("scan:failed {} {}", job_id, error)
            }
            Event::CacheHit { fingerprint, .. } => {
                format!("cache:hit {}", crate::id::short(fingerprint.as_str(), 12))
            }
            Event::CacheMiss { fingerprint, .. } => {
                format!("cache:miss {}", crate::id::short(fingerprint.as_str(), 12))
            }
            Event::CacheInvalidated { removed, .. } => {
                format!("cache:invalidated removed={}", removed)
            }
        }
    }
}

#[cfg(test)]
#[path = "event_tests.rs"]
mod tests;
