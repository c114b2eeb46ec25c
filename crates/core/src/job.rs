// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Job records and the lifecycle state machine.

use crate::error::JobError;
use crate::fingerprint::Fingerprint;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

crate::define_id! {
    /// Unique identifier for a single job attempt.
    ///
    /// Retries of the same logical job get a fresh id derived from the
    /// original via [`JobId::retry_child`]; [`JobId::lineage_root`] recovers
    /// the original across any number of generations.
    pub struct JobId("job-");
}

impl JobId {
    /// Id of the retry attempt number `attempt` in this job's chain.
    pub fn retry_child(&self, attempt: u32) -> JobId {
        JobId::new(format!("{}-retry{}", self.as_str(), attempt))
    }

    /// Strip repeated `-retry<N>` suffixes to recover the original id.
    pub fn lineage_root(&self) -> JobId {
        let mut root = self.as_str();
        loop {
            match strip_retry_suffix(root) {
                Some(parent) => root = parent,
                None => break,
            }
        }
        JobId::new(root)
    }

    /// Whether this id was produced by at least one retry.
    pub fn is_retry(&self) -> bool {
        strip_retry_suffix(self.as_str()).is_some()
    }
}

/// Returns the id with one trailing `-retry<N>` suffix removed, if present.
fn strip_retry_suffix(id: &str) -> Option<&str> {
    let (head, tail) = id.rsplit_once("-retry")?;
    if head.is_empty() || tail.is_empty() || !tail.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    Some(head)
}

/// Lifecycle status of a job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    /// Waiting in the ready queue.
    Queued,
    /// Handler is executing.
    Running,
    /// Held back from dispatch; returns to `Queued` on resume.
    Paused,
    /// Terminal: handler returned a result.
    Completed,
    /// Terminal: retries exhausted or failure surfaced immediately.
    Failed,
    /// Terminal: user-initiated.
    Cancelled,
}

impl JobStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            JobStatus::Completed | JobStatus::Failed | JobStatus::Cancelled
        )
    }
}

crate::simple_display! {
    JobStatus {
        Queued => "queued",
        Running => "running",
        Paused => "paused",
        Completed => "completed",
        Failed => "failed",
        Cancelled => "cancelled",
    }
}

/// Rejected status transition.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("invalid transition {from} -> {to}")]
pub struct TransitionError {
    pub from: JobStatus,
    pub to: JobStatus,
}

/// Git side-effect state, populated only when the handler opts into the
/// Git protocol.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GitInfo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub branch_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_branch: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub commit_sha: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pr_url: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub changed_files: Vec<PathBuf>,
}

/// The single source of truth for a unit of work.
///
/// Owned exclusively by the job store; everything outside the store sees
/// cloned snapshots.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobRecord {
    pub id: JobId,
    /// Symbolic pipeline kind (e.g. "duplicate-scan", "repo-cleanup").
    pub kind: String,
    pub status: JobStatus,
    /// Handler-defined input payload.
    pub data: serde_json::Value,
    /// Success payload; populated only in `Completed`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<serde_json::Value>,
    /// Failure details; set iff `status == Failed`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<JobError>,
    pub created_at_ms: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub started_at_ms: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at_ms: Option<u64>,
    /// Attempt number across the retry chain (1 for the first attempt).
    pub attempts: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub git: Option<GitInfo>,
    pub fingerprint: Fingerprint,
    /// Name of the cron entry that spawned this job, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cron: Option<String>,
    /// Cooperative cancellation requested while running.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub cancel_requested: bool,
    /// Advisory pause requested while running; applied to the next attempt.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub pause_requested: bool,
}

impl JobRecord {
    /// Create a fresh queued record for the first attempt.
    pub fn new(
        id: JobId,
        kind: impl Into<String>,
        data: serde_json::Value,
        fingerprint: Fingerprint,
        created_at_ms: u64,
    ) -> Self {
        Self {
            id,
            kind: kind.into(),
            status: JobStatus::Queued,
            data,
            result: None,
            error: None,
            created_at_ms,
            started_at_ms: None,
            completed_at_ms: None,
            attempts: 1,
            git: None,
            fingerprint,
            cron: None,
            cancel_requested: false,
            pause_requested: false,
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// Queued -> Running. Stamps `started_at_ms`.
    pub fn start(&mut self, epoch_ms: u64) -> Result<(), TransitionError> {
        self.check(JobStatus::Queued, JobStatus::Running)?;
        self.status = JobStatus::Running;
        self.started_at_ms = Some(epoch_ms);
        self.attempts = self.attempts.max(1);
        Ok(())
    }

    /// Running -> Completed.
    pub fn complete(
        &mut self,
        result: serde_json::Value,
        epoch_ms: u64,
    ) -> Result<(), TransitionError> {
        self.check(JobStatus::Running, JobStatus::Completed)?;
        self.status = JobStatus::Completed;
        self.result = Some(result);
        self.error = None;
        self.completed_at_ms = Some(self.clamp_completion(epoch_ms));
        Ok(())
    }

    /// Running -> Failed.
    pub fn fail(&mut self, error: JobError, epoch_ms: u64) -> Result<(), TransitionError> {
        self.check(JobStatus::Running, JobStatus::Failed)?;
        self.status = JobStatus::Failed;
        self.error = Some(error);
        self.result = None;
        self.completed_at_ms = Some(self.clamp_completion(epoch_ms));
        Ok(())
    }

    /// Queued | Paused | Running -> Cancelled. Discards any result.
    pub fn cancel(&mut self, epoch_ms: u64) -> Result<(), TransitionError> {
        if self.is_terminal() {
            return Err(TransitionError {
                from: self.status,
                to: JobStatus::Cancelled,
            });
        }
        self.status = JobStatus::Cancelled;
        self.result = None;
        self.error = None;
        self.completed_at_ms = Some(self.clamp_completion(epoch_ms));
        Ok(())
    }

    /// Queued -> Paused.
    pub fn pause(&mut self) -> Result<(), TransitionError> {
        self.check(JobStatus::Queued, JobStatus::Paused)?;
        self.status = JobStatus::Paused;
        Ok(())
    }

    /// Paused -> Queued.
    pub fn resume(&mut self) -> Result<(), TransitionError> {
        self.check(JobStatus::Paused, JobStatus::Queued)?;
        self.status = JobStatus::Queued;
        Ok(())
    }

    fn check(&self, from: JobStatus, to: JobStatus) -> Result<(), TransitionError> {
        if self.status != from {
            return Err(TransitionError {
                from: self.status,
                to,
            });
        }
        Ok(())
    }

    /// Terminal stamps never precede the start stamp.
    fn clamp_completion(&self, epoch_ms: u64) -> u64 {
        match self.started_at_ms {
            Some(started) => epoch_ms.max(started),
            None => epoch_ms,
        }
    }
}

#[cfg(test)]
#[path = "job_tests.rs"]
mod tests;
