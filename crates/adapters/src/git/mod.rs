// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Git adapter: the seam for all repository side-effects.

pub mod command;
#[cfg(any(test, feature = "test-support"))]
pub mod fake;

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use sweep_core::error::ErrorClass;
use thiserror::Error;

/// Errors from git operations.
#[derive(Debug, Error)]
pub enum GitError {
    #[error("not a git repository: {0}")]
    NotARepository(PathBuf),

    #[error("git {op} failed: {detail}")]
    CommandFailed { op: String, detail: String },

    #[error("git io error: {0}")]
    Io(#[from] std::io::Error),
}

impl GitError {
    /// Classification used when a git step fails a job.
    pub fn class(&self) -> ErrorClass {
        match self {
            // A missing repository will not fix itself on retry.
            GitError::NotARepository(_) => ErrorClass::Permanent,
            GitError::CommandFailed { .. } => ErrorClass::Transient,
            GitError::Io(e) if e.kind() == std::io::ErrorKind::TimedOut => ErrorClass::Timeout,
            GitError::Io(_) => ErrorClass::Transient,
        }
    }
}

/// Context for opening a pull request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrRequest {
    pub title: String,
    pub body: String,
    pub branch: String,
    pub base: String,
}

/// All repository side-effects the engine performs.
#[async_trait]
pub trait GitAdapter: Send + Sync {
    async fn current_branch(&self, repo: &Path) -> Result<String, GitError>;

    async fn head_sha(&self, repo: &Path) -> Result<String, GitError>;

    /// Create `name` from `base` and check it out.
    async fn create_branch(&self, repo: &Path, name: &str, base: &str) -> Result<(), GitError>;

    async fn checkout(&self, repo: &Path, name: &str) -> Result<(), GitError>;

    /// Tracked files with local modifications (staged or not).
    async fn changed_files(&self, repo: &Path) -> Result<Vec<PathBuf>, GitError>;

    /// Stage everything and commit; returns the new commit sha.
    async fn commit_all(&self, repo: &Path, message: &str) -> Result<String, GitError>;

    async fn push(&self, repo: &Path, branch: &str) -> Result<(), GitError>;

    /// Open a pull request; returns its URL.
    async fn open_pr(&self, repo: &Path, request: &PrRequest) -> Result<String, GitError>;
}
