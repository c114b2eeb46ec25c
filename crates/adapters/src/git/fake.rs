// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Recording fake for tests.

use super::{GitAdapter, GitError, PrRequest};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// In-memory Git adapter that records every call and can be scripted to
/// fail specific operations.
#[derive(Clone, Default)]
pub struct FakeGit {
    inner: Arc<Mutex<FakeGitState>>,
}

#[derive(Default)]
struct FakeGitState {
    calls: Vec<String>,
    branch: Option<String>,
    changed: Vec<PathBuf>,
    fail_ops: HashSet<String>,
    commits: u32,
}

impl FakeGit {
    pub fn new() -> Self {
        Self::default()
    }

    /// Script the named operation (e.g. "push") to fail.
    pub fn fail_on(&self, op: &str) {
        self.inner.lock().fail_ops.insert(op.to_string());
    }

    /// Pretend the working tree has these modified files.
    pub fn set_changed_files(&self, files: Vec<PathBuf>) {
        self.inner.lock().changed = files;
    }

    /// Every call made so far, as "op arg" strings.
    pub fn calls(&self) -> Vec<String> {
        self.inner.lock().calls.clone()
    }

    /// The branch currently checked out, if any checkout happened.
    pub fn checked_out(&self) -> Option<String> {
        self.inner.lock().branch.clone()
    }

    fn record(&self, op: &str, detail: &str) -> Result<(), GitError> {
        let mut state = self.inner.lock();
        state.calls.push(format!("{} {}", op, detail).trim().to_string());
        if state.fail_ops.contains(op) {
            return Err(GitError::CommandFailed {
                op: op.to_string(),
                detail: "scripted failure".to_string(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl GitAdapter for FakeGit {
    async fn current_branch(&self, _repo: &Path) -> Result<String, GitError> {
        self.record("current_branch", "")?;
        Ok(self
            .inner
            .lock()
            .branch
            .clone()
            .unwrap_or_else(|| "main".to_string()))
    }

    async fn head_sha(&self, _repo: &Path) -> Result<String, GitError> {
        self.record("head_sha", "")?;
        Ok("deadbeefdeadbeefdeadbeefdeadbeefdeadbeef".to_string())
    }

    async fn create_branch(&self, _repo: &Path, name: &str, base: &str) -> Result<(), GitError> {
        self.record("create_branch", &format!("{} from {}", name, base))?;
        self.inner.lock().branch = Some(name.to_string());
        Ok(())
    }

    async fn checkout(&self, _repo: &Path, name: &str) -> Result<(), GitError> {
        self.record("checkout", name)?;
        self.inner.lock().branch = Some(name.to_string());
        Ok(())
    }

    async fn changed_files(&self, _repo: &Path) -> Result<Vec<PathBuf>, GitError> {
        self.record("changed_files", "")?;
        Ok(self.inner.lock().changed.clone())
    }

    async fn commit_all(&self, _repo: &Path, message: &str) -> Result<String, GitError> {
        self.record("commit_all", message)?;
        let mut state = self.inner.lock();
        state.commits += 1;
        Ok(format!("fakesha{:04}", state.commits))
    }

    async fn push(&self, _repo: &Path, branch: &str) -> Result<(), GitError> {
        self.record("push", branch)
    }

    async fn open_pr(&self, _repo: &Path, request: &PrRequest) -> Result<String, GitError> {
        self.record("open_pr", &request.title)?;
        Ok(format!("https://example.test/pr/{}", request.branch))
    }
}
