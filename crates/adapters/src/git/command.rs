// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Git adapter backed by the `git` (and `gh`) command line tools.

use super::{GitAdapter, GitError, PrRequest};
use crate::subprocess::{run_with_timeout, stderr_text, stdout_text, GIT_COMMAND_TIMEOUT};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::process::Command;

/// Runs git operations as subprocesses in the target repository.
pub struct CommandGit {
    timeout: Duration,
}

impl CommandGit {
    pub fn new() -> Self {
        Self {
            timeout: GIT_COMMAND_TIMEOUT,
        }
    }

    pub fn with_timeout(timeout: Duration) -> Self {
        Self { timeout }
    }

    async fn git(&self, repo: &Path, args: &[&str]) -> Result<String, GitError> {
        if !repo.join(".git").exists() {
            return Err(GitError::NotARepository(repo.to_path_buf()));
        }
        let op = args.first().copied().unwrap_or("git").to_string();
        let mut cmd = Command::new("git");
        cmd.args(args).current_dir(repo);
        let output = run_with_timeout(cmd, self.timeout, &format!("git {}", op)).await?;
        if !output.status.success() {
            tracing::warn!(
                repo = %repo.display(),
                op = %op,
                exit_code = output.status.code().unwrap_or(-1),
                stderr = %stderr_text(&output),
                "git command failed"
            );
            return Err(GitError::CommandFailed {
                op,
                detail: stderr_text(&output),
            });
        }
        Ok(stdout_text(&output))
    }
}

impl Default for CommandGit {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl GitAdapter for CommandGit {
    async fn current_branch(&self, repo: &Path) -> Result<String, GitError> {
        self.git(repo, &["rev-parse", "--abbrev-ref", "HEAD"]).await
    }

    async fn head_sha(&self, repo: &Path) -> Result<String, GitError> {
        self.git(repo, &["rev-parse", "HEAD"]).await
    }

    async fn create_branch(&self, repo: &Path, name: &str, base: &str) -> Result<(), GitError> {
        self.git(repo, &["checkout", "-b", name, base]).await?;
        Ok(())
    }

    async fn checkout(&self, repo: &Path, name: &str) -> Result<(), GitError> {
        self.git(repo, &["checkout", name]).await?;
        Ok(())
    }

    async fn changed_files(&self, repo: &Path) -> Result<Vec<PathBuf>, GitError> {
        let text = self.git(repo, &["status", "--porcelain"]).await?;
        Ok(parse_porcelain(&text))
    }

    async fn commit_all(&self, repo: &Path, message: &str) -> Result<String, GitError> {
        self.git(repo, &["add", "-A"]).await?;
        self.git(repo, &["commit", "-m", message]).await?;
        self.git(repo, &["rev-parse", "HEAD"]).await
    }

    async fn push(&self, repo: &Path, branch: &str) -> Result<(), GitError> {
        self.git(repo, &["push", "-u", "origin", branch]).await?;
        Ok(())
    }

    async fn open_pr(&self, repo: &Path, request: &PrRequest) -> Result<String, GitError> {
        let mut cmd = Command::new("gh");
        cmd.args([
            "pr",
            "create",
            "--title",
            &request.title,
            "--body",
            &request.body,
            "--base",
            &request.base,
            "--head",
            &request.branch,
        ])
        .current_dir(repo);
        let output = run_with_timeout(cmd, self.timeout, "gh pr create").await?;
        if !output.status.success() {
            return Err(GitError::CommandFailed {
                op: "pr create".to_string(),
                detail: stderr_text(&output),
            });
        }
        Ok(stdout_text(&output))
    }
}

/// Parse `git status --porcelain` output into changed paths.
///
/// Renames (`R  old -> new`) report the new path.
fn parse_porcelain(text: &str) -> Vec<PathBuf> {
    text.lines()
        .filter(|line| line.len() > 3)
        .map(|line| {
            let path = &line[3..];
            let path = path.rsplit_once(" -> ").map(|(_, new)| new).unwrap_or(path);
            PathBuf::from(path.trim_matches('"'))
        })
        .collect()
}

#[cfg(test)]
#[path = "command_tests.rs"]
mod tests;
