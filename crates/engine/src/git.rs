// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The Git side-effect protocol.
//!
//! Opt-in per handler. Before the handler body: record the original branch,
//! create and check out `prefix/<kind>/<job-id>` from the base branch. After
//! a successful handler: stage, commit, push, open a PR from the worker's
//! hooks, and only when tracked files actually changed. Cleanup always restores
//! the original branch. In dry-run mode every mutation is logged and skipped.

use crate::worker::PrContext;
use std::path::PathBuf;
use std::sync::Arc;
use sweep_adapters::{GitAdapter, GitError, PrRequest};
use sweep_core::{GitConfig, GitInfo, JobRecord};

/// Per-attempt Git protocol driver.
pub(crate) struct GitProtocol {
    adapter: Arc<dyn GitAdapter>,
    config: GitConfig,
    repo: PathBuf,
}

/// State carried from `begin` to `finish`/`restore`.
pub(crate) struct GitSession {
    original_branch: Option<String>,
    branch: String,
    pub info: GitInfo,
}

impl GitProtocol {
    pub fn new(adapter: Arc<dyn GitAdapter>, config: GitConfig, repo: PathBuf) -> Self {
        Self {
            adapter,
            config,
            repo,
        }
    }

    fn branch_name(&self, job: &JobRecord) -> String {
        format!("{}/{}/{}", self.config.branch_prefix, job.kind, job.id)
    }

    /// Record the original branch and move to the job branch.
    pub async fn begin(&self, job: &JobRecord) -> Result<GitSession, GitError> {
        let branch = self.branch_name(job);
        let info = GitInfo {
            branch_name: Some(branch.clone()),
            base_branch: Some(self.config.base_branch.clone()),
            ..GitInfo::default()
        };
        if self.config.dry_run {
            tracing::info!(job = %job.id, %branch, "dry-run: skipping branch creation");
            return Ok(GitSession {
                original_branch: None,
                branch,
                info,
            });
        }
        let original = self.adapter.current_branch(&self.repo).await?;
        self.adapter
            .create_branch(&self.repo, &branch, &self.config.base_branch)
            .await?;
        tracing::info!(job = %job.id, %branch, from = %original, "git branch created");
        Ok(GitSession {
            original_branch: Some(original),
            branch,
            info,
        })
    }

    /// Post-success steps: commit, push, open a PR. A clean tree is a no-op.
    pub async fn finish(
        &self,
        session: &mut GitSession,
        commit_message: String,
        pr: PrContext,
    ) -> Result<(), GitError> {
        if self.config.dry_run {
            tracing::info!(branch = %session.branch, "dry-run: skipping commit/push/pr");
            return Ok(());
        }
        let changed = self.adapter.changed_files(&self.repo).await?;
        if changed.is_empty() {
            tracing::info!(branch = %session.branch, "no tracked changes, skipping commit");
            return Ok(());
        }
        let sha = self.adapter.commit_all(&self.repo, &commit_message).await?;
        self.adapter.push(&self.repo, &session.branch).await?;
        let url = self
            .adapter
            .open_pr(
                &self.repo,
                &PrRequest {
                    title: pr.title,
                    body: pr.body,
                    branch: session.branch.clone(),
                    base: self.config.base_branch.clone(),
                },
            )
            .await?;
        session.info.commit_sha = Some(sha);
        session.info.changed_files = changed;
        session.info.pr_url = Some(url.clone());
        tracing::info!(branch = %session.branch, pr = %url, "pull request opened");
        Ok(())
    }

    /// Always runs, on every exit path. Failures are logged, not propagated;
    /// the job outcome is already decided by this point.
    pub async fn restore(&self, session: &GitSession) {
        let Some(original) = &session.original_branch else {
            return;
        };
        if let Err(e) = self.adapter.checkout(&self.repo, original).await {
            tracing::warn!(
                repo = %self.repo.display(),
                branch = %original,
                error = %e,
                "failed to restore original branch"
            );
        }
    }
}

#[cfg(test)]
#[path = "git_tests.rs"]
mod tests;
