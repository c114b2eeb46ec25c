// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Content-addressed scan cache with single-flight builds.
//!
//! Addressed by fingerprint, so a stale artifact can never be wrong for its
//! key: a missed invalidation only costs freshness, not correctness. At
//! most one build runs per fingerprint at a time; concurrent callers become
//! waiters that resolve with the leader's artifact (or its error).

use parking_lot::Mutex;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use sweep_core::{Fingerprint, JobError};
use sweep_adapters::ScanArtifact;
use tokio::sync::oneshot;

/// A cached artifact with its addressing metadata.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub fingerprint: Fingerprint,
    pub repository: PathBuf,
    pub created_at_ms: u64,
    pub ttl_ms: u64,
    pub artifact: ScanArtifact,
}

impl CacheEntry {
    fn expired(&self, now_ms: u64) -> bool {
        now_ms.saturating_sub(self.created_at_ms) >= self.ttl_ms
    }
}

/// Result of [`ScanCache::acquire`].
pub enum Acquired {
    /// Fresh artifact already cached.
    Hit(ScanArtifact),
    /// Caller owns the build; complete or fail the guard.
    Leader(LeaderGuard),
    /// Another caller is building; await the shared outcome.
    Waiter(oneshot::Receiver<Result<ScanArtifact, JobError>>),
}

/// Summary for the tool surface.
#[derive(Debug, Clone, serde::Serialize)]
pub struct CacheStatus {
    pub entries: usize,
    pub in_flight: usize,
    pub repositories: Vec<PathBuf>,
}

struct CacheInner {
    entries: HashMap<Fingerprint, CacheEntry>,
    /// Presence of a key marks an in-flight build; the vec holds waiters.
    builds: HashMap<Fingerprint, Vec<oneshot::Sender<Result<ScanArtifact, JobError>>>>,
}

/// Shared, internally synchronized cache handle.
#[derive(Clone)]
pub struct ScanCache {
    inner: Arc<Mutex<CacheInner>>,
}

impl ScanCache {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(CacheInner {
                entries: HashMap::new(),
                builds: HashMap::new(),
            })),
        }
    }

    /// Fresh artifact for the fingerprint, lazily evicting an expired entry.
    pub fn lookup(&self, fingerprint: &Fingerprint, now_ms: u64) -> Option<ScanArtifact> {
        let mut inner = self.inner.lock();
        match inner.entries.get(fingerprint) {
            Some(entry) if !entry.expired(now_ms) => Some(entry.artifact.clone()),
            Some(_) => {
                inner.entries.remove(fingerprint);
                None
            }
            None => None,
        }
    }

    /// Hit, or join/lead the single-flight build for this fingerprint.
    pub fn acquire(&self, fingerprint: &Fingerprint, now_ms: u64) -> Acquired {
        let mut inner = self.inner.lock();
        match inner.entries.get(fingerprint) {
            Some(entry) if !entry.expired(now_ms) => {
                return Acquired::Hit(entry.artifact.clone());
            }
            Some(_) => {
                inner.entries.remove(fingerprint);
            }
            None => {}
        }
        if let Some(waiters) = inner.builds.get_mut(fingerprint) {
            let (tx, rx) = oneshot::channel();
            waiters.push(tx);
            return Acquired::Waiter(rx);
        }
        inner.builds.insert(fingerprint.clone(), Vec::new());
        Acquired::Leader(LeaderGuard {
            cache: self.clone(),
            fingerprint: fingerprint.clone(),
            settled: false,
        })
    }

    /// Store an artifact directly (no single-flight coordination).
    pub fn put(
        &self,
        fingerprint: Fingerprint,
        repository: PathBuf,
        artifact: ScanArtifact,
        ttl: Duration,
        now_ms: u64,
    ) {
        let mut inner = self.inner.lock();
        inner.entries.insert(
            fingerprint.clone(),
            CacheEntry {
                fingerprint,
                repository,
                created_at_ms: now_ms,
                ttl_ms: ttl.as_millis() as u64,
                artifact,
            },
        );
    }

    /// Remove one fingerprint. Returns the number of entries removed (0 or 1).
    pub fn invalidate(&self, fingerprint: &Fingerprint) -> u32 {
        let mut inner = self.inner.lock();
        u32::from(inner.entries.remove(fingerprint).is_some())
    }

    /// Remove every entry for a repository path.
    pub fn invalidate_repo(&self, repository: &Path) -> u32 {
        let mut inner = self.inner.lock();
        let before = inner.entries.len();
        inner.entries.retain(|_, e| e.repository != repository);
        (before - inner.entries.len()) as u32
    }

    pub fn status(&self) -> CacheStatus {
        let inner = self.inner.lock();
        let mut repositories: Vec<PathBuf> =
            inner.entries.values().map(|e| e.repository.clone()).collect();
        repositories.sort();
        repositories.dedup();
        CacheStatus {
            entries: inner.entries.len(),
            in_flight: inner.builds.len(),
            repositories,
        }
    }

    pub fn len(&self) -> usize {
        self.inner.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().entries.is_empty()
    }

    fn settle(&self, fingerprint: &Fingerprint, outcome: Result<ScanArtifact, JobError>) {
        let waiters = {
            let mut inner = self.inner.lock();
            inner.builds.remove(fingerprint).unwrap_or_default()
        };
        for waiter in waiters {
            let _ = waiter.send(outcome.clone());
        }
    }
}

impl Default for ScanCache {
    fn default() -> Self {
        Self::new()
    }
}

/// Exclusive right to build one fingerprint.
///
/// Dropping the guard without settling fails the waiters instead of
/// deadlocking them.
pub struct LeaderGuard {
    cache: ScanCache,
    fingerprint: Fingerprint,
    settled: bool,
}

impl LeaderGuard {
    pub fn fingerprint(&self) -> &Fingerprint {
        &self.fingerprint
    }

    /// Store the artifact and resolve all waiters with it.
    pub fn complete(
        mut self,
        repository: PathBuf,
        artifact: ScanArtifact,
        ttl: Duration,
        now_ms: u64,
    ) {
        self.settled = true;
        self.cache.put(
            self.fingerprint.clone(),
            repository,
            artifact.clone(),
            ttl,
            now_ms,
        );
        self.cache.settle(&self.fingerprint, Ok(artifact));
    }

    /// Propagate the build error to all waiters; nothing is cached.
    pub fn fail(mut self, error: JobError) {
        self.settled = true;
        self.cache.settle(&self.fingerprint, Err(error));
    }
}

impl Drop for LeaderGuard {
    fn drop(&mut self) {
        if self.settled {
            return;
        }
        tracing::warn!(fingerprint = %self.fingerprint, "scan leader dropped without settling");
        self.cache.settle(
            &self.fingerprint,
            Err(JobError::internal("scan build abandoned")),
        );
    }
}

/// Fingerprint for a repository scan:
/// `sha256(repository_path, commit_sha, handler_version, option_hash)`.
pub fn scan_fingerprint(
    repository: &Path,
    commit_sha: &str,
    handler_version: &str,
    option_hash: &str,
) -> Fingerprint {
    let mut hasher = Sha256::new();
    hasher.update(repository.to_string_lossy().as_bytes());
    hasher.update(b"\n");
    hasher.update(commit_sha.as_bytes());
    hasher.update(b"\n");
    hasher.update(handler_version.as_bytes());
    hasher.update(b"\n");
    hasher.update(option_hash.as_bytes());
    Fingerprint::new(format!("{:x}", hasher.finalize()))
}

/// Stable hash of a JSON options value (serde_json orders object keys).
pub fn option_hash(options: &serde_json::Value) -> String {
    let canonical = options.to_string();
    format!("{:x}", Sha256::digest(canonical.as_bytes()))
}

#[cfg(test)]
#[path = "cache_tests.rs"]
mod tests;
