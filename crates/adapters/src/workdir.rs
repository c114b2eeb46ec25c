// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-job scratch directories with guaranteed cleanup.

use std::path::{Path, PathBuf};

/// A scratch directory scoped to one job attempt.
///
/// Removed on drop on every exit path (success, failure, cancel, timeout);
/// removal failures are logged, never propagated.
pub struct ScopedWorkdir {
    path: PathBuf,
    removed: bool,
}

impl ScopedWorkdir {
    /// Create `<base>/<job_id>`, including parents.
    pub fn create(base: &Path, job_id: &str) -> std::io::Result<Self> {
        let path = base.join(job_id);
        std::fs::create_dir_all(&path)?;
        Ok(Self {
            path,
            removed: false,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Eager removal, surfacing the error; drop remains the safety net.
    pub fn remove(mut self) -> std::io::Result<()> {
        self.removed = true;
        std::fs::remove_dir_all(&self.path)
    }
}

impl Drop for ScopedWorkdir {
    fn drop(&mut self) {
        if self.removed {
            return;
        }
        if let Err(e) = std::fs::remove_dir_all(&self.path) {
            if e.kind() != std::io::ErrorKind::NotFound {
                tracing::warn!(path = %self.path.display(), error = %e, "workdir cleanup failed");
            }
        }
    }
}

#[cfg(test)]
#[path = "workdir_tests.rs"]
mod tests;
