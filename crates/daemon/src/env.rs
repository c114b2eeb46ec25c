// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! State directory resolution.

use std::path::PathBuf;

/// Root state directory: `$XDG_STATE_HOME/sweep` or `~/.local/state/sweep`.
pub fn state_dir() -> Option<PathBuf> {
    dirs::state_dir()
        .or_else(|| dirs::home_dir().map(|home| home.join(".local/state")))
        .map(|base| base.join("sweep"))
}

/// Default directory for scan result JSON files.
pub fn default_output_dir(state: &std::path::Path) -> PathBuf {
    state.join("scans")
}

/// Base directory for per-job scratch dirs.
pub fn workdir_base(state: &std::path::Path) -> PathBuf {
    state.join("work")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derived_paths_nest_under_state() {
        let state = PathBuf::from("/tmp/state/sweep");
        assert_eq!(default_output_dir(&state), PathBuf::from("/tmp/state/sweep/scans"));
        assert_eq!(workdir_base(&state), PathBuf::from("/tmp/state/sweep/work"));
    }
}
