// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Subprocess execution with timeouts.

use std::process::Output;
use std::time::Duration;
use tokio::process::Command;

/// Timeout for individual git operations.
pub const GIT_COMMAND_TIMEOUT: Duration = Duration::from_secs(120);

/// Run a command to completion, failing with `TimedOut` past `timeout`.
///
/// The child is killed on timeout (kill_on_drop), so a wedged subprocess
/// cannot outlive the calling task.
pub async fn run_with_timeout(
    mut cmd: Command,
    timeout: Duration,
    what: &str,
) -> std::io::Result<Output> {
    cmd.kill_on_drop(true);
    match tokio::time::timeout(timeout, cmd.output()).await {
        Ok(result) => result,
        Err(_) => Err(std::io::Error::new(
            std::io::ErrorKind::TimedOut,
            format!("{} timed out after {}s", what, timeout.as_secs()),
        )),
    }
}

/// Lossy UTF-8 of stdout, trimmed.
pub fn stdout_text(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).trim().to_string()
}

/// Lossy UTF-8 of stderr, trimmed.
pub fn stderr_text(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).trim().to_string()
}
