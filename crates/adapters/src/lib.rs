// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! sweep-adapters: side-effect collaborators behind trait seams.
//!
//! The engine core never talks to Git, subprocesses, or the filesystem
//! directly; it goes through the adapters defined here so tests can swap in
//! fakes.

pub mod git;
pub mod history;
pub mod scan;
pub mod subprocess;
pub mod workdir;

pub use git::{GitAdapter, GitError, PrRequest};
pub use history::HistorySink;
pub use scan::{CommandAnalyzer, ProgressReport, ScanAnalyzer, ScanArtifact, ScanRequest};
pub use workdir::ScopedWorkdir;

pub use git::command::CommandGit;
#[cfg(any(test, feature = "test-support"))]
pub use git::fake::FakeGit;
#[cfg(any(test, feature = "test-support"))]
pub use scan::FakeAnalyzer;
