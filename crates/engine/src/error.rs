// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Engine-level errors.

use sweep_core::job::{JobId, TransitionError};
use thiserror::Error;

/// Errors surfaced by orchestrator operations.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("job not found: {0}")]
    JobNotFound(String),

    #[error("unknown job type: {0}")]
    UnknownJobType(String),

    #[error("duplicate job id: {0}")]
    DuplicateJob(JobId),

    #[error(transparent)]
    Transition(#[from] TransitionError),

    #[error("engine is shutting down")]
    ShuttingDown,
}
