// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Error taxonomy and single-point normalization.
//!
//! Handlers fail with a [`JobError`]; the runner captures it exactly once and
//! every downstream consumer (events, activity feed, history sink) sees the
//! normalized form. The "no details" case is explicit: [`JobError::unknown`]
//! carries the canonical "Unknown error" message so subscribers never have to
//! defend against missing fields.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Classification of a failure, driving the retry decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorClass {
    /// Explicitly marked retryable by the handler.
    Retryable,
    /// Network blips, lock contention. Retryable.
    Transient,
    /// Invalid input, missing repository, schema mismatch. Surfaces immediately.
    Permanent,
    /// Upstream rate limit; may carry a retry-after hint.
    RateLimited,
    /// Handler deadline exceeded. Retryable up to a lower sub-cap.
    Timeout,
    /// User-initiated. Never retried.
    Cancelled,
    /// Retry ceiling reached for the fingerprint.
    CircuitOpen,
    /// Orchestrator bug; never retried, logged at highest severity.
    Internal,
    /// No classification available. Not retried.
    Unknown,
}

impl ErrorClass {
    /// Whether this class is eligible for backoff-and-retry.
    ///
    /// `Timeout` is handled separately (lower sub-cap) and is not part of
    /// the general eligibility set.
    pub fn eligible_for_retry(self) -> bool {
        matches!(
            self,
            ErrorClass::Retryable | ErrorClass::Transient | ErrorClass::RateLimited
        )
    }
}

crate::simple_display! {
    ErrorClass {
        Retryable => "retryable",
        Transient => "transient",
        Permanent => "permanent",
        RateLimited => "rate_limited",
        Timeout => "timeout",
        Cancelled => "cancelled",
        CircuitOpen => "circuit_open",
        Internal => "internal",
        Unknown => "unknown",
    }
}

/// Normalized failure details attached to a failed job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobError {
    pub message: String,
    pub class: ErrorClass,
    /// Machine-readable code (e.g. "ENOREPO", "E429").
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    /// Captured backtrace or handler-provided trace text.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stack: Option<String>,
    /// Rate-limit hint: earliest retry, milliseconds from the failure.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retry_after_ms: Option<u64>,
    /// Handler output retained across a post-handler failure (e.g. a Git
    /// push that failed after the handler itself succeeded).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub partial_result: Option<serde_json::Value>,
}

impl JobError {
    pub fn new(class: ErrorClass, message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            class,
            code: None,
            stack: None,
            retry_after_ms: None,
            partial_result: None,
        }
    }

    /// The canonical "no details" failure.
    pub fn unknown() -> Self {
        Self::new(ErrorClass::Unknown, "Unknown error")
    }

    pub fn transient(message: impl Into<String>) -> Self {
        Self::new(ErrorClass::Transient, message)
    }

    pub fn permanent(message: impl Into<String>) -> Self {
        Self::new(ErrorClass::Permanent, message)
    }

    pub fn timeout(message: impl Into<String>) -> Self {
        Self::new(ErrorClass::Timeout, message)
    }

    pub fn cancelled() -> Self {
        Self::new(ErrorClass::Cancelled, "cancelled")
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorClass::Internal, message)
    }

    pub fn rate_limited(message: impl Into<String>, retry_after_ms: Option<u64>) -> Self {
        let mut err = Self::new(ErrorClass::RateLimited, message);
        err.retry_after_ms = retry_after_ms;
        err
    }

    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }

    pub fn with_stack(mut self, stack: impl Into<String>) -> Self {
        self.stack = Some(stack.into());
        self
    }

    pub fn with_partial_result(mut self, result: serde_json::Value) -> Self {
        self.partial_result = Some(result);
        self
    }

    /// Collapse an optional error into a concrete one.
    pub fn normalize(error: Option<JobError>) -> JobError {
        error.unwrap_or_else(JobError::unknown)
    }

    /// Message of an optional error, tolerating the missing case.
    pub fn message_of(error: Option<&JobError>) -> &str {
        error.map(|e| e.message.as_str()).unwrap_or("Unknown error")
    }
}

impl std::fmt::Display for JobError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.code {
            Some(code) => write!(f, "{} ({}): {}", self.class, code, self.message),
            None => write!(f, "{}: {}", self.class, self.message),
        }
    }
}

impl std::error::Error for JobError {}

/// Maps a captured failure to its final classification.
///
/// The runner consults the classifier exactly once per failure; the retry
/// controller only ever sees the resulting [`ErrorClass`].
pub trait ErrorClassifier: Send + Sync {
    fn classify(&self, error: &JobError) -> ErrorClass;
}

/// Default classification: honor the handler's class, except that errors
/// whose `code` is in the configured no-retry set surface as permanent.
pub struct DefaultClassifier {
    no_retry_codes: HashSet<String>,
}

impl DefaultClassifier {
    pub fn new(no_retry_codes: impl IntoIterator<Item = String>) -> Self {
        Self {
            no_retry_codes: no_retry_codes.into_iter().collect(),
        }
    }
}

impl Default for DefaultClassifier {
    fn default() -> Self {
        Self::new([])
    }
}

impl ErrorClassifier for DefaultClassifier {
    fn classify(&self, error: &JobError) -> ErrorClass {
        if let Some(code) = &error.code {
            if self.no_retry_codes.contains(code) {
                return ErrorClass::Permanent;
            }
        }
        error.class
    }
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
