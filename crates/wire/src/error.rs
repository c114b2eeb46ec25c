// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The uniform error body returned by every control operation.

use serde::{Deserialize, Serialize};

/// `{error, message, timestamp, status?, details?}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorBody {
    /// Machine-readable slug, e.g. "not_found".
    pub error: String,
    /// Human-readable description.
    pub message: String,
    /// Epoch milliseconds.
    pub timestamp: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ErrorBody {
    pub fn new(error: impl Into<String>, message: impl Into<String>, timestamp: u64) -> Self {
        Self {
            error: error.into(),
            message: message.into(),
            timestamp,
            status: None,
            details: None,
        }
    }

    pub fn with_status(mut self, status: u16) -> Self {
        self.status = Some(status);
        self
    }

    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }

    /// The 404 shape for unknown job/scan ids.
    pub fn not_found(what: impl std::fmt::Display, timestamp: u64) -> Self {
        Self::new("not_found", format!("{} not found", what), timestamp).with_status(404)
    }

    pub fn invalid(message: impl Into<String>, timestamp: u64) -> Self {
        Self::new("invalid_request", message, timestamp).with_status(400)
    }

    pub fn internal(message: impl Into<String>, timestamp: u64) -> Self {
        Self::new("internal", message, timestamp).with_status(500)
    }
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
