// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Timer identifiers for delayed engine work.
//!
//! Timer ids are structured strings so the scheduler can store them in one
//! table and the engine loop can route a firing back to the right handler.

use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;
use sweep_core::JobId;

/// Unique identifier for a scheduled timer.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TimerId(String);

impl TimerId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Delayed re-enqueue of a retry child job.
    pub fn retry(child: &JobId) -> Self {
        Self(format!("retry:{}", child))
    }

    /// Recurring fire for a cron entry.
    pub fn cron(name: &str) -> Self {
        Self(format!("cron:{}", name))
    }

    /// Periodic retry-ledger TTL sweep.
    pub fn ledger_sweep() -> Self {
        Self("ledger-sweep".to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Parse this timer id into a typed [`TimerKind`].
    pub fn kind(&self) -> Option<TimerKind<'_>> {
        TimerKind::parse(&self.0)
    }
}

impl fmt::Display for TimerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl PartialEq<str> for TimerId {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl Borrow<str> for TimerId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

/// Parsed representation of a timer id for type-safe routing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TimerKind<'a> {
    /// Enqueue the retry child with this id.
    Retry { child_id: &'a str },
    /// Fire the named cron entry.
    Cron { name: &'a str },
    /// Prune expired retry-ledger entries.
    LedgerSweep,
}

impl<'a> TimerKind<'a> {
    /// Returns `None` for unrecognized timer id formats.
    pub fn parse(id: &'a str) -> Option<TimerKind<'a>> {
        if let Some(rest) = id.strip_prefix("retry:") {
            return Some(TimerKind::Retry { child_id: rest });
        }
        if let Some(rest) = id.strip_prefix("cron:") {
            return Some(TimerKind::Cron { name: rest });
        }
        if id == "ledger-sweep" {
            return Some(TimerKind::LedgerSweep);
        }
        None
    }
}

#[cfg(test)]
#[path = "timer_tests.rs"]
mod tests;
