// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Retry controller: per-fingerprint attempt ledger, exponential backoff
//! with jitter, and the absolute-ceiling circuit breaker.
//!
//! Attempt accounting is keyed on the fingerprint, never the transient job
//! id, so a retry chain shares one ledger entry no matter how many id
//! generations it spans.

use rand::Rng;
use std::collections::HashMap;
use std::time::Duration;
use sweep_core::{ErrorClass, Fingerprint, RetryConfig};

/// Per-fingerprint retry accounting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerEntry {
    /// Retries scheduled so far (not counting the original attempt).
    pub retries: u32,
    /// Subset of retries caused by timeouts (lower sub-cap).
    pub timeout_retries: u32,
    pub first_seen_ms: u64,
    pub last_attempt_ms: u64,
    pub next_eligible_ms: u64,
    pub circuit_open: bool,
}

impl LedgerEntry {
    fn new(now_ms: u64) -> Self {
        Self {
            retries: 0,
            timeout_retries: 0,
            first_seen_ms: now_ms,
            last_attempt_ms: now_ms,
            next_eligible_ms: now_ms,
            circuit_open: false,
        }
    }
}

/// Why a failure surfaced instead of retrying.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GiveUpReason {
    /// Classification is not eligible for retry.
    NotRetryable,
    /// Absolute ceiling reached for this fingerprint.
    CircuitOpen,
    /// Timeout sub-cap reached.
    TimeoutCap,
}

/// Outcome of consulting the controller after a failed attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RetryDecision {
    Retry {
        /// Retry number, 1-based.
        attempt: u32,
        delay: Duration,
    },
    GiveUp {
        reason: GiveUpReason,
        /// True exactly when this failure tripped the breaker.
        circuit_opened: bool,
        /// Total retries scheduled over the fingerprint's lifetime.
        attempts: u32,
    },
}

/// Decides retry vs. surface for failed attempts.
pub struct RetryController {
    config: RetryConfig,
    ledger: HashMap<Fingerprint, LedgerEntry>,
}

impl RetryController {
    pub fn new(config: RetryConfig) -> Self {
        Self {
            config,
            ledger: HashMap::new(),
        }
    }

    /// Record a failed attempt and decide what happens next.
    pub fn on_failure(
        &mut self,
        fingerprint: &Fingerprint,
        class: ErrorClass,
        retry_after_ms: Option<u64>,
        now_ms: u64,
    ) -> RetryDecision {
        let entry = self
            .ledger
            .entry(fingerprint.clone())
            .or_insert_with(|| LedgerEntry::new(now_ms));
        entry.last_attempt_ms = now_ms;

        if entry.circuit_open {
            let attempts = entry.retries;
            return RetryDecision::GiveUp {
                reason: GiveUpReason::CircuitOpen,
                circuit_opened: false,
                attempts,
            };
        }

        let timeout_eligible =
            class == ErrorClass::Timeout && entry.timeout_retries < self.config.timeout_max;
        if !class.eligible_for_retry() && !timeout_eligible {
            let attempts = entry.retries;
            let reason = if class == ErrorClass::Timeout {
                GiveUpReason::TimeoutCap
            } else {
                GiveUpReason::NotRetryable
            };
            // Terminal give-up: drop the ledger entry.
            self.ledger.remove(fingerprint);
            return RetryDecision::GiveUp {
                reason,
                circuit_opened: false,
                attempts,
            };
        }

        if entry.retries >= self.config.absolute_max {
            entry.circuit_open = true;
            let attempts = entry.retries;
            return RetryDecision::GiveUp {
                reason: GiveUpReason::CircuitOpen,
                circuit_opened: true,
                attempts,
            };
        }

        entry.retries += 1;
        if class == ErrorClass::Timeout {
            entry.timeout_retries += 1;
        }
        let attempt = entry.retries;

        let delay = match (class, retry_after_ms) {
            // A rate-limit hint takes precedence, clamped to the cap.
            (ErrorClass::RateLimited, Some(hint)) => {
                Duration::from_millis(hint.min(self.config.cap_ms))
            }
            _ => Self::backoff(&self.config, attempt),
        };
        entry.next_eligible_ms = now_ms + delay.as_millis() as u64;

        RetryDecision::Retry { attempt, delay }
    }

    /// `min(base * 2^(attempt-1), cap) * (1 + rand[-jitter, +jitter])`
    fn backoff(config: &RetryConfig, attempt: u32) -> Duration {
        let exp = config
            .base_ms
            .saturating_mul(2u64.saturating_pow(attempt.saturating_sub(1)))
            .min(config.cap_ms);
        let jitter = config.jitter;
        if jitter <= 0.0 {
            return Duration::from_millis(exp);
        }
        let factor = 1.0 + rand::thread_rng().gen_range(-jitter..=jitter);
        Duration::from_millis(((exp as f64) * factor).round().max(0.0) as u64)
    }

    /// Terminal success: forget the fingerprint.
    pub fn on_success(&mut self, fingerprint: &Fingerprint) {
        self.ledger.remove(fingerprint);
    }

    /// Cancellation anywhere in the chain closes the circuit and prunes the
    /// entry. Returns true if an open circuit was closed.
    pub fn on_cancel(&mut self, fingerprint: &Fingerprint) -> bool {
        self.ledger
            .remove(fingerprint)
            .map(|e| e.circuit_open)
            .unwrap_or(false)
    }

    /// Drop entries idle past the TTL; returns fingerprints whose open
    /// circuits closed by expiring.
    pub fn prune_expired(&mut self, now_ms: u64) -> Vec<Fingerprint> {
        let ttl = self.config.ledger_ttl_ms;
        let expired: Vec<Fingerprint> = self
            .ledger
            .iter()
            .filter(|(_, e)| now_ms.saturating_sub(e.last_attempt_ms) >= ttl)
            .map(|(fp, _)| fp.clone())
            .collect();
        let mut closed = Vec::new();
        for fp in expired {
            if let Some(entry) = self.ledger.remove(&fp) {
                if entry.circuit_open {
                    closed.push(fp);
                }
            }
        }
        closed
    }

    pub fn entry(&self, fingerprint: &Fingerprint) -> Option<&LedgerEntry> {
        self.ledger.get(fingerprint)
    }

    pub fn len(&self) -> usize {
        self.ledger.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ledger.is_empty()
    }
}

#[cfg(test)]
#[path = "retry_tests.rs"]
mod tests;
