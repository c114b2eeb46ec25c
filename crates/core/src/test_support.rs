// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared test factories for use across crates.
//!
//! Gated behind `#[cfg(any(test, feature = "test-support"))]`.

use crate::error::JobError;
use crate::event::Event;
use crate::fingerprint::Fingerprint;
use crate::job::{JobId, JobRecord};

/// A queued record with deterministic fields.
pub fn queued_record(id: &str, kind: &str) -> JobRecord {
    JobRecord::new(
        JobId::new(id),
        kind,
        serde_json::json!({}),
        Fingerprint::new(format!("fp-{id}")),
        1_000_000,
    )
}

/// A record that has already entered `running`.
pub fn running_record(id: &str, kind: &str) -> JobRecord {
    let mut record = queued_record(id, kind);
    #[allow(clippy::unwrap_used)]
    record.start(1_000_100).unwrap();
    record
}

pub fn created_event(id: &str, kind: &str) -> Event {
    Event::JobCreated {
        id: JobId::new(id),
        kind: kind.to_string(),
        fingerprint: Fingerprint::new(format!("fp-{id}")),
        created_at_ms: 1_000_000,
        cron: None,
    }
}

pub fn completed_event(id: &str, kind: &str) -> Event {
    Event::JobCompleted {
        id: JobId::new(id),
        kind: kind.to_string(),
        result: serde_json::json!({ "ok": true }),
    }
}

pub fn failed_event(id: &str, kind: &str, error: JobError) -> Event {
    Event::JobFailed {
        id: JobId::new(id),
        kind: kind.to_string(),
        error,
    }
}
