// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use yare::parameterized;

#[test]
fn retry_timer_round_trips() {
    let child = JobId::new("job-abc-retry2");
    let id = TimerId::retry(&child);
    assert_eq!(
        id.kind(),
        Some(TimerKind::Retry {
            child_id: "job-abc-retry2"
        })
    );
}

#[test]
fn cron_timer_round_trips() {
    let id = TimerId::cron("nightly-scan");
    assert_eq!(
        id.kind(),
        Some(TimerKind::Cron {
            name: "nightly-scan"
        })
    );
}

#[test]
fn ledger_sweep_parses() {
    assert_eq!(TimerId::ledger_sweep().kind(), Some(TimerKind::LedgerSweep));
}

#[parameterized(
    empty = { "" },
    unknown = { "bogus:thing" },
    bare_prefixless = { "retry" },
)]
fn unrecognized_formats_return_none(id: &str) {
    assert_eq!(TimerKind::parse(id), None);
}
