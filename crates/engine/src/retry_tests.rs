// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use yare::parameterized;

fn config(base_ms: u64, cap_ms: u64, jitter: f64, absolute_max: u32) -> RetryConfig {
    RetryConfig {
        base_ms,
        cap_ms,
        jitter,
        absolute_max,
        ..RetryConfig::default()
    }
}

fn fp(s: &str) -> Fingerprint {
    Fingerprint::new(s)
}

#[test]
fn transient_failures_retry_with_growing_backoff() {
    let mut retry = RetryController::new(config(100, 100_000, 0.0, 10));

    for (expected_attempt, expected_ms) in [(1, 100), (2, 200), (3, 400), (4, 800)] {
        match retry.on_failure(&fp("f"), ErrorClass::Transient, None, 1_000) {
            RetryDecision::Retry { attempt, delay } => {
                assert_eq!(attempt, expected_attempt);
                assert_eq!(delay, Duration::from_millis(expected_ms));
            }
            other => panic!("expected retry, got {other:?}"),
        }
    }
}

#[test]
fn backoff_is_capped() {
    let mut retry = RetryController::new(config(100, 250, 0.0, 10));
    retry.on_failure(&fp("f"), ErrorClass::Transient, None, 0);
    match retry.on_failure(&fp("f"), ErrorClass::Transient, None, 0) {
        RetryDecision::Retry { delay, .. } => assert_eq!(delay, Duration::from_millis(200)),
        other => panic!("expected retry, got {other:?}"),
    }
    match retry.on_failure(&fp("f"), ErrorClass::Transient, None, 0) {
        RetryDecision::Retry { delay, .. } => assert_eq!(delay, Duration::from_millis(250)),
        other => panic!("expected retry, got {other:?}"),
    }
}

#[test]
fn jitter_stays_within_bounds() {
    let mut retry = RetryController::new(config(1_000, 1_000_000, 0.2, 10));
    for _ in 0..50 {
        match retry.on_failure(&fp("jitter"), ErrorClass::Transient, None, 0) {
            RetryDecision::Retry { attempt, delay } => {
                let exp = (1_000u64 * 2u64.pow(attempt - 1)).min(1_000_000);
                let low = (exp as f64 * 0.8).floor() as u128;
                let high = (exp as f64 * 1.2).ceil() as u128;
                assert!(
                    (low..=high).contains(&delay.as_millis()),
                    "delay {:?} outside [{low}, {high}] for attempt {attempt}",
                    delay
                );
            }
            RetryDecision::GiveUp { .. } => break,
        }
    }
}

#[test]
fn rate_limit_hint_takes_precedence_and_clamps() {
    let mut retry = RetryController::new(config(100, 5_000, 0.2, 10));
    match retry.on_failure(&fp("f"), ErrorClass::RateLimited, Some(2_500), 0) {
        RetryDecision::Retry { delay, .. } => assert_eq!(delay, Duration::from_millis(2_500)),
        other => panic!("expected retry, got {other:?}"),
    }
    match retry.on_failure(&fp("f"), ErrorClass::RateLimited, Some(60_000), 0) {
        RetryDecision::Retry { delay, .. } => assert_eq!(delay, Duration::from_millis(5_000)),
        other => panic!("expected retry, got {other:?}"),
    }
}

#[parameterized(
    permanent = { ErrorClass::Permanent },
    cancelled = { ErrorClass::Cancelled },
    internal = { ErrorClass::Internal },
    unknown = { ErrorClass::Unknown },
)]
fn ineligible_classes_surface_immediately(class: ErrorClass) {
    let mut retry = RetryController::new(config(1, 1_000, 0.0, 10));
    match retry.on_failure(&fp("f"), class, None, 0) {
        RetryDecision::GiveUp {
            reason,
            circuit_opened,
            ..
        } => {
            assert_eq!(reason, GiveUpReason::NotRetryable);
            assert!(!circuit_opened);
        }
        other => panic!("expected give up, got {other:?}"),
    }
    // Ledger entry pruned on terminal give-up
    assert!(retry.entry(&fp("f")).is_none());
}

#[test]
fn timeouts_retry_up_to_sub_cap() {
    let mut retry = RetryController::new(RetryConfig {
        base_ms: 1,
        cap_ms: 1_000,
        jitter: 0.0,
        absolute_max: 10,
        timeout_max: 2,
        ..RetryConfig::default()
    });

    assert!(matches!(
        retry.on_failure(&fp("t"), ErrorClass::Timeout, None, 0),
        RetryDecision::Retry { attempt: 1, .. }
    ));
    assert!(matches!(
        retry.on_failure(&fp("t"), ErrorClass::Timeout, None, 0),
        RetryDecision::Retry { attempt: 2, .. }
    ));
    assert!(matches!(
        retry.on_failure(&fp("t"), ErrorClass::Timeout, None, 0),
        RetryDecision::GiveUp {
            reason: GiveUpReason::TimeoutCap,
            ..
        }
    ));
}

#[test]
fn circuit_opens_at_absolute_ceiling() {
    let mut retry = RetryController::new(config(1, 10, 0.0, 3));

    for attempt in 1..=3 {
        assert!(matches!(
            retry.on_failure(&fp("c"), ErrorClass::Transient, None, 0),
            RetryDecision::Retry { attempt: a, .. } if a == attempt
        ));
    }
    // Fourth failure trips the breaker
    match retry.on_failure(&fp("c"), ErrorClass::Transient, None, 0) {
        RetryDecision::GiveUp {
            reason,
            circuit_opened,
            attempts,
        } => {
            assert_eq!(reason, GiveUpReason::CircuitOpen);
            assert!(circuit_opened);
            assert_eq!(attempts, 3);
        }
        other => panic!("expected give up, got {other:?}"),
    }
    // Entry persists with the circuit open; further failures refuse quietly
    assert!(retry.entry(&fp("c")).unwrap().circuit_open);
    match retry.on_failure(&fp("c"), ErrorClass::Transient, None, 0) {
        RetryDecision::GiveUp {
            circuit_opened, ..
        } => assert!(!circuit_opened),
        other => panic!("expected give up, got {other:?}"),
    }
}

#[test]
fn attempts_never_exceed_absolute_max() {
    let mut retry = RetryController::new(config(1, 10, 0.0, 5));
    let mut scheduled = 0;
    for _ in 0..20 {
        if let RetryDecision::Retry { .. } =
            retry.on_failure(&fp("m"), ErrorClass::Transient, None, 0)
        {
            scheduled += 1;
        }
    }
    assert_eq!(scheduled, 5);
}

#[test]
fn success_and_cancel_prune_the_ledger() {
    let mut retry = RetryController::new(config(1, 10, 0.0, 10));
    retry.on_failure(&fp("a"), ErrorClass::Transient, None, 0);
    retry.on_success(&fp("a"));
    assert!(retry.is_empty());

    retry.on_failure(&fp("b"), ErrorClass::Transient, None, 0);
    assert!(!retry.on_cancel(&fp("b")));
    assert!(retry.is_empty());
}

#[test]
fn cancel_reports_closed_circuit() {
    let mut retry = RetryController::new(config(1, 10, 0.0, 1));
    retry.on_failure(&fp("c"), ErrorClass::Transient, None, 0);
    retry.on_failure(&fp("c"), ErrorClass::Transient, None, 0); // opens
    assert!(retry.on_cancel(&fp("c")));
}

#[test]
fn ttl_sweep_closes_expired_circuits() {
    let mut retry = RetryController::new(RetryConfig {
        base_ms: 1,
        cap_ms: 10,
        jitter: 0.0,
        absolute_max: 1,
        ledger_ttl_ms: 1_000,
        ..RetryConfig::default()
    });

    retry.on_failure(&fp("x"), ErrorClass::Transient, None, 0);
    retry.on_failure(&fp("x"), ErrorClass::Transient, None, 500); // opens circuit
    retry.on_failure(&fp("y"), ErrorClass::Transient, None, 800);

    // Nothing expired yet
    assert!(retry.prune_expired(1_000).is_empty());
    assert_eq!(retry.len(), 2);

    // x expires (last activity 500); its open circuit is reported
    let closed = retry.prune_expired(1_600);
    assert_eq!(closed, vec![fp("x")]);
    assert_eq!(retry.len(), 1);
}
