// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn system_clock_advances() {
    let clock = SystemClock;
    let a = clock.now();
    let b = clock.now();
    assert!(b >= a);
    assert!(clock.epoch_ms() > 0);
}

#[test]
fn fake_clock_is_controllable() {
    let clock = FakeClock::at(5_000);
    assert_eq!(clock.epoch_ms(), 5_000);

    let before = clock.now();
    clock.advance(Duration::from_secs(3));
    assert_eq!(clock.epoch_ms(), 8_000);
    assert_eq!(clock.now() - before, Duration::from_secs(3));
}

#[test]
fn fake_clock_clones_share_time() {
    let clock = FakeClock::new();
    let other = clock.clone();
    clock.advance(Duration::from_millis(250));
    assert_eq!(other.epoch_ms(), clock.epoch_ms());
}
