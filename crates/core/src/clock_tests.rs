// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use chrono::TimeZone;

#[test]
fn system_clock_epoch_ms_is_plausible() {
    let clock = SystemClock;
    let now = clock.epoch_ms();
    // Some time after 2024-01-01 in ms.
    assert!(now > 1_700_000_000_000);
}

#[test]
fn fake_clock_pins_time() {
    let clock = FakeClock::new(1_000);
    assert_eq!(clock.epoch_ms(), 1_000);
    assert_eq!(clock.epoch_ms(), 1_000);
}

#[test]
fn fake_clock_advance_ms() {
    let clock = FakeClock::new(1_000);
    clock.advance_ms(500);
    assert_eq!(clock.epoch_ms(), 1_500);
}

#[test]
fn fake_clock_set_epoch_ms() {
    let clock = FakeClock::new(0);
    clock.set_epoch_ms(42_000);
    assert_eq!(clock.epoch_ms(), 42_000);
}

#[test]
fn fake_clock_shared_across_clones() {
    let clock = FakeClock::new(0);
    let clone = clock.clone();
    clock.advance_ms(10);
    assert_eq!(clone.epoch_ms(), 10);
}

#[test]
fn fake_clock_at_utc() {
    let dt = Utc.with_ymd_and_hms(2026, 1, 15, 12, 0, 0).unwrap();
    let clock = FakeClock::at(dt);
    assert_eq!(clock.now_utc(), dt);
}

#[test]
fn now_utc_derives_from_epoch_ms() {
    let clock = FakeClock::new(0);
    assert_eq!(clock.now_utc().timestamp_millis(), 0);
}
