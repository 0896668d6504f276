// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use std::str::FromStr;

#[test]
fn round_trips_through_display_and_from_str() {
    for rt in ReportType::ALL {
        let s = rt.to_string();
        assert_eq!(&ReportType::from_str(&s).unwrap(), rt);
    }
}

#[test]
fn from_str_is_case_insensitive() {
    assert_eq!(ReportType::from_str("ACOUSTIC").unwrap(), ReportType::Acoustic);
    assert_eq!(ReportType::from_str("Heritage").unwrap(), ReportType::Heritage);
}

#[test]
fn from_str_rejects_unknown() {
    assert!(ReportType::from_str("bogus").is_err());
}

#[test]
fn serde_uses_snake_case() {
    let json = serde_json::to_string(&ReportType::Arboricultural).unwrap();
    assert_eq!(json, "\"arboricultural\"");
}
