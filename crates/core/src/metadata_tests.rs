// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

fn sample() -> ProjectMetadata {
    ProjectMetadata {
        planning_id: "P123".into(),
        planning_title: "Example Development".into(),
        planning_stage: "decision".into(),
        planning_county: "  Dublin ".into(),
        planning_sector: "Residential".into(),
        planning_region: "Leinster".into(),
        bii_url: "https://example.test/p123".into(),
    }
}

#[test]
fn county_matches_is_case_insensitive_and_trims() {
    let m = sample();
    assert!(m.county_matches("dublin"));
    assert!(m.county_matches("Dublin"));
    assert!(!m.county_matches("Cork"));
}

#[test]
fn sector_matches_is_case_insensitive() {
    let m = sample();
    assert!(m.sector_matches("residential"));
    assert!(!m.sector_matches("commercial"));
}
