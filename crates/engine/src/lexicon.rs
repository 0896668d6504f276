// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-report-type keyword lexicon used to post-validate LLM-returned
//! quotes (§4.4). A quote that does not contain one of its type's keywords
//! is treated as a hallucination and the match is dropped, never surfaced
//! as a run-level error.

use scanctl_core::ReportType;

const ACOUSTIC: &[&str] = &["acoustic", "noise", "sound", "vibration", "decibel", "db(a)"];
const TRANSPORT: &[&str] = &["transport", "traffic", "parking", "travel", "highway", "vehicular"];
const ECOLOGICAL: &[&str] = &["ecological", "ecology", "biodiversity", "habitat", "species", "wildlife"];
const FLOOD: &[&str] = &["flood", "drainage", "suds", "hydrology", "surface water", "foul water"];
const HERITAGE: &[&str] = &["heritage", "archaeological", "historic", "conservation", "listed building"];
const LIGHTING: &[&str] = &["lighting", "light pollution", "illumination", "luminance"];

/// The fixed keyword set for a report type, or `None` for types with no
/// declared lexicon (§4.4 lists six; `Contamination`, `Arboricultural`, and
/// `Other` fall back to "no post-validation constraint").
fn keywords_for(report_type: ReportType) -> Option<&'static [&'static str]> {
    match report_type {
        ReportType::Acoustic => Some(ACOUSTIC),
        ReportType::Transport => Some(TRANSPORT),
        ReportType::Ecological | ReportType::Ecology => Some(ECOLOGICAL),
        ReportType::Flood => Some(FLOOD),
        ReportType::Heritage => Some(HERITAGE),
        ReportType::Lighting => Some(LIGHTING),
        ReportType::Contamination | ReportType::Arboricultural | ReportType::Other => None,
    }
}

/// Whether `quote`, lower-cased, contains at least one lexicon token for
/// `report_type`. Types with no declared lexicon always pass (there is no
/// fixed vocabulary in §4.4 to validate against).
pub fn validate_quote(quote: &str, report_type: ReportType) -> bool {
    let Some(keywords) = keywords_for(report_type) else {
        return true;
    };
    let lowered = quote.to_lowercase();
    keywords.iter().any(|k| lowered.contains(k))
}

#[cfg(test)]
#[path = "lexicon_tests.rs"]
mod tests;
