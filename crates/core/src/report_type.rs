// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The closed set of technical report types the classifier detects.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A technical report type a Further-Information request may ask for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportType {
    Acoustic,
    Transport,
    Flood,
    Contamination,
    Ecology,
    Arboricultural,
    Ecological,
    Heritage,
    Lighting,
    Other,
}

impl ReportType {
    /// All variants, in declaration order.
    pub const ALL: &'static [ReportType] = &[
        ReportType::Acoustic,
        ReportType::Transport,
        ReportType::Flood,
        ReportType::Contamination,
        ReportType::Ecology,
        ReportType::Arboricultural,
        ReportType::Ecological,
        ReportType::Heritage,
        ReportType::Lighting,
        ReportType::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ReportType::Acoustic => "acoustic",
            ReportType::Transport => "transport",
            ReportType::Flood => "flood",
            ReportType::Contamination => "contamination",
            ReportType::Ecology => "ecology",
            ReportType::Arboricultural => "arboricultural",
            ReportType::Ecological => "ecological",
            ReportType::Heritage => "heritage",
            ReportType::Lighting => "lighting",
            ReportType::Other => "other",
        }
    }
}

impl fmt::Display for ReportType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for ReportType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "acoustic" => Ok(ReportType::Acoustic),
            "transport" => Ok(ReportType::Transport),
            "flood" => Ok(ReportType::Flood),
            "contamination" => Ok(ReportType::Contamination),
            "ecology" => Ok(ReportType::Ecology),
            "arboricultural" => Ok(ReportType::Arboricultural),
            "ecological" => Ok(ReportType::Ecological),
            "heritage" => Ok(ReportType::Heritage),
            "lighting" => Ok(ReportType::Lighting),
            "other" => Ok(ReportType::Other),
            other => Err(format!("unknown report type: {other}")),
        }
    }
}

#[cfg(test)]
#[path = "report_type_tests.rs"]
mod tests;
