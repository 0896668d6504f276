// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! A confirmed classifier match, before it is grouped by subscriber (§3.1).

use crate::report_type::ReportType;
use crate::scan_job::ScanJobId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One document that passed the full classifier cascade (§4.4 stage 5) and
/// post-validation (§3.2).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchRecord {
    pub job_id: ScanJobId,
    pub object_key: String,
    pub project_id: String,
    pub file_name: String,
    pub fi_type: ReportType,
    pub validation_quote: String,
    pub confidence: f64,
    pub extracted_at: DateTime<Utc>,
}

#[cfg(test)]
#[path = "match_record_tests.rs"]
mod tests;
