// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Planning project metadata, fetched lazily from the planning-metadata
//! service per project id.

use serde::{Deserialize, Serialize};

/// Metadata about a planning project, used by the subscriber matcher to
/// apply region/sector filters and to enrich match notifications.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectMetadata {
    pub planning_id: String,
    pub planning_title: String,
    pub planning_stage: String,
    pub planning_county: String,
    pub planning_sector: String,
    pub planning_region: String,
    pub bii_url: String,
}

impl ProjectMetadata {
    /// Case-insensitive, trimmed comparison used by the subscriber filter.
    pub fn county_matches(&self, region: &str) -> bool {
        self.planning_county.trim().eq_ignore_ascii_case(region.trim())
    }

    /// Case-insensitive, trimmed comparison used by the subscriber filter.
    pub fn sector_matches(&self, sector: &str) -> bool {
        self.planning_sector.trim().eq_ignore_ascii_case(sector.trim())
    }
}

#[cfg(test)]
#[path = "metadata_tests.rs"]
mod tests;
