// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Subscriber entities and their region/sector match filters.

use crate::report_type::ReportType;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

crate::define_id! {
    /// Unique identifier for a subscriber.
    pub struct SubscriberId;
}

/// A subscriber's region/sector allow-list. An empty set means "no
/// restriction" (everything passes); fail-closed behavior on missing
/// metadata is applied by the subscriber matcher, not this type.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SubscriberFilters {
    #[serde(default)]
    pub allowed_regions: HashSet<String>,
    #[serde(default)]
    pub allowed_sectors: HashSet<String>,
}

impl SubscriberFilters {
    pub fn has_any_filter(&self) -> bool {
        !self.allowed_regions.is_empty() || !self.allowed_sectors.is_empty()
    }
}

/// An email subscriber to scan job matches.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Subscriber {
    pub id: SubscriberId,
    pub email: String,
    pub name: String,
    pub subscribed_types: HashSet<ReportType>,
    #[serde(default)]
    pub filters: SubscriberFilters,
    #[serde(default = "default_active")]
    pub active: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_email_ts: Option<i64>,
    #[serde(default)]
    pub email_count: u64,
}

fn default_active() -> bool {
    true
}

impl Subscriber {
    pub fn is_subscribed_to(&self, report_type: ReportType) -> bool {
        self.subscribed_types.contains(&report_type)
    }
}

#[cfg(test)]
#[path = "subscriber_tests.rs"]
mod tests;
