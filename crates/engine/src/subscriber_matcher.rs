// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Groups confirmed matches by subscriber and applies the fail-closed
//! region/sector filter (C5, §4.5).

use std::collections::HashMap;

use scanctl_core::{MatchRecord, ProjectMetadata, Subscriber, SubscriberId};

/// One match enriched with the project metadata used to filter and
/// notify, grouped per subscriber. `metadata` is `None` only when the
/// planning-metadata service had nothing for this project and the
/// subscriber passed through with no active filter to fail closed on.
#[derive(Debug, Clone, PartialEq)]
pub struct EnrichedMatch {
    pub record: MatchRecord,
    pub metadata: Option<ProjectMetadata>,
}

/// Whether a subscriber's filter admits a project, given metadata that may
/// be missing (§4.5's fail-closed rule).
pub fn passes_filter(subscriber: &Subscriber, metadata: Option<&ProjectMetadata>) -> bool {
    let filters = &subscriber.filters;
    if !filters.has_any_filter() {
        return true;
    }
    let Some(metadata) = metadata else {
        // Fail-closed: any active filter with unresolvable metadata excludes
        // the match rather than letting it through unchecked.
        return false;
    };

    let region_ok = filters.allowed_regions.is_empty()
        || filters
            .allowed_regions
            .iter()
            .any(|r| metadata.county_matches(r));
    let sector_ok = filters.allowed_sectors.is_empty()
        || filters
            .allowed_sectors
            .iter()
            .any(|s| metadata.sector_matches(s));

    region_ok && sector_ok
}

/// Group `matches` by subscriber, applying each subscriber's filter against
/// the project metadata resolved via `lookup_metadata`. Subscribers whose
/// surviving set is empty are omitted from the result (§4.5: "not
/// contacted").
pub fn group_by_subscriber<F>(
    matches: &[MatchRecord],
    subscribers: &[Subscriber],
    mut lookup_metadata: F,
) -> HashMap<SubscriberId, Vec<EnrichedMatch>>
where
    F: FnMut(&str) -> Option<ProjectMetadata>,
{
    let mut metadata_cache: HashMap<String, Option<ProjectMetadata>> = HashMap::new();
    let mut grouped: HashMap<SubscriberId, Vec<EnrichedMatch>> = HashMap::new();

    for record in matches {
        let metadata = metadata_cache
            .entry(record.project_id.clone())
            .or_insert_with(|| lookup_metadata(&record.project_id))
            .clone();

        for subscriber in subscribers {
            if !subscriber.active || !subscriber.is_subscribed_to(record.fi_type) {
                continue;
            }
            if !passes_filter(subscriber, metadata.as_ref()) {
                continue;
            }
            grouped
                .entry(subscriber.id.clone())
                .or_default()
                .push(EnrichedMatch {
                    record: record.clone(),
                    metadata: metadata.clone(),
                });
        }
    }

    grouped.retain(|_, v| !v.is_empty());
    grouped
}

#[cfg(test)]
#[path = "subscriber_matcher_tests.rs"]
mod tests;
