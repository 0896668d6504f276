// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use chrono::Utc;
use scanctl_core::ScanJobId;
use std::collections::HashSet;

fn record(project_id: &str, fi_type: ReportType) -> MatchRecord {
    MatchRecord {
        job_id: ScanJobId::new("job-1"),
        object_key: format!("{project_id}/request.pdf"),
        project_id: project_id.to_string(),
        file_name: "request.pdf".to_string(),
        fi_type,
        validation_quote: "submit an acoustic assessment".to_string(),
        confidence: 0.9,
        extracted_at: Utc::now(),
    }
}

fn metadata(county: &str, sector: &str) -> ProjectMetadata {
    ProjectMetadata {
        planning_id: "P-1".to_string(),
        planning_title: "Example Development".to_string(),
        planning_stage: "Pending".to_string(),
        planning_county: county.to_string(),
        planning_sector: sector.to_string(),
        planning_region: "South".to_string(),
        bii_url: "https://example.com/p-1".to_string(),
    }
}

fn subscriber(id: &str, types: &[ReportType]) -> Subscriber {
    Subscriber {
        id: SubscriberId::new(id),
        email: format!("{id}@example.com"),
        name: id.to_string(),
        subscribed_types: types.iter().copied().collect(),
        filters: SubscriberFilters::default(),
        active: true,
        last_email_ts: None,
        email_count: 0,
    }
}

#[test]
fn unfiltered_subscriber_receives_any_subscribed_type() {
    let matches = vec![record("proj-1", ReportType::Acoustic)];
    let subs = vec![subscriber("sub-1", &[ReportType::Acoustic])];

    let grouped = group_by_subscriber(&matches, &subs, |_| Some(metadata("Kent", "Retail")));

    let sub_id = SubscriberId::new("sub-1");
    assert_eq!(grouped.get(&sub_id).map(Vec::len), Some(1));
}

#[test]
fn subscriber_not_subscribed_to_type_is_excluded() {
    let matches = vec![record("proj-1", ReportType::Acoustic)];
    let subs = vec![subscriber("sub-1", &[ReportType::Flood])];

    let grouped = group_by_subscriber(&matches, &subs, |_| Some(metadata("Kent", "Retail")));

    assert!(grouped.is_empty());
}

#[test]
fn inactive_subscriber_is_excluded() {
    let matches = vec![record("proj-1", ReportType::Acoustic)];
    let mut sub = subscriber("sub-1", &[ReportType::Acoustic]);
    sub.active = false;
    let grouped = group_by_subscriber(&matches, &[sub], |_| Some(metadata("Kent", "Retail")));

    assert!(grouped.is_empty());
}

#[test]
fn region_filter_includes_matching_county_case_insensitively() {
    let matches = vec![record("proj-1", ReportType::Acoustic)];
    let mut sub = subscriber("sub-1", &[ReportType::Acoustic]);
    sub.filters.allowed_regions = HashSet::from(["kent".to_string()]);

    let grouped = group_by_subscriber(&matches, &[sub], |_| Some(metadata("Kent", "Retail")));

    let sub_id = SubscriberId::new("sub-1");
    assert_eq!(grouped.get(&sub_id).map(Vec::len), Some(1));
}

#[test]
fn region_filter_excludes_non_matching_county() {
    let matches = vec![record("proj-1", ReportType::Acoustic)];
    let mut sub = subscriber("sub-1", &[ReportType::Acoustic]);
    sub.filters.allowed_regions = HashSet::from(["surrey".to_string()]);

    let grouped = group_by_subscriber(&matches, &[sub], |_| Some(metadata("Kent", "Retail")));

    assert!(grouped.is_empty());
}

#[test]
fn both_region_and_sector_filters_must_pass() {
    let matches = vec![record("proj-1", ReportType::Acoustic)];
    let mut sub = subscriber("sub-1", &[ReportType::Acoustic]);
    sub.filters.allowed_regions = HashSet::from(["kent".to_string()]);
    sub.filters.allowed_sectors = HashSet::from(["industrial".to_string()]);

    let grouped = group_by_subscriber(&matches, &[sub], |_| Some(metadata("Kent", "Retail")));

    assert!(grouped.is_empty(), "sector mismatch should exclude");
}

#[test]
fn missing_metadata_with_active_filter_fails_closed() {
    let matches = vec![record("proj-1", ReportType::Acoustic)];
    let mut sub = subscriber("sub-1", &[ReportType::Acoustic]);
    sub.filters.allowed_regions = HashSet::from(["kent".to_string()]);

    let grouped = group_by_subscriber(&matches, &[sub], |_| None);

    assert!(grouped.is_empty());
}

#[test]
fn missing_metadata_with_no_filter_still_passes() {
    let matches = vec![record("proj-1", ReportType::Acoustic)];
    let sub = subscriber("sub-1", &[ReportType::Acoustic]);

    let grouped = group_by_subscriber(&matches, &[sub], |_| None);

    let sub_id = SubscriberId::new("sub-1");
    let enriched = grouped.get(&sub_id).expect("subscriber should be included");
    assert_eq!(enriched.len(), 1);
    assert!(enriched[0].metadata.is_none());
}

#[test]
fn metadata_lookup_is_cached_per_project() {
    let matches = vec![
        record("proj-1", ReportType::Acoustic),
        record("proj-1", ReportType::Acoustic),
    ];
    let sub = subscriber("sub-1", &[ReportType::Acoustic]);

    let lookups = std::cell::RefCell::new(0);
    let grouped = group_by_subscriber(&matches, &[sub], |_| {
        *lookups.borrow_mut() += 1;
        Some(metadata("Kent", "Retail"))
    });

    assert_eq!(*lookups.borrow(), 1);
    let sub_id = SubscriberId::new("sub-1");
    assert_eq!(grouped.get(&sub_id).map(Vec::len), Some(2));
}

#[test]
fn empty_surviving_set_omits_subscriber_entirely() {
    let matches = vec![record("proj-1", ReportType::Flood)];
    let sub = subscriber("sub-1", &[ReportType::Acoustic]);

    let grouped = group_by_subscriber(&matches, &[sub], |_| Some(metadata("Kent", "Retail")));

    assert!(grouped.is_empty());
}
