// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use serde::Serialize;

use super::{print_prune_results, OutputFormat};

#[derive(Debug, Clone, Serialize)]
struct FakeEntry {
    name: String,
    detail: String,
}

#[test]
fn print_prune_results_json_includes_all_fields() {
    let entries = vec![
        FakeEntry {
            name: "a".into(),
            detail: "d1".into(),
        },
        FakeEntry {
            name: "b".into(),
            detail: "d2".into(),
        },
    ];

    // JSON path should not panic and should produce valid JSON
    let result = print_prune_results(
        true,
        &entries,
        3,
        "widget",
        "skipped",
        OutputFormat::Json,
        |e| format!("{} ({})", e.name, e.detail),
    );
    assert!(result.is_ok());
}

#[test]
fn print_prune_results_text_dry_run() {
    let entries = vec![FakeEntry {
        name: "x".into(),
        detail: "y".into(),
    }];

    let result = print_prune_results(
        true,
        &entries,
        1,
        "thing",
        "skipped",
        OutputFormat::Text,
        |e| format!("thing '{}'", e.name),
    );
    assert!(result.is_ok());
}

#[test]
fn print_prune_results_text_real_run() {
    let entries: Vec<FakeEntry> = vec![];

    let result = print_prune_results(
        false,
        &entries,
        5,
        "item",
        "active item(s) skipped",
        OutputFormat::Text,
        |e| e.name.clone(),
    );
    assert!(result.is_ok());
}
