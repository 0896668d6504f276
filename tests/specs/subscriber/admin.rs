//! Subscriber administration: upsert, deactivate, list.

use crate::prelude::*;

#[test]
fn upsert_then_list_shows_the_subscriber() {
    let project = Project::empty();

    project
        .scanctl()
        .args([
            "subscriber",
            "upsert",
            "sub-1",
            "--email",
            "alice@example.com",
            "--name",
            "Alice",
            "--type",
            "flood",
        ])
        .passes()
        .stdout_has("Upserted subscriber sub-1");

    project
        .scanctl()
        .args(&["subscriber", "list"])
        .passes()
        .stdout_has("sub-1")
        .stdout_has("alice@example.com")
        .stdout_has("flood");
}

#[test]
fn upsert_twice_updates_in_place() {
    let project = Project::empty();

    project
        .scanctl()
        .args([
            "subscriber",
            "upsert",
            "sub-1",
            "--email",
            "old@example.com",
            "--name",
            "Old Name",
        ])
        .passes();

    project
        .scanctl()
        .args([
            "subscriber",
            "upsert",
            "sub-1",
            "--email",
            "new@example.com",
            "--name",
            "New Name",
        ])
        .passes();

    let result = project.scanctl().args(&["-o", "json", "subscriber", "list"]).passes();
    let stdout = result.stdout();
    let parsed: serde_json::Value = serde_json::from_str(&stdout).expect("valid json");
    let subscribers = parsed.as_array().expect("array");
    assert_eq!(subscribers.len(), 1);
    assert_eq!(subscribers[0]["email"], "new@example.com");
}

#[test]
fn deactivate_marks_subscriber_inactive() {
    let project = Project::empty();
    project
        .scanctl()
        .args([
            "subscriber",
            "upsert",
            "sub-1",
            "--email",
            "a@example.com",
            "--name",
            "Alice",
        ])
        .passes();

    project
        .scanctl()
        .args(&["subscriber", "deactivate", "sub-1"])
        .passes()
        .stdout_has("Deactivated subscriber sub-1");

    project
        .scanctl()
        .args(&["subscriber", "list"])
        .passes()
        .stdout_has("stopped");
}

#[test]
fn list_is_empty_by_default() {
    let project = Project::empty();
    project
        .scanctl()
        .args(&["subscriber", "list"])
        .passes()
        .stdout_has("No subscribers");
}

#[test]
fn upsert_without_email_fails_to_parse() {
    let project = Project::empty();
    project
        .scanctl()
        .args(&["subscriber", "upsert", "sub-1", "--name", "Alice"])
        .fails();
}

#[test]
fn upsert_accepts_region_and_sector_filters() {
    let project = Project::empty();
    project
        .scanctl()
        .args([
            "subscriber",
            "upsert",
            "sub-1",
            "--email",
            "a@example.com",
            "--name",
            "Alice",
            "--region",
            "north",
            "--sector",
            "residential",
        ])
        .passes()
        .stdout_has("Upserted subscriber sub-1");
}
