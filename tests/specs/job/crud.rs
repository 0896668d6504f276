//! Scan job creation, control, and querying (§6 job-control surface).

use crate::prelude::*;

#[test]
fn create_then_list_shows_the_job() {
    let project = Project::empty();

    project
        .scanctl()
        .args(&["job", "create", "job-1", "--type", "flood"])
        .passes()
        .stdout_has("Created job job-1");

    project
        .scanctl()
        .args(&["job", "list"])
        .passes()
        .stdout_has("job-1")
        .stdout_has("flood");
}

#[test]
fn create_rejects_unknown_report_type() {
    let project = Project::empty();
    project
        .scanctl()
        .args(&["job", "create", "job-1", "--type", "bogus"])
        .fails();
}

#[test]
fn create_then_status_shows_full_detail() {
    let project = Project::empty();
    project
        .scanctl()
        .args([
            "job",
            "create",
            "job-1",
            "--type",
            "acoustic",
            "--confidence-threshold",
            "0.9",
            "--customer",
            "sub-1",
        ])
        .passes();

    project
        .scanctl()
        .args(&["job", "status", "job-1"])
        .passes()
        .stdout_has("acoustic")
        .stdout_has("0.9")
        .stdout_has("sub-1");
}

#[test]
fn status_reports_not_found_for_unknown_job() {
    let project = Project::empty();
    project.scanctl().args(&["daemon", "start"]).passes();
    assert!(wait_for(SPEC_WAIT_MAX_MS, || {
        project
            .scanctl()
            .args(&["daemon", "status"])
            .command()
            .output()
            .map(|o| String::from_utf8_lossy(&o.stdout).contains("running"))
            .unwrap_or(false)
    }));

    project
        .scanctl()
        .args(&["job", "status", "missing"])
        .passes()
        .stdout_has("Job not found");
}

#[test]
fn start_stop_cancel_round_trip() {
    let project = Project::empty();
    project
        .scanctl()
        .args(&["job", "create", "job-1", "--type", "ecology", "--paused"])
        .passes();

    project
        .scanctl()
        .args(&["job", "start", "job-1"])
        .passes()
        .stdout_has("Started job job-1");

    project
        .scanctl()
        .args(&["job", "stop", "job-1"])
        .passes()
        .stdout_has("Stopped job job-1");

    project
        .scanctl()
        .args(&["job", "cancel", "job-1"])
        .passes()
        .stdout_has("Cancelling job job-1");
}

#[test]
fn run_now_accepts_optional_target_date() {
    let project = Project::empty();
    project
        .scanctl()
        .args(&["job", "create", "job-1", "--type", "heritage"])
        .passes();

    project
        .scanctl()
        .args(&["job", "run-now", "job-1", "--target-date", "2026-01-15"])
        .passes()
        .stdout_has("Triggered run for job job-1");
}

#[test]
fn run_now_rejects_malformed_date() {
    let project = Project::empty();
    project
        .scanctl()
        .args(&["job", "create", "job-1", "--type", "heritage"])
        .passes();

    project
        .scanctl()
        .args(&["job", "run-now", "job-1", "--target-date", "not-a-date"])
        .fails();
}

#[test]
fn set_target_date_then_clear() {
    let project = Project::empty();
    project
        .scanctl()
        .args(&["job", "create", "job-1", "--type", "lighting"])
        .passes();

    project
        .scanctl()
        .args(&["job", "set-target-date", "job-1", "--date", "2026-02-01"])
        .passes()
        .stdout_has("Set target date");

    project
        .scanctl()
        .args(&["job", "set-target-date", "job-1", "--clear"])
        .passes()
        .stdout_has("Cleared target date");
}

#[test]
fn delete_removes_job_from_list() {
    let project = Project::empty();
    project
        .scanctl()
        .args(&["job", "create", "job-1", "--type", "contamination"])
        .passes();

    project
        .scanctl()
        .args(&["job", "delete", "job-1"])
        .passes()
        .stdout_has("Deleted job job-1");

    project
        .scanctl()
        .args(&["job", "list"])
        .passes()
        .stdout_has("No jobs");
}

#[test]
fn list_filters_by_status() {
    let project = Project::empty();
    project
        .scanctl()
        .args(&["job", "create", "active-job", "--type", "transport"])
        .passes();
    project
        .scanctl()
        .args(&["job", "create", "paused-job", "--type", "transport", "--paused"])
        .passes();

    project
        .scanctl()
        .args(&["job", "list", "--status", "paused"])
        .passes()
        .stdout_has("paused-job")
        .stdout_lacks("active-job");
}

#[test]
fn create_accepts_repeated_customer_flags() {
    let project = Project::empty();
    project
        .scanctl()
        .args([
            "job",
            "create",
            "job-1",
            "--type",
            "arboricultural",
            "--customer",
            "sub-a",
            "--customer",
            "sub-b",
        ])
        .passes();

    project
        .scanctl()
        .args(&["job", "status", "job-1"])
        .passes()
        .stdout_has("sub-a")
        .stdout_has("sub-b");
}
