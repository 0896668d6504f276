//! Daemon process lifecycle: start, stop, status, restart.

use crate::prelude::*;

#[test]
fn status_reports_not_running_before_any_command() {
    let project = Project::empty();
    project
        .scanctl()
        .args(&["daemon", "status"])
        .passes()
        .stdout_has("not running");
}

#[test]
fn status_reports_running_after_auto_start() {
    let project = Project::empty();

    // Any action command auto-starts the daemon.
    project.scanctl().args(&["subscriber", "list"]).passes();

    assert!(wait_for(SPEC_WAIT_MAX_MS, || {
        project
            .scanctl()
            .args(&["daemon", "status"])
            .command()
            .output()
            .map(|o| String::from_utf8_lossy(&o.stdout).contains("status: running"))
            .unwrap_or(false)
    }));
}

#[test]
fn stop_is_a_no_op_when_not_running() {
    let project = Project::empty();
    project
        .scanctl()
        .args(&["daemon", "stop"])
        .passes()
        .stdout_has("not running");
}

#[test]
fn start_then_stop_round_trips() {
    let project = Project::empty();

    project
        .scanctl()
        .args(&["daemon", "start"])
        .passes()
        .stdout_has("started");

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
        .args(&["daemon", "stop"])
        .passes()
        .stdout_has("stopped");

    project
        .scanctl()
        .args(&["daemon", "status"])
        .passes()
        .stdout_has("not running");
}

#[test]
fn version_flag_reports_not_running_before_start() {
    let project = Project::empty();
    project
        .scanctl()
        .args(&["daemon", "--version"])
        .passes()
        .stdout_has("not running");
}

#[test]
fn version_flag_reports_version_once_started() {
    let project = Project::empty();
    project.scanctl().args(&["daemon", "start"]).passes();

    assert!(wait_for(SPEC_WAIT_MAX_MS, || {
        project
            .scanctl()
            .args(&["daemon", "--version"])
            .command()
            .output()
            .map(|o| String::from_utf8_lossy(&o.stdout).contains("scanctld"))
            .unwrap_or(false)
    }));
}

#[test]
fn restart_brings_daemon_back_up() {
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
        .args(&["daemon", "restart"])
        .passes()
        .stdout_has("restarted");

    assert!(wait_for(SPEC_WAIT_MAX_MS, || {
        project
            .scanctl()
            .args(&["daemon", "status"])
            .command()
            .output()
            .map(|o| String::from_utf8_lossy(&o.stdout).contains("running"))
            .unwrap_or(false)
    }));
}

#[test]
fn status_json_has_queue_and_job_counts() {
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
        .args(&["-o", "json", "daemon", "status"])
        .passes()
        .stdout_has("jobs_total")
        .stdout_has("queue_waiting");
}

#[test]
fn logs_reports_missing_file_before_any_start() {
    let project = Project::empty();
    project
        .scanctl()
        .args(&["daemon", "logs"])
        .passes()
        .stdout_has("no log file found");
}
