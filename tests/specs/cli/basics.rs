//! General CLI behavior: help, error handling, output formats.

use crate::prelude::*;

#[test]
fn no_args_prints_usage_to_stderr() {
    cli().fails().stderr_has("Usage");
}

#[test]
fn help_flag_lists_subcommands() {
    cli()
        .args(&["--help"])
        .passes()
        .stdout_has("job")
        .stdout_has("subscriber")
        .stdout_has("daemon");
}

#[test]
fn unknown_subcommand_fails() {
    cli().args(&["bogus"]).fails();
}

#[test]
fn job_without_subcommand_fails() {
    let project = Project::empty();
    project.scanctl().args(&["job"]).fails();
}

#[test]
fn job_status_requires_id_argument() {
    let project = Project::empty();
    project.scanctl().args(&["job", "status"]).fails();
}

#[test]
fn query_commands_fail_cleanly_when_daemon_not_running() {
    let project = Project::empty();
    // List/Status never auto-start the daemon, unlike action commands.
    project
        .scanctl()
        .args(&["job", "list"])
        .fails()
        .stderr_has("daemon not running");
}

#[test]
fn action_commands_auto_start_the_daemon() {
    let project = Project::empty();
    project
        .scanctl()
        .args(&["job", "create", "job-1", "--type", "flood"])
        .passes();

    project
        .scanctl()
        .args(&["job", "list"])
        .passes()
        .stdout_has("job-1");
}

#[test]
fn json_output_flag_is_accepted_before_and_after_subcommand() {
    let project = Project::empty();
    project
        .scanctl()
        .args(&["-o", "json", "subscriber", "list"])
        .passes()
        .stdout_has("[");
}
