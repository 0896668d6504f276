// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Tests for daemon client behavior.

use super::{ClientError, DaemonClient};
use crate::client_lifecycle::log_connection_error;
use crate::daemon_process::{cleanup_stale_socket, daemon_dir, probe_socket};
use serial_test::serial;
use std::fs;
use tempfile::tempdir;

/// Verify that connect() does not delete state files when the daemon is not
/// running.
///
/// Regression test for a race condition where connect() would clean up
/// stale files during startup polling, deleting the pid file before the
/// daemon finished initializing.
#[test]
#[serial]
fn connect_does_not_delete_pid_file() {
    let state_dir = tempdir().unwrap();
    std::env::set_var("XDG_STATE_HOME", state_dir.path());

    let dir = daemon_dir().unwrap();
    fs::create_dir_all(&dir).unwrap();
    let pid_path = dir.join("daemon.pid");
    fs::write(&pid_path, "12345\n").unwrap();

    let result = DaemonClient::connect();
    assert!(matches!(result, Err(ClientError::DaemonNotRunning)));

    assert!(pid_path.exists(), "connect() must not delete pid file");
    std::env::remove_var("XDG_STATE_HOME");
}

/// Verify log_connection_error creates cli.log with expected format.
#[test]
#[serial]
fn log_connection_error_creates_log_file() {
    let state_dir = tempdir().unwrap();
    std::env::set_var("SCANCTL_STATE_DIR", state_dir.path());

    let error = ClientError::DaemonNotRunning;
    log_connection_error(&error);

    let log_path = state_dir.path().join("cli.log");
    assert!(log_path.exists(), "cli.log should be created");

    let content = fs::read_to_string(&log_path).unwrap();
    assert!(content.contains("pid="), "log should contain pid");
    assert!(content.contains("cwd="), "log should contain cwd");
    assert!(
        content.contains("SCANCTL_STATE_DIR="),
        "log should contain SCANCTL_STATE_DIR"
    );
    assert!(
        content.contains("socket="),
        "log should contain socket path"
    );
    assert!(
        content.contains("daemon not running"),
        "log should contain error message"
    );
    std::env::remove_var("SCANCTL_STATE_DIR");
}

/// Verify log_connection_error includes the socket path in its output.
#[test]
#[serial]
fn log_connection_error_includes_socket_path() {
    let state_dir = tempdir().unwrap();
    std::env::set_var("SCANCTL_STATE_DIR", state_dir.path());

    let error = ClientError::DaemonNotRunning;
    log_connection_error(&error);

    let log_path = state_dir.path().join("cli.log");
    let content = fs::read_to_string(&log_path).unwrap();

    let expected_socket = state_dir.path().join("daemon.sock");
    assert!(
        content.contains(&expected_socket.display().to_string()),
        "log should contain expected socket path"
    );
    std::env::remove_var("SCANCTL_STATE_DIR");
}

/// Verify stale socket and PID files are cleaned up when the daemon process
/// is dead (simulates a crashed daemon).
#[test]
#[serial]
fn test_stale_socket_cleanup() {
    let state_dir = tempdir().unwrap();
    std::env::set_var("SCANCTL_STATE_DIR", state_dir.path());

    let socket_path = state_dir.path().join("daemon.sock");
    fs::write(&socket_path, "").unwrap();

    let mut child = std::process::Command::new("true").spawn().unwrap();
    let dead_pid = child.id();
    child.wait().unwrap();

    let pid_path = state_dir.path().join("daemon.pid");
    fs::write(&pid_path, format!("{dead_pid}\n")).unwrap();

    assert!(!probe_socket(&socket_path));

    cleanup_stale_socket().unwrap();

    assert!(!socket_path.exists(), "stale socket should be removed");
    assert!(!pid_path.exists(), "stale PID file should be removed");
    std::env::remove_var("SCANCTL_STATE_DIR");
}

/// Verify a stale socket is cleaned up when no PID file exists at all.
#[test]
#[serial]
fn test_stale_lock_cleanup() {
    let state_dir = tempdir().unwrap();
    std::env::set_var("SCANCTL_STATE_DIR", state_dir.path());

    let socket_path = state_dir.path().join("daemon.sock");
    fs::write(&socket_path, "").unwrap();

    let pid_path = state_dir.path().join("daemon.pid");
    assert!(
        !pid_path.exists(),
        "PID file should not exist for this test"
    );

    assert!(!probe_socket(&socket_path));

    cleanup_stale_socket().unwrap();

    assert!(!socket_path.exists(), "stale socket should be removed");
    std::env::remove_var("SCANCTL_STATE_DIR");
}
