// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

use fs2::FileExt;
use scanctl_core::{JobStatus, ReportType, ScanEvent, ScanJobConfig, ScanJobId, Schedule, ScheduleType};
use std::path::Path;
use tempfile::tempdir;

fn test_config(dir: &Path) -> Config {
    Config {
        state_dir: dir.to_owned(),
        socket_path: dir.join("test.sock"),
        lock_path: dir.join("test.lock"),
        version_path: dir.join("test.version"),
        log_path: dir.join("test.log"),
        wal_path: dir.join("wal").join("events.wal"),
        snapshot_path: dir.join("test.snapshot"),
        logs_path: dir.join("logs"),
    }
}

fn daily_schedule() -> Schedule {
    Schedule {
        schedule_type: ScheduleType::Daily,
        time_of_day: chrono::NaiveTime::from_hms_opt(6, 0, 0).unwrap(),
        day_of_week: None,
        lookback_days: 1,
        target_date: None,
    }
}

#[tokio::test]
async fn startup_lock_failed_does_not_remove_existing_files() {
    let dir = tempdir().unwrap();
    let config = test_config(dir.path());
    std::fs::create_dir_all(config.socket_path.parent().unwrap()).unwrap();

    std::fs::write(&config.socket_path, b"").unwrap();
    std::fs::write(&config.version_path, b"0.1.0").unwrap();

    let lock_file = std::fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(false)
        .open(&config.lock_path)
        .unwrap();
    lock_file.lock_exclusive().unwrap();
    std::fs::write(&config.lock_path, b"12345").unwrap();

    match startup(&config).await {
        Err(LifecycleError::LockFailed(_)) => {}
        Err(e) => panic!("expected LockFailed, got: {e}"),
        Ok(_) => panic!("expected LockFailed, but startup succeeded"),
    }

    assert!(config.socket_path.exists(), "socket must not be deleted on LockFailed");
    assert!(config.version_path.exists(), "version file must not be deleted on LockFailed");
    assert!(config.lock_path.exists(), "lock file must not be deleted on LockFailed");
}

#[test]
fn lock_file_not_truncated_before_lock_acquired() {
    let dir = tempdir().unwrap();
    let lock_path = dir.path().join("test.lock");

    let running_lock = std::fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(false)
        .open(&lock_path)
        .unwrap();
    running_lock.lock_exclusive().unwrap();
    use std::io::Write;
    let mut f = &running_lock;
    writeln!(f, "99999").unwrap();

    let _second = std::fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(false)
        .open(&lock_path)
        .unwrap();

    let content = std::fs::read_to_string(&lock_path).unwrap();
    assert_eq!(content.trim(), "99999", "lock file content must not be truncated by another open");
}

#[test]
fn cleanup_on_failure_removes_created_files() {
    let dir = tempdir().unwrap();
    let config = test_config(dir.path());

    std::fs::write(&config.socket_path, b"").unwrap();
    std::fs::write(&config.version_path, b"0.1.0").unwrap();
    std::fs::write(&config.lock_path, b"12345").unwrap();

    cleanup_on_failure(&config);

    assert!(!config.socket_path.exists(), "socket should be cleaned up on non-lock failure");
    assert!(!config.version_path.exists(), "version file should be cleaned up on non-lock failure");
    assert!(!config.lock_path.exists(), "lock file should be cleaned up on non-lock failure");
}

#[tokio::test]
async fn startup_recovers_empty_state_with_no_snapshot() {
    let dir = tempdir().unwrap();
    let config = test_config(dir.path());

    let result = startup(&config).await.unwrap();
    assert_eq!(result.daemon.state.lock().jobs.len(), 0);
    assert!(config.socket_path.exists());
}

#[tokio::test]
async fn checkpoint_sync_is_noop_with_nothing_processed() {
    let dir = tempdir().unwrap();
    let config = test_config(dir.path());

    let result = startup(&config).await.unwrap();
    // No events appended yet, so processed_seq is 0 and checkpointing is a no-op.
    result.daemon.checkpoint_sync().unwrap();
    assert!(!config.snapshot_path.exists());
}

#[tokio::test]
async fn checkpoint_sync_truncates_wal_after_snapshot() {
    let dir = tempdir().unwrap();
    let config = test_config(dir.path());

    let result = startup(&config).await.unwrap();
    let daemon = result.daemon;

    let job_id = ScanJobId::new("job-1");
    let event = ScanEvent::JobCreated {
        id: job_id,
        document_type: ReportType::Acoustic,
        config: ScanJobConfig::default(),
        schedule: daily_schedule(),
        customers: vec![],
    };
    daemon.event_bus.send(event.clone()).unwrap();
    daemon.state.lock().apply_event(&event);
    daemon.event_bus.wal().lock().mark_processed(1);
    daemon.event_bus.flush().unwrap();

    daemon.checkpoint_sync().unwrap();

    assert!(config.snapshot_path.exists(), "checkpoint should write a snapshot");
    assert_eq!(daemon.event_bus.wal().lock().entries_after(0).unwrap().len(), 0);
}

#[tokio::test]
async fn shutdown_removes_socket_lock_and_version_files() {
    let dir = tempdir().unwrap();
    let config = test_config(dir.path());

    let result = startup(&config).await.unwrap();
    let mut daemon = result.daemon;
    daemon.shutdown().unwrap();

    assert!(!config.socket_path.exists());
    assert!(!config.lock_path.exists());
    assert!(!config.version_path.exists());
}

#[tokio::test]
async fn shutdown_writes_final_snapshot_when_events_processed() {
    let dir = tempdir().unwrap();
    let config = test_config(dir.path());

    let result = startup(&config).await.unwrap();
    let mut daemon = result.daemon;

    let job_id = ScanJobId::new("job-1");
    let event = ScanEvent::JobCreated {
        id: job_id,
        document_type: ReportType::Acoustic,
        config: ScanJobConfig::default(),
        schedule: daily_schedule(),
        customers: vec![],
    };
    daemon.event_bus.send(event.clone()).unwrap();
    daemon.state.lock().apply_event(&event);
    daemon.event_bus.wal().lock().mark_processed(1);

    daemon.shutdown().unwrap();

    assert!(config.snapshot_path.exists(), "shutdown should save a final snapshot");
}

#[test]
fn parking_lot_mutex_reentrant_lock_is_detected() {
    let mutex = parking_lot::Mutex::new(42);
    let _guard = mutex.lock();
    assert!(
        mutex.try_lock().is_none(),
        "re-entrant lock on parking_lot::Mutex must fail (not silently deadlock)"
    );
}

#[test]
fn non_terminal_jobs_exclude_error_and_stopped() {
    let mut state = MaterializedState::default();
    let make_job = |id: &str, status: JobStatus| {
        let event = ScanEvent::JobCreated {
            id: ScanJobId::new(id),
            document_type: ReportType::Acoustic,
            config: ScanJobConfig::default(),
            schedule: daily_schedule(),
            customers: vec![],
        };
        state.apply_event(&event);
        if status != JobStatus::Active {
            state.jobs.get_mut(&ScanJobId::new(id)).unwrap().status = status;
        }
    };
    make_job("job-active", JobStatus::Active);
    make_job("job-error", JobStatus::Error);
    make_job("job-stopped", JobStatus::Stopped);

    let non_terminal = state
        .jobs
        .values()
        .filter(|j| !j.is_terminal_run_state())
        .count();
    assert_eq!(non_terminal, 1);
}
