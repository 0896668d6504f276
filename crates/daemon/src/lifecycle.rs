// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon lifecycle management: startup, shutdown, recovery.

use std::fs::File;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use fs2::FileExt;
use parking_lot::Mutex;
use scanctl_storage::{Checkpointer, MaterializedState, Snapshot, Wal};
use thiserror::Error;
use tokio::net::UnixListener;
use tracing::{info, warn};

use crate::env::state_dir;
use crate::event_bus::{EventBus, EventReader};

/// Daemon configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Root state directory (e.g. `~/.local/state/scanctl`).
    pub state_dir: PathBuf,
    pub socket_path: PathBuf,
    pub lock_path: PathBuf,
    pub version_path: PathBuf,
    pub log_path: PathBuf,
    pub wal_path: PathBuf,
    pub snapshot_path: PathBuf,
    /// Per-entity activity logs (job/worker/queue), §4's operator log surface.
    pub logs_path: PathBuf,
}

impl Config {
    /// Load configuration for the single user-level daemon.
    ///
    /// Uses fixed paths under `~/.local/state/scanctl/` (or
    /// `$XDG_STATE_HOME/scanctl/`). One daemon process drives every
    /// configured scan job.
    pub fn load() -> Result<Self, LifecycleError> {
        let state_dir = state_dir()?;

        Ok(Self {
            socket_path: state_dir.join("daemon.sock"),
            lock_path: state_dir.join("daemon.pid"),
            version_path: state_dir.join("daemon.version"),
            log_path: state_dir.join("daemon.log"),
            wal_path: state_dir.join("wal").join("events.wal"),
            snapshot_path: state_dir.join("snapshot.json"),
            logs_path: state_dir.join("logs"),
            state_dir,
        })
    }
}

/// Daemon state during operation. The listener is returned separately from
/// startup so `main` can spawn it as its own task.
pub struct DaemonState {
    pub config: Config,
    // NOTE(lifetime): held to maintain the exclusive file lock; released on drop.
    #[allow(dead_code)]
    lock_file: File,
    /// Materialized state, shared with the listener and the scheduler/worker loop.
    pub state: Arc<Mutex<MaterializedState>>,
    pub event_bus: EventBus,
    pub checkpointer: Checkpointer,
    pub start_time: Instant,
}

/// Result of daemon startup.
pub struct StartupResult {
    pub daemon: DaemonState,
    pub listener: UnixListener,
    pub event_reader: EventReader,
}

impl DaemonState {
    /// Checkpoint synchronously and truncate the WAL up to the checkpointed
    /// sequence (§4.7: checkpointing is the durability point a resumed run
    /// replays from).
    pub fn checkpoint_sync(&self) -> Result<(), LifecycleError> {
        let processed_seq = self.event_bus.processed_seq();
        if processed_seq == 0 {
            return Ok(());
        }
        let state_clone = self.state.lock().clone();
        let result = self.checkpointer.checkpoint_sync(processed_seq, &state_clone)?;
        self.event_bus.wal().lock().truncate_before(result.seq)?;
        Ok(())
    }

    /// Shut the daemon down gracefully: flush the WAL, take a final
    /// synchronous snapshot, and remove the socket/pid/version files so the
    /// next startup doesn't mistake this process for still-running.
    pub fn shutdown(&mut self) -> Result<(), LifecycleError> {
        info!("shutting down daemon");

        if let Err(e) = self.event_bus.flush() {
            warn!("failed to flush WAL on shutdown: {}", e);
        }

        let processed_seq = self.event_bus.processed_seq();
        if processed_seq > 0 {
            let state_clone = self.state.lock().clone();
            let snapshot = Snapshot::new(processed_seq, state_clone);
            match snapshot.save(&self.config.snapshot_path) {
                Ok(()) => info!(seq = processed_seq, "saved final shutdown snapshot"),
                Err(e) => warn!("failed to save shutdown snapshot: {}", e),
            }
        }

        if self.config.socket_path.exists() {
            if let Err(e) = std::fs::remove_file(&self.config.socket_path) {
                warn!("failed to remove socket file: {}", e);
            }
        }
        if self.config.lock_path.exists() {
            if let Err(e) = std::fs::remove_file(&self.config.lock_path) {
                warn!("failed to remove PID file: {}", e);
            }
        }
        if self.config.version_path.exists() {
            if let Err(e) = std::fs::remove_file(&self.config.version_path) {
                warn!("failed to remove version file: {}", e);
            }
        }

        info!("daemon shutdown complete");
        Ok(())
    }
}

#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error("could not determine state directory")]
    NoStateDir,

    #[error("failed to acquire lock: daemon already running?")]
    LockFailed(#[source] std::io::Error),

    #[error("failed to bind socket at {0}: {1}")]
    BindFailed(PathBuf, std::io::Error),

    #[error("wal error: {0}")]
    Wal(#[from] scanctl_storage::WalError),

    #[error("snapshot error: {0}")]
    Snapshot(#[from] scanctl_storage::SnapshotError),

    #[error("checkpoint error: {0}")]
    Checkpoint(#[from] scanctl_storage::CheckpointError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Start the daemon: acquire the lock, recover state, bind the socket.
pub async fn startup(config: &Config) -> Result<StartupResult, LifecycleError> {
    match startup_inner(config).await {
        Ok(result) => Ok(result),
        Err(e) => {
            // Don't clean up if we failed to acquire the lock — those files
            // belong to the already-running daemon.
            if !matches!(e, LifecycleError::LockFailed(_)) {
                cleanup_on_failure(config);
            }
            Err(e)
        }
    }
}

async fn startup_inner(config: &Config) -> Result<StartupResult, LifecycleError> {
    if let Some(parent) = config.socket_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    // Acquire the lock first - prevents a second daemon racing to bind the
    // same socket. Avoid truncating the file before the lock is held, which
    // would wipe a running daemon's PID out from under it.
    let lock_file = std::fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(false)
        .open(&config.lock_path)?;
    lock_file
        .try_lock_exclusive()
        .map_err(LifecycleError::LockFailed)?;

    use std::io::Write;
    let mut lock_file = lock_file;
    lock_file.set_len(0)?;
    writeln!(lock_file, "{}", std::process::id())?;
    let lock_file = lock_file;

    if let Some(parent) = config.wal_path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::create_dir_all(&config.logs_path)?;

    std::fs::write(&config.version_path, env!("CARGO_PKG_VERSION"))?;

    let (mut state, processed_seq) = match Snapshot::load(&config.snapshot_path)? {
        Some(snapshot) => {
            info!(
                seq = snapshot.seq,
                jobs = snapshot.state.jobs.len(),
                subscribers = snapshot.state.subscribers.len(),
                "loaded snapshot"
            );
            (snapshot.state, snapshot.seq)
        }
        None => {
            info!("no snapshot found, starting with empty state");
            (MaterializedState::default(), 0)
        }
    };

    let event_wal = Wal::open(&config.wal_path, processed_seq)?;
    let events_to_replay = event_wal.entries_after(processed_seq)?;
    let (event_bus, event_reader) = EventBus::new(event_wal);
    let replay_count = events_to_replay.len();
    for entry in events_to_replay {
        state.apply_event(&entry.event);
    }
    if replay_count > 0 {
        info!(replay_count, processed_seq, "replayed events from WAL");
    }

    info!(
        jobs = state.jobs.len(),
        subscribers = state.subscribers.len(),
        queue_entries = state.queue_entries.len(),
        "recovered state"
    );

    let checkpointer = Checkpointer::new(config.snapshot_path.clone());

    // Bind the socket last, only after all other validation passes, so a
    // listening socket always means the daemon is fully recovered.
    if config.socket_path.exists() {
        std::fs::remove_file(&config.socket_path)?;
    }
    let listener = UnixListener::bind(&config.socket_path)
        .map_err(|e| LifecycleError::BindFailed(config.socket_path.clone(), e))?;

    info!("daemon started");

    Ok(StartupResult {
        daemon: DaemonState {
            config: config.clone(),
            lock_file,
            state: Arc::new(Mutex::new(state)),
            event_bus,
            checkpointer,
            start_time: Instant::now(),
        },
        listener,
        event_reader,
    })
}

fn cleanup_on_failure(config: &Config) {
    if config.socket_path.exists() {
        let _ = std::fs::remove_file(&config.socket_path);
    }
    if config.version_path.exists() {
        let _ = std::fs::remove_file(&config.version_path);
    }
    if config.lock_path.exists() {
        let _ = std::fs::remove_file(&config.lock_path);
    }
}

#[cfg(test)]
#[path = "lifecycle_tests.rs"]
mod tests;
