// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Scan Job Orchestrator daemon (scanctld)
//!
//! Background process that owns the WAL/state, the IPC listener, and the
//! scheduler-tick + queue-drain loop that turns due scan jobs into completed
//! runs.
//!
//! Architecture:
//! - Listener task: accepts CLI connections, applies job-control commands
//!   directly to the shared state (synchronous apply, durable via WAL).
//! - Runner task: ticks the scheduler, reaps dead leases, and drains the
//!   queue through the worker loop.
//! - Main task: drains the WAL reader (marking entries processed so they can
//!   be checkpointed and truncated) and waits for a shutdown signal.

#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

mod env;
mod event_bus;
mod job_store;
mod lifecycle;
mod listener;
mod protocol;
mod runner;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use scanctl_core::ScanConfig;
use scanctl_storage::{Checkpointer, MaterializedState, Wal};
use tokio::signal::unix::{signal, SignalKind};
use tracing::{error, info};

use crate::event_bus::EventBus;
use crate::job_store::StateJobStore;
use crate::lifecycle::{Config, LifecycleError, StartupResult};
use crate::listener::{ListenCtx, Listener};
use crate::runner::Runner;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    if let Some(arg) = std::env::args().nth(1) {
        match arg.as_str() {
            "--version" | "-V" | "-v" => {
                println!("scanctld {}", env!("CARGO_PKG_VERSION"));
                return Ok(());
            }
            "--help" | "-h" | "help" => {
                println!("scanctld {}", env!("CARGO_PKG_VERSION"));
                println!("Scan Job Orchestrator daemon — background process that enumerates");
                println!("planning documents, classifies them, and notifies subscribers.");
                println!();
                println!("USAGE:");
                println!("    scanctld");
                println!();
                println!("The daemon is typically started by the `scanctl` CLI and should not");
                println!("be invoked directly. It listens on a Unix socket for commands from");
                println!("`scanctl`.");
                println!();
                println!("OPTIONS:");
                println!("    -h, --help       Print help information");
                println!("    -v, --version    Print version information");
                return Ok(());
            }
            _ => {
                eprintln!("error: unexpected argument '{arg}'");
                eprintln!("Usage: scanctld [--help | --version]");
                std::process::exit(1);
            }
        }
    }

    let config = Config::load()?;

    rotate_log_if_needed(&config.log_path);
    write_startup_marker(&config)?;
    let log_guard = setup_logging(&config)?;

    info!("starting scan job orchestrator daemon");

    let StartupResult {
        mut daemon,
        listener: unix_listener,
        mut event_reader,
    } = match lifecycle::startup(&config).await {
        Ok(r) => r,
        Err(LifecycleError::LockFailed(_)) => {
            let pid = std::fs::read_to_string(&config.lock_path)
                .unwrap_or_default()
                .trim()
                .to_string();
            let version = std::fs::read_to_string(&config.version_path)
                .unwrap_or_default()
                .trim()
                .to_string();

            eprintln!("scanctld is already running");
            if !pid.is_empty() {
                eprintln!("  pid: {pid}");
            }
            if !version.is_empty() {
                let current_version = env!("CARGO_PKG_VERSION");
                if version == current_version {
                    eprintln!("  version: {version}");
                } else {
                    eprintln!("  version: {version} (outdated — current: {current_version})");
                }
            }
            std::process::exit(1);
        }
        Err(e) => {
            write_startup_error(&config, &e);
            error!("failed to start daemon: {}", e);
            drop(log_guard);
            return Err(e.into());
        }
    };

    // Shutdown signal: a watch channel rather than a WAL event, so a
    // shutdown request is never durable and can never be replayed.
    let (shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);

    let store = StateJobStore::new(Arc::clone(&daemon.state), daemon.event_bus.clone());

    let listen_ctx = ListenCtx::new(
        store.clone(),
        daemon.event_bus.wal(),
        daemon.start_time,
        shutdown_tx.clone(),
    );
    let listener_task = Listener::new(unix_listener, listen_ctx);
    tokio::spawn(listener_task.run());

    let scan_config = ScanConfig::from_env();
    let runner = Arc::new(Runner::new(
        &scan_config,
        Arc::clone(&daemon.state),
        daemon.event_bus.clone(),
    ));
    tokio::spawn(Arc::clone(&runner).run(shutdown_rx.clone()));

    spawn_checkpoint(
        Arc::clone(&daemon.state),
        event_reader.wal(),
        daemon.config.snapshot_path.clone(),
    );
    spawn_flush_task(daemon.event_bus.clone());

    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sigint = signal(SignalKind::interrupt())?;

    info!(
        "daemon ready, listening on {}",
        config.socket_path.display()
    );
    println!("READY");

    let mut shutdown_watch = shutdown_rx;
    loop {
        tokio::select! {
            result = event_reader.recv() => {
                match result {
                    Ok(Some(entry)) => event_reader.mark_processed(entry.seq),
                    Ok(None) => {
                        info!("event bus closed, shutting down...");
                        break;
                    }
                    Err(e) => error!("error reading from WAL: {}", e),
                }
            }

            _ = shutdown_watch.changed() => {
                if *shutdown_watch.borrow() {
                    info!("shutdown requested via command");
                    break;
                }
            }

            _ = sigterm.recv() => {
                info!("received SIGTERM, shutting down...");
                let _ = shutdown_tx.send(true);
                break;
            }

            _ = sigint.recv() => {
                info!("received SIGINT, shutting down...");
                let _ = shutdown_tx.send(true);
                break;
            }
        }
    }

    daemon.shutdown()?;
    info!("daemon stopped");
    Ok(())
}

/// Flush interval for group commit (~10ms durability window).
const FLUSH_INTERVAL: Duration = Duration::from_millis(10);

/// Spawn a task that periodically flushes the event bus.
fn spawn_flush_task(event_bus: EventBus) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(FLUSH_INTERVAL);

        loop {
            interval.tick().await;

            if event_bus.needs_flush() {
                if let Err(e) = event_bus.flush() {
                    tracing::error!("failed to flush event bus: {}", e);
                }
            }
        }
    });
}

/// Checkpoint interval (60 seconds).
const CHECKPOINT_INTERVAL: Duration = Duration::from_secs(60);

/// Spawn a task that periodically saves snapshots and truncates the WAL.
///
/// Checkpoints run in a background thread to minimize main-task blocking —
/// only the state clone happens on the async task, with
/// serialization/compression/I/O on a dedicated thread. WAL truncation only
/// happens after the snapshot is fully durable (written, fsync'd, and
/// atomically renamed), so a crash mid-checkpoint never loses data.
fn spawn_checkpoint(
    state: Arc<Mutex<MaterializedState>>,
    event_wal: Arc<Mutex<Wal>>,
    snapshot_path: PathBuf,
) {
    let checkpointer = Checkpointer::new(snapshot_path);

    tokio::spawn(async move {
        let mut interval = tokio::time::interval(CHECKPOINT_INTERVAL);

        loop {
            interval.tick().await;

            let (state_ref, processed_seq) = {
                let state_guard = state.lock();
                let wal_guard = event_wal.lock();
                (state_guard.clone(), wal_guard.processed_seq())
            };

            if processed_seq == 0 {
                continue;
            }

            let handle = checkpointer.start(processed_seq, &state_ref);
            let result = tokio::task::spawn_blocking(move || handle.wait()).await;

            match result {
                Ok(Ok(checkpoint_result)) => {
                    tracing::debug!(
                        seq = checkpoint_result.seq,
                        size_bytes = checkpoint_result.size_bytes,
                        "checkpoint complete"
                    );

                    let mut wal = event_wal.lock();
                    if let Err(e) = wal.truncate_before(processed_seq) {
                        tracing::warn!(error = %e, "failed to truncate WAL after checkpoint");
                    }
                }
                Ok(Err(e)) => {
                    tracing::warn!(error = %e, "checkpoint failed, WAL not truncated");
                }
                Err(e) => {
                    tracing::warn!(error = %e, "checkpoint task panicked");
                }
            }
        }
    });
}

/// Maximum log file size before rotation (10 MB).
const MAX_LOG_SIZE: u64 = 10 * 1024 * 1024;

/// Number of rotated log files to keep (daemon.log.1, .2, .3).
const MAX_ROTATED_LOGS: u32 = 3;

/// Rotate the daemon log file if it exceeds [`MAX_LOG_SIZE`].
///
/// Shifts `daemon.log` → `daemon.log.1` → `daemon.log.2` → `daemon.log.3`,
/// deleting the oldest. Best-effort: rotation failures are silently ignored
/// so the daemon still starts.
fn rotate_log_if_needed(log_path: &std::path::Path) {
    let size = match std::fs::metadata(log_path) {
        Ok(m) => m.len(),
        Err(_) => return,
    };

    if size < MAX_LOG_SIZE {
        return;
    }

    let log_str = log_path.display().to_string();

    for i in (1..MAX_ROTATED_LOGS).rev() {
        let from = format!("{log_str}.{i}");
        let to = format!("{log_str}.{}", i + 1);
        let _ = std::fs::rename(&from, &to);
    }

    let _ = std::fs::rename(log_path, format!("{log_str}.1"));
}

/// Startup marker prefix written to the log before anything else. The CLI
/// uses this to find where the current startup attempt begins.
/// Full format: "--- scanctld: starting (pid: 12345) ---"
const STARTUP_MARKER_PREFIX: &str = "--- scanctld: starting (pid: ";

/// Write the startup marker to the log file (appends to any existing log).
fn write_startup_marker(config: &Config) -> Result<(), LifecycleError> {
    use std::io::Write;

    if let Some(parent) = config.log_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let mut file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&config.log_path)?;
    writeln!(
        file,
        "{}{}) ---\n",
        STARTUP_MARKER_PREFIX,
        std::process::id()
    )?;

    Ok(())
}

/// Write a startup error synchronously to the log file, so it is visible to
/// the CLI even if the process exits before tracing's async writer flushes.
fn write_startup_error(config: &Config, error: &LifecycleError) {
    use std::io::Write;

    let Ok(mut file) = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&config.log_path)
    else {
        return;
    };
    let _ = writeln!(file, "ERROR failed to start daemon: {}", error);
}

fn setup_logging(
    config: &Config,
) -> Result<tracing_appender::non_blocking::WorkerGuard, LifecycleError> {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    if let Some(parent) = config.log_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let file_appender = tracing_appender::rolling::never(
        config.log_path.parent().ok_or(LifecycleError::NoStateDir)?,
        config
            .log_path
            .file_name()
            .ok_or(LifecycleError::NoStateDir)?,
    );
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(non_blocking))
        .init();

    Ok(guard)
}

#[cfg(test)]
#[path = "main_tests.rs"]
mod tests;
