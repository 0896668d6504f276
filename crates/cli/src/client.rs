// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon client for CLI commands.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use crate::client_lifecycle::log_connection_error;
use crate::daemon_process::{
    cleanup_stale_socket, daemon_dir, daemon_socket, probe_socket, read_startup_error,
    start_daemon_background, stop_daemon_sync,
};

use scanctl_daemon::protocol::{self, ProtocolError};
use scanctl_daemon::{
    JobDetail, JobSummary, Query, QueueEntrySummary, Request, Response, StatusSummary,
    SubscriberSummary,
};
use thiserror::Error;
use tokio::net::UnixStream;

fn parse_duration_ms(var: &str) -> Option<Duration> {
    std::env::var(var)
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
        .map(Duration::from_millis)
}

/// Timeout for IPC requests (hello, status, job-control, queries).
pub fn timeout_ipc() -> Duration {
    parse_duration_ms("SCANCTL_TIMEOUT_IPC_MS").unwrap_or(Duration::from_secs(5))
}

/// Timeout for waiting for the daemon to start.
pub fn timeout_connect() -> Duration {
    parse_duration_ms("SCANCTL_TIMEOUT_CONNECT_MS").unwrap_or(Duration::from_secs(5))
}

/// Timeout for waiting for the daemon process to exit.
pub fn timeout_exit() -> Duration {
    parse_duration_ms("SCANCTL_TIMEOUT_EXIT_MS").unwrap_or(Duration::from_secs(2))
}

/// Polling interval for connection retries.
pub fn poll_interval() -> Duration {
    parse_duration_ms("SCANCTL_CONNECT_POLL_MS").unwrap_or(Duration::from_millis(50))
}

/// Client errors.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("daemon not running")]
    DaemonNotRunning,

    #[error("failed to start daemon: {0}")]
    DaemonStartFailed(String),

    #[error("connection timeout waiting for daemon to start")]
    DaemonStartTimeout,

    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    #[error("request rejected: {0}")]
    Rejected(String),

    #[error("unexpected response from daemon")]
    UnexpectedResponse,

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("could not determine state directory")]
    NoStateDir,
}

/// Client for the `scanctld` Unix-socket IPC protocol (§6 job-control surface).
pub struct DaemonClient {
    socket_path: PathBuf,
}

impl DaemonClient {
    /// For action commands (create/start/stop/cancel/run-now/...): auto-start
    /// the daemon if it isn't running, restarting on version mismatch at
    /// most once per process.
    pub fn for_action() -> Result<Self, ClientError> {
        Self::connect_or_start_once()
    }

    /// For query commands (list/get-status): connect only, never restart.
    pub fn for_query() -> Result<Self, ClientError> {
        Self::connect()
    }

    fn connect_or_start_once() -> Result<Self, ClientError> {
        static RESTARTED: AtomicBool = AtomicBool::new(false);

        if RESTARTED.load(Ordering::SeqCst) {
            return Self::connect_or_start();
        }

        let dir = daemon_dir()?;
        let version_path = dir.join("daemon.version");
        if let Ok(daemon_version) = std::fs::read_to_string(&version_path) {
            let cli_version = env!("CARGO_PKG_VERSION");
            if daemon_version.trim() != cli_version {
                RESTARTED.store(true, Ordering::SeqCst);
                eprintln!(
                    "warn: daemon version {} does not match cli version {}, restarting daemon",
                    daemon_version.trim(),
                    cli_version
                );
                stop_daemon_sync();
            }
        }

        Self::connect_or_start()
    }

    /// Connect to the daemon, auto-starting it in the background if it is
    /// not currently running.
    fn connect_or_start() -> Result<Self, ClientError> {
        match Self::connect() {
            Ok(client) => {
                if probe_socket(&client.socket_path) {
                    Ok(client)
                } else {
                    cleanup_stale_socket()?;
                    let child = start_daemon_background()?;
                    Self::connect_with_retry(timeout_connect(), child)
                }
            }
            Err(ClientError::DaemonNotRunning) => {
                let child = start_daemon_background()?;
                Self::connect_with_retry(timeout_connect(), child)
            }
            Err(e) => Err(e),
        }
    }

    /// Connect to an already-running daemon; does not start one.
    pub fn connect() -> Result<Self, ClientError> {
        let socket_path = daemon_socket()?;

        if !socket_path.exists() {
            let err = ClientError::DaemonNotRunning;
            log_connection_error(&err);
            return Err(err);
        }

        Ok(Self { socket_path })
    }

    fn connect_with_retry(
        timeout: Duration,
        mut child: std::process::Child,
    ) -> Result<Self, ClientError> {
        let start = Instant::now();
        while start.elapsed() < timeout {
            match child.try_wait() {
                Ok(Some(status)) => {
                    let poll_start = Instant::now();
                    while poll_start.elapsed() < timeout_exit() {
                        if let Some(err) = read_startup_error() {
                            return Err(ClientError::DaemonStartFailed(err));
                        }
                        std::thread::sleep(poll_interval());
                    }
                    return Err(ClientError::DaemonStartFailed(format!(
                        "exited with {status}"
                    )));
                }
                Ok(None) => {}
                Err(_) => {}
            }

            match Self::connect() {
                Ok(client) => return Ok(client),
                Err(ClientError::DaemonNotRunning) => std::thread::sleep(poll_interval()),
                Err(e) => return Err(e),
            }
        }

        Err(ClientError::DaemonStartTimeout)
    }

    async fn send_with_timeout(
        &self,
        request: &Request,
        read_timeout: Duration,
        write_timeout: Duration,
    ) -> Result<Response, ClientError> {
        let stream = UnixStream::connect(&self.socket_path).await?;
        let (mut reader, mut writer) = stream.into_split();

        let data = protocol::encode(request)?;
        tokio::time::timeout(write_timeout, protocol::write_message(&mut writer, &data))
            .await
            .map_err(|_| ProtocolError::Timeout)??;

        let response_bytes =
            tokio::time::timeout(read_timeout, protocol::read_message(&mut reader))
                .await
                .map_err(|_| ProtocolError::Timeout)??;

        let response: Response = protocol::decode(&response_bytes)?;
        Ok(response)
    }

    /// Send a request and receive a response.
    pub async fn send(&self, request: &Request) -> Result<Response, ClientError> {
        match self
            .send_with_timeout(request, timeout_ipc(), timeout_ipc())
            .await
        {
            Ok(response) => Ok(response),
            Err(e) => {
                log_connection_error(&e);
                Err(e)
            }
        }
    }

    /// Helper for requests that expect `Ok` or `Error`.
    async fn send_simple(&self, request: &Request) -> Result<(), ClientError> {
        match self.send(request).await? {
            Response::Ok => Ok(()),
            Response::Error { message } => Err(ClientError::Rejected(message)),
            _ => Err(ClientError::UnexpectedResponse),
        }
    }

    fn reject<T>(other: Response) -> Result<T, ClientError> {
        match other {
            Response::Error { message } => Err(ClientError::Rejected(message)),
            _ => Err(ClientError::UnexpectedResponse),
        }
    }

    /// `create_job(spec)` (§6).
    #[allow(clippy::too_many_arguments)]
    pub async fn job_create(
        &self,
        id: String,
        document_type: scanctl_core::ReportType,
        config: scanctl_core::ScanJobConfig,
        schedule: scanctl_core::Schedule,
        customers: Vec<String>,
        paused: bool,
    ) -> Result<(), ClientError> {
        self.send_simple(&Request::JobCreate {
            id,
            document_type,
            config,
            schedule,
            customers,
            paused,
        })
        .await
    }

    /// `start` (§6).
    pub async fn job_start(&self, id: String) -> Result<(), ClientError> {
        self.send_simple(&Request::JobStart { id }).await
    }

    /// `stop` (§6).
    pub async fn job_stop(&self, id: String) -> Result<(), ClientError> {
        self.send_simple(&Request::JobStop { id }).await
    }

    /// `cancel` (§6).
    pub async fn job_cancel(&self, id: String) -> Result<(), ClientError> {
        self.send_simple(&Request::JobCancel { id }).await
    }

    /// `run_now(target_date?)` (§6). Non-blocking: returns once admission
    /// succeeds, not once processing completes.
    pub async fn job_run_now(
        &self,
        id: String,
        target_date: Option<chrono::NaiveDate>,
    ) -> Result<(), ClientError> {
        self.send_simple(&Request::JobRunNow { id, target_date }).await
    }

    /// `set_target_date(yyyy-mm-dd)` (§6).
    pub async fn job_set_target_date(
        &self,
        id: String,
        target_date: Option<chrono::NaiveDate>,
    ) -> Result<(), ClientError> {
        self.send_simple(&Request::JobSetTargetDate { id, target_date })
            .await
    }

    /// `delete` (§6).
    pub async fn job_delete(&self, id: String) -> Result<(), ClientError> {
        self.send_simple(&Request::JobDelete { id }).await
    }

    /// `list` (§6).
    pub async fn list_jobs(&self) -> Result<Vec<JobSummary>, ClientError> {
        match self.send(&Request::Query { query: Query::ListJobs }).await? {
            Response::Jobs { jobs } => Ok(jobs),
            other => Self::reject(other),
        }
    }

    /// `get_status` (§6).
    pub async fn get_job(&self, id: &str) -> Result<Option<JobDetail>, ClientError> {
        let request = Request::Query {
            query: Query::GetJob { id: id.to_string() },
        };
        match self.send(&request).await? {
            Response::Job(job) => Ok(Some(job)),
            Response::JobNotFound => Ok(None),
            other => Self::reject(other),
        }
    }

    /// The job's current/last queue entry, part of `get_status`'s detail.
    pub async fn get_queue_entry(
        &self,
        job_id: &str,
    ) -> Result<Option<QueueEntrySummary>, ClientError> {
        let request = Request::Query {
            query: Query::GetQueueEntry {
                job_id: job_id.to_string(),
            },
        };
        match self.send(&request).await? {
            Response::QueueEntry(entry) => Ok(entry),
            other => Self::reject(other),
        }
    }

    pub async fn subscriber_upsert(
        &self,
        id: String,
        email: String,
        name: String,
        subscribed_types: std::collections::HashSet<scanctl_core::ReportType>,
        allowed_regions: std::collections::HashSet<String>,
        allowed_sectors: std::collections::HashSet<String>,
    ) -> Result<(), ClientError> {
        self.send_simple(&Request::SubscriberUpsert {
            id,
            email,
            name,
            subscribed_types,
            allowed_regions,
            allowed_sectors,
        })
        .await
    }

    pub async fn subscriber_deactivate(&self, id: String) -> Result<(), ClientError> {
        self.send_simple(&Request::SubscriberDeactivate { id }).await
    }

    pub async fn list_subscribers(&self) -> Result<Vec<SubscriberSummary>, ClientError> {
        match self
            .send(&Request::Query {
                query: Query::ListSubscribers,
            })
            .await?
        {
            Response::Subscribers { subscribers } => Ok(subscribers),
            other => Self::reject(other),
        }
    }

    /// Daemon-wide health snapshot.
    pub async fn status(&self) -> Result<StatusSummary, ClientError> {
        match self.send(&Request::Status).await? {
            Response::Status(summary) => Ok(summary),
            other => Self::reject(other),
        }
    }

    /// Version handshake.
    pub async fn hello(&self) -> Result<String, ClientError> {
        let request = Request::Hello {
            version: env!("CARGO_PKG_VERSION").to_string(),
        };
        match self.send(&request).await? {
            Response::Hello { version } => Ok(version),
            other => Self::reject(other),
        }
    }

    /// Request daemon shutdown.
    pub async fn shutdown(&self) -> Result<(), ClientError> {
        match self.send(&Request::Shutdown).await? {
            Response::Ok | Response::ShuttingDown => Ok(()),
            other => Self::reject(other),
        }
    }
}

#[cfg(test)]
#[path = "client_tests.rs"]
mod tests;
