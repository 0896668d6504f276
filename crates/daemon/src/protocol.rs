// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! IPC protocol for CLI <-> daemon communication (§6 job-control surface).
//!
//! Wire format: 4-byte length prefix (big-endian) + JSON payload.

use std::collections::HashSet;

use chrono::NaiveDate;
use scanctl_core::{Checkpoint, JobStatus, ReportType, ScanJobConfig, ScanJobStatistics, Schedule};
use serde::{Deserialize, Serialize};

#[path = "protocol_wire.rs"]
mod wire;
pub use wire::{
    decode, encode, read_message, read_request, write_message, write_response, ProtocolError,
    DEFAULT_TIMEOUT, MAX_MESSAGE_SIZE, PROTOCOL_VERSION,
};

/// Request from CLI to daemon.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type")]
pub enum Request {
    /// Health check ping.
    Ping,

    /// Version handshake.
    Hello { version: String },

    /// Daemon status summary.
    Status,

    /// Request daemon shutdown.
    Shutdown,

    /// Run-level queries (§6 `get_status`, `list`).
    Query { query: Query },

    // -- job-control surface (§6) --
    /// `create_job(spec)`.
    JobCreate {
        id: String,
        document_type: ReportType,
        config: ScanJobConfig,
        schedule: Schedule,
        customers: Vec<String>,
        /// Jobs are created ACTIVE unless this is set.
        #[serde(default)]
        paused: bool,
    },
    /// `start` — reactivate a stopped/paused job so it is eligible again.
    JobStart { id: String },
    /// `stop` — halt the job; it will not be scheduled or resumed.
    JobStop { id: String },
    /// `cancel` — cooperative cancellation of the job's current run.
    JobCancel { id: String },
    /// `run_now(target_date?)` — non-blocking: returns once admission
    /// succeeds, not once processing completes (§6).
    JobRunNow { id: String, target_date: Option<NaiveDate> },
    /// `set_target_date(yyyy-mm-dd)`.
    JobSetTargetDate { id: String, target_date: Option<NaiveDate> },
    /// `delete`.
    JobDelete { id: String },

    // -- subscriber administration (not in §6's operator surface, but
    // needed to populate the customers a job notifies; modeled the same
    // request/response way) --
    SubscriberUpsert {
        id: String,
        email: String,
        name: String,
        subscribed_types: HashSet<ReportType>,
        #[serde(default)]
        allowed_regions: HashSet<String>,
        #[serde(default)]
        allowed_sectors: HashSet<String>,
    },
    SubscriberDeactivate { id: String },
}

/// `Query` variants of `Request::Query` (§6 `list`, `get_status`).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type")]
pub enum Query {
    /// `list` — every known job.
    ListJobs,
    /// `get_status` — a single job's full detail.
    GetJob { id: String },
    /// `get_status` queue view — the job's current/last queue entry.
    GetQueueEntry { job_id: String },
    ListSubscribers,
}

/// Response from daemon to CLI.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type")]
pub enum Response {
    Ok,
    Pong,
    Hello { version: String },
    ShuttingDown,
    Error { message: String },

    Status(StatusSummary),

    Job(JobDetail),
    Jobs { jobs: Vec<JobSummary> },
    JobNotFound,

    QueueEntry(Option<QueueEntrySummary>),

    Subscribers { subscribers: Vec<SubscriberSummary> },
}

/// Daemon-wide health snapshot.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StatusSummary {
    pub uptime_secs: u64,
    pub jobs_total: usize,
    pub jobs_running: usize,
    pub jobs_paused: usize,
    pub jobs_error: usize,
    pub queue_waiting: usize,
    pub queue_active: usize,
}

/// One-line job listing row.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct JobSummary {
    pub id: String,
    pub document_type: ReportType,
    pub status: JobStatus,
    pub processed_count: Option<u64>,
    pub total_documents: Option<u64>,
    pub matches_found: Option<u64>,
}

/// Full job detail for `get_status` (§6, §7 "operators see ... its
/// checkpoint, lifetime statistics").
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct JobDetail {
    pub id: String,
    pub document_type: ReportType,
    pub status: JobStatus,
    pub config: ScanJobConfig,
    pub schedule: Schedule,
    pub checkpoint: Option<Checkpoint>,
    pub statistics: ScanJobStatistics,
    pub customers: Vec<String>,
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct QueueEntrySummary {
    pub id: String,
    pub status: String,
    pub attempts: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SubscriberSummary {
    pub id: String,
    pub email: String,
    pub name: String,
    pub active: bool,
    pub subscribed_types: HashSet<ReportType>,
    pub email_count: u64,
}

#[cfg(test)]
#[path = "protocol_tests.rs"]
mod tests;
