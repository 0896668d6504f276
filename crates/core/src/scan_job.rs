// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The scan job entity and its per-run checkpoint (§3.1–§3.3).

use crate::clock::Clock;
use crate::report_type::ReportType;
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

crate::define_id! {
    /// Unique identifier for a scan job.
    pub struct ScanJobId;
}

/// Status of a scan job (§3.3 lifecycle).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    /// Idle, eligible to be enqueued.
    Active,
    /// Leased by a worker and currently processing.
    Running,
    /// Stopped by the memory governor or a retriable error; checkpoint kept.
    Paused,
    /// Stopped by an operator; does not auto-resume.
    Stopped,
    /// Cancellation requested; cleared back to `Active` at the next
    /// document boundary.
    Cancelling,
    /// Fatal error; requires operator intervention.
    Error,
}

impl JobStatus {
    /// A scheduler tick never enqueues a job in one of these states (§4.9).
    pub fn blocks_scheduler_enqueue(&self) -> bool {
        matches!(
            self,
            JobStatus::Paused | JobStatus::Stopped | JobStatus::Cancelling
        )
    }
}

/// Per-job classifier tuning and processing flags (§3.1 `config`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanJobConfig {
    pub confidence_threshold: f64,
    pub review_threshold: f64,
    #[serde(default = "default_true")]
    pub auto_process: bool,
    #[serde(default)]
    pub enable_vision: bool,
}

fn default_true() -> bool {
    true
}

impl Default for ScanJobConfig {
    fn default() -> Self {
        Self {
            confidence_threshold: 0.7,
            review_threshold: 0.5,
            auto_process: true,
            enable_vision: false,
        }
    }
}

/// Recurrence type of a job's schedule (§4.9).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScheduleType {
    Daily,
    Weekly,
    Monthly,
    Custom,
}

/// A job's wall-clock trigger configuration (§3.1 `schedule`, §4.9).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Schedule {
    #[serde(rename = "type")]
    pub schedule_type: ScheduleType,
    /// UTC time-of-day the scheduler fires at.
    pub time_of_day: NaiveTime,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub day_of_week: Option<chrono::Weekday>,
    #[serde(default = "default_lookback_days")]
    pub lookback_days: u32,
    /// Manual-run override date; when set, `run_now` scans this whole day
    /// instead of the lookback window.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_date: Option<NaiveDate>,
}

fn default_lookback_days() -> u32 {
    1
}

impl Schedule {
    /// Clamp an arbitrary lookback value into the spec's `[1, 365]` range.
    pub fn clamp_lookback_days(days: u32) -> u32 {
        days.clamp(1, 365)
    }
}

/// One confirmed match accumulated during a run (§3.1 `all_match_details`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchDetail {
    pub file_name: String,
    pub fi_type: ReportType,
    pub validation_quote: String,
    pub confidence: f64,
    pub ts: DateTime<Utc>,
}

/// The durable per-run cursor (§3.1 `checkpoint`, §4.7).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Checkpoint {
    pub last_processed_index: u64,
    pub processed_count: u64,
    pub matches_found: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_processed_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_processed_file: Option<String>,
    /// Opaque object-store continuation token, if the lister issued one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub continuation_token: Option<String>,
    pub scan_start_ts: DateTime<Utc>,
    pub scan_end_ts: DateTime<Utc>,
    pub total_documents: u64,
    #[serde(default)]
    pub is_resuming: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub triggered_by: Option<String>,
    #[serde(default)]
    pub all_match_details: Vec<MatchDetail>,
}

impl Checkpoint {
    /// A fresh, zeroed checkpoint for a new run window.
    pub fn new_for_window(scan_start_ts: DateTime<Utc>, scan_end_ts: DateTime<Utc>) -> Self {
        Self {
            last_processed_index: 0,
            processed_count: 0,
            matches_found: 0,
            last_processed_key: None,
            last_processed_file: None,
            continuation_token: None,
            scan_start_ts,
            scan_end_ts,
            total_documents: 0,
            is_resuming: false,
            triggered_by: None,
            all_match_details: Vec::new(),
        }
    }

    /// §3.2 invariant: `processed_count <= total_documents`.
    pub fn is_within_bounds(&self) -> bool {
        self.processed_count <= self.total_documents
    }
}

/// Configuration for creating a new scan job.
#[derive(Debug, Clone)]
pub struct ScanJobConfigInput {
    pub id: String,
    pub document_type: ReportType,
    pub config: ScanJobConfig,
    pub schedule: Schedule,
    pub customers: Vec<crate::subscriber::SubscriberId>,
    pub initial_status: JobStatus,
}

/// Lifetime statistics for a job (§3.1 `statistics`).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScanJobStatistics {
    pub total_runs: u64,
    pub total_documents_processed: u64,
    pub total_matches: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_run_started_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_successful_run_date: Option<NaiveDate>,
}

/// A scan job: the unit of work driven by the worker (§3.1).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanJob {
    pub id: ScanJobId,
    pub document_type: ReportType,
    pub status: JobStatus,
    pub config: ScanJobConfig,
    pub schedule: Schedule,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub checkpoint: Option<Checkpoint>,
    #[serde(default)]
    pub statistics: ScanJobStatistics,
    #[serde(default)]
    pub customers: Vec<crate::subscriber::SubscriberId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl ScanJob {
    /// Create a new job using the given ID generator and clock.
    pub fn new(input: ScanJobConfigInput, clock: &impl Clock) -> Self {
        Self {
            id: ScanJobId::new(input.id),
            document_type: input.document_type,
            status: input.initial_status,
            config: input.config,
            schedule: input.schedule,
            checkpoint: None,
            statistics: ScanJobStatistics::default(),
            customers: input.customers,
            error: None,
            created_at: clock.now_utc(),
        }
    }

    /// True once a clean run completes and the checkpoint is cleared
    /// (§3.3: "on clean completion → ACTIVE and checkpoint cleared").
    pub fn is_terminal_run_state(&self) -> bool {
        matches!(self.status, JobStatus::Error | JobStatus::Stopped)
    }

    /// §3.2: once `CANCELLING` is observed at a document boundary, the next
    /// transition is `ACTIVE` with the checkpoint reset to zero.
    pub fn cancel_and_reset(&mut self) {
        self.status = JobStatus::Active;
        self.checkpoint = None;
    }
}

#[cfg(test)]
#[path = "scan_job_tests.rs"]
mod tests;
