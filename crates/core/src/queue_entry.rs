// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The single-flight job queue entry (§4.8).

use crate::scan_job::ScanJobId;
use serde::{Deserialize, Serialize};

crate::define_id! {
    /// Unique identifier for a queue entry.
    pub struct QueueEntryId;
}

/// Lifecycle state of a queue entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueueEntryStatus {
    /// Waiting for a worker to lease it.
    Waiting,
    /// Leased by a worker and being processed.
    Active,
    /// Processing finished successfully.
    Completed,
    /// Retry attempts were exhausted.
    Failed,
    /// Explicitly withdrawn (e.g. job deleted).
    Dropped,
}

impl QueueEntryStatus {
    /// Non-terminal statuses block a new enqueue of the same job key
    /// (§4.8 single-flight admission).
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            QueueEntryStatus::Completed | QueueEntryStatus::Failed | QueueEntryStatus::Dropped
        )
    }
}

/// The payload carried by a queue entry: which job to run and on what
/// window, plus an optional force-run flag bypassing schedule eligibility.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueueEntryPayload {
    pub job_id: ScanJobId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_date: Option<chrono::NaiveDate>,
    #[serde(default)]
    pub force: bool,
}

/// A queue entry keyed `"scan:"+job_id` (§4.8).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueueEntry {
    pub id: QueueEntryId,
    pub job_key: String,
    pub payload: QueueEntryPayload,
    pub status: QueueEntryStatus,
    #[serde(default)]
    pub attempts: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub backoff_until_epoch_ms: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visible_after_epoch_ms: Option<u64>,
}

impl QueueEntry {
    /// The deterministic admission key for a scan job (§4.8).
    pub fn job_key_for(job_id: &ScanJobId) -> String {
        format!("scan:{}", job_id.as_str())
    }
}

#[cfg(test)]
#[path = "queue_entry_tests.rs"]
mod tests;
