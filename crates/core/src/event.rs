// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Event types for the scan job orchestrator.

use crate::match_record::MatchRecord;
use crate::queue_entry::{QueueEntryId, QueueEntryPayload};
use crate::report_type::ReportType;
use crate::scan_job::{Checkpoint, ScanJobConfig, ScanJobId, Schedule};
use crate::subscriber::{Subscriber, SubscriberId};
use crate::worker::WorkerId;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Events that trigger state transitions in the materialized state.
///
/// Serializes with `{"type": "scan:name", ...fields}` format. Unknown type
/// tags deserialize to `Custom` so old WAL entries stay readable across
/// schema additions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ScanEvent {
    // -- job lifecycle --
    #[serde(rename = "job:created")]
    JobCreated {
        id: ScanJobId,
        document_type: ReportType,
        config: ScanJobConfig,
        schedule: Schedule,
        customers: Vec<SubscriberId>,
    },

    #[serde(rename = "job:deleted")]
    JobDeleted { id: ScanJobId },

    #[serde(rename = "job:stopped")]
    JobStopped { id: ScanJobId },

    #[serde(rename = "job:enqueued")]
    JobEnqueued {
        id: ScanJobId,
        queue_entry_id: QueueEntryId,
        payload: QueueEntryPayload,
    },

    #[serde(rename = "job:leased")]
    JobLeased {
        id: ScanJobId,
        queue_entry_id: QueueEntryId,
        worker_id: WorkerId,
        /// Epoch-ms deadline after which an unrenewed lease becomes
        /// redeliverable (§4.8 visibility timeout).
        visible_after_epoch_ms: u64,
    },

    #[serde(rename = "job:run_started")]
    JobRunStarted {
        id: ScanJobId,
        scan_start_ts: DateTime<Utc>,
        scan_end_ts: DateTime<Utc>,
        total_documents: u64,
        is_resuming: bool,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        triggered_by: Option<String>,
    },

    #[serde(rename = "job:checkpoint_flushed")]
    JobCheckpointFlushed {
        id: ScanJobId,
        checkpoint: Checkpoint,
    },

    #[serde(rename = "job:paused")]
    JobPaused { id: ScanJobId, reason: String },

    #[serde(rename = "job:resumed")]
    JobResumed { id: ScanJobId },

    #[serde(rename = "job:schedule_updated")]
    JobScheduleUpdated {
        id: ScanJobId,
        target_date: Option<NaiveDate>,
    },

    #[serde(rename = "job:cancelling")]
    JobCancelling { id: ScanJobId },

    #[serde(rename = "job:cancelled")]
    JobCancelled { id: ScanJobId },

    #[serde(rename = "job:completed")]
    JobCompleted { id: ScanJobId },

    #[serde(rename = "job:failed")]
    JobFailed { id: ScanJobId, message: String },

    // -- matches and notifications --
    #[serde(rename = "match:recorded")]
    MatchRecorded { record: MatchRecord },

    #[serde(rename = "match:dropped_hallucinated_quote")]
    MatchDroppedHallucinatedQuote {
        job_id: ScanJobId,
        object_key: String,
    },

    #[serde(rename = "notification:sent")]
    NotificationSent {
        job_id: ScanJobId,
        subscriber_id: SubscriberId,
        match_count: usize,
    },

    #[serde(rename = "notification:summary_sent")]
    SummarySent { job_id: ScanJobId },

    // -- queue --
    #[serde(rename = "queue:retry_scheduled")]
    QueueEntryRetryScheduled {
        id: QueueEntryId,
        attempts: u32,
        backoff_until_epoch_ms: u64,
    },

    #[serde(rename = "queue:failed")]
    QueueEntryFailed { id: QueueEntryId },

    #[serde(rename = "queue:dropped")]
    QueueEntryDropped { id: QueueEntryId },

    #[serde(rename = "queue:completed")]
    QueueEntryCompleted { id: QueueEntryId },

    // -- subscribers --
    #[serde(rename = "subscriber:upserted")]
    SubscriberUpserted { subscriber: Subscriber },

    #[serde(rename = "subscriber:deactivated")]
    SubscriberDeactivated { id: SubscriberId },

    /// Catch-all for unknown event types (extensibility).
    #[serde(other, skip_serializing)]
    Custom,
}

impl ScanEvent {
    pub fn name(&self) -> &str {
        match self {
            ScanEvent::JobCreated { .. } => "job:created",
            ScanEvent::JobDeleted { .. } => "job:deleted",
            ScanEvent::JobStopped { .. } => "job:stopped",
            ScanEvent::JobEnqueued { .. } => "job:enqueued",
            ScanEvent::JobLeased { .. } => "job:leased",
            ScanEvent::JobRunStarted { .. } => "job:run_started",
            ScanEvent::JobCheckpointFlushed { .. } => "job:checkpoint_flushed",
            ScanEvent::JobPaused { .. } => "job:paused",
            ScanEvent::JobResumed { .. } => "job:resumed",
            ScanEvent::JobScheduleUpdated { .. } => "job:schedule_updated",
            ScanEvent::JobCancelling { .. } => "job:cancelling",
            ScanEvent::JobCancelled { .. } => "job:cancelled",
            ScanEvent::JobCompleted { .. } => "job:completed",
            ScanEvent::JobFailed { .. } => "job:failed",
            ScanEvent::MatchRecorded { .. } => "match:recorded",
            ScanEvent::MatchDroppedHallucinatedQuote { .. } => "match:dropped_hallucinated_quote",
            ScanEvent::NotificationSent { .. } => "notification:sent",
            ScanEvent::SummarySent { .. } => "notification:summary_sent",
            ScanEvent::QueueEntryRetryScheduled { .. } => "queue:retry_scheduled",
            ScanEvent::QueueEntryFailed { .. } => "queue:failed",
            ScanEvent::QueueEntryDropped { .. } => "queue:dropped",
            ScanEvent::QueueEntryCompleted { .. } => "queue:completed",
            ScanEvent::SubscriberUpserted { .. } => "subscriber:upserted",
            ScanEvent::SubscriberDeactivated { .. } => "subscriber:deactivated",
            ScanEvent::Custom => "custom",
        }
    }

    pub fn log_summary(&self) -> String {
        let t = self.name();
        match self {
            ScanEvent::JobCreated { id, document_type, .. } => {
                format!("{t} id={id} type={document_type}")
            }
            ScanEvent::JobDeleted { id } | ScanEvent::JobStopped { id } => format!("{t} id={id}"),
            ScanEvent::JobEnqueued { id, queue_entry_id, .. } => {
                format!("{t} id={id} queue_entry={queue_entry_id}")
            }
            ScanEvent::JobLeased { id, worker_id, .. } => {
                format!("{t} id={id} worker={worker_id}")
            }
            ScanEvent::JobRunStarted {
                id,
                total_documents,
                is_resuming,
                ..
            } => format!("{t} id={id} total={total_documents} resuming={is_resuming}"),
            ScanEvent::JobCheckpointFlushed { id, checkpoint } => {
                format!(
                    "{t} id={id} processed={}/{}",
                    checkpoint.processed_count, checkpoint.total_documents
                )
            }
            ScanEvent::JobPaused { id, reason } => format!("{t} id={id} reason={reason}"),
            ScanEvent::JobResumed { id }
            | ScanEvent::JobCancelling { id }
            | ScanEvent::JobCancelled { id }
            | ScanEvent::JobCompleted { id } => format!("{t} id={id}"),
            ScanEvent::JobFailed { id, message } => format!("{t} id={id} error={message}"),
            ScanEvent::JobScheduleUpdated { id, target_date } => {
                format!("{t} id={id} target_date={target_date:?}")
            }
            ScanEvent::MatchRecorded { record } => {
                format!("{t} job={} key={}", record.job_id, record.object_key)
            }
            ScanEvent::MatchDroppedHallucinatedQuote { job_id, object_key } => {
                format!("{t} job={job_id} key={object_key}")
            }
            ScanEvent::NotificationSent {
                job_id,
                subscriber_id,
                match_count,
            } => format!("{t} job={job_id} subscriber={subscriber_id} matches={match_count}"),
            ScanEvent::SummarySent { job_id } => format!("{t} job={job_id}"),
            ScanEvent::QueueEntryRetryScheduled { id, attempts, .. } => {
                format!("{t} id={id} attempts={attempts}")
            }
            ScanEvent::QueueEntryFailed { id }
            | ScanEvent::QueueEntryDropped { id }
            | ScanEvent::QueueEntryCompleted { id } => {
                format!("{t} id={id}")
            }
            ScanEvent::SubscriberUpserted { subscriber } => {
                format!("{t} id={}", subscriber.id)
            }
            ScanEvent::SubscriberDeactivated { id } => format!("{t} id={id}"),
            ScanEvent::Custom => t.to_string(),
        }
    }

    /// Extract the correlating scan-job id, if this event carries one.
    pub fn job_id(&self) -> Option<&ScanJobId> {
        match self {
            ScanEvent::JobCreated { id, .. }
            | ScanEvent::JobDeleted { id, .. }
            | ScanEvent::JobStopped { id, .. }
            | ScanEvent::JobEnqueued { id, .. }
            | ScanEvent::JobLeased { id, .. }
            | ScanEvent::JobRunStarted { id, .. }
            | ScanEvent::JobCheckpointFlushed { id, .. }
            | ScanEvent::JobPaused { id, .. }
            | ScanEvent::JobResumed { id }
            | ScanEvent::JobCancelling { id }
            | ScanEvent::JobCancelled { id }
            | ScanEvent::JobCompleted { id } => Some(id),
            ScanEvent::JobFailed { id, .. } => Some(id),
            ScanEvent::JobScheduleUpdated { id, .. } => Some(id),
            ScanEvent::MatchRecorded { record } => Some(&record.job_id),
            ScanEvent::MatchDroppedHallucinatedQuote { job_id, .. }
            | ScanEvent::NotificationSent { job_id, .. }
            | ScanEvent::SummarySent { job_id } => Some(job_id),
            ScanEvent::QueueEntryRetryScheduled { .. }
            | ScanEvent::QueueEntryFailed { .. }
            | ScanEvent::QueueEntryDropped { .. }
            | ScanEvent::QueueEntryCompleted { .. }
            | ScanEvent::SubscriberUpserted { .. }
            | ScanEvent::SubscriberDeactivated { .. }
            | ScanEvent::Custom => None,
        }
    }
}

#[cfg(test)]
#[path = "event_tests.rs"]
mod tests;
