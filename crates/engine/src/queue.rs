// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Single-flight job admission and at-least-once delivery (C8, §4.8).
//!
//! Every mutation goes through the same two-step shape used throughout the
//! engine: append the event to the WAL, then replay it into
//! `MaterializedState` immediately so callers observe a consistent view
//! without waiting for a separate replay pass.

use scanctl_core::{
    Clock, IdGen, QueueEntry, QueueEntryId, QueueEntryPayload, QueueEntryStatus, ScanEvent,
    ScanJobId, WorkerId,
};
use scanctl_storage::{MaterializedState, Wal, WalError};
use thiserror::Error;

/// Visibility timeout for a leased entry (§9 open-question resolution):
/// comfortably longer than the 25s per-document timeout, short enough to
/// detect a genuinely dead worker within one scheduler tick.
pub const VISIBILITY_TIMEOUT_MS: u64 = 10 * 60 * 1000;

/// Starting backoff for queue retries (§4.8), doubled per attempt.
const RETRY_BASE_BACKOFF_MS: u64 = 5_000;
/// Maximum delivery attempts before the entry is marked failed (§4.8).
const MAX_ATTEMPTS: u32 = 3;

#[derive(Debug, Error)]
pub enum QueueError {
    #[error("wal error: {0}")]
    Wal(#[from] WalError),
}

/// Admit a job for processing, honoring the `"scan:"+job_id` single-flight
/// key (§4.8). If a non-terminal entry already exists for this job, it is
/// returned unchanged rather than duplicated.
pub fn enqueue(
    wal: &mut Wal,
    state: &mut MaterializedState,
    id_gen: &impl IdGen,
    job_id: &ScanJobId,
    payload: QueueEntryPayload,
) -> Result<QueueEntry, QueueError> {
    let job_key = QueueEntry::job_key_for(job_id);
    if let Some(existing) = state.active_queue_entry_for_key(&job_key) {
        return Ok(existing.clone());
    }

    let queue_entry_id = QueueEntryId::new(id_gen.next());
    let event = ScanEvent::JobEnqueued {
        id: job_id.clone(),
        queue_entry_id: queue_entry_id.clone(),
        payload,
    };
    wal.append(&event)?;
    state.apply_event(&event);

    Ok(state
        .get_queue_entry(&queue_entry_id)
        .cloned()
        .expect("just inserted by apply_event"))
}

/// Lease the oldest eligible `Waiting` entry for `worker_id`, if any.
/// Eligible means not throttled by a pending retry backoff. Entries are
/// considered in insertion order tie-broken by id, giving FIFO-ish delivery
/// without requiring a separate priority index.
pub fn lease_next(
    wal: &mut Wal,
    state: &mut MaterializedState,
    clock: &impl Clock,
    worker_id: &WorkerId,
) -> Result<Option<QueueEntry>, QueueError> {
    let now_ms = clock.epoch_ms();
    let mut candidates: Vec<&QueueEntry> = state
        .queue_entries
        .values()
        .filter(|e| {
            e.status == QueueEntryStatus::Waiting
                && e.backoff_until_epoch_ms.map_or(true, |t| t <= now_ms)
        })
        .collect();
    candidates.sort_by(|a, b| a.id.as_str().cmp(b.id.as_str()));

    let Some(entry) = candidates.first().map(|e| (*e).clone()) else {
        return Ok(None);
    };

    let event = ScanEvent::JobLeased {
        id: entry.payload.job_id.clone(),
        queue_entry_id: entry.id.clone(),
        worker_id: worker_id.clone(),
        visible_after_epoch_ms: now_ms + VISIBILITY_TIMEOUT_MS,
    };
    wal.append(&event)?;
    state.apply_event(&event);

    Ok(state.get_queue_entry(&entry.id).cloned())
}

/// Entries whose lease has expired without being completed or retried —
/// the worker that held them is presumed dead and they become
/// redeliverable (§4.8 "becomes redeliverable after a visibility timeout").
pub fn expired_leases(state: &MaterializedState, clock: &impl Clock) -> Vec<QueueEntryId> {
    let now_ms = clock.epoch_ms();
    state
        .queue_entries
        .values()
        .filter(|e| {
            e.status == QueueEntryStatus::Active
                && e.visible_after_epoch_ms.is_some_and(|t| t <= now_ms)
        })
        .map(|e| e.id.clone())
        .collect()
}

/// Mark a successfully processed entry `Completed`.
pub fn complete(
    wal: &mut Wal,
    state: &mut MaterializedState,
    queue_entry_id: &QueueEntryId,
) -> Result<(), QueueError> {
    let event = ScanEvent::QueueEntryCompleted {
        id: queue_entry_id.clone(),
    };
    wal.append(&event)?;
    state.apply_event(&event);
    Ok(())
}

/// Record a failed delivery attempt. Schedules an exponential backoff
/// retry unless attempts are exhausted (§4.8: up to 3 attempts, starting
/// at 5s), in which case the entry is marked `Failed`.
pub fn record_failure(
    wal: &mut Wal,
    state: &mut MaterializedState,
    clock: &impl Clock,
    queue_entry_id: &QueueEntryId,
) -> Result<(), QueueError> {
    let Some(entry) = state.get_queue_entry(queue_entry_id) else {
        return Ok(());
    };
    let attempts = entry.attempts + 1;

    let event = if attempts >= MAX_ATTEMPTS {
        ScanEvent::QueueEntryFailed {
            id: queue_entry_id.clone(),
        }
    } else {
        let backoff_ms = RETRY_BASE_BACKOFF_MS * 2u64.pow(attempts - 1);
        ScanEvent::QueueEntryRetryScheduled {
            id: queue_entry_id.clone(),
            attempts,
            backoff_until_epoch_ms: clock.epoch_ms() + backoff_ms,
        }
    };
    wal.append(&event)?;
    state.apply_event(&event);
    Ok(())
}

/// Withdraw an entry (e.g. its job was deleted) without counting it as a
/// failed attempt.
pub fn drop_entry(
    wal: &mut Wal,
    state: &mut MaterializedState,
    queue_entry_id: &QueueEntryId,
) -> Result<(), QueueError> {
    let event = ScanEvent::QueueEntryDropped {
        id: queue_entry_id.clone(),
    };
    wal.append(&event)?;
    state.apply_event(&event);
    Ok(())
}

#[cfg(test)]
#[path = "queue_tests.rs"]
mod tests;
