// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Wall-clock job eligibility and admission (C9, §4.9).
//!
//! The scheduler itself holds no state beyond what's already in
//! `MaterializedState`: a tick reads `last_successful_run_date` and
//! `time_of_day` off each job and enqueues the ones due, through the same
//! [`crate::queue::enqueue`] single-flight path a manual `run_now` uses.

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};
use scanctl_core::{
    Clock, IdGen, QueueEntry, QueueEntryPayload, ScanJob, ScanJobId, Schedule, ScheduleType,
};
use scanctl_storage::{MaterializedState, Wal};

use crate::queue::{self, QueueError};

/// Whether `job` is due to run on `today`, per its schedule type (§4.9). A
/// job that has never completed a run successfully is always eligible.
pub fn is_eligible(job: &ScanJob, today: NaiveDate) -> bool {
    if job.status.blocks_scheduler_enqueue() {
        return false;
    }
    let Some(last) = job.statistics.last_successful_run_date else {
        return true;
    };
    match job.schedule.schedule_type {
        ScheduleType::Daily | ScheduleType::Custom => last != today,
        ScheduleType::Weekly => (today - last).num_days() >= 7,
        ScheduleType::Monthly => (today - last).num_days() >= 30,
    }
}

/// Whether a job's daily trigger time has passed for `now`.
pub fn has_fired_today(time_of_day: NaiveTime, now: DateTime<Utc>) -> bool {
    now.time() >= time_of_day
}

/// The `[today - lookback_days, yesterday 23:59:59.999]` window for a
/// recurring run (§4.9): today's partial data is always excluded.
pub fn recurring_window(today: NaiveDate, lookback_days: u32) -> (DateTime<Utc>, DateTime<Utc>) {
    let lookback_days = Schedule::clamp_lookback_days(lookback_days);
    let start_date = today - Duration::days(lookback_days as i64);
    let end_date = today - Duration::days(1);
    let start = start_date.and_hms_opt(0, 0, 0).unwrap().and_utc();
    let end = end_date.and_hms_milli_opt(23, 59, 59, 999).unwrap().and_utc();
    (start, end)
}

/// The whole-day `[D, D+1d)` window for a manual run pinned to `target_date`.
pub fn target_date_window(target_date: NaiveDate) -> (DateTime<Utc>, DateTime<Utc>) {
    let start = target_date.and_hms_opt(0, 0, 0).unwrap().and_utc();
    let end = (target_date + Duration::days(1))
        .and_hms_opt(0, 0, 0)
        .unwrap()
        .and_utc();
    (start, end)
}

/// Resolve the scan window for a fresh run. Resumed runs don't call this —
/// they read the frozen window out of the existing checkpoint instead
/// (§4.9: "for resumed runs the window is read from the checkpoint").
pub fn window_for(
    schedule: &Schedule,
    target_date: Option<NaiveDate>,
    today: NaiveDate,
) -> (DateTime<Utc>, DateTime<Utc>) {
    match target_date {
        Some(d) => target_date_window(d),
        None => recurring_window(today, schedule.lookback_days),
    }
}

/// Enqueue every job that is due to run at `now`. Admission is idempotent
/// (`queue::enqueue` is single-flight per job key), so calling `tick`
/// repeatedly within the same eligibility window is harmless.
pub fn tick(
    wal: &mut Wal,
    state: &mut MaterializedState,
    id_gen: &impl IdGen,
    clock: &impl Clock,
) -> Result<Vec<ScanJobId>, QueueError> {
    let now = clock.now_utc();
    let today = now.date_naive();

    let due: Vec<ScanJobId> = state
        .jobs
        .values()
        .filter(|job| is_eligible(job, today) && has_fired_today(job.schedule.time_of_day, now))
        .map(|job| job.id.clone())
        .collect();

    let mut ticked = Vec::with_capacity(due.len());
    for job_id in due {
        queue::enqueue(
            wal,
            state,
            id_gen,
            &job_id,
            QueueEntryPayload {
                job_id: job_id.clone(),
                target_date: None,
                force: false,
            },
        )?;
        ticked.push(job_id);
    }
    Ok(ticked)
}

/// Admit a job outside its schedule (the `run_now` job-control operation,
/// §6). Bypasses eligibility but not single-flight admission: a job already
/// queued or running still yields its existing entry.
pub fn run_now(
    wal: &mut Wal,
    state: &mut MaterializedState,
    id_gen: &impl IdGen,
    job_id: &ScanJobId,
    target_date: Option<NaiveDate>,
) -> Result<QueueEntry, QueueError> {
    queue::enqueue(
        wal,
        state,
        id_gen,
        job_id,
        QueueEntryPayload {
            job_id: job_id.clone(),
            target_date,
            force: true,
        },
    )
}

#[cfg(test)]
#[path = "scheduler_tests.rs"]
mod tests;
