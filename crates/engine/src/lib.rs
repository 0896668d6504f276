// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! Scan job orchestrator execution engine: the scheduler (C9), the
//! single-flight admission queue (C8), the five-stage document classifier
//! cascade (C4/C11), subscriber match filtering (C5/C7), the memory
//! governor (C10), and the worker loop that ties them together.

mod activity_logger;
pub mod classify;
mod error;
mod lexicon;
pub mod log_paths;
pub mod memory;
mod queue;
mod scheduler;
mod subscriber_matcher;
mod time_fmt;
mod worker;

pub use activity_logger::{JobLogger, QueueLogger, WorkerLogger};
pub use classify::{classify_document, ClassifierCache, ClassifyInput, Decision, Stage};
pub use error::ScanError;
pub use memory::{
    FakeMemoryMonitor, GovernorMemoryMargin, MemoryMonitor, MemorySignal, SysinfoMemoryMonitor,
};
pub use queue::{
    enqueue, expired_leases, lease_next, record_failure, complete as complete_queue_entry,
    drop_entry, QueueError, VISIBILITY_TIMEOUT_MS,
};
pub use scheduler::{
    has_fired_today, is_eligible, recurring_window, run_now, target_date_window, tick, window_for,
};
pub use subscriber_matcher::{group_by_subscriber, passes_filter, EnrichedMatch};
pub use worker::{run_job, JobStore, RunOutcome, WorkerDeps, WorkerError, WorkerLimits};
