// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Notification dispatcher adapters (C6): one batch email per subscriber
//! per checkpoint flush, plus operator progress/summary emails.

mod fake;
mod noop;
mod smtp;

pub use fake::{EmailCall, FakeEmailDispatcher};
pub use noop::NoOpEmailDispatcher;
pub use smtp::SmtpEmailDispatcher;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use scanctl_core::{MatchRecord, ScanJobId, Subscriber};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EmailError {
    #[error("delivery failed: {0}")]
    DeliveryFailed(String),
}

/// Durable record of one delivery attempt, surfaced in the job's summary
/// on failure (§4.6, §7).
#[derive(Debug, Clone, PartialEq)]
pub struct DeliveryResult {
    pub accepted: bool,
    pub detail: Option<String>,
}

/// A subscriber's matches attached to one batch email.
#[derive(Debug, Clone)]
pub struct MatchBatch {
    pub matches: Vec<MatchRecord>,
    pub report_types: Vec<String>,
    pub job_id: ScanJobId,
    pub generated_at: DateTime<Utc>,
}

/// Operator progress update, emitted mid-run at checkpoint flushes.
#[derive(Debug, Clone)]
pub struct ProgressUpdate {
    pub job_name: String,
    pub processed: u64,
    pub total: u64,
    pub matches_found: u64,
    pub recent_matches: Vec<MatchRecord>,
}

/// Operator end-of-run summary.
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub job_name: String,
    pub processed: u64,
    pub total: u64,
    pub matches_found: u64,
    pub matches: Vec<MatchRecord>,
    pub failed_deliveries: usize,
}

/// Email dispatch (C6, §6): batched per-subscriber match emails plus
/// operator progress/summary emails.
#[async_trait]
pub trait EmailDispatcher: Clone + Send + Sync + 'static {
    async fn send_batch(
        &self,
        subscriber: &Subscriber,
        batch: &MatchBatch,
    ) -> Result<DeliveryResult, EmailError>;

    async fn send_progress(
        &self,
        admin_addr: &str,
        update: &ProgressUpdate,
    ) -> Result<DeliveryResult, EmailError>;

    async fn send_summary(
        &self,
        admin_addr: &str,
        summary: &RunSummary,
    ) -> Result<DeliveryResult, EmailError>;
}
