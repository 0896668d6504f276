// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fake email dispatcher for testing: records every call, grounded on
//! the notify adapter's fake (`notify::fake::FakeNotifyAdapter`).
#![cfg_attr(coverage_nightly, coverage(off))]

use super::{DeliveryResult, EmailDispatcher, EmailError, MatchBatch, ProgressUpdate, RunSummary};
use async_trait::async_trait;
use parking_lot::Mutex;
use scanctl_core::Subscriber;
use std::sync::Arc;

/// Recorded email send.
#[derive(Debug, Clone)]
pub enum EmailCall {
    Batch { to: String, match_count: usize },
    Progress { to: String, processed: u64, total: u64 },
    Summary { to: String, matches_found: u64 },
}

struct FakeEmailState {
    calls: Vec<EmailCall>,
    fail_next: Option<String>,
}

#[derive(Clone)]
pub struct FakeEmailDispatcher {
    inner: Arc<Mutex<FakeEmailState>>,
}

impl Default for FakeEmailDispatcher {
    fn default() -> Self {
        Self {
            inner: Arc::new(Mutex::new(FakeEmailState {
                calls: Vec::new(),
                fail_next: None,
            })),
        }
    }
}

impl FakeEmailDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> Vec<EmailCall> {
        self.inner.lock().calls.clone()
    }

    pub fn fail_next(&self, reason: impl Into<String>) {
        self.inner.lock().fail_next = Some(reason.into());
    }
}

#[async_trait]
impl EmailDispatcher for FakeEmailDispatcher {
    async fn send_batch(
        &self,
        subscriber: &Subscriber,
        batch: &MatchBatch,
    ) -> Result<DeliveryResult, EmailError> {
        let mut state = self.inner.lock();
        state.calls.push(EmailCall::Batch {
            to: subscriber.email.clone(),
            match_count: batch.matches.len(),
        });
        if let Some(reason) = state.fail_next.take() {
            return Ok(DeliveryResult {
                accepted: false,
                detail: Some(reason),
            });
        }
        Ok(DeliveryResult {
            accepted: true,
            detail: None,
        })
    }

    async fn send_progress(
        &self,
        admin_addr: &str,
        update: &ProgressUpdate,
    ) -> Result<DeliveryResult, EmailError> {
        self.inner.lock().calls.push(EmailCall::Progress {
            to: admin_addr.to_string(),
            processed: update.processed,
            total: update.total,
        });
        Ok(DeliveryResult {
            accepted: true,
            detail: None,
        })
    }

    async fn send_summary(
        &self,
        admin_addr: &str,
        summary: &RunSummary,
    ) -> Result<DeliveryResult, EmailError> {
        self.inner.lock().calls.push(EmailCall::Summary {
            to: admin_addr.to_string(),
            matches_found: summary.matches_found,
        });
        Ok(DeliveryResult {
            accepted: true,
            detail: None,
        })
    }
}
