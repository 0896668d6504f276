// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! No-op email dispatcher, used when SMTP is not configured.

use super::{DeliveryResult, EmailDispatcher, EmailError, MatchBatch, ProgressUpdate, RunSummary};
use async_trait::async_trait;
use scanctl_core::Subscriber;

#[derive(Clone, Copy, Debug, Default)]
pub struct NoOpEmailDispatcher;

impl NoOpEmailDispatcher {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl EmailDispatcher for NoOpEmailDispatcher {
    async fn send_batch(
        &self,
        _subscriber: &Subscriber,
        _batch: &MatchBatch,
    ) -> Result<DeliveryResult, EmailError> {
        Ok(DeliveryResult {
            accepted: true,
            detail: None,
        })
    }

    async fn send_progress(
        &self,
        _admin_addr: &str,
        _update: &ProgressUpdate,
    ) -> Result<DeliveryResult, EmailError> {
        Ok(DeliveryResult {
            accepted: true,
            detail: None,
        })
    }

    async fn send_summary(
        &self,
        _admin_addr: &str,
        _summary: &RunSummary,
    ) -> Result<DeliveryResult, EmailError> {
        Ok(DeliveryResult {
            accepted: true,
            detail: None,
        })
    }
}
