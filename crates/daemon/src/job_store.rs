// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The [`scanctl_engine::JobStore`] implementation the worker mutates
//! through: a lock-mutate-unlock cycle around the shared WAL and
//! `MaterializedState`, exactly the shape `worker::run_job` documents.

use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;

use scanctl_core::{MatchRecord, ScanEvent, ScanJob, ScanJobId, Subscriber};
use scanctl_engine::{JobStore, WorkerError};
use scanctl_storage::MaterializedState;

use crate::event_bus::EventBus;

/// Shared handle the listener, scheduler tick, and worker loop all mutate
/// through. Every write appends to the WAL first, then replays into
/// `MaterializedState` so the next read sees it immediately.
#[derive(Clone)]
pub struct StateJobStore {
    pub state: Arc<Mutex<MaterializedState>>,
    pub event_bus: EventBus,
}

impl StateJobStore {
    pub fn new(state: Arc<Mutex<MaterializedState>>, event_bus: EventBus) -> Self {
        Self { state, event_bus }
    }

    /// Apply an event synchronously: append to the WAL, then replay. Used
    /// outside the worker loop (listener commands, scheduler ticks) where
    /// there's no `dyn JobStore` receiver to call `apply` through.
    pub fn apply_sync(&self, event: ScanEvent) -> Result<(), scanctl_storage::WalError> {
        self.event_bus.send(event.clone())?;
        self.state.lock().apply_event(&event);
        Ok(())
    }
}

#[async_trait]
impl JobStore for StateJobStore {
    async fn get_job(&self, id: &ScanJobId) -> Option<ScanJob> {
        self.state.lock().get_job(id).cloned()
    }

    async fn subscribers_for_job(&self, id: &ScanJobId) -> Vec<Subscriber> {
        self.state
            .lock()
            .subscribers_for_job(id)
            .into_iter()
            .cloned()
            .collect()
    }

    async fn pending_matches(&self, id: &ScanJobId) -> Vec<MatchRecord> {
        self.state
            .lock()
            .pending_matches
            .get(id)
            .cloned()
            .unwrap_or_default()
    }

    async fn apply(&self, event: ScanEvent) -> Result<(), WorkerError> {
        self.event_bus
            .send(event.clone())
            .map_err(|e| WorkerError::Scan(scanctl_engine::ScanError::FatalConfig(e.to_string())))?;
        self.state.lock().apply_event(&event);
        Ok(())
    }
}
