// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! In-memory metadata fake for tests.
#![cfg_attr(coverage_nightly, coverage(off))]

use super::MetadataClient;
use async_trait::async_trait;
use parking_lot::Mutex;
use scanctl_core::ProjectMetadata;
use std::collections::HashMap;
use std::sync::Arc;

#[derive(Clone, Default)]
pub struct FakeMetadataClient {
    by_project: Arc<Mutex<HashMap<String, ProjectMetadata>>>,
}

impl FakeMetadataClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn seed(&self, project_id: impl Into<String>, metadata: ProjectMetadata) {
        self.by_project.lock().insert(project_id.into(), metadata);
    }
}

#[async_trait]
impl MetadataClient for FakeMetadataClient {
    async fn get_project_metadata(&self, project_id: &str) -> Option<ProjectMetadata> {
        self.by_project.lock().get(project_id).cloned()
    }
}
