// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Production metadata client over the planning-metadata enrichment API.

use super::MetadataClient;
use async_trait::async_trait;
use scanctl_core::ProjectMetadata;
use tracing::warn;

pub struct HttpMetadataClient {
    client: reqwest::Client,
    base_url: String,
}

impl HttpMetadataClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
        }
    }
}

#[async_trait]
impl MetadataClient for HttpMetadataClient {
    async fn get_project_metadata(&self, project_id: &str) -> Option<ProjectMetadata> {
        let url = format!("{}/projects/{}", self.base_url, project_id);
        let response = match self.client.get(&url).send().await {
            Ok(r) => r,
            Err(e) => {
                warn!(project_id, error = %e, "metadata fetch failed");
                return None;
            }
        };

        if !response.status().is_success() {
            warn!(project_id, status = %response.status(), "metadata fetch returned non-2xx");
            return None;
        }

        match response.json::<ProjectMetadata>().await {
            Ok(meta) => Some(meta),
            Err(e) => {
                warn!(project_id, error = %e, "metadata response malformed");
                None
            }
        }
    }
}
