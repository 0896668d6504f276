// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Planning-metadata lookup adapter (§6), consumed by the subscriber
//! matcher (C5) to enrich a confirmed match's project with county/sector
//! before applying a subscriber's filters.

mod fake;
mod http;

pub use fake::FakeMetadataClient;
pub use http::HttpMetadataClient;

use async_trait::async_trait;
use scanctl_core::ProjectMetadata;

/// Idempotent GET; failure is reported as `None` so callers apply the
/// fail-closed filter rule (§4.5) rather than propagating an error.
#[async_trait]
pub trait MetadataClient: Send + Sync + 'static {
    async fn get_project_metadata(&self, project_id: &str) -> Option<ProjectMetadata>;
}
