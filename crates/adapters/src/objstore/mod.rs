// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Object-store adapters (C1 Lister, C2 Fetcher).
//!
//! The lister produces a lazy, restartable sequence of object entries under
//! a prefix, filtered by modification time; the fetcher retrieves an
//! entry's bytes, choosing between an in-memory buffer and a spilled
//! temporary file depending on size.

mod fake;
mod s3;

pub use fake::{FakeDocumentFetcher, FakeObjectStore, FakeObjectStoreLister};
pub use s3::{S3DocumentFetcher, S3ObjectStoreLister};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::path::PathBuf;
use thiserror::Error;

/// Default page size for fakes; production listers use `PAGE_SIZE` (1000).
pub(crate) const PAGE_SIZE_DEFAULT: usize = 1000;

/// One object under the scanned prefix.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ObjectEntry {
    pub key: String,
    pub size: u64,
    pub last_modified: DateTime<Utc>,
}

/// Opaque, server-assigned continuation cursor (§4.1). Persisted verbatim
/// in the job checkpoint; never parsed by callers.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ContinuationToken(pub String);

/// A single page of listed entries plus the cursor to resume after it.
#[derive(Debug, Clone, Default)]
pub struct ListPage {
    pub entries: Vec<ObjectEntry>,
    pub next_token: Option<ContinuationToken>,
}

#[derive(Debug, Error)]
pub enum ListerError {
    #[error("transient listing error: {0}")]
    Transient(String),
    #[error("permanent listing error: {0}")]
    Permanent(String),
}

/// Paginated, checkpointable enumeration of objects under a prefix (C1).
///
/// Implementations yield at most one batch (up to 1000 entries) per call
/// and never materialise the full prefix in memory.
#[async_trait]
pub trait ObjectStoreLister: Send + Sync + 'static {
    /// List the next page under `prefix` starting from `continuation`.
    /// `start_ts`/`end_ts` bound `last_modified`; the caller is responsible
    /// for the extension/path-shape predicate (§4.1) since those are
    /// domain filters, not listing filters.
    async fn list_page(
        &self,
        prefix: &str,
        continuation: Option<ContinuationToken>,
    ) -> Result<ListPage, ListerError>;
}

/// Either an in-memory buffer or a path to a spilled temporary file,
/// depending on `stream_to_disk_bytes` (§4.2).
pub enum FetchedDocument {
    Memory(bytes::Bytes),
    Disk(PathBuf),
}

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("object exceeds max_object_bytes ({size} > {max})")]
    Oversize { size: u64, max: u64 },
    #[error("transient fetch error: {0}")]
    Transient(String),
    #[error("permanent fetch error: {0}")]
    Permanent(String),
}

/// Retrieves object bytes, enforcing `max_object_bytes` and choosing disk
/// vs. memory via `stream_to_disk_bytes` (C2, §4.2).
#[async_trait]
pub trait DocumentFetcher: Send + Sync + 'static {
    /// HEAD the object to learn its size without fetching the body.
    /// Returns `None` if HEAD is unsupported or fails (the fetcher then
    /// proceeds optimistically and still enforces `max_object_bytes`
    /// during the body read).
    async fn head(&self, key: &str) -> Option<u64>;

    /// Fetch the object body, spilling to a temporary file above
    /// `stream_to_disk_bytes`. The temporary file (if any) is removed by
    /// the caller once the fetched document is no longer needed.
    async fn fetch(
        &self,
        key: &str,
        max_object_bytes: u64,
        stream_to_disk_bytes: u64,
    ) -> Result<FetchedDocument, FetchError>;
}
