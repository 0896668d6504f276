// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! In-memory object store fakes for tests.
#![cfg_attr(coverage_nightly, coverage(off))]

use super::{
    ContinuationToken, DocumentFetcher, FetchError, FetchedDocument, ListPage, ListerError,
    ObjectEntry, ObjectStoreLister,
};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::sync::Arc;

#[derive(Debug, Clone)]
struct FakeObject {
    entry: ObjectEntry,
    body: bytes::Bytes,
}

/// In-memory object store backing both `FakeObjectStoreLister` and
/// `FakeDocumentFetcher`, keyed lexicographically like a real bucket.
#[derive(Clone, Default)]
pub struct FakeObjectStore {
    objects: Arc<Mutex<BTreeMap<String, FakeObject>>>,
}

impl FakeObjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn put(&self, entry: ObjectEntry, body: impl Into<bytes::Bytes>) {
        let key = entry.key.clone();
        self.objects.lock().insert(
            key,
            FakeObject {
                entry,
                body: body.into(),
            },
        );
    }

    pub fn lister(&self) -> FakeObjectStoreLister {
        FakeObjectStoreLister {
            store: self.clone(),
            page_size: super::PAGE_SIZE_DEFAULT,
            fail_next: Arc::new(Mutex::new(None)),
        }
    }

    pub fn fetcher(&self) -> FakeDocumentFetcher {
        FakeDocumentFetcher {
            store: self.clone(),
            spill_dir: None,
        }
    }
}

/// Deterministic lister over a `FakeObjectStore`, for unit and e2e tests.
#[derive(Clone)]
pub struct FakeObjectStoreLister {
    store: FakeObjectStore,
    page_size: usize,
    fail_next: Arc<Mutex<Option<ListerError>>>,
}

impl FakeObjectStoreLister {
    /// Cap page size to exercise multi-page enumeration in tests.
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size;
        self
    }

    /// Make the next `list_page` call return the given error once.
    pub fn fail_once(&self, err: ListerError) {
        *self.fail_next.lock() = Some(err);
    }
}

#[async_trait]
impl ObjectStoreLister for FakeObjectStoreLister {
    async fn list_page(
        &self,
        prefix: &str,
        continuation: Option<ContinuationToken>,
    ) -> Result<ListPage, ListerError> {
        if let Some(err) = self.fail_next.lock().take() {
            return Err(err);
        }

        let objects = self.store.objects.lock();
        let skip_through = continuation.map(|t| t.0);

        let mut entries = Vec::new();
        let mut last_key = None;
        for (key, obj) in objects.range(..) {
            if !key.starts_with(prefix) {
                continue;
            }
            if let Some(ref skip) = skip_through {
                if key.as_str() <= skip.as_str() {
                    continue;
                }
            }
            entries.push(obj.entry.clone());
            last_key = Some(key.clone());
            if entries.len() >= self.page_size {
                break;
            }
        }

        Ok(ListPage {
            entries,
            next_token: last_key.map(ContinuationToken),
        })
    }
}

/// Deterministic fetcher over a `FakeObjectStore`.
#[derive(Clone)]
pub struct FakeDocumentFetcher {
    store: FakeObjectStore,
    spill_dir: Option<std::path::PathBuf>,
}

impl FakeDocumentFetcher {
    /// When set, fetches above `stream_to_disk_bytes` write to this
    /// directory instead of always returning `FetchedDocument::Memory`.
    pub fn with_spill_dir(mut self, dir: std::path::PathBuf) -> Self {
        self.spill_dir = Some(dir);
        self
    }
}

#[async_trait]
impl DocumentFetcher for FakeDocumentFetcher {
    async fn head(&self, key: &str) -> Option<u64> {
        self.store
            .objects
            .lock()
            .get(key)
            .map(|o| o.entry.size)
    }

    async fn fetch(
        &self,
        key: &str,
        max_object_bytes: u64,
        stream_to_disk_bytes: u64,
    ) -> Result<FetchedDocument, FetchError> {
        let obj = {
            let objects = self.store.objects.lock();
            objects
                .get(key)
                .cloned()
                .ok_or_else(|| FetchError::Permanent(format!("no such key: {key}")))?
        };

        if obj.body.len() as u64 > max_object_bytes {
            return Err(FetchError::Oversize {
                size: obj.body.len() as u64,
                max: max_object_bytes,
            });
        }

        if obj.body.len() as u64 > stream_to_disk_bytes {
            if let Some(dir) = &self.spill_dir {
                let path = dir.join(format!("fake-{}.bin", uuid::Uuid::new_v4()));
                tokio::fs::write(&path, &obj.body)
                    .await
                    .map_err(|e| FetchError::Transient(e.to_string()))?;
                return Ok(FetchedDocument::Disk(path));
            }
        }

        Ok(FetchedDocument::Memory(obj.body))
    }
}

#[cfg(test)]
#[path = "fake_tests.rs"]
mod tests;
