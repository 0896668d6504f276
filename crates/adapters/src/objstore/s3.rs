// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Production object-store adapters over `object_store`'s `AmazonS3` backend.

use super::{
    ContinuationToken, DocumentFetcher, FetchError, FetchedDocument, ListPage, ListerError,
    ObjectEntry, ObjectStoreLister,
};
use async_trait::async_trait;
use futures::StreamExt;
use object_store::path::Path as ObjectPath;
use object_store::ObjectStore;
use std::sync::Arc;
use tokio::io::AsyncWriteExt;
use tokio::sync::Semaphore;

/// Size of one `list_page` batch (§4.1: at most 1000 entries per call).
const PAGE_SIZE: usize = 1000;

/// Lists objects under a prefix via `object_store`. Concurrent listing and
/// fetch requests against the bucket are bounded by a shared semaphore
/// rather than `object_store::limit::LimitStore`'s generic wrapper, which
/// would otherwise force a concrete (non-trait-object) store type.
#[derive(Clone)]
pub struct S3ObjectStoreLister {
    store: Arc<dyn ObjectStore>,
    requests: Arc<Semaphore>,
}

impl S3ObjectStoreLister {
    pub fn new(store: Arc<dyn ObjectStore>, max_concurrent_requests: usize) -> Self {
        Self {
            store,
            requests: Arc::new(Semaphore::new(max_concurrent_requests.max(1))),
        }
    }
}

#[async_trait]
impl ObjectStoreLister for S3ObjectStoreLister {
    async fn list_page(
        &self,
        prefix: &str,
        continuation: Option<ContinuationToken>,
    ) -> Result<ListPage, ListerError> {
        let _permit = self
            .requests
            .acquire()
            .await
            .map_err(|e| ListerError::Permanent(e.to_string()))?;

        let object_prefix = ObjectPath::from(prefix);
        let mut stream = self.store.list(Some(&object_prefix));

        // object_store's stream has no server-side continuation token of
        // its own; we emulate resumability by skipping entries
        // lexicographically less-than-or-equal to the last key recorded
        // in the token, the same key-comparison semantics §4.1 mandates
        // as the fallback when no token is persisted.
        let skip_through = continuation.map(|t| t.0);
        let mut entries = Vec::with_capacity(PAGE_SIZE);
        let mut last_key = None;

        while let Some(item) = stream.next().await {
            let meta = item.map_err(|e| ListerError::Transient(e.to_string()))?;
            let key = meta.location.to_string();

            if let Some(ref skip) = skip_through {
                if key.as_str() <= skip.as_str() {
                    continue;
                }
            }

            last_key = Some(key.clone());
            entries.push(ObjectEntry {
                key,
                size: meta.size as u64,
                last_modified: meta.last_modified,
            });

            if entries.len() >= PAGE_SIZE {
                break;
            }
        }

        let next_token = last_key.map(ContinuationToken);
        Ok(ListPage { entries, next_token })
    }
}

/// Fetches document bodies from S3, spilling to a temp file above
/// `stream_to_disk_bytes` (§4.2). HEAD is attempted first to learn size
/// before the body read begins.
#[derive(Clone)]
pub struct S3DocumentFetcher {
    store: Arc<dyn ObjectStore>,
    tmp_dir: std::path::PathBuf,
}

impl S3DocumentFetcher {
    pub fn new(store: Arc<dyn ObjectStore>, tmp_dir: std::path::PathBuf) -> Self {
        Self { store, tmp_dir }
    }
}

#[async_trait]
impl DocumentFetcher for S3DocumentFetcher {
    async fn head(&self, key: &str) -> Option<u64> {
        let path = ObjectPath::from(key);
        self.store.head(&path).await.ok().map(|m| m.size as u64)
    }

    async fn fetch(
        &self,
        key: &str,
        max_object_bytes: u64,
        stream_to_disk_bytes: u64,
    ) -> Result<FetchedDocument, FetchError> {
        let path = ObjectPath::from(key);

        if let Some(size) = self.head(key).await {
            if size > max_object_bytes {
                return Err(FetchError::Oversize {
                    size,
                    max: max_object_bytes,
                });
            }
        }

        let result = self.store.get(&path).await.map_err(|e| {
            if matches!(e, object_store::Error::NotFound { .. }) {
                FetchError::Permanent(e.to_string())
            } else {
                FetchError::Transient(e.to_string())
            }
        })?;

        if result.meta.size as u64 > stream_to_disk_bytes {
            let mut stream = result.into_stream();
            let tmp_path = self
                .tmp_dir
                .join(format!("scanctl-fetch-{}.tmp", uuid::Uuid::new_v4()));
            let mut file = tokio::fs::File::create(&tmp_path)
                .await
                .map_err(|e| FetchError::Transient(e.to_string()))?;
            let mut written: u64 = 0;
            while let Some(chunk) = stream.next().await {
                let chunk = chunk.map_err(|e| FetchError::Transient(e.to_string()))?;
                written += chunk.len() as u64;
                if written > max_object_bytes {
                    drop(file);
                    let _ = tokio::fs::remove_file(&tmp_path).await;
                    return Err(FetchError::Oversize {
                        size: written,
                        max: max_object_bytes,
                    });
                }
                file.write_all(&chunk)
                    .await
                    .map_err(|e| FetchError::Transient(e.to_string()))?;
            }
            file.flush()
                .await
                .map_err(|e| FetchError::Transient(e.to_string()))?;
            Ok(FetchedDocument::Disk(tmp_path))
        } else {
            let bytes = result
                .bytes()
                .await
                .map_err(|e| FetchError::Transient(e.to_string()))?;
            if bytes.len() as u64 > max_object_bytes {
                return Err(FetchError::Oversize {
                    size: bytes.len() as u64,
                    max: max_object_bytes,
                });
            }
            Ok(FetchedDocument::Memory(bytes))
        }
    }
}
