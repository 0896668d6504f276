// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Deterministic OCR fake for tests.
#![cfg_attr(coverage_nightly, coverage(off))]

use super::{OcrError, OcrService};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Returns canned text keyed by path, or an injected error.
#[derive(Clone, Default)]
pub struct FakeOcrService {
    responses: Arc<Mutex<HashMap<PathBuf, String>>>,
    fail_with: Arc<Mutex<Option<String>>>,
}

impl FakeOcrService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_text(&self, path: impl Into<PathBuf>, text: impl Into<String>) {
        self.responses.lock().insert(path.into(), text.into());
    }

    pub fn fail_with(&self, reason: impl Into<String>) {
        *self.fail_with.lock() = Some(reason.into());
    }
}

#[async_trait]
impl OcrService for FakeOcrService {
    async fn ocr(&self, pdf_path: &Path, _max_pages: usize) -> Result<String, OcrError> {
        if let Some(reason) = self.fail_with.lock().clone() {
            return Err(OcrError::EngineFailed(reason));
        }
        Ok(self
            .responses
            .lock()
            .get(pdf_path)
            .cloned()
            .unwrap_or_default())
    }
}
