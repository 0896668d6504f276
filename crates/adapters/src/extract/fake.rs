// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Deterministic text extractor for tests: returns canned text keyed by
//! the document's byte content, so tests can seed a fixture buffer and
//! assert on pipeline behavior without a real PDF/DOCX parser.
#![cfg_attr(coverage_nightly, coverage(off))]

use super::{DocumentFormat, DocumentSource, ExtractError, ExtractedText, TextExtractor};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;

#[derive(Clone, Default)]
pub struct FakeTextExtractor {
    by_content: Arc<Mutex<HashMap<Vec<u8>, ExtractedText>>>,
    fail_on: Arc<Mutex<HashMap<Vec<u8>, String>>>,
}

impl FakeTextExtractor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers the text to return for documents whose raw bytes equal
    /// `content` verbatim (tests typically use the document's text itself
    /// as its "bytes", since this fake never parses a real format).
    pub fn seed(&self, content: impl Into<Vec<u8>>, text: impl Into<String>) {
        let text = text.into();
        let char_count = text.chars().count();
        self.by_content.lock().insert(
            content.into(),
            ExtractedText {
                text,
                char_count,
                truncated: false,
                via_ocr: false,
            },
        );
    }

    pub fn seed_corrupt(&self, content: impl Into<Vec<u8>>, reason: impl Into<String>) {
        self.fail_on.lock().insert(content.into(), reason.into());
    }
}

#[async_trait]
impl TextExtractor for FakeTextExtractor {
    async fn extract(
        &self,
        source: DocumentSource<'_>,
        _format: DocumentFormat,
        max_chars: usize,
    ) -> Result<ExtractedText, ExtractError> {
        let bytes = match source {
            DocumentSource::Memory(b) => b.to_vec(),
            DocumentSource::Disk(path) => {
                std::fs::read(path).map_err(|e| ExtractError::Corrupt(e.to_string()))?
            }
        };

        if let Some(reason) = self.fail_on.lock().get(&bytes) {
            return Err(ExtractError::Corrupt(reason.clone()));
        }

        let Some(mut extracted) = self.by_content.lock().get(&bytes).cloned() else {
            return Ok(ExtractedText {
                text: String::new(),
                char_count: 0,
                truncated: false,
                via_ocr: false,
            });
        };

        if extracted.char_count > max_chars {
            extracted.text = extracted.text.chars().take(max_chars).collect();
            extracted.char_count = max_chars;
            extracted.truncated = true;
        }

        Ok(extracted)
    }
}
