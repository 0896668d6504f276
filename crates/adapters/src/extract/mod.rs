// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Text extraction adapters (C3): turn PDF/DOCX bytes into plain text
//! without materialising the whole document as a decoded object tree.

mod composite;
mod docx;
mod fake;
pub mod pdf;

pub use composite::CompositeTextExtractor;
pub use docx::DocxTextExtractor;
pub use fake::FakeTextExtractor;
pub use pdf::{AlwaysAvailable, MemoryMargin, PdfTextExtractor};

use async_trait::async_trait;
use std::path::Path;
use thiserror::Error;

/// The document's on-disk format, as determined from its key extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    Pdf,
    Docx,
}

/// Result of extracting text from a document (§4.3).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedText {
    pub text: String,
    pub char_count: usize,
    /// True if the global text-length cap truncated extraction.
    pub truncated: bool,
    /// True if text came from the OCR fallback path rather than direct
    /// text-layer extraction.
    pub via_ocr: bool,
}

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("corrupt document: {0}")]
    Corrupt(String),
    #[error("unsupported format")]
    UnsupportedFormat,
}

/// Source bytes for extraction: either an in-memory buffer or a path to a
/// spilled temporary file (mirrors `objstore::FetchedDocument`).
pub enum DocumentSource<'a> {
    Memory(&'a [u8]),
    Disk(&'a Path),
}

/// Turns document bytes into plain text (C3). Implementations never hold
/// the full decoded document in memory at once; PDF page handles are
/// released as soon as their text is read.
#[async_trait]
pub trait TextExtractor: Send + Sync + 'static {
    /// Extract text, applying `max_chars` as a global truncation cap.
    /// Returns `Ok` with `ok=false`-equivalent semantics folded into the
    /// `Err` variant: extraction failure is always an `ExtractError`, never
    /// an `Ok` with empty text — callers distinguish "empty after OCR" (a
    /// valid `Ok`) from "could not parse" (an `Err`).
    async fn extract(
        &self,
        source: DocumentSource<'_>,
        format: DocumentFormat,
        max_chars: usize,
    ) -> Result<ExtractedText, ExtractError>;
}

/// Estimated page count used by Stage 1 of the classifier (§4.4): roughly
/// 2,500 characters per page.
pub fn estimate_pages(char_count: usize) -> usize {
    char_count.div_ceil(2500)
}
