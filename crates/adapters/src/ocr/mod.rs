// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! OCR fallback adapters, used by the text extractor (C3) when a PDF's
//! text layer yields too little usable text and the document appears
//! image-only.

mod fake;
mod tesseract;

pub use fake::FakeOcrService;
pub use tesseract::TesseractOcrService;

use async_trait::async_trait;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum OcrError {
    #[error("memory margin unavailable, OCR aborted")]
    MemoryPressure,
    #[error("page rasterization failed: {0}")]
    RasterizeFailed(String),
    #[error("OCR engine error: {0}")]
    EngineFailed(String),
    #[error("per-page OCR timeout after {0:?}")]
    PageTimeout(Duration),
}

/// Rasterises a PDF to per-page images and OCRs each page, concatenating
/// and truncating the result (§4.3). Gated by an available-memory check
/// and a max-pages cap, both enforced by the caller before invoking this
/// trait — implementations assume the gate has already passed.
#[async_trait]
pub trait OcrService: Send + Sync + 'static {
    async fn ocr(&self, pdf_path: &Path, max_pages: usize) -> Result<String, OcrError>;
}
