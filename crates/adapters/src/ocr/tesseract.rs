// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Production OCR: `pdfium-render` rasterizes pages, `tesseract-rs` reads
//! text off each rasterized page. Grounded on the vcpkg `leptonica`/
//! `tesseract` native toolchain pairing used elsewhere in the retrieved
//! pack for document OCR pipelines.

use super::{OcrError, OcrService};
use async_trait::async_trait;
use std::path::Path;
use std::time::Duration;

/// Fixed DPI for page rasterization (§4.3).
const RASTER_DPI: i32 = 150;
/// Per-page OCR timeout (§5).
const PAGE_TIMEOUT: Duration = Duration::from_secs(30);
/// Per-PDF-to-image conversion timeout (§5).
const CONVERT_TIMEOUT: Duration = Duration::from_secs(60);

pub struct TesseractOcrService {
    pdfium: pdfium_render::prelude::Pdfium,
    language: String,
}

impl TesseractOcrService {
    pub fn new(pdfium: pdfium_render::prelude::Pdfium, language: impl Into<String>) -> Self {
        Self {
            pdfium,
            language: language.into(),
        }
    }
}

#[async_trait]
impl OcrService for TesseractOcrService {
    async fn ocr(&self, pdf_path: &Path, max_pages: usize) -> Result<String, OcrError> {
        let document = tokio::time::timeout(CONVERT_TIMEOUT, async {
            self.pdfium
                .load_pdf_from_file(pdf_path, None)
                .map_err(|e| OcrError::RasterizeFailed(e.to_string()))
        })
        .await
        .map_err(|_| OcrError::RasterizeFailed("PDF->image conversion timed out".into()))??;

        let mut out = String::new();
        let page_count = document.pages().len() as usize;

        for index in 0..page_count.min(max_pages) {
            let page = document
                .pages()
                .get(index as u16)
                .map_err(|e| OcrError::RasterizeFailed(e.to_string()))?;
            let bitmap = page
                .render_with_config(
                    &pdfium_render::prelude::PdfRenderConfig::new()
                        .set_target_width(RASTER_DPI * 8)
                        .set_maximum_height(RASTER_DPI * 11),
                )
                .map_err(|e| OcrError::RasterizeFailed(e.to_string()))?;
            let image = bitmap.as_image();

            let page_png = tempfile::Builder::new()
                .suffix(".png")
                .tempfile()
                .map_err(|e| OcrError::RasterizeFailed(e.to_string()))?;
            image
                .save_with_format(page_png.path(), image::ImageFormat::Png)
                .map_err(|e| OcrError::RasterizeFailed(e.to_string()))?;

            let lang = self.language.clone();
            let page_path = page_png.path().to_path_buf();
            let page_text = tokio::time::timeout(
                PAGE_TIMEOUT,
                tokio::task::spawn_blocking(move || tesseract::ocr(&page_path, &lang)),
            )
            .await
            .map_err(|_| OcrError::PageTimeout(PAGE_TIMEOUT))?
            .map_err(|e| OcrError::EngineFailed(e.to_string()))?
            .map_err(|e| OcrError::EngineFailed(e.to_string()))?;

            out.push_str(&page_text);
            out.push('\n');
            // page_png, bitmap and page handle drop here before the next
            // iteration, bounding peak memory to one page at a time.
        }

        Ok(out)
    }
}
