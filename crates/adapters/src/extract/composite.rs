// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Routes extraction to the PDF or DOCX implementation by format (§4.3).
//! The worker only ever sees one [`TextExtractor`]; this is the seam that
//! picks the concrete implementation so `WorkerDeps` stays a single field.

use super::{DocumentFormat, DocumentSource, ExtractError, ExtractedText, TextExtractor};
use async_trait::async_trait;

pub struct CompositeTextExtractor {
    pdf: Box<dyn TextExtractor>,
    docx: Box<dyn TextExtractor>,
}

impl CompositeTextExtractor {
    pub fn new(pdf: Box<dyn TextExtractor>, docx: Box<dyn TextExtractor>) -> Self {
        Self { pdf, docx }
    }
}

#[async_trait]
impl TextExtractor for CompositeTextExtractor {
    async fn extract(
        &self,
        source: DocumentSource<'_>,
        format: DocumentFormat,
        max_chars: usize,
    ) -> Result<ExtractedText, ExtractError> {
        match format {
            DocumentFormat::Pdf => self.pdf.extract(source, format, max_chars).await,
            DocumentFormat::Docx => self.docx.extract(source, format, max_chars).await,
        }
    }
}
