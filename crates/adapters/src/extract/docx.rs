// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! DOCX structural text extraction. No OCR fallback applies to DOCX (§4.3):
//! a DOCX with no extractable paragraph text is just empty, not image-only.

use super::{DocumentFormat, DocumentSource, ExtractError, ExtractedText, TextExtractor};
use async_trait::async_trait;

pub struct DocxTextExtractor;

impl DocxTextExtractor {
    pub fn new() -> Self {
        Self
    }
}

impl Default for DocxTextExtractor {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TextExtractor for DocxTextExtractor {
    async fn extract(
        &self,
        source: DocumentSource<'_>,
        format: DocumentFormat,
        max_chars: usize,
    ) -> Result<ExtractedText, ExtractError> {
        if format != DocumentFormat::Docx {
            return Err(ExtractError::UnsupportedFormat);
        }

        let bytes = match source {
            DocumentSource::Memory(b) => b.to_vec(),
            DocumentSource::Disk(path) => {
                std::fs::read(path).map_err(|e| ExtractError::Corrupt(e.to_string()))?
            }
        };

        let docx = docx_rs::read_docx(&bytes)
            .map_err(|e| ExtractError::Corrupt(format!("{e:?}")))?;

        let mut text = String::new();
        'paragraphs: for child in &docx.document.children {
            if let docx_rs::DocumentChild::Paragraph(paragraph) = child {
                for run_child in &paragraph.children {
                    if let docx_rs::ParagraphChild::Run(run) = run_child {
                        for run_part in &run.children {
                            if let docx_rs::RunChild::Text(t) = run_part {
                                text.push_str(&t.text);
                            }
                        }
                    }
                }
                text.push('\n');
                if text.chars().count() >= max_chars {
                    break 'paragraphs;
                }
            }
        }

        let truncated = text.chars().count() > max_chars;
        let truncated_text: String = text.chars().take(max_chars).collect();
        let char_count = truncated_text.chars().count();

        Ok(ExtractedText {
            text: truncated_text,
            char_count,
            truncated,
            via_ocr: false,
        })
    }
}
