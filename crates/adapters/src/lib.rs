// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]
// Enable coverage(off) attribute for excluding test infrastructure
#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

//! Adapters for every external system the scan job orchestrator talks to:
//! the object store (C1/C2), PDF/DOCX text extraction and OCR fallback
//! (C3), the LLM classifier (C4), the planning-metadata service (C5), and
//! the email dispatcher (C6). Each is a trait with a production
//! implementation and a deterministic fake, following the same
//! trait+prod+fake shape throughout.

pub mod email;
pub mod extract;
pub mod llm;
pub mod metadata;
pub mod objstore;
pub mod ocr;

pub use email::{EmailDispatcher, EmailError, NoOpEmailDispatcher, SmtpEmailDispatcher};
pub use extract::{
    estimate_pages, CompositeTextExtractor, DocxTextExtractor, ExtractError, MemoryMargin,
    PdfTextExtractor, TextExtractor,
};
pub use llm::{HttpLlmClassifier, LlmClassifier, LlmError};
pub use metadata::{HttpMetadataClient, MetadataClient};
pub use objstore::{
    DocumentFetcher, ListerError, ObjectStoreLister, S3DocumentFetcher, S3ObjectStoreLister,
};
pub use ocr::{OcrService, TesseractOcrService};

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
pub use email::{EmailCall, FakeEmailDispatcher};
#[cfg(any(test, feature = "test-support"))]
pub use extract::FakeTextExtractor;
#[cfg(any(test, feature = "test-support"))]
pub use llm::FakeLlmClassifier;
#[cfg(any(test, feature = "test-support"))]
pub use metadata::FakeMetadataClient;
#[cfg(any(test, feature = "test-support"))]
pub use objstore::{FakeDocumentFetcher, FakeObjectStore, FakeObjectStoreLister};
#[cfg(any(test, feature = "test-support"))]
pub use ocr::FakeOcrService;
