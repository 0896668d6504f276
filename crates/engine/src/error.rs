// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Error taxonomy for the scan pipeline (§7).
//!
//! Each variant carries its own retry/terminal policy rather than leaving
//! callers to infer it from the message, so the worker and queue can route
//! on `retriable()`/`terminal()` without matching on variants themselves.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScanError {
    #[error("transient listing error: {0}")]
    TransientListing(String),
    #[error("transient fetch error: {0}")]
    TransientFetch(String),
    #[error("transient LLM error: {0}")]
    TransientLlm(String),
    #[error("object {key} exceeds max size ({size} > {max} bytes)")]
    OversizeObject { key: String, size: u64, max: u64 },
    #[error("unsupported extension: {0}")]
    UnsupportedExtension(String),
    #[error("corrupt document: {0}")]
    CorruptDocument(String),
    #[error("extraction produced no usable text")]
    ExtractionEmpty,
    #[error("document processing timed out")]
    DocumentTimeout,
    #[error("validation quote failed post-validation (hallucinated)")]
    HallucinatedQuote,
    #[error("project metadata unavailable for {0}")]
    MetadataMissing(String),
    #[error("memory pressure: rss {rss_mb}mb exceeds pause threshold {pause_mb}mb")]
    MemoryPressure { rss_mb: u64, pause_mb: u64 },
    #[error("fatal configuration error: {0}")]
    FatalConfig(String),
    #[error("authentication failure: {0}")]
    AuthFailure(String),
    #[error("cancelled by user")]
    CancelledByUser,
}

impl ScanError {
    /// Whether the failing operation should be retried in place (§7: the
    /// `transient_*` row). Retried errors never change job status.
    pub fn retriable(&self) -> bool {
        matches!(
            self,
            ScanError::TransientListing(_) | ScanError::TransientFetch(_) | ScanError::TransientLlm(_)
        )
    }

    /// Whether the job should move to `ERROR` with no automatic retry.
    pub fn terminal(&self) -> bool {
        matches!(self, ScanError::FatalConfig(_) | ScanError::AuthFailure(_))
    }

    /// Whether this error merely skips the current document and advances
    /// the cursor, without affecting run-level or match-level state.
    pub fn skip_document(&self) -> bool {
        matches!(
            self,
            ScanError::OversizeObject { .. }
                | ScanError::UnsupportedExtension(_)
                | ScanError::CorruptDocument(_)
                | ScanError::ExtractionEmpty
                | ScanError::DocumentTimeout
        )
    }
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
