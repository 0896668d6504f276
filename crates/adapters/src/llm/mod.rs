// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! LLM classifier adapters, consumed by Stages 3-5 of the classification
//! cascade (C4, §4.4). Treated as a black-box interface so a deterministic
//! fake can back the test suite (§9 "classifier abstraction").

mod fake;
mod http;

pub use fake::FakeLlmClassifier;
pub use http::HttpLlmClassifier;

use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("transient transport error: {0}")]
    Transient(String),
    #[error("malformed structured output: {0}")]
    MalformedOutput(String),
    #[error("call timed out")]
    Timeout,
}

/// Result of the Stage 4 full FI-detection call.
#[derive(Debug, Clone, PartialEq)]
pub struct FiDetection {
    pub is_fi: bool,
}

/// Result of the Stage 5 report-type match call.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportTypeMatch {
    pub matches: bool,
    pub validation_quote: String,
    pub confidence: f64,
}

/// Two synchronous classification calls (§6), both deterministic
/// (temperature 0) and schema-enforced in production implementations.
#[async_trait]
pub trait LlmClassifier: Send + Sync + 'static {
    /// Stage 3 cheap pre-filter: "is this likely an FI request letter?"
    /// over only the first ~5,000 characters of the document.
    async fn cheap_filter(&self, text_prefix: &str) -> Result<bool, LlmError>;

    /// Stage 4: full-text FI-request classification.
    async fn classify_fi(&self, text: &str) -> Result<FiDetection, LlmError>;

    /// Stage 5: report-type match against the job's `document_type`,
    /// with a validation quote the caller must post-validate (§4.4).
    async fn classify_report_type(
        &self,
        text: &str,
        target_type: &str,
    ) -> Result<ReportTypeMatch, LlmError>;
}
