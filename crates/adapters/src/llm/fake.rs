// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Deterministic LLM fake for tests: canned decisions keyed by the input
//! text (or a substring match), so test fixtures read as ordinary strings
//! rather than mock-framework expectations.
#![cfg_attr(coverage_nightly, coverage(off))]

use super::{FiDetection, LlmClassifier, LlmError, ReportTypeMatch};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::Arc;

#[derive(Clone, Default)]
pub struct FakeLlmClassifier {
    inner: Arc<Mutex<FakeState>>,
}

#[derive(Default)]
struct FakeState {
    cheap_filter_default: bool,
    is_fi_default: bool,
    report_matches: Vec<(String, ReportTypeMatch)>,
    calls: Vec<String>,
    fail_next: Option<LlmError>,
}

impl FakeLlmClassifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Default answer for `cheap_filter` when no call was explicitly
    /// recorded for the given text.
    pub fn set_cheap_filter_default(&self, value: bool) {
        self.inner.lock().cheap_filter_default = value;
    }

    pub fn set_is_fi_default(&self, value: bool) {
        self.inner.lock().is_fi_default = value;
    }

    /// Registers the Stage 5 response returned when `text` contains
    /// `needle`.
    pub fn set_report_type_match(&self, needle: impl Into<String>, result: ReportTypeMatch) {
        self.inner
            .lock()
            .report_matches
            .push((needle.into(), result));
    }

    pub fn fail_next_call(&self, err: LlmError) {
        self.inner.lock().fail_next = Some(err);
    }

    pub fn calls(&self) -> Vec<String> {
        self.inner.lock().calls.clone()
    }
}

#[async_trait]
impl LlmClassifier for FakeLlmClassifier {
    async fn cheap_filter(&self, text_prefix: &str) -> Result<bool, LlmError> {
        let mut state = self.inner.lock();
        state.calls.push(format!("cheap_filter:{text_prefix}"));
        if let Some(err) = state.fail_next.take() {
            return Err(err);
        }
        Ok(state.cheap_filter_default)
    }

    async fn classify_fi(&self, text: &str) -> Result<FiDetection, LlmError> {
        let mut state = self.inner.lock();
        state.calls.push("classify_fi".to_string());
        if let Some(err) = state.fail_next.take() {
            return Err(err);
        }
        let is_fi = state.is_fi_default
            || text.to_lowercase().contains("further information")
            || text.to_lowercase().contains("is requested to submit")
            || text.to_lowercase().contains("is required to submit");
        Ok(FiDetection { is_fi })
    }

    async fn classify_report_type(
        &self,
        text: &str,
        _target_type: &str,
    ) -> Result<ReportTypeMatch, LlmError> {
        let mut state = self.inner.lock();
        state.calls.push("classify_report_type".to_string());
        if let Some(err) = state.fail_next.take() {
            return Err(err);
        }
        for (needle, result) in &state.report_matches {
            if text.contains(needle.as_str()) {
                return Ok(result.clone());
            }
        }
        Ok(ReportTypeMatch {
            matches: false,
            validation_quote: String::new(),
            confidence: 0.0,
        })
    }
}
