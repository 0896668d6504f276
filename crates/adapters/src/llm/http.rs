// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Production LLM client: an HTTP call per classification stage, with
//! jittered exponential backoff on transient errors and malformed
//! structured outputs (≤3 attempts), and a per-call wall-clock timeout.

use super::{FiDetection, LlmClassifier, LlmError, ReportTypeMatch};
use async_trait::async_trait;
use rand::Rng;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;

const MAX_ATTEMPTS: u32 = 3;
const CALL_TIMEOUT: Duration = Duration::from_secs(60);
const BASE_BACKOFF: Duration = Duration::from_millis(500);

pub struct HttpLlmClassifier {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
    model: String,
}

impl HttpLlmClassifier {
    pub fn new(endpoint: impl Into<String>, api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: endpoint.into(),
            api_key: api_key.into(),
            model: model.into(),
        }
    }

    async fn call_with_retry<T: for<'de> Deserialize<'de>>(
        &self,
        path: &str,
        body: serde_json::Value,
    ) -> Result<T, LlmError> {
        let mut attempt = 0;
        loop {
            attempt += 1;
            let result = self.call_once::<T>(path, &body).await;
            match result {
                Ok(value) => return Ok(value),
                Err(e) if attempt >= MAX_ATTEMPTS => return Err(e),
                Err(LlmError::Transient(_)) | Err(LlmError::MalformedOutput(_)) => {
                    let backoff = BASE_BACKOFF * 2u32.pow(attempt - 1);
                    let jitter = Duration::from_millis(rand::rng().random_range(0..100));
                    tokio::time::sleep(backoff + jitter).await;
                }
                Err(e) => return Err(e),
            }
        }
    }

    async fn call_once<T: for<'de> Deserialize<'de>>(
        &self,
        path: &str,
        body: &serde_json::Value,
    ) -> Result<T, LlmError> {
        let request = self
            .client
            .post(format!("{}{}", self.endpoint, path))
            .bearer_auth(&self.api_key)
            .json(body);

        let response = tokio::time::timeout(CALL_TIMEOUT, request.send())
            .await
            .map_err(|_| LlmError::Timeout)?
            .map_err(|e| LlmError::Transient(e.to_string()))?;

        if response.status().is_server_error() || response.status().as_u16() == 429 {
            return Err(LlmError::Transient(format!(
                "status {}",
                response.status()
            )));
        }
        if !response.status().is_success() {
            return Err(LlmError::MalformedOutput(format!(
                "status {}",
                response.status()
            )));
        }

        response
            .json::<T>()
            .await
            .map_err(|e| LlmError::MalformedOutput(e.to_string()))
    }
}

#[derive(Deserialize)]
struct CheapFilterResponse {
    likely_fi_request: bool,
}

#[derive(Deserialize)]
struct FiDetectionResponse {
    is_fi: bool,
}

#[derive(Deserialize)]
struct ReportTypeMatchResponse {
    matches: bool,
    validation_quote: String,
    confidence: f64,
}

#[async_trait]
impl LlmClassifier for HttpLlmClassifier {
    async fn cheap_filter(&self, text_prefix: &str) -> Result<bool, LlmError> {
        let body = json!({
            "model": self.model,
            "temperature": 0,
            "prompt": "Is this likely an FI (Further Information) request letter from a planning authority?",
            "text": text_prefix,
            "response_schema": { "likely_fi_request": "bool" },
        });
        let resp: CheapFilterResponse = self.call_with_retry("/v1/cheap-filter", body).await?;
        Ok(resp.likely_fi_request)
    }

    async fn classify_fi(&self, text: &str) -> Result<FiDetection, LlmError> {
        let body = json!({
            "model": self.model,
            "temperature": 0,
            "system": FI_DETECTION_SYSTEM_PROMPT,
            "text": text,
            "response_schema": { "is_fi": "bool" },
        });
        let resp: FiDetectionResponse = self.call_with_retry("/v1/classify-fi", body).await?;
        Ok(FiDetection { is_fi: resp.is_fi })
    }

    async fn classify_report_type(
        &self,
        text: &str,
        target_type: &str,
    ) -> Result<ReportTypeMatch, LlmError> {
        let body = json!({
            "model": self.model,
            "temperature": 0,
            "text": text,
            "target_type": target_type,
            "response_schema": {
                "matches": "bool",
                "validation_quote": "string",
                "confidence": "number",
            },
        });
        let resp: ReportTypeMatchResponse =
            self.call_with_retry("/v1/classify-report-type", body).await?;
        Ok(ReportTypeMatch {
            matches: resp.matches,
            validation_quote: resp.validation_quote,
            confidence: resp.confidence,
        })
    }
}

/// Fixed system prompt for Stage 4 (§4.4): return true only if the text is
/// a formal Further-Information request from a planning authority to an
/// applicant, distinguishing existing reports, third-party objections,
/// and applicant submissions (all rejected).
const FI_DETECTION_SYSTEM_PROMPT: &str = "You are classifying planning application documents. \
Return true only if this document is a formal Further Information (FI) request sent BY a \
planning authority TO an applicant, asking for additional technical information. Return false \
for: existing technical reports, third-party objections, applicant submissions or cover \
letters, decision notices, and planning conditions.";
