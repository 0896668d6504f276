// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Process configuration loaded from the environment (§6).

use std::env;
use std::path::PathBuf;

fn env_bool(key: &str, default: bool) -> bool {
    match env::var(key) {
        Ok(v) => matches!(v.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes"),
        Err(_) => default,
    }
}

fn env_u32(key: &str, default: u32) -> u32 {
    env::var(key)
        .ok()
        .and_then(|v| v.parse::<u32>().ok())
        .unwrap_or(default)
}

fn env_string(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.is_empty())
}

/// Process-wide configuration, assembled once at daemon startup.
#[derive(Debug, Clone)]
pub struct ScanConfig {
    /// Disables the wall-clock scheduler (C9) without disabling the worker (C10).
    pub scheduler_enabled: bool,
    /// Number of jobs a single worker process may drain concurrently (inter-job only).
    pub worker_concurrency: u32,
    /// Hard reject threshold for object fetch (C2), in megabytes.
    pub max_object_mb: u32,
    /// Below this size, fetched bytes are buffered in memory rather than streamed to disk.
    pub streaming_pdf_threshold_mb: u32,
    /// Minimum useful character count before the OCR fallback is triggered (C3).
    pub ocr_min_char_threshold: u32,
    /// RSS, in megabytes, at which the worker attempts a cooldown (§4.10).
    pub warn_rss_mb: u32,
    /// RSS, in megabytes, at which the worker pauses the job (§4.10).
    pub pause_rss_mb: u32,
    /// Directory holding the WAL and snapshot files.
    pub data_dir: PathBuf,
    /// The prefix the lister enumerates under (§6 object store layout).
    pub object_store_prefix: String,
    /// Object-store bucket/container.
    pub object_store_bucket: Option<String>,
    /// Object-store region.
    pub object_store_region: Option<String>,
    /// LLM endpoint base URL.
    pub llm_endpoint: Option<String>,
    /// LLM API key.
    pub llm_api_key: Option<String>,
    /// LLM model identifier sent with each classification request.
    pub llm_model: String,
    /// Planning-metadata enrichment service base URL.
    pub metadata_endpoint: Option<String>,
    /// SMTP server host:port.
    pub smtp_host: Option<String>,
    /// SMTP username.
    pub smtp_user: Option<String>,
    /// SMTP password.
    pub smtp_password: Option<String>,
}

impl ScanConfig {
    /// Load configuration from the process environment, applying the
    /// defaults named in §6.
    pub fn from_env() -> Self {
        Self {
            scheduler_enabled: env_bool("SCAN_SCHEDULER_ENABLED", true),
            worker_concurrency: env_u32("SCAN_WORKER_CONCURRENCY", 1),
            max_object_mb: env_u32("MAX_S3_OBJECT_MB", 25),
            streaming_pdf_threshold_mb: env_u32("STREAMING_PDF_THRESHOLD_MB", 8),
            ocr_min_char_threshold: env_u32("OCR_MIN_CHAR_THRESHOLD", 100),
            warn_rss_mb: env_u32("SCAN_WARN_RSS_MB", 1500),
            pause_rss_mb: env_u32("SCAN_PAUSE_RSS_MB", 1700),
            data_dir: env_string("SCAN_DATA_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("./data")),
            object_store_prefix: env_string("SCAN_OBJECT_STORE_PREFIX")
                .unwrap_or_else(|| "planning-documents".to_string()),
            object_store_bucket: env_string("SCAN_OBJECT_STORE_BUCKET"),
            object_store_region: env_string("SCAN_OBJECT_STORE_REGION"),
            llm_endpoint: env_string("SCAN_LLM_ENDPOINT"),
            llm_api_key: env_string("SCAN_LLM_API_KEY"),
            llm_model: env_string("SCAN_LLM_MODEL").unwrap_or_else(|| "gpt-4.1-mini".to_string()),
            metadata_endpoint: env_string("SCAN_METADATA_ENDPOINT"),
            smtp_host: env_string("SCAN_SMTP_HOST"),
            smtp_user: env_string("SCAN_SMTP_USER"),
            smtp_password: env_string("SCAN_SMTP_PASSWORD"),
        }
    }

    pub fn max_object_bytes(&self) -> u64 {
        u64::from(self.max_object_mb) * 1024 * 1024
    }

    pub fn streaming_pdf_threshold_bytes(&self) -> u64 {
        u64::from(self.streaming_pdf_threshold_mb) * 1024 * 1024
    }
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            scheduler_enabled: true,
            worker_concurrency: 1,
            max_object_mb: 25,
            streaming_pdf_threshold_mb: 8,
            ocr_min_char_threshold: 100,
            warn_rss_mb: 1500,
            pause_rss_mb: 1700,
            data_dir: PathBuf::from("./data"),
            object_store_prefix: "planning-documents".to_string(),
            object_store_bucket: None,
            object_store_region: None,
            llm_endpoint: None,
            llm_api_key: None,
            llm_model: "gpt-4.1-mini".to_string(),
            metadata_endpoint: None,
            smtp_host: None,
            smtp_user: None,
            smtp_password: None,
        }
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
