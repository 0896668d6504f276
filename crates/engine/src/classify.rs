// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The five-stage classifier cascade (C4, §4.4).
//!
//! Stages 0-2 are pure text predicates with no I/O; stages 3-5 call the
//! `LlmClassifier` seam. Every rejection and match carries its stage so
//! operators can see where a document was dropped.

use std::num::NonZeroUsize;
use std::sync::Arc;

use parking_lot::Mutex;
use sha2::{Digest, Sha256};

use lru::LruCache;
use scanctl_adapters::{estimate_pages, LlmClassifier, LlmError};
use scanctl_core::ReportType;

use crate::lexicon;

/// Default LRU bound for the classifier result cache (§4.4 "Caching").
const DEFAULT_CACHE_CAPACITY: usize = 100;
/// Stage 1 reject threshold, in estimated pages.
const MAX_ESTIMATED_PAGES: usize = 100;
/// Stage 3 only sees this many leading characters of the document.
const CHEAP_FILTER_PREFIX_CHARS: usize = 5_000;
/// Cache key is derived from only the leading slice of the document text.
const CACHE_KEY_PREFIX_CHARS: usize = 1_000;

/// Case-insensitive filename substrings that mark a document as a
/// response, decision, or grant rather than an FI request (Stage 0).
const FILENAME_REJECT_MARKERS: &[&str] = &[
    "response",
    "decision notice",
    "decision-notice",
    "grant of permission",
    "notice of decision",
    "further information response",
    "fi response",
];

/// Structural markers that identify a consultant report rather than a
/// short request letter (Stage 2).
const STRUCTURE_REJECT_MARKERS: &[&str] = &[
    "table of contents",
    "executive summary",
    "1.1 introduction",
    "this report has been prepared by",
    "prepared on behalf of",
];

/// Which cascade stage produced a decision, for operator-facing diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    FilenameReject,
    LengthReject,
    StructureReject,
    CheapPreFilter,
    FiDetection,
    ReportTypeMatch,
    /// Stage 5 returned `matches: true` but the validation quote failed
    /// post-validation against the report type's lexicon (§4.4, §7
    /// `hallucinated_quote`) — distinct from a plain `ReportTypeMatch`
    /// rejection so operators can tell "wrong type" from "quote didn't
    /// survive post-validation".
    HallucinatedQuote,
}

/// Outcome of running a document through the cascade.
#[derive(Debug, Clone, PartialEq)]
pub enum Decision {
    /// Document confirmed as a matching FI request.
    Match {
        validation_quote: String,
        confidence: f64,
    },
    /// Document rejected at the given stage.
    Rejected { stage: Stage },
}

/// Input a single call of [`classify_document`] needs.
pub struct ClassifyInput<'a> {
    pub file_name: &'a str,
    pub text: &'a str,
    pub target_type: ReportType,
    pub project_id: &'a str,
}

fn cache_key(text: &str, target_type: ReportType, project_id: &str) -> String {
    let prefix: String = text.chars().take(CACHE_KEY_PREFIX_CHARS).collect();
    let mut hasher = Sha256::new();
    hasher.update(prefix.as_bytes());
    hasher.update(b"\0");
    hasher.update(target_type.as_str().as_bytes());
    hasher.update(b"\0");
    hasher.update(project_id.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Bounded LRU cache of cascade decisions, keyed by
/// `hash(first_1000_chars ∥ report_types ∥ project_id)` (§4.4).
pub struct ClassifierCache {
    inner: Mutex<LruCache<String, Decision>>,
}

impl ClassifierCache {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CACHE_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity.max(1)).expect("capacity clamped to >= 1 above");
        Self {
            inner: Mutex::new(LruCache::new(capacity)),
        }
    }

    fn get(&self, key: &str) -> Option<Decision> {
        self.inner.lock().get(key).cloned()
    }

    fn put(&self, key: String, decision: Decision) {
        self.inner.lock().put(key, decision);
    }
}

impl Default for ClassifierCache {
    fn default() -> Self {
        Self::new()
    }
}

fn reject_by_filename(file_name: &str) -> bool {
    let lowered = file_name.to_lowercase();
    FILENAME_REJECT_MARKERS.iter().any(|m| lowered.contains(m))
}

fn reject_by_length(char_count: usize) -> bool {
    estimate_pages(char_count) > MAX_ESTIMATED_PAGES
}

fn reject_by_structure(text: &str) -> bool {
    let lowered = text.to_lowercase();
    STRUCTURE_REJECT_MARKERS.iter().any(|m| lowered.contains(m))
}

/// Run the full cascade for one document, consulting and populating
/// `cache` at the cache-key granularity (§4.4).
pub async fn classify_document(
    llm: &Arc<dyn LlmClassifier>,
    cache: &ClassifierCache,
    input: ClassifyInput<'_>,
) -> Result<Decision, LlmError> {
    if reject_by_filename(input.file_name) {
        return Ok(Decision::Rejected {
            stage: Stage::FilenameReject,
        });
    }
    if reject_by_length(input.text.chars().count()) {
        return Ok(Decision::Rejected {
            stage: Stage::LengthReject,
        });
    }
    if reject_by_structure(input.text) {
        return Ok(Decision::Rejected {
            stage: Stage::StructureReject,
        });
    }

    let key = cache_key(input.text, input.target_type, input.project_id);
    if let Some(decision) = cache.get(&key) {
        return Ok(decision);
    }

    let prefix: String = input.text.chars().take(CHEAP_FILTER_PREFIX_CHARS).collect();
    if !llm.cheap_filter(&prefix).await? {
        let decision = Decision::Rejected {
            stage: Stage::CheapPreFilter,
        };
        cache.put(key, decision.clone());
        return Ok(decision);
    }

    let fi = llm.classify_fi(input.text).await?;
    if !fi.is_fi {
        let decision = Decision::Rejected {
            stage: Stage::FiDetection,
        };
        cache.put(key, decision.clone());
        return Ok(decision);
    }

    let report_match = llm
        .classify_report_type(input.text, input.target_type.as_str())
        .await?;
    let decision = if !report_match.matches {
        Decision::Rejected {
            stage: Stage::ReportTypeMatch,
        }
    } else if lexicon::validate_quote(&report_match.validation_quote, input.target_type) {
        Decision::Match {
            validation_quote: report_match.validation_quote,
            confidence: report_match.confidence,
        }
    } else {
        Decision::Rejected {
            stage: Stage::HallucinatedQuote,
        }
    };
    cache.put(key, decision.clone());
    Ok(decision)
}

#[cfg(test)]
#[path = "classify_tests.rs"]
mod tests;
