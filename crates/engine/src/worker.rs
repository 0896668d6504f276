// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! C10 Worker & Resource Governor: the per-document loop that drives a
//! single scan job run from a leased queue entry through to completion,
//! pause, or cancellation (§4.10, §5).
//!
//! The worker never holds the job store lock across an `.await`: every
//! mutation goes through [`JobStore::apply`], implemented by the daemon as
//! a lock-mutate-unlock cycle around the shared WAL/`MaterializedState`
//! pair. This lets a concurrent `cancel` command observe and flip a job's
//! status while a run is mid-flight, which is how cooperative cancellation
//! (§5) is wired without the worker polling anything besides its own store
//! reads at each document boundary.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use thiserror::Error;
use tokio::time::{sleep, timeout};

use scanctl_adapters::email::{MatchBatch, ProgressUpdate, RunSummary};
use scanctl_adapters::extract::{DocumentFormat, DocumentSource};
use scanctl_adapters::objstore::{ContinuationToken, FetchedDocument, FetchError, ListPage, ListerError};
use scanctl_adapters::{
    DocumentFetcher, EmailDispatcher, LlmClassifier, MetadataClient, ObjectStoreLister,
    TextExtractor,
};
use scanctl_core::{
    Checkpoint, Clock, IdGen, JobStatus, MatchDetail, MatchRecord, ProjectMetadata, ReportType,
    ScanEvent, ScanJob, ScanJobId, Subscriber, WorkerId,
};

use crate::classify::{self, ClassifierCache, ClassifyInput, Decision, Stage};
use crate::error::ScanError;
use crate::memory::{MemoryMonitor, MemorySignal};
use crate::scheduler;

/// Per-document hard ceiling (§4.10, §5).
const DOCUMENT_TIMEOUT: Duration = Duration::from_secs(25);
/// Checkpoint flush cadence once past the first 100 documents of a run (§4.7).
const FLUSH_EVERY: u64 = 100;
/// Unconditional flush cadence for the first 100 documents of a run (§4.7).
const UNCONDITIONAL_FLUSH_UNTIL: u64 = 100;
/// Cooldown sleep attempted at the warn threshold (§4.10).
const WARN_COOLDOWN: Duration = Duration::from_secs(2);
/// Bound on transient-listing retries (§4.1).
const LIST_MAX_ATTEMPTS: u32 = 5;
const LIST_MAX_BACKOFF: Duration = Duration::from_secs(30);

#[derive(Debug, Error)]
pub enum WorkerError {
    #[error("job {0} not found")]
    JobNotFound(ScanJobId),
    #[error(transparent)]
    Scan(#[from] ScanError),
}

/// How a run ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    Completed { processed: u64, matches: u64 },
    Paused { processed: u64 },
    Cancelled,
}

/// The storage seam the worker mutates through. Implemented by the daemon
/// around a shared `(Wal, MaterializedState)` pair; a fake, lock-free
/// in-memory implementation backs the engine's own unit tests.
#[async_trait]
pub trait JobStore: Send + Sync {
    async fn get_job(&self, id: &ScanJobId) -> Option<ScanJob>;
    async fn subscribers_for_job(&self, id: &ScanJobId) -> Vec<Subscriber>;
    async fn pending_matches(&self, id: &ScanJobId) -> Vec<MatchRecord>;
    async fn apply(&self, event: ScanEvent) -> Result<(), WorkerError>;
}

/// The external collaborators a run needs (C1-C3, C4's LLM seam, C5's
/// metadata seam, C6). Bundled so `run_job`'s signature stays readable.
pub struct WorkerDeps<E: EmailDispatcher> {
    pub lister: Arc<dyn ObjectStoreLister>,
    pub fetcher: Arc<dyn DocumentFetcher>,
    pub extractor: Arc<dyn TextExtractor>,
    pub llm: Arc<dyn LlmClassifier>,
    pub cache: Arc<ClassifierCache>,
    pub metadata: Arc<dyn MetadataClient>,
    pub email: E,
    pub memory: Arc<dyn MemoryMonitor>,
}

/// Tunables the worker needs from [`scanctl_core::ScanConfig`], copied in
/// rather than taking the whole config so tests can set only what matters.
#[derive(Debug, Clone)]
pub struct WorkerLimits {
    pub max_object_bytes: u64,
    pub stream_to_disk_bytes: u64,
    pub max_text_chars: usize,
    pub warn_rss_mb: u64,
    pub pause_rss_mb: u64,
}

impl Default for WorkerLimits {
    fn default() -> Self {
        Self {
            max_object_bytes: 25 * 1024 * 1024,
            stream_to_disk_bytes: 8 * 1024 * 1024,
            max_text_chars: 10_000,
            warn_rss_mb: 1500,
            pause_rss_mb: 1700,
        }
    }
}

/// Extract `(project_id, filename)` from a key under `prefix`, enforcing
/// the `<prefix>/<project_id>/<filename>` layout (§4.1, §6). Keys that
/// don't match this exact shape are not documents.
fn project_and_filename(prefix: &str, key: &str) -> Option<(String, String)> {
    let rest = key.strip_prefix(prefix)?.strip_prefix('/')?;
    let mut parts = rest.splitn(2, '/');
    let project_id = parts.next()?;
    let filename = parts.next()?;
    if project_id.is_empty() || filename.is_empty() || filename.contains('/') {
        return None;
    }
    Some((project_id.to_string(), filename.to_string()))
}

fn format_for_filename(filename: &str) -> Option<DocumentFormat> {
    let lower = filename.to_ascii_lowercase();
    if lower.ends_with(".pdf") {
        Some(DocumentFormat::Pdf)
    } else if lower.ends_with(".docx") {
        Some(DocumentFormat::Docx)
    } else {
        None
    }
}

/// Whether `key`/`last_modified` is an in-scope document for this run
/// (§4.1 filtering policy): right shape, right extension, inside the
/// frozen window. Counting and processing both consult this predicate so
/// `total_documents` stays authoritative.
fn is_eligible(
    prefix: &str,
    key: &str,
    last_modified: chrono::DateTime<Utc>,
    start_ts: chrono::DateTime<Utc>,
    end_ts: chrono::DateTime<Utc>,
) -> bool {
    if last_modified < start_ts || last_modified >= end_ts {
        return false;
    }
    let Some((_, filename)) = project_and_filename(prefix, key) else {
        return false;
    };
    format_for_filename(&filename).is_some()
}

/// Count in-scope documents under `prefix` within `[start_ts, end_ts)` by
/// walking the lister from the beginning (§4.1: counting uses the same
/// predicate as processing). Independent of the processing walk's cursor.
async fn count_documents(
    lister: &Arc<dyn ObjectStoreLister>,
    prefix: &str,
    start_ts: chrono::DateTime<Utc>,
    end_ts: chrono::DateTime<Utc>,
) -> Result<u64, ScanError> {
    let mut total = 0u64;
    let mut token = None;
    loop {
        let page = list_with_retry(lister, prefix, token.clone()).await?;
        for entry in &page.entries {
            if is_eligible(prefix, &entry.key, entry.last_modified, start_ts, end_ts) {
                total += 1;
            }
        }
        tokio::task::yield_now().await;
        match page.next_token {
            Some(t) => token = Some(t),
            None => break,
        }
    }
    Ok(total)
}

async fn list_with_retry(
    lister: &Arc<dyn ObjectStoreLister>,
    prefix: &str,
    token: Option<ContinuationToken>,
) -> Result<ListPage, ScanError> {
    let mut attempt = 0u32;
    let mut backoff = Duration::from_millis(200);
    loop {
        attempt += 1;
        match lister.list_page(prefix, token.clone()).await {
            Ok(page) => return Ok(page),
            Err(ListerError::Permanent(msg)) => return Err(ScanError::TransientListing(msg)),
            Err(ListerError::Transient(msg)) => {
                if attempt >= LIST_MAX_ATTEMPTS || backoff >= LIST_MAX_BACKOFF {
                    return Err(ScanError::TransientListing(msg));
                }
                sleep(backoff).await;
                backoff = (backoff * 2).min(LIST_MAX_BACKOFF);
            }
        }
    }
}

/// Resolve the object-store prefix a job scans under. Single global prefix
/// today (§6); kept as a function so a future per-job override is a
/// one-line change.
fn object_prefix_for(_job: &ScanJob) -> String {
    "planning-documents".to_string()
}

/// Drive one job run to completion, pause, or cancellation. `triggered_by`
/// is the operator address recorded for progress/summary mail (§3.1);
/// `target_date` carries a manual run's date override (§4.9).
#[allow(clippy::too_many_arguments)]
pub async fn run_job<E: EmailDispatcher>(
    store: &dyn JobStore,
    deps: &WorkerDeps<E>,
    limits: &WorkerLimits,
    id_gen: &impl IdGen,
    clock: &impl Clock,
    job_id: &ScanJobId,
    worker_id: &WorkerId,
    target_date: Option<NaiveDate>,
    triggered_by: Option<String>,
) -> Result<RunOutcome, WorkerError> {
    let _ = (id_gen, worker_id);
    let job = store
        .get_job(job_id)
        .await
        .ok_or_else(|| WorkerError::JobNotFound(job_id.clone()))?;

    let (mut checkpoint, resuming) = match job.checkpoint.clone() {
        Some(existing) => (existing, true),
        None => {
            let today = clock.now_utc().date_naive();
            let (start, end) = scheduler::window_for(&job.schedule, target_date, today);
            (Checkpoint::new_for_window(start, end), false)
        }
    };

    let object_prefix = object_prefix_for(&job);

    let total_documents = if resuming {
        checkpoint.total_documents
    } else {
        count_documents(
            &deps.lister,
            &object_prefix,
            checkpoint.scan_start_ts,
            checkpoint.scan_end_ts,
        )
        .await?
    };
    checkpoint.total_documents = total_documents;

    store
        .apply(ScanEvent::JobRunStarted {
            id: job_id.clone(),
            scan_start_ts: checkpoint.scan_start_ts,
            scan_end_ts: checkpoint.scan_end_ts,
            total_documents,
            is_resuming: resuming,
            triggered_by: triggered_by.clone(),
        })
        .await?;

    // On resume, re-fetch the page the run was in when it last flushed (the
    // token that produced that page, not the one after it) and skip forward
    // to the last processed key within it (§4.7). A fresh run has no key to
    // skip and starts consuming immediately.
    let mut token = checkpoint.continuation_token.clone().map(ContinuationToken);
    let resume_key = if resuming {
        checkpoint.last_processed_key.clone()
    } else {
        None
    };
    let mut past_resume_point = resume_key.is_none();

    let mut failed_deliveries = 0usize;

    'paging: loop {
        checkpoint.continuation_token = token.as_ref().map(|t| t.0.clone());
        let page = list_with_retry(&deps.lister, &object_prefix, token.clone()).await?;

        for entry in &page.entries {
            if !past_resume_point {
                if resume_key.as_deref() == Some(entry.key.as_str()) {
                    past_resume_point = true;
                }
                continue;
            }

            tokio::task::yield_now().await;

            let fresh_job = store
                .get_job(job_id)
                .await
                .ok_or_else(|| WorkerError::JobNotFound(job_id.clone()))?;
            if fresh_job.status == JobStatus::Cancelling {
                store.apply(ScanEvent::JobCancelling { id: job_id.clone() }).await?;
                store.apply(ScanEvent::JobCancelled { id: job_id.clone() }).await?;
                return Ok(RunOutcome::Cancelled);
            }

            checkpoint.last_processed_key = Some(entry.key.clone());

            if !is_eligible(
                &object_prefix,
                &entry.key,
                entry.last_modified,
                checkpoint.scan_start_ts,
                checkpoint.scan_end_ts,
            ) {
                continue;
            }

            let Some((project_id, filename)) = project_and_filename(&object_prefix, &entry.key)
            else {
                continue;
            };
            checkpoint.last_processed_file = Some(filename.clone());

            let outcome = timeout(
                DOCUMENT_TIMEOUT,
                process_one(
                    deps,
                    limits,
                    job_id,
                    job.document_type,
                    &entry.key,
                    entry.size,
                    &project_id,
                    &filename,
                ),
            )
            .await;

            match outcome {
                Err(_elapsed) => { /* per-document timeout: skip, advance cursor (§7) */ }
                Ok(Err(_scan_err)) => { /* skip-class errors: advance cursor (§7) */ }
                Ok(Ok(ProcessOutcome::Match(record))) => {
                    // Accumulate on the worker's own checkpoint copy before it is
                    // cloned into the next flush event — `apply`'s mutation of
                    // the store's checkpoint does not feed back into this loop's
                    // local `checkpoint`, which is what every flush actually sends.
                    checkpoint.matches_found += 1;
                    checkpoint.all_match_details.push(MatchDetail {
                        file_name: record.file_name.clone(),
                        fi_type: record.fi_type,
                        validation_quote: record.validation_quote.clone(),
                        confidence: record.confidence,
                        ts: record.extracted_at,
                    });
                    store.apply(ScanEvent::MatchRecorded { record }).await?;
                }
                Ok(Ok(ProcessOutcome::HallucinatedQuote)) => {
                    store
                        .apply(ScanEvent::MatchDroppedHallucinatedQuote {
                            job_id: job_id.clone(),
                            object_key: entry.key.clone(),
                        })
                        .await?;
                }
                Ok(Ok(ProcessOutcome::Rejected)) => {}
            }

            checkpoint.processed_count += 1;

            let should_flush = checkpoint.processed_count <= UNCONDITIONAL_FLUSH_UNTIL
                || checkpoint.processed_count % FLUSH_EVERY == 0;

            if should_flush {
                let signal = deps.memory.signal(limits.warn_rss_mb, limits.pause_rss_mb);
                if signal == MemorySignal::Warn {
                    sleep(WARN_COOLDOWN).await;
                }

                dispatch_notifications(store, deps, job_id, &mut failed_deliveries).await?;
                store
                    .apply(ScanEvent::JobCheckpointFlushed {
                        id: job_id.clone(),
                        checkpoint: checkpoint.clone(),
                    })
                    .await?;

                if signal == MemorySignal::Pause {
                    store
                        .apply(ScanEvent::JobPaused {
                            id: job_id.clone(),
                            reason: format!(
                                "rss exceeded pause threshold ({} mb)",
                                limits.pause_rss_mb
                            ),
                        })
                        .await?;
                    return Ok(RunOutcome::Paused {
                        processed: checkpoint.processed_count,
                    });
                }
            }
        }

        match page.next_token {
            Some(t) => token = Some(t),
            None => break 'paging,
        }
    }

    dispatch_notifications(store, deps, job_id, &mut failed_deliveries).await?;
    store
        .apply(ScanEvent::JobCheckpointFlushed {
            id: job_id.clone(),
            checkpoint: checkpoint.clone(),
        })
        .await?;

    send_summary(deps, &job, &checkpoint, failed_deliveries, &triggered_by).await;

    store.apply(ScanEvent::JobCompleted { id: job_id.clone() }).await?;

    Ok(RunOutcome::Completed {
        processed: checkpoint.processed_count,
        matches: checkpoint.matches_found,
    })
}

/// How one document's cascade run came out, distinguishing a confirmed
/// match from a plain cascade rejection from a Stage 5 rejection caused
/// specifically by post-validation failing on a hallucinated quote (§4.4,
/// §7 `hallucinated_quote`) — the three are reported differently upstream.
enum ProcessOutcome {
    Match(MatchRecord),
    Rejected,
    HallucinatedQuote,
}

/// Run fetch → extract → classify for one key.
#[allow(clippy::too_many_arguments)]
async fn process_one<E: EmailDispatcher>(
    deps: &WorkerDeps<E>,
    limits: &WorkerLimits,
    job_id: &ScanJobId,
    target_type: ReportType,
    key: &str,
    head_size_hint: u64,
    project_id: &str,
    filename: &str,
) -> Result<ProcessOutcome, ScanError> {
    let format = format_for_filename(filename)
        .ok_or_else(|| ScanError::UnsupportedExtension(filename.to_string()))?;

    let head_size = deps.fetcher.head(key).await.unwrap_or(head_size_hint);
    if head_size > limits.max_object_bytes {
        return Err(ScanError::OversizeObject {
            key: key.to_string(),
            size: head_size,
            max: limits.max_object_bytes,
        });
    }

    let fetched = deps
        .fetcher
        .fetch(key, limits.max_object_bytes, limits.stream_to_disk_bytes)
        .await
        .map_err(|e| match e {
            FetchError::Oversize { size, max } => ScanError::OversizeObject {
                key: key.to_string(),
                size,
                max,
            },
            FetchError::Transient(m) => ScanError::TransientFetch(m),
            FetchError::Permanent(m) => ScanError::CorruptDocument(m),
        })?;

    // Any temporary file spilled by the fetcher is removed on every exit
    // path from this function, success or error alike (§4.2).
    let _cleanup = SpillGuard(match &fetched {
        FetchedDocument::Disk(p) => Some(p.clone()),
        FetchedDocument::Memory(_) => None,
    });

    let source = match &fetched {
        FetchedDocument::Memory(bytes) => DocumentSource::Memory(bytes.as_ref()),
        FetchedDocument::Disk(path) => DocumentSource::Disk(path.as_path()),
    };

    let extracted = deps
        .extractor
        .extract(source, format, limits.max_text_chars)
        .await
        .map_err(|e| ScanError::CorruptDocument(e.to_string()))?;

    if extracted.text.trim().is_empty() {
        return Err(ScanError::ExtractionEmpty);
    }

    let decision = classify::classify_document(
        &deps.llm,
        &deps.cache,
        ClassifyInput {
            file_name: filename,
            text: &extracted.text,
            target_type,
            project_id,
        },
    )
    .await
    .map_err(|e| ScanError::TransientLlm(e.to_string()))?;

    match decision {
        Decision::Match {
            validation_quote,
            confidence,
        } => Ok(ProcessOutcome::Match(MatchRecord {
            job_id: job_id.clone(),
            object_key: key.to_string(),
            project_id: project_id.to_string(),
            file_name: filename.to_string(),
            fi_type: target_type,
            validation_quote,
            confidence,
            extracted_at: Utc::now(),
        })),
        Decision::Rejected {
            stage: Stage::HallucinatedQuote,
        } => Ok(ProcessOutcome::HallucinatedQuote),
        Decision::Rejected { .. } => Ok(ProcessOutcome::Rejected),
    }
}

/// Removes a spilled temporary file on drop, regardless of how the
/// enclosing scope exits (§4.2).
struct SpillGuard(Option<std::path::PathBuf>);
impl Drop for SpillGuard {
    fn drop(&mut self) {
        if let Some(path) = self.0.take() {
            let _ = std::fs::remove_file(path);
        }
    }
}

/// C5 + C6: group the job's pending matches by subscriber, resolve each
/// project's metadata once, and send one batch email per subscriber
/// (§4.5, §4.6). Failed deliveries are counted for the run summary but
/// never abort the run.
async fn dispatch_notifications<E: EmailDispatcher>(
    store: &dyn JobStore,
    deps: &WorkerDeps<E>,
    job_id: &ScanJobId,
    failed_deliveries: &mut usize,
) -> Result<(), WorkerError> {
    let pending = store.pending_matches(job_id).await;
    if pending.is_empty() {
        return Ok(());
    }
    let subscribers = store.subscribers_for_job(job_id).await;
    if subscribers.is_empty() {
        return Ok(());
    }

    let mut metadata_cache: HashMap<String, Option<ProjectMetadata>> = HashMap::new();
    for record in &pending {
        if !metadata_cache.contains_key(&record.project_id) {
            let fetched = deps.metadata.get_project_metadata(&record.project_id).await;
            metadata_cache.insert(record.project_id.clone(), fetched);
        }
    }

    let grouped = crate::subscriber_matcher::group_by_subscriber(&pending, &subscribers, |pid| {
        metadata_cache.get(pid).cloned().flatten()
    });

    for (subscriber_id, enriched) in grouped {
        let Some(subscriber) = subscribers.iter().find(|s| s.id == subscriber_id) else {
            continue;
        };
        let matches: Vec<MatchRecord> = enriched.into_iter().map(|m| m.record).collect();
        let report_types: Vec<String> = matches
            .iter()
            .map(|m| m.fi_type.to_string())
            .collect::<std::collections::HashSet<_>>()
            .into_iter()
            .collect();
        let batch = MatchBatch {
            matches: matches.clone(),
            report_types,
            job_id: job_id.clone(),
            generated_at: Utc::now(),
        };
        match deps.email.send_batch(subscriber, &batch).await {
            Ok(result) if result.accepted => {
                store
                    .apply(ScanEvent::NotificationSent {
                        job_id: job_id.clone(),
                        subscriber_id: subscriber.id.clone(),
                        match_count: matches.len(),
                    })
                    .await?;
            }
            _ => *failed_deliveries += 1,
        }
    }
    Ok(())
}

async fn send_summary<E: EmailDispatcher>(
    deps: &WorkerDeps<E>,
    job: &ScanJob,
    checkpoint: &Checkpoint,
    failed_deliveries: usize,
    triggered_by: &Option<String>,
) {
    let Some(admin_addr) = triggered_by.as_deref() else {
        return;
    };
    let summary = RunSummary {
        job_name: job.id.as_str().to_string(),
        processed: checkpoint.processed_count,
        total: checkpoint.total_documents,
        matches_found: checkpoint.matches_found,
        matches: Vec::new(),
        failed_deliveries,
    };
    let _ = deps.email.send_summary(admin_addr, &summary).await;
}

/// Progress mail sent mid-run at a checkpoint flush (§4.6, §6
/// `send_progress`). Not wired into the main loop today — the fixed-cadence
/// checkpoint flush already drives subscriber notification — kept for a
/// future operator progress cadence independent of the flush cadence.
#[allow(dead_code)]
async fn send_progress<E: EmailDispatcher>(
    deps: &WorkerDeps<E>,
    job: &ScanJob,
    checkpoint: &Checkpoint,
    admin_addr: &str,
) {
    let update = ProgressUpdate {
        job_name: job.id.as_str().to_string(),
        processed: checkpoint.processed_count,
        total: checkpoint.total_documents,
        matches_found: checkpoint.matches_found,
        recent_matches: Vec::new(),
    };
    let _ = deps.email.send_progress(admin_addr, &update).await;
}

#[cfg(test)]
#[path = "worker_tests.rs"]
mod tests;
