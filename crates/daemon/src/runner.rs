// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Builds the worker's external collaborators from [`ScanConfig`] and
//! drives the background scheduler-tick + queue-lease + run loop (C8/C9,
//! §4.8, §4.9) that turns due and manually-triggered jobs into completed
//! runs without any operator attention.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use tracing::{error, info, warn};

use scanctl_adapters::email::{DeliveryResult, EmailError, MatchBatch, ProgressUpdate, RunSummary};
use scanctl_adapters::{
    CompositeTextExtractor, DocxTextExtractor, EmailDispatcher, HttpLlmClassifier,
    HttpMetadataClient, NoOpEmailDispatcher, OcrService, PdfTextExtractor, S3DocumentFetcher,
    S3ObjectStoreLister, SmtpEmailDispatcher, TesseractOcrService, TextExtractor,
};
use scanctl_core::{ScanConfig, Subscriber, SystemClock, UuidIdGen, WorkerId};
use scanctl_engine::{
    complete_queue_entry, expired_leases, lease_next, record_failure, run_job, run_now, tick,
    ClassifierCache, GovernorMemoryMargin, RunOutcome, SysinfoMemoryMonitor, WorkerDeps,
    WorkerLimits,
};
use scanctl_storage::{MaterializedState, Wal};

use crate::event_bus::EventBus;
use crate::job_store::StateJobStore;

/// How often the scheduler checks for due jobs and reaps dead leases.
const TICK_INTERVAL: Duration = Duration::from_secs(30);
/// Idle backoff between drain attempts when the queue is empty.
const IDLE_POLL_INTERVAL: Duration = Duration::from_millis(500);
/// Concurrent requests the object-store lister/fetcher may have in flight.
const OBJECT_STORE_CONCURRENCY: usize = 8;
/// OCR language passed to tesseract; the lexicon and LLM prompts are
/// English-only today, so there is nothing to configure this against yet.
const OCR_LANGUAGE: &str = "eng";

/// Wraps the two production email backends behind one concrete type.
/// [`EmailDispatcher`] requires `Clone`, which rules out a trait object
/// (`dyn Clone` can't be named), so `WorkerDeps<E>` needs a single
/// concrete `E` capable of being either backend depending on whether SMTP
/// is configured at startup.
#[derive(Clone)]
pub enum EmailBackend {
    Smtp(SmtpEmailDispatcher),
    NoOp(NoOpEmailDispatcher),
}

#[async_trait]
impl EmailDispatcher for EmailBackend {
    async fn send_batch(
        &self,
        subscriber: &Subscriber,
        batch: &MatchBatch,
    ) -> Result<DeliveryResult, EmailError> {
        match self {
            EmailBackend::Smtp(d) => d.send_batch(subscriber, batch).await,
            EmailBackend::NoOp(d) => d.send_batch(subscriber, batch).await,
        }
    }

    async fn send_progress(
        &self,
        admin_addr: &str,
        update: &ProgressUpdate,
    ) -> Result<DeliveryResult, EmailError> {
        match self {
            EmailBackend::Smtp(d) => d.send_progress(admin_addr, update).await,
            EmailBackend::NoOp(d) => d.send_progress(admin_addr, update).await,
        }
    }

    async fn send_summary(
        &self,
        admin_addr: &str,
        summary: &RunSummary,
    ) -> Result<DeliveryResult, EmailError> {
        match self {
            EmailBackend::Smtp(d) => d.send_summary(admin_addr, summary).await,
            EmailBackend::NoOp(d) => d.send_summary(admin_addr, summary).await,
        }
    }
}

/// Build the SMTP backend when `SCAN_SMTP_*` is fully configured, falling
/// back to a no-op dispatcher otherwise so a daemon without mail
/// configured still runs jobs — it just never delivers anything (§6).
fn build_email_backend(config: &ScanConfig) -> EmailBackend {
    let (Some(host), Some(user), Some(password)) =
        (&config.smtp_host, &config.smtp_user, &config.smtp_password)
    else {
        info!("SMTP not configured, notifications will be dropped");
        return EmailBackend::NoOp(NoOpEmailDispatcher::new());
    };

    let builder = match lettre::AsyncSmtpTransport::<lettre::Tokio1Executor>::relay(host) {
        Ok(b) => b,
        Err(e) => {
            warn!(error = %e, "failed to build SMTP transport, notifications will be dropped");
            return EmailBackend::NoOp(NoOpEmailDispatcher::new());
        }
    };
    let transport = builder
        .credentials(lettre::transport::smtp::authentication::Credentials::new(
            user.clone(),
            password.clone(),
        ))
        .build();
    EmailBackend::Smtp(SmtpEmailDispatcher::new(transport, user.clone()))
}

/// Build the object store backing the lister/fetcher: a real S3 client
/// when `SCAN_OBJECT_STORE_BUCKET`/`SCAN_OBJECT_STORE_REGION` are set,
/// otherwise an in-memory store so a daemon started without bucket
/// configuration still comes up (it will simply never see any objects).
fn build_object_store(config: &ScanConfig) -> Arc<dyn object_store::ObjectStore> {
    let (Some(bucket), Some(region)) = (&config.object_store_bucket, &config.object_store_region)
    else {
        warn!("object store bucket/region not configured, using an in-memory object store");
        return Arc::new(object_store::memory::InMemory::new());
    };

    match object_store::aws::AmazonS3Builder::from_env()
        .with_bucket_name(bucket)
        .with_region(region)
        .build()
    {
        Ok(s3) => Arc::new(s3),
        Err(e) => {
            error!(error = %e, "failed to build S3 client, using an in-memory object store");
            Arc::new(object_store::memory::InMemory::new())
        }
    }
}

/// Bind the local pdfium library for the OCR fallback. Returns `None`
/// (rather than failing startup) when no system pdfium is available —
/// the PDF extractor treats a missing OCR backend as "no OCR", not an
/// error (§4.3).
fn build_ocr() -> Option<Arc<dyn OcrService>> {
    match pdfium_render::prelude::Pdfium::bind_to_system_library() {
        Ok(bindings) => {
            let pdfium = pdfium_render::prelude::Pdfium::new(bindings);
            Some(Arc::new(TesseractOcrService::new(pdfium, OCR_LANGUAGE)) as Arc<dyn OcrService>)
        }
        Err(e) => {
            warn!(error = %e, "no system pdfium library found, OCR fallback disabled");
            None
        }
    }
}

fn build_worker_deps(config: &ScanConfig) -> WorkerDeps<EmailBackend> {
    let store = build_object_store(config);
    let lister = Arc::new(S3ObjectStoreLister::new(
        Arc::clone(&store),
        OBJECT_STORE_CONCURRENCY,
    ));
    let tmp_dir = config.data_dir.join("tmp");
    let fetcher = Arc::new(S3DocumentFetcher::new(store, tmp_dir));

    let memory = Arc::new(SysinfoMemoryMonitor::new());
    let memory_margin = Arc::new(GovernorMemoryMargin::new(
        Arc::clone(&memory),
        u64::from(config.warn_rss_mb),
    ));
    let ocr = build_ocr();
    let pdf: Box<dyn TextExtractor> = Box::new(PdfTextExtractor::new(ocr, memory_margin));
    let docx: Box<dyn TextExtractor> = Box::new(DocxTextExtractor::new());
    let extractor = Arc::new(CompositeTextExtractor::new(pdf, docx));

    let llm_endpoint = config.llm_endpoint.clone().unwrap_or_else(|| {
        warn!("SCAN_LLM_ENDPOINT not configured, classification calls will fail");
        String::new()
    });
    let llm = Arc::new(HttpLlmClassifier::new(
        llm_endpoint,
        config.llm_api_key.clone().unwrap_or_default(),
        config.llm_model.clone(),
    ));

    let metadata_endpoint = config.metadata_endpoint.clone().unwrap_or_else(|| {
        warn!("SCAN_METADATA_ENDPOINT not configured, every project's metadata will be missing");
        String::new()
    });
    let metadata = Arc::new(HttpMetadataClient::new(metadata_endpoint));

    WorkerDeps {
        lister,
        fetcher,
        extractor,
        llm,
        cache: Arc::new(ClassifierCache::new()),
        metadata,
        email: build_email_backend(config),
        memory,
    }
}

/// Owns every collaborator a job run needs and drives admission (the
/// scheduler tick and dead-lease reaping) plus draining (leasing and
/// running queue entries) on a timer. One instance per daemon process.
pub struct Runner {
    store: StateJobStore,
    wal: Arc<Mutex<Wal>>,
    deps: WorkerDeps<EmailBackend>,
    limits: WorkerLimits,
    scheduler_enabled: bool,
    worker_id: WorkerId,
}

impl Runner {
    pub fn new(
        config: &ScanConfig,
        state: Arc<Mutex<MaterializedState>>,
        event_bus: EventBus,
    ) -> Self {
        let wal = event_bus.wal();
        let store = StateJobStore::new(state, event_bus);
        let deps = build_worker_deps(config);
        let limits = WorkerLimits {
            max_object_bytes: config.max_object_bytes(),
            stream_to_disk_bytes: config.streaming_pdf_threshold_bytes(),
            max_text_chars: 10_000,
            warn_rss_mb: u64::from(config.warn_rss_mb),
            pause_rss_mb: u64::from(config.pause_rss_mb),
        };

        Self {
            store,
            wal,
            deps,
            limits,
            scheduler_enabled: config.scheduler_enabled,
            worker_id: WorkerId::new(format!("scanctld-{}", std::process::id())),
        }
    }

    /// Enqueue every job due to run at the current wall-clock time
    /// (§4.9). A no-op when `SCAN_SCHEDULER_ENABLED=false` (C9 disabled,
    /// C10 still drains whatever is already queued).
    fn run_scheduler_tick(&self) {
        if !self.scheduler_enabled {
            return;
        }
        let id_gen = UuidIdGen;
        let clock = SystemClock;
        let mut wal = self.wal.lock();
        let mut state = self.store.state.lock();
        match tick(&mut wal, &mut state, &id_gen, &clock) {
            Ok(ticked) if !ticked.is_empty() => {
                info!(count = ticked.len(), "scheduler tick enqueued jobs");
            }
            Ok(_) => {}
            Err(e) => error!(error = %e, "scheduler tick failed"),
        }
    }

    /// Requeue leases whose visibility timeout has elapsed without a
    /// completion — the worker holding them is presumed dead (§4.8).
    fn reap_expired_leases(&self) {
        let clock = SystemClock;
        let mut wal = self.wal.lock();
        let mut state = self.store.state.lock();
        let expired = expired_leases(&state, &clock);
        for id in expired {
            if let Err(e) = record_failure(&mut wal, &mut state, &clock, &id) {
                error!(error = %e, "failed to record failure for an expired lease");
            }
        }
    }

    /// Lease and run the next waiting queue entry, if any. Returns `true`
    /// if an entry was leased, so the caller can immediately check for
    /// more work instead of waiting out the idle poll interval.
    async fn drain_one(&self) -> bool {
        let entry = {
            let clock = SystemClock;
            let mut wal = self.wal.lock();
            let mut state = self.store.state.lock();
            match lease_next(&mut wal, &mut state, &clock, &self.worker_id) {
                Ok(entry) => entry,
                Err(e) => {
                    error!(error = %e, "failed to lease next queue entry");
                    return false;
                }
            }
        };
        let Some(entry) = entry else {
            return false;
        };

        let job_id = entry.payload.job_id.clone();
        let outcome = run_job(
            &self.store,
            &self.deps,
            &self.limits,
            &UuidIdGen,
            &SystemClock,
            &job_id,
            &self.worker_id,
            entry.payload.target_date,
            None,
        )
        .await;

        let mut wal = self.wal.lock();
        let mut state = self.store.state.lock();
        match outcome {
            Ok(RunOutcome::Completed { processed, matches }) => {
                info!(%job_id, processed, matches, "job run completed");
                let _ = complete_queue_entry(&mut wal, &mut state, &entry.id);
            }
            Ok(RunOutcome::Paused { processed }) => {
                info!(%job_id, processed, "job run paused by the memory governor");
                let _ = complete_queue_entry(&mut wal, &mut state, &entry.id);
                // §7 memory_pressure / §8 scenario 5: a memory-paused job is
                // re-enqueued automatically rather than waiting on an
                // operator `start`; the checkpoint already on the job
                // carries the frozen window and cursor the resumed run
                // picks up from, so `run_now`'s own target_date is unused.
                if let Err(e) = run_now(&mut wal, &mut state, &UuidIdGen, &job_id, None) {
                    error!(%job_id, error = %e, "failed to re-enqueue memory-paused job");
                }
            }
            Ok(RunOutcome::Cancelled) => {
                info!(%job_id, "job run cancelled");
                let _ = complete_queue_entry(&mut wal, &mut state, &entry.id);
            }
            Err(e) => {
                warn!(%job_id, error = %e, "job run failed, scheduling a retry");
                let clock = SystemClock;
                let _ = record_failure(&mut wal, &mut state, &clock, &entry.id);
            }
        }
        true
    }

    /// The daemon's background admission/drain loop: tick the scheduler
    /// and reap dead leases on a fixed interval, draining the queue
    /// between ticks until it runs dry. Exits once `shutdown` reports
    /// true.
    pub async fn run(self: Arc<Self>, mut shutdown: tokio::sync::watch::Receiver<bool>) {
        let tick_interval = crate::env::tick_interval_ms().unwrap_or(TICK_INTERVAL);
        let mut ticker = tokio::time::interval(tick_interval);
        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    self.run_scheduler_tick();
                    self.reap_expired_leases();
                }
                _ = shutdown.changed() => {
                    if *shutdown.borrow() {
                        info!("runner loop exiting");
                        return;
                    }
                }
                _ = tokio::time::sleep(IDLE_POLL_INTERVAL) => {}
            }

            while self.drain_one().await {
                if *shutdown.borrow() {
                    return;
                }
            }
        }
    }
}
