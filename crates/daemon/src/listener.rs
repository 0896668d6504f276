// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Unix-socket IPC listener: accepts one connection per request, decodes a
//! [`Request`], dispatches it against the shared state, and writes back a
//! [`Response`] (§6's job-control surface, wire format in `protocol_wire`).

use std::sync::Arc;
use std::time::Instant;

use parking_lot::Mutex;
use tokio::net::{UnixListener, UnixStream};
use tracing::{debug, error, info};

use scanctl_core::{
    JobStatus, QueueEntry, ScanEvent, ScanJobId, Subscriber, SubscriberFilters, SubscriberId,
    UuidIdGen,
};
use scanctl_engine::run_now;
use scanctl_storage::{MaterializedState, Wal};

use crate::job_store::StateJobStore;
use crate::protocol::{
    self, JobDetail, JobSummary, ProtocolError, Query, QueueEntrySummary, Request, Response,
    StatusSummary, SubscriberSummary, DEFAULT_TIMEOUT,
};

/// Collaborators every connection handler needs. Cloning is cheap: every
/// field is an `Arc` (or a handle over one), so each accepted connection
/// gets its own owned copy to move into its task.
#[derive(Clone)]
pub struct ListenCtx {
    pub store: StateJobStore,
    pub wal: Arc<Mutex<Wal>>,
    pub start_time: Instant,
    pub shutdown: tokio::sync::watch::Sender<bool>,
}

impl ListenCtx {
    pub fn new(
        store: StateJobStore,
        wal: Arc<Mutex<Wal>>,
        start_time: Instant,
        shutdown: tokio::sync::watch::Sender<bool>,
    ) -> Self {
        Self {
            store,
            wal,
            start_time,
            shutdown,
        }
    }

    fn state(&self) -> Arc<Mutex<MaterializedState>> {
        Arc::clone(&self.store.state)
    }
}

/// Accepts connections on the daemon's Unix socket and spawns one task per
/// connection so a slow CLI client never blocks another.
pub struct Listener {
    socket: UnixListener,
    ctx: ListenCtx,
}

impl Listener {
    pub fn new(socket: UnixListener, ctx: ListenCtx) -> Self {
        Self { socket, ctx }
    }

    pub async fn run(self) {
        loop {
            match self.socket.accept().await {
                Ok((stream, _)) => {
                    let ctx = self.ctx.clone();
                    tokio::spawn(async move {
                        if let Err(e) = handle_connection(stream, &ctx).await {
                            error!("connection error: {}", e);
                        }
                    });
                }
                Err(e) => error!("accept error: {}", e),
            }
        }
    }
}

async fn handle_connection(stream: UnixStream, ctx: &ListenCtx) -> Result<(), ProtocolError> {
    let (mut reader, mut writer) = stream.into_split();
    let request = protocol::read_request(&mut reader, DEFAULT_TIMEOUT).await?;
    match &request {
        Request::Query { query } => debug!(?query, "handling query"),
        other => info!(?other, "handling request"),
    }
    let response = handle_request(request, ctx);
    protocol::write_response(&mut writer, &response, DEFAULT_TIMEOUT).await?;
    Ok(())
}

fn handle_request(request: Request, ctx: &ListenCtx) -> Response {
    match request {
        Request::Ping => Response::Pong,
        Request::Hello { version: _ } => Response::Hello {
            version: protocol::PROTOCOL_VERSION.to_string(),
        },
        Request::Status => handle_status(ctx),
        Request::Shutdown => {
            let _ = ctx.shutdown.send(true);
            Response::ShuttingDown
        }
        Request::Query { query } => handle_query(ctx, query),
        Request::JobCreate {
            id,
            document_type,
            config,
            schedule,
            customers,
            paused,
        } => handle_job_create(ctx, id, document_type, config, schedule, customers, paused),
        Request::JobStart { id } => {
            handle_simple_event(ctx, &id, |id: ScanJobId| ScanEvent::JobResumed { id })
        }
        Request::JobStop { id } => {
            handle_simple_event(ctx, &id, |id: ScanJobId| ScanEvent::JobStopped { id })
        }
        Request::JobCancel { id } => handle_job_cancel(ctx, id),
        Request::JobRunNow { id, target_date } => handle_job_run_now(ctx, id, target_date),
        Request::JobSetTargetDate { id, target_date } => handle_simple_event(ctx, &id, {
            move |id: ScanJobId| ScanEvent::JobScheduleUpdated { id, target_date }
        }),
        Request::JobDelete { id } => handle_job_delete(ctx, id),
        Request::SubscriberUpsert {
            id,
            email,
            name,
            subscribed_types,
            allowed_regions,
            allowed_sectors,
        } => handle_subscriber_upsert(
            ctx,
            id,
            email,
            name,
            subscribed_types,
            allowed_regions,
            allowed_sectors,
        ),
        Request::SubscriberDeactivate { id } => {
            handle_simple_event(ctx, &id, |id: SubscriberId| ScanEvent::SubscriberDeactivated { id })
        }
    }
}

fn handle_status(ctx: &ListenCtx) -> Response {
    let state = ctx.state();
    let state = state.lock();
    let jobs_total = state.jobs.len();
    let jobs_running = state
        .jobs
        .values()
        .filter(|j| j.status == JobStatus::Running)
        .count();
    let jobs_paused = state
        .jobs
        .values()
        .filter(|j| j.status == JobStatus::Paused)
        .count();
    let jobs_error = state
        .jobs
        .values()
        .filter(|j| j.status == JobStatus::Error)
        .count();
    let queue_waiting = state
        .queue_entries
        .values()
        .filter(|q| q.status == scanctl_core::QueueEntryStatus::Waiting)
        .count();
    let queue_active = state
        .queue_entries
        .values()
        .filter(|q| q.status == scanctl_core::QueueEntryStatus::Active)
        .count();

    Response::Status(StatusSummary {
        uptime_secs: ctx.start_time.elapsed().as_secs(),
        jobs_total,
        jobs_running,
        jobs_paused,
        jobs_error,
        queue_waiting,
        queue_active,
    })
}

fn handle_query(ctx: &ListenCtx, query: Query) -> Response {
    let state = ctx.state();
    let state = state.lock();
    match query {
        Query::ListJobs => Response::Jobs {
            jobs: state
                .jobs
                .values()
                .map(|job| JobSummary {
                    id: job.id.as_str().to_string(),
                    document_type: job.document_type,
                    status: job.status,
                    processed_count: job.checkpoint.as_ref().map(|c| c.processed_count),
                    total_documents: job.checkpoint.as_ref().map(|c| c.total_documents),
                    matches_found: job.checkpoint.as_ref().map(|c| c.matches_found),
                })
                .collect(),
        },
        Query::GetJob { id } => {
            let job_id = ScanJobId::new(id);
            match state.get_job(&job_id) {
                Some(job) => Response::Job(JobDetail {
                    id: job.id.as_str().to_string(),
                    document_type: job.document_type,
                    status: job.status,
                    config: job.config.clone(),
                    schedule: job.schedule.clone(),
                    checkpoint: job.checkpoint.clone(),
                    statistics: job.statistics.clone(),
                    customers: job.customers.iter().map(|c| c.as_str().to_string()).collect(),
                    error: job.error.clone(),
                }),
                None => Response::JobNotFound,
            }
        }
        Query::GetQueueEntry { job_id } => {
            let job_key = QueueEntry::job_key_for(&ScanJobId::new(job_id));
            let summary = state
                .active_queue_entry_for_key(&job_key)
                .map(|entry| QueueEntrySummary {
                    id: entry.id.as_str().to_string(),
                    status: format!("{:?}", entry.status).to_lowercase(),
                    attempts: entry.attempts,
                });
            Response::QueueEntry(summary)
        }
        Query::ListSubscribers => Response::Subscribers {
            subscribers: state
                .subscribers
                .values()
                .map(|sub| SubscriberSummary {
                    id: sub.id.as_str().to_string(),
                    email: sub.email.clone(),
                    name: sub.name.clone(),
                    active: sub.active,
                    subscribed_types: sub.subscribed_types.clone(),
                    email_count: sub.email_count,
                })
                .collect(),
        },
    }
}

/// Applies a single event keyed by job/subscriber id, translating the
/// `Request`'s string id into the right newtype inline at the call site.
fn handle_simple_event<F, I>(ctx: &ListenCtx, id: &str, build: F) -> Response
where
    F: FnOnce(I) -> ScanEvent,
    I: From<String>,
{
    let event = build(I::from(id.to_string()));
    match ctx.store.apply_sync(event) {
        Ok(()) => Response::Ok,
        Err(e) => Response::Error {
            message: e.to_string(),
        },
    }
}

fn handle_job_create(
    ctx: &ListenCtx,
    id: String,
    document_type: scanctl_core::ReportType,
    config: scanctl_core::ScanJobConfig,
    schedule: scanctl_core::Schedule,
    customers: Vec<String>,
    paused: bool,
) -> Response {
    let job_id = ScanJobId::new(id.clone());
    if ctx.state().lock().get_job(&job_id).is_some() {
        return Response::Error {
            message: format!("job {id} already exists"),
        };
    }

    // `ScanEvent::JobCreated` carries no status field (replay always starts
    // a job `Active`); honoring the caller's `paused` flag means following
    // the create event with a stop, the same as an operator creating a job
    // and immediately stopping it.
    let create = ScanEvent::JobCreated {
        id: job_id.clone(),
        document_type,
        config,
        schedule,
        customers: customers.into_iter().map(SubscriberId::new).collect(),
    };
    if let Err(e) = ctx.store.apply_sync(create) {
        return Response::Error {
            message: e.to_string(),
        };
    }
    if paused {
        if let Err(e) = ctx.store.apply_sync(ScanEvent::JobStopped { id: job_id }) {
            return Response::Error {
                message: e.to_string(),
            };
        }
    }
    Response::Ok
}

fn handle_job_cancel(ctx: &ListenCtx, id: String) -> Response {
    let job_id = ScanJobId::new(id);
    let status = ctx.state().lock().get_job(&job_id).map(|j| j.status);
    match status {
        None => Response::JobNotFound,
        Some(JobStatus::Running) => {
            match ctx.store.apply_sync(ScanEvent::JobCancelling { id: job_id }) {
                Ok(()) => Response::Ok,
                Err(e) => Response::Error {
                    message: e.to_string(),
                },
            }
        }
        Some(_) => Response::Error {
            message: "job is not currently running".to_string(),
        },
    }
}

fn handle_job_run_now(ctx: &ListenCtx, id: String, target_date: Option<chrono::NaiveDate>) -> Response {
    let job_id = ScanJobId::new(id);
    let id_gen = UuidIdGen;
    let mut wal = ctx.wal.lock();
    let state = ctx.state();
    let mut state = state.lock();
    if state.get_job(&job_id).is_none() {
        return Response::JobNotFound;
    }
    match run_now(&mut wal, &mut state, &id_gen, &job_id, target_date) {
        Ok(_entry) => Response::Ok,
        Err(e) => Response::Error {
            message: e.to_string(),
        },
    }
}

fn handle_job_delete(ctx: &ListenCtx, id: String) -> Response {
    let job_id = ScanJobId::new(id);
    let mut wal = ctx.wal.lock();
    let state = ctx.state();
    let mut state = state.lock();
    if state.get_job(&job_id).is_none() {
        return Response::JobNotFound;
    }

    // Withdraw any in-flight queue entry first so a worker that later tries
    // to lease it doesn't find a queue entry pointing at a deleted job.
    let job_key = QueueEntry::job_key_for(&job_id);
    if let Some(entry) = state.active_queue_entry_for_key(&job_key) {
        let entry_id = entry.id.clone();
        if let Err(e) = scanctl_engine::drop_entry(&mut wal, &mut state, &entry_id) {
            return Response::Error {
                message: e.to_string(),
            };
        }
    }

    let event = ScanEvent::JobDeleted { id: job_id };
    wal.append(&event).ok();
    state.apply_event(&event);
    Response::Ok
}

fn handle_subscriber_upsert(
    ctx: &ListenCtx,
    id: String,
    email: String,
    name: String,
    subscribed_types: std::collections::HashSet<scanctl_core::ReportType>,
    allowed_regions: std::collections::HashSet<String>,
    allowed_sectors: std::collections::HashSet<String>,
) -> Response {
    let sub_id = SubscriberId::new(id);
    let existing = ctx.state().lock().get_subscriber(&sub_id).cloned();

    let subscriber = Subscriber {
        id: sub_id,
        email,
        name,
        subscribed_types,
        filters: SubscriberFilters {
            allowed_regions,
            allowed_sectors,
        },
        active: existing.as_ref().map(|s| s.active).unwrap_or(true),
        last_email_ts: existing.as_ref().and_then(|s| s.last_email_ts),
        email_count: existing.map(|s| s.email_count).unwrap_or(0),
    };

    match ctx
        .store
        .apply_sync(ScanEvent::SubscriberUpserted { subscriber })
    {
        Ok(()) => Response::Ok,
        Err(e) => Response::Error {
            message: e.to_string(),
        },
    }
}

#[cfg(test)]
#[path = "listener_tests.rs"]
mod tests;
