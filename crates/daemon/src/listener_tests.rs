// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use scanctl_core::{ReportType, ScanJobConfig, Schedule, ScheduleType};
use scanctl_storage::Wal;
use tempfile::tempdir;

fn test_ctx() -> (ListenCtx, tempfile::TempDir) {
    let dir = tempdir().unwrap();
    let wal = Wal::open(&dir.path().join("wal.jsonl"), 0).unwrap();
    let state = Arc::new(Mutex::new(MaterializedState::new()));
    let (event_bus, _reader) = crate::event_bus::EventBus::new(wal);
    let wal_handle = event_bus.wal();
    let store = StateJobStore::new(state, event_bus);
    let (shutdown, _rx) = tokio::sync::watch::channel(false);
    let ctx = ListenCtx::new(store, wal_handle, Instant::now(), shutdown);
    (ctx, dir)
}

fn daily_schedule() -> Schedule {
    Schedule {
        schedule_type: ScheduleType::Daily,
        time_of_day: chrono::NaiveTime::from_hms_opt(6, 0, 0).unwrap(),
        day_of_week: None,
        lookback_days: 1,
        target_date: None,
    }
}

fn create_job(ctx: &ListenCtx, id: &str, paused: bool) -> Response {
    handle_request(
        Request::JobCreate {
            id: id.to_string(),
            document_type: ReportType::Acoustic,
            config: ScanJobConfig::default(),
            schedule: daily_schedule(),
            customers: vec![],
            paused,
        },
        ctx,
    )
}

#[test]
fn job_create_defaults_to_active() {
    let (ctx, _dir) = test_ctx();
    assert_eq!(create_job(&ctx, "job-1", false), Response::Ok);

    let status = ctx.state().lock().get_job(&ScanJobId::new("job-1")).unwrap().status;
    assert_eq!(status, JobStatus::Active);
}

#[test]
fn job_create_paused_stops_immediately() {
    let (ctx, _dir) = test_ctx();
    assert_eq!(create_job(&ctx, "job-1", true), Response::Ok);

    let status = ctx.state().lock().get_job(&ScanJobId::new("job-1")).unwrap().status;
    assert_eq!(status, JobStatus::Stopped);
}

#[test]
fn job_create_rejects_duplicate_id() {
    let (ctx, _dir) = test_ctx();
    create_job(&ctx, "job-1", false);
    let response = create_job(&ctx, "job-1", false);
    assert!(matches!(response, Response::Error { .. }));
}

#[test]
fn job_start_stop_round_trip() {
    let (ctx, _dir) = test_ctx();
    create_job(&ctx, "job-1", false);

    let response = handle_request(Request::JobStop { id: "job-1".to_string() }, &ctx);
    assert_eq!(response, Response::Ok);
    assert_eq!(
        ctx.state().lock().get_job(&ScanJobId::new("job-1")).unwrap().status,
        JobStatus::Stopped
    );

    let response = handle_request(Request::JobStart { id: "job-1".to_string() }, &ctx);
    assert_eq!(response, Response::Ok);
    assert_eq!(
        ctx.state().lock().get_job(&ScanJobId::new("job-1")).unwrap().status,
        JobStatus::Active
    );
}

#[test]
fn job_cancel_requires_running_job() {
    let (ctx, _dir) = test_ctx();
    create_job(&ctx, "job-1", false);

    let response = handle_request(Request::JobCancel { id: "job-1".to_string() }, &ctx);
    assert!(matches!(response, Response::Error { .. }));
}

#[test]
fn job_delete_removes_job_and_queue_entry() {
    let (ctx, _dir) = test_ctx();
    create_job(&ctx, "job-1", false);
    let run_now = handle_request(
        Request::JobRunNow {
            id: "job-1".to_string(),
            target_date: None,
        },
        &ctx,
    );
    assert_eq!(run_now, Response::Ok);

    let response = handle_request(Request::JobDelete { id: "job-1".to_string() }, &ctx);
    assert_eq!(response, Response::Ok);

    let state = ctx.state();
    let state = state.lock();
    assert!(state.get_job(&ScanJobId::new("job-1")).is_none());
    let job_key = QueueEntry::job_key_for(&ScanJobId::new("job-1"));
    assert!(state.active_queue_entry_for_key(&job_key).is_none());
}

#[test]
fn job_delete_missing_job_is_not_found() {
    let (ctx, _dir) = test_ctx();
    let response = handle_request(Request::JobDelete { id: "missing".to_string() }, &ctx);
    assert_eq!(response, Response::JobNotFound);
}

#[test]
fn subscriber_upsert_preserves_email_count_on_update() {
    let (ctx, _dir) = test_ctx();
    let upsert = |active_regions: std::collections::HashSet<String>| Request::SubscriberUpsert {
        id: "sub-1".to_string(),
        email: "ops@example.com".to_string(),
        name: "Ops Team".to_string(),
        subscribed_types: [ReportType::Acoustic].into_iter().collect(),
        allowed_regions: active_regions,
        allowed_sectors: Default::default(),
    };

    handle_request(upsert(Default::default()), &ctx);
    {
        let state = ctx.state();
        let mut state = state.lock();
        let sub = state.subscribers.get_mut(&SubscriberId::new("sub-1")).unwrap();
        sub.email_count = 3;
    }

    handle_request(upsert(["london".to_string()].into_iter().collect()), &ctx);

    let state = ctx.state();
    let state = state.lock();
    let sub = state.get_subscriber(&SubscriberId::new("sub-1")).unwrap();
    assert_eq!(sub.email_count, 3);
    assert!(sub.filters.allowed_regions.contains("london"));
}

#[test]
fn status_counts_jobs_by_state() {
    let (ctx, _dir) = test_ctx();
    create_job(&ctx, "job-1", false);
    create_job(&ctx, "job-2", true);

    let response = handle_request(Request::Status, &ctx);
    match response {
        Response::Status(summary) => {
            assert_eq!(summary.jobs_total, 2);
            assert_eq!(summary.jobs_paused, 0);
        }
        other => panic!("expected Status, got {other:?}"),
    }
}

#[test]
fn list_jobs_reports_every_known_job() {
    let (ctx, _dir) = test_ctx();
    create_job(&ctx, "job-1", false);

    let response = handle_request(
        Request::Query {
            query: Query::ListJobs,
        },
        &ctx,
    );
    match response {
        Response::Jobs { jobs } => assert_eq!(jobs.len(), 1),
        other => panic!("expected Jobs, got {other:?}"),
    }
}

#[test]
fn shutdown_request_signals_watch_channel() {
    let (ctx, _dir) = test_ctx();
    let mut rx = ctx.shutdown.subscribe();
    let response = handle_request(Request::Shutdown, &ctx);
    assert_eq!(response, Response::ShuttingDown);
    assert!(*rx.borrow_and_update());
}
