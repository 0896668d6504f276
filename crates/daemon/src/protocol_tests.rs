// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use scanctl_core::{Schedule, ScheduleType};

fn sample_schedule() -> Schedule {
    Schedule {
        schedule_type: ScheduleType::Daily,
        time_of_day: chrono::NaiveTime::from_hms_opt(2, 0, 0).unwrap(),
        day_of_week: None,
        lookback_days: 1,
        target_date: None,
    }
}

#[test]
fn job_create_round_trips_through_json() {
    let req = Request::JobCreate {
        id: "job-1".to_string(),
        document_type: ReportType::Flood,
        config: ScanJobConfig::default(),
        schedule: sample_schedule(),
        customers: vec!["sub-1".to_string()],
        paused: false,
    };
    let bytes = encode(&req).unwrap();
    let decoded: Request = decode(&bytes).unwrap();
    assert_eq!(req, decoded);
}

#[test]
fn job_run_now_carries_optional_target_date() {
    let req = Request::JobRunNow {
        id: "job-1".to_string(),
        target_date: Some(chrono::NaiveDate::from_ymd_opt(2026, 1, 15).unwrap()),
    };
    let bytes = encode(&req).unwrap();
    let decoded: Request = decode(&bytes).unwrap();
    assert_eq!(req, decoded);
}

#[test]
fn query_tag_distinguishes_list_jobs_from_get_job() {
    let list = Request::Query { query: Query::ListJobs };
    let get = Request::Query {
        query: Query::GetJob { id: "job-1".to_string() },
    };
    assert_ne!(encode(&list).unwrap(), encode(&get).unwrap());
    assert_eq!(decode::<Request>(&encode(&list).unwrap()).unwrap(), list);
    assert_eq!(decode::<Request>(&encode(&get).unwrap()).unwrap(), get);
}

#[test]
fn response_job_not_found_round_trips() {
    let resp = Response::JobNotFound;
    let bytes = encode(&resp).unwrap();
    assert_eq!(decode::<Response>(&bytes).unwrap(), resp);
}

#[test]
fn response_status_round_trips_all_fields() {
    let resp = Response::Status(StatusSummary {
        uptime_secs: 42,
        jobs_total: 3,
        jobs_running: 1,
        jobs_paused: 1,
        jobs_error: 0,
        queue_waiting: 2,
        queue_active: 1,
    });
    let bytes = encode(&resp).unwrap();
    assert_eq!(decode::<Response>(&bytes).unwrap(), resp);
}

#[test]
fn error_response_deserializes_by_tag() {
    let json = r#"{"type":"Error","message":"job not found"}"#;
    let resp: Response = decode(json.as_bytes()).unwrap();
    assert_eq!(
        resp,
        Response::Error {
            message: "job not found".to_string()
        }
    );
}

#[test]
fn subscriber_upsert_round_trips_filter_sets() {
    let mut subscribed_types = HashSet::new();
    subscribed_types.insert(ReportType::Acoustic);
    subscribed_types.insert(ReportType::Heritage);
    let req = Request::SubscriberUpsert {
        id: "sub-1".to_string(),
        email: "a@example.com".to_string(),
        name: "Alice".to_string(),
        subscribed_types,
        allowed_regions: HashSet::new(),
        allowed_sectors: HashSet::new(),
    };
    let bytes = encode(&req).unwrap();
    assert_eq!(decode::<Request>(&bytes).unwrap(), req);
}
