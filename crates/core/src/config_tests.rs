// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use serial_test::serial;

#[test]
fn defaults_match_spec() {
    let cfg = ScanConfig::default();
    assert!(cfg.scheduler_enabled);
    assert_eq!(cfg.worker_concurrency, 1);
    assert_eq!(cfg.max_object_mb, 25);
    assert_eq!(cfg.streaming_pdf_threshold_mb, 8);
    assert_eq!(cfg.ocr_min_char_threshold, 100);
    assert_eq!(cfg.warn_rss_mb, 1500);
    assert_eq!(cfg.pause_rss_mb, 1700);
}

#[test]
fn max_object_bytes_converts_megabytes() {
    let mut cfg = ScanConfig::default();
    cfg.max_object_mb = 25;
    assert_eq!(cfg.max_object_bytes(), 25 * 1024 * 1024);
}

#[test]
#[serial]
fn from_env_reads_scheduler_flag() {
    env::remove_var("SCAN_SCHEDULER_ENABLED");
    assert!(ScanConfig::from_env().scheduler_enabled);

    env::set_var("SCAN_SCHEDULER_ENABLED", "false");
    assert!(!ScanConfig::from_env().scheduler_enabled);

    env::set_var("SCAN_SCHEDULER_ENABLED", "1");
    assert!(ScanConfig::from_env().scheduler_enabled);

    env::remove_var("SCAN_SCHEDULER_ENABLED");
}

#[test]
#[serial]
fn from_env_reads_numeric_overrides() {
    env::set_var("MAX_S3_OBJECT_MB", "50");
    assert_eq!(ScanConfig::from_env().max_object_mb, 50);
    env::remove_var("MAX_S3_OBJECT_MB");
}
