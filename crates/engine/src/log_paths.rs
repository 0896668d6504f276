// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared path builders for per-entity activity log files.
//!
//! Used by both `activity_logger` (writer) and the daemon's `get_status`
//! query (reader) to construct consistent paths in the directory structure:
//!   `<logs_dir>/<job|worker|queue>/<entity_id>.log`

use std::path::{Path, PathBuf};

/// `{logs_dir}/job/{job_id}.log`
pub fn job_log_path(logs_dir: &Path, job_id: &str) -> PathBuf {
    logs_dir.join("job").join(format!("{}.log", job_id))
}

/// `{logs_dir}/worker/{worker_id}.log`
pub fn worker_log_path(logs_dir: &Path, worker_id: &str) -> PathBuf {
    logs_dir.join("worker").join(format!("{}.log", worker_id))
}

/// `{logs_dir}/queue/{queue_name}.log`
pub fn queue_log_path(logs_dir: &Path, queue_name: &str) -> PathBuf {
    logs_dir.join("queue").join(format!("{}.log", queue_name))
}

#[cfg(test)]
#[path = "log_paths_tests.rs"]
mod tests;
