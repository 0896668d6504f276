// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Timestamp formatting shared by the activity loggers.

use chrono::Utc;

/// Current UTC time as `YYYY-MM-DDTHH:MM:SSZ`, the format every activity
/// log line is stamped with.
pub fn format_utc_now() -> String {
    Utc::now().format("%Y-%m-%dT%H:%M:%SZ").to_string()
}

#[cfg(test)]
#[path = "time_fmt_tests.rs"]
mod tests;
