// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `scanctl job` - the §6 job-control surface.

use std::io::Write;
use std::str::FromStr;

use anyhow::{anyhow, Context, Result};
use chrono::NaiveDate;
use clap::{Args, Subcommand};

use scanctl_core::{ReportType, ScanJobConfig, Schedule, ScheduleType};
use scanctl_daemon::JobSummary;

use crate::client::DaemonClient;
use crate::color;
use crate::output::OutputFormat;
use crate::table::{Column, Table};

#[derive(Args)]
pub struct JobArgs {
    #[command(subcommand)]
    pub command: JobCommand,
}

#[derive(Subcommand)]
pub enum JobCommand {
    /// Create a new scan job
    Create {
        /// Job ID
        id: String,

        /// FI report type this job classifies for
        #[arg(long = "type")]
        document_type: String,

        /// Schedule recurrence ("daily", "weekly", "monthly", "custom")
        #[arg(long, default_value = "daily")]
        schedule_type: String,

        /// UTC time-of-day the scheduler fires at (HH:MM)
        #[arg(long, default_value = "02:00")]
        time_of_day: String,

        /// Day of week for weekly schedules (mon..sun)
        #[arg(long)]
        day_of_week: Option<String>,

        /// Lookback window in days, clamped to [1, 365]
        #[arg(long, default_value = "1")]
        lookback_days: u32,

        /// Manual-run override date (yyyy-mm-dd)
        #[arg(long)]
        target_date: Option<String>,

        /// Classifier confidence threshold
        #[arg(long, default_value = "0.7")]
        confidence_threshold: f64,

        /// Manual-review threshold
        #[arg(long, default_value = "0.5")]
        review_threshold: f64,

        /// Disable automatic processing (manual trigger only)
        #[arg(long)]
        no_auto_process: bool,

        /// Enable vision-assisted classification
        #[arg(long)]
        enable_vision: bool,

        /// Subscriber IDs to notify on a match (repeatable)
        #[arg(long = "customer")]
        customers: Vec<String>,

        /// Create the job paused instead of active
        #[arg(long)]
        paused: bool,
    },
    /// Reactivate a stopped/paused job
    Start {
        /// Job ID
        id: String,
    },
    /// Halt a job; it will not be scheduled or resumed
    Stop {
        /// Job ID
        id: String,
    },
    /// Cooperatively cancel a job's current run
    Cancel {
        /// Job ID
        id: String,
    },
    /// Trigger an out-of-band run
    RunNow {
        /// Job ID
        id: String,
        /// Scan this whole day instead of the lookback window (yyyy-mm-dd)
        #[arg(long)]
        target_date: Option<String>,
    },
    /// Set or clear a job's manual-run override date
    SetTargetDate {
        /// Job ID
        id: String,
        /// Date to set (yyyy-mm-dd)
        #[arg(long, conflicts_with = "clear")]
        date: Option<String>,
        /// Clear the override date
        #[arg(long)]
        clear: bool,
    },
    /// Delete a job
    Delete {
        /// Job ID
        id: String,
    },
    /// List jobs
    List {
        /// Filter by status (e.g. "active", "running", "paused", "error")
        #[arg(long)]
        status: Option<String>,
    },
    /// Show a job's full detail: config, schedule, checkpoint, statistics
    Status {
        /// Job ID
        id: String,
    },
}

pub async fn handle(command: JobCommand, client: &DaemonClient, format: OutputFormat) -> Result<()> {
    match command {
        JobCommand::Create {
            id,
            document_type,
            schedule_type,
            time_of_day,
            day_of_week,
            lookback_days,
            target_date,
            confidence_threshold,
            review_threshold,
            no_auto_process,
            enable_vision,
            customers,
            paused,
        } => {
            let document_type = ReportType::from_str(&document_type).map_err(|e| anyhow!(e))?;
            let schedule = Schedule {
                schedule_type: parse_schedule_type(&schedule_type)?,
                time_of_day: parse_time_of_day(&time_of_day)?,
                day_of_week: day_of_week.map(|d| parse_weekday(&d)).transpose()?,
                lookback_days: Schedule::clamp_lookback_days(lookback_days),
                target_date: target_date.map(|d| parse_date(&d)).transpose()?,
            };
            let config = ScanJobConfig {
                confidence_threshold,
                review_threshold,
                auto_process: !no_auto_process,
                enable_vision,
            };

            client
                .job_create(id.clone(), document_type, config, schedule, customers, paused)
                .await?;

            println!("Created job {id}");
        }
        JobCommand::Start { id } => {
            client.job_start(id.clone()).await?;
            println!("Started job {id}");
        }
        JobCommand::Stop { id } => {
            client.job_stop(id.clone()).await?;
            println!("Stopped job {id}");
        }
        JobCommand::Cancel { id } => {
            client.job_cancel(id.clone()).await?;
            println!("Cancelling job {id}");
        }
        JobCommand::RunNow { id, target_date } => {
            let target_date = target_date.map(|d| parse_date(&d)).transpose()?;
            client.job_run_now(id.clone(), target_date).await?;
            println!("Triggered run for job {id}");
        }
        JobCommand::SetTargetDate { id, date, clear } => {
            if !clear && date.is_none() {
                anyhow::bail!("either --date or --clear is required");
            }
            let target_date = date.map(|d| parse_date(&d)).transpose()?;
            client.job_set_target_date(id.clone(), target_date).await?;
            match target_date {
                Some(d) => println!("Set target date for job {id} to {d}"),
                None => println!("Cleared target date for job {id}"),
            }
        }
        JobCommand::Delete { id } => {
            client.job_delete(id.clone()).await?;
            println!("Deleted job {id}");
        }
        JobCommand::List { status } => {
            let mut jobs = client.list_jobs().await?;

            if let Some(ref st) = status {
                let st_lower = st.to_lowercase();
                jobs.retain(|j| format!("{:?}", j.status).to_lowercase() == st_lower);
            }

            match format {
                OutputFormat::Text => {
                    let mut out = std::io::stdout();
                    format_job_list(&mut out, &jobs);
                }
                OutputFormat::Json => {
                    println!("{}", serde_json::to_string_pretty(&jobs)?);
                }
            }
        }
        JobCommand::Status { id } => {
            let job = client.get_job(&id).await?;
            let queue_entry = client.get_queue_entry(&id).await?;

            match format {
                OutputFormat::Text => {
                    let Some(job) = job else {
                        println!("Job not found: {id}");
                        return Ok(());
                    };
                    print_job_detail(&job, queue_entry.as_ref());
                }
                OutputFormat::Json => {
                    let obj = serde_json::json!({ "job": job, "queue_entry": queue_entry });
                    println!("{}", serde_json::to_string_pretty(&obj)?);
                }
            }
        }
    }

    Ok(())
}

fn parse_schedule_type(s: &str) -> Result<ScheduleType> {
    match s.to_ascii_lowercase().as_str() {
        "daily" => Ok(ScheduleType::Daily),
        "weekly" => Ok(ScheduleType::Weekly),
        "monthly" => Ok(ScheduleType::Monthly),
        "custom" => Ok(ScheduleType::Custom),
        other => anyhow::bail!("unknown schedule type: {other}"),
    }
}

fn parse_time_of_day(s: &str) -> Result<chrono::NaiveTime> {
    chrono::NaiveTime::parse_from_str(s, "%H:%M")
        .or_else(|_| chrono::NaiveTime::parse_from_str(s, "%H:%M:%S"))
        .with_context(|| format!("invalid time-of-day '{s}', expected HH:MM"))
}

fn parse_weekday(s: &str) -> Result<chrono::Weekday> {
    chrono::Weekday::from_str(s).map_err(|_| anyhow!("invalid day-of-week: {s}"))
}

fn parse_date(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .with_context(|| format!("invalid date '{s}', expected yyyy-mm-dd"))
}

fn format_job_list(out: &mut impl Write, jobs: &[JobSummary]) {
    if jobs.is_empty() {
        let _ = writeln!(out, "No jobs");
        return;
    }

    let cols = vec![
        Column::muted("ID"),
        Column::left("TYPE"),
        Column::status("STATUS"),
        Column::right("PROCESSED"),
        Column::right("TOTAL"),
        Column::right("MATCHES"),
    ];
    let mut table = Table::new(cols);

    for j in jobs {
        table.row(vec![
            j.id.clone(),
            j.document_type.to_string(),
            format!("{:?}", j.status).to_lowercase(),
            j.processed_count.map(|n| n.to_string()).unwrap_or_else(|| "-".to_string()),
            j.total_documents.map(|n| n.to_string()).unwrap_or_else(|| "-".to_string()),
            j.matches_found.map(|n| n.to_string()).unwrap_or_else(|| "-".to_string()),
        ]);
    }

    table.render(out);
}

fn print_job_detail(job: &scanctl_daemon::JobDetail, queue_entry: Option<&scanctl_daemon::QueueEntrySummary>) {
    println!("{} {}", color::header("Job:"), job.id);
    println!("  {} {}", color::context("Type:"), job.document_type);
    println!(
        "  {} {}",
        color::context("Status:"),
        color::status(&format!("{:?}", job.status).to_lowercase())
    );
    if let Some(ref err) = job.error {
        println!("  {} {}", color::context("Error:"), err);
    }

    println!();
    println!("  {}", color::header("Schedule:"));
    println!("    {} {:?}", color::context("Type:"), job.schedule.schedule_type);
    println!("    {} {}", color::context("Time of day:"), job.schedule.time_of_day);
    if let Some(dow) = job.schedule.day_of_week {
        println!("    {} {}", color::context("Day of week:"), dow);
    }
    println!("    {} {}", color::context("Lookback days:"), job.schedule.lookback_days);
    if let Some(date) = job.schedule.target_date {
        println!("    {} {}", color::context("Target date:"), date);
    }

    println!();
    println!("  {}", color::header("Config:"));
    println!("    {} {}", color::context("Confidence threshold:"), job.config.confidence_threshold);
    println!("    {} {}", color::context("Review threshold:"), job.config.review_threshold);
    println!("    {} {}", color::context("Auto process:"), job.config.auto_process);
    println!("    {} {}", color::context("Vision enabled:"), job.config.enable_vision);

    println!();
    println!("  {}", color::header("Statistics:"));
    println!("    {} {}", color::context("Total runs:"), job.statistics.total_runs);
    println!(
        "    {} {}",
        color::context("Total documents processed:"),
        job.statistics.total_documents_processed
    );
    println!("    {} {}", color::context("Total matches:"), job.statistics.total_matches);
    if let Some(ts) = job.statistics.last_run_started_at {
        println!("    {} {}", color::context("Last run started:"), ts);
    }
    if let Some(date) = job.statistics.last_successful_run_date {
        println!("    {} {}", color::context("Last successful run:"), date);
    }

    if let Some(cp) = &job.checkpoint {
        println!();
        println!("  {}", color::header("Checkpoint:"));
        println!("    {} {}/{}", color::context("Processed:"), cp.processed_count, cp.total_documents);
        println!("    {} {}", color::context("Matches found:"), cp.matches_found);
        println!("    {} {}", color::context("Resuming:"), cp.is_resuming);
    }

    if !job.customers.is_empty() {
        println!();
        println!("  {} {}", color::header("Customers:"), job.customers.join(", "));
    }

    if let Some(entry) = queue_entry {
        println!();
        println!("  {}", color::header("Queue entry:"));
        println!("    {} {}", color::context("Status:"), color::status(&entry.status));
        println!("    {} {}", color::context("Attempts:"), entry.attempts);
    }
}

#[cfg(test)]
#[path = "job_tests.rs"]
mod tests;
