// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `scanctl subscriber` - email subscriber administration.
//!
//! Not part of the §6 operator surface, but needed to populate the
//! customers a job notifies on a match.

use std::collections::HashSet;
use std::io::Write;
use std::str::FromStr;

use anyhow::{anyhow, Result};
use clap::{Args, Subcommand};

use scanctl_core::ReportType;
use scanctl_daemon::SubscriberSummary;

use crate::client::DaemonClient;
use crate::output::OutputFormat;
use crate::table::{Column, Table};

#[derive(Args)]
pub struct SubscriberArgs {
    #[command(subcommand)]
    pub command: SubscriberCommand,
}

#[derive(Subcommand)]
pub enum SubscriberCommand {
    /// Create or update a subscriber
    Upsert {
        /// Subscriber ID
        id: String,
        /// Email address
        #[arg(long)]
        email: String,
        /// Display name
        #[arg(long)]
        name: String,
        /// FI report types this subscriber wants (repeatable)
        #[arg(long = "type")]
        subscribed_types: Vec<String>,
        /// Region allow-list; empty means "no restriction" (repeatable)
        #[arg(long = "region")]
        allowed_regions: Vec<String>,
        /// Sector allow-list; empty means "no restriction" (repeatable)
        #[arg(long = "sector")]
        allowed_sectors: Vec<String>,
    },
    /// Deactivate a subscriber (stops future notifications)
    Deactivate {
        /// Subscriber ID
        id: String,
    },
    /// List subscribers
    List,
}

pub async fn handle(command: SubscriberCommand, client: &DaemonClient, format: OutputFormat) -> Result<()> {
    match command {
        SubscriberCommand::Upsert {
            id,
            email,
            name,
            subscribed_types,
            allowed_regions,
            allowed_sectors,
        } => {
            let subscribed_types: HashSet<ReportType> = subscribed_types
                .iter()
                .map(|s| ReportType::from_str(s).map_err(|e| anyhow!(e)))
                .collect::<Result<_>>()?;
            client
                .subscriber_upsert(
                    id.clone(),
                    email,
                    name,
                    subscribed_types,
                    allowed_regions.into_iter().collect(),
                    allowed_sectors.into_iter().collect(),
                )
                .await?;
            println!("Upserted subscriber {id}");
        }
        SubscriberCommand::Deactivate { id } => {
            client.subscriber_deactivate(id.clone()).await?;
            println!("Deactivated subscriber {id}");
        }
        SubscriberCommand::List => {
            let subscribers = client.list_subscribers().await?;
            match format {
                OutputFormat::Text => {
                    let mut out = std::io::stdout();
                    format_subscriber_list(&mut out, &subscribers);
                }
                OutputFormat::Json => {
                    println!("{}", serde_json::to_string_pretty(&subscribers)?);
                }
            }
        }
    }

    Ok(())
}

fn format_subscriber_list(out: &mut impl Write, subscribers: &[SubscriberSummary]) {
    if subscribers.is_empty() {
        let _ = writeln!(out, "No subscribers");
        return;
    }

    let cols = vec![
        Column::muted("ID"),
        Column::left("EMAIL"),
        Column::left("NAME"),
        Column::status("ACTIVE"),
        Column::left("TYPES"),
        Column::right("EMAILS SENT"),
    ];
    let mut table = Table::new(cols);

    for s in subscribers {
        let mut types: Vec<&str> = s.subscribed_types.iter().map(|t| t.as_str()).collect();
        types.sort_unstable();
        table.row(vec![
            s.id.clone(),
            s.email.clone(),
            s.name.clone(),
            if s.active { "active".to_string() } else { "stopped".to_string() },
            types.join(","),
            s.email_count.to_string(),
        ]);
    }

    table.render(out);
}

#[cfg(test)]
#[path = "subscriber_tests.rs"]
mod tests;
