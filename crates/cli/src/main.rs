// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! scanctl - Scan Job Orchestrator CLI

mod client;
mod client_lifecycle;
mod color;
mod commands;
mod daemon_process;
mod env;
mod output;
mod table;

use output::OutputFormat;

use anyhow::Result;
use clap::{Parser, Subcommand};
use commands::{daemon, job, subscriber};

use crate::client::DaemonClient;

#[derive(Parser)]
#[command(
    name = "scanctl",
    version,
    about = "Scan Job Orchestrator - manage FI-request scanning jobs"
)]
struct Cli {
    /// Output format
    #[arg(
        short = 'o',
        long = "output",
        value_enum,
        default_value_t,
        global = true
    )]
    output: OutputFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Scan job lifecycle control (§6)
    Job(job::JobArgs),
    /// Subscriber administration
    Subscriber(subscriber::SubscriberArgs),
    /// Daemon process management
    Daemon(daemon::DaemonArgs),
}

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("Error: {}", format_error(&e));
        std::process::exit(1);
    }
}

/// Format an anyhow error, deduplicating the chain.
///
/// If the top-level Display already contains the source error text, skip
/// the "Caused by" chain to avoid noisy duplicate output (common with
/// thiserror variants using `#[error("... {0}")]` and `#[from]`).
fn format_error(err: &anyhow::Error) -> String {
    let top = err.to_string();
    let chain_redundant = err
        .chain()
        .skip(1)
        .all(|cause| top.contains(&cause.to_string()));

    if chain_redundant {
        return top;
    }

    let mut buf = top;
    for (i, cause) in err.chain().skip(1).enumerate() {
        buf.push_str(&format!("\n\nCaused by:\n    {}: {}", i, cause));
    }
    buf
}

async fn run() -> Result<()> {
    let cli = Cli::parse();
    let format = cli.output;

    match cli.command {
        // Daemon lifecycle - doesn't need an existing client connection.
        Commands::Daemon(args) => daemon::daemon(args, format).await,

        Commands::Job(args) => {
            use job::JobCommand;
            let client = match &args.command {
                JobCommand::List { .. } | JobCommand::Status { .. } => DaemonClient::for_query()?,
                _ => DaemonClient::for_action()?,
            };
            job::handle(args.command, &client, format).await
        }

        Commands::Subscriber(args) => {
            use subscriber::SubscriberCommand;
            let client = match &args.command {
                SubscriberCommand::List => DaemonClient::for_query()?,
                _ => DaemonClient::for_action()?,
            };
            subscriber::handle(args.command, &client, format).await
        }
    }
}
