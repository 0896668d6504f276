// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

#![allow(clippy::unwrap_used)]

use super::{SubscriberArgs, SubscriberCommand};
use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "scanctl")]
struct TestCli {
    #[command(subcommand)]
    command: TestCommand,
}

#[derive(Subcommand)]
enum TestCommand {
    Subscriber(SubscriberArgs),
}

fn parse(args: &[&str]) -> SubscriberCommand {
    let cli = TestCli::parse_from(std::iter::once("scanctl").chain(args.iter().copied()));
    match cli.command {
        TestCommand::Subscriber(args) => args.command,
    }
}

#[test]
fn upsert_collects_repeated_type_flags() {
    let cmd = parse(&[
        "subscriber",
        "upsert",
        "sub-1",
        "--email",
        "a@example.com",
        "--name",
        "Alice",
        "--type",
        "flood",
        "--type",
        "acoustic",
    ]);
    match cmd {
        SubscriberCommand::Upsert {
            id,
            email,
            name,
            subscribed_types,
            allowed_regions,
            allowed_sectors,
        } => {
            assert_eq!(id, "sub-1");
            assert_eq!(email, "a@example.com");
            assert_eq!(name, "Alice");
            assert_eq!(subscribed_types, vec!["flood".to_string(), "acoustic".to_string()]);
            assert!(allowed_regions.is_empty());
            assert!(allowed_sectors.is_empty());
        }
        _ => panic!("expected Upsert"),
    }
}

#[test]
fn upsert_requires_email_and_name() {
    let result = TestCli::try_parse_from(["scanctl", "subscriber", "upsert", "sub-1"]);
    assert!(result.is_err());
}

#[test]
fn deactivate_requires_id() {
    let result = TestCli::try_parse_from(["scanctl", "subscriber", "deactivate"]);
    assert!(result.is_err());
}

#[test]
fn list_parses_with_no_args() {
    let cmd = parse(&["subscriber", "list"]);
    assert!(matches!(cmd, SubscriberCommand::List));
}
