// git-cloner: repository mirror sync
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Integration tests for CLI parsing.
//!
//! Tests the CLI module with realistic command-line argument patterns.

use clap::Parser;
use git_cloner::cli::sync::SyncArgs;
use git_cloner::cli::{Cli, Command};

// =============================================================================
// Version Command
// =============================================================================

#[test]
fn cli_version_alias() {
    let cli = Cli::try_parse_from(["git-cloner", "-v"]).unwrap();
    assert!(matches!(cli.command, Some(Command::Version)));
}

// =============================================================================
// Sync Command
// =============================================================================

#[test]
fn cli_sync_no_args() {
    let cli = Cli::try_parse_from(["git-cloner", "sync"]).unwrap();
    let Some(Command::Sync(args)) = cli.command else {
        panic!("expected sync command");
    };
    assert!(args.repos.is_empty());
    assert!(args.to_config_overrides().is_empty());
}

#[test]
fn cli_sync_insecure_only() {
    let args = SyncArgs {
        insecure: true,
        ..SyncArgs::default()
    };
    assert_eq!(
        args.to_config_overrides(),
        vec![("mirror.verify_tls".to_string(), "false".to_string())]
    );
}

#[test]
fn cli_set_requires_key_value() {
    let err = Cli::try_parse_from(["git-cloner", "--set", "sync.concurrency", "sync"]).unwrap_err();
    assert_eq!(err.kind(), clap::error::ErrorKind::ValueValidation);
}

#[test]
fn cli_log_options() {
    let cli = Cli::try_parse_from([
        "git-cloner",
        "--log-level",
        "4",
        "--file-log-level",
        "6",
        "--log-file",
        "logs/sync.log",
        "list",
    ])
    .unwrap();
    assert_eq!(cli.global.log_level, Some(4));
    assert_eq!(cli.global.file_log_level, Some(6));
    assert_eq!(
        cli.global.log_file.as_deref(),
        Some(std::path::Path::new("logs/sync.log"))
    );
}

#[test]
fn cli_unknown_command_fails() {
    assert!(Cli::try_parse_from(["git-cloner", "build"]).is_err());
}
