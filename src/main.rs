// git-cloner: repository mirror sync
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Entry point.
//!
//! ```text
//! cli::parse() --> Logging --> Command Dispatch
//!   Sync | List | Config | Version
//!             ^
//!   Ctrl-C ---+ cancels in-flight work
//! ```

use std::process::ExitCode;

use git_cloner::cli::global::GlobalOptions;
use git_cloner::cli::{self, Command};
use git_cloner::cmd::config::run_config_command;
use git_cloner::cmd::list::run_list_command;
use git_cloner::cmd::{ConfigFile, load_config};
use git_cloner::cmd::sync::run_sync_command;
use git_cloner::logging::init_logging;
use git_cloner::logging::{LogConfig, LogLevel};
use tokio_util::sync::CancellationToken;

use mimalloc::MiMalloc;

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = cli::parse();

    let log_config = build_log_config(&cli.global);
    let _log_guard = match init_logging(&log_config) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("Failed to initialize logging: {e}");
            return ExitCode::FAILURE;
        }
    };

    let cancel = CancellationToken::new();
    spawn_interrupt_handler(cancel.clone());

    dispatch_command(&cli, cancel).await
}

fn spawn_interrupt_handler(cancel: CancellationToken) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("interrupted, cancelling in-flight work");
            cancel.cancel();
        }
    });
}

fn build_log_config(global: &GlobalOptions) -> LogConfig {
    let console_level = global
        .log_level
        .and_then(LogLevel::from_u8)
        .unwrap_or(LogLevel::INFO);

    let file_level = global
        .file_log_level
        .and_then(LogLevel::from_u8)
        .unwrap_or(console_level);

    LogConfig::builder()
        .with_console_level(console_level)
        .with_file_level(file_level)
        .maybe_with_log_file(global.log_file.as_ref().map(|p| p.display().to_string()))
        .build()
}

async fn dispatch_command(cli: &cli::Cli, cancel: CancellationToken) -> ExitCode {
    let result = match &cli.command {
        Some(Command::Version) => {
            handle_version_command();
            Ok(true)
        }
        Some(Command::Sync(args)) => match load_config(
            &cli.global,
            &args.to_config_overrides(),
            ConfigFile::Required,
        ) {
            Ok(config) => run_sync_command(args, &config, cancel)
                .await
                .map(|report| report.is_success()),
            Err(e) => Err(e),
        },
        Some(Command::List(args)) => load_config(&cli.global, &[], ConfigFile::Optional)
            .and_then(|config| run_list_command(args, &config))
            .map(|()| true),
        Some(Command::Config(args)) => run_config_command(args, &cli.global).map(|()| true),
        None => {
            eprintln!("No command specified. Use --help for usage information.");
            Err(anyhow::anyhow!("No command specified"))
        }
    };

    match result {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn handle_version_command() {
    println!("{}", env!("CARGO_PKG_VERSION"));
}
