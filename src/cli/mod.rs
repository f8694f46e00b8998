// git-cloner: repository mirror sync
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! CLI module for git-cloner using clap derive.
//!
//! # Command Structure
//!
//! ```text
//! git-cloner [global options] <command>
//! sync [--repo OWNER/NAME]... [-j N] [--mirror-root DIR] [--insecure]
//! list [--json]
//! config [--path]
//! version
//! ```

pub mod global;
pub mod sync;


use crate::cli::global::GlobalOptions;
use crate::cli::sync::{ConfigArgs, ListArgs, SyncArgs};
use clap::{Parser, Subcommand};

/// Mirror configured GitHub repositories locally.
#[derive(Debug, Parser)]
#[command(
    name = "git-cloner",
    author,
    version,
    about = "Mirror configured GitHub repositories locally",
    long_about = "git-cloner Copyright (C) 2026 Romeo Ahmed\n\
                  This program comes with ABSOLUTELY NO WARRANTY\n\
                  This is free software, and you are welcome to redistribute it\n\
                  under certain conditions; see LICENSE for details.\n\n\
                  Reads a list of repositories, fetches their recent commit\n\
                  history over the GitHub GraphQL API and keeps a local clone\n\
                  of each one under the mirror root.",
    after_help = "CONFIG FILES:\n\n\
                  Without --config, git-cloner looks for git-cloner.toml,\n\
                  git-cloner.config.json, git-cloner.config.yaml or\n\
                  git-cloner.config.yml in the current directory, then in each\n\
                  parent directory, then in the home directory. The first file\n\
                  found is used. GIT_CLONER_SECTION__KEY environment variables\n\
                  override file values. The access token is read from\n\
                  GITHUB_ACCESS_TOKEN unless apollo.token_env names another\n\
                  variable."
)]
pub struct Cli {
    /// Global options shared by all commands
    #[command(flatten)]
    pub global: GlobalOptions,

    /// Command to execute
    #[command(subcommand)]
    pub command: Option<Command>,
}

/// Available commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Shows the version.
    #[command(visible_alias = "-v")]
    Version,

    /// Clones or updates every configured repository.
    Sync(SyncArgs),

    /// Lists configured repositories and their projects.
    List(ListArgs),

    /// Shows the configuration file in use and the effective options.
    Config(ConfigArgs),
}

/// Parses command-line arguments.
#[must_use]
pub fn parse() -> Cli {
    Cli::parse()
}

/// Tries to parse command-line arguments, returning an error on failure.
///
/// # Errors
///
/// Returns a `clap::Error` if the arguments are invalid or if help/version information
/// was requested.
pub fn try_parse_from<I, T>(iter: I) -> Result<Cli, clap::Error>
where
    I: IntoIterator<Item = T>,
    T: Into<std::ffi::OsString> + Clone,
{
    Cli::try_parse_from(iter)
}
