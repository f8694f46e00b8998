// git-cloner: repository mirror sync
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Arguments for `sync`, `list` and `config`.
//!
//! ```text
//! sync --concurrency 4   → sync.concurrency = 4
//!      --mirror-root DIR → mirror.root = DIR
//!      --insecure        → mirror.verify_tls = false
//!      --page-size N     → apollo.page_size = N
//!      --repo OWNER/NAME   filter, repeatable
//! ```

use clap::{ArgAction, Args};
use std::path::PathBuf;

/// Arguments for the `sync` command.
#[derive(Debug, Clone, Default, Args)]
pub struct SyncArgs {
    /// Only sync this repository. Can be specified multiple times.
    #[arg(short = 'r', long = "repo", value_name = "OWNER/NAME", action = ArgAction::Append)]
    pub repos: Vec<String>,

    /// Repositories processed at once.
    #[arg(short = 'j', long, value_name = "N",
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    pub concurrency: Option<u64>,

    /// Root directory of the mirror tree.
    #[arg(long = "mirror-root", value_name = "DIR")]
    pub mirror_root: Option<PathBuf>,

    /// Do not verify TLS certificates when cloning.
    #[arg(long)]
    pub insecure: bool,

    /// Commits fetched per repository.
    #[arg(long = "page-size", value_name = "N")]
    pub page_size: Option<u32>,

    /// Print the report on one line.
    #[arg(long)]
    pub compact: bool,
}

impl SyncArgs {
    /// Flags as configuration overrides.
    #[must_use]
    pub fn to_config_overrides(&self) -> Vec<(String, String)> {
        let mut overrides = Vec::new();

        if let Some(n) = self.concurrency {
            overrides.push(("sync.concurrency".to_string(), n.to_string()));
        }

        if let Some(ref root) = self.mirror_root {
            overrides.push(("mirror.root".to_string(), root.display().to_string()));
        }

        if self.insecure {
            overrides.push(("mirror.verify_tls".to_string(), "false".to_string()));
        }

        if let Some(n) = self.page_size {
            overrides.push(("apollo.page_size".to_string(), n.to_string()));
        }

        overrides
    }
}

/// Arguments for the `list` command.
#[derive(Debug, Clone, Default, Args)]
pub struct ListArgs {
    /// Print validated descriptors as JSON.
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `config` command.
#[derive(Debug, Clone, Default, Args)]
pub struct ConfigArgs {
    /// Only print the configuration file path.
    #[arg(long)]
    pub path: bool,
}
