// git-cloner: repository mirror sync
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! `config` command.

use crate::cli::global::GlobalOptions;
use crate::cli::sync::ConfigArgs;
use crate::cmd::{ConfigFile, config_loader};
use crate::error::Result;

/// Print the configuration sources and, unless `--path`, the effective options.
///
/// # Errors
///
/// Returns an error if the configuration cannot be loaded.
pub fn run_config_command(args: &ConfigArgs, global: &GlobalOptions) -> Result<()> {
    let loader = config_loader(global, &[], ConfigFile::Optional)?;
    let sources = loader.format_loaded_files();

    if sources.is_empty() {
        println!("No configuration files loaded");
    } else {
        for line in &sources {
            println!("{line}");
        }
    }
    if args.path {
        return Ok(());
    }

    let config = loader.build()?;
    println!();
    for line in config.format_options() {
        println!("{line}");
    }
    Ok(())
}
