// git-cloner: repository mirror sync
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! `list` command.

use crate::cli::sync::ListArgs;
use crate::config::Config;
use crate::config::repository::RepositoryDescriptor;
use crate::error::Result;

/// Render one descriptor with its projects, one line each.
#[must_use]
pub fn format_descriptor(descriptor: &RepositoryDescriptor) -> Vec<String> {
    let mut lines = vec![format!(
        "{} [{}] ref={}",
        descriptor.slug(),
        descriptor.service,
        descriptor.ref_name
    )];
    for project in &descriptor.projects {
        let patterns = project.writ.patterns();
        let writ = if patterns.is_empty() {
            "*".to_string()
        } else {
            patterns.join(", ")
        };
        lines.push(format!("  {} ({writ})", project.path));
    }
    lines
}

/// Print configured repositories.
///
/// Invalid entries are reported on stderr and do not stop the listing.
///
/// # Errors
///
/// Returns an error if the JSON output cannot be serialized.
pub fn run_list_command(args: &ListArgs, config: &Config) -> Result<()> {
    let mut valid = Vec::new();
    for (index, descriptor) in config.descriptors().into_iter().enumerate() {
        match descriptor {
            Ok(d) => valid.push(d),
            Err(e) => eprintln!("repositories[{index}]: {e}"),
        }
    }

    if args.json {
        println!("{}", serde_json::to_string_pretty(&valid)?);
        return Ok(());
    }

    if valid.is_empty() {
        println!("No repositories configured");
    }
    for descriptor in &valid {
        for line in format_descriptor(descriptor) {
            println!("{line}");
        }
    }
    Ok(())
}
