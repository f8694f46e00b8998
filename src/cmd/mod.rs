// git-cloner: repository mirror sync
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Command implementations.
//!
//! ```text
//! CLI args --> config_loader() --> cmd::run_* handlers
//!   sync, list, config
//! ```

pub mod config;
pub mod list;
pub mod sync;

use std::path::Path;

use anyhow::Context;

use crate::cli::global::GlobalOptions;
use crate::config::discovery;
use crate::config::loader::ConfigLoader;
use crate::config::{Config, ENV_PREFIX};
use crate::error::{ConfigError, Result};

/// Whether a command can run without a configuration file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFile {
    /// Abort with `ConfigError::NotFound` when no file is found.
    Required,
    /// Fall back to built-in defaults.
    Optional,
}

/// Assemble the layered loader for one invocation.
///
/// `overrides` come from command flags and win over `--set`.
///
/// # Errors
///
/// Returns an error if the working directory is unavailable, `--config`
/// names a missing file, no file is found while `file` is
/// [`ConfigFile::Required`], or an override key is invalid.
pub fn config_loader(
    global: &GlobalOptions,
    overrides: &[(String, String)],
    file: ConfigFile,
) -> Result<ConfigLoader> {
    let cwd = std::env::current_dir().context("failed to read the working directory")?;
    let home = dirs::home_dir();
    config_loader_in(global, overrides, file, &cwd, home.as_deref())
}

/// [`config_loader`] with explicit search roots.
///
/// # Errors
///
/// See [`config_loader`].
pub fn config_loader_in(
    global: &GlobalOptions,
    overrides: &[(String, String)],
    file: ConfigFile,
    cwd: &Path,
    home: Option<&Path>,
) -> Result<ConfigLoader> {
    let mut loader = Config::builder();
    match discovery::locate(global.config.as_deref(), cwd, home)? {
        Some(path) => {
            tracing::debug!(path = %path.display(), "using configuration file");
            loader = loader.add_file(path);
        }
        None if file == ConfigFile::Required => {
            return Err(ConfigError::NotFound(format!(
                "none of {} in {} or its parents, or in the home directory",
                discovery::CONFIG_FILE_NAMES.join(", "),
                cwd.display()
            ))
            .into());
        }
        None => tracing::warn!("no configuration file found, using defaults"),
    }
    loader = loader.with_env_prefix(ENV_PREFIX);

    for (key, value) in global.to_config_overrides().iter().chain(overrides) {
        loader = loader.set(key, value.as_str())?;
    }
    Ok(loader)
}

/// Load and validate the configuration.
///
/// # Errors
///
/// Returns an error if the loader cannot be assembled or the configuration
/// fails to parse or validate.
pub fn load_config(
    global: &GlobalOptions,
    overrides: &[(String, String)],
    file: ConfigFile,
) -> Result<Config> {
    let config = config_loader(global, overrides, file)?.build()?;
    Ok(config)
}
