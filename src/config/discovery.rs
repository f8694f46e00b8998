// git-cloner: repository mirror sync
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Configuration file discovery.
//!
//! ```text
//! --config PATH given?  yes -> must exist, else NotFound
//!        | no
//!        v
//! cwd, cwd/.., ..., /      first directory with a candidate wins
//!        |
//!        v
//! home directory
//!        |
//!        v
//! None (built-in defaults)
//! ```
//!
//! Candidates per directory, in order: `git-cloner.toml`,
//! `git-cloner.config.json`, `git-cloner.config.yaml`,
//! `git-cloner.config.yml`. Names match case-insensitively.

use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::error::ConfigError;

pub const CONFIG_FILE_NAMES: [&str; 4] = [
    "git-cloner.toml",
    "git-cloner.config.json",
    "git-cloner.config.yaml",
    "git-cloner.config.yml",
];

/// Resolve the configuration file to load.
///
/// # Errors
///
/// Returns `ConfigError::NotFound` if `explicit` is given but does not exist.
pub fn locate(
    explicit: Option<&Path>,
    cwd: &Path,
    home: Option<&Path>,
) -> Result<Option<PathBuf>, ConfigError> {
    if let Some(path) = explicit {
        if !path.is_file() {
            return Err(ConfigError::NotFound(path.display().to_string()));
        }
        return Ok(Some(path.to_path_buf()));
    }
    Ok(discover(cwd, home))
}

/// Search `cwd` and its ancestors, then `home`.
#[must_use]
pub fn discover(cwd: &Path, home: Option<&Path>) -> Option<PathBuf> {
    cwd.ancestors()
        .chain(home)
        .find_map(find_in_dir)
        .inspect(|path| debug!(path = %path.display(), "discovered config file"))
}

/// First candidate present in `dir`. Exact names beat case-insensitive ones.
#[must_use]
pub fn find_in_dir(dir: &Path) -> Option<PathBuf> {
    let entries = std::fs::read_dir(dir).ok()?;
    let names: Vec<String> = entries
        .filter_map(std::result::Result::ok)
        .filter(|e| e.file_type().is_ok_and(|t| t.is_file() || t.is_symlink()))
        .filter_map(|e| e.file_name().into_string().ok())
        .collect();

    for candidate in CONFIG_FILE_NAMES {
        if names.iter().any(|n| n == candidate) {
            return Some(dir.join(candidate));
        }
        if let Some(found) = names.iter().find(|n| n.eq_ignore_ascii_case(candidate)) {
            warn!(
                found = %found,
                expected = candidate,
                "config file name differs in case; this will stop matching in a future release"
            );
            return Some(dir.join(found));
        }
    }
    None
}
