// git-cloner: repository mirror sync
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Configuration management for git-cloner.
//!
//! # Configuration Hierarchy
//!
//! ```text
//! Priority (low → high)
//! 1. defaults
//! 2. discovered or --config file (toml / json / yaml)
//! 3. GIT_CLONER_* env vars
//! 4. CLI overrides
//! ```
//!
//! # Environment Variable Mapping
//!
//! ```text
//! GIT_CLONER_SYNC__CONCURRENCY=4      → sync.concurrency = 4
//! GIT_CLONER_MIRROR__ROOT=/srv/repos  → mirror.root = "/srv/repos"
//! GIT_CLONER_APOLLO__PAGE_SIZE=10     → apollo.page_size = 10
//! ```
//!
//! # Example
//!
//! ```toml
//! [apollo]
//! uri = "https://api.github.com/graphql"
//!
//! [[repositories]]
//! owner = "acme"
//! name = "widgets"
//! ref_name = "main"
//!
//! [[repositories.projects]]
//! path = "docs"
//! writ = "**/*.md"
//! ```

pub mod discovery;
pub mod loader;
pub mod repository;
pub mod types;


use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

use crate::error::{ConfigError, ValidationError};

use loader::ConfigLoader;
use repository::{RepositoryDescriptor, RepositoryEntry, validate_entries};
use types::{ApiConfig, MirrorConfig, SyncConfig};

/// Prefix of configuration environment variables.
pub const ENV_PREFIX: &str = "GIT_CLONER";

/// Complete application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// GraphQL endpoint options.
    #[serde(alias = "api")]
    pub apollo: ApiConfig,
    /// Local mirror store options.
    pub mirror: MirrorConfig,
    /// Orchestrator options.
    pub sync: SyncConfig,
    /// Raw repository entries, validated by [`Config::descriptors`].
    pub repositories: Vec<RepositoryEntry>,
}

impl Config {
    /// Create a new configuration builder.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use git_cloner::config::Config;
    ///
    /// let config = Config::builder()
    ///     .add_file("git-cloner.toml")
    ///     .with_env_prefix("GIT_CLONER")
    ///     .build()?;
    /// # Ok::<(), git_cloner::error::ConfigError>(())
    /// ```
    #[must_use]
    pub fn builder() -> ConfigLoader {
        ConfigLoader::new()
    }

    /// Load configuration from a single file (simple API).
    ///
    /// # Errors
    ///
    /// Returns an error if the file is missing, cannot be parsed, or does not
    /// match the `Config` structure.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        Self::builder().add_file(path).build()
    }

    /// Load configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns an error if the content is not valid TOML or does not match the
    /// `Config` structure.
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        Self::builder()
            .add_str(content, config::FileFormat::Toml)
            .build()
    }

    /// Validate every repository entry, in declaration order.
    #[must_use]
    pub fn descriptors(&self) -> Vec<Result<RepositoryDescriptor, ValidationError>> {
        validate_entries(&self.repositories)
    }

    /// Format configuration options for display.
    ///
    /// The authorization header is shown as `[hidden]`. Output is ordered by
    /// key.
    #[must_use]
    pub fn format_options(&self) -> Vec<String> {
        let mut options = BTreeMap::new();
        self.format_apollo_options(&mut options);
        self.format_mirror_options(&mut options);
        options.insert(
            "sync.concurrency".to_string(),
            self.sync.concurrency.to_string(),
        );
        options.insert(
            "repositories".to_string(),
            self.repositories.len().to_string(),
        );

        let max_key_len = options.keys().map(String::len).max().unwrap_or(0);

        options
            .into_iter()
            .map(|(key, value)| format!("{key:<max_key_len$} = {value}"))
            .collect()
    }

    fn format_apollo_options(&self, options: &mut BTreeMap<String, String>) {
        let api = &self.apollo;
        options.insert("apollo.uri".into(), api.uri.clone());
        if api.headers.authorization.is_some() {
            options.insert("apollo.headers.authorization".into(), "[hidden]".into());
        }
        options.insert("apollo.token_env".into(), api.token_env.clone());
        options.insert("apollo.timeout_secs".into(), api.timeout_secs.to_string());
        options.insert("apollo.retries".into(), api.retries.to_string());
        options.insert("apollo.page_size".into(), api.page_size.to_string());
        options.insert("apollo.clone_base".into(), api.clone_base.clone());
    }

    fn format_mirror_options(&self, options: &mut BTreeMap<String, String>) {
        let mirror = &self.mirror;
        options.insert("mirror.root".into(), mirror.root.display().to_string());
        options.insert("mirror.verify_tls".into(), mirror.verify_tls.to_string());
        options.insert(
            "mirror.clone_timeout_secs".into(),
            mirror.clone_timeout_secs.to_string(),
        );
        options.insert("mirror.shallow".into(), mirror.shallow.to_string());
        options.insert("mirror.reconcile".into(), mirror.reconcile.to_string());
        options.insert("mirror.on_corrupt".into(), mirror.on_corrupt.to_string());
    }
}
