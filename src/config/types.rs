// git-cloner: repository mirror sync
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Configuration section types.
//!
//! # Config Structure
//!
//! ```text
//! Config
//!   apollo        ApiConfig     endpoint, auth header, timeouts, retries
//!   mirror        MirrorConfig  root, TLS policy, reconcile/corrupt policy
//!   sync          SyncConfig    concurrency
//!   repositories  [RepositoryEntry]
//! ```

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::credential::Credential;
use crate::error::ConfigError;

pub const DEFAULT_GRAPHQL_URI: &str = "https://api.github.com/graphql";
pub const DEFAULT_CLONE_BASE: &str = "https://github.com";
pub const DEFAULT_TOKEN_ENV: &str = "GITHUB_ACCESS_TOKEN";
pub const DEFAULT_PAGE_SIZE: u32 = 5;

/// GraphQL endpoint settings (the `apollo` block).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ApiConfig {
    /// GraphQL endpoint.
    pub uri: String,
    /// Static request headers.
    pub headers: ApiHeaders,
    /// Environment variable holding the access token.
    pub token_env: String,
    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
    /// Retries after a transient failure.
    pub retries: u32,
    /// Commits fetched per repository.
    pub page_size: u32,
    /// Web base that clone URLs are built from.
    pub clone_base: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            uri: DEFAULT_GRAPHQL_URI.to_string(),
            headers: ApiHeaders::default(),
            token_env: DEFAULT_TOKEN_ENV.to_string(),
            timeout_secs: 30,
            retries: 2,
            page_size: DEFAULT_PAGE_SIZE,
            clone_base: DEFAULT_CLONE_BASE.to_string(),
        }
    }
}

impl ApiConfig {
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Resolve the credential once, at the top level.
    ///
    /// An explicit `headers.authorization` wins. Otherwise the variable named
    /// by `token_env` is looked up through `lookup`; an empty or missing
    /// value yields an anonymous credential.
    pub fn credential<F>(&self, lookup: F) -> Credential
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(header) = self
            .headers
            .authorization
            .as_deref()
            .filter(|h| !h.trim().is_empty())
        {
            return Credential::from_header(header);
        }

        lookup(&self.token_env)
            .filter(|token| !token.trim().is_empty())
            .map_or_else(Credential::anonymous, Credential::token)
    }
}

/// Static headers sent to the GraphQL endpoint.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ApiHeaders {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub authorization: Option<String>,
}

/// What to do with a mirror that already exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ReconcilePolicy {
    /// Fetch the ref and fast-forward, failing on diverged history.
    #[default]
    FastForward,
    /// Leave the mirror untouched.
    #[serde(rename = "none")]
    Disabled,
}

impl std::str::FromStr for ReconcilePolicy {
    type Err = ConfigError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "fast-forward" | "ff" => Ok(Self::FastForward),
            "none" => Ok(Self::Disabled),
            _ => Err(ConfigError::InvalidValue {
                section: "mirror".to_string(),
                key: "reconcile".to_string(),
                message: format!("expected 'fast-forward' or 'none', got '{s}'"),
            }),
        }
    }
}

impl std::fmt::Display for ReconcilePolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::FastForward => write!(f, "fast-forward"),
            Self::Disabled => write!(f, "none"),
        }
    }
}

/// What to do with a mirror path that is not a working copy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CorruptPolicy {
    /// Fail the repository with `NotARepository`.
    #[default]
    Fail,
    /// Move the directory into quarantine and clone fresh.
    Reclone,
}

impl std::fmt::Display for CorruptPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Fail => write!(f, "fail"),
            Self::Reclone => write!(f, "reclone"),
        }
    }
}

/// Local mirror store settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MirrorConfig {
    /// Root of the `{owner}/{name}` tree.
    pub root: PathBuf,
    /// Validate TLS certificates of the clone transport.
    pub verify_tls: bool,
    /// Clone/fetch timeout in seconds.
    pub clone_timeout_secs: u64,
    /// Clone with `--depth 1`.
    pub shallow: bool,
    pub reconcile: ReconcilePolicy,
    pub on_corrupt: CorruptPolicy,
}

impl Default for MirrorConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from(".repos"),
            verify_tls: true,
            clone_timeout_secs: 600,
            shallow: false,
            reconcile: ReconcilePolicy::default(),
            on_corrupt: CorruptPolicy::default(),
        }
    }
}

impl MirrorConfig {
    #[must_use]
    pub const fn clone_timeout(&self) -> Duration {
        Duration::from_secs(self.clone_timeout_secs)
    }
}

/// Orchestrator settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SyncConfig {
    /// Repositories processed at once. 1 = strictly sequential.
    pub concurrency: usize,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self { concurrency: 1 }
    }
}
