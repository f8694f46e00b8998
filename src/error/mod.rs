// git-cloner: repository mirror sync
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Error handling module.
//!
//! ```text
//!             ClonerError (~24 bytes)
//!                     |
//!   +--------+--------+--------+--------+
//!   |        |        |        |        |
//!   v        v        v        v        v
//! Config  Validation Remote  Mirror
//!  Box      Box       Box     Box
//!
//! Sub-errors (unboxed internally):
//!   Config     NotFound, ReadError, ParseError, InvalidValue
//!   Validation MissingField, UnsupportedService, InvalidWrit, ...
//!   Remote     Unavailable, Rejected, RefNotFound, MalformedResponse
//!   Mirror     CloneFailed, NotARepository, DivergedMirror, ...
//!
//! FailureKind: flat, serializable tag for the per-repository report.
//! ```

use serde::Serialize;
use thiserror::Error;

/// Convenience alias for `anyhow::Result`.
pub type Result<T> = anyhow::Result<T>;

/// Top-level application error type.
///
/// All sub-errors are boxed to keep this enum at ~24 bytes on the stack.
#[derive(Debug, Error)]
pub enum ClonerError {
    /// Configuration error.
    #[error("config error: {0}")]
    Config(#[from] Box<ConfigError>),

    /// Repository descriptor failed validation.
    #[error("validation error: {0}")]
    Validation(#[from] Box<ValidationError>),

    /// Remote metadata query failed.
    #[error("remote error: {0}")]
    Remote(#[from] Box<RemoteError>),

    /// Local mirror operation failed.
    #[error("mirror error: {0}")]
    Mirror(#[from] Box<MirrorError>),
}

macro_rules! impl_from_boxed {
    ($($error:ty => $variant:ident),+ $(,)?) => {
        $(
            impl From<$error> for ClonerError {
                fn from(err: $error) -> Self {
                    ClonerError::$variant(Box::new(err))
                }
            }
        )+
    };
}

impl_from_boxed! {
    ConfigError => Config,
    ValidationError => Validation,
    RemoteError => Remote,
    MirrorError => Mirror,
}

impl ClonerError {
    /// Classify this error for the per-repository report.
    ///
    /// Configuration errors never reach a repository outcome; they map to
    /// `ValidationError` only so that the mapping stays total.
    #[must_use]
    pub fn kind(&self) -> FailureKind {
        match self {
            Self::Config(_) | Self::Validation(_) => FailureKind::ValidationError,
            Self::Remote(e) => e.kind(),
            Self::Mirror(e) => e.kind(),
        }
    }
}

// --- Failure classification ---

/// Flat failure classification recorded per repository.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum FailureKind {
    ValidationError,
    RemoteUnavailable,
    RefNotFound,
    MalformedResponse,
    CloneFailed,
    NotARepository,
    DivergedMirror,
    MirrorIo,
    Cancelled,
}

impl FailureKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ValidationError => "ValidationError",
            Self::RemoteUnavailable => "RemoteUnavailable",
            Self::RefNotFound => "RefNotFound",
            Self::MalformedResponse => "MalformedResponse",
            Self::CloneFailed => "CloneFailed",
            Self::NotARepository => "NotARepository",
            Self::DivergedMirror => "DivergedMirror",
            Self::MirrorIo => "MirrorIo",
            Self::Cancelled => "Cancelled",
        }
    }
}

impl std::fmt::Display for FailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// --- Config Errors ---

/// Configuration-related errors. All of them abort the run.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read configuration file.
    #[error("failed to read config file '{path}': {source}")]
    ReadError {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Failed to parse configuration file.
    #[error("failed to parse config file '{path}': {message}")]
    ParseError { path: String, message: String },

    /// Invalid configuration value.
    #[error("invalid value for '{key}' in section '[{section}]': {message}")]
    InvalidValue {
        section: String,
        key: String,
        message: String,
    },

    /// Configuration file not found.
    #[error("config file not found: {0}")]
    NotFound(String),
}

// --- Validation Errors ---

/// A repository or project descriptor is malformed.
///
/// Fatal for the offending descriptor only.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// Required field is absent or empty.
    #[error("repository #{index}: missing required field '{field}'")]
    MissingField { index: usize, field: &'static str },

    /// Field would not map to a single path component under the mirror root.
    #[error("repository #{index}: invalid {field} '{value}'")]
    InvalidName {
        index: usize,
        field: &'static str,
        value: String,
    },

    /// `service` names a hosting service without a URL strategy.
    #[error("{repository}: unsupported service '{service}'")]
    UnsupportedService { repository: String, service: String },

    /// Project path must be relative to the repository root.
    #[error("{repository}: project path '{path}' must be relative")]
    AbsoluteProjectPath { repository: String, path: String },

    /// Writ pattern is not a valid glob.
    #[error("{repository}: invalid writ pattern '{pattern}': {message}")]
    InvalidWrit {
        repository: String,
        pattern: String,
        message: String,
    },

    /// Same `owner/name` declared twice.
    #[error("{repository}: declared more than once")]
    DuplicateRepository { repository: String },
}

// --- Remote Errors ---

/// Remote metadata client errors.
#[derive(Debug, Error)]
pub enum RemoteError {
    /// Transport or server failure. Retryable.
    #[error("remote unavailable: {url} - {message}")]
    Unavailable { url: String, message: String },

    /// The endpoint refused the credential (HTTP 401/403).
    #[error("remote rejected the request: {url} - {message}")]
    Rejected { url: String, message: String },

    /// The ref (or the repository itself) does not exist remotely.
    #[error("ref '{ref_name}' not found on {owner}/{name}")]
    RefNotFound {
        owner: String,
        name: String,
        ref_name: String,
    },

    /// Response did not have the expected history shape.
    #[error("malformed response for {owner}/{name}: {message}")]
    MalformedResponse {
        owner: String,
        name: String,
        message: String,
    },
}

impl RemoteError {
    #[must_use]
    pub const fn kind(&self) -> FailureKind {
        match self {
            Self::Unavailable { .. } | Self::Rejected { .. } => FailureKind::RemoteUnavailable,
            Self::RefNotFound { .. } => FailureKind::RefNotFound,
            Self::MalformedResponse { .. } => FailureKind::MalformedResponse,
        }
    }

    /// Whether retrying the same request may succeed.
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        matches!(self, Self::Unavailable { .. })
    }
}

// --- Mirror Errors ---

/// Local mirror store errors.
#[derive(Debug, Error)]
pub enum MirrorError {
    /// Clone failed (network, auth, disk or timeout).
    #[error("failed to clone {url}: {message}")]
    CloneFailed { url: String, message: String },

    /// Path exists but is not a working copy.
    #[error("not a repository: {path} ({reason})")]
    NotARepository { path: String, reason: String },

    /// Local history is not an ancestor of the remote ref.
    #[error("mirror {path} has diverged from {ref_name}")]
    DivergedMirror { path: String, ref_name: String },

    /// Local history contains the remote ref plus unpushed commits.
    #[error("mirror {path} is ahead of {ref_name}")]
    LocalAhead { path: String, ref_name: String },

    /// Fetching or fast-forwarding an existing mirror failed.
    #[error("failed to update {path}: {message}")]
    FetchFailed { path: String, message: String },

    /// No `git` executable on PATH.
    #[error("git executable not found: {0}")]
    GitNotFound(String),

    /// Failed to open or read a working copy with gix.
    #[error("failed to read repository {path}: {message}")]
    Open { path: String, message: String },

    /// I/O error while probing or preparing the mirror tree.
    #[error("I/O error on '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

impl MirrorError {
    #[must_use]
    pub const fn kind(&self) -> FailureKind {
        match self {
            Self::CloneFailed { .. } | Self::GitNotFound(_) => FailureKind::CloneFailed,
            Self::NotARepository { .. } => FailureKind::NotARepository,
            Self::DivergedMirror { .. } | Self::LocalAhead { .. } => FailureKind::DivergedMirror,
            Self::FetchFailed { .. } | Self::Open { .. } | Self::Io { .. } => {
                FailureKind::MirrorIo
            }
        }
    }
}
