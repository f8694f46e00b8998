// git-cloner: repository mirror sync
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Repository and project descriptors.
//!
//! ```text
//! RepositoryEntry (raw, serde)
//!        |  validate_entries()
//!        v
//! Result<RepositoryDescriptor, ValidationError>   one per entry, in order
//!   owner, name, service, ref_name
//!   client   ClientInfo (display only)
//!   projects [ProjectDescriptor { path, writ, options }]
//! ```
//!
//! Descriptors are immutable once built. Writ patterns are checked for glob
//! syntax only; nothing here matches files.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::path::Path;

use crate::error::ValidationError;

/// Default ref when an entry does not name one.
pub const DEFAULT_REF_NAME: &str = "master";

// --- Raw entries ---

/// A repository entry exactly as it appears in the configuration file.
///
/// Every field is optional here so that a single malformed entry fails
/// validation on its own instead of failing the whole configuration load.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RepositoryEntry {
    pub owner: Option<String>,
    pub name: Option<String>,
    pub service: Option<String>,
    #[serde(alias = "refName", alias = "refname", skip_serializing_if = "Option::is_none")]
    pub ref_name: Option<String>,
    pub client: ClientInfo,
    pub projects: Vec<ProjectEntry>,
}

/// A project entry as it appears in the configuration file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectEntry {
    pub path: Option<String>,
    pub writ: Option<Writ>,
    pub options: ProjectOptions,
}

// --- Descriptors ---

/// Hosting service of a repository.
///
/// Each supported variant owns its clone URL strategy. Unknown tags are kept
/// as `Unsupported` so validation can name them.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub enum Service {
    #[default]
    GitHub,
    Unsupported(String),
}

impl Service {
    /// Parse a configured service tag. Matching is case-insensitive.
    #[must_use]
    pub fn from_tag(tag: &str) -> Self {
        if tag.eq_ignore_ascii_case("github") {
            Self::GitHub
        } else {
            Self::Unsupported(tag.to_string())
        }
    }

    /// Clone URL for `owner/name` under the service's web base.
    #[must_use]
    pub fn clone_url(&self, base: &str, owner: &str, name: &str) -> Option<String> {
        match self {
            Self::GitHub => Some(format!("{}/{owner}/{name}", base.trim_end_matches('/'))),
            Self::Unsupported(_) => None,
        }
    }
}

impl fmt::Display for Service {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::GitHub => f.write_str("GitHub"),
            Self::Unsupported(tag) => write!(f, "{tag} (unsupported)"),
        }
    }
}

/// Descriptive client metadata. Carried through for display only.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientInfo {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tagline: Option<String>,
}

/// One glob pattern or an ordered list of them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Writ {
    One(String),
    Many(Vec<String>),
}

impl Default for Writ {
    fn default() -> Self {
        Self::Many(Vec::new())
    }
}

impl Writ {
    /// Patterns in declaration order.
    #[must_use]
    pub fn patterns(&self) -> Vec<&str> {
        match self {
            Self::One(pattern) => vec![pattern.as_str()],
            Self::Many(patterns) => patterns.iter().map(String::as_str).collect(),
        }
    }
}

/// Flags consumed by downstream extraction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectOptions {
    #[serde(alias = "hasSources", alias = "hassources")]
    pub has_sources: bool,
    #[serde(alias = "hasMetaDescription", alias = "hasmetadescription")]
    pub has_meta_description: bool,
    #[serde(alias = "hasFrontMatter", alias = "hasfrontmatter")]
    pub has_front_matter: bool,
}

/// A documentation/source sub-path of interest within a repository.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProjectDescriptor {
    /// URL-escaped path relative to the repository root.
    pub path: String,
    pub writ: Writ,
    pub options: ProjectOptions,
}

/// A validated, immutable repository declaration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RepositoryDescriptor {
    pub owner: String,
    pub name: String,
    pub service: Service,
    pub ref_name: String,
    pub client: ClientInfo,
    pub projects: Vec<ProjectDescriptor>,
}

impl RepositoryDescriptor {
    /// `owner/name`, which also names the mirror subtree.
    #[must_use]
    pub fn slug(&self) -> String {
        format!("{}/{}", self.owner, self.name)
    }

    /// Clone URL resolved through the service strategy.
    ///
    /// Always `Some` for a validated descriptor.
    #[must_use]
    pub fn clone_url(&self, base: &str) -> Option<String> {
        self.service.clone_url(base, &self.owner, &self.name)
    }

    /// Validate a single raw entry. `index` is its position in the file.
    ///
    /// # Errors
    ///
    /// Returns a `ValidationError` if `owner`/`name` is missing or empty, the
    /// service is unsupported, a project path is absolute or a writ pattern
    /// is not a valid glob.
    pub fn from_entry(index: usize, entry: &RepositoryEntry) -> Result<Self, ValidationError> {
        let owner = required(index, "owner", entry.owner.as_deref())?;
        let name = required(index, "name", entry.name.as_deref())?;
        let repository = format!("{owner}/{name}");

        let service = entry
            .service
            .as_deref()
            .map_or(Service::GitHub, Service::from_tag);
        if let Service::Unsupported(tag) = &service {
            return Err(ValidationError::UnsupportedService {
                repository,
                service: tag.clone(),
            });
        }

        let ref_name = entry
            .ref_name
            .as_deref()
            .map(str::trim)
            .filter(|r| !r.is_empty())
            .unwrap_or(DEFAULT_REF_NAME)
            .to_string();

        let projects = entry
            .projects
            .iter()
            .map(|project| validate_project(&repository, project))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            owner,
            name,
            service,
            ref_name,
            client: entry.client.clone(),
            projects,
        })
    }
}

fn required(
    index: usize,
    field: &'static str,
    value: Option<&str>,
) -> Result<String, ValidationError> {
    let value = value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or(ValidationError::MissingField { index, field })?;

    // owner and name become directory names under the mirror root
    if value == "." || value == ".." || value.contains(['/', '\\']) {
        return Err(ValidationError::InvalidName {
            index,
            field,
            value: value.to_string(),
        });
    }
    Ok(value.to_string())
}

fn validate_project(
    repository: &str,
    project: &ProjectEntry,
) -> Result<ProjectDescriptor, ValidationError> {
    let path = project.path.clone().unwrap_or_default();
    if path.starts_with('/') || path.starts_with('\\') || Path::new(&path).is_absolute() {
        return Err(ValidationError::AbsoluteProjectPath {
            repository: repository.to_string(),
            path,
        });
    }

    let writ = project.writ.clone().unwrap_or_default();
    for pattern in writ.patterns() {
        if let Err(e) = wax::Glob::new(pattern) {
            return Err(ValidationError::InvalidWrit {
                repository: repository.to_string(),
                pattern: pattern.to_string(),
                message: e.to_string(),
            });
        }
    }

    Ok(ProjectDescriptor {
        path,
        writ,
        options: project.options,
    })
}

/// Validate all entries, preserving order.
///
/// The first occurrence of an `owner/name` pair wins; later duplicates fail
/// with `DuplicateRepository` so no two descriptors share a mirror subtree.
/// Pairs are compared case-insensitively, as GitHub resolves them.
#[must_use]
pub fn validate_entries(
    entries: &[RepositoryEntry],
) -> Vec<Result<RepositoryDescriptor, ValidationError>> {
    let mut seen = BTreeSet::new();
    entries
        .iter()
        .enumerate()
        .map(|(index, entry)| {
            let descriptor = RepositoryDescriptor::from_entry(index, entry)?;
            if seen.insert(descriptor.slug().to_ascii_lowercase()) {
                Ok(descriptor)
            } else {
                Err(ValidationError::DuplicateRepository {
                    repository: descriptor.slug(),
                })
            }
        })
        .collect()
}
