// git-cloner: repository mirror sync
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Configuration loading from multiple sources.
//!
//! # Loader Pipeline
//!
//! ```text
//! ConfigLoader::new()
//!   .add_file(req)            format from extension (toml/json/yaml/yml)
//!   .add_str(content, fmt)
//!   .with_env_prefix()        GIT_CLONER_MIRROR__ROOT -> mirror.root
//!   .set()                    CLI overrides
//!        |
//!        v
//!    build() --> Config
//! ```

use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};

use config::FileFormat;

use super::Config;
use crate::error::ConfigError;

/// Maximum commits GitHub returns for a single history page.
const MAX_PAGE_SIZE: u32 = 100;

/// Builder for loading configuration from multiple sources.
pub struct ConfigLoader {
    builder: config::ConfigBuilder<config::builder::DefaultState>,
    env_prefix: Option<String>,
    env_source: Option<HashMap<String, String>>,
    required: Vec<PathBuf>,
    files: Vec<(String, PathBuf)>,
}

/// Pick the file format from the extension. Anything unrecognized is TOML.
#[must_use]
pub fn format_for(path: &Path) -> FileFormat {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);
    match ext.as_deref() {
        Some("json") => FileFormat::Json,
        Some("yaml" | "yml") => FileFormat::Yaml,
        _ => FileFormat::Toml,
    }
}

impl ConfigLoader {
    #[must_use]
    pub fn new() -> Self {
        Self {
            builder: config::Config::builder(),
            env_prefix: None,
            env_source: None,
            required: Vec::new(),
            files: Vec::new(),
        }
    }

    /// Adds a configuration file to the loader.
    ///
    /// The file is read when `build()` is called; a missing file makes
    /// `build()` fail with `ConfigError::NotFound`.
    #[must_use]
    pub fn add_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        let p = path.as_ref();
        self.builder = self
            .builder
            .add_source(config::File::from(p).format(format_for(p)).required(true));
        self.required.push(p.to_path_buf());
        self.files.push(("file".to_string(), p.to_path_buf()));
        self
    }

    #[must_use]
    pub fn add_str(mut self, content: &str, format: FileFormat) -> Self {
        self.builder = self
            .builder
            .add_source(config::File::from_str(content, format));
        self.files
            .push(("string".to_string(), PathBuf::from("<string>")));
        self
    }

    #[must_use]
    pub fn with_env_prefix(mut self, prefix: &str) -> Self {
        self.env_prefix = Some(prefix.to_string());
        self
    }

    /// Read prefixed variables from `vars` instead of the process environment.
    #[must_use]
    pub fn with_env_source(mut self, vars: HashMap<String, String>) -> Self {
        self.env_source = Some(vars);
        self
    }

    /// Sets a configuration override.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if the key is not a valid path.
    pub fn set<T: Into<config::Value>>(mut self, key: &str, value: T) -> Result<Self, ConfigError> {
        self.builder = self
            .builder
            .set_override(key, value)
            .map_err(|e| override_error(key, &e))?;
        Ok(self)
    }

    /// Builds the configuration from all added sources.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - A required configuration file is missing (`NotFound`).
    /// - A file cannot be read (`ReadError`).
    /// - A source has invalid syntax or does not match `Config` (`ParseError`).
    /// - A value is out of range (`InvalidValue`).
    pub fn build(self) -> Result<Config, ConfigError> {
        for path in &self.required {
            match path.metadata() {
                Ok(_) => {}
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                    return Err(ConfigError::NotFound(path.display().to_string()));
                }
                Err(source) => {
                    return Err(ConfigError::ReadError {
                        path: path.display().to_string(),
                        source,
                    });
                }
            }
        }

        let origin = self.origin();
        let builder = match &self.env_prefix {
            Some(prefix) => self.builder.add_source(
                config::Environment::with_prefix(prefix)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true)
                    .source(self.env_source.clone()),
            ),
            None => self.builder,
        };

        let cfg = builder.build().map_err(|e| parse_error(&origin, e))?;
        let config: Config = cfg.try_deserialize().map_err(|e| parse_error(&origin, e))?;
        validate(&config)?;
        Ok(config)
    }

    #[must_use]
    pub fn format_loaded_files(&self) -> Vec<String> {
        self.files
            .iter()
            .enumerate()
            .map(|(i, (source, path))| format!("{}. [{}] {}", i + 1, source, path.display()))
            .collect()
    }

    fn origin(&self) -> String {
        self.files
            .last()
            .map_or_else(|| "<defaults>".to_string(), |(_, p)| p.display().to_string())
    }
}

impl fmt::Debug for ConfigLoader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConfigLoader")
            .field("env_prefix", &self.env_prefix)
            .field("files", &self.files)
            .finish_non_exhaustive()
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

fn parse_error(origin: &str, err: config::ConfigError) -> ConfigError {
    match err {
        config::ConfigError::FileParse { uri, cause } => ConfigError::ParseError {
            path: uri.unwrap_or_else(|| origin.to_string()),
            message: cause.to_string(),
        },
        other => ConfigError::ParseError {
            path: origin.to_string(),
            message: other.to_string(),
        },
    }
}

fn override_error(key: &str, err: &config::ConfigError) -> ConfigError {
    let (section, key) = key.split_once('.').unwrap_or(("", key));
    ConfigError::InvalidValue {
        section: section.to_string(),
        key: key.to_string(),
        message: err.to_string(),
    }
}

fn invalid(section: &str, key: &str, message: &str) -> ConfigError {
    ConfigError::InvalidValue {
        section: section.to_string(),
        key: key.to_string(),
        message: message.to_string(),
    }
}

fn validate(config: &Config) -> Result<(), ConfigError> {
    if config.sync.concurrency == 0 {
        return Err(invalid("sync", "concurrency", "must be at least 1"));
    }
    if config.apollo.page_size > MAX_PAGE_SIZE {
        return Err(invalid(
            "apollo",
            "page_size",
            &format!("must be at most {MAX_PAGE_SIZE}"),
        ));
    }
    let uri = config.apollo.uri.trim();
    if !(uri.starts_with("http://") || uri.starts_with("https://")) {
        return Err(invalid("apollo", "uri", "must be an http(s) URL"));
    }
    if config.apollo.timeout_secs == 0 {
        return Err(invalid("apollo", "timeout_secs", "must be at least 1"));
    }
    if config.mirror.clone_timeout_secs == 0 {
        return Err(invalid("mirror", "clone_timeout_secs", "must be at least 1"));
    }
    if config.mirror.root.as_os_str().is_empty() {
        return Err(invalid("mirror", "root", "must not be empty"));
    }
    Ok(())
}
