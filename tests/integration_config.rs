// git-cloner: repository mirror sync
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Integration tests for configuration loading.
//!
//! Exercises discovery, file formats and override precedence the way the
//! binary assembles them.

use std::fs;
use std::path::PathBuf;

use git_cloner::cli::global::GlobalOptions;
use git_cloner::cmd::{ConfigFile, config_loader_in};
use git_cloner::config::Config;
use git_cloner::config::types::{CorruptPolicy, ReconcilePolicy};
use git_cloner::error::{ConfigError, ValidationError};
use tempfile::TempDir;

fn temp_dir() -> TempDir {
    tempfile::tempdir().expect("failed to create temp dir")
}

const SAMPLE: &str = r#"
[apollo]
uri = "https://graphql.example.test/graphql"
page_size = 3

[mirror]
root = "/srv/mirrors"
on_corrupt = "reclone"

[sync]
concurrency = 2

[[repositories]]
owner = "acme"
name = "widgets"
ref_name = "main"

[[repositories.projects]]
path = "docs"
writ = ["**/*.md", "guide/**"]

[[repositories]]
owner = "acme"
name = "gadgets"
"#;

// =============================================================================
// Discovery and layering
// =============================================================================

#[test]
fn config_discovered_from_ancestor_directory() {
    let dir = temp_dir();
    fs::write(dir.path().join("git-cloner.toml"), SAMPLE).unwrap();
    let nested = dir.path().join("a").join("b");
    fs::create_dir_all(&nested).unwrap();

    let loader = config_loader_in(
        &GlobalOptions::default(),
        &[],
        ConfigFile::Required,
        &nested,
        None,
    )
    .unwrap();
    assert_eq!(
        loader.format_loaded_files(),
        vec![format!("1. [file] {}", dir.path().join("git-cloner.toml").display())]
    );

    let config = loader.build().unwrap();
    assert_eq!(config.apollo.page_size, 3);
    assert_eq!(config.mirror.on_corrupt, CorruptPolicy::Reclone);
    assert_eq!(config.mirror.reconcile, ReconcilePolicy::FastForward);
    assert_eq!(config.sync.concurrency, 2);
    assert_eq!(config.repositories.len(), 2);
}

#[test]
fn config_missing_file_is_fatal_when_required() {
    let dir = temp_dir();
    let err = config_loader_in(
        &GlobalOptions::default(),
        &[],
        ConfigFile::Required,
        dir.path(),
        None,
    )
    .unwrap_err();
    assert!(matches!(
        err.downcast_ref::<ConfigError>(),
        Some(ConfigError::NotFound(_))
    ));
}

#[test]
fn config_defaults_when_optional_and_nothing_found() {
    let dir = temp_dir();
    let loader = config_loader_in(
        &GlobalOptions::default(),
        &[],
        ConfigFile::Optional,
        dir.path(),
        None,
    )
    .unwrap();
    assert!(loader.format_loaded_files().is_empty());

    let config = loader.build().unwrap();
    assert_eq!(config.apollo.uri, "https://api.github.com/graphql");
    assert_eq!(config.mirror.root, PathBuf::from(".repos"));
    assert!(config.repositories.is_empty());
}

#[test]
fn config_explicit_file_must_exist() {
    let dir = temp_dir();
    let global = GlobalOptions {
        config: Some(dir.path().join("missing.toml")),
        ..GlobalOptions::default()
    };
    let err = config_loader_in(&global, &[], ConfigFile::Optional, dir.path(), None).unwrap_err();
    assert!(matches!(
        err.downcast_ref::<ConfigError>(),
        Some(ConfigError::NotFound(_))
    ));
}

#[test]
fn config_command_flags_override_set_options() {
    let dir = temp_dir();
    let path = dir.path().join("custom.toml");
    fs::write(&path, SAMPLE).unwrap();

    let global = GlobalOptions {
        config: Some(path),
        options: vec![
            ("sync.concurrency".to_string(), "8".to_string()),
            ("mirror.shallow".to_string(), "true".to_string()),
        ],
        ..GlobalOptions::default()
    };
    let flags = vec![("sync.concurrency".to_string(), "4".to_string())];

    let config = config_loader_in(&global, &flags, ConfigFile::Required, dir.path(), None)
        .unwrap()
        .build()
        .unwrap();
    assert_eq!(config.sync.concurrency, 4);
    assert!(config.mirror.shallow);
    assert_eq!(config.mirror.root, PathBuf::from("/srv/mirrors"));
}

#[test]
fn config_json_file_with_camel_case_keys() {
    let dir = temp_dir();
    let path = dir.path().join("git-cloner.config.json");
    fs::write(
        &path,
        r#"{
            "apollo": { "uri": "https://graphql.example.test/graphql" },
            "repositories": [
                { "owner": "acme", "name": "widgets", "refName": "develop",
                  "projects": [ { "path": "guide", "writ": "*.md",
                                  "options": { "hasFrontMatter": true } } ] }
            ]
        }"#,
    )
    .unwrap();

    let config = Config::from_file(&path).unwrap();
    let descriptors: Vec<_> = config.descriptors().into_iter().map(Result::unwrap).collect();
    assert_eq!(descriptors[0].ref_name, "develop");
    assert!(descriptors[0].projects[0].options.has_front_matter);
    assert_eq!(descriptors[0].projects[0].writ.patterns(), vec!["*.md"]);
}

// =============================================================================
// Validation
// =============================================================================

#[test]
fn config_invalid_entry_does_not_fail_the_load() {
    let config = Config::parse(
        r#"
[[repositories]]
owner = "acme"

[[repositories]]
owner = "acme"
name = "widgets"
"#,
    )
    .unwrap();

    let descriptors = config.descriptors();
    assert_eq!(descriptors.len(), 2);
    assert!(matches!(
        descriptors[0],
        Err(ValidationError::MissingField { .. })
    ));
    let valid = descriptors[1].as_ref().unwrap();
    assert_eq!(valid.slug(), "acme/widgets");
    assert_eq!(valid.ref_name, "master");
}

#[test]
fn config_rejects_out_of_range_page_size() {
    let err = Config::parse("[apollo]\npage_size = 101\n").unwrap_err();
    assert!(matches!(err, ConfigError::InvalidValue { .. }));
}

#[test]
fn config_format_options_lists_every_key() {
    let config = Config::parse(SAMPLE).unwrap();
    let keys: Vec<String> = config
        .format_options()
        .iter()
        .filter_map(|line| line.split_whitespace().next().map(str::to_string))
        .collect();
    insta::assert_debug_snapshot!(keys, @r#"
    [
        "apollo.clone_base",
        "apollo.page_size",
        "apollo.retries",
        "apollo.timeout_secs",
        "apollo.token_env",
        "apollo.uri",
        "mirror.clone_timeout_secs",
        "mirror.on_corrupt",
        "mirror.reconcile",
        "mirror.root",
        "mirror.shallow",
        "mirror.verify_tls",
        "repositories",
        "sync.concurrency",
    ]
    "#);
}
