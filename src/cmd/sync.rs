// git-cloner: repository mirror sync
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! `sync` command.
//!
//! ```text
//! Config --> Credential (resolved once)
//!              |
//!      +-------+--------+
//!      v                v
//! GraphQlClient    MirrorStore
//!      +-------+--------+
//!              v
//!        Orchestrator --> SyncReport (JSON on stdout)
//! ```

use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::cli::sync::SyncArgs;
use crate::config::Config;
use crate::error::Result;
use crate::mirror::MirrorStore;
use crate::remote::GraphQlClient;
use crate::sync::{Orchestrator, SyncReport, filter_descriptors};

/// Sync every configured repository (or the `--repo` subset).
///
/// # Errors
///
/// Returns an error only if the report cannot be serialized. Per-repository
/// failures are recorded in the report.
pub async fn run_sync_command(
    args: &SyncArgs,
    config: &Config,
    cancel: CancellationToken,
) -> Result<SyncReport> {
    let report = sync_config(config, &args.repos, cancel).await;

    let rendered = if args.compact {
        serde_json::to_string(&report)?
    } else {
        serde_json::to_string_pretty(&report)?
    };
    println!("{rendered}");
    Ok(report)
}

/// Build the clients from `config` and run the orchestrator.
pub async fn sync_config(config: &Config, only: &[String], cancel: CancellationToken) -> SyncReport {
    let credential = config.apollo.credential(|name| std::env::var(name).ok());
    info!(
        endpoint = %config.apollo.uri,
        root = %config.mirror.root.display(),
        authenticated = !credential.is_anonymous(),
        "starting sync"
    );

    let client = GraphQlClient::new(config.apollo.uri.clone())
        .credential(credential.clone())
        .timeout(config.apollo.timeout())
        .retries(config.apollo.retries);
    let store = MirrorStore::from_config(&config.mirror, credential);

    let descriptors = filter_descriptors(config.descriptors(), only);

    Orchestrator::builder()
        .history(client)
        .mirror(store)
        .page_size(config.apollo.page_size)
        .concurrency(config.sync.concurrency)
        .clone_base(config.apollo.clone_base.clone())
        .cancel(cancel)
        .build()
        .run(descriptors)
        .await
}
