// git-cloner: repository mirror sync
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Sync orchestrator.
//!
//! # Per-repository state machine
//!
//! ```text
//! Queued
//!   |
//!   v
//! MetadataFetching --(RemoteError)------------------------------+
//!   |                                                           |
//!   v                                                           |
//! MetadataFetched                                               |
//!   |                                                           |
//!   v                                                           |
//! MirrorProbing --Corrupt+fail----------------------------------+
//!   |   |    \                                                  |
//!   |   |     +--Corrupt+reclone: quarantine--+                 |
//!   |   |                                     |                 |
//!   |   +--Absent----------------------> Cloning --(error)-------+
//!   |                                         |                 |
//!   +--Present--> Reconciling --(error)-------|-----------------+
//!                     |                       |                 |
//!                     v                       v                 v
//!                   Synced <------------------+              Failed
//!                     |
//!                     +--> read HEAD, log id + headline
//! ```
//!
//! Every repository reaches exactly one terminal state. Failures are caught
//! at the repository boundary and never stop other repositories. With
//! `concurrency > 1` repositories run concurrently but the report keeps
//! configuration order.


use std::future::Future;
use std::path::PathBuf;

use bon::Builder;
use futures_util::{StreamExt, stream};
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::{Instrument, debug, error, info, info_span, warn};

use crate::config::repository::RepositoryDescriptor;
use crate::config::types::{CorruptPolicy, DEFAULT_CLONE_BASE, DEFAULT_PAGE_SIZE};
use crate::error::{ClonerError, FailureKind, MirrorError, ValidationError};
use crate::mirror::{CommitIdentity, Mirror, MirrorHandle, MirrorState, ReconcileOutcome};
use crate::remote::HistorySource;

/// Per-repository state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SyncState {
    Queued,
    MetadataFetching,
    MetadataFetched,
    MirrorProbing,
    Cloning,
    Reconciling,
    Synced,
    Failed,
}

impl SyncState {
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Synced | Self::Failed)
    }
}

/// Why a repository ended in `Failed`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Failure {
    pub kind: FailureKind,
    pub message: String,
}

impl Failure {
    fn of(err: impl Into<ClonerError>) -> Self {
        Self::from(err.into())
    }

    fn cancelled() -> Self {
        Self {
            kind: FailureKind::Cancelled,
            message: "sync cancelled".to_string(),
        }
    }
}

impl From<ClonerError> for Failure {
    fn from(err: ClonerError) -> Self {
        Self {
            kind: err.kind(),
            message: err.to_string(),
        }
    }
}


/// Recorded result of one repository.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RepositoryOutcome {
    /// `owner/name`, or `repositories[i]` for an entry that failed validation.
    pub repository: String,
    pub state: SyncState,
    /// States entered, in order. Empty for entries that never started.
    pub transitions: Vec<SyncState>,
    /// Commits returned by the history query.
    pub commits_fetched: usize,
    /// Newest remote commit.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remote_head: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub head: Option<CommitIdentity>,
    /// Local HEAD equals the newest remote commit.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub head_matches_remote: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reconcile: Option<ReconcileOutcome>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quarantined: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure: Option<Failure>,
}

impl RepositoryOutcome {
    fn new(repository: String) -> Self {
        Self {
            repository,
            state: SyncState::Queued,
            transitions: vec![SyncState::Queued],
            commits_fetched: 0,
            remote_head: None,
            head: None,
            head_matches_remote: None,
            reconcile: None,
            quarantined: None,
            failure: None,
        }
    }

    fn invalid(index: usize, err: &ValidationError) -> Self {
        Self {
            transitions: Vec::new(),
            state: SyncState::Failed,
            failure: Some(Failure::of(err.clone())),
            ..Self::new(format!("repositories[{index}]"))
        }
    }

    fn enter(&mut self, state: SyncState) {
        debug!(from = ?self.state, to = ?state, "transition");
        self.state = state;
        self.transitions.push(state);
    }

    fn fail(&mut self, failure: Failure) {
        error!(kind = %failure.kind, error = %failure.message, "repository failed");
        self.enter(SyncState::Failed);
        self.failure = Some(failure);
    }

    #[must_use]
    pub fn failure_kind(&self) -> Option<FailureKind> {
        self.failure.as_ref().map(|f| f.kind)
    }
}

/// Result of a whole run, in configuration order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SyncReport {
    pub outcomes: Vec<RepositoryOutcome>,
}

impl SyncReport {
    /// Every repository reached `Synced`.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.outcomes.iter().all(|o| o.state == SyncState::Synced)
    }

    #[must_use]
    pub fn synced(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| o.state == SyncState::Synced)
            .count()
    }

    #[must_use]
    pub fn failed(&self) -> usize {
        self.outcomes.len() - self.synced()
    }

    #[must_use]
    pub fn get(&self, repository: &str) -> Option<&RepositoryOutcome> {
        self.outcomes.iter().find(|o| o.repository == repository)
    }
}

/// Keep only descriptors named in `only` (`owner/name`, case-insensitive).
///
/// An empty filter keeps everything, including invalid entries. A non-empty
/// filter drops invalid entries since they have no name to match.
#[must_use]
pub fn filter_descriptors(
    descriptors: Vec<Result<RepositoryDescriptor, ValidationError>>,
    only: &[String],
) -> Vec<Result<RepositoryDescriptor, ValidationError>> {
    if only.is_empty() {
        return descriptors;
    }
    for wanted in only {
        let known = descriptors
            .iter()
            .flatten()
            .any(|d| d.slug().eq_ignore_ascii_case(wanted));
        if !known {
            warn!(repo = %wanted, "requested repository is not configured");
        }
    }
    descriptors
        .into_iter()
        .filter(|d| {
            d.as_ref()
                .is_ok_and(|d| only.iter().any(|w| d.slug().eq_ignore_ascii_case(w)))
        })
        .collect()
}

/// Drives every repository through the sync state machine.
///
/// # Example
/// ```ignore
/// let report = Orchestrator::builder()
///     .history(client)
///     .mirror(store)
///     .cancel(token)
///     .build()
///     .run(config.descriptors())
///     .await;
/// ```
#[derive(Builder)]
pub struct Orchestrator<H, M> {
    history: H,
    mirror: M,
    #[builder(default = DEFAULT_PAGE_SIZE)]
    page_size: u32,
    #[builder(default = 1)]
    concurrency: usize,
    #[builder(into, default = DEFAULT_CLONE_BASE.to_string())]
    clone_base: String,
    #[builder(default)]
    cancel: CancellationToken,
}

impl<H: HistorySource, M: Mirror> Orchestrator<H, M> {
    /// Process every descriptor and collect one outcome each.
    pub async fn run(
        &self,
        descriptors: Vec<Result<RepositoryDescriptor, ValidationError>>,
    ) -> SyncReport {
        info!(
            repositories = descriptors.len(),
            concurrency = self.concurrency,
            "sync started"
        );
        let outcomes: Vec<_> = stream::iter(descriptors.into_iter().enumerate())
            .map(|(index, descriptor)| self.process(index, descriptor))
            .buffered(self.concurrency.max(1))
            .collect()
            .await;

        let report = SyncReport { outcomes };
        info!(
            synced = report.synced(),
            failed = report.failed(),
            "sync finished"
        );
        report
    }

    async fn process(
        &self,
        index: usize,
        descriptor: Result<RepositoryDescriptor, ValidationError>,
    ) -> RepositoryOutcome {
        match descriptor {
            Ok(descriptor) => {
                let span = info_span!("repo", repo = %descriptor.slug());
                self.sync_repository(&descriptor).instrument(span).await
            }
            Err(err) => {
                error!(index, error = %err, "invalid repository entry");
                RepositoryOutcome::invalid(index, &err)
            }
        }
    }

    /// Run one repository to a terminal state.
    pub async fn sync_repository(&self, descriptor: &RepositoryDescriptor) -> RepositoryOutcome {
        let mut outcome = RepositoryOutcome::new(descriptor.slug());
        match self.drive(descriptor, &mut outcome).await {
            Ok(handle) => {
                outcome.enter(SyncState::Synced);
                self.observe_head(&handle, &mut outcome).await;
            }
            Err(failure) => outcome.fail(failure),
        }
        outcome
    }

    async fn drive(
        &self,
        descriptor: &RepositoryDescriptor,
        outcome: &mut RepositoryOutcome,
    ) -> Result<MirrorHandle, Failure> {
        if self.cancel.is_cancelled() {
            return Err(Failure::cancelled());
        }

        let (owner, name, ref_name) = (
            descriptor.owner.as_str(),
            descriptor.name.as_str(),
            descriptor.ref_name.as_str(),
        );

        outcome.enter(SyncState::MetadataFetching);
        let history = self
            .cancellable(
                self.history
                    .fetch_history(owner, name, ref_name, self.page_size),
            )
            .await??;
        outcome.commits_fetched = history.commits.len();
        outcome.remote_head = history.newest().map(|c| c.hash.clone());
        outcome.enter(SyncState::MetadataFetched);
        info!(commits = history.commits.len(), ref_name, "history fetched");

        outcome.enter(SyncState::MirrorProbing);
        let destination = self.mirror.destination(owner, name);
        let state = self
            .cancellable(self.mirror.probe(&destination))
            .await??;
        debug!(path = %destination.display(), state = ?state, "probed mirror");

        let url = descriptor
            .clone_url(&self.clone_base)
            .ok_or_else(|| Failure {
                kind: FailureKind::ValidationError,
                message: format!("no clone URL for service {}", descriptor.service),
            })?;

        match state {
            MirrorState::Absent => {}
            MirrorState::Present { .. } => {
                outcome.enter(SyncState::Reconciling);
                let handle = MirrorHandle { path: destination };
                let result = self
                    .cancellable(self.mirror.reconcile(&handle, ref_name))
                    .await??;
                info!(result = ?result, "reconciled");
                outcome.reconcile = Some(result);
                return Ok(handle);
            }
            MirrorState::Corrupt { reason } => match self.mirror.corrupt_policy() {
                CorruptPolicy::Fail => {
                    return Err(Failure::of(MirrorError::NotARepository {
                        path: destination.display().to_string(),
                        reason,
                    }));
                }
                CorruptPolicy::Reclone => {
                    warn!(path = %destination.display(), reason = %reason, "mirror is corrupt, recloning");
                    let moved = self
                        .cancellable(self.mirror.quarantine(owner, name))
                        .await??;
                    outcome.quarantined = Some(moved);
                }
            },
        }

        outcome.enter(SyncState::Cloning);
        let handle = self
            .cancellable(self.mirror.clone_repository(&url, &destination, ref_name))
            .await??;
        info!(path = %handle.path.display(), "cloned");
        Ok(handle)
    }

    /// Side effect only; a failure here never changes the terminal state.
    async fn observe_head(&self, handle: &MirrorHandle, outcome: &mut RepositoryOutcome) {
        match self.mirror.head_commit(handle).await {
            Ok(identity) => {
                info!(head = %identity.id, headline = %identity.headline, "synced");
                debug!(message = %identity.message, "head commit message");
                outcome.head_matches_remote = outcome
                    .remote_head
                    .as_ref()
                    .map(|remote| *remote == identity.id);
                outcome.head = Some(identity);
            }
            Err(e) => warn!(error = %e, "synced, but HEAD could not be read"),
        }
    }

    /// Race `fut` against cancellation. Dropping `fut` aborts in-flight work.
    async fn cancellable<T, E>(
        &self,
        fut: impl Future<Output = Result<T, E>>,
    ) -> Result<Result<T, Failure>, Failure>
    where
        E: Into<ClonerError>,
    {
        tokio::select! {
            biased;
            () = self.cancel.cancelled() => Err(Failure::cancelled()),
            result = fut => Ok(result.map_err(Failure::of)),
        }
    }
}
