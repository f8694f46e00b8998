// git-cloner: repository mirror sync
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Local mirror store.
//!
//! ```text
//! {root}/
//!   {owner}/
//!     {name}/                working copy
//!     .{name}.staging        clone in progress (removed on failure)
//!   .quarantine/
//!     {owner}/{name}-{ts}    corrupt mirrors moved aside
//!
//! probe(path)
//!   missing / empty dir   --> Absent
//!   opens as work tree    --> Present { head }
//!   anything else         --> Corrupt { reason }
//!
//! clone_repository: git clone -> staging --rename--> {name}
//!                   failure removes staging and an {owner}/ it created
//! reconcile:        git fetch origin <ref>
//!                   on another branch -> checkout -B <ref> FETCH_HEAD
//!                   merge-base --is-ancestor HEAD FETCH_HEAD
//!                     yes -> merge --ff-only
//!                     no  -> LocalAhead if FETCH_HEAD is behind HEAD
//!                            DivergedMirror otherwise
//! ```
//!
//! gix reads run on the blocking pool.

mod git;

#[cfg(test)]
mod tests;

use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use bon::Builder;
use futures_util::future::BoxFuture;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::config::types::{CorruptPolicy, MirrorConfig, ReconcilePolicy};
use crate::credential::Credential;
use crate::error::MirrorError;

use git::GitRunner;

const QUARANTINE_DIR: &str = ".quarantine";

/// Observed state of a mirror path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state")]
pub enum MirrorState {
    Absent,
    /// `head` is `None` for an unborn HEAD.
    Present { head: Option<String> },
    Corrupt { reason: String },
}

/// A local working copy known to exist.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MirrorHandle {
    pub path: PathBuf,
}

/// The commit HEAD points at.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommitIdentity {
    pub id: String,
    pub headline: String,
    pub message: String,
}

impl CommitIdentity {
    fn from_message(id: String, message: String) -> Self {
        let headline = message.lines().next().unwrap_or_default().trim().to_string();
        Self {
            id,
            headline,
            message,
        }
    }
}

/// Result of reconciling an existing mirror.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome")]
pub enum ReconcileOutcome {
    UpToDate,
    FastForwarded { from: Option<String>, to: String },
    /// The working copy was on `previous`; `branch` now points at `head`.
    CheckedOut {
        previous: String,
        branch: String,
        head: String,
    },
    Skipped,
}

/// Local mirror operations used by the orchestrator.
pub trait Mirror: Send + Sync {
    /// Directory the mirror of `owner/name` lives in.
    fn destination(&self, owner: &str, name: &str) -> PathBuf;

    fn probe<'a>(&'a self, path: &'a Path) -> BoxFuture<'a, Result<MirrorState, MirrorError>>;

    /// Clone `url` at `ref_name` into `destination`. Nothing is left behind
    /// on failure.
    fn clone_repository<'a>(
        &'a self,
        url: &'a str,
        destination: &'a Path,
        ref_name: &'a str,
    ) -> BoxFuture<'a, Result<MirrorHandle, MirrorError>>;

    fn head_commit<'a>(
        &'a self,
        handle: &'a MirrorHandle,
    ) -> BoxFuture<'a, Result<CommitIdentity, MirrorError>>;

    fn reconcile<'a>(
        &'a self,
        handle: &'a MirrorHandle,
        ref_name: &'a str,
    ) -> BoxFuture<'a, Result<ReconcileOutcome, MirrorError>>;

    /// Move a corrupt mirror out of the way; returns its new location.
    fn quarantine<'a>(
        &'a self,
        owner: &'a str,
        name: &'a str,
    ) -> BoxFuture<'a, Result<PathBuf, MirrorError>>;

    fn corrupt_policy(&self) -> CorruptPolicy;
}

/// Removes a staging directory on Drop unless explicitly kept, then the
/// owner directory if the clone created it and it is left empty.
///
/// Also runs when a clone future is dropped by cancellation.
struct StagingGuard {
    path: PathBuf,
    created_parent: Option<PathBuf>,
    keep: bool,
}

impl StagingGuard {
    const fn new(path: PathBuf, created_parent: Option<PathBuf>) -> Self {
        Self {
            path,
            created_parent,
            keep: false,
        }
    }

    const fn keep(&mut self) {
        self.keep = true;
    }
}

impl Drop for StagingGuard {
    fn drop(&mut self) {
        if self.keep {
            return;
        }
        if self.path.exists()
            && let Err(e) = std::fs::remove_dir_all(&self.path)
        {
            warn!(path = %self.path.display(), error = %e, "failed to remove staging directory");
        }
        // fails while another clone for the same owner is using it
        if let Some(parent) = &self.created_parent
            && std::fs::remove_dir(parent).is_ok()
        {
            debug!(path = %parent.display(), "removed empty owner directory");
        }
    }
}

/// On-disk mirror tree rooted at `root`.
///
/// # Example
/// ```ignore
/// let store = MirrorStore::builder()
///     .root(".repos")
///     .credential(credential)
///     .build();
/// ```
#[derive(Debug, Clone, Builder)]
pub struct MirrorStore {
    #[builder(into)]
    root: PathBuf,
    #[builder(default)]
    credential: Credential,
    #[builder(default = true)]
    verify_tls: bool,
    #[builder(default = Duration::from_secs(600))]
    timeout: Duration,
    #[builder(default = false)]
    shallow: bool,
    #[builder(default)]
    reconcile: ReconcilePolicy,
    #[builder(default)]
    on_corrupt: CorruptPolicy,
}

fn io_error(path: &Path, source: std::io::Error) -> MirrorError {
    MirrorError::Io {
        path: path.display().to_string(),
        source,
    }
}

fn fetch_failed(path: &Path, message: String) -> MirrorError {
    MirrorError::FetchFailed {
        path: path.display().to_string(),
        message,
    }
}

/// Run a synchronous read of `path` on the blocking pool.
async fn blocking<T, F>(path: &Path, read: F) -> Result<T, MirrorError>
where
    F: FnOnce(&Path) -> Result<T, MirrorError> + Send + 'static,
    T: Send + 'static,
{
    let owned = path.to_path_buf();
    tokio::task::spawn_blocking(move || read(&owned))
        .await
        .map_err(|e| io_error(path, std::io::Error::other(e)))?
}

/// `Ok(true)` if `ancestor` is reachable from `descendant`.
async fn is_ancestor(
    git: &GitRunner,
    path: &Path,
    ancestor: &str,
    descendant: &str,
) -> Result<bool, MirrorError> {
    let check = git
        .run(
            &["merge-base", "--is-ancestor", ancestor, descendant],
            path,
            false,
        )
        .await
        .map_err(|message| fetch_failed(path, message))?;
    match check.code {
        Some(0) => Ok(true),
        Some(1) => Ok(false),
        _ => Err(fetch_failed(
            path,
            check.into_result().err().unwrap_or_default(),
        )),
    }
}

/// Fails unless `local` can be fast-forwarded to `FETCH_HEAD`.
async fn ensure_fast_forward(
    git: &GitRunner,
    path: &Path,
    local: &str,
    ref_name: &str,
) -> Result<(), MirrorError> {
    if is_ancestor(git, path, local, "FETCH_HEAD").await? {
        return Ok(());
    }
    let path_str = path.display().to_string();
    let ref_name = ref_name.to_string();
    if is_ancestor(git, path, "FETCH_HEAD", local).await? {
        Err(MirrorError::LocalAhead {
            path: path_str,
            ref_name,
        })
    } else {
        Err(MirrorError::DivergedMirror {
            path: path_str,
            ref_name,
        })
    }
}

/// Point the branch of `ref_name` at `FETCH_HEAD` and check it out.
///
/// An existing local branch must fast-forward to the fetched commit.
async fn switch_branch(
    git: &GitRunner,
    path: &Path,
    ref_name: &str,
    previous: String,
    remote: String,
) -> Result<ReconcileOutcome, MirrorError> {
    let failed = |message: String| fetch_failed(path, message);
    let branch = git::short_ref(ref_name);
    let local_ref = format!("refs/heads/{branch}");

    let existing = git
        .run(&["rev-parse", "--verify", "--quiet", &local_ref], path, false)
        .await
        .map_err(failed)?;
    if existing.code == Some(0) {
        ensure_fast_forward(git, path, &local_ref, ref_name).await?;
    }

    git.output(&["checkout", "--quiet", "-B", branch, "FETCH_HEAD"], path, false)
        .await
        .map_err(failed)?;

    info!(
        path = %path.display(),
        from = %previous,
        to = branch,
        head = %remote,
        "switched branch"
    );
    Ok(ReconcileOutcome::CheckedOut {
        previous,
        branch: branch.to_string(),
        head: remote,
    })
}

impl MirrorStore {
    #[must_use]
    pub fn from_config(config: &MirrorConfig, credential: Credential) -> Self {
        Self::builder()
            .root(config.root.clone())
            .credential(credential)
            .verify_tls(config.verify_tls)
            .timeout(config.clone_timeout())
            .shallow(config.shallow)
            .reconcile(config.reconcile)
            .on_corrupt(config.on_corrupt)
            .build()
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn git(&self) -> Result<GitRunner, MirrorError> {
        GitRunner::locate(self.credential.clone(), self.verify_tls, self.timeout)
    }

    /// Inspect `path` without modifying it.
    ///
    /// # Errors
    ///
    /// Returns `MirrorError::Io` if the path exists but cannot be examined.
    pub async fn probe_path(&self, path: &Path) -> Result<MirrorState, MirrorError> {
        let metadata = match tokio::fs::symlink_metadata(path).await {
            Ok(m) => m,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(MirrorState::Absent),
            Err(e) => return Err(io_error(path, e)),
        };

        if !metadata.is_dir() {
            return Ok(MirrorState::Corrupt {
                reason: "not a directory".to_string(),
            });
        }

        let mut entries = tokio::fs::read_dir(path)
            .await
            .map_err(|e| io_error(path, e))?;
        if entries
            .next_entry()
            .await
            .map_err(|e| io_error(path, e))?
            .is_none()
        {
            return Ok(MirrorState::Absent);
        }

        Ok(match blocking(path, |p| Ok(git::inspect(p))).await? {
            Ok(head) => MirrorState::Present { head },
            Err(reason) => MirrorState::Corrupt { reason },
        })
    }

    /// Clone into a sibling staging directory, then rename into place.
    ///
    /// # Errors
    ///
    /// Returns `CloneFailed` if git fails or times out, `GitNotFound` if
    /// there is no git on PATH, or `Io` if the tree cannot be prepared.
    pub async fn clone_into_place(
        &self,
        url: &str,
        destination: &Path,
        ref_name: &str,
    ) -> Result<MirrorHandle, MirrorError> {
        let git = self.git()?;
        let parent = destination.parent().unwrap_or_else(|| Path::new("."));
        let file_name = destination
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .ok_or_else(|| MirrorError::CloneFailed {
                url: url.to_string(),
                message: format!("invalid destination {}", destination.display()),
            })?;

        let created_parent = !tokio::fs::try_exists(parent)
            .await
            .map_err(|e| io_error(parent, e))?;
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| io_error(parent, e))?;

        let staging = parent.join(format!(".{file_name}.staging"));
        if tokio::fs::try_exists(&staging)
            .await
            .map_err(|e| io_error(&staging, e))?
        {
            debug!(path = %staging.display(), "removing stale staging directory");
            tokio::fs::remove_dir_all(&staging)
                .await
                .map_err(|e| io_error(&staging, e))?;
        }
        let mut guard = StagingGuard::new(
            staging.clone(),
            created_parent.then(|| parent.to_path_buf()),
        );

        let staging_str = staging.to_string_lossy();
        let mut args = vec![
            "clone",
            "--quiet",
            "-c",
            "advice.detachedHead=false",
            "--branch",
            git::short_ref(ref_name),
        ];
        if self.shallow {
            args.extend(["--depth", "1"]);
        }
        args.extend([url, staging_str.as_ref()]);

        info!(url, dest = %destination.display(), ref_name, "cloning");
        // staging is relative to the process directory, like the root
        git.output(&args, Path::new("."), true)
            .await
            .map_err(|message| MirrorError::CloneFailed {
                url: url.to_string(),
                message,
            })?;

        // an empty directory probes as Absent and may still be in the way
        if tokio::fs::metadata(destination)
            .await
            .is_ok_and(|m| m.is_dir())
        {
            tokio::fs::remove_dir(destination)
                .await
                .map_err(|e| io_error(destination, e))?;
        }
        tokio::fs::rename(&staging, destination)
            .await
            .map_err(|e| io_error(destination, e))?;
        guard.keep();

        Ok(MirrorHandle {
            path: destination.to_path_buf(),
        })
    }

    /// Read HEAD of a working copy.
    ///
    /// # Errors
    ///
    /// Returns `MirrorError::Open` if the repository or its HEAD commit
    /// cannot be read.
    pub async fn read_head(&self, handle: &MirrorHandle) -> Result<CommitIdentity, MirrorError> {
        let (id, message) = blocking(&handle.path, git::head_commit).await?;
        Ok(CommitIdentity::from_message(id, message))
    }

    /// Bring an existing mirror up to date with `ref_name` per policy.
    ///
    /// A working copy on a different branch is switched to the branch of
    /// `ref_name`, created from the fetched commit when missing.
    ///
    /// # Errors
    ///
    /// Returns `DivergedMirror` if local and remote history have both moved,
    /// `LocalAhead` if local history contains the remote ref plus commits of
    /// its own, `FetchFailed` if fetch, checkout or merge fails.
    pub async fn reconcile_mirror(
        &self,
        handle: &MirrorHandle,
        ref_name: &str,
    ) -> Result<ReconcileOutcome, MirrorError> {
        if self.reconcile == ReconcilePolicy::Disabled {
            debug!(path = %handle.path.display(), "reconcile disabled");
            return Ok(ReconcileOutcome::Skipped);
        }

        let git = self.git()?;
        let path = handle.path.as_path();
        let failed = |message: String| fetch_failed(path, message);

        git.output(&["fetch", "--quiet", "origin", ref_name], path, true)
            .await
            .map_err(failed)?;
        let remote = git
            .output(&["rev-parse", "FETCH_HEAD"], path, false)
            .await
            .map_err(failed)?;
        let head = blocking(path, git::head_state).await?;

        let branch = git::short_ref(ref_name);
        if let Some(current) = head.branch
            && current != branch
            && !ref_name.starts_with("refs/tags/")
        {
            return switch_branch(&git, path, ref_name, current, remote).await;
        }

        let before = head.id;
        if before.as_deref() == Some(remote.as_str()) {
            return Ok(ReconcileOutcome::UpToDate);
        }
        if before.is_some() {
            ensure_fast_forward(&git, path, "HEAD", ref_name).await?;
        }

        git.output(&["merge", "--ff-only", "--quiet", "FETCH_HEAD"], path, false)
            .await
            .map_err(failed)?;

        let to = blocking(path, git::head_state).await?.id.unwrap_or(remote);
        info!(path = %path.display(), from = ?before, to = %to, "fast-forwarded");
        Ok(ReconcileOutcome::FastForwarded { from: before, to })
    }

    /// Move `{root}/{owner}/{name}` to `{root}/.quarantine/{owner}/{name}-{ts}`.
    ///
    /// # Errors
    ///
    /// Returns `MirrorError::Io` if the directory cannot be moved.
    pub async fn quarantine_mirror(&self, owner: &str, name: &str) -> Result<PathBuf, MirrorError> {
        let source = self.mirror_path(owner, name);
        let bucket = self.root.join(QUARANTINE_DIR).join(owner);
        tokio::fs::create_dir_all(&bucket)
            .await
            .map_err(|e| io_error(&bucket, e))?;

        let stamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_or(0, |d| d.as_secs());
        let mut target = bucket.join(format!("{name}-{stamp}"));
        let mut suffix = 1;
        while tokio::fs::try_exists(&target)
            .await
            .map_err(|e| io_error(&target, e))?
        {
            target = bucket.join(format!("{name}-{stamp}-{suffix}"));
            suffix += 1;
        }

        tokio::fs::rename(&source, &target)
            .await
            .map_err(|e| io_error(&source, e))?;
        warn!(from = %source.display(), to = %target.display(), "quarantined corrupt mirror");
        Ok(target)
    }

    #[must_use]
    pub fn mirror_path(&self, owner: &str, name: &str) -> PathBuf {
        self.root.join(owner).join(name)
    }
}

impl Mirror for MirrorStore {
    fn destination(&self, owner: &str, name: &str) -> PathBuf {
        self.mirror_path(owner, name)
    }

    fn probe<'a>(&'a self, path: &'a Path) -> BoxFuture<'a, Result<MirrorState, MirrorError>> {
        Box::pin(self.probe_path(path))
    }

    fn clone_repository<'a>(
        &'a self,
        url: &'a str,
        destination: &'a Path,
        ref_name: &'a str,
    ) -> BoxFuture<'a, Result<MirrorHandle, MirrorError>> {
        Box::pin(self.clone_into_place(url, destination, ref_name))
    }

    fn head_commit<'a>(
        &'a self,
        handle: &'a MirrorHandle,
    ) -> BoxFuture<'a, Result<CommitIdentity, MirrorError>> {
        Box::pin(self.read_head(handle))
    }

    fn reconcile<'a>(
        &'a self,
        handle: &'a MirrorHandle,
        ref_name: &'a str,
    ) -> BoxFuture<'a, Result<ReconcileOutcome, MirrorError>> {
        Box::pin(self.reconcile_mirror(handle, ref_name))
    }

    fn quarantine<'a>(
        &'a self,
        owner: &'a str,
        name: &'a str,
    ) -> BoxFuture<'a, Result<PathBuf, MirrorError>> {
        Box::pin(self.quarantine_mirror(owner, name))
    }

    fn corrupt_policy(&self) -> CorruptPolicy {
        self.on_corrupt
    }
}
