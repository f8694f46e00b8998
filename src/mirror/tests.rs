// git-cloner: repository mirror sync
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

use std::fs;
use std::path::Path;
use std::process::Command;

use tempfile::TempDir;

use super::git::short_ref;
use super::{Mirror, MirrorHandle, MirrorState, MirrorStore, ReconcileOutcome};
use crate::config::types::{CorruptPolicy, ReconcilePolicy};
use crate::error::{FailureKind, MirrorError};

fn temp_dir() -> TempDir {
    tempfile::tempdir().expect("failed to create temp dir")
}

fn run_git(args: &[&str], cwd: &Path) -> String {
    let output = Command::new("git")
        .args(args)
        .current_dir(cwd)
        .env("GIT_AUTHOR_NAME", "Test")
        .env("GIT_AUTHOR_EMAIL", "test@test.com")
        .env("GIT_COMMITTER_NAME", "Test")
        .env("GIT_COMMITTER_EMAIL", "test@test.com")
        .output()
        .expect("failed to run git");
    assert!(
        output.status.success(),
        "git {args:?} failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    String::from_utf8_lossy(&output.stdout).trim().to_string()
}

fn commit(dir: &Path, file: &str, message: &str) -> String {
    fs::write(dir.join(file), message).unwrap();
    run_git(&["add", "."], dir);
    run_git(&["commit", "-q", "-m", message], dir);
    run_git(&["rev-parse", "HEAD"], dir)
}

/// Upstream repository on `main` with one commit.
fn upstream(dir: &Path) -> String {
    run_git(&["init", "-q", "-b", "main"], dir);
    commit(dir, "README.md", "Initial commit\n\nWith a body")
}

fn store(root: &Path) -> MirrorStore {
    MirrorStore::builder().root(root).build()
}

#[tokio::test]
async fn test_probe_states() {
    let root = temp_dir();
    let store = store(root.path());
    let path = store.destination("acme", "widgets");

    assert_eq!(store.probe(&path).await.unwrap(), MirrorState::Absent);

    fs::create_dir_all(&path).unwrap();
    assert_eq!(store.probe(&path).await.unwrap(), MirrorState::Absent);

    fs::write(path.join("stray.txt"), "x").unwrap();
    assert!(matches!(
        store.probe(&path).await.unwrap(),
        MirrorState::Corrupt { .. }
    ));

    let file_path = store.destination("acme", "file");
    fs::write(&file_path, "not a dir").unwrap();
    assert_eq!(
        store.probe(&file_path).await.unwrap(),
        MirrorState::Corrupt {
            reason: "not a directory".to_string()
        }
    );
}

#[tokio::test]
async fn test_probe_unborn_head() {
    let root = temp_dir();
    let store = store(root.path());
    let path = store.destination("acme", "empty");
    fs::create_dir_all(&path).unwrap();
    run_git(&["init", "-q", "-b", "main"], &path);

    assert_eq!(
        store.probe(&path).await.unwrap(),
        MirrorState::Present { head: None }
    );
}

#[tokio::test]
async fn test_clone_and_read_head() {
    let origin = temp_dir();
    let head = upstream(origin.path());
    let root = temp_dir();
    let store = store(root.path());
    let dest = store.destination("acme", "widgets");

    let handle = store
        .clone_repository(&origin.path().to_string_lossy(), &dest, "refs/heads/main")
        .await
        .unwrap();
    assert_eq!(handle.path, dest);
    assert_eq!(
        store.probe(&dest).await.unwrap(),
        MirrorState::Present {
            head: Some(head.clone())
        }
    );

    let identity = store.head_commit(&handle).await.unwrap();
    assert_eq!(identity.id, head);
    assert_eq!(identity.headline, "Initial commit");
    assert!(identity.message.contains("With a body"));

    let leftovers: Vec<_> = fs::read_dir(root.path().join("acme"))
        .unwrap()
        .filter_map(Result::ok)
        .map(|e| e.file_name().to_string_lossy().into_owned())
        .collect();
    assert_eq!(leftovers, vec!["widgets".to_string()]);
}

#[tokio::test]
async fn test_clone_into_empty_directory() {
    let origin = temp_dir();
    upstream(origin.path());
    let root = temp_dir();
    let store = store(root.path());
    let dest = store.destination("acme", "widgets");
    fs::create_dir_all(&dest).unwrap();

    store
        .clone_repository(&origin.path().to_string_lossy(), &dest, "main")
        .await
        .unwrap();
    assert!(dest.join("README.md").is_file());
}

#[tokio::test]
async fn test_failed_clone_leaves_nothing() {
    let root = temp_dir();
    let store = store(root.path());
    let dest = store.destination("acme", "missing");
    let bogus = root.path().join("no-such-upstream");

    let err = store
        .clone_repository(&bogus.to_string_lossy(), &dest, "main")
        .await
        .unwrap_err();
    assert_eq!(err.kind(), FailureKind::CloneFailed);
    assert!(!dest.exists());
    assert!(!root.path().join("acme/.missing.staging").exists());
    assert!(!root.path().join("acme").exists());
}

#[tokio::test]
async fn test_failed_clone_keeps_existing_owner_directory() {
    let root = temp_dir();
    let store = store(root.path());
    let sibling = store.destination("acme", "gadgets");
    fs::create_dir_all(&sibling).unwrap();
    let bogus = root.path().join("no-such-upstream");

    store
        .clone_repository(
            &bogus.to_string_lossy(),
            &store.destination("acme", "widgets"),
            "main",
        )
        .await
        .unwrap_err();
    assert!(sibling.is_dir());
}

#[tokio::test]
async fn test_clone_unknown_branch_fails() {
    let origin = temp_dir();
    upstream(origin.path());
    let root = temp_dir();
    let store = store(root.path());
    let dest = store.destination("acme", "widgets");

    let err = store
        .clone_repository(&origin.path().to_string_lossy(), &dest, "does-not-exist")
        .await
        .unwrap_err();
    assert!(matches!(err, MirrorError::CloneFailed { .. }));
    assert!(!dest.exists());
    assert!(!root.path().join("acme").exists());
}

async fn cloned(origin: &Path, root: &Path, policy: ReconcilePolicy) -> (MirrorStore, MirrorHandle) {
    let store = MirrorStore::builder().root(root).reconcile(policy).build();
    let dest = store.destination("acme", "widgets");
    let handle = store
        .clone_repository(&origin.to_string_lossy(), &dest, "main")
        .await
        .unwrap();
    (store, handle)
}

#[tokio::test]
async fn test_reconcile_up_to_date() {
    let origin = temp_dir();
    upstream(origin.path());
    let root = temp_dir();
    let (store, handle) = cloned(origin.path(), root.path(), ReconcilePolicy::FastForward).await;

    assert_eq!(
        store.reconcile(&handle, "main").await.unwrap(),
        ReconcileOutcome::UpToDate
    );
}

#[tokio::test]
async fn test_reconcile_fast_forwards_stale_mirror() {
    let origin = temp_dir();
    let first = upstream(origin.path());
    let root = temp_dir();
    let (store, handle) = cloned(origin.path(), root.path(), ReconcilePolicy::FastForward).await;

    let second = commit(origin.path(), "CHANGELOG.md", "Second commit");
    assert_eq!(
        store.reconcile(&handle, "main").await.unwrap(),
        ReconcileOutcome::FastForwarded {
            from: Some(first),
            to: second.clone()
        }
    );
    assert_eq!(store.head_commit(&handle).await.unwrap().id, second);
}

#[tokio::test]
async fn test_reconcile_detects_divergence() {
    let origin = temp_dir();
    upstream(origin.path());
    let root = temp_dir();
    let (store, handle) = cloned(origin.path(), root.path(), ReconcilePolicy::FastForward).await;

    commit(origin.path(), "upstream.txt", "Upstream change");
    let local = commit(&handle.path, "local.txt", "Local change");

    let err = store.reconcile(&handle, "main").await.unwrap_err();
    assert!(matches!(err, MirrorError::DivergedMirror { .. }));
    assert_eq!(err.kind(), FailureKind::DivergedMirror);
    assert_eq!(store.head_commit(&handle).await.unwrap().id, local);
}

#[tokio::test]
async fn test_reconcile_reports_local_commits_as_ahead() {
    let origin = temp_dir();
    upstream(origin.path());
    let root = temp_dir();
    let (store, handle) = cloned(origin.path(), root.path(), ReconcilePolicy::FastForward).await;

    let local = commit(&handle.path, "local.txt", "Local change");

    let err = store.reconcile(&handle, "main").await.unwrap_err();
    assert!(matches!(err, MirrorError::LocalAhead { .. }));
    assert_eq!(err.kind(), FailureKind::DivergedMirror);
    assert_eq!(store.head_commit(&handle).await.unwrap().id, local);
}

#[tokio::test]
async fn test_reconcile_switches_to_requested_branch() {
    let origin = temp_dir();
    let first = upstream(origin.path());
    run_git(&["checkout", "-q", "-b", "dev"], origin.path());
    let dev = commit(origin.path(), "dev.txt", "Dev commit");
    run_git(&["checkout", "-q", "main"], origin.path());
    let root = temp_dir();
    let (store, handle) = cloned(origin.path(), root.path(), ReconcilePolicy::FastForward).await;

    assert_eq!(
        store.reconcile(&handle, "refs/heads/dev").await.unwrap(),
        ReconcileOutcome::CheckedOut {
            previous: "main".to_string(),
            branch: "dev".to_string(),
            head: dev.clone(),
        }
    );
    assert_eq!(run_git(&["symbolic-ref", "--short", "HEAD"], &handle.path), "dev");
    assert_eq!(run_git(&["rev-parse", "refs/heads/main"], &handle.path), first);
    assert_eq!(store.head_commit(&handle).await.unwrap().id, dev);

    assert_eq!(
        store.reconcile(&handle, "dev").await.unwrap(),
        ReconcileOutcome::UpToDate
    );

    assert_eq!(
        store.reconcile(&handle, "main").await.unwrap(),
        ReconcileOutcome::CheckedOut {
            previous: "dev".to_string(),
            branch: "main".to_string(),
            head: first,
        }
    );
    assert_eq!(run_git(&["symbolic-ref", "--short", "HEAD"], &handle.path), "main");
}

#[tokio::test]
async fn test_reconcile_refuses_to_switch_onto_diverged_branch() {
    let origin = temp_dir();
    upstream(origin.path());
    let root = temp_dir();
    let (store, handle) = cloned(origin.path(), root.path(), ReconcilePolicy::FastForward).await;

    run_git(&["checkout", "-q", "-b", "dev"], &handle.path);
    commit(&handle.path, "local.txt", "Local change");
    run_git(&["checkout", "-q", "main"], &handle.path);
    commit(origin.path(), "upstream.txt", "Upstream change");
    run_git(&["branch", "-q", "dev"], origin.path());

    let err = store.reconcile(&handle, "dev").await.unwrap_err();
    assert!(matches!(err, MirrorError::DivergedMirror { .. }));
    assert_eq!(run_git(&["symbolic-ref", "--short", "HEAD"], &handle.path), "main");
}

#[tokio::test]
async fn test_reconcile_disabled_is_skipped() {
    let origin = temp_dir();
    let first = upstream(origin.path());
    let root = temp_dir();
    let (store, handle) = cloned(origin.path(), root.path(), ReconcilePolicy::Disabled).await;

    commit(origin.path(), "CHANGELOG.md", "Second commit");
    assert_eq!(
        store.reconcile(&handle, "main").await.unwrap(),
        ReconcileOutcome::Skipped
    );
    assert_eq!(store.head_commit(&handle).await.unwrap().id, first);
}

#[tokio::test]
async fn test_quarantine_moves_directory() {
    let root = temp_dir();
    let store = MirrorStore::builder()
        .root(root.path())
        .on_corrupt(CorruptPolicy::Reclone)
        .build();
    assert_eq!(store.corrupt_policy(), CorruptPolicy::Reclone);

    let dest = store.destination("acme", "widgets");
    fs::create_dir_all(&dest).unwrap();
    fs::write(dest.join("junk"), "x").unwrap();

    let moved = store.quarantine("acme", "widgets").await.unwrap();
    assert!(!dest.exists());
    assert!(moved.join("junk").is_file());
    assert!(moved.starts_with(root.path().join(".quarantine").join("acme")));
    assert!(
        moved
            .file_name()
            .unwrap()
            .to_string_lossy()
            .starts_with("widgets-")
    );
}

#[test]
fn test_short_ref() {
    assert_eq!(short_ref("refs/heads/main"), "main");
    assert_eq!(short_ref("refs/tags/v1.0"), "v1.0");
    assert_eq!(short_ref("master"), "master");
}
