// git-cloner: repository mirror sync
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Git access for the mirror store.
//!
//! ```text
//! writes (clone/fetch/merge) --> GitRunner --> git CLI (tokio::process)
//! reads  (open/HEAD/commit)  --> gix
//! ```
//!
//! Network commands get a process-local credential helper that answers from
//! the child environment, so the token never appears in argv.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use tokio::process::Command;
use tracing::{debug, trace};

use crate::credential::Credential;
use crate::error::MirrorError;

const USERNAME_ENV: &str = "GIT_CLONER_USERNAME";
const PASSWORD_ENV: &str = "GIT_CLONER_PASSWORD";

/// Answers `get` requests from the environment and ignores store/erase.
const CREDENTIAL_HELPER: &str = concat!(
    "credential.helper=!f() { test \"$1\" = get && ",
    "printf 'username=%s\\npassword=%s\\n' \"$GIT_CLONER_USERNAME\" \"$GIT_CLONER_PASSWORD\"; }; f"
);

/// Captured result of a git invocation.
#[derive(Debug)]
pub(crate) struct GitOutput {
    pub(crate) code: Option<i32>,
    pub(crate) stdout: String,
    pub(crate) stderr: String,
}

impl GitOutput {
    pub(crate) const fn success(&self) -> bool {
        matches!(self.code, Some(0))
    }

    /// Stdout on success, otherwise the trimmed stderr (or exit code).
    pub(crate) fn into_result(self) -> Result<String, String> {
        if self.success() {
            return Ok(self.stdout);
        }
        if self.stderr.is_empty() {
            Err(self
                .code
                .map_or_else(|| "terminated by signal".to_string(), |c| format!("exited with code {c}")))
        } else {
            Err(self.stderr)
        }
    }
}

/// Git CLI invocation settings shared by every command of a store.
#[derive(Debug, Clone)]
pub(crate) struct GitRunner {
    program: PathBuf,
    credential: Credential,
    verify_tls: bool,
    timeout: Duration,
}

impl GitRunner {
    /// Locate `git` on PATH.
    pub(crate) fn locate(
        credential: Credential,
        verify_tls: bool,
        timeout: Duration,
    ) -> Result<Self, MirrorError> {
        let program = which::which("git").map_err(|e| MirrorError::GitNotFound(e.to_string()))?;
        Ok(Self {
            program,
            credential,
            verify_tls,
            timeout,
        })
    }

    fn command(&self, args: &[&str], cwd: &Path, network: bool) -> Command {
        let mut command = Command::new(&self.program);
        command
            .current_dir(cwd)
            .env("GCM_INTERACTIVE", "never")
            .env("GIT_TERMINAL_PROMPT", "0")
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        if network {
            if !self.verify_tls {
                command.args(["-c", "http.sslVerify=false"]);
            }
            if let Some((username, password)) = self.credential.basic_auth() {
                command
                    .args(["-c", "credential.helper=", "-c", CREDENTIAL_HELPER])
                    .env(USERNAME_ENV, username)
                    .env(PASSWORD_ENV, password);
            }
        }
        command.args(args);
        command
    }

    /// Run git to completion, bounded by the store timeout.
    ///
    /// `Err` means git could not be run or was killed on timeout; a non-zero
    /// exit is reported through `GitOutput`.
    pub(crate) async fn run(
        &self,
        args: &[&str],
        cwd: &Path,
        network: bool,
    ) -> Result<GitOutput, String> {
        debug!(cwd = %cwd.display(), cmd = %format_args!("git {}", args.join(" ")), "exec");
        let child = self
            .command(args, cwd, network)
            .spawn()
            .map_err(|e| format!("failed to execute git: {e}"))?;

        let output = tokio::time::timeout(self.timeout, child.wait_with_output())
            .await
            .map_err(|_| {
                let subcommand = args.first().copied().unwrap_or_default();
                format!("git {subcommand} timed out after {:?}", self.timeout)
            })?
            .map_err(|e| format!("failed to wait for git: {e}"))?;

        let result = GitOutput {
            code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).trim().to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        };
        trace!(code = ?result.code, "git completed");
        Ok(result)
    }

    /// Run git and return stdout, mapping any failure to a message.
    pub(crate) async fn output(
        &self,
        args: &[&str],
        cwd: &Path,
        network: bool,
    ) -> Result<String, String> {
        self.run(args, cwd, network).await?.into_result()
    }
}

/// Branch or tag name accepted by `git clone --branch`.
pub(crate) fn short_ref(ref_name: &str) -> &str {
    ref_name
        .strip_prefix("refs/heads/")
        .or_else(|| ref_name.strip_prefix("refs/tags/"))
        .unwrap_or(ref_name)
}

// --- gix reads ---

fn open(path: &Path) -> Result<gix::Repository, MirrorError> {
    gix::open(path).map_err(|e| MirrorError::Open {
        path: path.display().to_string(),
        message: e.to_string(),
    })
}

/// Open `path` as a working copy and resolve HEAD.
///
/// `Ok(None)` is an unborn HEAD. `Err` carries the reason the directory is
/// not a usable working copy.
pub(crate) fn inspect(path: &Path) -> Result<Option<String>, String> {
    let repo = gix::open(path).map_err(|e| e.to_string())?;
    if repo.workdir().is_none() {
        return Err("bare repository".to_string());
    }
    let head = repo.head().map_err(|e| e.to_string())?;
    Ok(head.id().map(|id| id.to_string()))
}

/// Checked-out branch and HEAD commit of a working copy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct HeadState {
    /// Short branch name, `None` when HEAD is detached.
    pub(crate) branch: Option<String>,
    /// `None` when unborn.
    pub(crate) id: Option<String>,
}

pub(crate) fn head_state(path: &Path) -> Result<HeadState, MirrorError> {
    let repo = open(path)?;
    let read_error = |message: String| MirrorError::Open {
        path: path.display().to_string(),
        message,
    };
    let branch = repo
        .head_name()
        .map_err(|e| read_error(e.to_string()))?
        .map(|name| name.shorten().to_string());
    let head = repo.head().map_err(|e| read_error(e.to_string()))?;
    Ok(HeadState {
        branch,
        id: head.id().map(|id| id.to_string()),
    })
}

/// Id and message of the HEAD commit.
pub(crate) fn head_commit(path: &Path) -> Result<(String, String), MirrorError> {
    let repo = open(path)?;
    let read_error = |message: String| MirrorError::Open {
        path: path.display().to_string(),
        message,
    };
    let commit = repo.head_commit().map_err(|e| read_error(e.to_string()))?;
    let message = commit
        .message_raw()
        .map_err(|e| read_error(e.to_string()))?
        .to_string();
    Ok((commit.id.to_string(), message))
}
