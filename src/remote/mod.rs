// git-cloner: repository mirror sync
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Remote metadata client.
//!
//! ```text
//! GraphQlClient::new(uri)
//!   .credential() .timeout() .retries() .backoff()
//!        |
//!        v
//! fetch_history(owner, name, ref, N)
//!        |
//!        +--> POST repositoryHashes  ----> 200 + data  --> History (<= N)
//!        |                           +---> 401/403     --> Rejected
//!        |                           \---> 5xx/timeout --> Unavailable --+
//!        |                                                               |
//!        +<------------- retry (backoff * 2^attempt) while attempts left-+
//!
//! Global client: OnceLock, connection pool, keep-alive
//! ```

mod query;

#[cfg(test)]
mod tests;

use std::sync::OnceLock;
use std::time::Duration;

use futures_util::future::BoxFuture;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::credential::Credential;
use crate::error::RemoteError;

pub use query::REPOSITORY_HASHES;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
const DEFAULT_BACKOFF: Duration = Duration::from_millis(500);

/// Commit author as reported by the API. Any field may be null.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Author {
    pub name: Option<String>,
    pub email: Option<String>,
    pub date: Option<String>,
}

/// One commit of a ref's history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommitRecord {
    pub hash: String,
    pub message_headline: String,
    pub message: String,
    pub tarball_url: String,
    pub committed_date: String,
    #[serde(default)]
    pub author: Author,
}

/// Most recent commits of a ref, newest first.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct History {
    pub commits: Vec<CommitRecord>,
    /// More history exists beyond this page. Never followed.
    pub has_next_page: bool,
}

impl History {
    /// Newest commit, if any.
    #[must_use]
    pub fn newest(&self) -> Option<&CommitRecord> {
        self.commits.first()
    }
}

/// Source of remote commit history.
pub trait HistorySource: Send + Sync {
    /// Fetch up to `page_size` commits of `ref_name`, newest first.
    fn fetch_history<'a>(
        &'a self,
        owner: &'a str,
        name: &'a str,
        ref_name: &'a str,
        page_size: u32,
    ) -> BoxFuture<'a, Result<History, RemoteError>>;
}

/// Global HTTP client - initialized once, reused across all requests.
/// Falls back to a basic client if custom configuration fails.
fn global_client() -> &'static Client {
    static CLIENT: OnceLock<Client> = OnceLock::new();
    CLIENT.get_or_init(|| {
        Client::builder()
            .user_agent(format!("git-cloner/{}", env!("CARGO_PKG_VERSION")))
            .build()
            .unwrap_or_else(|_| Client::new())
    })
}

/// GraphQL history client with bounded retry.
///
/// # Example
/// ```ignore
/// use git_cloner::remote::GraphQlClient;
///
/// let history = GraphQlClient::new("https://api.github.com/graphql")
///     .credential(credential)
///     .fetch_history("acme", "widgets", "main", 5)
///     .await?;
/// ```
#[derive(Debug, Clone)]
pub struct GraphQlClient {
    client: Client,
    uri: String,
    credential: Credential,
    timeout: Duration,
    retries: u32,
    backoff: Duration,
}

impl GraphQlClient {
    #[must_use]
    pub fn new(uri: impl Into<String>) -> Self {
        Self {
            client: global_client().clone(),
            uri: uri.into(),
            credential: Credential::anonymous(),
            timeout: DEFAULT_TIMEOUT,
            retries: 0,
            backoff: DEFAULT_BACKOFF,
        }
    }

    /// Credential sent as the `authorization` header.
    #[must_use]
    pub fn credential(mut self, credential: Credential) -> Self {
        self.credential = credential;
        self
    }

    /// Per-request timeout.
    #[must_use]
    pub const fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Extra attempts after an `Unavailable` failure.
    #[must_use]
    pub const fn retries(mut self, retries: u32) -> Self {
        self.retries = retries;
        self
    }

    /// Delay before the first retry; doubles on each further retry.
    #[must_use]
    pub const fn backoff(mut self, backoff: Duration) -> Self {
        self.backoff = backoff;
        self
    }

    #[must_use]
    pub fn uri(&self) -> &str {
        &self.uri
    }

    /// Fetch history, retrying transient failures.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The endpoint stays unreachable or keeps failing with 5xx
    ///   after all retries (`Unavailable`).
    /// - The endpoint refuses the credential with 401/403 (`Rejected`).
    /// - The repository or ref does not exist (`RefNotFound`).
    /// - The body does not have the expected shape (`MalformedResponse`).
    pub async fn fetch(
        &self,
        owner: &str,
        name: &str,
        ref_name: &str,
        page_size: u32,
    ) -> Result<History, RemoteError> {
        let mut attempt = 0;
        loop {
            match self.fetch_once(owner, name, ref_name, page_size).await {
                Err(e) if e.is_transient() && attempt < self.retries => {
                    let delay = self.backoff.saturating_mul(2u32.saturating_pow(attempt));
                    warn!(
                        repo = %format_args!("{owner}/{name}"),
                        attempt = attempt + 1,
                        delay = ?delay,
                        error = %e,
                        "history fetch failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                other => return other,
            }
        }
    }

    async fn fetch_once(
        &self,
        owner: &str,
        name: &str,
        ref_name: &str,
        page_size: u32,
    ) -> Result<History, RemoteError> {
        let body = query::Request::new(owner, name, ref_name, page_size);
        let mut request = self
            .client
            .post(&self.uri)
            .timeout(self.timeout)
            .json(&body);
        if let Some(header) = self.credential.authorization_header() {
            request = request.header(reqwest::header::AUTHORIZATION, header);
        }

        debug!(uri = %self.uri, owner, name, ref_name, num = page_size, "query repositoryHashes");
        let response = request.send().await.map_err(|e| self.unavailable(&e))?;

        let status = response.status();
        if matches!(status, StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN) {
            return Err(RemoteError::Rejected {
                url: self.uri.clone(),
                message: status_message(status),
            });
        }
        if !status.is_success() {
            return Err(RemoteError::Unavailable {
                url: self.uri.clone(),
                message: status_message(status),
            });
        }

        let bytes = response.bytes().await.map_err(|e| self.unavailable(&e))?;
        let parsed: query::Response =
            serde_json::from_slice(&bytes).map_err(|e| RemoteError::MalformedResponse {
                owner: owner.to_string(),
                name: name.to_string(),
                message: format!("invalid JSON body: {e}"),
            })?;

        let mut history = interpret(parsed, owner, name, ref_name)?;
        let limit = usize::try_from(page_size).unwrap_or(usize::MAX);
        history.commits.truncate(limit);
        debug!(
            owner,
            name,
            commits = history.commits.len(),
            has_next_page = history.has_next_page,
            "history received"
        );
        Ok(history)
    }

    fn unavailable(&self, err: &reqwest::Error) -> RemoteError {
        let message = if err.is_timeout() {
            format!("request timed out after {:?}", self.timeout)
        } else {
            err.to_string()
        };
        RemoteError::Unavailable {
            url: self.uri.clone(),
            message,
        }
    }
}

impl HistorySource for GraphQlClient {
    fn fetch_history<'a>(
        &'a self,
        owner: &'a str,
        name: &'a str,
        ref_name: &'a str,
        page_size: u32,
    ) -> BoxFuture<'a, Result<History, RemoteError>> {
        Box::pin(self.fetch(owner, name, ref_name, page_size))
    }
}

fn status_message(status: StatusCode) -> String {
    match status {
        StatusCode::UNAUTHORIZED => "HTTP 401: credential rejected".to_string(),
        StatusCode::FORBIDDEN => "HTTP 403: access denied or rate limited".to_string(),
        s => format!("HTTP {}", s.as_u16()),
    }
}

fn interpret(
    response: query::Response,
    owner: &str,
    name: &str,
    ref_name: &str,
) -> Result<History, RemoteError> {
    let not_found = || RemoteError::RefNotFound {
        owner: owner.to_string(),
        name: name.to_string(),
        ref_name: ref_name.to_string(),
    };
    let malformed = |message: String| RemoteError::MalformedResponse {
        owner: owner.to_string(),
        name: name.to_string(),
        message,
    };

    if response.errors.iter().any(query::ErrorEntry::is_not_found) {
        return Err(not_found());
    }
    if !response.errors.is_empty() {
        let messages: Vec<_> = response.errors.iter().map(|e| e.message.as_str()).collect();
        return Err(malformed(messages.join("; ")));
    }

    let data = response
        .data
        .ok_or_else(|| malformed("response has no data".to_string()))?;
    let target = data
        .repository
        .and_then(|r| r.git_ref)
        .ok_or_else(not_found)?
        .target
        .ok_or_else(|| malformed("ref has no target".to_string()))?;
    let connection = target
        .history
        .ok_or_else(|| malformed("ref target is not a commit".to_string()))?;

    Ok(History {
        commits: connection.edges.into_iter().map(|e| e.node).collect(),
        has_next_page: connection.page_info.has_next_page,
    })
}
