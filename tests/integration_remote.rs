// git-cloner: repository mirror sync
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Integration tests for the GraphQL history client using wiremock.

use std::time::Duration;

use git_cloner::credential::Credential;
use git_cloner::error::{FailureKind, RemoteError};
use git_cloner::remote::{GraphQlClient, HistorySource, REPOSITORY_HASHES};
use serde_json::json;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client(server: &MockServer) -> GraphQlClient {
    GraphQlClient::new(format!("{}/graphql", server.uri()))
        .credential(Credential::token("secret"))
        .timeout(Duration::from_secs(5))
        .backoff(Duration::from_millis(5))
        .retries(1)
}

#[tokio::test]
async fn remote_sends_the_repository_hashes_query() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/graphql"))
        .and(body_partial_json(json!({
            "query": REPOSITORY_HASHES,
            "variables": { "owner": "rust-lang", "name": "book", "num": 2, "refName": "main" }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": { "repository": { "ref": { "target": { "history": {
                "pageInfo": { "hasNextPage": true },
                "edges": [
                    { "node": {
                        "hash": "b2", "messageHeadline": "Fix typo", "message": "Fix typo",
                        "tarballUrl": "https://codeload.example/b2",
                        "committedDate": "2026-02-01T00:00:00Z",
                        "author": { "name": null, "email": null, "date": null }
                    } },
                    { "node": {
                        "hash": "b1", "messageHeadline": "Add chapter", "message": "Add chapter\n\nMore",
                        "tarballUrl": "https://codeload.example/b1",
                        "committedDate": "2026-01-01T00:00:00Z"
                    } }
                ]
            } } } } }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let history = client(&server)
        .fetch_history("rust-lang", "book", "main", 2)
        .await
        .unwrap();

    assert!(history.has_next_page);
    assert_eq!(history.newest().map(|c| c.hash.as_str()), Some("b2"));
    assert_eq!(history.commits[1].message_headline, "Add chapter");
    assert!(history.commits[1].author.name.is_none());
}

#[tokio::test]
async fn remote_retries_then_reports_unavailable() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500))
        .expect(2)
        .mount(&server)
        .await;

    let err = client(&server)
        .fetch_history("acme", "widgets", "main", 5)
        .await
        .unwrap_err();

    assert_eq!(err.kind(), FailureKind::RemoteUnavailable);
    assert!(err.is_transient());
}

#[tokio::test]
async fn remote_missing_ref_is_not_retried() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": { "repository": { "ref": null } }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let err = client(&server)
        .fetch_history("acme", "widgets", "release", 5)
        .await
        .unwrap_err();

    assert!(matches!(err, RemoteError::RefNotFound { .. }));
}
