// git-cloner: repository mirror sync
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

use std::time::Duration;

use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use super::{GraphQlClient, History};
use crate::credential::Credential;
use crate::error::{FailureKind, RemoteError};

fn node(hash: &str, headline: &str) -> serde_json::Value {
    json!({
        "node": {
            "hash": hash,
            "messageHeadline": headline,
            "message": format!("{headline}\n\nbody"),
            "tarballUrl": format!("https://codeload.example/{hash}"),
            "committedDate": "2026-01-02T03:04:05Z",
            "author": { "name": "Ada", "email": "ada@example.test", "date": "2026-01-02T03:04:05Z" }
        }
    })
}

fn history_body(edges: &[serde_json::Value], has_next_page: bool) -> serde_json::Value {
    json!({
        "data": {
            "repository": {
                "ref": {
                    "target": {
                        "id": "C_1",
                        "history": {
                            "pageInfo": { "hasNextPage": has_next_page },
                            "edges": edges
                        }
                    }
                }
            }
        }
    })
}

fn client(server: &MockServer) -> GraphQlClient {
    GraphQlClient::new(format!("{}/graphql", server.uri()))
        .credential(Credential::token("t0k"))
        .timeout(Duration::from_secs(5))
        .backoff(Duration::from_millis(5))
}

async fn fetch(client: &GraphQlClient, page_size: u32) -> Result<History, RemoteError> {
    client.fetch("acme", "widgets", "main", page_size).await
}

#[tokio::test]
async fn test_fetch_history_sends_variables_and_auth() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/graphql"))
        .and(header("authorization", "token t0k"))
        .and(body_partial_json(json!({
            "operationName": "repositoryHashes",
            "variables": { "owner": "acme", "name": "widgets", "num": 5, "refName": "main" }
        })))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(history_body(&[node("c2", "second"), node("c1", "first")], true)),
        )
        .expect(1)
        .mount(&server)
        .await;

    let history = fetch(&client(&server), 5).await.unwrap();
    let hashes: Vec<_> = history.commits.iter().map(|c| c.hash.as_str()).collect();
    assert_eq!(hashes, vec!["c2", "c1"]);
    assert!(history.has_next_page);
    let newest = history.newest().unwrap();
    assert_eq!(newest.message_headline, "second");
    assert_eq!(newest.author.email.as_deref(), Some("ada@example.test"));
}

#[tokio::test]
async fn test_fetch_history_truncates_to_page_size() {
    let server = MockServer::start().await;
    let edges: Vec<_> = (0..4).map(|i| node(&format!("c{i}"), "msg")).collect();
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(history_body(&edges, false)))
        .mount(&server)
        .await;

    let client = client(&server);
    assert_eq!(fetch(&client, 2).await.unwrap().commits.len(), 2);
    assert!(fetch(&client, 0).await.unwrap().commits.is_empty());
}

#[tokio::test]
async fn test_null_repository_is_ref_not_found() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": { "repository": null },
            "errors": [{ "type": "NOT_FOUND", "message": "Could not resolve to a Repository" }]
        })))
        .mount(&server)
        .await;

    let err = fetch(&client(&server), 5).await.unwrap_err();
    assert_eq!(err.kind(), FailureKind::RefNotFound);
}

#[tokio::test]
async fn test_null_ref_is_ref_not_found() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "data": { "repository": { "ref": null } } })),
        )
        .mount(&server)
        .await;

    let err = fetch(&client(&server), 5).await.unwrap_err();
    insta::assert_snapshot!(err.to_string(), @"ref 'main' not found on acme/widgets");
}

#[tokio::test]
async fn test_malformed_responses() {
    let bodies = [
        ResponseTemplate::new(200).set_body_string("not json"),
        ResponseTemplate::new(200).set_body_json(json!({})),
        ResponseTemplate::new(200)
            .set_body_json(json!({ "data": { "repository": { "ref": { "target": { "id": "T_1" } } } } })),
        ResponseTemplate::new(200)
            .set_body_json(json!({ "errors": [{ "message": "Field 'oid' doesn't exist" }] })),
    ];

    for body in bodies {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(body)
            .mount(&server)
            .await;

        let err = fetch(&client(&server), 5).await.unwrap_err();
        assert_eq!(err.kind(), FailureKind::MalformedResponse, "{err}");
    }
}

#[tokio::test]
async fn test_http_failures_are_unavailable_without_retry_budget() {
    for status in [401, 403, 502] {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(status))
            .expect(1)
            .mount(&server)
            .await;

        let err = fetch(&client(&server), 5).await.unwrap_err();
        assert_eq!(err.kind(), FailureKind::RemoteUnavailable);
    }
}

#[tokio::test]
async fn test_rejected_credential_is_not_retried() {
    for status in [401, 403] {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(status))
            .expect(1)
            .mount(&server)
            .await;

        let err = fetch(&client(&server).retries(3), 5).await.unwrap_err();
        assert!(matches!(err, RemoteError::Rejected { .. }), "{err}");
        assert!(!err.is_transient());
        assert_eq!(err.kind(), FailureKind::RemoteUnavailable);
    }
}

#[tokio::test]
async fn test_transient_failure_is_retried() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(2)
        .expect(2)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(history_body(&[node("c1", "only")], false)))
        .expect(1)
        .mount(&server)
        .await;

    let history = fetch(&client(&server).retries(2), 5).await.unwrap();
    assert_eq!(history.commits.len(), 1);
}

#[tokio::test]
async fn test_ref_not_found_is_not_retried() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "data": { "repository": null } })),
        )
        .expect(1)
        .mount(&server)
        .await;

    let err = fetch(&client(&server).retries(3), 5).await.unwrap_err();
    assert_eq!(err.kind(), FailureKind::RefNotFound);
}

#[tokio::test]
async fn test_timeout_is_unavailable() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(history_body(&[], false))
                .set_delay(Duration::from_secs(2)),
        )
        .mount(&server)
        .await;

    let client = client(&server).timeout(Duration::from_millis(100));
    let err = fetch(&client, 5).await.unwrap_err();
    assert!(err.is_transient());
}

#[tokio::test]
async fn test_anonymous_credential_sends_no_header() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(header("authorization", "token t0k"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(history_body(&[], false)))
        .mount(&server)
        .await;

    let anonymous = GraphQlClient::new(format!("{}/graphql", server.uri()));
    assert!(fetch(&anonymous, 5).await.unwrap().commits.is_empty());
}
