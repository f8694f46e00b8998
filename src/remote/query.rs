// git-cloner: repository mirror sync
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! `repositoryHashes` GraphQL document and its wire types.
//!
//! ```text
//! data.repository                 null -> RefNotFound
//!   .ref(qualifiedName)           null -> RefNotFound
//!     .target ... on Commit       no history -> MalformedResponse
//!       .history(first: $num)
//!         .pageInfo.hasNextPage
//!         .edges[].node           CommitRecord
//! ```

use serde::{Deserialize, Serialize};

use super::CommitRecord;

pub const REPOSITORY_HASHES: &str = r#"query repositoryHashes(
  $owner: String!
  $name: String!
  $num: Int = 5
  $refName: String = "master"
) {
  repository(name: $name, owner: $owner) {
    ref(qualifiedName: $refName) {
      target {
        ... on Commit {
          id
          history(first: $num) {
            pageInfo {
              hasNextPage
            }
            edges {
              node {
                hash: oid
                messageHeadline
                message
                tarballUrl
                committedDate
                author {
                  name
                  email
                  date
                }
              }
            }
          }
        }
      }
    }
  }
}"#;

#[derive(Debug, Serialize)]
pub(crate) struct Request<'a> {
    pub(crate) query: &'static str,
    #[serde(rename = "operationName")]
    pub(crate) operation_name: &'static str,
    pub(crate) variables: Variables<'a>,
}

#[derive(Debug, Serialize)]
pub(crate) struct Variables<'a> {
    pub(crate) owner: &'a str,
    pub(crate) name: &'a str,
    pub(crate) num: u32,
    #[serde(rename = "refName")]
    pub(crate) ref_name: &'a str,
}

impl<'a> Request<'a> {
    pub(crate) const fn new(owner: &'a str, name: &'a str, ref_name: &'a str, num: u32) -> Self {
        Self {
            query: REPOSITORY_HASHES,
            operation_name: "repositoryHashes",
            variables: Variables {
                owner,
                name,
                num,
                ref_name,
            },
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct Response {
    pub(crate) data: Option<ResponseData>,
    #[serde(default)]
    pub(crate) errors: Vec<ErrorEntry>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ErrorEntry {
    #[serde(rename = "type")]
    pub(crate) kind: Option<String>,
    #[serde(default)]
    pub(crate) message: String,
}

impl ErrorEntry {
    pub(crate) fn is_not_found(&self) -> bool {
        self.kind.as_deref() == Some("NOT_FOUND")
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct ResponseData {
    pub(crate) repository: Option<RepositoryNode>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RepositoryNode {
    #[serde(rename = "ref")]
    pub(crate) git_ref: Option<RefNode>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RefNode {
    pub(crate) target: Option<TargetNode>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct TargetNode {
    pub(crate) history: Option<HistoryConnection>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct HistoryConnection {
    pub(crate) page_info: PageInfo,
    pub(crate) edges: Vec<Edge>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct PageInfo {
    pub(crate) has_next_page: bool,
}

#[derive(Debug, Deserialize)]
pub(crate) struct Edge {
    pub(crate) node: CommitRecord,
}
