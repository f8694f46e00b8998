// git-cloner: repository mirror sync
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Access credential shared by the GraphQL client and the clone transport.
//!
//! ```text
//! ApiConfig::credential(lookup) --> Credential
//!                                      |
//!                 +--------------------+-------------------+
//!                 v                                        v
//!   authorization header                  basic auth (token, "x-oauth-basic")
//!   "token <value>"  --> GraphQlClient    --> git credential helper
//! ```
//!
//! Built once at startup and passed down explicitly.

use std::fmt;

/// Password paired with a token for GitHub basic auth over HTTPS.
const OAUTH_BASIC_PASSWORD: &str = "x-oauth-basic";

/// A pre-provisioned access credential. `Debug` never prints the secret.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Credential {
    authorization: Option<String>,
    token: Option<String>,
}

impl Credential {
    /// No credential; requests go out unauthenticated.
    #[must_use]
    pub const fn anonymous() -> Self {
        Self {
            authorization: None,
            token: None,
        }
    }

    /// Credential from a bare access token.
    #[must_use]
    pub fn token(token: impl Into<String>) -> Self {
        let token = token.into();
        Self {
            authorization: Some(format!("token {token}")),
            token: Some(token),
        }
    }

    /// Credential from a full `authorization` header value.
    ///
    /// `token X` and `bearer X` headers also expose `X` to the clone
    /// transport; any other scheme is sent to the API only.
    #[must_use]
    pub fn from_header(header: &str) -> Self {
        let header = header.trim();
        let token = header.split_once(' ').and_then(|(scheme, value)| {
            let scheme = scheme.to_ascii_lowercase();
            (scheme == "token" || scheme == "bearer")
                .then(|| value.trim().to_string())
                .filter(|v| !v.is_empty())
        });
        Self {
            authorization: Some(header.to_string()),
            token,
        }
    }

    #[must_use]
    pub fn authorization_header(&self) -> Option<&str> {
        self.authorization.as_deref()
    }

    /// Username/password pair for the clone transport.
    #[must_use]
    pub fn basic_auth(&self) -> Option<(&str, &str)> {
        self.token
            .as_deref()
            .map(|token| (token, OAUTH_BASIC_PASSWORD))
    }

    #[must_use]
    pub const fn is_anonymous(&self) -> bool {
        self.authorization.is_none()
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = if self.is_anonymous() {
            "anonymous"
        } else {
            "[hidden]"
        };
        f.debug_tuple("Credential").field(&state).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::Credential;

    #[test]
    fn test_token_credential() {
        let credential = Credential::token("abc123");
        assert_eq!(credential.authorization_header(), Some("token abc123"));
        assert_eq!(credential.basic_auth(), Some(("abc123", "x-oauth-basic")));
        assert!(!credential.is_anonymous());
    }

    #[test]
    fn test_header_credential_extracts_token() {
        let bearer = Credential::from_header("Bearer xyz");
        assert_eq!(bearer.authorization_header(), Some("Bearer xyz"));
        assert_eq!(bearer.basic_auth(), Some(("xyz", "x-oauth-basic")));

        let basic = Credential::from_header("Basic Zm9vOmJhcg==");
        assert_eq!(basic.basic_auth(), None);
    }

    #[test]
    fn test_debug_hides_secret() {
        let rendered = format!("{:?}", Credential::token("s3cret"));
        assert!(!rendered.contains("s3cret"));
        assert_eq!(format!("{:?}", Credential::anonymous()), "Credential(\"anonymous\")");
    }
}
