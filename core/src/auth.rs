//! Credentials and how they are attached to a request target.
//!
//! # Design
//! Pinboard accepts either HTTP basic auth or an `auth_token=user:TOKEN`
//! query parameter. Exactly one is attached per request: the token when one is
//! configured, the password otherwise. Credentials are checked on every call
//! rather than at construction so a client can be built from partial config
//! and fail with `ApiError::Config` at the point of use.

use std::fmt;

use url::Url;

use crate::error::ApiError;

pub(crate) const AUTH_TOKEN_PARAM: &str = "auth_token";

/// Username plus a password and/or a long-lived API token.
///
/// Empty strings are treated as absent.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Credentials {
    username: String,
    password: Option<String>,
    token: Option<String>,
}

/// How a request is authenticated, resolved from `Credentials`.
#[derive(Debug, PartialEq, Eq)]
pub(crate) enum AuthMode<'a> {
    Token { username: &'a str, token: &'a str },
    Basic { username: &'a str, password: &'a str },
}

impl Credentials {
    /// Credentials with a username only. Calls fail until a password or
    /// token is added.
    pub fn new(username: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: None,
            token: None,
        }
    }

    pub fn with_password(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self::new(username).password(password)
    }

    pub fn with_token(username: impl Into<String>, token: impl Into<String>) -> Self {
        Self::new(username).token(token)
    }

    pub fn password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(password.into()).filter(|p| !p.is_empty());
        self
    }

    pub fn token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into()).filter(|t| !t.is_empty());
        self
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub(crate) fn mode(&self) -> Result<AuthMode<'_>, ApiError> {
        if self.username.is_empty() {
            return Err(ApiError::Config("a username is required".to_string()));
        }
        match (&self.token, &self.password) {
            (Some(token), _) => Ok(AuthMode::Token {
                username: &self.username,
                token,
            }),
            (None, Some(password)) => Ok(AuthMode::Basic {
                username: &self.username,
                password,
            }),
            (None, None) => Err(ApiError::Config(
                "either a password or an API token is required".to_string(),
            )),
        }
    }

    /// Attach these credentials to `url`, replacing any already present.
    pub(crate) fn apply(&self, url: &mut Url) -> Result<(), ApiError> {
        let mode = self.mode()?;

        let retained: Vec<(String, String)> = url
            .query_pairs()
            .filter(|(key, _)| key != AUTH_TOKEN_PARAM)
            .map(|(key, value)| (key.into_owned(), value.into_owned()))
            .collect();
        url.set_query(None);
        if !retained.is_empty() {
            url.query_pairs_mut().extend_pairs(retained);
        }

        let userinfo = match mode {
            AuthMode::Token { username, token } => {
                url.query_pairs_mut()
                    .append_pair(AUTH_TOKEN_PARAM, &format!("{username}:{token}"));
                None
            }
            AuthMode::Basic { username, password } => Some((username, password)),
        };

        let (username, password) = userinfo.unwrap_or(("", ""));
        let password = Some(password).filter(|p| !p.is_empty());
        url.set_username(username)
            .and_then(|()| url.set_password(password))
            .map_err(|()| {
                ApiError::Config(format!("cannot embed credentials in base URL {url}"))
            })
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "***"))
            .field("token", &self.token.as_ref().map(|_| "***"))
            .finish()
    }
}
