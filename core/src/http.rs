//! HTTP transport types for the host-does-IO pattern.
//!
//! # Design
//! These types describe requests and responses as plain data. The core builds
//! `HttpRequest` values and parses `HttpResponse` values without touching the
//! network; a `Transport` implementation performs the actual round trip.
//! Every Pinboard v1 call is a GET, so a request is fully described by its
//! target URL, credentials included.

use percent_encoding::percent_decode_str;
use url::Url;

use crate::auth::AUTH_TOKEN_PARAM;
use crate::error::ApiError;

/// A GET request described as plain data.
///
/// Built by `PinboardClient::build_*` methods. Credentials are already
/// attached, either as URL userinfo or as the `auth_token` query parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    pub url: Url,
}

impl HttpRequest {
    /// Percent-decoded basic-auth pair embedded in the URL, if any.
    pub fn basic_auth(&self) -> Option<(String, String)> {
        let username = self.url.username();
        if username.is_empty() {
            return None;
        }
        let decode = |raw: &str| percent_decode_str(raw).decode_utf8_lossy().into_owned();
        Some((
            decode(username),
            decode(self.url.password().unwrap_or_default()),
        ))
    }

    /// The target with any userinfo removed, for transports that send basic
    /// auth as a header.
    pub fn url_without_userinfo(&self) -> Url {
        let mut url = self.url.clone();
        // Cannot fail: the URL already carried userinfo or carries none.
        let _ = url.set_username("");
        let _ = url.set_password(None);
        url
    }

    /// All values of a query parameter, in order.
    pub fn query_values(&self, key: &str) -> Vec<String> {
        self.url
            .query_pairs()
            .filter(|(k, _)| k == key)
            .map(|(_, v)| v.into_owned())
            .collect()
    }

    /// The target with secrets masked, safe to log.
    pub fn redacted(&self) -> String {
        let mut url = self.url.clone();
        if url.password().is_some() {
            let _ = url.set_password(Some("***"));
        }
        if url.query_pairs().any(|(k, _)| k == AUTH_TOKEN_PARAM) {
            let pairs: Vec<(String, String)> = url
                .query_pairs()
                .map(|(k, v)| {
                    let v = if k == AUTH_TOKEN_PARAM {
                        let user = v.split(':').next().unwrap_or_default();
                        format!("{user}:***")
                    } else {
                        v.into_owned()
                    };
                    (k.into_owned(), v)
                })
                .collect();
            url.query_pairs_mut().clear().extend_pairs(pairs);
        }
        url.to_string()
    }
}

/// An HTTP response described as plain data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        self.status < 400
    }
}

/// Performs the blocking GET for an `HttpRequest`.
///
/// Implementations return `Ok` for every response the server produced,
/// whatever its status; status interpretation belongs to the client.
/// `Err` is reserved for failures below HTTP and should be
/// `ApiError::Transport`.
pub trait Transport {
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, ApiError>;
}

impl<T: Transport + ?Sized> Transport for &T {
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, ApiError> {
        (**self).execute(request)
    }
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, ApiError> {
        (**self).execute(request)
    }
}
