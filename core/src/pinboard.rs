//! One call per remote action: build, execute, parse.
//!
//! # Design
//! `Pinboard` pairs a `PinboardClient` with a `Transport` and exposes each
//! endpoint as a single blocking method. Validation runs inside `build_*`, so
//! a rejected input never reaches the transport. Nothing is retried; the
//! first failure is returned as is.

use chrono::{DateTime, Utc};

use crate::client::PinboardClient;
use crate::config::Config;
use crate::error::ApiError;
use crate::http::{HttpRequest, HttpResponse, Transport};
use crate::types::{
    NewPost, Note, Post, PostDate, PostsAllFilter, PostsGetFilter, PostsRecentFilter, Tag,
    TagSuggestions,
};

/// A Pinboard client bound to a transport.
#[derive(Debug, Clone)]
pub struct Pinboard<T> {
    client: PinboardClient,
    transport: T,
}

#[cfg(feature = "ureq")]
impl Pinboard<crate::transport::UreqTransport> {
    /// A client that talks HTTP through `ureq`, honouring `config.timeout`
    /// and `config.max_response_bytes`.
    pub fn new(config: &Config) -> Self {
        Self::with_transport(config, crate::transport::UreqTransport::from_config(config))
    }
}

impl<T: Transport> Pinboard<T> {
    pub fn with_transport(config: &Config, transport: T) -> Self {
        Self {
            client: PinboardClient::new(config),
            transport,
        }
    }

    pub fn client(&self) -> &PinboardClient {
        &self.client
    }

    fn call<R>(
        &self,
        request: Result<HttpRequest, ApiError>,
        parse: impl FnOnce(&PinboardClient, HttpResponse) -> Result<R, ApiError>,
    ) -> Result<R, ApiError> {
        let request = request?;
        let response = self.transport.execute(&request)?;
        parse(&self.client, response)
    }

    pub fn posts_update(&self) -> Result<DateTime<Utc>, ApiError> {
        self.call(
            self.client.build_posts_update(),
            PinboardClient::parse_posts_update,
        )
    }

    pub fn posts_add(&self, post: &NewPost) -> Result<(), ApiError> {
        self.call(
            self.client.build_posts_add(post),
            PinboardClient::parse_posts_add,
        )
    }

    pub fn posts_delete(&self, url: &str) -> Result<(), ApiError> {
        self.call(
            self.client.build_posts_delete(url),
            PinboardClient::parse_posts_delete,
        )
    }

    pub fn posts_get(&self, filter: &PostsGetFilter) -> Result<Vec<Post>, ApiError> {
        self.call(
            self.client.build_posts_get(filter),
            PinboardClient::parse_posts_get,
        )
    }

    pub fn posts_recent(&self, filter: &PostsRecentFilter) -> Result<Vec<Post>, ApiError> {
        self.call(
            self.client.build_posts_recent(filter),
            PinboardClient::parse_posts_recent,
        )
    }

    pub fn posts_dates(&self, tag: Option<&str>) -> Result<Vec<PostDate>, ApiError> {
        self.call(
            self.client.build_posts_dates(tag),
            PinboardClient::parse_posts_dates,
        )
    }

    pub fn posts_all(&self, filter: &PostsAllFilter) -> Result<Vec<Post>, ApiError> {
        self.call(
            self.client.build_posts_all(filter),
            PinboardClient::parse_posts_all,
        )
    }

    pub fn posts_suggest(&self, url: &str) -> Result<TagSuggestions, ApiError> {
        self.call(
            self.client.build_posts_suggest(url),
            PinboardClient::parse_posts_suggest,
        )
    }

    pub fn tags_get(&self) -> Result<Vec<Tag>, ApiError> {
        self.call(self.client.build_tags_get(), PinboardClient::parse_tags_get)
    }

    pub fn tags_delete(&self, tag: &str) -> Result<(), ApiError> {
        self.call(
            self.client.build_tags_delete(tag),
            PinboardClient::parse_tags_delete,
        )
    }

    pub fn tags_rename(&self, old: &str, new: &str) -> Result<(), ApiError> {
        self.call(
            self.client.build_tags_rename(old, new),
            PinboardClient::parse_tags_rename,
        )
    }

    pub fn user_secret(&self) -> Result<String, ApiError> {
        self.call(
            self.client.build_user_secret(),
            PinboardClient::parse_user_secret,
        )
    }

    pub fn user_api_token(&self) -> Result<String, ApiError> {
        self.call(
            self.client.build_user_api_token(),
            PinboardClient::parse_user_api_token,
        )
    }

    pub fn notes_list(&self) -> Result<Vec<Note>, ApiError> {
        self.call(
            self.client.build_notes_list(),
            PinboardClient::parse_notes_list,
        )
    }

    pub fn notes_get(&self, id: &str) -> Result<Note, ApiError> {
        self.call(
            self.client.build_notes_get(id),
            PinboardClient::parse_notes_get,
        )
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use super::*;
    use crate::auth::Credentials;

    /// Records every request and answers with a fixed response.
    struct Recording {
        calls: RefCell<Vec<HttpRequest>>,
        response: HttpResponse,
    }

    impl Recording {
        fn answering(status: u16, body: &str) -> Self {
            Self {
                calls: RefCell::new(Vec::new()),
                response: HttpResponse {
                    status,
                    body: body.to_string(),
                },
            }
        }
    }

    impl Transport for Recording {
        fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, ApiError> {
            self.calls.borrow_mut().push(request.clone());
            Ok(self.response.clone())
        }
    }

    struct Unreachable;

    impl Transport for Unreachable {
        fn execute(&self, _request: &HttpRequest) -> Result<HttpResponse, ApiError> {
            Err(ApiError::Transport("connection refused".to_string()))
        }
    }

    fn config() -> Config {
        Config::new(Credentials::with_token("drags", "T"))
    }

    #[test]
    fn invalid_input_never_reaches_transport() {
        let transport = Recording::answering(200, r#"<result code="done"/>"#);
        let pinboard = Pinboard::with_transport(&config(), &transport);

        let err = pinboard
            .posts_add(&NewPost::new("gopher://x.example", "d"))
            .unwrap_err();
        assert!(err.is_validation());

        let filter = PostsRecentFilter {
            tags: ["a", "b", "c", "d"].map(String::from).to_vec(),
            count: None,
        };
        assert!(pinboard.posts_recent(&filter).unwrap_err().is_validation());
        assert!(transport.calls.borrow().is_empty());
    }

    #[test]
    fn missing_credentials_never_reach_transport() {
        let transport = Recording::answering(200, "<tags/>");
        let pinboard =
            Pinboard::with_transport(&Config::new(Credentials::new("drags")), &transport);
        assert!(matches!(pinboard.tags_get(), Err(ApiError::Config(_))));
        assert!(transport.calls.borrow().is_empty());
    }

    #[test]
    fn successful_call_sends_one_request() {
        let transport = Recording::answering(200, r#"<tags><tag count="2" tag="rust"/></tags>"#);
        let pinboard = Pinboard::with_transport(&config(), &transport);
        let tags = pinboard.tags_get().unwrap();
        assert_eq!(tags[0].name, "rust");
        let calls = transport.calls.borrow();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].url.path(), "/v1/tags/get");
    }

    #[test]
    fn failures_are_not_retried() {
        let transport = Recording::answering(500, "Internal Server Error");
        let pinboard = Pinboard::with_transport(&config(), &transport);
        let err = pinboard.user_secret().unwrap_err();
        assert!(err.is_transport());
        assert_eq!(transport.calls.borrow().len(), 1);
    }

    #[test]
    fn transport_errors_pass_through() {
        let pinboard = Pinboard::with_transport(&config(), Unreachable);
        let err = pinboard.notes_list().unwrap_err();
        assert!(matches!(err, ApiError::Transport(_)));
    }
}
