//! Stateless request builder and response parser for the Pinboard v1 API.
//!
//! # Design
//! `PinboardClient` holds only the API root and the credentials and carries no
//! mutable state between calls. Each remote action is split into a `build_*`
//! method that validates input and produces an authenticated `HttpRequest`,
//! and a `parse_*` method that consumes the `HttpResponse`. The caller (or
//! `Pinboard`) executes the round trip in between.

use chrono::{DateTime, Utc};
use tracing::{debug, warn};
use url::Url;

use crate::auth::Credentials;
use crate::config::Config;
use crate::decode::{self, Envelope};
use crate::error::ApiError;
use crate::http::{HttpRequest, HttpResponse};
use crate::request::{self, RequestBuilder};
use crate::types::{
    NewPost, Note, Post, PostDate, PostsAllFilter, PostsGetFilter, PostsRecentFilter, Tag,
    TagSuggestions,
};

/// Result code Pinboard reports for a successful write.
const DONE: &str = "done";

/// Synchronous, stateless client for the Pinboard v1 API.
#[derive(Debug, Clone)]
pub struct PinboardClient {
    base_url: Url,
    credentials: Credentials,
}

impl PinboardClient {
    pub fn new(config: &Config) -> Self {
        Self {
            base_url: config.base_url.clone(),
            credentials: config.credentials.clone(),
        }
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> Result<RequestBuilder, ApiError> {
        RequestBuilder::new(&self.base_url, path)
    }

    fn finish(&self, builder: RequestBuilder) -> Result<HttpRequest, ApiError> {
        let request = builder.build(&self.credentials)?;
        debug!(url = %request.redacted(), "built pinboard request");
        Ok(request)
    }

    // -----------------------------------------------------------------------
    // posts
    // -----------------------------------------------------------------------

    pub fn build_posts_update(&self) -> Result<HttpRequest, ApiError> {
        self.finish(self.endpoint("posts/update")?)
    }

    /// Time of the most recent change to any post in the account.
    pub fn parse_posts_update(&self, response: HttpResponse) -> Result<DateTime<Utc>, ApiError> {
        parse::<decode::Update>(response)
    }

    pub fn build_posts_add(&self, post: &NewPost) -> Result<HttpRequest, ApiError> {
        self.finish(self.endpoint("posts/add")?.query(post)?)
    }

    pub fn parse_posts_add(&self, response: HttpResponse) -> Result<(), ApiError> {
        expect_done(response)
    }

    /// The URL must be well formed even though deleting an unknown URL is
    /// not an error on the server.
    pub fn build_posts_delete(&self, url: &str) -> Result<HttpRequest, ApiError> {
        request::validate_url("url", url)?;
        self.finish(self.endpoint("posts/delete")?.param("url", url))
    }

    pub fn parse_posts_delete(&self, response: HttpResponse) -> Result<(), ApiError> {
        expect_done(response)
    }

    pub fn build_posts_get(&self, filter: &PostsGetFilter) -> Result<HttpRequest, ApiError> {
        self.finish(self.endpoint("posts/get")?.query(filter)?)
    }

    pub fn parse_posts_get(&self, response: HttpResponse) -> Result<Vec<Post>, ApiError> {
        parse::<decode::Posts>(response)
    }

    pub fn build_posts_recent(&self, filter: &PostsRecentFilter) -> Result<HttpRequest, ApiError> {
        self.finish(self.endpoint("posts/recent")?.query(filter)?)
    }

    pub fn parse_posts_recent(&self, response: HttpResponse) -> Result<Vec<Post>, ApiError> {
        parse::<decode::Posts>(response)
    }

    /// Posts-per-day histogram, optionally for one tag.
    pub fn build_posts_dates(&self, tag: Option<&str>) -> Result<HttpRequest, ApiError> {
        let mut builder = self.endpoint("posts/dates")?;
        if let Some(tag) = tag {
            request::validate_tag("tag", tag)?;
            builder = builder.param("tag", tag);
        }
        self.finish(builder)
    }

    pub fn parse_posts_dates(&self, response: HttpResponse) -> Result<Vec<PostDate>, ApiError> {
        parse::<decode::Dates>(response)
    }

    pub fn build_posts_all(&self, filter: &PostsAllFilter) -> Result<HttpRequest, ApiError> {
        self.finish(self.endpoint("posts/all")?.query(filter)?)
    }

    pub fn parse_posts_all(&self, response: HttpResponse) -> Result<Vec<Post>, ApiError> {
        parse::<decode::Posts>(response)
    }

    pub fn build_posts_suggest(&self, url: &str) -> Result<HttpRequest, ApiError> {
        request::validate_url("url", url)?;
        self.finish(self.endpoint("posts/suggest")?.param("url", url))
    }

    pub fn parse_posts_suggest(&self, response: HttpResponse) -> Result<TagSuggestions, ApiError> {
        parse::<TagSuggestions>(response)
    }

    // -----------------------------------------------------------------------
    // tags
    // -----------------------------------------------------------------------

    pub fn build_tags_get(&self) -> Result<HttpRequest, ApiError> {
        self.finish(self.endpoint("tags/get")?)
    }

    pub fn parse_tags_get(&self, response: HttpResponse) -> Result<Vec<Tag>, ApiError> {
        parse::<decode::Tags>(response)
    }

    /// Removes the tag from every post; there is no separate tag store.
    pub fn build_tags_delete(&self, tag: &str) -> Result<HttpRequest, ApiError> {
        request::validate_tag("tag", tag)?;
        self.finish(self.endpoint("tags/delete")?.param("tag", tag))
    }

    pub fn parse_tags_delete(&self, response: HttpResponse) -> Result<(), ApiError> {
        expect_done(response)
    }

    pub fn build_tags_rename(&self, old: &str, new: &str) -> Result<HttpRequest, ApiError> {
        request::validate_tag("old", old)?;
        request::validate_tag("new", new)?;
        self.finish(
            self.endpoint("tags/rename")?
                .param("old", old)
                .param("new", new),
        )
    }

    pub fn parse_tags_rename(&self, response: HttpResponse) -> Result<(), ApiError> {
        expect_done(response)
    }

    // -----------------------------------------------------------------------
    // user
    // -----------------------------------------------------------------------

    pub fn build_user_secret(&self) -> Result<HttpRequest, ApiError> {
        self.finish(self.endpoint("user/secret")?)
    }

    /// The secret RSS key for private feeds.
    pub fn parse_user_secret(&self, response: HttpResponse) -> Result<String, ApiError> {
        parse::<decode::ResultText>(response)
    }

    pub fn build_user_api_token(&self) -> Result<HttpRequest, ApiError> {
        self.finish(self.endpoint("user/api_token")?)
    }

    /// The token part of `user:TOKEN`.
    pub fn parse_user_api_token(&self, response: HttpResponse) -> Result<String, ApiError> {
        parse::<decode::ResultText>(response)
    }

    // -----------------------------------------------------------------------
    // notes
    // -----------------------------------------------------------------------

    pub fn build_notes_list(&self) -> Result<HttpRequest, ApiError> {
        self.finish(self.endpoint("notes/list")?)
    }

    /// Notes without their text.
    pub fn parse_notes_list(&self, response: HttpResponse) -> Result<Vec<Note>, ApiError> {
        parse::<decode::Notes>(response)
    }

    pub fn build_notes_get(&self, id: &str) -> Result<HttpRequest, ApiError> {
        request::validate_note_id(id)?;
        self.finish(self.endpoint(&format!("notes/{id}"))?)
    }

    pub fn parse_notes_get(&self, response: HttpResponse) -> Result<Note, ApiError> {
        parse::<Note>(response)
    }
}

/// Map a status of 400 or above to `ApiError::Http`, body verbatim.
fn check_status(response: &HttpResponse) -> Result<(), ApiError> {
    if response.is_success() {
        return Ok(());
    }
    warn!(status = response.status, "pinboard request failed");
    Err(ApiError::Http {
        status: response.status,
        body: response.body.clone(),
    })
}

fn parse<E: Envelope>(response: HttpResponse) -> Result<E::Output, ApiError> {
    check_status(&response)?;
    decode::decode::<E>(&response.body)
}

fn expect_done(response: HttpResponse) -> Result<(), ApiError> {
    let code = parse::<decode::ResultText>(response)?;
    if code != DONE {
        warn!(%code, "pinboard rejected write");
        return Err(ApiError::Rejected(code));
    }
    Ok(())
}
