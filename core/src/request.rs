//! Request construction and input validation.
//!
//! # Design
//! `RequestBuilder` accumulates query parameters for one endpoint and attaches
//! credentials last, producing an `HttpRequest`. Filters and payloads
//! implement `QueryParams`, which validates them and writes their
//! parameters. Every check runs before a request exists, so invalid input
//! never reaches the transport.

use url::Url;

use crate::auth::Credentials;
use crate::codec::{self, TagList};
use crate::error::ApiError;
use crate::http::HttpRequest;
use crate::types::{NewPost, PostsAllFilter, PostsGetFilter, PostsRecentFilter};

/// URL schemes Pinboard accepts for bookmarks.
pub const VALID_SCHEMES: &[&str] = &[
    "http",
    "https",
    "javascript",
    "mailto",
    "ftp",
    "file",
    "feed",
];

pub const MAX_DESCRIPTION_LEN: usize = 255;
pub const MAX_EXTENDED_LEN: usize = 65536;
pub const MAX_TAG_LEN: usize = 255;
pub const MAX_POST_TAGS: usize = 100;
pub const MAX_FILTER_TAGS: usize = 3;
pub const MAX_RECENT_COUNT: u32 = 100;
pub const NOTE_ID_LEN: usize = 20;

pub(crate) struct RequestBuilder {
    url: Url,
}

impl RequestBuilder {
    /// Start a request for `path`, relative to the API root.
    pub(crate) fn new(base_url: &Url, path: &str) -> Result<Self, ApiError> {
        let url = base_url
            .join(path)
            .map_err(|e| ApiError::Config(format!("cannot join {path:?} to {base_url}: {e}")))?;
        Ok(Self { url })
    }

    pub(crate) fn param(mut self, key: &str, value: impl AsRef<str>) -> Self {
        self.url.query_pairs_mut().append_pair(key, value.as_ref());
        self
    }

    /// One `key=value` pair per value, preserving order.
    pub(crate) fn params<I, S>(mut self, key: &str, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for value in values {
            self = self.param(key, value);
        }
        self
    }

    pub(crate) fn query(self, params: &impl QueryParams) -> Result<Self, ApiError> {
        params.write(self)
    }

    pub(crate) fn build(mut self, credentials: &Credentials) -> Result<HttpRequest, ApiError> {
        credentials.apply(&mut self.url)?;
        Ok(HttpRequest { url: self.url })
    }
}

/// A filter or payload that validates itself and writes query parameters.
pub(crate) trait QueryParams {
    fn write(&self, builder: RequestBuilder) -> Result<RequestBuilder, ApiError>;
}

impl QueryParams for PostsGetFilter {
    fn write(&self, mut builder: RequestBuilder) -> Result<RequestBuilder, ApiError> {
        validate_tags("tags", &self.tags, MAX_FILTER_TAGS)?;
        builder = builder.params("tag", &self.tags);
        if let Some(date) = &self.date {
            builder = builder.param("dt", date.encode());
        }
        if let Some(url) = &self.url {
            validate_url("url", url)?;
            builder = builder.param("url", url);
        }
        if self.meta {
            builder = builder.param("meta", "yes");
        }
        Ok(builder)
    }
}

impl QueryParams for PostsRecentFilter {
    fn write(&self, mut builder: RequestBuilder) -> Result<RequestBuilder, ApiError> {
        validate_tags("tags", &self.tags, MAX_FILTER_TAGS)?;
        if let Some(count) = self.count {
            if count == 0 || count > MAX_RECENT_COUNT {
                return Err(ApiError::validation(
                    "count",
                    format!("must be between 1 and {MAX_RECENT_COUNT}, got {count}"),
                ));
            }
            builder = builder.param("count", count.to_string());
        }
        Ok(builder.params("tag", &self.tags))
    }
}

impl QueryParams for PostsAllFilter {
    fn write(&self, mut builder: RequestBuilder) -> Result<RequestBuilder, ApiError> {
        validate_tags("tags", &self.tags, MAX_FILTER_TAGS)?;
        if let (Some(from), Some(to)) = (&self.from, &self.to) {
            if from > to {
                return Err(ApiError::validation(
                    "from",
                    format!("{from} is after the end of the range {to}"),
                ));
            }
        }
        builder = builder.params("tag", &self.tags);
        if let Some(start) = self.start {
            builder = builder.param("start", start.to_string());
        }
        if let Some(results) = self.results {
            builder = builder.param("results", results.to_string());
        }
        if let Some(from) = &self.from {
            builder = builder.param("fromdt", codec::encode_rfc3339(from));
        }
        if let Some(to) = &self.to {
            builder = builder.param("todt", codec::encode_rfc3339(to));
        }
        if self.meta {
            builder = builder.param("meta", "yes");
        }
        Ok(builder)
    }
}

impl QueryParams for NewPost {
    fn write(&self, mut builder: RequestBuilder) -> Result<RequestBuilder, ApiError> {
        validate_url("url", &self.url)?;
        validate_length("description", &self.description, 1, MAX_DESCRIPTION_LEN)?;
        validate_length("extended", &self.extended, 0, MAX_EXTENDED_LEN)?;
        validate_tags("tags", &self.tags, MAX_POST_TAGS)?;
        let shared = self
            .shared
            .as_deref()
            .map(|value| validate_yes_no("shared", value))
            .transpose()?;

        builder = builder
            .param("url", &self.url)
            .param("description", &self.description);
        if !self.extended.is_empty() {
            builder = builder.param("extended", &self.extended);
        }
        if !self.tags.is_empty() {
            builder = builder.param("tags", TagList::encode(&self.tags));
        }
        if let Some(time) = &self.time {
            builder = builder.param("dt", codec::encode_rfc3339(time));
        }
        builder = builder.param("replace", codec::encode_yes_no(self.replace));
        if let Some(shared) = shared {
            builder = builder.param("shared", shared);
        }
        if self.toread {
            builder = builder.param("toread", "yes");
        }
        Ok(builder)
    }
}

/// Parse `value` as a URL with a scheme Pinboard accepts.
pub(crate) fn validate_url(field: &'static str, value: &str) -> Result<(), ApiError> {
    if value.is_empty() {
        return Err(ApiError::validation(field, "a URL is required"));
    }
    let parsed = Url::parse(value)
        .map_err(|e| ApiError::validation(field, format!("{value:?} is not a URL: {e}")))?;
    if !VALID_SCHEMES.contains(&parsed.scheme()) {
        return Err(ApiError::validation(
            field,
            format!(
                "scheme {:?} is not one of {}",
                parsed.scheme(),
                VALID_SCHEMES.join(", ")
            ),
        ));
    }
    Ok(())
}

/// Length in characters, inclusive bounds.
pub(crate) fn validate_length(
    field: &'static str,
    value: &str,
    min: usize,
    max: usize,
) -> Result<(), ApiError> {
    let len = value.chars().count();
    if len < min || len > max {
        return Err(ApiError::validation(
            field,
            format!("length must be between {min} and {max} characters, got {len}"),
        ));
    }
    Ok(())
}

/// A single tag: 1 to 255 characters, no whitespace.
pub(crate) fn validate_tag(field: &'static str, tag: &str) -> Result<(), ApiError> {
    validate_length(field, tag, 1, MAX_TAG_LEN)?;
    if tag.chars().any(char::is_whitespace) {
        return Err(ApiError::validation(
            field,
            format!("tag {tag:?} must not contain whitespace"),
        ));
    }
    Ok(())
}

pub(crate) fn validate_tags(
    field: &'static str,
    tags: &[String],
    max: usize,
) -> Result<(), ApiError> {
    if tags.len() > max {
        return Err(ApiError::validation(
            field,
            format!("at most {max} tags are allowed, got {}", tags.len()),
        ));
    }
    tags.iter().try_for_each(|tag| validate_tag(field, tag))
}

/// Canonical lower-case `yes`/`no` for a case-insensitive token.
pub(crate) fn validate_yes_no(field: &'static str, value: &str) -> Result<&'static str, ApiError> {
    codec::parse_yes_no(value)
        .map(codec::encode_yes_no)
        .ok_or_else(|| ApiError::validation(field, format!("expected yes or no, got {value:?}")))
}

pub(crate) fn validate_note_id(id: &str) -> Result<(), ApiError> {
    let well_formed = id.len() == NOTE_ID_LEN
        && id
            .bytes()
            .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit());
    if !well_formed {
        return Err(ApiError::validation(
            "note_id",
            format!("expected {NOTE_ID_LEN} characters of [a-z0-9], got {id:?}"),
        ));
    }
    Ok(())
}
