//! Domain records and filter objects for the Pinboard API.
//!
//! # Design
//! Records (`Post`, `Tag`, `Note`, `PostDate`, `TagSuggestions`) are decoded
//! straight from Pinboard's XML. Attribute-carried fields are renamed with the
//! `@` prefix quick-xml uses for attributes. Every field the server may omit
//! has a default, so a sparse response yields zero values rather than an
//! error.
//!
//! Filters and `NewPost` are plain value bags owned by the caller. They are
//! validated when a request is built, never on construction.

use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::codec::{self, TagList, UtcDate, UtcDateTime};

/// A bookmark.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Post {
    #[serde(rename = "@href", default)]
    pub url: String,
    #[serde(rename = "@description", default)]
    pub description: String,
    #[serde(rename = "@extended", default)]
    pub extended: String,
    #[serde(rename = "@tag", default)]
    pub tags: TagList,
    #[serde(rename = "@time", default, deserialize_with = "codec::optional_rfc3339")]
    pub time: Option<DateTime<Utc>>,
    #[serde(rename = "@hash", default)]
    pub hash: String,
    /// Changes whenever any field of the post changes.
    #[serde(rename = "@meta", default)]
    pub meta: String,
    #[serde(rename = "@shared", default, deserialize_with = "codec::yes_no")]
    pub shared: bool,
    #[serde(rename = "@toread", default, deserialize_with = "codec::yes_no")]
    pub toread: bool,
}

/// A tag and the number of posts carrying it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Tag {
    #[serde(rename = "@tag", default)]
    pub name: String,
    #[serde(rename = "@count", default)]
    pub count: u32,
}

/// Number of posts saved on one day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct PostDate {
    #[serde(rename = "@date")]
    pub date: UtcDate,
    #[serde(rename = "@count", default)]
    pub count: u32,
}

/// Tags Pinboard suggests for a URL.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct TagSuggestions {
    /// Tags other users applied to the URL.
    #[serde(default)]
    pub popular: Vec<String>,
    /// Tags drawn from the caller's own account.
    #[serde(default)]
    pub recommended: Vec<String>,
}

/// A note, in either its list form or its single form.
///
/// `notes/list` leaves `text` empty; `notes/{id}` fills it. Text may contain
/// newlines.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Note {
    #[serde(rename = "@id", default)]
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub hash: String,
    #[serde(default, deserialize_with = "codec::optional")]
    pub created_at: Option<UtcDateTime>,
    #[serde(default, deserialize_with = "codec::optional")]
    pub updated_at: Option<UtcDateTime>,
    #[serde(default)]
    pub length: u64,
    #[serde(default)]
    pub text: String,
}

/// Filter for `posts/get`.
///
/// With no date, the server returns posts from the most recent day with any
/// posts. With a URL, only that post is returned. A post must carry every
/// given tag to match.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PostsGetFilter {
    pub tags: Vec<String>,
    pub date: Option<UtcDate>,
    pub url: Option<String>,
    pub meta: bool,
}

/// Filter for `posts/recent`. The server returns 15 posts when no count is
/// given.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PostsRecentFilter {
    pub tags: Vec<String>,
    pub count: Option<u32>,
}

/// Filter for `posts/all`. With every field unset the whole account is
/// returned.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PostsAllFilter {
    pub tags: Vec<String>,
    /// Offset into the result set.
    pub start: Option<u32>,
    /// Number of results to return.
    pub results: Option<u32>,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
    pub meta: bool,
}

/// Payload for `posts/add`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPost {
    pub url: String,
    pub description: String,
    pub extended: String,
    pub tags: TagList,
    /// Creation time to record; the server uses "now" when unset.
    pub time: Option<DateTime<Utc>>,
    /// Replace an existing post with the same URL instead of rejecting the add.
    pub replace: bool,
    /// `yes` or `no`, any case. Left to the account default when unset.
    pub shared: Option<String>,
    pub toread: bool,
}

impl NewPost {
    pub fn new(url: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            description: description.into(),
            extended: String::new(),
            tags: TagList::new(),
            time: None,
            replace: true,
            shared: None,
            toread: false,
        }
    }
}

impl From<&Post> for NewPost {
    fn from(post: &Post) -> Self {
        Self {
            url: post.url.clone(),
            description: post.description.clone(),
            extended: post.extended.clone(),
            tags: post.tags.clone(),
            time: post.time,
            replace: true,
            shared: Some(codec::encode_yes_no(post.shared).to_string()),
            toread: post.toread,
        }
    }
}
