//! Typed decoding of Pinboard XML bodies.
//!
//! # Design
//! Each response family has an `Envelope`: the serde shape of its root
//! element plus a conversion into the value the operation returns. `decode`
//! is generic over the envelope, so every operation gets its declared output
//! type back directly. Errors carry the path of the offending field, as
//! reported by `serde_path_to_error`.
//!
//! The serde layer ignores the root tag, so `decode` first checks it against
//! the envelope's name with a raw `Reader`. A `<result>` body where posts
//! were expected is an error, not an empty list.

use chrono::{DateTime, Utc};
use quick_xml::events::Event;
use quick_xml::Reader;
use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::error::ApiError;
use crate::types::{Note, Post, PostDate, Tag, TagSuggestions};

/// The root shape of one response family.
pub(crate) trait Envelope: DeserializeOwned {
    /// Root element name, used in error messages.
    const NAME: &'static str;
    type Output;

    fn into_output(self) -> Self::Output;

    /// Complete the output with access to the raw body, for shapes that need
    /// more than serde gives them.
    fn finish(self, _body: &str) -> Result<Self::Output, ApiError> {
        Ok(self.into_output())
    }
}

const ROOT_PATH: &str = "<root>";

pub(crate) fn decode<E: Envelope>(body: &str) -> Result<E::Output, ApiError> {
    expect_root(body, E::NAME)?;
    let mut deserializer = quick_xml::de::Deserializer::from_str(body);
    let envelope = serde_path_to_error::deserialize::<_, E>(&mut deserializer).map_err(|err| {
        let path = err.path().to_string();
        decode_error(E::NAME, path, err.into_inner().to_string())
    })?;
    envelope.finish(body)
}

fn decode_error(shape: &'static str, path: impl Into<String>, message: impl Into<String>) -> ApiError {
    ApiError::Decode {
        shape,
        path: path.into(),
        message: message.into(),
    }
}

/// The first element of `body` must be `<name>`.
fn expect_root(body: &str, name: &'static str) -> Result<(), ApiError> {
    let mut reader = Reader::from_str(body);
    loop {
        match reader.read_event() {
            Ok(Event::Start(e) | Event::Empty(e)) => {
                let found = e.local_name();
                if found.as_ref() == name.as_bytes() {
                    return Ok(());
                }
                let found = String::from_utf8_lossy(found.as_ref()).into_owned();
                return Err(decode_error(
                    name,
                    ROOT_PATH,
                    format!("expected <{name}> document, found <{found}>"),
                ));
            }
            Ok(Event::Eof) => {
                return Err(decode_error(name, ROOT_PATH, "document has no root element"))
            }
            Ok(_) => {}
            Err(e) => return Err(decode_error(name, ROOT_PATH, e.to_string())),
        }
    }
}

/// Text of the first `<child>` directly under the root, byte for byte.
///
/// quick-xml's deserializer trims element text; this reads the raw events
/// instead so leading indentation and trailing newlines survive.
fn child_text(body: &str, shape: &'static str, child: &str) -> Result<Option<String>, ApiError> {
    let mut reader = Reader::from_str(body);
    let mut depth = 0usize;
    let mut text: Option<String> = None;
    loop {
        let event = reader
            .read_event()
            .map_err(|e| decode_error(shape, child, e.to_string()))?;
        match event {
            Event::Start(e) => {
                depth += 1;
                if depth == 2 && e.local_name().as_ref() == child.as_bytes() {
                    text = Some(String::new());
                }
            }
            Event::Empty(e) if depth == 1 && e.local_name().as_ref() == child.as_bytes() => {
                return Ok(Some(String::new()));
            }
            Event::Text(t) => {
                if let Some(buf) = text.as_mut() {
                    let unescaped = t
                        .unescape()
                        .map_err(|e| decode_error(shape, child, e.to_string()))?;
                    buf.push_str(&unescaped);
                }
            }
            Event::CData(c) => {
                if let Some(buf) = text.as_mut() {
                    buf.push_str(&String::from_utf8_lossy(&c));
                }
            }
            Event::End(_) => {
                if depth == 2 && text.is_some() {
                    return Ok(text);
                }
                depth = depth.saturating_sub(1);
            }
            Event::Eof => return Ok(None),
            _ => {}
        }
    }
}

/// `<posts user=".." dt=".." tag=".."><post .../>...</posts>`
#[derive(Debug, Deserialize)]
pub(crate) struct Posts {
    #[serde(rename = "post", default)]
    posts: Vec<Post>,
}

impl Envelope for Posts {
    const NAME: &'static str = "posts";
    type Output = Vec<Post>;

    fn into_output(self) -> Vec<Post> {
        self.posts
    }
}

/// `<tags><tag count=".." tag=".."/>...</tags>`
#[derive(Debug, Deserialize)]
pub(crate) struct Tags {
    #[serde(rename = "tag", default)]
    tags: Vec<Tag>,
}

impl Envelope for Tags {
    const NAME: &'static str = "tags";
    type Output = Vec<Tag>;

    fn into_output(self) -> Vec<Tag> {
        self.tags
    }
}

/// `<dates user=".." tag=".."><date date=".." count=".."/>...</dates>`
#[derive(Debug, Deserialize)]
pub(crate) struct Dates {
    #[serde(rename = "date", default)]
    dates: Vec<PostDate>,
}

impl Envelope for Dates {
    const NAME: &'static str = "dates";
    type Output = Vec<PostDate>;

    fn into_output(self) -> Vec<PostDate> {
        self.dates
    }
}

/// `<notes count=".."><note id="..">...</note>...</notes>`
#[derive(Debug, Deserialize)]
pub(crate) struct Notes {
    #[serde(rename = "note", default)]
    notes: Vec<Note>,
}

impl Envelope for Notes {
    const NAME: &'static str = "notes";
    type Output = Vec<Note>;

    fn into_output(self) -> Vec<Note> {
        self.notes
    }
}

impl Envelope for Note {
    const NAME: &'static str = "note";
    type Output = Note;

    fn into_output(self) -> Note {
        self
    }

    fn finish(mut self, body: &str) -> Result<Note, ApiError> {
        if let Some(text) = child_text(body, Self::NAME, "text")? {
            self.text = text;
        }
        Ok(self)
    }
}

impl Envelope for TagSuggestions {
    const NAME: &'static str = "suggested";
    type Output = TagSuggestions;

    fn into_output(self) -> TagSuggestions {
        self
    }
}

/// `<update time=".."/>`
#[derive(Debug, Deserialize)]
pub(crate) struct Update {
    #[serde(rename = "@time", deserialize_with = "crate::codec::rfc3339")]
    time: DateTime<Utc>,
}

impl Envelope for Update {
    const NAME: &'static str = "update";
    type Output = DateTime<Utc>;

    fn into_output(self) -> DateTime<Utc> {
        self.time
    }
}

/// `<result code=".."/>` or `<result>..</result>`.
///
/// Writes report their outcome as a result code; user endpoints return their
/// value as the element text.
#[derive(Debug, Deserialize)]
pub(crate) struct ResultText {
    #[serde(rename = "@code", default)]
    code: Option<String>,
    #[serde(rename = "$text", default)]
    text: Option<String>,
}

impl Envelope for ResultText {
    const NAME: &'static str = "result";
    type Output = String;

    fn into_output(self) -> String {
        self.code
            .or(self.text)
            .map(|value| value.trim().to_string())
            .unwrap_or_default()
    }
}
