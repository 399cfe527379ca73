//! Scalar codecs for values Pinboard carries as text.
//!
//! # Design
//! Each codec is a newtype with `Display` as its encoder and `FromStr` as its
//! decoder, so the same pair is used when building query strings and when
//! decoding XML attributes or elements. `UtcDate` and `UtcDateTime` are
//! distinct types and each rejects the other's wire format.

use std::fmt;
use std::ops::Deref;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, SubsecRound, Utc};
use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize, Serializer};
use thiserror::Error;

const DATE_FORMAT: &str = "%Y-%m-%d";
const DATE_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// A text value did not match the format its codec expects.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("expected {expected}, got {input:?}")]
pub struct FormatError {
    pub expected: &'static str,
    pub input: String,
}

impl FormatError {
    fn new(expected: &'static str, input: &str) -> Self {
        Self {
            expected,
            input: input.to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// Tag lists
// ---------------------------------------------------------------------------

/// Ordered list of tags, sent as a single space-joined string.
///
/// Duplicates are kept as given; the server decides what they mean.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TagList(Vec<String>);

impl TagList {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    pub fn encode(&self) -> String {
        self.0.join(" ")
    }

    /// Split on runs of whitespace. Never fails; empty input is an empty list.
    pub fn decode(input: &str) -> Self {
        Self(input.split_whitespace().map(str::to_string).collect())
    }

    pub fn push(&mut self, tag: impl Into<String>) {
        self.0.push(tag.into());
    }

    pub fn into_inner(self) -> Vec<String> {
        self.0
    }
}

impl Deref for TagList {
    type Target = [String];

    fn deref(&self) -> &[String] {
        &self.0
    }
}

impl From<Vec<String>> for TagList {
    fn from(tags: Vec<String>) -> Self {
        Self(tags)
    }
}

impl<S: Into<String>> FromIterator<S> for TagList {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}

impl fmt::Display for TagList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.encode())
    }
}

impl Serialize for TagList {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.encode())
    }
}

impl<'de> Deserialize<'de> for TagList {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(TagList::decode(&raw))
    }
}

// ---------------------------------------------------------------------------
// Dates
// ---------------------------------------------------------------------------

/// A calendar day in UTC, carried as `YYYY-MM-DD`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct UtcDate(NaiveDate);

impl UtcDate {
    pub fn from_ymd(year: i32, month: u32, day: u32) -> Option<Self> {
        NaiveDate::from_ymd_opt(year, month, day).map(Self)
    }

    pub fn naive(&self) -> NaiveDate {
        self.0
    }

    /// Midnight UTC at the start of this day.
    pub fn start_of_day(&self) -> DateTime<Utc> {
        self.0.and_time(NaiveTime::default()).and_utc()
    }

    pub fn encode(&self) -> String {
        self.0.format(DATE_FORMAT).to_string()
    }

    pub fn decode(input: &str) -> Result<Self, FormatError> {
        let date = NaiveDate::parse_from_str(input, DATE_FORMAT)
            .map_err(|_| FormatError::new("date as YYYY-MM-DD", input))?;
        let value = Self(date);
        // chrono accepts unpadded fields; the wire format does not.
        if value.encode() != input {
            return Err(FormatError::new("date as YYYY-MM-DD", input));
        }
        Ok(value)
    }
}

impl From<NaiveDate> for UtcDate {
    fn from(date: NaiveDate) -> Self {
        Self(date)
    }
}

impl From<DateTime<Utc>> for UtcDate {
    fn from(ts: DateTime<Utc>) -> Self {
        Self(ts.date_naive())
    }
}

/// A UTC timestamp at second precision, carried as `YYYY-MM-DD HH:MM:SS`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct UtcDateTime(DateTime<Utc>);

impl UtcDateTime {
    pub fn timestamp(&self) -> DateTime<Utc> {
        self.0
    }

    pub fn encode(&self) -> String {
        self.0.format(DATE_TIME_FORMAT).to_string()
    }

    pub fn decode(input: &str) -> Result<Self, FormatError> {
        let naive = NaiveDateTime::parse_from_str(input, DATE_TIME_FORMAT)
            .map_err(|_| FormatError::new("timestamp as YYYY-MM-DD HH:MM:SS", input))?;
        let value = Self(naive.and_utc());
        if value.encode() != input {
            return Err(FormatError::new("timestamp as YYYY-MM-DD HH:MM:SS", input));
        }
        Ok(value)
    }
}

impl From<DateTime<Utc>> for UtcDateTime {
    fn from(ts: DateTime<Utc>) -> Self {
        Self(ts.trunc_subsecs(0))
    }
}

macro_rules! text_codec {
    ($ty:ty) => {
        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.encode())
            }
        }

        impl FromStr for $ty {
            type Err = FormatError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::decode(s)
            }
        }

        impl Serialize for $ty {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_str(&self.encode())
            }
        }

        impl<'de> Deserialize<'de> for $ty {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let raw = String::deserialize(deserializer)?;
                Self::decode(&raw).map_err(de::Error::custom)
            }
        }
    };
}

text_codec!(UtcDate);
text_codec!(UtcDateTime);

/// Pinboard's RFC 3339 form for timestamps sent as query parameters.
const RFC3339_EXPECTED: &str = "timestamp as YYYY-MM-DDTHH:MM:SSZ";

/// RFC 3339 with the `T` separator Pinboard always sends. chrono's own
/// parser also takes a space there, which would let a `UtcDateTime` value
/// with a `Z` slip through.
pub(crate) fn decode_rfc3339(input: &str) -> Result<DateTime<Utc>, FormatError> {
    if input.as_bytes().get(10) != Some(&b'T') {
        return Err(FormatError::new(RFC3339_EXPECTED, input));
    }
    DateTime::parse_from_rfc3339(input)
        .map(|ts| ts.with_timezone(&Utc))
        .map_err(|_| FormatError::new(RFC3339_EXPECTED, input))
}

pub(crate) fn encode_rfc3339(ts: &DateTime<Utc>) -> String {
    ts.format("%Y-%m-%dT%H:%M:%SZ").to_string()
}

// ---------------------------------------------------------------------------
// yes/no flags
// ---------------------------------------------------------------------------

pub(crate) fn parse_yes_no(input: &str) -> Option<bool> {
    if input.eq_ignore_ascii_case("yes") {
        Some(true)
    } else if input.eq_ignore_ascii_case("no") {
        Some(false)
    } else {
        None
    }
}

pub(crate) fn encode_yes_no(flag: bool) -> &'static str {
    if flag {
        "yes"
    } else {
        "no"
    }
}

// ---------------------------------------------------------------------------
// serde helpers used by the response shapes
// ---------------------------------------------------------------------------

/// Missing or blank text becomes `None`; anything else must parse.
pub(crate) fn optional<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: FromStr,
    T::Err: fmt::Display,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    match raw.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(text) => text.parse().map(Some).map_err(de::Error::custom),
    }
}

pub(crate) fn rfc3339<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    decode_rfc3339(raw.trim()).map_err(de::Error::custom)
}

/// Strict RFC 3339; missing or blank is `None`.
pub(crate) fn optional_rfc3339<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    match raw.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(text) => decode_rfc3339(text).map(Some).map_err(de::Error::custom),
    }
}

/// `yes`/`no` to bool; missing or blank is `false`.
pub(crate) fn yes_no<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    match raw.as_deref().map(str::trim) {
        None | Some("") => Ok(false),
        Some(text) => parse_yes_no(text)
            .ok_or_else(|| de::Error::custom(FormatError::new("yes or no", text))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Timelike};

    #[test]
    fn rfc3339_requires_t_separator() {
        let ts = decode_rfc3339("2020-01-01T00:00:00Z").unwrap();
        assert_eq!(ts, Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap());
        assert_eq!(
            decode_rfc3339("2020-01-01T02:00:00+02:00").unwrap(),
            ts
        );
        assert!(decode_rfc3339("2020-01-01 00:00:00Z").is_err());
        assert!(decode_rfc3339("2020-01-01 00:00:00").is_err());
        assert!(decode_rfc3339("2020-01-01").is_err());
    }

    #[test]
    fn tag_list_splits_on_whitespace_runs() {
        let tags = TagList::decode("  rust \t xml\n\nclient ");
        assert_eq!(tags.to_vec(), vec!["rust", "xml", "client"]);
        assert!(TagList::decode("   ").is_empty());
    }

    #[test]
    fn tag_list_round_trips() {
        let tags: TagList = ["a", "b", "c", "a"].into_iter().collect();
        assert_eq!(tags.encode(), "a b c a");
        assert_eq!(TagList::decode(&tags.encode()), tags);
    }

    #[test]
    fn date_round_trips_at_day_precision() {
        let ts = Utc.with_ymd_and_hms(1985, 6, 27, 15, 13, 33).unwrap();
        let date = UtcDate::from(ts);
        assert_eq!(date.encode(), "1985-06-27");
        assert_eq!(UtcDate::decode(&date.encode()).unwrap(), date);
        assert_eq!(
            date.start_of_day(),
            Utc.with_ymd_and_hms(1985, 6, 27, 0, 0, 0).unwrap()
        );
    }

    #[test]
    fn date_rejects_deviations() {
        for bad in [
            "1985-06-27 15:13:33",
            "1985/06/27",
            "1985-6-27",
            "1985-02-30",
            "1985-13-01",
            "",
        ] {
            assert!(UtcDate::decode(bad).is_err(), "{bad:?} should be rejected");
        }
    }

    #[test]
    fn date_time_round_trips_and_drops_subseconds() {
        let ts = Utc
            .with_ymd_and_hms(1985, 6, 27, 15, 13, 33)
            .unwrap()
            .with_nanosecond(987_654_321)
            .unwrap();
        let value = UtcDateTime::from(ts);
        assert_eq!(value.encode(), "1985-06-27 15:13:33");
        assert_eq!(value.timestamp().nanosecond(), 0);
        assert_eq!(UtcDateTime::decode(&value.encode()).unwrap(), value);
    }

    #[test]
    fn date_time_rejects_date_only_and_rfc3339() {
        assert!(UtcDateTime::decode("1985-06-27").is_err());
        assert!(UtcDateTime::decode("1985-06-27T15:13:33Z").is_err());
        assert!(UtcDateTime::decode("1985-06-27 25:00:00").is_err());
    }

    #[test]
    fn yes_no_is_case_insensitive() {
        assert_eq!(parse_yes_no("YES"), Some(true));
        assert_eq!(parse_yes_no("No"), Some(false));
        assert_eq!(parse_yes_no("maybe"), None);
        assert_eq!(encode_yes_no(true), "yes");
    }

    #[test]
    fn rfc3339_encoding_is_second_precision_zulu() {
        let ts = Utc.with_ymd_and_hms(2020, 1, 2, 3, 4, 5).unwrap();
        assert_eq!(encode_rfc3339(&ts), "2020-01-02T03:04:05Z");
    }
}
