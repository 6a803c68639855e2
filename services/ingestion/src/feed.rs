//! Feed model
//!
//! The agency publishes three JSON documents, all shaped
//! `{ "Infogempa": { "gempa": Entry | [Entry, ..] } }`. The single-event
//! feed carries one object, the list feeds carry an array; both shapes are
//! accepted for every feed.
//!
//! Entries are decoded one at a time. Scalar fields accept strings,
//! numbers, booleans and null; an entry that still cannot be decoded is
//! kept with its decode error so the normalizer rejects it alone.

use std::fmt;

use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Public TEWS feed origin.
pub const DEFAULT_FEED_BASE_URL: &str = "https://data.bmkg.go.id/DataMKG/TEWS";

/// One of the three published feeds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Feed {
    /// Most recent event, single object
    Latest,
    /// Recent events of magnitude 5 and above
    Strong,
    /// Recent events reported as felt
    Felt,
}

impl Feed {
    pub const ALL: [Feed; 3] = [Feed::Latest, Feed::Strong, Feed::Felt];

    pub fn file_name(&self) -> &'static str {
        match self {
            Feed::Latest => "autogempa.json",
            Feed::Strong => "gempaterkini.json",
            Feed::Felt => "gempadirasakan.json",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Feed::Latest => "latest",
            Feed::Strong => "m5plus",
            Feed::Felt => "felt",
        }
    }

    /// Absolute URL of this feed under `base_url`.
    pub fn url(&self, base_url: &str) -> String {
        format!("{}/{}", base_url.trim_end_matches('/'), self.file_name())
    }
}

impl fmt::Display for Feed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Top-level feed document.
#[derive(Debug, Clone, Deserialize)]
pub struct FeedDocument {
    #[serde(rename = "Infogempa", alias = "info")]
    pub info: FeedBody,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FeedBody {
    #[serde(rename = "gempa", alias = "event", default)]
    pub events: OneOrMany<Value>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum OneOrMany<T> {
    Many(Vec<T>),
    One(T),
}

impl<T> Default for OneOrMany<T> {
    fn default() -> Self {
        OneOrMany::Many(Vec::new())
    }
}

impl<T> OneOrMany<T> {
    pub fn into_vec(self) -> Vec<T> {
        match self {
            OneOrMany::One(item) => vec![item],
            OneOrMany::Many(items) => items,
        }
    }
}

impl FeedDocument {
    pub fn into_entries(self) -> Vec<RawEntry> {
        self.info
            .events
            .into_vec()
            .into_iter()
            .filter(|value| !value.is_null())
            .map(RawEntry::from_value)
            .collect()
    }
}

/// One raw event as published. Numeric values arrive as strings.
///
/// Missing or null fields default to empty so a single incomplete entry
/// fails normalization on its own instead of failing the whole document.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct RawEntry {
    /// e.g. "15 Jan 2024"
    #[serde(rename = "Tanggal", deserialize_with = "scalar")]
    pub date: String,
    /// e.g. "10:21:45 WIB"
    #[serde(rename = "Jam", deserialize_with = "scalar")]
    pub time: String,
    /// RFC 3339 event time, e.g. "2024-01-15T03:21:45+00:00"
    #[serde(rename = "DateTime", deserialize_with = "scalar")]
    pub datetime: String,
    /// "lat,lon"
    #[serde(rename = "Coordinates", deserialize_with = "scalar")]
    pub coordinates: String,
    #[serde(rename = "Magnitude", deserialize_with = "scalar")]
    pub magnitude: String,
    /// e.g. "10 km"
    #[serde(rename = "Kedalaman", deserialize_with = "scalar")]
    pub depth: String,
    #[serde(rename = "Wilayah", deserialize_with = "scalar")]
    pub region: String,
    #[serde(rename = "Potensi", deserialize_with = "optional_scalar")]
    pub tsunami_potential: Option<String>,
    #[serde(rename = "Dirasakan", deserialize_with = "optional_scalar")]
    pub felt_status: Option<String>,
    /// Path relative to the feed origin
    #[serde(rename = "Shakemap", deserialize_with = "optional_scalar")]
    pub shakemap: Option<String>,
    /// Why the entry could not be decoded, if it could not
    #[serde(skip)]
    pub decode_error: Option<String>,
}

impl RawEntry {
    /// Decode one entry. Never fails: an undecodable value becomes an
    /// empty entry carrying the error.
    pub fn from_value(value: Value) -> Self {
        serde_json::from_value(value).unwrap_or_else(|e| RawEntry {
            decode_error: Some(e.to_string()),
            ..RawEntry::default()
        })
    }
}

fn scalar<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    optional_scalar(deserializer).map(Option::unwrap_or_default)
}

/// String, number or boolean as text; null as `None`.
fn optional_scalar<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    match Value::deserialize(deserializer)? {
        Value::Null => Ok(None),
        Value::String(s) => Ok(Some(s)),
        Value::Number(n) => Ok(Some(n.to_string())),
        Value::Bool(b) => Ok(Some(b.to_string())),
        other => Err(serde::de::Error::custom(format!("expected a scalar, found {other}"))),
    }
}
