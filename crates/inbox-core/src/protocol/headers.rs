//! Typed lookups over the broker's loosely-typed header table.
//!
//! Every lookup returns a [`Lookup`] so call sites decide explicitly what
//! "absent" and "present but malformed" mean for their field.

use std::collections::HashMap;
use std::fmt;

use bytes::Bytes;
use serde::Deserialize;

use crate::error::{InboxError, Result};

/// Sender account id (mandatory).
pub const SENDER_ACCOUNT_ID: &str = "sender-account-id";
/// Message id, a UUID (mandatory).
pub const MESSAGE_ID: &str = "message-id";
/// Application message type (mandatory).
pub const MESSAGE_TYPE: &str = "message-type";
/// Short key some senders use for `MESSAGE_TYPE`.
pub const MESSAGE_TYPE_ALIAS: &str = "type";
/// Id of the message this one replies to (optional).
pub const IN_REPLY_TO: &str = "in-reply-to-message-id";
/// Legacy key some senders use for `IN_REPLY_TO`.
pub const IN_REPLY_TO_ALIAS: &str = "svar-til";
/// Prefix of application-defined headers collected into `MessageMetadata::properties`.
pub const PROPERTY_PREFIX: &str = "property-";

/// Attribute value as handed over by the broker client.
///
/// AMQP string headers normally arrive as raw bytes; JSON sources (replay
/// files, test vectors) produce `Text`, `Int`, `UInt`, `Bool` or `Null`.
/// `UInt` only holds integers above `i64::MAX`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum HeaderValue {
    Bool(bool),
    Int(i64),
    UInt(u64),
    Text(String),
    #[serde(skip)]
    Bytes(Bytes),
    Null,
}

impl HeaderValue {
    /// Render as UTF-8 text. `None` when the value has no text form.
    pub fn as_text(&self) -> Option<String> {
        match self {
            HeaderValue::Text(s) => Some(s.clone()),
            HeaderValue::Bytes(b) => std::str::from_utf8(b).ok().map(str::to_owned),
            HeaderValue::Int(i) => Some(i.to_string()),
            HeaderValue::UInt(u) => Some(u.to_string()),
            HeaderValue::Bool(b) => Some(b.to_string()),
            HeaderValue::Null => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, HeaderValue::Null)
    }
}

impl fmt::Display for HeaderValue {
    /// Lossy rendering for error messages.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HeaderValue::Text(s) => f.write_str(s),
            HeaderValue::Bytes(b) => f.write_str(&String::from_utf8_lossy(b)),
            HeaderValue::Int(i) => write!(f, "{i}"),
            HeaderValue::UInt(u) => write!(f, "{u}"),
            HeaderValue::Bool(b) => write!(f, "{b}"),
            HeaderValue::Null => f.write_str("null"),
        }
    }
}

impl From<&str> for HeaderValue {
    fn from(s: &str) -> Self {
        HeaderValue::Text(s.to_owned())
    }
}

impl From<String> for HeaderValue {
    fn from(s: String) -> Self {
        HeaderValue::Text(s)
    }
}

impl From<Vec<u8>> for HeaderValue {
    fn from(b: Vec<u8>) -> Self {
        HeaderValue::Bytes(Bytes::from(b))
    }
}

impl From<i64> for HeaderValue {
    fn from(i: i64) -> Self {
        HeaderValue::Int(i)
    }
}

impl From<u64> for HeaderValue {
    fn from(u: u64) -> Self {
        match i64::try_from(u) {
            Ok(i) => HeaderValue::Int(i),
            Err(_) => HeaderValue::UInt(u),
        }
    }
}

/// Header table of one delivery.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(transparent)]
pub struct RawHeaders(HashMap<String, HeaderValue>);

impl RawHeaders {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<HeaderValue>) {
        self.0.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&HeaderValue> {
        self.0.get(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &HeaderValue)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K, V> FromIterator<(K, V)> for RawHeaders
where
    K: Into<String>,
    V: Into<HeaderValue>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

/// Outcome of a typed header lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lookup<T> {
    /// Present and converted.
    Valid(T),
    /// Present, but conversion failed. Carries the raw rendering.
    Invalid(String),
    /// Key missing, value null, or no header table at all.
    Absent,
}

impl<T> Lookup<T> {
    /// Mandatory field: `Absent` -> MissingHeader, `Invalid` -> Parse.
    pub fn required(self, field: &str) -> Result<T> {
        match self {
            Lookup::Valid(v) => Ok(v),
            Lookup::Invalid(raw) => Err(InboxError::parse(field, raw)),
            Lookup::Absent => Err(InboxError::missing(field)),
        }
    }

    /// Optional field: `Absent` -> `None`, `Invalid` still fails.
    pub fn optional(self, field: &str) -> Result<Option<T>> {
        match self {
            Lookup::Valid(v) => Ok(Some(v)),
            Lookup::Invalid(raw) => Err(InboxError::parse(field, raw)),
            Lookup::Absent => Ok(None),
        }
    }
}

/// Look up `key` and convert with `convert`.
pub fn lookup<T, F>(headers: Option<&RawHeaders>, key: &str, convert: F) -> Lookup<T>
where
    F: FnOnce(&HeaderValue) -> Option<T>,
{
    let Some(headers) = headers else {
        return Lookup::Absent;
    };
    match headers.get(key) {
        None => Lookup::Absent,
        Some(v) if v.is_null() => Lookup::Absent,
        Some(v) => match convert(v) {
            Some(out) => Lookup::Valid(out),
            None => Lookup::Invalid(v.to_string()),
        },
    }
}

/// Text lookup.
pub fn lookup_text(headers: Option<&RawHeaders>, key: &str) -> Lookup<String> {
    lookup(headers, key, HeaderValue::as_text)
}

/// Text lookup under `key`, falling back to `alias` only when `key` is absent.
pub fn lookup_text_or(headers: Option<&RawHeaders>, key: &str, alias: &str) -> Lookup<String> {
    match lookup_text(headers, key) {
        Lookup::Absent => lookup_text(headers, alias),
        found => found,
    }
}

/// Mandatory text header.
pub fn require_text(headers: Option<&RawHeaders>, key: &str) -> Result<String> {
    lookup_text(headers, key).required(key)
}
