//! Metadata parsing (all-or-nothing).
//!
//! A `MessageMetadata` only exists once every field has been extracted and
//! validated; no partially-populated value is ever returned.

use std::collections::BTreeMap;
use std::time::Duration;

use serde::Deserialize;
use uuid::Uuid;

use super::delivery::DeliveryEnvelope;
use super::headers::{
    lookup_text_or, require_text, RawHeaders, IN_REPLY_TO, IN_REPLY_TO_ALIAS, MESSAGE_ID,
    MESSAGE_TYPE, MESSAGE_TYPE_ALIAS, PROPERTY_PREFIX, SENDER_ACCOUNT_ID,
};
use crate::error::{InboxError, Result};

/// Field name used in errors for the envelope expiration.
pub const EXPIRATION: &str = "expiration";
/// Field name used in errors for the routing key.
pub const RECEIVER_ACCOUNT_ID: &str = "receiver-account-id";

/// How strictly the routing key is validated as a receiver account id.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccountIdPolicy {
    /// Any non-empty key without surrounding whitespace.
    #[default]
    Opaque,
    /// Must be a UUID.
    Uuid,
}

/// Validated, immutable metadata of one received message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageMetadata {
    pub message_id: Uuid,
    pub message_type: String,
    pub sender_account_id: String,
    pub receiver_account_id: String,
    /// `None` when the header is absent.
    pub in_reply_to: Option<String>,
    /// `None` when the envelope carries no expiration.
    pub ttl: Option<Duration>,
    /// `property-*` headers with the prefix stripped.
    pub properties: BTreeMap<String, String>,
}

/// Build metadata from one delivery's envelope, headers and expiration.
pub fn parse_metadata(
    envelope: &DeliveryEnvelope,
    headers: Option<&RawHeaders>,
    expiration: Option<&str>,
    policy: AccountIdPolicy,
) -> Result<MessageMetadata> {
    let sender_account_id = require_text(headers, SENDER_ACCOUNT_ID)?;
    let raw_id = require_text(headers, MESSAGE_ID)?;
    let message_type =
        lookup_text_or(headers, MESSAGE_TYPE, MESSAGE_TYPE_ALIAS).required(MESSAGE_TYPE)?;
    let in_reply_to =
        lookup_text_or(headers, IN_REPLY_TO, IN_REPLY_TO_ALIAS).optional(IN_REPLY_TO)?;

    let message_id = parse_message_id(&raw_id)?;
    let receiver_account_id = parse_account_id(&envelope.routing_key, policy)?;
    let ttl = parse_ttl(expiration)?;
    let properties = collect_properties(headers)?;

    Ok(MessageMetadata {
        message_id,
        message_type,
        sender_account_id,
        receiver_account_id,
        in_reply_to,
        ttl,
        properties,
    })
}

/// Identifiers are taken verbatim: surrounding whitespace is a parse error,
/// for the message id and the routing key alike.
fn is_padded(raw: &str) -> bool {
    raw.trim() != raw
}

/// Header message id -> UUID.
pub fn parse_message_id(raw: &str) -> Result<Uuid> {
    if is_padded(raw) {
        return Err(InboxError::parse(MESSAGE_ID, raw));
    }
    Uuid::parse_str(raw).map_err(|_| InboxError::parse(MESSAGE_ID, raw))
}

/// Routing key -> receiver account id.
pub fn parse_account_id(routing_key: &str, policy: AccountIdPolicy) -> Result<String> {
    if routing_key.is_empty() || is_padded(routing_key) {
        return Err(InboxError::parse(RECEIVER_ACCOUNT_ID, routing_key));
    }
    if policy == AccountIdPolicy::Uuid && Uuid::parse_str(routing_key).is_err() {
        return Err(InboxError::parse(RECEIVER_ACCOUNT_ID, routing_key));
    }
    Ok(routing_key.to_owned())
}

/// Decimal milliseconds -> duration. Absent or empty means no TTL.
pub fn parse_ttl(expiration: Option<&str>) -> Result<Option<Duration>> {
    let Some(raw) = expiration else {
        return Ok(None);
    };
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    if !trimmed.bytes().all(|b| b.is_ascii_digit()) {
        return Err(InboxError::parse(EXPIRATION, raw));
    }
    let millis: u64 = trimmed
        .parse()
        .map_err(|_| InboxError::parse(EXPIRATION, raw))?;
    Ok(Some(Duration::from_millis(millis)))
}

fn collect_properties(headers: Option<&RawHeaders>) -> Result<BTreeMap<String, String>> {
    let mut out = BTreeMap::new();
    let Some(headers) = headers else {
        return Ok(out);
    };
    for (key, value) in headers.iter() {
        let Some(name) = key.strip_prefix(PROPERTY_PREFIX) else {
            continue;
        };
        if name.is_empty() || value.is_null() {
            continue;
        }
        let text = value
            .as_text()
            .ok_or_else(|| InboxError::parse(key, value.to_string()))?;
        out.insert(name.to_owned(), text);
    }
    Ok(out)
}
