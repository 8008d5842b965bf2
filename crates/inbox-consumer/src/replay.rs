//! Replay support: JSON-lines deliveries in place of a live broker.
//!
//! One line per delivery; `body` is standard base64.

use std::io::Read;
use std::path::PathBuf;

use async_trait::async_trait;
use base64::Engine;
use bytes::Bytes;
use serde::Deserialize;

use inbox_core::error::{BoxError, InboxError, Result};
use inbox_core::{Decryptor, Delivery, DeliveryEnvelope, RawHeaders, ReceivedMessage};

use crate::dispatch::MessageSubscriber;
use crate::runner::Acknowledger;

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ReplayDelivery {
    #[serde(default = "default_consumer_tag")]
    pub consumer_tag: String,
    pub delivery_tag: u64,
    #[serde(default)]
    pub redelivered: bool,
    #[serde(default)]
    pub exchange: String,
    pub routing_key: String,
    #[serde(default)]
    pub headers: Option<RawHeaders>,
    #[serde(default)]
    pub expiration: Option<String>,
    #[serde(default)]
    pub body: String,
}

fn default_consumer_tag() -> String {
    "replay".into()
}

impl ReplayDelivery {
    pub fn into_delivery(self) -> Result<Delivery> {
        let body = base64::engine::general_purpose::STANDARD
            .decode(self.body.as_bytes())
            .map_err(|e| InboxError::parse("body", format!("invalid base64: {e}")))?;
        Ok(Delivery {
            consumer_tag: self.consumer_tag,
            delivery_tag: self.delivery_tag,
            redelivered: self.redelivered,
            exchange: self.exchange,
            routing_key: self.routing_key,
            headers: self.headers,
            expiration: self.expiration,
            body: Bytes::from(body),
        })
    }
}

/// Parse one JSON line into a delivery.
pub fn parse_line(line: &str) -> Result<Delivery> {
    let raw: ReplayDelivery = serde_json::from_str(line)
        .map_err(|e| InboxError::parse("delivery", format!("invalid json: {e}")))?;
    raw.into_delivery()
}

/// No key material is available during replay.
pub struct UnavailableDecryptor;

impl Decryptor for UnavailableDecryptor {
    fn decrypt(&self, _encrypted: &[u8]) -> std::result::Result<Box<dyn Read + Send>, BoxError> {
        Err("no decryption key configured".into())
    }
}

/// Logs settlement instead of talking to a broker.
pub struct LogAcknowledger;

#[async_trait]
impl Acknowledger for LogAcknowledger {
    async fn ack(&self, delivery_tag: u64) -> Result<()> {
        tracing::info!(delivery_tag, "ack");
        Ok(())
    }

    async fn nack(&self, delivery_tag: u64, requeue: bool) -> Result<()> {
        tracing::info!(delivery_tag, requeue, "nack");
        Ok(())
    }
}

/// Saves the encrypted payload as `<dir>/<message-id>`.
pub struct SaveEncrypted {
    dir: PathBuf,
}

impl SaveEncrypted {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

impl MessageSubscriber for SaveEncrypted {
    fn on_message(&self, _source: &DeliveryEnvelope, msg: &ReceivedMessage) -> Result<()> {
        let meta = msg.metadata();
        tracing::info!(
            message_id = %meta.message_id,
            message_type = %meta.message_type,
            sender = %meta.sender_account_id,
            receiver = %meta.receiver_account_id,
            ttl_ms = meta.ttl.map(|t| t.as_millis() as u64),
            "message received"
        );
        if msg.has_payload() {
            msg.write_encrypted(self.dir.join(meta.message_id.to_string()))?;
        }
        Ok(())
    }
}
