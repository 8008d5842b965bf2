//! The application-facing message handed to subscribers.

use std::path::Path;

use bytes::Bytes;
use uuid::Uuid;

use crate::error::Result;
use crate::payload::{PayloadAccessor, PayloadReader};
use crate::protocol::{DeliveryEnvelope, MessageMetadata};

/// One received message: validated metadata plus lazy payload views.
///
/// Created fresh per delivery and dropped once dispatch returns.
#[derive(Debug)]
pub struct ReceivedMessage {
    envelope: DeliveryEnvelope,
    metadata: MessageMetadata,
    payload: PayloadAccessor,
}

impl ReceivedMessage {
    pub fn new(envelope: DeliveryEnvelope, metadata: MessageMetadata, payload: PayloadAccessor) -> Self {
        Self {
            envelope,
            metadata,
            payload,
        }
    }

    pub fn envelope(&self) -> &DeliveryEnvelope {
        &self.envelope
    }

    pub fn metadata(&self) -> &MessageMetadata {
        &self.metadata
    }

    pub fn message_id(&self) -> Uuid {
        self.metadata.message_id
    }

    pub fn message_type(&self) -> &str {
        &self.metadata.message_type
    }

    pub fn has_payload(&self) -> bool {
        !self.payload.raw_bytes().is_empty()
    }

    pub fn raw_bytes(&self) -> &Bytes {
        self.payload.raw_bytes()
    }

    /// New reader over the encrypted body on each call.
    pub fn raw_stream(&self) -> PayloadReader {
        self.payload.raw_stream()
    }

    /// Reader over the plaintext. Decrypts at most once per message.
    pub fn decrypted_stream(&self) -> Result<PayloadReader> {
        self.payload.decrypted_stream()
    }

    pub fn decrypted_bytes(&self) -> Result<&Bytes> {
        self.payload.decrypted_bytes()
    }

    pub fn write_encrypted(&self, path: impl AsRef<Path>) -> Result<()> {
        self.payload.write_encrypted(path.as_ref())
    }

    pub fn write_decrypted(&self, path: impl AsRef<Path>) -> Result<()> {
        self.payload.write_decrypted(path.as_ref())
    }
}
