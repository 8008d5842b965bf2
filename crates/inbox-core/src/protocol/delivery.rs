//! Transport-facing delivery types.

use bytes::Bytes;

use super::headers::RawHeaders;

/// Routing data of one delivery, as seen by the consumer callback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryEnvelope {
    pub consumer_tag: String,
    /// Monotonically increasing per channel.
    pub delivery_tag: u64,
    pub redelivered: bool,
    pub exchange: String,
    /// Carries the receiver account id.
    pub routing_key: String,
}

/// Everything the transport hands over for one delivery.
#[derive(Debug, Clone)]
pub struct Delivery {
    pub consumer_tag: String,
    pub delivery_tag: u64,
    pub redelivered: bool,
    pub exchange: String,
    pub routing_key: String,
    /// `None` when the broker sent no header table at all.
    pub headers: Option<RawHeaders>,
    /// TTL in milliseconds as decimal text. `None` means no TTL.
    pub expiration: Option<String>,
    /// Opaque, possibly empty.
    pub body: Bytes,
}

impl Delivery {
    /// Split into envelope and the parts the parser consumes.
    pub fn into_parts(self) -> (DeliveryEnvelope, Option<RawHeaders>, Option<String>, Bytes) {
        let envelope = DeliveryEnvelope {
            consumer_tag: self.consumer_tag,
            delivery_tag: self.delivery_tag,
            redelivered: self.redelivered,
            exchange: self.exchange,
            routing_key: self.routing_key,
        };
        (envelope, self.headers, self.expiration, self.body)
    }
}
