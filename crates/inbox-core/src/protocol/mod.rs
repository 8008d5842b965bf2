//! Delivery protocol: header table, envelope, and metadata parsing.
//!
//! Everything here turns broker-supplied, loosely-typed input into typed
//! values or an `InboxError`. Malformed input never panics.

pub mod delivery;
pub mod headers;
pub mod metadata;

pub use delivery::{Delivery, DeliveryEnvelope};
pub use headers::{HeaderValue, Lookup, RawHeaders};
pub use metadata::{parse_metadata, AccountIdPolicy, MessageMetadata};
