//! inbox core: transport-agnostic receive primitives and error types.
//!
//! This crate turns a broker delivery (envelope, header table, body) into a
//! validated [`ReceivedMessage`] with lazy, decrypt-on-demand payload access.
//! It carries no runtime or transport dependencies; decryption and file
//! writing are reached only through the [`Decryptor`] and [`FileWriter`]
//! traits.
//!
//! # Defensive guarantees
//! Panics, `unwrap`, and `expect` are compile-denied here. All fallible paths
//! surface as `InboxError`/`Result` so malformed deliveries never crash the
//! consumer.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

pub mod error;
pub mod message;
pub mod payload;
pub mod protocol;

/// Shared result type.
pub use error::{BoxError, ErrorKind, InboxError, Result};
pub use message::ReceivedMessage;
pub use payload::{Decryptor, FileWriter, PayloadAccessor, PayloadReader};
pub use protocol::{
    parse_metadata, AccountIdPolicy, Delivery, DeliveryEnvelope, HeaderValue, MessageMetadata,
    RawHeaders,
};
