//! Top-level facade crate for inbox.
//!
//! Re-exports core types and the consumer library so users can depend on a single crate.

pub mod core {
    pub use inbox_core::*;
}

pub mod consumer {
    pub use inbox_consumer::*;
}
