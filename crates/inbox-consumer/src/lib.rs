//! inbox consumer library entry.
//!
//! This crate wires the dispatcher, subscriber registry, config, metrics,
//! filesystem writer and the async consumer loop around `inbox-core`. It is
//! consumed by the replay binary (`main.rs`) and by integration tests.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

pub mod app_state;
pub mod config;
pub mod dispatch;
pub mod fs_writer;
pub mod obs;
pub mod replay;
pub mod runner;

pub use dispatch::{Dispatcher, MessageSubscriber, SubscriptionId};
pub use fs_writer::FsFileWriter;
pub use runner::{Acknowledger, ConsumerRunner};
