//! Lightweight in-process metrics (dependency-free).
//!
//! Metrics are stored as atomics and rendered in Prometheus text format on
//! demand; the replay binary prints them on exit.

pub mod metrics;
