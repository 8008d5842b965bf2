//! Consumer config loader (strict parsing).

pub mod schema;

use std::fs;

use inbox_core::error::{InboxError, Result};

pub use schema::{ConsumerConfig, ConsumerSection, WriterSection};

pub fn load_from_file(path: &str) -> Result<ConsumerConfig> {
    let s = fs::read_to_string(path)
        .map_err(|e| InboxError::Config(format!("read config {path} failed: {e}")))?;
    load_from_str(&s)
}

pub fn load_from_str(s: &str) -> Result<ConsumerConfig> {
    let cfg: ConsumerConfig =
        serde_yaml::from_str(s).map_err(|e| InboxError::Config(format!("invalid yaml: {e}")))?;
    cfg.validate()?;
    Ok(cfg)
}
