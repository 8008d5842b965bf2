use serde::Deserialize;

use inbox_core::error::{InboxError, Result};
use inbox_core::AccountIdPolicy;

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConsumerConfig {
    pub version: u32,

    #[serde(default)]
    pub consumer: ConsumerSection,

    #[serde(default)]
    pub writer: WriterSection,
}

impl ConsumerConfig {
    pub fn validate(&self) -> Result<()> {
        if self.version != 1 {
            return Err(InboxError::Config(format!(
                "unsupported config version {}",
                self.version
            )));
        }
        self.consumer.validate()?;
        self.writer.validate()?;
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConsumerSection {
    #[serde(default)]
    pub receiver_account_policy: AccountIdPolicy,

    /// Requeue deliveries that failed after metadata parsing succeeded.
    #[serde(default)]
    pub requeue_on_error: bool,

    #[serde(default = "default_channel_capacity")]
    pub channel_capacity: usize,
}

impl Default for ConsumerSection {
    fn default() -> Self {
        Self {
            receiver_account_policy: AccountIdPolicy::default(),
            requeue_on_error: false,
            channel_capacity: default_channel_capacity(),
        }
    }
}

impl ConsumerSection {
    pub fn validate(&self) -> Result<()> {
        if !(1..=65536).contains(&self.channel_capacity) {
            return Err(InboxError::Config(
                "consumer.channel_capacity must be between 1 and 65536".into(),
            ));
        }
        Ok(())
    }
}

fn default_channel_capacity() -> usize {
    64
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WriterSection {
    #[serde(default = "default_output_dir")]
    pub output_dir: String,

    #[serde(default = "default_create_dirs")]
    pub create_dirs: bool,
}

impl Default for WriterSection {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
            create_dirs: default_create_dirs(),
        }
    }
}

impl WriterSection {
    pub fn validate(&self) -> Result<()> {
        if self.output_dir.trim().is_empty() {
            return Err(InboxError::Config("writer.output_dir must not be empty".into()));
        }
        Ok(())
    }
}

fn default_output_dir() -> String {
    "./inbox-out".into()
}
fn default_create_dirs() -> bool {
    true
}
