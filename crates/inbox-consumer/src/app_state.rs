//! Shared application state for the inbox consumer.
//!
//! Builds the dispatcher and its collaborators from configuration. Startup
//! errors are returned, not panicked.

use std::path::Path;
use std::sync::Arc;

use inbox_core::error::Result;
use inbox_core::Decryptor;

use crate::config::ConsumerConfig;
use crate::dispatch::Dispatcher;
use crate::fs_writer::FsFileWriter;
use crate::obs::metrics::ConsumerMetrics;
use crate::runner::{Acknowledger, ConsumerRunner};

#[derive(Clone)]
pub struct AppState {
    cfg: Arc<ConsumerConfig>,
    dispatcher: Arc<Dispatcher>,
    metrics: Arc<ConsumerMetrics>,
}

impl AppState {
    pub fn new(cfg: ConsumerConfig, decryptor: Arc<dyn Decryptor>) -> Result<Self> {
        cfg.validate()?;

        let metrics = Arc::new(ConsumerMetrics::default());
        let writer = Arc::new(FsFileWriter::new(cfg.writer.create_dirs));
        let dispatcher = Dispatcher::new(decryptor, writer)
            .with_account_policy(cfg.consumer.receiver_account_policy)
            .with_metrics(Arc::clone(&metrics));

        tracing::info!(
            policy = ?cfg.consumer.receiver_account_policy,
            requeue_on_error = cfg.consumer.requeue_on_error,
            output_dir = %cfg.writer.output_dir,
            "consumer state built"
        );

        Ok(Self {
            cfg: Arc::new(cfg),
            dispatcher: Arc::new(dispatcher),
            metrics,
        })
    }

    pub fn cfg(&self) -> &ConsumerConfig {
        &self.cfg
    }

    pub fn dispatcher(&self) -> Arc<Dispatcher> {
        Arc::clone(&self.dispatcher)
    }

    pub fn metrics(&self) -> Arc<ConsumerMetrics> {
        Arc::clone(&self.metrics)
    }

    pub fn output_dir(&self) -> &Path {
        Path::new(&self.cfg.writer.output_dir)
    }

    pub fn runner(&self, acker: Arc<dyn Acknowledger>) -> ConsumerRunner {
        ConsumerRunner::from_config(self.dispatcher(), acker, &self.cfg.consumer)
    }
}
