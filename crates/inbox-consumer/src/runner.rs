//! Async consumer loop between a transport adapter and the dispatcher.
//!
//! The transport pushes `Delivery` values into an mpsc channel and implements
//! [`Acknowledger`]. Each delivery is dispatched on the blocking pool (decrypt
//! and file writes may block), one at a time in arrival order, then acked or
//! nacked from the outcome.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::mpsc;

use inbox_core::error::{InboxError, Result};
use inbox_core::Delivery;

use crate::config::ConsumerSection;
use crate::dispatch::Dispatcher;

/// Broker-side settlement of a delivery.
#[async_trait]
pub trait Acknowledger: Send + Sync {
    async fn ack(&self, delivery_tag: u64) -> Result<()>;
    async fn nack(&self, delivery_tag: u64, requeue: bool) -> Result<()>;
}

pub struct ConsumerRunner {
    dispatcher: Arc<Dispatcher>,
    acker: Arc<dyn Acknowledger>,
    requeue_on_error: bool,
}

impl ConsumerRunner {
    pub fn new(dispatcher: Arc<Dispatcher>, acker: Arc<dyn Acknowledger>) -> Self {
        Self {
            dispatcher,
            acker,
            requeue_on_error: false,
        }
    }

    pub fn from_config(
        dispatcher: Arc<Dispatcher>,
        acker: Arc<dyn Acknowledger>,
        cfg: &ConsumerSection,
    ) -> Self {
        Self::new(dispatcher, acker).requeue_on_error(cfg.requeue_on_error)
    }

    pub fn requeue_on_error(mut self, requeue: bool) -> Self {
        self.requeue_on_error = requeue;
        self
    }

    /// Runs until the sending side closes. An acknowledger error stops the loop.
    pub async fn run(&self, mut rx: mpsc::Receiver<Delivery>) -> Result<()> {
        while let Some(delivery) = rx.recv().await {
            self.process(delivery).await?;
        }
        tracing::info!("delivery channel closed, consumer stopping");
        Ok(())
    }

    async fn process(&self, delivery: Delivery) -> Result<()> {
        let tag = delivery.delivery_tag;
        let dispatcher = Arc::clone(&self.dispatcher);
        let res = tokio::task::spawn_blocking(move || dispatcher.handle_delivery(delivery))
            .await
            .unwrap_or_else(|e| Err(InboxError::Internal(format!("dispatch task failed: {e}"))));

        let metrics = self.dispatcher.metrics();
        match res {
            Ok(()) => {
                self.acker.ack(tag).await?;
                metrics.acks.inc(&[("kind", "ack")]);
            }
            Err(e) => {
                // Redelivery cannot repair a malformed header table.
                let requeue = self.requeue_on_error && !e.kind().is_metadata();
                tracing::warn!(delivery_tag = tag, error = %e, requeue, "nacking delivery");
                self.acker.nack(tag, requeue).await?;
                metrics
                    .acks
                    .inc(&[("kind", if requeue { "requeue" } else { "nack" })]);
            }
        }
        Ok(())
    }
}
