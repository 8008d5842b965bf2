use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};
use std::time::Instant;

use inbox_core::error::{InboxError, Result};
use inbox_core::payload::{Decryptor, FileWriter, PayloadAccessor};
use inbox_core::protocol::{parse_metadata, AccountIdPolicy, Delivery, DeliveryEnvelope};
use inbox_core::ReceivedMessage;

use crate::obs::metrics::ConsumerMetrics;

/// Receives every successfully parsed message.
pub trait MessageSubscriber: Send + Sync {
    fn on_message(&self, source: &DeliveryEnvelope, msg: &ReceivedMessage) -> Result<()>;
}

impl<F> MessageSubscriber for F
where
    F: Fn(&DeliveryEnvelope, &ReceivedMessage) -> Result<()> + Send + Sync,
{
    fn on_message(&self, source: &DeliveryEnvelope, msg: &ReceivedMessage) -> Result<()> {
        self(source, msg)
    }
}

/// Handle returned by [`Dispatcher::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type SubscriberList = Vec<(SubscriptionId, Arc<dyn MessageSubscriber>)>;

/// Turns deliveries into `ReceivedMessage`s and notifies subscribers in
/// registration order.
pub struct Dispatcher {
    subscribers: RwLock<SubscriberList>,
    next_id: AtomicU64,
    decryptor: Arc<dyn Decryptor>,
    writer: Arc<dyn FileWriter>,
    account_policy: AccountIdPolicy,
    metrics: Arc<ConsumerMetrics>,
}

impl Dispatcher {
    pub fn new(decryptor: Arc<dyn Decryptor>, writer: Arc<dyn FileWriter>) -> Self {
        Self {
            subscribers: RwLock::new(Vec::new()),
            next_id: AtomicU64::new(1),
            decryptor,
            writer,
            account_policy: AccountIdPolicy::default(),
            metrics: Arc::new(ConsumerMetrics::default()),
        }
    }

    pub fn with_account_policy(mut self, policy: AccountIdPolicy) -> Self {
        self.account_policy = policy;
        self
    }

    pub fn with_metrics(mut self, metrics: Arc<ConsumerMetrics>) -> Self {
        self.metrics = metrics;
        self
    }

    pub fn metrics(&self) -> Arc<ConsumerMetrics> {
        Arc::clone(&self.metrics)
    }

    pub fn subscribe(&self, subscriber: Arc<dyn MessageSubscriber>) -> Result<SubscriptionId> {
        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.subscribers
            .write()
            .map_err(|_| InboxError::Internal("subscriber list poisoned".into()))?
            .push((id, subscriber));
        Ok(id)
    }

    pub fn subscribe_fn<F>(&self, f: F) -> Result<SubscriptionId>
    where
        F: Fn(&DeliveryEnvelope, &ReceivedMessage) -> Result<()> + Send + Sync + 'static,
    {
        self.subscribe(Arc::new(f))
    }

    /// Returns false when `id` was not registered.
    pub fn unsubscribe(&self, id: SubscriptionId) -> Result<bool> {
        let mut list = self
            .subscribers
            .write()
            .map_err(|_| InboxError::Internal("subscriber list poisoned".into()))?;
        let before = list.len();
        list.retain(|(sid, _)| *sid != id);
        Ok(list.len() != before)
    }

    pub fn subscriber_count(&self) -> Result<usize> {
        self.subscribers
            .read()
            .map(|l| l.len())
            .map_err(|_| InboxError::Internal("subscriber list poisoned".into()))
    }

    /// Entry point for one delivery.
    ///
    /// Metadata errors are returned before any subscriber runs. The first
    /// subscriber error stops notification and is returned as is.
    pub fn handle_delivery(&self, delivery: Delivery) -> Result<()> {
        let span = tracing::info_span!(
            "delivery",
            consumer_tag = %delivery.consumer_tag,
            delivery_tag = delivery.delivery_tag
        );
        let _enter = span.enter();
        let started = Instant::now();

        let res = self.dispatch(delivery);

        let outcome = match &res {
            Ok(()) => "ok",
            Err(e) => e.kind().as_str(),
        };
        self.metrics.deliveries.inc(&[("outcome", outcome)]);
        self.metrics
            .dispatch_duration
            .observe(&[], started.elapsed());
        if let Err(e) = &res {
            tracing::warn!(error = %e, kind = outcome, "delivery not handled");
        }
        res
    }

    fn dispatch(&self, delivery: Delivery) -> Result<()> {
        let (envelope, headers, expiration, body) = delivery.into_parts();

        let metadata = parse_metadata(
            &envelope,
            headers.as_ref(),
            expiration.as_deref(),
            self.account_policy,
        )?;
        tracing::debug!(
            message_id = %metadata.message_id,
            message_type = %metadata.message_type,
            sender = %metadata.sender_account_id,
            body_len = body.len(),
            "metadata parsed"
        );

        let payload = PayloadAccessor::new(body, Arc::clone(&self.decryptor), Arc::clone(&self.writer));
        let msg = ReceivedMessage::new(envelope, metadata, payload);

        // Late registrations are not part of this dispatch.
        let snapshot: Vec<Arc<dyn MessageSubscriber>> = self
            .subscribers
            .read()
            .map_err(|_| InboxError::Internal("subscriber list poisoned".into()))?
            .iter()
            .map(|(_, s)| Arc::clone(s))
            .collect();

        if snapshot.is_empty() {
            tracing::debug!(message_id = %msg.message_id(), "no subscribers registered");
        }

        for subscriber in snapshot {
            subscriber.on_message(msg.envelope(), &msg)?;
            self.metrics.notifications.inc(&[]);
        }
        Ok(())
    }
}
