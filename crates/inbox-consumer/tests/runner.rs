//! Consumer loop: settlement per delivery outcome.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::mpsc;
use uuid::Uuid;

use inbox_consumer::{Acknowledger, ConsumerRunner};
use inbox_core::{DeliveryEnvelope, InboxError, ReceivedMessage, Result};

mod common;
use common::{delivery, dispatcher, full_headers};

#[derive(Debug, Clone, PartialEq, Eq)]
enum Settled {
    Ack(u64),
    Nack { tag: u64, requeue: bool },
}

#[derive(Default)]
struct RecordingAcker {
    log: Mutex<Vec<Settled>>,
    fail: bool,
}

#[async_trait]
impl Acknowledger for RecordingAcker {
    async fn ack(&self, delivery_tag: u64) -> Result<()> {
        if self.fail {
            return Err(InboxError::Internal("channel closed".into()));
        }
        self.log.lock().unwrap().push(Settled::Ack(delivery_tag));
        Ok(())
    }

    async fn nack(&self, delivery_tag: u64, requeue: bool) -> Result<()> {
        self.log.lock().unwrap().push(Settled::Nack {
            tag: delivery_tag,
            requeue,
        });
        Ok(())
    }
}

async fn run_three(requeue_on_error: bool) -> Vec<Settled> {
    let (d, _, _) = dispatcher();
    d.subscribe_fn(|_: &DeliveryEnvelope, msg: &ReceivedMessage| {
        if msg.raw_bytes().as_ref() == b"reject" {
            return Err(InboxError::Subscriber("rejected".into()));
        }
        Ok(())
    })
    .unwrap();

    let acker = Arc::new(RecordingAcker::default());
    let runner =
        ConsumerRunner::new(Arc::new(d), acker.clone()).requeue_on_error(requeue_on_error);

    let (tx, rx) = mpsc::channel(4);
    tx.send(delivery(1, Some(full_headers(Uuid::new_v4())), b"fine")).await.unwrap();
    tx.send(delivery(2, None, b"fine")).await.unwrap();
    tx.send(delivery(3, Some(full_headers(Uuid::new_v4())), b"reject")).await.unwrap();
    drop(tx);

    runner.run(rx).await.unwrap();
    let log = acker.log.lock().unwrap().clone();
    log
}

#[tokio::test]
async fn acks_success_nacks_failures() {
    let log = run_three(false).await;
    assert_eq!(
        log,
        vec![
            Settled::Ack(1),
            Settled::Nack { tag: 2, requeue: false },
            Settled::Nack { tag: 3, requeue: false },
        ]
    );
}

#[tokio::test]
async fn requeue_skips_metadata_errors() {
    let log = run_three(true).await;
    assert_eq!(
        log,
        vec![
            Settled::Ack(1),
            Settled::Nack { tag: 2, requeue: false },
            Settled::Nack { tag: 3, requeue: true },
        ]
    );
}

#[tokio::test]
async fn acknowledger_error_stops_loop() {
    let (d, _, _) = dispatcher();
    let acker = Arc::new(RecordingAcker {
        log: Mutex::new(Vec::new()),
        fail: true,
    });
    let runner = ConsumerRunner::new(Arc::new(d), acker);

    let (tx, rx) = mpsc::channel(4);
    tx.send(delivery(1, Some(full_headers(Uuid::new_v4())), b"x")).await.unwrap();

    let err = runner.run(rx).await.unwrap_err();
    assert_eq!(err.kind().as_str(), "INTERNAL");
}

#[tokio::test]
async fn settlement_is_counted() {
    let (d, _, _) = dispatcher();
    let d = Arc::new(d);
    let runner = ConsumerRunner::new(d.clone(), Arc::new(RecordingAcker::default()));

    let (tx, rx) = mpsc::channel(4);
    tx.send(delivery(1, Some(full_headers(Uuid::new_v4())), b"x")).await.unwrap();
    tx.send(delivery(2, None, b"x")).await.unwrap();
    drop(tx);
    runner.run(rx).await.unwrap();

    let m = d.metrics();
    assert_eq!(m.acks.get(&[("kind", "ack")]), 1);
    assert_eq!(m.acks.get(&[("kind", "nack")]), 1);
    assert_eq!(m.dispatch_duration.count(&[]), 2);
    let text = m.render();
    assert!(text.contains("inbox_acks_total{kind=\"ack\"} 1"));
    assert!(text.contains("inbox_deliveries_total{outcome=\"MISSING_HEADER\"} 1"));
}
