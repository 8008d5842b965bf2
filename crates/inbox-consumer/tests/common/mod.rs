//! Shared fakes for consumer tests.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(dead_code)]

use std::io::{self, Cursor, Read};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use bytes::Bytes;
use uuid::Uuid;

use inbox_core::{BoxError, Decryptor, Delivery, FileWriter, RawHeaders};
use inbox_consumer::Dispatcher;

/// Reverses the body and counts calls.
#[derive(Default)]
pub struct ReverseDecryptor {
    pub calls: AtomicUsize,
}

impl ReverseDecryptor {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Decryptor for ReverseDecryptor {
    fn decrypt(&self, encrypted: &[u8]) -> Result<Box<dyn Read + Send>, BoxError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let mut plain = encrypted.to_vec();
        plain.reverse();
        Ok(Box::new(Cursor::new(plain)))
    }
}

#[derive(Default)]
pub struct RecordingWriter {
    pub writes: Mutex<Vec<(PathBuf, Vec<u8>)>>,
}

impl FileWriter for RecordingWriter {
    fn write_bytes(&self, path: &Path, data: &[u8]) -> io::Result<()> {
        self.writes.lock().unwrap().push((path.to_path_buf(), data.to_vec()));
        Ok(())
    }

    fn write_stream(&self, path: &Path, stream: &mut dyn Read) -> io::Result<()> {
        let mut buf = Vec::new();
        stream.read_to_end(&mut buf)?;
        self.writes.lock().unwrap().push((path.to_path_buf(), buf));
        Ok(())
    }
}

pub fn dispatcher() -> (Dispatcher, Arc<ReverseDecryptor>, Arc<RecordingWriter>) {
    let dec = Arc::new(ReverseDecryptor::default());
    let writer = Arc::new(RecordingWriter::default());
    (Dispatcher::new(dec.clone(), writer.clone()), dec, writer)
}

pub fn full_headers(id: Uuid) -> RawHeaders {
    [
        ("sender-account-id", "S1".to_string()),
        ("message-id", id.to_string()),
        ("message-type", "invoice".to_string()),
        ("in-reply-to-message-id", "R1".to_string()),
    ]
    .into_iter()
    .collect()
}

pub fn delivery(tag: u64, headers: Option<RawHeaders>, body: &'static [u8]) -> Delivery {
    Delivery {
        consumer_tag: "ctag-1".into(),
        delivery_tag: tag,
        redelivered: false,
        exchange: "inbox".into(),
        routing_key: "RECV1".into(),
        headers,
        expiration: Some("5000".into()),
        body: Bytes::from_static(body),
    }
}
