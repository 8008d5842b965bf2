//! Payload accessor tests: raw views, decrypt memoization, writer delegation.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use std::io::{self, Cursor, Read};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Barrier, Mutex};
use std::thread;
use std::time::Duration;

use bytes::Bytes;

use inbox_core::{BoxError, Decryptor, FileWriter, PayloadAccessor};

/// XOR "cipher" that counts calls.
#[derive(Default)]
struct XorDecryptor {
    calls: AtomicUsize,
    delay: Option<Duration>,
}

const KEY: u8 = 0x5a;

fn xor(data: &[u8]) -> Vec<u8> {
    data.iter().map(|b| b ^ KEY).collect()
}

impl Decryptor for XorDecryptor {
    fn decrypt(&self, encrypted: &[u8]) -> Result<Box<dyn Read + Send>, BoxError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(d) = self.delay {
            thread::sleep(d);
        }
        Ok(Box::new(Cursor::new(xor(encrypted))))
    }
}

struct FailingDecryptor;

impl Decryptor for FailingDecryptor {
    fn decrypt(&self, _encrypted: &[u8]) -> Result<Box<dyn Read + Send>, BoxError> {
        Err("malformed ciphertext".into())
    }
}

#[derive(Default)]
struct RecordingWriter {
    writes: Mutex<Vec<(PathBuf, Vec<u8>)>>,
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

struct FullDisk;

impl FileWriter for FullDisk {
    fn write_bytes(&self, _path: &Path, _data: &[u8]) -> io::Result<()> {
        Err(io::Error::new(io::ErrorKind::Other, "no space left on device"))
    }

    fn write_stream(&self, _path: &Path, _stream: &mut dyn Read) -> io::Result<()> {
        Err(io::Error::new(io::ErrorKind::Other, "no space left on device"))
    }
}

fn accessor(body: &[u8]) -> (PayloadAccessor, Arc<XorDecryptor>, Arc<RecordingWriter>) {
    let dec = Arc::new(XorDecryptor::default());
    let writer = Arc::new(RecordingWriter::default());
    let acc = PayloadAccessor::new(Bytes::copy_from_slice(body), dec.clone(), writer.clone());
    (acc, dec, writer)
}

fn read_all(mut r: impl Read) -> Vec<u8> {
    let mut out = Vec::new();
    r.read_to_end(&mut out).unwrap();
    out
}

#[test]
fn raw_stream_round_trip() {
    for body in [&b""[..], &b"x"[..], &b"encrypted payload bytes"[..]] {
        let (acc, dec, _) = accessor(body);
        assert_eq!(read_all(acc.raw_stream()), body);
        // a second view starts from the beginning again
        assert_eq!(read_all(acc.raw_stream()), body);
        assert_eq!(dec.calls.load(Ordering::SeqCst), 0);
    }
}

#[test]
fn decrypt_runs_once() {
    let plain = b"hello inbox";
    let (acc, dec, _) = accessor(&xor(plain));

    assert!(!acc.is_decrypted());
    assert_eq!(read_all(acc.decrypted_stream().unwrap()), plain);
    assert_eq!(read_all(acc.decrypted_stream().unwrap()), plain);
    assert_eq!(acc.decrypted_bytes().unwrap().as_ref(), plain);
    assert!(acc.is_decrypted());
    assert_eq!(dec.calls.load(Ordering::SeqCst), 1);
}

#[test]
fn write_decrypted_reuses_cached_plaintext() {
    let plain = b"attachment";
    let (acc, dec, writer) = accessor(&xor(plain));

    acc.write_decrypted(Path::new("/tmp/a.bin")).unwrap();
    assert_eq!(read_all(acc.decrypted_stream().unwrap()), plain);
    acc.write_decrypted(Path::new("/tmp/b.bin")).unwrap();

    assert_eq!(dec.calls.load(Ordering::SeqCst), 1);
    let writes = writer.writes.lock().unwrap();
    assert_eq!(writes.len(), 2);
    assert_eq!(writes[0], (PathBuf::from("/tmp/a.bin"), plain.to_vec()));
    assert_eq!(writes[1], (PathBuf::from("/tmp/b.bin"), plain.to_vec()));
}

#[test]
fn write_encrypted_passes_raw_bytes() {
    let body = b"\x01\x02\x03ciphertext";
    let (acc, dec, writer) = accessor(body);

    acc.write_encrypted(Path::new("/out/msg.enc")).unwrap();
    acc.write_encrypted(Path::new("/out/msg.enc")).unwrap();
    assert_eq!(read_all(acc.raw_stream()), body);

    assert_eq!(dec.calls.load(Ordering::SeqCst), 0);
    let writes = writer.writes.lock().unwrap();
    assert_eq!(writes.len(), 2);
    assert_eq!(writes[0], (PathBuf::from("/out/msg.enc"), body.to_vec()));
}

#[test]
fn concurrent_first_access_decrypts_once() {
    let plain = b"raced";
    let dec = Arc::new(XorDecryptor {
        calls: AtomicUsize::new(0),
        delay: Some(Duration::from_millis(20)),
    });
    let acc = PayloadAccessor::new(
        Bytes::from(xor(plain)),
        dec.clone(),
        Arc::new(RecordingWriter::default()),
    );
    let barrier = Barrier::new(8);

    thread::scope(|s| {
        for _ in 0..8 {
            s.spawn(|| {
                barrier.wait();
                assert_eq!(read_all(acc.decrypted_stream().unwrap()), plain);
            });
        }
    });

    assert_eq!(dec.calls.load(Ordering::SeqCst), 1);
}

#[test]
fn decrypt_failure_propagates() {
    let acc = PayloadAccessor::new(
        Bytes::from_static(b"junk"),
        Arc::new(FailingDecryptor),
        Arc::new(RecordingWriter::default()),
    );

    let err = acc.decrypted_stream().unwrap_err();
    assert_eq!(err.kind().as_str(), "DECRYPT_FAILED");
    assert!(err.to_string().contains("malformed ciphertext"));
    assert!(!acc.is_decrypted());

    let err = acc.write_decrypted(Path::new("/tmp/never")).unwrap_err();
    assert_eq!(err.kind().as_str(), "DECRYPT_FAILED");

    // raw access is unaffected
    assert_eq!(read_all(acc.raw_stream()), b"junk");
}

#[test]
fn write_failure_propagates_with_path() {
    let acc = PayloadAccessor::new(
        Bytes::from_static(b"data"),
        Arc::new(XorDecryptor::default()),
        Arc::new(FullDisk),
    );

    let err = acc.write_encrypted(Path::new("/full/x")).unwrap_err();
    assert_eq!(err.kind().as_str(), "WRITE_FAILED");
    assert!(err.to_string().contains("/full/x"));
}
