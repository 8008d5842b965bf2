//! Lazy payload access.
//!
//! The delivery body is held as an immutable `Bytes`; every raw reader is an
//! independent cheap clone. Decrypted content is materialized once into a
//! one-shot cell, so concurrent first access still yields a single
//! `Decryptor::decrypt` call.

use std::io::Read;
use std::path::Path;
use std::sync::Arc;

use bytes::buf::Reader;
use bytes::{Buf, Bytes};
use once_cell::sync::OnceCell;

use crate::error::{BoxError, InboxError, Result};

/// Reader over payload bytes.
pub type PayloadReader = Reader<Bytes>;

/// Decrypts a message body.
pub trait Decryptor: Send + Sync {
    fn decrypt(&self, encrypted: &[u8]) -> std::result::Result<Box<dyn Read + Send>, BoxError>;
}

/// Persists payloads. Both methods return only after content is fully written.
pub trait FileWriter: Send + Sync {
    fn write_bytes(&self, path: &Path, data: &[u8]) -> std::io::Result<()>;
    fn write_stream(&self, path: &Path, stream: &mut dyn Read) -> std::io::Result<()>;
}

/// Raw body plus memoized plaintext.
pub struct PayloadAccessor {
    raw: Bytes,
    decrypted: OnceCell<Bytes>,
    decryptor: Arc<dyn Decryptor>,
    writer: Arc<dyn FileWriter>,
}

impl PayloadAccessor {
    pub fn new(raw: Bytes, decryptor: Arc<dyn Decryptor>, writer: Arc<dyn FileWriter>) -> Self {
        Self {
            raw,
            decrypted: OnceCell::new(),
            decryptor,
            writer,
        }
    }

    pub fn raw_bytes(&self) -> &Bytes {
        &self.raw
    }

    /// Fresh reader over the encrypted body.
    pub fn raw_stream(&self) -> PayloadReader {
        self.raw.clone().reader()
    }

    /// Plaintext, decrypting on first use. Failures are not cached.
    pub fn decrypted_bytes(&self) -> Result<&Bytes> {
        self.decrypted.get_or_try_init(|| {
            tracing::debug!(len = self.raw.len(), "decrypting payload");
            let mut stream = self.decryptor.decrypt(&self.raw).map_err(InboxError::Decrypt)?;
            let mut plain = Vec::new();
            stream
                .read_to_end(&mut plain)
                .map_err(|e| InboxError::Decrypt(Box::new(e)))?;
            Ok(Bytes::from(plain))
        })
    }

    /// Fresh reader over the plaintext.
    pub fn decrypted_stream(&self) -> Result<PayloadReader> {
        Ok(self.decrypted_bytes()?.clone().reader())
    }

    pub fn is_decrypted(&self) -> bool {
        self.decrypted.get().is_some()
    }

    pub fn write_encrypted(&self, path: &Path) -> Result<()> {
        self.writer
            .write_bytes(path, &self.raw)
            .map_err(|source| write_error(path, source))
    }

    pub fn write_decrypted(&self, path: &Path) -> Result<()> {
        let mut stream = self.decrypted_stream()?;
        self.writer
            .write_stream(path, &mut stream)
            .map_err(|source| write_error(path, source))
    }
}

impl std::fmt::Debug for PayloadAccessor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PayloadAccessor")
            .field("raw_len", &self.raw.len())
            .field("decrypted", &self.is_decrypted())
            .finish()
    }
}

fn write_error(path: &Path, source: std::io::Error) -> InboxError {
    InboxError::Write {
        path: path.to_path_buf(),
        source,
    }
}
