//! Shared error type across inbox crates.

use std::path::PathBuf;

use thiserror::Error;

/// Boxed error returned by external collaborators.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Stable error kinds (logged and used by acknowledgement policy).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Mandatory header, or the whole header table, is absent.
    MissingHeader,
    /// Header or envelope field present but malformed.
    Parse,
    /// Decrypt collaborator failed.
    Decrypt,
    /// File writer collaborator failed.
    Write,
    /// Application subscriber failed.
    Subscriber,
    /// Invalid configuration.
    Config,
    /// Internal error.
    Internal,
}

impl ErrorKind {
    /// String representation used in logs and metrics labels.
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorKind::MissingHeader => "MISSING_HEADER",
            ErrorKind::Parse => "PARSE_ERROR",
            ErrorKind::Decrypt => "DECRYPT_FAILED",
            ErrorKind::Write => "WRITE_FAILED",
            ErrorKind::Subscriber => "SUBSCRIBER_FAILED",
            ErrorKind::Config => "BAD_CONFIG",
            ErrorKind::Internal => "INTERNAL",
        }
    }

    /// True for failures found while building metadata. Redelivery cannot fix these.
    pub fn is_metadata(self) -> bool {
        matches!(self, ErrorKind::MissingHeader | ErrorKind::Parse)
    }
}

/// Shared result type.
pub type Result<T> = std::result::Result<T, InboxError>;

/// Unified error type used by core and consumer.
#[derive(Debug, Error)]
pub enum InboxError {
    #[error("missing header: {field}")]
    MissingHeader { field: String },
    #[error("invalid {field}: {value:?}")]
    Parse { field: String, value: String },
    #[error("decrypt failed: {0}")]
    Decrypt(#[source] BoxError),
    #[error("write to {} failed: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("subscriber failed: {0}")]
    Subscriber(String),
    #[error("config: {0}")]
    Config(String),
    #[error("internal: {0}")]
    Internal(String),
}

impl InboxError {
    pub fn missing(field: impl Into<String>) -> Self {
        InboxError::MissingHeader {
            field: field.into(),
        }
    }

    pub fn parse(field: impl Into<String>, value: impl Into<String>) -> Self {
        InboxError::Parse {
            field: field.into(),
            value: value.into(),
        }
    }

    /// Map to a stable kind.
    pub fn kind(&self) -> ErrorKind {
        match self {
            InboxError::MissingHeader { .. } => ErrorKind::MissingHeader,
            InboxError::Parse { .. } => ErrorKind::Parse,
            InboxError::Decrypt(_) => ErrorKind::Decrypt,
            InboxError::Write { .. } => ErrorKind::Write,
            InboxError::Subscriber(_) => ErrorKind::Subscriber,
            InboxError::Config(_) => ErrorKind::Config,
            InboxError::Internal(_) => ErrorKind::Internal,
        }
    }
}
