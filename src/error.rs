//! Error types for the exporter.

use thiserror::Error;

/// Result type alias for exporter operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level exporter error.
///
/// Only construction can fail with one of these; `export` folds every
/// record and flush fault into an [`ExportResult`](crate::ExportResult).
#[derive(Error, Debug)]
pub enum Error {
    #[error("configuration error: {0}")]
    Config(String),

    /// The resource attributes could not be rendered.
    #[error("encoding failed: {0}")]
    Encode(#[from] EncodeError),
}

/// Failure while writing one record into the buffer.
#[derive(Error, Debug)]
pub enum EncodeError {
    /// The field or terminator does not fit in the remaining capacity.
    #[error("buffer overflow: {needed} bytes needed, {remaining} remaining")]
    Overflow { needed: usize, remaining: usize },

    #[error("timestamp {0} is outside the encodable range")]
    TimestampOutOfRange(String),

    /// Two members of one object map to the same camel-cased name.
    #[error("duplicate key '{0}' after camel-casing")]
    DuplicateKey(String),

    #[error("payload serialization failed: {0}")]
    Json(#[from] serde_json::Error),
}

impl EncodeError {
    /// True for space exhaustion, false for a genuine encoding fault.
    pub fn is_overflow(&self) -> bool {
        matches!(self, EncodeError::Overflow { .. })
    }
}

/// Failure reported by an [`IngestionSink`](crate::IngestionSink).
#[derive(Error, Debug)]
pub enum SinkError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("ingestion rejected: {reason}")]
    Rejected { reason: String },
}
