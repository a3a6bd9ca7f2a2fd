//! Error types for store operations.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors that can occur during store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// A store file exists but could not be decoded.
    #[error("store file {path:?} is corrupted: {reason}")]
    Corrupted {
        /// File that failed to decode.
        path: PathBuf,
        /// Decoder message.
        reason: String,
    },

    /// The store could not be encoded for writing.
    #[error("encoding error: {0}")]
    Encoding(#[from] serde_json::Error),
}
