//! Error types for model encoding and decoding.

use thiserror::Error;

/// Result type for model operations.
pub type ModelResult<T> = Result<T, ModelError>;

/// Errors that can occur while encoding or decoding model types.
#[derive(Debug, Error)]
pub enum ModelError {
    /// JSON encoding or decoding failed.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// The message body was empty.
    #[error("empty message body")]
    EmptyBody,

    /// A timestamp was not valid RFC 3339.
    #[error("invalid timestamp {value:?}: {reason}")]
    InvalidTimestamp {
        /// The rejected value.
        value: String,
        /// Parser message.
        reason: String,
    },
}
