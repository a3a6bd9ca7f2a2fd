//! Error types for the sync engine.

use favsync_store::StoreError;
use thiserror::Error;

/// Result type for sync operations.
pub type SyncOutcome<T> = Result<T, SyncError>;

/// Errors that can occur during sync operations.
///
/// Every phase classifies its own failures into one of these variants;
/// nothing else escapes the engine.
#[derive(Error, Debug)]
pub enum SyncError {
    /// No authenticated identity at call time.
    #[error("no authenticated user")]
    Authentication,

    /// DNS, connect or timeout failure.
    #[error("connection error: {message}")]
    Connection {
        /// Error message.
        message: String,
        /// Whether the failure was a timeout.
        timeout: bool,
    },

    /// The server answered with a non-2xx status.
    #[error("server error {code}: {message}")]
    Server {
        /// HTTP status code.
        code: u16,
        /// Response body or reason phrase.
        message: String,
    },

    /// A 2xx pull response carried no parsable body.
    #[error("empty or unparsable response body")]
    EmptyResponse,

    /// Local read or write failure.
    #[error("local storage error: {0}")]
    LocalStorage(#[from] StoreError),

    /// The request could not be encoded.
    #[error("protocol error: {0}")]
    Protocol(String),

    /// Both the pull and the push phase failed.
    #[error("pull failed: {pull}; push failed: {push}")]
    BothPhasesFailed {
        /// Pull phase cause.
        pull: Box<SyncError>,
        /// Push phase cause.
        push: Box<SyncError>,
    },

    /// Scheduler configuration was rejected.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

impl SyncError {
    /// Creates a connection error.
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection {
            message: message.into(),
            timeout: false,
        }
    }

    /// Creates a timeout error.
    pub fn timeout(message: impl Into<String>) -> Self {
        Self::Connection {
            message: message.into(),
            timeout: true,
        }
    }

    /// Creates a server error for `code`.
    pub fn server(code: u16, message: impl Into<String>) -> Self {
        Self::Server {
            code,
            message: message.into(),
        }
    }

    /// Returns true if this error can be retried.
    ///
    /// Connection failures and the server statuses that signal a
    /// temporary condition (408, 429, 5xx) are transient. Everything else
    /// needs a change on the client side before a retry can succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            SyncError::Connection { .. } => true,
            SyncError::Server { code, .. } => matches!(code, 408 | 429 | 500..=599),
            SyncError::BothPhasesFailed { pull, push } => {
                pull.is_retryable() || push.is_retryable()
            }
            _ => false,
        }
    }

    /// Returns true for 401/403 responses, which point at configuration or
    /// permission problems rather than server trouble.
    pub fn is_permission_denied(&self) -> bool {
        match self {
            SyncError::Server { code, .. } => matches!(code, 401 | 403),
            SyncError::BothPhasesFailed { pull, push } => {
                pull.is_permission_denied() || push.is_permission_denied()
            }
            _ => false,
        }
    }
}
