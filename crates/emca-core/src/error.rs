//! Error types for emca-rs.

use thiserror::Error;

/// The main error type for emca-rs operations.
#[derive(Error, Debug)]
pub enum EmcaError {
    /// The stream ended before a declared field or array could be read.
    ///
    /// `needed` is the size of the read that could not be satisfied.
    #[error("truncated stream: read of {needed} bytes could not be satisfied")]
    TruncatedStream { needed: usize },

    /// A shape record carried a type tag that is neither mesh nor sphere.
    #[error("unsupported shape type tag {0}")]
    UnsupportedShapeType(u16),

    /// A user data item carried a type identifier outside the known set.
    #[error("unsupported user data type '{0}'")]
    UnsupportedUserDataType(String),

    /// A record was structurally invalid (implausible counts, bad UTF-8, ...).
    #[error("malformed record: {0}")]
    MalformedRecord(String),

    /// The connection handshake did not complete.
    #[error("handshake failed: {0}")]
    Handshake(String),

    /// The server answered with a different message than the one requested.
    #[error("unexpected message: expected {expected:#06x}, got {actual:#06x}")]
    UnexpectedMessage { expected: u16, actual: u16 },

    /// The server closed the session.
    #[error("server disconnected")]
    Disconnected,

    /// A previous read failed mid-record; the connection must be re-established.
    #[error("connection is unusable after a failed read - reconnect first")]
    ConnectionPoisoned,

    /// I/O error.
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// JSON serialization error.
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}

impl EmcaError {
    /// Shorthand for a [`EmcaError::MalformedRecord`] with a formatted message.
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::MalformedRecord(message.into())
    }

    /// Returns true if this error leaves a stream positioned mid-record.
    ///
    /// Configuration errors never touch the stream; everything else does.
    pub fn desyncs_stream(&self) -> bool {
        !matches!(self, Self::JsonError(_) | Self::ConnectionPoisoned)
    }
}

/// A specialized Result type for emca-rs operations.
pub type Result<T> = std::result::Result<T, EmcaError>;
