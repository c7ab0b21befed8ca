//! Error types for the word-find client.

use thiserror::Error;

/// Errors that can occur when using the word-find client.
#[derive(Debug, Error)]
pub enum WordFindError {
    /// Failed to send a message through the transport.
    #[error("transport send error: {0}")]
    TransportSend(String),

    /// Failed to receive a message from the transport.
    #[error("transport receive error: {0}")]
    TransportReceive(String),

    /// The transport connection was closed unexpectedly.
    #[error("transport connection closed")]
    TransportClosed,

    /// Failed to serialize or deserialize a protocol message.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Attempted to send a command while the message channel is not open.
    #[error("not connected to server")]
    NotConnected,

    /// An inbound message parsed as JSON but its fields do not describe a
    /// usable puzzle, solution or found-word update.
    #[error("malformed server message: {0}")]
    MalformedMessage(String),

    /// An operation timed out (connecting, or waiting for a solution reveal).
    #[error("operation timed out")]
    Timeout,

    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// A specialized [`Result`] type for word-find client operations.
pub type Result<T> = std::result::Result<T, WordFindError>;
