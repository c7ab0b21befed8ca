//! Transport abstraction for the word-find message channel.
//!
//! The [`Transport`] trait defines a bidirectional text message channel between
//! the client and the puzzle server. The protocol uses JSON text messages, so
//! every transport implementation must handle message framing internally
//! (e.g., WebSocket frames, length-prefixed TCP).
//!
//! # Connection Setup
//!
//! A [`Transport`] is one already-open channel. Opening channels is the job of
//! a [`Connector`]: the protocol client asks it for a fresh transport whenever
//! a new session is requested while the previous channel is gone.
//!
//! # Implementing a Custom Transport
//!
//! ```rust,no_run
//! use async_trait::async_trait;
//! use wordfind_client::error::WordFindError;
//! use wordfind_client::transport::Transport;
//!
//! struct MyTransport { /* ... */ }
//!
//! #[async_trait]
//! impl Transport for MyTransport {
//!     async fn send(&mut self, message: String) -> Result<(), WordFindError> {
//!         // Send the JSON text message over your transport
//!         todo!()
//!     }
//!
//!     async fn recv(&mut self) -> Option<Result<String, WordFindError>> {
//!         // Receive the next JSON text message
//!         // Return None when the connection is closed cleanly
//!         todo!()
//!     }
//!
//!     async fn close(&mut self) -> Result<(), WordFindError> {
//!         todo!()
//!     }
//! }
//! ```

use async_trait::async_trait;

use crate::error::WordFindError;

/// A bidirectional text message transport.
///
/// Each call to [`send`](Transport::send) transmits one complete JSON message.
/// Each call to [`recv`](Transport::recv) returns one complete JSON message.
///
/// # Cancel Safety
///
/// The [`recv`](Transport::recv) method **MUST** be cancel-safe because it is used
/// inside `tokio::select!`. If `recv` is cancelled before completion, calling it
/// again must not lose data.
#[async_trait]
pub trait Transport: Send + 'static {
    /// Send a JSON text message to the server.
    ///
    /// # Errors
    ///
    /// Returns [`WordFindError::TransportSend`] if the message could not be sent.
    async fn send(&mut self, message: String) -> Result<(), WordFindError>;

    /// Receive the next JSON text message from the server.
    ///
    /// Returns:
    /// - `Some(Ok(text))`: a complete message was received
    /// - `Some(Err(e))`: a transport error occurred
    /// - `None`: the connection was closed cleanly by the server
    async fn recv(&mut self) -> Option<Result<String, WordFindError>>;

    /// Close the transport connection gracefully.
    ///
    /// # Errors
    ///
    /// Returns an error if the graceful shutdown fails. Implementations should
    /// still release resources even if the close handshake fails.
    async fn close(&mut self) -> Result<(), WordFindError>;
}

/// Opens fresh [`Transport`]s to the puzzle server.
#[async_trait]
pub trait Connector: Send + Sync + 'static {
    /// The transport produced by a successful connect.
    type Transport: Transport;

    /// Open a new channel.
    ///
    /// # Errors
    ///
    /// Returns [`WordFindError::Io`] or [`WordFindError::Timeout`] if the
    /// channel cannot be opened.
    async fn connect(&self) -> Result<Self::Transport, WordFindError>;
}
