#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    clippy::todo,
    clippy::unimplemented,
    clippy::indexing_slicing,
    dead_code
)]
//! Shared test utilities for word-find client integration tests.
//!
//! Provides an in-memory [`LoopbackTransport`], the [`FakeServer`] end that
//! tests drive, a [`MockConnector`] that hands out one fresh pair per connect,
//! and helpers for building server response JSON.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};
use tokio::sync::mpsc;
use wordfind_client::{Connector, Transport, WordFindError};

/// How long any single wait in a test may take before it fails.
pub const WAIT: Duration = Duration::from_secs(2);

// ── Loopback transport ──────────────────────────────────────────────

/// Client end of an in-memory message channel.
pub struct LoopbackTransport {
    to_server: mpsc::UnboundedSender<String>,
    from_server: mpsc::UnboundedReceiver<Result<String, WordFindError>>,
    closed: Arc<AtomicBool>,
}

#[async_trait]
impl Transport for LoopbackTransport {
    async fn send(&mut self, message: String) -> Result<(), WordFindError> {
        if self.closed.load(Ordering::Acquire) {
            return Err(WordFindError::TransportClosed);
        }
        self.to_server
            .send(message)
            .map_err(|e| WordFindError::TransportSend(e.to_string()))
    }

    async fn recv(&mut self) -> Option<Result<String, WordFindError>> {
        self.from_server.recv().await
    }

    async fn close(&mut self) -> Result<(), WordFindError> {
        self.closed.store(true, Ordering::Release);
        Ok(())
    }
}

/// Server end of an in-memory message channel.
///
/// Dropping it closes the channel from the server side.
pub struct FakeServer {
    from_client: mpsc::UnboundedReceiver<String>,
    to_client: mpsc::UnboundedSender<Result<String, WordFindError>>,
    /// Set once the client closed its end.
    pub closed: Arc<AtomicBool>,
}

impl FakeServer {
    /// Wait for the next command the client sent, parsed as JSON.
    pub async fn next_command(&mut self) -> Value {
        let text = tokio::time::timeout(WAIT, self.from_client.recv())
            .await
            .expect("timed out waiting for a client command")
            .expect("client end dropped");
        serde_json::from_str(&text).expect("client sent invalid JSON")
    }

    /// Wait for the next command and assert it equals `expected`.
    pub async fn expect_command(&mut self, expected: Value) {
        assert_eq!(self.next_command().await, expected);
    }

    /// Assert that nothing arrives within `window`.
    pub async fn expect_silence(&mut self, window: Duration) {
        if let Ok(Some(text)) = tokio::time::timeout(window, self.from_client.recv()).await {
            panic!("unexpected client command: {text}");
        }
    }

    /// Send a JSON message to the client.
    pub fn send(&self, message: Value) {
        self.send_raw(message.to_string());
    }

    /// Send raw text to the client, valid JSON or not.
    pub fn send_raw(&self, text: impl Into<String>) {
        self.to_client
            .send(Ok(text.into()))
            .expect("client end dropped");
    }

    /// Make the client's next receive fail with a transport error.
    pub fn fail(&self, reason: &str) {
        self.to_client
            .send(Err(WordFindError::TransportReceive(reason.into())))
            .expect("client end dropped");
    }
}

// ── Connector ───────────────────────────────────────────────────────

/// Hands out a fresh loopback pair per connect and passes the server end
/// to the test through [`MockConnector::new`]'s receiver.
pub struct MockConnector {
    servers: mpsc::UnboundedSender<FakeServer>,
    /// While set, every connect attempt is refused.
    pub refuse: Arc<AtomicBool>,
    /// Number of connect attempts so far.
    pub connects: Arc<AtomicUsize>,
}

impl MockConnector {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<FakeServer>) {
        let (servers, rx) = mpsc::unbounded_channel();
        let connector = Self {
            servers,
            refuse: Arc::new(AtomicBool::new(false)),
            connects: Arc::new(AtomicUsize::new(0)),
        };
        (connector, rx)
    }
}

#[async_trait]
impl Connector for MockConnector {
    type Transport = LoopbackTransport;

    async fn connect(&self) -> Result<LoopbackTransport, WordFindError> {
        self.connects.fetch_add(1, Ordering::SeqCst);
        if self.refuse.load(Ordering::SeqCst) {
            return Err(WordFindError::Io(std::io::Error::new(
                std::io::ErrorKind::ConnectionRefused,
                "connection refused",
            )));
        }

        let (to_server, from_client) = mpsc::unbounded_channel();
        let (to_client, from_server) = mpsc::unbounded_channel();
        let closed = Arc::new(AtomicBool::new(false));
        let server = FakeServer {
            from_client,
            to_client,
            closed: Arc::clone(&closed),
        };
        if self.servers.send(server).is_err() {
            return Err(WordFindError::TransportClosed);
        }
        Ok(LoopbackTransport {
            to_server,
            from_server,
            closed,
        })
    }
}

/// Wait for the connector to hand out its next server end.
pub async fn accept(servers: &mut mpsc::UnboundedReceiver<FakeServer>) -> FakeServer {
    tokio::time::timeout(WAIT, servers.recv())
        .await
        .expect("timed out waiting for a connect")
        .expect("connector dropped")
}

// ── JSON helper functions ───────────────────────────────────────────

/// The 3×3 grid used throughout the tests:
///
/// ```text
/// C A T
/// A R X
/// T X X
/// ```
pub fn cat_board() -> Value {
    json!([["C", "A", "T"], ["A", "R", "X"], ["T", "X", "X"]])
}

/// A puzzle message for [`cat_board`] with the given words.
pub fn puzzle_json(words: &[&str]) -> Value {
    json!({
        "tablero": cat_board(),
        "palabras": words,
        "total_palabras": words.len(),
    })
}

/// A complete solution placing "CAT" along the top row.
pub fn cat_solution_json() -> Value {
    json!({
        "soluciones": [
            { "palabra": "CAT", "posiciones": [[0, 0], [0, 1], [0, 2]] }
        ],
    })
}

/// A found-word update.
pub fn found_json(words: &[&str], completed: bool) -> Value {
    json!({
        "palabras_encontradas": words,
        "completado": completed,
    })
}

pub fn error_json(message: &str) -> Value {
    json!({ "error": message })
}

pub fn start_command() -> Value {
    json!({ "comando": "START" })
}

pub fn found_command(word: &str) -> Value {
    json!({ "comando": "ENCONTRAR", "palabra": word })
}

pub fn solve_command() -> Value {
    json!({ "comando": "RESOLVER" })
}
