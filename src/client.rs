//! Protocol client: owns the message channel to the puzzle server.
//!
//! [`ProtocolClient`] opens channels through a [`Connector`], runs one
//! background transport loop per open channel, and forwards everything the
//! server says as [`ClientEvent`]s on a single bounded channel that outlives
//! individual connections.
//!
//! Commands sent while no channel is open are dropped with
//! [`WordFindError::NotConnected`]. The one exception is START: asking for a
//! new session while disconnected forces a fresh connect and retries the
//! START once after [`ClientConfig::start_retry_delay`].
//!
//! # Example
//!
//! ```rust,ignore
//! let connector = WebSocketConnector::new("ws://localhost:5000");
//! let (mut client, mut events) = ProtocolClient::new(connector, ClientConfig::new());
//!
//! client.start_session(SessionId::new(1)).await?;
//! while let Some(event) = events.recv().await {
//!     match event {
//!         ClientEvent::Server { session, event } => { /* … */ }
//!         ClientEvent::Disconnected { .. } => break,
//!         ClientEvent::Connected => {}
//!     }
//! }
//! ```

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, oneshot};
use tracing::{debug, error, info, warn};

use crate::error::{Result, WordFindError};
use crate::event::ClientEvent;
use crate::protocol::{ClientCommand, ServerEvent, ServerMessage, SessionId, TaggedCommand};
use crate::transport::{Connector, Transport};

/// Default capacity of the bounded event channel.
const DEFAULT_EVENT_CHANNEL_CAPACITY: usize = 256;

/// Default timeout for the graceful shutdown.
const DEFAULT_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(1);

/// Default delay before re-sending START after a forced connect.
const DEFAULT_START_RETRY_DELAY: Duration = Duration::from_millis(500);

// ── Configuration ───────────────────────────────────────────────────

/// Configuration for a [`ProtocolClient`].
///
/// # Example
///
/// ```
/// use std::time::Duration;
/// use wordfind_client::client::ClientConfig;
///
/// let config = ClientConfig::new()
///     .with_event_channel_capacity(64)
///     .with_start_retry_delay(Duration::from_millis(100));
/// assert_eq!(config.event_channel_capacity, 64);
/// assert_eq!(config.shutdown_timeout, Duration::from_secs(1));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Capacity of the bounded event channel.
    ///
    /// When the consumer falls behind, events are dropped (with a warning
    /// logged) rather than stalling the transport loop. `Disconnected` is
    /// always delivered.
    ///
    /// Defaults to **256**. Values below 1 are clamped to 1.
    pub event_channel_capacity: usize,
    /// How long a transport loop gets to close its channel on shutdown before
    /// it is aborted.
    ///
    /// Defaults to **1 second**.
    pub shutdown_timeout: Duration,
    /// Delay between a forced (re)connect and the retried START.
    ///
    /// Defaults to **500 ms**.
    pub start_retry_delay: Duration,
}

impl ClientConfig {
    pub fn new() -> Self {
        Self {
            event_channel_capacity: DEFAULT_EVENT_CHANNEL_CAPACITY,
            shutdown_timeout: DEFAULT_SHUTDOWN_TIMEOUT,
            start_retry_delay: DEFAULT_START_RETRY_DELAY,
        }
    }

    /// Set the capacity of the bounded event channel. Values below 1 are
    /// clamped to 1.
    #[must_use]
    pub fn with_event_channel_capacity(mut self, capacity: usize) -> Self {
        self.event_channel_capacity = capacity.max(1);
        self
    }

    #[must_use]
    pub fn with_shutdown_timeout(mut self, timeout: Duration) -> Self {
        self.shutdown_timeout = timeout;
        self
    }

    #[must_use]
    pub fn with_start_retry_delay(mut self, delay: Duration) -> Self {
        self.start_retry_delay = delay;
        self
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::new()
    }
}

// ── Connection ──────────────────────────────────────────────────────

/// Handle to one open channel and its transport loop.
struct Connection {
    cmd_tx: mpsc::UnboundedSender<TaggedCommand>,
    connected: Arc<AtomicBool>,
    task: Option<tokio::task::JoinHandle<()>>,
    shutdown_tx: Option<oneshot::Sender<()>>,
}

impl Connection {
    fn spawn(transport: impl Transport, event_tx: mpsc::Sender<ClientEvent>) -> Self {
        let (cmd_tx, cmd_rx) = mpsc::unbounded_channel::<TaggedCommand>();
        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
        let connected = Arc::new(AtomicBool::new(true));

        let task = tokio::spawn(transport_loop(
            transport,
            cmd_rx,
            event_tx,
            Arc::clone(&connected),
            shutdown_rx,
        ));

        Self {
            cmd_tx,
            connected,
            task: Some(task),
            shutdown_tx: Some(shutdown_tx),
        }
    }

    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::Acquire)
    }

    fn send(&self, command: TaggedCommand) -> Result<()> {
        if !self.is_connected() {
            return Err(WordFindError::NotConnected);
        }
        self.cmd_tx
            .send(command)
            .map_err(|_| WordFindError::NotConnected)
    }

    async fn shutdown(&mut self, timeout: Duration) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }

        if let Some(mut task) = self.task.take() {
            match tokio::time::timeout(timeout, &mut task).await {
                Ok(Ok(())) => {}
                Ok(Err(join_err)) => {
                    warn!("transport loop terminated with join error: {join_err}");
                }
                Err(_) => {
                    warn!("transport loop did not exit within timeout; aborting task");
                    task.abort();
                    if let Err(join_err) = task.await {
                        debug!("transport loop aborted: {join_err}");
                    }
                }
            }
        }

        self.connected.store(false, Ordering::Release);
    }
}

impl Drop for Connection {
    fn drop(&mut self) {
        // No executor to drive a graceful close here; aborting drops the
        // transport loop future and the transport with it.
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

// ── Client ──────────────────────────────────────────────────────────

/// Protocol client for the word-find puzzle server.
///
/// The client handle itself is owned by the single event loop that drives
/// the game; only the per-connection transport loops run as tasks.
pub struct ProtocolClient<C: Connector> {
    connector: C,
    config: ClientConfig,
    event_tx: mpsc::Sender<ClientEvent>,
    connection: Option<Connection>,
    /// Delayed START queued after a forced connect.
    start_retry: Option<tokio::task::JoinHandle<()>>,
}

impl<C: Connector> ProtocolClient<C> {
    /// Create a client and its event receiver. No channel is opened yet.
    #[must_use = "the event receiver must be used to receive events"]
    pub fn new(connector: C, config: ClientConfig) -> (Self, mpsc::Receiver<ClientEvent>) {
        let capacity = config.event_channel_capacity.max(1);
        let (event_tx, event_rx) = mpsc::channel::<ClientEvent>(capacity);
        let client = Self {
            connector,
            config,
            event_tx,
            connection: None,
            start_retry: None,
        };
        (client, event_rx)
    }

    /// Open a fresh channel, replacing any previous one.
    ///
    /// A failed connect is reported both as the returned error and as a
    /// [`ClientEvent::Disconnected`] on the event stream.
    ///
    /// # Errors
    ///
    /// Returns whatever the [`Connector`] failed with.
    pub async fn connect(&mut self) -> Result<()> {
        self.cancel_start_retry();
        if let Some(mut old) = self.connection.take() {
            old.shutdown(self.config.shutdown_timeout).await;
        }

        let transport = match self.connector.connect().await {
            Ok(transport) => transport,
            Err(e) => {
                error!("failed to open message channel: {e}");
                emit_event(
                    &self.event_tx,
                    ClientEvent::Disconnected {
                        reason: Some(format!("connection failed: {e}")),
                    },
                );
                return Err(e);
            }
        };

        info!("message channel opened");
        self.connection = Some(Connection::spawn(transport, self.event_tx.clone()));
        Ok(())
    }

    /// Request a new puzzle for `session`.
    ///
    /// With an open channel the START goes out immediately. Otherwise a fresh
    /// channel is opened and the START is sent once after the configured
    /// retry delay.
    ///
    /// A START still waiting for its retry is cancelled: only the newest
    /// session's START reaches the server.
    ///
    /// # Errors
    ///
    /// Returns the connect error if a fresh channel could not be opened.
    pub async fn start_session(&mut self, session: SessionId) -> Result<()> {
        let command = TaggedCommand::new(session, ClientCommand::Start);
        self.cancel_start_retry();
        if self.is_connected() {
            return self.send(command);
        }

        debug!(%session, "channel not open, reconnecting before START");
        self.connect().await?;

        let Some(connection) = self.connection.as_ref() else {
            return Err(WordFindError::NotConnected);
        };
        let cmd_tx = connection.cmd_tx.clone();
        let delay = self.config.start_retry_delay;
        self.start_retry = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if cmd_tx.send(command).is_err() {
                debug!(%session, "channel closed before START retry");
            }
        }));
        Ok(())
    }

    fn cancel_start_retry(&mut self) {
        if let Some(retry) = self.start_retry.take() {
            if !retry.is_finished() {
                debug!("superseded START retry cancelled");
            }
            retry.abort();
        }
    }

    /// Queue a command on the open channel.
    ///
    /// # Errors
    ///
    /// Returns [`WordFindError::NotConnected`] if no channel is open; the
    /// command is dropped.
    pub fn send(&self, command: TaggedCommand) -> Result<()> {
        match self.connection.as_ref() {
            Some(connection) => connection.send(command),
            None => Err(WordFindError::NotConnected),
        }
    }

    /// Returns `true` while a channel is believed to be open.
    pub fn is_connected(&self) -> bool {
        self.connection
            .as_ref()
            .is_some_and(Connection::is_connected)
    }

    /// Close the open channel, if any, and stop its transport loop.
    pub async fn shutdown(&mut self) {
        debug!("ProtocolClient: shutdown requested");
        self.cancel_start_retry();
        if let Some(mut connection) = self.connection.take() {
            connection.shutdown(self.config.shutdown_timeout).await;
        }
    }
}

impl<C: Connector> Drop for ProtocolClient<C> {
    fn drop(&mut self) {
        self.cancel_start_retry();
    }
}

impl<C: Connector> std::fmt::Debug for ProtocolClient<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProtocolClient")
            .field("connected", &self.is_connected())
            .field("config", &self.config)
            .finish()
    }
}

// ── Session attribution ─────────────────────────────────────────────

/// Attributes inbound events to client sessions.
///
/// The server answers commands in order, so each inbound puzzle belongs to
/// the oldest START not yet answered and becomes the live session. A START
/// can also be answered by an error or by a frame that had to be dropped;
/// either one retires the oldest pending START so later puzzles still line up.
/// Everything else the server sends concerns the live session.
#[derive(Debug, Default)]
struct SessionTagger {
    pending_starts: VecDeque<SessionId>,
    live: SessionId,
}

impl SessionTagger {
    fn on_outbound(&mut self, command: &TaggedCommand) {
        if command.command == ClientCommand::Start {
            self.pending_starts.push_back(command.session);
        }
    }

    fn on_inbound(&mut self, event: &ServerEvent) -> SessionId {
        match event {
            ServerEvent::PuzzleReady(_) => {
                if let Some(session) = self.pending_starts.pop_front() {
                    self.live = session;
                }
                self.live
            }
            ServerEvent::Error { .. } => self.retire_oldest_start().unwrap_or(self.live),
            _ => self.live,
        }
    }

    /// A frame could not be decoded. If a START is waiting, count it as the
    /// answer.
    fn on_dropped(&mut self) {
        self.retire_oldest_start();
    }

    fn retire_oldest_start(&mut self) -> Option<SessionId> {
        let session = self.pending_starts.pop_front()?;
        debug!(%session, "START answered without a puzzle");
        Some(session)
    }
}

// ── Transport loop ──────────────────────────────────────────────────

/// Background loop multiplexing commands, inbound frames and shutdown.
///
/// Exits when the command channel closes, shutdown is signalled, the
/// transport closes, or a transport error occurs.
async fn transport_loop(
    mut transport: impl Transport,
    mut cmd_rx: mpsc::UnboundedReceiver<TaggedCommand>,
    event_tx: mpsc::Sender<ClientEvent>,
    connected: Arc<AtomicBool>,
    mut shutdown_rx: oneshot::Receiver<()>,
) {
    debug!("transport loop started");
    let mut tagger = SessionTagger::default();

    emit_event(&event_tx, ClientEvent::Connected);

    loop {
        tokio::select! {
            cmd = cmd_rx.recv() => {
                let Some(tagged) = cmd else {
                    debug!("command channel closed, shutting down transport loop");
                    let _ = transport.close().await;
                    emit_disconnected(&event_tx, &connected, Some("client shut down".into())).await;
                    break;
                };
                match serde_json::to_string(&tagged.command) {
                    Ok(json) => {
                        debug!(session = %tagged.session, %json, "sending command");
                        tagger.on_outbound(&tagged);
                        if let Err(e) = transport.send(json).await {
                            error!("transport send error: {e}");
                            emit_disconnected(
                                &event_tx,
                                &connected,
                                Some(format!("transport send error: {e}")),
                            ).await;
                            break;
                        }
                    }
                    Err(e) => {
                        error!("failed to serialize command: {e}");
                    }
                }
            }

            _ = &mut shutdown_rx => {
                debug!("shutdown signal received");
                let _ = transport.close().await;
                emit_disconnected(&event_tx, &connected, Some("client shut down".into())).await;
                break;
            }

            incoming = transport.recv() => {
                match incoming {
                    Some(Ok(text)) => dispatch_inbound(&text, &mut tagger, &event_tx),
                    Some(Err(e)) => {
                        error!("transport receive error: {e}");
                        emit_disconnected(
                            &event_tx,
                            &connected,
                            Some(format!("transport receive error: {e}")),
                        ).await;
                        break;
                    }
                    None => {
                        debug!("transport closed by server");
                        emit_disconnected(&event_tx, &connected, None).await;
                        break;
                    }
                }
            }
        }
    }

    debug!("transport loop exited");
}

/// Decode one inbound frame and forward its events. Malformed frames are
/// dropped whole.
fn dispatch_inbound(text: &str, tagger: &mut SessionTagger, event_tx: &mpsc::Sender<ClientEvent>) {
    let decoded = ServerMessage::from_json(text).and_then(|message| {
        if let Some(note) = message.message.as_deref() {
            info!(note, "server message");
        }
        message.into_events()
    });
    let events = match decoded {
        Ok(events) => events,
        Err(e) => {
            warn!("dropping server message: {e}, raw: {text}");
            tagger.on_dropped();
            return;
        }
    };
    if events.is_empty() {
        debug!("server message carried nothing actionable: {text}");
    }
    for event in events {
        let session = tagger.on_inbound(&event);
        emit_event(event_tx, ClientEvent::Server { session, event });
    }
}

/// Emit an event without waiting. If the channel is full the event is
/// dropped with a warning.
fn emit_event(event_tx: &mpsc::Sender<ClientEvent>, event: ClientEvent) {
    match event_tx.try_send(event) {
        Ok(()) => {}
        Err(mpsc::error::TrySendError::Full(dropped)) => {
            warn!(
                "event channel full, dropping event: {:?}",
                std::mem::discriminant(&dropped)
            );
        }
        Err(mpsc::error::TrySendError::Closed(_)) => {
            debug!("event channel closed, receiver dropped");
        }
    }
}

/// Mark the connection closed and deliver `Disconnected`, waiting for room
/// if necessary: it is the last event of a connection and is never dropped.
async fn emit_disconnected(
    event_tx: &mpsc::Sender<ClientEvent>,
    connected: &AtomicBool,
    reason: Option<String>,
) {
    connected.store(false, Ordering::Release);
    if event_tx
        .send(ClientEvent::Disconnected { reason })
        .await
        .is_err()
    {
        debug!("event channel closed, receiver dropped");
    }
}

// ── Tests ───────────────────────────────────────────────────────────

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    clippy::todo,
    clippy::unimplemented,
    clippy::indexing_slicing
)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::AtomicUsize;

    // ── Loopback transport ──────────────────────────────────────────

    /// Client half of an in-memory channel pair.
    struct LoopbackTransport {
        to_server: mpsc::UnboundedSender<String>,
        from_server: mpsc::UnboundedReceiver<std::result::Result<String, WordFindError>>,
    }

    /// Server half: what the client sent, and a way to answer.
    struct FakeServer {
        from_client: mpsc::UnboundedReceiver<String>,
        to_client: mpsc::UnboundedSender<std::result::Result<String, WordFindError>>,
    }

    impl FakeServer {
        async fn next_command(&mut self) -> serde_json::Value {
            let text = tokio::time::timeout(Duration::from_secs(2), self.from_client.recv())
                .await
                .expect("timed out waiting for a command")
                .expect("client hung up");
            serde_json::from_str(&text).unwrap()
        }

        fn reply(&self, value: serde_json::Value) {
            self.to_client.send(Ok(value.to_string())).unwrap();
        }
    }

    #[async_trait]
    impl Transport for LoopbackTransport {
        async fn send(&mut self, message: String) -> std::result::Result<(), WordFindError> {
            self.to_server
                .send(message)
                .map_err(|e| WordFindError::TransportSend(e.to_string()))
        }

        async fn recv(&mut self) -> Option<std::result::Result<String, WordFindError>> {
            self.from_server.recv().await
        }

        async fn close(&mut self) -> std::result::Result<(), WordFindError> {
            Ok(())
        }
    }

    /// Hands out loopback transports and passes each server half to the test.
    struct LoopbackConnector {
        servers: mpsc::UnboundedSender<FakeServer>,
        refuse: Arc<AtomicBool>,
        connects: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl Connector for LoopbackConnector {
        type Transport = LoopbackTransport;

        async fn connect(&self) -> std::result::Result<LoopbackTransport, WordFindError> {
            self.connects.fetch_add(1, Ordering::SeqCst);
            if self.refuse.load(Ordering::SeqCst) {
                return Err(WordFindError::Io(std::io::Error::new(
                    std::io::ErrorKind::ConnectionRefused,
                    "refused",
                )));
            }
            let (to_server, from_client) = mpsc::unbounded_channel();
            let (to_client, from_server) = mpsc::unbounded_channel();
            self.servers
                .send(FakeServer {
                    from_client,
                    to_client,
                })
                .unwrap();
            Ok(LoopbackTransport {
                to_server,
                from_server,
            })
        }
    }

    struct Harness {
        client: ProtocolClient<LoopbackConnector>,
        events: mpsc::Receiver<ClientEvent>,
        servers: mpsc::UnboundedReceiver<FakeServer>,
        refuse: Arc<AtomicBool>,
        connects: Arc<AtomicUsize>,
    }

    fn harness() -> Harness {
        let (servers_tx, servers) = mpsc::unbounded_channel();
        let refuse = Arc::new(AtomicBool::new(false));
        let connects = Arc::new(AtomicUsize::new(0));
        let connector = LoopbackConnector {
            servers: servers_tx,
            refuse: Arc::clone(&refuse),
            connects: Arc::clone(&connects),
        };
        let config = ClientConfig::new().with_start_retry_delay(Duration::from_millis(10));
        let (client, events) = ProtocolClient::new(connector, config);
        Harness {
            client,
            events,
            servers,
            refuse,
            connects,
        }
    }

    async fn next_event(events: &mut mpsc::Receiver<ClientEvent>) -> ClientEvent {
        tokio::time::timeout(Duration::from_secs(2), events.recv())
            .await
            .expect("timed out waiting for an event")
            .expect("event channel closed")
    }

    fn puzzle_json() -> serde_json::Value {
        serde_json::json!({
            "tablero": [["C","A","T"],["A","R","X"],["T","X","X"]],
            "palabras": ["CAT"],
            "total_palabras": 1,
        })
    }

    // ── Tests ───────────────────────────────────────────────────────

    #[test]
    fn config_defaults() {
        let config = ClientConfig::default();
        assert_eq!(config.event_channel_capacity, 256);
        assert_eq!(config.shutdown_timeout, Duration::from_secs(1));
        assert_eq!(config.start_retry_delay, Duration::from_millis(500));
    }

    #[test]
    fn event_channel_capacity_is_clamped_to_one() {
        let config = ClientConfig::new().with_event_channel_capacity(0);
        assert_eq!(config.event_channel_capacity, 1);
    }

    #[test]
    fn tagger_attributes_puzzles_to_starts_in_order() {
        let mut tagger = SessionTagger::default();
        let first = SessionId::new(1);
        let second = SessionId::new(2);
        tagger.on_outbound(&TaggedCommand::new(first, ClientCommand::Start));
        tagger.on_outbound(&TaggedCommand::new(second, ClientCommand::Start));

        let found = ServerEvent::FoundWordsUpdated {
            words: vec![],
            completed: false,
        };
        assert_eq!(tagger.on_inbound(&found), SessionId::default());

        let puzzle = match ServerMessage::from_json(&puzzle_json().to_string())
            .unwrap()
            .into_events()
            .unwrap()
            .remove(0)
        {
            event @ ServerEvent::PuzzleReady(_) => event,
            other => panic!("expected puzzle, got {other:?}"),
        };
        assert_eq!(tagger.on_inbound(&puzzle), first);
        assert_eq!(tagger.on_inbound(&found), first);
        assert_eq!(tagger.on_inbound(&puzzle), second);
        assert_eq!(tagger.on_inbound(&found), second);
    }

    fn puzzle_event() -> ServerEvent {
        ServerMessage::from_json(&puzzle_json().to_string())
            .unwrap()
            .into_events()
            .unwrap()
            .remove(0)
    }

    #[test]
    fn tagger_retires_start_answered_by_error() {
        let mut tagger = SessionTagger::default();
        let failed = SessionId::new(1);
        let retried = SessionId::new(2);
        tagger.on_outbound(&TaggedCommand::new(failed, ClientCommand::Start));

        let error = ServerEvent::Error {
            message: "sin palabras".into(),
        };
        assert_eq!(tagger.on_inbound(&error), failed);
        assert!(tagger.pending_starts.is_empty());

        tagger.on_outbound(&TaggedCommand::new(retried, ClientCommand::Start));
        assert_eq!(tagger.on_inbound(&puzzle_event()), retried);
    }

    #[test]
    fn tagger_retires_start_answered_by_dropped_frame() {
        let mut tagger = SessionTagger::default();
        let failed = SessionId::new(1);
        let retried = SessionId::new(2);
        tagger.on_outbound(&TaggedCommand::new(failed, ClientCommand::Start));
        tagger.on_dropped();
        assert!(tagger.pending_starts.is_empty());

        tagger.on_outbound(&TaggedCommand::new(retried, ClientCommand::Start));
        assert_eq!(tagger.on_inbound(&puzzle_event()), retried);
    }

    #[test]
    fn tagger_error_without_pending_start_goes_to_live_session() {
        let mut tagger = SessionTagger::default();
        let live = SessionId::new(3);
        tagger.on_outbound(&TaggedCommand::new(live, ClientCommand::Start));
        assert_eq!(tagger.on_inbound(&puzzle_event()), live);

        tagger.on_dropped();
        let error = ServerEvent::Error {
            message: "No hay juego activo".into(),
        };
        assert_eq!(tagger.on_inbound(&error), live);
    }

    #[tokio::test]
    async fn send_without_channel_is_dropped() {
        let h = harness();
        let err = h
            .client
            .send(TaggedCommand::new(SessionId::new(1), ClientCommand::Solve))
            .unwrap_err();
        assert!(matches!(err, WordFindError::NotConnected));
        assert!(!h.client.is_connected());
    }

    #[tokio::test]
    async fn connect_emits_connected() {
        let mut h = harness();
        h.client.connect().await.unwrap();
        assert_eq!(next_event(&mut h.events).await, ClientEvent::Connected);
        assert!(h.client.is_connected());
        h.client.shutdown().await;
    }

    #[tokio::test]
    async fn start_session_when_disconnected_connects_then_sends_start() {
        let mut h = harness();
        h.client.start_session(SessionId::new(1)).await.unwrap();
        assert_eq!(h.connects.load(Ordering::SeqCst), 1);

        let mut server = h.servers.recv().await.unwrap();
        assert_eq!(
            server.next_command().await,
            serde_json::json!({ "comando": "START" })
        );
        h.client.shutdown().await;
    }

    #[tokio::test]
    async fn start_session_on_open_channel_does_not_reconnect() {
        let mut h = harness();
        h.client.connect().await.unwrap();
        let mut server = h.servers.recv().await.unwrap();

        h.client.start_session(SessionId::new(1)).await.unwrap();
        assert_eq!(
            server.next_command().await,
            serde_json::json!({ "comando": "START" })
        );
        assert_eq!(h.connects.load(Ordering::SeqCst), 1);
        h.client.shutdown().await;
    }

    #[tokio::test]
    async fn inbound_puzzle_is_tagged_with_start_session() {
        let mut h = harness();
        h.client.start_session(SessionId::new(7)).await.unwrap();
        let mut server = h.servers.recv().await.unwrap();
        assert_eq!(next_event(&mut h.events).await, ClientEvent::Connected);

        server.next_command().await;
        server.reply(puzzle_json());

        let ClientEvent::Server { session, event } = next_event(&mut h.events).await else {
            panic!("expected a server event");
        };
        assert_eq!(session, SessionId::new(7));
        assert!(matches!(event, ServerEvent::PuzzleReady(_)));
        h.client.shutdown().await;
    }

    #[tokio::test]
    async fn malformed_messages_are_dropped() {
        let mut h = harness();
        h.client.connect().await.unwrap();
        let server = h.servers.recv().await.unwrap();
        assert_eq!(next_event(&mut h.events).await, ClientEvent::Connected);

        server.to_client.send(Ok("not json".into())).unwrap();
        server.reply(serde_json::json!({ "tablero": [["A","B"]], "palabras": ["AB"] }));
        server.reply(serde_json::json!({ "error": "sin juego" }));

        let event = next_event(&mut h.events).await;
        assert_eq!(
            event,
            ClientEvent::Server {
                session: SessionId::default(),
                event: ServerEvent::Error {
                    message: "sin juego".into()
                }
            }
        );
        h.client.shutdown().await;
    }

    #[tokio::test]
    async fn server_hang_up_emits_disconnected() {
        let mut h = harness();
        h.client.connect().await.unwrap();
        let server = h.servers.recv().await.unwrap();
        assert_eq!(next_event(&mut h.events).await, ClientEvent::Connected);

        drop(server);
        assert_eq!(
            next_event(&mut h.events).await,
            ClientEvent::Disconnected { reason: None }
        );
        assert!(!h.client.is_connected());

        let err = h
            .client
            .send(TaggedCommand::new(
                SessionId::new(1),
                ClientCommand::FoundWord { word: "CAT".into() },
            ))
            .unwrap_err();
        assert!(matches!(err, WordFindError::NotConnected));
    }

    #[tokio::test]
    async fn receive_error_emits_disconnected_with_reason() {
        let mut h = harness();
        h.client.connect().await.unwrap();
        let server = h.servers.recv().await.unwrap();
        assert_eq!(next_event(&mut h.events).await, ClientEvent::Connected);

        server
            .to_client
            .send(Err(WordFindError::TransportReceive("boom".into())))
            .unwrap();
        let ClientEvent::Disconnected { reason } = next_event(&mut h.events).await else {
            panic!("expected Disconnected");
        };
        assert!(reason.unwrap().contains("boom"));
    }

    #[tokio::test]
    async fn refused_connect_reports_disconnected() {
        let mut h = harness();
        h.refuse.store(true, Ordering::SeqCst);

        let err = h.client.start_session(SessionId::new(1)).await.unwrap_err();
        assert!(matches!(err, WordFindError::Io(_)));
        let ClientEvent::Disconnected { reason } = next_event(&mut h.events).await else {
            panic!("expected Disconnected");
        };
        assert!(reason.unwrap().contains("connection failed"));
        assert!(!h.client.is_connected());
    }

    #[tokio::test]
    async fn new_session_after_hang_up_reconnects() {
        let mut h = harness();
        h.client.connect().await.unwrap();
        drop(h.servers.recv().await.unwrap());
        assert_eq!(next_event(&mut h.events).await, ClientEvent::Connected);
        assert!(matches!(
            next_event(&mut h.events).await,
            ClientEvent::Disconnected { .. }
        ));

        h.client.start_session(SessionId::new(2)).await.unwrap();
        assert_eq!(h.connects.load(Ordering::SeqCst), 2);
        let mut server = h.servers.recv().await.unwrap();
        assert_eq!(
            server.next_command().await,
            serde_json::json!({ "comando": "START" })
        );
        h.client.shutdown().await;
    }

    #[tokio::test]
    async fn shutdown_emits_disconnected() {
        let mut h = harness();
        h.client.connect().await.unwrap();
        let _server = h.servers.recv().await.unwrap();
        assert_eq!(next_event(&mut h.events).await, ClientEvent::Connected);

        h.client.shutdown().await;
        assert_eq!(
            next_event(&mut h.events).await,
            ClientEvent::Disconnected {
                reason: Some("client shut down".into())
            }
        );
        assert!(!h.client.is_connected());
        h.client.shutdown().await; // idempotent
    }

    #[tokio::test]
    async fn debug_impl_for_client() {
        let h = harness();
        let debug_str = format!("{:?}", h.client);
        assert!(debug_str.contains("ProtocolClient"));
        assert!(debug_str.contains("connected"));
    }
}
