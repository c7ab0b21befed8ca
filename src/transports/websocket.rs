//! WebSocket transport using `tokio-tungstenite`.
//!
//! [`WebSocketConnector`] dials the puzzle server and hands back a
//! [`WebSocketTransport`] carrying the protocol's JSON text frames. Every
//! connect opens a fresh socket, which is what the protocol client relies on
//! to reconnect on demand.
//!
//! # Example
//!
//! ```rust,no_run
//! # async fn example() -> Result<(), wordfind_client::WordFindError> {
//! use std::time::Duration;
//! use wordfind_client::{Connector, Transport, WebSocketConnector};
//!
//! let connector = WebSocketConnector::new("ws://localhost:5000")
//!     .with_connect_timeout(Duration::from_secs(3));
//! let mut transport = connector.connect().await?;
//! transport.send(r#"{"comando":"START"}"#.to_string()).await?;
//!
//! if let Some(Ok(reply)) = transport.recv().await {
//!     println!("puzzle: {reply}");
//! }
//!
//! transport.close().await?;
//! # Ok(())
//! # }
//! ```

use std::time::Duration;

use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use tokio_tungstenite::tungstenite::{self, protocol::Message};
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};
use tracing::{debug, info, trace, warn};

use crate::error::WordFindError;
use crate::transport::{Connector, Transport};

type Socket = WebSocketStream<MaybeTlsStream<tokio::net::TcpStream>>;

/// An open socket to the puzzle server, obtained from
/// [`WebSocketConnector::connect`].
///
/// Only text frames reach the caller. Pings are answered by tungstenite and
/// binary frames are logged and skipped. [`recv`](Transport::recv) is
/// cancel-safe.
#[derive(Debug)]
pub struct WebSocketTransport {
    socket: Socket,
    closing: bool,
}

#[async_trait]
impl Transport for WebSocketTransport {
    async fn send(&mut self, message: String) -> Result<(), WordFindError> {
        if self.closing {
            return Err(WordFindError::TransportClosed);
        }
        trace!(%message, "sending frame");
        self.socket
            .send(Message::Text(message.into()))
            .await
            .map_err(|e| WordFindError::TransportSend(e.to_string()))
    }

    async fn recv(&mut self) -> Option<Result<String, WordFindError>> {
        while let Some(frame) = self.socket.next().await {
            match frame {
                Ok(Message::Text(text)) => return Some(Ok(text.to_string())),
                Ok(Message::Close(close)) => {
                    debug!(?close, "server closed the socket");
                    return None;
                }
                Ok(Message::Binary(bytes)) => {
                    warn!(len = bytes.len(), "binary frame from puzzle server ignored");
                }
                Ok(_) => trace!("control frame skipped"),
                Err(e) => return Some(Err(WordFindError::TransportReceive(e.to_string()))),
            }
        }
        None
    }

    async fn close(&mut self) -> Result<(), WordFindError> {
        if std::mem::replace(&mut self.closing, true) {
            return Ok(());
        }
        self.socket
            .close(None)
            .await
            .map_err(|e| WordFindError::TransportSend(e.to_string()))
    }
}

/// Opens a new [`WebSocketTransport`] to a fixed URL on every connect.
///
/// ```
/// use std::time::Duration;
/// use wordfind_client::WebSocketConnector;
///
/// let connector = WebSocketConnector::new("ws://localhost:5000")
///     .with_connect_timeout(Duration::from_secs(3));
/// assert_eq!(connector.url(), "ws://localhost:5000");
/// ```
#[derive(Debug, Clone)]
pub struct WebSocketConnector {
    url: String,
    connect_timeout: Option<Duration>,
}

impl WebSocketConnector {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            connect_timeout: None,
        }
    }

    /// Fail a connect attempt with [`WordFindError::Timeout`] when the
    /// handshake has not finished after `timeout`.
    #[must_use]
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = Some(timeout);
        self
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl Connector for WebSocketConnector {
    type Transport = WebSocketTransport;

    /// # Errors
    ///
    /// [`WordFindError::Timeout`] when the configured timeout elapses, and
    /// [`WordFindError::Io`] for a bad URL or a failed handshake.
    async fn connect(&self) -> Result<WebSocketTransport, WordFindError> {
        debug!(url = %self.url, "opening puzzle server socket");
        let handshake = tokio_tungstenite::connect_async(self.url.as_str());
        let opened = match self.connect_timeout {
            Some(limit) => tokio::time::timeout(limit, handshake)
                .await
                .map_err(|_| WordFindError::Timeout)?,
            None => handshake.await,
        };
        let (socket, _response) = opened.map_err(open_error)?;

        info!(url = %self.url, "puzzle server socket open");
        Ok(WebSocketTransport {
            socket,
            closing: false,
        })
    }
}

/// Report a failed handshake as I/O, keeping the socket error kind if any.
fn open_error(e: tungstenite::Error) -> WordFindError {
    let kind = match &e {
        tungstenite::Error::Io(io) => io.kind(),
        _ => std::io::ErrorKind::Other,
    };
    WordFindError::Io(std::io::Error::new(kind, e))
}

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
    use tokio::net::TcpListener;

    #[test]
    fn websocket_transport_is_send() {
        fn assert_send<T: Send>() {}
        assert_send::<WebSocketTransport>();
    }

    #[tokio::test]
    async fn invalid_url_is_io_error() {
        let err = WebSocketConnector::new("not-a-valid-url")
            .connect()
            .await
            .unwrap_err();
        assert!(matches!(err, WordFindError::Io(_)));
    }

    #[tokio::test]
    async fn refused_port_is_io_error() {
        let err = WebSocketConnector::new("ws://127.0.0.1:1")
            .connect()
            .await
            .unwrap_err();
        assert!(matches!(err, WordFindError::Io(_)));
    }

    /// Serve one socket with `handler` and return a connector pointing at it.
    async fn serve_once<F, Fut>(handler: F) -> WebSocketConnector
    where
        F: FnOnce(WebSocketStream<tokio::net::TcpStream>) -> Fut + Send + 'static,
        Fut: std::future::Future<Output = ()> + Send,
    {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            let (tcp, _) = listener.accept().await.unwrap();
            let ws = tokio_tungstenite::accept_async(tcp).await.unwrap();
            handler(ws).await;
        });

        WebSocketConnector::new(format!("ws://{addr}"))
    }

    #[tokio::test]
    async fn start_is_answered_with_a_puzzle() {
        let connector = serve_once(|mut ws| async move {
            if let Some(Ok(Message::Text(text))) = ws.next().await {
                assert_eq!(text.as_str(), r#"{"comando":"START"}"#);
                ws.send(Message::Text(
                    r#"{"tablero":[["A"]],"palabras":["A"],"total_palabras":1}"#.into(),
                ))
                .await
                .unwrap();
            }
            ws.close(None).await.unwrap();
        })
        .await;

        let mut transport = connector.connect().await.unwrap();
        transport
            .send(r#"{"comando":"START"}"#.to_string())
            .await
            .unwrap();
        let reply = transport.recv().await.unwrap().unwrap();
        assert!(reply.contains("tablero"));
        assert!(transport.recv().await.is_none());
    }

    #[tokio::test]
    async fn binary_frames_are_skipped() {
        let connector = serve_once(|mut ws| async move {
            ws.send(Message::Binary(vec![0xDE, 0xAD].into()))
                .await
                .unwrap();
            ws.send(Message::Text(r#"{"palabras_encontradas":[]}"#.into()))
                .await
                .unwrap();
            ws.close(None).await.unwrap();
        })
        .await;

        let mut transport = connector.connect().await.unwrap();
        let msg = transport.recv().await.unwrap().unwrap();
        assert_eq!(msg, r#"{"palabras_encontradas":[]}"#);
    }

    #[tokio::test]
    async fn closed_transport_refuses_to_send() {
        let connector =
            serve_once(|mut ws| async move { while let Some(Ok(_)) = ws.next().await {} }).await;

        let mut transport = connector.connect().await.unwrap();
        transport.close().await.unwrap();
        transport.close().await.unwrap();

        let err = transport
            .send(r#"{"comando":"RESOLVER"}"#.to_string())
            .await
            .unwrap_err();
        assert!(matches!(err, WordFindError::TransportClosed));
    }

    #[tokio::test]
    async fn stalled_handshake_times_out() {
        // Accepts TCP through the backlog but never answers the upgrade.
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let err = WebSocketConnector::new(format!("ws://{addr}"))
            .with_connect_timeout(Duration::from_millis(50))
            .connect()
            .await
            .unwrap_err();
        assert!(
            matches!(err, WordFindError::Timeout | WordFindError::Io(_)),
            "unexpected error: {err:?}"
        );
        drop(listener);
    }

    #[tokio::test]
    async fn each_connect_opens_a_fresh_socket() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            for _ in 0..2 {
                let (tcp, _) = listener.accept().await.unwrap();
                let mut ws = tokio_tungstenite::accept_async(tcp).await.unwrap();
                ws.send(Message::Text("{}".into())).await.unwrap();
            }
        });

        let connector = WebSocketConnector::new(format!("ws://{addr}"))
            .with_connect_timeout(Duration::from_secs(5));
        for _ in 0..2 {
            let mut transport = connector.connect().await.unwrap();
            assert_eq!(transport.recv().await.unwrap().unwrap(), "{}");
        }
    }
}
