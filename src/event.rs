//! Events delivered by the protocol client.

use crate::protocol::{ServerEvent, SessionId};

/// One item of the client's inbound event stream.
///
/// Connection lifecycle events are synthesized by the transport loop; server
/// events are decoded from inbound messages and tagged with the session they
/// belong to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientEvent {
    /// A message channel opened.
    Connected,
    /// The message channel failed to open, failed, or closed.
    Disconnected {
        /// `None` for a clean close by the server.
        reason: Option<String>,
    },
    /// A decoded server event.
    Server {
        session: SessionId,
        event: ServerEvent,
    },
}
