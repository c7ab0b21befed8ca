//! # Word-Find Client
//!
//! Client for a word-search puzzle server.
//!
//! The server hands out a square letter grid and a word list; the player
//! drags straight lines across the grid to spell words. This crate holds
//! everything between the pointer and the wire: line geometry, drag
//! selection, the puzzle session state machine, cell highlighting and the
//! JSON protocol client.
//!
//! ## Features
//!
//! - **Pure core**: [`geometry`], [`selection`], [`session`] and [`render`]
//!   do no I/O and can be driven from any front end
//! - **Transport-agnostic**: implement [`Transport`] and [`Connector`] for
//!   any bidirectional text channel
//! - **WebSocket built-in**: the default `transport-websocket` feature
//!   provides [`WebSocketConnector`]
//! - **Session-safe**: replies are tagged with the session that asked for
//!   them, so a late answer never lands in a newer puzzle
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! # async fn example() -> Result<(), wordfind_client::WordFindError> {
//! use wordfind_client::{Cell, ClientConfig, Game, SessionConfig, WebSocketConnector};
//!
//! let connector = WebSocketConnector::new("ws://localhost:5000");
//! let mut game = Game::new(connector, ClientConfig::new(), SessionConfig::new());
//! game.new_game().await?;
//!
//! // Wait for the puzzle.
//! while game.board_view().is_none() && game.step().await {}
//!
//! game.pointer_down(Cell::new(0, 0));
//! game.pointer_enter(Cell::new(0, 3));
//! if let Some(outcome) = game.pointer_up() {
//!     println!("{outcome:?}");
//! }
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod event;
pub mod geometry;
pub mod protocol;
pub mod puzzle;
pub mod render;
pub mod selection;
pub mod session;
pub mod transport;
pub mod transports;

#[cfg(feature = "tokio-runtime")]
pub mod client;
#[cfg(feature = "tokio-runtime")]
pub mod game;

// Re-export primary types for ergonomic imports.
pub use error::WordFindError;
pub use event::ClientEvent;
pub use geometry::{resolve, Cell, CellPath};
pub use protocol::{ClientCommand, ServerEvent, ServerMessage, SessionId, TaggedCommand};
pub use puzzle::{FoundEntry, Grid, Puzzle, SolutionEntry, WordList};
pub use render::{BoardView, CellClass, Progress, WordStatus};
pub use selection::SelectionController;
pub use session::{Notice, NoticeKind, Session, SessionConfig, SessionPhase, Submission};
pub use transport::{Connector, Transport};

#[cfg(feature = "tokio-runtime")]
pub use client::{ClientConfig, ProtocolClient};
#[cfg(feature = "tokio-runtime")]
pub use game::Game;

#[cfg(feature = "transport-websocket")]
pub use transports::{WebSocketConnector, WebSocketTransport};
