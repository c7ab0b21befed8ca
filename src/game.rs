//! Single-owner driver tying pointer input, the session state machine, the
//! selection controller and the protocol client together.
//!
//! [`Game`] is what a front end holds. Pointer gestures and buttons call its
//! methods directly; [`Game::step`] waits for the next client event (or for
//! a pending solution request to expire) and applies it. User-visible
//! outcomes queue up as [`Notice`]s until drained.
//!
//! # Example
//!
//! ```rust,no_run
//! # async fn example() -> Result<(), wordfind_client::WordFindError> {
//! use wordfind_client::{ClientConfig, Game, SessionConfig, WebSocketConnector};
//!
//! let connector = WebSocketConnector::new("ws://localhost:5000");
//! let mut game = Game::new(connector, ClientConfig::new(), SessionConfig::new());
//! game.new_game().await?;
//!
//! while game.step().await {
//!     for notice in game.drain_notices() {
//!         println!("{notice}");
//!     }
//! }
//! # Ok(())
//! # }
//! ```

use std::collections::VecDeque;
use std::time::Instant;

use tokio::sync::mpsc;
use tracing::debug;

use crate::client::{ClientConfig, ProtocolClient};
use crate::error::Result;
use crate::event::ClientEvent;
use crate::geometry::Cell;
use crate::protocol::TaggedCommand;
use crate::render::{self, BoardView, Progress, WordStatus};
use crate::selection::SelectionController;
use crate::session::{Notice, Session, SessionConfig, SessionPhase, Submission};
use crate::transport::Connector;

const REVEAL_TIMEOUT_TEXT: &str = "The solution did not arrive in time";

/// A word-find game bound to one puzzle server.
pub struct Game<C: Connector> {
    client: ProtocolClient<C>,
    events: mpsc::Receiver<ClientEvent>,
    session: Session,
    selection: SelectionController,
    notices: VecDeque<Notice>,
}

impl<C: Connector> Game<C> {
    pub fn new(connector: C, client_config: ClientConfig, session_config: SessionConfig) -> Self {
        let (client, events) = ProtocolClient::new(connector, client_config);
        Self {
            client,
            events,
            session: Session::new(session_config),
            selection: SelectionController::new(),
            notices: VecDeque::new(),
        }
    }

    /// Open the message channel without starting a session. Does nothing
    /// while a channel is already open, so the current session survives.
    ///
    /// # Errors
    ///
    /// Returns the connect error. It is also reported through the event
    /// stream as a disconnect notice.
    pub async fn connect(&mut self) -> Result<()> {
        if self.client.is_connected() {
            debug!("connect skipped, channel already open");
            return Ok(());
        }
        self.client.connect().await
    }

    /// Abandon the current session and request a new puzzle.
    ///
    /// Reconnects first when the channel is down.
    ///
    /// # Errors
    ///
    /// Returns the connect error if the channel had to be reopened and could
    /// not be. The session has already been reset to Idle in that case.
    pub async fn new_game(&mut self) -> Result<()> {
        self.selection.cancel();
        let start = self.session.request_new_session();
        self.client.start_session(start.session).await
    }

    // ── Pointer input ───────────────────────────────────────────────

    /// Pointer pressed on `cell`. Returns whether a drag started.
    pub fn pointer_down(&mut self, cell: Cell) -> bool {
        if !self.on_grid(cell) {
            return false;
        }
        self.selection
            .begin_drag(cell, self.session.accepts_selection())
    }

    /// Pointer moved onto `cell`. Returns whether the selection changed.
    pub fn pointer_enter(&mut self, cell: Cell) -> bool {
        if !self.on_grid(cell) {
            return false;
        }
        self.selection.extend_drag(cell)
    }

    /// Pointer released. Submits the traced path, forwards an accepted word
    /// to the server and returns the outcome. `None` when no drag was active.
    pub fn pointer_up(&mut self) -> Option<Submission> {
        let path = self.selection.end_drag()?;
        let submission = self.session.submit_candidate(&path);
        if let Some(notice) = submission.notice() {
            self.notices.push_back(notice);
        }
        if let Some(command) = submission.command() {
            self.forward(command.clone());
        }
        Some(submission)
    }

    /// Ask the server for the solution. Returns whether a request was sent.
    pub fn reveal(&mut self) -> bool {
        let Some(command) = self.session.request_reveal(Instant::now()) else {
            return false;
        };
        self.selection.cancel();
        self.forward(command);
        true
    }

    // ── Event loop ──────────────────────────────────────────────────

    /// Wait for the next client event, or for a pending solution request to
    /// expire, and apply it.
    ///
    /// Returns `false` once the event stream has ended.
    pub async fn step(&mut self) -> bool {
        let deadline = self.session.reveal_deadline();
        tokio::select! {
            event = self.events.recv() => match event {
                Some(event) => {
                    self.handle_event(event);
                    true
                }
                None => false,
            },
            () = wait_until(deadline) => {
                self.tick(Instant::now());
                true
            }
        }
    }

    /// Apply one client event.
    pub fn handle_event(&mut self, event: ClientEvent) {
        let notice = match event {
            ClientEvent::Connected => Some(self.session.connection_restored()),
            ClientEvent::Disconnected { reason } => {
                Some(self.session.connection_lost(reason.as_deref()))
            }
            ClientEvent::Server { session, event } => self.session.apply(session, event),
        };
        if let Some(notice) = notice {
            self.notices.push_back(notice);
        }
        if self.session.phase() != SessionPhase::Active {
            self.selection.cancel();
        }
    }

    /// Expire a solution request that went unanswered for too long.
    pub fn tick(&mut self, now: Instant) {
        if let Err(e) = self.session.poll_reveal_timeout(now) {
            debug!("solution request expired: {e}");
            self.notices.push_back(Notice::error(REVEAL_TIMEOUT_TEXT));
        }
    }

    /// Take every notice queued since the last call, oldest first.
    pub fn drain_notices(&mut self) -> Vec<Notice> {
        self.notices.drain(..).collect()
    }

    // ── Views ───────────────────────────────────────────────────────

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn selection(&self) -> &SelectionController {
        &self.selection
    }

    pub fn is_connected(&self) -> bool {
        self.client.is_connected()
    }

    /// Cell classes for the current grid, or `None` before a puzzle arrives.
    pub fn board_view(&self) -> Option<BoardView> {
        let puzzle = self.session.puzzle()?;
        Some(render::project(
            puzzle.grid(),
            self.session.found_entries(),
            self.session.solution_entries(),
            self.selection.path(),
        ))
    }

    pub fn progress(&self) -> Progress {
        let Some(puzzle) = self.session.puzzle() else {
            return Progress::default();
        };
        Progress {
            found: puzzle
                .words()
                .iter()
                .filter(|word| self.session.is_found(word))
                .count(),
            total: puzzle.total_words(),
        }
    }

    pub fn word_statuses(&self) -> Vec<WordStatus> {
        self.session
            .puzzle()
            .map(|puzzle| render::word_statuses(puzzle.words(), |word| self.session.is_found(word)))
            .unwrap_or_default()
    }

    /// Elapsed session time as `MM:SS`.
    pub fn elapsed_label(&self) -> String {
        render::format_elapsed(self.session.elapsed())
    }

    /// Close the message channel.
    pub async fn shutdown(&mut self) {
        self.selection.cancel();
        self.client.shutdown().await;
    }

    fn on_grid(&self, cell: Cell) -> bool {
        self.session
            .puzzle()
            .is_some_and(|puzzle| puzzle.grid().contains(cell))
    }

    fn forward(&self, command: TaggedCommand) {
        if let Err(e) = self.client.send(command) {
            debug!("command dropped: {e}");
        }
    }
}

impl<C: Connector> std::fmt::Debug for Game<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Game")
            .field("client", &self.client)
            .field("session", &self.session.id())
            .field("phase", &self.session.phase())
            .finish()
    }
}

async fn wait_until(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => {
            tokio::time::sleep_until(tokio::time::Instant::from_std(deadline)).await;
        }
        None => std::future::pending().await,
    }
}
