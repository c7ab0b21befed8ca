//! Puzzle session state machine.
//!
//! [`Session`] owns the puzzle, the found and solution entries, the phase and
//! the elapsed-time stopwatch. Nothing else mutates them: pointer candidates,
//! server events and connection changes all enter through its methods, and
//! the commands it wants sent come back to the caller as [`TaggedCommand`]s.
//!
//! Every session carries a monotonic [`SessionId`]. Server events tagged
//! with any other id are stale and ignored.

use std::collections::BTreeSet;
use std::fmt;
use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use crate::error::{Result, WordFindError};
use crate::geometry::CellPath;
use crate::protocol::{ClientCommand, ServerEvent, SessionId, SolutionReveal, TaggedCommand};
use crate::puzzle::{FoundEntry, Puzzle, SolutionEntry};

/// Default time to wait for a solution reveal before giving up.
const DEFAULT_REVEAL_TIMEOUT: Duration = Duration::from_secs(15);

// ── Configuration ───────────────────────────────────────────────────

/// Configuration for a [`Session`].
///
/// # Example
///
/// ```
/// use std::time::Duration;
/// use wordfind_client::session::SessionConfig;
///
/// let config = SessionConfig::new().with_reveal_timeout(Some(Duration::from_secs(5)));
/// assert_eq!(config.reveal_timeout, Some(Duration::from_secs(5)));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    /// How long a solution request may stay unanswered before it is dropped
    /// with a [`WordFindError::Timeout`]. `None` waits forever.
    ///
    /// Defaults to **15 seconds**.
    pub reveal_timeout: Option<Duration>,
}

impl SessionConfig {
    pub fn new() -> Self {
        Self {
            reveal_timeout: Some(DEFAULT_REVEAL_TIMEOUT),
        }
    }

    #[must_use]
    pub fn with_reveal_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.reveal_timeout = timeout;
        self
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self::new()
    }
}

// ── Phase & notices ─────────────────────────────────────────────────

/// Lifecycle phase of the current session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum SessionPhase {
    /// No grid loaded.
    #[default]
    Idle,
    /// Grid loaded, timer running, selection enabled.
    Active,
    /// All words found or solution revealed.
    Solved,
    /// Connection lost mid-session.
    Aborted,
}

impl fmt::Display for SessionPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::Active => "active",
            Self::Solved => "solved",
            Self::Aborted => "aborted",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NoticeKind {
    Success,
    Error,
    Info,
}

/// A transient, user-visible status line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub kind: NoticeKind,
    pub text: String,
}

impl Notice {
    pub fn success(text: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Success,
            text: text.into(),
        }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Error,
            text: text.into(),
        }
    }

    pub fn info(text: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Info,
            text: text.into(),
        }
    }
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

// ── Submission outcome ──────────────────────────────────────────────

/// Result of submitting a traced path as a candidate word.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Submission {
    /// The session is not accepting candidates.
    Ignored,
    /// The letters along the path are not a target word.
    NotAWord { candidate: String },
    /// The word is already in the found set. Nothing is sent.
    AlreadyFound { word: String },
    /// The word was recorded. `command` must be forwarded to the server.
    Accepted {
        word: String,
        command: TaggedCommand,
        /// The found set now covers the whole word list.
        completed: bool,
    },
}

impl Submission {
    pub fn notice(&self) -> Option<Notice> {
        match self {
            Self::Ignored => None,
            Self::NotAWord { candidate } => Some(Notice::info(format!("{candidate} is not a word"))),
            Self::AlreadyFound { .. } => Some(Notice::info("You already found that word")),
            Self::Accepted {
                completed: true, ..
            } => Some(Notice::success(ALL_FOUND_TEXT)),
            Self::Accepted { word, .. } => Some(Notice::success(format!("Found: {word}!"))),
        }
    }

    pub fn command(&self) -> Option<&TaggedCommand> {
        match self {
            Self::Accepted { command, .. } => Some(command),
            _ => None,
        }
    }
}

const ALL_FOUND_TEXT: &str = "Congratulations! You found all the words";

// ── Stopwatch ───────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
enum Stopwatch {
    #[default]
    Reset,
    Running(Instant),
    Stopped(Duration),
}

impl Stopwatch {
    fn start(&mut self, now: Instant) {
        *self = Self::Running(now);
    }

    fn stop(&mut self, now: Instant) {
        if let Self::Running(started) = *self {
            *self = Self::Stopped(now.saturating_duration_since(started));
        }
    }

    fn elapsed(&self, now: Instant) -> Duration {
        match *self {
            Self::Reset => Duration::ZERO,
            Self::Running(started) => now.saturating_duration_since(started),
            Self::Stopped(elapsed) => elapsed,
        }
    }
}

// ── Session ─────────────────────────────────────────────────────────

/// The puzzle session state machine.
#[derive(Debug, Clone)]
pub struct Session {
    config: SessionConfig,
    id: SessionId,
    phase: SessionPhase,
    puzzle: Option<Puzzle>,
    found: Vec<FoundEntry>,
    /// Every word credited as found, by client acceptance or by the server.
    found_words: BTreeSet<String>,
    solutions: Vec<SolutionEntry>,
    stopwatch: Stopwatch,
    reveal_requested_at: Option<Instant>,
}

impl Session {
    pub fn new(config: SessionConfig) -> Self {
        Self {
            config,
            id: SessionId::default(),
            phase: SessionPhase::Idle,
            puzzle: None,
            found: Vec::new(),
            found_words: BTreeSet::new(),
            solutions: Vec::new(),
            stopwatch: Stopwatch::default(),
            reveal_requested_at: None,
        }
    }

    // ── Accessors ───────────────────────────────────────────────────

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn puzzle(&self) -> Option<&Puzzle> {
        self.puzzle.as_ref()
    }

    pub fn found_entries(&self) -> &[FoundEntry] {
        &self.found
    }

    pub fn solution_entries(&self) -> &[SolutionEntry] {
        &self.solutions
    }

    /// The found set: words credited to this session.
    pub fn found_words(&self) -> &BTreeSet<String> {
        &self.found_words
    }

    pub fn is_found(&self, word: &str) -> bool {
        self.found_words.contains(word)
    }

    /// Whether a solution request is waiting for its answer.
    pub fn reveal_pending(&self) -> bool {
        self.reveal_requested_at.is_some()
    }

    /// Whether a new drag may start.
    pub fn accepts_selection(&self) -> bool {
        self.phase == SessionPhase::Active && !self.reveal_pending()
    }

    pub fn elapsed(&self) -> Duration {
        self.elapsed_at(Instant::now())
    }

    pub fn elapsed_at(&self, now: Instant) -> Duration {
        self.stopwatch.elapsed(now)
    }

    // ── Local transitions ───────────────────────────────────────────

    /// Begin a new session: clears all puzzle state, returns to Idle and
    /// issues a START for the new session id.
    ///
    /// Any pending reveal is abandoned. Accepted from every phase.
    pub fn request_new_session(&mut self) -> TaggedCommand {
        self.id = self.id.next();
        self.phase = SessionPhase::Idle;
        self.puzzle = None;
        self.found.clear();
        self.found_words.clear();
        self.solutions.clear();
        self.stopwatch = Stopwatch::Reset;
        self.reveal_requested_at = None;
        info!(session = %self.id, "new session requested");
        TaggedCommand::new(self.id, ClientCommand::Start)
    }

    /// Run the word-acceptance check on a traced path.
    ///
    /// The candidate is the literal string along the path; no reversed
    /// reading is tried.
    pub fn submit_candidate(&mut self, path: &CellPath) -> Submission {
        self.submit_candidate_at(path, Instant::now())
    }

    pub fn submit_candidate_at(&mut self, path: &CellPath, now: Instant) -> Submission {
        if self.phase != SessionPhase::Active {
            return Submission::Ignored;
        }
        let Some(puzzle) = self.puzzle.as_ref() else {
            return Submission::Ignored;
        };
        let Some(candidate) = puzzle.grid().word_along(path) else {
            warn!(session = %self.id, "candidate path leaves the grid");
            return Submission::Ignored;
        };

        if !puzzle.words().contains(&candidate) {
            debug!(session = %self.id, %candidate, "not a word");
            return Submission::NotAWord { candidate };
        }
        if self.is_found(&candidate) {
            debug!(session = %self.id, word = %candidate, "already found");
            return Submission::AlreadyFound { word: candidate };
        }

        self.found.push(FoundEntry {
            word: candidate.clone(),
            path: path.clone(),
        });
        self.found_words.insert(candidate.clone());
        info!(session = %self.id, word = %candidate, "word found");

        let completed = self.all_words_found();
        if completed {
            self.finish(now);
        }
        Submission::Accepted {
            command: TaggedCommand::new(
                self.id,
                ClientCommand::FoundWord {
                    word: candidate.clone(),
                },
            ),
            word: candidate,
            completed,
        }
    }

    /// Ask the server for the solution. Returns `None` when not Active or
    /// when a request is already outstanding.
    pub fn request_reveal(&mut self, now: Instant) -> Option<TaggedCommand> {
        if self.phase != SessionPhase::Active || self.reveal_pending() {
            return None;
        }
        self.reveal_requested_at = Some(now);
        debug!(session = %self.id, "solution requested");
        Some(TaggedCommand::new(self.id, ClientCommand::Solve))
    }

    /// Expire an unanswered solution request.
    ///
    /// # Errors
    ///
    /// Returns [`WordFindError::Timeout`] once, when the configured reveal
    /// timeout has elapsed. The session stays Active and selection resumes.
    pub fn poll_reveal_timeout(&mut self, now: Instant) -> Result<()> {
        let (Some(requested), Some(timeout)) = (self.reveal_requested_at, self.config.reveal_timeout)
        else {
            return Ok(());
        };
        if now.saturating_duration_since(requested) < timeout {
            return Ok(());
        }
        self.reveal_requested_at = None;
        warn!(session = %self.id, ?timeout, "solution request timed out");
        Err(WordFindError::Timeout)
    }

    /// When the pending solution request will expire, if any.
    pub fn reveal_deadline(&self) -> Option<Instant> {
        let requested = self.reveal_requested_at?;
        requested.checked_add(self.config.reveal_timeout?)
    }

    // ── Connection events ───────────────────────────────────────────

    /// The message channel closed or failed. Aborts an active session.
    pub fn connection_lost(&mut self, reason: Option<&str>) -> Notice {
        self.connection_lost_at(reason, Instant::now())
    }

    pub fn connection_lost_at(&mut self, reason: Option<&str>, now: Instant) -> Notice {
        if self.phase == SessionPhase::Active {
            self.stopwatch.stop(now);
            self.reveal_requested_at = None;
            self.phase = SessionPhase::Aborted;
            warn!(session = %self.id, reason = reason.unwrap_or("closed"), "session aborted");
        }
        match reason {
            Some(reason) => Notice::error(format!("Disconnected from server: {reason}")),
            None => Notice::error("Disconnected from server"),
        }
    }

    /// The message channel (re)opened. Does not resume a lost session.
    pub fn connection_restored(&self) -> Notice {
        Notice::success("Connected to server")
    }

    // ── Server events ───────────────────────────────────────────────

    /// Apply a server event attributed to `session`.
    pub fn apply(&mut self, session: SessionId, event: ServerEvent) -> Option<Notice> {
        self.apply_at(session, event, Instant::now())
    }

    pub fn apply_at(&mut self, session: SessionId, event: ServerEvent, now: Instant) -> Option<Notice> {
        match event {
            ServerEvent::Error { message } => {
                warn!(session = %self.id, %message, "server error");
                Some(Notice::error(message))
            }
            _ if session != self.id => {
                debug!(current = %self.id, stale = %session, "ignoring stale server event");
                None
            }
            ServerEvent::PuzzleReady(puzzle) => self.on_puzzle(puzzle, now),
            ServerEvent::SolutionRevealed(reveal) => self.on_solution(reveal, now),
            ServerEvent::FoundWordsUpdated { words, completed } => {
                self.on_found_words(words, completed, now)
            }
        }
    }

    fn on_puzzle(&mut self, puzzle: Puzzle, now: Instant) -> Option<Notice> {
        if self.phase != SessionPhase::Idle {
            debug!(session = %self.id, phase = %self.phase, "puzzle outside idle phase ignored");
            return None;
        }
        let total = puzzle.total_words();
        self.puzzle = Some(puzzle);
        self.found.clear();
        self.found_words.clear();
        self.solutions.clear();
        self.stopwatch.start(now);
        self.phase = SessionPhase::Active;
        info!(session = %self.id, total, "puzzle received");
        Some(Notice::success(format!("Game started! Find {total} words")))
    }

    fn on_solution(&mut self, reveal: SolutionReveal, now: Instant) -> Option<Notice> {
        if self.phase != SessionPhase::Active {
            debug!(session = %self.id, phase = %self.phase, "solution outside active phase ignored");
            return None;
        }
        let puzzle = self.puzzle.as_ref()?;

        let SolutionReveal {
            entries,
            missing_words,
            total_words,
        } = reveal;
        let revealed = entries.len();
        let text = if missing_words.is_empty() {
            "Complete solution shown".to_string()
        } else {
            let total = total_words.unwrap_or(puzzle.total_words());
            format!(
                "Partial solution: {revealed}/{} words",
                total + missing_words.len()
            )
        };

        let (entries, dropped): (Vec<_>, Vec<_>) = entries
            .into_iter()
            .partition(|entry| puzzle.grid().contains_path(&entry.path));
        for entry in &dropped {
            warn!(session = %self.id, word = %entry.word, "solution path outside grid dropped");
        }

        self.found_words
            .extend(entries.iter().map(|entry| entry.word.clone()));
        self.solutions = entries;
        self.reveal_requested_at = None;
        self.finish(now);
        Some(Notice::info(text))
    }

    fn on_found_words(&mut self, words: Vec<String>, completed: bool, now: Instant) -> Option<Notice> {
        if !matches!(self.phase, SessionPhase::Active | SessionPhase::Solved) {
            debug!(session = %self.id, phase = %self.phase, "found-word update ignored");
            return None;
        }
        self.found_words.extend(words);
        if completed && self.phase == SessionPhase::Active {
            self.finish(now);
            return Some(Notice::success(ALL_FOUND_TEXT));
        }
        None
    }

    fn all_words_found(&self) -> bool {
        self.puzzle.as_ref().is_some_and(|puzzle| {
            !puzzle.words().is_empty() && puzzle.words().iter().all(|word| self.is_found(word))
        })
    }

    fn finish(&mut self, now: Instant) {
        self.stopwatch.stop(now);
        self.phase = SessionPhase::Solved;
        info!(session = %self.id, "session solved");
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new(SessionConfig::default())
    }
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
    use crate::geometry::{resolve, Cell};
    use crate::puzzle::{Grid, WordList};

    fn cat_puzzle(words: &[&str]) -> Puzzle {
        Puzzle::new(
            Grid::from_lines(&["CAT", "ARX", "TXX"]).unwrap(),
            WordList::new(words.iter().copied()),
            None,
        )
    }

    /// A session that requested a puzzle and received it.
    fn active_session(words: &[&str]) -> Session {
        let mut session = Session::default();
        let start = session.request_new_session();
        session.apply(start.session, ServerEvent::PuzzleReady(cat_puzzle(words)));
        assert_eq!(session.phase(), SessionPhase::Active);
        session
    }

    fn path(from: (usize, usize), to: (usize, usize)) -> CellPath {
        resolve(from.into(), to.into()).unwrap()
    }

    #[test]
    fn starts_idle_without_puzzle() {
        let session = Session::default();
        assert_eq!(session.phase(), SessionPhase::Idle);
        assert!(session.puzzle().is_none());
        assert!(!session.accepts_selection());
        assert_eq!(session.elapsed(), Duration::ZERO);
    }

    #[test]
    fn new_session_issues_start_with_fresh_id() {
        let mut session = Session::default();
        let first = session.request_new_session();
        let second = session.request_new_session();
        assert_eq!(first.command, ClientCommand::Start);
        assert!(second.session > first.session);
        assert_eq!(session.id(), second.session);
    }

    #[test]
    fn puzzle_activates_session() {
        let mut session = Session::default();
        let start = session.request_new_session();
        let notice = session
            .apply(start.session, ServerEvent::PuzzleReady(cat_puzzle(&["CAT"])))
            .unwrap();
        assert_eq!(notice.kind, NoticeKind::Success);
        assert_eq!(notice.text, "Game started! Find 1 words");
        assert_eq!(session.phase(), SessionPhase::Active);
        assert!(session.accepts_selection());
    }

    #[test]
    fn horizontal_word_is_accepted_and_completes() {
        let mut session = active_session(&["CAT"]);
        let submission = session.submit_candidate(&path((0, 0), (0, 2)));

        let Submission::Accepted {
            word,
            command,
            completed,
        } = &submission
        else {
            panic!("expected Accepted, got {submission:?}");
        };
        assert_eq!(word, "CAT");
        assert!(*completed);
        assert_eq!(
            command.command,
            ClientCommand::FoundWord {
                word: "CAT".into()
            }
        );
        assert_eq!(command.session, session.id());
        assert_eq!(session.found_entries().len(), 1);
        assert_eq!(session.found_entries()[0].path.len(), 3);
        assert_eq!(session.phase(), SessionPhase::Solved);
        assert_eq!(submission.notice().unwrap().text, ALL_FOUND_TEXT);
    }

    #[test]
    fn vertical_word_is_accepted() {
        let mut session = active_session(&["CAT"]);
        let submission = session.submit_candidate(&path((0, 0), (2, 0)));
        assert!(matches!(submission, Submission::Accepted { .. }));
    }

    #[test]
    fn non_word_is_rejected_without_state_change() {
        let mut session = active_session(&["CAT"]);
        let submission = session.submit_candidate(&path((0, 0), (1, 1)));
        assert_eq!(
            submission,
            Submission::NotAWord {
                candidate: "CR".into()
            }
        );
        assert!(submission.command().is_none());
        assert!(session.found_entries().is_empty());
        assert_eq!(session.phase(), SessionPhase::Active);
    }

    #[test]
    fn reversed_reading_is_not_matched() {
        let mut session = active_session(&["CAT"]);
        let submission = session.submit_candidate(&path((0, 2), (0, 0)));
        assert_eq!(
            submission,
            Submission::NotAWord {
                candidate: "TAC".into()
            }
        );
    }

    #[test]
    fn single_cell_candidate_fails_harmlessly() {
        let mut session = active_session(&["CAT"]);
        let submission = session.submit_candidate(&CellPath::single(Cell::new(0, 0)));
        assert!(matches!(submission, Submission::NotAWord { .. }));
    }

    #[test]
    fn resubmitting_a_found_word_is_idempotent() {
        let mut session = active_session(&["CAT", "RX"]);
        assert!(matches!(
            session.submit_candidate(&path((0, 0), (0, 2))),
            Submission::Accepted {
                completed: false,
                ..
            }
        ));

        // Same word again, traced the other way it was placed.
        let again = session.submit_candidate(&path((0, 0), (2, 0)));
        assert_eq!(again, Submission::AlreadyFound { word: "CAT".into() });
        assert!(again.command().is_none());
        assert_eq!(again.notice().unwrap().text, "You already found that word");
        assert_eq!(session.found_entries().len(), 1);
    }

    #[test]
    fn candidates_ignored_outside_active() {
        let mut session = Session::default();
        assert_eq!(
            session.submit_candidate(&path((0, 0), (0, 2))),
            Submission::Ignored
        );

        let mut solved = active_session(&["CAT"]);
        solved.submit_candidate(&path((0, 0), (0, 2)));
        assert_eq!(
            solved.submit_candidate(&path((0, 0), (2, 0))),
            Submission::Ignored
        );
    }

    #[test]
    fn stale_events_do_not_mutate_state() {
        let mut session = Session::default();
        let old = session.request_new_session();
        let current = session.request_new_session();

        assert!(session
            .apply(old.session, ServerEvent::PuzzleReady(cat_puzzle(&["CAT"])))
            .is_none());
        assert_eq!(session.phase(), SessionPhase::Idle);

        session.apply(current.session, ServerEvent::PuzzleReady(cat_puzzle(&["CAT"])));
        assert_eq!(session.phase(), SessionPhase::Active);

        session.apply(
            old.session,
            ServerEvent::FoundWordsUpdated {
                words: vec!["CAT".into()],
                completed: true,
            },
        );
        assert_eq!(session.phase(), SessionPhase::Active);
        assert!(session.found_words().is_empty());
    }

    #[test]
    fn server_errors_surface_regardless_of_tag() {
        let mut session = active_session(&["CAT"]);
        let notice = session
            .apply(
                SessionId::default(),
                ServerEvent::Error {
                    message: "boom".into(),
                },
            )
            .unwrap();
        assert_eq!(notice, Notice::error("boom"));
        assert_eq!(session.phase(), SessionPhase::Active);
    }

    #[test]
    fn complete_solution_solves_session() {
        let mut session = active_session(&["CAT"]);
        let now = Instant::now();
        let reveal = session.request_reveal(now).unwrap();
        assert_eq!(reveal.command, ClientCommand::Solve);
        assert!(!session.accepts_selection());
        assert!(session.request_reveal(now).is_none());

        let notice = session
            .apply(
                session.id(),
                ServerEvent::SolutionRevealed(SolutionReveal {
                    entries: vec![SolutionEntry {
                        word: "CAT".into(),
                        path: path((0, 0), (0, 2)),
                    }],
                    missing_words: vec![],
                    total_words: Some(1),
                }),
            )
            .unwrap();
        assert_eq!(notice, Notice::info("Complete solution shown"));
        assert_eq!(session.phase(), SessionPhase::Solved);
        assert!(session.is_found("CAT"));
        assert_eq!(session.solution_entries().len(), 1);
        assert!(!session.reveal_pending());
    }

    #[test]
    fn partial_solution_counts_missing_words() {
        let mut session = active_session(&["CAT", "DOG"]);
        let notice = session
            .apply(
                session.id(),
                ServerEvent::SolutionRevealed(SolutionReveal {
                    entries: vec![SolutionEntry {
                        word: "CAT".into(),
                        path: path((0, 0), (0, 2)),
                    }],
                    missing_words: vec!["DOG".into()],
                    total_words: Some(1),
                }),
            )
            .unwrap();
        assert_eq!(notice.text, "Partial solution: 1/2 words");
        assert!(!session.is_found("DOG"));
    }

    #[test]
    fn solution_paths_outside_grid_are_dropped() {
        let mut session = active_session(&["CAT"]);
        session.apply(
            session.id(),
            ServerEvent::SolutionRevealed(SolutionReveal {
                entries: vec![SolutionEntry {
                    word: "CAT".into(),
                    path: path((0, 1), (0, 3)),
                }],
                missing_words: vec![],
                total_words: None,
            }),
        );
        assert!(session.solution_entries().is_empty());
        assert!(!session.is_found("CAT"));
    }

    #[test]
    fn partial_solution_with_stray_path_keeps_valid_entries() {
        let mut session = active_session(&["CAT", "DOG", "RX"]);
        let notice = session
            .apply(
                session.id(),
                ServerEvent::SolutionRevealed(SolutionReveal {
                    entries: vec![
                        SolutionEntry {
                            word: "CAT".into(),
                            path: path((0, 0), (0, 2)),
                        },
                        SolutionEntry {
                            word: "DOG".into(),
                            path: path((1, 1), (1, 3)),
                        },
                    ],
                    missing_words: vec!["RX".into()],
                    total_words: Some(2),
                }),
            )
            .unwrap();
        assert_eq!(notice, Notice::info("Partial solution: 2/3 words"));
        assert_eq!(session.phase(), SessionPhase::Solved);
        assert_eq!(session.solution_entries().len(), 1);
        assert!(session.is_found("CAT"));
        assert!(!session.is_found("DOG"));
    }

    #[test]
    fn server_completion_flag_solves() {
        let mut session = active_session(&["CAT", "RX"]);
        let notice = session
            .apply(
                session.id(),
                ServerEvent::FoundWordsUpdated {
                    words: vec!["CAT".into()],
                    completed: true,
                },
            )
            .unwrap();
        assert_eq!(notice.text, ALL_FOUND_TEXT);
        assert_eq!(session.phase(), SessionPhase::Solved);
    }

    #[test]
    fn found_set_never_shrinks_within_a_session() {
        let mut session = active_session(&["CAT", "RX"]);
        session.submit_candidate(&path((0, 0), (0, 2)));
        session.apply(
            session.id(),
            ServerEvent::FoundWordsUpdated {
                words: vec![],
                completed: false,
            },
        );
        assert!(session.is_found("CAT"));
        assert_eq!(session.found_entries().len(), 1);

        session.request_new_session();
        assert!(session.found_entries().is_empty());
        assert!(session.found_words().is_empty());
    }

    #[test]
    fn connection_loss_aborts_active_session() {
        let mut session = active_session(&["CAT"]);
        let notice = session.connection_lost(Some("reset"));
        assert_eq!(notice.kind, NoticeKind::Error);
        assert_eq!(session.phase(), SessionPhase::Aborted);
        assert!(!session.accepts_selection());

        // Reconnecting does not resume it.
        session.connection_restored();
        assert_eq!(session.phase(), SessionPhase::Aborted);
    }

    #[test]
    fn connection_loss_while_idle_keeps_phase() {
        let mut session = Session::default();
        session.connection_lost(None);
        assert_eq!(session.phase(), SessionPhase::Idle);
    }

    #[test]
    fn reveal_times_out_once() {
        let mut session = Session::new(
            SessionConfig::new().with_reveal_timeout(Some(Duration::from_secs(2))),
        );
        let start = session.request_new_session();
        session.apply(start.session, ServerEvent::PuzzleReady(cat_puzzle(&["CAT"])));

        let t0 = Instant::now();
        session.request_reveal(t0).unwrap();
        assert_eq!(session.reveal_deadline(), Some(t0 + Duration::from_secs(2)));
        assert!(session.poll_reveal_timeout(t0 + Duration::from_secs(1)).is_ok());

        let err = session
            .poll_reveal_timeout(t0 + Duration::from_secs(2))
            .unwrap_err();
        assert!(matches!(err, WordFindError::Timeout));
        assert_eq!(session.phase(), SessionPhase::Active);
        assert!(session.accepts_selection());
        assert!(session.poll_reveal_timeout(t0 + Duration::from_secs(9)).is_ok());
    }

    #[test]
    fn reveal_without_timeout_waits_forever() {
        let mut session = Session::new(SessionConfig::new().with_reveal_timeout(None));
        let start = session.request_new_session();
        session.apply(start.session, ServerEvent::PuzzleReady(cat_puzzle(&["CAT"])));
        let t0 = Instant::now();
        session.request_reveal(t0).unwrap();
        assert!(session.reveal_deadline().is_none());
        assert!(session
            .poll_reveal_timeout(t0 + Duration::from_secs(3600))
            .is_ok());
        assert!(session.reveal_pending());
    }

    #[test]
    fn new_session_cancels_pending_reveal() {
        let mut session = active_session(&["CAT"]);
        session.request_reveal(Instant::now()).unwrap();
        session.request_new_session();
        assert!(!session.reveal_pending());
        assert_eq!(session.phase(), SessionPhase::Idle);
    }

    #[test]
    fn stopwatch_runs_while_active_and_freezes_on_solve() {
        let mut session = Session::default();
        let start = session.request_new_session();
        let t0 = Instant::now();
        session.apply_at(start.session, ServerEvent::PuzzleReady(cat_puzzle(&["CAT"])), t0);
        assert_eq!(session.elapsed_at(t0 + Duration::from_secs(5)), Duration::from_secs(5));

        session.submit_candidate_at(&path((0, 0), (0, 2)), t0 + Duration::from_secs(7));
        assert_eq!(session.phase(), SessionPhase::Solved);
        assert_eq!(session.elapsed_at(t0 + Duration::from_secs(60)), Duration::from_secs(7));
    }
}
