//! Wire-compatible protocol types for the word-find puzzle server.
//!
//! Outbound commands are JSON objects keyed by `"comando"`. Inbound messages
//! carry no type tag: which fields are present decides how a message is
//! handled, and one message may carry several of them. [`ServerMessage`]
//! mirrors the raw shape and [`ServerMessage::into_events`] turns it into
//! typed [`ServerEvent`]s, failing closed on anything malformed.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{Result, WordFindError};
use crate::geometry::{Cell, CellPath};
use crate::puzzle::{Grid, Puzzle, SolutionEntry, WordList};

// ── Session identity ────────────────────────────────────────────────

/// Monotonic identifier of one puzzle session on the client.
///
/// `SessionId::default()` (zero) is never issued to a session and tags
/// inbound traffic that predates any START on a connection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SessionId(u64);

impl SessionId {
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub const fn get(self) -> u64 {
        self.0
    }

    #[must_use]
    pub const fn next(self) -> Self {
        Self(self.0.wrapping_add(1))
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

// ── Outbound ────────────────────────────────────────────────────────

/// Commands sent from client to server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "comando")]
pub enum ClientCommand {
    /// Request a new puzzle.
    #[serde(rename = "START")]
    Start,
    /// Report a word the client accepted.
    #[serde(rename = "ENCONTRAR")]
    FoundWord {
        #[serde(rename = "palabra")]
        word: String,
    },
    /// Request the full solution.
    #[serde(rename = "RESOLVER")]
    Solve,
}

/// A command together with the session it was issued for.
///
/// Only the command goes on the wire; the session id stays client-side and
/// lets the transport loop attribute replies to the right session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaggedCommand {
    pub session: SessionId,
    pub command: ClientCommand,
}

impl TaggedCommand {
    pub fn new(session: SessionId, command: ClientCommand) -> Self {
        Self { session, command }
    }
}

// ── Inbound ─────────────────────────────────────────────────────────

/// One solved word as sent by the server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WireSolution {
    #[serde(rename = "palabra")]
    pub word: String,
    /// `[row, col]` pairs in reading order.
    #[serde(rename = "posiciones")]
    pub positions: Vec<(usize, usize)>,
}

/// Raw inbound message. Every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerMessage {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(rename = "tablero", skip_serializing_if = "Option::is_none")]
    pub board: Option<Vec<Vec<String>>>,
    #[serde(rename = "palabras", skip_serializing_if = "Option::is_none")]
    pub words: Option<Vec<String>>,
    #[serde(rename = "total_palabras", skip_serializing_if = "Option::is_none")]
    pub total_words: Option<usize>,
    #[serde(rename = "soluciones", skip_serializing_if = "Option::is_none")]
    pub solutions: Option<Vec<WireSolution>>,
    #[serde(rename = "palabras_faltantes", skip_serializing_if = "Option::is_none")]
    pub missing_words: Option<Vec<String>>,
    #[serde(rename = "palabras_encontradas", skip_serializing_if = "Option::is_none")]
    pub found_words: Option<Vec<String>>,
    #[serde(rename = "completado", skip_serializing_if = "Option::is_none")]
    pub completed: Option<bool>,
    /// Free-form server commentary; logged, never shown.
    #[serde(rename = "mensaje", skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// A server solution reveal, already validated as straight-line paths.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SolutionReveal {
    pub entries: Vec<SolutionEntry>,
    /// Words the server could not place; non-empty means a partial reveal.
    pub missing_words: Vec<String>,
    pub total_words: Option<usize>,
}

impl SolutionReveal {
    pub fn is_partial(&self) -> bool {
        !self.missing_words.is_empty()
    }
}

/// Typed notifications decoded from one [`ServerMessage`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServerEvent {
    /// The server reported an error. Shown verbatim, mutates nothing.
    Error { message: String },
    /// A new puzzle: grid plus word list.
    PuzzleReady(Puzzle),
    /// Full or partial solution.
    SolutionRevealed(SolutionReveal),
    /// Authoritative found-word list.
    FoundWordsUpdated {
        words: Vec<String>,
        completed: bool,
    },
}

impl ServerMessage {
    /// Parse a JSON text frame.
    ///
    /// # Errors
    ///
    /// Returns [`WordFindError::Serialization`] if the text is not a JSON
    /// object of the expected field types.
    pub fn from_json(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    /// Decode into typed events, in the order the fields are handled.
    ///
    /// An `error` field short-circuits: the message yields only
    /// [`ServerEvent::Error`]. A board without a word list (or the reverse)
    /// is not a puzzle and is skipped. A message with no recognised field
    /// yields no events.
    ///
    /// # Errors
    ///
    /// Returns [`WordFindError::MalformedMessage`] if the grid is not a square
    /// of single characters or a solution path is empty or not a straight
    /// line. The whole message is rejected in that case.
    pub fn into_events(self) -> Result<Vec<ServerEvent>> {
        if let Some(message) = self.error {
            return Ok(vec![ServerEvent::Error { message }]);
        }

        let mut events = Vec::new();

        if let (Some(board), Some(words)) = (&self.board, self.words) {
            let grid = Grid::from_rows(board)?;
            events.push(ServerEvent::PuzzleReady(Puzzle::new(
                grid,
                WordList::new(words),
                self.total_words,
            )));
        }

        if let Some(solutions) = self.solutions {
            let entries = solutions
                .into_iter()
                .map(WireSolution::into_entry)
                .collect::<Result<Vec<_>>>()?;
            events.push(ServerEvent::SolutionRevealed(SolutionReveal {
                entries,
                missing_words: self.missing_words.unwrap_or_default(),
                total_words: self.total_words,
            }));
        }

        if let Some(words) = self.found_words {
            events.push(ServerEvent::FoundWordsUpdated {
                words,
                completed: self.completed.unwrap_or(false),
            });
        }

        Ok(events)
    }
}

impl WireSolution {
    fn into_entry(self) -> Result<SolutionEntry> {
        let cells = self.positions.into_iter().map(Cell::from).collect();
        let path = CellPath::from_cells(cells).ok_or_else(|| {
            WordFindError::MalformedMessage(format!(
                "solution for {:?} is not a straight run of cells",
                self.word
            ))
        })?;
        Ok(SolutionEntry {
            word: self.word,
            path,
        })
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
    use serde_json::json;

    fn decode(value: serde_json::Value) -> Result<Vec<ServerEvent>> {
        ServerMessage::from_json(&value.to_string())?.into_events()
    }

    #[test]
    fn commands_match_wire_shapes() {
        assert_eq!(
            serde_json::to_value(ClientCommand::Start).unwrap(),
            json!({ "comando": "START" })
        );
        assert_eq!(
            serde_json::to_value(ClientCommand::FoundWord { word: "CAT".into() }).unwrap(),
            json!({ "comando": "ENCONTRAR", "palabra": "CAT" })
        );
        assert_eq!(
            serde_json::to_value(ClientCommand::Solve).unwrap(),
            json!({ "comando": "RESOLVER" })
        );
    }

    #[test]
    fn error_field_short_circuits() {
        let events = decode(json!({
            "error": "no hay juego activo",
            "palabras_encontradas": ["CAT"],
        }))
        .unwrap();
        assert_eq!(
            events,
            vec![ServerEvent::Error {
                message: "no hay juego activo".into()
            }]
        );
    }

    #[test]
    fn puzzle_message_decodes_grid_and_words() {
        let events = decode(json!({
            "tablero": [["C","A","T"],["A","R","X"],["T","X","X"]],
            "palabras": ["CAT"],
            "total_palabras": 1,
        }))
        .unwrap();
        assert_eq!(events.len(), 1);
        let ServerEvent::PuzzleReady(puzzle) = &events[0] else {
            panic!("expected PuzzleReady, got {events:?}");
        };
        assert_eq!(puzzle.grid().size(), 3);
        assert!(puzzle.words().contains("CAT"));
        assert_eq!(puzzle.total_words(), 1);
    }

    #[test]
    fn board_without_words_is_not_a_puzzle() {
        let events = decode(json!({ "tablero": [["C"]] })).unwrap();
        assert!(events.is_empty());
    }

    #[test]
    fn non_square_board_is_malformed() {
        let err = decode(json!({
            "tablero": [["C","A"],["A"]],
            "palabras": ["CA"],
        }))
        .unwrap_err();
        assert!(matches!(err, WordFindError::MalformedMessage(_)));
    }

    #[test]
    fn solution_message_decodes_paths() {
        let events = decode(json!({
            "soluciones": [{ "palabra": "CAT", "posiciones": [[0,0],[0,1],[0,2]] }],
            "total_palabras": 1,
        }))
        .unwrap();
        let ServerEvent::SolutionRevealed(reveal) = &events[0] else {
            panic!("expected SolutionRevealed, got {events:?}");
        };
        assert!(!reveal.is_partial());
        assert_eq!(reveal.entries[0].word, "CAT");
        assert_eq!(reveal.entries[0].path.len(), 3);
        assert_eq!(reveal.total_words, Some(1));
    }

    #[test]
    fn partial_solution_keeps_missing_words() {
        let events = decode(json!({
            "soluciones": [],
            "palabras_faltantes": ["DOG"],
            "total_palabras": 1,
        }))
        .unwrap();
        let ServerEvent::SolutionRevealed(reveal) = &events[0] else {
            panic!("expected SolutionRevealed");
        };
        assert!(reveal.is_partial());
        assert_eq!(reveal.missing_words, vec!["DOG".to_string()]);
    }

    #[test]
    fn crooked_solution_path_is_malformed() {
        let err = decode(json!({
            "soluciones": [{ "palabra": "CAT", "posiciones": [[0,0],[0,1],[1,1]] }],
        }))
        .unwrap_err();
        assert!(matches!(err, WordFindError::MalformedMessage(_)));
    }

    #[test]
    fn negative_position_fails_to_parse() {
        let err = decode(json!({
            "soluciones": [{ "palabra": "CAT", "posiciones": [[-1,0]] }],
        }))
        .unwrap_err();
        assert!(matches!(err, WordFindError::Serialization(_)));
    }

    #[test]
    fn found_words_default_to_not_completed() {
        let events = decode(json!({ "palabras_encontradas": ["CAT"] })).unwrap();
        assert_eq!(
            events,
            vec![ServerEvent::FoundWordsUpdated {
                words: vec!["CAT".into()],
                completed: false
            }]
        );
    }

    #[test]
    fn combined_message_yields_events_in_handling_order() {
        let events = decode(json!({
            "soluciones": [{ "palabra": "CAT", "posiciones": [[0,0],[0,1],[0,2]] }],
            "palabras_encontradas": ["CAT"],
            "completado": true,
        }))
        .unwrap();
        assert_eq!(events.len(), 2);
        assert!(matches!(events[0], ServerEvent::SolutionRevealed(_)));
        assert!(matches!(
            events[1],
            ServerEvent::FoundWordsUpdated { completed: true, .. }
        ));
    }

    #[test]
    fn unrelated_message_yields_nothing() {
        assert!(decode(json!({ "mensaje": "hola" })).unwrap().is_empty());
        assert!(decode(json!({})).unwrap().is_empty());
    }

    #[test]
    fn session_ids_are_monotonic() {
        let first = SessionId::default().next();
        assert_eq!(first.get(), 1);
        assert!(first.next() > first);
        assert_eq!(first.to_string(), "#1");
    }
}
