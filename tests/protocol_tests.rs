#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    clippy::todo,
    clippy::unimplemented,
    clippy::indexing_slicing
)]
//! Wire-format tests against message shapes captured from the puzzle server.

use wordfind_client::protocol::{ClientCommand, ServerEvent, ServerMessage, WireSolution};
use wordfind_client::{resolve, Cell, WordFindError};

fn decode(text: &str) -> Vec<ServerEvent> {
    ServerMessage::from_json(text)
        .and_then(ServerMessage::into_events)
        .unwrap()
}

// ── Outbound ────────────────────────────────────────────────────────

#[test]
fn start_command_wire_text() {
    let json = serde_json::to_string(&ClientCommand::Start).unwrap();
    assert_eq!(json, r#"{"comando":"START"}"#);
}

#[test]
fn found_word_command_wire_text() {
    let json = serde_json::to_string(&ClientCommand::FoundWord {
        word: "PYTHON".into(),
    })
    .unwrap();
    assert_eq!(json, r#"{"comando":"ENCONTRAR","palabra":"PYTHON"}"#);
}

#[test]
fn solve_command_wire_text() {
    let json = serde_json::to_string(&ClientCommand::Solve).unwrap();
    assert_eq!(json, r#"{"comando":"RESOLVER"}"#);
}

#[test]
fn unknown_command_is_rejected() {
    let result = serde_json::from_str::<ClientCommand>(r#"{"comando":"PAUSAR"}"#);
    assert!(result.is_err());
}

// ── Inbound: puzzle ─────────────────────────────────────────────────

const PUZZLE: &str = r#"{
    "tablero": [
        ["J","A","V","A","X","Q"],
        ["R","U","S","T","K","W"],
        ["G","O","L","A","N","G"],
        ["P","Y","T","H","O","N"],
        ["B","Z","M","C","E","D"],
        ["H","A","S","K","E","L"]
    ],
    "palabras": ["JAVA","RUST","GOLANG","PYTHON"],
    "total_palabras": 4,
    "mensaje": "Nuevo juego iniciado"
}"#;

#[test]
fn puzzle_decodes_grid_words_and_total() {
    let events = decode(PUZZLE);
    assert_eq!(events.len(), 1);
    let ServerEvent::PuzzleReady(puzzle) = &events[0] else {
        panic!("expected PuzzleReady, got {events:?}");
    };

    assert_eq!(puzzle.grid().size(), 6);
    assert_eq!(puzzle.grid().letter(Cell::new(3, 0)), Some('P'));
    assert_eq!(puzzle.grid().letter(Cell::new(6, 0)), None);
    assert_eq!(
        puzzle.words().iter().collect::<Vec<_>>(),
        vec!["JAVA", "RUST", "GOLANG", "PYTHON"]
    );
    assert_eq!(puzzle.total_words(), 4);

    let path = resolve(Cell::new(3, 0), Cell::new(3, 5)).unwrap();
    assert_eq!(puzzle.grid().word_along(&path).as_deref(), Some("PYTHON"));
}

#[test]
fn puzzle_without_total_counts_words() {
    let events = decode(r#"{"tablero":[["A","B"],["C","D"]],"palabras":["AB","CD","AB"]}"#);
    let ServerEvent::PuzzleReady(puzzle) = &events[0] else {
        panic!("expected PuzzleReady");
    };
    assert_eq!(puzzle.words().len(), 2);
    assert_eq!(puzzle.total_words(), 2);
}

#[test]
fn multi_letter_cell_is_malformed() {
    let err = ServerMessage::from_json(r#"{"tablero":[["AB"]],"palabras":["AB"]}"#)
        .unwrap()
        .into_events()
        .unwrap_err();
    assert!(matches!(err, WordFindError::MalformedMessage(_)));
}

#[test]
fn empty_board_is_malformed() {
    let err = ServerMessage::from_json(r#"{"tablero":[],"palabras":[]}"#)
        .unwrap()
        .into_events()
        .unwrap_err();
    assert!(matches!(err, WordFindError::MalformedMessage(_)));
}

#[test]
fn board_of_many_empty_rows_is_malformed() {
    let rows = vec!["[]"; 200_000].join(",");
    let text = format!(r#"{{"tablero":[{rows}],"palabras":["AB"]}}"#);
    let err = ServerMessage::from_json(&text)
        .unwrap()
        .into_events()
        .unwrap_err();
    assert!(matches!(err, WordFindError::MalformedMessage(_)));
}

#[test]
fn wrongly_typed_field_fails_to_parse() {
    let err = ServerMessage::from_json(r#"{"palabras":"JAVA"}"#).unwrap_err();
    assert!(matches!(err, WordFindError::Serialization(_)));

    let err = ServerMessage::from_json("[1,2,3]").unwrap_err();
    assert!(matches!(err, WordFindError::Serialization(_)));
}

#[test]
fn unknown_fields_are_ignored() {
    let events = decode(r#"{"palabras_encontradas":["RUST"],"puntaje":120}"#);
    assert_eq!(
        events,
        vec![ServerEvent::FoundWordsUpdated {
            words: vec!["RUST".into()],
            completed: false,
        }]
    );
}

// ── Inbound: solutions ──────────────────────────────────────────────

#[test]
fn every_direction_is_a_valid_solution_path() {
    let text = r#"{
        "soluciones": [
            {"palabra":"E",  "posiciones":[[2,2]]},
            {"palabra":"RT", "posiciones":[[2,2],[2,3]]},
            {"palabra":"LF", "posiciones":[[2,2],[2,1]]},
            {"palabra":"DN", "posiciones":[[2,2],[3,2]]},
            {"palabra":"UP", "posiciones":[[2,2],[1,2]]},
            {"palabra":"SE", "posiciones":[[2,2],[3,3],[4,4]]},
            {"palabra":"NW", "posiciones":[[2,2],[1,1],[0,0]]},
            {"palabra":"NE", "posiciones":[[2,2],[1,3],[0,4]]},
            {"palabra":"SW", "posiciones":[[2,2],[3,1],[4,0]]}
        ],
        "total_palabras": 9
    }"#;
    let events = decode(text);
    let ServerEvent::SolutionRevealed(reveal) = &events[0] else {
        panic!("expected SolutionRevealed");
    };
    assert_eq!(reveal.entries.len(), 9);
    assert!(reveal
        .entries
        .iter()
        .all(|entry| entry.path.start() == Cell::new(2, 2)));
}

#[test]
fn knight_move_solution_is_malformed() {
    let err = ServerMessage::from_json(r#"{"soluciones":[{"palabra":"AB","posiciones":[[0,0],[1,2]]}]}"#)
        .unwrap()
        .into_events()
        .unwrap_err();
    assert!(matches!(err, WordFindError::MalformedMessage(_)));
}

#[test]
fn one_bad_entry_rejects_whole_solution() {
    let text = r#"{"soluciones":[
        {"palabra":"JAVA","posiciones":[[0,0],[0,1],[0,2],[0,3]]},
        {"palabra":"RUST","posiciones":[[1,0],[1,1],[1,3]]}
    ]}"#;
    let err = ServerMessage::from_json(text)
        .unwrap()
        .into_events()
        .unwrap_err();
    assert!(matches!(err, WordFindError::MalformedMessage(_)));
}

#[test]
fn partial_solution_keeps_missing_words_and_total() {
    let text = r#"{
        "soluciones": [{"palabra":"JAVA","posiciones":[[0,0],[0,1],[0,2],[0,3]]}],
        "palabras_faltantes": ["COBOL"],
        "total_palabras": 4
    }"#;
    let events = decode(text);
    let ServerEvent::SolutionRevealed(reveal) = &events[0] else {
        panic!("expected SolutionRevealed");
    };
    assert!(reveal.is_partial());
    assert_eq!(reveal.missing_words, vec!["COBOL".to_string()]);
    assert_eq!(reveal.total_words, Some(4));
}

#[test]
fn wire_solution_field_names() {
    let solution: WireSolution =
        serde_json::from_str(r#"{"palabra":"GO","posiciones":[[2,0],[2,1]]}"#).unwrap();
    assert_eq!(solution.word, "GO");
    assert_eq!(solution.positions, vec![(2, 0), (2, 1)]);
}

// ── Inbound: found words & errors ───────────────────────────────────

#[test]
fn completed_found_list() {
    let events = decode(
        r#"{"palabras_encontradas":["JAVA","RUST","GOLANG","PYTHON"],"completado":true,"mensaje":"¡Ganaste!"}"#,
    );
    assert_eq!(
        events,
        vec![ServerEvent::FoundWordsUpdated {
            words: vec![
                "JAVA".into(),
                "RUST".into(),
                "GOLANG".into(),
                "PYTHON".into()
            ],
            completed: true,
        }]
    );
}

#[test]
fn error_reply_to_solve_without_game() {
    let events = decode(r#"{"error":"No hay juego activo"}"#);
    assert_eq!(
        events,
        vec![ServerEvent::Error {
            message: "No hay juego activo".into()
        }]
    );
}

#[test]
fn error_wins_over_malformed_board() {
    // The error short-circuits before the board is validated.
    let events = decode(r#"{"error":"fallo","tablero":[["A","B"]],"palabras":["AB"]}"#);
    assert!(matches!(events[..], [ServerEvent::Error { .. }]));
}
