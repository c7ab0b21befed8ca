#![cfg(feature = "tokio-runtime")]
#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    clippy::todo,
    clippy::unimplemented,
    clippy::indexing_slicing
)]
//! End-to-end tests driving [`Game`] against an in-memory fake server.

mod common;

use std::sync::atomic::Ordering;
use std::time::Duration;

use common::*;
use tokio::sync::mpsc;
use wordfind_client::{
    Cell, CellClass, ClientConfig, Game, Notice, NoticeKind, Progress, SessionConfig,
    SessionPhase, Submission, WordFindError, WordStatus,
};

const SILENCE: Duration = Duration::from_millis(50);

struct Harness {
    game: Game<MockConnector>,
    servers: mpsc::UnboundedReceiver<FakeServer>,
    connects: std::sync::Arc<std::sync::atomic::AtomicUsize>,
    refuse: std::sync::Arc<std::sync::atomic::AtomicBool>,
}

fn harness_with(session_config: SessionConfig) -> Harness {
    harness_with_client(
        ClientConfig::new().with_start_retry_delay(Duration::from_millis(10)),
        session_config,
    )
}

fn harness_with_client(client_config: ClientConfig, session_config: SessionConfig) -> Harness {
    let (connector, servers) = MockConnector::new();
    let connects = std::sync::Arc::clone(&connector.connects);
    let refuse = std::sync::Arc::clone(&connector.refuse);
    Harness {
        game: Game::new(connector, client_config, session_config),
        servers,
        connects,
        refuse,
    }
}

fn harness() -> Harness {
    harness_with(SessionConfig::new())
}

/// Step the game until `done` holds.
async fn step_until(game: &mut Game<MockConnector>, done: impl Fn(&Game<MockConnector>) -> bool) {
    tokio::time::timeout(WAIT, async {
        while !done(&*game) {
            assert!(game.step().await, "event stream ended");
        }
    })
    .await
    .expect("condition not reached in time");
}

/// Apply exactly one event.
async fn step_once(game: &mut Game<MockConnector>) {
    let alive = tokio::time::timeout(WAIT, game.step())
        .await
        .expect("no event arrived");
    assert!(alive, "event stream ended");
}

fn active(game: &Game<MockConnector>) -> bool {
    game.session().phase() == SessionPhase::Active
}

/// A game whose session received [`cat_board`] with `words`.
async fn started(words: &[&str]) -> (Harness, FakeServer) {
    start_with(harness(), words).await
}

async fn start_with(mut h: Harness, words: &[&str]) -> (Harness, FakeServer) {
    h.game.new_game().await.unwrap();
    let mut server = accept(&mut h.servers).await;
    server.expect_command(start_command()).await;
    server.send(puzzle_json(words));
    step_until(&mut h.game, active).await;
    h.game.drain_notices();
    (h, server)
}

fn drag(game: &mut Game<MockConnector>, from: (usize, usize), to: (usize, usize)) -> Submission {
    assert!(game.pointer_down(from.into()), "drag did not start");
    game.pointer_enter(to.into());
    game.pointer_up().expect("no drag to end")
}

// ── Connection ──────────────────────────────────────────────────────

#[tokio::test]
async fn eager_connect_reports_connected() {
    let mut h = harness();
    h.game.connect().await.unwrap();
    let _server = accept(&mut h.servers).await;

    step_once(&mut h.game).await;
    assert!(h.game.is_connected());
    assert_eq!(
        h.game.drain_notices(),
        vec![Notice::success("Connected to server")]
    );
    assert_eq!(h.game.session().phase(), SessionPhase::Idle);
}

#[tokio::test]
async fn connect_while_connected_keeps_the_session() {
    let (mut h, mut server) = started(&["CAT"]).await;
    h.game.connect().await.unwrap();

    assert_eq!(h.connects.load(Ordering::SeqCst), 1);
    assert!(h.game.is_connected());
    assert!(!server.closed.load(Ordering::SeqCst));
    assert!(
        tokio::time::timeout(SILENCE, h.game.step()).await.is_err(),
        "connect produced an event"
    );
    assert_eq!(h.game.session().phase(), SessionPhase::Active);

    assert!(matches!(drag(&mut h.game, (0, 0), (0, 2)), Submission::Accepted { .. }));
    server.expect_command(found_command("CAT")).await;
}

#[tokio::test]
async fn refused_connect_reports_disconnect() {
    let mut h = harness();
    h.refuse.store(true, Ordering::SeqCst);

    let err = h.game.new_game().await.unwrap_err();
    assert!(matches!(err, WordFindError::Io(_)));

    step_once(&mut h.game).await;
    let notices = h.game.drain_notices();
    assert_eq!(notices.len(), 1);
    assert_eq!(notices[0].kind, NoticeKind::Error);
    assert!(notices[0].text.starts_with("Disconnected from server"));
    assert_eq!(h.game.session().phase(), SessionPhase::Idle);
}

#[tokio::test]
async fn new_game_after_disconnect_reconnects() {
    let (mut h, server) = started(&["CAT"]).await;
    drop(server);
    step_until(&mut h.game, |g| g.session().phase() == SessionPhase::Aborted).await;

    h.game.new_game().await.unwrap();
    assert_eq!(h.connects.load(Ordering::SeqCst), 2);
    let mut server = accept(&mut h.servers).await;
    server.expect_command(start_command()).await;
    server.send(puzzle_json(&["CAT"]));
    step_until(&mut h.game, active).await;
    assert!(h.game.session().found_entries().is_empty());
}

#[tokio::test]
async fn shutdown_closes_transport() {
    let (mut h, server) = started(&["CAT"]).await;
    h.game.shutdown().await;
    assert!(server.closed.load(Ordering::SeqCst));
    assert!(!h.game.is_connected());
}

// ── Word finding ────────────────────────────────────────────────────

#[tokio::test]
async fn horizontal_drag_finds_word() {
    let (mut h, mut server) = started(&["CAT"]).await;

    assert!(h.game.pointer_down(Cell::new(0, 0)));
    assert!(h.game.pointer_enter(Cell::new(0, 1)));
    assert!(h.game.pointer_enter(Cell::new(0, 2)));
    let board = h.game.board_view().unwrap();
    assert_eq!(board.class_at(Cell::new(0, 2)), CellClass::Selecting);

    let submission = h.game.pointer_up().unwrap();
    assert!(matches!(
        submission,
        Submission::Accepted {
            completed: true,
            ..
        }
    ));
    server.expect_command(found_command("CAT")).await;

    let entries = h.game.session().found_entries();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].word, "CAT");
    assert_eq!(
        entries[0].path.cells(),
        &[Cell::new(0, 0), Cell::new(0, 1), Cell::new(0, 2)]
    );
    assert_eq!(h.game.session().phase(), SessionPhase::Solved);

    let board = h.game.board_view().unwrap();
    for col in 0..3 {
        assert_eq!(board.class_at(Cell::new(0, col)), CellClass::Found);
    }
    assert_eq!(board.class_at(Cell::new(1, 1)), CellClass::Normal);
    assert_eq!(
        h.game.drain_notices(),
        vec![Notice::success("Congratulations! You found all the words")]
    );
}

#[tokio::test]
async fn vertical_drag_finds_word() {
    let (mut h, mut server) = started(&["CAT"]).await;
    let submission = drag(&mut h.game, (0, 0), (2, 0));
    assert!(matches!(submission, Submission::Accepted { .. }));
    server.expect_command(found_command("CAT")).await;
}

#[tokio::test]
async fn diagonal_non_word_is_rejected() {
    let (mut h, mut server) = started(&["CAT"]).await;
    let submission = drag(&mut h.game, (0, 0), (1, 1));
    assert_eq!(
        submission,
        Submission::NotAWord {
            candidate: "CR".into()
        }
    );
    server.expect_silence(SILENCE).await;
    assert!(h.game.session().found_entries().is_empty());
    assert_eq!(h.game.session().phase(), SessionPhase::Active);
    assert_eq!(
        h.game.drain_notices(),
        vec![Notice::info("CR is not a word")]
    );
}

#[tokio::test]
async fn found_word_is_not_reported_twice() {
    let (mut h, mut server) = started(&["CAT", "RX"]).await;
    assert!(matches!(
        drag(&mut h.game, (0, 0), (0, 2)),
        Submission::Accepted {
            completed: false,
            ..
        }
    ));
    server.expect_command(found_command("CAT")).await;

    assert_eq!(
        drag(&mut h.game, (0, 0), (2, 0)),
        Submission::AlreadyFound { word: "CAT".into() }
    );
    server.expect_silence(SILENCE).await;
    assert_eq!(h.game.session().found_entries().len(), 1);
}

#[tokio::test]
async fn off_line_hover_keeps_last_path() {
    let (mut h, _server) = started(&["CAT"]).await;
    h.game.pointer_down(Cell::new(0, 0));
    h.game.pointer_enter(Cell::new(0, 2));
    assert!(!h.game.pointer_enter(Cell::new(1, 2)));
    assert_eq!(h.game.selection().path().unwrap().len(), 3);
}

#[tokio::test]
async fn pointer_outside_grid_is_ignored() {
    let (mut h, _server) = started(&["CAT"]).await;
    assert!(!h.game.pointer_down(Cell::new(3, 0)));
    assert!(h.game.pointer_up().is_none());

    h.game.pointer_down(Cell::new(0, 0));
    assert!(!h.game.pointer_enter(Cell::new(0, 7)));
    assert_eq!(h.game.selection().path().unwrap().len(), 1);
}

#[tokio::test]
async fn pointer_before_puzzle_is_ignored() {
    let mut h = harness();
    assert!(!h.game.pointer_down(Cell::new(0, 0)));
    assert!(h.game.board_view().is_none());
    assert_eq!(h.game.progress(), Progress::default());
    assert!(h.game.word_statuses().is_empty());
}

// ── Server updates ──────────────────────────────────────────────────

#[tokio::test]
async fn complete_solution_solves_session() {
    let (mut h, mut server) = started(&["CAT"]).await;
    assert!(h.game.reveal());
    assert!(!h.game.reveal());
    server.expect_command(solve_command()).await;
    assert!(!h.game.pointer_down(Cell::new(0, 0)));

    server.send(cat_solution_json());
    step_until(&mut h.game, |g| g.session().phase() == SessionPhase::Solved).await;

    assert_eq!(
        h.game.drain_notices(),
        vec![Notice::info("Complete solution shown")]
    );
    let board = h.game.board_view().unwrap();
    assert_eq!(board.class_at(Cell::new(0, 1)), CellClass::Solution);
    assert!(h.game.session().is_found("CAT"));
}

#[tokio::test]
async fn partial_solution_reports_counts() {
    let (mut h, mut server) = started(&["CAT", "DOG"]).await;
    h.game.reveal();
    server.expect_command(solve_command()).await;

    let mut reveal = cat_solution_json();
    reveal["palabras_faltantes"] = serde_json::json!(["DOG"]);
    reveal["total_palabras"] = serde_json::json!(1);
    server.send(reveal);
    step_once(&mut h.game).await;

    assert_eq!(
        h.game.drain_notices(),
        vec![Notice::info("Partial solution: 1/2 words")]
    );
    assert_eq!(h.game.session().phase(), SessionPhase::Solved);
}

#[tokio::test]
async fn server_found_list_is_merged() {
    let (mut h, server) = started(&["CAT", "RX"]).await;
    server.send(found_json(&["RX"], false));
    step_once(&mut h.game).await;

    assert!(h.game.session().is_found("RX"));
    assert_eq!(h.game.progress(), Progress { found: 1, total: 2 });
    assert_eq!(h.game.progress().to_string(), "1/2 - 50%");
    assert_eq!(
        h.game.word_statuses(),
        vec![
            WordStatus {
                word: "CAT".into(),
                found: false
            },
            WordStatus {
                word: "RX".into(),
                found: true
            },
        ]
    );
}

#[tokio::test]
async fn server_completion_cancels_drag() {
    let (mut h, server) = started(&["CAT"]).await;
    h.game.pointer_down(Cell::new(1, 1));
    assert!(h.game.selection().is_dragging());

    server.send(found_json(&["CAT"], true));
    step_once(&mut h.game).await;
    assert_eq!(h.game.session().phase(), SessionPhase::Solved);
    assert!(!h.game.selection().is_dragging());
    assert!(h.game.pointer_up().is_none());
}

#[tokio::test]
async fn server_error_is_shown_verbatim() {
    let (mut h, server) = started(&["CAT"]).await;
    server.send(error_json("No hay juego activo"));
    step_once(&mut h.game).await;
    assert_eq!(
        h.game.drain_notices(),
        vec![Notice::error("No hay juego activo")]
    );
    assert_eq!(h.game.session().phase(), SessionPhase::Active);
}

#[tokio::test]
async fn malformed_message_is_dropped() {
    let (mut h, server) = started(&["CAT"]).await;
    server.send_raw("{not json");
    server.send(serde_json::json!({ "soluciones": [{ "palabra": "CAT", "posiciones": [] }] }));
    server.send(found_json(&["CAT"], false));
    step_once(&mut h.game).await;

    assert_eq!(h.game.session().phase(), SessionPhase::Active);
    assert!(h.game.session().solution_entries().is_empty());
    assert!(h.game.session().is_found("CAT"));
}

// ── Session boundaries ──────────────────────────────────────────────

#[tokio::test]
async fn connection_loss_aborts_session() {
    let (mut h, server) = started(&["CAT"]).await;
    h.game.pointer_down(Cell::new(0, 0));
    drop(server);

    step_until(&mut h.game, |g| g.session().phase() == SessionPhase::Aborted).await;
    assert!(!h.game.selection().is_dragging());
    assert!(!h.game.pointer_down(Cell::new(0, 0)));
    assert!(!h.game.reveal());

    let notices = h.game.drain_notices();
    assert_eq!(notices, vec![Notice::error("Disconnected from server")]);
}

#[tokio::test]
async fn transport_error_aborts_session_with_reason() {
    let (mut h, server) = started(&["CAT"]).await;
    server.fail("connection reset");
    step_until(&mut h.game, |g| g.session().phase() == SessionPhase::Aborted).await;

    let notices = h.game.drain_notices();
    assert_eq!(notices.len(), 1);
    assert!(notices[0].text.contains("connection reset"));
}

#[tokio::test]
async fn reply_to_superseded_start_is_ignored() {
    let mut h = harness();
    h.game.new_game().await.unwrap();
    let mut server = accept(&mut h.servers).await;
    server.expect_command(start_command()).await;

    h.game.new_game().await.unwrap();
    server.expect_command(start_command()).await;

    server.send(puzzle_json(&["CAT"]));
    server.send(puzzle_json(&["RX"]));
    step_until(&mut h.game, active).await;

    let puzzle = h.game.session().puzzle().unwrap();
    assert!(puzzle.words().contains("RX"));
    assert!(!puzzle.words().contains("CAT"));
}

#[tokio::test]
async fn error_answering_start_does_not_block_next_game() {
    let mut h = harness();
    h.game.new_game().await.unwrap();
    let mut server = accept(&mut h.servers).await;
    server.expect_command(start_command()).await;

    server.send(error_json("No hay palabras disponibles"));
    step_once(&mut h.game).await;
    step_once(&mut h.game).await;
    assert_eq!(
        h.game.drain_notices(),
        vec![
            Notice::success("Connected to server"),
            Notice::error("No hay palabras disponibles"),
        ]
    );
    assert_eq!(h.game.session().phase(), SessionPhase::Idle);

    h.game.new_game().await.unwrap();
    server.expect_command(start_command()).await;
    server.send(puzzle_json(&["CAT"]));
    step_until(&mut h.game, active).await;
    assert!(h.game.session().puzzle().unwrap().words().contains("CAT"));
}

#[tokio::test]
async fn malformed_puzzle_does_not_block_next_game() {
    let mut h = harness();
    h.game.new_game().await.unwrap();
    let mut server = accept(&mut h.servers).await;
    server.expect_command(start_command()).await;

    server.send_raw(r#"{"tablero":[["AB"]],"palabras":["AB"]}"#);

    h.game.new_game().await.unwrap();
    server.expect_command(start_command()).await;
    server.send(puzzle_json(&["CAT"]));
    step_until(&mut h.game, active).await;
    assert!(h.game.session().puzzle().unwrap().words().contains("CAT"));
}

#[tokio::test]
async fn quick_second_new_game_sends_one_start() {
    let mut h = harness_with_client(
        ClientConfig::new().with_start_retry_delay(Duration::from_millis(200)),
        SessionConfig::new(),
    );
    h.game.new_game().await.unwrap();
    h.game.new_game().await.unwrap();
    assert_eq!(h.connects.load(Ordering::SeqCst), 1);

    let mut server = accept(&mut h.servers).await;
    server.expect_command(start_command()).await;
    server.expect_silence(Duration::from_millis(400)).await;

    server.send(puzzle_json(&["CAT"]));
    step_until(&mut h.game, active).await;

    assert!(h.game.reveal());
    server.expect_command(solve_command()).await;
    server.send(cat_solution_json());
    step_until(&mut h.game, |g| g.session().phase() == SessionPhase::Solved).await;
    assert!(h.game.session().is_found("CAT"));
    assert_eq!(h.game.session().solution_entries().len(), 1);
}

#[tokio::test]
async fn late_solution_does_not_leak_into_next_game() {
    let (mut h, mut server) = started(&["CAT"]).await;
    h.game.reveal();
    server.expect_command(solve_command()).await;

    h.game.new_game().await.unwrap();
    server.expect_command(start_command()).await;
    assert!(!h.game.session().reveal_pending());

    server.send(cat_solution_json());
    server.send(puzzle_json(&["RX"]));
    step_until(&mut h.game, active).await;

    assert!(h.game.session().solution_entries().is_empty());
    assert!(!h.game.session().is_found("CAT"));
    assert_eq!(h.game.progress(), Progress { found: 0, total: 1 });
}

#[tokio::test]
async fn new_game_mid_drag_cancels_selection() {
    let (mut h, mut server) = started(&["CAT"]).await;
    h.game.pointer_down(Cell::new(0, 0));
    h.game.new_game().await.unwrap();
    server.expect_command(start_command()).await;

    assert!(!h.game.selection().is_dragging());
    assert_eq!(h.game.session().phase(), SessionPhase::Idle);
    assert!(h.game.board_view().is_none());
}

#[tokio::test]
async fn unanswered_reveal_times_out() {
    let config = SessionConfig::new().with_reveal_timeout(Some(Duration::from_millis(50)));
    let (mut h, mut server) = start_with(harness_with(config), &["CAT"]).await;

    assert!(h.game.reveal());
    server.expect_command(solve_command()).await;
    step_until(&mut h.game, |g| !g.session().reveal_pending()).await;

    let notices = h.game.drain_notices();
    assert_eq!(notices.len(), 1);
    assert_eq!(notices[0].kind, NoticeKind::Error);
    assert_eq!(h.game.session().phase(), SessionPhase::Active);
    assert!(h.game.pointer_down(Cell::new(0, 0)));
}

#[tokio::test]
async fn elapsed_label_is_minutes_and_seconds() {
    let (h, _server) = started(&["CAT"]).await;
    let label = h.game.elapsed_label();
    assert_eq!(label.len(), 5);
    assert_eq!(&label[2..3], ":");
}
