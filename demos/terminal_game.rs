//! # Terminal Word-Find
//!
//! Plays the word-search puzzle from a terminal:
//!
//! 1. Connect to the puzzle server via WebSocket
//! 2. Start a game and print the grid
//! 3. Trace words with `drag r1 c1 r2 c2` (zero-based row/column)
//! 4. Ask for the solution with `solve`, or start over with `new`
//!
//! ## Running
//!
//! ```sh
//! # Start the puzzle server on localhost:5000, then:
//! cargo run --example terminal_game
//!
//! # Override the server URL:
//! WORDFIND_URL=ws://my-server:5000 cargo run --example terminal_game
//! ```

use std::time::Duration;

use tokio::io::AsyncBufReadExt;
use wordfind_client::{
    Cell, CellClass, ClientConfig, Game, SessionConfig, WebSocketConnector,
};

/// Default server URL when `WORDFIND_URL` is not set.
const DEFAULT_URL: &str = "ws://localhost:5000";

const HELP: &str = "commands: new | solve | drag <r1> <c1> <r2> <c2> | board | quit";

enum Command {
    New,
    Solve,
    Drag(Cell, Cell),
    Board,
    Quit,
}

fn parse_command(line: &str) -> Option<Command> {
    let mut words = line.split_whitespace();
    let command = match words.next()? {
        "new" => Command::New,
        "solve" => Command::Solve,
        "board" => Command::Board,
        "quit" | "exit" => Command::Quit,
        "drag" => {
            let numbers = words
                .map(str::parse::<usize>)
                .collect::<Result<Vec<_>, _>>()
                .ok()?;
            let [r1, c1, r2, c2] = numbers.as_slice() else {
                return None;
            };
            Command::Drag(Cell::new(*r1, *c1), Cell::new(*r2, *c2))
        }
        _ => return None,
    };
    Some(command)
}

fn print_board<C: wordfind_client::Connector>(game: &Game<C>) {
    let (Some(puzzle), Some(view)) = (game.session().puzzle(), game.board_view()) else {
        println!("(no puzzle yet, type `new`)");
        return;
    };

    for (letters, classes) in puzzle.grid().rows().zip(view.rows()) {
        let line: Vec<String> = letters
            .iter()
            .zip(classes)
            .map(|(letter, class)| match class {
                CellClass::Normal => format!(" {letter} "),
                CellClass::Selecting => format!("[{letter}]"),
                CellClass::Found => format!("({letter})"),
                CellClass::Solution => format!("<{letter}>"),
            })
            .collect();
        println!("{}", line.concat());
    }

    let words: Vec<String> = game
        .word_statuses()
        .into_iter()
        .map(|status| {
            if status.found {
                format!("{} ✓", status.word)
            } else {
                status.word
            }
        })
        .collect();
    println!("words: {}", words.join(", "));
    println!(
        "progress: {}   time: {}   phase: {}",
        game.progress(),
        game.elapsed_label(),
        game.session().phase()
    );
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // ── Logging ─────────────────────────────────────────────────────
    // Set `RUST_LOG=debug` for verbose output.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    // ── Configuration ───────────────────────────────────────────────
    let url = std::env::var("WORDFIND_URL").unwrap_or_else(|_| DEFAULT_URL.to_string());
    tracing::info!("Connecting to {url}");

    let connector = WebSocketConnector::new(url).with_connect_timeout(Duration::from_secs(5));
    let mut game = Game::new(connector, ClientConfig::new(), SessionConfig::new());

    // Connect up front so the status line shows the connection state; a
    // failure here is reported as a notice and retried by `new`.
    if let Err(e) = game.connect().await {
        tracing::warn!("initial connect failed: {e}");
    }
    println!("{HELP}");

    let mut lines = tokio::io::BufReader::new(tokio::io::stdin()).lines();

    // ── Event loop ──────────────────────────────────────────────────
    loop {
        tokio::select! {
            alive = game.step() => {
                if !alive {
                    tracing::info!("Event channel closed, exiting");
                    break;
                }
                let notices = game.drain_notices();
                if !notices.is_empty() {
                    for notice in notices {
                        println!("* {notice}");
                    }
                    print_board(&game);
                }
            }

            line = lines.next_line() => {
                let Some(line) = line? else {
                    break;
                };
                match parse_command(&line) {
                    Some(Command::New) => {
                        if let Err(e) = game.new_game().await {
                            tracing::error!("could not start a game: {e}");
                        }
                    }
                    Some(Command::Solve) => {
                        if !game.reveal() {
                            println!("nothing to solve right now");
                        }
                    }
                    Some(Command::Drag(from, to)) => {
                        if game.pointer_down(from) {
                            game.pointer_enter(to);
                            game.pointer_up();
                        } else {
                            println!("selection is not available");
                        }
                    }
                    Some(Command::Board) => print_board(&game),
                    Some(Command::Quit) => break,
                    None => println!("{HELP}"),
                }
                for notice in game.drain_notices() {
                    println!("* {notice}");
                }
            }

            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Ctrl+C received, shutting down…");
                break;
            }
        }
    }

    // ── Cleanup ─────────────────────────────────────────────────────
    game.shutdown().await;
    tracing::info!("Goodbye!");
    Ok(())
}
