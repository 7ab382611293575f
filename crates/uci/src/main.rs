//! UCI server binary: exposes the built-in searcher over stdin/stdout
//! so the process client (and any UCI-speaking GUI) has an engine to
//! talk to.

use log::debug;
use rules::{fen, moves, Board, Color, START_FEN};
use std::io::{self, BufRead};
use std::sync::atomic::AtomicBool;
use uci::builtin::{search, SearchOutcome};

struct Position {
    board: Board,
    turn: Color,
}

fn load_position(parts: &[&str]) -> Option<Position> {
    let mut position = if parts.get(1) == Some(&"startpos") {
        let parsed = fen::parse(START_FEN).ok()?;
        Position {
            turn: parsed.turn,
            board: parsed.into_board(),
        }
    } else if parts.get(1) == Some(&"fen") {
        let end = parts
            .iter()
            .position(|&t| t == "moves")
            .unwrap_or(parts.len());
        let fen_text = parts[2..end].join(" ");
        let parsed = fen::parse(&fen_text).ok()?;
        Position {
            turn: parsed.turn,
            board: parsed.into_board(),
        }
    } else {
        return None;
    };

    if let Some(moves_idx) = parts.iter().position(|&t| t == "moves") {
        for move_str in &parts[moves_idx + 1..] {
            if let Ok((from, to)) = moves::parse_uci(move_str) {
                position.board.make_move(from, to);
                position.turn = position.turn.opponent();
            }
        }
    }
    Some(position)
}

fn parse_go_command(parts: &[&str]) -> (u8, u64) {
    let mut depth = 8;
    let mut time_limit_ms = 3000;

    if let Some(idx) = parts.iter().position(|&t| t == "depth") {
        if let Some(value) = parts.get(idx + 1).and_then(|t| t.parse().ok()) {
            depth = value;
        }
    }
    if let Some(idx) = parts.iter().position(|&t| t == "movetime") {
        if let Some(value) = parts.get(idx + 1).and_then(|t| t.parse().ok()) {
            time_limit_ms = value;
        }
    }
    (depth, time_limit_ms)
}

fn report(outcome: &SearchOutcome, turn: Color) {
    let display_score = match turn {
        Color::Red => outcome.score,
        Color::Black => -outcome.score,
    };
    if let Some((from, to)) = outcome.best {
        println!(
            "info depth {} score cp {} nodes {} pv {}",
            outcome.depth,
            display_score,
            outcome.nodes,
            moves::move_to_uci(from, to)
        );
        println!("bestmove {}", moves::move_to_uci(from, to));
    } else {
        println!("bestmove (none)");
    }
}

fn main() {
    env_logger::init();
    let mut position: Option<Position> = None;
    let stop = AtomicBool::new(false);

    let stdin = io::stdin();
    for line in stdin.lock().lines() {
        let line = match line {
            Ok(line) => line,
            Err(_) => break,
        };
        debug!("received: {line}");
        let parts: Vec<&str> = line.split_whitespace().collect();
        let Some(&command) = parts.first() else {
            continue;
        };
        match command {
            "uci" => {
                println!("id name xiangqi-core");
                println!("uciok");
            }
            "isready" => println!("readyok"),
            "ucinewgame" => position = None,
            "setoption" => {}
            "position" => position = load_position(&parts),
            "go" => {
                if let Some(ref pos) = position {
                    let (depth, time_limit_ms) = parse_go_command(&parts);
                    let outcome = search(&pos.board, pos.turn, depth, time_limit_ms, &stop);
                    report(&outcome, pos.turn);
                }
            }
            "stop" => {}
            "quit" => break,
            _ => {}
        }
    }
}
