//! Console front-end for the game controller.
//!
//! Red is played from the keyboard in UCI notation (e.g. `h2e2`);
//! black is driven by the engine. `undo`, `hint`, `eval`, `new` and
//! `exit` round out the commands.

use controller::{GameController, GameOptions, HintOutcome, Notification, Status};
use rules::{moves, Board, Color};
use std::io::{self, Write};

fn print_board(game: &GameController) {
    println!("{}", Board::new(game.pieces()));
}

fn print_status(game: &GameController) {
    let stats = game.get_stats();
    println!(
        "move {} | red {:.1}s | black {:.1}s",
        stats.moves_played,
        stats.red_total_ms as f64 / 1000.0,
        stats.black_total_ms as f64 / 1000.0
    );
}

fn read_command() -> Option<String> {
    print!("Your move: ");
    io::stdout().flush().ok()?;
    let mut input = String::new();
    io::stdin().read_line(&mut input).ok()?;
    Some(input.trim().to_string())
}

#[tokio::main]
async fn main() {
    env_logger::init();

    let mut game = GameController::new(GameOptions {
        ai_enabled: true,
        ai_level: 6,
        ai_color: Color::Black,
        ..GameOptions::default()
    })
    .expect("start position is valid");

    println!("--- Xiangqi ---");
    println!("Enter moves as UCI (e.g. h2e2), or: undo | hint | eval | new | exit");

    loop {
        println!();
        print_board(&game);
        print_status(&game);

        if let Some(note) = game.consume_notification() {
            match note {
                Notification::Check => println!("Check!"),
            }
        }

        match game.status() {
            Status::Playing => {}
            Status::Checkmate => {
                println!("Checkmate. {:?} wins.", game.turn().opponent());
                break;
            }
            Status::Stalemate => {
                println!("Stalemate.");
                break;
            }
            Status::Draw => {
                println!("Draw.");
                break;
            }
        }

        if game.is_ai_turn() {
            println!("Engine is thinking...");
            if let Err(err) = game.run_ai_turns().await {
                println!("Engine failed: {err}");
                break;
            }
            continue;
        }

        let Some(command) = read_command() else {
            break;
        };
        match command.as_str() {
            "" => continue,
            "exit" => break,
            "new" => {
                if let Err(err) = game.reset() {
                    println!("Reset failed: {err}");
                }
            }
            "undo" => {
                // Roll back the engine's reply and the player's move.
                let _ = game.undo().await;
                if let Err(err) = game.undo().await {
                    println!("Nothing to undo: {err}");
                }
            }
            "hint" => match game.hint(6).await {
                Ok(HintOutcome::Move(uci)) => println!("Try {uci}"),
                Ok(HintOutcome::Busy) => println!("Engine is busy."),
                Ok(HintOutcome::None) => println!("No suggestion."),
                Err(err) => println!("Hint failed: {err}"),
            },
            "eval" => match game.evaluate().await {
                Ok(score) => println!("Score: {score} cp (red)"),
                Err(err) => println!("Evaluation failed: {err}"),
            },
            text => match moves::parse_uci(text) {
                Ok((from, to)) => {
                    if let Err(err) = game.try_move(from.0, from.1, to.0, to.1).await {
                        println!("Invalid or illegal move: {err}");
                    }
                }
                Err(_) => println!("Unrecognized command."),
            },
        }
    }
}
