//! The AI turn driver: opponent responses, self-play, the opening-book
//! first move, and the retry/emergency policy around engine requests.

use crate::book::OPENING_BOOK;
use crate::error::GameResult;
use crate::game::{GameController, Status};
use log::{info, warn};
use rules::moves;
use std::time::Duration;
use uci::{BestMoveReply, EngineError};

/// Short pause before an AI reply so the previous move stays readable.
const AI_MOVE_DELAY_MS: u64 = 350;
/// Validation-failure retries per AI move request.
const AI_MOVE_ATTEMPTS: u32 = 3;

impl GameController {
    /// Whether the side to move is under engine control.
    pub fn is_ai_turn(&self) -> bool {
        self.ai.enabled
            && self.status() == Status::Playing
            && (self.turn() == self.ai.color || self.ai.self_play)
    }

    /// Drives AI turns until a human is to move or the game ends. With
    /// self-play enabled both sides are driven; the loop commits one
    /// move per iteration and re-checks the status, so a terminal
    /// position always breaks it.
    pub async fn run_ai_turns(&mut self) -> GameResult<()> {
        loop {
            if !self.is_ai_turn() {
                return Ok(());
            }
            tokio::time::sleep(Duration::from_millis(AI_MOVE_DELAY_MS)).await;

            if self.move_history().is_empty() && self.ai.moves_first {
                if self.play_book_opening().await? {
                    if !self.ai.self_play {
                        return Ok(());
                    }
                    continue;
                }
            }

            if !self.ai_move_once().await? {
                return Ok(());
            }
            if !self.ai.self_play {
                return Ok(());
            }
        }
    }

    /// Plays the AI's first move from the bundled opening book, with
    /// the turn forced to the AI's colour for that one move. Returns
    /// whether a book move was committed.
    pub async fn play_book_opening(&mut self) -> GameResult<bool> {
        let color = self.ai.color;
        let Some(uci) = OPENING_BOOK.sample(color, &mut rand::thread_rng()) else {
            return Ok(false);
        };
        match self.play_uci_move(&uci, color).await {
            Ok(()) => {
                info!("opening book: {uci}");
                Ok(true)
            }
            Err(err) => {
                warn!("opening book move {uci} rejected: {err}");
                Ok(false)
            }
        }
    }

    /// One AI move with the full retry policy: up to three attempts on
    /// validation failure, then the first legal move as an emergency,
    /// then a stalemate verdict when nothing is playable.
    pub async fn ai_move_once(&mut self) -> GameResult<bool> {
        let fen = self.current_fen();
        let level = self.ai.level;
        let bridge = self.bridge().clone();

        for attempt in 1..=AI_MOVE_ATTEMPTS {
            match bridge.best_move(&fen, level).await {
                Ok(BestMoveReply::Move(uci)) => match moves::parse_uci(&uci) {
                    Ok((from, to)) => {
                        match self.try_move(from.0, from.1, to.0, to.1).await {
                            Ok(()) => return Ok(true),
                            Err(err) => {
                                warn!("engine move {uci} rejected (attempt {attempt}): {err}")
                            }
                        }
                    }
                    Err(err) => warn!("unparseable engine move {uci:?}: {err}"),
                },
                Ok(BestMoveReply::NoMove) => {
                    self.refresh_terminal_status().await;
                    if self.status() != Status::Playing {
                        return Ok(false);
                    }
                }
                Err(EngineError::Busy) => return Ok(false),
                Err(err) => {
                    warn!("engine unavailable for the AI turn: {err}");
                    break;
                }
            }
        }

        // Emergency path: any legal move beats forfeiting the turn.
        if let Ok(legal) = bridge.legal_moves(&fen).await {
            if let Some(first) = legal.first() {
                if let Ok((from, to)) = moves::parse_uci(first) {
                    if self.try_move(from.0, from.1, to.0, to.1).await.is_ok() {
                        warn!("played emergency move {first}");
                        return Ok(true);
                    }
                }
            }
        }
        self.mark_stalemate();
        Ok(false)
    }
}
