//! The game controller: the authoritative board, the turn machine,
//! histories, clocks and notifications. All mutation funnels through
//! the operations here; presentation layers hold read snapshots only.

use crate::clock::GameClock;
use crate::error::{GameError, GameResult};
use crate::notify::{ListenerId, ListenerRegistry, Notification, StateListener};
use log::warn;
use rules::{
    check, constants, fen, move_gen, moves, validator, Board, Color, MoveError, MoveRecord,
    Piece, PieceKind, START_FEN,
};
use serde::Serialize;
use uci::{BestMoveReply, EngineBridge, EngineError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Playing,
    Checkmate,
    Stalemate,
    Draw,
}

/// Result of a `hint` request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HintOutcome {
    Move(String),
    /// A search is already in flight.
    Busy,
    None,
}

/// AI configuration carried by the controller.
#[derive(Debug, Clone, Copy)]
pub struct AiSettings {
    pub enabled: bool,
    pub level: u8,
    pub color: Color,
    pub moves_first: bool,
    pub self_play: bool,
}

/// Construction options. The defaults give a human-vs-human game from
/// the standard starting position.
pub struct GameOptions {
    pub initial_fen: Option<String>,
    pub starting_turn: Option<Color>,
    pub ai_enabled: bool,
    pub ai_level: u8,
    pub ai_color: Color,
    pub ai_moves_first: bool,
    pub self_play: bool,
    pub bridge: Option<EngineBridge>,
}

impl Default for GameOptions {
    fn default() -> Self {
        Self {
            initial_fen: None,
            starting_turn: None,
            ai_enabled: false,
            ai_level: 5,
            ai_color: Color::Black,
            ai_moves_first: false,
            self_play: false,
            bridge: None,
        }
    }
}

/// Timing and progress counters exposed to the presentation layer.
#[derive(Debug, Clone, Serialize)]
pub struct GameStats {
    pub red_total_ms: u64,
    pub black_total_ms: u64,
    pub current_move_ms: u64,
    pub moves_played: usize,
    pub turn: Color,
    pub status: Status,
}

pub struct GameController {
    board: Board,
    turn: Color,
    status: Status,
    initial_fen: String,
    fen_history: Vec<String>,
    move_history: Vec<MoveRecord>,
    last_move: Option<((u8, u8), (u8, u8))>,
    last_hint: Option<((u8, u8), (u8, u8))>,
    clock: GameClock,
    pending: Option<Notification>,
    listeners: ListenerRegistry,
    bridge: EngineBridge,
    pub(crate) ai: AiSettings,
    halfmove: u32,
    fullmove: u32,
}

impl GameController {
    /// Builds a controller from the given options. When AI is enabled
    /// the engine initializes lazily off the calling task.
    pub fn new(options: GameOptions) -> GameResult<Self> {
        let fen_text = options
            .initial_fen
            .unwrap_or_else(|| START_FEN.to_string());
        let parsed = fen::parse(&fen_text)?;
        let turn = options.starting_turn.unwrap_or(parsed.turn);
        let halfmove = parsed.halfmove;
        let fullmove = parsed.fullmove;
        let board = parsed.into_board();

        // Normalize so the stored FEN always mirrors board and turn,
        // even when `starting_turn` overrides the FEN's turn field.
        let initial_fen = fen::serialize(&board, turn, halfmove, fullmove);

        let bridge = options.bridge.unwrap_or_else(EngineBridge::builtin);
        if options.ai_enabled {
            let warmup = bridge.clone();
            tokio::spawn(async move {
                if let Err(err) = warmup.initialize().await {
                    warn!("background engine initialization failed: {err}");
                }
            });
        }

        Ok(Self {
            board,
            turn,
            status: Status::Playing,
            fen_history: vec![initial_fen.clone()],
            initial_fen,
            move_history: Vec::new(),
            last_move: None,
            last_hint: None,
            clock: GameClock::new(),
            pending: None,
            listeners: ListenerRegistry::default(),
            bridge,
            ai: AiSettings {
                enabled: options.ai_enabled,
                level: options.ai_level,
                color: options.ai_color,
                moves_first: options.ai_moves_first,
                self_play: options.self_play,
            },
            halfmove,
            fullmove,
        })
    }

    // --- Observable state ---

    pub fn current_fen(&self) -> String {
        self.fen_history
            .last()
            .cloned()
            .unwrap_or_else(|| self.initial_fen.clone())
    }

    pub fn turn(&self) -> Color {
        self.turn
    }

    pub fn status(&self) -> Status {
        self.status
    }

    /// Annotated move list, e.g. `["b2-e2", "h7xe7"]`.
    pub fn move_history(&self) -> Vec<String> {
        self.move_history.iter().map(|m| m.annotated()).collect()
    }

    pub fn fen_history(&self) -> &[String] {
        &self.fen_history
    }

    pub fn last_move(&self) -> Option<((u8, u8), (u8, u8))> {
        self.last_move
    }

    pub fn last_hint(&self) -> Option<((u8, u8), (u8, u8))> {
        self.last_hint
    }

    /// Read snapshot of the live pieces.
    pub fn pieces(&self) -> Vec<Piece> {
        self.board.pieces().to_vec()
    }

    pub fn piece_at(&self, file: u8, rank: u8) -> Option<Piece> {
        self.board.piece_at(file, rank).copied()
    }

    pub fn ai(&self) -> AiSettings {
        self.ai
    }

    pub fn bridge(&self) -> &EngineBridge {
        &self.bridge
    }

    pub fn get_stats(&self) -> GameStats {
        GameStats {
            red_total_ms: self.clock.total(Color::Red).as_millis() as u64,
            black_total_ms: self.clock.total(Color::Black).as_millis() as u64,
            current_move_ms: self.clock.current_elapsed().as_millis() as u64,
            moves_played: self.move_history.len(),
            turn: self.turn,
            status: self.status,
        }
    }

    /// Drains the pending notification slot.
    pub fn consume_notification(&mut self) -> Option<Notification> {
        self.pending.take()
    }

    pub fn set_on_state_changed(&mut self, listener: StateListener) -> ListenerId {
        self.listeners.subscribe(listener)
    }

    pub fn remove_listener(&mut self, id: ListenerId) -> bool {
        self.listeners.unsubscribe(id)
    }

    // --- Write surface ---

    /// Validates and executes one move. Validation runs in layers:
    /// basic sanity, then the engine's legality ruling, then the local
    /// rule validator when the engine is unreachable. On any failure no
    /// state changes.
    pub async fn try_move(&mut self, fx: u8, fy: u8, tx: u8, ty: u8) -> GameResult<()> {
        if self.status != Status::Playing {
            return Err(GameError::GameOver);
        }
        let from = (fx, fy);
        let to = (tx, ty);
        for (file, rank) in [from, to] {
            if !constants::on_board(file as i8, rank as i8) {
                return Err(MoveError::OffBoard {
                    file: file as i8,
                    rank: rank as i8,
                }
                .into());
            }
        }
        let piece = *self
            .board
            .piece_at(fx, fy)
            .ok_or(MoveError::EmptyOrigin)?;
        if piece.color != self.turn {
            return Err(MoveError::WrongColor.into());
        }
        validator::validate_basic(&self.board, self.turn, from, to)?;

        let uci = moves::move_to_uci(from, to);
        let ruling = self.bridge.validate_move(&self.current_fen(), &uci).await;
        match ruling {
            Ok(ruling) if ruling.legal => {}
            Ok(ruling) => {
                return Err(MoveError::EngineRejected(
                    ruling.reason.unwrap_or_else(|| "illegal move".into()),
                )
                .into());
            }
            Err(err) => {
                warn!("engine validation unavailable, using local rules: {err}");
                validator::validate_move(&self.board, &piece, to)?;
            }
        }

        self.commit_move(piece, from, to).await;
        Ok(())
    }

    /// Applies an accepted move. The mutation order is fixed: board,
    /// histories, markers, turn flip, clock roll-over, terminal status,
    /// check notification, listener fan-out.
    async fn commit_move(&mut self, piece: Piece, from: (u8, u8), to: (u8, u8)) {
        let mover = self.turn;
        let captured = self.board.make_move(from, to);

        if captured.is_some() || piece.kind == PieceKind::Pawn {
            self.halfmove = 0;
        } else {
            self.halfmove += 1;
        }
        if mover == Color::Black {
            self.fullmove += 1;
        }

        let next_turn = mover.opponent();
        let new_fen = fen::serialize(&self.board, next_turn, self.halfmove, self.fullmove);
        self.move_history.push(MoveRecord {
            from,
            to,
            captured: captured.map(|p| p.kind),
        });
        self.fen_history.push(new_fen);
        self.last_move = Some((from, to));
        self.last_hint = None;
        self.turn = next_turn;
        self.clock.roll_over(mover);

        self.refresh_terminal_status().await;
        if self.status == Status::Playing && check::is_in_check(&self.board, self.turn) {
            self.pending = Some(Notification::Check);
        }
        self.listeners.fan_out();
    }

    /// Plays a UCI move with the turn forcibly set to `as_color` for
    /// this one move (the opening-book path). The stored FEN is kept in
    /// step so engine validation sees a consistent position.
    pub async fn play_uci_move(&mut self, uci: &str, as_color: Color) -> GameResult<()> {
        let (from, to) = moves::parse_uci(uci)?;
        let saved_turn = self.turn;
        let saved_fen = self.current_fen();
        if self.turn != as_color {
            self.turn = as_color;
            let fen = fen::serialize(&self.board, as_color, self.halfmove, self.fullmove);
            if let Some(slot) = self.fen_history.last_mut() {
                *slot = fen;
            }
        }
        let result = self.try_move(from.0, from.1, to.0, to.1).await;
        if result.is_err() {
            self.turn = saved_turn;
            if let Some(slot) = self.fen_history.last_mut() {
                *slot = saved_fen;
            }
        }
        result
    }

    /// Rolls back the last move. Pieces are re-derived with the
    /// identity-preserving reparse so ids stay stable for the UI.
    pub async fn undo(&mut self) -> GameResult<()> {
        if self.fen_history.len() < 2 {
            return Err(GameError::NothingToUndo);
        }
        let fen_text = self.fen_history[self.fen_history.len() - 2].clone();
        let parsed = fen::parse_with_identity(&fen_text, self.board.pieces())?;
        self.fen_history.pop();
        self.turn = parsed.turn;
        self.halfmove = parsed.halfmove;
        self.fullmove = parsed.fullmove;
        self.board = parsed.into_board();
        self.move_history.pop();
        self.status = Status::Playing;
        self.refresh_terminal_status().await;
        self.last_move = self.move_history.last().map(|m| (m.from, m.to));
        self.last_hint = None;
        self.listeners.fan_out();
        Ok(())
    }

    /// Returns to the initial position, keeping piece identities where
    /// the reparse can match them.
    pub fn reset(&mut self) -> GameResult<()> {
        let parsed = fen::parse_with_identity(&self.initial_fen, self.board.pieces())?;
        self.turn = parsed.turn;
        self.halfmove = parsed.halfmove;
        self.fullmove = parsed.fullmove;
        self.board = parsed.into_board();
        self.status = Status::Playing;
        self.fen_history = vec![self.initial_fen.clone()];
        self.move_history.clear();
        self.last_move = None;
        self.last_hint = None;
        self.pending = None;
        self.clock.reset();
        self.listeners.fan_out();
        Ok(())
    }

    /// Basic-rule destinations for the piece on (x, y); empty when the
    /// square is. Does not consult the engine.
    pub fn legal_targets(&self, x: u8, y: u8) -> Vec<(u8, u8)> {
        match self.board.piece_at(x, y) {
            Some(piece) => move_gen::legal_targets(&self.board, piece),
            None => Vec::new(),
        }
    }

    /// Asks the engine for a suggestion at the given difficulty without
    /// committing it. The engine's enabled/level settings are restored
    /// afterwards.
    pub async fn hint(&mut self, difficulty: u8) -> GameResult<HintOutcome> {
        if self.status != Status::Playing {
            return Ok(HintOutcome::None);
        }
        let saved = (self.ai.enabled, self.ai.level);
        self.ai.enabled = true;
        self.ai.level = difficulty;
        let reply = self.bridge.best_move(&self.current_fen(), difficulty).await;
        self.ai.enabled = saved.0;
        self.ai.level = saved.1;

        match reply {
            Ok(BestMoveReply::Move(uci)) => {
                let endpoints = moves::parse_uci(&uci)?;
                self.last_hint = Some(endpoints);
                self.listeners.fan_out();
                Ok(HintOutcome::Move(uci))
            }
            Ok(BestMoveReply::NoMove) => Ok(HintOutcome::None),
            Err(EngineError::Busy) => Ok(HintOutcome::Busy),
            Err(err) => Err(err.into()),
        }
    }

    /// Position score in centipawns, positive for red.
    pub async fn evaluate(&mut self) -> GameResult<i32> {
        Ok(self.bridge.evaluate(&self.current_fen()).await?)
    }

    pub fn set_ai_enabled(&mut self, enabled: bool) {
        self.ai.enabled = enabled;
        if enabled {
            let warmup = self.bridge.clone();
            tokio::spawn(async move {
                if let Err(err) = warmup.initialize().await {
                    warn!("background engine initialization failed: {err}");
                }
            });
        }
    }

    pub fn set_ai_level(&mut self, level: u8) {
        self.ai.level = level;
    }

    pub fn toggle_self_play(&mut self) -> bool {
        self.ai.self_play = !self.ai.self_play;
        self.ai.self_play
    }

    // --- Internals ---

    /// Re-derives the terminal status for the side to move. The engine
    /// is consulted first; when it is unreachable the local legal-move
    /// list decides.
    pub(crate) async fn refresh_terminal_status(&mut self) {
        if self.status != Status::Playing {
            return;
        }
        // A missing king is terminal regardless of anything else.
        if self.board.king(self.turn).is_none() || self.board.king(self.turn.opponent()).is_none()
        {
            self.status = Status::Checkmate;
            return;
        }

        let fen_text = self.current_fen();
        let mate_verdict = self.bridge.is_checkmate(&fen_text).await;
        match mate_verdict {
            Ok(true) => {
                self.status = Status::Checkmate;
                return;
            }
            Ok(false) => {}
            Err(err) => {
                warn!("engine terminal check unavailable, using local rules: {err}");
                if move_gen::legal_moves(&self.board, self.turn).is_empty() {
                    self.status = if check::is_in_check(&self.board, self.turn) {
                        Status::Checkmate
                    } else {
                        Status::Stalemate
                    };
                }
                return;
            }
        }
        let stale_verdict = self.bridge.is_stalemate(&fen_text).await;
        if let Ok(true) = stale_verdict {
            self.status = Status::Stalemate;
        }
    }

    pub(crate) fn mark_stalemate(&mut self) {
        if self.status == Status::Playing {
            self.status = Status::Stalemate;
            self.listeners.fan_out();
        }
    }
}
