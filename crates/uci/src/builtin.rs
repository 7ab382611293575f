//! The in-process engine: a material-and-mobility negamax over the
//! rules crate. It is the default arbiter when no external engine is
//! configured, and the searcher behind the bundled UCI server binary.

use crate::error::EngineResult;
use crate::ruling;
use crate::service::{Analysis, EngineConfig, EngineService, LegalityRuling};
use async_trait::async_trait;
use rules::{check, move_gen, moves, Board, Color, PieceKind};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

pub const MATE_VALUE: i32 = 10_000;
const STOP_CHECK_INTERVAL: u64 = 2048;

/// What a finished (or interrupted) search reports.
#[derive(Debug, Clone, Default)]
pub struct SearchOutcome {
    pub best: Option<((u8, u8), (u8, u8))>,
    /// Score from the side-to-move's perspective.
    pub score: i32,
    pub depth: u32,
    pub nodes: u64,
}

pub struct BuiltinEngine {
    config: EngineConfig,
    stop_flag: Arc<AtomicBool>,
}

impl BuiltinEngine {
    pub fn new() -> Self {
        Self {
            config: EngineConfig::default(),
            stop_flag: Arc::new(AtomicBool::new(false)),
        }
    }

    async fn search_off_thread(
        &self,
        fen: &str,
        depth: u8,
        time_limit_ms: u64,
    ) -> EngineResult<(SearchOutcome, Color, u64)> {
        let (board, turn) = ruling::position(fen)?;
        let stop = self.stop_flag.clone();
        stop.store(false, Ordering::Relaxed);

        let started = Instant::now();
        let outcome = tokio::task::spawn_blocking(move || {
            search(&board, turn, depth, time_limit_ms, &stop)
        })
        .await
        .map_err(|err| crate::error::EngineError::Unreachable(err.to_string()))?;
        Ok((outcome, turn, started.elapsed().as_millis() as u64))
    }
}

impl Default for BuiltinEngine {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EngineService for BuiltinEngine {
    async fn initialize(&mut self) -> EngineResult<()> {
        Ok(())
    }

    async fn configure(&mut self, config: &EngineConfig) -> EngineResult<()> {
        self.config = config.clone();
        Ok(())
    }

    async fn set_position(&mut self, fen: &str) -> EngineResult<()> {
        // The searcher is stateless; positions arrive with each request.
        ruling::position(fen).map(|_| ())
    }

    async fn best_move(&mut self, fen: &str, difficulty: u8) -> EngineResult<String> {
        let depth = difficulty.clamp(1, 12);
        let (outcome, _, _) = self
            .search_off_thread(fen, depth, self.config.move_time_ms)
            .await?;
        Ok(match outcome.best {
            Some((from, to)) => moves::move_to_uci(from, to),
            None => "(none)".to_string(),
        })
    }

    async fn analyze(
        &mut self,
        fen: &str,
        depth: u8,
        time_limit_ms: u64,
    ) -> EngineResult<Analysis> {
        let (outcome, turn, time_ms) = self.search_off_thread(fen, depth, time_limit_ms).await?;
        let best_move = outcome.best.map(|(from, to)| moves::move_to_uci(from, to));
        Ok(Analysis {
            best_move: best_move.clone(),
            ponder: None,
            score_cp: red_perspective(outcome.score, turn),
            depth: outcome.depth,
            nodes: outcome.nodes,
            nps: outcome.nodes * 1000 / time_ms.max(1),
            time_ms,
            pv: best_move.into_iter().collect(),
        })
    }

    async fn is_move_legal(&mut self, fen: &str, uci: &str) -> EngineResult<LegalityRuling> {
        ruling::rule_move(fen, uci)
    }

    async fn legal_moves(&mut self, fen: &str) -> EngineResult<Vec<String>> {
        ruling::rule_legal_moves(fen)
    }

    async fn evaluate(&mut self, fen: &str) -> EngineResult<i32> {
        let (outcome, turn, _) = self.search_off_thread(fen, 4, 1000).await?;
        Ok(red_perspective(outcome.score, turn))
    }

    async fn is_in_check(&mut self, fen: &str) -> EngineResult<bool> {
        ruling::rule_in_check(fen)
    }

    async fn is_checkmate(&mut self, fen: &str) -> EngineResult<bool> {
        ruling::rule_checkmate(fen)
    }

    async fn is_stalemate(&mut self, fen: &str) -> EngineResult<bool> {
        ruling::rule_stalemate(fen)
    }

    async fn stop(&mut self) -> EngineResult<()> {
        self.stop_flag.store(true, Ordering::Relaxed);
        Ok(())
    }

    async fn reset(&mut self) -> EngineResult<()> {
        self.stop_flag.store(false, Ordering::Relaxed);
        Ok(())
    }

    fn info(&self) -> String {
        format!(
            "builtin negamax (depth {}, {} ms/move)",
            self.config.depth, self.config.move_time_ms
        )
    }

    async fn dispose(&mut self) -> EngineResult<()> {
        self.stop_flag.store(true, Ordering::Relaxed);
        Ok(())
    }
}

/// Converts a side-to-move score into the red-positive convention.
fn red_perspective(score: i32, turn: Color) -> i32 {
    match turn {
        Color::Red => score,
        Color::Black => -score,
    }
}

/// Iterative-deepening negamax with alpha-beta pruning. Depths are
/// abandoned once the time limit passes or the stop flag is raised; the
/// best move of the deepest completed depth wins.
pub fn search(
    board: &Board,
    turn: Color,
    max_depth: u8,
    time_limit_ms: u64,
    stop: &AtomicBool,
) -> SearchOutcome {
    let mut ctx = SearchCtx {
        deadline: Instant::now(),
        time_limit_ms,
        stop,
        stopped: false,
        nodes: 0,
        ply: 0,
    };

    let mut outcome = SearchOutcome::default();
    let mut scratch = board.clone();

    for depth in 1..=max_depth {
        let (best, score) = search_root(&mut scratch, turn, depth, &mut ctx);
        if ctx.stopped {
            break;
        }
        if best.is_some() {
            outcome.best = best;
            outcome.score = score;
            outcome.depth = depth as u32;
        }
        if score.abs() > MATE_VALUE - 100 {
            break;
        }
    }
    outcome.nodes = ctx.nodes;
    outcome
}

struct SearchCtx<'a> {
    deadline: Instant,
    time_limit_ms: u64,
    stop: &'a AtomicBool,
    stopped: bool,
    nodes: u64,
    ply: i32,
}

impl SearchCtx<'_> {
    fn should_stop(&mut self) -> bool {
        if !self.stopped && self.nodes % STOP_CHECK_INTERVAL == 0 {
            if self.stop.load(Ordering::Relaxed)
                || self.deadline.elapsed().as_millis() as u64 >= self.time_limit_ms
            {
                self.stopped = true;
            }
        }
        self.stopped
    }
}

fn search_root(
    board: &mut Board,
    turn: Color,
    depth: u8,
    ctx: &mut SearchCtx,
) -> (Option<((u8, u8), (u8, u8))>, i32) {
    let mut moves = move_gen::legal_moves(board, turn);
    order_moves(board, &mut moves);

    let mut best = None;
    let mut best_score = -MATE_VALUE;
    for (from, to) in moves {
        let captured = board.make_move(from, to);
        ctx.ply += 1;
        let score = -negamax(board, turn.opponent(), depth - 1, -MATE_VALUE, MATE_VALUE, ctx);
        ctx.ply -= 1;
        board.unmake_move(from, to, captured);
        if ctx.stopped {
            return (None, 0);
        }
        if score > best_score || best.is_none() {
            best_score = score;
            best = Some((from, to));
        }
    }
    (best, best_score)
}

fn negamax(
    board: &mut Board,
    turn: Color,
    depth: u8,
    mut alpha: i32,
    beta: i32,
    ctx: &mut SearchCtx,
) -> i32 {
    ctx.nodes += 1;
    if ctx.should_stop() {
        return 0;
    }
    if depth == 0 {
        return evaluate_material(board, turn);
    }

    let mut moves = move_gen::legal_moves(board, turn);
    if moves.is_empty() {
        return if check::is_in_check(board, turn) {
            -MATE_VALUE + ctx.ply
        } else {
            0
        };
    }
    order_moves(board, &mut moves);

    let mut best = -MATE_VALUE;
    for (from, to) in moves {
        let captured = board.make_move(from, to);
        ctx.ply += 1;
        let score = -negamax(board, turn.opponent(), depth - 1, -beta, -alpha, ctx);
        ctx.ply -= 1;
        board.unmake_move(from, to, captured);

        if score > best {
            best = score;
        }
        if best > alpha {
            alpha = best;
        }
        if alpha >= beta {
            break;
        }
    }
    best
}

/// MVV-LVA: most valuable victim first, cheapest aggressor first.
fn order_moves(board: &Board, moves: &mut [((u8, u8), (u8, u8))]) {
    moves.sort_by_key(|&(from, to)| {
        let victim = board.piece_at(to.0, to.1).map_or(0, |p| p.kind.value());
        let aggressor = board.piece_at(from.0, from.1).map_or(0, |p| p.kind.value());
        -(1000 * victim - aggressor)
    });
}

/// Material balance from `perspective`'s point of view, with a bonus for
/// pawns that have crossed the river.
fn evaluate_material(board: &Board, perspective: Color) -> i32 {
    board
        .pieces()
        .iter()
        .map(|piece| {
            let mut value = piece.kind.value();
            if piece.kind == PieceKind::Pawn && rules::constants::crossed_river(piece.color, piece.rank)
            {
                value += 100;
            }
            if piece.color == perspective {
                value
            } else {
                -value
            }
        })
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rules::fen;
    use rules::START_FEN;

    fn run_search(fen_text: &str, depth: u8) -> SearchOutcome {
        let parsed = fen::parse(fen_text).unwrap();
        let turn = parsed.turn;
        let board = parsed.into_board();
        search(&board, turn, depth, 60_000, &AtomicBool::new(false))
    }

    #[test]
    fn finds_a_legal_opening_move() {
        let outcome = run_search(START_FEN, 2);
        let (from, to) = outcome.best.expect("opening has moves");
        let board = fen::parse(START_FEN).unwrap().into_board();
        assert!(move_gen::legal_moves(&board, Color::Red).contains(&(from, to)));
    }

    #[test]
    fn prefers_the_hanging_rook() {
        // The rooks stare each other down the a-file; taking first wins
        // the exchange outright.
        let outcome = run_search("r2k5/9/9/9/9/9/9/9/9/R3K4 w - - 0 1", 2);
        let (from, to) = outcome.best.unwrap();
        assert_eq!((from, to), ((0, 9), (0, 0)));
    }

    #[test]
    fn reports_no_move_when_mated() {
        // Red king is smothered in the corner of the palace by rooks.
        let outcome = run_search("3rkr3/9/9/9/9/9/9/9/4r4/3rKr3 w - - 0 1", 2);
        assert!(outcome.best.is_none());
    }

    #[tokio::test]
    async fn best_move_reply_follows_the_uci_convention() {
        let mut engine = BuiltinEngine::new();
        engine.initialize().await.unwrap();

        let reply = engine.best_move(START_FEN, 2).await.unwrap();
        assert_eq!(reply.len(), 4);

        let reply = engine
            .best_move("3rkr3/9/9/9/9/9/9/9/4r4/3rKr3 w - - 0 1", 2)
            .await
            .unwrap();
        assert_eq!(reply, "(none)");
    }

    #[tokio::test]
    async fn evaluate_is_red_positive() {
        let mut engine = BuiltinEngine::new();
        engine.initialize().await.unwrap();
        // Red is up a rook.
        let up = engine
            .evaluate("3k5/9/9/9/9/9/9/9/9/4K2R1 w - - 0 1")
            .await
            .unwrap();
        assert!(up > 0);
        // Mirrored position from black's turn still reads red-positive.
        let down = engine
            .evaluate("4k2r1/9/9/9/9/9/9/9/9/5K3 b - - 0 1")
            .await
            .unwrap();
        assert!(down < 0);
    }
}
