//! The engine capability: the set of operations the game controller
//! relies on, whether served in-process or by an external UCI program.

use crate::error::EngineResult;
use async_trait::async_trait;

/// Search configuration applied at initialization and kept for every
/// subsequent request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    pub threads: usize,
    pub hash_mb: usize,
    pub skill_level: u8,
    pub depth: u8,
    pub move_time_ms: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            threads: default_thread_count(),
            hash_mb: 128,
            skill_level: 5,
            depth: 8,
            move_time_ms: 3000,
        }
    }
}

/// Half the logical cores, never less than one.
pub fn default_thread_count() -> usize {
    let cores = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    (cores / 2).max(1)
}

/// Result of an `analyze` request.
#[derive(Debug, Clone, Default)]
pub struct Analysis {
    pub best_move: Option<String>,
    pub ponder: Option<String>,
    /// Centipawns from red's perspective.
    pub score_cp: i32,
    pub depth: u32,
    pub nodes: u64,
    pub nps: u64,
    pub time_ms: u64,
    pub pv: Vec<String>,
}

/// Answer to an `is_move_legal` query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LegalityRuling {
    pub legal: bool,
    pub reason: Option<String>,
}

impl LegalityRuling {
    pub fn legal() -> Self {
        Self {
            legal: true,
            reason: None,
        }
    }

    pub fn illegal(reason: impl Into<String>) -> Self {
        Self {
            legal: false,
            reason: Some(reason.into()),
        }
    }
}

/// The abstract engine. Implementations exist for the in-process
/// material searcher and for an external UCI process; the bridge only
/// ever talks through this trait.
///
/// `best_move` replies follow the UCI convention: a 4-character move,
/// an empty string, or the literal `"(none)"` for terminal positions.
#[async_trait]
pub trait EngineService: Send {
    /// Prepares the engine. Idempotent.
    async fn initialize(&mut self) -> EngineResult<()>;

    async fn configure(&mut self, config: &EngineConfig) -> EngineResult<()>;

    async fn set_position(&mut self, fen: &str) -> EngineResult<()>;

    async fn best_move(&mut self, fen: &str, difficulty: u8) -> EngineResult<String>;

    async fn analyze(&mut self, fen: &str, depth: u8, time_limit_ms: u64)
        -> EngineResult<Analysis>;

    async fn is_move_legal(&mut self, fen: &str, uci: &str) -> EngineResult<LegalityRuling>;

    async fn legal_moves(&mut self, fen: &str) -> EngineResult<Vec<String>>;

    /// Centipawns from red's perspective.
    async fn evaluate(&mut self, fen: &str) -> EngineResult<i32>;

    async fn is_in_check(&mut self, fen: &str) -> EngineResult<bool>;

    async fn is_checkmate(&mut self, fen: &str) -> EngineResult<bool>;

    async fn is_stalemate(&mut self, fen: &str) -> EngineResult<bool>;

    /// Interrupts a running search; the pending request resolves with a
    /// no-move reply.
    async fn stop(&mut self) -> EngineResult<()>;

    async fn reset(&mut self) -> EngineResult<()>;

    fn info(&self) -> String;

    async fn dispose(&mut self) -> EngineResult<()>;
}
