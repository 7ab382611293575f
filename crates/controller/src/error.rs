//! Controller error types.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum GameError {
    #[error(transparent)]
    Rule(#[from] rules::MoveError),

    #[error(transparent)]
    Fen(#[from] rules::FenError),

    #[error("engine failure: {0}")]
    Engine(#[from] uci::EngineError),

    #[error("the game is over")]
    GameOver,

    #[error("nothing to undo")]
    NothingToUndo,
}

pub type GameResult<T> = Result<T, GameError>;
