//! Error types for the engine bridge.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("engine is unreachable: {0}")]
    Unreachable(String),

    #[error("engine reply timed out after {0} ms")]
    Timeout(u64),

    #[error("malformed engine reply: {0:?}")]
    MalformedReply(String),

    /// A `best_move` request is already in flight; the bridge never
    /// queues, callers see this sentinel instead.
    #[error("engine is busy with a search")]
    Busy,

    #[error("engine has not been initialized")]
    NotInitialized,

    #[error("bad position: {0}")]
    Position(#[from] rules::FenError),

    #[error("engine i/o failed: {0}")]
    Io(#[from] std::io::Error),
}

pub type EngineResult<T> = Result<T, EngineError>;
