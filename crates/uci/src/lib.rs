//! Engine integration for the Xiangqi game system: the abstract engine
//! capability, an in-process implementation, a client for external UCI
//! programs, and the bridge the controller drives them through.

pub mod bridge;
pub mod builtin;
pub mod error;
pub mod process;
mod ruling;
pub mod service;

pub use bridge::{BestMoveReply, BridgeState, EngineBridge};
pub use builtin::BuiltinEngine;
pub use error::{EngineError, EngineResult};
pub use process::UciProcessEngine;
pub use service::{Analysis, EngineConfig, EngineService, LegalityRuling};
