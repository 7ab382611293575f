//! Game controller for the Xiangqi playing system: the authoritative
//! board and turn machine, undo-capable histories, per-side clocks,
//! state-change notifications, and the asynchronous AI driver.

pub mod ai;
pub mod book;
pub mod clock;
pub mod error;
pub mod game;
pub mod notify;

pub use book::{BookMove, OpeningBook, OPENING_BOOK};
pub use clock::GameClock;
pub use error::{GameError, GameResult};
pub use game::{AiSettings, GameController, GameOptions, GameStats, HintOutcome, Status};
pub use notify::{ListenerId, Notification, StateListener};
