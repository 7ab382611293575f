//! Local move validation: the rule authority used when the engine is
//! unavailable, and the per-piece geometry/blocking checks behind it.
//!
//! Validation here is deliberately self-check-blind; filtering moves that
//! leave the mover's own king attackable is the full-legality layer's job
//! (see `move_gen::legal_moves`).

use crate::board::{Board, Piece};
use crate::constants::{self, Color, PieceKind};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MoveError {
    #[error("coordinates off the board: ({file}, {rank})")]
    OffBoard { file: i8, rank: i8 },

    #[error("no piece on the origin square")]
    EmptyOrigin,

    #[error("origin and destination are the same square")]
    SameSquare,

    #[error("piece belongs to the opponent")]
    WrongColor,

    #[error("destination holds a friendly piece")]
    FriendlyCapture,

    #[error("move distance fails the sanity bound")]
    DistanceSanity,

    #[error("move shape not allowed for a {0:?}")]
    BadGeometry(PieceKind),

    #[error("path to the destination is blocked")]
    PathBlocked,

    #[error("king and advisors must stay inside the palace")]
    OutsidePalace,

    #[error("elephants may not cross the river")]
    RiverCrossed,

    #[error("elephant eye is blocked")]
    ElephantEyeBlocked,

    #[error("horse leg is blocked")]
    HorseLegBlocked,

    #[error("cannon needs {needed} screen(s) on the path, found {found}")]
    CannonScreen { found: usize, needed: usize },

    #[error("not a UCI move: {0:?}")]
    BadUci(String),

    #[error("rejected by the engine: {0}")]
    EngineRejected(String),
}

/// The cheap sanity layer run before any rule or engine consultation:
/// distinct endpoints, no friendly capture, bounded travel distance.
pub fn validate_basic(
    board: &Board,
    color: Color,
    from: (u8, u8),
    to: (u8, u8),
) -> Result<(), MoveError> {
    for (file, rank) in [from, to] {
        if !constants::on_board(file as i8, rank as i8) {
            return Err(MoveError::OffBoard {
                file: file as i8,
                rank: rank as i8,
            });
        }
    }
    if from == to {
        return Err(MoveError::SameSquare);
    }
    if board.color_at(to.0, to.1) == Some(color) {
        return Err(MoveError::FriendlyCapture);
    }
    let distance = (from.0 as i8 - to.0 as i8).unsigned_abs()
        + (from.1 as i8 - to.1 as i8).unsigned_abs();
    if distance > 18 {
        return Err(MoveError::DistanceSanity);
    }
    Ok(())
}

/// Validates a proposed destination for one piece against the full local
/// rule set: geometry, palace/river confinement, blocking pieces and the
/// cannon's screen-count parity.
pub fn validate_move(board: &Board, piece: &Piece, to: (u8, u8)) -> Result<(), MoveError> {
    let (tf, tr) = (to.0 as i8, to.1 as i8);
    if !constants::on_board(tf, tr) {
        return Err(MoveError::OffBoard { file: tf, rank: tr });
    }
    let from = piece.square();
    if from == to {
        return Err(MoveError::SameSquare);
    }
    if board.color_at(to.0, to.1) == Some(piece.color) {
        return Err(MoveError::FriendlyCapture);
    }

    let df = tf - piece.file as i8;
    let dr = tr - piece.rank as i8;

    match piece.kind {
        PieceKind::King => {
            if df.abs() + dr.abs() != 1 {
                return Err(MoveError::BadGeometry(PieceKind::King));
            }
            if !constants::in_palace(piece.color, tf, tr) {
                return Err(MoveError::OutsidePalace);
            }
        }
        PieceKind::Advisor => {
            if df.abs() != 1 || dr.abs() != 1 {
                return Err(MoveError::BadGeometry(PieceKind::Advisor));
            }
            if !constants::in_palace(piece.color, tf, tr) {
                return Err(MoveError::OutsidePalace);
            }
        }
        PieceKind::Elephant => {
            if df.abs() != 2 || dr.abs() != 2 {
                return Err(MoveError::BadGeometry(PieceKind::Elephant));
            }
            if !constants::on_own_side(piece.color, tr) {
                return Err(MoveError::RiverCrossed);
            }
            let eye = (
                (piece.file as i8 + df / 2) as u8,
                (piece.rank as i8 + dr / 2) as u8,
            );
            if !board.is_empty_square(eye.0, eye.1) {
                return Err(MoveError::ElephantEyeBlocked);
            }
        }
        PieceKind::Horse => {
            if !matches!((df.abs(), dr.abs()), (1, 2) | (2, 1)) {
                return Err(MoveError::BadGeometry(PieceKind::Horse));
            }
            let leg = horse_leg(from, (df, dr));
            if !board.is_empty_square(leg.0, leg.1) {
                return Err(MoveError::HorseLegBlocked);
            }
        }
        PieceKind::Rook => {
            let between = board
                .count_between(from, to)
                .ok_or(MoveError::BadGeometry(PieceKind::Rook))?;
            if between != 0 {
                return Err(MoveError::PathBlocked);
            }
        }
        PieceKind::Cannon => {
            let between = board
                .count_between(from, to)
                .ok_or(MoveError::BadGeometry(PieceKind::Cannon))?;
            let capturing = board.piece_at(to.0, to.1).is_some();
            let needed = if capturing { 1 } else { 0 };
            if between != needed {
                return Err(MoveError::CannonScreen {
                    found: between,
                    needed,
                });
            }
        }
        PieceKind::Pawn => {
            let forward = piece.color.forward();
            let crossed = constants::crossed_river(piece.color, piece.rank);
            let is_forward = df == 0 && dr == forward;
            let is_sideways = df.abs() == 1 && dr == 0;
            let ok = if crossed {
                is_forward || is_sideways
            } else {
                is_forward
            };
            if !ok {
                return Err(MoveError::BadGeometry(PieceKind::Pawn));
            }
        }
    }
    Ok(())
}

/// The square a horse's first orthogonal step passes through. Blocking it
/// forbids the jump.
pub fn horse_leg(from: (u8, u8), delta: (i8, i8)) -> (u8, u8) {
    let (df, dr) = delta;
    if df.abs() == 2 {
        ((from.0 as i8 + df / 2) as u8, from.1)
    } else {
        (from.0, (from.1 as i8 + dr / 2) as u8)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fen;

    fn board(fen: &str) -> Board {
        Board::new(fen::parse(fen).unwrap().pieces)
    }

    fn validate(board: &Board, from: (u8, u8), to: (u8, u8)) -> Result<(), MoveError> {
        let piece = *board.piece_at(from.0, from.1).expect("origin occupied");
        validate_move(board, &piece, to)
    }

    #[test]
    fn king_confined_to_palace() {
        let b = board(crate::constants::START_FEN);
        // e0 sideways out of the palace files
        assert_eq!(validate(&b, (4, 9), (2, 9)), Err(MoveError::BadGeometry(PieceKind::King)));
        let b = board("4k4/9/9/9/9/9/9/9/9/3K5 w - - 0 1");
        assert_eq!(validate(&b, (3, 9), (2, 9)), Err(MoveError::OutsidePalace));
        assert!(validate(&b, (3, 9), (4, 9)).is_ok());
    }

    #[test]
    fn elephant_river_and_eye() {
        let b = board("4k4/9/9/9/9/2B6/9/9/9/4K4 w - - 0 1");
        // (2,5) to (0,3) crosses the river
        assert_eq!(validate(&b, (2, 5), (0, 3)), Err(MoveError::RiverCrossed));
        assert!(validate(&b, (2, 5), (0, 7)).is_ok());

        let b = board("4k4/9/9/9/9/2B6/1p7/9/9/4K4 w - - 0 1");
        assert_eq!(validate(&b, (2, 5), (0, 7)), Err(MoveError::ElephantEyeBlocked));
    }

    #[test]
    fn horse_leg_blocks_jump() {
        // Horse at b2 with its own pawn directly above at b3.
        let b = board("4k4/9/9/9/9/9/1P7/1N7/9/4K4 w - - 0 1");
        assert_eq!(validate(&b, (1, 7), (2, 5)), Err(MoveError::HorseLegBlocked));
        assert_eq!(validate(&b, (1, 7), (0, 5)), Err(MoveError::HorseLegBlocked));
        // Sideways-first jumps use a different leg and stay open.
        assert!(validate(&b, (1, 7), (3, 6)).is_ok());
    }

    #[test]
    fn cannon_screen_parity() {
        // Cannon e2, screen e5, black horse e9.
        let b = board("4n4/9/9/9/4P4/9/9/4C4/9/4K4 w - - 0 1");
        let cannon = (4, 7);
        assert!(validate(&b, cannon, (4, 0)).is_ok());
        // Non-capture over the screen square is blocked.
        assert_eq!(
            validate(&b, cannon, (4, 2)),
            Err(MoveError::CannonScreen { found: 1, needed: 0 })
        );
        // Capture with no screen fails.
        let b = board("4n4/9/9/9/9/9/9/4C4/9/4K4 w - - 0 1");
        assert_eq!(
            validate(&b, cannon, (4, 0)),
            Err(MoveError::CannonScreen { found: 0, needed: 1 })
        );
    }

    #[test]
    fn pawn_expands_after_crossing() {
        let b = board(crate::constants::START_FEN);
        // a3 pawn: forward only, never sideways or backward.
        assert!(validate(&b, (0, 6), (0, 5)).is_ok());
        assert_eq!(
            validate(&b, (0, 6), (1, 6)),
            Err(MoveError::BadGeometry(PieceKind::Pawn))
        );

        let b = board("4k4/9/9/4P4/9/9/9/9/9/4K4 w - - 0 1");
        let pawn = (4, 3);
        assert!(validate(&b, pawn, (4, 2)).is_ok());
        assert!(validate(&b, pawn, (3, 3)).is_ok());
        assert!(validate(&b, pawn, (5, 3)).is_ok());
        assert_eq!(
            validate(&b, pawn, (4, 4)),
            Err(MoveError::BadGeometry(PieceKind::Pawn))
        );
    }

    #[test]
    fn basic_layer_rejects_friendly_capture() {
        let b = board(crate::constants::START_FEN);
        assert_eq!(
            validate_basic(&b, Color::Red, (0, 9), (0, 6)),
            Err(MoveError::FriendlyCapture)
        );
        assert_eq!(
            validate_basic(&b, Color::Red, (0, 9), (0, 9)),
            Err(MoveError::SameSquare)
        );
        assert!(validate_basic(&b, Color::Red, (0, 9), (0, 8)).is_ok());
    }
}
