//! Rules core for the Xiangqi playing system: board and piece identity,
//! FEN codec, per-piece move generation, local validation and check
//! detection.

pub mod board;
pub mod check;
pub mod constants;
pub mod fen;
pub mod move_gen;
pub mod moves;
pub mod validator;

pub use board::{Board, Piece};
pub use check::is_in_check;
pub use constants::{Color, PieceKind, START_FEN};
pub use fen::{FenError, ParsedFen};
pub use moves::MoveRecord;
pub use validator::MoveError;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn make_move_relocates_and_captures() {
        let parsed = fen::parse(START_FEN).unwrap();
        let mut board = parsed.into_board();
        let cannon_id = board.piece_at(1, 7).unwrap().id;

        let captured = board.make_move((1, 7), (4, 7));
        assert!(captured.is_none());
        assert!(board.is_empty_square(1, 7));
        assert_eq!(board.piece_at(4, 7).map(|p| p.id), Some(cannon_id));
    }

    #[test]
    fn unmake_move_restores_the_fen() {
        let parsed = fen::parse(START_FEN).unwrap();
        let turn = parsed.turn;
        let mut board = parsed.into_board();

        for &(from, to) in &move_gen::legal_moves(&board, Color::Red) {
            let captured = board.make_move(from, to);
            board.unmake_move(from, to, captured);
        }
        assert_eq!(fen::serialize(&board, turn, 0, 1), START_FEN);
    }

    #[test]
    fn opening_legal_move_count() {
        let board = fen::parse(START_FEN).unwrap().into_board();
        assert_eq!(move_gen::legal_moves(&board, Color::Red).len(), 44);
    }
}
