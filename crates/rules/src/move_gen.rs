//! Per-piece move generation.
//!
//! `legal_targets` enumerates destinations under the basic rules only
//! (no self-check filtering); it backs UI hinting and the engine-failure
//! fallback. `legal_moves` layers make/undo simulation on top to produce
//! the fully legal move list.

use crate::board::{Board, Piece};
use crate::check::is_in_check;
use crate::constants::{self, Color, PieceKind};
use crate::validator::horse_leg;

const ORTHOGONAL: [(i8, i8); 4] = [(0, 1), (0, -1), (1, 0), (-1, 0)];
const DIAGONAL: [(i8, i8); 4] = [(1, 1), (1, -1), (-1, 1), (-1, -1)];
const ELEPHANT_STEPS: [(i8, i8); 4] = [(2, 2), (2, -2), (-2, 2), (-2, -2)];
const HORSE_STEPS: [(i8, i8); 8] = [
    (2, 1),
    (2, -1),
    (-2, 1),
    (-2, -1),
    (1, 2),
    (1, -2),
    (-1, 2),
    (-1, -2),
];

/// Enumerates pseudo-legal destinations for one piece. Squares holding a
/// friendly piece are excluded; moves that would expose the own king are
/// not.
pub fn legal_targets(board: &Board, piece: &Piece) -> Vec<(u8, u8)> {
    let mut targets = Vec::new();
    let (file, rank) = (piece.file as i8, piece.rank as i8);

    match piece.kind {
        PieceKind::King => {
            for (df, dr) in ORTHOGONAL {
                let (nf, nr) = (file + df, rank + dr);
                if constants::in_palace(piece.color, nf, nr) {
                    push_unless_friendly(board, piece.color, nf, nr, &mut targets);
                }
            }
        }
        PieceKind::Advisor => {
            for (df, dr) in DIAGONAL {
                let (nf, nr) = (file + df, rank + dr);
                if constants::in_palace(piece.color, nf, nr) {
                    push_unless_friendly(board, piece.color, nf, nr, &mut targets);
                }
            }
        }
        PieceKind::Elephant => {
            for (df, dr) in ELEPHANT_STEPS {
                let (nf, nr) = (file + df, rank + dr);
                if !constants::on_board(nf, nr) || !constants::on_own_side(piece.color, nr) {
                    continue;
                }
                let eye = ((file + df / 2) as u8, (rank + dr / 2) as u8);
                if board.is_empty_square(eye.0, eye.1) {
                    push_unless_friendly(board, piece.color, nf, nr, &mut targets);
                }
            }
        }
        PieceKind::Horse => {
            for (df, dr) in HORSE_STEPS {
                let (nf, nr) = (file + df, rank + dr);
                if !constants::on_board(nf, nr) {
                    continue;
                }
                let leg = horse_leg(piece.square(), (df, dr));
                if board.is_empty_square(leg.0, leg.1) {
                    push_unless_friendly(board, piece.color, nf, nr, &mut targets);
                }
            }
        }
        PieceKind::Rook => {
            for (df, dr) in ORTHOGONAL {
                let (mut nf, mut nr) = (file + df, rank + dr);
                while constants::on_board(nf, nr) {
                    match board.color_at(nf as u8, nr as u8) {
                        None => targets.push((nf as u8, nr as u8)),
                        Some(color) => {
                            if color != piece.color {
                                targets.push((nf as u8, nr as u8));
                            }
                            break;
                        }
                    }
                    nf += df;
                    nr += dr;
                }
            }
        }
        PieceKind::Cannon => {
            for (df, dr) in ORTHOGONAL {
                let (mut nf, mut nr) = (file + df, rank + dr);
                // Quiet moves up to the screen.
                while constants::on_board(nf, nr) && board.is_empty_square(nf as u8, nr as u8) {
                    targets.push((nf as u8, nr as u8));
                    nf += df;
                    nr += dr;
                }
                // Skip the screen, then the very next piece is capturable
                // if enemy-coloured.
                nf += df;
                nr += dr;
                while constants::on_board(nf, nr) {
                    if let Some(color) = board.color_at(nf as u8, nr as u8) {
                        if color != piece.color {
                            targets.push((nf as u8, nr as u8));
                        }
                        break;
                    }
                    nf += df;
                    nr += dr;
                }
            }
        }
        PieceKind::Pawn => {
            let mut steps = vec![(0, piece.color.forward())];
            if constants::crossed_river(piece.color, piece.rank) {
                steps.push((1, 0));
                steps.push((-1, 0));
            }
            for (df, dr) in steps {
                let (nf, nr) = (file + df, rank + dr);
                if constants::on_board(nf, nr) {
                    push_unless_friendly(board, piece.color, nf, nr, &mut targets);
                }
            }
        }
    }

    targets
}

fn push_unless_friendly(
    board: &Board,
    color: Color,
    file: i8,
    rank: i8,
    targets: &mut Vec<(u8, u8)>,
) {
    if board.color_at(file as u8, rank as u8) != Some(color) {
        targets.push((file as u8, rank as u8));
    }
}

/// All pseudo-legal moves for one side.
pub fn pseudo_legal_moves(board: &Board, color: Color) -> Vec<((u8, u8), (u8, u8))> {
    let mut moves = Vec::new();
    for piece in board.pieces().iter().filter(|p| p.color == color) {
        for target in legal_targets(board, piece) {
            moves.push((piece.square(), target));
        }
    }
    moves
}

/// All fully legal moves for one side: pseudo-legal moves minus those
/// that leave the mover's own king attackable, found by simulating each
/// candidate and consulting the check detector.
pub fn legal_moves(board: &Board, color: Color) -> Vec<((u8, u8), (u8, u8))> {
    let mut scratch = board.clone();
    pseudo_legal_moves(board, color)
        .into_iter()
        .filter(|&(from, to)| {
            let captured = scratch.make_move(from, to);
            let safe = !is_in_check(&scratch, color);
            scratch.unmake_move(from, to, captured);
            safe
        })
        .collect()
}
