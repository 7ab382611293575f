//! Check detection by reverse attack scan from the king.

use crate::board::Board;
use crate::constants::{self, Color, PieceKind};
use crate::validator::horse_leg;

const ORTHOGONAL: [(i8, i8); 4] = [(0, 1), (0, -1), (1, 0), (-1, 0)];
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

/// Whether `side`'s king is currently attacked. Runs the reverse scan of
/// rook lines, cannon lines with one screen, horse geometries, pawn
/// adjacencies and the flying-general file. A missing king reports no
/// check; king absence is a terminal condition handled by the controller.
pub fn is_in_check(board: &Board, side: Color) -> bool {
    let Some(king) = board.king(side) else {
        return false;
    };
    let (kf, kr) = (king.file as i8, king.rank as i8);
    let enemy = side.opponent();

    // Rook: first occupied square on each orthogonal ray.
    for (df, dr) in ORTHOGONAL {
        if let Some(piece) = first_on_ray(board, (kf, kr), (df, dr)) {
            if piece.color == enemy && piece.kind == PieceKind::Rook {
                return true;
            }
        }
    }

    // Cannon: skip exactly one screen, then the next occupied square.
    for (df, dr) in ORTHOGONAL {
        if let Some(screen) = first_on_ray(board, (kf, kr), (df, dr)) {
            let behind = (screen.file as i8, screen.rank as i8);
            if let Some(piece) = first_on_ray(board, behind, (df, dr)) {
                if piece.color == enemy && piece.kind == PieceKind::Cannon {
                    return true;
                }
            }
        }
    }

    // Horse: the leg that matters is the one adjacent to the attacking
    // horse, not to the king.
    for (df, dr) in HORSE_STEPS {
        let (hf, hr) = (kf + df, kr + dr);
        if !constants::on_board(hf, hr) {
            continue;
        }
        let Some(piece) = board.piece_at(hf as u8, hr as u8) else {
            continue;
        };
        if piece.color != enemy || piece.kind != PieceKind::Horse {
            continue;
        }
        let leg = horse_leg((hf as u8, hr as u8), (-df, -dr));
        if board.is_empty_square(leg.0, leg.1) {
            return true;
        }
    }

    // Pawn: one square ahead of the king from the enemy pawn's marching
    // direction, plus the two laterals once the pawn has crossed.
    let enemy_forward = enemy.forward();
    let ahead = (kf, kr - enemy_forward);
    if constants::on_board(ahead.0, ahead.1) {
        if let Some(piece) = board.piece_at(ahead.0 as u8, ahead.1 as u8) {
            if piece.color == enemy && piece.kind == PieceKind::Pawn {
                return true;
            }
        }
    }
    for side_file in [kf - 1, kf + 1] {
        if !constants::on_board(side_file, kr) {
            continue;
        }
        if let Some(piece) = board.piece_at(side_file as u8, kr as u8) {
            if piece.color == enemy
                && piece.kind == PieceKind::Pawn
                && constants::crossed_river(enemy, piece.rank)
            {
                return true;
            }
        }
    }

    // Flying general: first piece up the king's file toward the opposing
    // palace is the enemy king.
    if let Some(piece) = first_on_ray(board, (kf, kr), (0, side.forward())) {
        if piece.kind == PieceKind::King && piece.color == enemy {
            return true;
        }
    }

    false
}

fn first_on_ray(
    board: &Board,
    from: (i8, i8),
    step: (i8, i8),
) -> Option<&crate::board::Piece> {
    let (mut file, mut rank) = (from.0 + step.0, from.1 + step.1);
    while constants::on_board(file, rank) {
        if let Some(piece) = board.piece_at(file as u8, rank as u8) {
            return Some(piece);
        }
        file += step.0;
        rank += step.1;
    }
    None
}
