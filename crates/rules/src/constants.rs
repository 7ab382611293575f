//! Piece kinds, colours and board geometry constants.

use serde::{Deserialize, Serialize};

/// The standard Xiangqi starting position.
pub const START_FEN: &str =
    "rnbakabnr/9/1c5c1/p1p1p1p1p/9/9/P1P1P1P1P/1C5C1/9/RNBAKABNR w - - 0 1";

pub const FILE_COUNT: u8 = 9;
pub const RANK_COUNT: u8 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PieceKind {
    King,
    Advisor,
    Elephant,
    Horse,
    Rook,
    Cannon,
    Pawn,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Color {
    Red,
    Black,
}

// --- Piece Base Values ---
// Kept from the classical material table; the king carries a dummy value
// because legal move generation never lets him be captured.
pub const PIECE_VALUES: [i32; 7] = [
    0,   // KING
    100, // ADVISOR
    100, // ELEPHANT
    450, // HORSE
    900, // ROOK
    500, // CANNON
    100, // PAWN
];

impl PieceKind {
    /// Get the material value of a piece kind.
    pub fn value(self) -> i32 {
        PIECE_VALUES[self as usize]
    }

    pub fn is_major(self) -> bool {
        matches!(self, PieceKind::Rook | PieceKind::Horse | PieceKind::Cannon)
    }

    pub fn to_fen_char(self, color: Color) -> char {
        let ch = match self {
            PieceKind::King => 'k',
            PieceKind::Advisor => 'a',
            PieceKind::Elephant => 'b',
            PieceKind::Horse => 'n',
            PieceKind::Rook => 'r',
            PieceKind::Cannon => 'c',
            PieceKind::Pawn => 'p',
        };
        match color {
            Color::Red => ch.to_ascii_uppercase(),
            Color::Black => ch,
        }
    }

    pub fn from_fen_char(c: char) -> Option<(PieceKind, Color)> {
        let kind = match c.to_ascii_lowercase() {
            'k' => PieceKind::King,
            'a' => PieceKind::Advisor,
            'b' => PieceKind::Elephant,
            'n' => PieceKind::Horse,
            'r' => PieceKind::Rook,
            'c' => PieceKind::Cannon,
            'p' => PieceKind::Pawn,
            _ => return None,
        };
        let color = if c.is_ascii_uppercase() {
            Color::Red
        } else {
            Color::Black
        };
        Some((kind, color))
    }
}

impl Color {
    /// Get the opponent of the current colour.
    pub fn opponent(self) -> Color {
        match self {
            Color::Red => Color::Black,
            Color::Black => Color::Red,
        }
    }

    /// Rank delta of a forward step. Red advances toward rank 0,
    /// black toward rank 9.
    pub fn forward(self) -> i8 {
        match self {
            Color::Red => -1,
            Color::Black => 1,
        }
    }

    /// FEN turn field character ('w' is red by convention).
    pub fn to_fen_char(self) -> char {
        match self {
            Color::Red => 'w',
            Color::Black => 'b',
        }
    }

    pub fn from_fen_char(c: char) -> Option<Color> {
        match c {
            'w' => Some(Color::Red),
            'b' => Some(Color::Black),
            _ => None,
        }
    }
}

/// Whether (file, rank) lies on the 9x10 board.
pub fn on_board(file: i8, rank: i8) -> bool {
    file >= 0 && file < FILE_COUNT as i8 && rank >= 0 && rank < RANK_COUNT as i8
}

/// Whether (file, rank) lies inside the given colour's palace.
/// Files 3-5; ranks 0-2 for black, 7-9 for red.
pub fn in_palace(color: Color, file: i8, rank: i8) -> bool {
    if !(3..=5).contains(&file) {
        return false;
    }
    match color {
        Color::Red => (7..=9).contains(&rank),
        Color::Black => (0..=2).contains(&rank),
    }
}

/// Whether a piece of this colour standing on `rank` has crossed the river.
/// The river separates rank 4 (black side) and rank 5 (red side).
pub fn crossed_river(color: Color, rank: u8) -> bool {
    match color {
        Color::Red => rank <= 4,
        Color::Black => rank >= 5,
    }
}

/// Whether `rank` lies on this colour's own half of the board.
pub fn on_own_side(color: Color, rank: i8) -> bool {
    match color {
        Color::Red => (5..=9).contains(&rank),
        Color::Black => (0..=4).contains(&rank),
    }
}
