//! Move records and the UCI move notation.
//!
//! A UCI move is four characters, files 'a'..'i' and ranks '0'..'9',
//! where rank 0 is red's baseline. Internally rank 0 is black's back
//! row, so UCI-rank = 9 - internal-rank.

use crate::constants::PieceKind;
use crate::validator::MoveError;

/// Renders a square as UCI text, e.g. (1, 7) -> "b2".
pub fn square_to_uci(file: u8, rank: u8) -> String {
    format!("{}{}", (b'a' + file) as char, 9 - rank)
}

/// Renders a from/to pair as a 4-character UCI move.
pub fn move_to_uci(from: (u8, u8), to: (u8, u8)) -> String {
    format!(
        "{}{}",
        square_to_uci(from.0, from.1),
        square_to_uci(to.0, to.1)
    )
}

/// Parses a 4-character UCI move into internal (file, rank) endpoints.
pub fn parse_uci(text: &str) -> Result<((u8, u8), (u8, u8)), MoveError> {
    let bytes = text.trim().as_bytes();
    if bytes.len() != 4 {
        return Err(MoveError::BadUci(text.to_string()));
    }
    let square = |file_ch: u8, rank_ch: u8| -> Result<(u8, u8), MoveError> {
        if !(b'a'..=b'i').contains(&file_ch) || !rank_ch.is_ascii_digit() {
            return Err(MoveError::BadUci(text.to_string()));
        }
        Ok((file_ch - b'a', 9 - (rank_ch - b'0')))
    };
    Ok((square(bytes[0], bytes[1])?, square(bytes[2], bytes[3])?))
}

/// A completed move as stored in the game history.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoveRecord {
    pub from: (u8, u8),
    pub to: (u8, u8),
    pub captured: Option<PieceKind>,
}

impl MoveRecord {
    pub fn uci(&self) -> String {
        move_to_uci(self.from, self.to)
    }

    /// History notation with a capture marker, e.g. "b2-e2" or "b2xe2".
    pub fn annotated(&self) -> String {
        let marker = if self.captured.is_some() { 'x' } else { '-' };
        format!(
            "{}{}{}",
            square_to_uci(self.from.0, self.from.1),
            marker,
            square_to_uci(self.to.0, self.to.1)
        )
    }
}
