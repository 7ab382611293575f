//! FEN parsing and serialization for 9x10 Xiangqi boards, with the
//! identity-preserving reparse used to keep piece ids stable across
//! position reloads.

use crate::board::{Board, Piece};
use crate::constants::{Color, PieceKind, FILE_COUNT, RANK_COUNT};
use std::collections::HashSet;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FenError {
    #[error("missing FEN field: {0}")]
    MissingField(&'static str),

    #[error("unknown piece character: {0:?}")]
    BadPieceChar(char),

    #[error("expected 10 rank segments, found {0}")]
    BadRankCount(usize),

    #[error("rank segment {rank} covers {files} files")]
    BadFileCount { rank: usize, files: usize },

    #[error("unknown turn field: {0:?}")]
    BadTurn(String),
}

/// The result of parsing a FEN string.
#[derive(Debug, Clone)]
pub struct ParsedFen {
    pub pieces: Vec<Piece>,
    pub turn: Color,
    pub halfmove: u32,
    pub fullmove: u32,
}

impl ParsedFen {
    pub fn into_board(self) -> Board {
        Board::new(self.pieces)
    }
}

/// Parses a FEN string, assigning ids in reading order (the cardinal
/// index of each piece).
pub fn parse(fen: &str) -> Result<ParsedFen, FenError> {
    parse_with_identity(fen, &[])
}

/// Parses a FEN string, reusing ids from a previous piece set where the
/// new position can be matched against it:
///
/// 1. an exact (kind, colour, file, rank) match reuses that id;
/// 2. otherwise the nearest unmatched piece of the same kind and colour
///    (Manhattan distance, lowest id on ties) donates its id;
/// 3. otherwise a fresh id is assigned: the piece's cardinal index when
///    free, else a monotonic counter above every id seen.
pub fn parse_with_identity(fen: &str, previous: &[Piece]) -> Result<ParsedFen, FenError> {
    let mut fields = fen.split_whitespace();
    let layout = fields.next().ok_or(FenError::MissingField("position"))?;
    let turn_field = fields.next().ok_or(FenError::MissingField("turn"))?;
    // Castling and en-passant are always "-" in Xiangqi; accept and skip.
    let _castling = fields.next();
    let _en_passant = fields.next();
    let halfmove = fields.next().and_then(|s| s.parse().ok()).unwrap_or(0);
    let fullmove = fields.next().and_then(|s| s.parse().ok()).unwrap_or(1);

    let turn = match turn_field {
        t if t.len() == 1 => Color::from_fen_char(t.chars().next().unwrap())
            .ok_or_else(|| FenError::BadTurn(turn_field.to_string()))?,
        _ => return Err(FenError::BadTurn(turn_field.to_string())),
    };

    let placed = parse_layout(layout)?;
    let pieces = assign_identities(placed, previous);

    Ok(ParsedFen {
        pieces,
        turn,
        halfmove,
        fullmove,
    })
}

/// Serializes the live piece set back to a FEN string.
pub fn serialize(board: &Board, turn: Color, halfmove: u32, fullmove: u32) -> String {
    let mut fen = String::with_capacity(96);
    for rank in 0..RANK_COUNT {
        let mut empty_run = 0;
        for file in 0..FILE_COUNT {
            match board.piece_at(file, rank) {
                Some(piece) => {
                    if empty_run > 0 {
                        fen.push(char::from_digit(empty_run, 10).unwrap());
                        empty_run = 0;
                    }
                    fen.push(piece.kind.to_fen_char(piece.color));
                }
                None => empty_run += 1,
            }
        }
        if empty_run > 0 {
            fen.push(char::from_digit(empty_run, 10).unwrap());
        }
        if rank < RANK_COUNT - 1 {
            fen.push('/');
        }
    }
    fen.push(' ');
    fen.push(turn.to_fen_char());
    fen.push_str(&format!(" - - {} {}", halfmove, fullmove));
    fen
}

fn parse_layout(layout: &str) -> Result<Vec<(PieceKind, Color, u8, u8)>, FenError> {
    let segments: Vec<&str> = layout.split('/').collect();
    if segments.len() != RANK_COUNT as usize {
        return Err(FenError::BadRankCount(segments.len()));
    }

    let mut placed = Vec::with_capacity(32);
    for (rank, segment) in segments.iter().enumerate() {
        let mut file = 0usize;
        for ch in segment.chars() {
            if let Some(run) = ch.to_digit(10) {
                file += run as usize;
            } else {
                let (kind, color) =
                    PieceKind::from_fen_char(ch).ok_or(FenError::BadPieceChar(ch))?;
                if file >= FILE_COUNT as usize {
                    return Err(FenError::BadFileCount { rank, files: file + 1 });
                }
                placed.push((kind, color, file as u8, rank as u8));
                file += 1;
            }
        }
        if file != FILE_COUNT as usize {
            return Err(FenError::BadFileCount { rank, files: file });
        }
    }
    Ok(placed)
}

fn assign_identities(placed: Vec<(PieceKind, Color, u8, u8)>, previous: &[Piece]) -> Vec<Piece> {
    let mut pool: Vec<&Piece> = previous.iter().collect();
    let mut assigned: Vec<Option<u32>> = vec![None; placed.len()];

    // Pass 1: exact square matches keep their id.
    for (idx, &(kind, color, file, rank)) in placed.iter().enumerate() {
        if let Some(pos) = pool
            .iter()
            .position(|p| p.kind == kind && p.color == color && p.is_at(file, rank))
        {
            assigned[idx] = Some(pool.swap_remove(pos).id);
        }
    }

    // Pass 2: nearest unmatched piece of the same kind and colour.
    for (idx, &(kind, color, file, rank)) in placed.iter().enumerate() {
        if assigned[idx].is_some() {
            continue;
        }
        let best = pool
            .iter()
            .enumerate()
            .filter(|(_, p)| p.kind == kind && p.color == color)
            .min_by_key(|(_, p)| {
                let distance = (p.file as i32 - file as i32).abs()
                    + (p.rank as i32 - rank as i32).abs();
                (distance, p.id)
            })
            .map(|(pos, _)| pos);
        if let Some(pos) = best {
            assigned[idx] = Some(pool.swap_remove(pos).id);
        }
    }

    // Pass 3: fresh ids. The cardinal index is preferred; on collision
    // with any id still in play, a monotonic counter takes over.
    let mut used: HashSet<u32> = previous.iter().map(|p| p.id).collect();
    used.extend(assigned.iter().flatten().copied());
    let mut next_fresh = used.iter().max().map_or(0, |max| max + 1);

    placed
        .into_iter()
        .enumerate()
        .map(|(idx, (kind, color, file, rank))| {
            let id = assigned[idx].unwrap_or_else(|| {
                let candidate = idx as u32;
                let id = if used.contains(&candidate) {
                    let id = next_fresh;
                    next_fresh += 1;
                    id
                } else {
                    candidate
                };
                used.insert(id);
                id
            });
            Piece {
                id,
                kind,
                color,
                file,
                rank,
            }
        })
        .collect()
}
