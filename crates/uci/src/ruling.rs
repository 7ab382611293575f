//! Rules-backed answers for the ruling half of the engine capability.
//!
//! Plain UCI has no legality or terminal-state queries, so both engine
//! implementations answer them from the rules crate. Unlike the
//! controller's local fallback validator, the rulings here apply the
//! full legality filter, including exposure of the mover's own king.

use crate::error::EngineResult;
use crate::service::LegalityRuling;
use rules::{check, fen, move_gen, moves, validator, Board, Color};

pub(crate) fn position(fen_text: &str) -> EngineResult<(Board, Color)> {
    let parsed = fen::parse(fen_text)?;
    let turn = parsed.turn;
    Ok((parsed.into_board(), turn))
}

pub(crate) fn rule_move(fen_text: &str, uci: &str) -> EngineResult<LegalityRuling> {
    let (board, turn) = position(fen_text)?;
    let (from, to) = match moves::parse_uci(uci) {
        Ok(endpoints) => endpoints,
        Err(err) => return Ok(LegalityRuling::illegal(err.to_string())),
    };
    let Some(piece) = board.piece_at(from.0, from.1).copied() else {
        return Ok(LegalityRuling::illegal(
            validator::MoveError::EmptyOrigin.to_string(),
        ));
    };
    if piece.color != turn {
        return Ok(LegalityRuling::illegal(
            validator::MoveError::WrongColor.to_string(),
        ));
    }
    if let Err(err) = validator::validate_move(&board, &piece, to) {
        return Ok(LegalityRuling::illegal(err.to_string()));
    }

    let mut scratch = board.clone();
    let captured = scratch.make_move(from, to);
    let exposed = check::is_in_check(&scratch, turn);
    scratch.unmake_move(from, to, captured);
    if exposed {
        return Ok(LegalityRuling::illegal("move leaves the king attackable"));
    }
    Ok(LegalityRuling::legal())
}

pub(crate) fn rule_legal_moves(fen_text: &str) -> EngineResult<Vec<String>> {
    let (board, turn) = position(fen_text)?;
    Ok(move_gen::legal_moves(&board, turn)
        .into_iter()
        .map(|(from, to)| moves::move_to_uci(from, to))
        .collect())
}

pub(crate) fn rule_in_check(fen_text: &str) -> EngineResult<bool> {
    let (board, turn) = position(fen_text)?;
    Ok(check::is_in_check(&board, turn))
}

pub(crate) fn rule_checkmate(fen_text: &str) -> EngineResult<bool> {
    let (board, turn) = position(fen_text)?;
    Ok(move_gen::legal_moves(&board, turn).is_empty() && check::is_in_check(&board, turn))
}

pub(crate) fn rule_stalemate(fen_text: &str) -> EngineResult<bool> {
    let (board, turn) = position(fen_text)?;
    Ok(move_gen::legal_moves(&board, turn).is_empty() && !check::is_in_check(&board, turn))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rules::START_FEN;

    #[test]
    fn rules_the_opening_cannon_move_legal() {
        let ruling = rule_move(START_FEN, "b2e2").unwrap();
        assert!(ruling.legal);
    }

    #[test]
    fn rejects_moves_by_the_wrong_side() {
        let ruling = rule_move(START_FEN, "b7e7").unwrap();
        assert!(!ruling.legal);
    }

    #[test]
    fn rejects_self_exposing_moves() {
        // The e1 horse shields the king from the e9 rook.
        let ruling = rule_move("4r4/9/9/9/9/9/9/9/4N4/4K4 w - - 0 1", "e1d3").unwrap();
        assert!(!ruling.legal);
        assert!(ruling.reason.unwrap().contains("attackable"));
    }

    #[test]
    fn terminal_queries_agree_with_move_counts() {
        assert_eq!(rule_legal_moves(START_FEN).unwrap().len(), 44);
        assert!(!rule_checkmate(START_FEN).unwrap());
        assert!(!rule_stalemate(START_FEN).unwrap());
    }
}
