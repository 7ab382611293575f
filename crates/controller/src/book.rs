//! The opening book: a bundled table of weighted first moves, sampled
//! when an AI side opens the game.
//!
//! Two JSON shapes are accepted. The dual-side form carries separate
//! `red` and `black` tables and is preferred; the single-side form
//! carries only red candidates under `start`, and black's table is
//! derived by reflecting each move vertically.

use once_cell::sync::Lazy;
use rand::Rng;
use rules::Color;
use serde::Deserialize;

const BUNDLED_BOOK: &str = include_str!("../assets/openings.json");

/// The parsed bundled book, loaded once on first use.
pub static OPENING_BOOK: Lazy<OpeningBook> = Lazy::new(|| {
    OpeningBook::from_json(BUNDLED_BOOK).unwrap_or_else(|err| {
        log::warn!("could not load the bundled opening book: {err}");
        OpeningBook::default()
    })
});

#[derive(Debug, Clone, Deserialize)]
pub struct BookMove {
    #[serde(rename = "move")]
    pub uci: String,
    pub count: u64,
}

#[derive(Debug, Deserialize)]
struct BookFile {
    #[serde(default)]
    start: Vec<BookMove>,
    #[serde(default)]
    red: Vec<BookMove>,
    #[serde(default)]
    black: Vec<BookMove>,
}

#[derive(Debug, Default)]
pub struct OpeningBook {
    red: Vec<BookMove>,
    black: Vec<BookMove>,
}

impl OpeningBook {
    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        let file: BookFile = serde_json::from_str(text)?;
        if !file.red.is_empty() || !file.black.is_empty() {
            return Ok(Self {
                red: file.red,
                black: file.black,
            });
        }
        let black = file.start.iter().map(reflect).collect();
        Ok(Self {
            red: file.start,
            black,
        })
    }

    pub fn candidates(&self, color: Color) -> &[BookMove] {
        match color {
            Color::Red => &self.red,
            Color::Black => &self.black,
        }
    }

    /// Count-weighted selection: a uniform roll in [0, Σcount) is mapped
    /// onto the candidate whose cumulative count range covers it.
    pub fn pick(candidates: &[BookMove], roll: u64) -> Option<&str> {
        let mut cumulative = 0;
        for candidate in candidates {
            cumulative += candidate.count;
            if roll < cumulative {
                return Some(&candidate.uci);
            }
        }
        None
    }

    pub fn sample(&self, color: Color, rng: &mut impl Rng) -> Option<String> {
        let candidates = self.candidates(color);
        let total: u64 = candidates.iter().map(|c| c.count).sum();
        if total == 0 {
            return None;
        }
        let roll = rng.gen_range(0..total);
        Self::pick(candidates, roll).map(str::to_string)
    }
}

/// Reflects a UCI move vertically (rank r becomes 9 - r on both
/// endpoints), turning a red book line into its black counterpart.
fn reflect(entry: &BookMove) -> BookMove {
    let mut bytes = entry.uci.clone().into_bytes();
    if bytes.len() == 4 {
        for idx in [1, 3] {
            if bytes[idx].is_ascii_digit() {
                bytes[idx] = b'0' + (9 - (bytes[idx] - b'0'));
            }
        }
    }
    BookMove {
        uci: String::from_utf8(bytes).unwrap_or_else(|_| entry.uci.clone()),
        count: entry.count,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn weighted_pick_is_deterministic() {
        let candidates = vec![
            BookMove {
                uci: "h2e2".into(),
                count: 3,
            },
            BookMove {
                uci: "b2e2".into(),
                count: 1,
            },
        ];
        assert_eq!(OpeningBook::pick(&candidates, 0), Some("h2e2"));
        assert_eq!(OpeningBook::pick(&candidates, 2), Some("h2e2"));
        assert_eq!(OpeningBook::pick(&candidates, 3), Some("b2e2"));
        assert_eq!(OpeningBook::pick(&candidates, 4), None);
    }

    #[test]
    fn single_side_books_reflect_for_black() {
        let book =
            OpeningBook::from_json(r#"{"start": [{"move": "b2e2", "count": 10}]}"#).unwrap();
        assert_eq!(book.candidates(Color::Red)[0].uci, "b2e2");
        assert_eq!(book.candidates(Color::Black)[0].uci, "b7e7");
    }

    #[test]
    fn dual_side_books_are_preferred() {
        let book = OpeningBook::from_json(
            r#"{"start": [{"move": "a0a1", "count": 1}],
                "red": [{"move": "h2e2", "count": 5}],
                "black": [{"move": "h7e7", "count": 5}]}"#,
        )
        .unwrap();
        assert_eq!(book.candidates(Color::Red)[0].uci, "h2e2");
        assert_eq!(book.candidates(Color::Black)[0].uci, "h7e7");
    }

    #[test]
    fn bundled_book_parses_and_samples() {
        let mut rng = rand::thread_rng();
        let red = OPENING_BOOK.sample(Color::Red, &mut rng).unwrap();
        assert_eq!(red.len(), 4);
        let black = OPENING_BOOK.sample(Color::Black, &mut rng).unwrap();
        assert_eq!(black.len(), 4);
    }
}
