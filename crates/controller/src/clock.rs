//! Per-side turn clocks.
//!
//! Accounting is per move completion: the currently ticking side is
//! implicit from the turn, elapsed time is added to the mover's total
//! when the move commits, and rejected moves accrue to nobody. Undo
//! does not refund time.

use rules::Color;
use std::time::{Duration, Instant};

#[derive(Debug, Clone)]
pub struct GameClock {
    red_total: Duration,
    black_total: Duration,
    turn_started: Instant,
}

impl GameClock {
    pub fn new() -> Self {
        Self {
            red_total: Duration::ZERO,
            black_total: Duration::ZERO,
            turn_started: Instant::now(),
        }
    }

    /// Credits the elapsed move time to `mover` and restarts the clock
    /// for the next turn. Returns what was credited.
    pub fn roll_over(&mut self, mover: Color) -> Duration {
        let elapsed = self.turn_started.elapsed();
        match mover {
            Color::Red => self.red_total += elapsed,
            Color::Black => self.black_total += elapsed,
        }
        self.turn_started = Instant::now();
        elapsed
    }

    /// Time spent so far on the move in progress.
    pub fn current_elapsed(&self) -> Duration {
        self.turn_started.elapsed()
    }

    pub fn total(&self, color: Color) -> Duration {
        match color {
            Color::Red => self.red_total,
            Color::Black => self.black_total,
        }
    }

    pub fn reset(&mut self) {
        *self = Self::new();
    }
}

impl Default for GameClock {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roll_over_credits_the_mover() {
        let mut clock = GameClock::new();
        std::thread::sleep(Duration::from_millis(5));
        let credited = clock.roll_over(Color::Red);
        assert!(credited >= Duration::from_millis(5));
        assert_eq!(clock.total(Color::Red), credited);
        assert_eq!(clock.total(Color::Black), Duration::ZERO);
    }

    #[test]
    fn reset_zeroes_both_sides() {
        let mut clock = GameClock::new();
        clock.roll_over(Color::Red);
        clock.roll_over(Color::Black);
        clock.reset();
        assert_eq!(clock.total(Color::Red), Duration::ZERO);
        assert_eq!(clock.total(Color::Black), Duration::ZERO);
    }
}
