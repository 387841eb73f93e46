//! Computer opponent.
//!
//! Exhaustive minimax over the 3x3 board with terminal-only scores, plus a
//! [`Throttle`] that occasionally swaps the searched move for a random one so
//! the computer stays beatable.

use crate::error::EngineError;
use crate::rules;
use crate::types::{Board, Cell, Mark};
use rand::SeedableRng;
use rand::rngs::SmallRng;
use rand::seq::IndexedRandom;
use rand::Rng;
use tracing::{debug, instrument};

/// Score of a position the computer has won.
pub const WIN_SCORE: i32 = 10;

/// Score of a position the human has won.
pub const LOSS_SCORE: i32 = -10;

/// Score of a drawn position.
pub const DRAW_SCORE: i32 = 0;

/// Default probability of playing a random move instead of searching.
pub const DEFAULT_BLUNDER_RATE: f64 = 0.2;

/// Picks the minimax-optimal cell for `computer`.
///
/// Scores are not discounted by depth, so among equally scored moves the
/// lowest index wins. Returns `None` on a full board. `board` is never
/// modified; the search runs on a copy.
pub fn best_move(board: &Board, computer: Mark, human: Mark) -> Option<usize> {
    let mut scratch = *board;
    let mut best: Option<(usize, i32)> = None;

    for index in board.empty_cells() {
        scratch.set(index, Cell::Occupied(computer));
        let score = minimax(&mut scratch, computer, human, false);
        scratch.set(index, Cell::Empty);

        if best.is_none_or(|(_, best_score)| score > best_score) {
            best = Some((index, score));
        }
    }

    best.map(|(index, _)| index)
}

/// Value of `board` for `computer`, with `maximizing` telling whose move it is.
///
/// Cells set during the search are cleared before returning.
fn minimax(board: &mut Board, computer: Mark, human: Mark, maximizing: bool) -> i32 {
    if let Some(winner) = rules::check_winner(board) {
        return if winner == computer { WIN_SCORE } else { LOSS_SCORE };
    }
    if board.is_full() {
        return DRAW_SCORE;
    }

    let (mover, mut best) = if maximizing {
        (computer, i32::MIN)
    } else {
        (human, i32::MAX)
    };

    for index in 0..9 {
        if !board.is_empty(index) {
            continue;
        }
        board.set(index, Cell::Occupied(mover));
        let score = minimax(board, computer, human, !maximizing);
        board.set(index, Cell::Empty);

        best = if maximizing {
            best.max(score)
        } else {
            best.min(score)
        };
    }

    best
}

/// Source of deliberate mistakes.
pub trait Throttle {
    /// Returns a cell to play instead of searching, or `None` to search.
    ///
    /// `empty` lists the empty cells in ascending order and is never empty.
    fn override_move(&mut self, empty: &[usize]) -> Option<usize>;
}

/// Never overrides: the engine always plays the searched move.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoThrottle;

impl Throttle for NoThrottle {
    fn override_move(&mut self, _empty: &[usize]) -> Option<usize> {
        None
    }
}

/// Plays a uniformly random empty cell with probability `rate`.
#[derive(Debug, Clone)]
pub struct RandomThrottle<R> {
    rate: f64,
    rng: R,
}

impl<R: Rng> RandomThrottle<R> {
    /// Creates a throttle drawing from `rng`.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::InvalidRate`] unless `0.0 <= rate <= 1.0`.
    pub fn new(rate: f64, rng: R) -> Result<Self, EngineError> {
        if !(0.0..=1.0).contains(&rate) {
            return Err(EngineError::InvalidRate(rate));
        }
        Ok(Self { rate, rng })
    }

    /// Probability of a random move.
    pub fn rate(&self) -> f64 {
        self.rate
    }
}

impl RandomThrottle<SmallRng> {
    /// Reproducible throttle from a fixed seed.
    pub fn seeded(rate: f64, seed: u64) -> Result<Self, EngineError> {
        Self::new(rate, SmallRng::seed_from_u64(seed))
    }

    /// Throttle seeded from the operating system.
    pub fn from_os(rate: f64) -> Result<Self, EngineError> {
        Self::new(rate, SmallRng::from_os_rng())
    }
}

impl<R: Rng> Throttle for RandomThrottle<R> {
    fn override_move(&mut self, empty: &[usize]) -> Option<usize> {
        if self.rng.random_bool(self.rate) {
            empty.choose(&mut self.rng).copied()
        } else {
            None
        }
    }
}

/// The computer player: a mark pairing plus a throttle.
#[derive(Debug, Clone)]
pub struct DecisionEngine<T> {
    computer: Mark,
    human: Mark,
    throttle: T,
}

impl<T: Throttle> DecisionEngine<T> {
    /// Creates an engine playing `computer` against `human`.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::SameMark`] when both marks are equal.
    pub fn new(computer: Mark, human: Mark, throttle: T) -> Result<Self, EngineError> {
        if computer == human {
            return Err(EngineError::SameMark(computer));
        }
        Ok(Self {
            computer,
            human,
            throttle,
        })
    }

    /// Engine playing `computer` against the other mark.
    pub fn playing(computer: Mark, throttle: T) -> Self {
        Self {
            computer,
            human: computer.opponent(),
            throttle,
        }
    }

    /// The mark the engine plays.
    pub fn computer(&self) -> Mark {
        self.computer
    }

    /// The mark the engine plays against.
    pub fn human(&self) -> Mark {
        self.human
    }

    /// Chooses the engine's next cell. Returns `None` on a full board.
    #[instrument(skip(self, board), fields(computer = ?self.computer))]
    pub fn choose_move(&mut self, board: &Board) -> Option<usize> {
        let empty = board.empty_cells();
        if empty.is_empty() {
            return None;
        }

        if let Some(index) = self.throttle.override_move(&empty) {
            debug!(index, "Throttle picked a random move");
            return Some(index);
        }

        let index = best_move(board, self.computer, self.human);
        debug!(?index, "Search picked a move");
        index
    }
}
