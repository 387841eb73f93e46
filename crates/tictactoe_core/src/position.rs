//! Named board positions.

use serde::{Deserialize, Serialize};
use strum::IntoEnumIterator;

/// A position on the board, row-major (`TopLeft` is index 0).
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum::EnumIter, strum::Display,
)]
pub enum Position {
    /// Top-left (index 0)
    #[strum(to_string = "Top-left")]
    TopLeft,
    /// Top-center (index 1)
    #[strum(to_string = "Top-center")]
    TopCenter,
    /// Top-right (index 2)
    #[strum(to_string = "Top-right")]
    TopRight,
    /// Middle-left (index 3)
    #[strum(to_string = "Middle-left")]
    MiddleLeft,
    /// Center (index 4)
    #[strum(to_string = "Center")]
    Center,
    /// Middle-right (index 5)
    #[strum(to_string = "Middle-right")]
    MiddleRight,
    /// Bottom-left (index 6)
    #[strum(to_string = "Bottom-left")]
    BottomLeft,
    /// Bottom-center (index 7)
    #[strum(to_string = "Bottom-center")]
    BottomCenter,
    /// Bottom-right (index 8)
    #[strum(to_string = "Bottom-right")]
    BottomRight,
}

impl Position {
    /// Converts to a board index (0-8).
    pub fn to_index(self) -> usize {
        self as usize
    }

    /// Creates a position from a board index.
    pub fn from_index(index: usize) -> Option<Self> {
        Self::iter().nth(index)
    }

    /// Row (0-2).
    pub fn row(self) -> usize {
        self.to_index() / 3
    }

    /// Column (0-2).
    pub fn col(self) -> usize {
        self.to_index() % 3
    }

    /// Parses a keypad number `1`-`9` or a case-insensitive label.
    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim();
        if let Ok(number) = s.parse::<usize>() {
            return number.checked_sub(1).and_then(Self::from_index);
        }
        let wanted = s.to_lowercase();
        Self::iter().find(|pos| pos.to_string().to_lowercase() == wanted)
    }

    /// Neighbour one step in the given direction, staying on the board.
    pub fn step(self, d_row: isize, d_col: isize) -> Self {
        let row = (self.row() as isize + d_row).clamp(0, 2) as usize;
        let col = (self.col() as isize + d_col).clamp(0, 2) as usize;
        Self::from_index(row * 3 + col).unwrap_or(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_index_round_trip_covers_board() {
        let indices: Vec<_> = Position::iter().map(Position::to_index).collect();
        assert_eq!(indices, (0..9).collect::<Vec<_>>());
        assert_eq!(Position::from_index(9), None);
    }

    #[test]
    fn test_parse_number_and_label() {
        assert_eq!(Position::parse("1"), Some(Position::TopLeft));
        assert_eq!(Position::parse("9"), Some(Position::BottomRight));
        assert_eq!(Position::parse("0"), None);
        assert_eq!(Position::parse("center"), Some(Position::Center));
        assert_eq!(Position::parse("Bottom-left"), Some(Position::BottomLeft));
    }

    #[test]
    fn test_step_clamps_at_edges() {
        assert_eq!(Position::TopLeft.step(-1, 0), Position::TopLeft);
        assert_eq!(Position::TopLeft.step(0, 1), Position::TopCenter);
        assert_eq!(Position::Center.step(1, 1), Position::BottomRight);
    }
}
