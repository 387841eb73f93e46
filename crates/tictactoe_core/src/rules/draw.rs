//! Draw detection logic for tic-tac-toe.

use super::win::check_winner;
use crate::types::Board;

/// Checks if the board is full (all cells occupied).
pub fn is_full(board: &Board) -> bool {
    board.is_full()
}

/// A full board with no completed line.
pub fn is_draw(board: &Board) -> bool {
    is_full(board) && check_winner(board).is_none()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Cell, Mark};

    fn board_from(layout: &str) -> Board {
        let mut board = Board::new();
        for (index, symbol) in layout.chars().enumerate() {
            let cell = match symbol {
                'X' => Cell::Occupied(Mark::X),
                'O' => Cell::Occupied(Mark::O),
                _ => Cell::Empty,
            };
            board.set(index, cell);
        }
        board
    }

    #[test]
    fn test_empty_board_not_full() {
        assert!(!is_full(&Board::new()));
    }

    #[test]
    fn test_draw_detection() {
        // X O X / O X X / O X O
        assert!(is_draw(&board_from("XOXOXXOXO")));
    }

    #[test]
    fn test_not_draw_if_winner() {
        // X X X / O O X / O X O
        let board = board_from("XXXOOXOXO");
        assert!(is_full(&board));
        assert!(!is_draw(&board));
    }

    #[test]
    fn test_partial_board_not_draw() {
        assert!(!is_draw(&board_from("XO.......")));
    }
}
