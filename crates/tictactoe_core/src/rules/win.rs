//! Win detection logic for tic-tac-toe.

use crate::types::{Board, Cell, Mark, WIN_LINES};

/// Returns the first completed line in canonical order and its mark.
///
/// Rows are scanned before columns, columns before diagonals.
pub fn winning_line(board: &Board) -> Option<([usize; 3], Mark)> {
    WIN_LINES.iter().find_map(|&[a, b, c]| {
        let cell = board.get(a)?;
        match cell {
            Cell::Occupied(mark) if board.get(b) == Some(cell) && board.get(c) == Some(cell) => {
                Some(([a, b, c], mark))
            }
            _ => None,
        }
    })
}

/// Returns the mark with three in a row, if any.
pub fn check_winner(board: &Board) -> Option<Mark> {
    winning_line(board).map(|(_, mark)| mark)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn board_of(marks: &[(usize, Mark)]) -> Board {
        let mut board = Board::new();
        for &(index, mark) in marks {
            board.set(index, Cell::Occupied(mark));
        }
        board
    }

    #[test]
    fn test_no_winner_empty_board() {
        assert_eq!(check_winner(&Board::new()), None);
    }

    #[test]
    fn test_winner_top_row() {
        let board = board_of(&[(0, Mark::X), (1, Mark::X), (2, Mark::X)]);
        assert_eq!(winning_line(&board), Some(([0, 1, 2], Mark::X)));
    }

    #[test]
    fn test_winner_anti_diagonal() {
        let board = board_of(&[(2, Mark::O), (4, Mark::O), (6, Mark::O)]);
        assert_eq!(winning_line(&board), Some(([2, 4, 6], Mark::O)));
    }

    #[test]
    fn test_no_winner_mixed_line() {
        let board = board_of(&[(0, Mark::X), (1, Mark::O), (2, Mark::X)]);
        assert_eq!(check_winner(&board), None);
    }

    #[test]
    fn test_row_reported_before_column() {
        // X completes both row 0 and column 0.
        let board = board_of(&[
            (0, Mark::X),
            (1, Mark::X),
            (2, Mark::X),
            (3, Mark::X),
            (6, Mark::X),
        ]);
        assert_eq!(winning_line(&board), Some(([0, 1, 2], Mark::X)));
    }
}
