//! Structural invariants of a [`GameSession`].
//!
//! Checked after every accepted move in debug builds. Violations are logged,
//! never raised.

use crate::rules;
use crate::session::GameSession;
use crate::types::{Cell, GameStatus, Mark};
use tracing::error;

/// A logical property that must hold for a given state.
pub trait Invariant<S> {
    /// Checks if the invariant holds for the given state.
    fn holds(state: &S) -> bool;

    /// Human-readable description of the invariant.
    fn description() -> &'static str;
}

/// A set of invariants checked together. Implemented for tuples.
pub trait InvariantSet<S> {
    /// Returns the descriptions of every violated invariant.
    fn check_all(state: &S) -> Result<(), Vec<&'static str>>;
}

impl<S, I1, I2, I3> InvariantSet<S> for (I1, I2, I3)
where
    I1: Invariant<S>,
    I2: Invariant<S>,
    I3: Invariant<S>,
{
    fn check_all(state: &S) -> Result<(), Vec<&'static str>> {
        let violations: Vec<_> = [
            (I1::holds(state), I1::description()),
            (I2::holds(state), I2::description()),
            (I3::holds(state), I3::description()),
        ]
        .into_iter()
        .filter(|(holds, _)| !holds)
        .map(|(_, description)| description)
        .collect();

        if violations.is_empty() {
            Ok(())
        } else {
            Err(violations)
        }
    }
}

/// X and O counts never differ by more than one.
pub struct BalancedMarks;

impl Invariant<GameSession> for BalancedMarks {
    fn holds(session: &GameSession) -> bool {
        session.board().count(Mark::X).abs_diff(session.board().count(Mark::O)) <= 1
    }

    fn description() -> &'static str {
        "Mark counts differ by at most one"
    }
}

/// Every recorded move is still on the board, each cell at most once, and
/// every occupied cell is either recorded or preset.
pub struct HistoryOnBoard;

impl Invariant<GameSession> for HistoryOnBoard {
    fn holds(session: &GameSession) -> bool {
        let board = session.board();
        let occupied = board.count(Mark::X) + board.count(Mark::O);
        if session.history().len() + session.preset_marks() != occupied {
            return false;
        }
        let mut seen = [false; 9];
        session.history().iter().all(|mv| {
            let fresh = !std::mem::replace(&mut seen[mv.index], true);
            fresh && board.get(mv.index) == Some(Cell::Occupied(mv.mark))
        })
    }

    fn description() -> &'static str {
        "History matches the board"
    }
}

/// Status agrees with what the rules say about the board.
pub struct StatusMatchesBoard;

impl Invariant<GameSession> for StatusMatchesBoard {
    fn holds(session: &GameSession) -> bool {
        let board = session.board();
        match session.status() {
            GameStatus::Won(mark) => rules::check_winner(board) == Some(mark),
            GameStatus::Draw => rules::is_draw(board),
            GameStatus::InProgress => rules::check_winner(board).is_none() && !board.is_full(),
        }
    }

    fn description() -> &'static str {
        "Status agrees with the board"
    }
}

/// All session invariants.
pub type SessionInvariants = (BalancedMarks, HistoryOnBoard, StatusMatchesBoard);

/// Logs any violated invariant (debug builds only).
pub(crate) fn debug_check(session: &GameSession) {
    if cfg!(debug_assertions) {
        if let Err(violations) = SessionInvariants::check_all(session) {
            error!(?violations, "Session invariants violated");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Board, TurnPointer};
    use crate::StartMode;

    #[test]
    fn test_invariants_hold_through_a_game() {
        let mut session = GameSession::new();
        for (index, mark) in [(4, Mark::X), (0, Mark::O), (8, Mark::X), (2, Mark::O)] {
            session.apply_move(index, mark).unwrap();
            assert!(SessionInvariants::check_all(&session).is_ok());
        }
    }

    #[test]
    fn test_unbalanced_snapshot_detected() {
        let mut board = Board::new();
        board.set(0, Cell::Occupied(Mark::X));
        board.set(1, Cell::Occupied(Mark::X));
        let session = GameSession::from_snapshot(board, TurnPointer::Mark(Mark::O), StartMode::XFirst);
        let violations = SessionInvariants::check_all(&session).unwrap_err();
        assert_eq!(violations, vec![BalancedMarks::description()]);
    }

    #[test]
    fn test_snapshot_marks_count_toward_history() {
        let mut board = Board::new();
        board.set(4, Cell::Occupied(Mark::X));
        let mut session =
            GameSession::from_snapshot(board, TurnPointer::Mark(Mark::O), StartMode::XFirst);
        assert_eq!(session.preset_marks(), 1);
        session.apply_move(0, Mark::O).unwrap();
        assert!(SessionInvariants::check_all(&session).is_ok());
    }

    #[test]
    fn test_unrecorded_mark_detected() {
        let mut session = GameSession::new();
        session.apply_move(4, Mark::X).unwrap();

        let mut value = serde_json::to_value(&session).unwrap();
        value["board"][0] = serde_json::json!("O");
        let forged: GameSession = serde_json::from_value(value).unwrap();
        assert!(!HistoryOnBoard::holds(&forged));
    }
}
