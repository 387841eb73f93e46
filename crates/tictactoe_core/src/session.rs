//! The game state machine.
//!
//! A [`GameSession`] is an owned value: whoever holds authority over a game
//! (a local client, one side of a peer link, the relay server) owns one and
//! mutates it only through [`GameSession::apply_move`] and
//! [`GameSession::restart`].

use crate::error::MoveError;
use crate::invariants::debug_check;
use crate::rules;
use crate::types::{Board, CELL_COUNT, Cell, GameStatus, Mark, Move, Role, TurnPointer};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

/// How a fresh game picks its first mover.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum StartMode {
    /// X always opens.
    #[default]
    XFirst,
    /// Whichever mark moves first opens; the sequence is fixed from there.
    AnyoneStarts,
}

impl StartMode {
    /// Turn pointer of a fresh game in this mode.
    pub fn initial_turn(self) -> TurnPointer {
        match self {
            StartMode::XFirst => TurnPointer::Mark(Mark::X),
            StartMode::AnyoneStarts => TurnPointer::Unassigned,
        }
    }
}

/// Board, turn pointer and status for one game.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameSession {
    board: Board,
    turn: TurnPointer,
    status: GameStatus,
    history: Vec<Move>,
    winning_line: Option<[usize; 3]>,
    mode: StartMode,
    #[serde(default)]
    preset: usize,
}

impl GameSession {
    /// Creates a session where X opens.
    pub fn new() -> Self {
        Self::with_mode(StartMode::XFirst)
    }

    /// Creates a session with the given start mode.
    pub fn with_mode(mode: StartMode) -> Self {
        Self {
            board: Board::new(),
            turn: mode.initial_turn(),
            status: GameStatus::InProgress,
            history: Vec::new(),
            winning_line: None,
            mode,
            preset: 0,
        }
    }

    /// Rebuilds a session from a board snapshot, as sent by an authoritative
    /// server. History is unknown and left empty; the snapshot's marks are
    /// counted as preset. Status is recomputed.
    #[instrument(skip(board))]
    pub fn from_snapshot(board: Board, turn: TurnPointer, mode: StartMode) -> Self {
        let (status, winning_line) = match rules::winning_line(&board) {
            Some((line, mark)) => (GameStatus::Won(mark), Some(line)),
            None if board.is_full() => (GameStatus::Draw, None),
            None => (GameStatus::InProgress, None),
        };
        Self {
            board,
            turn,
            status,
            history: Vec::new(),
            winning_line,
            mode,
            preset: board.count(Mark::X) + board.count(Mark::O),
        }
    }

    /// Places `mark` at `index`.
    ///
    /// Returns the status after the move. A refused move leaves the session
    /// untouched.
    ///
    /// # Errors
    ///
    /// - [`MoveError::GameOver`] if the game is already won or drawn
    /// - [`MoveError::OutOfRange`] if `index > 8`
    /// - [`MoveError::Occupied`] if the cell holds a mark
    /// - [`MoveError::WrongTurn`] if `mark` is not the mark to move
    #[instrument(skip(self), fields(turn = ?self.turn))]
    pub fn apply_move(&mut self, index: usize, mark: Mark) -> Result<GameStatus, MoveError> {
        if let Err(e) = self.check_move(index, mark) {
            debug!(error = %e, "Move rejected");
            return Err(e);
        }

        self.board.set(index, Cell::Occupied(mark));
        self.history.push(Move::new(index, mark));

        if let Some((line, winner)) = rules::winning_line(&self.board) {
            self.status = GameStatus::Won(winner);
            self.winning_line = Some(line);
            info!(?winner, ?line, moves = self.history.len(), "Game won");
        } else if rules::is_full(&self.board) {
            self.status = GameStatus::Draw;
            info!(moves = self.history.len(), "Game drawn");
        } else {
            self.turn = TurnPointer::Mark(mark.opponent());
            debug!(next = ?self.turn, "Move accepted");
        }

        debug_check(self);
        Ok(self.status)
    }

    /// Preconditions of [`apply_move`](Self::apply_move), without applying.
    pub fn check_move(&self, index: usize, mark: Mark) -> Result<(), MoveError> {
        if self.status.is_terminal() {
            return Err(MoveError::GameOver);
        }
        if index >= CELL_COUNT {
            return Err(MoveError::OutOfRange(index));
        }
        if !self.board.is_empty(index) {
            return Err(MoveError::Occupied(index));
        }
        match self.turn {
            TurnPointer::Mark(expected) if expected != mark => {
                Err(MoveError::WrongTurn { expected, got: mark })
            }
            _ => Ok(()),
        }
    }

    /// Resets to a fresh game in the same start mode. Always succeeds.
    #[instrument(skip(self))]
    pub fn restart(&mut self) -> GameStatus {
        *self = Self::with_mode(self.mode);
        info!(mode = ?self.mode, "Game restarted");
        self.status
    }

    /// Whether `role` may submit a move right now.
    pub fn can_move(&self, role: Role) -> bool {
        match role.mark() {
            Some(mark) => self.is_running() && self.turn.admits(mark),
            None => false,
        }
    }

    /// Restarts a session in `mode` and replays `moves` in order.
    ///
    /// Stops at the first refused move.
    #[instrument(skip(moves), fields(count = moves.len()))]
    pub fn replay(mode: StartMode, moves: &[Move]) -> Result<Self, MoveError> {
        let mut session = Self::with_mode(mode);
        for mv in moves {
            session.apply_move(mv.index, mv.mark)?;
        }
        Ok(session)
    }

    /// The board.
    pub fn board(&self) -> &Board {
        &self.board
    }

    /// Whose turn it is.
    pub fn turn(&self) -> TurnPointer {
        self.turn
    }

    /// Current status.
    pub fn status(&self) -> GameStatus {
        self.status
    }

    /// True while moves are accepted.
    pub fn is_running(&self) -> bool {
        !self.status.is_terminal()
    }

    /// Moves applied since the last restart.
    pub fn history(&self) -> &[Move] {
        &self.history
    }

    /// The completed line, once won.
    pub fn winning_line(&self) -> Option<[usize; 3]> {
        self.winning_line
    }

    /// Marks that were already on the board when the session was built from
    /// a snapshot. Zero for sessions played from the start.
    pub fn preset_marks(&self) -> usize {
        self.preset
    }

    /// The start mode restarts return to.
    pub fn start_mode(&self) -> StartMode {
        self.mode
    }

    /// Status line for display.
    pub fn status_text(&self) -> String {
        match (self.status, self.turn) {
            (GameStatus::Won(mark), _) => format!("Player {mark} wins!"),
            (GameStatus::Draw, _) => "Draw!".to_string(),
            (GameStatus::InProgress, TurnPointer::Mark(mark)) => format!("Player {mark}'s turn"),
            (GameStatus::InProgress, TurnPointer::Unassigned) => {
                "Anyone may start".to_string()
            }
        }
    }
}

impl Default for GameSession {
    fn default() -> Self {
        Self::new()
    }
}
