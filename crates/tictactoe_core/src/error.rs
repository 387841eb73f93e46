//! Error types for game logic and the session protocol.

use crate::types::{Mark, Role};
use derive_more::{Display, Error};

/// Reasons a move is refused. A refused move never changes the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Error)]
pub enum MoveError {
    /// The game is already won or drawn.
    #[display("Game is already over")]
    GameOver,

    /// Index is not on the board.
    #[display("Position {} is out of range (must be 0-8)", _0)]
    OutOfRange(#[error(not(source))] usize),

    /// The cell already holds a mark.
    #[display("Square {} is already occupied", _0)]
    Occupied(#[error(not(source))] usize),

    /// The move was made by the wrong mark.
    #[display("It's not {}'s turn (waiting for {})", got, expected)]
    WrongTurn {
        /// The mark whose turn it is.
        expected: Mark,
        /// The mark that tried to move.
        got: Mark,
    },

    /// The participant's role cannot move right now.
    #[display("Role {} may not move now", _0)]
    NotPermitted(#[error(not(source))] Role),
}

/// A message that could not be decoded. Always logged and ignored.
#[derive(Debug, Clone, PartialEq, Eq, Display, Error)]
#[display("Malformed message: {}", reason)]
pub struct MalformedMessage {
    /// What went wrong while decoding.
    pub reason: String,
}

impl MalformedMessage {
    /// Creates a new malformed-message error.
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

impl From<serde_json::Error> for MalformedMessage {
    fn from(err: serde_json::Error) -> Self {
        Self::new(err.to_string())
    }
}

/// Decision engine construction errors.
#[derive(Debug, Clone, Copy, PartialEq, Display, Error)]
pub enum EngineError {
    /// Blunder rate must be a probability.
    #[display("Blunder rate {} is outside [0, 1]", _0)]
    InvalidRate(#[error(not(source))] f64),

    /// Computer and human were given the same mark.
    #[display("Computer and human cannot both play {}", _0)]
    SameMark(#[error(not(source))] Mark),
}
