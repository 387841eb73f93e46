//! Tic-tac-toe game logic with no I/O.
//!
//! # Architecture
//!
//! - **Session**: [`GameSession`], the state machine every variant shares
//! - **Engine**: [`DecisionEngine`], exhaustive minimax with a blunder throttle
//! - **Protocol**: [`PeerMessage`] / [`ServerMessage`], newline-delimited JSON
//! - **Peer**: [`PeerSession`], one side of a peer-to-peer game
//! - **Mirror**: [`RelayMirror`], a client's copy of a server-hosted game
//!
//! # Example
//!
//! ```
//! use tictactoe_core::{DecisionEngine, GameSession, GameStatus, Mark, NoThrottle};
//!
//! let mut game = GameSession::new();
//! game.apply_move(4, Mark::X).unwrap();
//!
//! let mut engine = DecisionEngine::playing(Mark::O, NoThrottle);
//! let reply = engine.choose_move(game.board()).unwrap();
//! assert!([0, 2, 6, 8].contains(&reply));
//! assert_eq!(game.apply_move(reply, Mark::O), Ok(GameStatus::InProgress));
//! ```

#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod engine;
mod error;
mod invariants;
mod mirror;
mod peer;
mod position;
mod protocol;
mod rules;
mod session;
mod types;

pub use engine::{
    DEFAULT_BLUNDER_RATE, DRAW_SCORE, DecisionEngine, LOSS_SCORE, NoThrottle, RandomThrottle,
    Throttle, WIN_SCORE, best_move,
};
pub use error::{EngineError, MalformedMessage, MoveError};
pub use invariants::{
    BalancedMarks, HistoryOnBoard, Invariant, InvariantSet, SessionInvariants, StatusMatchesBoard,
};
pub use mirror::{ChatLine, RelayMirror};
pub use peer::{PeerEvent, PeerSession};
pub use position::Position;
pub use protocol::{PeerMessage, ServerMessage, decode, decode_lossy, encode};
pub use rules::{check_winner, is_draw, is_full, winning_line};
pub use session::{GameSession, StartMode};
pub use types::{Board, CELL_COUNT, Cell, GameStatus, Mark, Move, Role, TurnPointer, WIN_LINES};
