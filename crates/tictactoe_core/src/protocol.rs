//! Wire messages exchanged by peers and by the relay server.
//!
//! Every message is one JSON object per line, tagged by `kind`. Unknown kinds
//! decode to an `Unknown` variant so callers can ignore them; anything else
//! that fails to decode is a [`MalformedMessage`].

use crate::error::MalformedMessage;
use crate::types::{Board, Mark, Role, TurnPointer};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Sent between peers, and from relay clients to the server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PeerMessage {
    /// Place `mark` at `index`.
    Move {
        /// Board index (0-8).
        index: usize,
        /// Mark being placed.
        mark: Mark,
        /// First move of an anyone-starts game, made on an empty board.
        #[serde(default, skip_serializing_if = "is_false")]
        opening: bool,
    },
    /// Reset the board.
    Restart,
    /// Free-text chat line.
    Chat {
        /// Message text.
        text: String,
    },
    /// Any kind this build does not understand.
    #[serde(other)]
    Unknown,
}

impl PeerMessage {
    /// An ordinary move.
    pub fn move_to(index: usize, mark: Mark) -> Self {
        PeerMessage::Move {
            index,
            mark,
            opening: false,
        }
    }
}

fn is_false(flag: &bool) -> bool {
    !*flag
}

/// Sent by the relay server to its clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ServerMessage {
    /// Greeting to a freshly joined connection.
    Init {
        /// Role assigned to the connection.
        role: Role,
        /// Current board.
        board: Board,
        /// Whose turn it is.
        turn: TurnPointer,
        /// Whether moves are accepted.
        running: bool,
    },
    /// A move was accepted by the server.
    MoveMade {
        /// Board index.
        index: usize,
        /// Mark placed.
        mark: Mark,
    },
    /// The turn passed to `turn`.
    TurnChange {
        /// Mark to move next.
        turn: Mark,
    },
    /// The board was reset.
    Restarted,
    /// Chat line from a participant.
    Chat {
        /// Sender's role.
        from: Role,
        /// Message text.
        text: String,
    },
    /// Any kind this build does not understand.
    #[serde(other)]
    Unknown,
}

/// Decodes one line.
///
/// # Errors
///
/// Returns [`MalformedMessage`] for invalid JSON, a missing `kind`, or
/// missing fields on a known kind.
pub fn decode<T: DeserializeOwned>(line: &str) -> Result<T, MalformedMessage> {
    Ok(serde_json::from_str(line.trim())?)
}

/// Decodes one line, logging and discarding malformed input.
pub fn decode_lossy<T: DeserializeOwned>(line: &str) -> Option<T> {
    match decode(line) {
        Ok(message) => Some(message),
        Err(e) => {
            warn!(error = %e, line, "Ignoring malformed message");
            None
        }
    }
}

/// Encodes a message as a single JSON line (without the trailing newline).
pub fn encode<T: Serialize>(message: &T) -> String {
    // Derived serializers over these types cannot fail.
    serde_json::to_string(message).unwrap_or_default()
}
