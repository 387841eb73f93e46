//! Client-side mirror of a relay-hosted game.
//!
//! The server runs the only authoritative [`GameSession`]; a mirror applies
//! the server's broadcasts to a local copy so the client can render the board
//! and pre-check its own clicks.

use crate::protocol::{PeerMessage, ServerMessage, decode_lossy};
use crate::session::{GameSession, StartMode};
use crate::types::{Role, TurnPointer};
use tracing::{debug, info, instrument, warn};

/// A chat line received through the relay.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatLine {
    /// Sender's role.
    pub from: Role,
    /// Message text.
    pub text: String,
}

/// Read-only copy of the server's game.
#[derive(Debug, Clone)]
pub struct RelayMirror {
    role: Option<Role>,
    game: GameSession,
    chat: Vec<ChatLine>,
}

impl RelayMirror {
    /// Creates an empty mirror awaiting the server's `init`.
    pub fn new() -> Self {
        Self {
            role: None,
            game: GameSession::new(),
            chat: Vec::new(),
        }
    }

    /// Role assigned by the server, once known.
    pub fn role(&self) -> Option<Role> {
        self.role
    }

    /// The mirrored game.
    pub fn game(&self) -> &GameSession {
        &self.game
    }

    /// Chat lines received so far, oldest first.
    pub fn chat(&self) -> &[ChatLine] {
        &self.chat
    }

    /// Whether the server would accept a move from us now.
    pub fn can_move(&self) -> bool {
        self.role.is_some_and(|role| self.game.can_move(role))
    }

    /// Builds a move request for `index` if the mirror says it is legal.
    ///
    /// Returns `None` for stale clicks so they never reach the server.
    pub fn move_request(&self, index: usize) -> Option<PeerMessage> {
        let mark = self.role?.mark()?;
        if !self.can_move() {
            return None;
        }
        self.game.check_move(index, mark).ok()?;
        Some(PeerMessage::move_to(index, mark))
    }

    /// Applies one server broadcast.
    #[instrument(skip(self))]
    pub fn apply(&mut self, message: ServerMessage) {
        match message {
            ServerMessage::Init {
                role,
                board,
                turn,
                running,
            } => {
                info!(?role, running, "Joined relay game");
                self.role = Some(role);
                self.game = GameSession::from_snapshot(board, turn, StartMode::XFirst);
                if running != self.game.is_running() {
                    warn!(running, "Server running flag disagrees with board");
                }
            }
            ServerMessage::MoveMade { index, mark } => {
                if let Err(e) = self.game.apply_move(index, mark) {
                    warn!(error = %e, index, ?mark, "Mirror refused server move");
                }
            }
            ServerMessage::TurnChange { turn } => {
                if self.game.turn() != TurnPointer::Mark(turn) {
                    warn!(?turn, local = ?self.game.turn(), "Turn pointer out of step with server");
                    self.game = GameSession::from_snapshot(
                        *self.game.board(),
                        TurnPointer::Mark(turn),
                        StartMode::XFirst,
                    );
                }
            }
            ServerMessage::Restarted => {
                self.game.restart();
            }
            ServerMessage::Chat { from, text } => {
                self.chat.push(ChatLine { from, text });
            }
            ServerMessage::Unknown => {
                debug!("Ignoring server message of unknown kind");
            }
        }
    }

    /// Decodes and applies one line from the server.
    pub fn apply_line(&mut self, line: &str) {
        if let Some(message) = decode_lossy::<ServerMessage>(line) {
            self.apply(message);
        }
    }
}

impl Default for RelayMirror {
    fn default() -> Self {
        Self::new()
    }
}
