//! One side of a peer-to-peer game.
//!
//! Each peer owns its own [`GameSession`]. The two copies stay identical
//! because every move goes through the same `apply_move` path on both
//! sides, in the same order.
//!
//! In an anyone-starts game both sides may open at once. Openers carry a flag,
//! and when two of them cross, X's opener stands on both sides.

use crate::error::MoveError;
use crate::protocol::{PeerMessage, decode_lossy};
use crate::session::{GameSession, StartMode};
use crate::types::{GameStatus, Mark, Role};
use tracing::{debug, info, instrument, warn};

/// What a received message did to the local session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PeerEvent {
    /// The remote move was applied.
    Moved {
        /// Board index.
        index: usize,
        /// Mark placed.
        mark: Mark,
        /// Status after the move.
        status: GameStatus,
    },
    /// The remote side restarted the game.
    Restarted,
    /// The remote side sent a chat line.
    Chat(String),
    /// Nothing happened (unknown or malformed message).
    Ignored,
}

/// A participant's view of a peer-to-peer game.
#[derive(Debug, Clone)]
pub struct PeerSession {
    role: Role,
    game: GameSession,
}

impl PeerSession {
    /// Creates a peer playing `role`.
    #[instrument]
    pub fn new(role: Role, mode: StartMode) -> Self {
        info!("Starting peer session");
        Self {
            role,
            game: GameSession::with_mode(mode),
        }
    }

    /// The hosting side plays X.
    pub fn host(mode: StartMode) -> Self {
        Self::new(Role::X, mode)
    }

    /// The joining side plays O.
    pub fn guest(mode: StartMode) -> Self {
        Self::new(Role::O, mode)
    }

    /// This participant's role.
    pub fn role(&self) -> Role {
        self.role
    }

    /// The local copy of the game.
    pub fn game(&self) -> &GameSession {
        &self.game
    }

    /// Whether the local participant may move now.
    pub fn can_move(&self) -> bool {
        self.game.can_move(self.role)
    }

    /// Plays a locally clicked cell and returns the message to send.
    ///
    /// # Errors
    ///
    /// Returns [`MoveError::NotPermitted`] when it is not our turn (or we are
    /// a spectator), otherwise whatever [`GameSession::apply_move`] refuses.
    /// Nothing is sent for a refused move.
    #[instrument(skip(self), fields(role = ?self.role))]
    pub fn local_move(&mut self, index: usize) -> Result<PeerMessage, MoveError> {
        let mark = match self.role.mark() {
            Some(mark) if self.game.can_move(self.role) => mark,
            _ if self.game.status().is_terminal() => return Err(MoveError::GameOver),
            _ => return Err(MoveError::NotPermitted(self.role)),
        };
        let opening = self.opens_next();
        self.game.apply_move(index, mark)?;
        Ok(PeerMessage::Move {
            index,
            mark,
            opening,
        })
    }

    /// Applies a message from the other peer.
    ///
    /// # Errors
    ///
    /// A remote move the local session refuses means the two copies have
    /// diverged; the error is returned to the caller and nothing is sent back.
    #[instrument(skip(self), fields(role = ?self.role))]
    pub fn receive(&mut self, message: PeerMessage) -> Result<PeerEvent, MoveError> {
        match message {
            PeerMessage::Move {
                index,
                mark,
                opening,
            } => {
                if opening && self.crossed_opening(mark) {
                    if mark != Mark::X {
                        info!(index, ?mark, "Openers crossed, keeping ours");
                        return Ok(PeerEvent::Ignored);
                    }
                    info!(index, ?mark, "Openers crossed, yielding to X");
                    self.game.restart();
                }
                match self.game.apply_move(index, mark) {
                    Ok(status) => Ok(PeerEvent::Moved {
                        index,
                        mark,
                        status,
                    }),
                    Err(e) => {
                        warn!(error = %e, index, ?mark, "Remote move refused, boards diverged");
                        Err(e)
                    }
                }
            }
            PeerMessage::Restart => {
                self.game.restart();
                Ok(PeerEvent::Restarted)
            }
            PeerMessage::Chat { text } => Ok(PeerEvent::Chat(text)),
            PeerMessage::Unknown => {
                debug!("Ignoring message of unknown kind");
                Ok(PeerEvent::Ignored)
            }
        }
    }

    /// Decodes and applies one received line. Malformed lines are ignored.
    pub fn receive_line(&mut self, line: &str) -> Result<PeerEvent, MoveError> {
        match decode_lossy::<PeerMessage>(line) {
            Some(message) => self.receive(message),
            None => Ok(PeerEvent::Ignored),
        }
    }

    /// Restarts locally and returns the message telling the other side.
    pub fn restart(&mut self) -> PeerMessage {
        self.game.restart();
        PeerMessage::Restart
    }

    /// Wraps a chat line for sending.
    pub fn chat(&self, text: impl Into<String>) -> PeerMessage {
        PeerMessage::Chat { text: text.into() }
    }

    /// The next move played here would open an anyone-starts game.
    fn opens_next(&self) -> bool {
        self.game.start_mode() == StartMode::AnyoneStarts && self.game.history().is_empty()
    }

    /// A remote opener arrived while our own opener is still unanswered.
    ///
    /// Both sides moved on an empty board, so X's opener stands and O's is
    /// taken back.
    fn crossed_opening(&self, remote: Mark) -> bool {
        match self.game.history() {
            [ours] => self.role.mark() == Some(ours.mark) && ours.mark != remote,
            _ => false,
        }
    }
}
