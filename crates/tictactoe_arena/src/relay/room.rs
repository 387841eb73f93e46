//! The relay's single authoritative game and its participants.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tictactoe_core::{
    Board, GameSession, GameStatus, Mark, PeerMessage, Role, ServerMessage, TurnPointer,
};
use tracing::{debug, info, instrument, warn};

/// Identifies one client connection.
pub type ConnId = u64;

/// Where a server message goes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outbound {
    /// Only to the connection that caused it.
    Direct(ServerMessage),
    /// To every connection, including the sender.
    Broadcast(ServerMessage),
}

/// Point-in-time view of the room for the status API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomSnapshot {
    /// Current board.
    pub board: Board,
    /// Mark to move, `null` if unassigned.
    pub turn: TurnPointer,
    /// Game status.
    pub status: GameStatus,
    /// Completed line, if won.
    pub winning_line: Option<[usize; 3]>,
    /// Moves played this game.
    pub moves: usize,
    /// Whether someone holds X.
    pub x_taken: bool,
    /// Whether someone holds O.
    pub o_taken: bool,
    /// Connected spectators.
    pub spectators: usize,
}

/// One hosted game with seat assignment.
#[derive(Debug)]
pub struct Room {
    game: GameSession,
    seats: HashMap<ConnId, Role>,
    max_chat_len: usize,
}

impl Room {
    /// Creates an empty room with a fresh X-first game.
    #[instrument]
    pub fn new(max_chat_len: usize) -> Self {
        info!("Creating relay room");
        Self {
            game: GameSession::new(),
            seats: HashMap::new(),
            max_chat_len,
        }
    }

    /// The authoritative game.
    pub fn game(&self) -> &GameSession {
        &self.game
    }

    /// Role held by `conn`, if connected.
    pub fn role_of(&self, conn: ConnId) -> Option<Role> {
        self.seats.get(&conn).copied()
    }

    fn seat_taken(&self, role: Role) -> bool {
        self.seats.values().any(|r| *r == role)
    }

    /// Seats a new connection: X if free, then O, otherwise spectator.
    #[instrument(skip(self))]
    pub fn join(&mut self, conn: ConnId) -> Vec<Outbound> {
        let role = if !self.seat_taken(Role::X) {
            Role::X
        } else if !self.seat_taken(Role::O) {
            Role::O
        } else {
            Role::Spectator
        };
        self.seats.insert(conn, role);
        info!(?role, participants = self.seats.len(), "Participant joined");

        self.init_for(conn).map(Outbound::Direct).into_iter().collect()
    }

    /// The `init` message `conn` would receive on joining now.
    ///
    /// Also used to resynchronise a client that missed broadcasts.
    pub fn init_for(&self, conn: ConnId) -> Option<ServerMessage> {
        let role = self.role_of(conn)?;
        Some(ServerMessage::Init {
            role,
            board: *self.game.board(),
            turn: self.game.turn(),
            running: self.game.is_running(),
        })
    }

    /// Frees the seat held by `conn`.
    #[instrument(skip(self))]
    pub fn leave(&mut self, conn: ConnId) -> Option<Role> {
        let role = self.seats.remove(&conn);
        info!(?role, participants = self.seats.len(), "Participant left");
        role
    }

    /// Processes one client message.
    #[instrument(skip(self), fields(role = ?self.role_of(conn)))]
    pub fn handle(&mut self, conn: ConnId, message: PeerMessage) -> Vec<Outbound> {
        let Some(role) = self.role_of(conn) else {
            warn!("Message from unseated connection");
            return Vec::new();
        };

        match message {
            PeerMessage::Move { index, mark, .. } => self.handle_move(role, index, mark),
            PeerMessage::Restart => {
                self.game.restart();
                info!(?role, "Game restarted");
                vec![Outbound::Broadcast(ServerMessage::Restarted)]
            }
            PeerMessage::Chat { text } => self.handle_chat(role, &text),
            PeerMessage::Unknown => {
                debug!("Ignoring message of unknown kind");
                Vec::new()
            }
        }
    }

    fn handle_move(&mut self, role: Role, index: usize, mark: Mark) -> Vec<Outbound> {
        if role.mark() != Some(mark) {
            warn!(?role, ?mark, "Move claims a mark the sender does not hold");
            return Vec::new();
        }
        if !self.game.can_move(role) {
            debug!(?role, "Move out of turn ignored");
            return Vec::new();
        }
        if let Err(e) = self.game.apply_move(index, mark) {
            debug!(error = %e, index, "Move refused");
            return Vec::new();
        }

        let mut out = vec![Outbound::Broadcast(ServerMessage::MoveMade { index, mark })];
        match (self.game.is_running(), self.game.turn()) {
            (true, TurnPointer::Mark(next)) => {
                out.push(Outbound::Broadcast(ServerMessage::TurnChange { turn: next }));
            }
            _ => info!(status = ?self.game.status(), "Game over"),
        }
        out
    }

    fn handle_chat(&self, role: Role, text: &str) -> Vec<Outbound> {
        let text = text.trim();
        if text.is_empty() {
            return Vec::new();
        }
        let text: String = text.chars().take(self.max_chat_len).collect();
        vec![Outbound::Broadcast(ServerMessage::Chat { from: role, text })]
    }

    /// Current state for the status API.
    pub fn snapshot(&self) -> RoomSnapshot {
        RoomSnapshot {
            board: *self.game.board(),
            turn: self.game.turn(),
            status: self.game.status(),
            winning_line: self.game.winning_line(),
            moves: self.game.history().len(),
            x_taken: self.seat_taken(Role::X),
            o_taken: self.seat_taken(Role::O),
            spectators: self
                .seats
                .values()
                .filter(|r| **r == Role::Spectator)
                .count(),
        }
    }
}
