//! Server-authoritative relay: one game, many connections.

mod http;
mod room;
mod server;

pub use http::{HealthResponse, status_router};
pub use room::{ConnId, Outbound, Room, RoomSnapshot};
pub use server::{run_relay, serve_relay};

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tictactoe_core::ServerMessage;
use tokio::sync::{Mutex, broadcast};
use tracing::debug;

/// Broadcast buffer per connection before a slow reader starts lagging.
const BROADCAST_CAPACITY: usize = 64;

/// State shared by the game listener and the status API.
#[derive(Debug, Clone)]
pub struct RelayState {
    room: Arc<Mutex<Room>>,
    broadcast: broadcast::Sender<ServerMessage>,
    next_conn: Arc<AtomicU64>,
}

impl RelayState {
    /// Creates state around an empty room.
    pub fn new(max_chat_len: usize) -> Self {
        Self::with_capacity(max_chat_len, BROADCAST_CAPACITY)
    }

    /// Creates state whose connections buffer `capacity` broadcasts.
    pub fn with_capacity(max_chat_len: usize, capacity: usize) -> Self {
        let (broadcast, _) = broadcast::channel(capacity);
        Self {
            room: Arc::new(Mutex::new(Room::new(max_chat_len))),
            broadcast,
            next_conn: Arc::new(AtomicU64::new(1)),
        }
    }

    /// The shared room.
    pub fn room(&self) -> &Arc<Mutex<Room>> {
        &self.room
    }

    /// Receives every future broadcast.
    pub fn subscribe(&self) -> broadcast::Receiver<ServerMessage> {
        self.broadcast.subscribe()
    }

    /// Seats `conn` and subscribes it to broadcasts.
    ///
    /// Both happen under the room lock, so the receiver starts right after
    /// the state the returned `init` describes.
    pub async fn join(
        &self,
        conn: ConnId,
    ) -> (broadcast::Receiver<ServerMessage>, Vec<ServerMessage>) {
        let mut room = self.room.lock().await;
        let broadcasts = self.subscribe();
        let out = room.join(conn);
        (broadcasts, self.publish(out))
    }

    /// Drops whatever `broadcasts` still buffers and returns a fresh `init`
    /// for `conn`, or `None` if it has no seat.
    pub async fn resync(
        &self,
        conn: ConnId,
        broadcasts: &mut broadcast::Receiver<ServerMessage>,
    ) -> Option<ServerMessage> {
        let room = self.room.lock().await;
        *broadcasts = broadcasts.resubscribe();
        room.init_for(conn)
    }

    /// Allocates a connection id.
    pub fn next_conn_id(&self) -> ConnId {
        self.next_conn.fetch_add(1, Ordering::Relaxed)
    }

    /// Sends broadcasts and returns the direct replies.
    ///
    /// Call while holding the room lock so broadcasts leave in the order the
    /// room produced them.
    pub fn publish(&self, out: Vec<Outbound>) -> Vec<ServerMessage> {
        let mut direct = Vec::new();
        for message in out {
            match message {
                Outbound::Direct(message) => direct.push(message),
                Outbound::Broadcast(message) => {
                    if self.broadcast.send(message).is_err() {
                        debug!("Broadcast with no listeners");
                    }
                }
            }
        }
        direct
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tictactoe_core::{Mark, PeerMessage, Role, TurnPointer};
    use tokio::sync::broadcast::error::{RecvError, TryRecvError};

    #[tokio::test]
    async fn test_resync_skips_stale_broadcasts() {
        let state = RelayState::with_capacity(280, 2);
        let (mut broadcasts, greeting) = state.join(1).await;
        assert!(matches!(greeting.as_slice(), [ServerMessage::Init { role: Role::X, .. }]));
        let (_other, _) = state.join(2).await;

        {
            let mut room = state.room().lock().await;
            for (conn, index, mark) in [(1, 0, Mark::X), (2, 4, Mark::O), (1, 1, Mark::X)] {
                let out = room.handle(conn, PeerMessage::move_to(index, mark));
                state.publish(out);
            }
        }
        assert!(matches!(broadcasts.recv().await, Err(RecvError::Lagged(_))));

        let init = state.resync(1, &mut broadcasts).await.unwrap();
        assert!(matches!(
            init,
            ServerMessage::Init { turn: TurnPointer::Mark(Mark::O), running: true, .. }
        ));
        assert_eq!(broadcasts.try_recv(), Err(TryRecvError::Empty));

        {
            let mut room = state.room().lock().await;
            let out = room.handle(2, PeerMessage::move_to(8, Mark::O));
            state.publish(out);
        }
        assert_eq!(
            broadcasts.recv().await,
            Ok(ServerMessage::MoveMade { index: 8, mark: Mark::O })
        );
    }
}
