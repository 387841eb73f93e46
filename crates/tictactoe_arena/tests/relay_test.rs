//! End-to-end relay tests over real sockets.

use std::net::SocketAddr;
use std::time::Duration;
use tictactoe_arena::{MAX_LINE_LEN, RelayState, serve_relay};
use tictactoe_core::{
    Board, Mark, PeerMessage, RelayMirror, Role, ServerMessage, TurnPointer, decode, encode,
};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines};
use tokio::net::TcpListener;
use tokio::net::TcpStream;
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::time::timeout;

const WAIT: Duration = Duration::from_secs(5);

async fn start_relay() -> (SocketAddr, RelayState) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let state = RelayState::new(280);
    tokio::spawn(serve_relay(listener, state.clone()));
    (addr, state)
}

struct Client {
    lines: Lines<BufReader<OwnedReadHalf>>,
    writer: OwnedWriteHalf,
}

impl Client {
    async fn connect(addr: SocketAddr) -> Self {
        let stream = TcpStream::connect(addr).await.unwrap();
        let (reader, writer) = stream.into_split();
        Self {
            lines: BufReader::new(reader).lines(),
            writer,
        }
    }

    /// Connects and returns the client with its `init`.
    async fn join(addr: SocketAddr) -> (Self, ServerMessage) {
        let mut client = Self::connect(addr).await;
        let init = client.recv().await;
        (client, init)
    }

    async fn recv(&mut self) -> ServerMessage {
        let line = timeout(WAIT, self.lines.next_line())
            .await
            .expect("timed out waiting for server")
            .unwrap()
            .expect("server closed the connection");
        decode(&line).unwrap()
    }

    async fn send(&mut self, message: &PeerMessage) {
        self.send_raw(&encode(message)).await;
    }

    async fn send_raw(&mut self, line: &str) {
        self.send_bytes(line.as_bytes()).await;
    }

    async fn send_bytes(&mut self, bytes: &[u8]) {
        self.writer.write_all(bytes).await.unwrap();
        self.writer.write_all(b"\n").await.unwrap();
    }
}

fn role_of(init: &ServerMessage) -> Role {
    match init {
        ServerMessage::Init { role, .. } => *role,
        other => panic!("expected init, got {other:?}"),
    }
}

#[tokio::test]
async fn test_roles_assigned_in_join_order() {
    let (addr, _state) = start_relay().await;
    let (_x, init_x) = Client::join(addr).await;
    let (_o, init_o) = Client::join(addr).await;
    let (_s, init_s) = Client::join(addr).await;

    assert_eq!(role_of(&init_x), Role::X);
    assert_eq!(role_of(&init_o), Role::O);
    assert_eq!(role_of(&init_s), Role::Spectator);
    assert_eq!(
        init_x,
        ServerMessage::Init {
            role: Role::X,
            board: Board::new(),
            turn: TurnPointer::Mark(Mark::X),
            running: true,
        }
    );
}

#[tokio::test]
async fn test_move_fans_out_to_everyone() {
    let (addr, _state) = start_relay().await;
    let (mut x, _) = Client::join(addr).await;
    let (mut o, _) = Client::join(addr).await;
    let (mut watcher, _) = Client::join(addr).await;

    x.send(&PeerMessage::move_to(4, Mark::X)).await;

    for client in [&mut x, &mut o, &mut watcher] {
        assert_eq!(client.recv().await, ServerMessage::MoveMade { index: 4, mark: Mark::X });
        assert_eq!(client.recv().await, ServerMessage::TurnChange { turn: Mark::O });
    }
}

#[tokio::test]
async fn test_invalid_moves_produce_nothing() {
    let (addr, _state) = start_relay().await;
    let (mut x, _) = Client::join(addr).await;
    let (mut o, _) = Client::join(addr).await;

    // Out of turn (or occupied, whichever the relay sees first), then garbage.
    o.send(&PeerMessage::move_to(0, Mark::O)).await;
    o.send_raw("{not json").await;
    x.send(&PeerMessage::move_to(0, Mark::X)).await;
    assert_eq!(o.recv().await, ServerMessage::MoveMade { index: 0, mark: Mark::X });
    assert_eq!(o.recv().await, ServerMessage::TurnChange { turn: Mark::O });

    // Occupied cell, a forged mark, then a chat line to mark the end.
    o.send(&PeerMessage::move_to(0, Mark::O)).await;
    o.send(&PeerMessage::move_to(1, Mark::X)).await;
    o.send(&PeerMessage::Chat { text: "oops".into() }).await;

    assert_eq!(x.recv().await, ServerMessage::MoveMade { index: 0, mark: Mark::X });
    assert_eq!(x.recv().await, ServerMessage::TurnChange { turn: Mark::O });
    assert_eq!(
        x.recv().await,
        ServerMessage::Chat {
            from: Role::O,
            text: "oops".into()
        }
    );
}

#[tokio::test]
async fn test_non_utf8_line_keeps_the_seat() {
    let (addr, state) = start_relay().await;
    let (mut x, _) = Client::join(addr).await;

    x.send_bytes(b"\xff\xfe garbage").await;
    x.send(&PeerMessage::move_to(4, Mark::X)).await;

    assert_eq!(x.recv().await, ServerMessage::MoveMade { index: 4, mark: Mark::X });
    assert_eq!(x.recv().await, ServerMessage::TurnChange { turn: Mark::O });
    let snapshot = state.room().lock().await.snapshot();
    assert!(snapshot.x_taken);
    assert_eq!(snapshot.moves, 1);
}

#[tokio::test]
async fn test_oversized_line_is_dropped() {
    let (addr, _state) = start_relay().await;
    let (mut x, _) = Client::join(addr).await;

    let huge = format!(r#"{{"kind":"chat","text":"{}"}}"#, "a".repeat(MAX_LINE_LEN));
    x.send_raw(&huge).await;
    x.send(&PeerMessage::Chat { text: "short".into() }).await;

    assert_eq!(
        x.recv().await,
        ServerMessage::Chat {
            from: Role::X,
            text: "short".into()
        }
    );
}

#[tokio::test]
async fn test_mirrors_follow_a_whole_game() {
    let (addr, _state) = start_relay().await;
    let (mut x, init_x) = Client::join(addr).await;
    let (mut o, init_o) = Client::join(addr).await;

    let mut mirror_x = RelayMirror::new();
    let mut mirror_o = RelayMirror::new();
    mirror_x.apply(init_x);
    mirror_o.apply(init_o);

    // X takes the top row.
    for (index, mark) in [(0, Mark::X), (3, Mark::O), (1, Mark::X), (4, Mark::O), (2, Mark::X)] {
        let (mover, mirror) = if mark == Mark::X {
            (&mut x, &mirror_x)
        } else {
            (&mut o, &mirror_o)
        };
        let request = mirror.move_request(index).expect("mirror allows the move");
        mover.send(&request).await;

        let last = index == 2;
        for (client, mirror) in [(&mut x, &mut mirror_x), (&mut o, &mut mirror_o)] {
            mirror.apply(client.recv().await);
            if !last {
                mirror.apply(client.recv().await);
            }
        }
    }

    assert_eq!(mirror_x.game().status(), tictactoe_core::GameStatus::Won(Mark::X));
    assert_eq!(mirror_o.game().board(), mirror_x.game().board());
    assert_eq!(mirror_o.move_request(5), None);
}

#[tokio::test]
async fn test_anyone_may_restart() {
    let (addr, _state) = start_relay().await;
    let (mut x, _) = Client::join(addr).await;
    let (_o, _) = Client::join(addr).await;
    let (mut watcher, _) = Client::join(addr).await;

    x.send(&PeerMessage::move_to(8, Mark::X)).await;
    watcher.recv().await;
    watcher.recv().await;

    watcher.send(&PeerMessage::Restart).await;
    assert_eq!(watcher.recv().await, ServerMessage::Restarted);

    let (_late, init) = Client::join(addr).await;
    assert!(matches!(init, ServerMessage::Init { board, running: true, .. } if board == Board::new()));
}

#[tokio::test]
async fn test_disconnect_frees_the_seat() {
    let (addr, state) = start_relay().await;
    let (x, _) = Client::join(addr).await;
    let (_o, _) = Client::join(addr).await;
    drop(x);

    let mut freed = false;
    for _ in 0..100 {
        if !state.room().lock().await.snapshot().x_taken {
            freed = true;
            break;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    assert!(freed, "seat X never freed");

    let (_next, init) = Client::join(addr).await;
    assert_eq!(role_of(&init), Role::X);
}
