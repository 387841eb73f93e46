//! Application state and logic.

use super::input::{Action, action_for};
use crossterm::event::KeyCode;
use rand::rngs::SmallRng;
use tictactoe_core::{
    Board, DecisionEngine, GameSession, GameStatus, Mark, PeerEvent, PeerMessage, PeerSession,
    Position, RandomThrottle, RelayMirror, Role,
};
use tracing::{debug, info, warn};

/// The computer opponent as configured.
pub type Computer = DecisionEngine<RandomThrottle<SmallRng>>;

/// Where the game being shown lives.
#[derive(Debug)]
pub enum Table {
    /// Two players at one keyboard.
    Local(GameSession),
    /// Human against the engine.
    Computer {
        /// The shared game.
        game: GameSession,
        /// The engine playing the other mark.
        engine: Computer,
    },
    /// Direct link to one other player.
    Peer(PeerSession),
    /// Mirror of a relay-hosted game.
    Relay(RelayMirror),
}

impl Table {
    fn is_networked(&self) -> bool {
        matches!(self, Table::Peer(_) | Table::Relay(_))
    }
}

/// Main application state.
#[derive(Debug)]
pub struct App {
    table: Table,
    cursor: Position,
    notice: Option<String>,
    chat_log: Vec<String>,
    chat_input: Option<String>,
    outbox: Vec<PeerMessage>,
    should_quit: bool,
}

impl App {
    /// Creates a new application. If the engine plays X it opens at once.
    pub fn new(table: Table) -> Self {
        let mut app = Self {
            table,
            cursor: Position::Center,
            notice: None,
            chat_log: Vec::new(),
            chat_input: None,
            outbox: Vec::new(),
            should_quit: false,
        };
        app.computer_turn();
        app
    }

    /// The game being shown.
    pub fn game(&self) -> &GameSession {
        match &self.table {
            Table::Local(game) | Table::Computer { game, .. } => game,
            Table::Peer(peer) => peer.game(),
            Table::Relay(mirror) => mirror.game(),
        }
    }

    /// Current board.
    pub fn board(&self) -> &Board {
        self.game().board()
    }

    /// Cursor position.
    pub fn cursor(&self) -> Position {
        self.cursor
    }

    /// Whether the client has chat.
    pub fn has_chat(&self) -> bool {
        self.table.is_networked()
    }

    /// Chat line being typed, if any.
    pub fn chat_input(&self) -> Option<&str> {
        self.chat_input.as_deref()
    }

    /// Whether the user asked to leave.
    pub fn should_quit(&self) -> bool {
        self.should_quit
    }

    /// Messages queued for the network since the last call.
    pub fn take_outbox(&mut self) -> Vec<PeerMessage> {
        std::mem::take(&mut self.outbox)
    }

    /// Chat history, oldest first.
    pub fn chat_lines(&self) -> Vec<String> {
        match &self.table {
            Table::Relay(mirror) => mirror
                .chat()
                .iter()
                .map(|line| format!("{}: {}", line.from, line.text))
                .collect(),
            _ => self.chat_log.clone(),
        }
    }

    /// Status line: whose turn, the result, or the latest notice.
    pub fn status_line(&self) -> String {
        if let Some(notice) = &self.notice {
            return notice.clone();
        }
        let game = self.game();
        match &self.table {
            Table::Local(_) => game.status_text(),
            Table::Computer { engine, .. } => match game.status() {
                GameStatus::Won(mark) if mark == engine.computer() => "Computer wins!".to_string(),
                GameStatus::Won(_) => "You win!".to_string(),
                GameStatus::Draw => "Draw!".to_string(),
                GameStatus::InProgress => format!("You are {}. {}", engine.human(), game.status_text()),
            },
            Table::Peer(peer) => with_role(peer.role(), game, peer.can_move()),
            Table::Relay(mirror) => match mirror.role() {
                Some(role) => with_role(role, game, mirror.can_move()),
                None => "Connecting...".to_string(),
            },
        }
    }

    /// Handles one key press.
    pub fn handle_key(&mut self, key: KeyCode) {
        if let Some(input) = self.chat_input.as_mut() {
            match key {
                KeyCode::Enter => {
                    let text = std::mem::take(input);
                    self.chat_input = None;
                    self.send_chat(text);
                }
                KeyCode::Esc => self.chat_input = None,
                KeyCode::Backspace => {
                    input.pop();
                }
                KeyCode::Char(c) => input.push(c),
                _ => {}
            }
            return;
        }

        let Some(action) = action_for(key) else {
            return;
        };
        debug!(?action, "Key action");
        match action {
            Action::Cursor(rows, cols) => self.cursor = self.cursor.step(rows, cols),
            Action::PlayCursor => self.play(self.cursor.to_index()),
            Action::PlayAt(position) => {
                self.cursor = position;
                self.play(position.to_index());
            }
            Action::Restart => self.restart(),
            Action::Chat if self.has_chat() => self.chat_input = Some(String::new()),
            Action::Chat => {}
            Action::Quit => self.should_quit = true,
        }
    }

    /// Plays `index` for the local participant.
    pub fn play(&mut self, index: usize) {
        self.notice = None;
        match &mut self.table {
            Table::Local(game) => {
                if let Some(mark) = game.turn().mark() {
                    if let Err(e) = game.apply_move(index, mark) {
                        self.notice = Some(e.to_string());
                    }
                }
            }
            Table::Computer { game, engine } => {
                let human = engine.human();
                if !game.can_move(Role::from(human)) {
                    return;
                }
                if let Err(e) = game.apply_move(index, human) {
                    self.notice = Some(e.to_string());
                    return;
                }
                self.computer_turn();
            }
            Table::Peer(peer) => match peer.local_move(index) {
                Ok(message) => self.outbox.push(message),
                Err(e) => self.notice = Some(e.to_string()),
            },
            Table::Relay(mirror) => match mirror.move_request(index) {
                Some(message) => self.outbox.push(message),
                None => debug!(index, "Click not sent"),
            },
        }
    }

    fn computer_turn(&mut self) {
        if let Table::Computer { game, engine } = &mut self.table {
            let computer = engine.computer();
            if !game.can_move(Role::from(computer)) {
                return;
            }
            match engine.choose_move(game.board()) {
                Some(index) => {
                    if let Err(e) = game.apply_move(index, computer) {
                        warn!(error = %e, index, "Engine picked an illegal move");
                    }
                }
                None => debug!("Engine has no move"),
            }
        }
    }

    /// Starts a new game, telling the other side when networked.
    pub fn restart(&mut self) {
        self.notice = None;
        match &mut self.table {
            Table::Local(game) => {
                game.restart();
            }
            Table::Computer { game, .. } => {
                game.restart();
                self.computer_turn();
            }
            Table::Peer(peer) => self.outbox.push(peer.restart()),
            Table::Relay(_) => self.outbox.push(PeerMessage::Restart),
        }
        info!("Restart requested");
    }

    fn send_chat(&mut self, text: String) {
        let text = text.trim().to_string();
        if text.is_empty() {
            return;
        }
        match &self.table {
            Table::Peer(peer) => {
                self.chat_log.push(format!("You: {}", text));
                self.outbox.push(peer.chat(text));
            }
            // The relay echoes chat back to the sender.
            Table::Relay(_) => self.outbox.push(PeerMessage::Chat { text }),
            _ => {}
        }
    }

    /// Applies one line from the network.
    pub fn receive_line(&mut self, line: &str) {
        match &mut self.table {
            Table::Peer(peer) => match peer.receive_line(line) {
                Ok(PeerEvent::Chat(text)) => self.chat_log.push(format!("Them: {}", text)),
                Ok(PeerEvent::Restarted) => self.notice = Some("Opponent restarted".to_string()),
                Ok(PeerEvent::Moved { .. }) => self.notice = None,
                Ok(PeerEvent::Ignored) => {}
                Err(e) => self.notice = Some(format!("Boards out of sync: {}", e)),
            },
            Table::Relay(mirror) => {
                mirror.apply_line(line);
                self.notice = None;
            }
            _ => warn!("Network line in an offline game"),
        }
    }

    /// Notes that the network link closed.
    pub fn disconnected(&mut self) {
        info!("Link closed");
        self.notice = Some("Disconnected. Press q to quit.".to_string());
    }
}

fn with_role(role: Role, game: &GameSession, can_move: bool) -> String {
    let suffix = if can_move { " (your move)" } else { "" };
    format!("You are {}. {}{}", role, game.status_text(), suffix)
}
