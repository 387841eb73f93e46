//! Keyboard mapping.

use crossterm::event::KeyCode;
use tictactoe_core::Position;

/// What a key press asks for outside chat entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Move the cursor by (rows, columns).
    Cursor(isize, isize),
    /// Play the cell under the cursor.
    PlayCursor,
    /// Play a specific cell.
    PlayAt(Position),
    /// Start a new game.
    Restart,
    /// Begin typing a chat line.
    Chat,
    /// Leave the client.
    Quit,
}

/// Maps a key to an action.
pub fn action_for(key: KeyCode) -> Option<Action> {
    match key {
        KeyCode::Up => Some(Action::Cursor(-1, 0)),
        KeyCode::Down => Some(Action::Cursor(1, 0)),
        KeyCode::Left => Some(Action::Cursor(0, -1)),
        KeyCode::Right => Some(Action::Cursor(0, 1)),
        KeyCode::Enter | KeyCode::Char(' ') => Some(Action::PlayCursor),
        KeyCode::Char(c @ '1'..='9') => Position::parse(&c.to_string()).map(Action::PlayAt),
        KeyCode::Char('r') => Some(Action::Restart),
        KeyCode::Char('c') => Some(Action::Chat),
        KeyCode::Char('q') | KeyCode::Esc => Some(Action::Quit),
        _ => None,
    }
}

/// Moves cursor based on arrow keys.
pub fn move_cursor(cursor: Position, key: KeyCode) -> Position {
    match action_for(key) {
        Some(Action::Cursor(rows, cols)) => cursor.step(rows, cols),
        _ => cursor,
    }
}
