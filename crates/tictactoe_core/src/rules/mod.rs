//! Game rules for tic-tac-toe.
//!
//! Pure functions over a [`Board`](crate::Board), kept apart from the
//! session so the decision engine can evaluate hypothetical positions.

mod draw;
mod win;

pub use draw::{is_draw, is_full};
pub use win::{check_winner, winning_line};
