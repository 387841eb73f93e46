//! Tic-tac-toe front ends built on [`tictactoe_core`].
//!
//! # Architecture
//!
//! - **Relay**: a TCP server that hosts one authoritative game, plus a small
//!   HTTP status API
//! - **TUI**: a terminal client for local, computer, peer-to-peer and relay
//!   games
//! - **Config**: TOML settings with environment and command-line overrides

#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod config;
mod lines;
mod relay;
mod tui;

pub use config::{ArenaConfig, ConfigError, EngineConfig, RelayConfig};
pub use lines::{FrameError, LineReader, MAX_LINE_LEN};
pub use relay::{
    ConnId, HealthResponse, Outbound, RelayState, Room, RoomSnapshot, run_relay, serve_relay,
    status_router,
};
pub use tui::{
    Action, App, Computer, LOG_FILE, Link, LinkEvent, Table, TuiMode, action_for,
    init_file_logging, move_cursor, run_tui,
};
