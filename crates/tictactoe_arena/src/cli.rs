//! Command-line interface for the tictactoe binary.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use tictactoe_core::Mark;

/// Tic-tac-toe in the terminal, with a relay server for networked play
#[derive(Parser, Debug)]
#[command(name = "tictactoe")]
#[command(about = "Tic-tac-toe: local, against the computer, peer-to-peer or via a relay", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Path to the TOML config file (defaults apply if it is missing)
    #[arg(long, global = true, default_value = "tictactoe.toml")]
    pub config: PathBuf,

    /// Subcommand to run
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the relay server and its HTTP status API
    Serve {
        /// Host to bind to
        #[arg(long)]
        host: Option<String>,

        /// Port for game connections
        #[arg(short, long)]
        port: Option<u16>,

        /// Port for the HTTP status API
        #[arg(long)]
        http_port: Option<u16>,
    },

    /// Two players at one keyboard
    Local,

    /// Play against the computer
    Computer {
        /// Mark you play (X moves first)
        #[arg(short, long, value_enum, default_value = "x")]
        mark: MarkArg,

        /// Chance the computer plays a random cell (0-1)
        #[arg(long)]
        blunder_rate: Option<f64>,

        /// Seed for reproducible games
        #[arg(long)]
        seed: Option<u64>,
    },

    /// Host a peer-to-peer game and play X
    Host {
        /// Address to listen on
        #[arg(long, default_value = "0.0.0.0:4000")]
        addr: String,

        /// Either player may make the first move
        #[arg(long)]
        anyone_starts: bool,
    },

    /// Join a hosted peer-to-peer game and play O
    JoinPeer {
        /// Host address
        addr: String,

        /// Either player may make the first move (must match the host)
        #[arg(long)]
        anyone_starts: bool,
    },

    /// Join a relay server
    Join {
        /// Relay address
        #[arg(default_value = "127.0.0.1:3000")]
        addr: String,
    },
}

/// Mark chosen on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum MarkArg {
    /// Play X
    X,
    /// Play O
    O,
}

impl From<MarkArg> for Mark {
    fn from(mark: MarkArg) -> Self {
        match mark {
            MarkArg::X => Mark::X,
            MarkArg::O => Mark::O,
        }
    }
}
