//! tictactoe - unified CLI
//!
//! Terminal games and the relay server.

#![warn(missing_docs)]

mod cli;

use anyhow::Result;
use clap::Parser;
use cli::{Cli, Command};
use tictactoe_arena::{ArenaConfig, TuiMode, run_relay, run_tui};
use tracing::{info, instrument};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let config = ArenaConfig::load_or_default(&cli.config)?.with_env(|key| std::env::var(key).ok())?;

    match cli.command {
        Command::Serve {
            host,
            port,
            http_port,
        } => {
            let config = config.with_overrides(host, port, http_port, None, None);
            config.validate()?;
            run_server(config).await
        }
        Command::Local => play(TuiMode::Local, config).await,
        Command::Computer {
            mark,
            blunder_rate,
            seed,
        } => {
            let config = config.with_overrides(None, None, None, blunder_rate, seed);
            play(TuiMode::Computer { human: mark.into() }, config).await
        }
        Command::Host {
            addr,
            anyone_starts,
        } => {
            play(
                TuiMode::Host {
                    addr,
                    anyone_starts,
                },
                config,
            )
            .await
        }
        Command::JoinPeer {
            addr,
            anyone_starts,
        } => {
            play(
                TuiMode::JoinPeer {
                    addr,
                    anyone_starts,
                },
                config,
            )
            .await
        }
        Command::Join { addr } => play(TuiMode::Join { addr }, config).await,
    }
}

/// Run the relay server
#[instrument(skip_all)]
async fn run_server(config: ArenaConfig) -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!(
        relay = %config.relay_addr(),
        http = %config.http_addr(),
        "Starting tic-tac-toe relay"
    );
    run_relay(&config).await
}

/// Run the terminal client
async fn play(mode: TuiMode, config: ArenaConfig) -> Result<()> {
    config.validate()?;
    run_tui(mode, &config).await
}
