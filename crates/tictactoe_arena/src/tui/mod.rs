//! Terminal client.

mod app;
mod input;
mod net;
mod ui;

pub use app::{App, Computer, Table};
pub use input::{Action, action_for, move_cursor};
pub use net::{Link, LinkEvent};

use crate::ArenaConfig;
use anyhow::{Context, Result};
use crossterm::{
    event::{self, Event, KeyEventKind},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{Terminal, backend::CrosstermBackend};
use std::io::{self, Stdout};
use std::time::Duration;
use tictactoe_core::{DecisionEngine, GameSession, Mark, PeerSession, RelayMirror, StartMode, encode};
use tracing::{error, info, instrument};

/// Log file for the terminal client.
pub const LOG_FILE: &str = "tictactoe_tui.log";

/// Which game the client opens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TuiMode {
    /// Two players share the keyboard.
    Local,
    /// Play the computer.
    Computer {
        /// The mark the human plays.
        human: Mark,
    },
    /// Wait for a peer to connect; the host plays X.
    Host {
        /// Address to listen on.
        addr: String,
        /// Let either side make the first move.
        anyone_starts: bool,
    },
    /// Connect to a hosting peer and play O.
    JoinPeer {
        /// Host address.
        addr: String,
        /// Must match the host's setting.
        anyone_starts: bool,
    },
    /// Connect to a relay server.
    Join {
        /// Relay address.
        addr: String,
    },
}

/// Sends logs to [`LOG_FILE`] so they don't corrupt the screen.
pub fn init_file_logging() -> Result<()> {
    let log_file = std::fs::File::create(LOG_FILE).context("Failed to create log file")?;
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::sync::Arc::new(log_file))
        .with_ansi(false)
        .try_init();
    Ok(())
}

/// Run the terminal client.
#[instrument(skip(config))]
pub async fn run_tui(mode: TuiMode, config: &ArenaConfig) -> Result<()> {
    init_file_logging()?;
    info!("Starting terminal client");

    let (table, link) = open_table(&mode, config).await?;
    let mut app = App::new(table);

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout))?;

    let res = run_loop(&mut terminal, &mut app, link).await;

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(err) = &res {
        error!(error = ?err, "Client loop error");
    }
    res
}

async fn open_table(mode: &TuiMode, config: &ArenaConfig) -> Result<(Table, Option<Link>)> {
    let start = |anyone: bool| {
        if anyone {
            StartMode::AnyoneStarts
        } else {
            StartMode::XFirst
        }
    };
    Ok(match mode {
        TuiMode::Local => (Table::Local(GameSession::new()), None),
        TuiMode::Computer { human } => {
            let throttle = config.engine().throttle()?;
            let engine = DecisionEngine::playing(human.opponent(), throttle);
            (
                Table::Computer {
                    game: GameSession::new(),
                    engine,
                },
                None,
            )
        }
        TuiMode::Host {
            addr,
            anyone_starts,
        } => {
            println!("Waiting for an opponent on {} ...", addr);
            let link = Link::accept_one(addr).await?;
            (Table::Peer(PeerSession::host(start(*anyone_starts))), Some(link))
        }
        TuiMode::JoinPeer {
            addr,
            anyone_starts,
        } => {
            let link = Link::connect(addr).await?;
            (Table::Peer(PeerSession::guest(start(*anyone_starts))), Some(link))
        }
        TuiMode::Join { addr } => {
            let link = Link::connect(addr).await?;
            (Table::Relay(RelayMirror::new()), Some(link))
        }
    })
}

async fn run_loop(
    terminal: &mut Terminal<CrosstermBackend<Stdout>>,
    app: &mut App,
    mut link: Option<Link>,
) -> Result<()> {
    loop {
        terminal.draw(|f| ui::draw(f, app))?;

        if let Some(active) = link.as_mut() {
            while let Some(event) = active.try_next() {
                match event {
                    LinkEvent::Line(line) => app.receive_line(&line),
                    LinkEvent::Closed => app.disconnected(),
                }
            }
        }

        if event::poll(Duration::from_millis(50))? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    app.handle_key(key.code);
                }
            }
        }

        for message in app.take_outbox() {
            if let Some(active) = link.as_ref() {
                active.send(encode(&message));
            }
        }

        if app.should_quit() {
            info!("Quit requested");
            return Ok(());
        }
    }
}
