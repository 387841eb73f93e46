//! TCP listener speaking newline-delimited JSON.

use super::{ConnId, RelayState, status_router};
use crate::ArenaConfig;
use crate::lines::LineReader;
use anyhow::{Context, Result};
use std::future::IntoFuture;
use tictactoe_core::{PeerMessage, ServerMessage, decode_lossy, encode};
use tokio::io::{AsyncWrite, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, info, instrument, warn};

/// Runs the relay and its status API until either fails.
#[instrument(skip_all, fields(relay = %config.relay_addr(), http = %config.http_addr()))]
pub async fn run_relay(config: &ArenaConfig) -> Result<()> {
    let state = RelayState::new(*config.relay().max_chat_len());

    let games = TcpListener::bind(config.relay_addr())
        .await
        .with_context(|| format!("Failed to bind relay on {}", config.relay_addr()))?;
    let http = TcpListener::bind(config.http_addr())
        .await
        .with_context(|| format!("Failed to bind status API on {}", config.http_addr()))?;

    info!("Relay ready");
    let app = status_router(state.clone());

    tokio::select! {
        result = serve_relay(games, state) => result,
        result = axum::serve(http, app).into_future() => result.context("Status API stopped"),
        _ = tokio::signal::ctrl_c() => {
            info!("Shutdown signal received, stopping relay");
            Ok(())
        }
    }
}

/// Accepts game connections forever.
pub async fn serve_relay(listener: TcpListener, state: RelayState) -> Result<()> {
    loop {
        let (stream, addr) = listener.accept().await.context("Accept failed")?;
        let state = state.clone();
        let conn = state.next_conn_id();
        debug!(conn, %addr, "Accepted connection");
        tokio::spawn(async move {
            if let Err(e) = handle_connection(stream, state, conn).await {
                warn!(conn, error = %e, "Connection ended with error");
            }
        });
    }
}

#[instrument(skip(stream, state))]
async fn handle_connection(stream: TcpStream, state: RelayState, conn: ConnId) -> Result<()> {
    let (reader, mut writer) = stream.into_split();
    let mut lines = LineReader::new(BufReader::new(reader));

    let (mut broadcasts, greeting) = state.join(conn).await;
    write_all(&mut writer, &greeting).await?;

    let result = loop {
        tokio::select! {
            line = lines.next_line() => match line {
                Ok(Some(Err(e))) => {
                    warn!(error = %e, "Dropping unreadable line");
                    continue;
                }
                Ok(Some(Ok(line))) => {
                    let Some(message) = decode_lossy::<PeerMessage>(&line) else {
                        continue;
                    };
                    let direct = {
                        let mut room = state.room().lock().await;
                        let out = room.handle(conn, message);
                        state.publish(out)
                    };
                    if let Err(e) = write_all(&mut writer, &direct).await {
                        break Err(e);
                    }
                }
                Ok(None) => break Ok(()),
                Err(e) => break Err(anyhow::Error::new(e).context("Read failed")),
            },
            received = broadcasts.recv() => match received {
                Ok(message) => {
                    if let Err(e) = write_line(&mut writer, &message).await {
                        break Err(e);
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    warn!(skipped, "Client fell behind, resending state");
                    if let Some(init) = state.resync(conn, &mut broadcasts).await {
                        if let Err(e) = write_line(&mut writer, &init).await {
                            break Err(e);
                        }
                    }
                }
                Err(RecvError::Closed) => break Ok(()),
            },
        }
    };

    state.room().lock().await.leave(conn);
    result
}

async fn write_all<W: AsyncWrite + Unpin>(writer: &mut W, messages: &[ServerMessage]) -> Result<()> {
    for message in messages {
        write_line(writer, message).await?;
    }
    Ok(())
}

async fn write_line<W: AsyncWrite + Unpin>(writer: &mut W, message: &ServerMessage) -> Result<()> {
    let mut line = encode(message);
    line.push('\n');
    writer
        .write_all(line.as_bytes())
        .await
        .context("Write failed")
}
