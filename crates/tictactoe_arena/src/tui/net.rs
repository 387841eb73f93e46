//! Line-oriented TCP link between the client and a peer or relay.

use crate::lines::LineReader;
use anyhow::{Context, Result};
use tokio::io::{AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tracing::{debug, info, instrument, warn};

/// Something that arrived on the link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkEvent {
    /// One received line, without the newline.
    Line(String),
    /// The other side hung up.
    Closed,
}

/// Both directions of a connection, driven by background tasks.
#[derive(Debug)]
pub struct Link {
    incoming: mpsc::UnboundedReceiver<LinkEvent>,
    outgoing: mpsc::UnboundedSender<String>,
}

impl Link {
    /// Connects to `addr`.
    #[instrument]
    pub async fn connect(addr: &str) -> Result<Self> {
        let stream = TcpStream::connect(addr)
            .await
            .with_context(|| format!("Failed to connect to {}", addr))?;
        info!("Connected");
        Ok(Self::spawn(stream))
    }

    /// Listens on `addr` and waits for exactly one opponent.
    #[instrument]
    pub async fn accept_one(addr: &str) -> Result<Self> {
        let listener = TcpListener::bind(addr)
            .await
            .with_context(|| format!("Failed to listen on {}", addr))?;
        let (stream, peer) = listener.accept().await.context("Accept failed")?;
        info!(%peer, "Opponent connected");
        Ok(Self::spawn(stream))
    }

    /// Splits `stream` into a reader task and a writer task.
    pub fn spawn(stream: TcpStream) -> Self {
        let (reader, mut writer) = stream.into_split();
        let (in_tx, incoming) = mpsc::unbounded_channel();
        let (outgoing, mut out_rx) = mpsc::unbounded_channel::<String>();

        tokio::spawn(async move {
            let mut lines = LineReader::new(BufReader::new(reader));
            loop {
                match lines.next_line().await {
                    Ok(Some(Err(e))) => warn!(error = %e, "Dropping unreadable line"),
                    Ok(Some(Ok(line))) => {
                        if in_tx.send(LinkEvent::Line(line)).is_err() {
                            break;
                        }
                    }
                    Ok(None) => break,
                    Err(e) => {
                        warn!(error = %e, "Read failed");
                        break;
                    }
                }
            }
            let _ = in_tx.send(LinkEvent::Closed);
            debug!("Reader finished");
        });

        tokio::spawn(async move {
            while let Some(mut line) = out_rx.recv().await {
                line.push('\n');
                if let Err(e) = writer.write_all(line.as_bytes()).await {
                    warn!(error = %e, "Write failed");
                    break;
                }
            }
            debug!("Writer finished");
        });

        Self { incoming, outgoing }
    }

    /// Queues a line for sending. Lines sent after the link closed are dropped.
    pub fn send(&self, line: String) {
        if self.outgoing.send(line).is_err() {
            debug!("Link closed, dropping line");
        }
    }

    /// Next received event, if one is waiting.
    pub fn try_next(&mut self) -> Option<LinkEvent> {
        self.incoming.try_recv().ok()
    }
}
