//! Console transport — stdin/stdout stand-in for a chat network.
//!
//! Input lines are `target> text`, or plain text for the `console` chat.
//! `/logout` and `/drop` simulate a remote revocation and a dropped link.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chorerank_core::error::{ChoreError, Result};
use chorerank_core::types::IncomingMessage;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::sync::mpsc;

use crate::transport::{Credentials, DisconnectReason, Transport, TransportEvent};

pub const CONSOLE_CHAT: &str = "console";

type EventSlot = Arc<Mutex<Option<mpsc::Sender<TransportEvent>>>>;

pub struct ConsoleTransport {
    /// Events sender of the live connection.
    current: EventSlot,
    reader_started: AtomicBool,
}

impl ConsoleTransport {
    pub fn new() -> Self {
        Self {
            current: Arc::new(Mutex::new(None)),
            reader_started: AtomicBool::new(false),
        }
    }

    fn spawn_reader(&self) {
        let current = Arc::clone(&self.current);
        tokio::spawn(async move {
            let mut lines = BufReader::new(tokio::io::stdin()).lines();
            loop {
                let line = match lines.next_line().await {
                    Ok(Some(line)) => line,
                    Ok(None) => {
                        tracing::info!("⌨️ stdin closed, console input stopped");
                        return;
                    }
                    Err(e) => {
                        tracing::error!("stdin read error: {e}");
                        return;
                    }
                };
                let Some(event) = parse_line(&line) else {
                    continue;
                };
                forward(&current, event).await;
            }
        });
    }
}

/// Hand a console event to the live connection. Returns false (and logs) when
/// there is none, e.g. while the session waits out a reconnect backoff.
async fn forward(current: &EventSlot, event: TransportEvent) -> bool {
    let sender = current.lock().ok().and_then(|slot| slot.clone());
    let Some(tx) = sender else {
        tracing::warn!("⌨️ Console input dropped: no connection open yet");
        return false;
    };
    if tx.send(event).await.is_err() {
        tracing::warn!("⌨️ Console input dropped: connection closed, session reconnecting");
        return false;
    }
    true
}

impl Default for ConsoleTransport {
    fn default() -> Self {
        Self::new()
    }
}

/// Turn one line of console input into a transport event.
pub fn parse_line(line: &str) -> Option<TransportEvent> {
    let line = line.trim();
    match line {
        "" => return None,
        "/logout" => return Some(TransportEvent::Disconnected(DisconnectReason::LoggedOut)),
        "/drop" => {
            return Some(TransportEvent::Disconnected(DisconnectReason::Lost(
                "dropped from console".into(),
            )));
        }
        _ => {}
    }

    let (target, text) = match line.split_once('>') {
        Some((target, text)) if !target.trim().is_empty() && !target.contains(' ') => {
            (target.trim(), text.trim())
        }
        _ => (CONSOLE_CHAT, line),
    };
    Some(TransportEvent::Message(IncomingMessage {
        channel: CONSOLE_CHAT.into(),
        thread_id: target.into(),
        sender_id: target.into(),
        content: text.into(),
        timestamp: chrono::Utc::now(),
    }))
}

async fn emit(events: &mpsc::Sender<TransportEvent>, event: TransportEvent) -> Result<()> {
    events
        .send(event)
        .await
        .map_err(|_| ChoreError::TransportUnavailable("session runtime gone".into()))
}

#[async_trait]
impl Transport for ConsoleTransport {
    fn name(&self) -> &str {
        CONSOLE_CHAT
    }

    async fn open(
        &self,
        credentials: Option<Credentials>,
        events: mpsc::Sender<TransportEvent>,
    ) -> Result<()> {
        emit(&events, TransportEvent::Connecting).await?;

        if credentials.is_none() {
            let device = uuid::Uuid::new_v4().simple().to_string();
            emit(&events, TransportEvent::Pairing(format!("chorerank://pair/{device}"))).await?;
            // The console accepts its own pairing request.
            let credentials = Credentials(serde_json::json!({
                "device_id": device,
                "paired_at": chrono::Utc::now().to_rfc3339(),
            }));
            emit(&events, TransportEvent::CredentialsUpdated(credentials)).await?;
        }
        emit(&events, TransportEvent::Connected).await?;

        if let Ok(mut slot) = self.current.lock() {
            *slot = Some(events);
        }
        if !self.reader_started.swap(true, Ordering::SeqCst) {
            self.spawn_reader();
        }
        Ok(())
    }

    async fn send(&self, target: &str, text: &str) -> Result<()> {
        let mut stdout = tokio::io::stdout();
        stdout
            .write_all(format!("[{target}] {text}\n").as_bytes())
            .await?;
        stdout.flush().await?;
        Ok(())
    }
}
