//! Transport interface — the chat protocol itself lives behind this trait.

use async_trait::async_trait;
use chorerank_core::error::Result;
use chorerank_core::types::IncomingMessage;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

/// Opaque session credentials, persisted between runs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Credentials(pub serde_json::Value);

/// Why a connection ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DisconnectReason {
    /// The remote side revoked the session. Stored credentials are dead.
    LoggedOut,
    /// Anything else: network drop, server restart, handshake failure.
    Lost(String),
}

impl std::fmt::Display for DisconnectReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DisconnectReason::LoggedOut => write!(f, "logged out"),
            DisconnectReason::Lost(reason) => write!(f, "{reason}"),
        }
    }
}

/// Lifecycle events and inbound traffic emitted by an open connection.
#[derive(Debug, Clone, PartialEq)]
pub enum TransportEvent {
    Connecting,
    /// Operator must pair the session (scan/enter this payload).
    Pairing(String),
    Connected,
    Disconnected(DisconnectReason),
    CredentialsUpdated(Credentials),
    Message(IncomingMessage),
}

/// A chat transport.
#[async_trait]
pub trait Transport: Send + Sync {
    fn name(&self) -> &str;

    /// Start one connection attempt. Events flow into `events` until the
    /// connection ends with [`TransportEvent::Disconnected`]. An `Err` means the
    /// attempt failed before any event was emitted.
    async fn open(
        &self,
        credentials: Option<Credentials>,
        events: mpsc::Sender<TransportEvent>,
    ) -> Result<()>;

    /// Send a text message to a chat.
    async fn send(&self, target: &str, text: &str) -> Result<()>;
}
