//! Outbound path. Sending is only allowed while the session is connected;
//! anything else is reported to the caller rather than queued.

use std::sync::Arc;

use chorerank_core::error::{ChoreError, Result};
use tokio::sync::watch;

use crate::session::SessionState;
use crate::transport::Transport;

#[derive(Clone)]
pub struct Outbox {
    transport: Arc<dyn Transport>,
    state: watch::Receiver<SessionState>,
}

impl Outbox {
    pub fn new(transport: Arc<dyn Transport>, state: watch::Receiver<SessionState>) -> Self {
        Self { transport, state }
    }

    pub fn state(&self) -> SessionState {
        *self.state.borrow()
    }

    pub async fn send(&self, target: &str, text: &str) -> Result<()> {
        match self.state() {
            SessionState::Connected => self.transport.send(target, text).await,
            SessionState::LoggedOut => {
                tracing::warn!("📭 Not sending to {target}: session logged out");
                Err(ChoreError::LoggedOut)
            }
            state => {
                tracing::warn!("📭 Not sending to {target}: session {state}");
                Err(ChoreError::TransportUnavailable(format!("session {state}")))
            }
        }
    }
}
