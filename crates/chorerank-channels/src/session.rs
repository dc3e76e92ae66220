//! Session lifecycle: a pure state machine plus the runtime that drives a
//! [`Transport`] through it.
//!
//! ```text
//! Disconnected ──► Connecting ──► Authenticating ──► Connected
//!       ▲              ▲  │                              │
//!       │  backoff     │  └──────────────────────────────┤ lost
//!       └──────────────┴─────────────────────────────────┘
//!                      ▲                                 │ logged out
//!                      └──── fresh pairing ◄── LoggedOut ◄┘
//! ```

use std::sync::Arc;
use std::time::Duration;

use chorerank_core::config::SessionConfig;
use chorerank_core::error::Result;
use chorerank_core::types::IncomingMessage;
use rand::Rng;
use tokio::sync::{mpsc, watch};

use crate::credentials::CredentialStore;
use crate::outbox::Outbox;
use crate::pairing::PairingDisplay;
use crate::transport::{Credentials, DisconnectReason, Transport, TransportEvent};

/// Event buffer between a transport connection and the runtime.
const EVENT_BUFFER: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Disconnected,
    Connecting,
    Authenticating,
    Connected,
    LoggedOut,
}

impl std::fmt::Display for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            SessionState::Disconnected => "disconnected",
            SessionState::Connecting => "connecting",
            SessionState::Authenticating => "authenticating",
            SessionState::Connected => "connected",
            SessionState::LoggedOut => "logged out",
        };
        f.write_str(s)
    }
}

/// Reconnect delays: doubling from `initial`, capped at `max`, with up to 10%
/// shaved off at random so restarting peers do not reconnect in lockstep.
#[derive(Debug, Clone)]
pub struct Backoff {
    initial: Duration,
    max: Duration,
    attempt: u32,
}

impl Backoff {
    pub fn new(initial: Duration, max: Duration) -> Self {
        Self {
            initial,
            max: max.max(initial),
            attempt: 0,
        }
    }

    pub fn from_config(config: &SessionConfig) -> Self {
        Self::new(
            Duration::from_secs(config.backoff_initial_secs),
            Duration::from_secs(config.backoff_max_secs),
        )
    }

    pub fn next_delay(&mut self) -> Duration {
        let factor = 2u32.saturating_pow(self.attempt.min(16));
        let base = self.initial.saturating_mul(factor).min(self.max);
        self.attempt = self.attempt.saturating_add(1);

        let jitter_ms = (base.as_millis() / 10) as u64;
        if jitter_ms == 0 {
            return base;
        }
        base - Duration::from_millis(rand::thread_rng().gen_range(0..=jitter_ms))
    }

    pub fn reset(&mut self) {
        self.attempt = 0;
    }
}

/// Side effects requested by the state machine.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    ShowPairing(String),
    SaveCredentials(Credentials),
    ClearCredentials,
    Deliver(IncomingMessage),
    /// Close out this connection and open a new one after `delay`.
    /// `fresh_pairing` means: do not offer stored credentials.
    Reconnect { delay: Duration, fresh_pairing: bool },
}

/// Pure session state machine. No I/O; the runtime executes the effects.
#[derive(Debug)]
pub struct SessionMachine {
    state: SessionState,
    backoff: Backoff,
}

impl SessionMachine {
    pub fn new(backoff: Backoff) -> Self {
        Self {
            state: SessionState::Disconnected,
            backoff,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// A new connection attempt is starting.
    pub fn begin_connect(&mut self) {
        self.state = SessionState::Connecting;
    }

    /// The transport failed to open at all. Returns the retry delay.
    pub fn open_failed(&mut self) -> Duration {
        self.state = SessionState::Disconnected;
        self.backoff.next_delay()
    }

    pub fn handle(&mut self, event: TransportEvent) -> Vec<Effect> {
        match event {
            TransportEvent::Connecting => {
                self.state = SessionState::Connecting;
                vec![]
            }
            TransportEvent::Pairing(payload) => {
                self.state = SessionState::Authenticating;
                vec![Effect::ShowPairing(payload)]
            }
            TransportEvent::Connected => {
                self.state = SessionState::Connected;
                self.backoff.reset();
                vec![]
            }
            TransportEvent::CredentialsUpdated(credentials) => {
                if self.state == SessionState::Connecting {
                    self.state = SessionState::Authenticating;
                }
                vec![Effect::SaveCredentials(credentials)]
            }
            TransportEvent::Message(msg) => {
                if self.state == SessionState::Connected {
                    vec![Effect::Deliver(msg)]
                } else {
                    tracing::warn!("Dropping inbound message while {}", self.state);
                    vec![]
                }
            }
            TransportEvent::Disconnected(DisconnectReason::LoggedOut) => {
                self.state = SessionState::LoggedOut;
                vec![
                    Effect::ClearCredentials,
                    Effect::Reconnect {
                        delay: self.backoff.next_delay(),
                        fresh_pairing: true,
                    },
                ]
            }
            TransportEvent::Disconnected(DisconnectReason::Lost(_)) => {
                self.state = SessionState::Disconnected;
                vec![Effect::Reconnect {
                    delay: self.backoff.next_delay(),
                    fresh_pairing: false,
                }]
            }
        }
    }
}

/// Owns the transport session and keeps it alive.
pub struct SessionRuntime {
    transport: Arc<dyn Transport>,
    credentials: Arc<dyn CredentialStore>,
    display: Arc<dyn PairingDisplay>,
    machine: SessionMachine,
    state_tx: watch::Sender<SessionState>,
}

impl SessionRuntime {
    pub fn new(
        transport: Arc<dyn Transport>,
        credentials: Arc<dyn CredentialStore>,
        display: Arc<dyn PairingDisplay>,
        backoff: Backoff,
    ) -> Self {
        let (state_tx, _) = watch::channel(SessionState::Disconnected);
        Self {
            transport,
            credentials,
            display,
            machine: SessionMachine::new(backoff),
            state_tx,
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.state_tx.subscribe()
    }

    /// Send path gated on this session being connected.
    pub fn outbox(&self) -> Outbox {
        Outbox::new(Arc::clone(&self.transport), self.subscribe())
    }

    fn publish(&self) {
        let state = self.machine.state();
        let previous = self.state_tx.send_replace(state);
        if previous != state {
            tracing::info!("📶 Session {}: {previous} → {state}", self.transport.name());
        }
    }

    /// Run until the inbound receiver is dropped.
    pub async fn run(mut self, inbound: mpsc::Sender<IncomingMessage>) -> Result<()> {
        let mut fresh_pairing = false;
        loop {
            self.machine.begin_connect();
            self.publish();

            let credentials = if fresh_pairing {
                None
            } else {
                self.credentials.load().unwrap_or_else(|e| {
                    tracing::warn!("⚠️ Stored credentials unreadable, pairing anew: {e}");
                    None
                })
            };

            let (events_tx, mut events_rx) = mpsc::channel(EVENT_BUFFER);
            let next = match self.transport.open(credentials, events_tx).await {
                Ok(()) => {
                    match self.pump(&mut events_rx, &inbound).await {
                        Some(next) => next,
                        // inbound side is gone: shutting down
                        None => return Ok(()),
                    }
                }
                Err(e) => {
                    tracing::warn!("❌ {} connect failed: {e}", self.transport.name());
                    let delay = self.machine.open_failed();
                    self.publish();
                    (delay, false)
                }
            };

            let (delay, fresh) = next;
            fresh_pairing = fresh;
            tracing::info!("🔄 Reconnecting {} in {:?}", self.transport.name(), delay);
            if inbound.is_closed() {
                return Ok(());
            }
            tokio::time::sleep(delay).await;
        }
    }

    /// Apply events from one connection until it ends. Returns the reconnect
    /// plan, or `None` once nobody is listening for inbound messages.
    async fn pump(
        &mut self,
        events: &mut mpsc::Receiver<TransportEvent>,
        inbound: &mpsc::Sender<IncomingMessage>,
    ) -> Option<(Duration, bool)> {
        loop {
            let event = events.recv().await.unwrap_or_else(|| {
                TransportEvent::Disconnected(DisconnectReason::Lost("event stream closed".into()))
            });
            if let TransportEvent::Disconnected(reason) = &event {
                tracing::warn!("🔌 {} disconnected: {reason}", self.transport.name());
            }

            let effects = self.machine.handle(event);
            self.publish();

            let mut reconnect = None;
            for effect in effects {
                match effect {
                    Effect::ShowPairing(payload) => self.display.show(&payload),
                    Effect::SaveCredentials(credentials) => {
                        if let Err(e) = self.credentials.save(&credentials) {
                            tracing::error!("Failed to persist credentials: {e}");
                        }
                    }
                    Effect::ClearCredentials => {
                        if let Err(e) = self.credentials.clear() {
                            tracing::error!("Failed to clear credentials: {e}");
                        }
                    }
                    Effect::Deliver(msg) => {
                        if inbound.send(msg).await.is_err() {
                            return None;
                        }
                    }
                    Effect::Reconnect {
                        delay,
                        fresh_pairing,
                    } => reconnect = Some((delay, fresh_pairing)),
                }
            }
            if reconnect.is_some() {
                return reconnect;
            }
        }
    }
}
