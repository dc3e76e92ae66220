//! # ChoreRank Channels
//! Keeps the chat session alive: connect, pair, persist credentials,
//! reconnect with backoff, and gate outbound sends on the session state.

pub mod cli;
pub mod credentials;
pub mod outbox;
pub mod pairing;
pub mod session;
pub mod transport;

pub use cli::ConsoleTransport;
pub use credentials::{CredentialStore, FileCredentialStore, MemoryCredentialStore};
pub use outbox::Outbox;
pub use pairing::{PairingDisplay, TerminalPairingDisplay};
pub use session::{Backoff, SessionMachine, SessionRuntime, SessionState};
pub use transport::{Credentials, DisconnectReason, Transport, TransportEvent};
