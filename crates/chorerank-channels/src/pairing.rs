//! Pairing display — shows the operator what to scan or type.

/// Presentation surface for a pairing payload.
pub trait PairingDisplay: Send + Sync {
    fn show(&self, payload: &str);
}

/// Prints the payload to stderr, framed so it stands out in the log stream.
pub struct TerminalPairingDisplay;

impl PairingDisplay for TerminalPairingDisplay {
    fn show(&self, payload: &str) {
        let width = payload.chars().count() + 4;
        eprintln!("┌{}┐", "─".repeat(width));
        eprintln!("│  {payload}  │");
        eprintln!("└{}┘", "─".repeat(width));
        eprintln!("📱 Pair this session to continue.");
    }
}
