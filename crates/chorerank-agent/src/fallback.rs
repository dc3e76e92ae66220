//! Free-text fallback for messages that are not commands (e.g. an LLM).
//! Only the seam lives here; the binary wires no implementation by default.

use async_trait::async_trait;
use chorerank_core::error::Result;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FallbackReply {
    Text(String),
    /// Upstream quota or rate limit hit.
    CapacityExceeded,
}

#[async_trait]
pub trait Fallback: Send + Sync {
    async fn ask(&self, text: &str) -> Result<FallbackReply>;
}
