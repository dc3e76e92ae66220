//! Notifications produced by workflows, and the sink they are pushed to.
//! Lightweight: no queues. A notification is recorded, then handed to the sink.

use async_trait::async_trait;
use chorerank_core::error::Result;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// Ring buffer size for notification history.
const HISTORY_LIMIT: usize = 100;

/// A notification to push to the group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    /// Title/summary.
    pub title: String,
    /// Body content, sent as-is.
    pub body: String,
    /// Trigger that produced it.
    pub source: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

impl Notification {
    pub fn new(title: &str, body: String, source: &str) -> Self {
        Self {
            title: title.to_string(),
            body,
            source: source.to_string(),
            timestamp: chrono::Utc::now(),
        }
    }
}

/// Where workflow notifications go. Implemented by the binary on top of the
/// session's outbox, so this crate does not depend on the transport.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, notification: &Notification) -> Result<()>;
}

/// In-memory history of fired notifications (last 100).
#[derive(Debug, Default)]
pub struct NotifyLog {
    history: VecDeque<Notification>,
}

impl NotifyLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a fired notification.
    pub fn record(&mut self, notification: Notification) {
        self.history.push_back(notification);
        if self.history.len() > HISTORY_LIMIT {
            self.history.pop_front();
        }
    }

    /// Oldest first.
    pub fn history(&self) -> impl Iterator<Item = &Notification> {
        self.history.iter()
    }

    pub fn len(&self) -> usize {
        self.history.len()
    }

    pub fn is_empty(&self) -> bool {
        self.history.is_empty()
    }

    pub fn last(&self) -> Option<&Notification> {
        self.history.back()
    }
}
