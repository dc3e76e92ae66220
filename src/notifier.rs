//! Scheduled notifications go out through the session outbox to one chat.

use async_trait::async_trait;
use chorerank_channels::Outbox;
use chorerank_core::error::Result;
use chorerank_scheduler::{Notification, Notifier};

pub struct OutboxNotifier {
    outbox: Outbox,
    target: String,
}

impl OutboxNotifier {
    pub fn new(outbox: Outbox, target: String) -> Self {
        Self { outbox, target }
    }
}

#[async_trait]
impl Notifier for OutboxNotifier {
    async fn notify(&self, notification: &Notification) -> Result<()> {
        if self.target.is_empty() {
            tracing::info!(
                "📝 [{}] no notify.target set, not sending:\n{}",
                notification.source,
                notification.body
            );
            return Ok(());
        }
        self.outbox.send(&self.target, &notification.body).await
    }
}
