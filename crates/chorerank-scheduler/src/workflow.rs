//! The four scheduled workflows. Each pulls state from the store and turns it
//! into one notification; sending is left to the caller.

use chorerank_core::error::Result;
use chorerank_core::render;
use chorerank_store::StoreHandle;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::calendar::period_label;
use crate::notify::Notification;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Workflow {
    /// All tasks, done and pending.
    MorningDigest,
    /// Pending tasks only, or an all-clear.
    PendingNotice,
    /// Penalize every pending task and report who was hit.
    PenaltySweep,
    /// Report and archive the month's standings, then clear them.
    PeriodClose,
}

impl Workflow {
    pub fn name(&self) -> &'static str {
        match self {
            Workflow::MorningDigest => "morning_digest",
            Workflow::PendingNotice => "pending_notice",
            Workflow::PenaltySweep => "penalty_sweep",
            Workflow::PeriodClose => "period_close",
        }
    }

    /// Run against the store. `fire_date` is the local date the trigger was
    /// scheduled for; the period close uses it to label the closed month.
    pub async fn run(&self, store: &StoreHandle, fire_date: NaiveDate) -> Result<Notification> {
        let source = self.name();
        let notification = match self {
            Workflow::MorningDigest => {
                let tasks = store.list_tasks().await?;
                let body = if tasks.is_empty() {
                    "☀️ Good morning! No tasks on the checklist.".to_string()
                } else {
                    render::task_list("☀️ Good morning! Today's checklist:", &tasks)
                };
                Notification::new("Morning digest", body, source)
            }
            Workflow::PendingNotice => {
                let pending = store.list_pending().await?;
                let body = if pending.is_empty() {
                    "🎉 All clear, nothing pending!".to_string()
                } else {
                    render::task_list("⏳ Still pending:", &pending)
                };
                Notification::new("Pending tasks", body, source)
            }
            Workflow::PenaltySweep => {
                let penalized = store.sweep_pending().await?;
                let body = if penalized.is_empty() {
                    "✅ No pending tasks, nobody penalized.".to_string()
                } else {
                    render::task_list(
                        &format!(
                            "⚠️ {} pending task(s) penalized ({} pts each):",
                            penalized.len(),
                            store.db().penalty()
                        ),
                        &penalized,
                    )
                };
                Notification::new("Penalty sweep", body, source)
            }
            Workflow::PeriodClose => {
                let period = period_label(fire_date);
                let snapshot = store.close_period(period.clone()).await?;
                let body = match snapshot.winner() {
                    Some(winner) => format!(
                        "🏆 Final standings for {period}:\n{}\n\n👑 Winner: {} with {} pts!\n♻️ Ranking reset for the new month.",
                        render::standings(&snapshot.standings),
                        winner.name,
                        winner.total
                    ),
                    None => format!(
                        "📊 No points recorded in {period}.\n♻️ Ranking reset for the new month."
                    ),
                };
                Notification::new("Period close", body, source)
            }
        };
        tracing::debug!("Workflow {} produced '{}'", source, notification.title);
        Ok(notification)
    }
}
