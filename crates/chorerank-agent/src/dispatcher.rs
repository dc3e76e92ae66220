//! Dispatcher — turns an inbound chat message into a store call and a reply.
//! Errors stop here: users get a short message, operators get a log line.

use std::sync::Arc;

use chorerank_core::error::{ChoreError, Result};
use chorerank_core::render;
use chorerank_core::types::{Completion, IncomingMessage};
use chorerank_store::StoreHandle;

use crate::command::{self, Command, HELP, Parsed};
use crate::fallback::{Fallback, FallbackReply};

pub struct Dispatcher {
    store: StoreHandle,
    fallback: Option<Arc<dyn Fallback>>,
}

impl Dispatcher {
    pub fn new(store: StoreHandle) -> Self {
        Self {
            store,
            fallback: None,
        }
    }

    pub fn with_fallback(mut self, fallback: Arc<dyn Fallback>) -> Self {
        self.fallback = Some(fallback);
        self
    }

    /// Reply text for `msg`, or `None` when the bot should stay quiet.
    pub async fn handle(&self, msg: &IncomingMessage) -> Option<String> {
        match command::parse(&msg.content) {
            Parsed::Command(cmd) => {
                tracing::info!("💬 {} → {:?}", msg.sender_id, cmd);
                Some(match self.execute(cmd).await {
                    Ok(reply) => reply,
                    Err(e) => error_reply(e),
                })
            }
            Parsed::Usage(hint) => Some(format!("⚠️ {hint}")),
            Parsed::Unrecognized => self.ask_fallback(&msg.content).await,
        }
    }

    async fn ask_fallback(&self, text: &str) -> Option<String> {
        let fallback = self.fallback.as_ref()?;
        match fallback.ask(text).await {
            Ok(FallbackReply::Text(reply)) => Some(reply),
            Ok(FallbackReply::CapacityExceeded) => Some(
                "⚠️ The assistant is at capacity right now. Chore commands still work!".into(),
            ),
            Err(e) => {
                tracing::warn!("Fallback failed: {e}");
                None
            }
        }
    }

    pub async fn execute(&self, cmd: Command) -> Result<String> {
        let store = &self.store;
        let reply = match cmd {
            Command::Add {
                owner,
                description,
                points,
            } => {
                let id = store.add_task(owner.clone(), description, points).await?;
                format!("✅ Task #{id} added for {owner} ({points} pts).")
            }
            Command::List => {
                let tasks = store.list_tasks().await?;
                if tasks.is_empty() {
                    "📋 No tasks yet.".into()
                } else {
                    render::task_list("📋 Checklist:", &tasks)
                }
            }
            Command::Pending => {
                let tasks = store.list_pending().await?;
                if tasks.is_empty() {
                    "🎉 Nothing pending!".into()
                } else {
                    render::task_list("⏳ Pending:", &tasks)
                }
            }
            Command::Done(id) => match store.complete_task(id).await? {
                Completion::Done(task) => format!(
                    "✅ Task #{} done! {} {:+} pts.",
                    task.id, task.owner, task.points
                ),
                Completion::AlreadyDone(task) => format!("ℹ️ Task #{} was already done.", task.id),
            },
            Command::Ranking => {
                let ranking = store.ranking().await?;
                if ranking.is_empty() {
                    "📊 No points recorded yet.".into()
                } else {
                    format!("📊 Ranking:\n{}", render::standings(&ranking))
                }
            }
            Command::Penalize => {
                let penalized = store.sweep_pending().await?;
                if penalized.is_empty() {
                    "✅ No pending tasks to penalize.".into()
                } else {
                    render::task_list(
                        &format!("⚠️ Penalized {} pending task(s):", penalized.len()),
                        &penalized,
                    )
                }
            }
            Command::Reset => {
                store.reset_ranking().await?;
                "♻️ Ranking reset!".into()
            }
            Command::DefaultAdd {
                owner,
                description,
                points,
            } => {
                let id = store.add_default(owner.clone(), description, points).await?;
                format!("📌 Default task #{id} saved for {owner}.")
            }
            Command::DefaultList => {
                let defaults = store.list_defaults().await?;
                if defaults.is_empty() {
                    "📌 No default tasks.".into()
                } else {
                    let mut out = String::from("📌 Default tasks:");
                    for d in &defaults {
                        out.push_str(&format!(
                            "\n#{} {} — {} ({} pts)",
                            d.id, d.owner, d.description, d.points
                        ));
                    }
                    out
                }
            }
            Command::DefaultRemove(id) => {
                if store.remove_default(id).await? {
                    format!("🗑️ Default task #{id} removed.")
                } else {
                    format!("❌ Default task #{id} not found.")
                }
            }
            Command::DefaultApply => {
                let added = store.apply_defaults().await?;
                if added.is_empty() {
                    "📌 No default tasks to apply.".into()
                } else {
                    render::task_list("📌 Added from defaults:", &added)
                }
            }
            Command::History(period) => {
                let standings = store.period_history(period.clone()).await?;
                if standings.is_empty() {
                    format!("📊 No history for {period}.")
                } else {
                    format!(
                        "📊 Final standings for {period}:\n{}",
                        render::standings(&standings)
                    )
                }
            }
            Command::Help => HELP.into(),
        };
        Ok(reply)
    }
}

fn error_reply(e: ChoreError) -> String {
    if !e.is_user_error() {
        tracing::error!("❌ Command failed: {e}");
        return "⚠️ Something went wrong, try again later.".into();
    }
    match e {
        ChoreError::NotFound(id) => format!("❌ Task #{id} not found."),
        other => format!("⚠️ {other}"),
    }
}
