//! # ChoreRank Scheduler
//!
//! Wall-clock triggers that drive the scoring store without a chat command.
//!
//! ## Architecture
//! ```text
//! Orchestrator (one tokio task per trigger)
//!   ├── morning_digest  08:00 daily        → list all tasks
//!   ├── pending_notice  20:00 daily        → list pending tasks / all clear
//!   ├── penalty_sweep   23:00 daily        → sweep pending, report penalized
//!   └── period_close    23:59 last-of-month → archive + clear standings, name winner
//!         └── Notification → NotifyLog (history) → Notifier (spawned, best effort)
//! ```
//!
//! Missed fires while the process is down are not replayed.

pub mod calendar;
pub mod engine;
pub mod notify;
pub mod workflow;

pub use calendar::{Recurrence, TriggerSchedule};
pub use engine::{Clock, Orchestrator, Trigger, WallClock, triggers_from_config};
pub use notify::{Notification, Notifier, NotifyLog};
pub use workflow::Workflow;
