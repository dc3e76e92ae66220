//! Domain records shared by the store, scheduler, channels and dispatcher.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

/// Task identifier, assigned in creation order by the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TaskId(pub i64);

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for TaskId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().trim_start_matches('#').parse().map(TaskId)
    }
}

/// Identifier of a default (template) task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct DefaultTaskId(pub i64);

impl fmt::Display for DefaultTaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A unit of work assigned to one owner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,
    /// Free-text name of the responsible person.
    pub owner: String,
    pub description: String,
    /// Reward applied to the owner's score on completion.
    pub points: i64,
    /// Flips false → true at most once.
    pub done: bool,
    pub created_at: DateTime<Utc>,
}

/// Running point total for one owner name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreEntry {
    pub name: String,
    pub total: i64,
}

impl ScoreEntry {
    pub fn new(name: impl Into<String>, total: i64) -> Self {
        Self {
            name: name.into(),
            total,
        }
    }

    /// Ranking order: highest total first, ties by name ascending.
    pub fn ranking_cmp(&self, other: &Self) -> Ordering {
        other
            .total
            .cmp(&self.total)
            .then_with(|| self.name.cmp(&other.name))
    }
}

/// Template task, copied into the task list on demand.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DefaultTask {
    pub id: DefaultTaskId,
    pub owner: String,
    pub description: String,
    pub points: i64,
}

/// Result of completing a task.
#[derive(Debug, Clone, PartialEq)]
pub enum Completion {
    /// The task was pending; it is now done and its points were credited.
    Done(Task),
    /// The task was already done; nothing changed.
    AlreadyDone(Task),
}

impl Completion {
    pub fn task(&self) -> &Task {
        match self {
            Completion::Done(t) | Completion::AlreadyDone(t) => t,
        }
    }

    pub fn is_noop(&self) -> bool {
        matches!(self, Completion::AlreadyDone(_))
    }
}

/// Final standings of a closed period, archived before the ranking is cleared.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeriodSnapshot {
    /// Period label, `YYYY-MM`.
    pub period: String,
    /// Standings in ranking order.
    pub standings: Vec<ScoreEntry>,
    pub closed_at: DateTime<Utc>,
}

impl PeriodSnapshot {
    /// Top entry of the standings, if anyone scored.
    pub fn winner(&self) -> Option<&ScoreEntry> {
        self.standings.first()
    }
}

/// Inbound chat message, already decoded by the transport.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IncomingMessage {
    /// Transport name (e.g. "console").
    pub channel: String,
    /// Where replies go (chat / group id).
    pub thread_id: String,
    pub sender_id: String,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}
