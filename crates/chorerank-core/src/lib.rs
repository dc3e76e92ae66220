//! # ChoreRank Core
//! Shared domain types, the error taxonomy and the configuration system.

pub mod config;
pub mod error;
pub mod render;
pub mod types;

pub use config::ChoreRankConfig;
pub use error::{ChoreError, Result};
pub use types::{
    Completion, DefaultTask, DefaultTaskId, IncomingMessage, PeriodSnapshot, ScoreEntry, Task,
    TaskId,
};
