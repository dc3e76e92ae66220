//! # ChoreRank Agent
//! Chat-facing side of the bot: parses commands and answers them from the store.

pub mod command;
pub mod dispatcher;
pub mod fallback;

pub use command::{Command, Parsed};
pub use dispatcher::Dispatcher;
pub use fallback::{Fallback, FallbackReply};
