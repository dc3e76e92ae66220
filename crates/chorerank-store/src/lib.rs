//! # ChoreRank Store
//!
//! SQLite persistence for tasks and score totals.
//!
//! ## Guarantees
//! - Completing a task flips its flag and credits its points in one transaction
//! - A sweep penalizes every pending task in one transaction
//! - Reads take the same lock as writes, so no half-applied sweep is ever visible
//!
//! `ScoreDb` is synchronous. Async callers go through [`StoreHandle`], which
//! runs each call on the blocking thread pool.

pub mod db;
pub mod handle;
pub mod ranking;

pub use db::ScoreDb;
pub use handle::StoreHandle;
