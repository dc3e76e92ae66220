//! Async handle over the store: every call runs on tokio's blocking pool so
//! SQLite I/O never stalls the runtime threads that drive timers and the session.

use std::sync::Arc;

use chorerank_core::error::{ChoreError, Result};
use chorerank_core::types::{
    Completion, DefaultTask, DefaultTaskId, PeriodSnapshot, ScoreEntry, Task, TaskId,
};

use crate::db::ScoreDb;

/// Cheap-to-clone shared handle to the scoring store.
#[derive(Clone)]
pub struct StoreHandle {
    db: Arc<ScoreDb>,
}

impl StoreHandle {
    pub fn new(db: ScoreDb) -> Self {
        Self { db: Arc::new(db) }
    }

    /// Borrow the synchronous store.
    pub fn db(&self) -> &ScoreDb {
        &self.db
    }

    async fn run<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&ScoreDb) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let db = Arc::clone(&self.db);
        tokio::task::spawn_blocking(move || f(&db))
            .await
            .map_err(|e| ChoreError::StorageUnavailable(format!("store call aborted: {e}")))?
    }

    pub async fn add_task(&self, owner: String, description: String, points: i64) -> Result<TaskId> {
        self.run(move |db| db.add_task(&owner, &description, points)).await
    }

    pub async fn list_tasks(&self) -> Result<Vec<Task>> {
        self.run(|db| db.list_tasks()).await
    }

    pub async fn list_pending(&self) -> Result<Vec<Task>> {
        self.run(|db| db.list_pending()).await
    }

    pub async fn complete_task(&self, id: TaskId) -> Result<Completion> {
        self.run(move |db| db.complete_task(id)).await
    }

    pub async fn sweep_pending(&self) -> Result<Vec<Task>> {
        self.run(|db| db.sweep_pending()).await
    }

    pub async fn ranking(&self) -> Result<Vec<ScoreEntry>> {
        self.run(|db| db.ranking()).await
    }

    pub async fn reset_ranking(&self) -> Result<()> {
        self.run(|db| db.reset_ranking()).await
    }

    pub async fn close_period(&self, period: String) -> Result<PeriodSnapshot> {
        self.run(move |db| db.close_period(&period)).await
    }

    pub async fn period_history(&self, period: String) -> Result<Vec<ScoreEntry>> {
        self.run(move |db| db.period_history(&period)).await
    }

    pub async fn add_default(
        &self,
        owner: String,
        description: String,
        points: i64,
    ) -> Result<DefaultTaskId> {
        self.run(move |db| db.add_default(&owner, &description, points)).await
    }

    pub async fn list_defaults(&self) -> Result<Vec<DefaultTask>> {
        self.run(|db| db.list_defaults()).await
    }

    pub async fn remove_default(&self, id: DefaultTaskId) -> Result<bool> {
        self.run(move |db| db.remove_default(id)).await
    }

    pub async fn apply_defaults(&self) -> Result<Vec<Task>> {
        self.run(|db| db.apply_defaults()).await
    }
}
