//! SQLite-backed scoring store — tasks, score totals, default tasks, period archive.
//!
//! A single connection sits behind a mutex, so every operation (reads included)
//! is serialized against every write. Each mutating operation runs in one
//! transaction: either all of its rows change or none do.

use chorerank_core::error::{ChoreError, Result};
use chorerank_core::types::{
    Completion, DefaultTask, DefaultTaskId, PeriodSnapshot, Task, TaskId,
};
use chrono::{DateTime, Utc};
use rusqlite::{Connection, OptionalExtension, Row, params};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

/// Adds `?2` to the total of `?1`, creating the entry on first delta.
const UPSERT_SCORE: &str = "INSERT INTO scores (name, total) VALUES (?1, ?2)
     ON CONFLICT(name) DO UPDATE SET total = total + excluded.total";

const TASK_COLUMNS: &str = "id, owner, description, points, done, created_at";

/// Scoring store — exclusive owner of task and score records.
pub struct ScoreDb {
    conn: Mutex<Connection>,
    /// Delta applied per pending task by a sweep (zero or negative).
    penalty: i64,
}

impl ScoreDb {
    /// Open or create the store at `path`.
    pub fn open(path: &Path, penalty: i64) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA journal_mode=WAL;").ok();
        Self::with_connection(conn, penalty)
    }

    /// Private in-memory store, used by tests and dry runs.
    pub fn open_in_memory(penalty: i64) -> Result<Self> {
        Self::with_connection(Connection::open_in_memory()?, penalty)
    }

    fn with_connection(conn: Connection, penalty: i64) -> Result<Self> {
        if penalty > 0 {
            return Err(ChoreError::InvalidArgument(format!(
                "penalty must be zero or negative, got {penalty}"
            )));
        }
        let db = Self {
            conn: Mutex::new(conn),
            penalty,
        };
        db.migrate()?;
        Ok(db)
    }

    /// Run schema migrations.
    fn migrate(&self) -> Result<()> {
        let conn = self.lock()?;
        conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS tasks (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                owner TEXT NOT NULL,
                description TEXT NOT NULL,
                points INTEGER NOT NULL,
                done INTEGER NOT NULL DEFAULT 0,
                created_at TEXT NOT NULL,
                completed_at TEXT
            );
            CREATE INDEX IF NOT EXISTS idx_tasks_done ON tasks(done);

            -- One row per owner name ever scored; cleared at period close
            CREATE TABLE IF NOT EXISTS scores (
                name TEXT PRIMARY KEY,
                total INTEGER NOT NULL DEFAULT 0
            );

            CREATE TABLE IF NOT EXISTS default_tasks (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                owner TEXT NOT NULL,
                description TEXT NOT NULL,
                points INTEGER NOT NULL,
                created_at TEXT NOT NULL
            );

            -- Final standings of closed periods
            CREATE TABLE IF NOT EXISTS ranking_history (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                period TEXT NOT NULL,
                name TEXT NOT NULL,
                total INTEGER NOT NULL,
                closed_at TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_history_period ON ranking_history(period);
            ",
        )?;
        Ok(())
    }

    pub(crate) fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| ChoreError::StorageUnavailable(format!("Lock: {e}")))
    }

    /// Penalty delta applied per pending task.
    pub fn penalty(&self) -> i64 {
        self.penalty
    }

    // ─── Tasks ────────────────────────────────────────────────

    /// Create a pending task.
    pub fn add_task(&self, owner: &str, description: &str, points: i64) -> Result<TaskId> {
        let (owner, description) = validate_task_fields(owner, description)?;
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO tasks (owner, description, points, done, created_at)
             VALUES (?1, ?2, ?3, 0, ?4)",
            params![owner, description, points, Utc::now().to_rfc3339()],
        )?;
        let id = TaskId(conn.last_insert_rowid());
        tracing::info!("📝 Task {id} added: {owner} — {description} ({points} pts)");
        Ok(id)
    }

    /// All tasks, done and pending, in creation order.
    pub fn list_tasks(&self) -> Result<Vec<Task>> {
        let conn = self.lock()?;
        query_tasks(&conn, "1 = 1")
    }

    /// Pending tasks in creation order.
    pub fn list_pending(&self) -> Result<Vec<Task>> {
        let conn = self.lock()?;
        query_tasks(&conn, "done = 0")
    }

    pub fn get_task(&self, id: TaskId) -> Result<Option<Task>> {
        let conn = self.lock()?;
        fetch_task(&conn, id)
    }

    /// Mark a task done and credit its points to the owner, atomically.
    ///
    /// Completing an already-done task changes nothing and returns
    /// [`Completion::AlreadyDone`].
    pub fn complete_task(&self, id: TaskId) -> Result<Completion> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;

        let task = fetch_task(&tx, id)?.ok_or(ChoreError::NotFound(id))?;
        if task.done {
            tracing::debug!("Task {id} already done, nothing to score");
            return Ok(Completion::AlreadyDone(task));
        }

        tx.execute(
            "UPDATE tasks SET done = 1, completed_at = ?2 WHERE id = ?1 AND done = 0",
            params![id.0, Utc::now().to_rfc3339()],
        )?;
        tx.execute(UPSERT_SCORE, params![task.owner, task.points])?;
        tx.commit()?;

        tracing::info!(
            "✅ Task {id} done: {} +{} pts",
            task.owner,
            task.points
        );
        Ok(Completion::Done(Task { done: true, ..task }))
    }

    /// Apply the penalty once per pending task to that task's owner.
    ///
    /// Returns the tasks that were penalized, in creation order.
    pub fn sweep_pending(&self) -> Result<Vec<Task>> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;

        let pending = query_tasks(&tx, "done = 0")?;
        {
            let mut upsert = tx.prepare(UPSERT_SCORE)?;
            for task in &pending {
                upsert.execute(params![task.owner, self.penalty])?;
            }
        }
        tx.commit()?;

        tracing::info!(
            "⚠️ Sweep penalized {} pending task(s) by {} each",
            pending.len(),
            self.penalty
        );
        Ok(pending)
    }

    /// Delete every score entry. Tasks are kept.
    pub fn reset_ranking(&self) -> Result<()> {
        let conn = self.lock()?;
        let removed = conn.execute("DELETE FROM scores", [])?;
        tracing::info!("♻️ Ranking reset ({removed} entries removed)");
        Ok(())
    }

    /// Archive the current standings under `period`, then clear the ranking,
    /// in one transaction. The snapshot is exactly what was cleared.
    pub fn close_period(&self, period: &str) -> Result<PeriodSnapshot> {
        let period = period.trim();
        if period.is_empty() {
            return Err(ChoreError::InvalidArgument("period label is empty".into()));
        }
        let closed_at = Utc::now();

        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        let standings = crate::ranking::query_ranking(&tx)?;
        {
            let mut insert = tx.prepare(
                "INSERT INTO ranking_history (period, name, total, closed_at)
                 VALUES (?1, ?2, ?3, ?4)",
            )?;
            for entry in &standings {
                insert.execute(params![period, entry.name, entry.total, closed_at.to_rfc3339()])?;
            }
        }
        tx.execute("DELETE FROM scores", [])?;
        tx.commit()?;

        tracing::info!("🏁 Period {period} closed with {} entries", standings.len());
        Ok(PeriodSnapshot {
            period: period.to_string(),
            standings,
            closed_at,
        })
    }

    // ─── Default tasks ────────────────────────────────────────

    pub fn add_default(&self, owner: &str, description: &str, points: i64) -> Result<DefaultTaskId> {
        let (owner, description) = validate_task_fields(owner, description)?;
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO default_tasks (owner, description, points, created_at)
             VALUES (?1, ?2, ?3, ?4)",
            params![owner, description, points, Utc::now().to_rfc3339()],
        )?;
        Ok(DefaultTaskId(conn.last_insert_rowid()))
    }

    pub fn list_defaults(&self) -> Result<Vec<DefaultTask>> {
        let conn = self.lock()?;
        let mut stmt =
            conn.prepare("SELECT id, owner, description, points FROM default_tasks ORDER BY id")?;
        let rows = stmt.query_map([], |row| {
            Ok(DefaultTask {
                id: DefaultTaskId(row.get(0)?),
                owner: row.get(1)?,
                description: row.get(2)?,
                points: row.get(3)?,
            })
        })?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    /// Returns false when no default has that id.
    pub fn remove_default(&self, id: DefaultTaskId) -> Result<bool> {
        let conn = self.lock()?;
        let removed = conn.execute("DELETE FROM default_tasks WHERE id = ?1", params![id.0])?;
        Ok(removed > 0)
    }

    /// Create one pending task per default task, in one transaction.
    pub fn apply_defaults(&self) -> Result<Vec<Task>> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        let now = Utc::now().to_rfc3339();
        let first_new = tx.query_row("SELECT COALESCE(MAX(id), 0) FROM tasks", [], |r| {
            r.get::<_, i64>(0)
        })?;
        tx.execute(
            "INSERT INTO tasks (owner, description, points, done, created_at)
             SELECT owner, description, points, 0, ?1 FROM default_tasks ORDER BY id",
            params![now],
        )?;
        let created = query_tasks(&tx, &format!("id > {first_new}"))?;
        tx.commit()?;
        tracing::info!("📋 Applied {} default task(s)", created.len());
        Ok(created)
    }
}

fn validate_task_fields<'a>(owner: &'a str, description: &'a str) -> Result<(&'a str, &'a str)> {
    let owner = owner.trim();
    let description = description.trim();
    if owner.is_empty() {
        return Err(ChoreError::InvalidArgument("owner is empty".into()));
    }
    if description.is_empty() {
        return Err(ChoreError::InvalidArgument("description is empty".into()));
    }
    Ok((owner, description))
}

fn task_from_row(row: &Row<'_>) -> rusqlite::Result<Task> {
    let created_at: String = row.get(5)?;
    Ok(Task {
        id: TaskId(row.get(0)?),
        owner: row.get(1)?,
        description: row.get(2)?,
        points: row.get(3)?,
        done: row.get::<_, i32>(4)? != 0,
        created_at: DateTime::parse_from_rfc3339(&created_at)
            .map(|d| d.with_timezone(&Utc))
            .unwrap_or_else(|_| Utc::now()),
    })
}

fn fetch_task(conn: &Connection, id: TaskId) -> Result<Option<Task>> {
    let task = conn
        .query_row(
            &format!("SELECT {TASK_COLUMNS} FROM tasks WHERE id = ?1"),
            params![id.0],
            task_from_row,
        )
        .optional()?;
    Ok(task)
}

fn query_tasks(conn: &Connection, filter: &str) -> Result<Vec<Task>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {TASK_COLUMNS} FROM tasks WHERE {filter} ORDER BY id"
    ))?;
    let rows = stmt.query_map([], task_from_row)?;
    Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
}
