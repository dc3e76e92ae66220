//! Ranking aggregator — read-only sorted views over the score tables.

use chorerank_core::error::Result;
use chorerank_core::types::ScoreEntry;
use rusqlite::{Connection, params};

use crate::db::ScoreDb;

impl ScoreDb {
    /// Current standings: total descending, ties by name ascending.
    pub fn ranking(&self) -> Result<Vec<ScoreEntry>> {
        let conn = self.lock()?;
        query_ranking(&conn)
    }

    /// Archived standings of a closed period, in ranking order.
    ///
    /// A period closed more than once is reported as the per-name sum.
    pub fn period_history(&self, period: &str) -> Result<Vec<ScoreEntry>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            "SELECT name, SUM(total) AS total FROM ranking_history
             WHERE period = ?1
             GROUP BY name
             ORDER BY total DESC, name ASC",
        )?;
        let rows = stmt.query_map(params![period.trim()], |row| {
            Ok(ScoreEntry {
                name: row.get(0)?,
                total: row.get(1)?,
            })
        })?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }
}

pub(crate) fn query_ranking(conn: &Connection) -> Result<Vec<ScoreEntry>> {
    let mut stmt = conn.prepare("SELECT name, total FROM scores ORDER BY total DESC, name ASC")?;
    let rows = stmt.query_map([], |row| {
        Ok(ScoreEntry {
            name: row.get(0)?,
            total: row.get(1)?,
        })
    })?;
    Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_ranking() {
        let db = ScoreDb::open_in_memory(-1).unwrap();
        assert!(db.ranking().unwrap().is_empty());
    }

    #[test]
    fn test_ranking_is_sorted() {
        let db = ScoreDb::open_in_memory(-1).unwrap();
        for (owner, points) in [("Duda", 3), ("Caio", 7), ("Ana", 3), ("Bea", 7), ("Eli", -1)] {
            let id = db.add_task(owner, "chore", points).unwrap();
            db.complete_task(id).unwrap();
        }

        let ranking = db.ranking().unwrap();
        for pair in ranking.windows(2) {
            let (a, b) = (&pair[0], &pair[1]);
            assert!(a.total > b.total || (a.total == b.total && a.name <= b.name));
        }
        // SQL order and the in-memory comparator must agree
        let mut resorted = ranking.clone();
        resorted.sort_by(ScoreEntry::ranking_cmp);
        assert_eq!(resorted, ranking);

        let names: Vec<_> = ranking.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, ["Bea", "Caio", "Ana", "Duda", "Eli"]);
    }

    #[test]
    fn test_history_sums_repeated_closes() {
        let db = ScoreDb::open_in_memory(-1).unwrap();
        let id = db.add_task("Ana", "Report", 4).unwrap();
        db.complete_task(id).unwrap();
        db.close_period("2026-02").unwrap();

        let id = db.add_task("Ana", "Late report", 2).unwrap();
        db.complete_task(id).unwrap();
        db.close_period("2026-02").unwrap();

        assert_eq!(db.period_history("2026-02").unwrap(), vec![ScoreEntry::new("Ana", 6)]);
    }

    #[test]
    fn test_history_order_matches_ranking_cmp() {
        let db = ScoreDb::open_in_memory(-1).unwrap();
        for (owner, points) in [("Caio", 2), ("Bea", 5), ("Ana", 5), ("Duda", 9)] {
            let id = db.add_task(owner, "chore", points).unwrap();
            db.complete_task(id).unwrap();
        }
        let snapshot = db.close_period("2026-03").unwrap();
        let history = db.period_history("2026-03").unwrap();
        assert_eq!(history, snapshot.standings);

        let mut resorted = history.clone();
        resorted.sort_by(ScoreEntry::ranking_cmp);
        assert_eq!(resorted, history);
        assert_eq!(snapshot.winner().map(|w| w.name.as_str()), Some("Duda"));
    }
}
