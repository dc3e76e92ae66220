//! Plain-text rendering of tasks and standings for chat replies and notices.

use crate::types::{ScoreEntry, Task};

/// One checklist line: `#3 Ana — Report — ⏳ (10 pts)`.
pub fn task_line(task: &Task) -> String {
    format!(
        "#{} {} — {} — {} ({} pts)",
        task.id,
        task.owner,
        task.description,
        if task.done { "✔️" } else { "⏳" },
        task.points
    )
}

/// Header followed by one line per task.
pub fn task_list(header: &str, tasks: &[Task]) -> String {
    let mut out = String::from(header);
    for task in tasks {
        out.push('\n');
        out.push_str(&task_line(task));
    }
    out
}

/// Numbered standings: `1. Ana — 10 pts`.
pub fn standings(entries: &[ScoreEntry]) -> String {
    entries
        .iter()
        .enumerate()
        .map(|(i, e)| format!("{}. {} — {} pts", i + 1, e.name, e.total))
        .collect::<Vec<_>>()
        .join("\n")
}
