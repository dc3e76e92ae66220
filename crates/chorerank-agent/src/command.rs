//! Chat command grammar. The keyword is matched case-insensitively; argument
//! text keeps its original case so names come through as typed.

use chorerank_core::types::{DefaultTaskId, TaskId};

pub const USAGE_ADD: &str = "Usage: add Owner: Description: Points";
pub const USAGE_DONE: &str = "Usage: done <task id>";
pub const USAGE_DEFAULT: &str =
    "Usage: default add Owner: Description: Points | default list | default remove <id> | default apply";
pub const USAGE_HISTORY: &str = "Usage: history YYYY-MM";

pub const HELP: &str = "\
📖 Commands:
add Owner: Description: Points
list (listar)
pending (pendentes)
done <id> (concluir)
ranking
penalize (penalizar)
reset (resetar)
default add|list|remove <id>|apply (padrao)
history YYYY-MM (historico)
help (ajuda)";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Add {
        owner: String,
        description: String,
        points: i64,
    },
    List,
    Pending,
    Done(TaskId),
    Ranking,
    Penalize,
    Reset,
    DefaultAdd {
        owner: String,
        description: String,
        points: i64,
    },
    DefaultList,
    DefaultRemove(DefaultTaskId),
    DefaultApply,
    History(String),
    Help,
}

/// Outcome of parsing one inbound text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Parsed {
    Command(Command),
    /// A known command with bad arguments; reply with this hint.
    Usage(&'static str),
    /// Not a command at all.
    Unrecognized,
}

pub fn parse(text: &str) -> Parsed {
    let text = text.trim();
    let (keyword, args) = match text.split_once(char::is_whitespace) {
        Some((keyword, args)) => (keyword, args.trim()),
        None => (text, ""),
    };

    let bare = |command: Command| {
        if args.is_empty() {
            Parsed::Command(command)
        } else {
            Parsed::Unrecognized
        }
    };

    match keyword.to_lowercase().as_str() {
        "add" => match parse_task_fields(args) {
            Some((owner, description, points)) => Parsed::Command(Command::Add {
                owner,
                description,
                points,
            }),
            None => Parsed::Usage(USAGE_ADD),
        },
        "list" | "listar" => bare(Command::List),
        "pending" | "pendentes" => bare(Command::Pending),
        "done" | "concluir" => match args.parse::<TaskId>() {
            Ok(id) => Parsed::Command(Command::Done(id)),
            Err(_) => Parsed::Usage(USAGE_DONE),
        },
        "ranking" => bare(Command::Ranking),
        "penalize" | "penalizar" => bare(Command::Penalize),
        "reset" | "resetar" => bare(Command::Reset),
        "default" | "padrao" | "padrão" => parse_default(args),
        "history" | "historico" | "histórico" => {
            if is_period(args) {
                Parsed::Command(Command::History(args.to_string()))
            } else {
                Parsed::Usage(USAGE_HISTORY)
            }
        }
        "help" | "ajuda" => bare(Command::Help),
        _ => Parsed::Unrecognized,
    }
}

fn parse_default(args: &str) -> Parsed {
    let (sub, rest) = match args.split_once(char::is_whitespace) {
        Some((sub, rest)) => (sub, rest.trim()),
        None => (args, ""),
    };
    let command = match sub.to_lowercase().as_str() {
        "add" => parse_task_fields(rest).map(|(owner, description, points)| Command::DefaultAdd {
            owner,
            description,
            points,
        }),
        "list" | "listar" if rest.is_empty() => Some(Command::DefaultList),
        "remove" | "remover" => rest
            .trim_start_matches('#')
            .parse::<i64>()
            .ok()
            .map(|id| Command::DefaultRemove(DefaultTaskId(id))),
        "apply" | "aplicar" if rest.is_empty() => Some(Command::DefaultApply),
        _ => None,
    };
    command.map_or(Parsed::Usage(USAGE_DEFAULT), Parsed::Command)
}

/// `Owner: Description: Points`
fn parse_task_fields(args: &str) -> Option<(String, String, i64)> {
    let parts: Vec<&str> = args.split(':').map(str::trim).collect();
    let [owner, description, points] = parts.as_slice() else {
        return None;
    };
    if owner.is_empty() || description.is_empty() {
        return None;
    }
    let points = points.parse::<i64>().ok()?;
    Some((owner.to_string(), description.to_string(), points))
}

/// `YYYY-MM` with a real month.
fn is_period(s: &str) -> bool {
    let Some((year, month)) = s.split_once('-') else {
        return false;
    };
    year.len() == 4
        && month.len() == 2
        && year.bytes().all(|b| b.is_ascii_digit())
        && matches!(month.parse::<u32>(), Ok(1..=12))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cmd(text: &str) -> Command {
        match parse(text) {
            Parsed::Command(c) => c,
            other => panic!("{text:?} parsed as {other:?}"),
        }
    }

    #[test]
    fn test_add() {
        assert_eq!(
            cmd("add Ana: Report: 10"),
            Command::Add {
                owner: "Ana".into(),
                description: "Report".into(),
                points: 10
            }
        );
        assert_eq!(
            cmd("  ADD  Bea :Dishes and pans:  -2 "),
            Command::Add {
                owner: "Bea".into(),
                description: "Dishes and pans".into(),
                points: -2
            }
        );
    }

    #[test]
    fn test_add_malformed_gets_usage() {
        assert_eq!(parse("add"), Parsed::Usage(USAGE_ADD));
        assert_eq!(parse("add Ana: Report"), Parsed::Usage(USAGE_ADD));
        assert_eq!(parse("add Ana: Report: ten"), Parsed::Usage(USAGE_ADD));
        assert_eq!(parse("add : Report: 3"), Parsed::Usage(USAGE_ADD));
        assert_eq!(parse("add Ana: a: b: 3"), Parsed::Usage(USAGE_ADD));
    }

    #[test]
    fn test_aliases() {
        assert_eq!(cmd("listar"), Command::List);
        assert_eq!(cmd("LIST"), Command::List);
        assert_eq!(cmd("pendentes"), Command::Pending);
        assert_eq!(cmd("concluir 4"), Command::Done(TaskId(4)));
        assert_eq!(cmd("done #4"), Command::Done(TaskId(4)));
        assert_eq!(cmd("Ranking"), Command::Ranking);
        assert_eq!(cmd("penalizar"), Command::Penalize);
        assert_eq!(cmd("resetar"), Command::Reset);
        assert_eq!(cmd("ajuda"), Command::Help);
    }

    #[test]
    fn test_done_needs_numeric_id() {
        assert_eq!(parse("done"), Parsed::Usage(USAGE_DONE));
        assert_eq!(parse("concluir abc"), Parsed::Usage(USAGE_DONE));
    }

    #[test]
    fn test_defaults() {
        assert_eq!(
            cmd("default add Caio: Trash: 1"),
            Command::DefaultAdd {
                owner: "Caio".into(),
                description: "Trash".into(),
                points: 1
            }
        );
        assert_eq!(cmd("padrao list"), Command::DefaultList);
        assert_eq!(cmd("default remove 2"), Command::DefaultRemove(DefaultTaskId(2)));
        assert_eq!(cmd("default APPLY"), Command::DefaultApply);
        assert_eq!(parse("default"), Parsed::Usage(USAGE_DEFAULT));
        assert_eq!(parse("default remove x"), Parsed::Usage(USAGE_DEFAULT));
    }

    #[test]
    fn test_history() {
        assert_eq!(cmd("history 2026-04"), Command::History("2026-04".into()));
        assert_eq!(cmd("historico 2025-12"), Command::History("2025-12".into()));
        assert_eq!(parse("history"), Parsed::Usage(USAGE_HISTORY));
        assert_eq!(parse("history 2026-13"), Parsed::Usage(USAGE_HISTORY));
        assert_eq!(parse("history april"), Parsed::Usage(USAGE_HISTORY));
    }

    #[test]
    fn test_unrecognized() {
        assert_eq!(parse(""), Parsed::Unrecognized);
        assert_eq!(parse("hello there"), Parsed::Unrecognized);
        // argument-free commands only match exactly
        assert_eq!(parse("ranking please"), Parsed::Unrecognized);
        assert_eq!(parse("addams family"), Parsed::Unrecognized);
    }
}
