mod cli;

use std::io::Read as _;

use anyhow::{bail, Context, Result};
use chrono::{Local, NaiveDate};
use clap::Parser;
use log::debug;

use cli::{Cli, Command};
use taskpad::logging::{self, LogTarget};
use taskpad::model::{parse_due_date, Priority, TaskFields};
use taskpad::query::{SortKey, StatusFilter, ViewState};
use taskpad::session::{Intent, Notice, Session};
use taskpad::store::TaskStore;
use taskpad::{db, output, paths, tui};

/// Whether a command came straight from the shell or from an `exec` batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Direct,
    Batch,
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}

fn open_session(db_path: &str) -> Result<Session> {
    let conn = db::open(db_path)?;
    db::init(&conn)?;
    let store = TaskStore::open(conn).context("failed to load tasks")?;
    Ok(Session::new(store))
}

/// Print a notice to stderr, or fail the command if it reports an error.
fn report(notice: &Notice) -> Result<()> {
    if notice.is_error() {
        bail!("{}", notice.message);
    }
    eprintln!("{}", notice.message);
    Ok(())
}

/// Dispatch a single parsed command against the session.
/// Used both for direct invocations and within `exec` batches.
fn dispatch(session: &mut Session, command: Command, mode: Mode) -> Result<()> {
    match command {
        Command::Add {
            text,
            notes,
            date,
            category,
            priority,
            json,
        } => {
            let date = match date {
                Some(d) => parse_due_date(&d, today())?,
                None => None,
            };
            let fields = TaskFields::new(text)
                .with_notes(notes)
                .with_date(date)
                .with_category(category)
                .with_priority(Priority::parse(&priority)?);
            let outcome = session.dispatch(Intent::Add(fields))?;
            report(&outcome.notice)?;
            if let Some(task) = outcome.task_id.and_then(|id| session.store().get(id)) {
                if json {
                    let detail = output::TaskDetail::new(task, today());
                    println!("{}", serde_json::to_string_pretty(&detail)?);
                } else {
                    println!("{}", task.id);
                }
            }
        }

        Command::List {
            search,
            filter,
            priority,
            sort,
            json,
        } => {
            session.view = ViewState {
                search,
                status: StatusFilter::parse(&filter)?,
                priority: priority.map(|p| Priority::parse(&p)).transpose()?,
                sort: SortKey::parse(&sort)?,
            };
            let today = today();
            let visible = session.visible(today);
            if json {
                let details: Vec<_> = visible
                    .iter()
                    .map(|t| output::TaskDetail::new(t, today))
                    .collect();
                println!("{}", serde_json::to_string_pretty(&details)?);
            } else {
                print!("{}", output::format_task_list(&visible, today));
                eprint!("{}", output::format_stats(&session.stats()));
            }
        }

        Command::Show { id, json } => {
            let Some(task) = session.store().get(id) else {
                bail!("no task with id {id}");
            };
            if json {
                let detail = output::TaskDetail::new(task, today());
                println!("{}", serde_json::to_string_pretty(&detail)?);
            } else {
                print!("{}", output::format_task_detail(task, today()));
            }
        }

        Command::Toggle { id } => {
            let outcome = session.dispatch(Intent::Toggle(id))?;
            report(&outcome.notice)?;
        }

        Command::Rm { id } => {
            let outcome = session.dispatch(Intent::Delete(id))?;
            report(&outcome.notice)?;
        }

        Command::Edit {
            id,
            text,
            notes,
            date,
            no_date,
            category,
            priority,
        } => {
            let Some(task) = session.store().get(id) else {
                bail!("no task with id {id}");
            };
            let mut fields = TaskFields::from_task(task);
            if let Some(text) = text {
                fields.text = text;
            }
            if let Some(notes) = notes {
                fields.notes = notes;
            }
            if no_date {
                fields.date = None;
            } else if let Some(d) = date {
                fields.date = parse_due_date(&d, today())?;
            }
            if let Some(category) = category {
                fields.category = category;
            }
            if let Some(p) = priority {
                fields.priority = Priority::parse(&p)?;
            }
            let outcome = session.dispatch(Intent::Edit(id, fields))?;
            report(&outcome.notice)?;
        }

        Command::Clear => {
            let outcome = session.dispatch(Intent::ClearCompleted)?;
            report(&outcome.notice)?;
        }

        Command::Swap { source, target } => {
            let outcome = session.dispatch(Intent::Swap(source, target))?;
            report(&outcome.notice)?;
        }

        Command::Undo => {
            if mode == Mode::Direct {
                bail!("undo history lives in one session; use it inside exec or ui");
            }
            let outcome = session.dispatch(Intent::Undo)?;
            report(&outcome.notice)?;
        }

        Command::Stats { json } => {
            let stats = session.stats();
            if json {
                println!("{}", serde_json::to_string_pretty(&stats)?);
            } else {
                print!("{}", output::format_stats(&stats));
            }
        }

        Command::Exec => bail!("exec cannot be nested"),
        Command::Ui { .. } => bail!("ui cannot be used inside exec"),
    }

    Ok(())
}

fn parse_exec_tokens(tokens: &[String], display_line: &str) -> Result<Command> {
    let mut args = vec!["taskpad".to_string()];
    args.extend(tokens.iter().cloned());
    let cli =
        Cli::try_parse_from(&args).with_context(|| format!("failed to parse: {display_line}"))?;
    Ok(cli.command)
}

/// Run every line of `input` as a command in one session. If any line
/// fails, the task list is put back the way it was before the batch.
fn run_exec(session: &mut Session, input: &str) -> Result<()> {
    let checkpoint = session.checkpoint();
    let result = run_batch(session, input);
    if result.is_err() {
        session
            .rollback(checkpoint)
            .context("failed to roll back batch")?;
    }
    result
}

fn run_batch(session: &mut Session, input: &str) -> Result<()> {
    for (i, line) in input.lines().enumerate() {
        let lineno = i + 1;
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let tokens =
            shlex::split(line).with_context(|| format!("line {lineno}: unbalanced quotes"))?;
        let command =
            parse_exec_tokens(&tokens, line).with_context(|| format!("line {lineno}"))?;
        debug!("exec line {lineno}: {line}");
        dispatch(session, command, Mode::Batch).with_context(|| format!("line {lineno}"))?;
    }
    Ok(())
}

fn main() {
    if let Err(e) = run() {
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    let target = match cli.command {
        Command::Ui { .. } => LogTarget::Tui,
        _ => LogTarget::Cli,
    };
    logging::init(target)?;

    let db_path = paths::resolve_db_path(cli.db)?;
    paths::ensure_parent_dir(&db_path)?;
    let mut session = open_session(&db_path)?;

    match cli.command {
        Command::Exec => {
            let mut input = String::new();
            std::io::stdin().read_to_string(&mut input)?;
            run_exec(&mut session, &input)
        }
        Command::Ui { poll_interval } => tui::run(&db_path, session, poll_interval),
        command => dispatch(&mut session, command, Mode::Direct),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_session() -> Session {
        let conn = db::open(":memory:").unwrap();
        db::init(&conn).unwrap();
        Session::new(TaskStore::open(conn).unwrap())
    }

    fn texts(session: &Session) -> Vec<String> {
        session
            .store()
            .tasks()
            .iter()
            .map(|t| t.text.clone())
            .collect()
    }

    #[test]
    fn exec_batch_applies_all() {
        let mut session = test_session();
        let input = "add first\nadd second -p high -c Work\n";
        run_exec(&mut session, input).unwrap();
        assert_eq!(texts(&session), vec!["second", "first"]);
        let second = session.store().tasks()[0].clone();
        assert_eq!(second.priority, Priority::High);
        assert_eq!(second.category, "Work");
    }

    #[test]
    fn exec_undo_within_batch() {
        let mut session = test_session();
        run_exec(&mut session, "add a\nadd b\nundo\n").unwrap();
        assert_eq!(texts(&session), vec!["a"]);
    }

    #[test]
    fn exec_rolls_back_on_failure() {
        let mut session = test_session();
        run_exec(&mut session, "add keep\n").unwrap();
        let result = run_exec(&mut session, "add one\nadd \"  \"\nadd two\n");
        assert!(result.is_err());
        assert_eq!(texts(&session), vec!["keep"]);
    }

    #[test]
    fn exec_skips_blanks_and_comments() {
        let mut session = test_session();
        run_exec(&mut session, "\n# a comment\n   \nadd real\n").unwrap();
        assert_eq!(texts(&session), vec!["real"]);
    }

    #[test]
    fn exec_empty_input_is_noop() {
        let mut session = test_session();
        run_exec(&mut session, "").unwrap();
        assert!(session.store().is_empty());
    }

    #[test]
    fn exec_quoted_args() {
        let mut session = test_session();
        run_exec(&mut session, "add 'Call mum' -n \"it's her birthday\"\n").unwrap();
        let task = &session.store().tasks()[0];
        assert_eq!(task.text, "Call mum");
        assert_eq!(task.notes, "it's her birthday");
    }

    #[test]
    fn exec_rejects_nested_exec_and_ui() {
        let mut session = test_session();
        assert!(run_exec(&mut session, "exec\n").is_err());
        assert!(run_exec(&mut session, "ui\n").is_err());
    }

    #[test]
    fn exec_parse_error_reports_line() {
        let mut session = test_session();
        let err = run_exec(&mut session, "add ok\nfrobnicate\n").unwrap_err();
        assert!(format!("{err:#}").contains("line 2"));
        assert!(session.store().is_empty());
    }

    #[test]
    fn exec_unbalanced_quotes_fail() {
        let mut session = test_session();
        assert!(run_exec(&mut session, "add \"oops\n").is_err());
    }

    #[test]
    fn undo_outside_batch_is_refused() {
        let mut session = test_session();
        assert!(dispatch(&mut session, Command::Undo, Mode::Direct).is_err());
    }

    #[test]
    fn edit_keeps_unspecified_fields() {
        let mut session = test_session();
        run_exec(&mut session, "add task -n notes -c Home -p low -d 2024-06-01\n").unwrap();
        let id = session.store().tasks()[0].id;
        let command = Command::Edit {
            id,
            text: Some("renamed".into()),
            notes: None,
            date: None,
            no_date: false,
            category: None,
            priority: None,
        };
        dispatch(&mut session, command, Mode::Direct).unwrap();
        let task = session.store().get(id).unwrap();
        assert_eq!(task.text, "renamed");
        assert_eq!(task.notes, "notes");
        assert_eq!(task.category, "Home");
        assert_eq!(task.priority, Priority::Low);
        assert_eq!(task.date, NaiveDate::from_ymd_opt(2024, 6, 1));
    }

    #[test]
    fn failing_intent_is_an_error() {
        let mut session = test_session();
        assert!(dispatch(&mut session, Command::Toggle { id: 1 }, Mode::Direct).is_err());
    }
}
