//! Orchestration between the user's intents and the task store.
//!
//! The session owns the store, the undo history and the view state. A
//! snapshot is pushed only when an intent actually changed the list, so
//! rejected input and unknown ids never grow the history.

use chrono::NaiveDate;
use im::Vector;
use log::{debug, info};

use crate::error::{Error, Result};
use crate::history::History;
use crate::model::{Task, TaskFields};
use crate::query::{self, Stats, ViewState};
use crate::store::TaskStore;

/// Something the user asked for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Intent {
    Add(TaskFields),
    Toggle(i64),
    Delete(i64),
    Edit(i64, TaskFields),
    ClearCompleted,
    Undo,
    /// Exchange the positions of two tasks (a drag dropped on a target).
    Swap(i64, i64),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    Success,
    Error,
    Info,
}

/// A user-facing outcome message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub kind: NoticeKind,
    pub message: String,
}

impl Notice {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Success,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Error,
            message: message.into(),
        }
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Info,
            message: message.into(),
        }
    }

    pub fn is_error(&self) -> bool {
        self.kind == NoticeKind::Error
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outcome {
    pub notice: Notice,
    /// Whether the task list changed.
    pub changed: bool,
    /// The task the intent created or touched, when there is one.
    pub task_id: Option<i64>,
}

impl Outcome {
    fn changed(notice: Notice, task_id: Option<i64>) -> Self {
        Self {
            notice,
            changed: true,
            task_id,
        }
    }

    fn unchanged(notice: Notice) -> Self {
        Self {
            notice,
            changed: false,
            task_id: None,
        }
    }
}

/// Task list state captured at the start of a batch.
#[derive(Debug, Clone)]
pub struct Checkpoint {
    tasks: Vector<Task>,
    depth: usize,
}

pub struct Session {
    store: TaskStore,
    history: History,
    pub view: ViewState,
}

fn plural(n: usize) -> &'static str {
    if n == 1 {
        ""
    } else {
        "s"
    }
}

fn not_found(id: i64) -> Outcome {
    Outcome::unchanged(Notice::error(format!("No task with id {id}")))
}

impl Session {
    pub fn new(store: TaskStore) -> Self {
        Self {
            store,
            history: History::new(),
            view: ViewState::default(),
        }
    }

    pub fn store(&self) -> &TaskStore {
        &self.store
    }

    pub fn can_undo(&self) -> bool {
        !self.history.is_empty()
    }

    pub fn history_len(&self) -> usize {
        self.history.len()
    }

    /// Tasks visible under the current view state.
    pub fn visible(&self, today: NaiveDate) -> Vec<&Task> {
        query::compute_view(self.store.tasks(), &self.view, today)
    }

    pub fn stats(&self) -> Stats {
        self.store.stats()
    }

    /// Pick up changes another process wrote to the slot. History is kept.
    pub fn reload(&mut self) -> Result<bool> {
        let changed = self.store.load()?;
        if changed {
            info!("task list changed on disk; reloaded");
        }
        Ok(changed)
    }

    pub fn checkpoint(&self) -> Checkpoint {
        Checkpoint {
            tasks: self.store.snapshot(),
            depth: self.history.len(),
        }
    }

    /// Put the list back as it was at `checkpoint` and forget newer history.
    pub fn rollback(&mut self, checkpoint: Checkpoint) -> Result<()> {
        self.store.restore(checkpoint.tasks)?;
        self.history.truncate(checkpoint.depth);
        Ok(())
    }

    /// Apply an intent. Validation failures, unknown ids and an empty undo
    /// history come back as error notices with no state change; only storage
    /// failures are returned as `Err`.
    pub fn dispatch(&mut self, intent: Intent) -> Result<Outcome> {
        debug!("dispatch {intent:?}");
        if intent == Intent::Undo {
            return self.undo();
        }

        let before = self.store.snapshot();
        let outcome = self.apply(intent)?;
        if outcome.changed {
            self.history.push_snapshot(&before);
        }
        Ok(outcome)
    }

    fn apply(&mut self, intent: Intent) -> Result<Outcome> {
        let outcome = match intent {
            Intent::Add(fields) => match self.store.create(fields) {
                Ok(task) => Outcome::changed(
                    Notice::success(format!("Added task {}: {}", task.id, task.text)),
                    Some(task.id),
                ),
                Err(Error::Validation { .. }) => {
                    Outcome::unchanged(Notice::error("Please enter a task"))
                }
                Err(e) => return Err(e),
            },

            Intent::Toggle(id) => match self.store.toggle_completed(id)? {
                Some(true) => {
                    Outcome::changed(Notice::success(format!("Completed task {id}")), Some(id))
                }
                Some(false) => {
                    Outcome::changed(Notice::info(format!("Reopened task {id}")), Some(id))
                }
                None => not_found(id),
            },

            Intent::Delete(id) => match self.store.delete(id)? {
                0 => not_found(id),
                _ => Outcome::changed(Notice::info(format!("Deleted task {id}")), Some(id)),
            },

            Intent::Edit(id, fields) => match self.store.update(id, fields) {
                Ok(true) => {
                    Outcome::changed(Notice::success(format!("Updated task {id}")), Some(id))
                }
                Ok(false) => not_found(id),
                Err(Error::Validation { .. }) => {
                    Outcome::unchanged(Notice::error("Task text cannot be empty"))
                }
                Err(e) => return Err(e),
            },

            Intent::ClearCompleted => match self.store.clear_completed()? {
                0 => Outcome::unchanged(Notice::info("No completed tasks to clear")),
                n => Outcome::changed(
                    Notice::success(format!("Cleared {n} completed task{}", plural(n))),
                    None,
                ),
            },

            Intent::Swap(a, b) => {
                if self.store.swap(a, b)? {
                    Outcome::changed(Notice::success(format!("Swapped tasks {a} and {b}")), Some(a))
                } else {
                    Outcome::unchanged(Notice::info("Nothing to reorder"))
                }
            }

            Intent::Undo => return self.undo(),
        };
        Ok(outcome)
    }

    fn undo(&mut self) -> Result<Outcome> {
        let Some(snapshot) = self.history.latest().cloned() else {
            return Ok(Outcome::unchanged(Notice::error("Nothing to undo")));
        };
        // Pop only once the restore is stored, so a failed write keeps the step.
        self.store.restore(snapshot)?;
        self.history.undo()?;
        info!("undo: {} snapshots left", self.history.len());
        Ok(Outcome::changed(Notice::success("Undid last change"), None))
    }
}
