use anyhow::Result;
use chrono::NaiveDate;
use ratatui::widgets::ListState;

use crate::model::{parse_due_date, Priority, Task, TaskFields, DEFAULT_CATEGORY};
use crate::reorder::Drag;
use crate::session::{Intent, Notice, Session};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Normal,
    Search,
    Help,
    ConfirmClear,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormField {
    Text,
    Notes,
    Date,
    Category,
    Priority,
}

/// The add/edit dialog. Fields are kept as typed text until submit.
pub struct TaskForm {
    /// Task being edited; `None` when adding.
    pub editing: Option<i64>,
    pub text: String,
    pub notes: String,
    pub date: String,
    pub category: String,
    pub priority: Priority,
    pub focused: FormField,
    pub error: Option<String>,
}

impl TaskForm {
    pub fn add(today: NaiveDate) -> Self {
        Self {
            editing: None,
            text: String::new(),
            notes: String::new(),
            date: today.format("%Y-%m-%d").to_string(),
            category: DEFAULT_CATEGORY.to_string(),
            priority: Priority::default(),
            focused: FormField::Text,
            error: None,
        }
    }

    pub fn edit(task: &Task) -> Self {
        Self {
            editing: Some(task.id),
            text: task.text.clone(),
            notes: task.notes.clone(),
            date: task
                .date
                .map(|d| d.format("%Y-%m-%d").to_string())
                .unwrap_or_default(),
            category: task.category.clone(),
            priority: task.priority,
            focused: FormField::Text,
            error: None,
        }
    }

    /// Text buffer behind the focused field. Priority is picked, not typed.
    pub fn focused_buf_mut(&mut self) -> Option<&mut String> {
        match self.focused {
            FormField::Text => Some(&mut self.text),
            FormField::Notes => Some(&mut self.notes),
            FormField::Date => Some(&mut self.date),
            FormField::Category => Some(&mut self.category),
            FormField::Priority => None,
        }
    }

    pub fn next_field(&mut self) {
        self.focused = match self.focused {
            FormField::Text => FormField::Notes,
            FormField::Notes => FormField::Date,
            FormField::Date => FormField::Category,
            FormField::Category => FormField::Priority,
            FormField::Priority => FormField::Text,
        };
    }

    pub fn prev_field(&mut self) {
        self.focused = match self.focused {
            FormField::Text => FormField::Priority,
            FormField::Notes => FormField::Text,
            FormField::Date => FormField::Notes,
            FormField::Category => FormField::Date,
            FormField::Priority => FormField::Category,
        };
    }

    /// Parse the typed values. Blank text is left for the session to reject.
    pub fn fields(&self, today: NaiveDate) -> crate::Result<TaskFields> {
        Ok(TaskFields::new(self.text.clone())
            .with_notes(self.notes.clone())
            .with_date(parse_due_date(&self.date, today)?)
            .with_category(self.category.clone())
            .with_priority(self.priority))
    }
}

pub struct App {
    pub session: Session,
    pub today: NaiveDate,
    /// Ids of the visible tasks, in display order.
    pub ids: Vec<i64>,
    pub cursor: usize,
    pub list_state: ListState,
    pub mode: Mode,
    pub form: Option<TaskForm>,
    pub notice: Option<Notice>,
    pub drag: Drag,
}

impl App {
    pub fn new(session: Session, today: NaiveDate) -> Self {
        let mut app = App {
            session,
            today,
            ids: Vec::new(),
            cursor: 0,
            list_state: ListState::default(),
            mode: Mode::Normal,
            form: None,
            notice: None,
            drag: Drag::default(),
        };
        app.refresh();
        app
    }

    /// Recompute the visible rows after the list or the view state changed.
    pub fn refresh(&mut self) {
        self.ids = self
            .session
            .visible(self.today)
            .iter()
            .map(|t| t.id)
            .collect();
        if let Some(source) = self.drag.source() {
            if self.session.store().get(source).is_none() {
                self.drag.cancel();
            }
        }
        self.clamp_cursor();
    }

    pub fn visible(&self) -> Vec<&Task> {
        self.session.visible(self.today)
    }

    /// Day rollover changes due labels and the today/overdue filters.
    pub fn set_today(&mut self, today: NaiveDate) {
        if today != self.today {
            self.today = today;
            self.refresh();
        }
    }

    pub fn clamp_cursor(&mut self) {
        if self.ids.is_empty() {
            self.cursor = 0;
            self.list_state.select(None);
        } else {
            if self.cursor >= self.ids.len() {
                self.cursor = self.ids.len() - 1;
            }
            self.list_state.select(Some(self.cursor));
        }
    }

    pub fn move_up(&mut self) {
        if self.cursor > 0 {
            self.cursor -= 1;
            self.list_state.select(Some(self.cursor));
        }
    }

    pub fn move_down(&mut self) {
        if !self.ids.is_empty() && self.cursor < self.ids.len() - 1 {
            self.cursor += 1;
            self.list_state.select(Some(self.cursor));
        }
    }

    pub fn selected_id(&self) -> Option<i64> {
        self.ids.get(self.cursor).copied()
    }

    /// The visible task `offset` rows away from the cursor.
    pub fn neighbour_id(&self, offset: isize) -> Option<i64> {
        let index = self.cursor.checked_add_signed(offset)?;
        self.ids.get(index).copied()
    }

    /// Move the cursor onto `id` if it is visible.
    pub fn select(&mut self, id: i64) {
        if let Some(pos) = self.ids.iter().position(|&i| i == id) {
            self.cursor = pos;
            self.list_state.select(Some(pos));
        }
    }

    pub fn apply(&mut self, intent: Intent) -> Result<()> {
        let outcome = self.session.dispatch(intent)?;
        if outcome.changed {
            self.refresh();
            if let Some(id) = outcome.task_id {
                self.select(id);
            }
        }
        self.notice = Some(outcome.notice);
        Ok(())
    }

    /// Pick up a write made by another process.
    pub fn reload(&mut self) -> Result<()> {
        if self.session.reload()? {
            self.refresh();
            self.notice = Some(Notice::info("Reloaded changes from disk"));
        }
        Ok(())
    }

    pub fn open_add_form(&mut self) {
        self.form = Some(TaskForm::add(self.today));
    }

    pub fn open_edit_form(&mut self) {
        let task = self
            .selected_id()
            .and_then(|id| self.session.store().get(id));
        if let Some(task) = task {
            self.form = Some(TaskForm::edit(task));
        }
    }

    pub fn cancel_form(&mut self) {
        self.form = None;
    }

    /// Submit the open form. Rejected input keeps the form open with the
    /// reason shown inside it.
    pub fn submit_form(&mut self) -> Result<()> {
        let Some(form) = self.form.as_mut() else {
            return Ok(());
        };
        let fields = match form.fields(self.today) {
            Ok(fields) => fields,
            Err(e) => {
                form.error = Some(e.to_string());
                return Ok(());
            }
        };
        let intent = match form.editing {
            Some(id) => Intent::Edit(id, fields),
            None => Intent::Add(fields),
        };

        let outcome = self.session.dispatch(intent)?;
        if outcome.notice.is_error() {
            if let Some(form) = self.form.as_mut() {
                form.error = Some(outcome.notice.message.clone());
            }
            self.notice = Some(outcome.notice);
            return Ok(());
        }

        self.form = None;
        self.refresh();
        if let Some(id) = outcome.task_id {
            self.select(id);
        }
        self.notice = Some(outcome.notice);
        Ok(())
    }

    pub fn toggle_help(&mut self) {
        self.mode = match self.mode {
            Mode::Help => Mode::Normal,
            _ => Mode::Help,
        };
    }
}
