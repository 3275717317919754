use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use super::app::{App, FormField, Mode};
use crate::model::Priority;
use crate::session::{Intent, Notice};

/// Result of handling a key press.
#[derive(Debug, PartialEq, Eq)]
pub enum KeyAction {
    Quit,
    Dispatch(Intent),
    SubmitForm,
    OpenEditor,
    Continue,
}

/// Handle a key press. View-state and cursor changes are applied to `app`
/// directly; anything that touches the task list comes back as an action.
pub fn handle_key(app: &mut App, key: KeyEvent) -> KeyAction {
    if app.form.is_some() {
        return handle_form(app, key);
    }

    match app.mode {
        Mode::Help => {
            if matches!(
                key.code,
                KeyCode::Char('?') | KeyCode::Esc | KeyCode::Char('q')
            ) {
                app.mode = Mode::Normal;
            }
            KeyAction::Continue
        }
        Mode::ConfirmClear => {
            app.mode = Mode::Normal;
            if matches!(key.code, KeyCode::Char('y') | KeyCode::Enter) {
                KeyAction::Dispatch(Intent::ClearCompleted)
            } else {
                KeyAction::Continue
            }
        }
        Mode::Search => handle_search(app, key),
        Mode::Normal => handle_normal(app, key),
    }
}

fn handle_normal(app: &mut App, key: KeyEvent) -> KeyAction {
    let selected = app.selected_id();
    match key.code {
        KeyCode::Char('q') => KeyAction::Quit,
        KeyCode::Esc => {
            if app.drag.is_active() {
                app.drag.cancel();
                app.notice = Some(Notice::info("Move cancelled"));
            }
            KeyAction::Continue
        }
        KeyCode::Char('j') | KeyCode::Down => {
            app.move_down();
            KeyAction::Continue
        }
        KeyCode::Char('k') | KeyCode::Up => {
            app.move_up();
            KeyAction::Continue
        }
        KeyCode::Char(' ') | KeyCode::Char('x') => match selected {
            Some(id) => KeyAction::Dispatch(Intent::Toggle(id)),
            None => KeyAction::Continue,
        },
        KeyCode::Char('d') => match selected {
            Some(id) => KeyAction::Dispatch(Intent::Delete(id)),
            None => KeyAction::Continue,
        },
        KeyCode::Char('u') => KeyAction::Dispatch(Intent::Undo),
        KeyCode::Char('C') => {
            app.mode = Mode::ConfirmClear;
            KeyAction::Continue
        }
        KeyCode::Char('a') => {
            app.open_add_form();
            KeyAction::Continue
        }
        KeyCode::Char('e') | KeyCode::Enter => {
            app.open_edit_form();
            KeyAction::Continue
        }
        KeyCode::Char('/') => {
            app.mode = Mode::Search;
            KeyAction::Continue
        }
        KeyCode::Char('f') => {
            app.session.view.status = app.session.view.status.next();
            app.refresh();
            KeyAction::Continue
        }
        KeyCode::Char(c @ '1'..='3') => {
            let priority = match c {
                '1' => Priority::High,
                '2' => Priority::Medium,
                _ => Priority::Low,
            };
            app.session.view.toggle_priority(priority);
            app.refresh();
            KeyAction::Continue
        }
        KeyCode::Char('s') => {
            app.session.view.sort = app.session.view.sort.next();
            app.refresh();
            KeyAction::Continue
        }
        KeyCode::Char('m') => handle_move(app, selected),
        KeyCode::Char('J') => swap_with(app, selected, 1),
        KeyCode::Char('K') => swap_with(app, selected, -1),
        KeyCode::Char('?') => {
            app.toggle_help();
            KeyAction::Continue
        }
        _ => KeyAction::Continue,
    }
}

/// First press picks the selected task up, second drops it on the task
/// under the cursor.
fn handle_move(app: &mut App, selected: Option<i64>) -> KeyAction {
    let Some(id) = selected else {
        return KeyAction::Continue;
    };
    if !app.drag.is_active() {
        app.drag.pick(id);
        app.notice = Some(Notice::info(format!(
            "Moving task {id}; press m on the target"
        )));
        return KeyAction::Continue;
    }
    match app.drag.drop_on(id) {
        Some((source, target)) => KeyAction::Dispatch(Intent::Swap(source, target)),
        None => {
            app.notice = Some(Notice::info("Move cancelled"));
            KeyAction::Continue
        }
    }
}

fn swap_with(app: &App, selected: Option<i64>, offset: isize) -> KeyAction {
    match (selected, app.neighbour_id(offset)) {
        (Some(a), Some(b)) => KeyAction::Dispatch(Intent::Swap(a, b)),
        _ => KeyAction::Continue,
    }
}

fn handle_search(app: &mut App, key: KeyEvent) -> KeyAction {
    match key.code {
        KeyCode::Enter => app.mode = Mode::Normal,
        KeyCode::Esc => {
            app.session.view.search.clear();
            app.mode = Mode::Normal;
            app.refresh();
        }
        KeyCode::Backspace => {
            app.session.view.search.pop();
            app.refresh();
        }
        KeyCode::Char('u') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            app.session.view.search.clear();
            app.refresh();
        }
        KeyCode::Char(c) => {
            app.session.view.search.push(c);
            app.refresh();
        }
        _ => {}
    }
    KeyAction::Continue
}

fn handle_form(app: &mut App, key: KeyEvent) -> KeyAction {
    let Some(form) = app.form.as_mut() else {
        return KeyAction::Continue;
    };
    match key.code {
        KeyCode::Esc => {
            app.cancel_form();
            KeyAction::Continue
        }
        KeyCode::Tab => {
            form.next_field();
            KeyAction::Continue
        }
        KeyCode::BackTab => {
            form.prev_field();
            KeyAction::Continue
        }
        KeyCode::Enter => KeyAction::SubmitForm,
        KeyCode::Left | KeyCode::Right if form.focused == FormField::Priority => {
            form.priority = if key.code == KeyCode::Left {
                form.priority.prev()
            } else {
                form.priority.next()
            };
            KeyAction::Continue
        }
        KeyCode::Backspace => {
            if let Some(buf) = form.focused_buf_mut() {
                buf.pop();
            }
            form.error = None;
            KeyAction::Continue
        }
        KeyCode::Char(c) if key.modifiers.contains(KeyModifiers::CONTROL) => match c {
            'e' if form.focused == FormField::Notes => KeyAction::OpenEditor,
            'u' => {
                if let Some(buf) = form.focused_buf_mut() {
                    buf.clear();
                }
                form.error = None;
                KeyAction::Continue
            }
            _ => KeyAction::Continue,
        },
        KeyCode::Char(c) => {
            if let Some(buf) = form.focused_buf_mut() {
                buf.push(c);
                form.error = None;
            }
            KeyAction::Continue
        }
        _ => KeyAction::Continue,
    }
}
