mod app;
mod editor;
mod event;
mod view;

use std::io;
use std::time::Duration;

use anyhow::Result;
use chrono::Local;
use crossterm::event::{self as ct_event, Event, KeyEventKind};
use crossterm::execute;
use crossterm::terminal::{self, EnterAlternateScreen, LeaveAlternateScreen};
use log::{info, warn};
use ratatui::prelude::*;

use crate::session::{Notice, Session};
use crate::watch::DbWatcher;
use app::App;
use event::KeyAction;

pub fn run(db_path: &str, session: Session, poll_interval: u64) -> Result<()> {
    let mut app = App::new(session, Local::now().date_naive());
    let watcher = DbWatcher::new(db_path)?;

    terminal::enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;
    info!("ui started on {db_path}");

    let result = run_loop(&mut terminal, &mut app, &watcher, poll_interval);

    terminal::disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

fn run_loop(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
    watcher: &DbWatcher,
    poll_interval: u64,
) -> Result<()> {
    let poll_duration = Duration::from_millis(poll_interval);

    loop {
        app.set_today(Local::now().date_naive());
        terminal.draw(|frame| view::render(frame, app))?;

        if ct_event::poll(poll_duration)? {
            if let Event::Key(key) = ct_event::read()? {
                if key.kind == KeyEventKind::Press {
                    match event::handle_key(app, key) {
                        KeyAction::Quit => return Ok(()),
                        KeyAction::Dispatch(intent) => app.apply(intent)?,
                        KeyAction::SubmitForm => app.submit_form()?,
                        KeyAction::OpenEditor => open_editor(terminal, app),
                        KeyAction::Continue => {}
                    }
                }
            }
        }

        // Our own writes show up here too; reload only reports real changes.
        if watcher.changed() {
            app.reload()?;
        }
    }
}

fn open_editor(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>, app: &mut App) {
    let Some(form) = app.form.as_mut() else {
        return;
    };
    match editor::edit_notes(terminal, &form.notes) {
        Ok(notes) => {
            form.notes = notes;
            form.error = None;
        }
        Err(e) => {
            warn!("editor failed: {e:#}");
            form.error = Some(e.to_string());
            app.notice = Some(Notice::error(format!("{e:#}")));
        }
    }
}
