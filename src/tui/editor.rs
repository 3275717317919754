use std::io::{self, Write as _};
use std::process::Command;

use anyhow::{bail, Context, Result};
use crossterm::execute;
use crossterm::terminal::{self, EnterAlternateScreen, LeaveAlternateScreen};
use ratatui::prelude::*;

/// Split `$EDITOR` into a program and its leading arguments, so values such
/// as `code --wait` work.
fn editor_command() -> Result<(String, Vec<String>)> {
    let raw = std::env::var("EDITOR").context("$EDITOR is not set")?;
    let mut words = shlex::split(&raw)
        .with_context(|| format!("cannot parse $EDITOR '{raw}'"))?
        .into_iter();
    let Some(program) = words.next() else {
        bail!("$EDITOR is empty");
    };
    Ok((program, words.collect()))
}

/// Suspends the TUI, opens `$EDITOR` on a temp file holding `initial`,
/// and returns the edited text with trailing whitespace removed.
pub fn edit_notes(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    initial: &str,
) -> Result<String> {
    let (program, args) = editor_command()?;

    let mut tmp = tempfile::Builder::new()
        .prefix("taskpad-notes-")
        .suffix(".txt")
        .tempfile()
        .context("failed to create temp file")?;
    tmp.write_all(initial.as_bytes())
        .context("failed to write to temp file")?;
    tmp.flush()?;

    terminal::disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;

    let status = Command::new(&program)
        .args(&args)
        .arg(tmp.path())
        .status()
        .with_context(|| format!("failed to run editor '{program}'"));

    // The terminal comes back even if the editor never started.
    execute!(terminal.backend_mut(), EnterAlternateScreen)?;
    terminal::enable_raw_mode()?;
    terminal.clear()?;

    let status = status?;
    if !status.success() {
        bail!("editor exited with status {status}");
    }

    let content = std::fs::read_to_string(tmp.path())
        .context("failed to read temp file after editor closed")?;
    Ok(content.trim_end().to_string())
}
