//! Path resolution for the taskpad database and log file.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

pub const DB_ENV: &str = "TASKPAD_DB";
pub const LOG_ENV: &str = "TASKPAD_LOG";

/// `$HOME/.taskpad/taskpad.db`.
pub fn default_db_path() -> Result<PathBuf> {
    let home = std::env::var("HOME").context("HOME environment variable not set")?;
    Ok(PathBuf::from(home).join(".taskpad").join("taskpad.db"))
}

/// Use the explicit path if given (flag or `TASKPAD_DB`), else the default.
pub fn resolve_db_path(cli_db: Option<String>) -> Result<String> {
    match cli_db {
        Some(p) => Ok(p),
        None => {
            let path = default_db_path()?;
            Ok(path
                .to_str()
                .context("default DB path is not valid UTF-8")?
                .to_string())
        }
    }
}

pub fn ensure_parent_dir(path: &str) -> Result<()> {
    if let Some(parent) = Path::new(path).parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("failed to create directory {}", parent.display()))?;
        }
    }
    Ok(())
}

/// Log file requested through `TASKPAD_LOG`, if any.
pub fn log_path() -> Option<String> {
    std::env::var(LOG_ENV).ok().filter(|p| !p.trim().is_empty())
}
