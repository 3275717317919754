use std::fs::OpenOptions;

use anyhow::{Context, Result};
use log::LevelFilter;

use crate::paths;

/// Where log output should go for this run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogTarget {
    /// One-shot commands: stderr unless `TASKPAD_LOG` names a file.
    Cli,
    /// Full-screen UI: only a file, never the terminal.
    Tui,
}

/// Install the global logger. `RUST_LOG` overrides the default level.
pub fn init(target: LogTarget) -> Result<()> {
    let mut builder = env_logger::Builder::new();
    builder.format_timestamp_secs();

    let to_file = paths::log_path();
    let silent = to_file.is_none() && target == LogTarget::Tui;
    match (to_file, target) {
        (Some(path), _) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(&path)
                .with_context(|| format!("failed to open log file {path}"))?;
            builder
                .target(env_logger::Target::Pipe(Box::new(file)))
                .filter_level(LevelFilter::Info);
        }
        (None, LogTarget::Cli) => {
            builder.filter_level(LevelFilter::Warn);
        }
        (None, LogTarget::Tui) => {
            builder.filter_level(LevelFilter::Off);
        }
    }

    if !silent {
        if let Ok(filters) = std::env::var("RUST_LOG") {
            builder.parse_filters(&filters);
        }
    }
    // A logger may already be installed (tests, embedding); keep it.
    let _ = builder.try_init();
    Ok(())
}
