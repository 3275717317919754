use std::path::Path;
use std::sync::mpsc::{self, Receiver};

use anyhow::{Context, Result};
use notify::{EventKind, RecommendedWatcher, RecursiveMode, Watcher};

/// Notices writes to the database from other processes so an open UI can
/// reload. Dropping it stops the watch.
pub struct DbWatcher {
    _watcher: RecommendedWatcher,
    rx: Receiver<()>,
}

impl DbWatcher {
    /// Watch the directory holding `db_path`, keeping only events for the
    /// database file and its `-wal`/`-shm`/`-journal` companions.
    pub fn new(db_path: &str) -> Result<Self> {
        let (tx, rx) = mpsc::channel();

        let db_filename = Path::new(db_path)
            .file_name()
            .map(|f| f.to_string_lossy().into_owned())
            .unwrap_or_default();

        let mut watcher =
            notify::recommended_watcher(move |res: notify::Result<notify::Event>| {
                let Ok(event) = res else {
                    return;
                };
                // Reads by any process fire access events; only writes matter.
                if matches!(event.kind, EventKind::Access(_)) {
                    return;
                }
                let ours = event.paths.iter().any(|p| {
                    p.file_name()
                        .is_some_and(|f| f.to_string_lossy().starts_with(&*db_filename))
                });
                if ours {
                    let _ = tx.send(());
                }
            })
            .context("failed to create file watcher")?;

        let watch_path = match Path::new(db_path).parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };
        watcher
            .watch(watch_path, RecursiveMode::NonRecursive)
            .with_context(|| format!("failed to watch {}", watch_path.display()))?;

        Ok(Self {
            _watcher: watcher,
            rx,
        })
    }

    /// True if any change arrived since the last call. Never blocks; a burst
    /// of events collapses into one.
    pub fn changed(&self) -> bool {
        let mut seen = false;
        while self.rx.try_recv().is_ok() {
            seen = true;
        }
        seen
    }
}
