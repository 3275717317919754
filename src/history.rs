use im::Vector;

use crate::error::{Error, Result};
use crate::model::Task;

/// Undo stack of whole-list snapshots. Each entry is the list exactly as it
/// was before the mutation that pushed it. There is no redo.
#[derive(Debug, Default)]
pub struct History {
    snapshots: Vec<Vector<Task>>,
}

impl History {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a snapshot. `im::Vector` shares structure, so this is O(1).
    pub fn push_snapshot(&mut self, tasks: &Vector<Task>) {
        self.snapshots.push(tasks.clone());
    }

    /// The snapshot the next undo would restore, left in place.
    pub fn latest(&self) -> Option<&Vector<Task>> {
        self.snapshots.last()
    }

    /// Pop the most recent snapshot.
    pub fn undo(&mut self) -> Result<Vector<Task>> {
        self.snapshots.pop().ok_or(Error::EmptyHistory)
    }

    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    /// Drop everything above `depth` (used to unwind a failed batch).
    pub fn truncate(&mut self, depth: usize) {
        self.snapshots.truncate(depth);
    }
}
