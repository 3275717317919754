//! Drag-and-drop reordering. A drop exchanges the dragged task's position
//! with the target's; nothing is spliced or shifted.

use im::Vector;

use crate::model::Task;

/// Positions to exchange for dropping `source` onto `target`, or `None` when
/// either id is unknown or both name the same task.
pub fn resolve(tasks: &Vector<Task>, source: i64, target: i64) -> Option<(usize, usize)> {
    if source == target {
        return None;
    }
    let from = tasks.iter().position(|t| t.id == source)?;
    let to = tasks.iter().position(|t| t.id == target)?;
    Some((from, to))
}

/// In-progress drag gesture: pick a task up, then drop it on another.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Drag {
    source: Option<i64>,
}

impl Drag {
    pub fn pick(&mut self, id: i64) {
        self.source = Some(id);
    }

    pub fn source(&self) -> Option<i64> {
        self.source
    }

    pub fn is_active(&self) -> bool {
        self.source.is_some()
    }

    pub fn cancel(&mut self) {
        self.source = None;
    }

    /// Finish the drag on `target`. Returns the `(source, target)` pair to
    /// swap, or `None` when nothing was picked up or the task was dropped
    /// on itself. The drag ends either way.
    pub fn drop_on(&mut self, target: i64) -> Option<(i64, i64)> {
        let source = self.source.take()?;
        (source != target).then_some((source, target))
    }
}
