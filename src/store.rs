//! The ordered task list and its durable slot.
//!
//! Every mutation builds the next list, writes it to the slot, and only then
//! installs it in memory, so a failed write leaves the store untouched.
//! Snapshotting for undo is the caller's business (see `session`).

use chrono::Utc;
use im::Vector;
use log::{debug, warn};
use rusqlite::Connection;

use crate::db;
use crate::error::{Error, Result};
use crate::model::{Task, TaskFields};
use crate::query::Stats;
use crate::reorder;

/// Slot holding the JSON-encoded task list.
pub const TASKS_KEY: &str = "tasks";
/// Slot receiving a copy of an undecodable task list before it is replaced.
pub const CORRUPT_KEY: &str = "tasks.corrupt";

pub struct TaskStore {
    conn: Connection,
    tasks: Vector<Task>,
    last_id: i64,
}

impl TaskStore {
    /// Wrap an initialized connection and load the persisted list.
    pub fn open(conn: Connection) -> Result<Self> {
        let mut store = Self {
            conn,
            tasks: Vector::new(),
            last_id: 0,
        };
        store.load()?;
        Ok(store)
    }

    /// Re-read the list from the slot. Absent or malformed data yields an
    /// empty list. Returns whether the in-memory list changed.
    pub fn load(&mut self) -> Result<bool> {
        let loaded = match db::read_slot(&self.conn, TASKS_KEY)? {
            None => Vector::new(),
            Some(raw) => match decode(&raw) {
                Ok(tasks) => tasks,
                Err(e) => {
                    // Reloads see the same blob again; only copy it once.
                    if db::read_slot(&self.conn, CORRUPT_KEY)?.as_deref() != Some(raw.as_str()) {
                        warn!("{e}; continuing with an empty list (copy kept under '{CORRUPT_KEY}')");
                        db::write_slot(&self.conn, CORRUPT_KEY, &raw)?;
                    }
                    Vector::new()
                }
            },
        };
        self.note_ids(&loaded);
        let changed = loaded != self.tasks;
        self.tasks = loaded;
        debug!("loaded {} tasks", self.tasks.len());
        Ok(changed)
    }

    /// Write the current list to the slot.
    pub fn persist(&self) -> Result<()> {
        self.write(&self.tasks)
    }

    pub fn tasks(&self) -> &Vector<Task> {
        &self.tasks
    }

    /// A structurally shared copy of the current list.
    pub fn snapshot(&self) -> Vector<Task> {
        self.tasks.clone()
    }

    pub fn get(&self, id: i64) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == id)
    }

    pub fn position(&self, id: i64) -> Option<usize> {
        self.tasks.iter().position(|t| t.id == id)
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn stats(&self) -> Stats {
        Stats::of(&self.tasks)
    }

    pub fn create(&mut self, fields: TaskFields) -> Result<Task> {
        fields.validate()?;
        let task = Task {
            category: fields.stored_category(),
            id: self.next_id(),
            text: fields.text,
            notes: fields.notes,
            date: fields.date,
            priority: fields.priority,
            completed: false,
            created_at: Utc::now(),
        };
        let mut next = self.tasks.clone();
        next.push_front(task.clone());
        self.commit(next)?;
        debug!("created task {}", task.id);
        Ok(task)
    }

    /// Flip `completed`. Returns the new value, or `None` if no task has `id`.
    pub fn toggle_completed(&mut self, id: i64) -> Result<Option<bool>> {
        let Some(index) = self.position(id) else {
            return Ok(None);
        };
        let mut next = self.tasks.clone();
        let Some(task) = next.get_mut(index) else {
            return Ok(None);
        };
        task.completed = !task.completed;
        let completed = task.completed;
        self.commit(next)?;
        Ok(Some(completed))
    }

    /// Remove the task with `id`. Returns how many tasks were removed.
    pub fn delete(&mut self, id: i64) -> Result<usize> {
        let next: Vector<Task> = self.tasks.iter().filter(|t| t.id != id).cloned().collect();
        let removed = self.tasks.len() - next.len();
        if removed > 0 {
            self.commit(next)?;
        }
        Ok(removed)
    }

    /// Replace the editable fields of `id`, keeping id, completion and
    /// creation time. Returns whether a task matched.
    pub fn update(&mut self, id: i64, fields: TaskFields) -> Result<bool> {
        fields.validate()?;
        let Some(index) = self.position(id) else {
            return Ok(false);
        };
        let mut next = self.tasks.clone();
        let Some(task) = next.get_mut(index) else {
            return Ok(false);
        };
        task.category = fields.stored_category();
        task.text = fields.text;
        task.notes = fields.notes;
        task.date = fields.date;
        task.priority = fields.priority;
        self.commit(next)?;
        Ok(true)
    }

    /// Remove every completed task. Returns the count; zero writes nothing.
    pub fn clear_completed(&mut self) -> Result<usize> {
        let next: Vector<Task> = self.tasks.iter().filter(|t| !t.completed).cloned().collect();
        let removed = self.tasks.len() - next.len();
        if removed > 0 {
            self.commit(next)?;
        }
        Ok(removed)
    }

    /// Exchange the positions of two tasks. Returns whether anything moved.
    pub fn swap(&mut self, id_a: i64, id_b: i64) -> Result<bool> {
        let Some((i, j)) = reorder::resolve(&self.tasks, id_a, id_b) else {
            return Ok(false);
        };
        let mut next = self.tasks.clone();
        next.swap(i, j);
        self.commit(next)?;
        Ok(true)
    }

    /// Install `tasks` as the current list and persist it.
    pub fn restore(&mut self, tasks: Vector<Task>) -> Result<()> {
        self.note_ids(&tasks);
        self.commit(tasks)
    }

    fn commit(&mut self, next: Vector<Task>) -> Result<()> {
        self.write(&next)?;
        self.tasks = next;
        Ok(())
    }

    fn write(&self, tasks: &Vector<Task>) -> Result<()> {
        let raw = serde_json::to_string(tasks).map_err(Error::StorageEncode)?;
        db::write_slot(&self.conn, TASKS_KEY, &raw)?;
        debug!("persisted {} tasks", tasks.len());
        Ok(())
    }

    /// Wall-clock milliseconds, bumped past every id seen so far.
    fn next_id(&mut self) -> i64 {
        let id = Utc::now().timestamp_millis().max(self.last_id + 1);
        self.last_id = id;
        id
    }

    fn note_ids(&mut self, tasks: &Vector<Task>) {
        if let Some(max) = tasks.iter().map(|t| t.id).max() {
            self.last_id = self.last_id.max(max);
        }
    }
}

fn decode(raw: &str) -> Result<Vector<Task>> {
    let tasks: Option<Vector<Task>> = serde_json::from_str(raw).map_err(Error::StorageDecode)?;
    Ok(tasks.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Priority;

    fn test_store() -> TaskStore {
        TaskStore::open(db::open_memory().unwrap()).unwrap()
    }

    fn texts(store: &TaskStore) -> Vec<String> {
        store.tasks().iter().map(|t| t.text.clone()).collect()
    }

    #[test]
    fn empty_slot_loads_empty_list() {
        let store = test_store();
        assert!(store.is_empty());
    }

    #[test]
    fn create_inserts_at_front() {
        let mut store = test_store();
        store.create(TaskFields::new("first")).unwrap();
        store.create(TaskFields::new("second")).unwrap();
        assert_eq!(texts(&store), vec!["second", "first"]);
    }

    #[test]
    fn create_applies_defaults() {
        let mut store = test_store();
        let task = store.create(TaskFields::new("t").with_category("")).unwrap();
        assert_eq!(task.category, "General");
        assert_eq!(task.priority, Priority::Medium);
        assert!(!task.completed);
    }

    #[test]
    fn create_rejects_blank_text() {
        let mut store = test_store();
        assert!(matches!(
            store.create(TaskFields::new("")),
            Err(Error::Validation { .. })
        ));
        assert!(matches!(
            store.create(TaskFields::new("   ")),
            Err(Error::Validation { .. })
        ));
        assert!(store.is_empty());
        assert_eq!(db::read_slot(&store.conn, TASKS_KEY).unwrap(), None);
    }

    #[test]
    fn ids_are_unique_and_increasing() {
        let mut store = test_store();
        let a = store.create(TaskFields::new("a")).unwrap();
        let b = store.create(TaskFields::new("b")).unwrap();
        let c = store.create(TaskFields::new("c")).unwrap();
        assert!(a.id < b.id && b.id < c.id);
    }

    #[test]
    fn ids_not_reused_after_delete() {
        let mut store = test_store();
        let a = store.create(TaskFields::new("a")).unwrap();
        store.delete(a.id).unwrap();
        let b = store.create(TaskFields::new("b")).unwrap();
        assert!(b.id > a.id);
    }

    #[test]
    fn toggle_twice_restores() {
        let mut store = test_store();
        let a = store.create(TaskFields::new("a")).unwrap();
        let b = store.create(TaskFields::new("b")).unwrap();
        assert_eq!(store.toggle_completed(a.id).unwrap(), Some(true));
        assert_eq!(store.toggle_completed(a.id).unwrap(), Some(false));
        assert!(!store.get(a.id).unwrap().completed);
        assert!(!store.get(b.id).unwrap().completed);
    }

    #[test]
    fn toggle_unknown_is_noop() {
        let mut store = test_store();
        store.create(TaskFields::new("a")).unwrap();
        let before = store.snapshot();
        assert_eq!(store.toggle_completed(42).unwrap(), None);
        assert_eq!(store.snapshot(), before);
    }

    #[test]
    fn delete_reports_count() {
        let mut store = test_store();
        let a = store.create(TaskFields::new("a")).unwrap();
        assert_eq!(store.delete(a.id).unwrap(), 1);
        assert_eq!(store.delete(a.id).unwrap(), 0);
        assert!(store.is_empty());
    }

    #[test]
    fn update_preserves_identity() {
        let mut store = test_store();
        let a = store.create(TaskFields::new("a")).unwrap();
        store.toggle_completed(a.id).unwrap();
        let fields = TaskFields::new("renamed")
            .with_notes("n")
            .with_category("Work")
            .with_priority(Priority::High);
        assert!(store.update(a.id, fields).unwrap());
        let task = store.get(a.id).unwrap();
        assert_eq!(task.text, "renamed");
        assert_eq!(task.notes, "n");
        assert_eq!(task.category, "Work");
        assert_eq!(task.priority, Priority::High);
        assert!(task.completed);
        assert_eq!(task.created_at, a.created_at);
    }

    #[test]
    fn update_rejects_blank_text() {
        let mut store = test_store();
        let a = store.create(TaskFields::new("a")).unwrap();
        assert!(store.update(a.id, TaskFields::new(" ")).is_err());
        assert_eq!(store.get(a.id).unwrap().text, "a");
    }

    #[test]
    fn update_unknown_returns_false() {
        let mut store = test_store();
        assert!(!store.update(7, TaskFields::new("x")).unwrap());
    }

    #[test]
    fn clear_completed_keeps_pending_order() {
        let mut store = test_store();
        let ids: Vec<i64> = ["a", "b", "c", "d", "e"]
            .iter()
            .map(|t| store.create(TaskFields::new(*t)).unwrap().id)
            .collect();
        // list order is e d c b a
        store.toggle_completed(ids[1]).unwrap();
        store.toggle_completed(ids[3]).unwrap();
        assert_eq!(store.clear_completed().unwrap(), 2);
        assert_eq!(texts(&store), vec!["e", "c", "a"]);
    }

    #[test]
    fn clear_completed_with_none_is_zero() {
        let mut store = test_store();
        store.create(TaskFields::new("a")).unwrap();
        assert_eq!(store.clear_completed().unwrap(), 0);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn swap_twice_restores() {
        let mut store = test_store();
        let a = store.create(TaskFields::new("a")).unwrap();
        store.create(TaskFields::new("b")).unwrap();
        let c = store.create(TaskFields::new("c")).unwrap();
        assert!(store.swap(a.id, c.id).unwrap());
        assert_eq!(texts(&store), vec!["a", "b", "c"]);
        assert!(store.swap(a.id, c.id).unwrap());
        assert_eq!(texts(&store), vec!["c", "b", "a"]);
    }

    #[test]
    fn swap_missing_or_same_is_noop() {
        let mut store = test_store();
        let a = store.create(TaskFields::new("a")).unwrap();
        assert!(!store.swap(a.id, a.id).unwrap());
        assert!(!store.swap(a.id, 999).unwrap());
    }

    #[test]
    fn mutations_are_persisted() {
        let mut store = test_store();
        let a = store.create(TaskFields::new("a")).unwrap();
        store.create(TaskFields::new("b")).unwrap();
        store.toggle_completed(a.id).unwrap();
        let expected = store.snapshot();
        store.tasks = Vector::new();
        assert!(store.load().unwrap());
        assert_eq!(store.snapshot(), expected);
    }

    #[test]
    fn malformed_slot_loads_empty_and_keeps_copy() {
        let conn = db::open_memory().unwrap();
        db::write_slot(&conn, TASKS_KEY, "{not json").unwrap();
        let store = TaskStore::open(conn).unwrap();
        assert!(store.is_empty());
        assert_eq!(
            db::read_slot(&store.conn, CORRUPT_KEY).unwrap().as_deref(),
            Some("{not json")
        );
    }

    #[test]
    fn reloading_malformed_slot_writes_nothing() {
        let conn = db::open_memory().unwrap();
        db::write_slot(&conn, TASKS_KEY, "{not json").unwrap();
        let mut store = TaskStore::open(conn).unwrap();
        let total_changes = |store: &TaskStore| -> i64 {
            store
                .conn
                .query_row("SELECT total_changes()", [], |row| row.get(0))
                .unwrap()
        };
        let before = total_changes(&store);
        for _ in 0..3 {
            assert!(!store.load().unwrap());
        }
        assert_eq!(total_changes(&store), before);

        db::write_slot(&store.conn, TASKS_KEY, "[oops").unwrap();
        store.load().unwrap();
        assert_eq!(
            db::read_slot(&store.conn, CORRUPT_KEY).unwrap().as_deref(),
            Some("[oops")
        );
    }

    #[test]
    fn null_slot_loads_empty() {
        let conn = db::open_memory().unwrap();
        db::write_slot(&conn, TASKS_KEY, "null").unwrap();
        let store = TaskStore::open(conn).unwrap();
        assert!(store.is_empty());
    }

    #[test]
    fn restore_installs_snapshot() {
        let mut store = test_store();
        store.create(TaskFields::new("a")).unwrap();
        let snapshot = store.snapshot();
        store.create(TaskFields::new("b")).unwrap();
        store.restore(snapshot.clone()).unwrap();
        assert_eq!(store.snapshot(), snapshot);
        store.tasks = Vector::new();
        store.load().unwrap();
        assert_eq!(store.snapshot(), snapshot);
    }

    #[test]
    fn stats_count_completed() {
        let mut store = test_store();
        let a = store.create(TaskFields::new("a")).unwrap();
        store.create(TaskFields::new("b")).unwrap();
        store.toggle_completed(a.id).unwrap();
        let stats = store.stats();
        assert_eq!((stats.total, stats.completed, stats.pending), (2, 1, 1));
    }
}
