//! Derives the visible, ordered view of the task list from the view state.
//!
//! Everything here is a pure function of its inputs. "Today" is always passed
//! in, and all date logic works on calendar days.

use std::cmp::Ordering;

use chrono::NaiveDate;
use serde::Serialize;
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

use crate::error::{Error, Result};
use crate::model::{Priority, Task};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum StatusFilter {
    #[default]
    All,
    Completed,
    Pending,
    Today,
    Overdue,
}

impl StatusFilter {
    pub fn parse(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "all" => Ok(Self::All),
            "completed" | "done" => Ok(Self::Completed),
            "pending" | "open" => Ok(Self::Pending),
            "today" | "due-today" => Ok(Self::Today),
            "overdue" => Ok(Self::Overdue),
            _ => Err(Error::invalid(
                "filter",
                s,
                "must be all, completed, pending, today, or overdue",
            )),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::All => "all",
            Self::Completed => "completed",
            Self::Pending => "pending",
            Self::Today => "today",
            Self::Overdue => "overdue",
        }
    }

    pub fn next(self) -> Self {
        match self {
            Self::All => Self::Pending,
            Self::Pending => Self::Completed,
            Self::Completed => Self::Today,
            Self::Today => Self::Overdue,
            Self::Overdue => Self::All,
        }
    }

    pub fn matches(self, task: &Task, today: NaiveDate) -> bool {
        match self {
            Self::All => true,
            Self::Completed => task.completed,
            Self::Pending => !task.completed,
            Self::Today => task.date == Some(today),
            Self::Overdue => !task.completed && task.date.is_some_and(|d| d < today),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortKey {
    /// Keep the store's own order.
    #[default]
    None,
    Priority,
    Date,
    Name,
}

impl SortKey {
    pub fn parse(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "none" | "manual" => Ok(Self::None),
            "priority" => Ok(Self::Priority),
            "date" | "due" => Ok(Self::Date),
            "name" | "text" => Ok(Self::Name),
            _ => Err(Error::invalid(
                "sort key",
                s,
                "must be none, priority, date, or name",
            )),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Priority => "priority",
            Self::Date => "date",
            Self::Name => "name",
        }
    }

    pub fn next(self) -> Self {
        match self {
            Self::None => Self::Priority,
            Self::Priority => Self::Date,
            Self::Date => Self::Name,
            Self::Name => Self::None,
        }
    }
}

/// Ephemeral search/filter/sort configuration. Never persisted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ViewState {
    pub search: String,
    pub status: StatusFilter,
    pub priority: Option<Priority>,
    pub sort: SortKey,
}

impl ViewState {
    /// Select `priority` as the filter, or clear it if it is already selected.
    pub fn toggle_priority(&mut self, priority: Priority) {
        self.priority = if self.priority == Some(priority) {
            None
        } else {
            Some(priority)
        };
    }
}

/// Filter and sort `tasks` for display. Sorting is stable and only applied
/// when a sort key is selected; otherwise the input order is kept.
pub fn compute_view<'a, I>(tasks: I, view: &ViewState, today: NaiveDate) -> Vec<&'a Task>
where
    I: IntoIterator<Item = &'a Task>,
{
    let term = view.search.to_lowercase();
    let mut visible: Vec<&Task> = tasks
        .into_iter()
        .filter(|t| matches_search(t, &term))
        .filter(|t| view.status.matches(t, today))
        .filter(|t| view.priority.map_or(true, |p| t.priority == p))
        .collect();

    match view.sort {
        SortKey::None => {}
        SortKey::Priority => visible.sort_by_key(|t| t.priority),
        // Undated tasks go last; `false < true` puts dated ones first.
        SortKey::Date => visible.sort_by_key(|t| (t.date.is_none(), t.date)),
        SortKey::Name => visible.sort_by(|a, b| compare_text(&a.text, &b.text)),
    }
    visible
}

/// `term` must already be lowercase.
fn matches_search(task: &Task, term: &str) -> bool {
    term.is_empty()
        || [&task.text, &task.notes, &task.category]
            .iter()
            .any(|field| field.to_lowercase().contains(term))
}

/// Decomposed, lowercased characters of `s`, with or without accents.
fn folded(s: &str, keep_accents: bool) -> impl Iterator<Item = char> + '_ {
    s.nfd()
        .filter(move |&c| keep_accents || !is_combining_mark(c))
        .flat_map(char::to_lowercase)
}

/// Locale-aware text ordering in three levels: base letters ignoring accents
/// and case, then accents (unaccented first), then case (lowercase first).
pub fn compare_text(a: &str, b: &str) -> Ordering {
    folded(a, false)
        .cmp(folded(b, false))
        .then_with(|| folded(a, true).cmp(folded(b, true)))
        .then_with(|| {
            a.nfd()
                .zip(b.nfd())
                .map(|(x, y)| x.is_uppercase().cmp(&y.is_uppercase()))
                .find(|o| o.is_ne())
                .unwrap_or(Ordering::Equal)
        })
}

/// Where a task's due date falls relative to today.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DueStatus {
    /// Before today and still pending.
    Overdue { days: i64 },
    Today,
    Upcoming { days: i64 },
    /// Before today but already completed.
    Past { days: i64 },
}

pub fn due_status(task: &Task, today: NaiveDate) -> Option<DueStatus> {
    let date = task.date?;
    let days = date.signed_duration_since(today).num_days();
    Some(match days.cmp(&0) {
        Ordering::Equal => DueStatus::Today,
        Ordering::Greater => DueStatus::Upcoming { days },
        Ordering::Less if task.completed => DueStatus::Past { days: -days },
        Ordering::Less => DueStatus::Overdue { days: -days },
    })
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Stats {
    pub total: usize,
    pub completed: usize,
    pub pending: usize,
}

impl Stats {
    pub fn of<'a, I>(tasks: I) -> Self
    where
        I: IntoIterator<Item = &'a Task>,
    {
        let (total, completed) = tasks
            .into_iter()
            .fold((0, 0), |(total, done), t| (total + 1, done + usize::from(t.completed)));
        Self {
            total,
            completed,
            pending: total - completed,
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::*;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn today() -> NaiveDate {
        ymd(2024, 6, 15)
    }

    fn make_task(id: i64, text: &str) -> Task {
        Task {
            id,
            text: text.into(),
            notes: String::new(),
            date: None,
            category: "General".into(),
            priority: Priority::Medium,
            completed: false,
            created_at: Utc.with_ymd_and_hms(2024, 6, 1, 9, 0, 0).unwrap(),
        }
    }

    fn ids(view: &[&Task]) -> Vec<i64> {
        view.iter().map(|t| t.id).collect()
    }

    #[test]
    fn default_view_keeps_store_order() {
        let tasks = vec![make_task(3, "c"), make_task(1, "a"), make_task(2, "b")];
        let view = compute_view(&tasks, &ViewState::default(), today());
        assert_eq!(ids(&view), vec![3, 1, 2]);
    }

    #[test]
    fn search_matches_text_notes_and_category() {
        let mut by_notes = make_task(2, "other");
        by_notes.notes = "Call the BANK".into();
        let mut by_category = make_task(3, "third");
        by_category.category = "Banking".into();
        let tasks = vec![make_task(1, "Bank run"), by_notes, by_category, make_task(4, "x")];
        let view = ViewState {
            search: "bank".into(),
            ..Default::default()
        };
        assert_eq!(ids(&compute_view(&tasks, &view, today())), vec![1, 2, 3]);
    }

    #[test]
    fn status_completed_and_pending() {
        let mut done = make_task(1, "done");
        done.completed = true;
        let tasks = vec![done, make_task(2, "open")];
        let mut view = ViewState {
            status: StatusFilter::Completed,
            ..Default::default()
        };
        assert_eq!(ids(&compute_view(&tasks, &view, today())), vec![1]);
        view.status = StatusFilter::Pending;
        assert_eq!(ids(&compute_view(&tasks, &view, today())), vec![2]);
    }

    #[test]
    fn overdue_and_today_are_day_exact() {
        let mut yesterday = make_task(1, "yesterday");
        yesterday.date = Some(ymd(2024, 6, 14));
        let mut due_today = make_task(2, "today");
        due_today.date = Some(today());
        let undated = make_task(3, "undated");
        let tasks = vec![yesterday.clone(), due_today, undated];

        let overdue = ViewState {
            status: StatusFilter::Overdue,
            ..Default::default()
        };
        assert_eq!(ids(&compute_view(&tasks, &overdue, today())), vec![1]);

        let due = ViewState {
            status: StatusFilter::Today,
            ..Default::default()
        };
        assert_eq!(ids(&compute_view(&tasks, &due, today())), vec![2]);

        yesterday.completed = true;
        let tasks = vec![yesterday];
        assert!(compute_view(&tasks, &overdue, today()).is_empty());
        assert!(compute_view(&tasks, &due, today()).is_empty());
        let pending = ViewState {
            status: StatusFilter::Pending,
            ..Default::default()
        };
        assert!(compute_view(&tasks, &pending, today()).is_empty());
    }

    #[test]
    fn status_and_priority_combine() {
        let mut high_today = make_task(1, "a");
        high_today.date = Some(today());
        high_today.priority = Priority::High;
        let mut low_today = make_task(2, "b");
        low_today.date = Some(today());
        low_today.priority = Priority::Low;
        let tasks = vec![high_today, low_today];
        let view = ViewState {
            status: StatusFilter::Today,
            priority: Some(Priority::Low),
            ..Default::default()
        };
        assert_eq!(ids(&compute_view(&tasks, &view, today())), vec![2]);
    }

    #[test]
    fn sort_by_priority_is_stable() {
        let mut tasks = vec![
            make_task(1, "a"),
            make_task(2, "b"),
            make_task(3, "c"),
            make_task(4, "d"),
        ];
        tasks[0].priority = Priority::Low;
        tasks[1].priority = Priority::High;
        tasks[3].priority = Priority::High;
        let view = ViewState {
            sort: SortKey::Priority,
            ..Default::default()
        };
        assert_eq!(ids(&compute_view(&tasks, &view, today())), vec![2, 4, 3, 1]);
    }

    #[test]
    fn sort_by_date_puts_undated_last() {
        let mut tasks = vec![
            make_task(1, "none-a"),
            make_task(2, "late"),
            make_task(3, "none-b"),
            make_task(4, "early"),
        ];
        tasks[1].date = Some(ymd(2024, 7, 1));
        tasks[3].date = Some(ymd(2024, 6, 1));
        let view = ViewState {
            sort: SortKey::Date,
            ..Default::default()
        };
        assert_eq!(ids(&compute_view(&tasks, &view, today())), vec![4, 2, 1, 3]);
    }

    #[test]
    fn sort_by_name_is_case_insensitive_and_stable() {
        let tasks = vec![
            make_task(1, "banana"),
            make_task(2, "Apple"),
            make_task(3, "apple"),
            make_task(4, "banana"),
            make_task(5, "cherry"),
        ];
        let view = ViewState {
            sort: SortKey::Name,
            ..Default::default()
        };
        assert_eq!(ids(&compute_view(&tasks, &view, today())), vec![3, 2, 1, 4, 5]);

        let tasks = vec![
            make_task(1, "fig"),
            make_task(2, "éclair"),
            make_task(3, "Zebra"),
            make_task(4, "apple"),
        ];
        assert_eq!(ids(&compute_view(&tasks, &view, today())), vec![4, 2, 1, 3]);
    }

    #[test]
    fn compare_text_orders_accents_before_case() {
        let mut words = vec!["école", "Ecole", "ecole", "eclair", "Éclair"];
        words.sort_by(|a, b| compare_text(a, b));
        assert_eq!(words, vec!["eclair", "Éclair", "ecole", "Ecole", "école"]);
        assert_eq!(compare_text("Résumé", "résumé"), Ordering::Greater);
        assert_eq!(compare_text("same", "same"), Ordering::Equal);
    }

    #[test]
    fn compute_view_is_pure() {
        let mut tasks = vec![make_task(1, "b"), make_task(2, "a")];
        tasks[0].priority = Priority::Low;
        let before = tasks.clone();
        let view = ViewState {
            sort: SortKey::Name,
            ..Default::default()
        };
        let first = ids(&compute_view(&tasks, &view, today()));
        let second = ids(&compute_view(&tasks, &view, today()));
        assert_eq!(first, second);
        assert_eq!(tasks, before);
    }

    #[test]
    fn due_status_classification() {
        let mut task = make_task(1, "t");
        assert_eq!(due_status(&task, today()), None);
        task.date = Some(ymd(2024, 6, 12));
        assert_eq!(due_status(&task, today()), Some(DueStatus::Overdue { days: 3 }));
        task.completed = true;
        assert_eq!(due_status(&task, today()), Some(DueStatus::Past { days: 3 }));
        task.date = Some(today());
        assert_eq!(due_status(&task, today()), Some(DueStatus::Today));
        task.date = Some(ymd(2024, 6, 16));
        assert_eq!(due_status(&task, today()), Some(DueStatus::Upcoming { days: 1 }));
    }

    #[test]
    fn parse_filters_and_sort_keys() {
        assert_eq!(StatusFilter::parse("due-today").unwrap(), StatusFilter::Today);
        assert_eq!(StatusFilter::parse("Overdue").unwrap(), StatusFilter::Overdue);
        assert!(StatusFilter::parse("later").is_err());
        assert_eq!(SortKey::parse("name").unwrap(), SortKey::Name);
        assert!(SortKey::parse("size").is_err());
    }

    #[test]
    fn toggle_priority_clears_on_second_press() {
        let mut view = ViewState::default();
        view.toggle_priority(Priority::High);
        assert_eq!(view.priority, Some(Priority::High));
        view.toggle_priority(Priority::Low);
        assert_eq!(view.priority, Some(Priority::Low));
        view.toggle_priority(Priority::Low);
        assert_eq!(view.priority, None);
    }

    #[test]
    fn stats_counts() {
        let mut done = make_task(1, "a");
        done.completed = true;
        let tasks = vec![done, make_task(2, "b"), make_task(3, "c")];
        assert_eq!(
            Stats::of(&tasks),
            Stats {
                total: 3,
                completed: 1,
                pending: 2
            }
        );
    }
}
