use chrono::NaiveDate;
use serde::Serialize;

use crate::model::Task;
use crate::query::{due_status, DueStatus, Stats};

#[derive(Serialize)]
pub struct TaskDetail<'a> {
    #[serde(flatten)]
    pub task: &'a Task,
    pub due: Option<String>,
}

impl<'a> TaskDetail<'a> {
    pub fn new(task: &'a Task, today: NaiveDate) -> Self {
        Self {
            task,
            due: due_label(task, today),
        }
    }
}

fn days(n: i64) -> String {
    if n == 1 {
        "1 day".to_string()
    } else {
        format!("{n} days")
    }
}

/// `Jun 15, 2024`
pub fn format_date(date: NaiveDate) -> String {
    date.format("%b %-d, %Y").to_string()
}

/// Human wording for a task's due date relative to `today`.
pub fn due_label(task: &Task, today: NaiveDate) -> Option<String> {
    let status = due_status(task, today)?;
    Some(match status {
        DueStatus::Overdue { days: n } => format!("Overdue by {}", days(n)),
        DueStatus::Today => "Due today".to_string(),
        DueStatus::Upcoming { days: n } => format!("Due in {}", days(n)),
        DueStatus::Past { .. } => format_date(task.date?),
    })
}

pub fn format_task_line(task: &Task, today: NaiveDate) -> String {
    let due = due_label(task, today)
        .map(|d| format!("  {d}"))
        .unwrap_or_default();
    format!(
        "{} {:>13}  {}  [{}] ({}){}",
        task.checkbox(),
        task.id,
        task.text,
        task.priority,
        task.category,
        due
    )
}

pub fn format_task_list(tasks: &[&Task], today: NaiveDate) -> String {
    let mut out = String::new();
    for task in tasks {
        out.push_str(&format_task_line(task, today));
        out.push('\n');
    }
    out
}

pub fn format_task_detail(task: &Task, today: NaiveDate) -> String {
    let mut out = String::new();
    out.push_str(&format!("Id:        {}\n", task.id));
    out.push_str(&format!("Task:      {}\n", task.text));
    out.push_str(&format!(
        "Status:    {}\n",
        if task.completed { "completed" } else { "pending" }
    ));
    out.push_str(&format!("Priority:  {}\n", task.priority));
    out.push_str(&format!("Category:  {}\n", task.category));
    if let Some(date) = task.date {
        let label = due_label(task, today).unwrap_or_default();
        out.push_str(&format!("Due:       {} ({label})\n", date.format("%Y-%m-%d")));
    }
    out.push_str(&format!("Created:   {}\n", task.created_at.to_rfc3339()));
    if !task.notes.is_empty() {
        out.push('\n');
        out.push_str("Notes:\n");
        for line in task.notes.lines() {
            out.push_str(&format!("  {line}\n"));
        }
    }
    out
}

pub fn format_stats(stats: &Stats) -> String {
    format!(
        "{} total, {} completed, {} pending\n",
        stats.total, stats.completed, stats.pending
    )
}
