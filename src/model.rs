use std::fmt;

use chrono::{DateTime, Days, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

pub const DEFAULT_CATEGORY: &str = "General";

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    High,
    #[default]
    Medium,
    Low,
}

impl Priority {
    pub fn parse(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "high" | "h" => Ok(Self::High),
            "medium" | "med" | "m" => Ok(Self::Medium),
            "low" | "l" => Ok(Self::Low),
            _ => Err(Error::invalid("priority", s, "must be high, medium, or low")),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::High => "high",
            Self::Medium => "medium",
            Self::Low => "low",
        }
    }

    /// Next value in high → medium → low → high order.
    pub fn next(self) -> Self {
        match self {
            Self::High => Self::Medium,
            Self::Medium => Self::Low,
            Self::Low => Self::High,
        }
    }

    pub fn prev(self) -> Self {
        match self {
            Self::High => Self::Low,
            Self::Medium => Self::High,
            Self::Low => Self::Medium,
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn default_category() -> String {
    DEFAULT_CATEGORY.to_string()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: i64,
    pub text: String,
    #[serde(default)]
    pub notes: String,
    #[serde(default, with = "due_date")]
    pub date: Option<NaiveDate>,
    #[serde(default = "default_category")]
    pub category: String,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default)]
    pub completed: bool,
    pub created_at: DateTime<Utc>,
}

impl Task {
    /// Checkbox marker for list output: `[x]` when completed.
    pub fn checkbox(&self) -> &'static str {
        if self.completed {
            "[x]"
        } else {
            "[ ]"
        }
    }
}

/// The user-editable fields of a task, used for both create and update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskFields {
    pub text: String,
    pub notes: String,
    pub date: Option<NaiveDate>,
    pub category: String,
    pub priority: Priority,
}

impl TaskFields {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            notes: String::new(),
            date: None,
            category: default_category(),
            priority: Priority::default(),
        }
    }

    pub fn from_task(task: &Task) -> Self {
        Self {
            text: task.text.clone(),
            notes: task.notes.clone(),
            date: task.date,
            category: task.category.clone(),
            priority: task.priority,
        }
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = notes.into();
        self
    }

    pub fn with_date(mut self, date: Option<NaiveDate>) -> Self {
        self.date = date;
        self
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = category.into();
        self
    }

    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    pub(crate) fn validate(&self) -> Result<()> {
        if self.text.trim().is_empty() {
            return Err(Error::Validation { field: "task text" });
        }
        Ok(())
    }

    /// Category as it should be stored: blank falls back to the default.
    pub(crate) fn stored_category(&self) -> String {
        let trimmed = self.category.trim();
        if trimmed.is_empty() {
            default_category()
        } else {
            trimmed.to_string()
        }
    }
}

/// Parse a user-entered due date: `YYYY-MM-DD`, `today`, `tomorrow`,
/// or an empty string / `none` for no date.
pub fn parse_due_date(s: &str, today: NaiveDate) -> Result<Option<NaiveDate>> {
    match s.trim().to_ascii_lowercase().as_str() {
        "" | "none" => Ok(None),
        "today" => Ok(Some(today)),
        "tomorrow" => Ok(today.checked_add_days(Days::new(1))),
        _ => parse_iso_date(s.trim())
            .map(Some)
            .ok_or_else(|| Error::invalid("date", s, "expected YYYY-MM-DD, today, or tomorrow")),
    }
}

/// Accepts a calendar date or a full RFC 3339 timestamp (its date part is used).
pub(crate) fn parse_iso_date(s: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .or_else(|| DateTime::parse_from_rfc3339(s).ok().map(|dt| dt.date_naive()))
}

/// Due dates persist as `YYYY-MM-DD`, or `""` when absent.
mod due_date {
    use chrono::NaiveDate;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(date: &Option<NaiveDate>, s: S) -> Result<S::Ok, S::Error> {
        match date {
            Some(d) => s.collect_str(&d.format("%Y-%m-%d")),
            None => s.serialize_str(""),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<NaiveDate>, D::Error> {
        let raw = Option::<String>::deserialize(d)?;
        match raw.as_deref().map(str::trim) {
            None | Some("") => Ok(None),
            Some(s) => super::parse_iso_date(s)
                .map(Some)
                .ok_or_else(|| serde::de::Error::custom(format!("invalid date '{s}'"))),
        }
    }
}
