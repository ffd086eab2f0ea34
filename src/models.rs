// Data models for TaskFlow

use crate::error::{Result, TaskError};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Maximum task text length, counted in characters after trimming
pub const MAX_TEXT_LEN: usize = 100;

/// A single to-do item
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: u64,
    pub text: String,
    #[serde(default)]
    pub completed: bool,
    #[serde(default)]
    pub priority: Priority,
    #[serde(with = "timestamp")]
    pub created_at: DateTime<Utc>,
    #[serde(default, with = "timestamp::option")]
    pub completed_at: Option<DateTime<Utc>>,
}

impl Task {
    /// Build a pending task. `text` must already have passed `validate_text`.
    pub(crate) fn new(id: u64, text: String, priority: Priority, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            text,
            completed: false,
            priority,
            created_at,
            completed_at: None,
        }
    }

    /// Flip completion, keeping `completed_at` set exactly while completed
    pub(crate) fn toggle(&mut self, now: DateTime<Utc>) {
        self.completed = !self.completed;
        self.completed_at = if self.completed { Some(now) } else { None };
    }

    /// Check the invariants a stored or imported task must hold
    pub fn check(&self) -> std::result::Result<(), String> {
        if self.id == 0 {
            return Err("task id must be a positive integer".to_string());
        }
        if self.text.trim() != self.text {
            return Err(format!("task {} has untrimmed text", self.id));
        }
        if let Err(e) = validate_text(&self.text) {
            return Err(format!("task {}: {}", self.id, e));
        }
        if self.completed != self.completed_at.is_some() {
            return Err(format!(
                "task {} has completed={} but completedAt is {}",
                self.id,
                self.completed,
                if self.completed_at.is_some() { "set" } else { "null" }
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Priority::Low => write!(f, "low"),
            Priority::Medium => write!(f, "medium"),
            Priority::High => write!(f, "high"),
        }
    }
}

impl FromStr for Priority {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "low" => Ok(Priority::Low),
            "medium" => Ok(Priority::Medium),
            "high" => Ok(Priority::High),
            other => Err(format!("Invalid priority: '{}' (expected low, medium or high)", other)),
        }
    }
}

/// Aggregate counts over the whole task list
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Stats {
    pub total: usize,
    pub completed: usize,
    pub pending: usize,
}

impl Stats {
    pub fn from_tasks(tasks: &[Task]) -> Self {
        let total = tasks.len();
        let completed = tasks.iter().filter(|t| t.completed).count();
        Self {
            total,
            completed,
            pending: total - completed,
        }
    }
}

/// Trim task text and enforce the 1..=100 character rule
pub fn validate_text(text: &str) -> Result<String> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(TaskError::validation("Please enter a task"));
    }
    let len = trimmed.chars().count();
    if len > MAX_TEXT_LEN {
        return Err(TaskError::validation(format!(
            "Task is too long ({} characters, max {})",
            len, MAX_TEXT_LEN
        )));
    }
    Ok(trimmed.to_string())
}

/// RFC 3339 timestamps with millisecond precision, e.g. `2024-05-01T10:00:00.000Z`
pub(crate) mod timestamp {
    use chrono::{DateTime, SecondsFormat, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&value.to_rfc3339_opts(SecondsFormat::Millis, true))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
        DateTime::<Utc>::deserialize(deserializer)
    }

    pub mod option {
        use super::*;

        pub fn serialize<S: Serializer>(value: &Option<DateTime<Utc>>, serializer: S) -> Result<S::Ok, S::Error> {
            match value {
                Some(dt) => super::serialize(dt, serializer),
                None => serializer.serialize_none(),
            }
        }

        pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error> {
            Option::<DateTime<Utc>>::deserialize(deserializer)
        }
    }
}

/// Current wall-clock time
pub fn now() -> DateTime<Utc> {
    Utc::now()
}

/// Human-friendly age of `then` relative to `now`
pub fn time_ago(then: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let secs = (now - then).num_seconds().max(0);

    match secs {
        s if s < 60 => "Just now".to_string(),
        s if s < 3_600 => format!("{}m ago", s / 60),
        s if s < 86_400 => format!("{}h ago", s / 3_600),
        s if s < 2_592_000 => format!("{}d ago", s / 86_400),
        _ => then.format("%Y-%m-%d").to_string(),
    }
}
