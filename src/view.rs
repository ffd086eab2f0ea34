// Filtered and sorted projections of the task list

use crate::models::Task;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Which tasks a view shows
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskFilter {
    #[default]
    All,
    Pending,
    Completed,
}

impl TaskFilter {
    pub fn matches(self, task: &Task) -> bool {
        match self {
            TaskFilter::All => true,
            TaskFilter::Pending => !task.completed,
            TaskFilter::Completed => task.completed,
        }
    }

    /// Headline shown when the view is empty
    pub fn empty_message(self) -> &'static str {
        match self {
            TaskFilter::All => "No tasks yet",
            TaskFilter::Pending => "No pending tasks",
            TaskFilter::Completed => "No completed tasks",
        }
    }

    pub fn empty_description(self) -> &'static str {
        match self {
            TaskFilter::All => "Add your first task to get started with your productivity journey!",
            TaskFilter::Pending => "Great job! All your tasks are completed.",
            TaskFilter::Completed => "Complete some tasks to see them here.",
        }
    }
}

impl fmt::Display for TaskFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TaskFilter::All => write!(f, "all"),
            TaskFilter::Pending => write!(f, "pending"),
            TaskFilter::Completed => write!(f, "completed"),
        }
    }
}

impl FromStr for TaskFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "all" => Ok(TaskFilter::All),
            "pending" => Ok(TaskFilter::Pending),
            "completed" => Ok(TaskFilter::Completed),
            other => Err(format!("Invalid filter: '{}' (expected all, pending or completed)", other)),
        }
    }
}

/// Ordering applied to a view
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    #[default]
    Newest,
    Oldest,
    Priority,
    Alphabetical,
}

impl SortOrder {
    /// Next mode in the sort button cycle
    pub fn next(self) -> Self {
        match self {
            SortOrder::Newest => SortOrder::Oldest,
            SortOrder::Oldest => SortOrder::Priority,
            SortOrder::Priority => SortOrder::Alphabetical,
            SortOrder::Alphabetical => SortOrder::Newest,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            SortOrder::Newest => "Sort: Newest",
            SortOrder::Oldest => "Sort: Oldest",
            SortOrder::Priority => "Sort: Priority",
            SortOrder::Alphabetical => "Sort: A-Z",
        }
    }

    /// Sort in place. Every mode is stable, so ties keep their incoming order.
    pub fn apply(self, tasks: &mut [Task]) {
        match self {
            SortOrder::Newest => tasks.sort_by(|a, b| b.created_at.cmp(&a.created_at)),
            SortOrder::Oldest => tasks.sort_by(|a, b| a.created_at.cmp(&b.created_at)),
            SortOrder::Priority => tasks.sort_by(|a, b| b.priority.cmp(&a.priority)),
            SortOrder::Alphabetical => tasks.sort_by_cached_key(|t| t.text.to_lowercase()),
        }
    }
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SortOrder::Newest => write!(f, "newest"),
            SortOrder::Oldest => write!(f, "oldest"),
            SortOrder::Priority => write!(f, "priority"),
            SortOrder::Alphabetical => write!(f, "alphabetical"),
        }
    }
}

impl FromStr for SortOrder {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "newest" => Ok(SortOrder::Newest),
            "oldest" => Ok(SortOrder::Oldest),
            "priority" => Ok(SortOrder::Priority),
            "alphabetical" | "a-z" => Ok(SortOrder::Alphabetical),
            other => Err(format!(
                "Invalid sort order: '{}' (expected newest, oldest, priority or alphabetical)",
                other
            )),
        }
    }
}

/// Build a read-only view: filter, then sort a copy of the matching tasks
pub fn project(tasks: &[Task], filter: TaskFilter, sort: SortOrder) -> Vec<Task> {
    let mut view: Vec<Task> = tasks.iter().filter(|t| filter.matches(t)).cloned().collect();
    sort.apply(&mut view);
    view
}
