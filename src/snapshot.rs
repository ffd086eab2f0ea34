// Export/import documents

use crate::error::{Result, TaskError};
use crate::models::Task;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashSet;

/// Version tag written into every export
pub const EXPORT_VERSION: &str = "1.0";

/// Full copy of the task list as written to an export file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    pub tasks: Vec<Task>,
    #[serde(with = "crate::models::timestamp")]
    pub export_date: DateTime<Utc>,
    pub version: String,
}

impl Snapshot {
    pub fn new(tasks: Vec<Task>, export_date: DateTime<Utc>) -> Self {
        Self {
            tasks,
            export_date,
            version: EXPORT_VERSION.to_string(),
        }
    }

    /// Suggested download name, `tasks_<YYYY-MM-DD>.json`
    pub fn file_name(&self) -> String {
        format!("tasks_{}.json", self.export_date.format("%Y-%m-%d"))
    }

    pub fn to_json_pretty(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

/// Parse raw import file contents into a JSON document
pub fn parse_document(text: &str) -> Result<Value> {
    serde_json::from_str(text).map_err(|e| TaskError::import(format!("invalid JSON: {}", e)))
}

/// Extract and validate the task list from an import document
///
/// Only `tasks` is required; `exportDate` and `version` are informational. The
/// whole document is rejected if any task is malformed or ids repeat.
pub fn tasks_from_document(doc: &Value) -> Result<Vec<Task>> {
    let entries = doc
        .get("tasks")
        .ok_or_else(|| TaskError::import("document has no 'tasks' field"))?
        .as_array()
        .ok_or_else(|| TaskError::import("'tasks' is not an array"))?;

    let mut tasks = Vec::with_capacity(entries.len());
    let mut seen = HashSet::with_capacity(entries.len());

    for (index, entry) in entries.iter().enumerate() {
        let task: Task = serde_json::from_value(entry.clone())
            .map_err(|e| TaskError::import(format!("task #{} is malformed: {}", index + 1, e)))?;

        task.check().map_err(TaskError::import)?;

        if !seen.insert(task.id) {
            return Err(TaskError::import(format!("duplicate task id {}", task.id)));
        }

        tasks.push(task);
    }

    Ok(tasks)
}

/// Next id to hand out for a list: one past the largest id, or 1 when empty
///
/// `None` if the largest id leaves no room for another.
pub fn next_id_after(tasks: &[Task]) -> Option<u64> {
    tasks.iter().map(|t| t.id).max().unwrap_or(0).checked_add(1)
}
