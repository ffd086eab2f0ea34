// Error types for TaskFlow

use thiserror::Error;

/// Errors surfaced by task store operations
///
/// None of these are fatal. Validation and import errors are raised before any
/// state is touched; persistence errors are raised after the in-memory change
/// has already been applied.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TaskError {
    /// Task text was empty or too long after trimming
    #[error("Invalid task text: {reason}")]
    Validation { reason: String },

    /// Import document was malformed or violated a task invariant
    #[error("Failed to import tasks: {reason}")]
    Import { reason: String },

    /// Storage read or write failed
    #[error("Storage error for key '{key}': {reason}")]
    Persistence { key: String, reason: String },
}

impl TaskError {
    pub fn validation(reason: impl Into<String>) -> Self {
        TaskError::Validation { reason: reason.into() }
    }

    pub fn import(reason: impl Into<String>) -> Self {
        TaskError::Import { reason: reason.into() }
    }

    pub fn persistence(key: impl Into<String>, reason: impl Into<String>) -> Self {
        TaskError::Persistence {
            key: key.into(),
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, TaskError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = TaskError::validation("Please enter a task");
        assert_eq!(err.to_string(), "Invalid task text: Please enter a task");

        let err = TaskError::import("missing 'tasks' array");
        assert_eq!(err.to_string(), "Failed to import tasks: missing 'tasks' array");

        let err = TaskError::persistence("taskflow_tasks", "quota exceeded");
        assert_eq!(err.to_string(), "Storage error for key 'taskflow_tasks': quota exceeded");
    }
}
