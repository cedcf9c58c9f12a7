use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;
use std::str::FromStr;
use validator::Validate;

/// Represents the status of a task.
///
/// Stored as lowercase text in the `tasks.status` column. Older rows and
/// clients use a handful of looser spellings (`todo`, `open`, `new`, ...);
/// these parse to the canonical variant but are never written back.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    /// Task is yet to be started.
    #[serde(alias = "todo", alias = "open", alias = "new")]
    Pending,
    /// Task is currently being worked on.
    #[serde(alias = "in-progress", alias = "inprogress")]
    InProgress,
    /// Task is completed.
    #[serde(alias = "completed")]
    Done,
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Pending => "pending",
            TaskStatus::InProgress => "in_progress",
            TaskStatus::Done => "done",
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unrecognized task status: {0:?}")]
pub struct UnknownStatus(pub String);

impl FromStr for TaskStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pending" | "todo" | "open" | "new" => Ok(TaskStatus::Pending),
            "in_progress" | "in-progress" | "inprogress" => Ok(TaskStatus::InProgress),
            "done" | "completed" => Ok(TaskStatus::Done),
            _ => Err(UnknownStatus(s.to_string())),
        }
    }
}

impl TryFrom<String> for TaskStatus {
    type Error = UnknownStatus;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// Input structure for creating or updating a task.
///
/// `status` is kept as raw text so an unknown value is reported as a field
/// validation failure rather than a body parse failure.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct TaskInput {
    /// The title of the task. Trimmed; must be non-empty and at most 200 characters.
    #[validate(length(max = 200))]
    pub title: String,

    /// The requested status, in any accepted spelling.
    pub status: String,
}

/// Represents a task row as stored in the database and returned by the API.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, PartialEq, Eq)]
pub struct Task {
    /// Storage-assigned identifier.
    pub id: i32,
    /// Identifier of the user who owns the task. Fixed at creation.
    pub owner_id: i32,
    pub title: String,
    #[sqlx(try_from = "String")]
    pub status: TaskStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Set once when the task is soft-deleted; never cleared.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Task {
    pub fn is_active(&self) -> bool {
        self.deleted_at.is_none()
    }
}

/// Optional filter for listing tasks.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct TaskQuery {
    /// Restrict the listing to tasks owned by this user.
    pub owner_id: Option<i32>,
}

impl TaskQuery {
    pub fn owned_by(owner_id: i32) -> Self {
        Self {
            owner_id: Some(owner_id),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_status_parsing_accepts_synonyms() {
        for raw in ["pending", "todo", "Open", "NEW", " pending "] {
            assert_eq!(raw.parse::<TaskStatus>().unwrap(), TaskStatus::Pending, "{}", raw);
        }
        assert_eq!("in-progress".parse::<TaskStatus>().unwrap(), TaskStatus::InProgress);
        assert_eq!("in_progress".parse::<TaskStatus>().unwrap(), TaskStatus::InProgress);
        assert_eq!("completed".parse::<TaskStatus>().unwrap(), TaskStatus::Done);
        assert!("bogus".parse::<TaskStatus>().is_err());
        assert!("".parse::<TaskStatus>().is_err());
    }

    #[test]
    fn test_status_serializes_canonically() {
        assert_eq!(serde_json::to_value(TaskStatus::InProgress).unwrap(), "in_progress");
        let parsed: TaskStatus = serde_json::from_str("\"todo\"").unwrap();
        assert_eq!(parsed, TaskStatus::Pending);
    }

    #[test]
    fn test_task_input_validation() {
        let valid_input = TaskInput {
            title: "Valid Task".to_string(),
            status: "pending".to_string(),
        };
        assert!(valid_input.validate().is_ok());

        let long_input = TaskInput {
            title: "a".repeat(201),
            status: "pending".to_string(),
        };
        assert!(long_input.validate().is_err());
    }

    #[test]
    fn test_active_task_omits_deleted_at() {
        let now = Utc::now();
        let task = Task {
            id: 1,
            owner_id: 1,
            title: "Test Task".to_string(),
            status: TaskStatus::Pending,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        };
        assert!(task.is_active());
        let json = serde_json::to_value(&task).unwrap();
        assert!(json.get("deleted_at").is_none());
        assert_eq!(json["status"], "pending");
    }
}
