//! Task lifecycle rules.
//!
//! A task is either active or soft-deleted, and soft deletion is terminal.
//! `TaskService` validates input before any storage call, enforces the
//! single-owner policy on mutation, and otherwise defers to the `TaskStore`,
//! whose statements carry the `deleted_at IS NULL` predicate themselves.

use std::sync::Arc;
use validator::Validate;

use crate::models::{Task, TaskInput, TaskQuery, TaskStatus};
use crate::store::{StoreError, TaskStore};

/// Which field rule rejected the input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ValidationKind {
    #[error("title must not be empty")]
    EmptyTitle,
    #[error("title must be at most 200 characters")]
    TitleTooLong,
    #[error("status must be one of pending, in_progress, done")]
    InvalidStatus,
}

impl ValidationKind {
    /// The request field the rule applies to.
    pub fn field(&self) -> &'static str {
        match self {
            ValidationKind::EmptyTitle | ValidationKind::TitleTooLong => "title",
            ValidationKind::InvalidStatus => "status",
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum TaskError {
    #[error("validation failed: {0}")]
    Validation(ValidationKind),
    /// The id is absent or the task is already soft-deleted.
    #[error("task {0} not found")]
    NotFound(i32),
    /// The task exists but belongs to someone else.
    #[error("task {0} is owned by another user")]
    Forbidden(i32),
    #[error(transparent)]
    Storage(#[from] StoreError),
}

impl From<ValidationKind> for TaskError {
    fn from(kind: ValidationKind) -> Self {
        TaskError::Validation(kind)
    }
}

/// A title and status that passed every field rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidTask {
    pub title: String,
    pub status: TaskStatus,
}

impl TryFrom<&TaskInput> for ValidTask {
    type Error = ValidationKind;

    fn try_from(input: &TaskInput) -> Result<Self, Self::Error> {
        let trimmed = TaskInput {
            title: input.title.trim().to_string(),
            status: input.status.clone(),
        };
        if trimmed.title.is_empty() {
            return Err(ValidationKind::EmptyTitle);
        }
        trimmed
            .validate()
            .map_err(|_| ValidationKind::TitleTooLong)?;

        let status = trimmed
            .status
            .parse::<TaskStatus>()
            .map_err(|_| ValidationKind::InvalidStatus)?;

        Ok(ValidTask {
            title: trimmed.title,
            status,
        })
    }
}

/// Business-logic core for tasks. Cheap to clone; holds no mutable state.
#[derive(Clone)]
pub struct TaskService {
    store: Arc<dyn TaskStore>,
}

impl TaskService {
    pub fn new(store: Arc<dyn TaskStore>) -> Self {
        Self { store }
    }

    /// Active tasks in insertion order.
    pub async fn list(&self, query: TaskQuery) -> Result<Vec<Task>, TaskError> {
        Ok(self.store.list(query).await?)
    }

    pub async fn create(&self, owner_id: i32, input: &TaskInput) -> Result<Task, TaskError> {
        let valid = ValidTask::try_from(input)?;
        let task = self
            .store
            .insert(owner_id, &valid.title, valid.status)
            .await?;
        log::info!("task {} created by user {}", task.id, owner_id);
        Ok(task)
    }

    /// Rewrites title and status of an active task owned by `subject`.
    pub async fn update(&self, id: i32, subject: i32, input: &TaskInput) -> Result<Task, TaskError> {
        let valid = ValidTask::try_from(input)?;
        self.authorize(id, subject).await?;

        // A concurrent soft delete can land between the ownership check and
        // the write; the store predicate turns that into a miss.
        match self
            .store
            .update(id, subject, &valid.title, valid.status)
            .await?
        {
            Some(task) => Ok(task),
            None => Err(TaskError::NotFound(id)),
        }
    }

    /// Moves an active task owned by `subject` to the soft-deleted state.
    pub async fn delete(&self, id: i32, subject: i32) -> Result<(), TaskError> {
        self.authorize(id, subject).await?;

        if self.store.soft_delete(id, subject).await? {
            log::info!("task {} soft-deleted by user {}", id, subject);
            Ok(())
        } else {
            Err(TaskError::NotFound(id))
        }
    }

    /// Reads a task by id whether or not it has been soft-deleted.
    /// Intended for audit; no HTTP route exposes it.
    pub async fn find_including_deleted(&self, id: i32) -> Result<Option<Task>, TaskError> {
        Ok(self.store.find(id, true).await?)
    }

    /// Whether the task store answers at all.
    pub async fn storage_ready(&self) -> bool {
        match self.store.ping().await {
            Ok(()) => true,
            Err(e) => {
                log::warn!("task storage unavailable: {}", e);
                false
            }
        }
    }

    async fn authorize(&self, id: i32, subject: i32) -> Result<Task, TaskError> {
        let task = self
            .store
            .find(id, false)
            .await?
            .ok_or(TaskError::NotFound(id))?;

        if task.owner_id != subject {
            return Err(TaskError::Forbidden(id));
        }
        Ok(task)
    }
}
