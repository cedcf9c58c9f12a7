//! Storage capabilities consumed by the services.
//!
//! Two backends implement each trait: `postgres` for the running service and
//! `memory` for deterministic tests. The backend is chosen when the service
//! is constructed; nothing downstream inspects which one it got.
//!
//! Every task mutation is a single statement keyed by primary key and guarded
//! by `deleted_at IS NULL`, so concurrent calls on the same row serialize in
//! storage (last writer wins) and a soft-deleted row is never touched again.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;

use crate::models::{Task, TaskQuery, TaskStatus, UserCredentials};

pub use memory::{InMemoryCredentialStore, InMemoryTaskStore};
pub use postgres::{PgCredentialStore, PgTaskStore};

/// Any failure below the service layer.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    /// No connection became available within the configured acquire timeout.
    #[error("storage call timed out")]
    Timeout,
}

impl StoreError {
    /// Folds sqlx's pool timeout into the dedicated variant.
    pub(crate) fn from_sqlx(error: sqlx::Error) -> Self {
        match error {
            sqlx::Error::PoolTimedOut => StoreError::Timeout,
            other => StoreError::Database(other),
        }
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Durable row storage for tasks.
#[async_trait]
pub trait TaskStore: Send + Sync {
    /// Active tasks in insertion order, optionally restricted to one owner.
    async fn list(&self, query: TaskQuery) -> StoreResult<Vec<Task>>;

    /// Inserts a new active task and returns the stored row.
    async fn insert(&self, owner_id: i32, title: &str, status: TaskStatus) -> StoreResult<Task>;

    /// Reads one task by id. Soft-deleted rows are only returned when
    /// `include_deleted` is set.
    async fn find(&self, id: i32, include_deleted: bool) -> StoreResult<Option<Task>>;

    /// Rewrites title and status of an active task owned by `owner_id`,
    /// refreshing `updated_at`. Returns `None` when no such active row exists.
    async fn update(
        &self,
        id: i32,
        owner_id: i32,
        title: &str,
        status: TaskStatus,
    ) -> StoreResult<Option<Task>>;

    /// Stamps `deleted_at` on an active task owned by `owner_id`. Returns
    /// `false` when no such active row exists.
    async fn soft_delete(&self, id: i32, owner_id: i32) -> StoreResult<bool>;

    /// Round-trips to the backing storage.
    async fn ping(&self) -> StoreResult<()> {
        Ok(())
    }
}

/// User lookup for the login path.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    async fn find_by_username(&self, username: &str) -> StoreResult<Option<UserCredentials>>;
}
