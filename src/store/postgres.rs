use async_trait::async_trait;
use sqlx::migrate::Migrator;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use std::path::Path;

use super::{CredentialStore, StoreError, StoreResult, TaskStore};
use crate::config::Config;
use crate::models::{Task, TaskQuery, TaskStatus, UserCredentials};

const TASK_COLUMNS: &str = "id, owner_id, title, status, created_at, updated_at, deleted_at";

/// Builds the shared connection pool.
///
/// The acquire timeout doubles as the per-request storage timeout: a request
/// that cannot get a connection in time fails with `StoreError::Timeout`.
pub async fn connect(config: &Config) -> StoreResult<PgPool> {
    PgPoolOptions::new()
        .max_connections(config.db_max_connections)
        .acquire_timeout(config.db_acquire_timeout)
        .connect(&config.database_url)
        .await
        .map_err(StoreError::from_sqlx)
}

/// Applies pending migrations: those in `dir` when one is configured,
/// otherwise the set compiled in from `migrations/`.
pub async fn migrate(pool: &PgPool, dir: Option<&Path>) -> StoreResult<()> {
    let migrator = match dir {
        Some(dir) => {
            log::info!("Applying migrations from {}", dir.display());
            Migrator::new(dir)
                .await
                .map_err(|e| StoreError::Database(e.into()))?
        }
        None => sqlx::migrate!("./migrations"),
    };
    migrator
        .run(pool)
        .await
        .map_err(|e| StoreError::Database(e.into()))
}

#[derive(Debug, Clone)]
pub struct PgTaskStore {
    pool: PgPool,
}

impl PgTaskStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TaskStore for PgTaskStore {
    async fn list(&self, query: TaskQuery) -> StoreResult<Vec<Task>> {
        let sql = format!(
            "SELECT {} FROM tasks \
             WHERE deleted_at IS NULL AND ($1::INT IS NULL OR owner_id = $1) \
             ORDER BY id",
            TASK_COLUMNS
        );
        sqlx::query_as::<_, Task>(&sql)
            .bind(query.owner_id)
            .fetch_all(&self.pool)
            .await
            .map_err(StoreError::from_sqlx)
    }

    async fn insert(&self, owner_id: i32, title: &str, status: TaskStatus) -> StoreResult<Task> {
        let sql = format!(
            "INSERT INTO tasks (owner_id, title, status, created_at, updated_at) \
             VALUES ($1, $2, $3, NOW(), NOW()) \
             RETURNING {}",
            TASK_COLUMNS
        );
        sqlx::query_as::<_, Task>(&sql)
            .bind(owner_id)
            .bind(title)
            .bind(status.as_str())
            .fetch_one(&self.pool)
            .await
            .map_err(StoreError::from_sqlx)
    }

    async fn find(&self, id: i32, include_deleted: bool) -> StoreResult<Option<Task>> {
        let sql = format!(
            "SELECT {} FROM tasks WHERE id = $1 AND ($2 OR deleted_at IS NULL)",
            TASK_COLUMNS
        );
        sqlx::query_as::<_, Task>(&sql)
            .bind(id)
            .bind(include_deleted)
            .fetch_optional(&self.pool)
            .await
            .map_err(StoreError::from_sqlx)
    }

    async fn update(
        &self,
        id: i32,
        owner_id: i32,
        title: &str,
        status: TaskStatus,
    ) -> StoreResult<Option<Task>> {
        let sql = format!(
            "UPDATE tasks SET title = $1, status = $2, updated_at = NOW() \
             WHERE id = $3 AND owner_id = $4 AND deleted_at IS NULL \
             RETURNING {}",
            TASK_COLUMNS
        );
        sqlx::query_as::<_, Task>(&sql)
            .bind(title)
            .bind(status.as_str())
            .bind(id)
            .bind(owner_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(StoreError::from_sqlx)
    }

    async fn soft_delete(&self, id: i32, owner_id: i32) -> StoreResult<bool> {
        let result = sqlx::query(
            "UPDATE tasks SET deleted_at = NOW() \
             WHERE id = $1 AND owner_id = $2 AND deleted_at IS NULL",
        )
        .bind(id)
        .bind(owner_id)
        .execute(&self.pool)
        .await
        .map_err(StoreError::from_sqlx)?;

        Ok(result.rows_affected() == 1)
    }

    async fn ping(&self) -> StoreResult<()> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(StoreError::from_sqlx)?;
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct PgCredentialStore {
    pool: PgPool,
}

impl PgCredentialStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CredentialStore for PgCredentialStore {
    async fn find_by_username(&self, username: &str) -> StoreResult<Option<UserCredentials>> {
        sqlx::query_as::<_, UserCredentials>(
            "SELECT id, username, email, password_hash, created_at FROM users WHERE username = $1",
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await
        .map_err(StoreError::from_sqlx)
    }
}
