use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use tokio::sync::RwLock;

use super::{CredentialStore, StoreResult, TaskStore};
use crate::models::{Task, TaskQuery, TaskStatus, UserCredentials};

#[derive(Debug, Default)]
struct Rows {
    // Ids are assigned sequentially, so vector order is insertion order.
    tasks: Vec<Task>,
    next_id: i32,
}

impl Rows {
    fn active_mut(&mut self, id: i32, owner_id: i32) -> Option<&mut Task> {
        self.tasks
            .iter_mut()
            .find(|t| t.id == id && t.owner_id == owner_id && t.is_active())
    }
}

/// Task storage held in process memory.
///
/// Mirrors the SQL backend's predicates exactly: soft-deleted rows stay in
/// the vector and are filtered at query time.
#[derive(Debug, Default)]
pub struct InMemoryTaskStore {
    rows: RwLock<Rows>,
}

impl InMemoryTaskStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TaskStore for InMemoryTaskStore {
    async fn list(&self, query: TaskQuery) -> StoreResult<Vec<Task>> {
        let rows = self.rows.read().await;
        Ok(rows
            .tasks
            .iter()
            .filter(|t| t.is_active())
            .filter(|t| query.owner_id.map_or(true, |owner| t.owner_id == owner))
            .cloned()
            .collect())
    }

    async fn insert(&self, owner_id: i32, title: &str, status: TaskStatus) -> StoreResult<Task> {
        let mut rows = self.rows.write().await;
        rows.next_id += 1;
        let now = Utc::now();
        let task = Task {
            id: rows.next_id,
            owner_id,
            title: title.to_string(),
            status,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        };
        rows.tasks.push(task.clone());
        Ok(task)
    }

    async fn find(&self, id: i32, include_deleted: bool) -> StoreResult<Option<Task>> {
        let rows = self.rows.read().await;
        Ok(rows
            .tasks
            .iter()
            .find(|t| t.id == id && (include_deleted || t.is_active()))
            .cloned())
    }

    async fn update(
        &self,
        id: i32,
        owner_id: i32,
        title: &str,
        status: TaskStatus,
    ) -> StoreResult<Option<Task>> {
        let mut rows = self.rows.write().await;
        Ok(rows.active_mut(id, owner_id).map(|task| {
            task.title = title.to_string();
            task.status = status;
            task.updated_at = Utc::now();
            task.clone()
        }))
    }

    async fn soft_delete(&self, id: i32, owner_id: i32) -> StoreResult<bool> {
        let mut rows = self.rows.write().await;
        Ok(match rows.active_mut(id, owner_id) {
            Some(task) => {
                task.deleted_at = Some(Utc::now());
                true
            }
            None => false,
        })
    }
}

/// Credential lookup over a fixed set of users.
#[derive(Debug, Default)]
pub struct InMemoryCredentialStore {
    users: HashMap<String, UserCredentials>,
}

impl InMemoryCredentialStore {
    pub fn new(users: impl IntoIterator<Item = UserCredentials>) -> Self {
        Self {
            users: users
                .into_iter()
                .map(|u| (u.username.clone(), u))
                .collect(),
        }
    }
}

#[async_trait]
impl CredentialStore for InMemoryCredentialStore {
    async fn find_by_username(&self, username: &str) -> StoreResult<Option<UserCredentials>> {
        Ok(self.users.get(username).cloned())
    }
}
