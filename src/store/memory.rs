//! In-memory task store
//!
//! Reference implementation of the store contract, used by tests and by
//! embedders that bring their own persistence. The claim is a single
//! compare-and-set under the store's interior lock.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::NaiveDate;
use tokio::sync::Mutex;
use tracing::debug;

use crate::domain::{Task, TaskId, TaskStatus};

use super::{StoreError, TaskStore};

/// Mutex-guarded task map
#[derive(Default)]
pub struct MemoryTaskStore {
    tasks: Mutex<HashMap<TaskId, Task>>,
}

impl MemoryTaskStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the store with existing tasks
    pub async fn insert(&self, task: Task) {
        let mut tasks = self.tasks.lock().await;
        tasks.insert(task.id.clone(), task);
    }

    /// Fetch a task by id (test observability)
    pub async fn get(&self, id: &TaskId) -> Option<Task> {
        let tasks = self.tasks.lock().await;
        tasks.get(id).cloned()
    }

    /// Number of stored tasks
    pub async fn len(&self) -> usize {
        self.tasks.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.tasks.lock().await.is_empty()
    }
}

#[async_trait]
impl TaskStore for MemoryTaskStore {
    async fn find_recurring_active(&self) -> Result<Vec<Task>, StoreError> {
        let tasks = self.tasks.lock().await;
        Ok(tasks.values().filter(|t| t.is_recurring).cloned().collect())
    }

    async fn find_reminder_candidates(&self) -> Result<Vec<Task>, StoreError> {
        let tasks = self.tasks.lock().await;
        Ok(tasks
            .values()
            .filter(|t| t.status != TaskStatus::Done && !t.reminder_sent && t.due_time.is_some())
            .cloned()
            .collect())
    }

    async fn has_occurrence(&self, origin: &TaskId, due_date: NaiveDate) -> Result<bool, StoreError> {
        let tasks = self.tasks.lock().await;
        Ok(tasks
            .values()
            .any(|t| t.origin.as_ref() == Some(origin) && t.due_date == Some(due_date)))
    }

    async fn create(&self, task: Task) -> Result<Task, StoreError> {
        let mut tasks = self.tasks.lock().await;
        debug!(id = %task.id, title = %task.title, "MemoryTaskStore::create");
        tasks.insert(task.id.clone(), task.clone());
        Ok(task)
    }

    async fn claim_reminder(&self, id: &TaskId) -> Result<bool, StoreError> {
        let mut tasks = self.tasks.lock().await;
        let task = tasks
            .get_mut(id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;

        if task.reminder_sent {
            debug!(%id, "MemoryTaskStore::claim_reminder: already claimed");
            return Ok(false);
        }
        task.reminder_sent = true;
        task.updated_at = chrono::Utc::now();
        Ok(true)
    }
}
