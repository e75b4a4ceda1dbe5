//! JSON file-backed task store
//!
//! Default persistence for the `tp` binary: one JSON document holding users
//! and tasks, loaded at open and rewritten after every mutation. The
//! document doubles as the user directory, so a single file configures a
//! complete installation.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::directory::UserDirectory;
use crate::domain::{Task, TaskId, TaskStatus, User};

use super::{StoreError, TaskStore};

/// On-disk document layout
#[derive(Debug, Default, Serialize, Deserialize)]
struct Document {
    #[serde(default)]
    users: Vec<User>,

    #[serde(default)]
    tasks: Vec<Task>,
}

/// File-backed store guarding the loaded document behind one lock, so the
/// reminder claim stays a single compare-and-set.
pub struct JsonTaskStore {
    path: PathBuf,
    inner: Mutex<Document>,
}

impl JsonTaskStore {
    /// Open a store at `path`, creating an empty document if the file does
    /// not exist yet.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref().to_path_buf();
        let doc = if path.exists() {
            let raw = std::fs::read_to_string(&path)?;
            serde_json::from_str(&raw)?
        } else {
            Document::default()
        };
        info!(path = %path.display(), users = doc.users.len(), tasks = doc.tasks.len(), "Opened task store");
        Ok(Self {
            path,
            inner: Mutex::new(doc),
        })
    }

    fn persist(&self, doc: &Document) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let raw = serde_json::to_string_pretty(doc)?;
        std::fs::write(&self.path, raw)?;
        Ok(())
    }

    /// Add or replace a user profile
    pub async fn upsert_user(&self, user: User) -> Result<(), StoreError> {
        let mut doc = self.inner.lock().await;
        match doc.users.iter_mut().find(|u| u.id == user.id) {
            Some(existing) => *existing = user,
            None => doc.users.push(user),
        }
        self.persist(&doc)
    }

    /// Seed a task directly (admin/bootstrap path)
    pub async fn insert_task(&self, task: Task) -> Result<(), StoreError> {
        let mut doc = self.inner.lock().await;
        doc.tasks.push(task);
        self.persist(&doc)
    }

    /// Counts for the `check` command
    pub async fn summary(&self) -> (usize, usize) {
        let doc = self.inner.lock().await;
        (doc.users.len(), doc.tasks.len())
    }
}

#[async_trait]
impl TaskStore for JsonTaskStore {
    async fn find_recurring_active(&self) -> Result<Vec<Task>, StoreError> {
        let doc = self.inner.lock().await;
        Ok(doc.tasks.iter().filter(|t| t.is_recurring).cloned().collect())
    }

    async fn find_reminder_candidates(&self) -> Result<Vec<Task>, StoreError> {
        let doc = self.inner.lock().await;
        Ok(doc
            .tasks
            .iter()
            .filter(|t| t.status != TaskStatus::Done && !t.reminder_sent && t.due_time.is_some())
            .cloned()
            .collect())
    }

    async fn has_occurrence(&self, origin: &TaskId, due_date: NaiveDate) -> Result<bool, StoreError> {
        let doc = self.inner.lock().await;
        Ok(doc
            .tasks
            .iter()
            .any(|t| t.origin.as_ref() == Some(origin) && t.due_date == Some(due_date)))
    }

    async fn create(&self, task: Task) -> Result<Task, StoreError> {
        let mut doc = self.inner.lock().await;
        debug!(id = %task.id, title = %task.title, "JsonTaskStore::create");
        doc.tasks.push(task.clone());
        self.persist(&doc)?;
        Ok(task)
    }

    async fn claim_reminder(&self, id: &TaskId) -> Result<bool, StoreError> {
        let mut doc = self.inner.lock().await;
        let task = doc
            .tasks
            .iter_mut()
            .find(|t| &t.id == id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;

        if task.reminder_sent {
            debug!(%id, "JsonTaskStore::claim_reminder: already claimed");
            return Ok(false);
        }
        task.reminder_sent = true;
        task.updated_at = chrono::Utc::now();
        self.persist(&doc)?;
        Ok(true)
    }
}

#[async_trait]
impl UserDirectory for JsonTaskStore {
    async fn find_user(&self, id: &str) -> Result<Option<User>, StoreError> {
        let doc = self.inner.lock().await;
        Ok(doc.users.iter().find(|u| u.id == id).cloned())
    }
}
