//! Task store collaborator contract
//!
//! The engine consumes persistence through this narrow trait; the query
//! engine behind it is not the engine's concern. The one semantic the store
//! must provide itself is the conditional claim: `claim_reminder` is an
//! atomic compare-and-set, never a read-then-write sequence in application
//! code.

mod json;
mod memory;

use async_trait::async_trait;
use chrono::NaiveDate;
use thiserror::Error;

use crate::domain::{Task, TaskId};

pub use json::JsonTaskStore;
pub use memory::MemoryTaskStore;

/// Errors surfaced by a task store
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("task not found: {0}")]
    NotFound(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("store unavailable: {0}")]
    Unavailable(String),
}

impl StoreError {
    /// Transient errors resolve themselves; the cycle that hit one simply
    /// retries on its next tick.
    pub fn is_transient(&self) -> bool {
        match self {
            StoreError::Io(_) => true,
            StoreError::Unavailable(_) => true,
            StoreError::NotFound(_) => false,
            StoreError::Serde(_) => false,
        }
    }
}

/// Narrow read/update contract the engine holds against the task store
#[async_trait]
pub trait TaskStore: Send + Sync {
    /// All recurring template tasks whose pattern may still produce
    /// occurrences. Implementations may pre-filter expired patterns; the
    /// generator re-checks expiry either way.
    async fn find_recurring_active(&self) -> Result<Vec<Task>, StoreError>;

    /// Reminder candidates: status != done, reminder not yet sent, and an
    /// intraday due time present.
    async fn find_reminder_candidates(&self) -> Result<Vec<Task>, StoreError>;

    /// Whether an occurrence spawned from `origin` with the given due date
    /// already exists. Backs same-day generation idempotency.
    async fn has_occurrence(&self, origin: &TaskId, due_date: NaiveDate) -> Result<bool, StoreError>;

    /// Persist a new task, returning it as stored.
    async fn create(&self, task: Task) -> Result<Task, StoreError>;

    /// Atomically set `reminder_sent = true` iff it is currently false.
    /// Returns whether this call performed the transition.
    async fn claim_reminder(&self, id: &TaskId) -> Result<bool, StoreError>;
}
