//! Reminder delivery collaborator contract
//!
//! The engine only decides *when* a reminder goes out; the transport (email,
//! push, webhook) lives behind [`Notifier`]. `LogNotifier` is the default
//! sink wired into the binary.

use async_trait::async_trait;
use thiserror::Error;
use tracing::info;

use crate::domain::{Task, User};

/// Delivery failures. Any error leaves the reminder unclaimed so the next
/// scan inside the lookahead window retries it.
#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("notifier unavailable: {0}")]
    Unavailable(String),

    #[error("delivery rejected: {0}")]
    Rejected(String),
}

/// Sends one reminder to one user
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send_reminder(&self, user: &User, task: &Task) -> Result<(), NotifyError>;
}

/// Structured-log delivery sink
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn send_reminder(&self, user: &User, task: &Task) -> Result<(), NotifyError> {
        info!(
            user = %user.username,
            email = %user.email,
            task = %task.id,
            title = %task.title,
            due_date = ?task.due_date,
            due_time = ?task.due_time,
            "Reminder"
        );
        Ok(())
    }
}
