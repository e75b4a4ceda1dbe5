//! Reminder dispatch cycle
//!
//! One scan: pull candidates, resolve owners, match against the lookahead
//! window, deliver, then claim. The claim is the store's compare-and-set;
//! a failed delivery leaves the task unclaimed so the next scan inside the
//! window retries it. Per-task failures never abort the cycle.

use std::sync::Arc;

use chrono::Duration;
use eyre::{Context, Result};
use tracing::{debug, info, warn};

use crate::clock::Clock;
use crate::directory::UserDirectory;
use crate::domain::Task;
use crate::notify::Notifier;
use crate::store::TaskStore;

use super::window::is_due_soon;

/// Counters from one scan cycle
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ScanOutcome {
    /// Candidates returned by the store
    pub scanned: usize,
    /// Candidates whose due instant fell inside the window
    pub matched: usize,
    /// Reminders delivered and claimed
    pub sent: usize,
    /// Matches skipped (owner unknown, notifications disabled, lost claim)
    pub skipped: usize,
    /// Delivery or store failures, retried on later scans
    pub failed: usize,
}

/// Orchestrates one reminder scan per tick
pub struct ReminderDispatcher {
    store: Arc<dyn TaskStore>,
    users: Arc<dyn UserDirectory>,
    notifier: Arc<dyn Notifier>,
    clock: Arc<dyn Clock>,
    lookahead: Duration,
}

impl ReminderDispatcher {
    pub fn new(
        store: Arc<dyn TaskStore>,
        users: Arc<dyn UserDirectory>,
        notifier: Arc<dyn Notifier>,
        clock: Arc<dyn Clock>,
        lookahead: Duration,
    ) -> Self {
        Self {
            store,
            users,
            notifier,
            clock,
            lookahead,
        }
    }

    /// Run one scan cycle. An error fetching candidates aborts this cycle
    /// only; the conditional claim means a rerun cannot double-send.
    pub async fn run_cycle(&self) -> Result<ScanOutcome> {
        let now = self.clock.now();
        let candidates = self
            .store
            .find_reminder_candidates()
            .await
            .context("Failed to query reminder candidates")?;

        let mut outcome = ScanOutcome {
            scanned: candidates.len(),
            ..Default::default()
        };

        for task in candidates {
            self.dispatch_one(&task, now, &mut outcome).await;
        }

        info!(
            scanned = outcome.scanned,
            matched = outcome.matched,
            sent = outcome.sent,
            skipped = outcome.skipped,
            failed = outcome.failed,
            "Reminder scan complete"
        );
        Ok(outcome)
    }

    async fn dispatch_one(&self, task: &Task, now: chrono::DateTime<chrono::Utc>, outcome: &mut ScanOutcome) {
        let user = match self.users.find_user(&task.user).await {
            Ok(Some(user)) => user,
            Ok(None) => {
                warn!(task = %task.id, user = %task.user, "Skipping reminder: unknown owner");
                outcome.skipped += 1;
                return;
            }
            Err(e) => {
                warn!(task = %task.id, error = %e, "Skipping reminder: owner lookup failed");
                outcome.failed += 1;
                return;
            }
        };

        if !is_due_soon(task, user.timezone, now, self.lookahead) {
            return;
        }
        outcome.matched += 1;

        if !user.notifications_enabled {
            // No claim either: if the user re-enables notifications while
            // the task is still inside the window, it is delivered then.
            debug!(task = %task.id, user = %user.id, "Skipping reminder: notifications disabled");
            outcome.skipped += 1;
            return;
        }

        // Deliver first, claim on success. A failed send leaves
        // reminder_sent false for retry; a lost claim afterwards means a
        // concurrent scan got there between our send and our claim, which
        // single-flight scanning rules out in normal operation.
        if let Err(e) = self.notifier.send_reminder(&user, task).await {
            warn!(task = %task.id, error = %e, "Reminder delivery failed, will retry next scan");
            outcome.failed += 1;
            return;
        }

        match self.store.claim_reminder(&task.id).await {
            Ok(true) => {
                debug!(task = %task.id, "Reminder delivered and claimed");
                outcome.sent += 1;
            }
            Ok(false) => {
                warn!(task = %task.id, "Reminder already claimed by a concurrent scan; duplicate send");
                outcome.skipped += 1;
            }
            Err(e) => {
                warn!(task = %task.id, error = %e, "Failed to claim delivered reminder");
                outcome.failed += 1;
            }
        }
    }
}
