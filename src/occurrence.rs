//! Occurrence generation cycle
//!
//! One generation pass: for every recurring template whose next computed
//! date is "today" in the owner's calendar, spawn a fresh occurrence. The
//! template itself is never mutated; same-day idempotency comes from the
//! store's (origin, due_date) duplicate check.

use std::sync::Arc;

use eyre::{Context, Result};
use tracing::{debug, info, warn};

use crate::clock::Clock;
use crate::directory::UserDirectory;
use crate::domain::Task;
use crate::recurrence::next_occurrence;
use crate::store::TaskStore;

/// Counters from one generation cycle
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct GenerationOutcome {
    /// Recurring templates examined
    pub examined: usize,
    /// Occurrences created
    pub spawned: usize,
    /// Templates whose pattern has expired or cannot advance
    pub exhausted: usize,
    /// Templates skipped (wrong day, duplicate, unknown owner, bad pattern)
    pub skipped: usize,
    /// Per-template store failures
    pub failed: usize,
}

/// Orchestrates one occurrence-generation pass per tick
pub struct OccurrenceGenerator {
    store: Arc<dyn TaskStore>,
    users: Arc<dyn UserDirectory>,
    clock: Arc<dyn Clock>,
}

impl OccurrenceGenerator {
    pub fn new(store: Arc<dyn TaskStore>, users: Arc<dyn UserDirectory>, clock: Arc<dyn Clock>) -> Self {
        Self { store, users, clock }
    }

    /// Run one generation cycle. Only the initial template query can abort
    /// the cycle; everything after is isolated per template.
    pub async fn run_cycle(&self) -> Result<GenerationOutcome> {
        let templates = self
            .store
            .find_recurring_active()
            .await
            .context("Failed to query recurring tasks")?;

        let mut outcome = GenerationOutcome {
            examined: templates.len(),
            ..Default::default()
        };

        for template in &templates {
            self.generate_one(template, &mut outcome).await;
        }

        info!(
            examined = outcome.examined,
            spawned = outcome.spawned,
            exhausted = outcome.exhausted,
            skipped = outcome.skipped,
            failed = outcome.failed,
            "Occurrence generation complete"
        );
        Ok(outcome)
    }

    async fn generate_one(&self, template: &Task, outcome: &mut GenerationOutcome) {
        let Some(pattern) = template.recurrence.as_ref() else {
            warn!(task = %template.id, "Recurring task has no pattern, skipping");
            outcome.skipped += 1;
            return;
        };
        let Some(last_due) = template.due_date else {
            debug!(task = %template.id, "Recurring task has no due date, skipping");
            outcome.skipped += 1;
            return;
        };

        let user = match self.users.find_user(&template.user).await {
            Ok(Some(user)) => user,
            Ok(None) => {
                warn!(task = %template.id, user = %template.user, "Skipping template: unknown owner");
                outcome.skipped += 1;
                return;
            }
            Err(e) => {
                warn!(task = %template.id, error = %e, "Skipping template: owner lookup failed");
                outcome.failed += 1;
                return;
            }
        };

        let next = match next_occurrence(pattern, last_due) {
            Ok(Some(next)) => next,
            Ok(None) => {
                debug!(task = %template.id, "Recurrence expired or cannot advance");
                outcome.exhausted += 1;
                return;
            }
            Err(e) => {
                warn!(task = %template.id, error = %e, "Malformed recurrence pattern, skipping");
                outcome.skipped += 1;
                return;
            }
        };

        // Exact-day trigger: only spawn when the computed date is today in
        // the owner's calendar, no catch-up for missed days.
        let today = self.clock.now().with_timezone(&user.timezone).date_naive();
        if next != today {
            debug!(task = %template.id, %next, %today, "Next occurrence is not today, skipping");
            outcome.skipped += 1;
            return;
        }

        match self.store.has_occurrence(&template.id, next).await {
            Ok(true) => {
                debug!(task = %template.id, %next, "Occurrence already generated today");
                outcome.skipped += 1;
                return;
            }
            Ok(false) => {}
            Err(e) => {
                warn!(task = %template.id, error = %e, "Duplicate check failed, skipping this cycle");
                outcome.failed += 1;
                return;
            }
        }

        match self.store.create(template.occurrence_on(next)).await {
            Ok(created) => {
                info!(template = %template.id, occurrence = %created.id, due = %next, "Created recurring occurrence");
                outcome.spawned += 1;
            }
            Err(e) => {
                warn!(template = %template.id, error = %e, "Failed to create occurrence");
                outcome.failed += 1;
            }
        }
    }
}
