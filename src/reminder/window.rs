//! Lookahead window matching
//!
//! The one place that decides whether a task is "due soon". The window rule
//! is half-open: `now <= due_instant < now + lookahead`, so a task sits in
//! the window for `lookahead / scan period` consecutive scans before its due
//! instant and never after it.

use chrono::{DateTime, Duration, Utc};
use chrono_tz::Tz;

use crate::clock::local_instant;
use crate::domain::{Task, TaskStatus};

/// Absolute due instant of a task in the owner's timezone, or `None` when
/// the task has no complete (date, time) pair or the local time does not
/// exist that day.
pub fn due_instant(task: &Task, tz: Tz) -> Option<DateTime<Utc>> {
    let date = task.due_date?;
    let time = task.due_time?;
    local_instant(date, time, tz)
}

/// Whether the task's due instant falls inside the current lookahead window.
///
/// Done tasks, already-reminded tasks and tasks without an intraday due time
/// never match.
pub fn is_due_soon(task: &Task, tz: Tz, now: DateTime<Utc>, lookahead: Duration) -> bool {
    if task.status == TaskStatus::Done || task.reminder_sent {
        return false;
    }
    match due_instant(task, tz) {
        Some(due) => now <= due && due < now + lookahead,
        None => false,
    }
}
