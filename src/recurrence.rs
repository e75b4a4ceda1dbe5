//! Next-occurrence calculation for recurring tasks
//!
//! Pure calendar arithmetic: no clock, no store. Given a recurrence pattern
//! and the last due date, compute the next due date or report that the
//! pattern cannot advance.

use chrono::{Datelike, Days, Months, NaiveDate};
use thiserror::Error;

use crate::domain::{Frequency, RecurrencePattern};

/// Bounded horizon for the custom weekday search, in days after the last due
/// date. A non-empty weekday set always matches within 7 days; the bound is a
/// safety valve, not a business rule.
pub const CUSTOM_SEARCH_HORIZON_DAYS: u64 = 14;

/// Malformed recurrence patterns. Callers skip the task and log; these are
/// never fatal to a generation cycle.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RecurrenceError {
    #[error("recurrence interval must be at least 1")]
    ZeroInterval,
}

/// Compute the next occurrence date after `last_due`, or `None` when the
/// pattern has expired or cannot advance.
///
/// - `daily`: `last_due + interval` days
/// - `weekly`: `last_due + 7 * interval` days
/// - `monthly`: calendar month-add; a day-of-month the target month lacks
///   clamps to the last valid day (`2024-01-31 + 1 month = 2024-02-29`)
/// - `custom`: first date in `last_due + 1 ..= last_due + 14` whose weekday
///   is in `days_of_week` (0=Sunday .. 6=Saturday)
///
/// A computed date strictly after `end_date` means the recurrence has
/// expired and yields `None` regardless of frequency.
pub fn next_occurrence(
    pattern: &RecurrencePattern,
    last_due: NaiveDate,
) -> Result<Option<NaiveDate>, RecurrenceError> {
    if pattern.interval == 0 {
        return Err(RecurrenceError::ZeroInterval);
    }

    let next = match pattern.frequency {
        Frequency::Daily => last_due.checked_add_days(Days::new(pattern.interval as u64)),
        Frequency::Weekly => last_due.checked_add_days(Days::new(7 * pattern.interval as u64)),
        Frequency::Monthly => last_due.checked_add_months(Months::new(pattern.interval)),
        Frequency::Custom => next_matching_weekday(last_due, &pattern.days_of_week),
    };

    match next {
        Some(date) if expired(pattern, date) => Ok(None),
        other => Ok(other),
    }
}

fn expired(pattern: &RecurrencePattern, date: NaiveDate) -> bool {
    pattern.end_date.is_some_and(|end| date > end)
}

/// Forward day-by-day search for the first date whose weekday is in `days`.
fn next_matching_weekday(last_due: NaiveDate, days: &[u8]) -> Option<NaiveDate> {
    (1..=CUSTOM_SEARCH_HORIZON_DAYS)
        .filter_map(|offset| last_due.checked_add_days(Days::new(offset)))
        .find(|date| days.contains(&(date.weekday().num_days_from_sunday() as u8)))
}
