//! Reminder matching and dispatch
//!
//! `window` holds the single lookahead rule; `dispatcher` orchestrates one
//! scan cycle over the store with deliver-then-claim semantics.

mod dispatcher;
mod window;

pub use dispatcher::{ReminderDispatcher, ScanOutcome};
pub use window::{due_instant, is_due_soon};
