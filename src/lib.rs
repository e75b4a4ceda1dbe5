//! TaskPulse - recurrence & reminder scheduling engine
//!
//! The background core of a personal task manager: a daily job that spawns
//! dated occurrences of recurring tasks, and a frequent scan that dispatches
//! at-most-once reminders for tasks whose due instant falls inside a
//! lookahead window.
//!
//! # Core Guarantees
//!
//! - **One composition point**: calendar dates and times-of-day only become
//!   absolute instants through [`clock::local_instant`], parameterized by
//!   the owner's IANA timezone
//! - **At-most-once delivery**: `reminder_sent` is claimed by a store-level
//!   compare-and-set, never a read-then-write
//! - **Single-flight ticks**: a tick whose previous cycle is still running
//!   is skipped and logged, never queued
//! - **Retry by redundancy**: the lookahead window is validated to cover
//!   the scan period, so a failed delivery gets several more scans before
//!   its due instant passes
//!
//! # Modules
//!
//! - [`recurrence`] - pure next-occurrence calculation
//! - [`clock`] - current-instant abstraction and timezone composition
//! - [`reminder`] - lookahead window matching and dispatch
//! - [`occurrence`] - occurrence generation from recurring templates
//! - [`scheduler`] - the two periodic timers
//! - [`store`] / [`directory`] / [`notify`] - collaborator contracts with
//!   default implementations
//! - [`config`] / [`cli`] - binary surface

pub mod cli;
pub mod clock;
pub mod config;
pub mod directory;
pub mod domain;
pub mod notify;
pub mod occurrence;
pub mod recurrence;
pub mod reminder;
pub mod scheduler;
pub mod store;

// Re-export commonly used types
pub use clock::{Clock, FixedClock, SystemClock, local_instant};
pub use config::{Config, StorageConfig};
pub use directory::{StaticUserDirectory, UserDirectory};
pub use domain::{Frequency, RecurrencePattern, Task, TaskId, TaskPriority, TaskStatus, User};
pub use notify::{LogNotifier, Notifier, NotifyError};
pub use occurrence::{GenerationOutcome, OccurrenceGenerator};
pub use recurrence::{CUSTOM_SEARCH_HORIZON_DAYS, RecurrenceError, next_occurrence};
pub use reminder::{ReminderDispatcher, ScanOutcome, due_instant, is_due_soon};
pub use scheduler::{CycleJob, Engine, EngineHandle, EngineStats, TickConfig, TickStats};
pub use store::{JsonTaskStore, MemoryTaskStore, StoreError, TaskStore};
