//! Task record and recurrence pattern
//!
//! Task is the unit the engine operates on. Recurring tasks act as templates:
//! the generator spawns dated occurrences from them, and the dispatcher flips
//! `reminder_sent` exactly once per occurrence.

use std::collections::HashMap;

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

use super::id::TaskId;

/// Workflow status of a task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    /// Not yet started
    #[default]
    Todo,
    /// Being worked on
    InProgress,
    /// Finished; excluded from reminder matching
    Done,
}

impl std::fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Todo => write!(f, "todo"),
            Self::InProgress => write!(f, "in_progress"),
            Self::Done => write!(f, "done"),
        }
    }
}

/// Task priority, copied verbatim onto generated occurrences
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TaskPriority {
    Low,
    #[default]
    Medium,
    High,
}

impl std::fmt::Display for TaskPriority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Low => write!(f, "low"),
            Self::Medium => write!(f, "medium"),
            Self::High => write!(f, "high"),
        }
    }
}

/// How often a recurring task repeats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Frequency {
    Daily,
    Weekly,
    Monthly,
    /// Repeat on a fixed set of weekdays
    Custom,
}

impl std::fmt::Display for Frequency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Daily => write!(f, "daily"),
            Self::Weekly => write!(f, "weekly"),
            Self::Monthly => write!(f, "monthly"),
            Self::Custom => write!(f, "custom"),
        }
    }
}

/// Declarative recurrence rule
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecurrencePattern {
    pub frequency: Frequency,

    /// Step multiplier, e.g. 2 = every other day/week/month. Must be >= 1.
    #[serde(default = "default_interval")]
    pub interval: u32,

    /// Weekday numbers for custom frequency, 0=Sunday .. 6=Saturday
    #[serde(default)]
    pub days_of_week: Vec<u8>,

    /// Recurrence stops strictly after this date
    #[serde(default)]
    pub end_date: Option<NaiveDate>,
}

fn default_interval() -> u32 {
    1
}

impl RecurrencePattern {
    /// Convenience constructor with interval 1 and no bounds
    pub fn every(frequency: Frequency) -> Self {
        Self {
            frequency,
            interval: 1,
            days_of_week: Vec::new(),
            end_date: None,
        }
    }

    /// Set the step multiplier
    pub fn with_interval(mut self, interval: u32) -> Self {
        self.interval = interval;
        self
    }

    /// Set the weekday set (0=Sunday .. 6=Saturday)
    pub fn with_days_of_week(mut self, days: Vec<u8>) -> Self {
        self.days_of_week = days;
        self
    }

    /// Set the end date
    pub fn with_end_date(mut self, end: NaiveDate) -> Self {
        self.end_date = Some(end);
        self
    }
}

/// A task record
///
/// `due_date` is a timezone-naive calendar day and `due_time` a timezone-naive
/// local time; both are interpreted in the owner's configured timezone, only
/// ever through [`crate::clock::local_instant`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    /// Unique identifier
    pub id: TaskId,

    /// Human-readable title
    pub title: String,

    #[serde(default)]
    pub description: String,

    /// Owning user, resolved through the user directory
    pub user: String,

    #[serde(default)]
    pub priority: TaskPriority,

    #[serde(default)]
    pub status: TaskStatus,

    /// Calendar day the task is due, in the owner's local calendar
    #[serde(default)]
    pub due_date: Option<NaiveDate>,

    /// Local time-of-day the task is due; absent = no intraday due time
    #[serde(default)]
    pub due_time: Option<NaiveTime>,

    /// Monotonic false -> true, flipped only by a successful reminder claim
    #[serde(default)]
    pub reminder_sent: bool,

    #[serde(default)]
    pub tags: Vec<String>,

    #[serde(default)]
    pub category: Option<String>,

    #[serde(default)]
    pub custom_fields: HashMap<String, serde_json::Value>,

    /// If true, `recurrence` is present and the generator spawns occurrences
    #[serde(default)]
    pub is_recurring: bool,

    #[serde(default)]
    pub recurrence: Option<RecurrencePattern>,

    /// Template this occurrence was generated from; None for hand-created tasks
    #[serde(default)]
    pub origin: Option<TaskId>,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,
}

impl Task {
    /// Create a new task with a generated ID
    pub fn new(title: impl Into<String>, user: impl Into<String>) -> Self {
        let title = title.into();
        let now = Utc::now();
        Self {
            id: TaskId::new(&title),
            title,
            description: String::new(),
            user: user.into(),
            priority: TaskPriority::default(),
            status: TaskStatus::default(),
            due_date: None,
            due_time: None,
            reminder_sent: false,
            tags: Vec::new(),
            category: None,
            custom_fields: HashMap::new(),
            is_recurring: false,
            recurrence: None,
            origin: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Set the due date
    pub fn with_due_date(mut self, date: NaiveDate) -> Self {
        self.due_date = Some(date);
        self
    }

    /// Set the intraday due time
    pub fn with_due_time(mut self, time: NaiveTime) -> Self {
        self.due_time = Some(time);
        self
    }

    /// Mark the task recurring with the given pattern
    pub fn with_recurrence(mut self, pattern: RecurrencePattern) -> Self {
        self.is_recurring = true;
        self.recurrence = Some(pattern);
        self
    }

    /// Set the priority
    pub fn with_priority(mut self, priority: TaskPriority) -> Self {
        self.priority = priority;
        self
    }

    /// Update the status
    pub fn set_status(&mut self, status: TaskStatus) {
        self.status = status;
        self.updated_at = Utc::now();
    }

    /// Spawn a fresh occurrence of this recurring task, due on `date`.
    ///
    /// The occurrence gets its own identity, starts at `todo` with
    /// `reminder_sent = false`, copies the template's descriptive fields and
    /// due time, and records the template as its origin. It does not inherit
    /// the recurrence pattern; the template stays the single source of
    /// future occurrences.
    pub fn occurrence_on(&self, date: NaiveDate) -> Task {
        let now = Utc::now();
        Task {
            id: TaskId::new(&self.title),
            title: self.title.clone(),
            description: self.description.clone(),
            user: self.user.clone(),
            priority: self.priority,
            status: TaskStatus::Todo,
            due_date: Some(date),
            due_time: self.due_time,
            reminder_sent: false,
            tags: self.tags.clone(),
            category: self.category.clone(),
            custom_fields: self.custom_fields.clone(),
            is_recurring: false,
            recurrence: None,
            origin: Some(self.id.clone()),
            created_at: now,
            updated_at: now,
        }
    }
}
