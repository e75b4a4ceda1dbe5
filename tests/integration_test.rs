//! Integration tests for TaskPulse
//!
//! These tests verify end-to-end behavior of the engine components against
//! the public API: generation idempotency per calendar day, retry-then-
//! exactly-once reminder delivery, and engine lifecycle.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveTime, TimeZone, Utc};

use taskpulse::clock::{Clock, FixedClock};
use taskpulse::directory::{StaticUserDirectory, UserDirectory};
use taskpulse::domain::{Frequency, RecurrencePattern, Task, TaskStatus, User};
use taskpulse::notify::{Notifier, NotifyError};
use taskpulse::occurrence::OccurrenceGenerator;
use taskpulse::reminder::ReminderDispatcher;
use taskpulse::scheduler::{CycleJob, Engine, TickConfig};
use taskpulse::store::{MemoryTaskStore, TaskStore};

// =============================================================================
// Test doubles
// =============================================================================

/// Notifier that counts deliveries and can be toggled to fail
#[derive(Default)]
struct CountingNotifier {
    sent: AtomicUsize,
    failing: AtomicBool,
}

#[async_trait]
impl Notifier for CountingNotifier {
    async fn send_reminder(&self, _user: &User, _task: &Task) -> Result<(), NotifyError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(NotifyError::Unavailable("transport down".into()));
        }
        self.sent.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

struct Harness {
    store: Arc<MemoryTaskStore>,
    clock: Arc<FixedClock>,
    notifier: Arc<CountingNotifier>,
    generator: OccurrenceGenerator,
    dispatcher: ReminderDispatcher,
}

/// Engine wiring around a shared in-memory store, with a fixed clock at
/// Sunday 2024-01-07 23:30 UTC
fn harness() -> Harness {
    let store = Arc::new(MemoryTaskStore::new());
    let clock = Arc::new(FixedClock::at(Utc.with_ymd_and_hms(2024, 1, 7, 23, 30, 0).unwrap()));
    let notifier = Arc::new(CountingNotifier::default());
    let users = Arc::new(StaticUserDirectory::new().with_user(
        User::new("u1", "amara", "amara@example.com").with_timezone(chrono_tz::UTC),
    ));

    let generator = OccurrenceGenerator::new(
        Arc::clone(&store) as Arc<dyn TaskStore>,
        Arc::clone(&users) as Arc<dyn UserDirectory>,
        Arc::clone(&clock) as Arc<dyn Clock>,
    );
    let dispatcher = ReminderDispatcher::new(
        Arc::clone(&store) as Arc<dyn TaskStore>,
        users,
        Arc::clone(&notifier) as Arc<dyn Notifier>,
        Arc::clone(&clock) as Arc<dyn Clock>,
        chrono::Duration::minutes(5),
    );

    Harness {
        store,
        clock,
        notifier,
        generator,
        dispatcher,
    }
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// Weekly template due Mondays at 09:00
fn weekly_monday_template() -> Task {
    Task::new("Weekly planning", "u1")
        .with_due_date(date(2024, 1, 1))
        .with_due_time(NaiveTime::from_hms_opt(9, 0, 0).unwrap())
        .with_recurrence(RecurrencePattern::every(Frequency::Weekly))
}

// =============================================================================
// Generation + dispatch end-to-end
// =============================================================================

#[tokio::test]
async fn test_weekly_occurrence_generated_once_per_day() {
    let hx = harness();
    hx.store.insert(weekly_monday_template()).await;

    // Sunday 23:30 UTC: Monday has not started for a UTC owner
    let outcome = hx.generator.run_cycle().await.unwrap();
    assert_eq!(outcome.spawned, 0);

    // Monday 00:05: the Sunday-night generation cycle spawns the occurrence
    hx.clock.set(Utc.with_ymd_and_hms(2024, 1, 8, 0, 5, 0).unwrap());
    let outcome = hx.generator.run_cycle().await.unwrap();
    assert_eq!(outcome.spawned, 1);

    // A second cycle the same day must not re-generate
    hx.clock.set(Utc.with_ymd_and_hms(2024, 1, 8, 12, 0, 0).unwrap());
    let outcome = hx.generator.run_cycle().await.unwrap();
    assert_eq!(outcome.spawned, 0);
    assert_eq!(hx.store.len().await, 2);
}

#[tokio::test]
async fn test_generated_occurrence_gets_reminded_exactly_once() {
    let hx = harness();
    hx.store.insert(weekly_monday_template()).await;

    // Generate Monday's occurrence
    hx.clock.set(Utc.with_ymd_and_hms(2024, 1, 8, 0, 5, 0).unwrap());
    hx.generator.run_cycle().await.unwrap();

    // 08:56: due instant 09:00 enters the 5-minute window
    hx.clock.set(Utc.with_ymd_and_hms(2024, 1, 8, 8, 56, 0).unwrap());
    let outcome = hx.dispatcher.run_cycle().await.unwrap();
    assert_eq!(outcome.sent, 1);
    assert_eq!(hx.notifier.sent.load(Ordering::SeqCst), 1);

    // Subsequent scans inside the window do not resend
    hx.clock.advance(chrono::Duration::minutes(1));
    let outcome = hx.dispatcher.run_cycle().await.unwrap();
    assert_eq!(outcome.sent, 0);
    assert_eq!(hx.notifier.sent.load(Ordering::SeqCst), 1);

    // The template itself was never reminded: only the occurrence carried
    // a matching due instant
    let recurring = hx.store.find_recurring_active().await.unwrap();
    assert!(!recurring[0].reminder_sent);
}

#[tokio::test]
async fn test_failed_delivery_retried_within_window_then_claimed() {
    let hx = harness();
    let task = Task::new("Call the bank", "u1")
        .with_due_date(date(2024, 1, 8))
        .with_due_time(NaiveTime::from_hms_opt(9, 0, 0).unwrap());
    hx.store.insert(task.clone()).await;

    // First scan: transport down, reminder stays unclaimed
    hx.clock.set(Utc.with_ymd_and_hms(2024, 1, 8, 8, 56, 0).unwrap());
    hx.notifier.failing.store(true, Ordering::SeqCst);
    let outcome = hx.dispatcher.run_cycle().await.unwrap();
    assert_eq!(outcome.failed, 1);
    assert!(!hx.store.get(&task.id).await.unwrap().reminder_sent);

    // Transport recovers one scan later, still inside the window
    hx.notifier.failing.store(false, Ordering::SeqCst);
    hx.clock.advance(chrono::Duration::minutes(1));
    let outcome = hx.dispatcher.run_cycle().await.unwrap();
    assert_eq!(outcome.sent, 1);
    assert_eq!(hx.notifier.sent.load(Ordering::SeqCst), 1);
    assert!(hx.store.get(&task.id).await.unwrap().reminder_sent);

    // And never again
    hx.clock.advance(chrono::Duration::minutes(1));
    let outcome = hx.dispatcher.run_cycle().await.unwrap();
    assert_eq!(outcome.scanned, 0);
    assert_eq!(hx.notifier.sent.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_window_elapsing_misses_reminder_permanently() {
    let hx = harness();
    let task = Task::new("Missed", "u1")
        .with_due_date(date(2024, 1, 8))
        .with_due_time(NaiveTime::from_hms_opt(9, 0, 0).unwrap());
    hx.store.insert(task.clone()).await;

    // Every scan inside the window fails
    hx.notifier.failing.store(true, Ordering::SeqCst);
    hx.clock.set(Utc.with_ymd_and_hms(2024, 1, 8, 8, 56, 0).unwrap());
    for _ in 0..6 {
        hx.dispatcher.run_cycle().await.unwrap();
        hx.clock.advance(chrono::Duration::minutes(1));
    }

    // Past the due instant: the task no longer matches, degraded but not fatal
    hx.notifier.failing.store(false, Ordering::SeqCst);
    let outcome = hx.dispatcher.run_cycle().await.unwrap();
    assert_eq!(outcome.matched, 0);
    assert_eq!(hx.notifier.sent.load(Ordering::SeqCst), 0);
    assert!(!hx.store.get(&task.id).await.unwrap().reminder_sent);
}

#[tokio::test]
async fn test_done_tasks_are_never_reminded() {
    let hx = harness();
    let mut task = Task::new("Already done", "u1")
        .with_due_date(date(2024, 1, 8))
        .with_due_time(NaiveTime::from_hms_opt(9, 0, 0).unwrap());
    task.set_status(TaskStatus::Done);
    hx.store.insert(task).await;

    hx.clock.set(Utc.with_ymd_and_hms(2024, 1, 8, 8, 56, 0).unwrap());
    let outcome = hx.dispatcher.run_cycle().await.unwrap();
    assert_eq!(outcome.scanned, 0);
    assert_eq!(hx.notifier.sent.load(Ordering::SeqCst), 0);
}

// =============================================================================
// Engine lifecycle
// =============================================================================

#[tokio::test(start_paused = true)]
async fn test_engine_drives_both_cycles() {
    let hx = harness();
    hx.store.insert(weekly_monday_template()).await;
    hx.clock.set(Utc.with_ymd_and_hms(2024, 1, 8, 8, 56, 0).unwrap());

    let config = TickConfig {
        generation_period_secs: 3_600,
        scan_period_secs: 60,
        lookahead_secs: 300,
    };
    let handle = Engine::new(
        config,
        Arc::new(hx.generator) as Arc<dyn CycleJob>,
        Arc::new(hx.dispatcher) as Arc<dyn CycleJob>,
    )
    .spawn()
    .unwrap();

    // Both timers fire immediately: generation spawns Monday's occurrence,
    // and a following scan delivers its reminder. Paused time only advances
    // past t=60 once that tick's spawned cycle has run to completion.
    tokio::time::sleep(Duration::from_secs(65)).await;

    let stats = handle.stats();
    assert!(stats.generation.completed >= 1);
    assert!(stats.scan.completed >= 2);
    assert_eq!(hx.store.len().await, 2);
    assert_eq!(hx.notifier.sent.load(Ordering::SeqCst), 1);

    handle.stop().await;
}

#[tokio::test(start_paused = true)]
async fn test_engine_stop_prevents_further_ticks() {
    let hx = harness();

    let config = TickConfig {
        generation_period_secs: 3_600,
        scan_period_secs: 60,
        lookahead_secs: 300,
    };
    let handle = Engine::new(
        config,
        Arc::new(hx.generator) as Arc<dyn CycleJob>,
        Arc::new(hx.dispatcher) as Arc<dyn CycleJob>,
    )
    .spawn()
    .unwrap();

    tokio::time::sleep(Duration::from_millis(100)).await;
    let fired_before = handle.stats().scan.fired;
    handle.stop().await;

    // No way to observe post-stop ticks through the handle (consumed), so
    // assert through the store side effects staying quiet: nothing was due,
    // so counters only prove the timers ran at all before stop
    assert!(fired_before >= 1);
}

#[test]
fn test_engine_rejects_uncovered_scan_window() {
    let rt = tokio::runtime::Builder::new_current_thread().enable_time().build().unwrap();
    let _guard = rt.enter();

    let hx = harness();
    let config = TickConfig {
        generation_period_secs: 3_600,
        scan_period_secs: 600,
        lookahead_secs: 300,
    };
    let engine = Engine::new(
        config,
        Arc::new(hx.generator) as Arc<dyn CycleJob>,
        Arc::new(hx.dispatcher) as Arc<dyn CycleJob>,
    );
    assert!(engine.spawn().is_err());
}
