//! Engine implementation
//!
//! Two independent periodic timers (occurrence generation, reminder scan),
//! each with single-flight semantics: a tick that fires while the previous
//! cycle of the same kind is still running is skipped and counted, never
//! queued. Cycles run as spawned tasks holding the flight guard, so a slow
//! store call never blocks the timer itself or the other timer kind.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use eyre::Result;
use tokio::sync::{Mutex, watch};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use crate::occurrence::OccurrenceGenerator;
use crate::reminder::ReminderDispatcher;

use super::config::TickConfig;

/// A periodic job driven by the engine
#[async_trait]
pub trait CycleJob: Send + Sync + 'static {
    /// Job name for logs and stats
    fn name(&self) -> &'static str;

    /// Run one cycle. Errors are recoverable: logged, counted, retried on
    /// the next tick.
    async fn run(&self) -> Result<()>;
}

#[async_trait]
impl CycleJob for OccurrenceGenerator {
    fn name(&self) -> &'static str {
        "occurrence-generation"
    }

    async fn run(&self) -> Result<()> {
        self.run_cycle().await.map(|_| ())
    }
}

#[async_trait]
impl CycleJob for ReminderDispatcher {
    fn name(&self) -> &'static str {
        "reminder-scan"
    }

    async fn run(&self) -> Result<()> {
        self.run_cycle().await.map(|_| ())
    }
}

/// Per-kind tick counters, shared between the timer task and its cycles
#[derive(Debug, Default)]
struct TickCounters {
    fired: AtomicU64,
    completed: AtomicU64,
    skipped: AtomicU64,
    failed: AtomicU64,
}

impl TickCounters {
    fn snapshot(&self) -> TickStats {
        TickStats {
            fired: self.fired.load(Ordering::SeqCst),
            completed: self.completed.load(Ordering::SeqCst),
            skipped: self.skipped.load(Ordering::SeqCst),
            failed: self.failed.load(Ordering::SeqCst),
        }
    }
}

/// Snapshot of one tick kind's counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickStats {
    /// Ticks the timer fired
    pub fired: u64,
    /// Cycles that ran to successful completion
    pub completed: u64,
    /// Ticks skipped because the previous cycle was still running
    pub skipped: u64,
    /// Cycles that ended in a (recoverable) error
    pub failed: u64,
}

/// Snapshot of both tick kinds
#[derive(Debug, Clone, Copy, Default)]
pub struct EngineStats {
    pub generation: TickStats,
    pub scan: TickStats,
}

/// The engine owns the two periodic jobs and their timing
pub struct Engine {
    config: TickConfig,
    generation: Arc<dyn CycleJob>,
    scan: Arc<dyn CycleJob>,
}

impl Engine {
    /// Create an engine from its two jobs
    pub fn new(config: TickConfig, generation: Arc<dyn CycleJob>, scan: Arc<dyn CycleJob>) -> Self {
        Self {
            config,
            generation,
            scan,
        }
    }

    /// Validate the configuration and start both timers.
    ///
    /// An invalid tick configuration is fatal here, before anything runs.
    /// Both timers fire immediately on spawn; same-day generation
    /// idempotency and the conditional reminder claim make the extra
    /// startup cycle harmless.
    pub fn spawn(self) -> Result<EngineHandle> {
        self.config.validate()?;

        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let generation_flight = Arc::new(Mutex::new(()));
        let scan_flight = Arc::new(Mutex::new(()));
        let generation_counters = Arc::new(TickCounters::default());
        let scan_counters = Arc::new(TickCounters::default());

        let timers = vec![
            tokio::spawn(run_timer(
                self.generation,
                self.config.generation_period(),
                Arc::clone(&generation_flight),
                Arc::clone(&generation_counters),
                shutdown_rx.clone(),
            )),
            tokio::spawn(run_timer(
                self.scan,
                self.config.scan_period(),
                Arc::clone(&scan_flight),
                Arc::clone(&scan_counters),
                shutdown_rx,
            )),
        ];

        info!(
            generation_period_secs = self.config.generation_period_secs,
            scan_period_secs = self.config.scan_period_secs,
            lookahead_secs = self.config.lookahead_secs,
            "Engine started"
        );

        Ok(EngineHandle {
            shutdown_tx,
            timers,
            flights: vec![generation_flight, scan_flight],
            generation_counters,
            scan_counters,
        })
    }
}

/// One timer kind: tick, try the flight guard, spawn the cycle or skip.
async fn run_timer(
    job: Arc<dyn CycleJob>,
    period: Duration,
    flight: Arc<Mutex<()>>,
    counters: Arc<TickCounters>,
    mut shutdown_rx: watch::Receiver<bool>,
) {
    let name = job.name();
    let mut interval = tokio::time::interval(period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            _ = shutdown_rx.changed() => {
                debug!(job = name, "Shutdown signal received, timer stopping");
                break;
            }
            _ = interval.tick() => {
                counters.fired.fetch_add(1, Ordering::SeqCst);
                match Arc::clone(&flight).try_lock_owned() {
                    Ok(guard) => {
                        let job = Arc::clone(&job);
                        let counters = Arc::clone(&counters);
                        tokio::spawn(async move {
                            let _guard = guard;
                            debug!(job = name, "Cycle starting");
                            match job.run().await {
                                Ok(()) => {
                                    counters.completed.fetch_add(1, Ordering::SeqCst);
                                }
                                Err(e) => {
                                    warn!(job = name, error = %e, "Cycle failed, will retry on next tick");
                                    counters.failed.fetch_add(1, Ordering::SeqCst);
                                }
                            }
                        });
                    }
                    Err(_) => {
                        warn!(job = name, "Previous cycle still running, skipping this tick");
                        counters.skipped.fetch_add(1, Ordering::SeqCst);
                    }
                }
            }
        }
    }
}

/// Handle to a running engine
pub struct EngineHandle {
    shutdown_tx: watch::Sender<bool>,
    timers: Vec<JoinHandle<()>>,
    flights: Vec<Arc<Mutex<()>>>,
    generation_counters: Arc<TickCounters>,
    scan_counters: Arc<TickCounters>,
}

impl EngineHandle {
    /// Stop the engine: no further ticks fire, and any in-flight cycle runs
    /// to completion before this returns.
    pub async fn stop(self) {
        let _ = self.shutdown_tx.send(true);
        for timer in self.timers {
            let _ = timer.await;
        }
        // Locking each flight guard waits out the cycles spawned before the
        // shutdown signal landed.
        for flight in &self.flights {
            let _ = flight.lock().await;
        }
        info!("Engine stopped");
    }

    /// Current counters for both tick kinds
    pub fn stats(&self) -> EngineStats {
        EngineStats {
            generation: self.generation_counters.snapshot(),
            scan: self.scan_counters.snapshot(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Job that counts runs and can simulate slow cycles or failures
    struct TestJob {
        runs: AtomicU64,
        busy_for: Duration,
        fail: bool,
    }

    impl TestJob {
        fn instant() -> Arc<Self> {
            Arc::new(Self {
                runs: AtomicU64::new(0),
                busy_for: Duration::ZERO,
                fail: false,
            })
        }

        fn slow(busy_for: Duration) -> Arc<Self> {
            Arc::new(Self {
                runs: AtomicU64::new(0),
                busy_for,
                fail: false,
            })
        }

        fn failing() -> Arc<Self> {
            Arc::new(Self {
                runs: AtomicU64::new(0),
                busy_for: Duration::ZERO,
                fail: true,
            })
        }

        fn runs(&self) -> u64 {
            self.runs.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl CycleJob for TestJob {
        fn name(&self) -> &'static str {
            "test-job"
        }

        async fn run(&self) -> Result<()> {
            self.runs.fetch_add(1, Ordering::SeqCst);
            if !self.busy_for.is_zero() {
                tokio::time::sleep(self.busy_for).await;
            }
            if self.fail {
                return Err(eyre::eyre!("simulated failure"));
            }
            Ok(())
        }
    }

    fn config(generation_secs: u64, scan_secs: u64) -> TickConfig {
        TickConfig {
            generation_period_secs: generation_secs,
            scan_period_secs: scan_secs,
            lookahead_secs: scan_secs.max(300),
        }
    }

    #[test]
    fn test_spawn_rejects_invalid_config() {
        let rt = tokio::runtime::Builder::new_current_thread().enable_time().build().unwrap();
        let _guard = rt.enter();

        let bad = TickConfig {
            scan_period_secs: 600,
            lookahead_secs: 60,
            ..Default::default()
        };
        let engine = Engine::new(bad, TestJob::instant(), TestJob::instant());
        assert!(engine.spawn().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_both_timers_tick_independently() {
        let generation = TestJob::instant();
        let scan = TestJob::instant();
        let handle = Engine::new(config(10, 1), Arc::clone(&generation) as Arc<dyn CycleJob>, Arc::clone(&scan) as Arc<dyn CycleJob>)
            .spawn()
            .unwrap();

        // First ticks fire immediately, then the scan ticks every second
        tokio::time::sleep(Duration::from_millis(3_500)).await;

        assert!(scan.runs() >= 3, "scan ran {} times", scan.runs());
        assert_eq!(generation.runs(), 1);

        handle.stop().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_single_flight_skips_while_cycle_runs() {
        // Cycle takes 2.5 periods: ticks fired mid-cycle must be skipped
        let scan = TestJob::slow(Duration::from_millis(2_500));
        let handle = Engine::new(
            config(3_600, 1),
            TestJob::instant(),
            Arc::clone(&scan) as Arc<dyn CycleJob>,
        )
        .spawn()
        .unwrap();

        tokio::time::sleep(Duration::from_millis(5_200)).await;
        let stats = handle.stats().scan;

        assert!(stats.skipped >= 1, "expected skipped ticks, got {stats:?}");
        assert!(
            stats.completed + stats.skipped <= stats.fired,
            "counters inconsistent: {stats:?}"
        );
        // Never more than one cycle in flight: completions lag the clock
        assert!(scan.runs() <= 3, "scan overlapped: {} runs", scan.runs());

        handle.stop().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_failures_are_recoverable() {
        let scan = TestJob::failing();
        let handle = Engine::new(
            config(3_600, 1),
            TestJob::instant(),
            Arc::clone(&scan) as Arc<dyn CycleJob>,
        )
        .spawn()
        .unwrap();

        tokio::time::sleep(Duration::from_millis(2_500)).await;
        let stats = handle.stats().scan;

        // Failing cycles keep being retried on every tick
        assert!(stats.failed >= 2, "expected repeated failures, got {stats:?}");

        handle.stop().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_drains_in_flight_cycle() {
        let scan = TestJob::slow(Duration::from_millis(500));
        let handle = Engine::new(
            config(3_600, 60),
            TestJob::instant(),
            Arc::clone(&scan) as Arc<dyn CycleJob>,
        )
        .spawn()
        .unwrap();

        // Let the immediate first tick start its cycle, then stop mid-cycle
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert_eq!(scan.runs(), 1);
        handle.stop().await;

        // stop() returned only after the in-flight cycle finished; no new
        // ticks fire afterwards
        tokio::time::sleep(Duration::from_millis(5_000)).await;
        assert_eq!(scan.runs(), 1);
    }
}
