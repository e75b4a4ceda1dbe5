//! TaskPulse - recurring-task occurrence generation and reminder dispatch
//!
//! CLI entry point. Wires the file-backed store, the log notifier and the
//! system clock into the engine, then either runs the timers in the
//! foreground or executes a single cycle for operators.

use std::sync::Arc;

use clap::Parser;
use eyre::{Context, Result};
use tracing::info;

use taskpulse::cli::{Cli, Command};
use taskpulse::clock::{Clock, SystemClock};
use taskpulse::config::Config;
use taskpulse::directory::UserDirectory;
use taskpulse::notify::{LogNotifier, Notifier};
use taskpulse::occurrence::OccurrenceGenerator;
use taskpulse::reminder::ReminderDispatcher;
use taskpulse::scheduler::{CycleJob, Engine};
use taskpulse::store::{JsonTaskStore, TaskStore};

fn setup_logging(verbose: bool) {
    let level = if verbose { tracing::Level::DEBUG } else { tracing::Level::INFO };

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()))
        .init();
}

/// Everything a cycle needs, assembled once from config
struct Runtime {
    generator: Arc<OccurrenceGenerator>,
    dispatcher: Arc<ReminderDispatcher>,
    store: Arc<JsonTaskStore>,
}

fn build_runtime(config: &Config) -> Result<Runtime> {
    let store = Arc::new(
        JsonTaskStore::open(&config.storage.tasks_file).context("Failed to open task store")?,
    );
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let notifier: Arc<dyn Notifier> = Arc::new(LogNotifier);

    let generator = Arc::new(OccurrenceGenerator::new(
        Arc::clone(&store) as Arc<dyn TaskStore>,
        Arc::clone(&store) as Arc<dyn UserDirectory>,
        Arc::clone(&clock),
    ));
    let dispatcher = Arc::new(ReminderDispatcher::new(
        Arc::clone(&store) as Arc<dyn TaskStore>,
        Arc::clone(&store) as Arc<dyn UserDirectory>,
        notifier,
        clock,
        config.scheduler.lookahead(),
    ));

    Ok(Runtime {
        generator,
        dispatcher,
        store,
    })
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose);

    let config = Config::load(cli.config.as_ref()).context("Failed to load configuration")?;
    config.validate().context("Invalid configuration")?;

    match cli.command {
        Some(Command::Generate) => cmd_generate(&config).await,
        Some(Command::Scan) => cmd_scan(&config).await,
        Some(Command::Check) => cmd_check(&config).await,
        Some(Command::Run) | None => cmd_run(&config).await,
    }
}

/// Run both timers in the foreground until SIGINT
async fn cmd_run(config: &Config) -> Result<()> {
    let runtime = build_runtime(config)?;

    let engine = Engine::new(
        config.scheduler.clone(),
        runtime.generator as Arc<dyn CycleJob>,
        runtime.dispatcher as Arc<dyn CycleJob>,
    );
    let handle = engine.spawn().context("Failed to start engine")?;

    tokio::signal::ctrl_c().await.context("Failed to listen for shutdown signal")?;
    info!("Interrupt received, shutting down");

    handle.stop().await;
    Ok(())
}

/// Run one occurrence-generation cycle
async fn cmd_generate(config: &Config) -> Result<()> {
    let runtime = build_runtime(config)?;
    let outcome = runtime.generator.run_cycle().await?;
    println!(
        "examined {} templates: {} spawned, {} exhausted, {} skipped, {} failed",
        outcome.examined, outcome.spawned, outcome.exhausted, outcome.skipped, outcome.failed
    );
    Ok(())
}

/// Run one reminder-scan cycle
async fn cmd_scan(config: &Config) -> Result<()> {
    let runtime = build_runtime(config)?;
    let outcome = runtime.dispatcher.run_cycle().await?;
    println!(
        "scanned {} candidates: {} matched, {} sent, {} skipped, {} failed",
        outcome.scanned, outcome.matched, outcome.sent, outcome.skipped, outcome.failed
    );
    Ok(())
}

/// Validate the configuration and the task store
async fn cmd_check(config: &Config) -> Result<()> {
    let runtime = build_runtime(config)?;
    let (users, tasks) = runtime.store.summary().await;
    println!(
        "config ok: scan every {}s, lookahead {}s, generation every {}s",
        config.scheduler.scan_period_secs, config.scheduler.lookahead_secs, config.scheduler.generation_period_secs
    );
    println!("store ok: {} users, {} tasks at {}", users, tasks, config.storage.tasks_file.display());
    Ok(())
}
