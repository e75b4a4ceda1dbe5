//! Command-line interface definitions

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// TaskPulse - recurring-task occurrence generation and reminder dispatch
#[derive(Debug, Parser)]
#[command(name = "tp", version, about)]
pub struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to a config file (default: .taskpulse.yml, then user config dir)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run the engine in the foreground until interrupted
    Run,

    /// Run one occurrence-generation cycle and exit
    Generate,

    /// Run one reminder-scan cycle and exit
    Scan,

    /// Validate the configuration and the task store, then exit
    Check,
}
