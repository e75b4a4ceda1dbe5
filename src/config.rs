//! TaskPulse configuration types and loading

use eyre::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::scheduler::TickConfig;

/// Main TaskPulse configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Tick timing for the two periodic jobs
    pub scheduler: TickConfig,

    /// Storage configuration
    pub storage: StorageConfig,
}

impl Config {
    /// Validate configuration before use
    ///
    /// Call this early in startup to fail fast; a broken tick configuration
    /// must abort process initialization, not surface mid-run.
    pub fn validate(&self) -> Result<()> {
        self.scheduler.validate()
    }

    /// Load configuration with fallback chain
    pub fn load(config_path: Option<&PathBuf>) -> Result<Self> {
        // If explicit config path provided, try to load it
        if let Some(path) = config_path {
            return Self::load_from_file(path).context(format!("Failed to load config from {}", path.display()));
        }

        // Try project-local config: .taskpulse.yml
        let local_config = PathBuf::from(".taskpulse.yml");
        if local_config.exists() {
            match Self::load_from_file(&local_config) {
                Ok(config) => return Ok(config),
                Err(e) => {
                    tracing::warn!("Failed to load config from {}: {}", local_config.display(), e);
                }
            }
        }

        // Try user config: ~/.config/taskpulse/taskpulse.yml
        if let Some(config_dir) = dirs::config_dir() {
            let user_config = config_dir.join("taskpulse").join("taskpulse.yml");
            if user_config.exists() {
                match Self::load_from_file(&user_config) {
                    Ok(config) => return Ok(config),
                    Err(e) => {
                        tracing::warn!("Failed to load config from {}: {}", user_config.display(), e);
                    }
                }
            }
        }

        // No config file found, use defaults
        tracing::info!("No config file found, using defaults");
        Ok(Self::default())
    }

    fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path).context("Failed to read config file")?;

        let config: Self = serde_yaml::from_str(&content).context("Failed to parse config file")?;

        tracing::info!("Loaded config from: {}", path.as_ref().display());
        Ok(config)
    }
}

/// Storage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Path of the JSON task document
    #[serde(rename = "tasks-file")]
    pub tasks_file: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        // Use the platform data directory (~/.local/share/taskpulse on Linux)
        let tasks_file = dirs::data_dir()
            .map(|d| d.join("taskpulse"))
            .unwrap_or_else(|| PathBuf::from(".taskpulse"))
            .join("tasks.json");

        Self { tasks_file }
    }
}
