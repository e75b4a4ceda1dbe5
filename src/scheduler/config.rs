//! Engine tick configuration

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Timing for the two periodic jobs
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TickConfig {
    /// Occurrence-generation period in seconds (nominally daily)
    #[serde(rename = "generation-period-secs", default = "default_generation_period_secs")]
    pub generation_period_secs: u64,

    /// Reminder-scan period in seconds
    #[serde(rename = "scan-period-secs", default = "default_scan_period_secs")]
    pub scan_period_secs: u64,

    /// Lookahead window in seconds; must be >= the scan period so no task's
    /// due instant can slip between two consecutive scans
    #[serde(rename = "lookahead-secs", default = "default_lookahead_secs")]
    pub lookahead_secs: u64,
}

fn default_generation_period_secs() -> u64 {
    86_400
}

fn default_scan_period_secs() -> u64 {
    60
}

fn default_lookahead_secs() -> u64 {
    300
}

impl Default for TickConfig {
    fn default() -> Self {
        Self {
            generation_period_secs: 86_400,
            scan_period_secs: 60,
            lookahead_secs: 300,
        }
    }
}

impl TickConfig {
    /// Check the timing invariants. Violations are fatal at startup.
    pub fn validate(&self) -> eyre::Result<()> {
        if self.generation_period_secs == 0 {
            return Err(eyre::eyre!("generation-period-secs must be positive"));
        }
        if self.scan_period_secs == 0 {
            return Err(eyre::eyre!("scan-period-secs must be positive"));
        }
        if self.lookahead_secs < self.scan_period_secs {
            return Err(eyre::eyre!(
                "lookahead-secs ({}) must be >= scan-period-secs ({}) or reminders can be skipped between scans",
                self.lookahead_secs,
                self.scan_period_secs
            ));
        }
        Ok(())
    }

    /// Generation period as a Duration
    pub fn generation_period(&self) -> Duration {
        Duration::from_secs(self.generation_period_secs)
    }

    /// Scan period as a Duration
    pub fn scan_period(&self) -> Duration {
        Duration::from_secs(self.scan_period_secs)
    }

    /// Lookahead window as a chrono Duration for instant arithmetic
    pub fn lookahead(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.lookahead_secs as i64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = TickConfig::default();
        assert_eq!(config.generation_period_secs, 86_400);
        assert_eq!(config.scan_period_secs, 60);
        assert_eq!(config.lookahead_secs, 300);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_lookahead_must_cover_scan_period() {
        let config = TickConfig {
            scan_period_secs: 600,
            lookahead_secs: 300,
            ..Default::default()
        };
        assert!(config.validate().is_err());

        // Equal is allowed
        let config = TickConfig {
            scan_period_secs: 300,
            lookahead_secs: 300,
            ..Default::default()
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_zero_periods_rejected() {
        let config = TickConfig {
            scan_period_secs: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = TickConfig {
            generation_period_secs: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_duration_accessors() {
        let config = TickConfig {
            generation_period_secs: 120,
            scan_period_secs: 30,
            lookahead_secs: 90,
        };
        assert_eq!(config.generation_period(), Duration::from_secs(120));
        assert_eq!(config.scan_period(), Duration::from_secs(30));
        assert_eq!(config.lookahead(), chrono::Duration::seconds(90));
    }

    #[test]
    fn test_kebab_case_deserialize() {
        let yaml = "scan-period-secs: 30\nlookahead-secs: 120\n";
        let config: TickConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.scan_period_secs, 30);
        assert_eq!(config.lookahead_secs, 120);
        // Unspecified field falls back to default
        assert_eq!(config.generation_period_secs, 86_400);
    }
}
