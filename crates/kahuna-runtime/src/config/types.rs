//! Driver configuration schema.
//!
//! Every field has a default tuned for the Big Kahuna instrument as
//! deployed; a config file or environment override adjusts individual
//! knobs without restating the rest.

use crate::config::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Minimum permitted polling interval. The vendor services choke on
/// tighter loops.
pub const MIN_POLL_INTERVAL_MS: u64 = 50;

/// Top-level driver configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct KahunaConfig {
    /// Fixed cadence of the status polling loop, in milliseconds.
    pub poll_interval_ms: u64,
    /// Per-attempt discovery timeout for a warm server, in seconds.
    pub discovery_timeout_s: u64,
    /// Per-attempt discovery timeout right after a cold start, in
    /// seconds. The vendor application takes most of a minute to
    /// register its services.
    pub startup_timeout_s: u64,
    /// Settle delay after a cold start is acknowledged, in seconds.
    pub startup_settle_s: u64,
    /// Settle delay after the shutdown sequence, in seconds.
    pub shutdown_settle_s: u64,
    /// Settle delay after observing an abort, in seconds.
    pub abort_settle_s: u64,
    /// How long a submitted run may stay in `Stopped` before the start
    /// is declared timed out, in seconds.
    pub submit_timeout_s: u64,
    /// Bounded discovery retry attempts per server.
    pub max_discovery_attempts: u32,
    /// Consecutive problem pauses tolerated before the acknowledgment
    /// escalates from repeat to abort.
    pub problem_threshold: u32,
    /// Observation log settings.
    pub record: RecordConfig,
}

/// Observation log settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RecordConfig {
    /// Whether non-nominal observations are written to a log file.
    pub enabled: bool,
    /// Directory for log files. When unset, the run's prompts file
    /// directory is used.
    pub dir: Option<PathBuf>,
}

impl Default for KahunaConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: 1_000,
            discovery_timeout_s: 5,
            startup_timeout_s: 60,
            startup_settle_s: 20,
            shutdown_settle_s: 5,
            abort_settle_s: 30,
            submit_timeout_s: 120,
            max_discovery_attempts: 5,
            problem_threshold: 5,
            record: RecordConfig::default(),
        }
    }
}

impl KahunaConfig {
    /// Validates documented bounds.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] when a field is out of
    /// range.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.poll_interval_ms < MIN_POLL_INTERVAL_MS {
            return Err(ConfigError::InvalidValue {
                field: "poll_interval_ms",
                message: format!(
                    "{} is below the minimum of {MIN_POLL_INTERVAL_MS}",
                    self.poll_interval_ms
                ),
            });
        }
        if self.max_discovery_attempts == 0 {
            return Err(ConfigError::InvalidValue {
                field: "max_discovery_attempts",
                message: "must be at least 1".into(),
            });
        }
        Ok(())
    }

    /// The polling cadence as a [`Duration`].
    #[must_use]
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// Warm discovery timeout.
    #[must_use]
    pub fn discovery_timeout(&self) -> Duration {
        Duration::from_secs(self.discovery_timeout_s)
    }

    /// Cold-start discovery timeout.
    #[must_use]
    pub fn startup_timeout(&self) -> Duration {
        Duration::from_secs(self.startup_timeout_s)
    }

    /// Cold-start settle delay.
    #[must_use]
    pub fn startup_settle(&self) -> Duration {
        Duration::from_secs(self.startup_settle_s)
    }

    /// Post-shutdown settle delay.
    #[must_use]
    pub fn shutdown_settle(&self) -> Duration {
        Duration::from_secs(self.shutdown_settle_s)
    }

    /// Post-abort settle delay.
    #[must_use]
    pub fn abort_settle(&self) -> Duration {
        Duration::from_secs(self.abort_settle_s)
    }

    /// Run-start timeout.
    #[must_use]
    pub fn submit_timeout(&self) -> Duration {
        Duration::from_secs(self.submit_timeout_s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = KahunaConfig::default();
        config.validate().unwrap();
        assert_eq!(config.poll_interval(), Duration::from_secs(1));
        assert_eq!(config.startup_timeout(), Duration::from_secs(60));
        assert_eq!(config.abort_settle(), Duration::from_secs(30));
        assert!(!config.record.enabled);
    }

    #[test]
    fn rejects_tight_poll_interval() {
        let config = KahunaConfig {
            poll_interval_ms: 10,
            ..KahunaConfig::default()
        };
        let err = config.validate().unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidValue {
                field: "poll_interval_ms",
                ..
            }
        ));
    }

    #[test]
    fn rejects_zero_discovery_attempts() {
        let config = KahunaConfig {
            max_discovery_attempts: 0,
            ..KahunaConfig::default()
        };
        assert!(config.validate().is_err());
    }
}
