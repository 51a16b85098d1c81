//! Run configuration and startup validation.

use crate::error::StrikeError;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Parameters for one run, fixed before the first round.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunConfig {
    /// Number of processes including the coordinator
    pub group_size: u32,

    /// Number of distinct locations (`MAX_LOCATIONS`)
    pub max_locations: u32,

    /// Total run duration (`RUN_DURATION_SECONDS`)
    pub run_duration: Duration,

    /// Sampling interval per round (`ROUND_INTERVAL_SECONDS`)
    pub round_interval: Duration,

    /// Longest the coordinator waits for a round's reports
    pub round_timeout: Duration,

    /// Master seed for location draws
    pub seed: u64,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            group_size: 4,
            max_locations: 1000,
            run_duration: Duration::from_secs(60),
            round_interval: Duration::from_millis(10),
            round_timeout: Duration::from_secs(1),
            seed: 42,
        }
    }
}

impl RunConfig {
    /// Sets the group size.
    pub fn with_group_size(mut self, group_size: u32) -> Self {
        self.group_size = group_size;
        self
    }

    /// Sets the number of locations.
    pub fn with_max_locations(mut self, max_locations: u32) -> Self {
        self.max_locations = max_locations;
        self
    }

    /// Sets the run duration.
    pub fn with_run_duration(mut self, duration: Duration) -> Self {
        self.run_duration = duration;
        self
    }

    /// Sets the round interval.
    pub fn with_round_interval(mut self, interval: Duration) -> Self {
        self.round_interval = interval;
        self
    }

    /// Sets the round timeout.
    pub fn with_round_timeout(mut self, timeout: Duration) -> Self {
        self.round_timeout = timeout;
        self
    }

    /// Sets the seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Number of reporting agents (ranks 1..group_size).
    pub fn agent_count(&self) -> u32 {
        self.group_size.saturating_sub(1)
    }

    /// Checks the configuration before anything starts.
    pub fn validate(&self) -> Result<(), StrikeError> {
        if self.group_size < 2 {
            return Err(StrikeError::config(format!(
                "group size {} leaves no agents (need at least 2)",
                self.group_size
            )));
        }
        if self.max_locations == 0 {
            return Err(StrikeError::config("max_locations must be positive"));
        }
        if self.run_duration.is_zero() {
            return Err(StrikeError::config("run duration must be positive"));
        }
        if self.round_interval.is_zero() {
            return Err(StrikeError::config("round interval must be positive"));
        }
        if self.round_interval > self.run_duration {
            return Err(StrikeError::config(format!(
                "round interval {:.3}s exceeds run duration {:.3}s",
                self.round_interval.as_secs_f64(),
                self.run_duration.as_secs_f64()
            )));
        }
        if self.round_timeout.is_zero() {
            return Err(StrikeError::config("round timeout must be positive"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = RunConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.agent_count(), 3);
    }

    #[test]
    fn test_rejects_group_without_agents() {
        let config = RunConfig::default().with_group_size(1);
        assert!(matches!(config.validate(), Err(StrikeError::Configuration(_))));

        let config = RunConfig::default().with_group_size(0);
        assert!(config.validate().is_err());
        assert_eq!(config.agent_count(), 0);
    }

    #[test]
    fn test_rejects_interval_longer_than_run() {
        let config = RunConfig::default()
            .with_run_duration(Duration::from_secs(1))
            .with_round_interval(Duration::from_secs(2));
        let err = config.validate().unwrap_err();
        assert!(err.is_fatal());
        assert!(err.to_string().contains("exceeds run duration"));
    }

    #[test]
    fn test_interval_equal_to_run_is_allowed() {
        let config = RunConfig::default()
            .with_run_duration(Duration::from_secs(1))
            .with_round_interval(Duration::from_secs(1));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_rejects_zero_values() {
        assert!(RunConfig::default().with_max_locations(0).validate().is_err());
        assert!(RunConfig::default().with_round_interval(Duration::ZERO).validate().is_err());
        assert!(RunConfig::default().with_round_timeout(Duration::ZERO).validate().is_err());
    }
}
