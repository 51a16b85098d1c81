//! Run-lifetime counters owned by the coordinator.

use serde::{Deserialize, Serialize};

/// Cumulative counters for a whole run.
///
/// Created at run start, mutated only when a round completes, read at run
/// end. Agents never see it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunStatistics {
    total_samples: u64,
    total_strikes: u64,
    incomplete_rounds: u64,
    dropped_reports: u64,
    discarded_messages: u64,
}

impl RunStatistics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Folds a completed round in: one sample, plus its strikes.
    pub fn record_round(&mut self, strike_count: u64) {
        self.total_samples += 1;
        self.total_strikes += strike_count;
    }

    /// Counts a round that closed with missing reports.
    pub fn record_incomplete(&mut self) {
        self.incomplete_rounds += 1;
    }

    /// Counts reports rejected for an out-of-range location.
    pub fn record_dropped(&mut self, count: u64) {
        self.dropped_reports += count;
    }

    /// Counts stale, duplicate or unexpected messages.
    pub fn record_discarded(&mut self, count: u64) {
        self.discarded_messages += count;
    }

    pub fn total_samples(&self) -> u64 {
        self.total_samples
    }

    pub fn total_strikes(&self) -> u64 {
        self.total_strikes
    }

    pub fn incomplete_rounds(&self) -> u64 {
        self.incomplete_rounds
    }

    pub fn dropped_reports(&self) -> u64 {
        self.dropped_reports
    }

    pub fn discarded_messages(&self) -> u64 {
        self.discarded_messages
    }

    /// Strikes per sample, 0 before any sample.
    pub fn rate(&self) -> f64 {
        strike_rate(self.total_strikes, self.total_samples)
    }
}

/// `strikes / samples`, or 0 when there are no samples.
pub fn strike_rate(strikes: u64, samples: u64) -> f64 {
    if samples == 0 {
        return 0.0;
    }
    strikes as f64 / samples as f64
}

/// Final statistics handed to the reporting collaborator once per run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    pub total_strikes: u64,
    pub total_samples: u64,
    pub rate: f64,
    pub incomplete_rounds: u64,
    pub dropped_reports: u64,
    pub discarded_messages: u64,
    pub max_locations: u32,
    pub run_duration_secs: f64,
    pub round_interval_secs: f64,
    pub elapsed_secs: f64,
}

impl RunSummary {
    /// True when the run finished without any warnings.
    pub fn is_clean(&self) -> bool {
        self.incomplete_rounds == 0 && self.dropped_reports == 0 && self.discarded_messages == 0
    }
}
