//! Strike event and final statistics sinks.

use crate::coordinator::RoundOutcome;
use crate::stats::RunSummary;
use serde::{Deserialize, Serialize};
use tracing::info;

/// Emitted once per striking location per round.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrikeEvent {
    pub location_id: u32,
    pub odd_count: u32,
    pub even_count: u32,
    pub round_index: u64,
    pub cumulative_samples: u64,

    /// Elapsed-time marker of the round (seconds since run start)
    pub instant_secs: f64,
}

/// Receives the coordinator's output.
pub trait ReportSink: Send {
    /// Called for every strike, in location order within a round.
    fn strike(&mut self, event: &StrikeEvent);

    /// Called after every round, once its strikes have been emitted.
    fn round_complete(&mut self, _outcome: &RoundOutcome) {}

    /// Called exactly once, after the last round.
    fn run_complete(&mut self, _summary: &RunSummary) {}
}

/// Logs strikes through `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl ReportSink for TracingSink {
    fn strike(&mut self, event: &StrikeEvent) {
        info!(
            "Strike! Location #{:03}: {} odd & {} even reporters at {:.6}s of sample #{:03}",
            event.location_id,
            event.odd_count,
            event.even_count,
            event.instant_secs,
            event.cumulative_samples
        );
    }

    fn run_complete(&mut self, summary: &RunSummary) {
        info!(
            strikes = summary.total_strikes,
            samples = summary.total_samples,
            rate = summary.rate,
            "Run complete"
        );
    }
}

/// Keeps every event, round outcome and the summary in memory.
#[derive(Debug, Clone, Default)]
pub struct RecordingSink {
    pub events: Vec<StrikeEvent>,
    pub rounds: Vec<RoundOutcome>,
    pub summary: Option<RunSummary>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ReportSink for RecordingSink {
    fn strike(&mut self, event: &StrikeEvent) {
        self.events.push(event.clone());
    }

    fn round_complete(&mut self, outcome: &RoundOutcome) {
        self.rounds.push(outcome.clone());
    }

    fn run_complete(&mut self, summary: &RunSummary) {
        self.summary = Some(summary.clone());
    }
}

/// Fans out to two sinks.
impl<A: ReportSink, B: ReportSink> ReportSink for (A, B) {
    fn strike(&mut self, event: &StrikeEvent) {
        self.0.strike(event);
        self.1.strike(event);
    }

    fn round_complete(&mut self, outcome: &RoundOutcome) {
        self.0.round_complete(outcome);
        self.1.round_complete(outcome);
    }

    fn run_complete(&mut self, summary: &RunSummary) {
        self.0.run_complete(summary);
        self.1.run_complete(summary);
    }
}
