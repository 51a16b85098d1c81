//! Run export and final text report.
//!
//! `RunExport` is the JSON form of a finished scenario; `text_report` renders
//! the human-readable block printed at the end of a run.

use crate::runner::ScenarioResult;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Write;
use std::path::Path;
use strikewatch_core::{RunConfig, RunSummary, StrikeEvent};

/// Complete simulation export.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunExport {
    /// Scenario name
    pub scenario: String,

    /// Seed used
    pub seed: u64,

    /// Configuration the run used
    pub config: RunConfig,

    /// Every strike event, in emission order
    pub events: Vec<StrikeEvent>,

    /// Final statistics
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<RunSummary>,

    /// Whether the scenario checks passed
    pub passed: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure_reason: Option<String>,
}

impl RunExport {
    /// Captures a scenario result.
    pub fn from_result(result: &ScenarioResult) -> Self {
        Self {
            scenario: result.scenario.name().to_string(),
            seed: result.seed,
            config: result.config.clone(),
            events: result.events.clone(),
            summary: result.summary.clone(),
            passed: result.passed,
            failure_reason: result.failure_reason.clone(),
        }
    }

    /// Writes to a JSON file.
    pub fn write_to_file(&self, path: impl AsRef<Path>) -> std::io::Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        let mut file = File::create(path)?;
        file.write_all(json.as_bytes())?;
        Ok(())
    }
}

/// Renders the end-of-run report.
pub fn text_report(summary: &RunSummary) -> String {
    let mut report = String::new();
    report.push_str(&"- ".repeat(48));
    report.push('\n');
    report.push_str(&format!(
        "{} strikes detected from {} samples.\n",
        summary.total_strikes, summary.total_samples
    ));
    report.push_str(&format!("Rate of strikes over samples is {:.6}.\n", summary.rate));
    report.push_str(&format!(
        "{} locations in {:.0}sec overall runtime and {:.3}sec sampling interval.\n",
        summary.max_locations, summary.run_duration_secs, summary.round_interval_secs
    ));
    if !summary.is_clean() {
        report.push_str(&format!(
            "{} incomplete rounds, {} dropped reports, {} discarded messages.\n",
            summary.incomplete_rounds, summary.dropped_reports, summary.discarded_messages
        ));
    }
    report
}
