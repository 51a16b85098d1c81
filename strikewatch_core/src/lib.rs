//! StrikeWatch Core - round-synchronized strike detection
//!
//! A fixed group of processes samples shared discrete locations in
//! time-boxed rounds. Rank 0 coordinates; every other rank is a reporting
//! agent that draws one location per round. The coordinator counts reports
//! per location, split by the reporter's parity class, and declares a strike
//! wherever a round gathers at least one odd-class and two even-class
//! reports.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │ RoundCoordinator (rank 0)                                    │
//! │   TimeDriver(run) ─► round ─► TimeDriver(interval pacing)    │
//! │        │                                                     │
//! │        ├── broadcast Round(token) ───────────► agents        │
//! │        ├── collect Reports (≤ round_timeout) ◄── agents      │
//! │        ├── LocationLedger (reset every round)                │
//! │        ├── StrikeDetector ─► ReportSink (strike events)      │
//! │        └── RunStatistics (run lifetime)                      │
//! └──────────────────────────────────────────────────────────────┘
//!
//!   ReportingAgent (rank k ≥ 1): recv token ─► LocationSource ─► send Report
//! ```

pub mod agent;
pub mod config;
pub mod coordinator;
pub mod detector;
pub mod error;
pub mod identity;
pub mod ledger;
pub mod location_source;
pub mod sink;
pub mod stats;
pub mod time_driver;

#[cfg(test)]
mod test_support;

// Re-export key types for convenience
pub use agent::{AgentSummary, ReportingAgent};
pub use config::RunConfig;
pub use coordinator::{IncompleteRound, Round, RoundCoordinator, RoundOutcome, RoundPhase};
pub use detector::{StrikeDetector, StrikeEvaluation, StrikeThreshold};
pub use error::StrikeError;
pub use identity::{ParityClass, ProcessIdentity, RankParity, ReporterClassifier};
pub use ledger::{LocationBucket, LocationLedger, Report};
pub use location_source::{LocationSource, RandomLocationSource, ScriptedLocationSource};
pub use sink::{RecordingSink, ReportSink, StrikeEvent, TracingSink};
pub use stats::{strike_rate, RunStatistics, RunSummary};
pub use time_driver::TimeDriver;
