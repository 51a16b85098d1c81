//! StrikeWatch Deterministic Simulation Testing (DST) Harness
//!
//! Hosts a whole coordinator-plus-agents group inside one process:
//! - **Time**: virtual clock that only moves while the coordinator sleeps
//! - **Network**: in-process channels with crash and isolation faults
//! - **Randomness**: every location draw derived from one 64-bit seed
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                        SimWorld                          │
//! │  ┌────────────────────────────────────────────────────┐  │
//! │  │ tokio (paused clock) + SimContext (virtual time)    │  │
//! │  └────────────────────────────────────────────────────┘  │
//! │       │                                                  │
//! │  ┌────▼────────┐   SimNetwork    ┌──────────┐            │
//! │  │ Coordinator │◄──────────────►│ Agent #1 │ ...         │
//! │  │   rank 0    │                └──────────┘            │
//! │  └─────────────┘                                         │
//! │       ▲                                                  │
//! │  SimNetworkController (crash / isolate)                  │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! # Usage
//!
//! ```ignore
//! use strikewatch_sim::{ScenarioRunner, scenarios::ScenarioId};
//! use strikewatch_core::RunConfig;
//!
//! let runner = ScenarioRunner::new(42, RunConfig::default());
//! let result = runner.run(ScenarioId::Baseline);
//! assert!(result.passed);
//! ```

mod context;
mod world;
mod network;
mod runner;
mod exporter;
pub mod scenarios;

pub use context::SimContext;
pub use world::{AgentExit, SimWorld, WorldOutcome};
pub use network::{SimNetwork, SimNetworkController};
pub use runner::{check_invariants, ScenarioResult, ScenarioRunner};
pub use exporter::{text_report, RunExport};
