//! Error taxonomy for the strike detection protocol.

use strikewatch_env::{EnvError, Rank};
use thiserror::Error;

/// Errors raised by the protocol core.
///
/// Only `Configuration` is fatal to a run; the coordinator recovers from the
/// rest locally and surfaces them as warnings.
#[derive(Debug, Error)]
pub enum StrikeError {
    /// Invalid group size or timing parameters. Nothing runs.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// A send or receive channel broke under an agent or the coordinator.
    #[error("Communication error: {0}")]
    Communication(#[from] EnvError),

    /// A report named a location outside `[0, max_locations)`.
    #[error("Location {location_id} out of range (max {max_locations})")]
    LocationOutOfRange {
        location_id: u32,
        max_locations: u32,
    },

    /// A process was started in the wrong role for its rank.
    #[error("{rank} cannot act as {expected}")]
    RoleMismatch {
        rank: Rank,
        expected: &'static str,
    },
}

impl StrikeError {
    /// Creates a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    /// Returns true if this error must abort the run at startup.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Configuration(_) | Self::RoleMismatch { .. })
    }
}
