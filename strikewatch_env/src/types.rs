//! Wire message types shared by the coordinator and its agents.

use serde::{Deserialize, Serialize};

/// Rank of the coordinator process by convention.
pub const COORDINATOR_RANK: Rank = Rank(0);

/// Stable numeric identity of a process within the group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Rank(pub u32);

impl Rank {
    /// Returns the raw rank number.
    pub fn value(&self) -> u32 {
        self.0
    }

    /// Returns true for the coordinator rank.
    pub fn is_coordinator(&self) -> bool {
        *self == COORDINATOR_RANK
    }
}

impl std::fmt::Display for Rank {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "rank#{}", self.0)
    }
}

/// Round synchronization token broadcast by the coordinator.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RoundToken {
    /// Zero-based round index
    pub index: u64,

    /// Elapsed-time marker (seconds since the run started)
    pub elapsed_secs: f64,
}

/// Messages exchanged between ranks.
///
/// Compatibility is at the schema level; no byte layout is fixed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Message {
    /// Coordinator -> agents: a new round has started
    Round(RoundToken),

    /// Agent -> coordinator: the location drawn for `round_index`
    Report {
        round_index: u64,
        location_id: u32,
    },

    /// Coordinator -> agents: the run is complete, leave the loop
    Finish,
}

impl Message {
    /// Returns a short label for logging.
    pub fn kind(&self) -> &'static str {
        match self {
            Message::Round(_) => "round",
            Message::Report { .. } => "report",
            Message::Finish => "finish",
        }
    }
}
