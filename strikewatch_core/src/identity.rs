//! Process identity and reporter classification.

use serde::{Deserialize, Serialize};
use strikewatch_env::{Rank, COORDINATOR_RANK};

/// Identity of one process in the group, supplied by the hosting runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessIdentity {
    pub rank: Rank,
    pub is_coordinator: bool,
}

impl ProcessIdentity {
    /// The coordinator identity (rank 0).
    pub fn coordinator() -> Self {
        Self {
            rank: COORDINATOR_RANK,
            is_coordinator: true,
        }
    }

    /// A reporting agent identity.
    pub fn agent(rank: u32) -> Self {
        Self {
            rank: Rank(rank),
            is_coordinator: false,
        }
    }

    /// Assigns the role by convention: rank 0 coordinates, everyone else reports.
    pub fn for_rank(rank: u32) -> Self {
        if Rank(rank).is_coordinator() {
            Self::coordinator()
        } else {
            Self::agent(rank)
        }
    }
}

/// Reporter category a report is counted under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ParityClass {
    Odd,
    Even,
}

/// Maps a reporting rank onto a parity class.
///
/// Kept apart from the transport so the classification rule can change
/// without touching messaging.
pub trait ReporterClassifier: Send + Sync {
    fn classify(&self, sender: Rank) -> ParityClass;
}

/// Default rule: odd ranks are odd-class reporters, even ranks are even-class.
#[derive(Debug, Clone, Copy, Default)]
pub struct RankParity;

impl ReporterClassifier for RankParity {
    fn classify(&self, sender: Rank) -> ParityClass {
        if sender.value() % 2 == 0 {
            ParityClass::Even
        } else {
            ParityClass::Odd
        }
    }
}
