//! Per-round location counters.

use crate::error::StrikeError;
use crate::identity::ParityClass;
use serde::{Deserialize, Serialize};
use strikewatch_env::Rank;

/// One agent's answer for one round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Report {
    pub sender_rank: Rank,
    pub location_id: u32,
}

/// Counters for a single location within the current round.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocationBucket {
    pub location_id: u32,
    pub odd_count: u32,
    pub even_count: u32,
}

impl LocationBucket {
    fn empty(location_id: u32) -> Self {
        Self {
            location_id,
            odd_count: 0,
            even_count: 0,
        }
    }

    /// Reports counted at this location in either class.
    pub fn total(&self) -> u32 {
        self.odd_count + self.even_count
    }
}

/// Table of `max_locations` buckets, zeroed at the start of every round.
///
/// Counts never carry over between rounds; run-level totals live in
/// `RunStatistics`.
#[derive(Debug, Clone)]
pub struct LocationLedger {
    buckets: Vec<LocationBucket>,
}

impl LocationLedger {
    /// Creates a zeroed ledger with one bucket per location.
    pub fn new(max_locations: u32) -> Self {
        Self {
            buckets: (0..max_locations).map(LocationBucket::empty).collect(),
        }
    }

    /// Zeroes every bucket for a new round.
    pub fn reset(&mut self) {
        for bucket in &mut self.buckets {
            bucket.odd_count = 0;
            bucket.even_count = 0;
        }
    }

    /// Counts a report under the given parity class.
    ///
    /// Out-of-range locations are rejected without touching any bucket.
    pub fn record(&mut self, report: &Report, class: ParityClass) -> Result<(), StrikeError> {
        let max_locations = self.max_locations();
        let bucket = self
            .buckets
            .get_mut(report.location_id as usize)
            .ok_or(StrikeError::LocationOutOfRange {
                location_id: report.location_id,
                max_locations,
            })?;

        match class {
            ParityClass::Odd => bucket.odd_count += 1,
            ParityClass::Even => bucket.even_count += 1,
        }
        Ok(())
    }

    /// All buckets, indexed by location id.
    pub fn buckets(&self) -> &[LocationBucket] {
        &self.buckets
    }

    /// Returns the bucket for a location.
    pub fn bucket(&self, location_id: u32) -> Option<&LocationBucket> {
        self.buckets.get(location_id as usize)
    }

    /// Buckets that received at least one report this round.
    pub fn occupied(&self) -> impl Iterator<Item = &LocationBucket> {
        self.buckets.iter().filter(|b| b.total() > 0)
    }

    /// Sum of odd and even counts over all buckets.
    pub fn total_reports(&self) -> u32 {
        self.buckets.iter().map(LocationBucket::total).sum()
    }

    pub fn max_locations(&self) -> u32 {
        self.buckets.len() as u32
    }
}
