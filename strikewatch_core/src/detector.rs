//! Strike evaluation over a round's ledger.

use crate::ledger::{LocationBucket, LocationLedger};
use serde::{Deserialize, Serialize};

/// Minimum per-class counts for a location to strike.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StrikeThreshold {
    pub min_odd: u32,
    pub min_even: u32,
}

impl Default for StrikeThreshold {
    /// One odd-class reporter and two even-class reporters.
    fn default() -> Self {
        Self {
            min_odd: 1,
            min_even: 2,
        }
    }
}

/// Result of evaluating one round.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StrikeEvaluation {
    /// Number of locations that struck (not a weighted count)
    pub strike_count: u64,

    /// Buckets of the striking locations, in location order
    pub strike_locations: Vec<LocationBucket>,
}

/// Pure threshold check over every bucket.
#[derive(Debug, Clone, Copy, Default)]
pub struct StrikeDetector {
    threshold: StrikeThreshold,
}

impl StrikeDetector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_threshold(threshold: StrikeThreshold) -> Self {
        Self { threshold }
    }

    pub fn threshold(&self) -> StrikeThreshold {
        self.threshold
    }

    /// Ties at the boundary strike.
    pub fn is_strike(&self, bucket: &LocationBucket) -> bool {
        bucket.odd_count >= self.threshold.min_odd && bucket.even_count >= self.threshold.min_even
    }

    pub fn evaluate(&self, ledger: &LocationLedger) -> StrikeEvaluation {
        let strike_locations: Vec<LocationBucket> = ledger
            .buckets()
            .iter()
            .filter(|bucket| self.is_strike(bucket))
            .copied()
            .collect();

        StrikeEvaluation {
            strike_count: strike_locations.len() as u64,
            strike_locations,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::ParityClass;
    use crate::ledger::Report;
    use proptest::prelude::*;
    use strikewatch_env::Rank;

    fn bucket(odd_count: u32, even_count: u32) -> LocationBucket {
        LocationBucket { location_id: 0, odd_count, even_count }
    }

    fn record(ledger: &mut LocationLedger, rank: u32, location_id: u32) {
        let class = if rank % 2 == 0 { ParityClass::Even } else { ParityClass::Odd };
        ledger
            .record(&Report { sender_rank: Rank(rank), location_id }, class)
            .unwrap();
    }

    #[test]
    fn test_boundary_tie_strikes() {
        let detector = StrikeDetector::new();
        assert!(detector.is_strike(&bucket(1, 2)));
        assert!(!detector.is_strike(&bucket(0, 2)));
        assert!(!detector.is_strike(&bucket(1, 1)));
        assert!(!detector.is_strike(&bucket(2, 1)));
    }

    #[test]
    fn test_two_odd_one_even_does_not_strike() {
        // ranks 1, 2, 3 all on location 5
        let mut ledger = LocationLedger::new(10);
        record(&mut ledger, 1, 5);
        record(&mut ledger, 2, 5);
        record(&mut ledger, 3, 5);

        let evaluation = StrikeDetector::new().evaluate(&ledger);
        assert_eq!(evaluation.strike_count, 0);
        assert!(evaluation.strike_locations.is_empty());
    }

    #[test]
    fn test_single_strike_location() {
        // ranks 1, 2, 4 on location 7, rank 3 on location 9
        let mut ledger = LocationLedger::new(10);
        record(&mut ledger, 1, 7);
        record(&mut ledger, 2, 7);
        record(&mut ledger, 3, 9);
        record(&mut ledger, 4, 7);

        let evaluation = StrikeDetector::new().evaluate(&ledger);
        assert_eq!(evaluation.strike_count, 1);
        assert_eq!(
            evaluation.strike_locations,
            vec![LocationBucket { location_id: 7, odd_count: 1, even_count: 2 }]
        );
    }

    #[test]
    fn test_multiple_strikes_count_locations_not_reporters() {
        let mut ledger = LocationLedger::new(10);
        for location in [2, 8] {
            record(&mut ledger, 1, location);
            record(&mut ledger, 3, location);
            record(&mut ledger, 2, location);
            record(&mut ledger, 4, location);
            record(&mut ledger, 6, location);
        }

        let evaluation = StrikeDetector::new().evaluate(&ledger);
        assert_eq!(evaluation.strike_count, 2);
        assert_eq!(evaluation.strike_locations[0].location_id, 2);
        assert_eq!(evaluation.strike_locations[1].location_id, 8);
    }

    #[test]
    fn test_custom_threshold() {
        let detector = StrikeDetector::with_threshold(StrikeThreshold { min_odd: 2, min_even: 0 });
        assert!(detector.is_strike(&bucket(2, 0)));
        assert!(!detector.is_strike(&bucket(1, 5)));
    }

    #[test]
    fn test_empty_ledger() {
        let evaluation = StrikeDetector::new().evaluate(&LocationLedger::new(100));
        assert_eq!(evaluation, StrikeEvaluation::default());
    }

    proptest! {
        #[test]
        fn prop_threshold(odd in 0u32..=5, even in 0u32..=5) {
            let strikes = StrikeDetector::new().is_strike(&bucket(odd, even));
            prop_assert_eq!(strikes, odd >= 1 && even >= 2);
        }
    }
}
