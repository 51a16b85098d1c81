//! RoundCoordinator - the per-round coordinator protocol.
//!
//! # Round Lifecycle
//!
//! ```text
//!   AwaitingAgents ──► Aggregating ──► Evaluating ──► Reported
//!        ▲                                               │
//!        └───────────── next round ◄─────────────────────┤
//!                                                        ▼
//!                                                   RunComplete
//! ```
//!
//! Each round the coordinator broadcasts a round token, collects at most one
//! report per agent (bounded by `round_timeout`), aggregates them into a
//! freshly reset `LocationLedger`, evaluates strikes and folds the result
//! into `RunStatistics`. No partial-round state survives into the next round.

use crate::config::RunConfig;
use crate::detector::StrikeDetector;
use crate::error::StrikeError;
use crate::identity::{ProcessIdentity, RankParity, ReporterClassifier};
use crate::ledger::{LocationLedger, Report};
use crate::sink::{ReportSink, StrikeEvent, TracingSink};
use crate::stats::{RunStatistics, RunSummary};
use crate::time_driver::TimeDriver;

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use strikewatch_env::{Message, NetworkTransport, Rank, RoundToken, StrikeContext};
use tracing::{debug, info, warn};

/// Where the coordinator is within the round lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoundPhase {
    AwaitingAgents,
    Aggregating,
    Evaluating,
    Reported,
    RunComplete,
}

/// A round as seen by the coordinator.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Round {
    pub index: u64,

    /// Elapsed run time when the round started
    pub started: Duration,
}

impl Round {
    pub fn new(index: u64, started: Duration) -> Self {
        Self { index, started }
    }

    /// The synchronization token broadcast to agents.
    pub fn token(&self) -> RoundToken {
        RoundToken {
            index: self.index,
            elapsed_secs: self.started.as_secs_f64(),
        }
    }
}

/// Warning record for a round that closed with reports missing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IncompleteRound {
    pub round_index: u64,
    pub expected: u32,
    pub received: u32,
    pub missing: Vec<Rank>,
}

/// Everything that happened in one round.
#[derive(Debug, Clone, PartialEq)]
pub struct RoundOutcome {
    pub round_index: u64,
    pub expected_reports: u32,
    pub received_reports: u32,

    /// Reports rejected for an out-of-range location
    pub dropped_reports: u32,

    /// Sum of all bucket counts after aggregation
    pub aggregated_reports: u32,

    pub strikes: Vec<StrikeEvent>,
    pub incomplete: Option<IncompleteRound>,
}

/// The coordinator process: synchronizes rounds, aggregates reports and owns
/// the run statistics.
///
/// Generic over the context and network implementations so the same code
/// runs against the wall clock or the simulation harness.
pub struct RoundCoordinator<Ctx, Net, S = TracingSink>
where
    Ctx: StrikeContext,
    Net: NetworkTransport,
    S: ReportSink,
{
    identity: ProcessIdentity,
    context: Arc<Ctx>,
    network: Arc<Net>,
    config: RunConfig,
    ledger: LocationLedger,
    detector: StrikeDetector,
    classifier: Box<dyn ReporterClassifier>,
    stats: RunStatistics,
    sink: S,
    phase: RoundPhase,
    next_round: u64,
}

impl<Ctx, Net, S> RoundCoordinator<Ctx, Net, S>
where
    Ctx: StrikeContext,
    Net: NetworkTransport,
    S: ReportSink,
{
    /// Creates a coordinator after validating the run configuration.
    pub fn new(
        identity: ProcessIdentity,
        context: Arc<Ctx>,
        network: Arc<Net>,
        config: RunConfig,
        sink: S,
    ) -> Result<Self, StrikeError> {
        config.validate()?;
        if !identity.is_coordinator {
            return Err(StrikeError::RoleMismatch {
                rank: identity.rank,
                expected: "coordinator",
            });
        }

        Ok(Self {
            identity,
            context,
            network,
            ledger: LocationLedger::new(config.max_locations),
            config,
            detector: StrikeDetector::new(),
            classifier: Box::new(RankParity),
            stats: RunStatistics::new(),
            sink,
            phase: RoundPhase::AwaitingAgents,
            next_round: 0,
        })
    }

    /// Replaces the strike detector.
    pub fn with_detector(mut self, detector: StrikeDetector) -> Self {
        self.detector = detector;
        self
    }

    /// Replaces the reporter classification rule.
    pub fn with_classifier(mut self, classifier: impl ReporterClassifier + 'static) -> Self {
        self.classifier = Box::new(classifier);
        self
    }

    pub fn phase(&self) -> RoundPhase {
        self.phase
    }

    pub fn stats(&self) -> &RunStatistics {
        &self.stats
    }

    pub fn ledger(&self) -> &LocationLedger {
        &self.ledger
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn into_sink(self) -> S {
        self.sink
    }

    pub fn config(&self) -> &RunConfig {
        &self.config
    }

    /// Runs rounds until `run_duration` has elapsed, then tells agents to stop.
    ///
    /// The duration is checked between rounds only; a round in progress
    /// always completes. Each round is paced to `round_interval`.
    pub async fn run(&mut self) -> RunSummary {
        info!(
            rank = %self.identity.rank,
            agents = self.config.agent_count(),
            locations = self.config.max_locations,
            seed = self.context.seed(),
            "Coordinator starting run"
        );

        let context = Arc::clone(&self.context);
        let mut run_driver = TimeDriver::start(&*context, self.config.run_duration);

        while let Some(elapsed) = run_driver.next_tick() {
            let pacing = TimeDriver::start(&*context, self.config.round_interval);
            let round = Round::new(self.next_round, elapsed);
            let outcome = self.run_round(round).await;

            debug!(
                round = outcome.round_index,
                received = outcome.received_reports,
                strikes = outcome.strikes.len(),
                "Round complete"
            );

            let remaining = pacing.remaining();
            if !remaining.is_zero() {
                context.sleep(remaining).await;
            }
        }

        self.phase = RoundPhase::RunComplete;
        let notified = self.network.broadcast(Message::Finish).await;
        if notified < self.config.agent_count() as usize {
            warn!(notified, expected = self.config.agent_count(), "Finish did not reach every agent");
        }

        let summary = self.summary(run_driver.elapsed());
        self.sink.run_complete(&summary);
        summary
    }

    /// Runs one complete round: synchronize, collect, aggregate, evaluate, report.
    pub async fn run_round(&mut self, round: Round) -> RoundOutcome {
        self.phase = RoundPhase::AwaitingAgents;
        self.next_round = round.index + 1;

        let reached = self.network.broadcast(Message::Round(round.token())).await;
        if reached < self.config.agent_count() as usize {
            debug!(round = round.index, reached, "Round token did not reach every agent");
        }
        self.ledger.reset();

        let reports = self.collect_reports(&round).await;
        let expected = self.config.agent_count();
        let received = reports.len() as u32;

        self.phase = RoundPhase::Aggregating;
        let mut dropped = 0u32;
        for report in &reports {
            let class = self.classifier.classify(report.sender_rank);
            if let Err(err) = self.ledger.record(report, class) {
                warn!(round = round.index, rank = %report.sender_rank, error = %err, "Dropping report");
                dropped += 1;
            }
        }

        self.phase = RoundPhase::Evaluating;
        let evaluation = self.detector.evaluate(&self.ledger);
        self.stats.record_round(evaluation.strike_count);
        self.stats.record_dropped(dropped as u64);

        let incomplete = if received < expected {
            let missing: Vec<Rank> = (1..self.config.group_size)
                .map(Rank)
                .filter(|rank| !reports.iter().any(|r| r.sender_rank == *rank))
                .collect();
            warn!(
                round = round.index,
                expected,
                received,
                missing = ?missing,
                "Incomplete round"
            );
            self.stats.record_incomplete();
            Some(IncompleteRound {
                round_index: round.index,
                expected,
                received,
                missing,
            })
        } else {
            None
        };

        self.phase = RoundPhase::Reported;
        let cumulative_samples = self.stats.total_samples();
        let strikes: Vec<StrikeEvent> = evaluation
            .strike_locations
            .iter()
            .map(|bucket| StrikeEvent {
                location_id: bucket.location_id,
                odd_count: bucket.odd_count,
                even_count: bucket.even_count,
                round_index: round.index,
                cumulative_samples,
                instant_secs: round.started.as_secs_f64(),
            })
            .collect();
        for event in &strikes {
            self.sink.strike(event);
        }

        let outcome = RoundOutcome {
            round_index: round.index,
            expected_reports: expected,
            received_reports: received,
            dropped_reports: dropped,
            aggregated_reports: self.ledger.total_reports(),
            strikes,
            incomplete,
        };
        self.sink.round_complete(&outcome);
        outcome
    }

    /// Receives at most one report per agent for `round`, in rank order.
    ///
    /// Returns early once every agent has answered; otherwise gives up at
    /// `round_timeout` or when the inbox closes.
    async fn collect_reports(&mut self, round: &Round) -> Vec<Report> {
        let expected = self.config.agent_count() as usize;
        let deadline = self.context.now() + self.config.round_timeout;
        let mut reports: BTreeMap<Rank, Report> = BTreeMap::new();
        let mut discarded = 0u64;

        while reports.len() < expected {
            let remaining = deadline.saturating_sub(self.context.now());
            if remaining.is_zero() {
                break;
            }

            let incoming = tokio::select! {
                biased;
                incoming = self.network.recv() => incoming,
                _ = self.context.sleep(remaining) => {
                    debug!(round = round.index, received = reports.len(), "Round timed out");
                    break;
                }
            };

            let Some((sender, message)) = incoming else {
                warn!(round = round.index, "Coordinator inbox closed");
                break;
            };

            match message {
                Message::Report { round_index, location_id } if round_index == round.index => {
                    if sender.is_coordinator() || sender.value() >= self.config.group_size {
                        warn!(round = round.index, from = %sender, "Report from rank outside the group");
                        discarded += 1;
                    } else if reports.contains_key(&sender) {
                        warn!(round = round.index, from = %sender, "Duplicate report");
                        discarded += 1;
                    } else {
                        reports.insert(sender, Report { sender_rank: sender, location_id });
                    }
                }
                Message::Report { round_index, .. } => {
                    warn!(round = round.index, from = %sender, stale_round = round_index, "Stale report");
                    discarded += 1;
                }
                other => {
                    debug!(from = %sender, kind = other.kind(), "Ignoring message");
                    discarded += 1;
                }
            }
        }

        self.stats.record_discarded(discarded);
        reports.into_values().collect()
    }

    fn summary(&self, elapsed: Duration) -> RunSummary {
        RunSummary {
            total_strikes: self.stats.total_strikes(),
            total_samples: self.stats.total_samples(),
            rate: self.stats.rate(),
            incomplete_rounds: self.stats.incomplete_rounds(),
            dropped_reports: self.stats.dropped_reports(),
            discarded_messages: self.stats.discarded_messages(),
            max_locations: self.config.max_locations,
            run_duration_secs: self.config.run_duration.as_secs_f64(),
            round_interval_secs: self.config.round_interval.as_secs_f64(),
            elapsed_secs: elapsed.as_secs_f64(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sink::RecordingSink;
    use crate::test_support::{ManualClock, ScriptedNetwork};
    use crate::identity::ParityClass;

    fn setup(
        group_size: u32,
        max_locations: u32,
    ) -> (
        Arc<ManualClock>,
        Arc<ScriptedNetwork>,
        RoundCoordinator<ManualClock, ScriptedNetwork, RecordingSink>,
    ) {
        let clock = Arc::new(ManualClock::new());
        let network = Arc::new(ScriptedNetwork::with_group(Rank(0), group_size));
        let config = RunConfig::default()
            .with_group_size(group_size)
            .with_max_locations(max_locations)
            .with_run_duration(Duration::from_millis(50))
            .with_round_interval(Duration::from_millis(10))
            .with_round_timeout(Duration::from_millis(5));
        let coordinator = RoundCoordinator::new(
            ProcessIdentity::coordinator(),
            Arc::clone(&clock),
            Arc::clone(&network),
            config,
            RecordingSink::new(),
        )
        .unwrap();
        (clock, network, coordinator)
    }

    fn report(round_index: u64, location_id: u32) -> Message {
        Message::Report { round_index, location_id }
    }

    #[test]
    fn test_rejects_group_without_agents() {
        let clock = Arc::new(ManualClock::new());
        let network = Arc::new(ScriptedNetwork::new(Rank(0)));
        let result = RoundCoordinator::new(
            ProcessIdentity::coordinator(),
            clock,
            network,
            RunConfig::default().with_group_size(1),
            RecordingSink::new(),
        );
        assert!(matches!(result, Err(StrikeError::Configuration(_))));
    }

    #[test]
    fn test_rejects_agent_identity() {
        let clock = Arc::new(ManualClock::new());
        let network = Arc::new(ScriptedNetwork::new(Rank(1)));
        let result = RoundCoordinator::new(
            ProcessIdentity::agent(1),
            clock,
            network,
            RunConfig::default(),
            RecordingSink::new(),
        );
        assert!(matches!(result, Err(StrikeError::RoleMismatch { .. })));
    }

    #[tokio::test]
    async fn test_no_strike_when_even_class_short() {
        let (_clock, network, mut coordinator) = setup(4, 1000);
        network.push(Rank(1), report(0, 5));
        network.push(Rank(2), report(0, 5));
        network.push(Rank(3), report(0, 5));

        let outcome = coordinator.run_round(Round::new(0, Duration::ZERO)).await;

        assert!(outcome.strikes.is_empty());
        assert!(outcome.incomplete.is_none());
        let bucket = coordinator.ledger().bucket(5).unwrap();
        assert_eq!((bucket.odd_count, bucket.even_count), (2, 1));
        assert_eq!(coordinator.stats().total_strikes(), 0);
        assert_eq!(coordinator.stats().total_samples(), 1);
        assert_eq!(coordinator.phase(), RoundPhase::Reported);
    }

    #[tokio::test]
    async fn test_strike_event_emitted() {
        let (_clock, network, mut coordinator) = setup(5, 1000);
        // Arrival order differs from rank order
        network.push(Rank(4), report(0, 7));
        network.push(Rank(3), report(0, 9));
        network.push(Rank(1), report(0, 7));
        network.push(Rank(2), report(0, 7));

        let outcome = coordinator.run_round(Round::new(0, Duration::ZERO)).await;

        let expected = StrikeEvent {
            location_id: 7,
            odd_count: 1,
            even_count: 2,
            round_index: 0,
            cumulative_samples: 1,
            instant_secs: 0.0,
        };
        assert_eq!(outcome.strikes, vec![expected.clone()]);
        assert_eq!(coordinator.sink().events, vec![expected]);
        assert_eq!(coordinator.stats().total_strikes(), 1);
        assert_eq!(outcome.aggregated_reports, 4);
    }

    #[tokio::test]
    async fn test_out_of_range_report_dropped() {
        let (_clock, network, mut coordinator) = setup(5, 10);
        network.push(Rank(1), report(0, 7));
        network.push(Rank(2), report(0, 7));
        network.push(Rank(3), report(0, 10));
        network.push(Rank(4), report(0, 7));

        let outcome = coordinator.run_round(Round::new(0, Duration::ZERO)).await;

        assert_eq!(outcome.received_reports, 4);
        assert_eq!(outcome.dropped_reports, 1);
        assert_eq!(outcome.aggregated_reports, 3);
        assert_eq!(outcome.strikes.len(), 1);
        assert_eq!(coordinator.stats().dropped_reports(), 1);
        assert_eq!(coordinator.stats().total_samples(), 1);
    }

    #[tokio::test]
    async fn test_timeout_yields_incomplete_round() {
        let (clock, network, mut coordinator) = setup(4, 100);
        network.push(Rank(1), report(0, 1));
        network.push(Rank(3), report(0, 2));

        let outcome = coordinator.run_round(Round::new(0, Duration::ZERO)).await;

        assert_eq!(
            outcome.incomplete,
            Some(IncompleteRound {
                round_index: 0,
                expected: 3,
                received: 2,
                missing: vec![Rank(2)],
            })
        );
        assert_eq!(outcome.aggregated_reports, 2);
        assert_eq!(clock.now(), Duration::from_millis(5));
        assert_eq!(coordinator.stats().incomplete_rounds(), 1);
        assert_eq!(coordinator.stats().total_samples(), 1);
    }

    #[tokio::test]
    async fn test_stale_and_duplicate_reports_discarded() {
        let (_clock, network, mut coordinator) = setup(3, 100);
        network.push(Rank(1), report(0, 4));
        network.push(Rank(1), report(1, 4));
        network.push(Rank(1), report(1, 5));
        network.push(Rank(7), report(1, 4));
        network.push(Rank(2), report(1, 4));

        let outcome = coordinator.run_round(Round::new(1, Duration::from_millis(10))).await;

        assert_eq!(outcome.received_reports, 2);
        assert!(outcome.incomplete.is_none());
        let bucket = coordinator.ledger().bucket(4).unwrap();
        assert_eq!((bucket.odd_count, bucket.even_count), (1, 1));
        assert_eq!(coordinator.ledger().bucket(5).unwrap().odd_count, 0);
        assert_eq!(coordinator.stats().discarded_messages(), 3);
    }

    #[tokio::test]
    async fn test_rounds_are_isolated() {
        let (_clock, network, mut coordinator) = setup(4, 100);
        for round in 0..2 {
            network.push(Rank(1), report(round, 3));
            network.push(Rank(2), report(round, 3));
            network.push(Rank(3), report(round, 3));
        }

        let first = coordinator.run_round(Round::new(0, Duration::ZERO)).await;
        let second = coordinator.run_round(Round::new(1, Duration::from_millis(10))).await;

        // Carry-over would have pushed the even count to 2 and struck
        assert!(first.strikes.is_empty());
        assert!(second.strikes.is_empty());
        let bucket = coordinator.ledger().bucket(3).unwrap();
        assert_eq!((bucket.odd_count, bucket.even_count), (2, 1));
    }

    #[tokio::test]
    async fn test_identical_rounds_strike_identically() {
        let (_clock, network, mut coordinator) = setup(5, 100);
        for round in 0..2 {
            network.push(Rank(1), report(round, 7));
            network.push(Rank(2), report(round, 7));
            network.push(Rank(3), report(round, 9));
            network.push(Rank(4), report(round, 7));
        }

        let first = coordinator.run_round(Round::new(0, Duration::ZERO)).await;
        let second = coordinator.run_round(Round::new(1, Duration::from_millis(10))).await;

        assert_eq!(first.strikes.len(), 1);
        assert_eq!(second.strikes.len(), 1);
        assert_eq!(second.strikes[0].odd_count, 1);
        assert_eq!(second.strikes[0].even_count, 2);
        assert_eq!(second.strikes[0].cumulative_samples, 2);
        assert_eq!(coordinator.stats().total_strikes(), 2);
    }

    #[tokio::test]
    async fn test_custom_classifier() {
        struct AllEven;
        impl ReporterClassifier for AllEven {
            fn classify(&self, _sender: Rank) -> ParityClass {
                ParityClass::Even
            }
        }

        let (_clock, network, coordinator) = setup(4, 100);
        let mut coordinator = coordinator.with_classifier(AllEven);
        network.push(Rank(1), report(0, 3));
        network.push(Rank(2), report(0, 3));
        network.push(Rank(3), report(0, 3));

        let outcome = coordinator.run_round(Round::new(0, Duration::ZERO)).await;

        assert!(outcome.strikes.is_empty());
        assert_eq!(coordinator.ledger().bucket(3).unwrap().even_count, 3);
    }

    #[tokio::test]
    async fn test_run_paces_rounds_and_finishes() {
        let (clock, network, mut coordinator) = setup(2, 100);
        for round in 0..5 {
            network.push(Rank(1), report(round, round as u32));
        }

        let summary = coordinator.run().await;

        assert_eq!(summary.total_samples, 5);
        assert_eq!(summary.total_strikes, 0);
        assert_eq!(summary.rate, 0.0);
        assert_eq!(summary.incomplete_rounds, 0);
        assert_eq!(clock.now(), Duration::from_millis(50));
        assert_eq!(coordinator.phase(), RoundPhase::RunComplete);

        let broadcasts = network.broadcasts();
        assert_eq!(broadcasts.len(), 6);
        assert_eq!(broadcasts.last(), Some(&Message::Finish));
        assert_eq!(coordinator.sink().summary.as_ref(), Some(&summary));
        assert_eq!(coordinator.sink().rounds.len(), 5);
        assert!(coordinator.sink().rounds.iter().all(|r| r.received_reports == 1));
    }

    #[tokio::test]
    async fn test_run_survives_silent_agents() {
        let (_clock, _network, mut coordinator) = setup(3, 100);

        let summary = coordinator.run().await;

        // Each round waits 5ms for reports, then idles the rest of its 10ms
        assert_eq!(summary.total_samples, 5);
        assert_eq!(summary.incomplete_rounds, 5);
        assert!(!summary.is_clean());
    }
}
