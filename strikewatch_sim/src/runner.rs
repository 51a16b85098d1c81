//! Scenario runner - executes a scenario and checks the run invariants.

use crate::scenarios::ScenarioId;
use crate::world::{AgentExit, SimWorld, WorldOutcome};

use strikewatch_core::{RunConfig, RunSummary, ScriptedLocationSource, StrikeError, StrikeEvent};
use strikewatch_env::{Rank, StrikeContext, TokioContext};
use tracing::{info, warn};

/// Results from running a scenario.
#[derive(Debug, Clone)]
pub struct ScenarioResult {
    /// Scenario that was run
    pub scenario: ScenarioId,

    /// Seed used
    pub seed: u64,

    /// Whether every check passed
    pub passed: bool,

    /// Configuration the scenario actually ran with
    pub config: RunConfig,

    /// Final statistics (absent if the run never started)
    pub summary: Option<RunSummary>,

    /// Every strike event of the run
    pub events: Vec<StrikeEvent>,

    /// Failure message if any
    pub failure_reason: Option<String>,
}

impl ScenarioResult {
    fn failed(scenario: ScenarioId, config: RunConfig, reason: String) -> Self {
        Self {
            scenario,
            seed: config.seed,
            passed: false,
            config,
            summary: None,
            events: Vec::new(),
            failure_reason: Some(reason),
        }
    }
}

/// Runs scenarios against a base configuration.
pub struct ScenarioRunner {
    /// Configuration every scenario starts from
    base: RunConfig,

    /// Wall clock instead of the virtual clock
    realtime: bool,
}

impl ScenarioRunner {
    /// Creates a new scenario runner.
    pub fn new(seed: u64, base: RunConfig) -> Self {
        Self {
            base: base.with_seed(seed),
            realtime: false,
        }
    }

    /// Switches to wall-clock pacing.
    pub fn with_realtime(mut self, realtime: bool) -> Self {
        self.realtime = realtime;
        self
    }

    /// Returns the seed.
    pub fn seed(&self) -> u64 {
        self.base.seed
    }

    /// Applies the scenario's adjustments to the base configuration.
    pub fn config_for(&self, scenario: ScenarioId) -> RunConfig {
        let base = self.base.clone();
        match scenario {
            ScenarioId::Baseline => base,
            ScenarioId::LoneAgent => base.with_group_size(2),
            ScenarioId::Crowded => {
                let group_size = base.group_size.max(6);
                base.with_group_size(group_size).with_max_locations(4)
            }
            ScenarioId::DeadAgent | ScenarioId::CorruptReporter => {
                let group_size = base.group_size.max(3);
                base.with_group_size(group_size)
            }
        }
    }

    /// Runs a scenario and returns the result.
    pub fn run(&self, scenario: ScenarioId) -> ScenarioResult {
        let config = self.config_for(scenario);
        info!(
            "Starting scenario: {} (seed={}, group={}, locations={})",
            scenario.name(),
            config.seed,
            config.group_size,
            config.max_locations
        );

        let mut builder = tokio::runtime::Builder::new_current_thread();
        builder.enable_time();
        if !self.realtime {
            builder.start_paused(true);
        }
        let runtime = match builder.build() {
            Ok(runtime) => runtime,
            Err(err) => {
                return ScenarioResult::failed(scenario, config, format!("runtime: {}", err));
            }
        };

        match runtime.block_on(self.execute(scenario, config.clone())) {
            Ok(outcome) => judge(scenario, config, outcome),
            Err(err) => ScenarioResult::failed(scenario, config, err.to_string()),
        }
    }

    /// Builds the world for `scenario`, injects its fault and runs it.
    pub async fn execute(
        &self,
        scenario: ScenarioId,
        config: RunConfig,
    ) -> Result<WorldOutcome, StrikeError> {
        if self.realtime {
            let world = SimWorld::with_context(config, TokioContext::shared())?;
            prepare_and_run(scenario, world).await
        } else {
            let world = SimWorld::new(config)?;
            prepare_and_run(scenario, world).await
        }
    }
}

async fn prepare_and_run<Ctx: StrikeContext>(
    scenario: ScenarioId,
    mut world: SimWorld<Ctx>,
) -> Result<WorldOutcome, StrikeError> {
    match scenario {
        ScenarioId::DeadAgent => {
            let victim = Rank(world.group_size() - 1);
            warn!("Crashing {} for the whole run", victim);
            world.crash_agent(victim);
        }
        ScenarioId::CorruptReporter => {
            let out_of_range = world.config().max_locations;
            world.set_source(Rank(1), ScriptedLocationSource::constant(out_of_range));
        }
        ScenarioId::Baseline | ScenarioId::LoneAgent | ScenarioId::Crowded => {}
    }
    world.run().await
}

/// Checks that hold for every run, whatever the scenario.
pub fn check_invariants(outcome: &WorldOutcome) -> Vec<String> {
    let mut failures = Vec::new();
    let summary = &outcome.summary;

    if summary.total_samples == 0 {
        failures.push("no round ran".to_string());
    }
    if summary.total_samples != outcome.rounds.len() as u64 {
        failures.push(format!(
            "{} samples for {} rounds",
            summary.total_samples,
            outcome.rounds.len()
        ));
    }

    for round in &outcome.rounds {
        if round.received_reports > round.expected_reports {
            failures.push(format!("round {} received more reports than agents", round.round_index));
        }
        if round.aggregated_reports != round.received_reports - round.dropped_reports {
            failures.push(format!(
                "round {} buckets hold {} reports, expected {}",
                round.round_index,
                round.aggregated_reports,
                round.received_reports - round.dropped_reports
            ));
        }
    }

    let mut previous = 0;
    for event in &outcome.events {
        if event.cumulative_samples < previous || event.cumulative_samples != event.round_index + 1 {
            failures.push(format!("strike in round {} out of sequence", event.round_index));
            break;
        }
        previous = event.cumulative_samples;
    }

    let counted: u64 = outcome.rounds.iter().map(|r| r.strikes.len() as u64).sum();
    if counted != summary.total_strikes {
        failures.push(format!("{} strikes emitted, {} counted", counted, summary.total_strikes));
    }

    let expected_rate = if summary.total_samples == 0 {
        0.0
    } else {
        summary.total_strikes as f64 / summary.total_samples as f64
    };
    if (summary.rate - expected_rate).abs() > f64::EPSILON {
        failures.push(format!("rate {} != {}", summary.rate, expected_rate));
    }

    failures
}

fn judge(scenario: ScenarioId, config: RunConfig, outcome: WorldOutcome) -> ScenarioResult {
    let mut failures = check_invariants(&outcome);
    let summary = &outcome.summary;

    match scenario {
        ScenarioId::Baseline => {
            if summary.incomplete_rounds > 0 {
                failures.push(format!("{} incomplete rounds", summary.incomplete_rounds));
            }
            if !outcome.agents.iter().all(|a| matches!(a, AgentExit::Finished(_))) {
                failures.push("not every agent finished".to_string());
            }
        }
        ScenarioId::LoneAgent => {
            if summary.total_strikes > 0 {
                failures.push(format!("{} strikes with a single agent", summary.total_strikes));
            }
        }
        ScenarioId::Crowded => {
            if summary.total_strikes == 0 {
                failures.push("no strikes on a crowded grid".to_string());
            }
        }
        ScenarioId::DeadAgent => {
            if summary.incomplete_rounds != summary.total_samples {
                failures.push(format!(
                    "{} of {} rounds incomplete",
                    summary.incomplete_rounds, summary.total_samples
                ));
            }
            let victim = Rank(config.group_size - 1);
            if !outcome
                .agents
                .iter()
                .any(|a| matches!(a, AgentExit::Failed { rank, .. } if *rank == victim))
            {
                failures.push(format!("{} did not fail", victim));
            }
        }
        ScenarioId::CorruptReporter => {
            if summary.dropped_reports != summary.total_samples {
                failures.push(format!(
                    "{} reports dropped over {} rounds",
                    summary.dropped_reports, summary.total_samples
                ));
            }
        }
    }

    let passed = failures.is_empty();
    ScenarioResult {
        scenario,
        seed: config.seed,
        passed,
        config,
        summary: Some(outcome.summary),
        events: outcome.events,
        failure_reason: if passed { None } else { Some(failures.join("; ")) },
    }
}
