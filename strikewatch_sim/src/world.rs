//! SimWorld - group bootstrap and run orchestration.
//!
//! Plays the hosting runtime: assigns ranks and roles, wires the in-process
//! network, spawns one task per agent and drives the coordinator to the end
//! of the run.

use crate::context::SimContext;
use crate::network::{SimNetwork, SimNetworkController};

use std::collections::HashMap;
use std::sync::Arc;
use strikewatch_core::{
    AgentSummary, LocationSource, ProcessIdentity, RandomLocationSource, RecordingSink,
    ReportingAgent, RoundCoordinator, RoundOutcome, RunConfig, RunSummary, StrikeError,
    StrikeEvent, TracingSink,
};
use strikewatch_env::{NetworkController, Rank, StrikeContext};
use tokio::sync::mpsc;
use tracing::{info, warn};

/// How one agent's participation ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AgentExit {
    /// Left on `Finish`
    Finished(AgentSummary),

    /// Aborted with an error (typically a broken link)
    Failed { rank: Rank, error: String },

    /// Still blocked when the run ended
    Unresponsive { rank: Rank },
}

impl AgentExit {
    pub fn rank(&self) -> Rank {
        match self {
            AgentExit::Finished(summary) => summary.rank,
            AgentExit::Failed { rank, .. } | AgentExit::Unresponsive { rank } => *rank,
        }
    }
}

/// Everything a finished run produced.
#[derive(Debug, Clone)]
pub struct WorldOutcome {
    pub summary: RunSummary,
    pub events: Vec<StrikeEvent>,
    pub rounds: Vec<RoundOutcome>,
    pub agents: Vec<AgentExit>,
}

/// The SimWorld - container for one whole group run.
pub struct SimWorld<Ctx: StrikeContext = SimContext> {
    /// Run configuration
    config: RunConfig,

    /// Shared context (virtual or wall clock)
    context: Arc<Ctx>,

    /// Network controller for fault injection
    network_controller: SimNetworkController,

    /// One interface per rank, indexed by rank number
    networks: Vec<Arc<SimNetwork>>,

    /// Per-rank overrides of the default random source
    sources: HashMap<Rank, Box<dyn LocationSource>>,
}

impl SimWorld<SimContext> {
    /// Creates a world on a virtual clock seeded from the configuration.
    ///
    /// Must run on a paused tokio runtime.
    pub fn new(config: RunConfig) -> Result<Self, StrikeError> {
        let context = SimContext::shared(config.seed);
        Self::with_context(config, context)
    }
}

impl<Ctx: StrikeContext> SimWorld<Ctx> {
    /// Creates a world on the given context.
    ///
    /// Fails with a configuration error before anything is spawned.
    pub fn with_context(config: RunConfig, context: Arc<Ctx>) -> Result<Self, StrikeError> {
        config.validate()?;

        let network_controller = SimNetworkController::new();
        let networks = SimNetwork::group(config.group_size, &network_controller);

        Ok(Self {
            config,
            context,
            network_controller,
            networks,
            sources: HashMap::new(),
        })
    }

    /// Replaces the location source of one agent.
    pub fn set_source(&mut self, rank: Rank, source: impl LocationSource + 'static) {
        self.sources.insert(rank, Box::new(source));
    }

    /// Fault injection handle.
    pub fn controller(&self) -> &SimNetworkController {
        &self.network_controller
    }

    pub fn config(&self) -> &RunConfig {
        &self.config
    }

    pub fn context(&self) -> &Arc<Ctx> {
        &self.context
    }

    /// Returns the number of processes in the group.
    pub fn group_size(&self) -> u32 {
        self.config.group_size
    }

    /// Spawns every agent, runs the coordinator to completion and gathers
    /// how each agent ended.
    pub async fn run(mut self) -> Result<WorldOutcome, StrikeError> {
        let (exit_tx, mut exit_rx) = mpsc::unbounded_channel::<AgentExit>();

        for rank in 1..self.config.group_size {
            let identity = ProcessIdentity::for_rank(rank);
            let source: Box<dyn LocationSource> = match self.sources.remove(&Rank(rank)) {
                Some(source) => source,
                None => Box::new(RandomLocationSource::new(
                    self.config.seed,
                    self.config.max_locations,
                )),
            };
            let agent = ReportingAgent::new(
                identity,
                Arc::clone(&self.networks[rank as usize]),
                source,
            )?;

            let exit_tx = exit_tx.clone();
            self.context.spawn(&format!("agent-{}", rank), async move {
                let exit = match agent.run().await {
                    Ok(summary) => AgentExit::Finished(summary),
                    Err(err) => AgentExit::Failed {
                        rank: Rank(rank),
                        error: err.to_string(),
                    },
                };
                let _ = exit_tx.send(exit);
            });
        }
        drop(exit_tx);

        let mut coordinator = RoundCoordinator::new(
            ProcessIdentity::coordinator(),
            Arc::clone(&self.context),
            Arc::clone(&self.networks[0]),
            self.config.clone(),
            (TracingSink, RecordingSink::new()),
        )?;
        let summary = coordinator.run().await;
        let (_, recording) = coordinator.into_sink();

        let agents = self.collect_exits(&mut exit_rx).await;
        for exit in &agents {
            match exit {
                AgentExit::Failed { rank, error } => warn!(rank = %rank, error = %error, "Agent failed during run"),
                AgentExit::Unresponsive { rank } => warn!(rank = %rank, "Agent never acknowledged Finish"),
                AgentExit::Finished(_) => {}
            }
        }

        info!(
            strikes = summary.total_strikes,
            samples = summary.total_samples,
            "World run finished"
        );

        Ok(WorldOutcome {
            summary,
            events: recording.events,
            rounds: recording.rounds,
            agents,
        })
    }

    /// Waits up to one round timeout for the agents to leave their loops.
    async fn collect_exits(&self, exit_rx: &mut mpsc::UnboundedReceiver<AgentExit>) -> Vec<AgentExit> {
        let expected = self.config.agent_count() as usize;
        let mut exits: Vec<AgentExit> = Vec::with_capacity(expected);
        let grace = self.config.round_timeout;
        let deadline = self.context.now() + grace;

        while exits.len() < expected {
            let remaining = deadline.saturating_sub(self.context.now());
            if remaining.is_zero() {
                break;
            }
            tokio::select! {
                biased;
                exit = exit_rx.recv() => match exit {
                    Some(exit) => exits.push(exit),
                    None => break,
                },
                _ = self.context.sleep(remaining) => break,
            }
        }

        for rank in 1..self.config.group_size {
            if !exits.iter().any(|exit| exit.rank() == Rank(rank)) {
                exits.push(AgentExit::Unresponsive { rank: Rank(rank) });
            }
        }
        exits.sort_by_key(AgentExit::rank);
        exits
    }

    /// Crashes an agent before the run starts; its first report fails.
    pub fn crash_agent(&self, rank: Rank) {
        self.network_controller.crash(rank);
    }

    /// Cuts an agent off silently; it never hears tokens or Finish.
    pub fn isolate_agent(&self, rank: Rank) {
        self.network_controller.isolate(rank);
    }
}
