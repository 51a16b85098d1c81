//! Named simulation scenarios.

/// Scenario identifiers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScenarioId {
    /// Random draws, healthy group
    Baseline,

    /// Coordinator plus a single agent: strikes are impossible
    LoneAgent,

    /// Few locations, many agents: strikes are frequent
    Crowded,

    /// One agent's link is down from the start
    DeadAgent,

    /// One agent always reports `max_locations`
    CorruptReporter,
}

impl ScenarioId {
    /// Returns a list of all scenarios.
    pub fn all() -> Vec<ScenarioId> {
        vec![
            ScenarioId::Baseline,
            ScenarioId::LoneAgent,
            ScenarioId::Crowded,
            ScenarioId::DeadAgent,
            ScenarioId::CorruptReporter,
        ]
    }

    /// Returns the scenario name.
    pub fn name(&self) -> &'static str {
        match self {
            ScenarioId::Baseline => "baseline",
            ScenarioId::LoneAgent => "lone_agent",
            ScenarioId::Crowded => "crowded",
            ScenarioId::DeadAgent => "dead_agent",
            ScenarioId::CorruptReporter => "corrupt_reporter",
        }
    }

    /// Returns a description of the scenario.
    pub fn description(&self) -> &'static str {
        match self {
            ScenarioId::Baseline => "Random locations, every agent healthy",
            ScenarioId::LoneAgent => "One agent only, even class can never reach two",
            ScenarioId::Crowded => "Four locations shared by five or more agents",
            ScenarioId::DeadAgent => "Highest rank crashes on its first report, every round is incomplete",
            ScenarioId::CorruptReporter => "Rank 1 reports an out-of-range location every round",
        }
    }

    /// Returns true if the scenario injects a fault.
    pub fn is_faulty(&self) -> bool {
        matches!(self, ScenarioId::DeadAgent | ScenarioId::CorruptReporter)
    }
}

impl std::fmt::Display for ScenarioId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl std::str::FromStr for ScenarioId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "baseline" => Ok(ScenarioId::Baseline),
            "lone_agent" | "loneagent" => Ok(ScenarioId::LoneAgent),
            "crowded" => Ok(ScenarioId::Crowded),
            "dead_agent" | "deadagent" => Ok(ScenarioId::DeadAgent),
            "corrupt_reporter" | "corruptreporter" => Ok(ScenarioId::CorruptReporter),
            _ => Err(format!("Unknown scenario: {}", s)),
        }
    }
}
