//! ReportingAgent - the per-round agent protocol.
//!
//! An agent waits for the coordinator's round token, draws a location and
//! sends exactly one report. It holds no run-level state beyond a couple of
//! counters for its own summary.

use crate::error::StrikeError;
use crate::identity::ProcessIdentity;
use crate::ledger::Report;
use crate::location_source::LocationSource;

use std::sync::Arc;
use strikewatch_env::{EnvError, Message, NetworkTransport, Rank, RoundToken, COORDINATOR_RANK};
use tracing::{debug, warn};

/// What an agent did before leaving its loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AgentSummary {
    pub rank: Rank,
    pub rounds_seen: u64,
    pub reports_sent: u64,
}

/// A non-coordinator process answering round tokens.
pub struct ReportingAgent<Net, Src>
where
    Net: NetworkTransport,
    Src: LocationSource,
{
    identity: ProcessIdentity,
    network: Arc<Net>,
    source: Src,
    rounds_seen: u64,
    reports_sent: u64,
}

impl<Net, Src> ReportingAgent<Net, Src>
where
    Net: NetworkTransport,
    Src: LocationSource,
{
    /// Creates an agent. Fails if `identity` is the coordinator's.
    pub fn new(identity: ProcessIdentity, network: Arc<Net>, source: Src) -> Result<Self, StrikeError> {
        if identity.is_coordinator || identity.rank.is_coordinator() {
            return Err(StrikeError::RoleMismatch {
                rank: identity.rank,
                expected: "agent",
            });
        }

        Ok(Self {
            identity,
            network,
            source,
            rounds_seen: 0,
            reports_sent: 0,
        })
    }

    pub fn rank(&self) -> Rank {
        self.identity.rank
    }

    /// Draws a location for `token` and sends it to the coordinator.
    pub async fn answer(&mut self, token: &RoundToken) -> Result<Report, StrikeError> {
        self.rounds_seen += 1;
        let location_id = self.source.next(&self.identity, token);

        self.network
            .send(
                COORDINATOR_RANK,
                Message::Report {
                    round_index: token.index,
                    location_id,
                },
            )
            .await?;
        self.reports_sent += 1;

        debug!(rank = %self.identity.rank, round = token.index, location_id, "Reported");
        Ok(Report {
            sender_rank: self.identity.rank,
            location_id,
        })
    }

    /// Answers round tokens until the coordinator sends `Finish`.
    ///
    /// A broken send or a closed inbox ends the agent with a
    /// `Communication` error; the coordinator sees the missing reports.
    pub async fn run(mut self) -> Result<AgentSummary, StrikeError> {
        loop {
            let Some((sender, message)) = self.network.recv().await else {
                warn!(rank = %self.identity.rank, "Inbox closed before Finish");
                return Err(StrikeError::Communication(EnvError::network("inbox closed")));
            };

            if !sender.is_coordinator() {
                debug!(rank = %self.identity.rank, from = %sender, kind = message.kind(), "Ignoring non-coordinator message");
                continue;
            }

            match message {
                Message::Round(token) => {
                    if let Err(err) = self.answer(&token).await {
                        warn!(rank = %self.identity.rank, round = token.index, error = %err, "Agent aborting");
                        return Err(err);
                    }
                }
                Message::Finish => break,
                Message::Report { .. } => {
                    debug!(rank = %self.identity.rank, "Ignoring report addressed to an agent");
                }
            }
        }

        Ok(self.summary())
    }

    pub fn summary(&self) -> AgentSummary {
        AgentSummary {
            rank: self.identity.rank,
            rounds_seen: self.rounds_seen,
            reports_sent: self.reports_sent,
        }
    }
}
