//! Message-passing abstraction between the coordinator and its agents.

use async_trait::async_trait;
use crate::error::EnvError;
use crate::types::{Message, Rank};

/// Abstraction for the typed message channel between ranks.
///
/// # Implementations
///
/// - **Simulation**: in-process channels with crash/isolate fault injection
///
/// # Message Flow
///
/// ```text
/// Coordinator (rank 0)                 Agent (rank k)
///   |                                     |
///   |-- broadcast(Round(token)) --------->|
///   |                                     |-- draw location
///   |<----------- send(0, Report{..}) ----|
///   |                                     |
///   |-- broadcast(Finish) --------------->|
/// ```
#[async_trait]
pub trait NetworkTransport: Send + Sync + 'static {
    /// Sends a message to a target rank.
    ///
    /// # Returns
    /// * `Ok(())` - Message queued for delivery
    /// * `Err(EnvError)` - The link is broken; the caller cannot reach `target`
    ///
    /// # Note
    /// Success does not guarantee delivery - messages may be dropped in simulation.
    async fn send(&self, target: Rank, message: Message) -> Result<(), EnvError>;

    /// Receives the next message addressed to this rank.
    ///
    /// # Returns
    /// * `Some((sender, message))` - A message was received
    /// * `None` - The inbox was closed (shutdown)
    ///
    /// # Blocking
    /// This method blocks until a message arrives or the inbox closes.
    async fn recv(&self) -> Option<(Rank, Message)>;

    /// Broadcasts a message to every other rank in the group.
    ///
    /// # Returns
    /// Number of ranks the message was sent to.
    async fn broadcast(&self, message: Message) -> usize;

    /// Returns this process's rank.
    fn local_rank(&self) -> Rank;
}

/// Marker trait for network controllers in simulation.
///
/// Allows injecting process failures into a running group.
pub trait NetworkController: Send + Sync {
    /// Makes every send from `rank` fail, as if its process had died.
    fn crash(&self, rank: Rank);

    /// Silently drops all traffic to and from `rank`.
    fn isolate(&self, rank: Rank);

    /// Restores all crashed and isolated ranks.
    fn heal_all(&self);
}
