//! Simulated message transport with fault injection.

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use strikewatch_env::{EnvError, Message, NetworkController, NetworkTransport, Rank};
use tokio::sync::mpsc;

type Inbox = mpsc::UnboundedSender<(Rank, Message)>;

/// Simulated network interface for one rank.
pub struct SimNetwork {
    /// This process's rank
    local_rank: Rank,

    /// Inbox senders of every rank in the group (including this one)
    peers: Arc<HashMap<Rank, Inbox>>,

    /// Receiver for incoming messages (behind tokio mutex for async)
    rx: tokio::sync::Mutex<mpsc::UnboundedReceiver<(Rank, Message)>>,

    /// Shared fault state
    controller: SimNetworkController,

    /// Messages accepted for delivery
    sent: AtomicU64,

    /// Messages silently dropped by isolation
    dropped: AtomicU64,
}

impl SimNetwork {
    /// Wires up a fully connected group of `group_size` ranks.
    ///
    /// Returns one interface per rank, indexed by rank number.
    pub fn group(group_size: u32, controller: &SimNetworkController) -> Vec<Arc<SimNetwork>> {
        let mut senders = HashMap::new();
        let mut receivers = Vec::new();

        for rank in 0..group_size {
            let (tx, rx) = mpsc::unbounded_channel();
            senders.insert(Rank(rank), tx);
            receivers.push((Rank(rank), rx));
        }

        let peers = Arc::new(senders);
        receivers
            .into_iter()
            .map(|(rank, rx)| {
                Arc::new(SimNetwork {
                    local_rank: rank,
                    peers: Arc::clone(&peers),
                    rx: tokio::sync::Mutex::new(rx),
                    controller: controller.clone(),
                    sent: AtomicU64::new(0),
                    dropped: AtomicU64::new(0),
                })
            })
            .collect()
    }

    /// Messages this rank handed to the network.
    pub fn messages_sent(&self) -> u64 {
        self.sent.load(Ordering::Relaxed)
    }

    /// Messages from this rank lost to isolation.
    pub fn messages_dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl NetworkTransport for SimNetwork {
    async fn send(&self, target: Rank, message: Message) -> Result<(), EnvError> {
        if self.controller.is_crashed(self.local_rank) {
            return Err(EnvError::network(format!("{} has crashed", self.local_rank)));
        }

        let inbox = self
            .peers
            .get(&target)
            .ok_or_else(|| EnvError::unreachable(target))?;

        if !self.controller.can_communicate(self.local_rank, target) {
            // Isolation loses messages without telling the sender
            self.dropped.fetch_add(1, Ordering::Relaxed);
            return Ok(());
        }

        inbox
            .send((self.local_rank, message))
            .map_err(|_| EnvError::network("Channel closed"))?;
        self.sent.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    async fn recv(&self) -> Option<(Rank, Message)> {
        let mut rx = self.rx.lock().await;
        rx.recv().await
    }

    async fn broadcast(&self, message: Message) -> usize {
        let mut targets: Vec<Rank> = self
            .peers
            .keys()
            .copied()
            .filter(|rank| *rank != self.local_rank)
            .collect();
        targets.sort();

        let mut delivered = 0;
        for target in targets {
            if self.send(target, message.clone()).await.is_ok() {
                delivered += 1;
            }
        }
        delivered
    }

    fn local_rank(&self) -> Rank {
        self.local_rank
    }
}

#[derive(Debug, Default)]
struct FaultState {
    crashed: HashSet<Rank>,
    isolated: HashSet<Rank>,
}

/// Network controller for fault injection.
///
/// Clones share state, so a controller kept by the harness steers every
/// `SimNetwork` built from it.
#[derive(Debug, Clone, Default)]
pub struct SimNetworkController {
    state: Arc<Mutex<FaultState>>,
}

impl SimNetworkController {
    /// Creates a new network controller.
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, FaultState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// True if sends from `rank` fail.
    pub fn is_crashed(&self, rank: Rank) -> bool {
        self.state().crashed.contains(&rank)
    }

    /// Checks if two ranks can exchange messages (neither is isolated).
    pub fn can_communicate(&self, from: Rank, to: Rank) -> bool {
        let state = self.state();
        !state.isolated.contains(&from) && !state.isolated.contains(&to)
    }
}

impl NetworkController for SimNetworkController {
    fn crash(&self, rank: Rank) {
        self.state().crashed.insert(rank);
    }

    fn isolate(&self, rank: Rank) {
        self.state().isolated.insert(rank);
    }

    fn heal_all(&self) {
        let mut state = self.state();
        state.crashed.clear();
        state.isolated.clear();
    }
}
