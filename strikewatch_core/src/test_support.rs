//! Test doubles for the environment traits.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use std::time::Duration;
use strikewatch_env::{EnvError, Message, NetworkTransport, Rank, StrikeContext};

/// Clock that only moves when told to. `sleep` advances it instantly.
pub struct ManualClock {
    now: Mutex<Duration>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self {
            now: Mutex::new(Duration::ZERO),
        }
    }

    pub fn advance(&self, duration: Duration) {
        *self.now.lock().unwrap() += duration;
    }
}

#[async_trait]
impl StrikeContext for ManualClock {
    fn now(&self) -> Duration {
        *self.now.lock().unwrap()
    }

    async fn sleep(&self, duration: Duration) {
        self.advance(duration);
    }

    fn spawn<F>(&self, _name: &str, future: F)
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        tokio::spawn(future);
    }

    fn seed(&self) -> u64 {
        0
    }
}

/// Transport fed from a queue; `recv` pends forever once the queue is empty.
pub struct ScriptedNetwork {
    local: Rank,
    group_size: u32,
    inbox: Mutex<VecDeque<(Rank, Message)>>,
    sent: Mutex<Vec<(Rank, Message)>>,
    broadcasts: Mutex<Vec<Message>>,
    closed: AtomicBool,
    broken: AtomicBool,
}

impl ScriptedNetwork {
    pub fn new(local: Rank) -> Self {
        Self::with_group(local, 2)
    }

    pub fn with_group(local: Rank, group_size: u32) -> Self {
        Self {
            local,
            group_size,
            inbox: Mutex::new(VecDeque::new()),
            sent: Mutex::new(Vec::new()),
            broadcasts: Mutex::new(Vec::new()),
            closed: AtomicBool::new(false),
            broken: AtomicBool::new(false),
        }
    }

    pub fn push(&self, from: Rank, message: Message) {
        self.inbox.lock().unwrap().push_back((from, message));
    }

    /// `recv` returns `None` once the queue drains.
    pub fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
    }

    /// Every later `send` fails.
    pub fn break_sends(&self) {
        self.broken.store(true, Ordering::SeqCst);
    }

    pub fn sent(&self) -> Vec<(Rank, Message)> {
        self.sent.lock().unwrap().clone()
    }

    pub fn broadcasts(&self) -> Vec<Message> {
        self.broadcasts.lock().unwrap().clone()
    }
}

#[async_trait]
impl NetworkTransport for ScriptedNetwork {
    async fn send(&self, target: Rank, message: Message) -> Result<(), EnvError> {
        if self.broken.load(Ordering::SeqCst) {
            return Err(EnvError::network("link down"));
        }
        self.sent.lock().unwrap().push((target, message));
        Ok(())
    }

    async fn recv(&self) -> Option<(Rank, Message)> {
        let next = self.inbox.lock().unwrap().pop_front();
        match next {
            Some(entry) => Some(entry),
            None if self.closed.load(Ordering::SeqCst) => None,
            None => std::future::pending().await,
        }
    }

    async fn broadcast(&self, message: Message) -> usize {
        self.broadcasts.lock().unwrap().push(message);
        self.group_size.saturating_sub(1) as usize
    }

    fn local_rank(&self) -> Rank {
        self.local
    }
}
