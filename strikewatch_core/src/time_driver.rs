//! Time-boxed iteration against an injectable clock.
//!
//! `TimeDriver` replaces a busy-wait `do { f() } while elapsed < duration`
//! loop. The clock comes from a `StrikeContext`, so tests and the simulation
//! harness drive it with virtual time instead of sleeping.

use std::time::Duration;
use strikewatch_env::StrikeContext;

/// Repeats work until a duration has elapsed on the context clock.
///
/// The first tick is always granted, even for a zero duration. After that a
/// tick is granted while `elapsed < duration`. The driver never interrupts a
/// callback, so total time spent is at least `duration` and at most
/// `duration` plus one callback's latency.
pub struct TimeDriver<'a, C: StrikeContext + ?Sized> {
    clock: &'a C,
    started: Duration,
    duration: Duration,
    iterations: u64,
}

impl<'a, C: StrikeContext + ?Sized> TimeDriver<'a, C> {
    /// Starts a driver at the clock's current time.
    pub fn start(clock: &'a C, duration: Duration) -> Self {
        Self {
            clock,
            started: clock.now(),
            duration,
            iterations: 0,
        }
    }

    /// Invokes `callback` with the elapsed time until `duration` has passed.
    ///
    /// Returns the number of invocations (always at least 1).
    pub fn run<F>(clock: &'a C, duration: Duration, mut callback: F) -> u64
    where
        F: FnMut(Duration),
    {
        let mut driver = Self::start(clock, duration);
        while let Some(elapsed) = driver.next_tick() {
            callback(elapsed);
        }
        driver.iterations
    }

    /// Grants the next iteration, returning the elapsed time at its start.
    ///
    /// Returns `None` once the duration has elapsed (never on the first call).
    pub fn next_tick(&mut self) -> Option<Duration> {
        let elapsed = self.elapsed();
        if self.iterations > 0 && elapsed >= self.duration {
            return None;
        }
        self.iterations += 1;
        Some(elapsed)
    }

    /// Time since the driver started.
    pub fn elapsed(&self) -> Duration {
        self.clock.now().saturating_sub(self.started)
    }

    /// Time left before the duration is reached (zero once expired).
    pub fn remaining(&self) -> Duration {
        self.duration.saturating_sub(self.elapsed())
    }

    /// True once `elapsed >= duration`.
    pub fn is_expired(&self) -> bool {
        self.elapsed() >= self.duration
    }

    /// Iterations granted so far.
    pub fn iterations(&self) -> u64 {
        self.iterations
    }

    /// The configured duration.
    pub fn duration(&self) -> Duration {
        self.duration
    }
}
