//! Injected randomness and time
//!
//! Every random draw and every timer in the watchdog goes through
//! [`RandomSource`] and [`Clock`], so tests can pin them down. The production
//! defaults draw uniformly over the configured ranges and sleep on tokio
//! timers.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::fmt::Debug;
use std::time::Duration;

/// Source of uniform random draws
pub trait RandomSource: Send + Sync + Debug {
    /// Uniform integer in `[0, bound)`; returns 0 when `bound` is 0
    fn below(&self, bound: u64) -> u64;

    /// `true` with the given probability
    fn chance(&self, probability: f64) -> bool;
}

/// Thread-local OS-seeded generator
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadRandom;

impl RandomSource for ThreadRandom {
    fn below(&self, bound: u64) -> u64 {
        if bound == 0 {
            return 0;
        }
        rand::thread_rng().gen_range(0..bound)
    }

    fn chance(&self, probability: f64) -> bool {
        rand::thread_rng().gen_bool(probability.clamp(0.0, 1.0))
    }
}

/// Reproducible generator for simulations
#[derive(Debug)]
pub struct SeededRandom {
    rng: Mutex<StdRng>,
}

impl SeededRandom {
    /// Create from a seed
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }
}

impl RandomSource for SeededRandom {
    fn below(&self, bound: u64) -> u64 {
        if bound == 0 {
            return 0;
        }
        self.rng.lock().gen_range(0..bound)
    }

    fn chance(&self, probability: f64) -> bool {
        self.rng.lock().gen_bool(probability.clamp(0.0, 1.0))
    }
}

/// Timer and wall clock
#[async_trait]
pub trait Clock: Send + Sync + Debug {
    /// Suspend for `duration`
    async fn sleep(&self, duration: Duration);

    /// Current wall-clock time
    fn now(&self) -> DateTime<Utc>;
}

/// Tokio timers and the system clock
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioClock;

#[async_trait]
impl Clock for TokioClock {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }

    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Half-open millisecond range `[min_ms, max_ms)`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DelayRange {
    /// Inclusive lower bound
    pub min_ms: u64,
    /// Exclusive upper bound
    pub max_ms: u64,
}

impl DelayRange {
    /// Create a range
    #[must_use]
    pub const fn new(min_ms: u64, max_ms: u64) -> Self {
        Self { min_ms, max_ms }
    }

    /// Whether the range contains at least one value
    #[inline]
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.max_ms > self.min_ms
    }

    /// Whether `duration` falls inside the range
    #[must_use]
    pub fn contains(&self, duration: Duration) -> bool {
        let ms = duration.as_millis();
        ms >= u128::from(self.min_ms) && ms < u128::from(self.max_ms)
    }

    /// Draw a uniform delay from the range
    #[must_use]
    pub fn sample(&self, random: &dyn RandomSource) -> Duration {
        let span = self.max_ms.saturating_sub(self.min_ms);
        Duration::from_millis(self.min_ms + random.below(span))
    }
}
