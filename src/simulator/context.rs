//! Injectable time and randomness for the simulator.
//!
//! Ticks never read the wall clock or a global RNG directly. They go through a
//! [`SimulationContext`], so a test can pin both and replay a tick sequence exactly.

use chrono::{DateTime, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::VecDeque;
use std::fmt::Debug;
use std::sync::{Arc, Mutex, PoisonError};

/// Source of timestamps for logged events.
pub trait Clock: Send + Sync + Debug {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall-clock time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock that only moves when told to. Clones share the same time.
#[derive(Debug, Clone)]
pub struct ManualClock {
    now: Arc<Mutex<DateTime<Utc>>>,
}

impl ManualClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            now: Arc::new(Mutex::new(start)),
        }
    }

    pub fn advance(&self, by: chrono::Duration) {
        let mut now = self.now.lock().unwrap_or_else(PoisonError::into_inner);
        *now += by;
    }

    pub fn set(&self, at: DateTime<Utc>) {
        *self.now.lock().unwrap_or_else(PoisonError::into_inner) = at;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Picks which catalog slot a tick sells from.
pub trait Selector: Send + Debug {
    /// Returns an index in `0..len`. Only called with `len > 0`.
    fn select(&mut self, len: usize) -> usize;
}

/// Uniform selection backed by a `rand` generator.
#[derive(Debug, Clone)]
pub struct RandomSelector<R = StdRng> {
    rng: R,
}

impl RandomSelector<StdRng> {
    /// Reproducible selection sequence.
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Seeded from the operating system.
    pub fn from_os() -> Self {
        Self {
            rng: StdRng::from_os_rng(),
        }
    }
}

impl<R: Rng + Send + Debug> RandomSelector<R> {
    pub fn with_rng(rng: R) -> Self {
        Self { rng }
    }
}

impl<R: Rng + Send + Debug> Selector for RandomSelector<R> {
    fn select(&mut self, len: usize) -> usize {
        self.rng.random_range(0..len)
    }
}

/// Replays a fixed list of indices, cycling when exhausted.
///
/// Indices past the end of the catalog wrap around.
#[derive(Debug, Clone)]
pub struct ScriptedSelector {
    script: VecDeque<usize>,
}

impl ScriptedSelector {
    pub fn new(script: impl IntoIterator<Item = usize>) -> Self {
        let mut script: VecDeque<usize> = script.into_iter().collect();
        if script.is_empty() {
            script.push_back(0);
        }
        Self { script }
    }
}

impl Selector for ScriptedSelector {
    fn select(&mut self, len: usize) -> usize {
        let pick = self.script.pop_front().unwrap_or_default();
        self.script.push_back(pick);
        pick % len
    }
}

/// Clock and selector a simulator runs with.
#[derive(Debug, Clone)]
pub struct SimulationContext {
    pub clock: Arc<dyn Clock>,
    pub selector: Arc<Mutex<dyn Selector>>,
}

impl SimulationContext {
    pub fn new(clock: Arc<dyn Clock>, selector: impl Selector + 'static) -> Self {
        Self {
            clock,
            selector: Arc::new(Mutex::new(selector)),
        }
    }

    /// Wall clock and OS-seeded randomness.
    pub fn system() -> Self {
        Self::new(Arc::new(SystemClock), RandomSelector::from_os())
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    pub fn select(&self, len: usize) -> usize {
        self.selector
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .select(len)
    }
}
