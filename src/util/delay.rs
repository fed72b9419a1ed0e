//! Timing perturbation
//!
//! Entities sleep for short, randomized intervals between protocol steps
//! (arriving, refereeing the play phase) so that runs exercise different
//! interleavings. The delays only perturb timing; the protocol never
//! depends on them for correctness, and tests zero them out.

use rand::Rng;
use rand::SeedableRng;
use rand_xoshiro::Xoshiro256PlusPlus;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// A base delay plus a uniformly drawn jitter, in microseconds
///
/// `base_us + uniform(0..spread_us)`, the shape of the original timing
/// perturbation this simulator models.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct JitterUs {
    /// Fixed floor of the delay
    pub base_us: u64,
    /// Exclusive upper bound of the random part; 0 disables jitter
    pub spread_us: u64,
}

impl JitterUs {
    /// A delay of `base_us + uniform(0..spread_us)` microseconds
    pub const fn new(base_us: u64, spread_us: u64) -> Self {
        Self { base_us, spread_us }
    }

    /// No delay at all; sampling always yields zero
    pub const fn zero() -> Self {
        Self::new(0, 0)
    }

    /// True if sampling can only ever yield zero
    pub fn is_zero(&self) -> bool {
        self.base_us == 0 && self.spread_us == 0
    }
}

impl fmt::Display for JitterUs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}+0..{}us", self.base_us, self.spread_us)
    }
}

/// Seeded sampler for entity delays
///
/// Each entity owns its own sampler, seeded from the scenario seed plus the
/// entity's identity, so a run is reproducible end to end.
pub struct DelaySampler {
    rng: Xoshiro256PlusPlus,
}

impl DelaySampler {
    /// Create a sampler from an explicit seed
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: Xoshiro256PlusPlus::seed_from_u64(seed),
        }
    }

    /// Create a sampler from OS entropy
    pub fn from_entropy() -> Self {
        Self {
            rng: Xoshiro256PlusPlus::from_entropy(),
        }
    }

    /// Draw one delay
    pub fn sample(&mut self, jitter: JitterUs) -> Duration {
        let jittered = if jitter.spread_us > 0 {
            self.rng.gen_range(0..jitter.spread_us)
        } else {
            0
        };
        Duration::from_micros(jitter.base_us + jittered)
    }

    /// Sleep for one drawn delay; a zero draw does not yield the thread
    pub fn pause(&mut self, jitter: JitterUs) {
        let delay = self.sample(jitter);
        if !delay.is_zero() {
            std::thread::sleep(delay);
        }
    }
}
