//! Seedable random source threaded through index construction.
//!
//! There is no process-wide generator: every call that draws hash functions
//! or initializes centroids takes a `&mut RandomSource`. Parallel builds draw
//! one child seed per unit of work up front (sequentially), so the result does
//! not depend on thread scheduling.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Deterministic pseudo-random generator with uniform, Gaussian and Cauchy draws.
#[derive(Debug, Clone)]
pub struct RandomSource {
    rng: StdRng,
}

impl RandomSource {
    pub fn seed_from_u64(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Uniform draw in `[0, 1)`.
    #[inline]
    pub fn uniform(&mut self) -> f64 {
        self.rng.random::<f64>()
    }

    /// Uniform index in `[0, n)`. `n` must be positive.
    #[inline]
    pub fn below(&mut self, n: usize) -> usize {
        self.rng.random_range(0..n)
    }

    /// Standard normal draw (Box-Muller).
    pub fn gaussian(&mut self) -> f64 {
        // 1 - U keeps the logarithm argument in (0, 1].
        let u1 = 1.0 - self.uniform();
        let u2 = self.uniform();
        (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos()
    }

    /// Standard Cauchy draw, the 1-stable distribution used for L1 hashing.
    pub fn cauchy(&mut self) -> f64 {
        let u = self.uniform();
        (std::f64::consts::PI * (u - 0.5)).tan()
    }

    /// Seed for an independent child source.
    #[inline]
    pub fn next_seed(&mut self) -> u64 {
        self.rng.random::<u64>()
    }

    /// Independent child source.
    pub fn fork(&mut self) -> Self {
        Self::seed_from_u64(self.next_seed())
    }
}
