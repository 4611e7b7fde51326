//! Deterministic random sources for the KMC engine.
//!
//! # Determinism strategy
//!
//! One run owns exactly one pseudo-random stream, seeded from the configured
//! seed.  Ensemble replicas derive their streams as
//!
//!   seed = run_seed XOR (replica * MIXING_CONSTANT)
//!
//! The mixing constant is the 64-bit fractional part of the golden ratio,
//! which spreads consecutive replica indices uniformly across the seed space.
//! Replicas therefore never share RNG state and adding replicas does not
//! disturb the streams of existing ones.
//!
//! The engine only consumes the [`RandomSource`] trait, so tests can drive it
//! with a scripted sequence of draws.

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

/// 64-bit fractional golden-ratio constant for seed mixing.
const MIXING_CONSTANT: u64 = 0x9e37_79b9_7f4a_7c15;

// ── RandomSource ──────────────────────────────────────────────────────────────

/// Opaque source of uniform samples plus the derived samples the VSSM needs.
///
/// Only [`next_f64`](Self::next_f64) is required; the rest are derived from it
/// so a scripted source reproduces the exact draw sequence of the engine.
pub trait RandomSource {
    /// Uniform draw in `[0, 1)`.
    fn next_f64(&mut self) -> f64;

    /// Uniform draw in the open interval `(0, 1)`.
    #[inline]
    fn next_open(&mut self) -> f64 {
        loop {
            let u = self.next_f64();
            if u > 0.0 {
                return u;
            }
        }
    }

    /// Exponentially distributed waiting time for a process of total `rate`.
    ///
    /// `rate` must be strictly positive; the engine checks this before calling.
    #[inline]
    fn exponential(&mut self, rate: f64) -> f64 {
        -self.next_open().ln() / rate
    }

    /// Uniform index in `0..n`.  `n` must be non-zero.
    #[inline]
    fn index(&mut self, n: usize) -> usize {
        let i = (self.next_f64() * n as f64) as usize;
        i.min(n - 1)
    }
}

// ── KmcRng ────────────────────────────────────────────────────────────────────

/// The production random source: a seeded `SmallRng`.
///
/// `KmcRng` is `Send` but deliberately not shared; each run (and each
/// ensemble replica) owns its own instance.
#[derive(Clone, Debug)]
pub struct KmcRng(SmallRng);

impl KmcRng {
    pub fn new(seed: u64) -> Self {
        KmcRng(SmallRng::seed_from_u64(seed))
    }

    /// Independent stream for ensemble replica `replica` of a run seeded with
    /// `seed`.
    pub fn for_replica(seed: u64, replica: u64) -> Self {
        KmcRng(SmallRng::seed_from_u64(seed ^ replica.wrapping_mul(MIXING_CONSTANT)))
    }
}

impl RandomSource for KmcRng {
    #[inline]
    fn next_f64(&mut self) -> f64 {
        self.0.r#gen::<f64>()
    }

    #[inline]
    fn index(&mut self, n: usize) -> usize {
        self.0.gen_range(0..n)
    }
}
