//! xorshift64* pseudo-random generator
//!
//! A fast, high-quality PRNG that is deterministic and suitable for test
//! fixtures that need reproducible but non-colliding identifiers.
//!
//! # Algorithm
//!
//! xorshift64* is a variant of xorshift that passes TestU01's BigCrush
//! statistical tests. It uses 64-bit state and produces 64-bit output.
//!
//! # Determinism
//!
//! Same seed → same sequence. This is what makes [`DeterministicIdGenerator`](super::DeterministicIdGenerator)
//! reproducible across test runs.

use serde::{Deserialize, Serialize};

/// Deterministic random number generator using xorshift64*.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Xorshift64Star {
    state: u64,
}

impl Xorshift64Star {
    /// Creates a generator from `seed`. A zero seed is coerced to 1, the
    /// xorshift requirement that the state never be all-zero.
    pub fn new(seed: u64) -> Self {
        let state = if seed == 0 { 1 } else { seed };
        Self { state }
    }

    pub fn next(&mut self) -> u64 {
        let mut x = self.state;
        x ^= x >> 12;
        x ^= x << 25;
        x ^= x >> 27;
        self.state = x;
        x.wrapping_mul(0x2545F4914F6CDD1D)
    }

    pub fn range(&mut self, min: i64, max: i64) -> i64 {
        assert!(min < max, "min must be less than max");
        let value = self.next();
        let range_size = (max - min) as u64;
        min + (value % range_size) as i64
    }

    pub fn get_state(&self) -> u64 {
        self.state
    }

    /// Random `f64` in `[0.0, 1.0)`.
    pub fn next_f64(&mut self) -> f64 {
        let value = self.next();
        (value >> 11) as f64 * (1.0 / ((1u64 << 53) as f64))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_seed_converted_to_nonzero() {
        let rng = Xorshift64Star::new(0);
        assert_ne!(rng.get_state(), 0, "Zero seed should be converted to 1");
    }

    #[test]
    #[should_panic(expected = "min must be less than max")]
    fn range_invalid_bounds() {
        let mut rng = Xorshift64Star::new(12345);
        rng.range(100, 50);
    }

    #[test]
    fn next_f64_in_range() {
        let mut rng = Xorshift64Star::new(12345);
        for _ in 0..1000 {
            let val = rng.next_f64();
            assert!(
                (0.0..1.0).contains(&val),
                "next_f64() produced value {} outside [0.0, 1.0)",
                val
            );
        }
    }

    #[test]
    fn next_f64_deterministic() {
        let mut rng1 = Xorshift64Star::new(99999);
        let mut rng2 = Xorshift64Star::new(99999);
        for _ in 0..100 {
            assert_eq!(rng1.next_f64(), rng2.next_f64());
        }
    }
}
