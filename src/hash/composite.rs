//! Composite hash codes: `n` scalar hashes folded into one bucket key.
//!
//! Composing functions sharpens selectivity: two vectors share a bucket only
//! if *every* component agrees (up to the strategy's own collisions), so the
//! collision probability of a composite is roughly `p^n` for per-function
//! probability `p`.

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use super::function::{HashFunction, HashFunctionFactory};
use crate::error::{Result, RetrieveError};
use crate::random::RandomSource;

const FNV_OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

/// Component values for one vector; inline for the usual handful of functions.
pub type HashValues = SmallVec<[i32; 16]>;

/// How component hashes are folded into a 64-bit composite code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CompositeStrategy {
    /// FNV-1a over the 32-bit component values. Distinct component tuples
    /// only collide through 64-bit hash collisions.
    #[default]
    Polynomial,
    /// Packs the low `bits` bits of each component side by side. Two vectors
    /// collide iff every component agrees modulo `2^bits`; with sign hashes
    /// and `bits = 1` the code is exactly the sign pattern.
    Concatenation { bits: u32 },
}

impl CompositeStrategy {
    /// Checks that `functions` components fit this strategy.
    pub fn validate(&self, functions: usize) -> Result<()> {
        match *self {
            CompositeStrategy::Polynomial => Ok(()),
            CompositeStrategy::Concatenation { bits } => {
                if bits == 0 || bits > 32 {
                    return Err(RetrieveError::config(format!(
                        "concatenation bits must be in 1..=32, got {bits}"
                    )));
                }
                if functions as u64 * u64::from(bits) > 64 {
                    return Err(RetrieveError::config(format!(
                        "{functions} functions x {bits} bits exceeds a 64-bit code"
                    )));
                }
                Ok(())
            }
        }
    }

    /// Folds component values into a composite code.
    #[inline]
    pub fn combine(&self, values: &[i32]) -> u64 {
        match *self {
            CompositeStrategy::Polynomial => values.iter().fold(FNV_OFFSET, |code, &v| {
                (code ^ u64::from(v as u32)).wrapping_mul(FNV_PRIME)
            }),
            CompositeStrategy::Concatenation { bits } => {
                let mask = (1u64 << bits) - 1;
                values.iter().fold(0u64, |code, &v| {
                    (code << bits) | (u64::from(v as u32) & mask)
                })
            }
        }
    }
}

/// `n` hash functions and the strategy that folds their outputs.
#[derive(Debug, Clone, PartialEq)]
pub struct CompositeHash {
    functions: Vec<HashFunction>,
    strategy: CompositeStrategy,
    dimension: usize,
}

impl CompositeHash {
    /// Draws `n` functions from `factory`.
    pub fn new(
        factory: &HashFunctionFactory,
        n: usize,
        strategy: CompositeStrategy,
        rng: &mut RandomSource,
    ) -> Result<Self> {
        if n == 0 {
            return Err(RetrieveError::config(
                "a composite hash needs at least one function",
            ));
        }
        strategy.validate(n)?;
        Ok(Self {
            functions: factory.create_many(n, rng),
            strategy,
            dimension: factory.dimension(),
        })
    }

    /// Composite code of `vector`.
    pub fn code(&self, vector: &[f32]) -> Result<u64> {
        let values = self.values(vector)?;
        Ok(self.strategy.combine(&values))
    }

    /// Per-function outputs for `vector`, in function order.
    pub fn values(&self, vector: &[f32]) -> Result<HashValues> {
        RetrieveError::check_dimension(self.dimension, vector.len())?;
        Ok(self
            .functions
            .iter()
            .map(|f| f.hash_unchecked(vector))
            .collect())
    }

    pub fn functions(&self) -> &[HashFunction] {
        &self.functions
    }

    pub fn strategy(&self) -> CompositeStrategy {
        self.strategy
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hash::HashFamily;

    #[test]
    fn concatenation_packs_low_bits_in_order() {
        let strategy = CompositeStrategy::Concatenation { bits: 2 };
        assert_eq!(strategy.combine(&[1, 0, 3]), 0b01_00_11);
        // Components agreeing modulo 2^bits collide.
        assert_eq!(strategy.combine(&[5, 4, 7]), strategy.combine(&[1, 0, 3]));
        // Negative values use their two's complement low bits.
        assert_eq!(strategy.combine(&[-1]), 0b11);
    }

    #[test]
    fn polynomial_separates_permutations_and_wraparounds() {
        let strategy = CompositeStrategy::Polynomial;
        assert_ne!(strategy.combine(&[1, 2]), strategy.combine(&[2, 1]));
        assert_ne!(strategy.combine(&[1, 0]), strategy.combine(&[5, 4]));
        assert_eq!(strategy.combine(&[-3, 9]), strategy.combine(&[-3, 9]));
    }

    #[test]
    fn concatenation_width_is_validated() {
        assert!(CompositeStrategy::Concatenation { bits: 0 }.validate(1).is_err());
        assert!(CompositeStrategy::Concatenation { bits: 33 }.validate(1).is_err());
        assert!(CompositeStrategy::Concatenation { bits: 8 }.validate(8).is_ok());
        assert!(CompositeStrategy::Concatenation { bits: 8 }.validate(9).is_err());
    }

    #[test]
    fn sign_concatenation_is_the_sign_pattern() {
        let factory = HashFunctionFactory::new(HashFamily::Sign, 3).unwrap();
        let mut rng = RandomSource::seed_from_u64(9);
        let composite = CompositeHash::new(
            &factory,
            6,
            CompositeStrategy::Concatenation { bits: 1 },
            &mut rng,
        )
        .unwrap();

        let v = [0.2, -0.9, 1.4];
        let values = composite.values(&v).unwrap();
        let expected = values.iter().fold(0u64, |c, &b| (c << 1) | b as u64);
        assert_eq!(composite.code(&v).unwrap(), expected);
        assert!(composite.code(&v).unwrap() < 64);
    }

    #[test]
    fn zero_functions_is_rejected() {
        let factory = HashFunctionFactory::new(HashFamily::Sign, 3).unwrap();
        let mut rng = RandomSource::seed_from_u64(0);
        assert!(CompositeHash::new(&factory, 0, CompositeStrategy::Polynomial, &mut rng).is_err());
    }

    #[test]
    fn wrong_dimension_is_rejected() {
        let factory = HashFunctionFactory::new(HashFamily::Sign, 3).unwrap();
        let mut rng = RandomSource::seed_from_u64(0);
        let composite =
            CompositeHash::new(&factory, 2, CompositeStrategy::Polynomial, &mut rng).unwrap();
        assert_eq!(
            composite.code(&[1.0; 4]),
            Err(RetrieveError::InvalidDimension {
                expected: 3,
                actual: 4
            })
        );
    }
}
