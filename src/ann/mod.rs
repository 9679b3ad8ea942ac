//! Index-agnostic interface.
//!
//! Every index in the crate implements [`ANNIndex`], so callers can hold a
//! `Box<dyn ANNIndex>` and swap LSH for PQ without touching query code:
//!
//! ```rust
//! use vicinal::ann::ANNIndex;
//! use vicinal::lsh::{LSHIndex, LSHParams};
//! use vicinal::RandomSource;
//!
//! let mut rng = RandomSource::seed_from_u64(1);
//! let mut index: Box<dyn ANNIndex> =
//!     Box::new(LSHIndex::new(3, LSHParams::default(), &mut rng)?);
//! index.add(&[1.0, 0.0, 0.0])?;
//! assert_eq!(index.stats().num_vectors, 1);
//! # Ok::<(), vicinal::RetrieveError>(())
//! ```

pub mod traits;

pub use traits::{ANNIndex, ANNStats};
