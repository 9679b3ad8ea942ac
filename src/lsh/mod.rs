//! LSH (Locality Sensitive Hashing) nearest-neighbour search.
//!
//! - Several independent [`HashTable`]s, each keyed on a composite of random
//!   hash functions
//! - Candidate generation by unioning the query's bucket in every table
//! - Exact verification of the candidates with the index's distance function
//!
//! ## Tables vs. functions
//!
//! With per-function collision probability `p` for a given pair, a table of
//! `n` functions collides with probability `p^n` and at least one of `T`
//! tables with `1 - (1 - p^n)^T`. Raising `n` removes false positives; raising
//! `T` wins recall back.
//!
//! ```rust
//! use vicinal::lsh::{LSHIndex, LSHParams};
//! use vicinal::RandomSource;
//!
//! let mut rng = RandomSource::seed_from_u64(7);
//! let mut index = LSHIndex::new(2, LSHParams::default(), &mut rng)?;
//! index.add(&[0.0, 0.0])?;
//! index.add(&[10.0, 10.0])?;
//!
//! let nn = index.search_nn(&[0.0, 0.0])?.expect("a stored vector collides with itself");
//! assert_eq!(nn.id, 0);
//! # Ok::<(), vicinal::RetrieveError>(())
//! ```
//!
//! # References
//!
//! - Indyk & Motwani (1998): "Approximate nearest neighbors: towards removing
//!   the curse of dimensionality"
//! - Gionis, Indyk & Motwani (1999): "Similarity search in high dimensions via
//!   hashing"

mod hash_table;
pub mod search;

pub use hash_table::{Bucket, HashTable};
pub use search::{LSHIndex, LSHParams};
