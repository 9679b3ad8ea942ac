//! Locality-sensitive hash functions.
//!
//! Traditional hash functions try to *minimize* collisions. LSH does the
//! opposite for similar items:
//!
//! - P[h(a) = h(b)] is high when a and b are close
//! - P[h(a) = h(b)] is low when a and b are far apart
//!
//! so a query only needs to be compared against the items it collides with.
//!
//! ## Families
//!
//! | Family | Distance | Output |
//! |--------|----------|--------|
//! | [`HashFamily::Gaussian`] | L2 | `floor((a·x + b) / w)` |
//! | [`HashFamily::Cauchy`] | L1 | `floor((a·x + b) / w)` |
//! | [`HashFamily::Sign`] | cosine | `a·x >= 0` |
//!
//! The p-stable families (Datar et al. 2004) rely on `a·(x - y)` being
//! distributed like `‖x - y‖_p · a₁`, so the chance of landing in the same
//! width-`w` interval falls off with the `p`-norm distance. The bucket width
//! trades selectivity for recall.
//!
//! ## Composites
//!
//! A single function is far too coarse, so a table keys its buckets on a
//! [`CompositeHash`] of `n` functions. See [`CompositeStrategy`] for how the
//! component outputs become one 64-bit code.
//!
//! ```rust
//! use vicinal::hash::{CompositeHash, CompositeStrategy, HashFamily, HashFunctionFactory};
//! use vicinal::RandomSource;
//!
//! let mut rng = RandomSource::seed_from_u64(42);
//! let factory = HashFunctionFactory::new(HashFamily::Gaussian { bucket_width: 4.0 }, 3)?;
//! let composite = CompositeHash::new(&factory, 4, CompositeStrategy::Polynomial, &mut rng)?;
//!
//! let a = composite.code(&[1.0, 2.0, 3.0])?;
//! let b = composite.code(&[1.0, 2.0, 3.0])?;
//! assert_eq!(a, b);
//! # Ok::<(), vicinal::RetrieveError>(())
//! ```
//!
//! ## References
//!
//! - Indyk & Motwani (1998). "Approximate nearest neighbors: towards removing
//!   the curse of dimensionality."
//! - Charikar (2002). "Similarity estimation techniques from rounding algorithms."
//! - Datar, Immorlica, Indyk, Mirrokni (2004). "Locality-sensitive hashing
//!   scheme based on p-stable distributions."

mod composite;
mod function;

pub use composite::{CompositeHash, CompositeStrategy, HashValues};
pub use function::{HashFamily, HashFunction, HashFunctionFactory, HyperplaneHash, ProjectionHash};
