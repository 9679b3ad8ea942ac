//! vicinal: in-memory approximate nearest-neighbour search.
//!
//! Two families of index over fixed-dimensionality `f32` vectors:
//!
//! - `lsh/`: Locality-sensitive hashing. Several hash tables produce a
//!   candidate set that is refined with exact distances.
//! - `quantization/`: Product quantization. Vectors are stored as one byte
//!   per segment and searched by table lookup, either asymmetrically (exact
//!   query) or symmetrically (quantized query).
//!
//! Both end in the same top-k selection ([`select`]) and both implement
//! [`ANNIndex`].
//!
//! # Critical Nuances
//!
//! ## Randomness is explicit
//!
//! Hash functions and k-means initializations are drawn from a
//! [`RandomSource`] passed in by the caller. The same seed and the same
//! insertion order always produce the same index, including parallel builds.
//!
//! ## Build once, query many
//!
//! Construction takes `&mut self`; queries take `&self` and allocate their
//! own scratch. A built index can be shared across threads. There is no
//! delete and no codebook re-training; rebuild instead.
//!
//! ## When Exact Search Beats Approximate
//!
//! - Small datasets (< 10K vectors): Brute force is faster
//! - Very high recall requirements (> 99.9%): ANN overhead not worth it

pub mod ann;
pub mod distance;
pub mod error;
pub mod partitioning;
pub mod random;
pub mod select;
pub mod simd;
pub mod source;

// Hash-based methods
#[cfg(feature = "lsh")]
pub mod hash;
#[cfg(feature = "lsh")]
pub mod lsh;

#[cfg(feature = "pq")]
pub mod quantization;

/// Identifier of a stored vector: its insertion position.
pub type PointId = u32;

// Re-exports
pub use ann::{ANNIndex, ANNStats};
pub use distance::{DistanceFunction, DistanceMetric};
pub use error::{Result, RetrieveError};
pub use random::RandomSource;
pub use select::{select_k, Neighbor};
pub use source::{FlatVectors, VectorSource};

#[cfg(feature = "lsh")]
pub use lsh::{LSHIndex, LSHParams};

#[cfg(feature = "pq")]
pub use quantization::{ADCIndex, DistanceMode, PQIndex, PQParams, ProductQuantizer, SDCIndex};
