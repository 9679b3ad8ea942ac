//! Product quantization with asymmetric and symmetric distance computation.
//!
//! # The Problem: Memory at Scale
//!
//! ```text
//! 1M vectors × 128 dims × 4 bytes = 512 MB
//! 1M vectors × 16 segments × 1 byte = 16 MB
//! ```
//!
//! A [`ProductQuantizer`] splits each vector into equal-width segments and
//! learns a codebook of up to 256 centroids per segment with k-means. A vector
//! is then stored as one byte per segment.
//!
//! ## Distance Computation
//!
//! **Asymmetric** ([`ADCIndex`]): query is exact, database is quantized
//! ```text
//! d(q, x) ≈ Σ_s d(q_s, c_s[code_s(x)])
//! ```
//!
//! **Symmetric** ([`SDCIndex`]): both quantized (faster but less accurate)
//! ```text
//! d(q, x) ≈ Σ_s d(c_s[code_s(q)], c_s[code_s(x)])
//! ```
//!
//! For additive metrics (squared L2, L1) the sum is exact whenever the
//! quantization error is zero, and the two modes then agree.
//!
//! ## Usage
//!
//! ```rust
//! use vicinal::quantization::{DistanceMode, PQIndex, PQParams};
//! use vicinal::RandomSource;
//!
//! let data: Vec<Vec<f32>> = (0..32).map(|i| vec![i as f32; 4]).collect();
//! let params = PQParams { segment_width: 2, codebook_size: 8, ..PQParams::default() };
//!
//! let mut rng = RandomSource::seed_from_u64(0);
//! let mut index = PQIndex::train(4, params, DistanceMode::Asymmetric, &data, &mut rng)?;
//! index.add_batch(&data)?;
//!
//! let top = index.search_knn(&[3.0; 4], 3)?;
//! assert_eq!(top.len(), 3);
//! # Ok::<(), vicinal::RetrieveError>(())
//! ```
//!
//! ## References
//!
//! - Jégou, Douze, Schmid (2011). "Product Quantization for Nearest Neighbor
//!   Search."

pub mod adc;
mod index;
pub mod pq;
pub mod sdc;

pub use adc::ADCIndex;
pub use index::{DistanceMode, PQIndex};
pub use pq::{AdcTable, Codebook, PQParams, ProductQuantizer, QuantizedCode, MAX_CODEBOOK_SIZE};
pub use sdc::SDCIndex;
