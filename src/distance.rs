//! Distance functions for dense vectors.
//!
//! Every index in this crate is parameterised by a [`DistanceFunction`]. The
//! same function must be used to train quantizers and to refine or rank at
//! query time; mixing functions is not detected.
//!
//! ## Additivity
//!
//! ADC and SDC estimate a distance as the sum of per-segment distances. That
//! sum equals the full-vector distance only for metrics that decompose over
//! dimensions: [`DistanceMetric::SquaredL2`] and [`DistanceMetric::L1`]. The
//! other metrics still rank reasonably but are not exact under zero
//! quantization error.

use serde::{Deserialize, Serialize};

use crate::simd;

const NORM_EPSILON: f32 = 1e-9;

/// Dissimilarity between two vectors of equal length.
///
/// Implementations must be symmetric and non-negative. Any
/// `Fn(&[f32], &[f32]) -> f32` closure that is `Send + Sync` is a distance
/// function.
pub trait DistanceFunction: Send + Sync {
    fn distance(&self, a: &[f32], b: &[f32]) -> f32;
}

impl<F> DistanceFunction for F
where
    F: Fn(&[f32], &[f32]) -> f32 + Send + Sync,
{
    #[inline]
    fn distance(&self, a: &[f32], b: &[f32]) -> f32 {
        self(a, b)
    }
}

/// Built-in distance metrics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DistanceMetric {
    /// Squared Euclidean distance. Additive over segments.
    #[default]
    SquaredL2,
    /// Euclidean distance.
    L2,
    /// Manhattan distance. Additive over segments.
    L1,
    /// Cosine distance $1 - \cos(a,b)$.
    Cosine,
}

impl DistanceMetric {
    /// Compute distance between two vectors.
    ///
    /// If dimensions mismatch, this returns `f32::INFINITY` (so it is never selected as a
    /// nearest neighbor).
    #[inline]
    #[must_use]
    pub fn compute(self, a: &[f32], b: &[f32]) -> f32 {
        if a.len() != b.len() {
            return f32::INFINITY;
        }
        match self {
            DistanceMetric::SquaredL2 => simd::l2_distance_squared(a, b),
            DistanceMetric::L2 => simd::l2_distance(a, b),
            DistanceMetric::L1 => simd::l1_distance(a, b),
            DistanceMetric::Cosine => cosine_distance(a, b),
        }
    }

    /// Whether per-segment distances sum to the full-vector distance.
    #[must_use]
    pub fn is_additive(self) -> bool {
        matches!(self, DistanceMetric::SquaredL2 | DistanceMetric::L1)
    }
}

impl DistanceFunction for DistanceMetric {
    #[inline]
    fn distance(&self, a: &[f32], b: &[f32]) -> f32 {
        self.compute(a, b)
    }
}

/// Cosine distance $1 - \cos(a,b)$, clamped to `[0, 2]`.
///
/// Computes norms, so inputs need not be normalized. A zero vector is at
/// distance 1 from everything.
#[inline]
#[must_use]
pub fn cosine_distance(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return f32::INFINITY;
    }
    let (na, nb) = (simd::norm(a), simd::norm(b));
    if na <= NORM_EPSILON || nb <= NORM_EPSILON {
        return 1.0;
    }
    1.0 - (simd::dot(a, b) / (na * nb)).clamp(-1.0, 1.0)
}
