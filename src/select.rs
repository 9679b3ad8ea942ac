//! Top-k selection over (id, distance) candidates.
//!
//! Every query path ends here: LSH after refining its candidate union, ADC and
//! SDC after scoring the whole corpus. The selection is a quickselect
//! (`select_nth_unstable_by`) that partitions the k smallest to the front,
//! followed by a sort of just those k, so the cost is O(n + k log k) rather
//! than O(n log n).
//!
//! Ordering is by distance ascending, then by id ascending. Distances compare
//! with `total_cmp`, so NaN sorts after every finite distance instead of
//! poisoning the comparison.

use std::cmp::Ordering;

use crate::error::{Result, RetrieveError};
use crate::PointId;

/// A search result: a stored point and its distance to the query.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Neighbor {
    pub id: PointId,
    pub distance: f32,
}

impl Neighbor {
    #[inline]
    pub fn new(id: PointId, distance: f32) -> Self {
        Self { id, distance }
    }

    /// Distance ascending, ties broken by ascending id.
    #[inline]
    pub fn ranking(&self, other: &Self) -> Ordering {
        self.distance
            .total_cmp(&other.distance)
            .then_with(|| self.id.cmp(&other.id))
    }
}

/// Returns the `k` smallest pairs from parallel `ids` / `distances` slices.
///
/// `k` larger than the input is clamped; the inputs are left untouched.
pub fn select_k(ids: &[PointId], distances: &[f32], k: usize) -> Result<Vec<Neighbor>> {
    if ids.len() != distances.len() {
        return Err(RetrieveError::config(format!(
            "ids ({}) and distances ({}) differ in length",
            ids.len(),
            distances.len()
        )));
    }
    let pairs = ids
        .iter()
        .zip(distances)
        .map(|(&id, &distance)| Neighbor::new(id, distance))
        .collect();
    Ok(select_k_pairs(pairs, k))
}

/// Selects the `k` best of an owned candidate buffer, reusing its allocation.
pub fn select_k_pairs(mut candidates: Vec<Neighbor>, k: usize) -> Vec<Neighbor> {
    let k = k.min(candidates.len());
    if k == 0 {
        candidates.clear();
        return candidates;
    }
    if k < candidates.len() {
        candidates.select_nth_unstable_by(k - 1, Neighbor::ranking);
        candidates.truncate(k);
    }
    candidates.sort_unstable_by(Neighbor::ranking);
    candidates
}

/// Scores `0..distances.len()` as point ids and selects the best `k`.
///
/// This is the full-corpus path used by the quantized indices.
#[cfg_attr(not(feature = "pq"), allow(dead_code))]
pub(crate) fn select_k_dense(distances: Vec<f32>, k: usize) -> Vec<Neighbor> {
    let candidates = distances
        .into_iter()
        .enumerate()
        .map(|(id, distance)| Neighbor::new(id as PointId, distance))
        .collect();
    select_k_pairs(candidates, k)
}

/// Arg-min with ties broken by smallest id. `None` for empty input.
#[cfg_attr(not(any(feature = "lsh", feature = "pq")), allow(dead_code))]
pub(crate) fn select_min(candidates: impl IntoIterator<Item = Neighbor>) -> Option<Neighbor> {
    candidates.into_iter().min_by(Neighbor::ranking)
}
