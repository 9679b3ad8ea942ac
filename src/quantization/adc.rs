//! Asymmetric distance computation (ADC).
//!
//! Stored vectors are reduced to their codes; the query stays exact. Per query
//! the distance from each query segment to every centroid of that segment is
//! computed once ([`AdcTable`]), after which every stored code costs one table
//! lookup per segment.

use std::ops::Range;

use rayon::prelude::*;

use super::pq::{AdcTable, ProductQuantizer, QuantizedCode};
use crate::error::{Result, RetrieveError};
use crate::select::{select_k_dense, select_min, Neighbor};
use crate::source::VectorSource;
use crate::PointId;

/// Flat store of PQ codes searched with asymmetric distances.
#[derive(Debug, Clone)]
pub struct ADCIndex {
    pq: ProductQuantizer,
    /// `len * num_segments` bytes, code of point `i` at `i * num_segments`.
    codes: Vec<i8>,
}

impl ADCIndex {
    /// Wraps a trained quantizer.
    pub fn new(pq: ProductQuantizer) -> Result<Self> {
        pq.check_trained()?;
        tracing::debug!(
            dimension = pq.dimension(),
            segments = pq.num_segments(),
            "created adc index"
        );
        Ok(Self::from_trained(pq))
    }

    /// Empty code store over a quantizer the caller has checked is trained.
    pub(crate) fn from_trained(pq: ProductQuantizer) -> Self {
        Self {
            pq,
            codes: Vec::new(),
        }
    }

    /// Quantizes and stores `vector`, returning its id.
    pub fn add(&mut self, vector: &[f32]) -> Result<PointId> {
        let id = self.next_id(1)?;
        self.pq.quantize_into(vector, &mut self.codes)?;
        Ok(id)
    }

    /// Quantizes every vector of `source` in parallel and appends the codes in
    /// source order.
    pub fn add_batch<S: VectorSource + ?Sized>(&mut self, source: &S) -> Result<Range<PointId>> {
        let start = self.next_id(source.len())?;
        let codes = (0..source.len())
            .into_par_iter()
            .map(|i| self.pq.quantize(source.get(i)))
            .collect::<Result<Vec<QuantizedCode>>>()?;

        self.codes.reserve(codes.len() * self.pq.num_segments());
        for code in &codes {
            self.codes.extend_from_slice(code.as_bytes());
        }

        tracing::debug!(added = codes.len(), total = self.len(), "inserted batch into pq index");
        Ok(start..start + codes.len() as PointId)
    }

    /// Approximate distance from `query` to every stored point, indexed by id.
    pub fn compute_distances(&self, query: &[f32]) -> Result<Vec<f32>> {
        let table = self.pq.segment_distances(query)?;
        Ok(self.scan(&table))
    }

    fn scan(&self, table: &AdcTable) -> Vec<f32> {
        self.codes
            .chunks_exact(self.pq.num_segments())
            .map(|code| table.distance(code))
            .collect()
    }

    pub fn search_nn(&self, query: &[f32]) -> Result<Option<Neighbor>> {
        let distances = self.compute_distances(query)?;
        tracing::trace!(scanned = distances.len(), "adc nn query");
        Ok(select_min(
            distances
                .into_iter()
                .enumerate()
                .map(|(id, d)| Neighbor::new(id as PointId, d)),
        ))
    }

    /// The `k` nearest stored points by approximate distance.
    pub fn search_knn(&self, query: &[f32], k: usize) -> Result<Vec<Neighbor>> {
        let distances = self.compute_distances(query)?;
        tracing::trace!(scanned = distances.len(), k, "adc knn query");
        Ok(select_k_dense(distances, k))
    }

    pub fn search_knn_batch<S: VectorSource + ?Sized>(
        &self,
        queries: &S,
        k: usize,
    ) -> Result<Vec<Vec<Neighbor>>> {
        (0..queries.len())
            .into_par_iter()
            .map(|i| self.search_knn(queries.get(i), k))
            .collect()
    }

    /// Stored code of `id`.
    pub fn code(&self, id: PointId) -> Option<QuantizedCode> {
        self.code_bytes(id)
            .map(|bytes| QuantizedCode::from_bytes(bytes.to_vec()))
    }

    pub(crate) fn code_bytes(&self, id: PointId) -> Option<&[i8]> {
        let m = self.pq.num_segments();
        let start = id as usize * m;
        self.codes.get(start..start + m)
    }

    /// Every stored code, back to back.
    pub(crate) fn codes(&self) -> impl ExactSizeIterator<Item = &[i8]> + '_ {
        self.codes.chunks_exact(self.pq.num_segments())
    }

    fn next_id(&self, count: usize) -> Result<PointId> {
        let start = self.len();
        if start + count >= PointId::MAX as usize {
            return Err(RetrieveError::config("point id space exhausted"));
        }
        Ok(start as PointId)
    }

    pub fn quantizer(&self) -> &ProductQuantizer {
        &self.pq
    }

    pub fn dimension(&self) -> usize {
        self.pq.dimension()
    }

    pub fn len(&self) -> usize {
        self.codes.len() / self.pq.num_segments()
    }

    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }

    /// Approximate heap footprint in bytes.
    pub fn size_bytes(&self) -> usize {
        self.codes.capacity() + self.pq.size_bytes()
    }
}
