//! Symmetric distance computation (SDC).
//!
//! Both sides are quantized. Every centroid-to-centroid distance is computed
//! once when the index is built, so a query is one quantization followed by
//! pure table lookups. Cheaper per query than ADC, at the price of the query's
//! own quantization error.

use std::ops::Range;

use rayon::prelude::*;

use super::adc::ADCIndex;
use super::pq::{decode_index, ProductQuantizer, QuantizedCode};
use crate::error::Result;
use crate::select::{select_k_dense, select_min, Neighbor};
use crate::source::VectorSource;
use crate::PointId;

/// `K x K` distances between the centroids of one segment, row = query code.
#[derive(Debug, Clone, PartialEq)]
struct CentroidTable {
    k: usize,
    distances: Vec<f32>,
}

impl CentroidTable {
    #[inline]
    fn get(&self, query: usize, stored: usize) -> f32 {
        self.distances[query * self.k + stored]
    }
}

/// Flat store of PQ codes searched with symmetric distances.
#[derive(Debug, Clone)]
pub struct SDCIndex {
    inner: ADCIndex,
    tables: Vec<CentroidTable>,
}

impl SDCIndex {
    /// Wraps a trained quantizer and precomputes its centroid tables.
    pub fn new(pq: ProductQuantizer) -> Result<Self> {
        pq.check_trained()?;
        let tables = (0..pq.num_segments())
            .into_par_iter()
            .map(|segment| -> Result<CentroidTable> {
                let distances = pq.centroid_distance_table(segment)?;
                let k = pq.codebook(segment).map_or(0, |c| c.len());
                Ok(CentroidTable { k, distances })
            })
            .collect::<Result<Vec<_>>>()?;

        tracing::debug!(
            dimension = pq.dimension(),
            segments = tables.len(),
            entries = tables.iter().map(|t| t.distances.len()).sum::<usize>(),
            "precomputed sdc centroid tables"
        );
        Ok(Self {
            inner: ADCIndex::from_trained(pq),
            tables,
        })
    }

    pub fn add(&mut self, vector: &[f32]) -> Result<PointId> {
        self.inner.add(vector)
    }

    pub fn add_batch<S: VectorSource + ?Sized>(&mut self, source: &S) -> Result<Range<PointId>> {
        self.inner.add_batch(source)
    }

    /// Symmetric distance from `query` to every stored point, indexed by id.
    pub fn compute_distances(&self, query: &[f32]) -> Result<Vec<f32>> {
        let query_code = self.inner.quantizer().quantize(query)?;
        let query_code: Vec<usize> = query_code.centroid_indices().collect();
        Ok(self
            .inner
            .codes()
            .map(|stored| {
                stored
                    .iter()
                    .zip(&query_code)
                    .zip(&self.tables)
                    .map(|((&byte, &q), table)| table.get(q, decode_index(byte)))
                    .sum()
            })
            .collect())
    }

    pub fn search_nn(&self, query: &[f32]) -> Result<Option<Neighbor>> {
        let distances = self.compute_distances(query)?;
        tracing::trace!(scanned = distances.len(), "sdc nn query");
        Ok(select_min(
            distances
                .into_iter()
                .enumerate()
                .map(|(id, d)| Neighbor::new(id as PointId, d)),
        ))
    }

    pub fn search_knn(&self, query: &[f32], k: usize) -> Result<Vec<Neighbor>> {
        let distances = self.compute_distances(query)?;
        tracing::trace!(scanned = distances.len(), k, "sdc knn query");
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

    pub fn code(&self, id: PointId) -> Option<QuantizedCode> {
        self.inner.code(id)
    }

    pub fn quantizer(&self) -> &ProductQuantizer {
        self.inner.quantizer()
    }

    pub fn dimension(&self) -> usize {
        self.inner.dimension()
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    pub fn size_bytes(&self) -> usize {
        self.inner.size_bytes()
            + self
                .tables
                .iter()
                .map(|t| t.distances.capacity() * std::mem::size_of::<f32>())
                .sum::<usize>()
    }
}
