//! Mode-selected PQ index.

use std::ops::Range;

use serde::{Deserialize, Serialize};

use super::adc::ADCIndex;
use super::pq::{PQParams, ProductQuantizer, QuantizedCode};
use super::sdc::SDCIndex;
use crate::error::Result;
use crate::random::RandomSource;
use crate::select::Neighbor;
use crate::source::VectorSource;
use crate::PointId;

/// How query-to-code distances are computed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DistanceMode {
    /// Exact query against quantized points.
    #[default]
    Asymmetric,
    /// Quantized query against quantized points via centroid tables.
    Symmetric,
}

/// An [`ADCIndex`] or [`SDCIndex`], chosen by [`DistanceMode`].
#[derive(Debug, Clone)]
pub enum PQIndex {
    Asymmetric(ADCIndex),
    Symmetric(SDCIndex),
}

macro_rules! dispatch {
    ($self:expr, $index:ident => $body:expr) => {
        match $self {
            PQIndex::Asymmetric($index) => $body,
            PQIndex::Symmetric($index) => $body,
        }
    };
}

impl PQIndex {
    /// Wraps a trained quantizer.
    pub fn new(pq: ProductQuantizer, mode: DistanceMode) -> Result<Self> {
        Ok(match mode {
            DistanceMode::Asymmetric => Self::Asymmetric(ADCIndex::new(pq)?),
            DistanceMode::Symmetric => Self::Symmetric(SDCIndex::new(pq)?),
        })
    }

    /// Trains a quantizer on `samples`, then wraps it.
    pub fn train<S: VectorSource + ?Sized>(
        dimension: usize,
        params: PQParams,
        mode: DistanceMode,
        samples: &S,
        rng: &mut RandomSource,
    ) -> Result<Self> {
        let mut pq = ProductQuantizer::new(dimension, params)?;
        pq.train(samples, rng)?;
        Self::new(pq, mode)
    }

    pub fn mode(&self) -> DistanceMode {
        match self {
            Self::Asymmetric(_) => DistanceMode::Asymmetric,
            Self::Symmetric(_) => DistanceMode::Symmetric,
        }
    }

    pub fn add(&mut self, vector: &[f32]) -> Result<PointId> {
        dispatch!(self, index => index.add(vector))
    }

    pub fn add_batch<S: VectorSource + ?Sized>(&mut self, source: &S) -> Result<Range<PointId>> {
        dispatch!(self, index => index.add_batch(source))
    }

    pub fn compute_distances(&self, query: &[f32]) -> Result<Vec<f32>> {
        dispatch!(self, index => index.compute_distances(query))
    }

    pub fn search_nn(&self, query: &[f32]) -> Result<Option<Neighbor>> {
        dispatch!(self, index => index.search_nn(query))
    }

    pub fn search_knn(&self, query: &[f32], k: usize) -> Result<Vec<Neighbor>> {
        dispatch!(self, index => index.search_knn(query, k))
    }

    pub fn search_knn_batch<S: VectorSource + ?Sized>(
        &self,
        queries: &S,
        k: usize,
    ) -> Result<Vec<Vec<Neighbor>>> {
        dispatch!(self, index => index.search_knn_batch(queries, k))
    }

    pub fn code(&self, id: PointId) -> Option<QuantizedCode> {
        dispatch!(self, index => index.code(id))
    }

    pub fn quantizer(&self) -> &ProductQuantizer {
        dispatch!(self, index => index.quantizer())
    }

    pub fn dimension(&self) -> usize {
        dispatch!(self, index => index.dimension())
    }

    pub fn len(&self) -> usize {
        dispatch!(self, index => index.len())
    }

    pub fn is_empty(&self) -> bool {
        dispatch!(self, index => index.is_empty())
    }

    pub fn size_bytes(&self) -> usize {
        dispatch!(self, index => index.size_bytes())
    }
}
