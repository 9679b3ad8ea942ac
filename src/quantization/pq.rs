//! Product Quantization (PQ).
//!
//! A vector of dimension `D` is cut into `D / segment_width` contiguous
//! segments. Each segment has its own codebook of at most 256 centroids, and a
//! vector is stored as one signed byte per segment naming its nearest centroid.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::distance::DistanceMetric;
use crate::error::{Result, RetrieveError};
use crate::partitioning::kmeans::KMeans;
use crate::random::RandomSource;
use crate::source::VectorSource;

/// Largest codebook a one-byte code can address.
pub const MAX_CODEBOOK_SIZE: usize = 256;

/// Product quantizer parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PQParams {
    /// Ordinates per segment. Must divide the vector dimension.
    pub segment_width: usize,

    /// Centroids per segment codebook, `1..=256`.
    pub codebook_size: usize,

    /// Distance between sub-vectors, used for training, encoding and the
    /// distance tables.
    pub metric: DistanceMetric,

    /// Lloyd iterations per codebook.
    pub kmeans_iterations: usize,
}

impl Default for PQParams {
    fn default() -> Self {
        Self {
            segment_width: 8,
            codebook_size: MAX_CODEBOOK_SIZE,
            metric: DistanceMetric::SquaredL2,
            kmeans_iterations: 100,
        }
    }
}

impl PQParams {
    pub fn validate(&self) -> Result<()> {
        if self.segment_width == 0 {
            return Err(RetrieveError::config("segment_width must be at least 1"));
        }
        if self.codebook_size == 0 || self.codebook_size > MAX_CODEBOOK_SIZE {
            return Err(RetrieveError::config(format!(
                "codebook_size must be in 1..={MAX_CODEBOOK_SIZE}, got {}",
                self.codebook_size
            )));
        }
        if self.kmeans_iterations == 0 {
            return Err(RetrieveError::config("kmeans_iterations must be at least 1"));
        }
        Ok(())
    }
}

/// One segment's centroids, stored flat.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Codebook {
    centroids: Vec<f32>,
    width: usize,
}

impl Codebook {
    /// Builds a codebook from centroid rows of length `width`.
    pub fn from_rows<R: AsRef<[f32]>>(width: usize, rows: &[R]) -> Result<Self> {
        if rows.is_empty() || rows.len() > MAX_CODEBOOK_SIZE {
            return Err(RetrieveError::config(format!(
                "a codebook holds 1..={MAX_CODEBOOK_SIZE} centroids, got {}",
                rows.len()
            )));
        }
        let mut centroids = Vec::with_capacity(rows.len() * width);
        for row in rows {
            RetrieveError::check_dimension(width, row.as_ref().len())?;
            centroids.extend_from_slice(row.as_ref());
        }
        Ok(Self { centroids, width })
    }

    /// Number of centroids.
    pub fn len(&self) -> usize {
        self.centroids.len() / self.width
    }

    pub fn is_empty(&self) -> bool {
        self.centroids.is_empty()
    }

    pub fn width(&self) -> usize {
        self.width
    }

    #[inline]
    pub fn centroid(&self, j: usize) -> &[f32] {
        &self.centroids[j * self.width..(j + 1) * self.width]
    }

    pub fn iter(&self) -> impl ExactSizeIterator<Item = &[f32]> + '_ {
        self.centroids.chunks_exact(self.width)
    }

    /// Index of the nearest centroid; the lowest index wins ties.
    pub fn nearest(&self, sub: &[f32], metric: DistanceMetric) -> usize {
        let mut best = 0;
        let mut best_dist = f32::INFINITY;
        for (j, centroid) in self.iter().enumerate() {
            let dist = metric.compute(sub, centroid);
            if dist < best_dist {
                best_dist = dist;
                best = j;
            }
        }
        best
    }
}

/// Centroid index `j` is stored as the byte `j - 128`.
#[inline]
pub(crate) fn encode_index(j: usize) -> i8 {
    (j as i32 - 128) as i8
}

#[inline]
pub(crate) fn decode_index(byte: i8) -> usize {
    (i32::from(byte) + 128) as usize
}

/// A quantized vector: one byte per segment.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QuantizedCode(Vec<i8>);

impl QuantizedCode {
    pub(crate) fn from_bytes(bytes: Vec<i8>) -> Self {
        Self(bytes)
    }

    /// Builds a code from centroid indices.
    pub fn from_indices(indices: &[usize]) -> Result<Self> {
        indices
            .iter()
            .map(|&j| {
                if j < MAX_CODEBOOK_SIZE {
                    Ok(encode_index(j))
                } else {
                    Err(RetrieveError::config(format!("centroid index {j} out of range")))
                }
            })
            .collect::<Result<Vec<_>>>()
            .map(Self)
    }

    pub fn as_bytes(&self) -> &[i8] {
        &self.0
    }

    /// Number of segments.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn centroid_index(&self, segment: usize) -> usize {
        decode_index(self.0[segment])
    }

    pub fn centroid_indices(&self) -> impl ExactSizeIterator<Item = usize> + '_ {
        self.0.iter().map(|&b| decode_index(b))
    }
}

/// Per-query distances from each query segment to every centroid of that
/// segment's codebook.
///
/// Layout is flat, `segment * stride + centroid`, with `stride` the configured
/// codebook size. Slots past a short codebook hold `INFINITY` and are never
/// addressed by a valid code.
#[derive(Debug, Clone, PartialEq)]
pub struct AdcTable {
    distances: Vec<f32>,
    stride: usize,
}

impl AdcTable {
    #[inline]
    pub fn get(&self, segment: usize, centroid: usize) -> f32 {
        self.distances[segment * self.stride + centroid]
    }

    /// Approximate distance to a stored code: one lookup per segment.
    #[inline]
    pub fn distance(&self, code: &[i8]) -> f32 {
        code.iter()
            .enumerate()
            .map(|(segment, &byte)| self.distances[segment * self.stride + decode_index(byte)])
            .sum()
    }

    pub fn num_segments(&self) -> usize {
        self.distances.len() / self.stride
    }
}

/// Product quantizer.
///
/// Untrained after [`ProductQuantizer::new`]; [`ProductQuantizer::train`] or
/// [`ProductQuantizer::train_from_codebooks`] installs the codebooks, after
/// which the quantizer is read-only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductQuantizer {
    dimension: usize,
    params: PQParams,
    codebooks: Vec<Codebook>,
}

impl ProductQuantizer {
    pub fn new(dimension: usize, params: PQParams) -> Result<Self> {
        if dimension == 0 {
            return Err(RetrieveError::InvalidDimension {
                expected: 1,
                actual: 0,
            });
        }
        params.validate()?;
        if dimension % params.segment_width != 0 {
            return Err(RetrieveError::config(format!(
                "segment_width {} does not divide dimension {dimension}",
                params.segment_width
            )));
        }
        Ok(Self {
            dimension,
            params,
            codebooks: Vec::new(),
        })
    }

    /// Learns one codebook per segment by k-means over `samples`.
    ///
    /// Segment seeds are drawn from `rng` in segment order before the
    /// segments are trained in parallel.
    pub fn train<S: VectorSource + ?Sized>(
        &mut self,
        samples: &S,
        rng: &mut RandomSource,
    ) -> Result<()> {
        if samples.is_empty() {
            return Err(RetrieveError::config("cannot train on an empty sample"));
        }
        for i in 0..samples.len() {
            RetrieveError::check_dimension(self.dimension, samples.get(i).len())?;
        }

        let seeds: Vec<u64> = (0..self.num_segments()).map(|_| rng.next_seed()).collect();
        let codebooks = seeds
            .into_par_iter()
            .enumerate()
            .map(|(segment, seed)| self.train_segment(samples, segment, seed))
            .collect::<Result<Vec<_>>>()?;

        self.codebooks = codebooks;
        Ok(())
    }

    fn train_segment<S: VectorSource + ?Sized>(
        &self,
        samples: &S,
        segment: usize,
        seed: u64,
    ) -> Result<Codebook> {
        let width = self.params.segment_width;
        let range = self.segment_range(segment);

        let mut flat = Vec::with_capacity(samples.len() * width);
        for i in 0..samples.len() {
            flat.extend_from_slice(&samples.get(i)[range.clone()]);
        }

        let mut kmeans = KMeans::new(width, self.params.codebook_size)?
            .with_seed(seed)
            .with_metric(self.params.metric)
            .with_max_iterations(self.params.kmeans_iterations);
        kmeans.fit(&flat, samples.len())?;

        let codebook = Codebook::from_rows(width, kmeans.centroids())?;
        tracing::debug!(
            segment,
            centroids = codebook.len(),
            samples = samples.len(),
            "trained pq codebook"
        );
        Ok(codebook)
    }

    /// Installs externally provided codebooks, one list of centroids per
    /// segment.
    pub fn train_from_codebooks<R: AsRef<[f32]>>(&mut self, codebooks: &[Vec<R>]) -> Result<()> {
        if codebooks.len() != self.num_segments() {
            return Err(RetrieveError::config(format!(
                "expected {} codebooks, got {}",
                self.num_segments(),
                codebooks.len()
            )));
        }
        let codebooks = codebooks
            .iter()
            .map(|rows| {
                if rows.len() > self.params.codebook_size {
                    return Err(RetrieveError::config(format!(
                        "codebook of {} centroids exceeds codebook_size {}",
                        rows.len(),
                        self.params.codebook_size
                    )));
                }
                Codebook::from_rows(self.params.segment_width, rows)
            })
            .collect::<Result<Vec<_>>>()?;
        self.codebooks = codebooks;
        Ok(())
    }

    /// Nearest centroid per segment.
    pub fn quantize(&self, vector: &[f32]) -> Result<QuantizedCode> {
        let mut bytes = Vec::with_capacity(self.num_segments());
        self.quantize_into(vector, &mut bytes)?;
        Ok(QuantizedCode(bytes))
    }

    /// Appends the code of `vector` to `out`.
    pub(crate) fn quantize_into(&self, vector: &[f32], out: &mut Vec<i8>) -> Result<()> {
        self.check_trained()?;
        RetrieveError::check_dimension(self.dimension, vector.len())?;
        for (segment, codebook) in self.codebooks.iter().enumerate() {
            let sub = &vector[self.segment_range(segment)];
            out.push(encode_index(codebook.nearest(sub, self.params.metric)));
        }
        Ok(())
    }

    /// Reconstruction: the concatenated centroids named by `code`.
    pub fn decode(&self, code: &QuantizedCode) -> Result<Vec<f32>> {
        self.check_trained()?;
        if code.len() != self.num_segments() {
            return Err(RetrieveError::config(format!(
                "code has {} segments, quantizer has {}",
                code.len(),
                self.num_segments()
            )));
        }
        let mut out = Vec::with_capacity(self.dimension);
        for (codebook, j) in self.codebooks.iter().zip(code.centroid_indices()) {
            if j >= codebook.len() {
                return Err(RetrieveError::config(format!(
                    "centroid index {j} exceeds codebook of {}",
                    codebook.len()
                )));
            }
            out.extend_from_slice(codebook.centroid(j));
        }
        Ok(out)
    }

    /// Distances from each segment of `query` to that segment's centroids.
    pub fn segment_distances(&self, query: &[f32]) -> Result<AdcTable> {
        self.check_trained()?;
        RetrieveError::check_dimension(self.dimension, query.len())?;

        let stride = self.params.codebook_size;
        let mut distances = vec![f32::INFINITY; self.num_segments() * stride];
        for (segment, codebook) in self.codebooks.iter().enumerate() {
            let sub = &query[self.segment_range(segment)];
            let row = &mut distances[segment * stride..segment * stride + codebook.len()];
            for (slot, centroid) in row.iter_mut().zip(codebook.iter()) {
                *slot = self.params.metric.compute(sub, centroid);
            }
        }
        Ok(AdcTable { distances, stride })
    }

    /// Row-major `K x K` centroid-to-centroid distances for one segment.
    pub fn centroid_distance_table(&self, segment: usize) -> Result<Vec<f32>> {
        self.check_trained()?;
        let codebook = self.codebooks.get(segment).ok_or_else(|| {
            RetrieveError::config(format!("segment {segment} out of range"))
        })?;
        let mut table = Vec::with_capacity(codebook.len() * codebook.len());
        for a in codebook.iter() {
            for b in codebook.iter() {
                table.push(self.params.metric.compute(a, b));
            }
        }
        Ok(table)
    }

    pub(crate) fn check_trained(&self) -> Result<()> {
        if self.is_trained() {
            Ok(())
        } else {
            Err(RetrieveError::NotTrained)
        }
    }

    #[inline]
    fn segment_range(&self, segment: usize) -> std::ops::Range<usize> {
        let width = self.params.segment_width;
        segment * width..(segment + 1) * width
    }

    pub fn is_trained(&self) -> bool {
        !self.codebooks.is_empty()
    }

    pub fn num_segments(&self) -> usize {
        self.dimension / self.params.segment_width
    }

    pub fn segment_width(&self) -> usize {
        self.params.segment_width
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    pub fn metric(&self) -> DistanceMetric {
        self.params.metric
    }

    pub fn params(&self) -> &PQParams {
        &self.params
    }

    pub fn codebook(&self, segment: usize) -> Option<&Codebook> {
        self.codebooks.get(segment)
    }

    pub fn codebooks(&self) -> &[Codebook] {
        &self.codebooks
    }

    /// Approximate heap footprint of the codebooks in bytes.
    pub fn size_bytes(&self) -> usize {
        self.codebooks
            .iter()
            .map(|c| c.centroids.len() * std::mem::size_of::<f32>())
            .sum()
    }
}
