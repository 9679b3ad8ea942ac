//! Multi-table LSH index with exact refinement.

use std::ops::Range;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use super::hash_table::HashTable;
use crate::distance::{DistanceFunction, DistanceMetric};
use crate::error::{Result, RetrieveError};
use crate::hash::{CompositeHash, CompositeStrategy, HashFamily, HashFunctionFactory};
use crate::random::RandomSource;
use crate::select::{select_k_pairs, select_min, Neighbor};
use crate::source::{FlatVectors, VectorSource};
use crate::PointId;

/// LSH parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LSHParams {
    /// Number of independent tables. More tables raise recall at the cost of
    /// memory and build time.
    pub num_tables: usize,

    /// Hash functions composed per table. More functions mean fewer false
    /// positives per table and fewer true matches, which more tables then
    /// have to win back.
    pub functions_per_table: usize,

    /// Family the per-table functions are drawn from.
    pub family: HashFamily,

    /// How a table folds its function outputs into a bucket key.
    pub composite: CompositeStrategy,

    /// Distance used to refine candidates.
    pub metric: DistanceMetric,
}

impl Default for LSHParams {
    fn default() -> Self {
        Self {
            num_tables: 8,
            functions_per_table: 4,
            family: HashFamily::default(),
            composite: CompositeStrategy::Polynomial,
            metric: DistanceMetric::L2,
        }
    }
}

impl LSHParams {
    pub fn validate(&self) -> Result<()> {
        if self.num_tables == 0 {
            return Err(RetrieveError::config("num_tables must be at least 1"));
        }
        if self.functions_per_table == 0 {
            return Err(RetrieveError::config(
                "functions_per_table must be at least 1",
            ));
        }
        self.family.validate()?;
        self.composite.validate(self.functions_per_table)
    }
}

/// Locality-sensitive hashing index.
///
/// A query is hashed into every table, the bucket contents are unioned, and
/// the union is ranked by exact distance. Reported distances are exact; only
/// recall is approximate.
///
/// Building is single-writer (`&mut self`); searching takes `&self` and
/// allocates its scratch per call, so any number of threads may search a
/// built index at once.
#[derive(Debug, Clone)]
pub struct LSHIndex<D = DistanceMetric> {
    dimension: usize,
    params: LSHParams,
    tables: Vec<HashTable>,
    vectors: FlatVectors,
    distance: D,
}

impl LSHIndex<DistanceMetric> {
    /// Create an index refining with `params.metric`.
    pub fn new(dimension: usize, params: LSHParams, rng: &mut RandomSource) -> Result<Self> {
        Self::with_distance(dimension, params, params.metric, rng)
    }
}

impl<D: DistanceFunction> LSHIndex<D> {
    /// Create an index refining with a caller-supplied distance function.
    ///
    /// Table `i` draws its functions from the `i`-th seed taken from `rng`,
    /// so an index with more tables extends, rather than replaces, one with
    /// fewer tables built from the same seed.
    pub fn with_distance(
        dimension: usize,
        params: LSHParams,
        distance: D,
        rng: &mut RandomSource,
    ) -> Result<Self> {
        params.validate()?;
        let factory = HashFunctionFactory::new(params.family, dimension)?;

        let tables = (0..params.num_tables)
            .map(|_| {
                let mut table_rng = rng.fork();
                CompositeHash::new(
                    &factory,
                    params.functions_per_table,
                    params.composite,
                    &mut table_rng,
                )
                .map(HashTable::new)
            })
            .collect::<Result<Vec<_>>>()?;

        tracing::debug!(
            dimension,
            num_tables = params.num_tables,
            functions_per_table = params.functions_per_table,
            family = ?params.family,
            "created lsh index"
        );

        Ok(Self {
            dimension,
            params,
            tables,
            vectors: FlatVectors::new(dimension)?,
            distance,
        })
    }

    /// Add a vector, returning its id.
    pub fn add(&mut self, vector: &[f32]) -> Result<PointId> {
        RetrieveError::check_dimension(self.dimension, vector.len())?;
        let id = self.next_id()?;
        for table in &mut self.tables {
            table.insert(id, vector)?;
        }
        self.vectors.push(vector)?;
        Ok(id)
    }

    /// Add every vector of `source`, returning the assigned id range.
    ///
    /// Ids follow source order. Tables are filled in parallel, then compacted
    /// once the batches since the last compaction match the compacted size.
    pub fn add_batch<S: VectorSource + ?Sized>(&mut self, source: &S) -> Result<Range<PointId>> {
        let start = self.vectors.len();
        let count = source.len();
        if start + count > PointId::MAX as usize {
            return Err(RetrieveError::config("point id space exhausted"));
        }
        for i in 0..count {
            RetrieveError::check_dimension(self.dimension, source.get(i).len())?;
        }
        for i in 0..count {
            self.vectors.push(source.get(i))?;
        }

        let vectors = &self.vectors;
        self.tables.par_iter_mut().try_for_each(|table| {
            for i in start..start + count {
                table.insert(i as PointId, vectors.get(i))?;
            }
            table.compact_if_fragmented();
            Ok::<(), RetrieveError>(())
        })?;

        tracing::debug!(
            added = count,
            total = self.vectors.len(),
            "inserted batch into lsh tables"
        );
        Ok(start as PointId..(start + count) as PointId)
    }

    /// Union of the buckets `query` falls into, sorted by id.
    pub fn candidates(&self, query: &[f32]) -> Result<Vec<PointId>> {
        RetrieveError::check_dimension(self.dimension, query.len())?;
        let mut ids = Vec::new();
        for table in &self.tables {
            ids.extend(table.bucket(query)?);
        }
        ids.sort_unstable();
        ids.dedup();
        Ok(ids)
    }

    /// Composite code of `query` in each table.
    pub fn bucket_ids(&self, query: &[f32]) -> Result<Vec<u64>> {
        self.tables.iter().map(|t| t.bucket_id(query)).collect()
    }

    /// Nearest candidate by exact distance, or `None` when no table collides.
    pub fn search_nn(&self, query: &[f32]) -> Result<Option<Neighbor>> {
        let candidates = self.candidates(query)?;
        tracing::trace!(candidates = candidates.len(), "lsh nn query");
        Ok(select_min(self.refine(query, &candidates)))
    }

    /// Up to `k` candidates by ascending exact distance.
    ///
    /// Fewer than `k` results is a normal outcome when the tables return a
    /// small candidate union.
    pub fn search_knn(&self, query: &[f32], k: usize) -> Result<Vec<Neighbor>> {
        let candidates = self.candidates(query)?;
        tracing::trace!(candidates = candidates.len(), k, "lsh knn query");
        let scored: Vec<Neighbor> = self.refine(query, &candidates).collect();
        Ok(select_k_pairs(scored, k))
    }

    /// [`LSHIndex::search_knn`] for every query in `queries`, in parallel.
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

    fn refine<'a>(
        &'a self,
        query: &'a [f32],
        candidates: &'a [PointId],
    ) -> impl Iterator<Item = Neighbor> + 'a {
        candidates.iter().map(move |&id| {
            let stored = self.vectors.get(id as usize);
            Neighbor::new(id, self.distance.distance(query, stored))
        })
    }

    fn next_id(&self) -> Result<PointId> {
        PointId::try_from(self.vectors.len())
            .ok()
            .filter(|&id| id < PointId::MAX)
            .ok_or_else(|| RetrieveError::config("point id space exhausted"))
    }

    /// Stored vector for `id`.
    pub fn get(&self, id: PointId) -> Option<&[f32]> {
        ((id as usize) < self.vectors.len()).then(|| self.vectors.get(id as usize))
    }

    /// Read-only view of every stored vector, indexed by id.
    pub fn vectors(&self) -> &FlatVectors {
        &self.vectors
    }

    pub fn tables(&self) -> &[HashTable] {
        &self.tables
    }

    pub fn table(&self, i: usize) -> Option<&HashTable> {
        self.tables.get(i)
    }

    pub fn num_tables(&self) -> usize {
        self.tables.len()
    }

    pub fn params(&self) -> &LSHParams {
        &self.params
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    pub fn len(&self) -> usize {
        self.vectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vectors.is_empty()
    }

    /// Approximate heap footprint in bytes.
    pub fn size_bytes(&self) -> usize {
        self.vectors.as_slice().len() * std::mem::size_of::<f32>()
            + self.tables.iter().map(HashTable::size_bytes).sum::<usize>()
    }
}
