//! k-means clustering implementation.
//!
//! Used by the product quantizer to train one codebook per segment.
//!
//! Centroids are updated as arithmetic means, which is the exact Lloyd step
//! for squared L2; for other metrics it is the usual approximation.

use crate::distance::DistanceMetric;
use crate::error::{Result, RetrieveError};
use crate::random::RandomSource;

/// k-means clustering with k-means++ initialization.
pub struct KMeans {
    /// Centroids (at most k x dimension)
    centroids: Vec<Vec<f32>>,
    dimension: usize,
    k: usize,
    metric: DistanceMetric,
    max_iterations: usize,
    seed: u64,
}

impl KMeans {
    /// Create new k-means with k clusters.
    pub fn new(dimension: usize, k: usize) -> Result<Self> {
        if dimension == 0 {
            return Err(RetrieveError::InvalidDimension {
                expected: 1,
                actual: 0,
            });
        }
        if k == 0 {
            return Err(RetrieveError::config("k must be greater than 0"));
        }

        Ok(Self {
            centroids: Vec::new(),
            dimension,
            k,
            metric: DistanceMetric::SquaredL2,
            max_iterations: 100,
            seed: 0,
        })
    }

    /// Seed for k-means++ initialization.
    ///
    /// Repeated `fit(...)` calls on the same inputs with the same seed produce
    /// identical centroids.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    #[must_use]
    pub fn with_metric(mut self, metric: DistanceMetric) -> Self {
        self.metric = metric;
        self
    }

    #[must_use]
    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations.max(1);
        self
    }

    /// Train k-means on `num_vectors` row-major vectors.
    ///
    /// Produces at most `min(k, distinct inputs)` centroids: initialization
    /// stops early once every input coincides with a chosen centroid, so
    /// duplicate and zero-variance inputs yield a smaller, still valid set.
    pub fn fit(&mut self, vectors: &[f32], num_vectors: usize) -> Result<()> {
        if num_vectors == 0 {
            return Err(RetrieveError::config("k-means needs at least one vector"));
        }
        if vectors.len() < num_vectors * self.dimension {
            return Err(RetrieveError::InvalidDimension {
                expected: num_vectors * self.dimension,
                actual: vectors.len(),
            });
        }

        self.centroids = self.kmeans_plus_plus(vectors, num_vectors);
        if self.centroids.len() < self.k {
            tracing::warn!(
                requested = self.k,
                produced = self.centroids.len(),
                num_vectors,
                "fewer distinct training vectors than requested centroids"
            );
        }

        let mut assignments = self.assign_clusters(vectors, num_vectors);
        for iteration in 0..self.max_iterations {
            self.centroids = self.update_centroids(vectors, num_vectors, &assignments);
            let next = self.assign_clusters(vectors, num_vectors);
            if next == assignments {
                tracing::trace!(iteration, "k-means converged");
                break;
            }
            assignments = next;
        }

        Ok(())
    }

    /// k-means++ initialization.
    fn kmeans_plus_plus(&self, vectors: &[f32], num_vectors: usize) -> Vec<Vec<f32>> {
        let mut rng = RandomSource::seed_from_u64(self.seed);

        // First centroid: random vector
        let first_idx = rng.below(num_vectors);
        let mut centroids = vec![self.get_vector(vectors, first_idx).to_vec()];

        // Distance from every vector to its nearest chosen centroid.
        let mut nearest: Vec<f32> = (0..num_vectors)
            .map(|i| self.distance(self.get_vector(vectors, i), &centroids[0]))
            .collect();

        // Subsequent centroids: weighted by distance to nearest existing centroid
        while centroids.len() < self.k {
            let total: f64 = nearest.iter().map(|&d| f64::from(d)).sum();
            if total <= 0.0 || !total.is_finite() {
                break;
            }

            let threshold = rng.uniform() * total;
            let mut cumulative = 0.0;
            let mut chosen = None;
            for (i, &dist) in nearest.iter().enumerate() {
                if dist <= 0.0 {
                    continue;
                }
                cumulative += f64::from(dist);
                chosen = Some(i);
                if cumulative >= threshold {
                    break;
                }
            }
            let Some(idx) = chosen else { break };

            let centroid = self.get_vector(vectors, idx).to_vec();
            for (i, d) in nearest.iter_mut().enumerate() {
                *d = d.min(self.distance(self.get_vector(vectors, i), &centroid));
            }
            centroids.push(centroid);
        }

        centroids
    }

    /// Assign vectors to nearest clusters, ties going to the lowest index.
    pub fn assign_clusters(&self, vectors: &[f32], num_vectors: usize) -> Vec<usize> {
        (0..num_vectors)
            .map(|i| self.nearest(self.get_vector(vectors, i)).0)
            .collect()
    }

    /// Nearest centroid index and its distance.
    pub fn nearest(&self, vector: &[f32]) -> (usize, f32) {
        let mut best_cluster = 0;
        let mut best_dist = f32::INFINITY;
        for (cluster_idx, centroid) in self.centroids.iter().enumerate() {
            let dist = self.distance(vector, centroid);
            if dist < best_dist {
                best_dist = dist;
                best_cluster = cluster_idx;
            }
        }
        (best_cluster, best_dist)
    }

    /// Update centroids based on assignments.
    fn update_centroids(
        &self,
        vectors: &[f32],
        num_vectors: usize,
        assignments: &[usize],
    ) -> Vec<Vec<f32>> {
        let k = self.centroids.len();
        let mut cluster_sums = vec![vec![0.0f64; self.dimension]; k];
        let mut cluster_counts = vec![0usize; k];

        for (i, &cluster) in assignments.iter().enumerate().take(num_vectors) {
            cluster_counts[cluster] += 1;
            let vec = self.get_vector(vectors, i);
            for (sum, &val) in cluster_sums[cluster].iter_mut().zip(vec) {
                *sum += f64::from(val);
            }
        }

        cluster_sums
            .into_iter()
            .zip(cluster_counts)
            .zip(&self.centroids)
            .map(|((sums, count), old)| {
                if count > 0 {
                    sums.iter().map(|&s| (s / count as f64) as f32).collect()
                } else {
                    // Empty cluster: keep old centroid
                    old.clone()
                }
            })
            .collect()
    }

    #[inline]
    fn distance(&self, a: &[f32], b: &[f32]) -> f32 {
        self.metric.compute(a, b)
    }

    /// Get vector from SoA storage.
    fn get_vector<'a>(&self, vectors: &'a [f32], idx: usize) -> &'a [f32] {
        let start = idx * self.dimension;
        let end = start + self.dimension;
        &vectors[start..end]
    }

    /// Get centroids.
    pub fn centroids(&self) -> &[Vec<f32>] {
        &self.centroids
    }
}
