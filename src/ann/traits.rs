//! Unified trait for the nearest-neighbour indices.

use crate::error::Result;
use crate::select::Neighbor;
use crate::PointId;

/// Common surface of every index: insert vectors, ask for the nearest ones.
pub trait ANNIndex {
    /// Add a vector, returning its id.
    fn add(&mut self, vector: &[f32]) -> Result<PointId>;

    /// Up to `k` nearest stored vectors, ascending by distance.
    fn search(&self, query: &[f32], k: usize) -> Result<Vec<Neighbor>>;

    /// Nearest stored vector, if any.
    fn search_nn(&self, query: &[f32]) -> Result<Option<Neighbor>> {
        Ok(self.search(query, 1)?.into_iter().next())
    }

    /// Get index size in bytes (approximate).
    fn size_bytes(&self) -> usize;

    /// Get vector dimension.
    fn dimension(&self) -> usize;

    /// Get number of vectors.
    fn num_vectors(&self) -> usize;

    /// Short algorithm name for [`ANNStats`].
    fn algorithm(&self) -> &'static str;

    /// Get index statistics.
    fn stats(&self) -> ANNStats {
        ANNStats {
            num_vectors: self.num_vectors(),
            dimension: self.dimension(),
            size_bytes: self.size_bytes(),
            algorithm: self.algorithm().to_string(),
        }
    }
}

/// Statistics about an ANN index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ANNStats {
    pub num_vectors: usize,
    pub dimension: usize,
    pub size_bytes: usize,
    pub algorithm: String,
}

#[cfg(feature = "lsh")]
impl<D: crate::distance::DistanceFunction> ANNIndex for crate::lsh::LSHIndex<D> {
    fn add(&mut self, vector: &[f32]) -> Result<PointId> {
        self.add(vector)
    }

    fn search(&self, query: &[f32], k: usize) -> Result<Vec<Neighbor>> {
        self.search_knn(query, k)
    }

    fn search_nn(&self, query: &[f32]) -> Result<Option<Neighbor>> {
        self.search_nn(query)
    }

    fn size_bytes(&self) -> usize {
        self.size_bytes()
    }

    fn dimension(&self) -> usize {
        self.dimension()
    }

    fn num_vectors(&self) -> usize {
        self.len()
    }

    fn algorithm(&self) -> &'static str {
        "LSH"
    }
}

#[cfg(feature = "pq")]
mod pq_impls {
    use super::*;
    use crate::quantization::{ADCIndex, DistanceMode, PQIndex, SDCIndex};

    macro_rules! impl_ann_index {
        ($ty:ty, $name:expr) => {
            impl ANNIndex for $ty {
                fn add(&mut self, vector: &[f32]) -> Result<PointId> {
                    self.add(vector)
                }

                fn search(&self, query: &[f32], k: usize) -> Result<Vec<Neighbor>> {
                    self.search_knn(query, k)
                }

                fn search_nn(&self, query: &[f32]) -> Result<Option<Neighbor>> {
                    self.search_nn(query)
                }

                fn size_bytes(&self) -> usize {
                    self.size_bytes()
                }

                fn dimension(&self) -> usize {
                    self.dimension()
                }

                fn num_vectors(&self) -> usize {
                    self.len()
                }

                fn algorithm(&self) -> &'static str {
                    $name
                }
            }
        };
    }

    impl_ann_index!(ADCIndex, "PQ-ADC");
    impl_ann_index!(SDCIndex, "PQ-SDC");

    impl ANNIndex for PQIndex {
        fn add(&mut self, vector: &[f32]) -> Result<PointId> {
            self.add(vector)
        }

        fn search(&self, query: &[f32], k: usize) -> Result<Vec<Neighbor>> {
            self.search_knn(query, k)
        }

        fn search_nn(&self, query: &[f32]) -> Result<Option<Neighbor>> {
            self.search_nn(query)
        }

        fn size_bytes(&self) -> usize {
            self.size_bytes()
        }

        fn dimension(&self) -> usize {
            self.dimension()
        }

        fn num_vectors(&self) -> usize {
            self.len()
        }

        fn algorithm(&self) -> &'static str {
            match self.mode() {
                DistanceMode::Asymmetric => "PQ-ADC",
                DistanceMode::Symmetric => "PQ-SDC",
            }
        }
    }
}

#[cfg(all(test, feature = "lsh"))]
mod tests {
    use super::*;
    use crate::lsh::{LSHIndex, LSHParams};
    use crate::RandomSource;

    fn build(index: &mut dyn ANNIndex) {
        for i in 0..10 {
            index.add(&[i as f32, 0.0]).unwrap();
        }
    }

    #[test]
    fn lsh_behind_trait_object() {
        let mut rng = RandomSource::seed_from_u64(0);
        let mut index = LSHIndex::new(2, LSHParams::default(), &mut rng).unwrap();
        build(&mut index);

        let stats = index.stats();
        assert_eq!(stats.num_vectors, 10);
        assert_eq!(stats.dimension, 2);
        assert_eq!(stats.algorithm, "LSH");
        assert!(stats.size_bytes > 0);

        let nn = ANNIndex::search_nn(&index, &[3.0, 0.0]).unwrap().unwrap();
        assert_eq!(nn.id, 3);
    }
}
