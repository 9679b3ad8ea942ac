//! Scalar locality-sensitive hash functions over dense vectors.

use serde::{Deserialize, Serialize};

use crate::error::{Result, RetrieveError};
use crate::random::RandomSource;
use crate::simd;

/// Which hash family a [`HashFunctionFactory`] draws from.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum HashFamily {
    /// p-stable hashing for L2: `floor((a·x + b) / w)` with `a ~ N(0, 1)^D`,
    /// `b ~ U[0, w)`.
    Gaussian { bucket_width: f32 },
    /// p-stable hashing for L1: as `Gaussian` but `a` is drawn from a
    /// standard Cauchy distribution.
    Cauchy { bucket_width: f32 },
    /// Random hyperplane hashing for cosine similarity: `1` if `a·x >= 0`,
    /// else `0`.
    Sign,
}

impl Default for HashFamily {
    fn default() -> Self {
        HashFamily::Gaussian { bucket_width: 4.0 }
    }
}

impl HashFamily {
    pub fn validate(&self) -> Result<()> {
        match *self {
            HashFamily::Gaussian { bucket_width } | HashFamily::Cauchy { bucket_width } => {
                if bucket_width.is_finite() && bucket_width > 0.0 {
                    Ok(())
                } else {
                    Err(RetrieveError::config(format!(
                        "bucket_width must be finite and positive, got {bucket_width}"
                    )))
                }
            }
            HashFamily::Sign => Ok(()),
        }
    }
}

/// Quantized random projection `floor((a·x + b) / w)`.
#[derive(Debug, Clone, PartialEq)]
pub struct ProjectionHash {
    direction: Vec<f32>,
    offset: f64,
    width: f64,
}

impl ProjectionHash {
    #[inline]
    fn hash(&self, vector: &[f32]) -> i32 {
        let projected = simd::dot(&self.direction, vector) as f64;
        // `as` saturates, so far-out projections land in the extreme buckets.
        ((projected + self.offset) / self.width).floor() as i32
    }
}

/// Random hyperplane through the origin.
#[derive(Debug, Clone, PartialEq)]
pub struct HyperplaneHash {
    normal: Vec<f32>,
}

impl HyperplaneHash {
    #[inline]
    fn hash(&self, vector: &[f32]) -> i32 {
        i32::from(simd::dot(&self.normal, vector) >= 0.0)
    }
}

/// A deterministic mapping from a vector to an integer, immutable once drawn.
#[derive(Debug, Clone, PartialEq)]
pub enum HashFunction {
    Gaussian(ProjectionHash),
    Cauchy(ProjectionHash),
    Sign(HyperplaneHash),
}

impl HashFunction {
    /// Hashes `vector`, checking its dimensionality.
    pub fn hash(&self, vector: &[f32]) -> Result<i32> {
        RetrieveError::check_dimension(self.dimension(), vector.len())?;
        Ok(self.hash_unchecked(vector))
    }

    /// Hashes a vector whose length the caller already validated.
    #[inline]
    pub(crate) fn hash_unchecked(&self, vector: &[f32]) -> i32 {
        match self {
            HashFunction::Gaussian(p) | HashFunction::Cauchy(p) => p.hash(vector),
            HashFunction::Sign(h) => h.hash(vector),
        }
    }

    pub fn dimension(&self) -> usize {
        match self {
            HashFunction::Gaussian(p) | HashFunction::Cauchy(p) => p.direction.len(),
            HashFunction::Sign(h) => h.normal.len(),
        }
    }

    pub fn family(&self) -> HashFamily {
        match self {
            HashFunction::Gaussian(p) => HashFamily::Gaussian {
                bucket_width: p.width as f32,
            },
            HashFunction::Cauchy(p) => HashFamily::Cauchy {
                bucket_width: p.width as f32,
            },
            HashFunction::Sign(_) => HashFamily::Sign,
        }
    }
}

/// Draws independent [`HashFunction`]s of one family and dimensionality.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HashFunctionFactory {
    family: HashFamily,
    dimension: usize,
}

impl HashFunctionFactory {
    pub fn new(family: HashFamily, dimension: usize) -> Result<Self> {
        if dimension == 0 {
            return Err(RetrieveError::InvalidDimension {
                expected: 1,
                actual: 0,
            });
        }
        family.validate()?;
        Ok(Self { family, dimension })
    }

    pub fn family(&self) -> HashFamily {
        self.family
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    /// Draws one function. The same random state always yields the same function.
    pub fn create(&self, rng: &mut RandomSource) -> HashFunction {
        match self.family {
            HashFamily::Gaussian { bucket_width } => {
                let direction = (0..self.dimension).map(|_| rng.gaussian() as f32).collect();
                HashFunction::Gaussian(projection(direction, bucket_width, rng))
            }
            HashFamily::Cauchy { bucket_width } => {
                let direction = (0..self.dimension).map(|_| rng.cauchy() as f32).collect();
                HashFunction::Cauchy(projection(direction, bucket_width, rng))
            }
            HashFamily::Sign => HashFunction::Sign(HyperplaneHash {
                normal: (0..self.dimension).map(|_| rng.gaussian() as f32).collect(),
            }),
        }
    }

    /// Draws `n` independent functions.
    pub fn create_many(&self, n: usize, rng: &mut RandomSource) -> Vec<HashFunction> {
        (0..n).map(|_| self.create(rng)).collect()
    }
}

fn projection(direction: Vec<f32>, bucket_width: f32, rng: &mut RandomSource) -> ProjectionHash {
    let width = f64::from(bucket_width);
    ProjectionHash {
        direction,
        offset: rng.uniform() * width,
        width,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gaussian(width: f32) -> HashFamily {
        HashFamily::Gaussian {
            bucket_width: width,
        }
    }

    #[test]
    fn same_seed_same_function() {
        let factory = HashFunctionFactory::new(gaussian(1.0), 8).unwrap();
        let f1 = factory.create(&mut RandomSource::seed_from_u64(5));
        let f2 = factory.create(&mut RandomSource::seed_from_u64(5));
        assert_eq!(f1, f2);

        let v = [0.3, -1.2, 4.0, 0.0, 2.2, -0.7, 1.1, 9.0];
        assert_eq!(f1.hash(&v).unwrap(), f2.hash(&v).unwrap());
    }

    #[test]
    fn zero_dimension_is_rejected() {
        assert_eq!(
            HashFunctionFactory::new(HashFamily::Sign, 0),
            Err(RetrieveError::InvalidDimension {
                expected: 1,
                actual: 0
            })
        );
    }

    #[test]
    fn mismatched_vector_is_rejected() {
        let factory = HashFunctionFactory::new(HashFamily::Sign, 3).unwrap();
        let f = factory.create(&mut RandomSource::seed_from_u64(1));
        assert_eq!(
            f.hash(&[1.0, 2.0]),
            Err(RetrieveError::InvalidDimension {
                expected: 3,
                actual: 2
            })
        );
    }

    #[test]
    fn bad_bucket_width_is_rejected() {
        for width in [0.0, -1.0, f32::NAN, f32::INFINITY] {
            assert!(matches!(
                HashFunctionFactory::new(gaussian(width), 4),
                Err(RetrieveError::InvalidConfiguration(_))
            ));
        }
    }

    #[test]
    fn sign_hash_is_binary_and_antipodal() {
        let factory = HashFunctionFactory::new(HashFamily::Sign, 4).unwrap();
        let mut rng = RandomSource::seed_from_u64(11);
        for f in factory.create_many(16, &mut rng) {
            let v = [0.5, -0.25, 1.0, 2.0];
            let neg = [-0.5, 0.25, -1.0, -2.0];
            let a = f.hash(&v).unwrap();
            let b = f.hash(&neg).unwrap();
            assert!(a == 0 || a == 1);
            // Opposite vectors fall on opposite sides unless they lie on the plane.
            assert_ne!(a, b);
        }
    }

    #[test]
    fn nearby_points_usually_share_gaussian_buckets() {
        let factory = HashFunctionFactory::new(gaussian(4.0), 16).unwrap();
        let mut rng = RandomSource::seed_from_u64(21);
        let functions = factory.create_many(200, &mut rng);

        let a = vec![1.0f32; 16];
        let mut near = a.clone();
        near[0] += 0.05;
        let far = vec![-20.0f32; 16];

        let agree = |b: &[f32]| {
            functions
                .iter()
                .filter(|f| f.hash(&a).unwrap() == f.hash(b).unwrap())
                .count()
        };
        assert!(agree(&near) > 180);
        assert!(agree(&far) < 60);
    }

    #[test]
    fn family_is_recoverable_from_function() {
        let factory = HashFunctionFactory::new(HashFamily::Cauchy { bucket_width: 2.5 }, 2).unwrap();
        let f = factory.create(&mut RandomSource::seed_from_u64(0));
        assert_eq!(f.family(), HashFamily::Cauchy { bucket_width: 2.5 });
        assert_eq!(f.dimension(), 2);
    }

    #[test]
    fn family_deserializes_from_tagged_json() {
        let family: HashFamily =
            serde_json::from_str(r#"{"kind":"gaussian","bucket_width":2.0}"#).unwrap();
        assert_eq!(family, gaussian(2.0));
        let sign: HashFamily = serde_json::from_str(r#"{"kind":"sign"}"#).unwrap();
        assert_eq!(sign, HashFamily::Sign);
    }
}
