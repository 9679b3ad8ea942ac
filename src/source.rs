//! Vector sources: indexed, fixed-dimensionality collections of vectors.

use crate::error::{Result, RetrieveError};

/// An indexed collection of vectors that all share one dimensionality.
///
/// Indices are dense: `get(i)` is valid for every `i < len()`.
pub trait VectorSource: Sync {
    fn len(&self) -> usize;

    fn dimension(&self) -> usize;

    /// Vector at position `i`. Panics if `i >= len()`.
    fn get(&self, i: usize) -> &[f32];

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Row-major flat vector storage (SoA): vector `i` lives at
/// `data[i * dimension..(i + 1) * dimension]`.
#[derive(Debug, Clone, PartialEq)]
pub struct FlatVectors {
    data: Vec<f32>,
    dimension: usize,
}

impl FlatVectors {
    /// Empty storage for vectors of `dimension` ordinates.
    pub fn new(dimension: usize) -> Result<Self> {
        if dimension == 0 {
            return Err(RetrieveError::InvalidDimension {
                expected: 1,
                actual: 0,
            });
        }
        Ok(Self {
            data: Vec::new(),
            dimension,
        })
    }

    /// Copies `rows` into flat storage, rejecting ragged input.
    pub fn from_rows<R: AsRef<[f32]>>(rows: &[R]) -> Result<Self> {
        let dimension = rows.first().map_or(0, |r| r.as_ref().len());
        let mut flat = Self::new(dimension)?;
        flat.data.reserve(rows.len() * dimension);
        for row in rows {
            flat.push(row.as_ref())?;
        }
        Ok(flat)
    }

    /// Appends a vector and returns its position.
    pub fn push(&mut self, vector: &[f32]) -> Result<usize> {
        RetrieveError::check_dimension(self.dimension, vector.len())?;
        self.data.extend_from_slice(vector);
        Ok(self.len() - 1)
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.data
    }

    pub fn iter(&self) -> std::slice::ChunksExact<'_, f32> {
        self.data.chunks_exact(self.dimension)
    }
}

impl VectorSource for FlatVectors {
    #[inline]
    fn len(&self) -> usize {
        self.data.len() / self.dimension
    }

    #[inline]
    fn dimension(&self) -> usize {
        self.dimension
    }

    #[inline]
    fn get(&self, i: usize) -> &[f32] {
        let start = i * self.dimension;
        &self.data[start..start + self.dimension]
    }
}

/// Row slices. The dimensionality is taken from the first row; callers must
/// not mix lengths (indices validate each row as they consume it).
impl VectorSource for [Vec<f32>] {
    fn len(&self) -> usize {
        <[Vec<f32>]>::len(self)
    }

    fn dimension(&self) -> usize {
        self.first().map_or(0, Vec::len)
    }

    fn get(&self, i: usize) -> &[f32] {
        &self[i]
    }
}

impl VectorSource for Vec<Vec<f32>> {
    fn len(&self) -> usize {
        self.as_slice().len()
    }

    fn dimension(&self) -> usize {
        VectorSource::dimension(self.as_slice())
    }

    fn get(&self, i: usize) -> &[f32] {
        &self[i]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flat_vectors_round_trip_rows() {
        let rows: Vec<Vec<f32>> = vec![vec![1.0, 2.0], vec![3.0, 4.0], vec![5.0, 6.0]];
        let flat = FlatVectors::from_rows(&rows).unwrap();
        assert_eq!(VectorSource::len(&flat), 3);
        assert_eq!(flat.dimension(), 2);
        assert_eq!(flat.get(1), &[3.0, 4.0]);
        assert_eq!(flat.iter().count(), 3);
    }

    #[test]
    fn ragged_rows_are_rejected() {
        let rows: Vec<Vec<f32>> = vec![vec![1.0, 2.0], vec![3.0]];
        assert_eq!(
            FlatVectors::from_rows(&rows),
            Err(RetrieveError::InvalidDimension {
                expected: 2,
                actual: 1
            })
        );
    }

    #[test]
    fn zero_dimension_is_rejected() {
        assert!(FlatVectors::new(0).is_err());
        let empty: Vec<Vec<f32>> = Vec::new();
        assert!(FlatVectors::from_rows(&empty).is_err());
    }

    #[test]
    fn nested_vecs_are_sources() {
        let rows: Vec<Vec<f32>> = vec![vec![0.0; 3]; 4];
        assert_eq!(VectorSource::len(&rows), 4);
        assert_eq!(VectorSource::dimension(&rows), 3);
        assert!(!VectorSource::is_empty(&rows));
    }
}
