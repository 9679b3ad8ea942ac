//! Error types for vicinal.

use thiserror::Error;

/// Errors that can occur while building or querying an index.
///
/// Empty candidate sets, short k-NN results and "nothing found" are not
/// errors; they are reported through `Option` and result lengths.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RetrieveError {
    /// A dimensionality of zero, or a vector whose length differs from the
    /// dimensionality the structure was built for.
    #[error("invalid dimension: expected {expected}, got {actual}")]
    InvalidDimension { expected: usize, actual: usize },

    /// Structurally invalid parameters (non-dividing segment width, codebook
    /// larger than the one-byte code domain, zero tables, ...).
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// Quantization was requested before the quantizer was trained.
    #[error("product quantizer has not been trained")]
    NotTrained,
}

impl RetrieveError {
    pub(crate) fn config(msg: impl Into<String>) -> Self {
        RetrieveError::InvalidConfiguration(msg.into())
    }

    /// Fails with [`RetrieveError::InvalidDimension`] unless `actual == expected`.
    #[inline]
    pub(crate) fn check_dimension(expected: usize, actual: usize) -> Result<()> {
        if expected == actual {
            Ok(())
        } else {
            Err(RetrieveError::InvalidDimension { expected, actual })
        }
    }
}

pub type Result<T> = std::result::Result<T, RetrieveError>;
