//! Clustering used to learn quantizer codebooks.

pub mod kmeans;

pub use kmeans::KMeans;
