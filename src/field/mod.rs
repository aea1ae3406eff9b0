//! Field-level transforms applied before any histogramming

/// Standardized four-neighbour lag differences
pub mod difference;
/// Moments over the finite entries of a sample
pub mod moments;

pub use difference::{DifferenceField, LagDifferenceField};
