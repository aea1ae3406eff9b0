//! Analysis stages from difference field to distance

/// Distance metric between two statistics
pub mod distance;
/// Clipping and Tsallis curve fitting
pub mod fitting;
/// Normalized log-histograms of difference fields
pub mod histogram;
/// Multi-lag statistic of a single field
pub mod statistic;
