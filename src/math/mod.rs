//! Mathematical utilities for model fitting

/// Pearson chi-square goodness of fit
pub mod goodness;
/// Damped nonlinear least squares
pub mod least_squares;
/// Log10-form Tsallis distribution
pub mod model;
