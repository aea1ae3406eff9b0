//! Tsallis distribution statistic for characterizing turbulence in 2D scalar fields
//!
//! Each lag of a field is reduced to a standardized four-neighbour difference
//! field, histogrammed into a log-density, and fitted with a three-parameter
//! Tsallis curve. Fitted shape parameters of two fields are compared with a
//! normalized distance metric.

#![forbid(unsafe_code)]

/// Histogramming, fitting, per-field statistics and distances
pub mod analysis;
/// Lag-difference transforms of input fields
pub mod field;
/// Errors, configuration and result reporting
pub mod io;
/// Model, solver and goodness-of-fit utilities
pub mod math;

pub use analysis::distance::{Distance, TsallisDistance};
pub use analysis::fitting::{FitResult, TsallisFitter};
pub use analysis::histogram::{Distribution, HistogramReducer};
pub use analysis::statistic::TsallisStatistic;
pub use field::{DifferenceField, LagDifferenceField};
pub use io::configuration::TsallisConfig;
pub use io::error::{Result, TsallisError};
