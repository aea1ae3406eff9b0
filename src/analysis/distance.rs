//! Distance between the Tsallis statistics of two fields
//!
//! The amplitude `log_a` is excluded: it tracks the number of samples in
//! the histogram rather than the shape of the distribution. Each lag
//! contributes the normalized squared differences of `w²` and `q`.

use crate::analysis::fitting::FitResult;
use crate::analysis::statistic::TsallisStatistic;
use crate::io::configuration::TsallisConfig;
use crate::io::error::{Result, TsallisError};
use crate::io::visualization::{NullReporter, Reporter};
use ndarray::{ArrayBase, Data, Ix2};
use num_traits::Float;

/// Handling of a distance term whose two compared values are both zero
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DegenerateTermPolicy {
    /// Fail with [`TsallisError::IndeterminateDistance`]
    #[default]
    Error,
    /// Treat the term as contributing nothing
    Zero,
}

/// One lag's contribution to the distance
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DistanceComponent {
    /// Lag compared (taken from the first statistic)
    pub lag: usize,
    /// `(w1 - w2)² / (w1² + w2²)`
    pub width: f64,
    /// `(q1 - q2)² / (q1² + q2²)`
    pub shape: f64,
}

impl DistanceComponent {
    /// Combined contribution of this lag
    pub fn total(&self) -> f64 {
        self.width + self.shape
    }
}

/// Scalar distance with its per-lag breakdown
#[derive(Debug, Clone, PartialEq)]
pub struct Distance {
    value: f64,
    components: Vec<DistanceComponent>,
}

impl Distance {
    /// Sum of all per-lag contributions
    pub const fn value(&self) -> f64 {
        self.value
    }

    /// Per-lag contributions in lag order
    pub fn components(&self) -> &[DistanceComponent] {
        &self.components
    }
}

/// Compares fitted Tsallis parameters between two statistics
#[derive(Debug, Clone, Copy)]
pub struct TsallisDistance {
    degenerate_terms: DegenerateTermPolicy,
    require_identical_lags: bool,
    verbose: bool,
}

impl TsallisDistance {
    /// Create a comparator with explicit policies
    pub const fn new(degenerate_terms: DegenerateTermPolicy, require_identical_lags: bool) -> Self {
        Self {
            degenerate_terms,
            require_identical_lags,
            verbose: false,
        }
    }

    /// Create a comparator from the distance-related fields of `config`
    pub const fn from_config(config: &TsallisConfig) -> Self {
        Self {
            degenerate_terms: config.degenerate_terms,
            require_identical_lags: config.require_identical_lags,
            verbose: config.verbose,
        }
    }

    /// Enable or disable reporter calls
    #[must_use]
    pub const fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Distance between two precomputed statistics
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The statistics cover different numbers of lags, or different lag
    ///   values when identical lags are required
    /// - Either statistic lacks a fit at some lag
    /// - A term is degenerate under [`DegenerateTermPolicy::Error`]
    pub fn compute(&self, first: &TsallisStatistic, second: &TsallisStatistic) -> Result<Distance> {
        self.compute_with_reporter(first, second, &mut NullReporter)
    }

    /// Distance between two statistics, reported when verbose
    ///
    /// # Errors
    ///
    /// Same as [`TsallisDistance::compute`]
    pub fn compute_with_reporter(
        &self,
        first: &TsallisStatistic,
        second: &TsallisStatistic,
        reporter: &mut dyn Reporter,
    ) -> Result<Distance> {
        self.check_alignment(first, second)?;

        let mut components = Vec::with_capacity(first.len());
        for (index, &lag) in first.lags().iter().enumerate() {
            let fit1 = first.fit(index)?;
            let fit2 = second.fit(index)?;
            components.push(self.compare_fits(lag, fit1, fit2)?);
        }

        let distance = Distance {
            value: components.iter().map(DistanceComponent::total).sum(),
            components,
        };

        if self.verbose {
            reporter.render_distance(&distance);
        }

        Ok(distance)
    }

    /// Compute both statistics from raw fields and compare them
    ///
    /// # Errors
    ///
    /// Returns an error if either statistic fails under the configured
    /// failure policy, or the comparison fails
    pub fn compare_fields<S1, S2, T>(
        &self,
        first: &ArrayBase<S1, Ix2>,
        second: &ArrayBase<S2, Ix2>,
        config: &TsallisConfig,
    ) -> Result<(TsallisStatistic, TsallisStatistic, Distance)>
    where
        S1: Data<Elem = T> + Sync,
        S2: Data<Elem = T> + Sync,
        T: Float + Send + Sync,
    {
        #[cfg(feature = "threading")]
        let (first, second) = rayon::join(
            || TsallisStatistic::compute(first, config),
            || TsallisStatistic::compute(second, config),
        );

        #[cfg(not(feature = "threading"))]
        let (first, second) = (
            TsallisStatistic::compute(first, config),
            TsallisStatistic::compute(second, config),
        );

        let (first, second) = (first?, second?);
        let distance = self.compute(&first, &second)?;
        Ok((first, second, distance))
    }

    /// Compare a raw field against a precomputed fiducial statistic
    ///
    /// Only the statistic of `field` is computed; the fiducial is reused as-is.
    ///
    /// # Errors
    ///
    /// Returns an error if the field's statistic fails under the configured
    /// failure policy, or the comparison fails
    pub fn compare_to_fiducial<S, T>(
        &self,
        fiducial: &TsallisStatistic,
        field: &ArrayBase<S, Ix2>,
        config: &TsallisConfig,
    ) -> Result<(TsallisStatistic, Distance)>
    where
        S: Data<Elem = T>,
        T: Float,
    {
        let statistic = TsallisStatistic::compute(field, config)?;
        let distance = self.compute(fiducial, &statistic)?;
        Ok((statistic, distance))
    }

    fn check_alignment(&self, first: &TsallisStatistic, second: &TsallisStatistic) -> Result<()> {
        let misaligned = first.len() != second.len()
            || (self.require_identical_lags && first.lags() != second.lags());
        if misaligned {
            return Err(TsallisError::LagMismatch {
                first: first.lags().to_vec(),
                second: second.lags().to_vec(),
            });
        }

        if first.num_bins() != second.num_bins() {
            log::warn!(
                "comparing statistics with different bin counts ({} vs {})",
                first.num_bins(),
                second.num_bins()
            );
        }
        Ok(())
    }

    /// Contribution of a single lag given the two fits at that lag
    ///
    /// # Errors
    ///
    /// Returns [`TsallisError::IndeterminateDistance`] if both compared values
    /// of a term are zero under [`DegenerateTermPolicy::Error`]
    pub fn compare_fits(&self, lag: usize, fit1: &FitResult, fit2: &FitResult) -> Result<DistanceComponent> {
        Ok(DistanceComponent {
            lag,
            width: self.term(lag, "width_squared", fit1.width_squared, fit2.width_squared)?,
            shape: self.term(lag, "shape", fit1.shape, fit2.shape)?,
        })
    }

    fn term(&self, lag: usize, parameter: &'static str, a: f64, b: f64) -> Result<f64> {
        // Normalized so that tiny parameters do not underflow when squared
        let scale = a.abs().max(b.abs());
        if scale != 0.0 {
            let (a, b) = (a / scale, b / scale);
            return Ok((a - b).powi(2) / a.mul_add(a, b * b));
        }

        match self.degenerate_terms {
            DegenerateTermPolicy::Error => {
                Err(TsallisError::IndeterminateDistance { lag, parameter })
            }
            DegenerateTermPolicy::Zero => Ok(0.0),
        }
    }
}
