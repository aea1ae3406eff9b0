//! Multi-lag Tsallis statistic for a single field
//!
//! Each lag runs the full pipeline independently: lag difference, histogram,
//! then fit. Results are stored in lag order regardless of how the lags
//! were scheduled.

use crate::analysis::fitting::{FitResult, TsallisFitter};
use crate::analysis::histogram::{Distribution, HistogramReducer};
use crate::field::{DifferenceField, LagDifferenceField};
use crate::io::configuration::TsallisConfig;
use crate::io::error::{Result, TsallisError, WithContext, invalid_parameter};
use crate::io::visualization::{NullReporter, Reporter};
use ndarray::{Array2, ArrayBase, ArrayView2, Data, Ix2};
use num_traits::Float;

/// How lag failures affect the statistic as a whole
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FailurePolicy {
    /// Keep every lag that succeeded and record the failures alongside
    #[default]
    Partial,
    /// Fail the whole statistic on the first failing lag, in lag order
    Strict,
}

/// Pipeline outputs for a single lag
#[derive(Debug, Clone, PartialEq)]
pub struct LagAnalysis {
    /// Lag analysed
    pub lag: usize,
    /// Standardized difference field
    pub difference: DifferenceField,
    /// Log-density histogram of the difference field
    pub distribution: Distribution,
    /// Tsallis fit, or the reason it failed
    pub fit: Result<FitResult>,
}

/// Tsallis statistic of one field over a set of lags
#[derive(Debug, Clone, PartialEq)]
pub struct TsallisStatistic {
    lags: Vec<usize>,
    num_bins: usize,
    analyses: Vec<Result<LagAnalysis>>,
}

impl TsallisStatistic {
    /// Compute the statistic without reporting
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid, or under
    /// [`FailurePolicy::Strict`] if any lag fails
    pub fn compute<S, T>(field: &ArrayBase<S, Ix2>, config: &TsallisConfig) -> Result<Self>
    where
        S: Data<Elem = T>,
        T: Float,
    {
        Self::compute_with_reporter(field, config, &mut NullReporter)
    }

    /// Compute the statistic, reporting each lag when `config.verbose` is set
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid, or under
    /// [`FailurePolicy::Strict`] if any lag fails
    pub fn compute_with_reporter<S, T>(
        field: &ArrayBase<S, Ix2>,
        config: &TsallisConfig,
        reporter: &mut dyn Reporter,
    ) -> Result<Self>
    where
        S: Data<Elem = T>,
        T: Float,
    {
        config.validate()?;

        let reducer = HistogramReducer::new(config.num_bins, config.count_policy)?;
        let fitter = TsallisFitter::new(config.clip).with_retry(config.retry_on_failure);
        let field: Array2<f64> = field.mapv(|v| v.to_f64().unwrap_or(f64::NAN));
        let view = field.view();

        #[cfg(feature = "threading")]
        let analyses: Vec<Result<LagAnalysis>> = {
            use rayon::prelude::*;
            config
                .lags
                .par_iter()
                .map(|&lag| Self::analyse_lag(view, lag, &reducer, &fitter))
                .collect()
        };

        #[cfg(not(feature = "threading"))]
        let analyses: Vec<Result<LagAnalysis>> = config
            .lags
            .iter()
            .map(|&lag| Self::analyse_lag(view, lag, &reducer, &fitter))
            .collect();

        let statistic = Self {
            lags: config.lags.clone(),
            num_bins: config.num_bins,
            analyses,
        };

        for failure in statistic.failures() {
            log::warn!("{failure}");
        }

        if config.failure_policy == FailurePolicy::Strict {
            if let Some(failure) = statistic.failures().into_iter().next() {
                return Err(failure.clone());
            }
        }

        if config.verbose {
            statistic.report(reporter);
        }

        Ok(statistic)
    }

    fn analyse_lag(
        field: ArrayView2<'_, f64>,
        lag: usize,
        reducer: &HistogramReducer,
        fitter: &TsallisFitter,
    ) -> Result<LagAnalysis> {
        let difference = LagDifferenceField::compute(&field, lag).with_lag(lag)?;
        let distribution = reducer.reduce(&difference).with_lag(lag)?;
        let fit = fitter.fit(&distribution).with_lag(lag);

        log::debug!(
            "lag {lag}: {} bins, fit {}",
            distribution.num_bins(),
            if fit.is_ok() { "converged" } else { "failed" }
        );

        Ok(LagAnalysis {
            lag,
            difference,
            distribution,
            fit,
        })
    }

    /// Pass every completed lag to `reporter`, in lag order
    pub fn report(&self, reporter: &mut dyn Reporter) {
        for analysis in self.analyses.iter().flatten() {
            reporter.render_difference(analysis.lag, &analysis.difference);
            reporter.render_distribution(
                analysis.lag,
                &analysis.distribution,
                analysis.fit.as_ref().ok(),
            );
        }
    }

    /// Lags in analysis order
    pub fn lags(&self) -> &[usize] {
        &self.lags
    }

    /// Bins per lag distribution
    pub const fn num_bins(&self) -> usize {
        self.num_bins
    }

    /// Number of lags
    pub const fn len(&self) -> usize {
        self.lags.len()
    }

    /// Whether the statistic covers no lags
    pub const fn is_empty(&self) -> bool {
        self.lags.is_empty()
    }

    /// Per-lag outcomes in lag order
    pub fn analyses(&self) -> &[Result<LagAnalysis>] {
        &self.analyses
    }

    /// Outcome for the lag at `index`
    pub fn analysis(&self, index: usize) -> Option<&Result<LagAnalysis>> {
        self.analyses.get(index)
    }

    /// Fit for the lag at `index`
    ///
    /// # Errors
    ///
    /// Returns the stored failure for that lag, or an invalid parameter error
    /// if `index` is out of range
    pub fn fit(&self, index: usize) -> Result<&FitResult> {
        match self.analyses.get(index) {
            Some(Ok(analysis)) => analysis.fit.as_ref().map_err(Clone::clone),
            Some(Err(error)) => Err(error.clone()),
            None => Err(invalid_parameter(
                "index",
                &index,
                &format!("statistic has {} lags", self.len()),
            )),
        }
    }

    /// Fits in lag order, `None` where a lag failed
    pub fn fits(&self) -> Vec<Option<&FitResult>> {
        (0..self.len()).map(|i| self.fit(i).ok()).collect()
    }

    /// Every per-lag failure, in lag order
    pub fn failures(&self) -> Vec<&TsallisError> {
        self.analyses
            .iter()
            .filter_map(|outcome| match outcome {
                Ok(analysis) => analysis.fit.as_ref().err(),
                Err(error) => Some(error),
            })
            .collect()
    }

    /// Whether every lag produced a fit
    pub fn is_complete(&self) -> bool {
        self.failures().is_empty()
    }

    /// `lags x 7` table of parameters, variances and chi-square
    ///
    /// Rows of failed lags are NaN.
    pub fn fit_table(&self) -> Array2<f64> {
        let mut table = Array2::from_elem((self.len(), 7), f64::NAN);
        for (mut row, fit) in table.rows_mut().into_iter().zip(self.fits()) {
            if let Some(fit) = fit {
                row.assign(&ndarray::aview1(&fit.to_array()));
            }
        }
        table
    }
}
