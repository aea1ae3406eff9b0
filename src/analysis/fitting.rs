//! Tsallis fits to clipped log-density distributions

use crate::analysis::histogram::Distribution;
use crate::io::configuration::{
    CLIP_HALF_WIDTH, EVALUATIONS_PER_BIN, FIT_PARAMETER_COUNT, INITIAL_SHAPE,
    INITIAL_WIDTH_SQUARED, RETRY_SHAPE_OFFSET, RETRY_WIDTH_FACTOR,
};
use crate::io::error::{Result, TsallisError, degenerate_input};
use crate::math::goodness::{chi_square, degrees_of_freedom};
use crate::math::least_squares::LevenbergMarquardt;
use crate::math::model::{TsallisModel, TsallisParameters};
use bitvec::prelude::*;

/// Range of bin centres retained for fitting
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ClipWindow {
    /// Keep centres with `-half_width <= x <= half_width`
    Symmetric {
        /// Half-width of the window
        half_width: f64,
    },
    /// Keep every non-NaN centre
    ///
    /// Reproduces the historical predicate `x < 2 || x > -2`, which holds for
    /// every real number.
    PassThrough,
}

impl Default for ClipWindow {
    fn default() -> Self {
        Self::Symmetric {
            half_width: CLIP_HALF_WIDTH,
        }
    }
}

impl ClipWindow {
    /// Whether a bin centre falls inside the window
    pub fn contains(&self, x: f64) -> bool {
        match *self {
            Self::Symmetric { half_width } => (-half_width..=half_width).contains(&x),
            Self::PassThrough => x < CLIP_HALF_WIDTH || x > -CLIP_HALF_WIDTH,
        }
    }

    /// Membership mask over a sequence of bin centres
    pub fn mask(&self, centres: &[f64]) -> BitVec {
        centres.iter().map(|&x| self.contains(x)).collect()
    }
}

/// Points retained for fitting, in ascending `x` order
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ClippedSamples {
    /// Retained bin centres
    pub x: Vec<f64>,
    /// Log-densities at the retained centres, all finite
    pub y: Vec<f64>,
}

impl ClippedSamples {
    /// Number of retained points
    pub const fn len(&self) -> usize {
        self.x.len()
    }

    /// Whether no point was retained
    pub const fn is_empty(&self) -> bool {
        self.x.is_empty()
    }
}

/// Fitted Tsallis parameters, their variances and the chi-square of the fit
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FitResult {
    /// Fitted log-amplitude `log_a`
    pub log_amplitude: f64,
    /// Fitted scale `w²`
    pub width_squared: f64,
    /// Fitted shape `q`
    pub shape: f64,
    /// Variance of `log_a`
    pub log_amplitude_variance: f64,
    /// Variance of `w²`
    pub width_squared_variance: f64,
    /// Variance of `q`
    pub shape_variance: f64,
    /// Chi-square of the fit compared in density space
    pub chi_square: f64,
}

impl FitResult {
    /// Fitted parameters
    pub const fn parameters(&self) -> TsallisParameters {
        TsallisParameters {
            log_amplitude: self.log_amplitude,
            width_squared: self.width_squared,
            shape: self.shape,
        }
    }

    /// Evaluate the fitted curve at `x`
    pub fn evaluate(&self, x: f64) -> f64 {
        self.parameters().evaluate(x)
    }

    /// The seven values as parameters, variances, chi-square
    pub const fn to_array(&self) -> [f64; 7] {
        [
            self.log_amplitude,
            self.width_squared,
            self.shape,
            self.log_amplitude_variance,
            self.width_squared_variance,
            self.shape_variance,
            self.chi_square,
        ]
    }

    /// Chi-square degrees of freedom for a fit over `points` clipped points
    pub const fn degrees_of_freedom(points: usize) -> usize {
        degrees_of_freedom(points, FIT_PARAMETER_COUNT)
    }
}

/// Fits the Tsallis model to a distribution's clipped, finite points
#[derive(Debug, Clone, Copy)]
pub struct TsallisFitter {
    clip: ClipWindow,
    evaluations_per_bin: usize,
    retry_on_failure: bool,
}

impl Default for TsallisFitter {
    fn default() -> Self {
        Self::new(ClipWindow::default())
    }
}

impl TsallisFitter {
    /// Create a fitter using `clip` to select points
    pub const fn new(clip: ClipWindow) -> Self {
        Self {
            clip,
            evaluations_per_bin: EVALUATIONS_PER_BIN,
            retry_on_failure: false,
        }
    }

    /// Retry once from a perturbed initial guess after a convergence failure
    #[must_use]
    pub const fn with_retry(mut self, retry_on_failure: bool) -> Self {
        self.retry_on_failure = retry_on_failure;
        self
    }

    /// Replace the per-bin function evaluation allowance
    #[must_use]
    pub const fn with_evaluations_per_bin(mut self, evaluations_per_bin: usize) -> Self {
        self.evaluations_per_bin = evaluations_per_bin;
        self
    }

    /// Clip window in use
    pub const fn clip_window(&self) -> ClipWindow {
        self.clip
    }

    /// Select the points inside the clip window whose log-density is finite
    pub fn clip(&self, distribution: &Distribution) -> ClippedSamples {
        let mask = self.clip.mask(distribution.bin_centres());

        let (x, y) = distribution
            .points()
            .zip(mask.iter().by_vals())
            .filter(|&((_, y), inside)| inside && y.is_finite())
            .map(|(point, _)| point)
            .unzip();

        ClippedSamples { x, y }
    }

    /// Starting point: `log_a = -max(y)`, `w² = 1`, `q = 2`
    pub fn initial_guess(samples: &ClippedSamples) -> TsallisParameters {
        let max_y = samples.y.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        TsallisParameters {
            log_amplitude: -max_y,
            width_squared: INITIAL_WIDTH_SQUARED,
            shape: INITIAL_SHAPE,
        }
    }

    /// Fit the Tsallis model to `distribution`
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Fewer clipped points remain than parameters to fit
    /// - The solver exhausts its budget of `100 x num_bins` evaluations
    /// - Any parameter variance is non-finite
    pub fn fit(&self, distribution: &Distribution) -> Result<FitResult> {
        let samples = self.clip(distribution);
        if samples.len() < FIT_PARAMETER_COUNT {
            return Err(degenerate_input(
                "fit",
                &format!(
                    "{} clipped points cannot determine {FIT_PARAMETER_COUNT} parameters",
                    samples.len()
                ),
            ));
        }

        let solver = LevenbergMarquardt::new(self.evaluations_per_bin * distribution.num_bins());
        let guess = Self::initial_guess(&samples);

        let solution = match solver.solve(&TsallisModel, &samples.x, &samples.y, guess.to_vector()) {
            Err(TsallisError::FitConvergence { .. }) if self.retry_on_failure => {
                let perturbed = TsallisParameters {
                    width_squared: guess.width_squared * RETRY_WIDTH_FACTOR,
                    shape: guess.shape + RETRY_SHAPE_OFFSET,
                    ..guess
                };
                log::warn!("fit did not converge, retrying from {perturbed:?}");
                solver.solve(&TsallisModel, &samples.x, &samples.y, perturbed.to_vector())?
            }
            other => other?,
        };

        let parameters = TsallisParameters::from_vector(&solution.parameters);
        let variances: Vec<f64> = solution.covariance.diagonal().iter().copied().collect();
        for (&name, variance) in TsallisParameters::NAMES.iter().zip(&variances) {
            if !variance.is_finite() {
                return Err(TsallisError::IndeterminateVariance { parameter: name });
            }
        }

        let predicted: Vec<f64> = samples
            .x
            .iter()
            .map(|&x| parameters.evaluate(x).exp())
            .collect();
        let observed: Vec<f64> = samples.y.iter().map(|y| y.exp()).collect();
        let chi_square = chi_square(&predicted, &observed)?;

        let variance = |i: usize| variances.get(i).copied().unwrap_or(f64::NAN);

        Ok(FitResult {
            log_amplitude: parameters.log_amplitude,
            width_squared: parameters.width_squared,
            shape: parameters.shape,
            log_amplitude_variance: variance(0),
            width_squared_variance: variance(1),
            shape_variance: variance(2),
            chi_square,
        })
    }
}
