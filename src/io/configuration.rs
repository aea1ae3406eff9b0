//! Statistic constants and runtime configuration defaults

use crate::analysis::distance::DegenerateTermPolicy;
use crate::analysis::fitting::ClipWindow;
use crate::analysis::histogram::CountPolicy;
use crate::analysis::statistic::FailurePolicy;
use crate::io::error::{Result, invalid_parameter};

// Scales analysed when the caller supplies no lags
/// Default lag set in pixels
pub const DEFAULT_LAGS: [usize; 7] = [1, 2, 4, 8, 16, 32, 64];

/// Default number of histogram bins per lag
pub const DEFAULT_NUM_BINS: usize = 500;

/// Half-width of the symmetric clip window applied before fitting
pub const CLIP_HALF_WIDTH: f64 = 2.0;

// Budget is counted against bins, not clipped points, so it is never below 100 x N
/// Function evaluations allowed per histogram bin
pub const EVALUATIONS_PER_BIN: usize = 100;

/// Number of fitted Tsallis parameters
pub const FIT_PARAMETER_COUNT: usize = 3;

/// Initial guess for the scale parameter `w²`
pub const INITIAL_WIDTH_SQUARED: f64 = 1.0;
/// Initial guess for the shape parameter `q`
pub const INITIAL_SHAPE: f64 = 2.0;

// Perturbation used for the single retry after a convergence failure
/// Factor applied to the initial `w²` on retry
pub const RETRY_WIDTH_FACTOR: f64 = 2.0;
/// Offset applied to the initial `q` on retry
pub const RETRY_SHAPE_OFFSET: f64 = -0.5;

// Solver tolerances, matching MINPACK defaults
/// Relative reduction in the sum of squares treated as converged
pub const COST_TOLERANCE: f64 = 1.490_116_119_384_765_6e-8;
/// Relative step size treated as converged
pub const STEP_TOLERANCE: f64 = 1.490_116_119_384_765_6e-8;
/// Damping applied to the first solver step
pub const INITIAL_DAMPING: f64 = 1e-3;
/// Damping beyond which no further improvement is attempted
pub const MAX_DAMPING: f64 = 1e16;

// Progress bar display settings
/// Width of the lag progress bar in characters
pub const PROGRESS_BAR_WIDTH: u16 = 40;

/// Runtime configuration for computing and comparing statistics
#[derive(Debug, Clone, PartialEq)]
pub struct TsallisConfig {
    /// Ordered lags to analyse
    pub lags: Vec<usize>,
    /// Histogram bins per lag
    pub num_bins: usize,
    /// Window restricting the points passed to the fitter
    pub clip: ClipWindow,
    /// Whether non-finite samples count towards the density denominator
    pub count_policy: CountPolicy,
    /// Whether one failing lag fails the whole statistic
    pub failure_policy: FailurePolicy,
    /// Retry once from a perturbed initial guess when a fit fails to converge
    pub retry_on_failure: bool,
    /// Handling of distance terms whose compared parameters are both zero
    pub degenerate_terms: DegenerateTermPolicy,
    /// Require compared statistics to share identical lag values, not only lag count
    pub require_identical_lags: bool,
    /// Invoke the reporter after computation
    pub verbose: bool,
}

impl Default for TsallisConfig {
    fn default() -> Self {
        Self {
            lags: DEFAULT_LAGS.to_vec(),
            num_bins: DEFAULT_NUM_BINS,
            clip: ClipWindow::default(),
            count_policy: CountPolicy::default(),
            failure_policy: FailurePolicy::default(),
            retry_on_failure: false,
            degenerate_terms: DegenerateTermPolicy::default(),
            require_identical_lags: true,
            verbose: false,
        }
    }
}

impl TsallisConfig {
    /// Replace the lag set
    #[must_use]
    pub fn with_lags(mut self, lags: impl Into<Vec<usize>>) -> Self {
        self.lags = lags.into();
        self
    }

    /// Replace the bin count
    #[must_use]
    pub const fn with_num_bins(mut self, num_bins: usize) -> Self {
        self.num_bins = num_bins;
        self
    }

    /// Replace the clip window
    #[must_use]
    pub const fn with_clip(mut self, clip: ClipWindow) -> Self {
        self.clip = clip;
        self
    }

    /// Replace the density denominator policy
    #[must_use]
    pub const fn with_count_policy(mut self, count_policy: CountPolicy) -> Self {
        self.count_policy = count_policy;
        self
    }

    /// Replace the per-lag failure policy
    #[must_use]
    pub const fn with_failure_policy(mut self, failure_policy: FailurePolicy) -> Self {
        self.failure_policy = failure_policy;
        self
    }

    /// Enable or disable the perturbed-guess retry
    #[must_use]
    pub const fn with_retry(mut self, retry_on_failure: bool) -> Self {
        self.retry_on_failure = retry_on_failure;
        self
    }

    /// Replace the degenerate distance term policy
    #[must_use]
    pub const fn with_degenerate_terms(mut self, degenerate_terms: DegenerateTermPolicy) -> Self {
        self.degenerate_terms = degenerate_terms;
        self
    }

    /// Require identical lag values when comparing statistics
    #[must_use]
    pub const fn with_identical_lags(mut self, require_identical_lags: bool) -> Self {
        self.require_identical_lags = require_identical_lags;
        self
    }

    /// Enable or disable reporter calls
    #[must_use]
    pub const fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Check the configuration before any work is done
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The lag set is empty or contains a zero lag
    /// - `num_bins` is zero
    /// - The clip window has a non-positive or non-finite half-width
    pub fn validate(&self) -> Result<()> {
        if self.lags.is_empty() {
            return Err(invalid_parameter(
                "lags",
                &"[]",
                &"at least one lag is required",
            ));
        }
        if let Some(zero) = self.lags.iter().find(|&&lag| lag == 0) {
            return Err(invalid_parameter(
                "lags",
                zero,
                &"lags must be positive integers",
            ));
        }
        if self.num_bins == 0 {
            return Err(invalid_parameter(
                "num_bins",
                &self.num_bins,
                &"at least one bin is required",
            ));
        }
        if let ClipWindow::Symmetric { half_width } = self.clip {
            if !(half_width.is_finite() && half_width > 0.0) {
                return Err(invalid_parameter(
                    "clip",
                    &half_width,
                    &"half-width must be positive and finite",
                ));
            }
        }
        Ok(())
    }
}
