//! Error types and per-lag context for statistic operations

use std::fmt;

/// Main error type for all statistic operations
#[derive(Debug, Clone, PartialEq)]
pub enum TsallisError {
    /// Input field does not have a usable two-dimensional shape
    Shape {
        /// Description of the shape that was required
        expected: &'static str,
        /// Shape that was supplied
        found: Vec<usize>,
    },

    /// Input carries no usable spread for the requested stage
    ///
    /// Occurs when:
    /// - The difference field has zero variance (constant input)
    /// - No finite values survive to be histogrammed
    /// - The histogram range collapses to a single value
    /// - Fewer clipped points remain than parameters to fit
    DegenerateInput {
        /// Pipeline stage that rejected the input
        stage: &'static str,
        /// Description of what made the input degenerate
        reason: String,
    },

    /// Least-squares solver ran out of function evaluations
    FitConvergence {
        /// Function evaluations spent
        evaluations: usize,
        /// Evaluation budget that was allowed
        budget: usize,
    },

    /// Parameter covariance could not be estimated
    IndeterminateVariance {
        /// Name of the first parameter with a non-finite variance
        parameter: &'static str,
    },

    /// Both parameters compared in a distance term are zero
    IndeterminateDistance {
        /// Lag whose term is undefined
        lag: usize,
        /// Name of the compared parameter
        parameter: &'static str,
    },

    /// Compared statistics are not index-aligned
    LagMismatch {
        /// Lags of the first statistic
        first: Vec<usize>,
        /// Lags of the second statistic
        second: Vec<usize>,
    },

    /// Parameter validation failed
    InvalidParameter {
        /// Name of the invalid parameter
        parameter: &'static str,
        /// Provided value that failed validation
        value: String,
        /// Explanation of why the value is invalid
        reason: String,
    },

    /// Numerical computation produced invalid result
    Computation {
        /// Name of the computation that failed
        operation: &'static str,
        /// Description of the failure
        reason: String,
    },

    /// Failure attributed to a single lag of a multi-lag run
    AtLag {
        /// Lag being processed
        lag: usize,
        /// Underlying failure
        source: Box<TsallisError>,
    },
}

impl TsallisError {
    /// Strip any per-lag context and return the innermost error
    pub fn root_cause(&self) -> &Self {
        match self {
            Self::AtLag { source, .. } => source.root_cause(),
            other => other,
        }
    }

    /// Lag this error is attributed to, if any
    pub const fn lag(&self) -> Option<usize> {
        match self {
            Self::AtLag { lag, .. } | Self::IndeterminateDistance { lag, .. } => Some(*lag),
            _ => None,
        }
    }
}

impl fmt::Display for TsallisError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Shape { expected, found } => {
                write!(f, "Invalid field shape {found:?}: expected {expected}")
            }
            Self::DegenerateInput { stage, reason } => {
                write!(f, "Degenerate input to {stage}: {reason}")
            }
            Self::FitConvergence {
                evaluations,
                budget,
            } => {
                write!(
                    f,
                    "Fit did not converge after {evaluations} function evaluations (budget {budget})"
                )
            }
            Self::IndeterminateVariance { parameter } => {
                write!(f, "Variance of fitted parameter '{parameter}' is indeterminate")
            }
            Self::IndeterminateDistance { lag, parameter } => {
                write!(
                    f,
                    "Distance term for '{parameter}' at lag {lag} is indeterminate: both values are zero"
                )
            }
            Self::LagMismatch { first, second } => {
                write!(f, "Statistics are not lag-aligned: {first:?} vs {second:?}")
            }
            Self::InvalidParameter {
                parameter,
                value,
                reason,
            } => {
                write!(f, "Invalid parameter '{parameter}' = '{value}': {reason}")
            }
            Self::Computation { operation, reason } => {
                write!(f, "Computation error in {operation}: {reason}")
            }
            Self::AtLag { lag, source } => {
                write!(f, "Lag {lag}: {source}")
            }
        }
    }
}

impl std::error::Error for TsallisError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::AtLag { source, .. } => Some(source.as_ref()),
            _ => None,
        }
    }
}

/// Convenience type alias for statistic results
pub type Result<T> = std::result::Result<T, TsallisError>;

/// Attaches lag context to failures raised inside a multi-lag run
pub trait WithContext<T> {
    /// Attribute an error to the given lag
    ///
    /// # Errors
    ///
    /// Propagates the original error wrapped in [`TsallisError::AtLag`]
    fn with_lag(self, lag: usize) -> Result<T>;
}

impl<T, E> WithContext<T> for std::result::Result<T, E>
where
    E: Into<TsallisError>,
{
    fn with_lag(self, lag: usize) -> Result<T> {
        self.map_err(|e| {
            let error = e.into();
            // Context is attached once; re-wrapping would repeat the lag in messages
            match error {
                TsallisError::AtLag { .. } => error,
                other => TsallisError::AtLag {
                    lag,
                    source: Box::new(other),
                },
            }
        })
    }
}

/// Create an invalid parameter error
pub fn invalid_parameter(
    parameter: &'static str,
    value: &impl ToString,
    reason: &impl ToString,
) -> TsallisError {
    TsallisError::InvalidParameter {
        parameter,
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

/// Create a computation error
pub fn computation_error(operation: &'static str, reason: &impl ToString) -> TsallisError {
    TsallisError::Computation {
        operation,
        reason: reason.to_string(),
    }
}

/// Create a degenerate input error
pub fn degenerate_input(stage: &'static str, reason: &impl ToString) -> TsallisError {
    TsallisError::DegenerateInput {
        stage,
        reason: reason.to_string(),
    }
}
