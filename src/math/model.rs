//! Tsallis distribution in log10 form
//!
//! ```text
//! f(x) = -(1 / (q - 1)) * (log10(1 + (q - 1) * x² / w²) + log_a)
//! ```

use crate::math::least_squares::CurveModel;
use nalgebra::DVector;
use std::f64::consts::LN_10;

/// The three Tsallis parameters
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TsallisParameters {
    /// Log-amplitude `log_a`
    pub log_amplitude: f64,
    /// Scale `w²`
    pub width_squared: f64,
    /// Shape `q`
    pub shape: f64,
}

impl TsallisParameters {
    /// Parameter names in vector order
    pub const NAMES: [&'static str; 3] = ["log_amplitude", "width_squared", "shape"];

    /// Evaluate the model at `x`
    pub fn evaluate(&self, x: f64) -> f64 {
        tsallis_function(x, self.log_amplitude, self.width_squared, self.shape)
    }

    /// Partial derivatives with respect to (`log_a`, `w²`, `q`) at `x`
    pub fn gradient(&self, x: f64) -> [f64; 3] {
        let s = self.shape - 1.0;
        let w2 = self.width_squared;
        let x2 = x * x;
        let u = (s * x2 / w2) + 1.0;
        let log_u = u.log10();

        let d_log_amplitude = -1.0 / s;
        let d_width_squared = x2 / (w2 * w2 * u * LN_10);
        let d_shape = (log_u + self.log_amplitude) / (s * s) - x2 / (w2 * s * u * LN_10);

        [d_log_amplitude, d_width_squared, d_shape]
    }

    /// Parameters as a vector in (`log_a`, `w²`, `q`) order
    pub fn to_vector(&self) -> DVector<f64> {
        DVector::from_column_slice(&[self.log_amplitude, self.width_squared, self.shape])
    }

    /// Read parameters from a vector in (`log_a`, `w²`, `q`) order
    ///
    /// Missing entries read as NaN.
    pub fn from_vector(values: &DVector<f64>) -> Self {
        let at = |i: usize| values.get(i).copied().unwrap_or(f64::NAN);
        Self {
            log_amplitude: at(0),
            width_squared: at(1),
            shape: at(2),
        }
    }
}

/// Log10-form Tsallis distribution
pub fn tsallis_function(x: f64, log_amplitude: f64, width_squared: f64, shape: f64) -> f64 {
    let s = shape - 1.0;
    -(((s * x * x / width_squared) + 1.0).log10() + log_amplitude) / s
}

/// Tsallis curve as a least-squares model
#[derive(Debug, Clone, Copy, Default)]
pub struct TsallisModel;

impl CurveModel for TsallisModel {
    fn value(&self, x: f64, parameters: &DVector<f64>) -> f64 {
        TsallisParameters::from_vector(parameters).evaluate(x)
    }

    fn gradient(&self, x: f64, parameters: &DVector<f64>) -> DVector<f64> {
        DVector::from_column_slice(&TsallisParameters::from_vector(parameters).gradient(x))
    }
}
