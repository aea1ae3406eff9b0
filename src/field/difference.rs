//! Standardized lag-difference fields
//!
//! For a lag `l`, every pixel is compared against the average of its four
//! neighbours at distance `l` along each axis. Shifts wrap around the field
//! edges, so the output always has the same shape as the input.

use crate::field::moments::FiniteMoments;
use crate::io::error::{Result, TsallisError, degenerate_input, invalid_parameter};
use ndarray::{Array2, ArrayBase, ArrayViewD, Data, Ix2};
use num_traits::Float;

/// Standardized difference field for a single lag
///
/// Finite entries have zero mean and unit standard deviation. Entries that
/// were non-finite in the input stay non-finite.
#[derive(Debug, Clone, PartialEq)]
pub struct DifferenceField {
    lag: usize,
    values: Array2<f64>,
}

impl DifferenceField {
    /// Lag this field was computed for
    pub const fn lag(&self) -> usize {
        self.lag
    }

    /// Standardized values, same shape as the input field
    pub const fn values(&self) -> &Array2<f64> {
        &self.values
    }

    /// Shape as (rows, cols)
    pub fn dim(&self) -> (usize, usize) {
        self.values.dim()
    }

    /// Iterate over the finite entries in row-major order
    pub fn finite_values(&self) -> impl Iterator<Item = f64> + '_ {
        self.values.iter().copied().filter(|v| v.is_finite())
    }

    /// Consume the field and return the underlying array
    pub fn into_values(self) -> Array2<f64> {
        self.values
    }
}

/// Computes standardized four-neighbour lag differences
pub struct LagDifferenceField;

impl LagDifferenceField {
    /// Compute the difference field of `field` at `lag`
    ///
    /// The raw difference is `(up + down + left + right) / 4 - field`, where
    /// each neighbour is a cyclic shift by `lag`. The result is then
    /// standardized over its finite entries.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - `lag` is zero
    /// - Either axis of `field` has length zero
    /// - The raw difference has no finite entries or zero variance
    pub fn compute<S, T>(field: &ArrayBase<S, Ix2>, lag: usize) -> Result<DifferenceField>
    where
        S: Data<Elem = T>,
        T: Float,
    {
        if lag == 0 {
            return Err(invalid_parameter(
                "lag",
                &lag,
                &"lag must be a positive integer",
            ));
        }

        let (rows, cols) = field.dim();
        if rows == 0 || cols == 0 {
            return Err(TsallisError::Shape {
                expected: "a two-dimensional field with non-empty axes",
                found: vec![rows, cols],
            });
        }

        if lag >= rows || lag >= cols {
            log::warn!("lag {lag} wraps around a {rows}x{cols} field");
        }

        let raw = Self::raw_difference(field, lag);
        let values = Self::standardize(raw)?;

        Ok(DifferenceField { lag, values })
    }

    /// Compute the difference field of a dynamically-shaped array
    ///
    /// # Errors
    ///
    /// Returns [`TsallisError::Shape`] if `field` is not two-dimensional, and
    /// otherwise the same errors as [`LagDifferenceField::compute`]
    pub fn compute_dyn<T: Float>(field: &ArrayViewD<'_, T>, lag: usize) -> Result<DifferenceField> {
        let view = field
            .view()
            .into_dimensionality::<Ix2>()
            .map_err(|_shape_error| TsallisError::Shape {
                expected: "a two-dimensional field",
                found: field.shape().to_vec(),
            })?;
        Self::compute(&view, lag)
    }

    fn raw_difference<S, T>(field: &ArrayBase<S, Ix2>, lag: usize) -> Array2<f64>
    where
        S: Data<Elem = T>,
        T: Float,
    {
        let (rows, cols) = field.dim();
        let row_shift = lag % rows;
        let col_shift = lag % cols;

        let at = |row: usize, col: usize| -> f64 {
            field
                .get([row, col])
                .and_then(|v| v.to_f64())
                .unwrap_or(f64::NAN)
        };

        Array2::from_shape_fn((rows, cols), |(i, j)| {
            let up = at((i + rows - row_shift) % rows, j);
            let down = at((i + row_shift) % rows, j);
            let left = at(i, (j + cols - col_shift) % cols);
            let right = at(i, (j + col_shift) % cols);

            ((up + down) + (left + right)) / 4.0 - at(i, j)
        })
    }

    fn standardize(raw: Array2<f64>) -> Result<Array2<f64>> {
        let moments = FiniteMoments::of(raw.iter()).ok_or_else(|| {
            degenerate_input("lag difference", &"difference field has no finite entries")
        })?;

        if !(moments.std_dev.is_finite() && moments.std_dev > 0.0) {
            return Err(degenerate_input(
                "lag difference",
                &format!(
                    "difference field has zero variance over {} finite entries",
                    moments.count
                ),
            ));
        }

        Ok(raw.mapv_into(|v| moments.standardize(v)))
    }
}
