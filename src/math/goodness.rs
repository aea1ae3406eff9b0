//! Pearson chi-square goodness of fit

use crate::io::error::{Result, invalid_parameter};

/// Pearson chi-square statistic `Σ (observed - expected)² / expected`
///
/// Degrees of freedom do not enter the statistic itself; they only matter
/// when converting it to a p-value.
///
/// # Errors
///
/// Returns an error if the sequences differ in length or are empty
pub fn chi_square(observed: &[f64], expected: &[f64]) -> Result<f64> {
    if observed.len() != expected.len() {
        return Err(invalid_parameter(
            "expected",
            &expected.len(),
            &format!("expected {} values to match the observations", observed.len()),
        ));
    }
    if observed.is_empty() {
        return Err(invalid_parameter(
            "observed",
            &"[]",
            &"at least one observation is required",
        ));
    }

    Ok(observed
        .iter()
        .zip(expected)
        .map(|(&o, &e)| (o - e).powi(2) / e)
        .sum())
}

/// Degrees of freedom left after fitting `fitted_parameters` to `points` categories
pub const fn degrees_of_freedom(points: usize, fitted_parameters: usize) -> usize {
    points.saturating_sub(1).saturating_sub(fitted_parameters)
}
