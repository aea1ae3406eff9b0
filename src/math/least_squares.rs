//! Damped nonlinear least squares (Levenberg-Marquardt)
//!
//! Minimizes `Σ (y_i - f(x_i; p))²` over the parameter vector `p` using the
//! model's analytic gradient. Steps that fail to reduce the sum of squares,
//! or that leave the model's domain, are rejected and the damping raised.

use crate::io::configuration::{COST_TOLERANCE, INITIAL_DAMPING, MAX_DAMPING, STEP_TOLERANCE};
use crate::io::error::{Result, TsallisError, computation_error, degenerate_input, invalid_parameter};
use nalgebra::{DMatrix, DVector};

// Floor for diagonal scaling so a parameter with zero sensitivity still damps
const MIN_DIAGONAL_SCALE: f64 = 1e-12;
// Sums of squares below this are an exact fit
const EXACT_FIT_COST: f64 = 1e-30;

/// A curve `y = f(x; p)` with an analytic gradient in `p`
pub trait CurveModel {
    /// Model value at `x`
    fn value(&self, x: f64, parameters: &DVector<f64>) -> f64;

    /// Partial derivatives of the model value with respect to each parameter
    fn gradient(&self, x: f64, parameters: &DVector<f64>) -> DVector<f64>;
}

/// Converged least-squares fit
#[derive(Debug, Clone, PartialEq)]
pub struct Solution {
    /// Best-fit parameters
    pub parameters: DVector<f64>,
    /// Parameter covariance, scaled by the residual variance
    ///
    /// Entries are infinite when the covariance cannot be estimated (singular
    /// normal matrix, or no more points than parameters).
    pub covariance: DMatrix<f64>,
    /// Sum of squared residuals at the solution
    pub residual_sum_squares: f64,
    /// Function evaluations spent
    pub evaluations: usize,
    /// Accepted steps
    pub iterations: usize,
}

/// Levenberg-Marquardt solver with a bounded evaluation budget
#[derive(Debug, Clone, Copy)]
pub struct LevenbergMarquardt {
    max_evaluations: usize,
    cost_tolerance: f64,
    step_tolerance: f64,
}

impl LevenbergMarquardt {
    /// Create a solver allowed at most `max_evaluations` function evaluations
    pub const fn new(max_evaluations: usize) -> Self {
        Self {
            max_evaluations,
            cost_tolerance: COST_TOLERANCE,
            step_tolerance: STEP_TOLERANCE,
        }
    }

    /// Evaluation budget
    pub const fn max_evaluations(&self) -> usize {
        self.max_evaluations
    }

    /// Fit `model` to the points `(x, y)` starting from `initial`
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - `x` and `y` differ in length
    /// - There are fewer points than parameters
    /// - The residuals at `initial` are not finite
    /// - The evaluation budget is exhausted before convergence
    pub fn solve<M: CurveModel>(
        &self,
        model: &M,
        x: &[f64],
        y: &[f64],
        initial: DVector<f64>,
    ) -> Result<Solution> {
        if x.len() != y.len() {
            return Err(invalid_parameter(
                "y",
                &y.len(),
                &format!("expected {} values to match x", x.len()),
            ));
        }
        let n = x.len();
        let p = initial.len();
        if n < p {
            return Err(degenerate_input(
                "least squares",
                &format!("{n} points cannot determine {p} parameters"),
            ));
        }

        let mut parameters = initial;
        let mut residuals = Self::residuals(model, x, y, &parameters);
        let mut cost = residuals.norm_squared();
        let mut evaluations = 1;
        let mut iterations = 0;

        if !cost.is_finite() {
            return Err(computation_error(
                "least squares",
                &"residuals at the initial guess are not finite",
            ));
        }

        let mut damping = INITIAL_DAMPING;

        'outer: while cost > EXACT_FIT_COST {
            let jacobian = Self::jacobian(model, x, &parameters);
            let normal = jacobian.tr_mul(&jacobian);
            let rhs = jacobian.tr_mul(&residuals);

            loop {
                if evaluations >= self.max_evaluations {
                    return Err(TsallisError::FitConvergence {
                        evaluations,
                        budget: self.max_evaluations,
                    });
                }

                let mut damped = normal.clone();
                damped.set_diagonal(
                    &normal
                        .diagonal()
                        .map(|d| damping.mul_add(d.max(MIN_DIAGONAL_SCALE), d)),
                );

                let step = damped
                    .lu()
                    .solve(&rhs)
                    .filter(|step| step.iter().all(|v| v.is_finite()));
                let Some(step) = step else {
                    damping *= 10.0;
                    if damping > MAX_DAMPING {
                        break 'outer;
                    }
                    continue;
                };

                let trial = &parameters + &step;
                let trial_residuals = Self::residuals(model, x, y, &trial);
                let trial_cost = trial_residuals.norm_squared();
                evaluations += 1;

                if trial_cost.is_finite() && trial_cost < cost {
                    let reduction = (cost - trial_cost) / cost;
                    let step_size = step.norm() / (trial.norm() + self.step_tolerance);

                    parameters = trial;
                    residuals = trial_residuals;
                    cost = trial_cost;
                    iterations += 1;
                    damping = (damping / 10.0).max(f64::EPSILON);

                    if reduction <= self.cost_tolerance || step_size <= self.step_tolerance {
                        break 'outer;
                    }
                    continue 'outer;
                }

                damping *= 10.0;
                if damping > MAX_DAMPING {
                    // No step of any length reduces the cost: a local minimum
                    break 'outer;
                }
            }
        }

        log::debug!(
            "least squares converged: cost {cost:.3e} after {iterations} steps, {evaluations} evaluations"
        );

        let covariance = Self::covariance(model, x, &parameters, cost);

        Ok(Solution {
            parameters,
            covariance,
            residual_sum_squares: cost,
            evaluations,
            iterations,
        })
    }

    fn residuals<M: CurveModel>(
        model: &M,
        x: &[f64],
        y: &[f64],
        parameters: &DVector<f64>,
    ) -> DVector<f64> {
        DVector::from_vec(
            x.iter()
                .zip(y)
                .map(|(&xi, &yi)| yi - model.value(xi, parameters))
                .collect(),
        )
    }

    fn jacobian<M: CurveModel>(model: &M, x: &[f64], parameters: &DVector<f64>) -> DMatrix<f64> {
        let rows: Vec<DVector<f64>> = x.iter().map(|&xi| model.gradient(xi, parameters)).collect();
        DMatrix::from_fn(x.len(), parameters.len(), |i, j| {
            rows.get(i)
                .and_then(|row| row.get(j))
                .copied()
                .unwrap_or(f64::NAN)
        })
    }

    /// Covariance as `(JᵀJ)⁻¹ · cost / (n - p)`
    fn covariance<M: CurveModel>(
        model: &M,
        x: &[f64],
        parameters: &DVector<f64>,
        cost: f64,
    ) -> DMatrix<f64> {
        let n = x.len();
        let p = parameters.len();
        let indeterminate = DMatrix::from_element(p, p, f64::INFINITY);

        if n <= p {
            return indeterminate;
        }

        let jacobian = Self::jacobian(model, x, parameters);
        jacobian
            .tr_mul(&jacobian)
            .try_inverse()
            .filter(|inverse| inverse.iter().all(|v| v.is_finite()))
            .map_or(indeterminate, |inverse| inverse * (cost / (n - p) as f64))
    }
}
