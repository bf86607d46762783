//! Levenberg-Marquardt least-squares driver.
//!
//! Minimizes `chi2 = sum_i w_i * (y_i - f(i; p))^2` for problems that supply
//! model values and analytic partial derivatives per sample.

use crate::{FitError, Result};
use nalgebra::{DMatrix, DVector};

/// A weighted nonlinear least-squares problem.
pub trait LeastSquaresProblem {
    /// Number of free parameters.
    fn num_params(&self) -> usize;

    /// Number of samples.
    fn num_points(&self) -> usize;

    /// Observed value of sample `i`.
    fn observed(&self, i: usize) -> f64;

    /// Statistical weight (inverse variance) of sample `i`.
    fn weight(&self, _i: usize) -> f64 {
        1.0
    }

    /// Model value of sample `i`; writes `df/dp_k` into `gradient[k]`.
    fn evaluate(&self, i: usize, params: &DVector<f64>, gradient: &mut [f64]) -> f64;
}

/// Optimizer settings.
#[derive(Debug, Clone)]
pub struct LmConfig {
    /// Maximum number of iterations.
    pub max_iterations: usize,
    /// Initial damping factor.
    pub initial_lambda: f64,
    /// Damping multiplier after a rejected step.
    pub lambda_up: f64,
    /// Damping multiplier after an accepted step.
    pub lambda_down: f64,
    /// Damping above which the optimizer gives up.
    pub max_lambda: f64,
    /// Relative chi2 decrease below which the fit counts as converged.
    pub tolerance: f64,
    /// Relative step length below which the fit counts as converged.
    pub step_tolerance: f64,
}

impl Default for LmConfig {
    fn default() -> Self {
        Self {
            max_iterations: 200,
            initial_lambda: 1e-3,
            lambda_up: 10.0,
            lambda_down: 0.1,
            max_lambda: 1e12,
            tolerance: 1e-12,
            step_tolerance: 1e-12,
        }
    }
}

/// Converged parameters and fit statistics.
#[derive(Debug, Clone)]
pub struct LmSolution {
    /// Best-fit parameters.
    pub params: DVector<f64>,
    /// Inverse of `J^T W J` at the solution, `None` if singular.
    pub covariance: Option<DMatrix<f64>>,
    /// Weighted sum of squared residuals.
    pub chi2: f64,
    /// Iterations performed.
    pub iterations: usize,
}

struct NormalEquations {
    jtj: DMatrix<f64>,
    jtr: DVector<f64>,
    chi2: f64,
}

fn normal_equations<P: LeastSquaresProblem>(
    problem: &P,
    params: &DVector<f64>,
    gradient: &mut [f64],
) -> NormalEquations {
    let n = problem.num_params();
    let mut jtj = DMatrix::zeros(n, n);
    let mut jtr = DVector::zeros(n);
    let mut chi2 = 0.0;

    for i in 0..problem.num_points() {
        let model = problem.evaluate(i, params, gradient);
        let weight = problem.weight(i);
        let residual = problem.observed(i) - model;
        chi2 += weight * residual * residual;
        for row in 0..n {
            let wg = weight * gradient[row];
            jtr[row] += wg * residual;
            for col in 0..=row {
                jtj[(row, col)] += wg * gradient[col];
            }
        }
    }
    for row in 0..n {
        for col in 0..row {
            jtj[(col, row)] = jtj[(row, col)];
        }
    }

    NormalEquations { jtj, jtr, chi2 }
}

fn chi2_at<P: LeastSquaresProblem>(
    problem: &P,
    params: &DVector<f64>,
    gradient: &mut [f64],
) -> f64 {
    (0..problem.num_points())
        .map(|i| {
            let residual = problem.observed(i) - problem.evaluate(i, params, gradient);
            problem.weight(i) * residual * residual
        })
        .sum()
}

/// Runs Levenberg-Marquardt from `initial`.
///
/// # Errors
/// [`FitError::DidNotConverge`] if the damping grows past
/// `config.max_lambda`, the iteration limit is hit, or chi2 becomes
/// non-finite.
pub fn levenberg_marquardt<P: LeastSquaresProblem>(
    problem: &P,
    initial: DVector<f64>,
    config: &LmConfig,
) -> Result<LmSolution> {
    let n = problem.num_params();
    let mut gradient = vec![0.0; n];
    let mut params = initial;
    let mut normal = normal_equations(problem, &params, &mut gradient);
    if !normal.chi2.is_finite() {
        return Err(FitError::DidNotConverge { iterations: 0 });
    }

    // chi2 of the all-zero model; a fit this far below it is exact to
    // machine precision.
    let scale: f64 = (0..problem.num_points())
        .map(|i| problem.weight(i) * problem.observed(i).powi(2))
        .sum();
    let exact = scale * f64::EPSILON * f64::EPSILON;

    let mut lambda = config.initial_lambda;
    for iteration in 1..=config.max_iterations {
        if normal.chi2 <= exact {
            return Ok(finish(params, normal, iteration - 1));
        }

        let mut damped = normal.jtj.clone();
        for k in 0..n {
            let diag = normal.jtj[(k, k)].max(f64::EPSILON);
            damped[(k, k)] = normal.jtj[(k, k)] + lambda * diag;
        }

        let Some(step) = damped.cholesky().map(|c| c.solve(&normal.jtr)) else {
            lambda *= config.lambda_up;
            if lambda > config.max_lambda {
                log::debug!("damping limit reached after {iteration} iterations (singular system)");
                return Err(FitError::DidNotConverge {
                    iterations: iteration,
                });
            }
            continue;
        };

        let small_step =
            step.norm() <= config.step_tolerance * (params.norm() + config.step_tolerance);
        let candidate = &params + &step;
        let candidate_chi2 = chi2_at(problem, &candidate, &mut gradient);

        if candidate_chi2.is_finite() && candidate_chi2 < normal.chi2 {
            let decrease = normal.chi2 - candidate_chi2;
            params = candidate;
            normal = normal_equations(problem, &params, &mut gradient);
            lambda = (lambda * config.lambda_down).max(f64::MIN_POSITIVE);
            if decrease <= config.tolerance * normal.chi2 || small_step {
                return Ok(finish(params, normal, iteration));
            }
        } else {
            // No improvement within rounding of the current point.
            if small_step {
                return Ok(finish(params, normal, iteration));
            }
            lambda *= config.lambda_up;
            if lambda > config.max_lambda {
                log::debug!("damping limit reached after {iteration} iterations");
                return Err(FitError::DidNotConverge {
                    iterations: iteration,
                });
            }
        }
    }

    log::debug!("iteration limit {} reached", config.max_iterations);
    Err(FitError::DidNotConverge {
        iterations: config.max_iterations,
    })
}

fn finish(params: DVector<f64>, normal: NormalEquations, iterations: usize) -> LmSolution {
    LmSolution {
        params,
        covariance: normal.jtj.try_inverse(),
        chi2: normal.chi2,
        iterations,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    /// y = a * exp(b * x)
    struct Exponential {
        y: Vec<f64>,
    }

    impl LeastSquaresProblem for Exponential {
        fn num_params(&self) -> usize {
            2
        }

        fn num_points(&self) -> usize {
            self.y.len()
        }

        fn observed(&self, i: usize) -> f64 {
            self.y[i]
        }

        #[allow(clippy::cast_precision_loss)]
        fn evaluate(&self, i: usize, params: &DVector<f64>, gradient: &mut [f64]) -> f64 {
            let x = i as f64;
            let e = (params[1] * x).exp();
            gradient[0] = e;
            gradient[1] = params[0] * x * e;
            params[0] * e
        }
    }

    #[test]
    #[allow(clippy::cast_precision_loss)]
    fn test_recovers_exponential() {
        let y = (0..10).map(|i| 3.0 * (-0.3 * i as f64).exp()).collect();
        let problem = Exponential { y };
        let solution =
            levenberg_marquardt(&problem, DVector::from_vec(vec![1.0, -0.1]), &LmConfig::default())
                .unwrap();
        assert_relative_eq!(solution.params[0], 3.0, epsilon = 1e-6);
        assert_relative_eq!(solution.params[1], -0.3, epsilon = 1e-6);
        assert!(solution.chi2 < 1e-12);
        assert!(solution.covariance.is_some());
    }

    #[test]
    fn test_gives_up_after_iteration_limit() {
        let y = vec![1.0, 5.0, 2.0, 8.0, 0.5, 7.0];
        let problem = Exponential { y };
        let config = LmConfig {
            max_iterations: 1,
            ..LmConfig::default()
        };
        let result = levenberg_marquardt(&problem, DVector::from_vec(vec![1.0, 0.0]), &config);
        assert!(matches!(result, Err(FitError::DidNotConverge { .. })));
    }
}
