//! Axis-aligned 2D Gaussian fit.
//!
//! Fits `z = amp * exp(-((x-cx)^2 / (2 sx^2) + (y-cy)^2 / (2 sy^2)))` to a
//! row-major grid of counts (`data[y * size_x + x]`).
#![allow(clippy::cast_precision_loss)]

use crate::lm::{levenberg_marquardt, LeastSquaresProblem, LmConfig};
use crate::{FitError, Result};
use cascade_core::CountGrid;
use nalgebra::DVector;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

const AMP: usize = 0;
const CX: usize = 1;
const CY: usize = 2;
const SX: usize = 3;
const SY: usize = 4;

/// A converged 2D Gaussian fit.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct GaussianFit {
    /// Peak height.
    pub amplitude: f64,
    /// Center x in pixels.
    pub center_x: f64,
    /// Center y in pixels.
    pub center_y: f64,
    /// Standard deviation along x (non-negative).
    pub spread_x: f64,
    /// Standard deviation along y (non-negative).
    pub spread_y: f64,
    /// Sum of squared residuals.
    pub chi2: f64,
    /// Optimizer iterations.
    pub iterations: usize,
}

impl GaussianFit {
    /// Model value at `(x, y)`.
    #[must_use]
    pub fn value_at(&self, x: f64, y: f64) -> f64 {
        let dx = x - self.center_x;
        let dy = y - self.center_y;
        self.amplitude
            * (-(dx * dx / (2.0 * self.spread_x * self.spread_x)
                + dy * dy / (2.0 * self.spread_y * self.spread_y)))
                .exp()
    }
}

/// Intensity-weighted moments used as the starting point.
#[derive(Debug, Clone, Copy)]
struct Moments {
    peak: f64,
    center_x: f64,
    center_y: f64,
    spread_x: f64,
    spread_y: f64,
}

fn moments(size_x: usize, samples: &[f64]) -> Result<Moments> {
    let mut total = 0.0;
    let mut sum_x = 0.0;
    let mut sum_y = 0.0;
    let mut peak = f64::NEG_INFINITY;
    for (i, &z) in samples.iter().enumerate() {
        let (x, y) = ((i % size_x) as f64, (i / size_x) as f64);
        total += z;
        sum_x += z * x;
        sum_y += z * y;
        peak = peak.max(z);
    }
    if total <= 0.0 || !total.is_finite() {
        return Err(FitError::DegenerateInput(
            "zero total intensity, no centroid".to_string(),
        ));
    }
    let center_x = sum_x / total;
    let center_y = sum_y / total;

    let mut var_x = 0.0;
    let mut var_y = 0.0;
    for (i, &z) in samples.iter().enumerate() {
        let dx = (i % size_x) as f64 - center_x;
        let dy = (i / size_x) as f64 - center_y;
        var_x += z * dx * dx;
        var_y += z * dy * dy;
    }
    let spread_x = (var_x / total).sqrt();
    let spread_y = (var_y / total).sqrt();
    if spread_x <= 0.0 || spread_y <= 0.0 {
        return Err(FitError::DegenerateInput(format!(
            "zero intensity spread (sx={spread_x}, sy={spread_y})"
        )));
    }

    Ok(Moments {
        peak,
        center_x,
        center_y,
        spread_x,
        spread_y,
    })
}

struct GaussianProblem<'a> {
    size_x: usize,
    data: &'a [f64],
}

impl LeastSquaresProblem for GaussianProblem<'_> {
    fn num_params(&self) -> usize {
        5
    }

    fn num_points(&self) -> usize {
        self.data.len()
    }

    fn observed(&self, i: usize) -> f64 {
        self.data[i]
    }

    fn evaluate(&self, i: usize, params: &DVector<f64>, gradient: &mut [f64]) -> f64 {
        let dx = (i % self.size_x) as f64 - params[CX];
        let dy = (i / self.size_x) as f64 - params[CY];
        let sx2 = params[SX] * params[SX];
        let sy2 = params[SY] * params[SY];
        let envelope = (-(dx * dx / (2.0 * sx2) + dy * dy / (2.0 * sy2))).exp();
        let value = params[AMP] * envelope;

        gradient[AMP] = envelope;
        gradient[CX] = value * dx / sx2;
        gradient[CY] = value * dy / sy2;
        gradient[SX] = value * dx * dx / (sx2 * params[SX]);
        gradient[SY] = value * dy * dy / (sy2 * params[SY]);
        value
    }
}

/// Fits a 2D Gaussian to a row-major `size_x x size_y` grid.
///
/// # Errors
/// [`FitError::DimensionMismatch`] if `data.len() != size_x * size_y`,
/// [`FitError::TooFewPoints`] if either dimension is below 2,
/// [`FitError::DegenerateInput`] for constant data, zero total intensity or
/// zero spread, [`FitError::DidNotConverge`] if the optimizer fails or the
/// spreads collapse or grow wider than the grid.
pub fn fit_gaussian<T: Copy + Into<f64>>(
    size_x: usize,
    size_y: usize,
    data: &[T],
) -> Result<GaussianFit> {
    fit_gaussian_with_config(size_x, size_y, data, &LmConfig::default())
}

/// [`fit_gaussian`] with explicit optimizer settings.
///
/// # Errors
/// See [`fit_gaussian`].
pub fn fit_gaussian_with_config<T: Copy + Into<f64>>(
    size_x: usize,
    size_y: usize,
    data: &[T],
    config: &LmConfig,
) -> Result<GaussianFit> {
    if data.len() != size_x * size_y {
        return Err(FitError::DimensionMismatch {
            expected: size_x * size_y,
            actual: data.len(),
        });
    }
    if size_x < 2 || size_y < 2 {
        return Err(FitError::TooFewPoints {
            needed: 2,
            got: size_x.min(size_y),
        });
    }

    let samples: Vec<f64> = data.iter().map(|&v| v.into()).collect();
    if samples.iter().any(|v| !v.is_finite()) {
        return Err(FitError::DegenerateInput("non-finite sample".to_string()));
    }
    let (min, max) = samples
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| {
            (lo.min(v), hi.max(v))
        });
    if max - min <= 0.0 {
        return Err(FitError::DegenerateInput(format!(
            "all {} samples equal {min}",
            samples.len()
        )));
    }
    let start = moments(size_x, &samples)?;
    let initial = DVector::from_vec(vec![
        start.peak,
        start.center_x,
        start.center_y,
        start.spread_x,
        start.spread_y,
    ]);

    let problem = GaussianProblem {
        size_x,
        data: &samples,
    };
    let solution = levenberg_marquardt(&problem, initial, config)?;
    let p = &solution.params;

    let spread_x = p[SX].abs();
    let spread_y = p[SY].abs();
    let finite = p.iter().all(|v| v.is_finite());
    let collapsed = spread_x <= f64::EPSILON || spread_y <= f64::EPSILON;
    // A peak wider than the grid is not resolved by the data.
    let runaway = spread_x > size_x as f64 || spread_y > size_y as f64;
    if !finite || collapsed || runaway {
        log::debug!("gaussian fit rejected: spreads ({spread_x}, {spread_y}) on {size_x}x{size_y}");
        return Err(FitError::DidNotConverge {
            iterations: solution.iterations,
        });
    }

    Ok(GaussianFit {
        amplitude: p[AMP],
        center_x: p[CX],
        center_y: p[CY],
        spread_x,
        spread_y,
        chi2: solution.chi2,
        iterations: solution.iterations,
    })
}

/// Fits a 2D Gaussian to any count grid, e.g. a TOF overview image.
///
/// # Errors
/// See [`fit_gaussian`].
pub fn fit_image<G: CountGrid + ?Sized>(grid: &G) -> Result<GaussianFit> {
    fit_gaussian(grid.width(), grid.height(), &grid.to_row_major())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_dimension_checks() {
        assert_eq!(
            fit_gaussian(3, 3, &[1u32; 8]),
            Err(FitError::DimensionMismatch {
                expected: 9,
                actual: 8
            })
        );
        assert!(matches!(
            fit_gaussian(1, 5, &[1u32; 5]),
            Err(FitError::TooFewPoints { .. })
        ));
    }

    #[test]
    fn test_spread_wider_than_grid_rejected() {
        // Nearly flat ramp: the best fit is a very broad peak.
        let data: Vec<f64> = (0..36).map(|i| 100.0 + f64::from(i % 6) * 1e-3).collect();
        assert!(matches!(
            fit_gaussian(6, 6, &data),
            Err(FitError::DidNotConverge { .. } | FitError::DegenerateInput(_))
        ));
    }

    #[test]
    fn test_zero_intensity() {
        assert!(matches!(
            fit_gaussian(4, 4, &[0u32; 16]),
            Err(FitError::DegenerateInput(_))
        ));
    }

    #[test]
    fn test_single_column_is_degenerate() {
        let mut data = [0u32; 16];
        data[1] = 5;
        data[5] = 9;
        data[9] = 5;
        assert!(matches!(
            fit_gaussian(4, 4, &data),
            Err(FitError::DegenerateInput(_))
        ));
    }

    #[test]
    fn test_value_at_center() {
        let fit = GaussianFit {
            amplitude: 4.0,
            center_x: 1.0,
            center_y: 2.0,
            spread_x: 1.0,
            spread_y: 2.0,
            chi2: 0.0,
            iterations: 0,
        };
        assert_relative_eq!(fit.value_at(1.0, 2.0), 4.0);
        assert_relative_eq!(fit.value_at(2.0, 2.0), 4.0 * (-0.5f64).exp());
    }
}
