//! Sinusoid fit with a fixed frequency.
//!
//! Fits `y = amplitude * sin(frequency * x + phase) + offset` to count
//! samples taken at `x = 0, 1, ..., N-1`.
#![allow(clippy::cast_precision_loss)]

use crate::lm::{levenberg_marquardt, LeastSquaresProblem, LmConfig};
use crate::{FitError, Result};
use nalgebra::DVector;
use std::f64::consts::{PI, TAU};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

const PHASE: usize = 0;
const AMPLITUDE: usize = 1;
const OFFSET: usize = 2;

/// Standard errors of the sinusoid parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SinusErrors {
    /// Phase error in radians.
    pub phase: f64,
    /// Amplitude error.
    pub amplitude: f64,
    /// Offset error.
    pub offset: f64,
}

/// A converged sinusoid fit.
///
/// `amplitude` is non-negative and `phase` lies in `[0, 2*pi)`.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SinusFit {
    /// Fixed angular frequency the fit was run with.
    pub frequency: f64,
    /// Phase in radians.
    pub phase: f64,
    /// Amplitude.
    pub amplitude: f64,
    /// Constant offset.
    pub offset: f64,
    /// Parameter errors, present for Poisson-weighted fits.
    pub errors: Option<SinusErrors>,
    /// Sum of (weighted) squared residuals.
    pub chi2: f64,
    /// Optimizer iterations.
    pub iterations: usize,
}

impl SinusFit {
    /// Model value at `x`.
    #[must_use]
    pub fn value_at(&self, x: f64) -> f64 {
        self.amplitude * (self.frequency * x + self.phase).sin() + self.offset
    }

    /// Samples the fitted curve with `samples_per_channel` points per unit
    /// of x over `channels` channels.
    #[must_use]
    pub fn curve(&self, samples_per_channel: usize, channels: usize) -> Vec<(f64, f64)> {
        let step = samples_per_channel.max(1);
        (0..channels * step)
            .map(|i| {
                let x = i as f64 / step as f64;
                (x, self.value_at(x))
            })
            .collect()
    }

    /// Contrast `amplitude / offset`, `None` for a zero offset.
    #[must_use]
    pub fn contrast(&self) -> Option<f64> {
        if self.offset == 0.0 {
            None
        } else {
            Some(self.amplitude / self.offset)
        }
    }
}

struct SinusProblem<'a> {
    data: &'a [f64],
    frequency: f64,
    poisson: bool,
}

impl LeastSquaresProblem for SinusProblem<'_> {
    fn num_params(&self) -> usize {
        3
    }

    fn num_points(&self) -> usize {
        self.data.len()
    }

    fn observed(&self, i: usize) -> f64 {
        self.data[i]
    }

    fn weight(&self, i: usize) -> f64 {
        if self.poisson {
            // Poisson variance equals the count; empty bins get unit variance.
            1.0 / self.data[i].max(1.0)
        } else {
            1.0
        }
    }

    fn evaluate(&self, i: usize, params: &DVector<f64>, gradient: &mut [f64]) -> f64 {
        let arg = self.frequency * i as f64 + params[PHASE];
        let (sin, cos) = arg.sin_cos();
        gradient[PHASE] = params[AMPLITUDE] * cos;
        gradient[AMPLITUDE] = sin;
        gradient[OFFSET] = 1.0;
        params[AMPLITUDE] * sin + params[OFFSET]
    }
}

/// Fits a fixed-frequency sinusoid, ignoring parameter errors.
///
/// # Errors
/// [`FitError::TooFewPoints`] for fewer than 3 samples,
/// [`FitError::DegenerateInput`] for constant data or an unusable
/// frequency, [`FitError::DidNotConverge`] if the optimizer fails.
pub fn fit_sinus<T: Copy + Into<f64>>(data: &[T], frequency: f64) -> Result<SinusFit> {
    fit(data, frequency, false, &LmConfig::default())
}

/// Fits a fixed-frequency sinusoid with Poisson weights and reports the
/// standard errors of phase, amplitude and offset.
///
/// # Errors
/// Same as [`fit_sinus`]; additionally [`FitError::DegenerateInput`] if
/// the covariance matrix is singular at the solution.
pub fn fit_sinus_with_errors<T: Copy + Into<f64>>(data: &[T], frequency: f64) -> Result<SinusFit> {
    fit(data, frequency, true, &LmConfig::default())
}

/// Fits with explicit optimizer settings.
///
/// # Errors
/// See [`fit_sinus`] and [`fit_sinus_with_errors`].
pub fn fit_sinus_with_config<T: Copy + Into<f64>>(
    data: &[T],
    frequency: f64,
    with_errors: bool,
    config: &LmConfig,
) -> Result<SinusFit> {
    fit(data, frequency, with_errors, config)
}

fn fit<T: Copy + Into<f64>>(
    data: &[T],
    frequency: f64,
    poisson: bool,
    config: &LmConfig,
) -> Result<SinusFit> {
    if data.len() < 3 {
        return Err(FitError::TooFewPoints {
            needed: 3,
            got: data.len(),
        });
    }
    if !frequency.is_finite() || frequency == 0.0 {
        return Err(FitError::DegenerateInput(format!(
            "unusable frequency {frequency}"
        )));
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

    let mean = samples.iter().sum::<f64>() / samples.len() as f64;
    let initial = DVector::from_vec(vec![0.0, (max - min) / 2.0, mean]);

    let problem = SinusProblem {
        data: &samples,
        frequency,
        poisson,
    };
    let solution = levenberg_marquardt(&problem, initial, config)?;

    let mut phase = solution.params[PHASE];
    let mut amplitude = solution.params[AMPLITUDE];
    let offset = solution.params[OFFSET];
    if !(phase.is_finite() && amplitude.is_finite() && offset.is_finite()) {
        return Err(FitError::DidNotConverge {
            iterations: solution.iterations,
        });
    }
    if amplitude < 0.0 {
        amplitude = -amplitude;
        phase += PI;
    }
    phase = phase.rem_euclid(TAU);
    if phase >= TAU {
        phase = 0.0;
    }

    let errors = if poisson {
        let covariance = solution.covariance.as_ref().ok_or_else(|| {
            FitError::DegenerateInput("singular covariance at solution".to_string())
        })?;
        Some(SinusErrors {
            phase: covariance[(PHASE, PHASE)].abs().sqrt(),
            amplitude: covariance[(AMPLITUDE, AMPLITUDE)].abs().sqrt(),
            offset: covariance[(OFFSET, OFFSET)].abs().sqrt(),
        })
    } else {
        None
    };

    Ok(SinusFit {
        frequency,
        phase,
        amplitude,
        offset,
        errors,
        chi2: solution.chi2,
        iterations: solution.iterations,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    fn synthetic(amp: f64, freq: f64, phase: f64, offset: f64, n: usize) -> Vec<u32> {
        (0..n)
            .map(|x| (amp * (freq * x as f64 + phase).sin() + offset).round() as u32)
            .collect()
    }

    #[test]
    fn test_too_few_points() {
        assert_eq!(
            fit_sinus(&[1u32, 2], 0.5),
            Err(FitError::TooFewPoints { needed: 3, got: 2 })
        );
        assert!(fit_sinus::<u32>(&[], 0.5).is_err());
    }

    #[test]
    fn test_all_zero_is_degenerate() {
        assert!(matches!(
            fit_sinus(&[0u32; 20], 0.5),
            Err(FitError::DegenerateInput(_))
        ));
        assert!(matches!(
            fit_sinus_with_errors(&[7u32; 16], 0.5),
            Err(FitError::DegenerateInput(_))
        ));
    }

    #[test]
    fn test_bad_frequency() {
        let data = synthetic(10.0, 0.5, 1.0, 20.0, 20);
        assert!(fit_sinus(&data, f64::NAN).is_err());
        assert!(fit_sinus(&data, 0.0).is_err());
    }

    #[test]
    fn test_negative_amplitude_is_normalized() {
        // Phase near pi from a zero start tends towards the mirrored
        // solution with negative amplitude.
        let data = synthetic(300.0, TAU / 16.0, 3.5, 1000.0, 32);
        let fit = fit_sinus(&data, TAU / 16.0).unwrap();
        assert!(fit.amplitude >= 0.0);
        assert!((0.0..TAU).contains(&fit.phase));
        assert_relative_eq!(fit.amplitude, 300.0, epsilon = 1.0);
        assert_relative_eq!(fit.phase, 3.5, epsilon = 0.01);
    }

    #[test]
    fn test_curve_sampling() {
        let fit = SinusFit {
            frequency: 1.0,
            phase: 0.0,
            amplitude: 2.0,
            offset: 5.0,
            errors: None,
            chi2: 0.0,
            iterations: 0,
        };
        let curve = fit.curve(16, 4);
        assert_eq!(curve.len(), 64);
        assert_relative_eq!(curve[16].0, 1.0);
        assert_relative_eq!(curve[16].1, 2.0 * 1.0f64.sin() + 5.0);
        assert_relative_eq!(fit.contrast().unwrap(), 0.4);
    }
}
