#![allow(
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss
)]
use approx::assert_relative_eq;
use cascade_fit::{fit_sinus, fit_sinus_with_errors, FitError};
use std::f64::consts::TAU;

fn noiseless(amp: f64, freq: f64, phase: f64, offset: f64, n: usize) -> Vec<f64> {
    (0..n)
        .map(|x| amp * (freq * x as f64 + phase).sin() + offset)
        .collect()
}

#[test]
fn test_recovers_noiseless_sinus() {
    let data = noiseless(10.0, 0.5, 1.0, 20.0, 20);
    let fit = fit_sinus(&data, 0.5).unwrap();

    assert_relative_eq!(fit.phase, 1.0, epsilon = 1e-3);
    assert_relative_eq!(fit.amplitude, 10.0, epsilon = 1e-3);
    assert_relative_eq!(fit.offset, 20.0, epsilon = 1e-3);
    assert!(fit.errors.is_none());
    assert!(fit.chi2 < 1e-6);
}

#[test]
fn test_all_zero_counts_fail() {
    let result = fit_sinus(&[0u32; 20], 0.5);
    assert!(matches!(result, Err(FitError::DegenerateInput(_))));
}

#[test]
fn test_weighted_fit_reports_errors() {
    let freq = TAU * 2.0 / 16.0;
    let data: Vec<u32> = noiseless(200.0, freq, 2.0, 1000.0, 16)
        .into_iter()
        .map(|v| v.round() as u32)
        .collect();
    let fit = fit_sinus_with_errors(&data, freq).unwrap();

    assert_relative_eq!(fit.amplitude, 200.0, epsilon = 1.0);
    assert_relative_eq!(fit.phase, 2.0, epsilon = 0.01);
    assert_relative_eq!(fit.offset, 1000.0, epsilon = 1.0);

    let errors = fit.errors.unwrap();
    // Poisson errors: offset error ~ sqrt(offset / N)
    assert!(errors.offset > 5.0 && errors.offset < 10.0);
    assert!(errors.amplitude > 0.0);
    assert!(errors.phase > 0.0 && errors.phase < 0.1);
}

#[test]
fn test_phase_wrapped_into_range() {
    // phase -1.0 is reported as 2*pi - 1.0
    let data = noiseless(10.0, 0.5, -1.0, 20.0, 20);
    let fit = fit_sinus(&data, 0.5).unwrap();
    assert!(fit.amplitude > 0.0);
    assert_relative_eq!(fit.phase, TAU - 1.0, epsilon = 1e-3);
}

#[test]
fn test_minimum_sample_count() {
    let data = noiseless(10.0, 0.5, 1.0, 20.0, 3);
    assert!(fit_sinus(&data, 0.5).is_ok());
    assert!(matches!(
        fit_sinus(&data[..2], 0.5),
        Err(FitError::TooFewPoints { needed: 3, got: 2 })
    ));
}
