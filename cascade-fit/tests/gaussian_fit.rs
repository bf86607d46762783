#![allow(
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss
)]
use approx::assert_relative_eq;
use cascade_core::PadImage;
use cascade_fit::{fit_gaussian, fit_image, FitError};

fn bump(size_x: usize, size_y: usize, amp: f64, cx: f64, cy: f64, sx: f64, sy: f64) -> Vec<f64> {
    let mut data = Vec::with_capacity(size_x * size_y);
    for y in 0..size_y {
        for x in 0..size_x {
            let dx = x as f64 - cx;
            let dy = y as f64 - cy;
            data.push(amp * (-(dx * dx / (2.0 * sx * sx) + dy * dy / (2.0 * sy * sy))).exp());
        }
    }
    data
}

#[test]
fn test_recovers_synthetic_bump() {
    let data = bump(25, 20, 100.0, 12.3, 9.7, 2.5, 3.0);
    let fit = fit_gaussian(25, 20, &data).unwrap();

    assert_relative_eq!(fit.amplitude, 100.0, epsilon = 1e-4);
    assert_relative_eq!(fit.center_x, 12.3, epsilon = 1e-4);
    assert_relative_eq!(fit.center_y, 9.7, epsilon = 1e-4);
    assert_relative_eq!(fit.spread_x, 2.5, epsilon = 1e-4);
    assert_relative_eq!(fit.spread_y, 3.0, epsilon = 1e-4);
}

#[test]
fn test_recovers_integer_counts_image() {
    let counts: Vec<u32> = bump(32, 32, 1000.0, 14.0, 17.5, 3.0, 2.0)
        .into_iter()
        .map(|v| v.round() as u32)
        .collect();
    let image = PadImage::from_counts(32, 32, counts).unwrap();
    let fit = fit_image(&image).unwrap();

    assert_relative_eq!(fit.amplitude, 1000.0, epsilon = 2.0);
    assert_relative_eq!(fit.center_x, 14.0, epsilon = 0.01);
    assert_relative_eq!(fit.center_y, 17.5, epsilon = 0.01);
    assert_relative_eq!(fit.spread_x, 3.0, epsilon = 0.01);
    assert_relative_eq!(fit.spread_y, 2.0, epsilon = 0.01);
}

#[test]
fn test_off_center_bump_near_edge() {
    let data = bump(16, 16, 50.0, 3.0, 11.0, 1.5, 1.5);
    let fit = fit_gaussian(16, 16, &data).unwrap();
    assert_relative_eq!(fit.center_x, 3.0, epsilon = 1e-4);
    assert_relative_eq!(fit.center_y, 11.0, epsilon = 1e-4);
}

#[test]
fn test_empty_image_fails() {
    let image = PadImage::new(8, 8);
    assert!(matches!(
        fit_image(&image),
        Err(FitError::DegenerateInput(_))
    ));
}

#[test]
fn test_flat_grid_is_degenerate() {
    assert!(matches!(
        fit_gaussian(8, 8, &[5u32; 64]),
        Err(FitError::DegenerateInput(_))
    ));
}

#[test]
fn test_peak_wider_than_grid_fails() {
    // A spread of 40 on a 10x10 window is only a gentle dome.
    let data = bump(10, 10, 100.0, 4.5, 4.5, 40.0, 40.0);
    let result = fit_gaussian(10, 10, &data);
    assert!(
        matches!(result, Err(FitError::DidNotConverge { .. })),
        "{result:?}"
    );
}
