#![allow(
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss
)]
use approx::assert_relative_eq;
use cascade_core::{DetectorConfig, Roi, RoiElement, RoiRect, TofImage};
use cascade_fit::{fit_all_foils, fit_foil};

/// 8x8 pixels, 3 foils x 16 channels; foil `f` oscillates with phase 0.5 + f.
fn modulated_stack(config: &DetectorConfig) -> TofImage {
    let freq = config.sinus_frequency();
    let pixels = config.pixels_per_image();
    let mut data = Vec::with_capacity(pixels * config.time_channels);
    for foil in 0..config.foil_count {
        let phase = 0.5 + foil as f64;
        for channel in 0..config.images_per_foil {
            let value = (50.0 + 20.0 * (freq * channel as f64 + phase).sin()).round() as u32;
            data.extend(std::iter::repeat(value).take(pixels));
        }
    }
    TofImage::from_config(config, data).unwrap()
}

fn two_by_two() -> Roi {
    let mut roi = Roi::new();
    roi.add(RoiElement::Rectangle(RoiRect {
        x1: 2.0,
        y1: 2.0,
        x2: 3.0,
        y2: 3.0,
    }));
    roi
}

#[test]
fn test_fit_single_foil() {
    let config = DetectorConfig::default()
        .with_resolution(8, 8)
        .with_foils(3, 16);
    let tof = modulated_stack(&config);
    let fit = fit_foil(&tof, 1, &two_by_two(), &config, true).unwrap();

    assert_relative_eq!(fit.phase, 1.5, epsilon = 0.05);
    assert_relative_eq!(fit.amplitude, 80.0, epsilon = 2.0);
    assert_relative_eq!(fit.offset, 200.0, epsilon = 2.0);
    assert!(fit.errors.is_some());
}

#[test]
fn test_fit_all_foils_in_order() {
    let config = DetectorConfig::default()
        .with_resolution(8, 8)
        .with_foils(3, 16);
    let tof = modulated_stack(&config);
    let fits = fit_all_foils(&tof, &two_by_two(), &config, false);

    assert_eq!(fits.len(), 3);
    for (foil, fit) in fits.iter().enumerate() {
        let fit = fit.as_ref().unwrap();
        assert_relative_eq!(fit.phase, 0.5 + foil as f64, epsilon = 0.05);
    }
}
