//! Per-foil sinusoid fits on TOF stacks.

use crate::sinus::{fit_sinus, fit_sinus_with_errors, SinusFit};
use crate::Result;
use cascade_core::{DetectorConfig, Roi, TofGraph, TofImage};
use rayon::prelude::*;

/// Fits a foil graph with the configured oscillation frequency.
///
/// # Errors
/// Any [`crate::FitError`] from the sinusoid fit.
pub fn fit_graph(graph: &TofGraph, config: &DetectorConfig, with_errors: bool) -> Result<SinusFit> {
    let frequency = config.sinus_frequency();
    if with_errors {
        fit_sinus_with_errors(graph.counts(), frequency)
    } else {
        fit_sinus(graph.counts(), frequency)
    }
}

/// Extracts the ROI graph of one foil and fits it.
///
/// # Errors
/// [`crate::FitError::Core`] for an invalid foil, otherwise the fit error.
pub fn fit_foil(
    tof: &TofImage,
    foil: usize,
    roi: &Roi,
    config: &DetectorConfig,
    with_errors: bool,
) -> Result<SinusFit> {
    let graph = tof.graph(foil, roi)?;
    fit_graph(&graph, config, with_errors)
}

/// Fits every foil of the stack in parallel, one result per foil.
#[must_use]
pub fn fit_all_foils(
    tof: &TofImage,
    roi: &Roi,
    config: &DetectorConfig,
    with_errors: bool,
) -> Vec<Result<SinusFit>> {
    (0..tof.foil_count())
        .into_par_iter()
        .map(|foil| fit_foil(tof, foil, roi, config, with_errors))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::FitError;

    #[test]
    fn test_invalid_foil() {
        let config = DetectorConfig::default().with_resolution(2, 2).with_foils(1, 4);
        let tof = TofImage::from_config(&config, vec![1; 16]).unwrap();
        let roi = Roi::new();
        assert!(matches!(
            fit_foil(&tof, 3, &roi, &config, false),
            Err(FitError::Core(_))
        ));
        // empty ROI -> all-zero graph
        assert!(matches!(
            fit_foil(&tof, 0, &roi, &config, false),
            Err(FitError::DegenerateInput(_))
        ));
    }
}
