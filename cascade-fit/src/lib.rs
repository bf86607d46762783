//! cascade-fit: Curve fitting for CASCADE detector data.
//!
//! This crate provides:
//! - **Sinusoid** - fixed-frequency sine fit of 1D count sequences, with
//!   optional Poisson-weighted parameter errors
//! - **Gaussian** - axis-aligned 2D Gaussian fit of count grids
//! - **Foil fits** - per-foil sinusoid fits of TOF stacks inside a ROI
//!
//! All fits share one Levenberg-Marquardt driver ([`lm`]).
//!
#![warn(missing_docs)]

mod error;
mod foil;
mod gaussian;
pub mod lm;
mod sinus;

pub use error::{FitError, Result};
pub use foil::{fit_all_foils, fit_foil, fit_graph};
pub use gaussian::{fit_gaussian, fit_gaussian_with_config, fit_image, GaussianFit};
pub use lm::{LeastSquaresProblem, LmConfig, LmSolution};
pub use sinus::{fit_sinus, fit_sinus_with_config, fit_sinus_with_errors, SinusErrors, SinusFit};
