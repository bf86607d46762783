//! Fit error types.

use thiserror::Error;

/// Result type for fit routines.
pub type Result<T> = std::result::Result<T, FitError>;

/// Reasons a fit produced no usable parameters.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FitError {
    /// Not enough samples to constrain the free parameters.
    #[error("too few points: need at least {needed}, got {got}")]
    TooFewPoints {
        /// Minimum number of samples.
        needed: usize,
        /// Samples supplied.
        got: usize,
    },

    /// Data carry no information the model could be fitted to.
    #[error("degenerate input: {0}")]
    DegenerateInput(String),

    /// The optimizer gave up or produced non-finite parameters.
    #[error("fit did not converge after {iterations} iterations")]
    DidNotConverge {
        /// Iterations performed before giving up.
        iterations: usize,
    },

    /// Data length does not match the stated dimensions.
    #[error("data length {actual} does not match dimensions ({expected} expected)")]
    DimensionMismatch {
        /// `size_x * size_y`.
        expected: usize,
        /// Length of the supplied slice.
        actual: usize,
    },

    /// Extracting the data to fit failed.
    #[error("core error: {0}")]
    Core(#[from] cascade_core::Error),
}
