//! Error types for cascade-core.

use thiserror::Error;

/// Result type alias for cascade operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Core error types for cascade operations.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    /// ROI element index outside `[0, len)`.
    #[error("ROI element index {index} out of range (roi has {len} elements)")]
    IndexOutOfRange { index: usize, len: usize },

    /// ROI parameter index outside `[0, count)`.
    #[error("invalid parameter index {index} (element has {count} parameters)")]
    InvalidParameterIndex { index: usize, count: usize },

    /// Unknown ROI element type name.
    #[error("unknown ROI element type: {0}")]
    UnknownRoiKind(String),

    /// Image coordinate or channel outside the image.
    #[error("image index out of range: {0}")]
    ImageIndex(String),

    /// Data length does not match the image dimensions.
    #[error("expected {expected} values, got {actual}")]
    SizeMismatch { expected: usize, actual: usize },

    /// Configuration error.
    #[error("configuration error: {0}")]
    ConfigError(String),
}
