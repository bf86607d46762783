//! I/O error types.

use std::path::PathBuf;
use thiserror::Error;

/// Result type for I/O operations.
pub type Result<T> = std::result::Result<T, Error>;

/// I/O error types.
#[derive(Error, Debug)]
pub enum Error {
    /// File I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A source or destination file could not be opened.
    #[error("cannot open {}: {source}", path.display())]
    FileOpen {
        /// Offending path.
        path: PathBuf,
        /// Underlying OS error.
        source: std::io::Error,
    },

    /// The file extension names no known image format.
    #[error("unable to identify type of file {}", .0.display())]
    FormatMismatch(PathBuf),

    /// Invalid file contents.
    #[error("invalid file format: {0}")]
    InvalidFormat(String),

    /// An export completed without producing any output.
    #[error("no data written to {}", .0.display())]
    NothingWritten(PathBuf),

    /// JSON (de)serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Core library error.
    #[error("core error: {0}")]
    CoreError(#[from] cascade_core::Error),
}
