//! Image file format detection.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

/// Detector image file formats, told apart by extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileFormat {
    /// Single 2D image.
    Pad,
    /// Time-of-flight stack.
    Tof,
}

impl FileFormat {
    /// Detects the format from the file extension, ignoring case.
    ///
    /// Returns `None` for a missing or unknown extension.
    #[must_use]
    pub fn from_path<P: AsRef<Path>>(path: P) -> Option<Self> {
        let ext = path.as_ref().extension()?.to_str()?;
        if ext.eq_ignore_ascii_case("pad") {
            Some(Self::Pad)
        } else if ext.eq_ignore_ascii_case("tof") {
            Some(Self::Tof)
        } else {
            None
        }
    }
}

impl fmt::Display for FileFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Pad => "PAD",
            Self::Tof => "TOF",
        })
    }
}
