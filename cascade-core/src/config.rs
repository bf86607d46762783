//! Detector and acquisition configuration.
//!
//! Replaces the process-wide resolution/mode settings of the acquisition
//! front-end with a value that is passed by reference.

use crate::{Error, Result};
use std::f64::consts::TAU;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Acquisition mode of the detector server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum AcquisitionMode {
    /// Single 2D image.
    Pad,
    /// Time-of-flight stack.
    #[default]
    Tof,
}

/// Detector geometry and measurement settings.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct DetectorConfig {
    /// Image width in pixels (default: 128).
    pub width: usize,
    /// Image height in pixels (default: 128).
    pub height: usize,
    /// Total number of time channels in a TOF stack (default: 128).
    pub time_channels: usize,
    /// Acquisition mode (default: TOF).
    pub mode: AcquisitionMode,
    /// Server-side pseudo compression of TOF data.
    pub pseudo_compression: bool,
    /// Measurement time in seconds (default: 10.0).
    pub measurement_time: f64,
    /// Number of foils (default: 8).
    pub foil_count: usize,
    /// Time channels per foil (default: 16).
    pub images_per_foil: usize,
    /// Signal oscillations across one foil's time channels (default: 2.0).
    pub oscillations: f64,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            width: 128,
            height: 128,
            time_channels: 128,
            mode: AcquisitionMode::Tof,
            pseudo_compression: false,
            measurement_time: 10.0,
            foil_count: 8,
            images_per_foil: 16,
            oscillations: 2.0,
        }
    }
}

impl DetectorConfig {
    /// Creates a configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the image resolution.
    #[must_use]
    pub fn with_resolution(mut self, width: usize, height: usize) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    /// Sets the foil layout; `time_channels` follows as `foils * per_foil`.
    #[must_use]
    pub fn with_foils(mut self, foil_count: usize, images_per_foil: usize) -> Self {
        self.foil_count = foil_count;
        self.images_per_foil = images_per_foil;
        self.time_channels = foil_count * images_per_foil;
        self
    }

    /// Sets the acquisition mode.
    #[must_use]
    pub fn with_mode(mut self, mode: AcquisitionMode) -> Self {
        self.mode = mode;
        self
    }

    /// Enables or disables pseudo compression.
    #[must_use]
    pub fn with_pseudo_compression(mut self, enabled: bool) -> Self {
        self.pseudo_compression = enabled;
        self
    }

    /// Sets the measurement time in seconds.
    #[must_use]
    pub fn with_measurement_time(mut self, seconds: f64) -> Self {
        self.measurement_time = seconds;
        self
    }

    /// Sets the number of oscillations per foil.
    #[must_use]
    pub fn with_oscillations(mut self, oscillations: f64) -> Self {
        self.oscillations = oscillations;
        self
    }

    /// Number of pixels in one image.
    #[must_use]
    pub fn pixels_per_image(&self) -> usize {
        self.width * self.height
    }

    /// Angular frequency of the foil signal in radians per time channel.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn sinus_frequency(&self) -> f64 {
        TAU * self.oscillations / self.images_per_foil as f64
    }

    /// Checks dimensions for consistency.
    ///
    /// # Errors
    /// Returns [`Error::ConfigError`] on zero dimensions or when the foil
    /// layout does not add up to `time_channels`.
    pub fn validate(&self) -> Result<()> {
        if self.width == 0 || self.height == 0 {
            return Err(Error::ConfigError(format!(
                "image resolution must be non-zero, got {}x{}",
                self.width, self.height
            )));
        }
        if self.foil_count == 0 || self.images_per_foil == 0 {
            return Err(Error::ConfigError(
                "foil count and images per foil must be non-zero".to_string(),
            ));
        }
        if self.foil_count * self.images_per_foil != self.time_channels {
            return Err(Error::ConfigError(format!(
                "{} foils x {} images per foil does not match {} time channels",
                self.foil_count, self.images_per_foil, self.time_channels
            )));
        }
        if !self.measurement_time.is_finite() || self.measurement_time < 0.0 {
            return Err(Error::ConfigError(format!(
                "invalid measurement time: {}",
                self.measurement_time
            )));
        }
        Ok(())
    }
}
