//! Detector configuration files.

use crate::Result;
use cascade_core::DetectorConfig;
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

/// Loads a [`DetectorConfig`] from JSON; missing fields keep their defaults.
///
/// # Errors
/// Returns an error if the file cannot be read, is not valid JSON, or
/// describes an inconsistent detector.
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<DetectorConfig> {
    let reader = BufReader::new(File::open(path.as_ref())?);
    let config: DetectorConfig = serde_json::from_reader(reader)?;
    config.validate()?;
    log::debug!("loaded detector config from {}", path.as_ref().display());
    Ok(config)
}

/// Writes a [`DetectorConfig`] as pretty-printed JSON.
///
/// # Errors
/// Returns an error if the file cannot be written.
pub fn save_config<P: AsRef<Path>>(path: P, config: &DetectorConfig) -> Result<()> {
    let mut writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer_pretty(&mut writer, config)?;
    writer.write_all(b"\n")?;
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use cascade_core::AcquisitionMode;
    use tempfile::NamedTempFile;

    #[test]
    fn test_partial_config_uses_defaults() {
        let file = NamedTempFile::new().unwrap();
        std::fs::write(file.path(), r#"{"width": 64, "height": 32, "mode": "pad"}"#).unwrap();

        let config = load_config(file.path()).unwrap();
        assert_eq!(config.width, 64);
        assert_eq!(config.height, 32);
        assert_eq!(config.mode, AcquisitionMode::Pad);
        assert_eq!(config.time_channels, 128);
        assert_eq!(config.foil_count, 8);
    }

    #[test]
    fn test_inconsistent_config_rejected() {
        let file = NamedTempFile::new().unwrap();
        std::fs::write(file.path(), r#"{"foil_count": 3}"#).unwrap();
        assert!(matches!(
            load_config(file.path()),
            Err(crate::Error::CoreError(_))
        ));
    }

    #[test]
    fn test_save_then_load() {
        let config = DetectorConfig::default()
            .with_resolution(16, 16)
            .with_foils(4, 8)
            .with_measurement_time(2.5);
        let file = NamedTempFile::new().unwrap();
        save_config(file.path(), &config).unwrap();
        assert_eq!(load_config(file.path()).unwrap(), config);
    }
}
