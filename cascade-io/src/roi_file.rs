//! ROI persistence as JSON.

use crate::Result;
use cascade_core::Roi;
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

/// Saves a ROI as pretty-printed JSON, one object per element tagged by
/// its type name.
///
/// # Errors
/// Returns an error if the file cannot be written.
pub fn save_roi<P: AsRef<Path>>(path: P, roi: &Roi) -> Result<()> {
    let mut writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer_pretty(&mut writer, roi)?;
    writer.write_all(b"\n")?;
    writer.flush()?;
    Ok(())
}

/// Loads a ROI saved by [`save_roi`].
///
/// # Errors
/// Returns an error if the file cannot be read or is not a valid ROI.
pub fn load_roi<P: AsRef<Path>>(path: P) -> Result<Roi> {
    let reader = BufReader::new(File::open(path)?);
    Ok(serde_json::from_reader(reader)?)
}
