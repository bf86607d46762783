//! DAT and binary writers for detector images.

use crate::Result;
use cascade_core::{CountGrid, PadImage, TofImage};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Writer for the tabular DAT export.
///
/// PAD images become a `# PAD image {w}x{h}` header followed by one
/// tab-separated row per y. TOF stacks get a summary header and then one
/// `# foil {f}, time channel {t}` block per channel image, each block
/// closed by a blank line.
pub struct DatWriter<W: Write> {
    writer: W,
    bytes_written: usize,
}

impl<W: Write> DatWriter<W> {
    /// Wraps any writer.
    #[must_use]
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            bytes_written: 0,
        }
    }

    /// Total bytes written so far.
    #[must_use]
    pub fn bytes_written(&self) -> usize {
        self.bytes_written
    }

    /// Writes a PAD image and returns the bytes it took.
    ///
    /// # Errors
    /// Returns an error if writing fails.
    pub fn write_pad(&mut self, image: &PadImage) -> Result<usize> {
        let start = self.bytes_written;
        self.line(&format!("# PAD image {}x{}", image.width(), image.height()))?;
        self.matrix(image)?;
        self.writer.flush()?;
        Ok(self.bytes_written - start)
    }

    /// Writes a TOF stack and returns the bytes it took.
    ///
    /// # Errors
    /// Returns an error if writing fails.
    pub fn write_tof(&mut self, tof: &TofImage) -> Result<usize> {
        let start = self.bytes_written;
        self.line(&format!(
            "# TOF image {}x{}, {} foils, {} time channels per foil",
            tof.width(),
            tof.height(),
            tof.foil_count(),
            tof.images_per_foil()
        ))?;
        for foil in 0..tof.foil_count() {
            for channel in 0..tof.images_per_foil() {
                self.line(&format!("# foil {foil}, time channel {channel}"))?;
                self.matrix(&tof.channel_image(foil, channel)?)?;
                self.line("")?;
            }
        }
        self.writer.flush()?;
        Ok(self.bytes_written - start)
    }

    fn matrix<G: CountGrid>(&mut self, grid: &G) -> Result<()> {
        let mut row = String::new();
        for y in 0..grid.height() {
            row.clear();
            for x in 0..grid.width() {
                if x > 0 {
                    row.push('\t');
                }
                row.push_str(&grid.count(x, y).to_string());
            }
            self.line(&row)?;
        }
        Ok(())
    }

    fn line(&mut self, text: &str) -> Result<()> {
        self.writer.write_all(text.as_bytes())?;
        self.writer.write_all(b"\n")?;
        self.bytes_written += text.len() + 1;
        Ok(())
    }
}

/// Streaming writer of native-endian `u32` values.
pub struct BinaryWriter {
    writer: BufWriter<File>,
    values: usize,
}

impl BinaryWriter {
    /// Wraps an already created file.
    #[must_use]
    pub fn new(file: File) -> Self {
        Self {
            writer: BufWriter::new(file),
            values: 0,
        }
    }

    /// Creates a binary output file.
    ///
    /// # Errors
    /// Returns an error if the file cannot be created.
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self> {
        Ok(Self::new(File::create(path)?))
    }

    /// Appends one value.
    ///
    /// # Errors
    /// Returns an error if writing fails.
    pub fn write_value(&mut self, value: u32) -> Result<()> {
        self.writer.write_all(&value.to_ne_bytes())?;
        self.values += 1;
        Ok(())
    }

    /// Flushes and returns the number of values written.
    ///
    /// # Errors
    /// Returns an error if flushing fails.
    pub fn finish(mut self) -> Result<usize> {
        self.writer.flush()?;
        Ok(self.values)
    }
}

/// Writes `values` as a native-endian `u32` sequence.
///
/// # Errors
/// Returns an error if the file cannot be created or written.
pub fn write_binary<P: AsRef<Path>>(path: P, values: &[u32]) -> Result<usize> {
    let mut writer = BinaryWriter::create(path)?;
    for &v in values {
        writer.write_value(v)?;
    }
    writer.finish()
}
