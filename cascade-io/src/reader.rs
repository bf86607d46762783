//! Memory-mapped readers for PAD and TOF images.
//!
//! Both formats come in two flavours: the native-endian `u32` binary dump
//! produced by the converter, and the legacy whitespace-delimited text dump.
//! A file whose size equals exactly four bytes per expected value is read as
//! binary; anything else is parsed as text.

use crate::{Error, Result};
use cascade_core::{DetectorConfig, PadImage, TofImage};
use memmap2::Mmap;
use std::fs::File;
use std::path::{Path, PathBuf};

/// A memory-mapped file reader.
///
/// Uses memmap2 to access file contents without loading the entire file
/// into memory.
pub struct MappedFileReader {
    mmap: Mmap,
    path: PathBuf,
}

impl MappedFileReader {
    /// Opens a file for memory-mapped reading.
    ///
    /// # Errors
    /// Returns [`Error::FileOpen`] if the file cannot be opened, or
    /// [`Error::Io`] if it cannot be mapped.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = File::open(&path).map_err(|source| Error::FileOpen {
            path: path.clone(),
            source,
        })?;
        // SAFETY: The file is opened read-only and we assume it is not modified concurrently.
        // This is the standard safety contract for memory mapping.
        #[allow(unsafe_code)]
        let mmap = unsafe { Mmap::map(&file)? };
        Ok(Self { mmap, path })
    }

    /// Returns the file contents as a byte slice.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.mmap[..]
    }

    /// Returns the file size in bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.mmap.len()
    }

    /// Returns true if the file is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.mmap.is_empty()
    }

    /// Path the reader was opened with.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Decodes the whole file as native-endian `u32` values.
    ///
    /// Trailing bytes that do not fill a full value are ignored.
    #[must_use]
    pub fn ne_u32_values(&self) -> Vec<u32> {
        self.mmap
            .chunks_exact(4)
            .map(|c| u32::from_ne_bytes([c[0], c[1], c[2], c[3]]))
            .collect()
    }

    /// True if the file is a binary dump of exactly `values` `u32` values.
    ///
    /// Files made only of ASCII digits and whitespace are text dumps
    /// whatever their size.
    #[must_use]
    pub fn is_binary_of(&self, values: usize) -> bool {
        !is_text_dump(self.as_bytes()) && values.checked_mul(4) == Some(self.len())
    }
}

/// True for non-empty contents holding nothing but ASCII digits and whitespace.
fn is_text_dump(bytes: &[u8]) -> bool {
    !bytes.is_empty()
        && bytes
            .iter()
            .all(|b| b.is_ascii_digit() || b.is_ascii_whitespace())
}

/// Parses one whitespace-delimited token as an unsigned integer.
pub(crate) fn parse_token(token: &[u8]) -> Option<u32> {
    std::str::from_utf8(token).ok()?.parse().ok()
}

/// Whitespace-delimited tokens of `bytes`, parsed up to the first token
/// that is not an unsigned integer.
pub(crate) fn leading_integers(bytes: &[u8]) -> impl Iterator<Item = u32> + '_ {
    bytes
        .split(u8::is_ascii_whitespace)
        .filter(|token| !token.is_empty())
        .map_while(parse_token)
}

/// Non-blank lines of a text dump, with their 1-based index among them.
pub(crate) fn text_lines(bytes: &[u8]) -> impl Iterator<Item = (usize, &[u8])> {
    bytes
        .split(|&b| b == b'\n')
        .filter(|line| !line.iter().all(u8::is_ascii_whitespace))
        .enumerate()
        .map(|(i, line)| (i + 1, line))
}

/// Reads a PAD image sized by `config`.
///
/// # Errors
/// [`Error::FileOpen`] if the file cannot be opened, [`Error::InvalidFormat`]
/// if it does not hold exactly `width * height` values.
pub fn read_pad<P: AsRef<Path>>(path: P, config: &DetectorConfig) -> Result<PadImage> {
    let reader = MappedFileReader::open(path)?;
    let expected = config.pixels_per_image();
    let values = if reader.is_binary_of(expected) {
        reader.ne_u32_values()
    } else {
        leading_integers(reader.as_bytes()).collect()
    };
    check_count(&reader, "PAD", expected, values.len())?;
    Ok(PadImage::from_config(config, values)?)
}

/// Reads a TOF stack sized by `config`.
///
/// Text lines carry `[time channel] [counts] [values...]`; the two leading
/// tokens are skipped.
///
/// # Errors
/// [`Error::FileOpen`] if the file cannot be opened, [`Error::InvalidFormat`]
/// if it does not hold exactly `width * height * time_channels` values.
pub fn read_tof<P: AsRef<Path>>(path: P, config: &DetectorConfig) -> Result<TofImage> {
    let reader = MappedFileReader::open(path)?;
    let expected = config.pixels_per_image() * config.time_channels;
    let values: Vec<u32> = if reader.is_binary_of(expected) {
        reader.ne_u32_values()
    } else {
        let mut values = Vec::with_capacity(expected);
        for (_, line) in text_lines(reader.as_bytes()) {
            values.extend(leading_integers(line).skip(2));
        }
        values
    };
    check_count(&reader, "TOF", expected, values.len())?;
    Ok(TofImage::from_config(config, values)?)
}

fn check_count(reader: &MappedFileReader, kind: &str, expected: usize, got: usize) -> Result<()> {
    if expected == got {
        Ok(())
    } else {
        Err(Error::InvalidFormat(format!(
            "{}: expected {expected} {kind} values, found {got}",
            reader.path().display()
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cascade_core::CountGrid;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn small() -> DetectorConfig {
        DetectorConfig::default()
            .with_resolution(2, 2)
            .with_foils(1, 2)
    }

    #[test]
    fn test_leading_integers_stop_at_garbage() {
        let values: Vec<u32> = leading_integers(b"  1 2\t3\n4 x 5").collect();
        assert_eq!(values, vec![1, 2, 3, 4]);
        assert_eq!(leading_integers(b"-1 2").count(), 0);
    }

    #[test]
    fn test_text_lines_skip_blank() {
        let lines: Vec<_> = text_lines(b"1 2\n\n   \n3 4\n").map(|(i, _)| i).collect();
        assert_eq!(lines, vec![1, 2]);
    }

    #[test]
    fn test_read_pad_text() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "1 2\n3 4").unwrap();
        let image = read_pad(file.path(), &small()).unwrap();
        assert_eq!(image.count(1, 1), 4);
        assert_eq!(image.total(), 10);
    }

    #[test]
    fn test_read_pad_binary() {
        let mut file = NamedTempFile::new().unwrap();
        for v in [7u32, 8, 9, 10] {
            file.write_all(&v.to_ne_bytes()).unwrap();
        }
        file.flush().unwrap();
        let image = read_pad(file.path(), &small()).unwrap();
        assert_eq!(image.data(), &[7, 8, 9, 10]);
    }

    #[test]
    fn test_text_with_binary_size_is_text() {
        // 16 bytes, exactly four u32 for a 2x2 image
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "100 200 300 400").unwrap();
        file.flush().unwrap();
        let image = read_pad(file.path(), &small()).unwrap();
        assert_eq!(image.data(), &[100, 200, 300, 400]);
    }

    #[test]
    fn test_is_text_dump() {
        assert!(is_text_dump(b"1 2\n3\t4\r\n"));
        assert!(!is_text_dump(b""));
        assert!(!is_text_dump(&7u32.to_ne_bytes()));
    }

    #[test]
    fn test_read_tof_text() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "1 10 1 2 3 4").unwrap();
        writeln!(file).unwrap();
        writeln!(file, "2 26 5 6 7 8").unwrap();
        let tof = read_tof(file.path(), &small()).unwrap();
        assert_eq!(tof.get(0, 1, 0, 0), Some(5));
        assert_eq!(tof.overview().data(), &[6, 8, 10, 12]);
    }

    #[test]
    fn test_wrong_value_count() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "1 2 3").unwrap();
        assert!(matches!(
            read_pad(file.path(), &small()),
            Err(Error::InvalidFormat(_))
        ));
    }

    #[test]
    fn test_missing_file() {
        let err = read_pad("/nonexistent/image.pad", &small()).unwrap_err();
        assert!(matches!(err, Error::FileOpen { .. }));
    }
}
