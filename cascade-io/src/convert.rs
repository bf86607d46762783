//! PAD/TOF format conversion.
//!
//! Every converter logs its progress and failures with a `Conversion:`
//! prefix and also returns the outcome, so batch drivers can move on to the
//! next file.

use crate::format::FileFormat;
use crate::reader::{leading_integers, read_pad, read_tof, text_lines, MappedFileReader};
use crate::writer::{BinaryWriter, DatWriter};
use crate::{Error, Result};
use cascade_core::DetectorConfig;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// Outcome of a successful conversion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversionRecord {
    /// Input file.
    pub source: PathBuf,
    /// Output file.
    pub destination: PathBuf,
    /// Detected input format.
    pub format: FileFormat,
    /// `u32` values for binary output, bytes for DAT output.
    pub values_written: usize,
    /// Time channels seen in a TOF input.
    pub time_channels: Option<usize>,
    /// Per-channel counts table written next to a TOF binary.
    pub counts_path: Option<PathBuf>,
}

/// Path of the counts table for a binary output: `dst` with `.counts`
/// appended.
#[must_use]
pub fn counts_path(dst: &Path) -> PathBuf {
    let mut path = dst.as_os_str().to_owned();
    path.push(".counts");
    PathBuf::from(path)
}

fn open_source(src: &Path) -> Result<MappedFileReader> {
    MappedFileReader::open(src)
        .inspect_err(|_| log::error!("Conversion: Cannot open \"{}\".", src.display()))
}

fn create_file(path: &Path) -> Result<File> {
    File::create(path).map_err(|source| {
        log::error!("Conversion: Cannot open \"{}\".", path.display());
        Error::FileOpen {
            path: path.to_path_buf(),
            source,
        }
    })
}

/// Removes a half-created output file.
fn discard(path: &Path) {
    if let Err(err) = std::fs::remove_file(path) {
        log::warn!("Conversion: Cannot remove \"{}\": {err}", path.display());
    }
}

/// Converts a legacy text dump into a native-endian `u32` binary.
///
/// Files with a `tof` extension are read line by line as
/// `[time channel] [counts] [values...]`: the values go to `dst`, the
/// channel/counts pairs to the table at [`counts_path`]. Any other file is
/// treated as PAD, every leading unsigned integer going to `dst`.
///
/// # Errors
/// [`Error::FileOpen`] if the source cannot be opened or an output cannot
/// be created; no output is left behind in either case. [`Error::Io`] on
/// write failure.
pub fn convert_to_binary<P: AsRef<Path>, Q: AsRef<Path>>(
    src: P,
    dst: Q,
) -> Result<ConversionRecord> {
    let src = src.as_ref();
    let dst = dst.as_ref();
    let source = open_source(src)?;
    let output = BinaryWriter::new(create_file(dst)?);

    let is_tof = FileFormat::from_path(src) == Some(FileFormat::Tof);
    let record = if is_tof {
        let counts_path = counts_path(dst);
        let counts = match create_file(&counts_path) {
            Ok(file) => file,
            Err(err) => {
                drop(output);
                discard(dst);
                return Err(err);
            }
        };
        tof_to_binary(&source, output, dst, counts, counts_path)?
    } else {
        let values = pad_to_binary(&source, output)?;
        ConversionRecord {
            source: src.to_path_buf(),
            destination: dst.to_path_buf(),
            format: FileFormat::Pad,
            values_written: values,
            time_channels: None,
            counts_path: None,
        }
    };
    log::debug!(
        "Conversion: wrote {} values from \"{}\" to \"{}\".",
        record.values_written,
        src.display(),
        dst.display()
    );
    Ok(record)
}

fn pad_to_binary(source: &MappedFileReader, mut output: BinaryWriter) -> Result<usize> {
    for value in leading_integers(source.as_bytes()) {
        output.write_value(value)?;
    }
    output.finish()
}

fn tof_to_binary(
    source: &MappedFileReader,
    mut output: BinaryWriter,
    dst: &Path,
    counts: File,
    counts_path: PathBuf,
) -> Result<ConversionRecord> {
    let mut counts = BufWriter::new(counts);
    counts.write_all(b"# timechannel\tcounts\n")?;

    let mut time_channels = 0;
    for (line_no, line) in text_lines(source.as_bytes()) {
        let mut tokens = leading_integers(line);
        let (Some(channel), Some(count)) = (tokens.next(), tokens.next()) else {
            log::warn!("Conversion: Skipping malformed line {line_no}.");
            continue;
        };
        if usize::try_from(channel).ok() != Some(line_no) {
            log::warn!(
                "Conversion: Mismatch in TOF time channel index, expected {line_no}, got {channel}."
            );
        }
        writeln!(counts, "{channel}\t{count}")?;
        for value in tokens {
            output.write_value(value)?;
        }
        time_channels += 1;
    }
    counts.flush()?;
    log::info!("Conversion: Number of time channels: {time_channels}.");

    Ok(ConversionRecord {
        source: source.path().to_path_buf(),
        destination: dst.to_path_buf(),
        format: FileFormat::Tof,
        values_written: output.finish()?,
        time_channels: Some(time_channels),
        counts_path: Some(counts_path),
    })
}

/// Loads a PAD or TOF image and exports it as DAT.
///
/// `values_written` in the record counts bytes.
///
/// # Errors
/// [`Error::FormatMismatch`] for an unknown extension (nothing is read or
/// written), any reader error, [`Error::NothingWritten`] if the export
/// produced no bytes.
pub fn convert_to_dat<P: AsRef<Path>, Q: AsRef<Path>>(
    src: P,
    dst: Q,
    config: &DetectorConfig,
) -> Result<ConversionRecord> {
    let src = src.as_ref();
    let dst = dst.as_ref();
    let Some(format) = FileFormat::from_path(src) else {
        log::error!("Conversion: Unable to identify type of file \"{}\".", src.display());
        return Err(Error::FormatMismatch(src.to_path_buf()));
    };

    let exported = export_dat(src, dst, format, config);
    let (bytes, time_channels) = match exported {
        Ok(result) => result,
        Err(err) => {
            log::error!("Conversion: Cannot convert \"{}\": {err}", src.display());
            return Err(err);
        }
    };
    if bytes == 0 {
        log::error!("Conversion: No data written to \"{}\".", dst.display());
        return Err(Error::NothingWritten(dst.to_path_buf()));
    }

    Ok(ConversionRecord {
        source: src.to_path_buf(),
        destination: dst.to_path_buf(),
        format,
        values_written: bytes,
        time_channels,
        counts_path: None,
    })
}

fn export_dat(
    src: &Path,
    dst: &Path,
    format: FileFormat,
    config: &DetectorConfig,
) -> Result<(usize, Option<usize>)> {
    match format {
        FileFormat::Pad => {
            let image = read_pad(src, config)?;
            let mut writer = DatWriter::new(BufWriter::new(create_file(dst)?));
            Ok((writer.write_pad(&image)?, None))
        }
        FileFormat::Tof => {
            let tof = read_tof(src, config)?;
            let mut writer = DatWriter::new(BufWriter::new(create_file(dst)?));
            Ok((writer.write_tof(&tof)?, Some(tof.time_channels())))
        }
    }
}
