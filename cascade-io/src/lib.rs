//! cascade-io: File I/O for CASCADE detector data.
//!
//! This crate provides memory-mapped readers for PAD and TOF images (binary
//! or legacy text), DAT and binary writers, the text-to-binary and DAT
//! converters, and JSON persistence for ROIs and detector configurations.
//!

mod config_file;
mod convert;
mod error;
mod format;
mod reader;
mod roi_file;
mod writer;

pub use config_file::{load_config, save_config};
pub use convert::{convert_to_binary, convert_to_dat, counts_path, ConversionRecord};
pub use error::{Error, Result};
pub use format::FileFormat;
pub use reader::{read_pad, read_tof, MappedFileReader};
pub use roi_file::{load_roi, save_roi};
pub use writer::{write_binary, BinaryWriter, DatWriter};
