//! cascade: CASCADE detector data tool.
//!
//! Converts legacy PAD/TOF dumps, fits foil oscillations and detector
//! images, and sums counts inside ROIs.
#![allow(clippy::uninlined_format_args, clippy::cast_precision_loss)]

use cascade_core::{CountGrid, DetectorConfig, PadImage, Roi, RoiElement, RoiRect, TofImage};
use cascade_fit::{fit_all_foils, fit_foil, fit_image, FitError, GaussianFit, SinusFit};
use cascade_io::{FileFormat, MappedFileReader};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Result type for CLI operations.
type Result<T> = std::result::Result<T, CliError>;

/// CLI error types.
#[derive(Error, Debug)]
enum CliError {
    #[error("I/O error: {0}")]
    CascadeIo(#[from] cascade_io::Error),

    #[error("Core error: {0}")]
    Core(#[from] cascade_core::Error),

    #[error("Fit error: {0}")]
    Fit(#[from] FitError),

    #[error("{failed} of {total} foil fits failed")]
    FoilFits { failed: usize, total: usize },
}

/// CASCADE detector data processor.
#[derive(Parser)]
#[command(name = "cascade")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Detector configuration (JSON); defaults to 128x128, 8 foils x 16 channels
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert a PAD/TOF text dump into a native-endian u32 binary
    ToBinary {
        /// Input text file (.pad or .tof)
        src: PathBuf,
        /// Output binary file
        dst: PathBuf,
    },

    /// Export a PAD/TOF image as tab-separated DAT
    ToDat {
        /// Input image (.pad or .tof)
        src: PathBuf,
        /// Output DAT file
        dst: PathBuf,
    },

    /// Fit a 2D Gaussian to a PAD image or the overview of a TOF stack
    FitGauss {
        /// Input image (.pad or .tof)
        input: PathBuf,
    },

    /// Fit the foil oscillation inside a ROI
    FitSinus {
        /// Input TOF stack
        input: PathBuf,

        /// Foil to fit; all foils if omitted
        #[arg(short, long)]
        foil: Option<usize>,

        /// ROI file (JSON); the whole image if omitted
        #[arg(short, long)]
        roi: Option<PathBuf>,

        /// Poisson-weighted fit with parameter errors
        #[arg(short, long)]
        errors: bool,
    },

    /// Sum counts inside a ROI
    RoiSum {
        /// Input image (.pad or .tof)
        input: PathBuf,

        /// ROI file (JSON)
        #[arg(short, long)]
        roi: PathBuf,
    },

    /// Show information about an image file
    Info {
        /// Input image (.pad or .tof)
        input: PathBuf,
    },
}

enum Image {
    Pad(PadImage),
    Tof(TofImage),
}

fn load_image(path: &Path, config: &DetectorConfig) -> Result<Image> {
    match FileFormat::from_path(path) {
        Some(FileFormat::Pad) => Ok(Image::Pad(cascade_io::read_pad(path, config)?)),
        Some(FileFormat::Tof) => Ok(Image::Tof(cascade_io::read_tof(path, config)?)),
        None => Err(cascade_io::Error::FormatMismatch(path.to_path_buf()).into()),
    }
}

fn load_tof(path: &Path, config: &DetectorConfig) -> Result<TofImage> {
    match load_image(path, config)? {
        Image::Tof(tof) => Ok(tof),
        Image::Pad(_) => Err(cascade_io::Error::InvalidFormat(format!(
            "{} is not a TOF stack",
            path.display()
        ))
        .into()),
    }
}

fn whole_image(config: &DetectorConfig) -> Roi {
    let mut roi = Roi::new();
    roi.add(RoiElement::Rectangle(RoiRect {
        x1: 0.0,
        y1: 0.0,
        x2: config.width.saturating_sub(1) as f64,
        y2: config.height.saturating_sub(1) as f64,
    }));
    roi
}

fn print_gaussian(fit: &GaussianFit) {
    println!("Amplitude: {:.4}", fit.amplitude);
    println!("Center:    ({:.4}, {:.4})", fit.center_x, fit.center_y);
    println!("Spread:    ({:.4}, {:.4})", fit.spread_x, fit.spread_y);
    println!("Chi2:      {:.4} ({} iterations)", fit.chi2, fit.iterations);
}

fn print_sinus(foil: usize, fit: &SinusFit) {
    let contrast = fit
        .contrast()
        .map_or_else(|| "-".to_string(), |c| format!("{:.4}", c));
    match fit.errors {
        Some(err) => println!(
            "foil {}: phase {:.4} +- {:.4}, amplitude {:.2} +- {:.2}, offset {:.2} +- {:.2}, contrast {}",
            foil,
            fit.phase,
            err.phase,
            fit.amplitude,
            err.amplitude,
            fit.offset,
            err.offset,
            contrast
        ),
        None => println!(
            "foil {}: phase {:.4}, amplitude {:.2}, offset {:.2}, contrast {}",
            foil, fit.phase, fit.amplitude, fit.offset, contrast
        ),
    }
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => cascade_io::load_config(path)?,
        None => DetectorConfig::default(),
    };
    log::debug!("detector config: {:?}", config);

    match cli.command {
        Commands::ToBinary { src, dst } => {
            let record = cascade_io::convert_to_binary(&src, &dst)?;
            println!(
                "Wrote {} values ({}) to {}",
                record.values_written,
                record.format,
                record.destination.display()
            );
            if let (Some(channels), Some(counts)) = (record.time_channels, &record.counts_path) {
                println!("Time channels: {} (counts in {})", channels, counts.display());
            }
        }

        Commands::ToDat { src, dst } => {
            let record = cascade_io::convert_to_dat(&src, &dst, &config)?;
            println!(
                "Wrote {} bytes ({}) to {}",
                record.values_written,
                record.format,
                record.destination.display()
            );
        }

        Commands::FitGauss { input } => {
            let fit = match load_image(&input, &config)? {
                Image::Pad(image) => fit_image(&image)?,
                Image::Tof(tof) => fit_image(&tof.overview())?,
            };
            print_gaussian(&fit);
        }

        Commands::FitSinus {
            input,
            foil,
            roi,
            errors,
        } => {
            let tof = load_tof(&input, &config)?;
            let roi = match roi {
                Some(path) => cascade_io::load_roi(path)?,
                None => whole_image(&config),
            };

            if let Some(foil) = foil {
                let fit = fit_foil(&tof, foil, &roi, &config, errors)?;
                print_sinus(foil, &fit);
            } else {
                let fits = fit_all_foils(&tof, &roi, &config, errors);
                let total = fits.len();
                let mut failed = 0;
                for (foil, fit) in fits.iter().enumerate() {
                    match fit {
                        Ok(fit) => print_sinus(foil, fit),
                        Err(err) => {
                            failed += 1;
                            println!("foil {}: {}", foil, err);
                        }
                    }
                }
                if failed > 0 {
                    return Err(CliError::FoilFits { failed, total });
                }
            }
        }

        Commands::RoiSum { input, roi } => {
            let roi = cascade_io::load_roi(roi)?;
            for (i, element) in roi.iter().enumerate() {
                println!("element {}: {}", i, element);
            }
            match load_image(&input, &config)? {
                Image::Pad(image) => println!("Counts in ROI: {}", image.sum_in_roi(&roi)),
                Image::Tof(tof) => {
                    println!("Counts in ROI: {}", tof.overview().sum_in_roi(&roi));
                    for foil in 0..tof.foil_count() {
                        let graph = tof.graph(foil, &roi)?;
                        println!("foil {}: {:?}", foil, graph.counts());
                    }
                }
            }
        }

        Commands::Info { input } => {
            let size = MappedFileReader::open(&input)?.len();
            println!("File: {}", input.display());
            println!("Size: {} bytes ({:.2} MB)", size, size as f64 / 1_000_000.0);

            match load_image(&input, &config)? {
                Image::Pad(image) => {
                    println!("Format: PAD {}x{}", image.width(), image.height());
                    println!("Total counts: {}", image.total());
                    println!("Max counts: {}", image.max());
                }
                Image::Tof(tof) => {
                    println!(
                        "Format: TOF {}x{}, {} foils x {} time channels",
                        tof.width(),
                        tof.height(),
                        tof.foil_count(),
                        tof.images_per_foil()
                    );
                    let overview = tof.overview();
                    println!("Total counts: {}", overview.total());
                    println!("Max counts: {}", overview.max());
                    for foil in 0..tof.foil_count() {
                        let graph = tof.graph_rect(
                            0,
                            tof.width().saturating_sub(1),
                            0,
                            tof.height().saturating_sub(1),
                            foil,
                        )?;
                        println!("foil {}: {} counts", foil, graph.total());
                    }
                }
            }
        }
    }

    Ok(())
}
