//! cascade-core: Core types for CASCADE detector data.
//!
//! This crate provides the ROI geometry model, the PAD/TOF count image
//! structures and the detector configuration shared by the fitting and
//! file-format crates.
//!

pub mod config;
pub mod error;
pub mod image;
pub mod roi;
pub mod shape;

pub use config::{AcquisitionMode, DetectorConfig};
pub use error::{Error, Result};
pub use image::{CountGrid, PadImage, TofGraph, TofImage};
pub use roi::Roi;
pub use shape::{
    BoundingRect, RoiCircle, RoiCircleRing, RoiCircleSegment, RoiElement, RoiEllipse, RoiKind,
    RoiRect, Shape,
};
