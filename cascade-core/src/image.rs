//! PAD and TOF count images.
#![allow(
    clippy::cast_possible_truncation,
    clippy::cast_precision_loss,
    clippy::cast_sign_loss
)]

use crate::config::DetectorConfig;
use crate::roi::Roi;
use crate::shape::BoundingRect;
use crate::{Error, Result};

/// Read access to a 2D grid of non-negative counts.
///
/// Coordinates passed to [`CountGrid::count`] must lie inside
/// `width() x height()`.
pub trait CountGrid {
    /// Grid width in pixels.
    fn width(&self) -> usize;

    /// Grid height in pixels.
    fn height(&self) -> usize;

    /// Counts at pixel `(x, y)`.
    fn count(&self, x: usize, y: usize) -> u32;

    /// Sum of all counts.
    fn total(&self) -> u64 {
        let mut sum = 0u64;
        for y in 0..self.height() {
            for x in 0..self.width() {
                sum += u64::from(self.count(x, y));
            }
        }
        sum
    }

    /// Row-major copy of the counts.
    fn to_row_major(&self) -> Vec<u32> {
        let mut out = Vec::with_capacity(self.width() * self.height());
        for y in 0..self.height() {
            for x in 0..self.width() {
                out.push(self.count(x, y));
            }
        }
        out
    }
}

/// Single 2D detector image, row-major.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PadImage {
    width: usize,
    height: usize,
    data: Vec<u32>,
}

impl PadImage {
    /// Creates an all-zero image.
    #[must_use]
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            data: vec![0; width * height],
        }
    }

    /// Wraps row-major counts.
    ///
    /// # Errors
    /// [`Error::SizeMismatch`] if `data.len() != width * height`.
    pub fn from_counts(width: usize, height: usize, data: Vec<u32>) -> Result<Self> {
        if data.len() != width * height {
            return Err(Error::SizeMismatch {
                expected: width * height,
                actual: data.len(),
            });
        }
        Ok(Self {
            width,
            height,
            data,
        })
    }

    /// Creates an image of the configured resolution.
    ///
    /// # Errors
    /// [`Error::SizeMismatch`] if `data` does not hold one image.
    pub fn from_config(config: &DetectorConfig, data: Vec<u32>) -> Result<Self> {
        Self::from_counts(config.width, config.height, data)
    }

    /// Counts at `(x, y)`, `None` outside the image.
    #[must_use]
    pub fn get(&self, x: usize, y: usize) -> Option<u32> {
        if x < self.width && y < self.height {
            Some(self.data[y * self.width + x])
        } else {
            None
        }
    }

    /// Sets the counts at `(x, y)`.
    ///
    /// # Errors
    /// [`Error::ImageIndex`] outside the image.
    pub fn set(&mut self, x: usize, y: usize, value: u32) -> Result<()> {
        if x >= self.width || y >= self.height {
            return Err(Error::ImageIndex(format!(
                "pixel ({x}, {y}) outside {}x{}",
                self.width, self.height
            )));
        }
        self.data[y * self.width + x] = value;
        Ok(())
    }

    /// Row-major counts.
    #[must_use]
    pub fn data(&self) -> &[u32] {
        &self.data
    }

    /// Largest pixel value, 0 for an empty image.
    #[must_use]
    pub fn max(&self) -> u32 {
        self.data.iter().copied().max().unwrap_or(0)
    }

    /// Sum over the inclusive pixel rectangle `[x1, x2] x [y1, y2]`,
    /// clipped to the image.
    #[must_use]
    pub fn sum_in_rect(&self, x1: usize, x2: usize, y1: usize, y2: usize) -> u64 {
        sum_rect(self, x1, x2, y1, y2)
    }

    /// Sum over all pixels whose integer coordinates lie inside the ROI.
    #[must_use]
    pub fn sum_in_roi(&self, roi: &Roi) -> u64 {
        sum_roi(self, roi)
    }

    fn add_assign(&mut self, counts: &[u32]) {
        for (acc, &value) in self.data.iter_mut().zip(counts) {
            *acc = acc.saturating_add(value);
        }
    }
}

impl CountGrid for PadImage {
    fn width(&self) -> usize {
        self.width
    }

    fn height(&self) -> usize {
        self.height
    }

    fn count(&self, x: usize, y: usize) -> u32 {
        self.data[y * self.width + x]
    }

    fn total(&self) -> u64 {
        self.data.iter().map(|&v| u64::from(v)).sum()
    }

    fn to_row_major(&self) -> Vec<u32> {
        self.data.clone()
    }
}

/// Per-time-channel counts of one foil inside a region.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TofGraph {
    counts: Vec<u32>,
}

impl TofGraph {
    /// Wraps per-channel counts.
    #[must_use]
    pub fn new(counts: Vec<u32>) -> Self {
        Self { counts }
    }

    /// Counts per time channel.
    #[must_use]
    pub fn counts(&self) -> &[u32] {
        &self.counts
    }

    /// Number of time channels.
    #[must_use]
    pub fn len(&self) -> usize {
        self.counts.len()
    }

    /// Returns true if the graph has no channels.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// Sum over all channels.
    #[must_use]
    pub fn total(&self) -> u64 {
        self.counts.iter().map(|&v| u64::from(v)).sum()
    }
}

/// Time-of-flight stack: one image per time channel, grouped per foil.
///
/// Data layout is `[foil][time channel][y][x]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TofImage {
    width: usize,
    height: usize,
    foil_count: usize,
    images_per_foil: usize,
    data: Vec<u32>,
}

impl TofImage {
    /// Wraps stacked counts.
    ///
    /// # Errors
    /// [`Error::SizeMismatch`] if `data` does not hold
    /// `foil_count * images_per_foil` images.
    pub fn from_counts(
        width: usize,
        height: usize,
        foil_count: usize,
        images_per_foil: usize,
        data: Vec<u32>,
    ) -> Result<Self> {
        let expected = width * height * foil_count * images_per_foil;
        if data.len() != expected {
            return Err(Error::SizeMismatch {
                expected,
                actual: data.len(),
            });
        }
        Ok(Self {
            width,
            height,
            foil_count,
            images_per_foil,
            data,
        })
    }

    /// Creates a stack with the configured geometry.
    ///
    /// # Errors
    /// [`Error::SizeMismatch`] if `data` does not match the configuration.
    pub fn from_config(config: &DetectorConfig, data: Vec<u32>) -> Result<Self> {
        Self::from_counts(
            config.width,
            config.height,
            config.foil_count,
            config.images_per_foil,
            data,
        )
    }

    /// Image width in pixels.
    #[must_use]
    pub fn width(&self) -> usize {
        self.width
    }

    /// Image height in pixels.
    #[must_use]
    pub fn height(&self) -> usize {
        self.height
    }

    /// Number of foils.
    #[must_use]
    pub fn foil_count(&self) -> usize {
        self.foil_count
    }

    /// Time channels per foil.
    #[must_use]
    pub fn images_per_foil(&self) -> usize {
        self.images_per_foil
    }

    /// Total number of time channels.
    #[must_use]
    pub fn time_channels(&self) -> usize {
        self.foil_count * self.images_per_foil
    }

    /// Raw stacked counts.
    #[must_use]
    pub fn data(&self) -> &[u32] {
        &self.data
    }

    /// Counts of one pixel in one foil's time channel.
    #[must_use]
    pub fn get(&self, foil: usize, channel: usize, x: usize, y: usize) -> Option<u32> {
        if foil >= self.foil_count
            || channel >= self.images_per_foil
            || x >= self.width
            || y >= self.height
        {
            return None;
        }
        Some(self.channel_slice(foil * self.images_per_foil + channel)[y * self.width + x])
    }

    /// The image of one foil's time channel.
    ///
    /// # Errors
    /// [`Error::ImageIndex`] if foil or channel are out of range.
    pub fn channel_image(&self, foil: usize, channel: usize) -> Result<PadImage> {
        self.check_foil(foil)?;
        if channel >= self.images_per_foil {
            return Err(Error::ImageIndex(format!(
                "time channel {channel} out of range ({} per foil)",
                self.images_per_foil
            )));
        }
        let slice = self.channel_slice(foil * self.images_per_foil + channel);
        PadImage::from_counts(self.width, self.height, slice.to_vec())
    }

    /// Sum over all time channels of all foils.
    #[must_use]
    pub fn overview(&self) -> PadImage {
        let mut image = PadImage::new(self.width, self.height);
        for channel in 0..self.time_channels() {
            image.add_assign(self.channel_slice(channel));
        }
        image
    }

    /// Sum of the selected foil/time-channel images.
    ///
    /// `selected[foil * images_per_foil + channel]` flags one image.
    ///
    /// # Errors
    /// [`Error::SizeMismatch`] if `selected` does not have one flag per
    /// time channel.
    pub fn sum_selected(&self, selected: &[bool]) -> Result<PadImage> {
        if selected.len() != self.time_channels() {
            return Err(Error::SizeMismatch {
                expected: self.time_channels(),
                actual: selected.len(),
            });
        }
        let mut image = PadImage::new(self.width, self.height);
        for (channel, _) in selected.iter().enumerate().filter(|(_, &on)| on) {
            image.add_assign(self.channel_slice(channel));
        }
        Ok(image)
    }

    /// Sum of every time channel of the selected foils.
    ///
    /// # Errors
    /// [`Error::SizeMismatch`] if `foils` does not have one flag per foil.
    pub fn sum_foils(&self, foils: &[bool]) -> Result<PadImage> {
        if foils.len() != self.foil_count {
            return Err(Error::SizeMismatch {
                expected: self.foil_count,
                actual: foils.len(),
            });
        }
        let selected: Vec<bool> = foils
            .iter()
            .flat_map(|&on| std::iter::repeat(on).take(self.images_per_foil))
            .collect();
        self.sum_selected(&selected)
    }

    /// Per-channel counts of one foil inside the ROI.
    ///
    /// # Errors
    /// [`Error::ImageIndex`] if `foil` is out of range.
    pub fn graph(&self, foil: usize, roi: &Roi) -> Result<TofGraph> {
        self.check_foil(foil)?;
        let counts = (0..self.images_per_foil)
            .map(|channel| {
                let view = ChannelView {
                    tof: self,
                    channel: foil * self.images_per_foil + channel,
                };
                saturate(sum_roi(&view, roi))
            })
            .collect();
        Ok(TofGraph::new(counts))
    }

    /// Per-channel counts of one foil inside the inclusive pixel rectangle
    /// `[x1, x2] x [y1, y2]`.
    ///
    /// # Errors
    /// [`Error::ImageIndex`] if `foil` is out of range.
    pub fn graph_rect(
        &self,
        x1: usize,
        x2: usize,
        y1: usize,
        y2: usize,
        foil: usize,
    ) -> Result<TofGraph> {
        self.check_foil(foil)?;
        let counts = (0..self.images_per_foil)
            .map(|channel| {
                let view = ChannelView {
                    tof: self,
                    channel: foil * self.images_per_foil + channel,
                };
                saturate(sum_rect(&view, x1, x2, y1, y2))
            })
            .collect();
        Ok(TofGraph::new(counts))
    }

    fn channel_slice(&self, channel: usize) -> &[u32] {
        let pixels = self.width * self.height;
        &self.data[channel * pixels..(channel + 1) * pixels]
    }

    fn check_foil(&self, foil: usize) -> Result<()> {
        if foil < self.foil_count {
            Ok(())
        } else {
            Err(Error::ImageIndex(format!(
                "foil {foil} out of range ({} foils)",
                self.foil_count
            )))
        }
    }
}

/// Borrowed view of one time channel.
struct ChannelView<'a> {
    tof: &'a TofImage,
    channel: usize,
}

impl CountGrid for ChannelView<'_> {
    fn width(&self) -> usize {
        self.tof.width
    }

    fn height(&self) -> usize {
        self.tof.height
    }

    fn count(&self, x: usize, y: usize) -> u32 {
        self.tof.channel_slice(self.channel)[y * self.tof.width + x]
    }
}

fn saturate(value: u64) -> u32 {
    u32::try_from(value).unwrap_or(u32::MAX)
}

fn sum_rect<G: CountGrid>(grid: &G, x1: usize, x2: usize, y1: usize, y2: usize) -> u64 {
    if grid.width() == 0 || grid.height() == 0 {
        return 0;
    }
    let (x_lo, x_hi) = (x1.min(x2), x1.max(x2).min(grid.width() - 1));
    let (y_lo, y_hi) = (y1.min(y2), y1.max(y2).min(grid.height() - 1));
    let mut sum = 0u64;
    for y in y_lo..=y_hi {
        for x in x_lo..=x_hi {
            sum += u64::from(grid.count(x, y));
        }
    }
    sum
}

fn sum_roi<G: CountGrid>(grid: &G, roi: &Roi) -> u64 {
    let Some(bounds) = roi.bounding_rect() else {
        return 0;
    };
    let Some((x_lo, x_hi, y_lo, y_hi)) = pixel_window(bounds, grid.width(), grid.height()) else {
        return 0;
    };
    let mut sum = 0u64;
    for y in y_lo..=y_hi {
        for x in x_lo..=x_hi {
            if roi.contains(x as f64, y as f64) {
                sum += u64::from(grid.count(x, y));
            }
        }
    }
    sum
}

/// Clips shape bounds to the integer pixel range of a grid.
fn pixel_window(
    bounds: BoundingRect,
    width: usize,
    height: usize,
) -> Option<(usize, usize, usize, usize)> {
    let axis = |lo: f64, hi: f64, size: usize| -> Option<(usize, usize)> {
        if size == 0 || lo.is_nan() || hi.is_nan() {
            return None;
        }
        let lo = lo.ceil().max(0.0);
        let hi = hi.floor().min((size - 1) as f64);
        if lo > hi {
            return None;
        }
        Some((lo as usize, hi as usize))
    };
    let (x_lo, x_hi) = axis(bounds.x_min, bounds.x_max, width)?;
    let (y_lo, y_hi) = axis(bounds.y_min, bounds.y_max, height)?;
    Some((x_lo, x_hi, y_lo, y_hi))
}
