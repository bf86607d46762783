//! ROI element shapes.
//!
//! Every shape holds a fixed, ordered list of named `f64` parameters. The
//! order is the geometric interpretation (e.g. center x, center y, radius)
//! and the order parameters are listed in editors. Only the values change
//! after construction.

use crate::{Error, Result};
use std::fmt;
use std::str::FromStr;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Axis-aligned bounds of a shape, inclusive on all sides.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingRect {
    pub x_min: f64,
    pub y_min: f64,
    pub x_max: f64,
    pub y_max: f64,
}

impl BoundingRect {
    /// Smallest rectangle covering both.
    #[must_use]
    pub fn union(self, other: Self) -> Self {
        Self {
            x_min: self.x_min.min(other.x_min),
            y_min: self.y_min.min(other.y_min),
            x_max: self.x_max.max(other.x_max),
            y_max: self.y_max.max(other.y_max),
        }
    }

    fn around(cx: f64, cy: f64, rx: f64, ry: f64) -> Self {
        let rx = rx.abs();
        let ry = ry.abs();
        Self {
            x_min: cx - rx,
            y_min: cy - ry,
            x_max: cx + rx,
            y_max: cy + ry,
        }
    }
}

/// Common capability set of all ROI shapes.
pub trait Shape {
    /// Human-readable type label.
    const NAME: &'static str;

    /// Parameter names in index order.
    const PARAM_NAMES: &'static [&'static str];

    /// Parameter value by index, `None` if out of range.
    fn param(&self, index: usize) -> Option<f64>;

    /// Mutable parameter slot by index, `None` if out of range.
    fn param_mut(&mut self, index: usize) -> Option<&mut f64>;

    /// Point membership for the current parameter values.
    fn contains(&self, x: f64, y: f64) -> bool;

    /// Bounds of the area covered by [`Shape::contains`].
    fn bounding_rect(&self) -> BoundingRect;
}

/// Rectangle given by two opposite corners.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct RoiRect {
    pub x1: f64,
    pub y1: f64,
    pub x2: f64,
    pub y2: f64,
}

impl Default for RoiRect {
    fn default() -> Self {
        Self {
            x1: 32.0,
            y1: 32.0,
            x2: 96.0,
            y2: 96.0,
        }
    }
}

impl Shape for RoiRect {
    const NAME: &'static str = "Rectangle";
    const PARAM_NAMES: &'static [&'static str] = &["x1", "y1", "x2", "y2"];

    fn param(&self, index: usize) -> Option<f64> {
        match index {
            0 => Some(self.x1),
            1 => Some(self.y1),
            2 => Some(self.x2),
            3 => Some(self.y2),
            _ => None,
        }
    }

    fn param_mut(&mut self, index: usize) -> Option<&mut f64> {
        match index {
            0 => Some(&mut self.x1),
            1 => Some(&mut self.y1),
            2 => Some(&mut self.x2),
            3 => Some(&mut self.y2),
            _ => None,
        }
    }

    fn contains(&self, x: f64, y: f64) -> bool {
        let bounds = self.bounding_rect();
        x >= bounds.x_min && x <= bounds.x_max && y >= bounds.y_min && y <= bounds.y_max
    }

    fn bounding_rect(&self) -> BoundingRect {
        BoundingRect {
            x_min: self.x1.min(self.x2),
            y_min: self.y1.min(self.y2),
            x_max: self.x1.max(self.x2),
            y_max: self.y1.max(self.y2),
        }
    }
}

/// Circle around a center point.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct RoiCircle {
    pub center_x: f64,
    pub center_y: f64,
    pub radius: f64,
}

impl Default for RoiCircle {
    fn default() -> Self {
        Self {
            center_x: 64.0,
            center_y: 64.0,
            radius: 32.0,
        }
    }
}

impl Shape for RoiCircle {
    const NAME: &'static str = "Circle";
    const PARAM_NAMES: &'static [&'static str] = &["center x", "center y", "radius"];

    fn param(&self, index: usize) -> Option<f64> {
        match index {
            0 => Some(self.center_x),
            1 => Some(self.center_y),
            2 => Some(self.radius),
            _ => None,
        }
    }

    fn param_mut(&mut self, index: usize) -> Option<&mut f64> {
        match index {
            0 => Some(&mut self.center_x),
            1 => Some(&mut self.center_y),
            2 => Some(&mut self.radius),
            _ => None,
        }
    }

    fn contains(&self, x: f64, y: f64) -> bool {
        distance_sq(self.center_x, self.center_y, x, y) <= self.radius * self.radius
    }

    fn bounding_rect(&self) -> BoundingRect {
        BoundingRect::around(self.center_x, self.center_y, self.radius, self.radius)
    }
}

/// Axis-aligned ellipse.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct RoiEllipse {
    pub center_x: f64,
    pub center_y: f64,
    pub radius_x: f64,
    pub radius_y: f64,
}

impl Default for RoiEllipse {
    fn default() -> Self {
        Self {
            center_x: 64.0,
            center_y: 64.0,
            radius_x: 32.0,
            radius_y: 16.0,
        }
    }
}

impl Shape for RoiEllipse {
    const NAME: &'static str = "Ellipse";
    const PARAM_NAMES: &'static [&'static str] =
        &["center x", "center y", "radius x", "radius y"];

    fn param(&self, index: usize) -> Option<f64> {
        match index {
            0 => Some(self.center_x),
            1 => Some(self.center_y),
            2 => Some(self.radius_x),
            3 => Some(self.radius_y),
            _ => None,
        }
    }

    fn param_mut(&mut self, index: usize) -> Option<&mut f64> {
        match index {
            0 => Some(&mut self.center_x),
            1 => Some(&mut self.center_y),
            2 => Some(&mut self.radius_x),
            3 => Some(&mut self.radius_y),
            _ => None,
        }
    }

    fn contains(&self, x: f64, y: f64) -> bool {
        let dx = x - self.center_x;
        let dy = y - self.center_y;
        if dx.abs() > self.radius_x.abs() || dy.abs() > self.radius_y.abs() {
            return false;
        }
        // Multiplied out so a zero radius degenerates to a line segment.
        let rx2 = self.radius_x * self.radius_x;
        let ry2 = self.radius_y * self.radius_y;
        dx * dx * ry2 + dy * dy * rx2 <= rx2 * ry2
    }

    fn bounding_rect(&self) -> BoundingRect {
        BoundingRect::around(self.center_x, self.center_y, self.radius_x, self.radius_y)
    }
}

/// Annulus between two radii.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct RoiCircleRing {
    pub center_x: f64,
    pub center_y: f64,
    pub inner_radius: f64,
    pub outer_radius: f64,
}

impl Default for RoiCircleRing {
    fn default() -> Self {
        Self {
            center_x: 64.0,
            center_y: 64.0,
            inner_radius: 16.0,
            outer_radius: 32.0,
        }
    }
}

impl Shape for RoiCircleRing {
    const NAME: &'static str = "Circle Ring";
    const PARAM_NAMES: &'static [&'static str] =
        &["center x", "center y", "inner radius", "outer radius"];

    fn param(&self, index: usize) -> Option<f64> {
        match index {
            0 => Some(self.center_x),
            1 => Some(self.center_y),
            2 => Some(self.inner_radius),
            3 => Some(self.outer_radius),
            _ => None,
        }
    }

    fn param_mut(&mut self, index: usize) -> Option<&mut f64> {
        match index {
            0 => Some(&mut self.center_x),
            1 => Some(&mut self.center_y),
            2 => Some(&mut self.inner_radius),
            3 => Some(&mut self.outer_radius),
            _ => None,
        }
    }

    fn contains(&self, x: f64, y: f64) -> bool {
        let dist_sq = distance_sq(self.center_x, self.center_y, x, y);
        dist_sq >= self.inner_radius * self.inner_radius
            && dist_sq <= self.outer_radius * self.outer_radius
    }

    fn bounding_rect(&self) -> BoundingRect {
        BoundingRect::around(
            self.center_x,
            self.center_y,
            self.outer_radius,
            self.outer_radius,
        )
    }
}

/// Circle sector between two angles in degrees, counter-clockwise from +x.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct RoiCircleSegment {
    pub center_x: f64,
    pub center_y: f64,
    pub radius: f64,
    pub begin_angle: f64,
    pub end_angle: f64,
}

impl Default for RoiCircleSegment {
    fn default() -> Self {
        Self {
            center_x: 64.0,
            center_y: 64.0,
            radius: 32.0,
            begin_angle: 0.0,
            end_angle: 90.0,
        }
    }
}

impl RoiCircleSegment {
    fn angle_in_range(&self, angle: f64) -> bool {
        if (self.end_angle - self.begin_angle).abs() >= 360.0 {
            return true;
        }
        let begin = normalize_degrees(self.begin_angle);
        let end = normalize_degrees(self.end_angle);
        if begin <= end {
            angle >= begin && angle < end
        } else {
            angle >= begin || angle < end
        }
    }
}

impl Shape for RoiCircleSegment {
    const NAME: &'static str = "Circle Segment";
    const PARAM_NAMES: &'static [&'static str] =
        &["center x", "center y", "radius", "begin angle", "end angle"];

    fn param(&self, index: usize) -> Option<f64> {
        match index {
            0 => Some(self.center_x),
            1 => Some(self.center_y),
            2 => Some(self.radius),
            3 => Some(self.begin_angle),
            4 => Some(self.end_angle),
            _ => None,
        }
    }

    fn param_mut(&mut self, index: usize) -> Option<&mut f64> {
        match index {
            0 => Some(&mut self.center_x),
            1 => Some(&mut self.center_y),
            2 => Some(&mut self.radius),
            3 => Some(&mut self.begin_angle),
            4 => Some(&mut self.end_angle),
            _ => None,
        }
    }

    fn contains(&self, x: f64, y: f64) -> bool {
        let dist = distance_sq(self.center_x, self.center_y, x, y);
        if dist > self.radius * self.radius {
            return false;
        }
        // The apex belongs to every segment.
        if dist == 0.0 {
            return true;
        }
        let angle = normalize_degrees((y - self.center_y).atan2(x - self.center_x).to_degrees());
        self.angle_in_range(angle)
    }

    fn bounding_rect(&self) -> BoundingRect {
        BoundingRect::around(self.center_x, self.center_y, self.radius, self.radius)
    }
}

fn distance_sq(cx: f64, cy: f64, x: f64, y: f64) -> f64 {
    let dx = x - cx;
    let dy = y - cy;
    dx * dx + dy * dy
}

/// Maps an angle in degrees into `[0, 360)`.
fn normalize_degrees(angle: f64) -> f64 {
    let normalized = angle.rem_euclid(360.0);
    // rem_euclid rounds tiny negative inputs up to exactly 360.
    if normalized >= 360.0 {
        0.0
    } else {
        normalized
    }
}

/// Type tag of a ROI element, used by the element factory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RoiKind {
    Rectangle,
    Circle,
    Ellipse,
    CircleRing,
    CircleSegment,
}

impl RoiKind {
    /// All kinds in menu order.
    pub const ALL: [RoiKind; 5] = [
        RoiKind::Circle,
        RoiKind::Ellipse,
        RoiKind::CircleRing,
        RoiKind::CircleSegment,
        RoiKind::Rectangle,
    ];

    /// Human-readable type label.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            RoiKind::Rectangle => RoiRect::NAME,
            RoiKind::Circle => RoiCircle::NAME,
            RoiKind::Ellipse => RoiEllipse::NAME,
            RoiKind::CircleRing => RoiCircleRing::NAME,
            RoiKind::CircleSegment => RoiCircleSegment::NAME,
        }
    }
}

impl fmt::Display for RoiKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for RoiKind {
    type Err = Error;

    /// Accepts type labels case-insensitively, with or without spaces.
    fn from_str(s: &str) -> Result<Self> {
        let key: String = s
            .chars()
            .filter(|c| !c.is_whitespace() && *c != '_' && *c != '-')
            .collect::<String>()
            .to_lowercase();
        match key.as_str() {
            "rectangle" | "rect" => Ok(RoiKind::Rectangle),
            "circle" => Ok(RoiKind::Circle),
            "ellipse" => Ok(RoiKind::Ellipse),
            "circlering" | "ring" => Ok(RoiKind::CircleRing),
            "circlesegment" | "segment" => Ok(RoiKind::CircleSegment),
            _ => Err(Error::UnknownRoiKind(s.to_string())),
        }
    }
}

/// A ROI shape of any kind.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(tag = "type"))]
pub enum RoiElement {
    Rectangle(RoiRect),
    Circle(RoiCircle),
    Ellipse(RoiEllipse),
    CircleRing(RoiCircleRing),
    CircleSegment(RoiCircleSegment),
}

macro_rules! dispatch {
    ($element:expr, $shape:ident => $body:expr) => {
        match $element {
            RoiElement::Rectangle($shape) => $body,
            RoiElement::Circle($shape) => $body,
            RoiElement::Ellipse($shape) => $body,
            RoiElement::CircleRing($shape) => $body,
            RoiElement::CircleSegment($shape) => $body,
        }
    };
}

macro_rules! dispatch_const {
    ($element:expr, $konst:ident) => {
        match $element {
            RoiElement::Rectangle(_) => RoiRect::$konst,
            RoiElement::Circle(_) => RoiCircle::$konst,
            RoiElement::Ellipse(_) => RoiEllipse::$konst,
            RoiElement::CircleRing(_) => RoiCircleRing::$konst,
            RoiElement::CircleSegment(_) => RoiCircleSegment::$konst,
        }
    };
}

impl RoiElement {
    /// Creates an element of the given kind with default parameters.
    #[must_use]
    pub fn new(kind: RoiKind) -> Self {
        match kind {
            RoiKind::Rectangle => RoiElement::Rectangle(RoiRect::default()),
            RoiKind::Circle => RoiElement::Circle(RoiCircle::default()),
            RoiKind::Ellipse => RoiElement::Ellipse(RoiEllipse::default()),
            RoiKind::CircleRing => RoiElement::CircleRing(RoiCircleRing::default()),
            RoiKind::CircleSegment => RoiElement::CircleSegment(RoiCircleSegment::default()),
        }
    }

    /// Creates an element from a type label and parameter values.
    ///
    /// # Errors
    /// [`Error::UnknownRoiKind`] for an unrecognised label,
    /// [`Error::InvalidParameterIndex`] if more values are given than the
    /// shape has parameters. Missing trailing values keep their defaults.
    pub fn from_params(kind: &str, values: &[f64]) -> Result<Self> {
        let mut element = Self::new(kind.parse()?);
        for (index, &value) in values.iter().enumerate() {
            element.set_param(index, value)?;
        }
        Ok(element)
    }

    /// Type tag of this element.
    #[must_use]
    pub fn kind(&self) -> RoiKind {
        match self {
            RoiElement::Rectangle(_) => RoiKind::Rectangle,
            RoiElement::Circle(_) => RoiKind::Circle,
            RoiElement::Ellipse(_) => RoiKind::Ellipse,
            RoiElement::CircleRing(_) => RoiKind::CircleRing,
            RoiElement::CircleSegment(_) => RoiKind::CircleSegment,
        }
    }

    /// Human-readable type label.
    #[must_use]
    pub fn name(&self) -> &'static str {
        dispatch_const!(self, NAME)
    }

    /// Number of parameters; fixed per kind.
    #[must_use]
    pub fn param_count(&self) -> usize {
        self.param_names().len()
    }

    /// Parameter names in index order.
    #[must_use]
    pub fn param_names(&self) -> &'static [&'static str] {
        dispatch_const!(self, PARAM_NAMES)
    }

    /// Parameter name by index.
    ///
    /// # Errors
    /// [`Error::InvalidParameterIndex`] if `index >= param_count()`.
    pub fn param_name(&self, index: usize) -> Result<&'static str> {
        self.param_names()
            .get(index)
            .copied()
            .ok_or_else(|| self.invalid_param(index))
    }

    /// Parameter value by index.
    ///
    /// # Errors
    /// [`Error::InvalidParameterIndex`] if `index >= param_count()`.
    pub fn param(&self, index: usize) -> Result<f64> {
        dispatch!(self, shape => shape.param(index)).ok_or_else(|| self.invalid_param(index))
    }

    /// Sets a parameter value by index.
    ///
    /// # Errors
    /// [`Error::InvalidParameterIndex`] if `index >= param_count()`.
    pub fn set_param(&mut self, index: usize, value: f64) -> Result<()> {
        let error = self.invalid_param(index);
        let slot = dispatch!(self, shape => shape.param_mut(index)).ok_or(error)?;
        *slot = value;
        Ok(())
    }

    /// All parameter values in index order.
    #[must_use]
    pub fn params(&self) -> Vec<f64> {
        (0..self.param_count())
            .filter_map(|index| dispatch!(self, shape => shape.param(index)))
            .collect()
    }

    /// Point membership for the current parameter values.
    #[must_use]
    pub fn contains(&self, x: f64, y: f64) -> bool {
        dispatch!(self, shape => shape.contains(x, y))
    }

    /// Bounds of the area covered by [`RoiElement::contains`].
    #[must_use]
    pub fn bounding_rect(&self) -> BoundingRect {
        dispatch!(self, shape => shape.bounding_rect())
    }

    /// Independent deep copy.
    #[must_use]
    pub fn copy(&self) -> Self {
        self.clone()
    }

    fn invalid_param(&self, index: usize) -> Error {
        Error::InvalidParameterIndex {
            index,
            count: self.param_count(),
        }
    }
}

impl fmt::Display for RoiElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}(", self.name())?;
        for (index, (name, value)) in self.param_names().iter().zip(self.params()).enumerate() {
            if index > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{name}={value}")?;
        }
        f.write_str(")")
    }
}
