//! ROI collection.

use crate::shape::{BoundingRect, RoiElement};
use crate::{Error, Result};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// An ordered, exclusively owned list of ROI elements.
///
/// Insertion order is display and evaluation order. Cloning deep-copies
/// every element.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Roi {
    elements: Vec<RoiElement>,
}

impl Roi {
    /// Creates an empty ROI.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an element and returns its index (`num_elements() - 1`).
    pub fn add(&mut self, element: RoiElement) -> usize {
        self.elements.push(element);
        self.elements.len() - 1
    }

    /// Removes the element at `index`; later elements shift down by one.
    ///
    /// # Errors
    /// [`Error::IndexOutOfRange`] if `index >= num_elements()`.
    pub fn delete_element(&mut self, index: usize) -> Result<RoiElement> {
        self.check_index(index)?;
        Ok(self.elements.remove(index))
    }

    /// Element at `index`.
    ///
    /// # Errors
    /// [`Error::IndexOutOfRange`] if `index >= num_elements()`.
    pub fn element(&self, index: usize) -> Result<&RoiElement> {
        self.elements.get(index).ok_or(Error::IndexOutOfRange {
            index,
            len: self.elements.len(),
        })
    }

    /// Mutable element at `index`.
    ///
    /// # Errors
    /// [`Error::IndexOutOfRange`] if `index >= num_elements()`.
    pub fn element_mut(&mut self, index: usize) -> Result<&mut RoiElement> {
        let len = self.elements.len();
        self.elements
            .get_mut(index)
            .ok_or(Error::IndexOutOfRange { index, len })
    }

    /// Appends a deep copy of the element at `index` and returns the new index.
    ///
    /// # Errors
    /// [`Error::IndexOutOfRange`] if `index >= num_elements()`.
    pub fn copy_element(&mut self, index: usize) -> Result<usize> {
        let copy = self.element(index)?.copy();
        Ok(self.add(copy))
    }

    /// Number of elements.
    #[must_use]
    pub fn num_elements(&self) -> usize {
        self.elements.len()
    }

    /// Returns true if the ROI has no elements.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Removes all elements.
    pub fn clear(&mut self) {
        self.elements.clear();
    }

    /// Iterates over elements in order.
    pub fn iter(&self) -> impl Iterator<Item = &RoiElement> {
        self.elements.iter()
    }

    /// True if any element contains the point.
    #[must_use]
    pub fn contains(&self, x: f64, y: f64) -> bool {
        self.elements.iter().any(|element| element.contains(x, y))
    }

    /// Union of all element bounds, `None` for an empty ROI.
    #[must_use]
    pub fn bounding_rect(&self) -> Option<BoundingRect> {
        self.elements
            .iter()
            .map(RoiElement::bounding_rect)
            .reduce(BoundingRect::union)
    }

    fn check_index(&self, index: usize) -> Result<()> {
        if index < self.elements.len() {
            Ok(())
        } else {
            Err(Error::IndexOutOfRange {
                index,
                len: self.elements.len(),
            })
        }
    }
}

impl FromIterator<RoiElement> for Roi {
    fn from_iter<I: IntoIterator<Item = RoiElement>>(iter: I) -> Self {
        Self {
            elements: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a Roi {
    type Item = &'a RoiElement;
    type IntoIter = std::slice::Iter<'a, RoiElement>;

    fn into_iter(self) -> Self::IntoIter {
        self.elements.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shape::{RoiCircle, RoiKind, RoiRect};

    fn sample_roi() -> Roi {
        let mut roi = Roi::new();
        roi.add(RoiElement::new(RoiKind::Circle));
        roi.add(RoiElement::new(RoiKind::Rectangle));
        roi.add(RoiElement::new(RoiKind::CircleSegment));
        roi
    }

    #[test]
    fn test_add_returns_last_index() {
        let mut roi = Roi::new();
        assert!(roi.is_empty());

        let element = RoiElement::Circle(RoiCircle {
            center_x: 1.0,
            center_y: 2.0,
            radius: 3.0,
        });
        let index = roi.add(element.clone());
        assert_eq!(index, 0);
        assert_eq!(index, roi.num_elements() - 1);
        assert_eq!(roi.element(roi.num_elements() - 1).unwrap(), &element);

        let index = roi.add(RoiElement::new(RoiKind::Ellipse));
        assert_eq!(index, 1);
        assert_eq!(roi.num_elements(), 2);
    }

    #[test]
    fn test_delete_shifts_indices() {
        let mut roi = sample_roi();
        let removed = roi.delete_element(1).unwrap();
        assert_eq!(removed.kind(), RoiKind::Rectangle);
        assert_eq!(roi.num_elements(), 2);
        assert_eq!(roi.element(0).unwrap().kind(), RoiKind::Circle);
        assert_eq!(roi.element(1).unwrap().kind(), RoiKind::CircleSegment);
    }

    #[test]
    fn test_out_of_range() {
        let mut roi = sample_roi();
        assert_eq!(
            roi.element(3),
            Err(Error::IndexOutOfRange { index: 3, len: 3 })
        );
        assert!(roi.element_mut(10).is_err());
        assert!(roi.delete_element(3).is_err());
        assert!(roi.copy_element(3).is_err());
        assert_eq!(roi.num_elements(), 3);
    }

    #[test]
    fn test_element_copy_is_independent() {
        let roi = sample_roi();
        for index in 0..roi.num_elements() {
            let original = roi.element(index).unwrap();
            let mut copy = original.copy();
            assert_eq!(copy.params(), original.params());

            copy.set_param(0, -100.0).unwrap();
            assert_ne!(copy.params(), original.params());
        }
    }

    #[test]
    fn test_clone_is_deep() {
        let roi = sample_roi();
        let mut cloned = roi.clone();
        assert_eq!(cloned, roi);

        cloned.element_mut(0).unwrap().set_param(2, 1.0).unwrap();
        cloned.delete_element(2).unwrap();

        assert_eq!(roi.num_elements(), 3);
        assert!((roi.element(0).unwrap().param(2).unwrap() - 32.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_copy_element_appends() {
        let mut roi = sample_roi();
        let index = roi.copy_element(0).unwrap();
        assert_eq!(index, 3);
        assert_eq!(roi.element(3).unwrap(), roi.element(0).unwrap());
    }

    #[test]
    fn test_union_membership_and_bounds() {
        let roi: Roi = vec![
            RoiElement::Rectangle(RoiRect {
                x1: 0.0,
                y1: 0.0,
                x2: 2.0,
                y2: 2.0,
            }),
            RoiElement::Circle(RoiCircle {
                center_x: 10.0,
                center_y: 10.0,
                radius: 1.0,
            }),
        ]
        .into_iter()
        .collect();

        assert!(roi.contains(1.0, 1.0));
        assert!(roi.contains(10.0, 11.0));
        assert!(!roi.contains(5.0, 5.0));

        let bounds = roi.bounding_rect().unwrap();
        assert!((bounds.x_min - 0.0).abs() < f64::EPSILON);
        assert!((bounds.x_max - 11.0).abs() < f64::EPSILON);
        assert!(Roi::new().bounding_rect().is_none());
    }
}
