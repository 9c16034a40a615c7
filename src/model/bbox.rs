//! Axis-aligned bounding boxes in HTML page units.

use serde::{Deserialize, Serialize};

/// Bounding box around text or graphical content.
///
/// `(x, y)` is the top-left corner. The right and bottom edges (`x1`, `y1`)
/// are derived and kept in sync by every mutator, so they are never stored
/// independently of the width and height.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
#[serde(from = "[i32; 4]", into = "[i32; 4]")]
pub struct Bbox {
    x: i32,
    y: i32,
    width: i32,
    height: i32,
    x1: i32,
    y1: i32,
}

impl Bbox {
    /// Create a box from its origin and size.
    pub fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            x,
            y,
            width,
            height,
            x1: x + width,
            y1: y + height,
        }
    }

    /// Create a box from two corners.
    pub fn from_corners(x0: i32, y0: i32, x1: i32, y1: i32) -> Self {
        Self::new(x0, y0, x1 - x0, y1 - y0)
    }

    /// Left edge.
    pub fn x(&self) -> i32 {
        self.x
    }

    /// Top edge.
    pub fn y(&self) -> i32 {
        self.y
    }

    pub fn width(&self) -> i32 {
        self.width
    }

    pub fn height(&self) -> i32 {
        self.height
    }

    /// Right edge (`x + width`).
    pub fn x1(&self) -> i32 {
        self.x1
    }

    /// Bottom edge (`y + height`).
    pub fn y1(&self) -> i32 {
        self.y1
    }

    /// Move the left edge, keeping the width.
    pub fn set_x(&mut self, x: i32) {
        self.x = x;
        self.x1 = x + self.width;
    }

    /// Move the top edge, keeping the height.
    pub fn set_y(&mut self, y: i32) {
        self.y = y;
        self.y1 = y + self.height;
    }

    pub fn set_width(&mut self, width: i32) {
        self.width = width;
        self.x1 = self.x + width;
    }

    pub fn set_height(&mut self, height: i32) {
        self.height = height;
        self.y1 = self.y + height;
    }

    /// Move the right edge, keeping the left edge in place.
    pub fn set_x1(&mut self, x1: i32) {
        self.set_width(x1 - self.x);
    }

    /// Move the bottom edge, keeping the top edge in place.
    pub fn set_y1(&mut self, y1: i32) {
        self.set_height(y1 - self.y);
    }

    /// Move the left edge, keeping the right edge in place.
    pub fn set_left(&mut self, x: i32) {
        let x1 = self.x1;
        self.x = x;
        self.set_x1(x1);
    }

    /// Move the top edge, keeping the bottom edge in place.
    pub fn set_top(&mut self, y: i32) {
        let y1 = self.y1;
        self.y = y;
        self.set_y1(y1);
    }

    /// Box area. Degenerate boxes have zero area.
    pub fn area(&self) -> i64 {
        i64::from(self.width.max(0)) * i64::from(self.height.max(0))
    }

    /// Area shared with `other`, zero when the boxes do not overlap.
    pub fn intersect_area(&self, other: &Bbox) -> i64 {
        let w = self.x1.min(other.x1) - self.x.max(other.x);
        let h = self.y1.min(other.y1) - self.y.max(other.y);
        if w <= 0 || h <= 0 {
            0
        } else {
            i64::from(w) * i64::from(h)
        }
    }

    /// Intersection box. Boxes touching on an edge yield a zero-sized box.
    pub fn intersect(&self, other: &Bbox) -> Option<Bbox> {
        let x = self.x.max(other.x);
        let y = self.y.max(other.y);
        let w = self.x1.min(other.x1) - x;
        let h = self.y1.min(other.y1) - y;
        if w < 0 || h < 0 {
            None
        } else {
            Some(Bbox::new(x, y, w, h))
        }
    }

    /// Fraction of this box covered by `other`.
    pub fn overlap_ratio(&self, other: &Bbox) -> f32 {
        let area = self.area();
        if area == 0 {
            return 0.0;
        }
        self.intersect_area(other) as f32 / area as f32
    }

    /// Smallest box enclosing both boxes.
    pub fn union(&self, other: &Bbox) -> Bbox {
        Bbox::from_corners(
            self.x.min(other.x),
            self.y.min(other.y),
            self.x1.max(other.x1),
            self.y1.max(other.y1),
        )
    }

    /// Smallest box enclosing every box in `boxes`, or `None` for an empty set.
    pub fn merge<'a, I>(boxes: I) -> Option<Bbox>
    where
        I: IntoIterator<Item = &'a Bbox>,
    {
        boxes.into_iter().fold(None, |acc, b| match acc {
            None => Some(*b),
            Some(merged) => Some(merged.union(b)),
        })
    }

    /// `[x, y, width, height]`, the export representation.
    pub fn to_array(&self) -> [i32; 4] {
        [self.x, self.y, self.width, self.height]
    }
}

impl PartialEq for Bbox {
    fn eq(&self, other: &Self) -> bool {
        self.x == other.x
            && self.y == other.y
            && self.width == other.width
            && self.height == other.height
    }
}

impl Eq for Bbox {}

impl From<[i32; 4]> for Bbox {
    fn from(arr: [i32; 4]) -> Self {
        Bbox::new(arr[0], arr[1], arr[2], arr[3])
    }
}

impl From<Bbox> for [i32; 4] {
    fn from(b: Bbox) -> Self {
        b.to_array()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_derived_edges() {
        let b = Bbox::new(10, 20, 30, 40);
        assert_eq!(b.x1(), 40);
        assert_eq!(b.y1(), 60);
    }

    #[test]
    fn test_mutators_keep_edges_consistent() {
        let mut b = Bbox::new(10, 20, 30, 40);
        b.set_x(0);
        assert_eq!((b.x(), b.x1(), b.width()), (0, 30, 30));

        b.set_y1(100);
        assert_eq!((b.y(), b.y1(), b.height()), (20, 100, 80));

        b.set_left(5);
        assert_eq!((b.x(), b.x1(), b.width()), (5, 30, 25));

        b.set_top(50);
        assert_eq!((b.y(), b.y1(), b.height()), (50, 100, 50));

        for b in [b, Bbox::from_corners(3, 4, 9, 12)] {
            assert_eq!(b.x1(), b.x() + b.width());
            assert_eq!(b.y1(), b.y() + b.height());
        }
    }

    #[test]
    fn test_equality_ignores_derived_fields() {
        let a = Bbox::new(1, 2, 3, 4);
        let mut b = Bbox::new(0, 2, 4, 4);
        b.set_left(1);
        assert_eq!(a, b);
        assert_ne!(a, Bbox::new(1, 2, 3, 5));
    }

    #[test]
    fn test_merge_is_union_bounding_box() {
        let boxes = [Bbox::new(0, 0, 10, 10), Bbox::new(20, 20, 5, 5)];
        let merged = Bbox::merge(&boxes).unwrap();
        assert_eq!(merged, Bbox::new(0, 0, 25, 25));
        assert_eq!(merged.area(), 625);
        assert!(Bbox::merge(&[]).is_none());
    }

    #[test]
    fn test_intersection() {
        let a = Bbox::new(0, 0, 100, 100);
        let b = Bbox::new(50, 50, 100, 100);
        let c = Bbox::new(200, 200, 10, 10);

        assert_eq!(a.intersect_area(&b), 2500);
        assert_eq!(a.intersect(&b), Some(Bbox::new(50, 50, 50, 50)));
        assert_eq!(a.intersect_area(&c), 0);
        assert!(a.intersect(&c).is_none());
    }

    #[test]
    fn test_overlap_ratio() {
        let small = Bbox::new(10, 10, 10, 10);
        let big = Bbox::new(0, 0, 100, 100);
        assert_eq!(small.overlap_ratio(&big), 1.0);
        assert!((big.overlap_ratio(&small) - 0.01).abs() < 1e-6);
        assert_eq!(Bbox::new(0, 0, 0, 10).overlap_ratio(&big), 0.0);
    }

    #[test]
    fn test_serializes_as_array() {
        let b = Bbox::new(1, 2, 3, 4);
        let json = serde_json::to_string(&b).unwrap();
        assert_eq!(json, "[1,2,3,4]");
        let back: Bbox = serde_json::from_str(&json).unwrap();
        assert_eq!(back, b);
        assert_eq!(back.x1(), 4);
    }
}
