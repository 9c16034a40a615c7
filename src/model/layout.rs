//! Document-wide layout model.

use serde::{Deserialize, Serialize};

use super::Bbox;

/// Column structure and text metrics shared by every page of a document.
///
/// Built once by [`crate::parser::LayoutBuilder`] and read-only afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Layout {
    /// Representative page width (HTML units)
    pub width: i32,

    /// Representative page height (HTML units)
    pub height: i32,

    /// Number of text columns
    pub num_columns: usize,

    /// Representative body-line width
    pub row_width: i32,

    /// Representative body-line height, the proximity unit of the matcher
    pub row_height: i32,

    /// Region enclosing the body text
    pub content_region: Bbox,

    /// `num_columns + 1` strictly ascending column boundaries
    pub column_coordinates: Vec<i32>,
}

impl Layout {
    /// Width of a single column.
    pub fn column_width(&self) -> i32 {
        self.content_region.width() / self.num_columns.max(1) as i32
    }

    /// Index of the column containing `x`, clamped to the outer columns.
    pub fn column_of(&self, x: i32) -> usize {
        let last = self.num_columns.saturating_sub(1);
        self.column_coordinates
            .iter()
            .skip(1)
            .take(last)
            .position(|&boundary| x < boundary)
            .unwrap_or(last)
    }

    /// First and last column touched by `bbox`.
    pub fn column_span(&self, bbox: &Bbox) -> (usize, usize) {
        // The right edge is exclusive, so a box ending on a boundary stays in its column.
        let first = self.column_of(bbox.x());
        let last = self.column_of((bbox.x1() - 1).max(bbox.x()));
        (first, last.max(first))
    }

    /// Whether `bbox` is wider than a single column.
    pub fn is_multicolumn(&self, bbox: &Bbox) -> bool {
        self.num_columns > 1 && bbox.width() > self.column_width()
    }

    /// Horizontal extent `(left, right)` of columns `first..=last`.
    pub fn span_bounds(&self, first: usize, last: usize) -> (i32, i32) {
        let n = self.column_coordinates.len();
        if n < 2 {
            return (self.content_region.x(), self.content_region.x1());
        }
        let first = first.min(n - 2);
        let last = last.clamp(first, n - 2);
        (
            self.column_coordinates[first],
            self.column_coordinates[last + 1],
        )
    }

    /// Horizontal extent of the columns touched by `bbox`.
    pub fn span_of(&self, bbox: &Bbox) -> (i32, i32) {
        let (first, last) = self.column_span(bbox);
        self.span_bounds(first, last)
    }

    /// Interior column boundaries (excluding the content region edges).
    pub fn interior_boundaries(&self) -> &[i32] {
        let n = self.column_coordinates.len();
        if n <= 2 {
            &[]
        } else {
            &self.column_coordinates[1..n - 1]
        }
    }
}


#[cfg(test)]
mod tests {
    use super::fixtures::*;
    use super::*;

    #[test]
    fn test_column_of() {
        let layout = two_column();
        assert_eq!(layout.column_width(), 256);
        assert_eq!(layout.column_of(10), 0);
        assert_eq!(layout.column_of(100), 0);
        assert_eq!(layout.column_of(306), 1);
        assert_eq!(layout.column_of(600), 1);
    }

    #[test]
    fn test_column_span_and_bounds() {
        let layout = two_column();
        let left = Bbox::new(60, 100, 200, 50);
        let wide = Bbox::new(60, 100, 480, 50);

        assert_eq!(layout.column_span(&left), (0, 0));
        assert_eq!(layout.column_span(&wide), (0, 1));
        assert_eq!(layout.span_of(&left), (50, 306));
        assert_eq!(layout.span_of(&wide), (50, 562));

        // Ends exactly on the boundary
        let flush = Bbox::from_corners(60, 100, 306, 150);
        assert_eq!(layout.column_span(&flush), (0, 0));
    }

    #[test]
    fn test_is_multicolumn() {
        let layout = two_column();
        assert!(!layout.is_multicolumn(&Bbox::new(60, 100, 200, 50)));
        assert!(layout.is_multicolumn(&Bbox::new(60, 100, 400, 50)));
        assert!(!single_column().is_multicolumn(&Bbox::new(60, 100, 500, 50)));
    }

    #[test]
    fn test_interior_boundaries() {
        assert_eq!(two_column().interior_boundaries(), &[306]);
        assert!(single_column().interior_boundaries().is_empty());
        assert_eq!(single_column().span_bounds(0, 3), (56, 556));
    }
}
