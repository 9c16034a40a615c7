//! Document layout derivation.
//!
//! The layout is computed once from the measured text of every page: the
//! representative page size, the body-line metrics used as proximity units,
//! the content region and the column boundaries.

use std::collections::HashMap;

use super::LayoutOptions;
use crate::error::{Error, Result};
use crate::model::{Bbox, Layout, Page, TextBox};

/// Builds the document-wide [`Layout`].
#[derive(Debug, Clone, Default)]
pub struct LayoutBuilder {
    options: LayoutOptions,
}

impl LayoutBuilder {
    /// Create a builder with the given options.
    pub fn new(options: LayoutOptions) -> Self {
        Self { options }
    }

    /// Derive the layout from all pages of a document.
    pub fn build(&self, pages: &[Page]) -> Result<Layout> {
        let body: Vec<&TextBox> = pages
            .iter()
            .flat_map(|p| p.all_text())
            .filter(|tb| tb.bbox.width() > self.options.min_text_width)
            .collect();
        if body.is_empty() {
            return Err(Error::Layout("no body text lines found".into()));
        }

        let (width, height) = page_size(pages);
        let row_width = mode(body.iter().map(|tb| tb.bbox.width()))
            .ok_or_else(|| Error::Layout("no body line widths".into()))?;
        let row_height = median(body.iter().map(|tb| tb.bbox.height()))
            .ok_or_else(|| Error::Layout("no body line heights".into()))?;

        let mut content_region = self.content_region(pages, &body, width, height)?;
        let mut column_coordinates = self.columns(&body, &content_region, row_width);
        let num_columns = column_coordinates.len() - 1;

        if num_columns > self.options.max_columns {
            return Err(Error::Layout(format!(
                "document has {} columns, at most {} are supported",
                num_columns, self.options.max_columns
            )));
        }

        if num_columns == 1 && content_region.x() > width / 4 {
            // Narrow single column: widen to the outermost text
            let all = || pages.iter().flat_map(|p| p.all_text());
            if let (Some(left), Some(right)) = (
                all().map(|tb| tb.bbox.x()).min(),
                all().map(|tb| tb.bbox.x1()).max(),
            ) {
                content_region = Bbox::from_corners(
                    left,
                    content_region.y(),
                    right,
                    content_region.y1(),
                );
                column_coordinates = vec![left, right];
                log::debug!("Single column widened to [{}, {}]", left, right);
            }
        }

        log::debug!(
            "Layout: page {}x{}, row {}x{}, columns {:?}",
            width,
            height,
            row_width,
            row_height,
            column_coordinates
        );

        Ok(Layout {
            width,
            height,
            num_columns,
            row_width,
            row_height,
            content_region,
            column_coordinates,
        })
    }

    /// Bounding region of the body text, trimmed of outliers.
    fn content_region(
        &self,
        pages: &[Page],
        body: &[&TextBox],
        page_width: i32,
        page_height: i32,
    ) -> Result<Bbox> {
        let left_edges = histogram(
            body.iter()
                .map(|tb| tb.bbox.x())
                .filter(|&x| x < page_width / 2),
        );
        let left = merge_padded(left_edges, self.options.left_padding_merge)
            .first()
            .map(|&(x, _)| x)
            .ok_or_else(|| Error::Layout("no body lines in the left half of the page".into()))?;

        let top = body
            .iter()
            .map(|tb| tb.bbox.y())
            .min()
            .unwrap_or(0)
            .max(0);
        // Overflowing divs are capped with a margin mirroring the left one
        let right = body
            .iter()
            .map(|tb| tb.bbox.x1())
            .max()
            .unwrap_or(page_width)
            .min(page_width - left);
        if right <= left {
            return Err(Error::Layout(format!(
                "empty content region between x={} and x={}",
                left, right
            )));
        }

        let bottom = pages
            .iter()
            .flat_map(|p| p.all_text())
            .filter(|tb| {
                tb.bbox.x() >= left
                    && tb.bbox.x1() <= right
                    && tb.bbox.y() >= top
                    && tb.bbox.y1() <= page_height
            })
            .map(|tb| tb.bbox.y1())
            .max()
            .ok_or_else(|| Error::Layout("could not find a bottom edge for the content region".into()))?;

        Ok(Bbox::from_corners(left, top, right, bottom))
    }

    /// Column boundaries from clustered left edges.
    fn columns(&self, body: &[&TextBox], region: &Bbox, row_width: i32) -> Vec<i32> {
        let clusters = merge_padded(
            histogram(body.iter().map(|tb| tb.bbox.x())),
            self.options.left_padding_merge,
        );
        let densest = clusters.first().map(|&(_, count)| count).unwrap_or(0);
        let min_count = (densest as f32 * self.options.column_density).ceil() as usize;

        let mut significant: Vec<i32> = clusters
            .iter()
            .filter(|&&(_, count)| count >= min_count.max(1))
            .map(|&(x, _)| x)
            .collect();
        significant.sort_unstable();

        let mut coords = vec![region.x()];
        let mut previous = region.x();
        for x in significant {
            if x >= previous + row_width / 2 && x < region.x1() {
                log::debug!("Column starts at x={}", x);
                coords.push(x);
                previous = x;
            }
        }
        coords.push(region.x1());
        coords
    }
}

/// Most frequent page size; ties go to the size seen first.
fn page_size(pages: &[Page]) -> (i32, i32) {
    let mut counts: Vec<((i32, i32), usize)> = Vec::new();
    for page in pages {
        let size = (page.width, page.height);
        match counts.iter_mut().find(|(s, _)| *s == size) {
            Some((_, count)) => *count += 1,
            None => counts.push((size, 1)),
        }
    }
    counts
        .iter()
        .fold(None, |best: Option<&((i32, i32), usize)>, entry| match best {
            Some(b) if b.1 >= entry.1 => Some(b),
            _ => Some(entry),
        })
        .map(|(size, _)| *size)
        .unwrap_or((0, 0))
}

/// Value counts sorted by count (descending), then value (ascending).
fn histogram(values: impl Iterator<Item = i32>) -> Vec<(i32, usize)> {
    let mut counts: HashMap<i32, usize> = HashMap::new();
    for v in values {
        *counts.entry(v).or_insert(0) += 1;
    }
    let mut sorted: Vec<(i32, usize)> = counts.into_iter().collect();
    sorted.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
    sorted
}

/// Fold every point into the first (most frequent) point within `padding`.
fn merge_padded(mut points: Vec<(i32, usize)>, padding: i32) -> Vec<(i32, usize)> {
    let mut i = 0;
    while i < points.len() {
        let mut j = i + 1;
        while j < points.len() {
            if (points[i].0 - points[j].0).abs() <= padding {
                points[i].1 += points[j].1;
                points.remove(j);
            } else {
                j += 1;
            }
        }
        i += 1;
    }
    points.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
    points
}

/// Most frequent value; ties go to the larger value.
fn mode(values: impl Iterator<Item = i32>) -> Option<i32> {
    histogram(values)
        .into_iter()
        .max_by(|a, b| a.1.cmp(&b.1).then(a.0.cmp(&b.0)))
        .map(|(v, _)| v)
}

fn median(values: impl Iterator<Item = i32>) -> Option<i32> {
    let mut sorted: Vec<i32> = values.collect();
    if sorted.is_empty() {
        return None;
    }
    sorted.sort_unstable();
    Some(sorted[sorted.len() / 2])
}
