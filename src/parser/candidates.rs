//! Candidate graphical regions.
//!
//! A [`CandidateDetector`] turns a rendered page into bounding boxes that may
//! hold a figure or a table. The default [`ContourDetector`] binarizes the
//! page raster, dilates it and keeps the outer contours that do not look
//! like text.

use image::{GrayImage, Luma};
use imageproc::contours::{find_contours, BorderType};
use imageproc::distance_transform::Norm;
use imageproc::morphology::dilate;

use crate::error::{Error, Result};
use crate::model::{Bbox, Layout, Page};

/// Trait for candidate region detection policies.
pub trait CandidateDetector: Send + Sync {
    /// Candidate regions of `page`, in page units.
    fn detect(&self, page: &Page, layout: &Layout) -> Result<Vec<Bbox>>;

    /// Get the detector name for logging.
    fn name(&self) -> &str;
}

/// Tunables of the contour policy.
#[derive(Debug, Clone, PartialEq)]
pub struct ContourConfig {
    /// Pixels darker than this are foreground
    pub threshold: u8,

    /// Dilation radius (L-infinity), 2 gives a 5x5 square kernel
    pub dilation_radius: u8,

    /// Minimum share of a region inside the content region
    pub min_content_overlap: f32,

    /// Regions may start this far above the content region
    pub top_margin: i32,

    /// Regions covered by text beyond this share are dropped
    pub max_text_coverage: f32,

    /// Regions smaller than this area are dropped
    pub min_area: i64,
}

impl ContourConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_threshold(mut self, threshold: u8) -> Self {
        self.threshold = threshold;
        self
    }

    pub fn with_dilation_radius(mut self, radius: u8) -> Self {
        self.dilation_radius = radius;
        self
    }

    pub fn with_min_content_overlap(mut self, ratio: f32) -> Self {
        self.min_content_overlap = ratio;
        self
    }

    pub fn with_max_text_coverage(mut self, ratio: f32) -> Self {
        self.max_text_coverage = ratio;
        self
    }

    pub fn with_min_area(mut self, area: i64) -> Self {
        self.min_area = area;
        self
    }
}

impl Default for ContourConfig {
    fn default() -> Self {
        Self {
            threshold: 240,
            dilation_radius: 2,
            min_content_overlap: 0.75,
            top_margin: 10,
            max_text_coverage: 0.8,
            min_area: 0,
        }
    }
}

/// Contour-based candidate detection on the page raster.
#[derive(Debug, Clone, Default)]
pub struct ContourDetector {
    config: ContourConfig,
}

impl ContourDetector {
    /// Create a detector with default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a detector with custom configuration.
    pub fn with_config(config: ContourConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ContourConfig {
        &self.config
    }

    /// Outer contour boxes of `gray`, scaled to a `page_width` x `page_height` page.
    pub fn raster_regions(&self, gray: &GrayImage, page_width: i32, page_height: i32) -> Vec<Bbox> {
        let threshold = self.config.threshold;
        let mask = GrayImage::from_fn(gray.width(), gray.height(), |x, y| {
            if gray.get_pixel(x, y)[0] < threshold {
                Luma([255u8])
            } else {
                Luma([0u8])
            }
        });
        let mask = if self.config.dilation_radius > 0 {
            dilate(&mask, Norm::LInf, self.config.dilation_radius)
        } else {
            mask
        };

        let scale = raster_scale(gray.width(), gray.height(), page_width, page_height);

        find_contours::<u32>(&mask)
            .iter()
            .filter(|c| c.border_type == BorderType::Outer && c.parent.is_none())
            .filter_map(|c| {
                let min_x = c.points.iter().map(|p| p.x).min()?;
                let max_x = c.points.iter().map(|p| p.x).max()?;
                let min_y = c.points.iter().map(|p| p.y).min()?;
                let max_y = c.points.iter().map(|p| p.y).max()?;
                Some(Bbox::new(
                    (min_x as f32 / scale) as i32,
                    (min_y as f32 / scale) as i32,
                    ((max_x - min_x + 1) as f32 / scale) as i32,
                    ((max_y - min_y + 1) as f32 / scale) as i32,
                ))
            })
            .collect()
    }
}

impl CandidateDetector for ContourDetector {
    fn detect(&self, page: &Page, layout: &Layout) -> Result<Vec<Bbox>> {
        let raster = image::open(&page.image_path).map_err(|e| Error::Candidates {
            page: page.number,
            message: format!("{}: {}", page.image_path.display(), e),
        })?;
        let regions = self.raster_regions(&raster.to_luma8(), page.width, page.height);
        log::debug!("pg.{}: {} raw contour(s)", page.number, regions.len());
        Ok(refine(regions, page, layout, &self.config))
    }

    fn name(&self) -> &str {
        "contour"
    }
}

/// Raster pixels per page unit, taken along the longer side.
fn raster_scale(raster_width: u32, raster_height: u32, page_width: i32, page_height: i32) -> f32 {
    let scale = if raster_height > raster_width {
        raster_height as f32 / page_height.max(1) as f32
    } else {
        raster_width as f32 / page_width.max(1) as f32
    };
    if scale > 0.0 {
        scale
    } else {
        1.0
    }
}

/// Filter and merge raw regions into candidates.
///
/// Regions must lie inside the content region. A region crossing an
/// interior column boundary absorbs every region in its horizontal band.
/// Regions are trimmed so they stop at caption edges, and regions mostly
/// covered by text or too small are dropped.
pub fn refine(regions: Vec<Bbox>, page: &Page, layout: &Layout, config: &ContourConfig) -> Vec<Bbox> {
    let cr = layout.content_region;
    let inside: Vec<Bbox> = regions
        .into_iter()
        .filter(|r| r.overlap_ratio(&cr) > config.min_content_overlap)
        .collect();

    let merged = merge_column_crossings(inside, layout);

    merged
        .into_iter()
        .filter_map(|mut region| {
            for caption in &page.captions {
                if region.intersect_area(&caption.bbox) == 0 {
                    continue;
                }
                if region.x() < caption.bbox.x() {
                    region.set_x1(caption.bbox.x());
                } else {
                    region.set_left(caption.bbox.x1().min(region.x1()));
                }
            }
            (region.width() > 0).then_some(region)
        })
        .filter(|region| {
            let covered: i64 = page
                .text_boxes
                .iter()
                .map(|tb| region.intersect_area(&tb.bbox))
                .sum();
            let coverage = covered as f32 / region.area().max(1) as f32;
            coverage <= config.max_text_coverage
        })
        .filter(|region| {
            region.y() >= cr.y() - config.top_margin
                && region.height() > layout.row_height
                && region.area() >= config.min_area
        })
        .collect()
}

/// Merge regions crossing a column boundary with the regions sharing their band.
fn merge_column_crossings(regions: Vec<Bbox>, layout: &Layout) -> Vec<Bbox> {
    let boundaries = layout.interior_boundaries();
    if boundaries.is_empty() {
        return regions;
    }

    let cr = layout.content_region;
    let mut groups: Vec<Vec<usize>> = Vec::new();
    for (i, region) in regions.iter().enumerate() {
        let crosses = boundaries
            .iter()
            .any(|&b| region.x() < b && region.x1() > b);
        if !crosses {
            continue;
        }
        let band = Bbox::new(cr.x(), region.y(), cr.width(), region.height());
        let mut group = vec![i];
        group.extend(
            regions
                .iter()
                .enumerate()
                .filter(|&(j, other)| j != i && band.intersect_area(other) > 0)
                .map(|(j, _)| j),
        );
        if group.len() > 1 {
            groups.push(group);
        }
    }

    let mut grouped = vec![false; regions.len()];
    for &idx in groups.iter().flatten() {
        grouped[idx] = true;
    }

    let mut out: Vec<Bbox> = regions
        .iter()
        .zip(&grouped)
        .filter(|&(_, &g)| !g)
        .map(|(r, _)| *r)
        .collect();
    for group in &groups {
        if let Some(merged) = Bbox::merge(group.iter().map(|&i| &regions[i])) {
            if !out.contains(&merged) {
                log::debug!("Merged {} regions across columns into {:?}", group.len(), merged.to_array());
                out.push(merged);
            }
        }
    }
    out
}
