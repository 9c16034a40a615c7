//! Cross-page orphan resolution.
//!
//! Candidates on a page without captions are merged into one region. When
//! the next page opens with exactly one caption at its very top, that
//! caption most likely describes the region and is moved over.

use crate::model::{Bbox, CaptionPatterns, Figure, Layout, Page};

use super::ExtractOptions;

/// What happened to a page's orphan candidates.
#[derive(Debug, Clone, PartialEq)]
pub enum OrphanOutcome {
    /// Merged region too small to be a figure
    Discarded,
    /// Caption taken from the next page
    Claimed(Figure),
    /// Captionless figure
    Unresolved(Figure),
}

impl OrphanOutcome {
    /// The emitted figure, if any.
    pub fn figure(&self) -> Option<&Figure> {
        match self {
            OrphanOutcome::Discarded => None,
            OrphanOutcome::Claimed(f) | OrphanOutcome::Unresolved(f) => Some(f),
        }
    }
}

/// Resolves candidates on caption-less pages.
#[derive(Debug, Clone, Copy)]
pub struct CrossPageOrphanResolver<'a> {
    layout: &'a Layout,
    patterns: &'a CaptionPatterns,
    min_orphan_size: i64,
    top_caption_factor: f32,
}

impl<'a> CrossPageOrphanResolver<'a> {
    pub fn new(layout: &'a Layout, options: &'a ExtractOptions) -> Self {
        Self {
            layout,
            patterns: &options.patterns,
            min_orphan_size: options.min_orphan_size,
            top_caption_factor: options.top_caption_factor,
        }
    }

    /// Left edge below which a next-page caption counts as sitting at the top.
    pub fn caption_threshold(&self) -> f32 {
        self.layout.content_region.x() as f32
            + self.layout.row_height as f32 * self.top_caption_factor
    }

    /// Resolve `candidates` of `page`. `next` is the following page of the
    /// traversal, `None` on the last one. A claimed caption is removed from
    /// `next`.
    pub fn resolve(&self, page: &Page, next: Option<&mut Page>, candidates: &[Bbox]) -> OrphanOutcome {
        let Some(merged) = Bbox::merge(candidates) else {
            return OrphanOutcome::Discarded;
        };
        if merged.area() < self.min_orphan_size {
            log::debug!(
                "pg.{}: orphan region of area {} discarded as noise",
                page.number,
                merged.area()
            );
            return OrphanOutcome::Discarded;
        }

        let multicolumn = self.layout.is_multicolumn(&merged);
        let unresolved = || {
            OrphanOutcome::Unresolved(
                Figure::orphan(merged, None, String::new()).with_multicolumn(multicolumn),
            )
        };

        let Some(next) = next else {
            return unresolved();
        };

        let threshold = self.caption_threshold();
        let qualifying: Vec<usize> = next
            .captions
            .iter()
            .filter(|c| (c.bbox.x() as f32) < threshold)
            .map(|c| c.id)
            .collect();

        if qualifying.len() != 1 {
            log::debug!(
                "pg.{}: {} caption(s) qualify on pg.{}, no claim",
                page.number,
                qualifying.len(),
                next.number
            );
            return unresolved();
        }

        match next.take_caption(qualifying[0]) {
            Some(caption) => {
                log::debug!(
                    "pg.{}: orphan claimed caption {} from pg.{}",
                    page.number,
                    caption.id,
                    next.number
                );
                let identifier = caption.caption_identifier(self.patterns).unwrap_or_default();
                OrphanOutcome::Claimed(
                    Figure::orphan(merged, Some(caption), identifier).with_multicolumn(multicolumn),
                )
            }
            None => unresolved(),
        }
    }
}
