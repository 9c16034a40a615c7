//! Extraction options and configuration.

use super::Placement;
use crate::model::{CaptionKind, CaptionPatterns};
use crate::render::PageSelection;

/// Options for extracting figures from a document.
#[derive(Debug, Clone)]
pub struct ExtractOptions {
    /// Page selection (which pages to traverse)
    pub pages: PageSelection,

    /// Whether page 1 takes part in the traversal
    pub include_first_page: bool,

    /// Merged orphan candidates below this area are discarded as noise
    pub min_orphan_size: i64,

    /// A next-page caption may be claimed by an orphan when its left edge is
    /// below `content_region.x + row_height * top_caption_factor`
    pub top_caption_factor: f32,

    /// Maximum gap between caption lines, in row heights
    pub caption_gap_factor: f32,

    /// Caption pattern table
    pub patterns: CaptionPatterns,

    /// Layout derivation parameters
    pub layout: LayoutOptions,

    /// Region sweep parameters
    pub sweep: SweepOptions,
}

impl ExtractOptions {
    /// Create new extract options with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set page selection.
    pub fn with_pages(mut self, pages: PageSelection) -> Self {
        self.pages = pages;
        self
    }

    /// Include or skip page 1.
    pub fn with_first_page(mut self, include: bool) -> Self {
        self.include_first_page = include;
        self
    }

    /// Set the minimum orphan area.
    pub fn with_min_orphan_size(mut self, area: i64) -> Self {
        self.min_orphan_size = area;
        self
    }

    /// Set the next-page caption threshold factor.
    pub fn with_top_caption_factor(mut self, factor: f32) -> Self {
        self.top_caption_factor = factor;
        self
    }

    /// Set the caption expansion gap factor.
    pub fn with_caption_gap_factor(mut self, factor: f32) -> Self {
        self.caption_gap_factor = factor;
        self
    }

    /// Replace the caption pattern table.
    pub fn with_patterns(mut self, patterns: CaptionPatterns) -> Self {
        self.patterns = patterns;
        self
    }

    /// Set layout options.
    pub fn with_layout(mut self, layout: LayoutOptions) -> Self {
        self.layout = layout;
        self
    }

    /// Set sweep options.
    pub fn with_sweep(mut self, sweep: SweepOptions) -> Self {
        self.sweep = sweep;
        self
    }

    /// Whether the traversal visits page `number`.
    pub fn includes_page(&self, number: u32) -> bool {
        (number != 1 || self.include_first_page) && self.pages.includes(number)
    }
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            pages: PageSelection::All,
            include_first_page: false,
            min_orphan_size: 1000,
            top_caption_factor: 1.5,
            caption_gap_factor: 1.5,
            patterns: CaptionPatterns::default(),
            layout: LayoutOptions::default(),
            sweep: SweepOptions::default(),
        }
    }
}

/// Parameters of the document layout derivation.
#[derive(Debug, Clone, PartialEq)]
pub struct LayoutOptions {
    /// Text boxes narrower than this are not body lines
    pub min_text_width: i32,

    /// Left edges closer than this are counted as one
    pub left_padding_merge: i32,

    /// Minimum density of a column cluster relative to the densest one
    pub column_density: f32,

    /// Documents with more columns are rejected
    pub max_columns: usize,
}

impl LayoutOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_min_text_width(mut self, width: i32) -> Self {
        self.min_text_width = width;
        self
    }

    pub fn with_left_padding_merge(mut self, padding: i32) -> Self {
        self.left_padding_merge = padding;
        self
    }

    pub fn with_column_density(mut self, density: f32) -> Self {
        self.column_density = density;
        self
    }

    pub fn with_max_columns(mut self, max: usize) -> Self {
        self.max_columns = max.max(1);
        self
    }
}

impl Default for LayoutOptions {
    fn default() -> Self {
        Self {
            min_text_width: 30,
            left_padding_merge: 10,
            column_density: 0.3,
            max_columns: 3,
        }
    }
}

/// Parameters of the caption/candidate region sweep.
#[derive(Debug, Clone, PartialEq)]
pub struct SweepOptions {
    /// Placement passes for figure captions, in order
    pub figure_placements: Vec<Placement>,

    /// Placement passes for table captions, in order
    pub table_placements: Vec<Placement>,

    /// Overlap (either direction) needed for a candidate to join a band
    pub band_overlap: f32,

    /// Overlap needed on single-caption pages
    pub single_caption_overlap: f32,

    /// Horizontal padding added to matched figures
    pub x_padding: i32,
}

impl SweepOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the placement order for a caption kind.
    pub fn with_placements(mut self, kind: CaptionKind, placements: Vec<Placement>) -> Self {
        match kind {
            CaptionKind::Figure => self.figure_placements = placements,
            CaptionKind::Table => self.table_placements = placements,
        }
        self
    }

    pub fn with_band_overlap(mut self, ratio: f32) -> Self {
        self.band_overlap = ratio;
        self
    }

    pub fn with_single_caption_overlap(mut self, ratio: f32) -> Self {
        self.single_caption_overlap = ratio;
        self
    }

    pub fn with_x_padding(mut self, padding: i32) -> Self {
        self.x_padding = padding;
        self
    }

    /// Placement order for `kind`.
    pub fn placements(&self, kind: CaptionKind) -> &[Placement] {
        match kind {
            CaptionKind::Figure => &self.figure_placements,
            CaptionKind::Table => &self.table_placements,
        }
    }
}

impl Default for SweepOptions {
    fn default() -> Self {
        Self {
            figure_placements: vec![Placement::Below, Placement::Above, Placement::Beside],
            table_placements: vec![Placement::Above, Placement::Below, Placement::Beside],
            band_overlap: 0.5,
            single_caption_overlap: 0.1,
            x_padding: 5,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_options_builder() {
        let options = ExtractOptions::new()
            .with_first_page(true)
            .with_min_orphan_size(2500)
            .with_pages(PageSelection::Range(2..=4));

        assert!(options.include_first_page);
        assert_eq!(options.min_orphan_size, 2500);
        assert!(options.includes_page(3));
        assert!(!options.includes_page(5));
    }

    #[test]
    fn test_first_page_skipped_by_default() {
        let options = ExtractOptions::default();
        assert!(!options.includes_page(1));
        assert!(options.includes_page(2));

        let options = options.with_first_page(true);
        assert!(options.includes_page(1));
    }

    #[test]
    fn test_placement_preferences() {
        let sweep = SweepOptions::default();
        assert_eq!(sweep.placements(CaptionKind::Figure)[0], Placement::Below);
        assert_eq!(sweep.placements(CaptionKind::Table)[0], Placement::Above);

        let sweep = sweep.with_placements(CaptionKind::Figure, vec![Placement::Above]);
        assert_eq!(sweep.placements(CaptionKind::Figure), &[Placement::Above]);
    }

    #[test]
    fn test_layout_options_builder() {
        let layout = LayoutOptions::new().with_max_columns(0).with_min_text_width(20);
        assert_eq!(layout.max_columns, 1);
        assert_eq!(layout.min_text_width, 20);
    }
}
