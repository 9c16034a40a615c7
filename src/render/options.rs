//! Export options.

use std::ops::RangeInclusive;

use super::JsonFormat;
use crate::error::{Error, Result};

/// Options for writing metadata, figure crops and debug overlays.
#[derive(Debug, Clone)]
pub struct ExportOptions {
    /// Resolution of the page rasters figures are cropped from
    pub dpi: u32,

    /// Crop expansion on each side, as a fraction of the figure's size
    pub crop_padding: f32,

    /// File name prefix for crops (`{prefix}_{page}_{n}.jpg`)
    pub prefix: Option<String>,

    /// Metadata JSON formatting
    pub json_format: JsonFormat,

    /// JPEG quality of the crops (1-100)
    pub jpeg_quality: u8,

    /// Draw text boxes on debug overlays
    pub debug_text_boxes: bool,

    /// Draw column boundaries on debug overlays
    pub debug_columns: bool,
}

impl ExportOptions {
    /// Create new export options with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the raster resolution.
    pub fn with_dpi(mut self, dpi: u32) -> Self {
        self.dpi = dpi.max(1);
        self
    }

    /// Set the crop expansion, in percent of the figure's width/height.
    pub fn with_crop_percentage(mut self, percent: f32) -> Self {
        self.crop_padding = percent.max(0.0) / 100.0;
        self
    }

    /// Set the crop file name prefix.
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = Some(prefix.into());
        self
    }

    /// Set the JSON format.
    pub fn with_json_format(mut self, format: JsonFormat) -> Self {
        self.json_format = format;
        self
    }

    /// Set the JPEG quality.
    pub fn with_jpeg_quality(mut self, quality: u8) -> Self {
        self.jpeg_quality = quality.clamp(1, 100);
        self
    }

    /// Draw text boxes and column boundaries on debug overlays.
    pub fn with_debug_details(mut self, text_boxes: bool, columns: bool) -> Self {
        self.debug_text_boxes = text_boxes;
        self.debug_columns = columns;
        self
    }

    /// Output file name of the `index`-th (0-based) figure on `page`.
    pub fn figure_name(&self, page: u32, index: usize) -> String {
        match &self.prefix {
            Some(prefix) if !prefix.is_empty() => format!("{}_{}_{}.jpg", prefix, page, index + 1),
            _ => format!("{}_{}.jpg", page, index + 1),
        }
    }
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            dpi: 300,
            crop_padding: 0.035,
            prefix: None,
            json_format: JsonFormat::Pretty,
            jpeg_quality: 90,
            debug_text_boxes: true,
            debug_columns: false,
        }
    }
}

/// Pages taking part in extraction.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum PageSelection {
    /// Every page
    #[default]
    All,
    /// A range of pages (inclusive, 1-indexed)
    Range(RangeInclusive<u32>),
    /// Specific pages (1-indexed)
    Pages(Vec<u32>),
}

impl PageSelection {
    /// Check if a page number should be included.
    pub fn includes(&self, page: u32) -> bool {
        match self {
            PageSelection::All => true,
            PageSelection::Range(range) => range.contains(&page),
            PageSelection::Pages(pages) => pages.contains(&page),
        }
    }

    /// Parse a page selection string (e.g., "2-10", "2,4,6-9").
    pub fn parse(s: &str) -> Result<Self> {
        let s = s.trim();
        if s.is_empty() || s.eq_ignore_ascii_case("all") {
            return Ok(PageSelection::All);
        }

        let number = |p: &str| {
            p.trim()
                .parse::<u32>()
                .ok()
                .filter(|&n| n > 0)
                .ok_or_else(|| Error::InvalidPageRange(format!("invalid page number '{}'", p.trim())))
        };

        if !s.contains(',') {
            if let Some((start, end)) = s.split_once('-') {
                let (start, end) = (number(start)?, number(end)?);
                if start > end {
                    return Err(Error::InvalidPageRange(s.to_string()));
                }
                return Ok(PageSelection::Range(start..=end));
            }
        }

        let mut pages = Vec::new();
        for part in s.split(',') {
            match part.split_once('-') {
                Some((start, end)) => {
                    let (start, end) = (number(start)?, number(end)?);
                    if start > end {
                        return Err(Error::InvalidPageRange(part.trim().to_string()));
                    }
                    pages.extend(start..=end);
                }
                None => pages.push(number(part)?),
            }
        }

        pages.sort_unstable();
        pages.dedup();
        Ok(PageSelection::Pages(pages))
    }
}
