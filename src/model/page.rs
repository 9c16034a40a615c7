//! Page-level types.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use unicode_normalization::UnicodeNormalization;

use super::{Bbox, CaptionPatterns, Figure, TextBox};

/// A single converted page of the document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Page {
    /// Page number (1-indexed)
    pub number: u32,

    /// Page width in HTML units (differs from the raster width)
    pub width: i32,

    /// Page height in HTML units
    pub height: i32,

    /// Rendered raster of the page
    pub image_path: PathBuf,

    /// Converted HTML of the page
    pub html_path: PathBuf,

    /// Non-caption text boxes, in measurement order
    pub text_boxes: Vec<TextBox>,

    /// Caption boxes, top-to-bottom then left-to-right
    pub captions: Vec<TextBox>,

    /// Candidate graphical regions found during traversal
    pub candidates: Vec<Bbox>,

    /// Figures extracted from this page
    pub figures: Vec<Figure>,

    /// Merged leftover candidates the sweep could not pair with a caption
    pub dangling_orphan_candidate: Option<Bbox>,

    /// Ids of captions the sweep left unmatched
    pub unmatched_captions: Vec<usize>,
}

impl Page {
    /// Create an empty page with the given dimensions.
    pub fn new(number: u32, width: i32, height: i32) -> Self {
        Self {
            number,
            width,
            height,
            image_path: PathBuf::new(),
            html_path: PathBuf::new(),
            text_boxes: Vec::new(),
            captions: Vec::new(),
            candidates: Vec::new(),
            figures: Vec::new(),
            dangling_orphan_candidate: None,
            unmatched_captions: Vec::new(),
        }
    }

    /// Build a page from measured `(bbox, text)` pairs.
    ///
    /// Text is NFKC-normalized and trimmed, empty boxes are dropped, and
    /// every remaining box is classified: caption starts go to
    /// [`Page::captions`], the rest to [`Page::text_boxes`].
    pub fn from_measured<I>(
        number: u32,
        width: i32,
        height: i32,
        measured: I,
        patterns: &CaptionPatterns,
    ) -> Self
    where
        I: IntoIterator<Item = (Bbox, String)>,
    {
        let mut page = Self::new(number, width, height);

        let boxes = measured
            .into_iter()
            .filter_map(|(bbox, text)| {
                let text: String = text.nfkc().collect();
                let text = text.trim();
                (!text.is_empty()).then(|| (bbox, text.to_string()))
            })
            .enumerate();

        for (id, (bbox, text)) in boxes {
            let mut text_box = TextBox::new(id, number, bbox, text);
            if text_box.classify(patterns).is_some() {
                page.captions.push(text_box);
            } else {
                page.text_boxes.push(text_box);
            }
        }
        page.sort_captions();
        page
    }

    /// Set the raster and HTML paths.
    pub fn with_paths(mut self, image_path: impl Into<PathBuf>, html_path: impl Into<PathBuf>) -> Self {
        self.image_path = image_path.into();
        self.html_path = html_path.into();
        self
    }

    /// Order captions top-to-bottom, then left-to-right.
    pub fn sort_captions(&mut self) {
        self.captions
            .sort_by_key(|c| (c.bbox.y(), c.bbox.x(), c.id));
    }

    /// Remove the caption with `id` and hand it to the caller.
    ///
    /// This is the only way a caption leaves a page, so a caption moved
    /// this way can never be matched again.
    pub fn take_caption(&mut self, id: usize) -> Option<TextBox> {
        let pos = self.captions.iter().position(|c| c.id == id)?;
        Some(self.captions.remove(pos))
    }

    /// Look up a caption by id.
    pub fn caption(&self, id: usize) -> Option<&TextBox> {
        self.captions.iter().find(|c| c.id == id)
    }

    /// Add an extracted figure.
    pub fn add_figure(&mut self, figure: Figure) {
        self.figures.push(figure);
    }

    pub fn has_captions(&self) -> bool {
        !self.captions.is_empty()
    }

    pub fn figure_count(&self) -> usize {
        self.figures.len()
    }

    /// Page box in HTML units.
    pub fn bbox(&self) -> Bbox {
        Bbox::new(0, 0, self.width, self.height)
    }

    /// All text and caption boxes on the page.
    pub fn all_text(&self) -> impl Iterator<Item = &TextBox> {
        self.text_boxes.iter().chain(self.captions.iter())
    }
}
