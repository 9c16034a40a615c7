//! Extracted figures.

use serde::{Deserialize, Serialize};

use super::{Bbox, CaptionKind, TextBox};

/// How a figure was paired with its caption.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SweepType {
    /// Matched on its own page by the region sweep
    #[serde(rename = "page-sweep")]
    PageSweep,
    /// Leftover region, possibly claiming a caption from the next page
    #[serde(rename = "orphan")]
    Orphan,
}

impl SweepType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SweepType::PageSweep => "page-sweep",
            SweepType::Orphan => "orphan",
        }
    }
}

/// A graphical region paired (or not) with a caption.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Figure {
    /// Region in page units
    pub bbox: Bbox,

    /// Whether the region spans more than one column
    pub multicolumn: bool,

    /// Caption owned by this figure; absent for unmatched orphans
    pub caption: Option<TextBox>,

    /// Matching strategy that produced the figure
    pub sweep_type: SweepType,

    /// Leading caption pattern match ("Figure 3."), empty without a caption
    pub identifier: String,

    /// Figure or table
    pub kind: CaptionKind,
}

impl Figure {
    /// Figure matched to a caption on the same page.
    pub fn page_sweep(bbox: Bbox, caption: TextBox, identifier: String) -> Self {
        Self {
            bbox,
            multicolumn: false,
            kind: caption.kind(),
            caption: Some(caption),
            sweep_type: SweepType::PageSweep,
            identifier,
        }
    }

    /// Orphan region, with the caption claimed from the next page if any.
    pub fn orphan(bbox: Bbox, caption: Option<TextBox>, identifier: String) -> Self {
        Self {
            bbox,
            multicolumn: false,
            kind: caption.as_ref().map(TextBox::kind).unwrap_or_default(),
            caption,
            sweep_type: SweepType::Orphan,
            identifier,
        }
    }

    /// Set the multicolumn flag.
    pub fn with_multicolumn(mut self, multicolumn: bool) -> Self {
        self.multicolumn = multicolumn;
        self
    }

    /// Caption text, or an empty string.
    pub fn caption_text(&self) -> &str {
        self.caption.as_ref().map(|c| c.text.as_str()).unwrap_or("")
    }

    pub fn has_caption(&self) -> bool {
        self.caption.is_some()
    }
}
