//! Text boxes and caption classification.

use regex::Regex;
use serde::{Deserialize, Serialize};

use super::Bbox;
use crate::error::{Error, Result};

/// Kind of caption, and of the figure it describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CaptionKind {
    /// Figure caption ("Figure 3.", "Fig. S1:")
    #[default]
    Figure,
    /// Table caption ("Table 2", "TABLE IV")
    Table,
}

impl CaptionKind {
    /// Lowercase label used in logs and exports.
    pub fn as_str(&self) -> &'static str {
        match self {
            CaptionKind::Figure => "figure",
            CaptionKind::Table => "table",
        }
    }
}

impl std::fmt::Display for CaptionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One row of the caption pattern table.
#[derive(Debug, Clone)]
pub struct CaptionPattern {
    /// Kind assigned to matching text
    pub kind: CaptionKind,
    /// Pattern anchored at the start of the text
    pub regex: Regex,
}

/// Declarative `{kind -> pattern}` table used to recognize caption starts.
///
/// Rows are tried in order and the first match wins, so more specific
/// patterns must come first.
#[derive(Debug, Clone)]
pub struct CaptionPatterns {
    patterns: Vec<CaptionPattern>,
}

const FIGURE_PATTERN: &str = r"(?i)^fig(?:ure|\.)?\s*(?:[a-z]\.?\s*)?\d+[.:]";
const TABLE_PATTERN: &str = r"(?i)^table\s*(?:[a-z]\.?\s*)?(?:\d+|[ivxlc]+\b)";

impl CaptionPatterns {
    /// Create an empty table.
    pub fn empty() -> Self {
        Self {
            patterns: Vec::new(),
        }
    }

    /// Append a row. The pattern is compiled case-insensitively.
    pub fn with_pattern(mut self, kind: CaptionKind, pattern: &str) -> Result<Self> {
        let pattern = if pattern.starts_with("(?i)") {
            pattern.to_string()
        } else {
            format!("(?i){}", pattern)
        };
        let regex = Regex::new(&pattern)
            .map_err(|e| Error::InvalidPattern(format!("{}: {}", pattern, e)))?;
        self.patterns.push(CaptionPattern { kind, regex });
        Ok(self)
    }

    /// Kind of the first row matching `text`.
    pub fn classify(&self, text: &str) -> Option<CaptionKind> {
        self.patterns
            .iter()
            .find(|p| p.regex.is_match(text))
            .map(|p| p.kind)
    }

    /// Leading substring matched by the first matching row.
    pub fn identifier(&self, text: &str) -> Option<String> {
        self.patterns
            .iter()
            .find_map(|p| p.regex.find(text))
            .map(|m| m.as_str().trim_end().to_string())
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }
}

impl Default for CaptionPatterns {
    fn default() -> Self {
        Self {
            patterns: vec![
                CaptionPattern {
                    kind: CaptionKind::Figure,
                    regex: Regex::new(FIGURE_PATTERN).expect("figure caption pattern"),
                },
                CaptionPattern {
                    kind: CaptionKind::Table,
                    regex: Regex::new(TABLE_PATTERN).expect("table caption pattern"),
                },
            ],
        }
    }
}

/// A positioned run of text (one measured `div`) on a page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextBox {
    /// Index of the box among the page's measured boxes
    pub id: usize,

    /// Page the box belongs to (1-indexed)
    pub page_number: u32,

    /// Position and size in page units
    pub bbox: Bbox,

    /// Text content
    pub text: String,

    /// Caption kind, set when the box starts a caption
    pub caption_kind: Option<CaptionKind>,
}

impl TextBox {
    /// Create a plain text box.
    pub fn new(id: usize, page_number: u32, bbox: Bbox, text: impl Into<String>) -> Self {
        Self {
            id,
            page_number,
            bbox,
            text: text.into(),
            caption_kind: None,
        }
    }

    /// Classify the box against `patterns`, remembering the caption kind.
    pub fn classify(&mut self, patterns: &CaptionPatterns) -> Option<CaptionKind> {
        self.caption_kind = patterns.classify(&self.text);
        self.caption_kind
    }

    /// Whether the text starts like a caption.
    pub fn can_be_caption(&self, patterns: &CaptionPatterns) -> bool {
        patterns.classify(&self.text).is_some()
    }

    /// Caption identifier (e.g. "Figure 2."), or `None` when the text does
    /// not start with a caption pattern.
    pub fn caption_identifier(&self, patterns: &CaptionPatterns) -> Option<String> {
        patterns.identifier(&self.text)
    }

    /// Kind recorded by [`TextBox::classify`], figure when unclassified.
    pub fn kind(&self) -> CaptionKind {
        self.caption_kind.unwrap_or_default()
    }

    /// Identity of the box within a document.
    pub fn key(&self) -> (u32, usize) {
        (self.page_number, self.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text_box(text: &str) -> TextBox {
        TextBox::new(0, 1, Bbox::new(0, 0, 100, 10), text)
    }

    #[test]
    fn test_figure_captions() {
        let patterns = CaptionPatterns::default();
        for text in [
            "Figure 1. Overview of the pipeline",
            "FIG. 2: Results",
            "Fig. S3. Supplementary",
            "fig 4. lowercase",
            "Figure 12: Twelve",
        ] {
            assert_eq!(
                patterns.classify(text),
                Some(CaptionKind::Figure),
                "{}",
                text
            );
        }
    }

    #[test]
    fn test_table_captions() {
        let patterns = CaptionPatterns::default();
        for text in ["Table 1 Summary", "TABLE IV. Ablation", "Table S2 Extra"] {
            assert_eq!(patterns.classify(text), Some(CaptionKind::Table), "{}", text);
        }
    }

    #[test]
    fn test_body_text_is_not_caption() {
        let patterns = CaptionPatterns::default();
        for text in [
            "Figure 1 shows the pipeline",
            "As shown in Figure 1.",
            "Table of contents",
            "fight 3. club",
            "",
        ] {
            assert_eq!(patterns.classify(text), None, "{}", text);
        }
    }

    #[test]
    fn test_identifier_present_only_on_match() {
        let patterns = CaptionPatterns::default();
        let caption = text_box("Figure 3. Accuracy per epoch");
        assert_eq!(
            caption.caption_identifier(&patterns),
            Some("Figure 3.".to_string())
        );

        let body = text_box("We report accuracy in the next section");
        assert_eq!(body.caption_identifier(&patterns), None);
        assert!(!body.can_be_caption(&patterns));
    }

    #[test]
    fn test_classify_records_kind() {
        let patterns = CaptionPatterns::default();
        let mut tb = text_box("Table 2 Hyperparameters");
        assert_eq!(tb.classify(&patterns), Some(CaptionKind::Table));
        assert_eq!(tb.kind(), CaptionKind::Table);
        assert_eq!(tb.key(), (1, 0));
    }

    #[test]
    fn test_custom_pattern_row() {
        let patterns = CaptionPatterns::empty()
            .with_pattern(CaptionKind::Figure, r"^scheme\s+\d+")
            .unwrap();
        assert_eq!(patterns.len(), 1);
        assert_eq!(patterns.classify("SCHEME 1 synthesis"), Some(CaptionKind::Figure));
        assert_eq!(patterns.classify("Figure 1."), None);

        let err = CaptionPatterns::empty().with_pattern(CaptionKind::Table, "(unclosed");
        assert!(matches!(err, Err(Error::InvalidPattern(_))));
    }
}
