//! Text boxes read from JSON files written by an external browser step.

use super::{MeasuredText, RenderedPage, TextMeasurer};
use crate::error::{Error, Result};
use crate::model::Bbox;
use serde::Deserialize;
use std::fs;
use std::path::PathBuf;

#[derive(Debug, Deserialize)]
struct SidecarBox {
    x: f64,
    y: f64,
    width: f64,
    height: f64,
    #[serde(default)]
    text: String,
}

/// Reads `pageN.json` next to `pageN.html`.
///
/// Each file holds the client rectangles of the page's text elements as
/// `[{"x": .., "y": .., "width": .., "height": .., "text": ".."}]`.
/// Fractional coordinates are truncated to whole HTML units.
#[derive(Debug, Clone, Default)]
pub struct SidecarMeasurer {
    extension: Option<String>,
}

impl SidecarMeasurer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read sidecars with another extension (default `json`).
    pub fn with_extension(mut self, extension: impl Into<String>) -> Self {
        self.extension = Some(extension.into());
        self
    }

    /// Sidecar file of `page`.
    pub fn sidecar_path(&self, page: &RenderedPage) -> PathBuf {
        page.html_path
            .with_extension(self.extension.as_deref().unwrap_or("json"))
    }
}

impl TextMeasurer for SidecarMeasurer {
    fn name(&self) -> &str {
        "sidecar"
    }

    fn measure(&self, page: &RenderedPage) -> Result<Vec<MeasuredText>> {
        let path = self.sidecar_path(page);
        let data = fs::read_to_string(&path).map_err(|e| Error::Measurement {
            page: page.number,
            message: format!("{}: {}", path.display(), e),
        })?;

        let boxes: Vec<SidecarBox> = serde_json::from_str(&data).map_err(|e| Error::Measurement {
            page: page.number,
            message: format!("{}: {}", path.display(), e),
        })?;

        Ok(boxes
            .into_iter()
            .map(|b| {
                MeasuredText::new(
                    Bbox::new(b.x as i32, b.y as i32, b.width as i32, b.height as i32),
                    b.text,
                )
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rendered(dir: &std::path::Path) -> RenderedPage {
        RenderedPage {
            number: 3,
            html_path: dir.join("page3.html"),
            image_path: dir.join("page3.png"),
            width: 612,
            height: 792,
        }
    }

    #[test]
    fn test_measure_reads_sidecar() {
        let tmp = tempfile::tempdir().unwrap();
        fs::write(
            tmp.path().join("page3.json"),
            r#"[{"x": 50.7, "y": 100.2, "width": 240.0, "height": 10.9, "text": "Figure 1. A plot"},
                {"x": 50, "y": 112, "width": 100, "height": 10}]"#,
        )
        .unwrap();

        let boxes = SidecarMeasurer::new().measure(&rendered(tmp.path())).unwrap();

        assert_eq!(boxes.len(), 2);
        assert_eq!(boxes[0].bbox, Bbox::new(50, 100, 240, 10));
        assert_eq!(boxes[0].text, "Figure 1. A plot");
        assert_eq!(boxes[1].text, "");
    }

    #[test]
    fn test_missing_sidecar_is_measurement_error() {
        let tmp = tempfile::tempdir().unwrap();
        let result = SidecarMeasurer::new().measure(&rendered(tmp.path()));
        assert!(matches!(result, Err(Error::Measurement { page: 3, .. })));
    }

    #[test]
    fn test_custom_extension() {
        let tmp = tempfile::tempdir().unwrap();
        let measurer = SidecarMeasurer::new().with_extension("boxes");
        assert_eq!(
            measurer.sidecar_path(&rendered(tmp.path())),
            tmp.path().join("page3.boxes")
        );
    }
}
