//! Page sources and text measurement.
//!
//! Extraction does not read PDF content streams itself. A [`PageSource`]
//! converts the PDF into one HTML file and one raster per page, and a
//! [`TextMeasurer`] reports where each text line of that HTML ends up on
//! the page. Both are traits so tests and other toolchains can plug in.
//!
//! # Example
//!
//! ```no_run
//! use figcap::source::{PageSource, SidecarMeasurer, TextMeasurer, XpdfSource};
//! use std::path::Path;
//!
//! fn main() -> figcap::Result<()> {
//!     let source = XpdfSource::new("/tmp/artifacts");
//!     let rendered = source.render(Path::new("paper.pdf"))?;
//!
//!     let measurer = SidecarMeasurer::new();
//!     for page in &rendered.pages {
//!         let lines = measurer.measure(page)?;
//!         println!("page {}: {} text boxes", page.number, lines.len());
//!     }
//!     Ok(())
//! }
//! ```

mod sidecar;
mod xpdf;

pub use sidecar::SidecarMeasurer;
pub use xpdf::XpdfSource;

use crate::error::Result;
use crate::model::Bbox;
use std::path::{Path, PathBuf};

/// One converted page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedPage {
    /// 1-based page number
    pub number: u32,

    /// HTML rendition of the page
    pub html_path: PathBuf,

    /// Background raster of the page
    pub image_path: PathBuf,

    /// Page width in HTML units
    pub width: i32,

    /// Page height in HTML units
    pub height: i32,
}

/// Converted artifacts of a whole document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedDocument {
    /// Document name (file stem of the PDF)
    pub name: String,

    /// Folder holding the per-page artifacts
    pub artifacts_path: PathBuf,

    /// Pages sorted by number
    pub pages: Vec<RenderedPage>,
}

impl RenderedDocument {
    /// Number of converted pages.
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }
}

/// A text line as laid out on the rendered page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MeasuredText {
    pub bbox: Bbox,
    pub text: String,
}

impl MeasuredText {
    pub fn new(bbox: Bbox, text: impl Into<String>) -> Self {
        Self {
            bbox,
            text: text.into(),
        }
    }
}

/// Converts a PDF into per-page HTML and raster artifacts.
pub trait PageSource: Send + Sync {
    /// Get the name of this source.
    fn name(&self) -> &str;

    /// Convert `pdf` and list its pages.
    fn render(&self, pdf: &Path) -> Result<RenderedDocument>;

    /// Produce page rasters at `dpi` inside `out_dir`, ordered by page.
    ///
    /// The default returns the conversion rasters unchanged.
    fn rasterize(&self, pdf: &Path, dpi: u32, out_dir: &Path) -> Result<Vec<PathBuf>> {
        let _ = (dpi, out_dir);
        let rendered = self.render(pdf)?;
        Ok(rendered.pages.into_iter().map(|p| p.image_path).collect())
    }
}

/// Measures the text boxes of a rendered HTML page.
pub trait TextMeasurer: Send + Sync {
    /// Get the name of this measurer.
    fn name(&self) -> &str;

    /// Text boxes of `page` in document order.
    fn measure(&self, page: &RenderedPage) -> Result<Vec<MeasuredText>>;
}

/// Page number encoded in an artifact stem such as `page12`.
pub(crate) fn page_number_from_stem(path: &Path) -> Option<u32> {
    path.file_stem()?
        .to_str()?
        .strip_prefix("page")?
        .parse()
        .ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedSource;

    impl PageSource for FixedSource {
        fn name(&self) -> &str {
            "fixed"
        }

        fn render(&self, _pdf: &Path) -> Result<RenderedDocument> {
            Ok(RenderedDocument {
                name: "doc".to_string(),
                artifacts_path: PathBuf::from("/tmp/xpdf_doc"),
                pages: vec![RenderedPage {
                    number: 1,
                    html_path: PathBuf::from("/tmp/xpdf_doc/page1.html"),
                    image_path: PathBuf::from("/tmp/xpdf_doc/page1.png"),
                    width: 612,
                    height: 792,
                }],
            })
        }
    }

    #[test]
    fn test_rasterize_defaults_to_render_images() {
        let images = FixedSource
            .rasterize(Path::new("doc.pdf"), 300, Path::new("/tmp/out"))
            .unwrap();
        assert_eq!(images, vec![PathBuf::from("/tmp/xpdf_doc/page1.png")]);
    }

    #[test]
    fn test_page_number_from_stem() {
        assert_eq!(page_number_from_stem(Path::new("/a/page12.html")), Some(12));
        assert_eq!(page_number_from_stem(Path::new("/a/page1.png")), Some(1));
        assert_eq!(page_number_from_stem(Path::new("/a/index.html")), None);
        assert_eq!(page_number_from_stem(Path::new("/a/pagex.html")), None);
    }
}
