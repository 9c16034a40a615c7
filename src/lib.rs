//! # figcap
//!
//! Figure and caption extraction from academic PDFs.
//!
//! Pages are converted to HTML plus rasters, text lines are measured, and a
//! document-wide layout (columns, content region, line size) is derived.
//! Caption starts such as "Figure 3." or "Table II" are grown into full
//! caption paragraphs and paired with the graphical regions found on the
//! page raster.
//!
//! ## Quick Start
//!
//! ```no_run
//! use figcap::{extract_figures, render};
//!
//! fn main() -> figcap::Result<()> {
//!     let doc = extract_figures("paper.pdf", "/tmp/artifacts")?;
//!
//!     for (page, figure) in doc.figures() {
//!         println!("pg.{} {} {:?}", page, figure.identifier, figure.bbox.to_array());
//!     }
//!
//!     let options = render::ExportOptions::default();
//!     println!("{}", render::to_json(&doc, &options)?);
//!     Ok(())
//! }
//! ```
//!
//! ## Pipeline
//!
//! - **Layout**: one layout per document, built from every page
//! - **Captions**: pattern-table detection, then paragraph expansion
//! - **Candidates**: contour detection on the page raster (pluggable)
//! - **Sweep**: per-column matching of captions with candidate regions
//! - **Orphans**: captionless regions may claim the caption opening the next page
//! - **Export**: metadata JSON, cropped figures, debug overlays, batch ledgers

pub mod batch;
pub mod detect;
pub mod error;
pub mod model;
pub mod parser;
pub mod render;
pub mod source;

// Re-export commonly used types
pub use batch::{BatchOptions, BatchProcessor, BatchReport, FailureKind};
pub use detect::{detect_format_from_bytes, detect_format_from_path, is_pdf, PdfFormat};
pub use error::{Error, Result};
pub use model::{
    Bbox, CaptionKind, CaptionPatterns, Document, Figure, Layout, Page, SweepType, TextBox,
};
pub use parser::{
    CandidateDetector, ContourConfig, ContourDetector, ExtractOptions, FigureExtractor,
    LayoutOptions, Placement, SweepOptions,
};
pub use render::{ExportOptions, JsonFormat, PageSelection};
pub use source::{PageSource, SidecarMeasurer, TextMeasurer, XpdfSource};

use std::path::Path;
use std::sync::Arc;

/// Extract figures from a PDF using `pdftohtml` conversion and JSON text sidecars.
///
/// Conversion artifacts are written to (or reused from)
/// `<artifacts_dir>/xpdf_<name>/`.
///
/// # Example
///
/// ```no_run
/// use figcap::extract_figures;
///
/// let doc = extract_figures("paper.pdf", "/tmp/artifacts").unwrap();
/// println!("Figures: {}", doc.figure_count());
/// ```
pub fn extract_figures<P, A>(path: P, artifacts_dir: A) -> Result<Document>
where
    P: AsRef<Path>,
    A: AsRef<Path>,
{
    extract_figures_with_options(path, artifacts_dir, ExtractOptions::default())
}

/// Extract figures with custom options.
///
/// # Example
///
/// ```no_run
/// use figcap::{extract_figures_with_options, ExtractOptions, PageSelection};
///
/// let options = ExtractOptions::new()
///     .with_first_page(true)
///     .with_pages(PageSelection::parse("1-4").unwrap());
/// let doc = extract_figures_with_options("paper.pdf", "/tmp/artifacts", options).unwrap();
/// ```
pub fn extract_figures_with_options<P, A>(
    path: P,
    artifacts_dir: A,
    options: ExtractOptions,
) -> Result<Document>
where
    P: AsRef<Path>,
    A: AsRef<Path>,
{
    FigureExtractor::new(
        Arc::new(XpdfSource::new(artifacts_dir.as_ref())),
        Arc::new(SidecarMeasurer::new()),
    )
    .with_options(options)
    .extract(path)
}

/// Get the library version.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
