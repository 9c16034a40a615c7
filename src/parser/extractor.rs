//! Document-level figure extraction.

use std::path::Path;
use std::sync::Arc;

use super::{CandidateDetector, ContourDetector, ExtractOptions};
use crate::detect::detect_format_from_path;
use crate::error::Result;
use crate::model::{Document, Page};
use crate::source::{PageSource, TextMeasurer};

/// Runs the whole pipeline on one PDF.
///
/// # Example
///
/// ```no_run
/// use figcap::parser::{ExtractOptions, FigureExtractor};
/// use figcap::source::{SidecarMeasurer, XpdfSource};
/// use std::sync::Arc;
///
/// fn main() -> figcap::Result<()> {
///     let extractor = FigureExtractor::new(
///         Arc::new(XpdfSource::new("/tmp/artifacts")),
///         Arc::new(SidecarMeasurer::new()),
///     )
///     .with_options(ExtractOptions::new().with_first_page(true));
///
///     let doc = extractor.extract("paper.pdf")?;
///     for (page, figure) in doc.figures() {
///         println!("pg.{} {} {:?}", page, figure.identifier, figure.bbox.to_array());
///     }
///     Ok(())
/// }
/// ```
#[derive(Clone)]
pub struct FigureExtractor {
    source: Arc<dyn PageSource>,
    measurer: Arc<dyn TextMeasurer>,
    detector: Arc<dyn CandidateDetector>,
    options: ExtractOptions,
}

impl FigureExtractor {
    /// Create an extractor using the contour detector and default options.
    pub fn new(source: Arc<dyn PageSource>, measurer: Arc<dyn TextMeasurer>) -> Self {
        Self {
            source,
            measurer,
            detector: Arc::new(ContourDetector::new()),
            options: ExtractOptions::default(),
        }
    }

    /// Set extraction options.
    pub fn with_options(mut self, options: ExtractOptions) -> Self {
        self.options = options;
        self
    }

    /// Replace the candidate detection policy.
    pub fn with_detector(mut self, detector: Arc<dyn CandidateDetector>) -> Self {
        self.detector = detector;
        self
    }

    pub fn options(&self) -> &ExtractOptions {
        &self.options
    }

    pub fn source(&self) -> &dyn PageSource {
        self.source.as_ref()
    }

    /// Convert, measure and analyze `path`.
    ///
    /// Any failure aborts the document: no partial result is returned.
    pub fn extract<P: AsRef<Path>>(&self, path: P) -> Result<Document> {
        let path = path.as_ref();
        let format = detect_format_from_path(path)?;
        log::debug!("{}: {}", path.display(), format);

        let rendered = self.source.render(path)?;
        log::debug!(
            "{}: {} page(s) from {}, measuring with {}",
            rendered.name,
            rendered.page_count(),
            self.source.name(),
            self.measurer.name()
        );

        let mut pages = Vec::with_capacity(rendered.pages.len());
        for rp in &rendered.pages {
            let measured = self.measurer.measure(rp)?;
            let page = Page::from_measured(
                rp.number,
                rp.width,
                rp.height,
                measured.into_iter().map(|m| (m.bbox, m.text)),
                &self.options.patterns,
            )
            .with_paths(&rp.image_path, &rp.html_path);
            pages.push(page);
        }

        let mut doc = Document::from_pages(
            rendered.name,
            path,
            rendered.artifacts_path,
            pages,
            &self.options,
        )?;
        let added = doc.extract_figures(self.detector.as_ref(), &self.options)?;

        log::info!(
            "{}: {} figure(s) on {} page(s) using {}",
            doc.name,
            added,
            doc.page_count(),
            self.detector.name()
        );
        Ok(doc)
    }
}

impl std::fmt::Debug for FigureExtractor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FigureExtractor")
            .field("source", &self.source.name())
            .field("measurer", &self.measurer.name())
            .field("detector", &self.detector.name())
            .field("options", &self.options)
            .finish()
    }
}
