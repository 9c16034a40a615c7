//! Document-level types and the page traversal.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use super::{Bbox, Figure, Layout, Page};
use crate::error::{Error, Result};
use crate::parser::{
    CandidateDetector, CaptionExpander, CrossPageOrphanResolver, ExtractOptions, LayoutBuilder,
    OrphanOutcome, RegionSweepMatcher,
};

/// A converted PDF with its layout and extracted figures.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    /// Document name (PDF file stem)
    pub name: String,

    /// Source PDF
    pub pdf_path: PathBuf,

    /// Folder holding the converted HTML and rasters
    pub artifacts_path: PathBuf,

    /// Pages in increasing page number
    pub pages: Vec<Page>,

    /// Layout shared by every page
    pub layout: Layout,
}

impl Document {
    /// Build a document from converted pages.
    ///
    /// Pages are sorted by number, the layout is derived once from all of
    /// them and every caption is expanded into its full paragraph.
    pub fn from_pages(
        name: impl Into<String>,
        pdf_path: impl Into<PathBuf>,
        artifacts_path: impl Into<PathBuf>,
        mut pages: Vec<Page>,
        options: &ExtractOptions,
    ) -> Result<Self> {
        let name = name.into();
        if pages.is_empty() {
            return Err(Error::NoPages);
        }
        pages.sort_by_key(|p| p.number);

        let layout = LayoutBuilder::new(options.layout.clone()).build(&pages)?;
        log::debug!(
            "{}: {} column(s), row {}x{}, content region {:?}",
            name,
            layout.num_columns,
            layout.row_width,
            layout.row_height,
            layout.content_region.to_array()
        );

        let expander = CaptionExpander::new(&layout, options.caption_gap_factor);
        for page in &mut pages {
            expander.expand_page(page);
        }

        let total_captions: usize = pages.iter().map(|p| p.captions.len()).sum();
        if total_captions == 0 {
            log::info!("{}: no captions found", name);
        }

        Ok(Self {
            name,
            pdf_path: pdf_path.into(),
            artifacts_path: artifacts_path.into(),
            pages,
            layout,
        })
    }

    /// Get the number of pages in the document.
    pub fn page_count(&self) -> u32 {
        self.pages.len() as u32
    }

    /// Get a page by number (1-indexed).
    pub fn get_page(&self, page_num: u32) -> Option<&Page> {
        self.pages.iter().find(|p| p.number == page_num)
    }

    /// All figures with the number of the page they belong to.
    pub fn figures(&self) -> impl Iterator<Item = (u32, &Figure)> {
        self.pages
            .iter()
            .flat_map(|p| p.figures.iter().map(move |f| (p.number, f)))
    }

    pub fn figure_count(&self) -> usize {
        self.pages.iter().map(|p| p.figures.len()).sum()
    }

    pub fn caption_count(&self) -> usize {
        self.pages.iter().map(|p| p.captions.len()).sum()
    }

    /// Indices of the pages visited by the traversal.
    fn traversal(&self, options: &ExtractOptions) -> Vec<usize> {
        self.pages
            .iter()
            .enumerate()
            .filter(|(_, p)| options.includes_page(p.number))
            .map(|(idx, _)| idx)
            .collect()
    }

    /// Traverse the pages in order and pair captions with candidate regions.
    ///
    /// Pages with captions and candidates go through the region sweep.
    /// Pages with only candidates try to claim a caption from the top of
    /// the next visited page. Returns the number of figures added.
    pub fn extract_figures(
        &mut self,
        detector: &dyn CandidateDetector,
        options: &ExtractOptions,
    ) -> Result<usize> {
        let order = self.traversal(options);
        let layout = &self.layout;
        let matcher = RegionSweepMatcher::new(layout, &options.sweep, &options.patterns);
        let resolver = CrossPageOrphanResolver::new(layout, options);
        let mut added = 0;

        for (pos, &idx) in order.iter().enumerate() {
            let next_idx = order.get(pos + 1).copied();
            let (page, next_page) = split_pages(&mut self.pages, idx, next_idx);

            let candidates = detector.detect(page, layout)?;
            log::debug!(
                "{} - pg.{}: {} caption(s), {} candidate(s)",
                self.name,
                page.number,
                page.captions.len(),
                candidates.len()
            );
            page.candidates = candidates.clone();

            match (page.has_captions(), candidates.is_empty()) {
                (true, false) => {
                    let outcome = matcher.match_page(page, &candidates);
                    added += outcome.figures.len();
                    page.figures.extend(outcome.figures);
                    page.unmatched_captions = outcome.unmatched_captions;
                    page.dangling_orphan_candidate = Bbox::merge(&outcome.leftover);
                }
                (true, true) => {
                    log::info!(
                        "{} - pg.{}: captions have no candidates",
                        self.name,
                        page.number
                    );
                }
                (false, false) => match resolver.resolve(page, next_page, &candidates) {
                    OrphanOutcome::Discarded => {}
                    OrphanOutcome::Claimed(figure) | OrphanOutcome::Unresolved(figure) => {
                        page.add_figure(figure);
                        added += 1;
                    }
                },
                (false, true) => {}
            }
        }

        for page in &self.pages {
            if page.dangling_orphan_candidate.is_some() {
                log::info!(
                    "{} - pg.{}: remaining orphans not matched with any caption",
                    self.name,
                    page.number
                );
            }
        }

        Ok(added)
    }
}

/// Borrow the current page and, when present, a later page mutably.
fn split_pages(
    pages: &mut [Page],
    idx: usize,
    next_idx: Option<usize>,
) -> (&mut Page, Option<&mut Page>) {
    match next_idx {
        Some(next) if next > idx => {
            let (head, tail) = pages.split_at_mut(next);
            (&mut head[idx], tail.first_mut())
        }
        _ => (&mut pages[idx], None),
    }
}
