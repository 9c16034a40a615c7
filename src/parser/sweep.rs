//! Caption to candidate matching on a single page.
//!
//! Every caption gets a band where its figure is expected: above it, below
//! it or beside it. Bands are bounded by per-column sweep lines so that two
//! captions in the same column never share a band. Candidates overlapping a
//! band are merged into one figure for that caption.

use crate::model::{Bbox, CaptionPatterns, Figure, Layout, Page, TextBox};

use super::SweepOptions;

/// Where a figure sits relative to its caption.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Placement {
    /// Figure above the caption (swept top-down)
    Above,
    /// Figure below the caption (swept bottom-up)
    Below,
    /// Figure beside the caption, on the opposite half of the page
    Beside,
}

impl Placement {
    pub fn as_str(&self) -> &'static str {
        match self {
            Placement::Above => "above",
            Placement::Below => "below",
            Placement::Beside => "beside",
        }
    }
}

/// Result of sweeping one page.
#[derive(Debug, Clone, Default)]
pub struct SweepOutcome {
    /// Figures matched on the page
    pub figures: Vec<Figure>,

    /// Ids of captions left without a figure
    pub unmatched_captions: Vec<usize>,

    /// Candidates no caption claimed
    pub leftover: Vec<Bbox>,
}

/// A caption's expected figure area.
#[derive(Debug, Clone, Copy)]
struct Band {
    caption: usize,
    bbox: Bbox,
}

/// Pairs captions with candidate regions on one page.
#[derive(Debug, Clone, Copy)]
pub struct RegionSweepMatcher<'a> {
    layout: &'a Layout,
    options: &'a SweepOptions,
    patterns: &'a CaptionPatterns,
}

impl<'a> RegionSweepMatcher<'a> {
    pub fn new(layout: &'a Layout, options: &'a SweepOptions, patterns: &'a CaptionPatterns) -> Self {
        Self {
            layout,
            options,
            patterns,
        }
    }

    /// Match the captions of `page` with `candidates`.
    pub fn match_page(&self, page: &Page, candidates: &[Bbox]) -> SweepOutcome {
        if candidates.is_empty() || page.captions.is_empty() {
            return SweepOutcome {
                figures: Vec::new(),
                unmatched_captions: page.captions.iter().map(|c| c.id).collect(),
                leftover: candidates.to_vec(),
            };
        }

        if page.captions.len() == 1 {
            return self.match_single(page, &page.captions[0], candidates);
        }

        let mut claimed = vec![false; candidates.len()];
        let all: Vec<&TextBox> = page.captions.iter().collect();
        let mut remaining = all.clone();
        remaining.sort_by_key(|c| (self.layout.column_of(c.bbox.x()), c.bbox.y(), c.bbox.x()));
        let mut figures = Vec::new();

        let passes = self
            .options
            .figure_placements
            .len()
            .max(self.options.table_placements.len());

        for pass in 0..passes {
            if remaining.is_empty() {
                break;
            }

            let mut matched_ids = Vec::new();
            for placement in [Placement::Above, Placement::Below, Placement::Beside] {
                let group: Vec<usize> = remaining
                    .iter()
                    .filter(|c| self.options.placements(c.kind()).get(pass) == Some(&placement))
                    .map(|c| c.id)
                    .collect();
                if group.is_empty() {
                    continue;
                }

                // Matched captions still bound the bands of their neighbours
                for band in self.bands(&all, placement) {
                    let caption = all[band.caption];
                    if !group.contains(&caption.id) {
                        continue;
                    }
                    let members: Vec<usize> = (0..candidates.len())
                        .filter(|&i| !claimed[i] && self.joins_band(&candidates[i], &band.bbox))
                        .collect();
                    let Some(merged) = Bbox::merge(members.iter().map(|&i| &candidates[i])) else {
                        continue;
                    };
                    log::debug!(
                        "pg.{}: caption {} claimed {} candidate(s) {} it",
                        page.number,
                        caption.id,
                        members.len(),
                        placement.as_str()
                    );
                    for &i in &members {
                        claimed[i] = true;
                    }
                    figures.push(self.figure(merged, caption, placement));
                    matched_ids.push(caption.id);
                }
            }
            remaining.retain(|c| !matched_ids.contains(&c.id));
        }

        let leftover: Vec<Bbox> = candidates
            .iter()
            .zip(&claimed)
            .filter(|&(_, &c)| !c)
            .map(|(b, _)| *b)
            .collect();
        if !remaining.is_empty() || !leftover.is_empty() {
            log::debug!(
                "pg.{}: {} caption(s) and {} candidate(s) left unmatched",
                page.number,
                remaining.len(),
                leftover.len()
            );
        }

        SweepOutcome {
            figures,
            unmatched_captions: remaining.iter().map(|c| c.id).collect(),
            leftover,
        }
    }

    /// Single caption: evaluate every placement and keep the band with the
    /// largest intersection, preferring the caption kind's order on ties.
    fn match_single(&self, page: &Page, caption: &TextBox, candidates: &[Bbox]) -> SweepOutcome {
        let mut best: Option<(Placement, Bbox, Vec<usize>, i64)> = None;

        for &placement in self.options.placements(caption.kind()) {
            let Some(band) = self.bands(&[caption], placement).into_iter().next() else {
                continue;
            };
            let members: Vec<usize> = (0..candidates.len())
                .filter(|&i| candidates[i].overlap_ratio(&band.bbox) > self.options.single_caption_overlap)
                .collect();
            let Some(merged) = Bbox::merge(members.iter().map(|&i| &candidates[i])) else {
                continue;
            };
            let score = band.bbox.intersect_area(&merged);
            if score > 0 && best.as_ref().map_or(true, |b| score > b.3) {
                best = Some((placement, merged, members, score));
            }
        }

        match best {
            Some((placement, merged, members, _)) => {
                log::debug!(
                    "pg.{}: single caption {} matched {}",
                    page.number,
                    caption.id,
                    placement.as_str()
                );
                SweepOutcome {
                    figures: vec![self.figure(merged, caption, placement)],
                    unmatched_captions: Vec::new(),
                    leftover: candidates
                        .iter()
                        .enumerate()
                        .filter(|(i, _)| !members.contains(i))
                        .map(|(_, b)| *b)
                        .collect(),
                }
            }
            None => SweepOutcome {
                figures: Vec::new(),
                unmatched_captions: vec![caption.id],
                leftover: candidates.to_vec(),
            },
        }
    }

    fn joins_band(&self, candidate: &Bbox, band: &Bbox) -> bool {
        candidate.overlap_ratio(band) > self.options.band_overlap
            || band.overlap_ratio(candidate) > self.options.band_overlap
    }

    /// Sweep bands for `captions`, in caption visiting order. Every caption
    /// bounds the bands of the captions next to it in its columns.
    fn bands(&self, captions: &[&TextBox], placement: Placement) -> Vec<Band> {
        let cr = self.layout.content_region;
        let columns = self.layout.num_columns.max(1);
        let mut order: Vec<usize> = (0..captions.len()).collect();
        let mut bands = Vec::new();

        match placement {
            Placement::Above => {
                order.sort_by_key(|&i| (captions[i].bbox.y(), captions[i].bbox.x()));
                let mut sweep = vec![cr.y(); columns];
                for i in order {
                    let caption = &captions[i].bbox;
                    let (first, last) = self.layout.column_span(caption);
                    let (left, right) = self.layout.span_bounds(first, last);
                    let top = sweep[first..=last].iter().copied().max().unwrap_or(cr.y());
                    bands.push(Band {
                        caption: i,
                        bbox: Bbox::from_corners(left, top, right, caption.y()),
                    });
                    sweep[first..=last].fill(caption.y1());
                }
            }
            Placement::Below => {
                order.sort_by_key(|&i| std::cmp::Reverse((captions[i].bbox.y(), captions[i].bbox.x())));
                let mut sweep = vec![cr.y1(); columns];
                for i in order {
                    let caption = &captions[i].bbox;
                    let (first, last) = self.layout.column_span(caption);
                    let (left, right) = self.layout.span_bounds(first, last);
                    let bottom = sweep[first..=last].iter().copied().min().unwrap_or(cr.y1());
                    bands.push(Band {
                        caption: i,
                        bbox: Bbox::from_corners(left, caption.y1(), right, bottom),
                    });
                    sweep[first..=last].fill(caption.y());
                }
            }
            Placement::Beside => {
                order.sort_by_key(|&i| std::cmp::Reverse((captions[i].bbox.y(), captions[i].bbox.x())));
                let mid = cr.x() + cr.width() / 2;
                let mut bottom = cr.y1();
                let topmost = order.last().copied();
                for i in order {
                    let caption = &captions[i].bbox;
                    let top = if Some(i) == topmost { cr.y() } else { caption.y() };
                    let (left, right) = if caption.x() < mid {
                        (caption.x1(), cr.x1())
                    } else {
                        (cr.x(), caption.x())
                    };
                    bands.push(Band {
                        caption: i,
                        bbox: Bbox::from_corners(left, top, right, bottom),
                    });
                    bottom = caption.y();
                }
            }
        }

        bands.retain(|b| b.bbox.width() > 0 && b.bbox.height() > 0);
        bands.sort_by_key(|b| {
            let c = &captions[b.caption].bbox;
            (self.layout.column_of(c.x()), c.y(), c.x())
        });
        bands
    }

    /// Build the figure for a merged candidate box.
    fn figure(&self, merged: Bbox, caption: &TextBox, placement: Placement) -> Figure {
        let mut bbox = self.adjust_edges(merged, caption, placement);

        let (cap_first, cap_last) = self.layout.column_span(&caption.bbox);
        let multicolumn = self.layout.is_multicolumn(&bbox) || cap_first != cap_last;
        if multicolumn {
            let (first, last) = self.layout.column_span(&bbox);
            let (left, right) = self
                .layout
                .span_bounds(first.min(cap_first), last.max(cap_last));
            bbox = Bbox::from_corners(left, bbox.y(), right, bbox.y1());
        }

        let identifier = caption.caption_identifier(self.patterns).unwrap_or_default();
        Figure::page_sweep(bbox, caption.clone(), identifier).with_multicolumn(multicolumn)
    }

    /// Pad horizontally and stretch towards the caption so labels sitting
    /// between figure and caption stay inside the box.
    fn adjust_edges(&self, bbox: Bbox, caption: &TextBox, placement: Placement) -> Bbox {
        let cr = self.layout.content_region;
        let row = self.layout.row_height;
        let pad = self.options.x_padding;
        let cap = &caption.bbox;

        let left = (bbox.x() - pad).max(cr.x());
        let right = (bbox.x1() + pad).min(cr.x1()).max(left);
        let (top, bottom) = match placement {
            Placement::Above => ((bbox.y() - row).max(cr.y()), bbox.y1().max(cap.y() - 1)),
            Placement::Below => (bbox.y().min(cap.y1() + 1), (bbox.y1() + row).min(cr.y1())),
            Placement::Beside => (bbox.y(), bbox.y1().max(cap.y1())),
        };
        Bbox::from_corners(left, top, right, bottom.max(top))
    }
}
