//! Caption expansion.
//!
//! Caption detection happens when a page is built (see
//! [`Page::from_measured`]). Here each caption start grows into its full
//! paragraph by absorbing the aligned lines that follow it.

use std::collections::HashSet;

use crate::model::{Layout, Page, TextBox};

/// Grows caption starts into full caption paragraphs.
#[derive(Debug, Clone, Copy)]
pub struct CaptionExpander<'a> {
    layout: &'a Layout,
    gap_factor: f32,
}

impl<'a> CaptionExpander<'a> {
    /// Create an expander. Lines further than `row_height * gap_factor`
    /// below the caption end it.
    pub fn new(layout: &'a Layout, gap_factor: f32) -> Self {
        Self { layout, gap_factor }
    }

    /// Expand every caption of `page`, moving absorbed lines out of the
    /// page's text boxes.
    pub fn expand_page(&self, page: &mut Page) {
        let mut claimed: HashSet<usize> = HashSet::new();

        for idx in 0..page.captions.len() {
            let followers = self.followers(&page.captions[idx], &page.captions, &page.text_boxes, &claimed);
            if followers.is_empty() {
                continue;
            }

            let caption = &mut page.captions[idx];
            for &f in &followers {
                let line = &page.text_boxes[f];
                caption.bbox.set_y1(caption.bbox.y1().max(line.bbox.y1()));
                caption.text.push(' ');
                caption.text.push_str(&line.text);
                claimed.insert(line.id);
            }
            log::debug!(
                "pg.{}: caption {} absorbed {} line(s)",
                page.number,
                caption.id,
                followers.len()
            );
        }

        if !claimed.is_empty() {
            page.text_boxes.retain(|tb| !claimed.contains(&tb.id));
        }
    }

    /// Indices into `text_boxes` of the lines continuing `caption`, top to bottom.
    fn followers(
        &self,
        caption: &TextBox,
        captions: &[TextBox],
        text_boxes: &[TextBox],
        claimed: &HashSet<usize>,
    ) -> Vec<usize> {
        let (span_left, span_right) = self.layout.span_of(&caption.bbox);
        let tolerance = self.layout.row_width / 2;
        let follows = |tb: &TextBox| {
            tb.bbox.y() > caption.bbox.y()
                && tb.bbox.x() >= span_left
                && tb.bbox.x() < span_right
                && ((tb.bbox.x() - caption.bbox.x()).abs() < tolerance
                    || (tb.bbox.x1() - caption.bbox.x1()).abs() < tolerance)
        };

        // The next caption in the same column ends this one
        let stop_y = captions
            .iter()
            .filter(|c| c.id != caption.id && follows(c))
            .map(|c| c.bbox.y())
            .min()
            .unwrap_or(i32::MAX);

        let mut candidates: Vec<usize> = text_boxes
            .iter()
            .enumerate()
            .filter(|(_, tb)| !claimed.contains(&tb.id) && tb.bbox.y() < stop_y && follows(tb))
            .map(|(i, _)| i)
            .collect();
        candidates.sort_by_key(|&i| (text_boxes[i].bbox.y(), text_boxes[i].bbox.x()));

        let max_gap = self.layout.row_height as f32 * self.gap_factor;
        let mut bottom = caption.bbox.y1();
        let mut absorbed = Vec::new();
        for i in candidates {
            let line = &text_boxes[i].bbox;
            if ((line.y() - bottom) as f32) >= max_gap {
                break;
            }
            bottom = bottom.max(line.y1());
            absorbed.push(i);
        }
        absorbed
    }
}
