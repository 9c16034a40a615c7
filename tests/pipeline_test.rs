//! Integration tests for the extraction pipeline.

mod common;

use std::collections::HashSet;
use std::sync::Arc;

use common::*;
use figcap::model::{Bbox, CaptionKind, Document, Page, SweepType};
use figcap::parser::{ExtractOptions, FigureExtractor};
use figcap::render::PageSelection;
use figcap::Error;

fn extractor(dir: &std::path::Path, measurer: MockMeasurer, detector: FixedDetector) -> FigureExtractor {
    FigureExtractor::new(Arc::new(MockSource::new(dir, 3)), Arc::new(measurer))
        .with_detector(Arc::new(detector))
}

#[test]
fn test_three_page_document() {
    let tmp = tempfile::tempdir().unwrap();
    let pdf = write_pdf(tmp.path(), "paper");

    let doc = extractor(tmp.path(), three_page_measurer(), three_page_detector())
        .extract(&pdf)
        .unwrap();

    assert_eq!(doc.name, "paper");
    assert_eq!(doc.page_count(), 3);
    assert_eq!(doc.layout.num_columns, 2);
    assert_eq!(doc.layout.column_coordinates, vec![50, 322, 562]);
    assert_eq!(doc.figure_count(), 2);
    assert!(doc.get_page(1).unwrap().figures.is_empty());

    let page2 = doc.get_page(2).unwrap();
    assert_eq!(page2.figures.len(), 1);
    let figure = &page2.figures[0];
    assert_eq!(figure.sweep_type, SweepType::PageSweep);
    assert_eq!(figure.caption_text(), "Figure 1. Results of the experiment.");
    assert_eq!(figure.identifier, "Figure 1.");
    assert_eq!(figure.kind, CaptionKind::Figure);
    assert!(!figure.multicolumn);
    // Padded by 5, raised by one row, stretched down to the caption
    assert_eq!(figure.bbox, Bbox::from_corners(55, 138, 285, 399));

    let page3 = doc.get_page(3).unwrap();
    assert_eq!(page3.figures.len(), 1);
    let orphan = &page3.figures[0];
    assert_eq!(orphan.sweep_type, SweepType::Orphan);
    assert!(orphan.caption.is_none());
    assert_eq!(orphan.identifier, "");
    assert_eq!(orphan.bbox, Bbox::new(320, 100, 100, 50));
}

#[test]
fn test_orphan_claims_caption_from_next_page() {
    let tmp = tempfile::tempdir().unwrap();
    let pdf = write_pdf(tmp.path(), "claim");
    let measurer = MockMeasurer::new()
        .with_page(1, body_text())
        .with_page(3, vec![caption(50, 70, "Figure 2: Architecture overview.")]);
    let detector = FixedDetector::new().with_page(2, vec![Bbox::new(60, 300, 100, 50)]);

    let doc = extractor(tmp.path(), measurer, detector).extract(&pdf).unwrap();

    let page2 = doc.get_page(2).unwrap();
    assert_eq!(page2.figures.len(), 1);
    let figure = &page2.figures[0];
    assert_eq!(figure.sweep_type, SweepType::Orphan);
    assert_eq!(figure.caption_text(), "Figure 2: Architecture overview.");
    assert_eq!(figure.identifier, "Figure 2:");
    assert_eq!(figure.kind, CaptionKind::Figure);

    // The caption moved: page 3 no longer lists it
    assert!(doc.get_page(3).unwrap().captions.is_empty());
    assert_eq!(doc.figure_count(), 1);
}

#[test]
fn test_two_qualifying_captions_are_not_claimed() {
    let tmp = tempfile::tempdir().unwrap();
    let pdf = write_pdf(tmp.path(), "ambiguous");
    let measurer = MockMeasurer::new().with_page(1, body_text()).with_page(
        3,
        vec![
            caption(50, 70, "Figure 2. First caption."),
            caption(55, 500, "Table 1. Second caption."),
        ],
    );
    let detector = FixedDetector::new().with_page(2, vec![Bbox::new(60, 300, 100, 50)]);

    let doc = extractor(tmp.path(), measurer, detector).extract(&pdf).unwrap();

    let page2 = doc.get_page(2).unwrap();
    assert_eq!(page2.figures.len(), 1);
    assert!(page2.figures[0].caption.is_none());
    assert_eq!(page2.figures[0].identifier, "");
    assert_eq!(doc.get_page(3).unwrap().captions.len(), 2);
}

#[test]
fn test_small_orphan_is_discarded() {
    let tmp = tempfile::tempdir().unwrap();
    let pdf = write_pdf(tmp.path(), "specks");
    let detector = FixedDetector::new().with_page(3, vec![Bbox::new(0, 0, 10, 10), Bbox::new(20, 20, 5, 5)]);

    let doc = extractor(tmp.path(), three_page_measurer(), detector).extract(&pdf).unwrap();

    assert!(doc.get_page(3).unwrap().figures.is_empty());
    assert_eq!(doc.figure_count(), 0);
}

#[test]
fn test_table_caption_matches_region_above() {
    let tmp = tempfile::tempdir().unwrap();
    let pdf = write_pdf(tmp.path(), "table");
    let measurer = MockMeasurer::new()
        .with_page(1, body_text())
        .with_page(2, vec![caption(322, 300, "Table 2 Accuracy per dataset")]);
    let detector = FixedDetector::new().with_page(2, vec![Bbox::new(330, 120, 200, 150)]);

    let doc = extractor(tmp.path(), measurer, detector).extract(&pdf).unwrap();

    let figure = &doc.get_page(2).unwrap().figures[0];
    assert_eq!(figure.kind, CaptionKind::Table);
    assert_eq!(figure.identifier, "Table 2");
    assert!(figure.bbox.y1() <= 300);
    assert!(figure.bbox.y() < 120);
}

#[test]
fn test_each_caption_claimed_at_most_once() {
    let tmp = tempfile::tempdir().unwrap();
    let pdf = write_pdf(tmp.path(), "unique");
    let measurer = MockMeasurer::new().with_page(1, body_text()).with_page(
        3,
        vec![
            caption(50, 70, "Figure 2. Claimed across pages."),
            caption(322, 400, "Figure 3. Matched on its page."),
        ],
    );
    let detector = FixedDetector::new()
        .with_page(2, vec![Bbox::new(60, 300, 100, 50)])
        .with_page(3, vec![Bbox::new(330, 150, 200, 200)]);

    let doc = extractor(tmp.path(), measurer, detector).extract(&pdf).unwrap();

    assert_eq!(doc.figure_count(), 2);
    let mut seen = HashSet::new();
    for (_, figure) in doc.figures() {
        let caption = figure.caption.as_ref().expect("both figures have captions");
        assert!(seen.insert(caption.key()), "caption {:?} claimed twice", caption.key());
    }
    assert_eq!(doc.get_page(2).unwrap().figures[0].identifier, "Figure 2.");
    assert_eq!(doc.get_page(3).unwrap().figures[0].identifier, "Figure 3.");
    assert_eq!(doc.get_page(3).unwrap().captions.len(), 1);
}

#[test]
fn test_stacked_captions_do_not_share_regions() {
    let tmp = tempfile::tempdir().unwrap();
    let pdf = write_pdf(tmp.path(), "stacked");
    let measurer = MockMeasurer::new().with_page(1, body_text()).with_page(
        2,
        vec![
            caption(50, 300, "Figure 1. Upper plot."),
            caption(50, 550, "Figure 2. Lower plot."),
        ],
    );
    let upper = Bbox::new(60, 100, 220, 190);
    let middle = Bbox::new(60, 350, 220, 180);
    let detector = FixedDetector::new().with_page(2, vec![upper, middle]);

    let doc = extractor(tmp.path(), measurer, detector).extract(&pdf).unwrap();

    let page2 = doc.get_page(2).unwrap();
    assert_eq!(page2.figures.len(), 1);
    let figure = &page2.figures[0];
    assert_eq!(figure.identifier, "Figure 1.");
    assert!(figure.bbox.intersect_area(&middle) > 0);
    assert_eq!(figure.bbox.intersect_area(&upper), 0);

    // Figure 2 found nothing between itself and Figure 1
    assert_eq!(page2.unmatched_captions.len(), 1);
    assert_eq!(page2.dangling_orphan_candidate, Some(upper));
}

#[test]
fn test_page_selection_restricts_traversal() {
    let tmp = tempfile::tempdir().unwrap();
    let pdf = write_pdf(tmp.path(), "selected");
    let options = ExtractOptions::new().with_pages(PageSelection::Pages(vec![3]));

    let doc = extractor(tmp.path(), three_page_measurer(), three_page_detector())
        .with_options(options)
        .extract(&pdf)
        .unwrap();

    assert!(doc.get_page(2).unwrap().figures.is_empty());
    assert_eq!(doc.get_page(3).unwrap().figures.len(), 1);
}

#[test]
fn test_measurement_failure_aborts_document() {
    let tmp = tempfile::tempdir().unwrap();
    let pdf = write_pdf(tmp.path(), "crash");

    let result = extractor(tmp.path(), three_page_measurer().failing_on(2), three_page_detector()).extract(&pdf);

    assert!(matches!(result, Err(Error::Measurement { page: 2, .. })));
}

#[test]
fn test_non_pdf_is_rejected_before_conversion() {
    let tmp = tempfile::tempdir().unwrap();
    let path = tmp.path().join("notes.pdf");
    std::fs::write(&path, "plain text").unwrap();

    let result = extractor(tmp.path(), three_page_measurer(), three_page_detector()).extract(&path);

    assert!(matches!(result, Err(Error::UnknownFormat)));
    assert!(!tmp.path().join("xpdf_notes").exists());
}

#[test]
fn test_document_from_measured_pages() {
    let options = ExtractOptions::new().with_first_page(true);
    let to_pairs = |lines: Vec<figcap::source::MeasuredText>| lines.into_iter().map(|m| (m.bbox, m.text));
    let pages = vec![
        Page::from_measured(2, PAGE_WIDTH, PAGE_HEIGHT, to_pairs(vec![caption(50, 400, "Fig. 4. Loss curve.")]), &options.patterns),
        Page::from_measured(1, PAGE_WIDTH, PAGE_HEIGHT, to_pairs(body_text()), &options.patterns),
    ];

    let mut doc = Document::from_pages("direct", "direct.pdf", "xpdf_direct", pages, &options).unwrap();
    assert_eq!(doc.pages[0].number, 1);
    assert_eq!(doc.caption_count(), 1);

    let added = doc
        .extract_figures(&FixedDetector::new().with_page(2, vec![Bbox::new(60, 150, 220, 200)]), &options)
        .unwrap();
    assert_eq!(added, 1);
    assert_eq!(doc.figures().next().unwrap().1.identifier, "Fig. 4.");
}
