//! Mock collaborators and document fixtures shared by the integration tests.

#![allow(dead_code)]

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use figcap::model::{Bbox, Layout, Page};
use figcap::parser::CandidateDetector;
use figcap::source::{MeasuredText, PageSource, RenderedDocument, RenderedPage, TextMeasurer};
use figcap::{Error, Result};
use image::{Rgb, RgbImage};

pub const PAGE_WIDTH: i32 = 612;
pub const PAGE_HEIGHT: i32 = 792;

/// Converts every PDF into `pages` blank pages under `dir`.
pub struct MockSource {
    dir: PathBuf,
    pages: u32,
    missing_raster: Option<u32>,
}

impl MockSource {
    pub fn new(dir: &Path, pages: u32) -> Self {
        Self {
            dir: dir.to_path_buf(),
            pages,
            missing_raster: None,
        }
    }

    /// Leave page `number` without a raster.
    pub fn without_raster(mut self, number: u32) -> Self {
        self.missing_raster = Some(number);
        self
    }
}

impl PageSource for MockSource {
    fn name(&self) -> &str {
        "mock"
    }

    fn render(&self, pdf: &Path) -> Result<RenderedDocument> {
        let name = pdf.file_stem().unwrap().to_str().unwrap().to_string();
        let artifacts_path = self.dir.join(format!("xpdf_{}", name));
        fs::create_dir_all(&artifacts_path)?;

        let mut pages = Vec::new();
        for number in 1..=self.pages {
            let image_path = artifacts_path.join(format!("page{}.png", number));
            if !image_path.exists() && self.missing_raster != Some(number) {
                RgbImage::from_pixel(PAGE_WIDTH as u32, PAGE_HEIGHT as u32, Rgb([255, 255, 255]))
                    .save(&image_path)?;
            }
            pages.push(RenderedPage {
                number,
                html_path: artifacts_path.join(format!("page{}.html", number)),
                image_path,
                width: PAGE_WIDTH,
                height: PAGE_HEIGHT,
            });
        }

        Ok(RenderedDocument {
            name,
            artifacts_path,
            pages,
        })
    }
}

/// Returns canned text boxes per page number.
#[derive(Default)]
pub struct MockMeasurer {
    pages: HashMap<u32, Vec<MeasuredText>>,
    failing: Option<u32>,
}

impl MockMeasurer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_page(mut self, number: u32, lines: Vec<MeasuredText>) -> Self {
        self.pages.insert(number, lines);
        self
    }

    pub fn failing_on(mut self, number: u32) -> Self {
        self.failing = Some(number);
        self
    }
}

impl TextMeasurer for MockMeasurer {
    fn name(&self) -> &str {
        "mock"
    }

    fn measure(&self, page: &RenderedPage) -> Result<Vec<MeasuredText>> {
        if self.failing == Some(page.number) {
            return Err(Error::Measurement {
                page: page.number,
                message: "browser crashed".to_string(),
            });
        }
        Ok(self.pages.get(&page.number).cloned().unwrap_or_default())
    }
}

/// Returns fixed candidate regions per page number.
#[derive(Default)]
pub struct FixedDetector {
    pages: HashMap<u32, Vec<Bbox>>,
}

impl FixedDetector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_page(mut self, number: u32, candidates: Vec<Bbox>) -> Self {
        self.pages.insert(number, candidates);
        self
    }
}

impl CandidateDetector for FixedDetector {
    fn detect(&self, page: &Page, _layout: &Layout) -> Result<Vec<Bbox>> {
        Ok(self.pages.get(&page.number).cloned().unwrap_or_default())
    }

    fn name(&self) -> &str {
        "fixed"
    }
}

/// Two columns of body text: x=50 and x=322, 240 wide, 12 high, every 16 units
/// from y=60 down to y1=696.
pub fn body_text() -> Vec<MeasuredText> {
    let mut lines = Vec::new();
    for row in 0..40 {
        let y = 60 + row * 16;
        lines.push(MeasuredText::new(Bbox::new(50, y, 240, 12), format!("left body line {}", row)));
        lines.push(MeasuredText::new(Bbox::new(322, y, 240, 12), format!("right body line {}", row)));
    }
    lines
}

pub fn caption(x: i32, y: i32, text: &str) -> MeasuredText {
    MeasuredText::new(Bbox::new(x, y, 240, 12), text)
}

/// Measurer for the three-page fixture: body text on page 1, one figure
/// caption in the middle of page 2's left column, nothing on page 3.
pub fn three_page_measurer() -> MockMeasurer {
    MockMeasurer::new()
        .with_page(1, body_text())
        .with_page(2, vec![caption(50, 400, "Figure 1. Results of the experiment.")])
}

/// Candidates for the three-page fixture: a plot above page 2's caption and
/// a 100x50 region on page 3.
pub fn three_page_detector() -> FixedDetector {
    FixedDetector::new()
        .with_page(2, vec![Bbox::new(60, 150, 220, 200)])
        .with_page(3, vec![Bbox::new(320, 100, 100, 50)])
}

/// Write a file with a PDF header.
pub fn write_pdf(dir: &Path, name: &str) -> PathBuf {
    let path = dir.join(format!("{}.pdf", name));
    fs::write(&path, b"%PDF-1.5\n%\xe2\xe3\xcf\xd3\n").unwrap();
    path
}
