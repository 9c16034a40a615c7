//! Conversion through the xpdf/poppler command-line tools.

use super::{page_number_from_stem, PageSource, RenderedDocument, RenderedPage};
use crate::detect::document_name;
use crate::error::{Error, Result};
use regex::Regex;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

/// Page source backed by `pdftohtml` and `pdftoppm`.
///
/// Artifacts of `paper.pdf` land in `<artifacts_dir>/xpdf_paper/` as
/// `pageN.html` plus `pageN.png`. An existing folder is reused as is.
#[derive(Debug, Clone)]
pub struct XpdfSource {
    artifacts_dir: PathBuf,
    pdftohtml: String,
    pdftoppm: String,
    width_attr: Regex,
    height_attr: Regex,
}

impl XpdfSource {
    /// Create a source writing artifacts under `artifacts_dir`.
    pub fn new(artifacts_dir: impl Into<PathBuf>) -> Self {
        Self {
            artifacts_dir: artifacts_dir.into(),
            pdftohtml: "pdftohtml".to_string(),
            pdftoppm: "pdftoppm".to_string(),
            width_attr: Regex::new(r#"(?i)\bwidth\s*=\s*"?(\d+)"#).expect("valid regex"),
            height_attr: Regex::new(r#"(?i)\bheight\s*=\s*"?(\d+)"#).expect("valid regex"),
        }
    }

    /// Use another `pdftohtml` binary.
    pub fn with_pdftohtml(mut self, binary: impl Into<String>) -> Self {
        self.pdftohtml = binary.into();
        self
    }

    /// Use another `pdftoppm` binary.
    pub fn with_pdftoppm(mut self, binary: impl Into<String>) -> Self {
        self.pdftoppm = binary.into();
        self
    }

    pub fn artifacts_dir(&self) -> &Path {
        &self.artifacts_dir
    }

    /// Folder holding the artifacts of the document called `name`.
    pub fn document_dir(&self, name: &str) -> PathBuf {
        self.artifacts_dir.join(format!("xpdf_{}", name))
    }

    fn convert(&self, pdf: &Path, out: &Path) -> Result<()> {
        log::debug!("running {} on {}", self.pdftohtml, pdf.display());
        let output = Command::new(&self.pdftohtml)
            .arg(pdf)
            .arg(out)
            .output()
            .map_err(|e| Error::Conversion(format!("cannot run {}: {}", self.pdftohtml, e)))?;

        if !output.status.success() {
            let reason = match output.status.code() {
                Some(1) => "error opening the PDF",
                Some(2) => "output folder already exists",
                Some(3) => "PDF permissions",
                _ => "conversion failed",
            };
            return Err(Error::Conversion(format!(
                "{} on {}: {} ({})",
                self.pdftohtml,
                pdf.display(),
                reason,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }
        Ok(())
    }

    /// Page size from the background `<img>` tag of a page's HTML.
    fn page_size(&self, html: &str) -> Option<(i32, i32)> {
        let start = html.find("<img")?;
        let end = html[start..].find('>').map_or(html.len(), |e| start + e);
        let tag = &html[start..end];

        let attr = |re: &Regex| re.captures(tag)?.get(1)?.as_str().parse::<i32>().ok();
        Some((attr(&self.width_attr)?, attr(&self.height_attr)?))
    }

    fn list_pages(&self, dir: &Path) -> Result<Vec<RenderedPage>> {
        let mut pages = Vec::new();

        for entry in fs::read_dir(dir)? {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some("html") {
                continue;
            }
            let Some(number) = page_number_from_stem(&path) else {
                continue;
            };

            let html = fs::read_to_string(&path)?;
            let (width, height) = self.page_size(&html).ok_or_else(|| {
                Error::Conversion(format!("no page image in {}", path.display()))
            })?;

            pages.push(RenderedPage {
                number,
                image_path: path.with_extension("png"),
                html_path: path,
                width,
                height,
            });
        }

        pages.sort_by_key(|p| p.number);
        Ok(pages)
    }
}

impl Default for XpdfSource {
    fn default() -> Self {
        Self::new("artifacts")
    }
}

impl PageSource for XpdfSource {
    fn name(&self) -> &str {
        "xpdf"
    }

    fn render(&self, pdf: &Path) -> Result<RenderedDocument> {
        let name = document_name(pdf)?;
        fs::create_dir_all(&self.artifacts_dir)?;

        let dir = self.document_dir(&name);
        if dir.exists() {
            log::debug!("reusing xpdf content {}", dir.display());
        } else {
            self.convert(pdf, &dir)?;
        }

        let pages = self.list_pages(&dir)?;
        if pages.is_empty() {
            return Err(Error::NoPages);
        }
        log::debug!("{}: {} page(s) converted", name, pages.len());

        Ok(RenderedDocument {
            name,
            artifacts_path: dir,
            pages,
        })
    }

    fn rasterize(&self, pdf: &Path, dpi: u32, out_dir: &Path) -> Result<Vec<PathBuf>> {
        let name = document_name(pdf)?;
        fs::create_dir_all(out_dir)?;

        let output = Command::new(&self.pdftoppm)
            .arg("-r")
            .arg(dpi.to_string())
            .arg("-png")
            .arg(pdf)
            .arg(out_dir.join(&name))
            .output()
            .map_err(|e| Error::Conversion(format!("cannot run {}: {}", self.pdftoppm, e)))?;
        if !output.status.success() {
            return Err(Error::Conversion(format!(
                "{} on {}: {}",
                self.pdftoppm,
                pdf.display(),
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        raster_pages(out_dir, &name)
    }
}

/// `<name>-N.png` files in `dir`, ordered by N. pdftoppm zero-pads N.
fn raster_pages(dir: &Path, name: &str) -> Result<Vec<PathBuf>> {
    let prefix = format!("{}-", name);
    let mut numbered: Vec<(u32, PathBuf)> = Vec::new();

    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.extension().and_then(|e| e.to_str()) != Some("png") {
            continue;
        }
        let number = path
            .file_stem()
            .and_then(|s| s.to_str())
            .and_then(|s| s.strip_prefix(&prefix))
            .and_then(|n| n.parse::<u32>().ok());
        if let Some(n) = number {
            numbered.push((n, path));
        }
    }

    numbered.sort_by_key(|(n, _)| *n);
    Ok(numbered.into_iter().map(|(_, p)| p).collect())
}
