//! Metadata JSON export.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::ExportOptions;
use crate::error::{Error, Result};
use crate::model::Document;

/// JSON output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum JsonFormat {
    /// Pretty-printed JSON with indentation
    #[default]
    Pretty,
    /// Compact JSON without extra whitespace
    Compact,
}

/// Exported description of a document's figures.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentMetadata {
    pub name: String,
    pub source_artifacts_path: PathBuf,
    pub width: i32,
    pub height: i32,
    /// Pages with at least one figure
    pub pages: Vec<PageMetadata>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageMetadata {
    pub number: u32,
    pub figures: Vec<FigureMetadata>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FigureMetadata {
    /// `[x, y, width, height]` in page units
    pub bbox: [i32; 4],
    /// Caption text, empty when the figure has none
    pub caption: String,
    /// Caption identifier such as "Figure 3."
    pub name: String,
    /// File name of the cropped image
    pub id: String,
}

impl DocumentMetadata {
    /// Total number of figures.
    pub fn figure_count(&self) -> usize {
        self.pages.iter().map(|p| p.figures.len()).sum()
    }
}

/// Collect the exported view of `doc`.
pub fn to_metadata(doc: &Document, options: &ExportOptions) -> DocumentMetadata {
    let pages = doc
        .pages
        .iter()
        .filter(|page| !page.figures.is_empty())
        .map(|page| PageMetadata {
            number: page.number,
            figures: page
                .figures
                .iter()
                .enumerate()
                .map(|(idx, figure)| FigureMetadata {
                    bbox: figure.bbox.to_array(),
                    caption: figure.caption_text().to_string(),
                    name: figure.identifier.clone(),
                    id: options.figure_name(page.number, idx),
                })
                .collect(),
        })
        .collect();

    DocumentMetadata {
        name: doc.name.clone(),
        source_artifacts_path: doc.artifacts_path.clone(),
        width: doc.layout.width,
        height: doc.layout.height,
        pages,
    }
}

/// Convert a document's figure metadata to JSON.
pub fn to_json(doc: &Document, options: &ExportOptions) -> Result<String> {
    let metadata = to_metadata(doc, options);
    let result = match options.json_format {
        JsonFormat::Pretty => serde_json::to_string_pretty(&metadata),
        JsonFormat::Compact => serde_json::to_string(&metadata),
    };

    result.map_err(|e| Error::Render(format!("JSON serialization error: {}", e)))
}

/// Write `<data_dir>/<name>.json` and return its path.
pub fn export_metadata(doc: &Document, data_dir: &Path, options: &ExportOptions) -> Result<PathBuf> {
    let json = to_json(doc, options)?;
    fs::create_dir_all(data_dir)
        .map_err(|e| Error::Export(format!("{}: {}", data_dir.display(), e)))?;

    let path = data_dir.join(format!("{}.json", doc.name));
    fs::write(&path, json).map_err(|e| Error::Export(format!("{}: {}", path.display(), e)))?;
    log::debug!("{}: metadata written to {}", doc.name, path.display());
    Ok(path)
}

/// Read an exported metadata file back.
pub fn read_metadata(path: &Path) -> Result<DocumentMetadata> {
    let data = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&data)?)
}
