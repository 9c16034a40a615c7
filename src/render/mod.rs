//! Export of extraction results: metadata JSON, figure crops and debug overlays.

pub mod debug;
mod images;
mod json;
mod options;

pub use images::{crop_figures, crop_rect, save_images};
pub use json::{
    export_metadata, read_metadata, to_json, to_metadata, DocumentMetadata, FigureMetadata,
    JsonFormat, PageMetadata,
};
pub use options::{ExportOptions, PageSelection};
