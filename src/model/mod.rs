//! Document model types for figure extraction.
//!
//! Geometry lives in page units of the converted HTML: every box, the
//! layout and the extracted figures share one coordinate system. Rasters
//! are mapped into it by the candidate detector and out of it by the
//! image exporter.

mod bbox;
mod document;
mod figure;
mod layout;
mod page;
mod text_box;

pub use bbox::Bbox;
pub use document::Document;
pub use figure::{Figure, SweepType};
pub use layout::Layout;
pub use page::Page;
pub use text_box::{CaptionKind, CaptionPattern, CaptionPatterns, TextBox};

#[cfg(test)]
pub(crate) use layout::fixtures;
