//! Error types for figcap library.

use std::io;
use thiserror::Error;

/// Result type alias for figcap operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error types that can occur during figure extraction.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error when reading or writing files.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The file format is not recognized as PDF.
    #[error("Unknown file format: not a valid PDF")]
    UnknownFormat,

    /// The PDF version is not supported.
    #[error("Unsupported PDF version: {0}")]
    UnsupportedVersion(String),

    /// The external PDF to HTML/raster conversion failed.
    #[error("Conversion error: {0}")]
    Conversion(String),

    /// Text box measurement failed for a page.
    #[error("Measurement error on page {page}: {message}")]
    Measurement { page: u32, message: String },

    /// The conversion produced no pages.
    #[error("Document has no pages")]
    NoPages,

    /// A layout could not be derived from the measured text.
    #[error("Layout error: {0}")]
    Layout(String),

    /// Candidate region detection failed.
    #[error("Candidate detection error on page {page}: {message}")]
    Candidates { page: u32, message: String },

    /// Error decoding or encoding a raster.
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    /// Error writing metadata or figure crops.
    #[error("Export error: {0}")]
    Export(String),

    /// Error during rendering (JSON, debug overlays).
    #[error("Rendering error: {0}")]
    Render(String),

    /// A caption pattern failed to compile.
    #[error("Invalid caption pattern: {0}")]
    InvalidPattern(String),

    /// Invalid page range specification.
    #[error("Invalid page range: {0}")]
    InvalidPageRange(String),

    /// Generic error with message.
    #[error("{0}")]
    Other(String),
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Render(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::NoPages;
        assert_eq!(err.to_string(), "Document has no pages");

        let err = Error::Measurement {
            page: 3,
            message: "missing sidecar".into(),
        };
        assert_eq!(err.to_string(), "Measurement error on page 3: missing sidecar");
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = io::Error::new(io::ErrorKind::NotFound, "file not found");
        let err: Error = io_err.into();
        assert!(matches!(err, Error::Io(_)));
    }

    #[test]
    fn test_json_error_conversion() {
        let json_err = serde_json::from_str::<u32>("not json").unwrap_err();
        let err: Error = json_err.into();
        assert!(matches!(err, Error::Render(_)));
    }
}
