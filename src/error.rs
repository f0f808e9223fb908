//! Error types for pdf-outline.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for pdf-outline operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error types that can occur while extracting an outline.
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

    /// Error parsing PDF structure.
    #[error("PDF parsing error: {0}")]
    PdfParse(String),

    /// The PDF document is encrypted and could not be decrypted.
    #[error("Document is encrypted")]
    Encrypted,

    /// Error extracting text content from a page.
    #[error("Text extraction error: {0}")]
    TextExtract(String),

    /// Error serializing a result.
    #[error("Rendering error: {0}")]
    Render(String),

    /// Detection options could not be loaded.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// The document could not be opened or parsed at all.
    ///
    /// This is the only failure that aborts a whole document; the batch
    /// driver turns it into the "Extraction Failed" result.
    #[error("Failed to open {}: {source}", path.display())]
    DocumentOpen {
        /// Path of the document that failed
        path: PathBuf,
        /// Underlying cause
        #[source]
        source: Box<Error>,
    },
}

impl Error {
    /// Wrap an error as a document-open failure for `path`.
    pub fn document_open(path: impl Into<PathBuf>, source: Error) -> Self {
        match source {
            err @ Error::DocumentOpen { .. } => err,
            other => Error::DocumentOpen {
                path: path.into(),
                source: Box::new(other),
            },
        }
    }
}

impl From<lopdf::Error> for Error {
    fn from(err: lopdf::Error) -> Self {
        match err {
            lopdf::Error::IO(e) => Error::Io(e),
            lopdf::Error::Decryption(_) => Error::Encrypted,
            _ => Error::PdfParse(err.to_string()),
        }
    }
}
