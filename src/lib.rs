//! # pdf-outline
//!
//! Title and heading outline extraction for PDF documents.
//!
//! The library reads a PDF, then summarizes it as a title plus a flat list
//! of H1/H2/H3 headings with 0-based page indices. A document's own
//! bookmarks are used when present; otherwise headings are detected from
//! the typography of the text (font-size clusters, boldness, numbering,
//! centering, casing and length).
//!
//! ## Quick Start
//!
//! ```no_run
//! use pdf_outline::{extract_outline_file, render};
//!
//! fn main() -> pdf_outline::Result<()> {
//!     let result = extract_outline_file("document.pdf")?;
//!     println!("{}", render::to_json(&result, render::JsonFormat::Pretty)?);
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! - **Native outlines**: `/Outlines` bookmarks with named destinations
//! - **Heuristic detection**: font-size clustering and weighted scoring
//! - **Configurable**: every threshold and weight lives in [`DetectionOptions`]
//! - **Batch processing**: directory conversion in parallel with Rayon

pub mod analysis;
pub mod batch;
pub mod detect;
pub mod error;
pub mod model;
pub mod parser;
pub mod render;
pub mod text;

// Re-export commonly used types
pub use analysis::{assemble, DetectionOptions, FontProfile};
pub use batch::{run_batch, BatchOptions, BatchReport};
pub use detect::{detect_header_from_bytes, detect_header_from_path, is_pdf, PdfHeader};
pub use error::{Error, Result};
pub use model::{
    BoundingBox, Document, HeadingLevel, Line, Metadata, OutlineEntry, OutlineResult, Page, Span,
    StyleFlags, TocEntry, FAILED_TITLE,
};
pub use parser::{ErrorMode, PageSelection, ParseOptions, PdfParser};
pub use render::JsonFormat;

use std::io::Read;
use std::path::Path;

/// Parse a PDF file into a [`Document`].
///
/// # Example
///
/// ```no_run
/// use pdf_outline::parse_file;
///
/// let doc = parse_file("document.pdf").unwrap();
/// println!("Pages: {}", doc.page_count());
/// ```
pub fn parse_file<P: AsRef<Path>>(path: P) -> Result<Document> {
    let parser = PdfParser::open(path)?;
    parser.parse()
}

/// Parse a PDF file with custom options.
pub fn parse_file_with_options<P: AsRef<Path>>(path: P, options: ParseOptions) -> Result<Document> {
    let parser = PdfParser::open_with_options(path, options)?;
    parser.parse()
}

/// Parse a PDF from bytes.
pub fn parse_bytes(data: &[u8]) -> Result<Document> {
    let parser = PdfParser::from_bytes(data)?;
    parser.parse()
}

/// Parse a PDF from a reader.
pub fn parse_reader<R: Read>(reader: R) -> Result<Document> {
    let parser = PdfParser::from_reader(reader)?;
    parser.parse()
}

/// Summarize an already parsed document with default detection options.
pub fn extract_outline(document: &Document) -> OutlineResult {
    assemble(document, &DetectionOptions::default())
}

/// Read a PDF file and summarize it with default options.
///
/// # Example
///
/// ```no_run
/// use pdf_outline::extract_outline_file;
///
/// let result = extract_outline_file("document.pdf").unwrap();
/// for entry in &result.outline {
///     println!("{} {} (page {})", entry.level, entry.text, entry.page);
/// }
/// ```
pub fn extract_outline_file<P: AsRef<Path>>(path: P) -> Result<OutlineResult> {
    Outliner::new().extract(path)
}

/// Read a PDF from bytes and summarize it with default options.
pub fn extract_outline_bytes(data: &[u8]) -> Result<OutlineResult> {
    Outliner::new().extract_bytes(data)
}

/// Read a PDF file and render its outline as JSON.
pub fn to_json<P: AsRef<Path>>(path: P, format: JsonFormat) -> Result<String> {
    let result = extract_outline_file(path)?;
    render::to_json(&result, format)
}

/// Builder combining parse and detection options.
///
/// Parsing is lenient by default: pages whose text cannot be read are kept
/// empty instead of failing the whole document.
///
/// # Example
///
/// ```no_run
/// use pdf_outline::{DetectionOptions, Outliner};
///
/// let result = Outliner::new()
///     .with_detection(DetectionOptions::default().with_score_threshold(3.5))
///     .ignore_native_toc()
///     .extract("document.pdf")?;
/// # Ok::<(), pdf_outline::Error>(())
/// ```
#[derive(Debug, Clone)]
pub struct Outliner {
    parse_options: ParseOptions,
    detection: DetectionOptions,
}

impl Outliner {
    /// Create a new builder with default options.
    pub fn new() -> Self {
        Self {
            parse_options: ParseOptions::default().lenient(),
            detection: DetectionOptions::default(),
        }
    }

    /// Fail on the first page whose text cannot be read.
    pub fn strict(mut self) -> Self {
        self.parse_options = self.parse_options.with_error_mode(ErrorMode::Strict);
        self
    }

    /// Replace the parse options.
    pub fn with_parse_options(mut self, options: ParseOptions) -> Self {
        self.parse_options = options;
        self
    }

    /// Replace the detection options.
    pub fn with_detection(mut self, options: DetectionOptions) -> Self {
        self.detection = options;
        self
    }

    /// Set page selection.
    pub fn with_pages(mut self, pages: PageSelection) -> Self {
        self.parse_options = self.parse_options.with_pages(pages);
        self
    }

    /// Always run heading detection, even when the document has bookmarks.
    pub fn ignore_native_toc(mut self) -> Self {
        self.detection = self.detection.ignore_native_toc();
        self
    }

    /// Detection options in effect.
    pub fn detection(&self) -> &DetectionOptions {
        &self.detection
    }

    /// Parse a PDF file without summarizing it.
    pub fn parse<P: AsRef<Path>>(&self, path: P) -> Result<Document> {
        parse_file_with_options(path, self.parse_options.clone())
    }

    /// Read and summarize a PDF file.
    pub fn extract<P: AsRef<Path>>(&self, path: P) -> Result<OutlineResult> {
        let document = self.parse(path)?;
        Ok(self.summarize(&document))
    }

    /// Read and summarize a PDF held in memory.
    pub fn extract_bytes(&self, data: &[u8]) -> Result<OutlineResult> {
        let parser = PdfParser::from_bytes_with_options(data, self.parse_options.clone())?;
        let document = parser.parse()?;
        Ok(self.summarize(&document))
    }

    /// Summarize an already parsed document.
    pub fn summarize(&self, document: &Document) -> OutlineResult {
        assemble(document, &self.detection)
    }
}

impl Default for Outliner {
    fn default() -> Self {
        Self::new()
    }
}
