//! Document-level types.

use super::Page;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// A document as seen by the outline engine.
///
/// Produced by [`crate::parser::PdfParser`] or built by hand; the engine
/// only reads it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    /// File name of the source document (used as the last-resort title)
    pub source_name: String,

    /// Document metadata (title, author, etc.)
    #[serde(default)]
    pub metadata: Metadata,

    /// Pages in the document
    #[serde(default)]
    pub pages: Vec<Page>,

    /// Native table of contents, flattened in document order
    #[serde(default)]
    pub toc: Vec<TocEntry>,
}

impl Document {
    /// Create a new empty document for the given source name.
    pub fn new(source_name: impl Into<String>) -> Self {
        Self {
            source_name: source_name.into(),
            metadata: Metadata::default(),
            pages: Vec::new(),
            toc: Vec::new(),
        }
    }

    /// Get the number of pages in the document.
    pub fn page_count(&self) -> u32 {
        self.pages.len() as u32
    }

    /// Get a page by index (0-based).
    pub fn page(&self, index: u32) -> Option<&Page> {
        self.pages.iter().find(|p| p.index == index)
    }

    /// Add a page to the document.
    pub fn add_page(&mut self, page: Page) {
        self.pages.push(page);
    }

    /// Add a native table-of-contents entry.
    pub fn add_toc_entry(&mut self, entry: TocEntry) {
        self.toc.push(entry);
    }

    /// Check if the document has any pages.
    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    /// Check if the document carries a non-empty native outline.
    pub fn has_toc(&self) -> bool {
        !self.toc.is_empty()
    }

    /// Total number of spans across all pages.
    pub fn span_count(&self) -> usize {
        self.pages.iter().map(|p| p.spans().count()).sum()
    }

    /// Source name with its extension removed.
    pub fn source_stem(&self) -> String {
        Path::new(&self.source_name)
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|| self.source_name.clone())
    }
}

/// Document metadata.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Metadata {
    /// Document title
    pub title: Option<String>,

    /// Document author
    pub author: Option<String>,

    /// Document subject
    pub subject: Option<String>,

    /// Keywords
    pub keywords: Option<String>,

    /// Creator application
    pub creator: Option<String>,

    /// PDF producer
    pub producer: Option<String>,

    /// Creation date
    pub created: Option<DateTime<Utc>>,

    /// Last modification date
    pub modified: Option<DateTime<Utc>>,

    /// PDF version (e.g., "1.7")
    #[serde(default)]
    pub pdf_version: String,

    /// Total number of pages
    #[serde(default)]
    pub page_count: u32,

    /// Whether the document is encrypted
    #[serde(default)]
    pub encrypted: bool,
}

impl Metadata {
    /// Create new metadata with PDF version.
    pub fn with_version(version: impl Into<String>) -> Self {
        Self {
            pdf_version: version.into(),
            ..Default::default()
        }
    }
}

/// One entry of a document-supplied table of contents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TocEntry {
    /// Nesting level, 1 for top-level entries
    pub level: u32,

    /// Entry title as stored in the document
    pub title: String,

    /// Target page (1-based; 0 or less when the destination is unresolved)
    pub page: i32,
}

impl TocEntry {
    /// Create a new table-of-contents entry.
    pub fn new(level: u32, title: impl Into<String>, page: i32) -> Self {
        Self {
            level,
            title: title.into(),
            page,
        }
    }
}
