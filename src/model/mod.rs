//! Document model types.
//!
//! The layout side (`Document`, `Page`, `Line`, `Span`) is what the PDF
//! access layer produces and the outline engine reads. The outline side
//! (`OutlineResult`, `OutlineEntry`, `HeadingLevel`) is what the engine
//! produces and the batch driver persists.

mod document;
mod outline;
mod page;

pub use document::{Document, Metadata, TocEntry};
pub use outline::{HeadingLevel, OutlineEntry, OutlineResult, FAILED_TITLE};
pub use page::{BoundingBox, Line, Page, Span, StyleFlags};
