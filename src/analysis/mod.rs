//! Outline analysis.
//!
//! Everything here works on an in-memory [`crate::model::Document`]:
//! font-size profiling, title resolution, native TOC normalization,
//! heuristic heading detection and final assembly. Nothing in this module
//! touches the file system or the PDF backend.

mod assembler;
mod font_profile;
mod heuristic;
mod options;
mod title;
mod toc;

pub use assembler::{assemble, outline_source, OutlineSource};
pub use font_profile::{FontProfile, SizeCluster};
pub use heuristic::{detect_headings, HeadingScorer, LineFeatures};
pub use options::DetectionOptions;
pub use title::resolve_title;
pub use toc::normalize_toc;
