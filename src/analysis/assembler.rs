//! Outline assembly: title plus native or detected headings.

use super::{detect_headings, normalize_toc, resolve_title, DetectionOptions, FontProfile};
use crate::model::{Document, OutlineResult};

/// Where the outline of a result came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutlineSource {
    /// The document's own table of contents
    NativeToc,
    /// Font-profile heading detection
    Heuristic,
}

/// Choose the outline strategy for a document.
pub fn outline_source(document: &Document, options: &DetectionOptions) -> OutlineSource {
    if options.prefer_native_toc && document.has_toc() {
        OutlineSource::NativeToc
    } else {
        OutlineSource::Heuristic
    }
}

/// Build the `{title, outline}` result of one document.
///
/// A non-empty native table of contents is used verbatim (normalized);
/// otherwise a font profile is built once and handed to the detector.
pub fn assemble(document: &Document, options: &DetectionOptions) -> OutlineResult {
    let title = resolve_title(document);

    let outline = match outline_source(document, options) {
        OutlineSource::NativeToc => {
            log::debug!(
                "{}: using native outline ({} entries)",
                document.source_name,
                document.toc.len()
            );
            normalize_toc(&document.toc)
        }
        OutlineSource::Heuristic => {
            let profile = FontProfile::build(document, options);
            log::debug!(
                "{}: detecting headings (body size {:?})",
                document.source_name,
                profile.body_size()
            );
            detect_headings(document, &profile, options)
        }
    };

    OutlineResult::new(title, outline)
}
