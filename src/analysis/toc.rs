//! Native table-of-contents normalization.

use crate::model::{HeadingLevel, OutlineEntry, TocEntry};
use crate::text::clean;

/// Convert document-supplied TOC entries into outline entries.
///
/// Entries deeper than level 3 (or at level 0) are dropped; the rest keep
/// their order, get their title cleaned and their 1-based page turned into
/// a 0-based index clamped at 0. Native entries are trusted as-is: there is
/// no deduplication or scoring here.
pub fn normalize_toc(entries: &[TocEntry]) -> Vec<OutlineEntry> {
    entries
        .iter()
        .filter_map(|entry| {
            let level = HeadingLevel::from_depth(entry.level)?;
            let page = entry.page.saturating_sub(1).max(0) as u32;
            Some(OutlineEntry::new(level, clean(&entry.title), page))
        })
        .collect()
}
