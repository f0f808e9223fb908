//! JSON rendering for outline results and extracted layout.

use serde::Serialize;

use crate::error::{Error, Result};
use crate::model::{BoundingBox, Document, OutlineResult};

/// JSON output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum JsonFormat {
    /// Pretty-printed JSON with indentation
    #[default]
    Pretty,
    /// Compact JSON without extra whitespace
    Compact,
}

/// Convert an outline result to JSON.
pub fn to_json(result: &OutlineResult, format: JsonFormat) -> Result<String> {
    serialize(result, format)
}

/// One extracted line, as dumped by [`layout_to_json`].
#[derive(Debug, Clone, Serialize)]
pub struct LayoutLine {
    /// 0-based page index
    pub page: u32,
    pub text: String,
    /// Largest span size on the line
    pub size: f32,
    /// Style of the largest span, e.g. `bold|serif`
    pub style: String,
    pub bbox: BoundingBox,
}

/// Flatten a document's pages into [`LayoutLine`]s, in page order.
pub fn layout_lines(doc: &Document) -> Vec<LayoutLine> {
    let mut pages: Vec<_> = doc.pages.iter().collect();
    pages.sort_by_key(|p| p.index);

    pages
        .into_iter()
        .flat_map(|page| {
            page.lines.iter().map(move |line| LayoutLine {
                page: page.index,
                text: line.text(),
                size: line.size(),
                style: line.flags().to_string(),
                bbox: line.bbox(),
            })
        })
        .collect()
}

/// Dump the extracted lines of a document as JSON.
pub fn layout_to_json(doc: &Document, format: JsonFormat) -> Result<String> {
    serialize(&layout_lines(doc), format)
}

fn serialize<T: Serialize + ?Sized>(value: &T, format: JsonFormat) -> Result<String> {
    let result = match format {
        JsonFormat::Pretty => serde_json::to_string_pretty(value),
        JsonFormat::Compact => serde_json::to_string(value),
    };

    result.map_err(|e| Error::Render(format!("JSON serialization error: {}", e)))
}
