//! PDF reading: backend access, page layout and document assembly.

mod backend;
mod layout;
mod options;
mod pdf_parser;

pub use backend::{
    decode_text_simple, style_from_descriptor, style_from_font_name, BackendFontInfo,
    ContentOp, GlyphWidths, LopdfBackend, MediaBox, PageId, PdfBackend, PdfValue,
};
pub use layout::{build_page, group_spans_into_lines, LayoutAnalyzer, TextSpan};
pub use options::{ErrorMode, PageSelection, ParseOptions};
pub use pdf_parser::{decode_pdf_string, parse_pdf_date, PdfParser};
