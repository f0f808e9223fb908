//! PDF backend abstraction layer.
//!
//! Provides a trait-based interface for PDF operations, isolating
//! the concrete PDF library (lopdf) from the layout analysis logic.

use std::collections::BTreeMap;

use crate::error::{Error, Result};
use crate::model::StyleFlags;

/// Page identifier: (object number, generation number).
pub type PageId = (u32, u16);

/// Default page box (US Letter) used when no `/MediaBox` is found.
pub const DEFAULT_MEDIA_BOX: MediaBox = MediaBox {
    x0: 0.0,
    y0: 0.0,
    x1: 612.0,
    y1: 792.0,
};

/// A page's `/MediaBox` in PDF user space (bottom-up).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MediaBox {
    pub x0: f32,
    pub y0: f32,
    pub x1: f32,
    pub y1: f32,
}

impl MediaBox {
    /// Build a box from a raw `[x0 y0 x1 y1]` array, normalizing corners.
    pub fn from_corners(values: [f32; 4]) -> Option<Self> {
        if values.iter().any(|v| !v.is_finite()) {
            return None;
        }
        let media_box = Self {
            x0: values[0].min(values[2]),
            y0: values[1].min(values[3]),
            x1: values[0].max(values[2]),
            y1: values[1].max(values[3]),
        };
        (media_box.width() > 0.0 && media_box.height() > 0.0).then_some(media_box)
    }

    pub fn width(&self) -> f32 {
        self.x1 - self.x0
    }

    pub fn height(&self) -> f32 {
        self.y1 - self.y0
    }
}

impl Default for MediaBox {
    fn default() -> Self {
        DEFAULT_MEDIA_BOX
    }
}

/// Glyph advance widths of a simple font, in 1/1000 text space units.
#[derive(Debug, Clone, PartialEq)]
pub struct GlyphWidths {
    pub first_char: u32,
    pub widths: Vec<f32>,
    pub missing_width: f32,
}

impl GlyphWidths {
    /// Width of a single-byte character code.
    pub fn width_of(&self, code: u8) -> f32 {
        (code as u32)
            .checked_sub(self.first_char)
            .and_then(|i| self.widths.get(i as usize))
            .copied()
            .filter(|w| *w > 0.0)
            .unwrap_or(self.missing_width)
    }
}

/// Font information returned by the backend.
#[derive(Debug, Clone)]
pub struct BackendFontInfo {
    /// Font resource name (key in the page's font dictionary).
    pub name: Vec<u8>,
    /// Base font name (e.g., "Helvetica-Bold").
    pub base_font: String,
    /// Style derived from the font name and its descriptor.
    pub flags: StyleFlags,
    /// Glyph widths, when the font declares them.
    pub widths: Option<GlyphWidths>,
    /// Whether text shown with this font uses two-byte codes.
    pub composite: bool,
}

impl BackendFontInfo {
    /// Font info for a resource the page does not declare.
    pub fn unknown(name: &[u8]) -> Self {
        Self {
            name: name.to_vec(),
            base_font: String::from_utf8_lossy(name).to_string(),
            flags: StyleFlags::empty(),
            widths: None,
            composite: false,
        }
    }
}

/// A value from a PDF content stream operand.
#[derive(Debug, Clone)]
pub enum PdfValue {
    Integer(i64),
    Real(f32),
    Name(Vec<u8>),
    Str(Vec<u8>),
    Array(Vec<PdfValue>),
    Other,
}

/// A single operation from a PDF content stream.
#[derive(Debug, Clone)]
pub struct ContentOp {
    pub operator: String,
    pub operands: Vec<PdfValue>,
}

impl ContentOp {
    /// Numeric operand at `index`.
    pub fn number(&self, index: usize) -> Option<f32> {
        self.operands.get(index).and_then(get_number_from_value)
    }
}

/// Abstract interface for PDF document access.
///
/// Implementations provide page enumeration, page geometry, font info,
/// content stream decoding and text decoding, without exposing any
/// concrete PDF library types.
pub trait PdfBackend {
    /// Return all pages as (page_number → PageId), page numbers 1-based.
    fn pages(&self) -> BTreeMap<u32, PageId>;

    /// Return the media box of a page, inherited from ancestors if needed.
    fn media_box(&self, page: PageId) -> MediaBox;

    /// Return font info for a given page.
    fn page_fonts(&self, page: PageId) -> Result<Vec<BackendFontInfo>>;

    /// Return the raw (decompressed) content stream bytes for a page.
    fn page_content(&self, page: PageId) -> Result<Vec<u8>>;

    /// Parse raw content stream bytes into a sequence of operations.
    fn decode_content(&self, data: &[u8]) -> Result<Vec<ContentOp>>;

    /// Decode a text byte sequence using the font's encoding on the given page.
    /// Falls back to simple decoding if the font or encoding is unavailable.
    fn decode_text(&self, page: PageId, font_name: &[u8], bytes: &[u8]) -> String;
}

/// Simple text decoding fallback when no encoding is available.
pub fn decode_text_simple(bytes: &[u8]) -> String {
    // UTF-16BE with BOM
    if bytes.len() >= 2 && bytes[0] == 0xFE && bytes[1] == 0xFF {
        let utf16: Vec<u16> = bytes[2..]
            .chunks_exact(2)
            .map(|c| u16::from_be_bytes([c[0], c[1]]))
            .collect();
        return String::from_utf16_lossy(&utf16);
    }

    if let Ok(s) = std::str::from_utf8(bytes) {
        return s.to_string();
    }

    // Latin-1
    bytes.iter().map(|&b| b as char).collect()
}

/// Derive style flags from a base font name such as `ABCDEF+Arial-BoldItalic`.
pub fn style_from_font_name(base_font: &str) -> StyleFlags {
    // drop the subset tag
    let name = base_font
        .split_once('+')
        .map(|(_, rest)| rest)
        .unwrap_or(base_font)
        .to_lowercase();

    let has_any = |keys: &[&str]| keys.iter().any(|k| name.contains(k));

    let mut flags = StyleFlags::empty();
    flags.set(
        StyleFlags::BOLD,
        has_any(&["bold", "black", "heavy", "semibold", "demi"]),
    );
    flags.set(StyleFlags::ITALIC, has_any(&["italic", "oblique"]));
    flags.set(StyleFlags::MONOSPACE, has_any(&["courier", "mono", "consolas"]));
    flags.set(
        StyleFlags::SERIF,
        has_any(&["times", "serif", "georgia", "garamond"]) && !name.contains("sans"),
    );
    flags
}

/// Derive style flags from a `/FontDescriptor` `/Flags` value and `/FontWeight`.
pub fn style_from_descriptor(descriptor_flags: i64, font_weight: Option<f32>) -> StyleFlags {
    const FIXED_PITCH: i64 = 1;
    const SERIF: i64 = 1 << 1;
    const ITALIC: i64 = 1 << 6;
    const FORCE_BOLD: i64 = 1 << 18;

    let mut flags = StyleFlags::empty();
    flags.set(StyleFlags::MONOSPACE, descriptor_flags & FIXED_PITCH != 0);
    flags.set(StyleFlags::SERIF, descriptor_flags & SERIF != 0);
    flags.set(StyleFlags::ITALIC, descriptor_flags & ITALIC != 0);
    flags.set(
        StyleFlags::BOLD,
        descriptor_flags & FORCE_BOLD != 0 || font_weight.is_some_and(|w| w >= 600.0),
    );
    flags
}

// ---------------------------------------------------------------------------
// LopdfBackend: concrete implementation backed by lopdf
// ---------------------------------------------------------------------------

use lopdf::{Dictionary, Document as LopdfDocument, Object};

/// Concrete [`PdfBackend`] backed by `lopdf::Document`.
pub struct LopdfBackend {
    doc: LopdfDocument,
}

impl LopdfBackend {
    /// Load from a file path.
    pub fn load_file<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        let doc = LopdfDocument::load(path)?;
        Self::from_document(doc)
    }

    /// Load from an in-memory byte slice.
    pub fn load_bytes(data: &[u8]) -> Result<Self> {
        let doc = LopdfDocument::load_mem(data)?;
        Self::from_document(doc)
    }

    /// Load from a reader.
    pub fn load_reader<R: std::io::Read>(mut reader: R) -> Result<Self> {
        let mut data = Vec::new();
        reader.read_to_end(&mut data)?;
        Self::load_bytes(&data)
    }

    /// Wrap an already loaded document.
    pub fn from_document(doc: LopdfDocument) -> Result<Self> {
        // lopdf opens documents with an empty user password itself; anything
        // still encrypted reads as garbage rather than failing outright.
        if doc.is_encrypted() {
            log::warn!("Document is encrypted; text may not be readable");
        }
        Ok(Self { doc })
    }

    /// Check if the document is encrypted.
    pub fn is_encrypted(&self) -> bool {
        self.doc.is_encrypted()
    }

    /// Direct access to the underlying `lopdf::Document`.
    ///
    /// Escape hatch for operations not covered by `PdfBackend`
    /// (metadata, outlines, named destinations).
    pub fn raw_doc(&self) -> &LopdfDocument {
        &self.doc
    }

    /// Get PDF version string.
    pub fn version(&self) -> String {
        self.doc.version.to_string()
    }

    /// Follow a reference to its target object (one level).
    pub fn resolve<'a>(&'a self, obj: &'a Object) -> &'a Object {
        match obj {
            Object::Reference(id) => self.doc.get_object(*id).unwrap_or(obj),
            _ => obj,
        }
    }

    /// Resolve an object to a dictionary, following one reference.
    pub fn resolve_dict<'a>(&'a self, obj: &'a Object) -> Option<&'a Dictionary> {
        match self.resolve(obj) {
            Object::Dictionary(dict) => Some(dict),
            Object::Stream(stream) => Some(&stream.dict),
            _ => None,
        }
    }

    fn font_info(&self, name: &[u8], font: &Dictionary) -> BackendFontInfo {
        let base_font = font
            .get(b"BaseFont")
            .ok()
            .and_then(|o| o.as_name().ok())
            .map(|n| String::from_utf8_lossy(n).to_string())
            .unwrap_or_else(|| "Unknown".to_string());

        let composite = font
            .get(b"Subtype")
            .ok()
            .and_then(|o| o.as_name().ok())
            .is_some_and(|s| s == b"Type0");

        let mut flags = style_from_font_name(&base_font);
        if let Some(descriptor) = self.font_descriptor(font, composite) {
            let descriptor_flags = descriptor
                .get(b"Flags")
                .ok()
                .and_then(|o| o.as_i64().ok())
                .unwrap_or(0);
            let weight = descriptor
                .get(b"FontWeight")
                .ok()
                .and_then(|o| get_number(self.resolve(o)));
            flags = flags | style_from_descriptor(descriptor_flags, weight);
        }

        let widths = if composite {
            None
        } else {
            self.glyph_widths(font)
        };

        BackendFontInfo {
            name: name.to_vec(),
            base_font,
            flags,
            widths,
            composite,
        }
    }

    fn font_descriptor<'a>(&'a self, font: &'a Dictionary, composite: bool) -> Option<&'a Dictionary> {
        if composite {
            let descendants = self.resolve(font.get(b"DescendantFonts").ok()?);
            let first = descendants.as_array().ok()?.first()?;
            let descendant = self.resolve_dict(first)?;
            return self.resolve_dict(descendant.get(b"FontDescriptor").ok()?);
        }
        self.resolve_dict(font.get(b"FontDescriptor").ok()?)
    }

    fn glyph_widths(&self, font: &Dictionary) -> Option<GlyphWidths> {
        let first_char = font.get(b"FirstChar").ok()?.as_i64().ok()?;
        let widths = self
            .resolve(font.get(b"Widths").ok()?)
            .as_array()
            .ok()?
            .iter()
            .map(|w| get_number(self.resolve(w)).unwrap_or(0.0))
            .collect();
        let missing_width = self
            .font_descriptor(font, false)
            .and_then(|d| d.get(b"MissingWidth").ok())
            .and_then(get_number)
            .unwrap_or(0.0);

        Some(GlyphWidths {
            first_char: u32::try_from(first_char).ok()?,
            widths,
            missing_width,
        })
    }
}

impl PdfBackend for LopdfBackend {
    fn pages(&self) -> BTreeMap<u32, PageId> {
        self.doc.get_pages()
    }

    fn media_box(&self, page: PageId) -> MediaBox {
        let mut current = self.doc.get_dictionary(page).ok();
        // Parent chains are short; the bound only guards against cycles.
        for _ in 0..32 {
            let Some(dict) = current else { break };
            if let Some(media_box) = dict
                .get(b"MediaBox")
                .ok()
                .and_then(|o| self.resolve(o).as_array().ok())
                .and_then(|arr| media_box_from_array(arr))
            {
                return media_box;
            }
            current = dict.get(b"Parent").ok().and_then(|p| self.resolve_dict(p));
        }
        DEFAULT_MEDIA_BOX
    }

    fn page_fonts(&self, page: PageId) -> Result<Vec<BackendFontInfo>> {
        let lopdf_fonts = self
            .doc
            .get_page_fonts(page)
            .map_err(|e| Error::PdfParse(e.to_string()))?;

        Ok(lopdf_fonts
            .iter()
            .map(|(name, font_dict)| self.font_info(name, font_dict))
            .collect())
    }

    fn page_content(&self, page_id: PageId) -> Result<Vec<u8>> {
        let page_dict = self
            .doc
            .get_dictionary(page_id)
            .map_err(|e| Error::PdfParse(e.to_string()))?;

        // A page without /Contents is blank.
        let Ok(contents) = page_dict.get(b"Contents") else {
            return Ok(Vec::new());
        };

        match self.resolve(contents) {
            // unfiltered streams have no decompressed form
            Object::Stream(s) => Ok(s
                .decompressed_content()
                .unwrap_or_else(|_| s.content.clone())),
            Object::Array(arr) => {
                let mut content = Vec::new();
                for obj in arr {
                    if let Object::Stream(s) = self.resolve(obj) {
                        match s.decompressed_content() {
                            Ok(data) => content.extend_from_slice(&data),
                            Err(_) => content.extend_from_slice(&s.content),
                        }
                        content.push(b' ');
                    }
                }
                Ok(content)
            }
            _ => Err(Error::PdfParse("Invalid content stream".to_string())),
        }
    }

    fn decode_content(&self, data: &[u8]) -> Result<Vec<ContentOp>> {
        let content =
            lopdf::content::Content::decode(data).map_err(|e| Error::PdfParse(e.to_string()))?;

        Ok(content
            .operations
            .into_iter()
            .map(|op| ContentOp {
                operator: op.operator,
                operands: op.operands.iter().map(convert_object).collect(),
            })
            .collect())
    }

    fn decode_text(&self, page: PageId, font_name: &[u8], bytes: &[u8]) -> String {
        if let Ok(lopdf_fonts) = self.doc.get_page_fonts(page) {
            if let Some(font_dict) = lopdf_fonts.get(font_name) {
                if let Ok(enc) = font_dict.get_font_encoding(&self.doc) {
                    if let Ok(text) = LopdfDocument::decode_text(&enc, bytes) {
                        return text;
                    }
                }
            }
        }
        decode_text_simple(bytes)
    }
}

fn media_box_from_array(arr: &[Object]) -> Option<MediaBox> {
    if arr.len() < 4 {
        return None;
    }
    let mut values = [0.0f32; 4];
    for (value, obj) in values.iter_mut().zip(arr) {
        *value = get_number(obj)?;
    }
    MediaBox::from_corners(values)
}

/// Convert a `lopdf::Object` to [`PdfValue`].
fn convert_object(obj: &Object) -> PdfValue {
    match obj {
        Object::Integer(i) => PdfValue::Integer(*i),
        Object::Real(r) => PdfValue::Real(*r),
        Object::Name(n) => PdfValue::Name(n.clone()),
        Object::String(b, _) => PdfValue::Str(b.clone()),
        Object::Array(arr) => PdfValue::Array(arr.iter().map(convert_object).collect()),
        _ => PdfValue::Other,
    }
}

fn get_number(obj: &Object) -> Option<f32> {
    match obj {
        Object::Integer(i) => Some(*i as f32),
        Object::Real(r) => Some(*r),
        _ => None,
    }
}

/// Helper: extract a number from a [`PdfValue`].
pub fn get_number_from_value(val: &PdfValue) -> Option<f32> {
    match val {
        PdfValue::Integer(i) => Some(*i as f32),
        PdfValue::Real(r) => Some(*r),
        _ => None,
    }
}
