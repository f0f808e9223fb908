//! PDF document reader producing the outline engine's [`Document`].

use std::collections::{BTreeMap, HashMap, HashSet};
use std::io::Read;
use std::path::Path;

use chrono::{DateTime, FixedOffset, NaiveDate, TimeZone, Utc};
use lopdf::{Dictionary, Object, ObjectId};

use crate::detect::{detect_header_from_bytes, detect_header_from_path};
use crate::error::{Error, Result};
use crate::model::{Document, Metadata, Page, TocEntry};

use super::backend::{decode_text_simple, LopdfBackend, PdfBackend};
use super::layout::LayoutAnalyzer;
use super::options::{ErrorMode, ParseOptions};

/// Source name used for in-memory documents without an explicit name.
const DEFAULT_SOURCE_NAME: &str = "document.pdf";
/// Nesting limit for outline items and name-tree nodes.
const MAX_TREE_DEPTH: u32 = 64;
/// Hops allowed when a destination refers to another destination.
const MAX_DEST_HOPS: u32 = 8;
/// Page value of a TOC entry whose destination cannot be resolved.
const UNRESOLVED_PAGE: i32 = -1;

/// PDF document reader.
pub struct PdfParser {
    backend: LopdfBackend,
    options: ParseOptions,
    source_name: String,
}

impl PdfParser {
    /// Open a PDF file.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::open_with_options(path, ParseOptions::default())
    }

    /// Open a PDF file with custom options.
    ///
    /// Any failure is reported as [`Error::DocumentOpen`] carrying the path.
    pub fn open_with_options<P: AsRef<Path>>(path: P, options: ParseOptions) -> Result<Self> {
        let path = path.as_ref();

        let backend = detect_header_from_path(path)
            .and_then(|header| {
                log::debug!("{}: {}", path.display(), header);
                LopdfBackend::load_file(path)
            })
            .map_err(|e| Error::document_open(path, e))?;

        let source_name = options.source_name.clone().unwrap_or_else(|| {
            path.file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_else(|| path.display().to_string())
        });

        Ok(Self {
            backend,
            options,
            source_name,
        })
    }

    /// Read a PDF from bytes.
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        Self::from_bytes_with_options(data, ParseOptions::default())
    }

    /// Read a PDF from bytes with custom options.
    pub fn from_bytes_with_options(data: &[u8], options: ParseOptions) -> Result<Self> {
        let source_name = options
            .source_name
            .clone()
            .unwrap_or_else(|| DEFAULT_SOURCE_NAME.to_string());

        let backend = detect_header_from_bytes(data)
            .and_then(|_| LopdfBackend::load_bytes(data))
            .map_err(|e| Error::document_open(&source_name, e))?;

        Ok(Self {
            backend,
            options,
            source_name,
        })
    }

    /// Read a PDF from a reader.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        Self::from_reader_with_options(reader, ParseOptions::default())
    }

    /// Read a PDF from a reader with custom options.
    pub fn from_reader_with_options<R: Read>(mut reader: R, options: ParseOptions) -> Result<Self> {
        let mut data = Vec::new();
        reader.read_to_end(&mut data)?;
        Self::from_bytes_with_options(&data, options)
    }

    /// Read the whole document: metadata, selected pages and native outline.
    pub fn parse(&self) -> Result<Document> {
        let mut document = Document::new(self.source_name.clone());
        document.metadata = self.metadata();

        let pages = self.backend.pages();
        document.metadata.page_count = pages.len() as u32;

        let analyzer = LayoutAnalyzer::new(&self.backend);
        for (&page_num, &page_id) in &pages {
            if !self.options.pages.includes(page_num) {
                continue;
            }

            match analyzer.extract_page(page_num, page_id) {
                Ok(page) => document.add_page(page),
                Err(e) => {
                    if self.options.error_mode == ErrorMode::Strict {
                        return Err(Error::TextExtract(format!("Page {}: {}", page_num, e)));
                    }
                    // In lenient mode, keep the page without text
                    log::warn!("Failed to extract text from page {}: {}", page_num, e);
                    let media_box = self.backend.media_box(page_id);
                    document.add_page(Page::new(
                        page_num - 1,
                        media_box.width(),
                        media_box.height(),
                    ));
                }
            }
        }

        if self.options.read_outline {
            document.toc = self.outline_entries();
        }

        log::debug!(
            "{}: {} pages, {} spans, {} outline entries",
            document.source_name,
            document.page_count(),
            document.span_count(),
            document.toc.len()
        );

        Ok(document)
    }

    /// Extract document metadata from the Info dictionary.
    pub fn metadata(&self) -> Metadata {
        let doc = self.backend.raw_doc();
        let mut metadata = Metadata::with_version(self.backend.version());

        let info = doc
            .trailer
            .get(b"Info")
            .ok()
            .and_then(|o| self.backend.resolve_dict(o));

        if let Some(info) = info {
            metadata.title = get_string_from_dict(info, b"Title");
            metadata.author = get_string_from_dict(info, b"Author");
            metadata.subject = get_string_from_dict(info, b"Subject");
            metadata.keywords = get_string_from_dict(info, b"Keywords");
            metadata.creator = get_string_from_dict(info, b"Creator");
            metadata.producer = get_string_from_dict(info, b"Producer");
            metadata.created =
                get_string_from_dict(info, b"CreationDate").and_then(|d| parse_pdf_date(&d));
            metadata.modified =
                get_string_from_dict(info, b"ModDate").and_then(|d| parse_pdf_date(&d));
        }

        metadata.page_count = self.page_count();
        metadata.encrypted = self.backend.is_encrypted();
        metadata
    }

    /// Flatten the `/Outlines` tree depth-first into TOC entries.
    ///
    /// Levels start at 1. Items already visited are skipped, so malformed
    /// outlines with cycles terminate.
    pub fn outline_entries(&self) -> Vec<TocEntry> {
        let mut entries = Vec::new();

        let Some(first) = self
            .catalog()
            .and_then(|c| c.get(b"Outlines").ok())
            .and_then(|o| self.backend.resolve_dict(o))
            .and_then(|o| o.get(b"First").ok())
            .and_then(|f| f.as_reference().ok())
        else {
            return entries;
        };

        let resolver = DestinationResolver::new(self);
        let mut visited = HashSet::new();
        self.walk_outline(first, 1, &resolver, &mut visited, &mut entries);
        entries
    }

    fn walk_outline(
        &self,
        first: ObjectId,
        level: u32,
        resolver: &DestinationResolver<'_>,
        visited: &mut HashSet<ObjectId>,
        entries: &mut Vec<TocEntry>,
    ) {
        if level > MAX_TREE_DEPTH {
            log::warn!("Outline nesting deeper than {} levels ignored", MAX_TREE_DEPTH);
            return;
        }

        let doc = self.backend.raw_doc();
        let mut next = Some(first);
        while let Some(item_id) = next.take() {
            if !visited.insert(item_id) {
                log::warn!("Outline item {:?} visited twice; stopping", item_id);
                break;
            }
            let Ok(item) = doc.get_dictionary(item_id) else {
                break;
            };

            let title = get_string_from_dict(item, b"Title").unwrap_or_default();
            let page = resolver
                .item_page(item)
                .and_then(|p| i32::try_from(p).ok())
                .unwrap_or(UNRESOLVED_PAGE);
            entries.push(TocEntry::new(level, title, page));

            if let Ok(child) = item.get(b"First").and_then(Object::as_reference) {
                self.walk_outline(child, level + 1, resolver, visited, entries);
            }

            next = item.get(b"Next").and_then(Object::as_reference).ok();
        }
    }

    fn catalog(&self) -> Option<&Dictionary> {
        self.backend.raw_doc().catalog().ok()
    }

    /// Get the number of pages.
    pub fn page_count(&self) -> u32 {
        self.backend.pages().len() as u32
    }

    /// Check if the document is encrypted.
    pub fn is_encrypted(&self) -> bool {
        self.backend.is_encrypted()
    }

    /// Get PDF version.
    pub fn version(&self) -> String {
        self.backend.version()
    }

    /// Name the document is reported under.
    pub fn source_name(&self) -> &str {
        &self.source_name
    }
}

/// Resolves outline destinations to 1-based page numbers.
struct DestinationResolver<'a> {
    parser: &'a PdfParser,
    page_numbers: HashMap<ObjectId, u32>,
}

impl<'a> DestinationResolver<'a> {
    fn new(parser: &'a PdfParser) -> Self {
        let pages: BTreeMap<u32, ObjectId> = parser.backend.pages();
        let page_numbers = pages.into_iter().map(|(num, id)| (id, num)).collect();
        Self {
            parser,
            page_numbers,
        }
    }

    fn backend(&self) -> &'a LopdfBackend {
        &self.parser.backend
    }

    /// Page of an outline item, from `/Dest` or a GoTo `/A` action.
    fn item_page(&self, item: &Dictionary) -> Option<u32> {
        if let Ok(dest) = item.get(b"Dest") {
            return self.resolve(dest, 0);
        }

        let action = self.backend().resolve_dict(item.get(b"A").ok()?)?;
        let is_goto = action
            .get(b"S")
            .ok()
            .and_then(|s| s.as_name().ok())
            .map_or(true, |s| s == b"GoTo");
        if !is_goto {
            return None;
        }
        self.resolve(action.get(b"D").ok()?, 0)
    }

    fn resolve(&self, dest: &Object, hops: u32) -> Option<u32> {
        if hops > MAX_DEST_HOPS {
            return None;
        }

        match self.backend().resolve(dest) {
            Object::Array(items) => match items.first()? {
                Object::Reference(id) => self.page_numbers.get(id).copied(),
                // remote-style destinations give a 0-based page index
                Object::Integer(i) => u32::try_from(*i).ok().map(|i| i + 1),
                _ => None,
            },
            Object::Dictionary(dict) => self.resolve(dict.get(b"D").ok()?, hops + 1),
            Object::Name(name) => self.resolve(self.named_destination(name)?, hops + 1),
            Object::String(name, _) => self.resolve(self.named_destination(name)?, hops + 1),
            _ => None,
        }
    }

    /// Look a name up in the catalog `/Dests` dictionary, then the
    /// `/Names` → `/Dests` name tree.
    fn named_destination(&self, name: &[u8]) -> Option<&'a Object> {
        let backend = self.backend();
        let catalog = self.parser.catalog()?;

        if let Some(found) = catalog
            .get(b"Dests")
            .ok()
            .and_then(|d| backend.resolve_dict(d))
            .and_then(|d| d.get(name).ok())
        {
            return Some(found);
        }

        let tree = catalog
            .get(b"Names")
            .ok()
            .and_then(|n| backend.resolve_dict(n))
            .and_then(|n| n.get(b"Dests").ok())
            .and_then(|d| backend.resolve_dict(d))?;
        self.search_name_tree(tree, name, 0)
    }

    fn search_name_tree(&self, node: &'a Dictionary, name: &[u8], depth: u32) -> Option<&'a Object> {
        if depth > MAX_TREE_DEPTH {
            return None;
        }
        let backend = self.backend();

        if let Ok(names) = node.get(b"Names").map(|n| backend.resolve(n)) {
            if let Ok(pairs) = names.as_array() {
                for pair in pairs.chunks_exact(2) {
                    if let Object::String(key, _) = backend.resolve(&pair[0]) {
                        if key.as_slice() == name {
                            return Some(&pair[1]);
                        }
                    }
                }
            }
        }

        let kids = node.get(b"Kids").ok().map(|k| backend.resolve(k))?;
        kids.as_array()
            .ok()?
            .iter()
            .filter_map(|kid| backend.resolve_dict(kid))
            .find_map(|kid| self.search_name_tree(kid, name, depth + 1))
    }
}

/// Helper to get a text string from a PDF dictionary.
fn get_string_from_dict(dict: &Dictionary, key: &[u8]) -> Option<String> {
    match dict.get(key).ok()? {
        Object::String(bytes, _) => Some(decode_pdf_string(bytes)),
        Object::Name(bytes) => Some(String::from_utf8_lossy(bytes).to_string()),
        _ => None,
    }
}

/// Decode a PDF text string (UTF-16BE with BOM, UTF-8 with BOM, or
/// PDFDocEncoding read as Latin-1).
pub fn decode_pdf_string(bytes: &[u8]) -> String {
    let bytes = bytes.strip_prefix(&[0xEF, 0xBB, 0xBF]).unwrap_or(bytes);
    decode_text_simple(bytes)
        .trim_start_matches('\u{FEFF}')
        .to_string()
}

/// Parse a PDF date string (`D:YYYYMMDDHHmmSSOHH'mm'`) into UTC.
pub fn parse_pdf_date(s: &str) -> Option<DateTime<Utc>> {
    let s = s.trim();
    let s = s.strip_prefix("D:").unwrap_or(s);

    // At minimum we need YYYY
    let year: i32 = s.get(0..4)?.parse().ok()?;
    let field = |range: std::ops::Range<usize>, default: u32| -> u32 {
        s.get(range).and_then(|v| v.parse().ok()).unwrap_or(default)
    };
    let month = field(4..6, 1);
    let day = field(6..8, 1);
    let hour = field(8..10, 0);
    let minute = field(10..12, 0);
    let second = field(12..14, 0);

    let naive = NaiveDate::from_ymd_opt(year, month, day)?.and_hms_opt(hour, minute, second)?;

    let offset_secs = s.get(14..).map(parse_utc_offset).unwrap_or(0);
    let offset = FixedOffset::east_opt(offset_secs)?;
    offset
        .from_local_datetime(&naive)
        .single()
        .map(|dt| dt.with_timezone(&Utc))
}

/// Parse the `Z`, `+HH'mm'` or `-HH'mm'` suffix of a PDF date, in seconds.
fn parse_utc_offset(tz: &str) -> i32 {
    let sign = match tz.chars().next() {
        Some('+') => 1,
        Some('-') => -1,
        _ => return 0,
    };
    let digits: String = tz[1..].chars().filter(|c| c.is_ascii_digit()).collect();
    let hours: i32 = digits.get(0..2).and_then(|h| h.parse().ok()).unwrap_or(0);
    let minutes: i32 = digits.get(2..4).and_then(|m| m.parse().ok()).unwrap_or(0);
    sign * (hours * 3600 + minutes * 60)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};
    use lopdf::dictionary;

    #[test]
    fn test_parse_pdf_date() {
        let date = parse_pdf_date("D:20240115103045").unwrap();
        assert_eq!(date.year(), 2024);
        assert_eq!(date.month(), 1);
        assert_eq!(date.day(), 15);
        assert_eq!(date.hour(), 10);
    }

    #[test]
    fn test_parse_pdf_date_minimal() {
        let date = parse_pdf_date("D:2024").unwrap();
        assert_eq!(date.year(), 2024);
        assert_eq!(date.month(), 1);
        assert_eq!(date.day(), 1);
    }

    #[test]
    fn test_parse_pdf_date_with_offset() {
        let date = parse_pdf_date("D:20240115103045+05'30'").unwrap();
        assert_eq!(date.hour(), 5);
        assert_eq!(date.minute(), 0);

        let date = parse_pdf_date("D:20240115233000-02'00'").unwrap();
        assert_eq!(date.day(), 16);
        assert_eq!(date.hour(), 1);

        assert_eq!(
            parse_pdf_date("D:20240115103045Z"),
            parse_pdf_date("D:20240115103045")
        );
    }

    #[test]
    fn test_parse_pdf_date_invalid() {
        assert!(parse_pdf_date("yesterday").is_none());
        assert!(parse_pdf_date("D:20241340").is_none());
    }

    #[test]
    fn test_decode_pdf_string() {
        assert_eq!(decode_pdf_string(b"Report"), "Report");
        assert_eq!(
            decode_pdf_string(&[0xFE, 0xFF, 0x00, 0x52, 0x00, 0xE9]),
            "Ré"
        );
        assert_eq!(decode_pdf_string(&[0xEF, 0xBB, 0xBF, b'O', b'K']), "OK");
        assert_eq!(decode_pdf_string(&[0x43, 0x61, 0x66, 0xE9]), "Café");
    }

    #[test]
    fn test_get_string_from_dict() {
        let dict = dictionary! {
            "Title" => Object::string_literal("Quarterly"),
            "Kind" => "Report",
            "Count" => 3,
        };
        assert_eq!(get_string_from_dict(&dict, b"Title").as_deref(), Some("Quarterly"));
        assert_eq!(get_string_from_dict(&dict, b"Kind").as_deref(), Some("Report"));
        assert_eq!(get_string_from_dict(&dict, b"Count"), None);
        assert_eq!(get_string_from_dict(&dict, b"Missing"), None);
    }

    #[test]
    fn test_open_rejects_non_pdf() {
        let err = PdfParser::from_bytes(b"plain text, not a pdf")
            .err()
            .expect("non-PDF input must fail");
        match err {
            Error::DocumentOpen { path, source } => {
                assert_eq!(path.to_string_lossy(), DEFAULT_SOURCE_NAME);
                assert!(matches!(*source, Error::UnknownFormat));
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
