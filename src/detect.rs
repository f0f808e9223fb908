//! PDF header detection and file filtering.

use crate::error::{Error, Result};
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// PDF magic bytes: %PDF-
const PDF_MAGIC: &[u8] = b"%PDF-";
const VERSION_LEN: usize = 3; // e.g., "1.7"

/// Readers tolerate junk before the header within the first kilobyte.
const HEADER_SEARCH_WINDOW: usize = 1024;

/// Information read from a PDF file header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PdfHeader {
    /// PDF version (e.g., "1.7", "2.0")
    pub version: String,
    /// Byte offset of the `%PDF-` marker
    pub offset: usize,
}

impl std::fmt::Display for PdfHeader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "PDF {}", self.version)
    }
}

/// Read and validate the header of a file on disk.
///
/// Fails with [`Error::UnknownFormat`] when no `%PDF-` marker is found in
/// the first kilobyte, and [`Error::UnsupportedVersion`] when the version
/// is malformed.
pub fn detect_header_from_path<P: AsRef<Path>>(path: P) -> Result<PdfHeader> {
    let file = File::open(path)?;
    let mut head = Vec::with_capacity(HEADER_SEARCH_WINDOW);
    file.take(HEADER_SEARCH_WINDOW as u64).read_to_end(&mut head)?;
    detect_header_from_bytes(&head)
}

/// Validate the header of an in-memory document.
pub fn detect_header_from_bytes(data: &[u8]) -> Result<PdfHeader> {
    let window = &data[..data.len().min(HEADER_SEARCH_WINDOW)];
    let offset = window
        .windows(PDF_MAGIC.len())
        .position(|w| w == PDF_MAGIC)
        .ok_or(Error::UnknownFormat)?;

    let start = offset + PDF_MAGIC.len();
    let version_bytes = data
        .get(start..start + VERSION_LEN)
        .ok_or(Error::UnknownFormat)?;
    let version = String::from_utf8_lossy(version_bytes).to_string();

    if !is_valid_version(&version) {
        return Err(Error::UnsupportedVersion(version));
    }

    Ok(PdfHeader { version, offset })
}

fn is_valid_version(version: &str) -> bool {
    let bytes = version.as_bytes();
    bytes.len() == 3 && bytes[0].is_ascii_digit() && bytes[1] == b'.' && bytes[2].is_ascii_digit()
}

/// Check whether a path carries a `.pdf` extension (case-insensitive).
///
/// This is the filter the batch driver applies to directory entries; it
/// does not touch the file.
pub fn has_pdf_extension<P: AsRef<Path>>(path: P) -> bool {
    path.as_ref()
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"))
}

/// Check if a file on disk starts with a valid PDF header.
pub fn is_pdf<P: AsRef<Path>>(path: P) -> bool {
    detect_header_from_path(path).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_valid_header() {
        let header = detect_header_from_bytes(b"%PDF-1.7\n%\xe2\xe3\xcf\xd3").unwrap();
        assert_eq!(header.version, "1.7");
        assert_eq!(header.offset, 0);
        assert_eq!(header.to_string(), "PDF 1.7");
    }

    #[test]
    fn test_detect_header_after_junk() {
        let mut data = vec![b' '; 20];
        data.extend_from_slice(b"%PDF-2.0\n");
        let header = detect_header_from_bytes(&data).unwrap();
        assert_eq!(header.version, "2.0");
        assert_eq!(header.offset, 20);
    }

    #[test]
    fn test_detect_invalid_format() {
        let result = detect_header_from_bytes(b"<!DOCTYPE html>");
        assert!(matches!(result, Err(Error::UnknownFormat)));

        let result = detect_header_from_bytes(b"%PDF");
        assert!(matches!(result, Err(Error::UnknownFormat)));
    }

    #[test]
    fn test_detect_bad_version() {
        let result = detect_header_from_bytes(b"%PDF-x.y\n");
        assert!(matches!(result, Err(Error::UnsupportedVersion(v)) if v == "x.y"));
    }

    #[test]
    fn test_has_pdf_extension() {
        assert!(has_pdf_extension("report.pdf"));
        assert!(has_pdf_extension("REPORT.PDF"));
        assert!(has_pdf_extension("dir/Mixed.Pdf"));
        assert!(!has_pdf_extension("report.pdf.json"));
        assert!(!has_pdf_extension("pdf"));
    }
}
