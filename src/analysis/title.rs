//! Document title resolution.

use crate::model::Document;
use crate::text::clean;

/// Pick the document title.
///
/// The first rule that yields a non-empty cleaned string wins:
/// 1. the metadata `title`;
/// 2. the text of the span with the strictly largest size on the first page;
/// 3. the source file name without its extension.
///
/// This never fails; missing or malformed inputs simply fall through to the
/// next rule.
pub fn resolve_title(document: &Document) -> String {
    if let Some(title) = metadata_title(document) {
        log::debug!("Title from metadata: {:?}", title);
        return title;
    }

    if let Some(title) = largest_first_page_text(document) {
        log::debug!("Title from first-page text: {:?}", title);
        return title;
    }

    let title = document.source_stem();
    log::debug!("Title from file name: {:?}", title);
    title
}

fn metadata_title(document: &Document) -> Option<String> {
    let title = clean(document.metadata.title.as_deref()?);
    (!title.is_empty()).then_some(title)
}

fn largest_first_page_text(document: &Document) -> Option<String> {
    let page = document.page(0)?;

    let mut max_size = 0.0f32;
    let mut candidate: Option<&str> = None;
    for span in page.spans().filter(|s| s.size.is_finite()) {
        if span.size > max_size {
            max_size = span.size;
            candidate = Some(span.text.as_str());
        }
    }

    let title = clean(candidate?);
    (!title.is_empty()).then_some(title)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{BoundingBox, Line, Page, Span, StyleFlags};

    fn page_with(spans: &[(&str, f32)]) -> Page {
        let mut page = Page::letter(0);
        for (i, (text, size)) in spans.iter().enumerate() {
            let top = i as f32 * 20.0;
            page.add_line(Line::new(vec![Span::new(
                *text,
                *size,
                StyleFlags::empty(),
                BoundingBox::new(72.0, top, 300.0, top + size),
            )]));
        }
        page
    }

    #[test]
    fn test_metadata_title_wins() {
        let mut doc = Document::new("file.pdf");
        doc.metadata.title = Some("Report".to_string());
        doc.add_page(page_with(&[("Huge Banner", 40.0)]));
        assert_eq!(resolve_title(&doc), "Report");
    }

    #[test]
    fn test_metadata_title_is_cleaned() {
        let mut doc = Document::new("file.pdf");
        doc.metadata.title = Some("  Annual\t Report ™ ".to_string());
        assert_eq!(resolve_title(&doc), "Annual Report");
    }

    #[test]
    fn test_blank_metadata_falls_through() {
        let mut doc = Document::new("file.pdf");
        doc.metadata.title = Some(" *** ".to_string());
        doc.add_page(page_with(&[("body text", 10.0), ("Big Title", 24.0)]));
        assert_eq!(resolve_title(&doc), "Big Title");
    }

    #[test]
    fn test_first_largest_span_wins_ties() {
        let mut doc = Document::new("file.pdf");
        doc.add_page(page_with(&[("First", 24.0), ("Second", 24.0), ("small", 9.0)]));
        assert_eq!(resolve_title(&doc), "First");
    }

    #[test]
    fn test_only_first_page_is_considered() {
        let mut doc = Document::new("quarterly.pdf");
        let mut second = page_with(&[("Not The Title", 48.0)]);
        second.index = 1;
        doc.add_page(second);
        assert_eq!(resolve_title(&doc), "quarterly");
    }

    #[test]
    fn test_unusable_largest_span_falls_back_to_file_name() {
        let mut doc = Document::new("dir/summary.v2.pdf");
        doc.add_page(page_with(&[("body", 10.0), ("§§", 30.0)]));
        assert_eq!(resolve_title(&doc), "summary.v2");
    }

    #[test]
    fn test_empty_document_uses_file_name() {
        assert_eq!(resolve_title(&Document::new("empty.pdf")), "empty");
    }
}
