//! Page-level layout types: spans, lines and pages.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Font style bits attached to a span.
///
/// Bit 0 is bold, bit 1 italic, bit 2 serif and bit 3 monospace.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StyleFlags(pub u8);

impl StyleFlags {
    /// Bold weight
    pub const BOLD: StyleFlags = StyleFlags(1 << 0);
    /// Italic or oblique
    pub const ITALIC: StyleFlags = StyleFlags(1 << 1);
    /// Serif typeface
    pub const SERIF: StyleFlags = StyleFlags(1 << 2);
    /// Fixed-pitch typeface
    pub const MONOSPACE: StyleFlags = StyleFlags(1 << 3);

    /// No style bits set.
    pub const fn empty() -> Self {
        StyleFlags(0)
    }

    /// Raw bit value.
    pub const fn bits(self) -> u8 {
        self.0
    }

    /// Check whether all bits of `other` are set.
    pub const fn contains(self, other: StyleFlags) -> bool {
        self.0 & other.0 == other.0
    }

    /// Set or clear the bits of `other`.
    pub fn set(&mut self, other: StyleFlags, value: bool) {
        if value {
            self.0 |= other.0;
        } else {
            self.0 &= !other.0;
        }
    }

    pub fn is_bold(self) -> bool {
        self.contains(Self::BOLD)
    }

    pub fn is_italic(self) -> bool {
        self.contains(Self::ITALIC)
    }

    pub fn is_serif(self) -> bool {
        self.contains(Self::SERIF)
    }

    pub fn is_monospace(self) -> bool {
        self.contains(Self::MONOSPACE)
    }
}

impl std::ops::BitOr for StyleFlags {
    type Output = StyleFlags;

    fn bitor(self, rhs: StyleFlags) -> StyleFlags {
        StyleFlags(self.0 | rhs.0)
    }
}

impl fmt::Display for StyleFlags {
    /// Formats as `bold|italic|serif|mono`, or `regular` when no bit is set.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = [
            (Self::BOLD, "bold"),
            (Self::ITALIC, "italic"),
            (Self::SERIF, "serif"),
            (Self::MONOSPACE, "mono"),
        ]
        .iter()
        .filter(|(flag, _)| self.contains(*flag))
        .map(|(_, name)| *name)
        .collect();

        if names.is_empty() {
            f.write_str("regular")
        } else {
            f.write_str(&names.join("|"))
        }
    }
}

/// Axis-aligned box in top-down page coordinates (points).
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub left: f32,
    pub top: f32,
    pub right: f32,
    pub bottom: f32,
}

impl BoundingBox {
    /// Create a new bounding box.
    pub fn new(left: f32, top: f32, right: f32, bottom: f32) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
        }
    }

    /// Horizontal center.
    pub fn center_x(&self) -> f32 {
        (self.left + self.right) / 2.0
    }

    pub fn width(&self) -> f32 {
        self.right - self.left
    }

    /// Smallest box containing both boxes.
    pub fn union(&self, other: &BoundingBox) -> BoundingBox {
        BoundingBox {
            left: self.left.min(other.left),
            top: self.top.min(other.top),
            right: self.right.max(other.right),
            bottom: self.bottom.max(other.bottom),
        }
    }

    /// All four coordinates are finite numbers.
    pub fn is_finite(&self) -> bool {
        self.left.is_finite()
            && self.top.is_finite()
            && self.right.is_finite()
            && self.bottom.is_finite()
    }
}

/// A contiguous run of text with uniform styling.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Span {
    /// The text content
    pub text: String,
    /// Font size in points
    pub size: f32,
    /// Style bits
    #[serde(default)]
    pub flags: StyleFlags,
    /// Position on the page
    pub bbox: BoundingBox,
}

impl Span {
    /// Create a new span.
    pub fn new(text: impl Into<String>, size: f32, flags: StyleFlags, bbox: BoundingBox) -> Self {
        Self {
            text: text.into(),
            size,
            flags,
            bbox,
        }
    }

    /// Font size rounded to the nearest unit, ties to even.
    ///
    /// `None` when the size is not a usable positive number.
    pub fn rounded_size(&self) -> Option<f32> {
        if self.size.is_finite() && self.size > 0.0 {
            Some(self.size.round_ties_even())
        } else {
            None
        }
    }

    /// Size and geometry are usable for layout analysis.
    pub fn is_well_formed(&self) -> bool {
        self.size.is_finite() && self.bbox.is_finite()
    }
}

/// A visual row of spans sharing a baseline.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Line {
    /// Spans ordered left to right
    pub spans: Vec<Span>,
}

impl Line {
    /// Create a line from spans.
    pub fn new(spans: Vec<Span>) -> Self {
        Self { spans }
    }

    /// Concatenated text of all spans.
    pub fn text(&self) -> String {
        self.spans.iter().map(|s| s.text.as_str()).collect()
    }

    /// Largest span size (0 for an empty line).
    pub fn size(&self) -> f32 {
        self.dominant_span().map(|s| s.size).unwrap_or(0.0)
    }

    /// Style bits of the largest span.
    pub fn flags(&self) -> StyleFlags {
        self.dominant_span().map(|s| s.flags).unwrap_or_default()
    }

    /// Union of all span boxes.
    pub fn bbox(&self) -> BoundingBox {
        let mut spans = self.spans.iter();
        match spans.next() {
            Some(first) => spans.fold(first.bbox, |acc, s| acc.union(&s.bbox)),
            None => BoundingBox::default(),
        }
    }

    /// The first span with the strictly largest size.
    fn dominant_span(&self) -> Option<&Span> {
        let mut best: Option<&Span> = None;
        for span in &self.spans {
            if best.map_or(span.size > 0.0, |b| span.size > b.size) {
                best = Some(span);
            }
        }
        best
    }

    /// Every span carries finite size and geometry.
    pub fn is_well_formed(&self) -> bool {
        !self.spans.is_empty() && self.spans.iter().all(Span::is_well_formed)
    }

    pub fn is_empty(&self) -> bool {
        self.spans.is_empty()
    }
}

/// A single page in the document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page {
    /// Page index (0-based)
    pub index: u32,

    /// Page width in points (1 point = 1/72 inch)
    pub width: f32,

    /// Page height in points
    pub height: f32,

    /// Lines in reading order
    pub lines: Vec<Line>,
}

impl Page {
    /// Create a new empty page with the given dimensions.
    pub fn new(index: u32, width: f32, height: f32) -> Self {
        Self {
            index,
            width,
            height,
            lines: Vec::new(),
        }
    }

    /// Create a new page with standard Letter size (8.5 x 11 inches).
    pub fn letter(index: u32) -> Self {
        Self::new(index, 612.0, 792.0)
    }

    /// Create a new page with standard A4 size (210 x 297 mm).
    pub fn a4(index: u32) -> Self {
        Self::new(index, 595.0, 842.0)
    }

    /// Append a line.
    pub fn add_line(&mut self, line: Line) {
        self.lines.push(line);
    }

    /// Iterate over all spans on the page.
    pub fn spans(&self) -> impl Iterator<Item = &Span> {
        self.lines.iter().flat_map(|l| l.spans.iter())
    }

    /// Sort lines top to bottom, then left to right.
    pub fn sort_reading_order(&mut self) {
        self.lines.sort_by(|a, b| {
            let (a, b) = (a.bbox(), b.bbox());
            a.top
                .total_cmp(&b.top)
                .then_with(|| a.left.total_cmp(&b.left))
        });
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

impl Default for Page {
    fn default() -> Self {
        Self::letter(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn span(text: &str, size: f32, flags: StyleFlags, left: f32, right: f32) -> Span {
        Span::new(text, size, flags, BoundingBox::new(left, 100.0, right, 100.0 + size))
    }

    #[test]
    fn test_style_flags_display() {
        assert_eq!(StyleFlags::empty().to_string(), "regular");
        assert_eq!(
            (StyleFlags::BOLD | StyleFlags::SERIF).to_string(),
            "bold|serif"
        );
        assert!(StyleFlags(0b1001).is_monospace());
        assert!(StyleFlags(0b1001).is_bold());
        assert!(!StyleFlags(0b1001).is_italic());
    }

    #[test]
    fn test_line_derived_fields() {
        let line = Line::new(vec![
            span("Chapter ", 12.0, StyleFlags::empty(), 10.0, 60.0),
            span("One", 18.0, StyleFlags::BOLD, 60.0, 100.0),
            span("!", 18.0, StyleFlags::ITALIC, 100.0, 105.0),
        ]);

        assert_eq!(line.text(), "Chapter One!");
        assert_eq!(line.size(), 18.0);
        // first span with the largest size wins
        assert_eq!(line.flags(), StyleFlags::BOLD);
        let bbox = line.bbox();
        assert_eq!(bbox.left, 10.0);
        assert_eq!(bbox.right, 105.0);
        assert_eq!(bbox.bottom, 118.0);
    }

    #[test]
    fn test_rounded_size_ties_to_even() {
        let mut s = span("x", 10.5, StyleFlags::empty(), 0.0, 1.0);
        assert_eq!(s.rounded_size(), Some(10.0));
        s.size = 11.5;
        assert_eq!(s.rounded_size(), Some(12.0));
        s.size = f32::NAN;
        assert_eq!(s.rounded_size(), None);
    }

    #[test]
    fn test_sort_reading_order() {
        let mut page = Page::letter(0);
        let mut low = Line::new(vec![span("b", 10.0, StyleFlags::empty(), 0.0, 5.0)]);
        low.spans[0].bbox.top = 500.0;
        let high = Line::new(vec![span("a", 10.0, StyleFlags::empty(), 0.0, 5.0)]);
        page.add_line(low);
        page.add_line(high);

        page.sort_reading_order();
        assert_eq!(page.lines[0].text(), "a");
        assert_eq!(page.lines[1].text(), "b");
    }
}
