//! Layout extraction for PDF pages.
//!
//! Runs the text operators of a page's content stream through a small
//! text-state machine, producing positioned [`TextSpan`]s, then groups them
//! into lines and converts them to the top-down [`Page`] model the outline
//! engine consumes.

use std::collections::HashMap;

use crate::error::Result;
use crate::model::{BoundingBox, Line, Page, Span, StyleFlags};

use super::backend::{
    get_number_from_value, BackendFontInfo, ContentOp, MediaBox, PageId, PdfBackend, PdfValue,
};

/// Fraction of the font size above the baseline (approximate ascender).
const ASCENT: f32 = 0.8;
/// Fraction of the font size below the baseline (approximate descender).
const DESCENT: f32 = 0.2;
/// Baselines closer than this fraction of the font size share a line.
const LINE_TOLERANCE: f32 = 0.3;
/// TJ adjustments beyond this (in 1/1000 em) are read as word breaks.
const TJ_SPACE_THRESHOLD: f32 = 200.0;
/// Advance width (1/1000 em) assumed when a font declares no widths.
const FALLBACK_GLYPH_WIDTH: f32 = 500.0;

/// A text span with position and style information, in PDF user space.
#[derive(Debug, Clone, PartialEq)]
pub struct TextSpan {
    /// The text content
    pub text: String,
    /// X position (left edge)
    pub x: f32,
    /// Y position (baseline, bottom-up)
    pub y: f32,
    /// Advance width of the text
    pub width: f32,
    /// Effective font size in points
    pub font_size: f32,
    /// Style of the font the text was shown with
    pub flags: StyleFlags,
}

impl TextSpan {
    /// Create a new text span.
    pub fn new(
        text: impl Into<String>,
        x: f32,
        y: f32,
        width: f32,
        font_size: f32,
        flags: StyleFlags,
    ) -> Self {
        Self {
            text: text.into(),
            x,
            y,
            width,
            font_size,
            flags,
        }
    }

    /// Right edge.
    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    fn is_finite(&self) -> bool {
        self.x.is_finite()
            && self.y.is_finite()
            && self.width.is_finite()
            && self.font_size.is_finite()
    }

    /// Convert to a model span with a top-down bounding box.
    pub fn to_span(&self, media_box: &MediaBox) -> Span {
        let left = self.x - media_box.x0;
        let top = media_box.y1 - (self.y + self.font_size * ASCENT);
        let bottom = media_box.y1 - (self.y - self.font_size * DESCENT);
        Span::new(
            self.text.clone(),
            self.font_size,
            self.flags,
            BoundingBox::new(left, top, left + self.width.max(0.0), bottom),
        )
    }
}

/// Extracts positioned text from pages of a [`PdfBackend`].
pub struct LayoutAnalyzer<'a, B: PdfBackend> {
    backend: &'a B,
}

impl<'a, B: PdfBackend> LayoutAnalyzer<'a, B> {
    pub fn new(backend: &'a B) -> Self {
        Self { backend }
    }

    /// Extract a page (1-based `page_num`) as lines in reading order.
    pub fn extract_page(&self, page_num: u32, page_id: PageId) -> Result<Page> {
        let media_box = self.backend.media_box(page_id);
        let spans = self.extract_page_spans(page_id)?;
        Ok(build_page(page_num.saturating_sub(1), &media_box, spans))
    }

    /// Extract text spans from a page with position and font information.
    pub fn extract_page_spans(&self, page_id: PageId) -> Result<Vec<TextSpan>> {
        let fonts: HashMap<Vec<u8>, BackendFontInfo> = self
            .backend
            .page_fonts(page_id)?
            .into_iter()
            .map(|f| (f.name.clone(), f))
            .collect();

        let content = self.backend.page_content(page_id)?;
        if content.is_empty() {
            return Ok(Vec::new());
        }
        let ops = self.backend.decode_content(&content)?;

        let mut interpreter = TextInterpreter::new(self.backend, page_id, &fonts);
        for op in &ops {
            interpreter.apply(op);
        }
        Ok(interpreter.finish())
    }
}

/// Group spans into lines, convert them to top-down coordinates and sort
/// the page into reading order.
pub fn build_page(index: u32, media_box: &MediaBox, spans: Vec<TextSpan>) -> Page {
    let mut page = Page::new(index, media_box.width(), media_box.height());
    for line_spans in group_spans_into_lines(spans) {
        let spans: Vec<Span> = join_spans(line_spans)
            .iter()
            .map(|s| s.to_span(media_box))
            .collect();
        let line = Line::new(spans);
        if !line.is_empty() {
            page.add_line(line);
        }
    }
    page.sort_reading_order();
    page
}

/// Group spans into lines based on baseline position.
///
/// Spans are visited top to bottom (then left to right); a span joins the
/// current line when its baseline is within 30% of its font size of the
/// line's first baseline. Spans inside a line are ordered left to right.
pub fn group_spans_into_lines(mut spans: Vec<TextSpan>) -> Vec<Vec<TextSpan>> {
    spans.retain(|s| {
        let keep = s.is_finite();
        if !keep {
            log::debug!("Dropping span with non-finite geometry: {:?}", s.text);
        }
        keep
    });
    if spans.is_empty() {
        return vec![];
    }

    // PDF y grows upwards
    spans.sort_by(|a, b| b.y.total_cmp(&a.y).then(a.x.total_cmp(&b.x)));

    let mut lines: Vec<Vec<TextSpan>> = Vec::new();
    let mut current: Vec<TextSpan> = Vec::new();
    let mut current_y: Option<f32> = None;

    for span in spans {
        let tolerance = span.font_size.abs() * LINE_TOLERANCE;
        match current_y {
            Some(y) if (span.y - y).abs() <= tolerance => current.push(span),
            _ => {
                if !current.is_empty() {
                    lines.push(std::mem::take(&mut current));
                }
                current_y = Some(span.y);
                current.push(span);
            }
        }
    }
    if !current.is_empty() {
        lines.push(current);
    }

    for line in &mut lines {
        line.sort_by(|a, b| a.x.total_cmp(&b.x));
    }
    lines
}

/// Insert word spaces between the spans of one line.
///
/// A space is prepended to a span when the gap to the previous span exceeds
/// 20% of its average character width, unless either side already carries
/// whitespace or both sides are in a script written without spaces.
fn join_spans(mut spans: Vec<TextSpan>) -> Vec<TextSpan> {
    for i in 1..spans.len() {
        let (before, after) = spans.split_at_mut(i);
        let prev = &before[i - 1];
        let span = &mut after[0];

        let gap = span.x - prev.right();
        let char_count = span.text.chars().count();
        let avg_char_width = if char_count > 0 && span.width > 0.0 {
            span.width / char_count as f32
        } else {
            span.font_size * 0.5
        };
        if gap <= avg_char_width * 0.2 {
            continue;
        }

        let prev_last = prev.text.chars().last();
        let curr_first = span.text.chars().next();
        let spaceless = prev_last.is_some_and(is_spaceless_script_char)
            && curr_first.is_some_and(is_spaceless_script_char);
        let has_space = prev_last.is_some_and(char::is_whitespace)
            || curr_first.is_some_and(char::is_whitespace);

        if !spaceless && !has_space {
            span.text.insert(0, ' ');
        }
    }
    spans
}

/// Affine matrix `[a b c d e f]` in PDF row-vector convention.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Matrix {
    a: f32,
    b: f32,
    c: f32,
    d: f32,
    e: f32,
    f: f32,
}

impl Matrix {
    const IDENTITY: Matrix = Matrix {
        a: 1.0,
        b: 0.0,
        c: 0.0,
        d: 1.0,
        e: 0.0,
        f: 0.0,
    };

    fn from_op(op: &ContentOp) -> Option<Self> {
        Some(Self {
            a: op.number(0)?,
            b: op.number(1)?,
            c: op.number(2)?,
            d: op.number(3)?,
            e: op.number(4)?,
            f: op.number(5)?,
        })
    }

    fn translation(tx: f32, ty: f32) -> Self {
        Self {
            e: tx,
            f: ty,
            ..Self::IDENTITY
        }
    }

    /// `self × other`
    fn then(&self, other: &Matrix) -> Matrix {
        Matrix {
            a: self.a * other.a + self.b * other.c,
            b: self.a * other.b + self.b * other.d,
            c: self.c * other.a + self.d * other.c,
            d: self.c * other.b + self.d * other.d,
            e: self.e * other.a + self.f * other.c + other.e,
            f: self.e * other.b + self.f * other.d + other.f,
        }
    }

    fn horizontal_scale(&self) -> f32 {
        (self.a * self.a + self.b * self.b).sqrt()
    }

    fn vertical_scale(&self) -> f32 {
        (self.c * self.c + self.d * self.d).sqrt()
    }
}

/// Text state parameters saved and restored with `q`/`Q`.
#[derive(Debug, Clone)]
struct TextParams {
    font: Option<Vec<u8>>,
    font_size: f32,
    char_spacing: f32,
    word_spacing: f32,
    horizontal_scaling: f32,
    leading: f32,
}

impl Default for TextParams {
    fn default() -> Self {
        Self {
            font: None,
            font_size: 12.0,
            char_spacing: 0.0,
            word_spacing: 0.0,
            horizontal_scaling: 1.0,
            leading: 0.0,
        }
    }
}

struct TextInterpreter<'a, B: PdfBackend> {
    backend: &'a B,
    page_id: PageId,
    fonts: &'a HashMap<Vec<u8>, BackendFontInfo>,
    ctm: Matrix,
    params: TextParams,
    stack: Vec<(Matrix, TextParams)>,
    text_matrix: Matrix,
    line_matrix: Matrix,
    in_text: bool,
    spans: Vec<TextSpan>,
}

impl<'a, B: PdfBackend> TextInterpreter<'a, B> {
    fn new(backend: &'a B, page_id: PageId, fonts: &'a HashMap<Vec<u8>, BackendFontInfo>) -> Self {
        Self {
            backend,
            page_id,
            fonts,
            ctm: Matrix::IDENTITY,
            params: TextParams::default(),
            stack: Vec::new(),
            text_matrix: Matrix::IDENTITY,
            line_matrix: Matrix::IDENTITY,
            in_text: false,
            spans: Vec::new(),
        }
    }

    fn finish(self) -> Vec<TextSpan> {
        self.spans
    }

    fn apply(&mut self, op: &ContentOp) {
        match op.operator.as_str() {
            "q" => self.stack.push((self.ctm, self.params.clone())),
            "Q" => {
                if let Some((ctm, params)) = self.stack.pop() {
                    self.ctm = ctm;
                    self.params = params;
                }
            }
            "cm" => {
                if let Some(m) = Matrix::from_op(op) {
                    self.ctm = m.then(&self.ctm);
                }
            }
            "BT" => {
                self.in_text = true;
                self.text_matrix = Matrix::IDENTITY;
                self.line_matrix = Matrix::IDENTITY;
            }
            "ET" => self.in_text = false,
            "Tf" => {
                if let Some(PdfValue::Name(name)) = op.operands.first() {
                    self.params.font = Some(name.clone());
                }
                if let Some(size) = op.number(1) {
                    self.params.font_size = size;
                }
            }
            "Tc" => self.params.char_spacing = op.number(0).unwrap_or(0.0),
            "Tw" => self.params.word_spacing = op.number(0).unwrap_or(0.0),
            "Tz" => self.params.horizontal_scaling = op.number(0).unwrap_or(100.0) / 100.0,
            "TL" => self.params.leading = op.number(0).unwrap_or(0.0),
            "Td" => {
                if let (Some(tx), Some(ty)) = (op.number(0), op.number(1)) {
                    self.move_line(tx, ty);
                }
            }
            "TD" => {
                if let (Some(tx), Some(ty)) = (op.number(0), op.number(1)) {
                    self.params.leading = -ty;
                    self.move_line(tx, ty);
                }
            }
            "Tm" => {
                if let Some(m) = Matrix::from_op(op) {
                    self.text_matrix = m;
                    self.line_matrix = m;
                }
            }
            "T*" => self.next_line(),
            "Tj" => {
                if let Some(PdfValue::Str(bytes)) = op.operands.first() {
                    self.show(&[PdfValue::Str(bytes.clone())]);
                }
            }
            "TJ" => {
                if let Some(PdfValue::Array(items)) = op.operands.first() {
                    self.show(items);
                }
            }
            "'" => {
                self.next_line();
                if let Some(PdfValue::Str(bytes)) = op.operands.first() {
                    self.show(&[PdfValue::Str(bytes.clone())]);
                }
            }
            "\"" => {
                if let (Some(aw), Some(ac)) = (op.number(0), op.number(1)) {
                    self.params.word_spacing = aw;
                    self.params.char_spacing = ac;
                }
                self.next_line();
                if let Some(PdfValue::Str(bytes)) = op.operands.get(2) {
                    self.show(&[PdfValue::Str(bytes.clone())]);
                }
            }
            _ => {}
        }
    }

    fn move_line(&mut self, tx: f32, ty: f32) {
        self.line_matrix = Matrix::translation(tx, ty).then(&self.line_matrix);
        self.text_matrix = self.line_matrix;
    }

    fn next_line(&mut self) {
        let leading = self.params.leading;
        self.move_line(0.0, -leading);
    }

    /// Show a TJ-style sequence of strings and kerning adjustments as one span.
    fn show(&mut self, items: &[PdfValue]) {
        if !self.in_text {
            return;
        }

        let start = self.text_matrix.then(&self.ctm);
        let font_name = self.params.font.clone().unwrap_or_default();
        let font = self
            .fonts
            .get(&font_name)
            .cloned()
            .unwrap_or_else(|| BackendFontInfo::unknown(&font_name));

        let mut text = String::new();
        let mut advance = 0.0f32;
        for item in items {
            match item {
                PdfValue::Str(bytes) => {
                    text.push_str(&self.backend.decode_text(self.page_id, &font_name, bytes));
                    advance += self.string_advance(&font, bytes);
                }
                PdfValue::Integer(_) | PdfValue::Real(_) => {
                    let adjustment = get_number_from_value(item).unwrap_or(0.0);
                    advance -= adjustment / 1000.0
                        * self.params.font_size
                        * self.params.horizontal_scaling;
                    if -adjustment > TJ_SPACE_THRESHOLD
                        && text.chars().last().is_some_and(|c| {
                            !c.is_whitespace() && !is_spaceless_script_char(c)
                        })
                    {
                        text.push(' ');
                    }
                }
                _ => {}
            }
        }

        self.text_matrix = Matrix::translation(advance, 0.0).then(&self.text_matrix);

        if text.trim().is_empty() {
            return;
        }
        let text = text.trim_end().to_string();
        self.spans.push(TextSpan::new(
            text,
            start.e,
            start.f,
            advance * start.horizontal_scale(),
            self.params.font_size * start.vertical_scale(),
            font.flags,
        ));
    }

    /// Horizontal advance of a string in unscaled text space units.
    fn string_advance(&self, font: &BackendFontInfo, bytes: &[u8]) -> f32 {
        let size = self.params.font_size;
        let params = &self.params;

        let glyphs: Vec<(f32, bool)> = if font.composite {
            bytes
                .chunks(2)
                .map(|_| (FALLBACK_GLYPH_WIDTH, false))
                .collect()
        } else {
            bytes
                .iter()
                .map(|&b| {
                    let width = font
                        .widths
                        .as_ref()
                        .map(|w| w.width_of(b))
                        .filter(|w| *w > 0.0)
                        .unwrap_or(FALLBACK_GLYPH_WIDTH);
                    (width, b == b' ')
                })
                .collect()
        };

        glyphs
            .iter()
            .map(|&(width, is_space)| {
                let word = if is_space { params.word_spacing } else { 0.0 };
                (width / 1000.0 * size + params.char_spacing + word) * params.horizontal_scaling
            })
            .sum()
    }
}

/// Check if a character belongs to a script written without word spaces.
///
/// Chinese and Japanese don't use spaces between words, but Korean does.
fn is_spaceless_script_char(c: char) -> bool {
    let code = c as u32;

    // CJK Unified Ideographs
    (0x4E00..=0x9FFF).contains(&code)
    // Extension A
    || (0x3400..=0x4DBF).contains(&code)
    // Extensions B-F
    || (0x20000..=0x2EBEF).contains(&code)
    // Hiragana
    || (0x3040..=0x309F).contains(&code)
    // Katakana
    || (0x30A0..=0x30FF).contains(&code)
    // CJK Symbols and Punctuation
    || (0x3000..=0x303F).contains(&code)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::backend::GlyphWidths;
    use std::collections::BTreeMap;

    fn span(text: &str, x: f32, y: f32, width: f32, size: f32) -> TextSpan {
        TextSpan::new(text, x, y, width, size, StyleFlags::empty())
    }

    /// In-memory backend serving one page of pre-decoded operations.
    struct ScriptedBackend {
        ops: Vec<ContentOp>,
        fonts: Vec<BackendFontInfo>,
    }

    impl PdfBackend for ScriptedBackend {
        fn pages(&self) -> BTreeMap<u32, PageId> {
            BTreeMap::from([(1, (1, 0))])
        }

        fn media_box(&self, _page: PageId) -> MediaBox {
            MediaBox::default()
        }

        fn page_fonts(&self, _page: PageId) -> Result<Vec<BackendFontInfo>> {
            Ok(self.fonts.clone())
        }

        fn page_content(&self, _page: PageId) -> Result<Vec<u8>> {
            Ok(b"scripted".to_vec())
        }

        fn decode_content(&self, _data: &[u8]) -> Result<Vec<ContentOp>> {
            Ok(self.ops.clone())
        }

        fn decode_text(&self, _page: PageId, _font: &[u8], bytes: &[u8]) -> String {
            String::from_utf8_lossy(bytes).to_string()
        }
    }

    fn op(operator: &str, operands: Vec<PdfValue>) -> ContentOp {
        ContentOp {
            operator: operator.to_string(),
            operands,
        }
    }

    fn num(v: f32) -> PdfValue {
        PdfValue::Real(v)
    }

    fn text(s: &str) -> PdfValue {
        PdfValue::Str(s.as_bytes().to_vec())
    }

    fn bold_font() -> BackendFontInfo {
        BackendFontInfo {
            name: b"F2".to_vec(),
            base_font: "Helvetica-Bold".to_string(),
            flags: StyleFlags::BOLD,
            widths: Some(GlyphWidths {
                first_char: 32,
                widths: vec![600.0; 95],
                missing_width: 0.0,
            }),
            composite: false,
        }
    }

    #[test]
    fn test_group_spans_into_lines() {
        let spans = vec![
            span("world", 140.0, 700.0, 50.0, 12.0),
            span("Body", 72.0, 680.0, 40.0, 12.0),
            span("Hello", 72.0, 701.5, 50.0, 12.0),
        ];
        let lines = group_spans_into_lines(spans);
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0][0].text, "Hello");
        assert_eq!(lines[0][1].text, "world");
        assert_eq!(lines[1][0].text, "Body");
    }

    #[test]
    fn test_non_finite_spans_are_dropped() {
        let spans = vec![
            span("ok", 72.0, 700.0, 20.0, 12.0),
            span("bad", f32::NAN, 700.0, 20.0, 12.0),
        ];
        let lines = group_spans_into_lines(spans);
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].len(), 1);
    }

    #[test]
    fn test_join_spans_inserts_word_gaps() {
        let joined = join_spans(vec![
            span("Hello", 72.0, 700.0, 30.0, 12.0),
            span("world", 110.0, 700.0, 30.0, 12.0),
            span("!", 140.0, 700.0, 3.0, 12.0),
        ]);
        let text: String = joined.iter().map(|s| s.text.as_str()).collect();
        assert_eq!(text, "Hello world!");
    }

    #[test]
    fn test_join_spans_skips_spaceless_scripts() {
        let joined = join_spans(vec![
            span("日本", 72.0, 700.0, 24.0, 12.0),
            span("語", 110.0, 700.0, 12.0, 12.0),
        ]);
        let text: String = joined.iter().map(|s| s.text.as_str()).collect();
        assert_eq!(text, "日本語");
    }

    #[test]
    fn test_to_span_flips_coordinates() {
        let media_box = MediaBox::default();
        let s = span("Title", 100.0, 692.0, 60.0, 10.0).to_span(&media_box);
        assert_eq!(s.bbox.left, 100.0);
        assert_eq!(s.bbox.right, 160.0);
        assert_eq!(s.bbox.top, 92.0);
        assert_eq!(s.bbox.bottom, 102.0);
    }

    #[test]
    fn test_build_page_reading_order() {
        let media_box = MediaBox::default();
        let page = build_page(
            3,
            &media_box,
            vec![
                span("second", 72.0, 600.0, 40.0, 12.0),
                span("first", 72.0, 700.0, 40.0, 12.0),
            ],
        );
        assert_eq!(page.index, 3);
        assert_eq!(page.width, 612.0);
        assert_eq!(page.lines[0].text(), "first");
        assert_eq!(page.lines[1].text(), "second");
    }

    #[test]
    fn test_text_state_machine() {
        let backend = ScriptedBackend {
            fonts: vec![bold_font()],
            ops: vec![
                op("BT", vec![]),
                op("Tf", vec![PdfValue::Name(b"F2".to_vec()), num(20.0)]),
                op("Td", vec![num(72.0), num(700.0)]),
                op("Tj", vec![text("Intro")]),
                op("TL", vec![num(24.0)]),
                op("Tf", vec![PdfValue::Name(b"F1".to_vec()), num(10.0)]),
                op("T*", vec![]),
                op(
                    "TJ",
                    vec![PdfValue::Array(vec![
                        text("plain"),
                        PdfValue::Integer(-300),
                        text("text"),
                    ])],
                ),
                op("ET", vec![]),
            ],
        };

        let analyzer = LayoutAnalyzer::new(&backend);
        let spans = analyzer.extract_page_spans((1, 0)).unwrap();
        assert_eq!(spans.len(), 2);

        assert_eq!(spans[0].text, "Intro");
        assert_eq!(spans[0].x, 72.0);
        assert_eq!(spans[0].y, 700.0);
        assert_eq!(spans[0].font_size, 20.0);
        // 5 glyphs of 600/1000 em at 20pt
        assert!((spans[0].width - 60.0).abs() < 1e-3);
        assert!(spans[0].flags.is_bold());

        assert_eq!(spans[1].text, "plain text");
        assert_eq!(spans[1].y, 676.0);
        assert_eq!(spans[1].font_size, 10.0);
        assert!(!spans[1].flags.is_bold());
    }

    #[test]
    fn test_ctm_scales_font_size() {
        let backend = ScriptedBackend {
            fonts: vec![],
            ops: vec![
                op("q", vec![]),
                op(
                    "cm",
                    vec![num(2.0), num(0.0), num(0.0), num(2.0), num(10.0), num(20.0)],
                ),
                op("BT", vec![]),
                op("Tf", vec![PdfValue::Name(b"F9".to_vec()), num(9.0)]),
                op("Td", vec![num(5.0), num(5.0)]),
                op("Tj", vec![text("Scaled")]),
                op("ET", vec![]),
                op("Q", vec![]),
                op("BT", vec![]),
                op("Tj", vec![text("Outside")]),
                op("ET", vec![]),
            ],
        };

        let spans = LayoutAnalyzer::new(&backend)
            .extract_page_spans((1, 0))
            .unwrap();
        assert_eq!(spans[0].font_size, 18.0);
        assert_eq!(spans[0].x, 20.0);
        assert_eq!(spans[0].y, 30.0);
        // font size is part of the text params restored by Q
        assert_eq!(spans[1].font_size, 12.0);
        assert_eq!(spans[1].x, 0.0);
    }

    #[test]
    fn test_extract_page() {
        let backend = ScriptedBackend {
            fonts: vec![bold_font()],
            ops: vec![
                op("BT", vec![]),
                op("Tf", vec![PdfValue::Name(b"F2".to_vec()), num(18.0)]),
                op("Tm", vec![num(1.0), num(0.0), num(0.0), num(1.0), num(72.0), num(720.0)]),
                op("Tj", vec![text("Heading")]),
                op("ET", vec![]),
            ],
        };

        let page = LayoutAnalyzer::new(&backend)
            .extract_page(1, (1, 0))
            .unwrap();
        assert_eq!(page.index, 0);
        assert_eq!(page.lines.len(), 1);
        assert_eq!(page.lines[0].text(), "Heading");
        assert_eq!(page.lines[0].size(), 18.0);
        assert!(page.lines[0].flags().is_bold());
    }
}
