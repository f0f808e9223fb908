//! Benchmarks for pdf-outline.
//!
//! Run with: cargo bench
//!
//! PDF parsing is measured on documents generated with lopdf; the outline
//! engine on documents built directly from the layout model.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document as PdfDocument, Object, Stream};

use pdf_outline::{
    assemble, detect_header_from_bytes, BoundingBox, DetectionOptions, Document, FontProfile,
    Line, Page, Span, StyleFlags,
};

/// Create a PDF with one bold heading and twenty body lines per page.
fn create_test_pdf(page_count: usize) -> Vec<u8> {
    let mut doc = PdfDocument::with_version("1.5");
    let pages_id = doc.new_object_id();

    let mut kids = Vec::new();
    for i in 0..page_count {
        let mut operations = vec![
            Operation::new("BT", vec![]),
            Operation::new("Tf", vec!["F2".into(), 16.into()]),
            Operation::new("Td", vec![72.into(), 720.into()]),
            Operation::new(
                "Tj",
                vec![Object::string_literal(format!("{}. Section Heading", i + 1))],
            ),
            Operation::new("Tf", vec!["F1".into(), 11.into()]),
            Operation::new("TL", vec![14.into()]),
        ];
        for _ in 0..20 {
            operations.push(Operation::new("T*", vec![]));
            operations.push(Operation::new(
                "Tj",
                vec![Object::string_literal(
                    "Benchmark body text for pdf-outline performance measurement.",
                )],
            ));
        }
        operations.push(Operation::new("ET", vec![]));

        let content = Content { operations }.encode().unwrap();
        let content_id = doc.add_object(Stream::new(dictionary! {}, content));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
        });
        kids.push(Object::Reference(page_id));
    }

    let font = |base: &str| {
        dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => base,
        }
    };
    let pages = dictionary! {
        "Type" => "Pages",
        "Kids" => kids,
        "Count" => page_count as i64,
        "Resources" => dictionary! {
            "Font" => dictionary! {
                "F1" => font("Helvetica"),
                "F2" => font("Helvetica-Bold"),
            },
        },
        "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
    };
    doc.objects.insert(pages_id, Object::Dictionary(pages));

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut bytes = Vec::new();
    doc.save_to(&mut bytes).unwrap();
    bytes
}

/// Create a layout-model document without going through PDF parsing.
fn create_layout_document(page_count: u32) -> Document {
    let mut doc = Document::new("bench.pdf");
    for index in 0..page_count {
        let mut page = Page::letter(index);
        let line = |text: String, size: f32, flags: StyleFlags, top: f32| {
            Line::new(vec![Span::new(
                text,
                size,
                flags,
                BoundingBox::new(72.0, top, 400.0, top + size),
            )])
        };
        page.lines.push(line(
            format!("{}. Chapter", index + 1),
            18.0,
            StyleFlags::BOLD,
            60.0,
        ));
        page.lines.push(line(
            format!("{}.1 Section", index + 1),
            14.0,
            StyleFlags::BOLD,
            90.0,
        ));
        for row in 0..40 {
            page.lines.push(line(
                "Lorem ipsum dolor sit amet, consectetur adipiscing elit.".to_string(),
                11.0,
                StyleFlags::empty(),
                120.0 + row as f32 * 14.0,
            ));
        }
        doc.add_page(page);
    }
    doc
}

/// Benchmark PDF header detection.
fn bench_header_detection(c: &mut Criterion) {
    let pdf_data = create_test_pdf(1);
    let non_pdf_data = b"Not a PDF file at all, just random text content";

    c.bench_function("detect_valid_pdf", |b| {
        b.iter(|| detect_header_from_bytes(black_box(&pdf_data)).unwrap());
    });

    c.bench_function("detect_non_pdf", |b| {
        b.iter(|| detect_header_from_bytes(black_box(non_pdf_data)).is_err());
    });
}

/// Benchmark PDF parsing at various sizes.
fn bench_pdf_parsing(c: &mut Criterion) {
    let mut group = c.benchmark_group("pdf_parsing");

    for page_count in [1, 10, 50].iter() {
        let data = create_test_pdf(*page_count);

        group.bench_function(format!("{}_pages", page_count), |b| {
            b.iter(|| pdf_outline::parse_bytes(black_box(&data)).unwrap());
        });
    }

    group.finish();
}

/// Benchmark the outline engine on already parsed documents.
fn bench_outline(c: &mut Criterion) {
    let options = DetectionOptions::default();
    let mut group = c.benchmark_group("outline");

    for page_count in [10, 100, 500].iter() {
        let doc = create_layout_document(*page_count);

        group.bench_function(format!("font_profile_{}_pages", page_count), |b| {
            b.iter(|| FontProfile::build(black_box(&doc), &options));
        });

        group.bench_function(format!("assemble_{}_pages", page_count), |b| {
            b.iter(|| assemble(black_box(&doc), &options));
        });
    }

    group.finish();
}

/// Benchmark the end-to-end path from bytes to outline.
fn bench_extract(c: &mut Criterion) {
    let data = create_test_pdf(10);

    c.bench_function("extract_outline_10_pages", |b| {
        b.iter(|| pdf_outline::extract_outline_bytes(black_box(&data)).unwrap());
    });
}

criterion_group!(
    benches,
    bench_header_detection,
    bench_pdf_parsing,
    bench_outline,
    bench_extract,
);
criterion_main!(benches);
