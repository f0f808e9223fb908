//! In-memory PDF builder shared by the integration tests.

#![allow(dead_code)]

use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, ObjectId, Stream, StringFormat};

/// Regular body font resource name.
pub const REGULAR: &str = "F1";
/// Bold font resource name.
pub const BOLD: &str = "F2";

/// One `Tj` text run placed with an absolute text matrix.
#[derive(Debug, Clone)]
pub struct Run {
    pub font: &'static str,
    pub size: f32,
    pub x: f32,
    pub y: f32,
    pub text: String,
}

impl Run {
    pub fn regular(size: f32, x: f32, y: f32, text: &str) -> Self {
        Self {
            font: REGULAR,
            size,
            x,
            y,
            text: text.to_string(),
        }
    }

    pub fn bold(size: f32, x: f32, y: f32, text: &str) -> Self {
        Self {
            font: BOLD,
            ..Self::regular(size, x, y, text)
        }
    }
}

/// Where an outline item points.
#[derive(Debug, Clone)]
pub enum Target {
    /// Explicit `[page /Fit]` destination (0-based page index)
    Page(usize),
    /// String destination looked up in the `/Names` tree
    Named(&'static str, usize),
    /// Name destination looked up in the catalog `/Dests` dictionary
    LegacyNamed(&'static str, usize),
    /// GoTo action with an explicit destination
    GoTo(usize),
    /// No destination at all
    Nowhere,
}

#[derive(Debug, Clone)]
pub struct Bookmark {
    pub title: &'static str,
    pub target: Target,
    pub children: Vec<Bookmark>,
}

impl Bookmark {
    pub fn new(title: &'static str, target: Target) -> Self {
        Self {
            title,
            target,
            children: Vec::new(),
        }
    }

    pub fn with_children(mut self, children: Vec<Bookmark>) -> Self {
        self.children = children;
        self
    }
}

pub struct TestPdf {
    doc: Document,
    pages_id: ObjectId,
    page_ids: Vec<ObjectId>,
    info: Option<ObjectId>,
    outline_root: Option<ObjectId>,
    bookmark_ids: Vec<ObjectId>,
    named: Vec<(&'static str, usize)>,
    legacy_named: Vec<(&'static str, usize)>,
}

impl TestPdf {
    pub fn new() -> Self {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        Self {
            doc,
            pages_id,
            page_ids: Vec::new(),
            info: None,
            outline_root: None,
            bookmark_ids: Vec::new(),
            named: Vec::new(),
            legacy_named: Vec::new(),
        }
    }

    /// Add a page inheriting the US Letter media box of the page tree.
    pub fn page(&mut self, runs: &[Run]) -> &mut Self {
        self.add_page(runs, None);
        self
    }

    /// Add a page with its own media box.
    pub fn page_with_media_box(&mut self, runs: &[Run], media_box: [f32; 4]) -> &mut Self {
        self.add_page(runs, Some(media_box));
        self
    }

    fn add_page(&mut self, runs: &[Run], media_box: Option<[f32; 4]>) {
        let mut operations = Vec::new();
        for run in runs {
            operations.push(Operation::new("BT", vec![]));
            operations.push(Operation::new(
                "Tf",
                vec![run.font.into(), run.size.into()],
            ));
            operations.push(Operation::new(
                "Tm",
                vec![
                    1.into(),
                    0.into(),
                    0.into(),
                    1.into(),
                    run.x.into(),
                    run.y.into(),
                ],
            ));
            operations.push(Operation::new(
                "Tj",
                vec![Object::string_literal(run.text.as_str())],
            ));
            operations.push(Operation::new("ET", vec![]));
        }
        let content = Content { operations }
            .encode()
            .expect("content stream encodes");
        let content_id = self
            .doc
            .add_object(Stream::new(dictionary! {}, content));

        let mut page = dictionary! {
            "Type" => "Page",
            "Parent" => self.pages_id,
            "Contents" => content_id,
        };
        if let Some(b) = media_box {
            page.set(
                "MediaBox",
                vec![b[0].into(), b[1].into(), b[2].into(), b[3].into()],
            );
        }
        let page_id = self.doc.add_object(page);
        self.page_ids.push(page_id);
    }

    pub fn title(&mut self, title: &str) -> &mut Self {
        self.info_entry("Title", Object::string_literal(title))
    }

    pub fn info_entry(&mut self, key: &str, value: Object) -> &mut Self {
        let info_id = match self.info {
            Some(id) => id,
            None => {
                let id = self.doc.add_object(dictionary! {});
                self.info = Some(id);
                id
            }
        };
        if let Ok(Object::Dictionary(dict)) = self.doc.get_object_mut(info_id) {
            dict.set(key, value);
        }
        self
    }

    /// Build the `/Outlines` tree. Pages must be added first.
    pub fn bookmarks(&mut self, items: &[Bookmark]) -> &mut Self {
        let root = self.doc.new_object_id();
        let mut dict = dictionary! { "Type" => "Outlines" };
        if let Some((first, last)) = self.build_items(items, root) {
            dict.set("First", first);
            dict.set("Last", last);
            dict.set("Count", items.len() as i64);
        }
        self.doc.objects.insert(root, Object::Dictionary(dict));
        self.outline_root = Some(root);
        self
    }

    /// Object ids of the outline items, depth-first.
    pub fn bookmark_ids(&self) -> &[ObjectId] {
        &self.bookmark_ids
    }

    pub fn document_mut(&mut self) -> &mut Document {
        &mut self.doc
    }

    fn build_items(&mut self, items: &[Bookmark], parent: ObjectId) -> Option<(ObjectId, ObjectId)> {
        if items.is_empty() {
            return None;
        }
        let ids: Vec<ObjectId> = items.iter().map(|_| self.doc.new_object_id()).collect();

        for (i, item) in items.iter().enumerate() {
            self.bookmark_ids.push(ids[i]);
            let mut dict = dictionary! {
                "Title" => Object::string_literal(item.title),
                "Parent" => parent,
            };
            if i > 0 {
                dict.set("Prev", ids[i - 1]);
            }
            if i + 1 < ids.len() {
                dict.set("Next", ids[i + 1]);
            }
            if let Some((first, last)) = self.build_items(&item.children, ids[i]) {
                dict.set("First", first);
                dict.set("Last", last);
                dict.set("Count", item.children.len() as i64);
            }

            match item.target {
                Target::Page(p) => dict.set("Dest", self.fit_destination(p)),
                Target::Named(name, p) => {
                    dict.set("Dest", Object::string_literal(name));
                    self.named.push((name, p));
                }
                Target::LegacyNamed(name, p) => {
                    dict.set("Dest", Object::Name(name.as_bytes().to_vec()));
                    self.legacy_named.push((name, p));
                }
                Target::GoTo(p) => dict.set(
                    "A",
                    dictionary! {
                        "S" => "GoTo",
                        "D" => self.fit_destination(p),
                    },
                ),
                Target::Nowhere => {}
            }

            self.doc.objects.insert(ids[i], Object::Dictionary(dict));
        }

        Some((ids[0], ids[ids.len() - 1]))
    }

    fn fit_destination(&self, page: usize) -> Object {
        Object::Array(vec![Object::Reference(self.page_ids[page]), "Fit".into()])
    }

    /// Finish the document and serialize it.
    pub fn to_bytes(&mut self) -> Vec<u8> {
        let fonts = dictionary! {
            REGULAR => dictionary! {
                "Type" => "Font",
                "Subtype" => "Type1",
                "BaseFont" => "Helvetica",
                "Encoding" => "WinAnsiEncoding",
            },
            BOLD => dictionary! {
                "Type" => "Font",
                "Subtype" => "Type1",
                "BaseFont" => "Helvetica-Bold",
                "Encoding" => "WinAnsiEncoding",
            },
        };
        let kids: Vec<Object> = self.page_ids.iter().map(|&id| id.into()).collect();
        let pages = dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => self.page_ids.len() as i64,
            "Resources" => dictionary! { "Font" => fonts },
            "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
        };
        self.doc
            .objects
            .insert(self.pages_id, Object::Dictionary(pages));

        let mut catalog = dictionary! {
            "Type" => "Catalog",
            "Pages" => self.pages_id,
        };
        if let Some(root) = self.outline_root {
            catalog.set("Outlines", root);
        }
        if !self.named.is_empty() {
            let mut named = self.named.clone();
            named.sort_by(|a, b| a.0.cmp(b.0));
            let mut pairs = Vec::new();
            for (name, page) in named {
                pairs.push(Object::String(
                    name.as_bytes().to_vec(),
                    StringFormat::Literal,
                ));
                pairs.push(self.fit_destination(page));
            }
            // one intermediate node so lookups go through /Kids
            let leaf = self.doc.add_object(dictionary! { "Names" => pairs });
            catalog.set(
                "Names",
                dictionary! {
                    "Dests" => dictionary! { "Kids" => vec![Object::Reference(leaf)] },
                },
            );
        }
        if !self.legacy_named.is_empty() {
            let mut dests = dictionary! {};
            for (name, page) in self.legacy_named.clone() {
                dests.set(name, self.fit_destination(page));
            }
            catalog.set("Dests", dests);
        }
        let catalog_id = self.doc.add_object(catalog);

        self.doc.trailer.set("Root", catalog_id);
        if let Some(info) = self.info {
            self.doc.trailer.set("Info", info);
        }

        let mut bytes = Vec::new();
        self.doc.save_to(&mut bytes).expect("document saves");
        bytes
    }
}

/// A body paragraph line of regular 11pt text.
pub fn body(y: f32) -> Run {
    Run::regular(11.0, 72.0, y, "the quick brown fox jumps over the lazy dog")
}

/// A page with a bold 16pt heading, a bold 14pt subheading and six body
/// lines.
pub fn section_page(heading: &str, subheading: &str) -> Vec<Run> {
    let mut runs = vec![
        Run::bold(16.0, 72.0, 720.0, heading),
        Run::bold(14.0, 72.0, 690.0, subheading),
    ];
    runs.extend((0..6).map(|i| body(660.0 - 15.0 * i as f32)));
    runs
}

/// Five section pages behind a cover page titled "Project Overview".
pub fn report() -> TestPdf {
    let mut pdf = TestPdf::new();
    let mut cover = vec![Run::bold(24.0, 72.0, 700.0, "Project Overview")];
    cover.extend((0..8).map(|i| body(650.0 - 15.0 * i as f32)));
    pdf.page(&cover);
    for (heading, subheading) in SECTIONS {
        pdf.page(&section_page(heading, subheading));
    }
    pdf
}

pub const SECTIONS: [(&str, &str); 5] = [
    ("1. Introduction", "1.1 Scope"),
    ("2. Methods", "2.1 Sampling"),
    ("3. Results", "3.1 Measurements"),
    ("4. Discussion", "4.1 Limitations"),
    ("5. Conclusion", "5.1 Future Work"),
];
