// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// bleedmark-document — Page recomposition engine for Bleedmark.
//
// Fits arbitrary PDF pages into a fixed trim/bleed layout with crop marks,
// background fill, and optional duplex flipping, then verifies the persisted
// page boxes. Also hosts the job workspace and preview helpers built on top.

pub mod assemble;
pub mod background;
pub mod compose;
pub mod geometry;
pub mod job;
pub mod marks;
pub mod pdf;
pub mod preview;
pub mod verify;

// Re-export the entry points so callers can use `bleedmark_document::process_bytes` etc.
pub use assemble::{ProcessOutcome, ProcessedDocument, process, process_bytes, process_job};
pub use compose::{compose_page, flip_composed_page, synthesize_blank};
pub use job::JobWorkspace;
pub use pdf::PrintDocument;
pub use preview::{PageInfo, Rasterizer, flipbook_document, inspect_pages, render_flipbook};
pub use verify::verify_document;

/// In-memory PDF fixtures for unit tests.
#[cfg(test)]
pub(crate) mod test_support {
    use lopdf::{Dictionary, Document, Object, ObjectId, Stream, dictionary};

    #[derive(Debug, Clone)]
    pub(crate) struct FixturePage {
        width: f64,
        height: f64,
        origin: (f64, f64),
        rotate: Option<i64>,
        crop: Option<[f64; 4]>,
        content: String,
    }

    impl FixturePage {
        pub(crate) fn new(width: f64, height: f64) -> Self {
            Self {
                width,
                height,
                origin: (0.0, 0.0),
                rotate: None,
                crop: None,
                content: String::new(),
            }
        }

        /// Move the MediaBox's lower-left corner away from (0, 0).
        pub(crate) fn origin(mut self, x: f64, y: f64) -> Self {
            self.origin = (x, y);
            self
        }

        pub(crate) fn rotate(mut self, degrees: i64) -> Self {
            self.rotate = Some(degrees);
            self
        }

        pub(crate) fn crop(mut self, x0: f64, y0: f64, x1: f64, y1: f64) -> Self {
            self.crop = Some([x0, y0, x1, y1]);
            self
        }

        pub(crate) fn content(mut self, content: &str) -> Self {
            self.content = content.to_owned();
            self
        }
    }

    fn rect(values: [f64; 4]) -> Object {
        Object::Array(values.iter().map(|v| Object::from(*v)).collect())
    }

    fn content_stream(doc: &mut Document, content: &str) -> ObjectId {
        doc.add_object(Stream::new(Dictionary::new(), content.as_bytes().to_vec()))
    }

    fn finish(mut doc: Document, pages_id: ObjectId, pages: Dictionary) -> Vec<u8> {
        doc.objects.insert(pages_id, Object::Dictionary(pages));
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);

        let mut bytes = Vec::new();
        doc.save_to(&mut bytes).expect("fixture serialises");
        bytes
    }

    /// A flat single-level document with one page per fixture.
    pub(crate) fn fixture_pdf(pages: &[FixturePage]) -> Vec<u8> {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();

        let mut kids = Vec::with_capacity(pages.len());
        for page in pages {
            let content_id = content_stream(&mut doc, &page.content);
            let (x0, y0) = page.origin;
            let mut dict = dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "MediaBox" => rect([x0, y0, x0 + page.width, y0 + page.height]),
                "Resources" => Dictionary::new(),
                "Contents" => content_id,
            };
            if let Some(degrees) = page.rotate {
                dict.set("Rotate", Object::Integer(degrees));
            }
            if let Some(crop) = page.crop {
                dict.set("CropBox", rect(crop));
            }
            kids.push(Object::Reference(doc.add_object(dict)));
        }

        let count = kids.len() as i64;
        finish(
            doc,
            pages_id,
            dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => count,
            },
        )
    }

    /// Three pages under a two-level tree; MediaBox, Rotate, and Resources
    /// are only present on the root node.
    pub(crate) fn nested_tree_pdf() -> Vec<u8> {
        let mut doc = Document::with_version("1.5");
        let root_id = doc.new_object_id();
        let middle_id = doc.new_object_id();

        let leaf = |doc: &mut Document, parent: ObjectId| {
            let content_id = content_stream(doc, "0 0 1 rg");
            Object::Reference(doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => parent,
                "Contents" => content_id,
            }))
        };

        let first = leaf(&mut doc, middle_id);
        let second = leaf(&mut doc, middle_id);
        let third = leaf(&mut doc, root_id);

        doc.objects.insert(
            middle_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Parent" => root_id,
                "Kids" => vec![first, second],
                "Count" => 2i64,
            }),
        );

        finish(
            doc,
            root_id,
            dictionary! {
                "Type" => "Pages",
                "Kids" => vec![Object::Reference(middle_id), third],
                "Count" => 3i64,
                "MediaBox" => rect([0.0, 0.0, 720.0, 405.0]),
                "Rotate" => 180i64,
                "Resources" => dictionary! { "Font" => Dictionary::new() },
            },
        )
    }
}
