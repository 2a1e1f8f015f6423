// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Print document — an owning page arena over `lopdf::Document`.
//
// On open, inheritable page attributes are copied down onto every page and
// the page tree is flattened to a single root node. From then on pages are
// addressed by 0-based index into `pages`, and the tree is rebuilt from that
// list when the document is saved.

use std::collections::HashSet;
use std::path::Path;

use bleedmark_core::error::{BleedmarkError, Result};
use bleedmark_core::{GradientStops, Rect};
use lopdf::{Dictionary, Document, Object, ObjectId, Stream};
use tracing::{debug, info, instrument, warn};

use crate::geometry::Rotation;

/// Page attributes a page may inherit from its ancestors in the page tree.
const INHERITABLE: [&[u8]; 4] = [b"MediaBox", b"CropBox", b"Resources", b"Rotate"];

/// Guards against cyclic `/Parent` chains in damaged files.
const MAX_TREE_DEPTH: usize = 64;

/// The page boxes this engine reads or writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageBox {
    Media,
    Crop,
    Bleed,
    Trim,
}

impl PageBox {
    pub fn key(self) -> &'static [u8] {
        match self {
            Self::Media => b"MediaBox",
            Self::Crop => b"CropBox",
            Self::Bleed => b"BleedBox",
            Self::Trim => b"TrimBox",
        }
    }
}

/// A form XObject wrapping captured page content.
#[derive(Debug, Clone)]
pub struct EmbeddedForm {
    pub content: Vec<u8>,
    pub bbox: Rect,
    pub resources: Dictionary,
    pub matrix: [f64; 6],
}

/// Mutable, index-addressed view of a PDF's pages.
pub struct PrintDocument {
    inner: Document,
    pages_root: ObjectId,
    pages: Vec<ObjectId>,
    /// Page objects whose content has been wrapped in a 180° turn.
    flipped: HashSet<ObjectId>,
}

impl std::fmt::Debug for PrintDocument {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PrintDocument")
            .field("pages", &self.pages.len())
            .field("flipped", &self.flipped.len())
            .finish()
    }
}

impl PrintDocument {
    // -- Construction ---------------------------------------------------------

    /// Parse a PDF held in memory.
    #[instrument(skip_all, fields(bytes_len = data.len()))]
    pub fn open(data: &[u8]) -> Result<Self> {
        let document = Document::load_mem(data)
            .map_err(|err| BleedmarkError::DocumentOpen(err.to_string()))?;
        let doc = Self::from_lopdf(document)?;
        info!(pages = doc.page_count(), "PDF opened");
        Ok(doc)
    }

    /// Adopt an already-parsed document.
    pub fn from_lopdf(mut inner: Document) -> Result<Self> {
        let pages_root = inner
            .catalog()
            .and_then(|catalog| catalog.get(b"Pages"))
            .and_then(|pages| pages.as_reference())
            .map_err(|err| BleedmarkError::DocumentOpen(format!("no page tree: {err}")))?;
        let pages: Vec<ObjectId> = inner.get_pages().into_values().collect();

        for &page_id in &pages {
            for key in INHERITABLE {
                let present = inner
                    .get_dictionary(page_id)
                    .map(|dict| dict.has(key))
                    .map_err(|err| BleedmarkError::DocumentOpen(err.to_string()))?;
                if present {
                    continue;
                }
                if let Some(value) = inherited_attribute(&inner, page_id, key) {
                    dict_mut(&mut inner, page_id)?.set(key, value);
                }
            }
        }

        let root = dict_mut(&mut inner, pages_root)?;
        for key in INHERITABLE {
            root.remove(key);
        }

        let mut doc = Self {
            inner,
            pages_root,
            pages,
            flipped: HashSet::new(),
        };
        doc.sync_page_tree()?;
        debug!(pages = doc.pages.len(), "page tree flattened");
        Ok(doc)
    }

    // -- Inspection -----------------------------------------------------------

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    fn page_id(&self, index: usize) -> Result<ObjectId> {
        self.pages
            .get(index)
            .copied()
            .ok_or(BleedmarkError::PageOutOfRange {
                index,
                count: self.pages.len(),
            })
    }

    fn page_dict(&self, index: usize) -> Result<&Dictionary> {
        let id = self.page_id(index)?;
        self.inner
            .get_dictionary(id)
            .map_err(|err| malformed(index, err))
    }

    fn page_dict_mut(&mut self, index: usize) -> Result<&mut Dictionary> {
        let id = self.page_id(index)?;
        dict_mut(&mut self.inner, id).map_err(|_| BleedmarkError::MalformedPage {
            page: index,
            detail: "page object is not a dictionary".into(),
        })
    }

    /// Follow a single indirect reference.
    fn resolve<'a>(&'a self, object: &'a Object) -> Option<&'a Object> {
        match object {
            Object::Reference(id) => self.inner.get_object(*id).ok(),
            other => Some(other),
        }
    }

    /// Read a page box. `Ok(None)` when the page does not carry it.
    pub fn page_box(&self, index: usize, kind: PageBox) -> Result<Option<Rect>> {
        let dict = self.page_dict(index)?;
        let Ok(raw) = dict.get(kind.key()) else {
            return Ok(None);
        };
        let values = self
            .resolve(raw)
            .and_then(|obj| obj.as_array().ok())
            .filter(|items| items.len() == 4)
            .and_then(|items| {
                let mut out = [0.0; 4];
                for (slot, item) in out.iter_mut().zip(items) {
                    *slot = self.resolve(item).and_then(as_number)?;
                }
                Some(out)
            })
            .ok_or_else(|| BleedmarkError::MalformedPage {
                page: index,
                detail: format!("{} is not four numbers", String::from_utf8_lossy(kind.key())),
            })?;
        Ok(Some(Rect::from_corners(values)))
    }

    /// The page's MediaBox, which must exist and enclose a positive area.
    pub fn media_box(&self, index: usize) -> Result<Rect> {
        let rect = self
            .page_box(index, PageBox::Media)?
            .ok_or_else(|| BleedmarkError::MalformedPage {
                page: index,
                detail: "no MediaBox".into(),
            })?;
        if rect.width() <= 0.0 || rect.height() <= 0.0 {
            return Err(BleedmarkError::MalformedPage {
                page: index,
                detail: format!("empty MediaBox {:?}", rect.to_array()),
            });
        }
        Ok(rect)
    }

    pub fn set_page_box(&mut self, index: usize, kind: PageBox, rect: Rect) -> Result<()> {
        let array = rect.to_array().iter().map(|v| number_object(*v)).collect();
        self.page_dict_mut(index)?
            .set(kind.key(), Object::Array(array));
        Ok(())
    }

    pub fn clear_page_box(&mut self, index: usize, kind: PageBox) -> Result<()> {
        self.page_dict_mut(index)?.remove(kind.key());
        Ok(())
    }

    /// The page's `/Rotate`. Values that are not a multiple of 90 are
    /// treated as upright.
    pub fn rotation(&self, index: usize) -> Result<Rotation> {
        let dict = self.page_dict(index)?;
        let Ok(raw) = dict.get(b"Rotate") else {
            return Ok(Rotation::Upright);
        };
        let degrees = self.resolve(raw).and_then(as_number);
        match degrees.and_then(|d| Rotation::from_degrees(d.round() as i64)) {
            Some(rotation) => Ok(rotation),
            None => {
                warn!(page = index, ?degrees, "ignoring invalid /Rotate");
                Ok(Rotation::Upright)
            }
        }
    }

    pub fn set_rotation(&mut self, index: usize, rotation: Rotation) -> Result<()> {
        self.page_dict_mut(index)?
            .set("Rotate", Object::Integer(rotation.degrees()));
        Ok(())
    }

    pub fn clear_rotation(&mut self, index: usize) -> Result<()> {
        self.page_dict_mut(index)?.remove(b"Rotate");
        Ok(())
    }

    // -- Content and resources ------------------------------------------------

    /// The page's decoded content. Multiple content streams are joined, each
    /// followed by a newline so operators never run together.
    pub fn content(&self, index: usize) -> Result<Vec<u8>> {
        let dict = self.page_dict(index)?;
        let Ok(raw) = dict.get(b"Contents") else {
            return Ok(Vec::new());
        };

        let parts: Vec<&Object> = match self.resolve(raw) {
            Some(Object::Array(items)) => items.iter().collect(),
            Some(other) => vec![other],
            None => Vec::new(),
        };

        let mut out = Vec::new();
        for part in parts {
            let Some(Object::Stream(stream)) = self.resolve(part) else {
                warn!(page = index, "skipping content entry that is not a stream");
                continue;
            };
            let bytes = if stream.dict.has(b"Filter") {
                stream
                    .decompressed_content()
                    .map_err(|err| BleedmarkError::MalformedPage {
                        page: index,
                        detail: format!("undecodable content stream: {err}"),
                    })?
            } else {
                stream.content.clone()
            };
            out.extend_from_slice(&bytes);
            out.push(b'\n');
        }
        Ok(out)
    }

    /// Replace the page's content with a single new stream.
    pub fn replace_content(&mut self, index: usize, content: Vec<u8>) -> Result<()> {
        self.page_id(index)?;
        let stream_id = self
            .inner
            .add_object(Stream::new(Dictionary::new(), content));
        self.page_dict_mut(index)?
            .set("Contents", Object::Reference(stream_id));
        Ok(())
    }

    /// A copy of the page's resource dictionary; empty when it has none.
    pub fn resources(&self, index: usize) -> Result<Dictionary> {
        let dict = self.page_dict(index)?;
        let Ok(raw) = dict.get(b"Resources") else {
            return Ok(Dictionary::new());
        };
        match self.resolve(raw) {
            Some(Object::Dictionary(resources)) => Ok(resources.clone()),
            _ => {
                warn!(page = index, "page resources are not a dictionary");
                Ok(Dictionary::new())
            }
        }
    }

    pub fn replace_resources(&mut self, index: usize, resources: Dictionary) -> Result<()> {
        self.page_dict_mut(index)?
            .set("Resources", Object::Dictionary(resources));
        Ok(())
    }

    // -- Object creation ------------------------------------------------------

    /// Store a form XObject and return its id.
    pub fn create_form(&mut self, form: EmbeddedForm) -> ObjectId {
        let mut dict = Dictionary::new();
        dict.set("Type", Object::Name(b"XObject".to_vec()));
        dict.set("Subtype", Object::Name(b"Form".to_vec()));
        dict.set("FormType", Object::Integer(1));
        dict.set(
            "BBox",
            Object::Array(form.bbox.to_array().iter().map(|v| number_object(*v)).collect()),
        );
        dict.set(
            "Matrix",
            Object::Array(form.matrix.iter().map(|v| number_object(*v)).collect()),
        );
        dict.set("Resources", Object::Dictionary(form.resources));
        self.inner.add_object(Stream::new(dict, form.content))
    }

    /// Store an axial shading running from `stops.bottom` at y = 0 to
    /// `stops.top` at y = `height`, extended past both ends.
    pub fn create_shading(&mut self, stops: &GradientStops, height: f64) -> ObjectId {
        let rgb = |c: bleedmark_core::Rgb| {
            Object::Array(vec![number_object(c.r), number_object(c.g), number_object(c.b)])
        };

        let mut function = Dictionary::new();
        function.set("FunctionType", Object::Integer(2));
        function.set(
            "Domain",
            Object::Array(vec![Object::Integer(0), Object::Integer(1)]),
        );
        function.set("C0", rgb(stops.bottom));
        function.set("C1", rgb(stops.top));
        function.set("N", Object::Integer(1));
        let function_id = self.inner.add_object(function);

        let mut shading = Dictionary::new();
        shading.set("ShadingType", Object::Integer(2));
        shading.set("ColorSpace", Object::Name(b"DeviceRGB".to_vec()));
        shading.set(
            "Coords",
            Object::Array(vec![
                Object::Integer(0),
                Object::Integer(0),
                Object::Integer(0),
                number_object(height),
            ]),
        );
        shading.set("Function", Object::Reference(function_id));
        shading.set(
            "Extend",
            Object::Array(vec![Object::Boolean(true), Object::Boolean(true)]),
        );
        self.inner.add_object(shading)
    }

    // -- Page list ------------------------------------------------------------

    /// Remove a page from the document. Its objects are dropped on save if
    /// nothing else refers to them.
    pub fn delete_page(&mut self, index: usize) -> Result<()> {
        let id = self.page_id(index)?;
        self.pages.remove(index);
        self.flipped.remove(&id);
        Ok(())
    }

    /// Insert an empty page with the given MediaBox before `index`
    /// (`index == page_count()` appends).
    pub fn insert_page(&mut self, index: usize, media: Rect) -> Result<()> {
        if index > self.pages.len() {
            return Err(BleedmarkError::PageOutOfRange {
                index,
                count: self.pages.len(),
            });
        }
        let content_id = self
            .inner
            .add_object(Stream::new(Dictionary::new(), Vec::new()));

        let mut page = Dictionary::new();
        page.set("Type", Object::Name(b"Page".to_vec()));
        page.set("Parent", Object::Reference(self.pages_root));
        page.set(
            "MediaBox",
            Object::Array(media.to_array().iter().map(|v| number_object(*v)).collect()),
        );
        page.set("Resources", Object::Dictionary(Dictionary::new()));
        page.set("Contents", Object::Reference(content_id));
        let page_id = self.inner.add_object(page);

        self.pages.insert(index, page_id);
        debug!(index, "blank page inserted");
        Ok(())
    }

    // -- Duplex bookkeeping ---------------------------------------------------

    pub fn is_flipped(&self, index: usize) -> Result<bool> {
        Ok(self.flipped.contains(&self.page_id(index)?))
    }

    /// Record that a page has been turned. Fails if it already was.
    pub fn mark_flipped(&mut self, index: usize) -> Result<()> {
        let id = self.page_id(index)?;
        if !self.flipped.insert(id) {
            return Err(BleedmarkError::AlreadyFlipped { page: index });
        }
        Ok(())
    }

    // -- Persistence ----------------------------------------------------------

    /// Point the root page-tree node at the current page list.
    fn sync_page_tree(&mut self) -> Result<()> {
        let kids = self.pages.iter().map(|id| Object::Reference(*id)).collect();
        let count = self.pages.len() as i64;
        let root = dict_mut(&mut self.inner, self.pages_root)?;
        root.set("Kids", Object::Array(kids));
        root.set("Count", Object::Integer(count));

        for index in 0..self.pages.len() {
            let root_id = self.pages_root;
            self.page_dict_mut(index)?
                .set("Parent", Object::Reference(root_id));
        }
        Ok(())
    }

    /// Serialise the document, dropping unreachable objects.
    #[instrument(skip(self), fields(pages = self.pages.len()))]
    pub fn save(mut self) -> Result<Vec<u8>> {
        self.sync_page_tree()?;
        let pruned = self.inner.prune_objects();
        debug!(pruned = pruned.len(), "unreachable objects removed");

        let mut output = Vec::new();
        self.inner
            .save_to(&mut output)
            .map_err(|err| BleedmarkError::DocumentSave(err.to_string()))?;
        info!(output_bytes = output.len(), "PDF serialised");
        Ok(output)
    }

    pub fn save_to_path(self, path: impl AsRef<Path>) -> Result<()> {
        let bytes = self.save()?;
        std::fs::write(path.as_ref(), bytes)?;
        Ok(())
    }
}

// -- Helpers ------------------------------------------------------------------

fn dict_mut(doc: &mut Document, id: ObjectId) -> Result<&mut Dictionary> {
    doc.get_object_mut(id)
        .and_then(|obj| obj.as_dict_mut())
        .map_err(|err| BleedmarkError::DocumentOpen(format!("object {id:?}: {err}")))
}

fn malformed(page: usize, err: lopdf::Error) -> BleedmarkError {
    BleedmarkError::MalformedPage {
        page,
        detail: err.to_string(),
    }
}

/// Walk `/Parent` links until an ancestor carries `key`.
fn inherited_attribute(doc: &Document, page_id: ObjectId, key: &[u8]) -> Option<Object> {
    let mut node = doc.get_dictionary(page_id).ok()?;
    for _ in 0..MAX_TREE_DEPTH {
        let parent = node.get(b"Parent").and_then(|p| p.as_reference()).ok()?;
        node = doc.get_dictionary(parent).ok()?;
        if let Ok(value) = node.get(key) {
            return Some(value.clone());
        }
    }
    None
}

fn as_number(object: &Object) -> Option<f64> {
    match object {
        Object::Integer(value) => Some(*value as f64),
        Object::Real(value) => Some(f64::from(*value)),
        _ => None,
    }
}

/// Integral values are written as integers, everything else as reals.
fn number_object(value: f64) -> Object {
    if value.fract() == 0.0 && value.abs() < i64::MAX as f64 {
        Object::Integer(value as i64)
    } else {
        Object::from(value)
    }
}
