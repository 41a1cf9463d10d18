//! Annotation writing over lopdf.
//!
//! Every drawn object is a page annotation carrying a stable /NM name.
//! Drawing under a name that already exists replaces the old annotation,
//! so re-running a fill or NA pass redraws instead of stacking
//! duplicates and a double commit saves byte-identical annotation
//! content.

use std::path::Path;

use lopdf::{Dictionary, Document, Object, ObjectId};

use itr_core::{AnnotationSink, BoundingBox, RegionClass};

use crate::error::PdfError;
use crate::text::PdfDocument;

/// Calibration outline colors by region class (RGB, 0-1).
fn class_color(class: RegionClass) -> [f32; 3] {
    match class {
        RegionClass::Boundary => [1.0, 0.0, 0.0],
        RegionClass::Field => [0.0, 0.0, 1.0],
        RegionClass::CheckTarget => [0.0, 0.6, 0.0],
    }
}

/// Writes value text, calibration outlines and check glyphs into a
/// parsed document, then saves an annotated copy.
pub struct PdfAnnotator {
    doc: Document,
    page_ids: Vec<ObjectId>,
}

impl PdfAnnotator {
    pub fn new(doc: Document) -> Self {
        let page_ids = doc.get_pages().values().copied().collect();
        Self { doc, page_ids }
    }

    /// Annotate the document that tokens were extracted from.
    pub fn from_source(source: PdfDocument) -> Self {
        Self::new(source.into_document())
    }

    /// Write the annotated copy. The source file is never touched.
    pub fn save_copy(&mut self, path: &Path) -> Result<(), PdfError> {
        self.doc
            .save(path)
            .map(|_| ())
            .map_err(|e| PdfError::Save(format!("{}: {e}", path.display())))
    }

    pub fn into_document(self) -> Document {
        self.doc
    }

    /// Remove any annotation named `name` on the page, then append the
    /// new one. Keeps the Annots array direct in the page dictionary.
    fn upsert_annotation(&mut self, page: usize, name: &str, annotation: Dictionary) {
        let Some(&page_id) = self.page_ids.get(page) else {
            tracing::warn!(page, "annotation target page out of range");
            return;
        };

        let existing = self.collect_annots(page_id);
        let (replaced, mut kept): (Vec<Object>, Vec<Object>) = existing
            .into_iter()
            .partition(|entry| self.annotation_has_name(entry, name));
        // Drop replaced annotation objects entirely so re-runs redraw
        // instead of accumulating orphans.
        for entry in replaced {
            if let Object::Reference(id) = entry {
                self.doc.objects.remove(&id);
            }
        }

        let annot_id = self.doc.add_object(Object::Dictionary(annotation));
        kept.push(Object::Reference(annot_id));

        if let Ok(Object::Dictionary(page_dict)) = self.doc.get_object_mut(page_id) {
            page_dict.set("Annots", Object::Array(kept));
        }
    }

    /// Current Annots entries of a page, resolving an indirect array.
    fn collect_annots(&self, page_id: ObjectId) -> Vec<Object> {
        let Ok(page_dict) = self.doc.get_dictionary(page_id) else {
            return Vec::new();
        };
        match page_dict.get(b"Annots") {
            Ok(Object::Array(entries)) => entries.clone(),
            Ok(Object::Reference(id)) => match self.doc.get_object(*id) {
                Ok(Object::Array(entries)) => entries.clone(),
                _ => Vec::new(),
            },
            _ => Vec::new(),
        }
    }

    fn annotation_has_name(&self, entry: &Object, name: &str) -> bool {
        let dict = match entry {
            Object::Reference(id) => match self.doc.get_object(*id) {
                Ok(Object::Dictionary(dict)) => dict,
                _ => return false,
            },
            Object::Dictionary(dict) => dict,
            _ => return false,
        };
        match dict.get(b"NM") {
            Ok(Object::String(bytes, _)) => bytes.as_slice() == name.as_bytes(),
            _ => false,
        }
    }
}

fn rect_object(bounds: &BoundingBox) -> Object {
    Object::Array(vec![
        Object::Real(bounds.x0 as f32),
        Object::Real(bounds.y0 as f32),
        Object::Real(bounds.x1 as f32),
        Object::Real(bounds.y1 as f32),
    ])
}

fn base_annotation(subtype: &[u8], bounds: &BoundingBox, name: &str) -> Dictionary {
    let mut annot = Dictionary::new();
    annot.set("Type", Object::Name(b"Annot".to_vec()));
    annot.set("Subtype", Object::Name(subtype.to_vec()));
    annot.set("Rect", rect_object(bounds));
    annot.set(
        "NM",
        Object::String(name.as_bytes().to_vec(), lopdf::StringFormat::Literal),
    );
    // Print flag so the annotation survives into hardcopy.
    annot.set("F", Object::Integer(4));
    annot
}

impl AnnotationSink for PdfAnnotator {
    fn draw_text(
        &mut self,
        page: usize,
        bounds: BoundingBox,
        lines: &[String],
        font_size: f64,
        name: &str,
    ) {
        let mut annot = base_annotation(b"FreeText", &bounds, name);
        annot.set(
            "Contents",
            Object::String(lines.join("\n").into_bytes(), lopdf::StringFormat::Literal),
        );
        let da = format!("/Helv {font_size} Tf 0 0 0 rg");
        annot.set(
            "DA",
            Object::String(da.into_bytes(), lopdf::StringFormat::Literal),
        );
        // No visible frame around the value.
        let mut bs = Dictionary::new();
        bs.set("W", Object::Integer(0));
        annot.set("BS", Object::Dictionary(bs));

        self.upsert_annotation(page, name, annot);
    }

    fn draw_outline(&mut self, page: usize, bounds: BoundingBox, class: RegionClass, name: &str) {
        let mut annot = base_annotation(b"Square", &bounds, name);
        let [r, g, b] = class_color(class);
        annot.set(
            "C",
            Object::Array(vec![Object::Real(r), Object::Real(g), Object::Real(b)]),
        );
        let mut bs = Dictionary::new();
        bs.set("W", Object::Integer(1));
        annot.set("BS", Object::Dictionary(bs));

        self.upsert_annotation(page, name, annot);
    }

    fn draw_check(&mut self, page: usize, bounds: BoundingBox, glyph_size: f64, name: &str) {
        let mut annot = base_annotation(b"FreeText", &bounds, name);
        // ZapfDingbats "4" is the standard checkmark glyph.
        annot.set(
            "Contents",
            Object::String(b"4".to_vec(), lopdf::StringFormat::Literal),
        );
        let da = format!("/ZaDb {glyph_size} Tf 0 0 0 rg");
        annot.set(
            "DA",
            Object::String(da.into_bytes(), lopdf::StringFormat::Literal),
        );
        // Centered quadding puts the glyph mid-box.
        annot.set("Q", Object::Integer(1));
        let mut bs = Dictionary::new();
        bs.set("W", Object::Integer(0));
        annot.set("BS", Object::Dictionary(bs));

        self.upsert_annotation(page, name, annot);
    }
}
