//! Positioned text extraction.
//!
//! Walks each page's content stream tracking the text cursor through
//! BT/ET, Td/TD/Tm/TL/T* and the show operators, emitting one token per
//! shown string. Token widths are estimates from the same metrics the
//! fitting code uses; they are good enough for identifier scanning and
//! anchor discovery, which is all the engine asks of them.
//!
//! Documents whose streams yield no text at all (broken encodings,
//! exotic font programs) fall back to pdf-extract's plain-text pass with
//! synthesized token positions.

use std::fs;
use std::path::Path;

use lopdf::content::Content;
use lopdf::{Document, Object, ObjectId};

use itr_core::layout::text_width;
use itr_core::{BoundingBox, DocumentSource, TextToken};

use crate::error::PdfError;

/// Font size assumed for fallback tokens, which carry no real metrics.
const FALLBACK_FONT_SIZE: f64 = 11.0;
const FALLBACK_MARGIN: f64 = 72.0;

struct PageData {
    tokens: Vec<TextToken>,
    width: f64,
    height: f64,
}

/// A parsed source document with its per-page tokens extracted once.
pub struct PdfDocument {
    doc: Document,
    pages: Vec<PageData>,
}

impl PdfDocument {
    pub fn load(path: &Path) -> Result<Self, PdfError> {
        let bytes = fs::read(path).map_err(|e| PdfError::Parse(format!("{}: {e}", path.display())))?;
        Self::load_mem(&bytes)
    }

    pub fn load_mem(bytes: &[u8]) -> Result<Self, PdfError> {
        let doc = Document::load_mem(bytes).map_err(|e| PdfError::Parse(e.to_string()))?;

        let page_ids: Vec<ObjectId> = doc.get_pages().values().copied().collect();
        let mut pages = Vec::with_capacity(page_ids.len());
        for &page_id in &page_ids {
            let (width, height) = page_size_of(&doc, page_id);
            let tokens = extract_page_tokens(&doc, page_id);
            pages.push(PageData {
                tokens,
                width,
                height,
            });
        }

        if pages.iter().all(|p| p.tokens.is_empty()) && !pages.is_empty() {
            apply_plain_text_fallback(bytes, &mut pages);
        }

        Ok(Self { doc, pages })
    }

    /// Hand the parsed document over for annotation writing.
    pub fn into_document(self) -> Document {
        self.doc
    }
}

impl DocumentSource for PdfDocument {
    fn page_count(&self) -> usize {
        self.pages.len()
    }

    fn page_tokens(&self, page: usize) -> &[TextToken] {
        self.pages.get(page).map(|p| p.tokens.as_slice()).unwrap_or(&[])
    }

    fn page_size(&self, page: usize) -> (f64, f64) {
        self.pages
            .get(page)
            .map(|p| (p.width, p.height))
            .unwrap_or((612.0, 792.0))
    }
}

/// MediaBox of a page, following Parent inheritance. Letter-size when
/// absent or malformed.
fn page_size_of(doc: &Document, page_id: ObjectId) -> (f64, f64) {
    let mut current = page_id;
    for _ in 0..16 {
        let Ok(dict) = doc.get_dictionary(current) else {
            break;
        };
        if let Ok(media_box) = dict.get(b"MediaBox") {
            let resolved = match media_box {
                Object::Reference(id) => doc.get_object(*id).ok(),
                other => Some(other),
            };
            if let Some(Object::Array(values)) = resolved {
                let nums: Vec<f64> = values.iter().filter_map(operand_f64).collect();
                if nums.len() == 4 {
                    return (nums[2] - nums[0], nums[3] - nums[1]);
                }
            }
        }
        match dict.get(b"Parent").and_then(Object::as_reference) {
            Ok(parent) => current = parent,
            Err(_) => break,
        }
    }
    (612.0, 792.0)
}

fn operand_f64(obj: &Object) -> Option<f64> {
    match obj {
        Object::Integer(i) => Some(*i as f64),
        Object::Real(f) => Some(f64::from(*f)),
        _ => None,
    }
}

/// Minimal text-space cursor. Rotation and skew are ignored; forms in
/// this document class are axis-aligned.
struct TextCursor {
    x: f64,
    line_x: f64,
    line_y: f64,
    font_size: f64,
    leading: f64,
    h_scale: f64,
    v_scale: f64,
}

impl TextCursor {
    fn begin_text(&mut self) {
        self.x = 0.0;
        self.line_x = 0.0;
        self.line_y = 0.0;
        self.h_scale = 1.0;
        self.v_scale = 1.0;
    }

    fn next_line(&mut self, tx: f64, ty: f64) {
        self.line_x += tx;
        self.line_y += ty;
        self.x = self.line_x;
    }

    fn set_matrix(&mut self, m: &[f64]) {
        self.h_scale = m[0];
        self.v_scale = m[3];
        self.line_x = m[4];
        self.line_y = m[5];
        self.x = self.line_x;
    }

    fn glyph_size(&self) -> f64 {
        (self.font_size * self.v_scale).abs().max(1.0)
    }
}

fn extract_page_tokens(doc: &Document, page_id: ObjectId) -> Vec<TextToken> {
    let Ok(content) = doc.get_page_content(page_id) else {
        return Vec::new();
    };
    let Ok(operations) = Content::decode(&content) else {
        return Vec::new();
    };

    let mut tokens = Vec::new();
    let mut cursor = TextCursor {
        x: 0.0,
        line_x: 0.0,
        line_y: 0.0,
        font_size: 12.0,
        leading: 0.0,
        h_scale: 1.0,
        v_scale: 1.0,
    };

    for op in &operations.operations {
        let operands = &op.operands;
        match op.operator.as_str() {
            "BT" => cursor.begin_text(),
            "Tf" => {
                if let Some(size) = operands.get(1).and_then(operand_f64) {
                    cursor.font_size = size;
                }
            }
            "Tm" => {
                let m: Vec<f64> = operands.iter().filter_map(operand_f64).collect();
                if m.len() == 6 {
                    cursor.set_matrix(&m);
                }
            }
            "Td" => {
                if let (Some(tx), Some(ty)) = (
                    operands.first().and_then(operand_f64),
                    operands.get(1).and_then(operand_f64),
                ) {
                    cursor.next_line(tx, ty);
                }
            }
            "TD" => {
                if let (Some(tx), Some(ty)) = (
                    operands.first().and_then(operand_f64),
                    operands.get(1).and_then(operand_f64),
                ) {
                    cursor.leading = -ty;
                    cursor.next_line(tx, ty);
                }
            }
            "TL" => {
                if let Some(leading) = operands.first().and_then(operand_f64) {
                    cursor.leading = leading;
                }
            }
            "T*" => cursor.next_line(0.0, -cursor.leading),
            "Tj" => {
                if let Some(text) = operands.first().and_then(decode_string_operand) {
                    emit_token(&mut tokens, &mut cursor, text);
                }
            }
            "'" => {
                cursor.next_line(0.0, -cursor.leading);
                if let Some(text) = operands.first().and_then(decode_string_operand) {
                    emit_token(&mut tokens, &mut cursor, text);
                }
            }
            "\"" => {
                cursor.next_line(0.0, -cursor.leading);
                if let Some(text) = operands.get(2).and_then(decode_string_operand) {
                    emit_token(&mut tokens, &mut cursor, text);
                }
            }
            "TJ" => {
                if let Some(Object::Array(parts)) = operands.first() {
                    let text: String =
                        parts.iter().filter_map(decode_string_operand).collect();
                    if !text.is_empty() {
                        emit_token(&mut tokens, &mut cursor, text);
                    }
                }
            }
            _ => {}
        }
    }

    tokens
}

fn emit_token(tokens: &mut Vec<TextToken>, cursor: &mut TextCursor, text: String) {
    if text.trim().is_empty() {
        return;
    }
    let width = text_width(&text, cursor.font_size) * cursor.h_scale.abs();
    let height = cursor.glyph_size();
    let bounds = BoundingBox::new(cursor.x, cursor.line_y, cursor.x + width, cursor.line_y + height);
    tokens.push(TextToken::new(text, bounds));
    cursor.x += width;
}

/// Decode a shown string: UTF-8, then UTF-16BE with BOM, then Latin-1.
fn decode_string_operand(operand: &Object) -> Option<String> {
    let Object::String(bytes, _) = operand else {
        return None;
    };
    if let Ok(s) = std::str::from_utf8(bytes) {
        return Some(s.to_string());
    }
    if bytes.len() >= 2 && bytes[0] == 0xFE && bytes[1] == 0xFF {
        let units: Vec<u16> = bytes[2..]
            .chunks_exact(2)
            .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
            .collect();
        return Some(String::from_utf16_lossy(&units));
    }
    Some(bytes.iter().map(|&b| b as char).collect())
}

/// Plain-text pass for documents whose streams produced nothing. Lines
/// get synthetic top-down positions; good enough for splitting and
/// identifier extraction, which only need text and page membership.
fn apply_plain_text_fallback(bytes: &[u8], pages: &mut [PageData]) {
    let extracted = match pdf_extract::extract_text_from_mem_by_pages(bytes) {
        Ok(extracted) => extracted,
        Err(error) => {
            tracing::debug!(%error, "plain-text fallback failed; document has no tokens");
            return;
        }
    };

    tracing::info!("content streams yielded no text; using plain-text fallback");
    for (page, text) in pages.iter_mut().zip(extracted) {
        let top = page.height - FALLBACK_MARGIN;
        page.tokens = text
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .enumerate()
            .map(|(i, line)| {
                let y = top - i as f64 * FALLBACK_FONT_SIZE * 1.2;
                TextToken::new(
                    line,
                    BoundingBox::new(
                        FALLBACK_MARGIN,
                        y,
                        FALLBACK_MARGIN + text_width(line, FALLBACK_FONT_SIZE),
                        y + FALLBACK_FONT_SIZE,
                    ),
                )
            })
            .collect();
    }
}
