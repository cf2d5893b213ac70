//! Regions from a page's embedded text layer.
//!
//! Many "scanned" scores went through an OCR step at scan time, and
//! born-digital scores carry real text. When no OCR engine is configured, or it
//! fails, the text operators of page 1 yield the same kind of evidence: lines of
//! text with a page-relative box. Confidence is 1.0 since the text is exact.

use std::collections::BTreeMap;

use lopdf::{Dictionary, Document as LopdfDocument, Object, ObjectId};

use super::document::{decode_text_bytes, number, PdfDocument};
use crate::error::{Error, Result};
use crate::model::{BoundingBox, OcrRegion, PageGeometry};

/// Rough advance width of one glyph, as a fraction of the font size.
const GLYPH_ADVANCE: f32 = 0.5;

/// TJ adjustments beyond this (thousandths of an em) read as word spaces.
const TJ_SPACE_THRESHOLD: f32 = 200.0;

/// A positioned run of text from a single show-text operator.
#[derive(Debug, Clone)]
struct TextSpan {
    text: String,
    x: f32,
    y: f32,
    font_size: f32,
}

impl TextSpan {
    fn width(&self) -> f32 {
        self.text.chars().count() as f32 * self.font_size * GLYPH_ADVANCE
    }
}

/// Extract line regions from page 1.
pub fn text_layer_regions(document: &PdfDocument) -> Result<Vec<OcrRegion>> {
    let page_id = document.first_page()?;
    let geometry = document.page_geometry(page_id);
    let (x0, y0) = document.media_box_origin(page_id);

    let mut spans = extract_page_spans(document.raw_doc(), page_id)?;
    for span in &mut spans {
        span.x -= x0;
        span.y -= y0;
    }
    let lines = group_spans_into_lines(spans);

    Ok(lines
        .into_iter()
        .filter_map(|line| line_to_region(&line, &geometry))
        .collect())
}

fn extract_page_spans(doc: &LopdfDocument, page_id: ObjectId) -> Result<Vec<TextSpan>> {
    let fonts = doc
        .get_page_fonts(page_id)
        .map_err(|e| Error::PdfParse(e.to_string()))?;
    let content = page_content(doc, page_id)?;
    parse_content_stream(doc, &content, &fonts)
}

fn page_content(doc: &LopdfDocument, page_id: ObjectId) -> Result<Vec<u8>> {
    let page_dict = doc
        .get_dictionary(page_id)
        .map_err(|e| Error::PdfParse(e.to_string()))?;

    let contents = page_dict
        .get(b"Contents")
        .map_err(|e| Error::PdfParse(e.to_string()))?;

    match contents {
        Object::Reference(r) => match doc.get_object(*r) {
            Ok(Object::Stream(s)) => s
                .decompressed_content()
                .or_else(|_| Ok(s.content.clone())),
            Ok(Object::Array(arr)) => Ok(concat_streams(doc, arr)),
            _ => Err(Error::PdfParse("Invalid content stream".to_string())),
        },
        Object::Array(arr) => Ok(concat_streams(doc, arr)),
        _ => Err(Error::PdfParse("Invalid content stream".to_string())),
    }
}

fn concat_streams(doc: &LopdfDocument, refs: &[Object]) -> Vec<u8> {
    let mut content = Vec::new();
    for obj in refs {
        if let Object::Reference(r) = obj {
            if let Ok(Object::Stream(s)) = doc.get_object(*r) {
                let data = s.decompressed_content().unwrap_or_else(|_| s.content.clone());
                content.extend_from_slice(&data);
                content.push(b' ');
            }
        }
    }
    content
}

fn parse_content_stream(
    doc: &LopdfDocument,
    content: &[u8],
    fonts: &BTreeMap<Vec<u8>, &Dictionary>,
) -> Result<Vec<TextSpan>> {
    let content =
        lopdf::content::Content::decode(content).map_err(|e| Error::PdfParse(e.to_string()))?;

    let mut spans = Vec::new();
    let mut font_name: Vec<u8> = Vec::new();
    let mut font_size: f32 = 12.0;
    let mut text = TextState::default();
    let mut ctm = Matrix::IDENTITY;
    let mut saved: Vec<Matrix> = Vec::new();
    let mut in_text = false;

    let decode = |font: &[u8], bytes: &[u8]| -> String {
        fonts
            .get(font)
            .and_then(|f| f.get_font_encoding(doc).ok())
            .and_then(|enc| LopdfDocument::decode_text(&enc, bytes).ok())
            .unwrap_or_else(|| decode_text_bytes(bytes))
    };

    for op in content.operations {
        let operands = &op.operands;
        match op.operator.as_str() {
            "q" => saved.push(ctm),
            "Q" => {
                if let Some(previous) = saved.pop() {
                    ctm = previous;
                }
            }
            "cm" => {
                if let Some(m) = Matrix::from_operands(operands) {
                    ctm = m.then(&ctm);
                }
            }
            "BT" => {
                in_text = true;
                text.begin();
            }
            "ET" => in_text = false,
            "Tf" if operands.len() >= 2 => {
                if let Object::Name(name) = &operands[0] {
                    font_name = name.clone();
                }
                font_size = number(&operands[1]).unwrap_or(12.0);
            }
            "TL" => {
                if let Some(leading) = operands.first().and_then(number) {
                    text.leading = leading;
                }
            }
            "Td" | "TD" if operands.len() >= 2 => {
                let tx = number(&operands[0]).unwrap_or(0.0);
                let ty = number(&operands[1]).unwrap_or(0.0);
                if op.operator == "TD" {
                    text.leading = -ty;
                }
                text.translate(tx, ty);
            }
            "Tm" => {
                if let Some(m) = Matrix::from_operands(operands) {
                    text.set(m);
                }
            }
            "T*" => text.next_line(),
            "Tj" | "'" | "\"" | "TJ" if in_text => {
                if op.operator == "'" || op.operator == "\"" {
                    text.next_line();
                }
                let shown = match op.operator.as_str() {
                    "TJ" => match operands.first() {
                        Some(Object::Array(items)) => show_array(items, &font_name, &decode),
                        _ => String::new(),
                    },
                    "\"" => match operands.get(2) {
                        Some(Object::String(bytes, _)) => decode(&font_name, bytes),
                        _ => String::new(),
                    },
                    _ => match operands.first() {
                        Some(Object::String(bytes, _)) => decode(&font_name, bytes),
                        _ => String::new(),
                    },
                };

                if !shown.trim().is_empty() {
                    // Text space to device space
                    let rendering = text.matrix.then(&ctm);
                    spans.push(TextSpan {
                        text: shown,
                        x: rendering.e,
                        y: rendering.f,
                        font_size: (font_size * rendering.vertical_scale()).abs(),
                    });
                }
            }
            _ => {}
        }
    }

    Ok(spans)
}

fn show_array<F>(items: &[Object], font: &[u8], decode: &F) -> String
where
    F: Fn(&[u8], &[u8]) -> String,
{
    let mut combined = String::new();
    for item in items {
        match item {
            Object::String(bytes, _) => combined.push_str(&decode(font, bytes)),
            other => {
                let adjustment = -number(other).unwrap_or(0.0);
                if adjustment > TJ_SPACE_THRESHOLD
                    && !combined.is_empty()
                    && !combined.ends_with(' ')
                    && !combined.chars().last().is_some_and(is_spaceless_script_char)
                {
                    combined.push(' ');
                }
            }
        }
    }
    combined
}

/// Group spans into lines by baseline, top of page first.
fn group_spans_into_lines(mut spans: Vec<TextSpan>) -> Vec<Vec<TextSpan>> {
    spans.sort_by(|a, b| {
        b.y.partial_cmp(&a.y)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then(a.x.partial_cmp(&b.x).unwrap_or(std::cmp::Ordering::Equal))
    });

    let mut lines: Vec<Vec<TextSpan>> = Vec::new();
    let mut current: Vec<TextSpan> = Vec::new();
    let mut current_y: Option<f32> = None;

    for span in spans {
        let tolerance = span.font_size * 0.3;
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
        line.sort_by(|a, b| a.x.partial_cmp(&b.x).unwrap_or(std::cmp::Ordering::Equal));
    }

    lines
}

fn line_text(spans: &[TextSpan]) -> String {
    let mut result = String::new();
    for (i, span) in spans.iter().enumerate() {
        if i > 0 {
            let prev = &spans[i - 1];
            let gap = span.x - (prev.x + prev.width());
            let needs_space = gap > prev.font_size * 0.15
                && !result.ends_with(' ')
                && !span.text.starts_with(' ');
            let spaceless = result.chars().last().is_some_and(is_spaceless_script_char)
                && span.text.chars().next().is_some_and(is_spaceless_script_char);
            if needs_space && !spaceless {
                result.push(' ');
            }
        }
        result.push_str(&span.text);
    }
    result
}

fn line_to_region(spans: &[TextSpan], geometry: &PageGeometry) -> Option<OcrRegion> {
    if spans.is_empty() || geometry.width <= 0.0 || geometry.height <= 0.0 {
        return None;
    }

    let left = spans.iter().map(|s| s.x).fold(f32::INFINITY, f32::min);
    let right = spans
        .iter()
        .map(|s| s.x + s.width())
        .fold(f32::NEG_INFINITY, f32::max);
    let size = spans.iter().map(|s| s.font_size).fold(0.0, f32::max);
    let baseline = spans.iter().map(|s| s.y).fold(f32::INFINITY, f32::min);
    // Descender below the baseline, ascender above
    let bottom = baseline - size * 0.2;

    let bbox = BoundingBox::new(
        left / geometry.width,
        bottom / geometry.height,
        (right - left) / geometry.width,
        size / geometry.height,
    )
    .clamped();

    Some(OcrRegion::new(line_text(spans), bbox, 1.0))
}

/// A PDF affine matrix `[a b c d e f]`, points as row vectors.
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

    fn from_operands(operands: &[Object]) -> Option<Self> {
        if operands.len() < 6 {
            return None;
        }
        let v: Vec<f32> = operands.iter().take(6).map(|o| number(o).unwrap_or(0.0)).collect();
        Some(Self {
            a: v[0],
            b: v[1],
            c: v[2],
            d: v[3],
            e: v[4],
            f: v[5],
        })
    }

    fn translation(tx: f32, ty: f32) -> Self {
        Self {
            e: tx,
            f: ty,
            ..Self::IDENTITY
        }
    }

    /// `self` applied first, then `next`.
    fn then(&self, next: &Matrix) -> Matrix {
        Matrix {
            a: self.a * next.a + self.b * next.c,
            b: self.a * next.b + self.b * next.d,
            c: self.c * next.a + self.d * next.c,
            d: self.c * next.b + self.d * next.d,
            e: self.e * next.a + self.f * next.c + next.e,
            f: self.e * next.b + self.f * next.d + next.f,
        }
    }

    fn vertical_scale(&self) -> f32 {
        (self.b * self.b + self.d * self.d).sqrt()
    }
}

/// Text and line matrices of the current text object.
#[derive(Debug, Clone)]
struct TextState {
    matrix: Matrix,
    line: Matrix,
    leading: f32,
}

impl Default for TextState {
    fn default() -> Self {
        Self {
            matrix: Matrix::IDENTITY,
            line: Matrix::IDENTITY,
            leading: 0.0,
        }
    }
}

impl TextState {
    /// BT resets both matrices; leading persists.
    fn begin(&mut self) {
        self.matrix = Matrix::IDENTITY;
        self.line = Matrix::IDENTITY;
    }

    fn set(&mut self, m: Matrix) {
        self.matrix = m;
        self.line = m;
    }

    /// Td moves relative to the start of the current line.
    fn translate(&mut self, tx: f32, ty: f32) {
        self.line = Matrix::translation(tx, ty).then(&self.line);
        self.matrix = self.line;
    }

    fn next_line(&mut self) {
        let leading = if self.leading == 0.0 { 12.0 } else { self.leading };
        self.translate(0.0, -leading);
    }
}

/// Scripts that do not separate words with spaces. Hangul is not one of them.
fn is_spaceless_script_char(c: char) -> bool {
    let code = c as u32;
    (0x4E00..=0x9FFF).contains(&code)
        || (0x3400..=0x4DBF).contains(&code)
        || (0x3040..=0x309F).contains(&code)
        || (0x30A0..=0x30FF).contains(&code)
        || (0x3000..=0x303F).contains(&code)
}
