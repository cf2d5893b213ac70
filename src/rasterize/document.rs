//! PDF structure access through lopdf: document attributes and page geometry.

use lopdf::{Dictionary, Document as LopdfDocument, Object, ObjectId};

use crate::detect::{detect_format_from_bytes, PdfFormat};
use crate::error::{Error, Result};
use crate::model::{DocumentAttributes, PageGeometry};

/// Page tree nesting deeper than this is treated as malformed.
const MAX_INHERIT_DEPTH: usize = 32;

/// A parsed PDF, kept only for the duration of one extraction call.
pub struct PdfDocument {
    doc: LopdfDocument,
    format: PdfFormat,
}

impl PdfDocument {
    /// Parse a PDF from bytes.
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        let format = detect_format_from_bytes(data)?;
        let doc = LopdfDocument::load_mem(data).map_err(|e| match e {
            lopdf::Error::Decryption(_) => Error::Encrypted,
            _ => Error::from(e),
        })?;
        Ok(Self { doc, format })
    }

    /// Header information.
    pub fn format(&self) -> &PdfFormat {
        &self.format
    }

    /// Direct access to the underlying `lopdf::Document`.
    pub fn raw_doc(&self) -> &LopdfDocument {
        &self.doc
    }

    /// Number of pages in the page tree.
    pub fn page_count(&self) -> u32 {
        self.doc.get_pages().len() as u32
    }

    /// Check if the document is encrypted.
    pub fn is_encrypted(&self) -> bool {
        self.doc.is_encrypted()
    }

    /// Object id of page 1.
    pub fn first_page(&self) -> Result<ObjectId> {
        self.doc
            .get_pages()
            .into_iter()
            .next()
            .map(|(_, id)| id)
            .ok_or(Error::NoPages)
    }

    /// Read title, author, subject and creator from the Info dictionary.
    ///
    /// Missing or malformed entries are simply absent.
    pub fn attributes(&self) -> DocumentAttributes {
        let Some(info) = self.info_dictionary() else {
            return DocumentAttributes::default();
        };

        DocumentAttributes {
            title: self.string_entry(info, b"Title"),
            author: self.string_entry(info, b"Author"),
            subject: self.string_entry(info, b"Subject"),
            creator: self.string_entry(info, b"Creator"),
        }
    }

    /// Media box size of a page, following inheritance up the page tree.
    ///
    /// Falls back to US Letter when no usable box is declared. A `/Rotate` of
    /// 90 or 270 swaps width and height so the bitmap matches what a reader shows.
    pub fn page_geometry(&self, page_id: ObjectId) -> PageGeometry {
        let geometry = self
            .inherited_entry(page_id, b"MediaBox")
            .and_then(|obj| self.rect_size(obj))
            .map(|(w, h)| PageGeometry::new(w, h))
            .filter(|g| g.area() > 0.0)
            .unwrap_or_else(PageGeometry::letter);

        let rotation = self
            .inherited_entry(page_id, b"Rotate")
            .and_then(number)
            .map(|r| (r as i64).rem_euclid(360))
            .unwrap_or(0);

        if rotation == 90 || rotation == 270 {
            PageGeometry::new(geometry.height, geometry.width)
        } else {
            geometry
        }
    }

    /// Lower-left corner of a page's media box, `(0, 0)` when none is usable.
    pub(crate) fn media_box_origin(&self, page_id: ObjectId) -> (f32, f32) {
        self.inherited_entry(page_id, b"MediaBox")
            .and_then(|obj| self.rect_coords(obj))
            .map(|[x0, y0, x1, y1]| (x0.min(x1), y0.min(y1)))
            .unwrap_or((0.0, 0.0))
    }

    fn info_dictionary(&self) -> Option<&Dictionary> {
        let info = self.doc.trailer.get(b"Info").ok()?;
        self.resolve(info)?.as_dict().ok()
    }

    fn string_entry(&self, dict: &Dictionary, key: &[u8]) -> Option<String> {
        let obj = self.resolve(dict.get(key).ok()?)?;
        decode_pdf_string(obj)
    }

    /// Look up a page attribute, walking `/Parent` links for inheritable keys.
    fn inherited_entry(&self, page_id: ObjectId, key: &[u8]) -> Option<&Object> {
        let mut dict = self.doc.get_dictionary(page_id).ok()?;

        for _ in 0..MAX_INHERIT_DEPTH {
            if let Ok(obj) = dict.get(key) {
                return self.resolve(obj);
            }
            let parent = dict.get(b"Parent").ok()?.as_reference().ok()?;
            dict = self.doc.get_dictionary(parent).ok()?;
        }

        None
    }

    fn rect_size(&self, obj: &Object) -> Option<(f32, f32)> {
        let [x0, y0, x1, y1] = self.rect_coords(obj)?;
        Some(((x1 - x0).abs(), (y1 - y0).abs()))
    }

    fn rect_coords(&self, obj: &Object) -> Option<[f32; 4]> {
        let array = obj.as_array().ok()?;
        if array.len() < 4 {
            return None;
        }
        let mut coords = [0.0f32; 4];
        for (slot, item) in coords.iter_mut().zip(array.iter()) {
            *slot = self.resolve(item).and_then(number)?;
        }
        Some(coords)
    }

    fn resolve<'a>(&'a self, obj: &'a Object) -> Option<&'a Object> {
        match obj {
            Object::Reference(id) => self.doc.get_object(*id).ok(),
            other => Some(other),
        }
    }
}

/// Numeric value of a PDF object.
pub(crate) fn number(obj: &Object) -> Option<f32> {
    match obj {
        Object::Integer(i) => Some(*i as f32),
        Object::Real(r) => Some(*r),
        _ => None,
    }
}

/// Decode a PDF text string (UTF-16BE with BOM, UTF-8, or PDFDocEncoding).
pub(crate) fn decode_pdf_string(obj: &Object) -> Option<String> {
    match obj {
        Object::String(bytes, _) => Some(decode_text_bytes(bytes)),
        Object::Name(bytes) => String::from_utf8(bytes.clone()).ok(),
        _ => None,
    }
}

/// Decode raw string bytes when no font encoding is available.
pub(crate) fn decode_text_bytes(bytes: &[u8]) -> String {
    if bytes.len() >= 2 && bytes[0] == 0xFE && bytes[1] == 0xFF {
        let utf16: Vec<u16> = bytes[2..]
            .chunks_exact(2)
            .map(|c| u16::from_be_bytes([c[0], c[1]]))
            .collect();
        return String::from_utf16_lossy(&utf16);
    }

    if let Ok(s) = std::str::from_utf8(bytes) {
        return s.to_string();
    }

    // PDFDocEncoding agrees with Latin-1 for printable text
    bytes.iter().map(|&b| b as char).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use lopdf::{dictionary, StringFormat};

    fn build_pdf(info: Option<Dictionary>, media_box: Option<Vec<Object>>, pages: usize) -> Vec<u8> {
        let mut doc = LopdfDocument::with_version("1.5");
        let pages_id = doc.new_object_id();

        let mut kids = Vec::new();
        for _ in 0..pages {
            let page_id = doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
            });
            kids.push(Object::Reference(page_id));
        }

        let mut pages_dict = dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => pages as i64,
        };
        if let Some(mb) = media_box {
            pages_dict.set("MediaBox", mb);
        }
        doc.objects.insert(pages_id, Object::Dictionary(pages_dict));

        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);

        if let Some(info) = info {
            let info_id = doc.add_object(info);
            doc.trailer.set("Info", info_id);
        }

        let mut buf = Vec::new();
        doc.save_to(&mut buf).unwrap();
        buf
    }

    #[test]
    fn test_attributes_read() {
        let info = dictionary! {
            "Title" => Object::string_literal("Nocturne"),
            "Author" => Object::string_literal("Frédéric Chopin"),
            "Creator" => Object::string_literal("ScanApp"),
        };
        let data = build_pdf(Some(info), None, 1);
        let doc = PdfDocument::from_bytes(&data).unwrap();
        let attrs = doc.attributes();
        assert_eq!(attrs.title.as_deref(), Some("Nocturne"));
        assert_eq!(attrs.author.as_deref(), Some("Frédéric Chopin"));
        assert_eq!(attrs.creator.as_deref(), Some("ScanApp"));
        assert_eq!(attrs.subject, None);
    }

    #[test]
    fn test_attributes_utf16() {
        let mut title = vec![0xFE, 0xFF];
        for unit in "아리랑".encode_utf16() {
            title.extend_from_slice(&unit.to_be_bytes());
        }
        let info = dictionary! {
            "Title" => Object::String(title, StringFormat::Hexadecimal),
        };
        let data = build_pdf(Some(info), None, 1);
        let doc = PdfDocument::from_bytes(&data).unwrap();
        assert_eq!(doc.attributes().title.as_deref(), Some("아리랑"));
    }

    #[test]
    fn test_missing_info_is_empty() {
        let data = build_pdf(None, None, 1);
        let doc = PdfDocument::from_bytes(&data).unwrap();
        assert!(doc.attributes().is_empty());
    }

    #[test]
    fn test_inherited_media_box() {
        let media_box = vec![
            Object::Integer(0),
            Object::Integer(0),
            Object::Integer(1000),
            Object::Integer(1417),
        ];
        let data = build_pdf(None, Some(media_box), 1);
        let doc = PdfDocument::from_bytes(&data).unwrap();
        let page = doc.first_page().unwrap();
        let geometry = doc.page_geometry(page);
        assert_eq!(geometry.width, 1000.0);
        assert_eq!(geometry.height, 1417.0);
    }

    #[test]
    fn test_media_box_origin() {
        let media_box = vec![
            Object::Integer(612),
            Object::Integer(792),
            Object::Integer(36),
            Object::Integer(18),
        ];
        let data = build_pdf(None, Some(media_box), 1);
        let doc = PdfDocument::from_bytes(&data).unwrap();
        let page = doc.first_page().unwrap();
        assert_eq!(doc.media_box_origin(page), (36.0, 18.0));
        assert_eq!(doc.page_geometry(page), PageGeometry::new(576.0, 774.0));
    }

    #[test]
    fn test_default_geometry_is_letter() {
        let data = build_pdf(None, None, 1);
        let doc = PdfDocument::from_bytes(&data).unwrap();
        let page = doc.first_page().unwrap();
        assert_eq!(doc.page_geometry(page), PageGeometry::letter());
        assert_eq!(doc.media_box_origin(page), (0.0, 0.0));
    }

    #[test]
    fn test_no_pages() {
        let data = build_pdf(None, None, 0);
        let doc = PdfDocument::from_bytes(&data).unwrap();
        assert_eq!(doc.page_count(), 0);
        assert!(matches!(doc.first_page(), Err(Error::NoPages)));
    }

    #[test]
    fn test_not_a_pdf() {
        assert!(matches!(
            PdfDocument::from_bytes(b"GIF89a...."),
            Err(Error::UnknownFormat)
        ));
    }

    #[test]
    fn test_decode_text_bytes() {
        assert_eq!(decode_text_bytes(b"Hello"), "Hello");
        assert_eq!(decode_text_bytes(&[0x48, 0xE9]), "Hé");
        assert_eq!(decode_text_bytes(&[0xFE, 0xFF, 0x00, 0x48, 0x00, 0x69]), "Hi");
    }
}
