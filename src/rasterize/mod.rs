//! Page rasterizer: document attributes and a bitmap of page 1.
//!
//! Rasterization never fails the extraction. Bytes that are not a PDF, do not
//! parse, or have no pages produce an [`Rasterized`] with default attributes
//! and no raster; the reason is logged at debug level.

mod backend;
mod document;
mod text_layer;

pub use backend::{composite_on_white, PageRenderer};
#[cfg(feature = "pdfium")]
pub use backend::PdfiumRenderer;
pub use document::PdfDocument;
pub use text_layer::text_layer_regions;

use std::sync::Arc;

use image::imageops::FilterType;

use crate::error::{Error, Result};
use crate::model::{DocumentAttributes, PageGeometry, PageRaster};

/// Everything the rasterizer learned about a document.
pub struct Rasterized {
    /// Info dictionary attributes (all absent if the PDF did not parse)
    pub attributes: DocumentAttributes,
    /// Page 1 geometry, if the document has a page
    pub geometry: Option<PageGeometry>,
    /// Rendered page 1, if a renderer is configured and succeeded
    pub raster: Option<PageRaster>,
    /// The parsed document, for the text layer fallback
    pub document: Option<PdfDocument>,
}

impl Rasterized {
    fn empty() -> Self {
        Self {
            attributes: DocumentAttributes::default(),
            geometry: None,
            raster: None,
            document: None,
        }
    }
}

/// Opens PDFs and renders page 1 through an optional [`PageRenderer`].
#[derive(Clone, Default)]
pub struct PageRasterizer {
    renderer: Option<Arc<dyn PageRenderer>>,
}

impl PageRasterizer {
    /// A rasterizer without a renderer: attributes and geometry only.
    pub fn new() -> Self {
        Self::default()
    }

    /// Use `renderer` to draw page 1.
    pub fn with_renderer(mut self, renderer: Arc<dyn PageRenderer>) -> Self {
        self.renderer = Some(renderer);
        self
    }

    /// Check whether a renderer is configured.
    pub fn has_renderer(&self) -> bool {
        self.renderer.is_some()
    }

    /// Read attributes and render page 1. Never fails.
    pub fn rasterize(&self, data: &[u8]) -> Rasterized {
        let document = match PdfDocument::from_bytes(data) {
            Ok(doc) => doc,
            Err(e) => {
                log::debug!("document not opened: {}", e);
                return Rasterized::empty();
            }
        };

        let attributes = document.attributes();

        let page_id = match document.first_page() {
            Ok(id) => id,
            Err(e) => {
                log::debug!("no page to render: {}", e);
                return Rasterized {
                    attributes,
                    document: Some(document),
                    ..Rasterized::empty()
                };
            }
        };

        let geometry = document.page_geometry(page_id);
        let raster = match &self.renderer {
            Some(renderer) => match self.render(renderer.as_ref(), data, geometry) {
                Ok(raster) => Some(raster),
                Err(e) => {
                    log::warn!("{} failed to render page 1: {}", renderer.name(), e);
                    None
                }
            },
            None => {
                log::debug!("no page renderer configured");
                None
            }
        };

        Rasterized {
            attributes,
            geometry: Some(geometry),
            raster,
            document: Some(document),
        }
    }

    fn render(
        &self,
        renderer: &dyn PageRenderer,
        data: &[u8],
        geometry: PageGeometry,
    ) -> Result<PageRaster> {
        let (width, height) = geometry
            .pixel_size()
            .ok_or_else(|| Error::Render("page has zero size".to_string()))?;

        let rgba = renderer.render_first_page(data, width, height)?;
        if rgba.width() == 0 || rgba.height() == 0 {
            return Err(Error::Render("renderer returned an empty bitmap".to_string()));
        }

        // Renderers may round differently; keep the requested size exactly.
        let rgba = if rgba.dimensions() != (width, height) {
            image::imageops::resize(&rgba, width, height, FilterType::Triangle)
        } else {
            rgba
        };

        Ok(PageRaster {
            image: composite_on_white(&rgba),
            scale: geometry.render_scale(),
            geometry,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};
    use lopdf::{dictionary, Document as LopdfDocument, Object};
    use std::sync::Mutex;

    struct FixedRenderer {
        requested: Mutex<Option<(u32, u32)>>,
        fail: bool,
    }

    impl FixedRenderer {
        fn new(fail: bool) -> Self {
            Self {
                requested: Mutex::new(None),
                fail,
            }
        }
    }

    impl PageRenderer for FixedRenderer {
        fn name(&self) -> &str {
            "fixed"
        }

        fn render_first_page(&self, _data: &[u8], width: u32, height: u32) -> Result<RgbaImage> {
            *self.requested.lock().unwrap() = Some((width, height));
            if self.fail {
                return Err(Error::Render("boom".to_string()));
            }
            Ok(RgbaImage::from_pixel(width / 2, height / 2, Rgba([0, 0, 0, 0])))
        }
    }

    fn one_page_pdf(width: i64, height: i64) -> Vec<u8> {
        let mut doc = LopdfDocument::with_version("1.4");
        let pages_id = doc.new_object_id();
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
        });
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => vec![Object::Reference(page_id)],
                "Count" => 1,
                "MediaBox" => vec![
                    Object::Integer(0),
                    Object::Integer(0),
                    Object::Integer(width),
                    Object::Integer(height),
                ],
            }),
        );
        let info_id = doc.add_object(dictionary! {
            "Title" => Object::string_literal("Nocturne"),
        });
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);
        doc.trailer.set("Info", info_id);
        let mut buf = Vec::new();
        doc.save_to(&mut buf).unwrap();
        buf
    }

    #[test]
    fn test_garbage_yields_nothing() {
        let out = PageRasterizer::new().rasterize(b"not a pdf at all");
        assert!(out.attributes.is_empty());
        assert!(out.raster.is_none());
        assert!(out.geometry.is_none());
    }

    #[test]
    fn test_without_renderer_reads_attributes() {
        let data = one_page_pdf(595, 842);
        let out = PageRasterizer::new().rasterize(&data);
        assert_eq!(out.attributes.title(), Some("Nocturne".to_string()));
        assert!(out.raster.is_none());
        assert_eq!(out.geometry, Some(PageGeometry::new(595.0, 842.0)));
    }

    #[test]
    fn test_render_requests_scaled_size_and_composites() {
        let renderer = Arc::new(FixedRenderer::new(false));
        let rasterizer = PageRasterizer::new().with_renderer(renderer.clone());
        let data = one_page_pdf(595, 842);

        let out = rasterizer.rasterize(&data);
        let raster = out.raster.unwrap();

        assert_eq!(*renderer.requested.lock().unwrap(), Some((1190, 1684)));
        assert_eq!((raster.width(), raster.height()), (1190, 1684));
        assert_eq!(raster.scale, 2.0);
        assert_eq!(raster.image.get_pixel(0, 0).0, [255, 255, 255]);
    }

    #[test]
    fn test_large_page_uses_reduced_scale() {
        let renderer = Arc::new(FixedRenderer::new(false));
        let rasterizer = PageRasterizer::new().with_renderer(renderer.clone());
        let data = one_page_pdf(1200, 1200);

        let raster = rasterizer.rasterize(&data).raster.unwrap();
        assert_eq!(raster.scale, 1.5);
        assert_eq!(*renderer.requested.lock().unwrap(), Some((1800, 1800)));
    }

    #[test]
    fn test_renderer_failure_keeps_attributes() {
        let rasterizer = PageRasterizer::new().with_renderer(Arc::new(FixedRenderer::new(true)));
        let out = rasterizer.rasterize(&one_page_pdf(612, 792));
        assert!(out.raster.is_none());
        assert_eq!(out.attributes.title(), Some("Nocturne".to_string()));
    }
}
