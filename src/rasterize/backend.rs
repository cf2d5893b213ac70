//! Page rendering backend abstraction.
//!
//! The rasterizer decides *what* to render (page 1, at which size); a
//! [`PageRenderer`] does the drawing. This isolates the concrete rendering
//! library from the extraction logic, and lets builds without a renderer still
//! extract from document attributes and the text layer.

use image::{Rgb, RgbImage, RgbaImage};

use crate::error::Result;

/// Abstract interface for drawing the first page of a PDF.
pub trait PageRenderer: Send + Sync {
    /// Short backend name for logs.
    fn name(&self) -> &str;

    /// Render page 1 of `data` into a bitmap of about `width` × `height` pixels.
    ///
    /// The returned bitmap may carry transparency; the rasterizer composites it
    /// onto white.
    fn render_first_page(&self, data: &[u8], width: u32, height: u32) -> Result<RgbaImage>;
}

/// Flatten an RGBA bitmap onto an opaque white background.
///
/// Text recognition on undefined or transparent backgrounds loses accuracy, so
/// every raster goes through this before OCR.
pub fn composite_on_white(rgba: &RgbaImage) -> RgbImage {
    let mut out = RgbImage::from_pixel(rgba.width(), rgba.height(), Rgb([255, 255, 255]));

    for (x, y, pixel) in rgba.enumerate_pixels() {
        let [r, g, b, a] = pixel.0;
        let alpha = a as u32;
        let blend = |c: u8| -> u8 { ((c as u32 * alpha + 255 * (255 - alpha) + 127) / 255) as u8 };
        out.put_pixel(x, y, Rgb([blend(r), blend(g), blend(b)]));
    }

    out
}

// ---------------------------------------------------------------------------
// PdfiumRenderer: implementation backed by pdfium-render
// ---------------------------------------------------------------------------

#[cfg(feature = "pdfium")]
pub use pdfium_backend::PdfiumRenderer;

#[cfg(feature = "pdfium")]
mod pdfium_backend {
    use std::path::PathBuf;

    use image::RgbaImage;
    use pdfium_render::prelude::{PdfBitmapFormat, PdfRenderConfig, Pdfium};

    use super::PageRenderer;
    use crate::error::{Error, Result};

    /// [`PageRenderer`] backed by a PDFium shared library.
    ///
    /// The library is bound per call: a `Pdfium` handle is never shared
    /// between concurrent extractions.
    #[derive(Debug, Clone, Default)]
    pub struct PdfiumRenderer {
        library_dir: Option<PathBuf>,
    }

    impl PdfiumRenderer {
        /// Bind to the system PDFium library.
        pub fn new() -> Self {
            Self::default()
        }

        /// Look for the PDFium library in `dir` before the system paths.
        pub fn with_library_dir(mut self, dir: impl Into<PathBuf>) -> Self {
            self.library_dir = Some(dir.into());
            self
        }

        /// Check whether the library can be bound at all.
        pub fn is_available(&self) -> bool {
            self.bind().is_ok()
        }

        fn bind(&self) -> Result<Pdfium> {
            if let Some(dir) = &self.library_dir {
                let path = Pdfium::pdfium_platform_library_name_at_path(dir);
                if let Ok(bindings) = Pdfium::bind_to_library(&path) {
                    return Ok(Pdfium::new(bindings));
                }
                log::debug!("PDFium not found at {}", path.display());
            }

            let bindings = Pdfium::bind_to_system_library()
                .map_err(|e| Error::Render(format!("failed to bind PDFium: {}", e)))?;
            Ok(Pdfium::new(bindings))
        }
    }

    impl PageRenderer for PdfiumRenderer {
        fn name(&self) -> &str {
            "pdfium"
        }

        fn render_first_page(&self, data: &[u8], width: u32, height: u32) -> Result<RgbaImage> {
            let pdfium = self.bind()?;
            let document = pdfium
                .load_pdf_from_byte_slice(data, None)
                .map_err(|e| Error::Render(e.to_string()))?;
            let page = document
                .pages()
                .get(0)
                .map_err(|e| Error::Render(e.to_string()))?;

            let target_width = i32::try_from(width).unwrap_or(i32::MAX).max(1);
            let max_height = i32::try_from(height).unwrap_or(i32::MAX).max(1);
            let config = PdfRenderConfig::new()
                .set_target_width(target_width)
                .set_maximum_height(max_height)
                .render_form_data(true)
                .render_annotations(true)
                .use_grayscale_rendering(false)
                .set_reverse_byte_order(false)
                .set_format(PdfBitmapFormat::BGRA);

            let bitmap = page
                .render_with_config(&config)
                .map_err(|e| Error::Render(e.to_string()))?;

            let out_width = bitmap.width().max(0) as u32;
            let out_height = bitmap.height().max(0) as u32;
            let src = bitmap.as_raw_bytes();
            let stride = if out_height == 0 {
                0
            } else {
                src.len() / out_height as usize
            };

            let mut pixels = Vec::with_capacity(out_width as usize * out_height as usize * 4);
            for y in 0..out_height as usize {
                let row = y * stride;
                for x in 0..out_width as usize {
                    let idx = row + x * 4;
                    let b = src.get(idx).copied().unwrap_or(255);
                    let g = src.get(idx + 1).copied().unwrap_or(255);
                    let r = src.get(idx + 2).copied().unwrap_or(255);
                    let a = src.get(idx + 3).copied().unwrap_or(255);
                    pixels.extend_from_slice(&[r, g, b, a]);
                }
            }

            RgbaImage::from_raw(out_width, out_height, pixels)
                .ok_or_else(|| Error::Render("bitmap size mismatch".to_string()))
        }
    }
}
