//! Page geometry and the rendered bitmap handed to text recognition.

use image::RgbImage;
use serde::{Deserialize, Serialize};

/// Pages larger than this (in square points) render at the reduced scale.
pub const LARGE_PAGE_AREA: f32 = 1_000_000.0;

/// Render scale for pages up to [`LARGE_PAGE_AREA`].
pub const STANDARD_SCALE: f32 = 2.0;

/// Render scale for larger pages, bounding bitmap memory and OCR cost.
pub const LARGE_PAGE_SCALE: f32 = 1.5;

/// Size of a page's media box in PDF points (1/72 inch).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PageGeometry {
    /// Width in points
    pub width: f32,
    /// Height in points
    pub height: f32,
}

impl PageGeometry {
    /// Create a geometry from width and height in points.
    pub fn new(width: f32, height: f32) -> Self {
        Self {
            width: width.abs(),
            height: height.abs(),
        }
    }

    /// US Letter, used when a page declares no usable media box.
    pub fn letter() -> Self {
        Self::new(612.0, 792.0)
    }

    /// Page area in square points.
    pub fn area(&self) -> f32 {
        self.width * self.height
    }

    /// Render scale adapted to page area.
    pub fn render_scale(&self) -> f32 {
        if self.area() > LARGE_PAGE_AREA {
            LARGE_PAGE_SCALE
        } else {
            STANDARD_SCALE
        }
    }

    /// Bitmap size in pixels at [`Self::render_scale`].
    ///
    /// Returns `None` when either side rounds to zero.
    pub fn pixel_size(&self) -> Option<(u32, u32)> {
        let scale = self.render_scale();
        let width = (self.width * scale) as u32;
        let height = (self.height * scale) as u32;
        if width == 0 || height == 0 {
            None
        } else {
            Some((width, height))
        }
    }
}

/// An opaque RGB rendering of page 1.
#[derive(Debug, Clone)]
pub struct PageRaster {
    /// Pixels, composited on white
    pub image: RgbImage,
    /// Scale the page was rendered at
    pub scale: f32,
    /// Source page geometry
    pub geometry: PageGeometry,
}

impl PageRaster {
    /// Bitmap width in pixels.
    pub fn width(&self) -> u32 {
        self.image.width()
    }

    /// Bitmap height in pixels.
    pub fn height(&self) -> u32 {
        self.image.height()
    }
}
