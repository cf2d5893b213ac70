//! Recognized text regions and their page-relative geometry.

use serde::{Deserialize, Serialize};

/// An axis-aligned box in unit page coordinates.
///
/// Both axes run over `[0, 1]` with the origin at the bottom-left corner of the
/// page, so `y = 0.9` is near the top. Heuristics only ever see these
/// coordinates, which keeps them independent of render resolution.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct BoundingBox {
    /// Left edge
    pub x: f32,
    /// Bottom edge
    pub y: f32,
    /// Width as a fraction of page width
    pub width: f32,
    /// Height as a fraction of page height
    pub height: f32,
}

impl BoundingBox {
    /// Create a box from its bottom-left corner and size.
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width: width.max(0.0),
            height: height.max(0.0),
        }
    }

    /// Create a box from its center point and size.
    pub fn from_center(mid_x: f32, mid_y: f32, width: f32, height: f32) -> Self {
        Self::new(mid_x - width / 2.0, mid_y - height / 2.0, width, height)
    }

    /// Convert a pixel rectangle (origin top-left, as image tools report it)
    /// into unit coordinates with a bottom-left origin.
    ///
    /// Returns `None` for an empty image.
    pub fn from_pixels(
        left: f32,
        top: f32,
        width: f32,
        height: f32,
        image_width: u32,
        image_height: u32,
    ) -> Option<Self> {
        if image_width == 0 || image_height == 0 {
            return None;
        }
        let iw = image_width as f32;
        let ih = image_height as f32;
        let bottom = ih - (top + height);
        Some(Self::new(left / iw, bottom / ih, width / iw, height / ih).clamped())
    }

    /// Clip the box to the unit square.
    pub fn clamped(self) -> Self {
        let x0 = self.x.clamp(0.0, 1.0);
        let y0 = self.y.clamp(0.0, 1.0);
        let x1 = (self.x + self.width).clamp(0.0, 1.0);
        let y1 = (self.y + self.height).clamp(0.0, 1.0);
        Self::new(x0, y0, x1 - x0, y1 - y0)
    }

    /// Horizontal center.
    pub fn mid_x(&self) -> f32 {
        self.x + self.width / 2.0
    }

    /// Vertical center.
    pub fn mid_y(&self) -> f32 {
        self.y + self.height / 2.0
    }

    /// Right edge.
    pub fn max_x(&self) -> f32 {
        self.x + self.width
    }

    /// Top edge.
    pub fn max_y(&self) -> f32 {
        self.y + self.height
    }

    /// Area as a fraction of the page.
    pub fn area(&self) -> f32 {
        self.width * self.height
    }
}

/// One recognized line of text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OcrRegion {
    /// Recognized text (top candidate only)
    pub text: String,
    /// Page-relative bounding box
    pub bounding_box: BoundingBox,
    /// Recognition confidence in `[0, 1]`
    pub confidence: f32,
}

impl OcrRegion {
    /// Create a region. Confidence is clamped to `[0, 1]`; NaN becomes 0.
    pub fn new(text: impl Into<String>, bounding_box: BoundingBox, confidence: f32) -> Self {
        let confidence = if confidence.is_nan() {
            0.0
        } else {
            confidence.clamp(0.0, 1.0)
        };
        Self {
            text: text.into(),
            bounding_box,
            confidence,
        }
    }
}

/// Sort regions by descending confidence, keeping input order among equals.
pub fn by_confidence_desc(regions: &[OcrRegion]) -> Vec<&OcrRegion> {
    let mut sorted: Vec<&OcrRegion> = regions.iter().collect();
    sorted.sort_by(|a, b| {
        b.confidence
            .partial_cmp(&a.confidence)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    sorted
}
