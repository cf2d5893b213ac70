//! Value types shared across the extraction pipeline.
//!
//! Everything here is plain data: cloneable, serializable, and free of shared
//! mutable state, so concurrent extractions never interfere.

mod metadata;
mod raster;
mod region;

pub use metadata::{DocumentAttributes, ExtractedMetadata};
pub use raster::{PageGeometry, PageRaster, LARGE_PAGE_AREA, LARGE_PAGE_SCALE, STANDARD_SCALE};
pub use region::{by_confidence_desc, BoundingBox, OcrRegion};
