//! # scoremeta
//!
//! Metadata extraction for scanned and digital sheet-music PDFs.
//!
//! Given the bytes of a score, this library proposes a **title**, **composer**,
//! **instruments**, **key** and **time signature** to pre-fill an editable form.
//! It never invents data: a field with weak evidence is left empty.
//!
//! ## Quick Start
//!
//! ```no_run
//! let data = std::fs::read("score.pdf").unwrap();
//! let metadata = scoremeta::extract(&data);
//! println!("{:?}", metadata.title);
//! ```
//!
//! ## Pipeline
//!
//! 1. **Rasterize**: read the Info dictionary and render page 1 through a
//!    [`PageRenderer`] (PDFium with the `pdfium` feature)
//! 2. **Recognize**: OCR the page through a [`TextRecognizer`]
//!    ([`TesseractRecognizer`] runs the `tesseract` command)
//! 3. **Refine** (optional): ask a [`GenerativeMetadataModel`] for title,
//!    composer and instruments (Ollama with the `ollama` feature)
//! 4. **Heuristics**: layout-weighted guesses for title and composer, patterns
//!    for key and time signature
//! 5. **Fuse**: generative, then PDF attributes, then heuristics, per field
//!
//! Every stage degrades to "no evidence" on failure, so [`extract`] always
//! returns a value.
//!
//! ```no_run
//! use std::sync::Arc;
//! use scoremeta::{ExtractOptions, MetadataExtractor, TesseractRecognizer};
//!
//! let extractor = MetadataExtractor::with_options(
//!     ExtractOptions::new().with_text_layer_fallback(true),
//! )
//! .with_recognizer(Arc::new(TesseractRecognizer::new()));
//!
//! let data = std::fs::read("score.pdf").unwrap();
//! let metadata = extractor.extract(&data);
//! ```

pub mod detect;
pub mod error;
pub mod extractor;
pub mod fusion;
pub mod generative;
pub mod heuristic;
pub mod model;
pub mod names;
pub mod normalize;
pub mod rasterize;
pub mod recognize;

// Re-export commonly used types
pub use detect::{detect_format_from_bytes, is_pdf_bytes, PdfFormat};
pub use error::{Error, Result};
pub use extractor::{Evidence, ExtractOptions, MetadataExtractor, RegionSource};
pub use generative::{
    cancellation, CancelHandle, CancellationToken, GenerativeMetadataModel, GenerativeRequest,
    GenerativeResult,
};
#[cfg(feature = "ollama")]
pub use generative::OllamaModel;
pub use heuristic::{HeuristicExtractor, HeuristicThresholds};
pub use model::{
    BoundingBox, DocumentAttributes, ExtractedMetadata, OcrRegion, PageGeometry, PageRaster,
};
pub use names::{LexicalNameTagger, NameTagger};
pub use rasterize::{PageRasterizer, PageRenderer, PdfDocument};
#[cfg(feature = "pdfium")]
pub use rasterize::PdfiumRenderer;
pub use recognize::{RecognitionOptions, TesseractRecognizer, TextRecognizer};

use std::path::Path;

/// Propose metadata for PDF bytes with the default extractor.
///
/// The default extractor has no renderer, recognizer or model, so it reports
/// document attributes only. Configure a [`MetadataExtractor`] for OCR.
///
/// # Example
///
/// ```no_run
/// let data = std::fs::read("score.pdf").unwrap();
/// let metadata = scoremeta::extract(&data);
/// ```
pub fn extract(data: &[u8]) -> ExtractedMetadata {
    MetadataExtractor::new().extract(data)
}

/// Read a file and propose metadata with `extractor`.
///
/// Only reading the file can fail.
///
/// # Example
///
/// ```no_run
/// use scoremeta::{extract_file, MetadataExtractor};
///
/// let metadata = extract_file("score.pdf", &MetadataExtractor::new()).unwrap();
/// ```
pub fn extract_file<P: AsRef<Path>>(path: P, extractor: &MetadataExtractor) -> Result<ExtractedMetadata> {
    let data = std::fs::read(path)?;
    Ok(extractor.extract(&data))
}

/// Check if a file starts like a PDF.
pub fn is_pdf<P: AsRef<Path>>(path: P) -> Result<bool> {
    use std::io::Read;

    let mut header = vec![0u8; 1024];
    let mut file = std::fs::File::open(path)?;
    let read = file.read(&mut header)?;
    header.truncate(read);
    Ok(is_pdf_bytes(&header))
}
