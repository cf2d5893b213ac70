//! Text recognition over the page raster.

mod tesseract;

pub use tesseract::TesseractRecognizer;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::model::{OcrRegion, PageRaster};

/// Options passed to a [`TextRecognizer`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecognitionOptions {
    /// Prefer accuracy over speed.
    pub accurate: bool,

    /// Let the engine apply its language model to correct words.
    pub language_correction: bool,

    /// Recognition languages as ISO 639-2 codes, most likely first.
    pub languages: Vec<String>,
}

impl Default for RecognitionOptions {
    fn default() -> Self {
        Self {
            accurate: true,
            language_correction: true,
            languages: vec!["kor".to_string(), "eng".to_string()],
        }
    }
}

impl RecognitionOptions {
    /// Create default options: accurate, corrected, Korean and English.
    pub fn new() -> Self {
        Self::default()
    }

    /// Toggle accurate mode.
    pub fn with_accurate(mut self, accurate: bool) -> Self {
        self.accurate = accurate;
        self
    }

    /// Toggle language correction.
    pub fn with_language_correction(mut self, enabled: bool) -> Self {
        self.language_correction = enabled;
        self
    }

    /// Replace the language list.
    pub fn with_languages<I, S>(mut self, languages: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.languages = languages.into_iter().map(Into::into).collect();
        self
    }

    /// Append a language if not already listed.
    pub fn add_language(mut self, language: impl Into<String>) -> Self {
        let language = language.into();
        if !self.languages.contains(&language) {
            self.languages.push(language);
        }
        self
    }

    /// Languages joined with `+`, as engines like Tesseract expect.
    pub fn language_spec(&self) -> String {
        self.languages.join("+")
    }
}

/// Abstract interface for an OCR engine.
///
/// Implementations return one region per recognized line, carrying only the
/// top candidate, with boxes in unit page coordinates.
pub trait TextRecognizer: Send + Sync {
    /// Short engine name for logs.
    fn name(&self) -> &str;

    /// Recognize text lines on `raster`.
    fn recognize(&self, raster: &PageRaster, options: &RecognitionOptions) -> Result<Vec<OcrRegion>>;
}

/// Run `recognizer`, turning any failure into "no OCR evidence".
pub fn recognize_or_none(
    recognizer: &dyn TextRecognizer,
    raster: &PageRaster,
    options: &RecognitionOptions,
) -> Option<Vec<OcrRegion>> {
    match recognizer.recognize(raster, options) {
        Ok(regions) => {
            log::debug!("{} recognized {} regions", recognizer.name(), regions.len());
            Some(regions)
        }
        Err(e) => {
            log::warn!("{} failed: {}", recognizer.name(), e);
            None
        }
    }
}
