//! The extraction pipeline.
//!
//! Rasterize → recognize → refine (optional) → heuristics → fuse. Each stage
//! turns its failures into "no evidence" so [`MetadataExtractor::extract`]
//! always returns a value.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::fusion::fuse;
use crate::generative::{
    prompt::MAX_PROMPT_REGIONS, CancellationToken, GenerativeMetadataModel, GenerativeStep,
    DEFAULT_TIMEOUT,
};
use crate::heuristic::{HeuristicExtractor, HeuristicThresholds};
use crate::model::{DocumentAttributes, ExtractedMetadata, OcrRegion, PageGeometry};
use crate::names::{LexicalNameTagger, NameTagger};
use crate::rasterize::{text_layer_regions, PageRasterizer, PageRenderer, Rasterized};
use crate::recognize::{recognize_or_none, RecognitionOptions, TextRecognizer};

/// Options for metadata extraction.
#[derive(Debug, Clone)]
pub struct ExtractOptions {
    /// Layout thresholds for the heuristic extractor
    pub thresholds: HeuristicThresholds,

    /// Maximum OCR lines included in a generative prompt
    pub max_prompt_regions: usize,

    /// How long to wait for a generative answer
    pub generative_timeout: Duration,

    /// Options handed to the text recognizer
    pub recognition: RecognitionOptions,

    /// Read the embedded text layer when OCR produced nothing
    pub text_layer_fallback: bool,

    /// Whether batch extraction runs in parallel
    pub parallel: bool,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            thresholds: HeuristicThresholds::default(),
            max_prompt_regions: MAX_PROMPT_REGIONS,
            generative_timeout: DEFAULT_TIMEOUT,
            recognition: RecognitionOptions::default(),
            text_layer_fallback: false,
            parallel: true,
        }
    }
}

impl ExtractOptions {
    /// Create new extract options with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set heuristic thresholds.
    pub fn with_thresholds(mut self, thresholds: HeuristicThresholds) -> Self {
        self.thresholds = thresholds;
        self
    }

    /// Set the prompt line cap.
    pub fn with_max_prompt_regions(mut self, max: usize) -> Self {
        self.max_prompt_regions = max;
        self
    }

    /// Set the generative timeout.
    pub fn with_generative_timeout(mut self, timeout: Duration) -> Self {
        self.generative_timeout = timeout;
        self
    }

    /// Set recognition options.
    pub fn with_recognition(mut self, recognition: RecognitionOptions) -> Self {
        self.recognition = recognition;
        self
    }

    /// Enable or disable the text layer fallback.
    pub fn with_text_layer_fallback(mut self, enabled: bool) -> Self {
        self.text_layer_fallback = enabled;
        self
    }

    /// Enable or disable parallel batch extraction.
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Disable parallel batch extraction.
    pub fn sequential(mut self) -> Self {
        self.parallel = false;
        self
    }
}

/// Where the regions handed to the heuristics came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RegionSource {
    /// The text recognizer
    Ocr,
    /// The embedded text layer
    TextLayer,
    /// No regions
    None,
}

/// Evidence gathered before refinement and fusion.
#[derive(Debug, Clone)]
pub struct Evidence {
    /// Info dictionary attributes
    pub attributes: DocumentAttributes,
    /// Page 1 geometry, if the document has a page
    pub geometry: Option<PageGeometry>,
    /// Text regions, possibly empty
    pub regions: Vec<OcrRegion>,
    /// Where the regions came from
    pub source: RegionSource,
}

/// Proposes score metadata for PDF bytes.
///
/// Holds only configuration and shareable capability handles, so one instance
/// can serve concurrent extractions.
#[derive(Clone)]
pub struct MetadataExtractor {
    options: ExtractOptions,
    rasterizer: PageRasterizer,
    recognizer: Option<Arc<dyn TextRecognizer>>,
    generative: Option<Arc<dyn GenerativeMetadataModel>>,
    heuristic: HeuristicExtractor,
}

impl Default for MetadataExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl MetadataExtractor {
    /// An extractor with no renderer, recognizer or model configured.
    ///
    /// Without capabilities it still reports document attributes, and the text
    /// layer when enabled.
    pub fn new() -> Self {
        Self::with_options(ExtractOptions::default())
    }

    /// An extractor with custom options.
    pub fn with_options(options: ExtractOptions) -> Self {
        Self {
            heuristic: HeuristicExtractor::new(
                options.thresholds.clone(),
                Arc::new(LexicalNameTagger::new()),
            ),
            options,
            rasterizer: PageRasterizer::new(),
            recognizer: None,
            generative: None,
        }
    }

    /// Draw page 1 with `renderer`.
    pub fn with_renderer(mut self, renderer: Arc<dyn PageRenderer>) -> Self {
        self.rasterizer = self.rasterizer.with_renderer(renderer);
        self
    }

    /// Recognize text with `recognizer`.
    pub fn with_recognizer(mut self, recognizer: Arc<dyn TextRecognizer>) -> Self {
        self.recognizer = Some(recognizer);
        self
    }

    /// Judge composer names with `tagger`.
    pub fn with_name_tagger(mut self, tagger: Arc<dyn NameTagger>) -> Self {
        self.heuristic = HeuristicExtractor::new(self.options.thresholds.clone(), tagger);
        self
    }

    /// Refine with `model` when it reports itself available.
    pub fn with_generative_model(mut self, model: Arc<dyn GenerativeMetadataModel>) -> Self {
        self.generative = Some(model);
        self
    }

    /// Options in use.
    pub fn options(&self) -> &ExtractOptions {
        &self.options
    }

    /// Propose metadata for `data`. Never fails.
    pub fn extract(&self, data: &[u8]) -> ExtractedMetadata {
        self.extract_with_cancel(data, &CancellationToken::never())
    }

    /// Like [`Self::extract`], abandoning steps that have not started once
    /// `cancel` fires. Whatever evidence exists by then is still fused.
    pub fn extract_with_cancel(&self, data: &[u8], cancel: &CancellationToken) -> ExtractedMetadata {
        let evidence = self.gather(data, cancel);

        let generated = self.generative.as_ref().and_then(|model| {
            GenerativeStep::new(
                Arc::clone(model),
                self.options.generative_timeout,
                self.options.max_prompt_regions,
            )
            .run(&evidence.attributes, &evidence.regions, cancel)
        });

        let heuristic = self.heuristic.extract(&evidence.regions);
        let metadata = fuse(&evidence.attributes, &heuristic, generated.as_ref());

        log::debug!(
            "extracted {} fields from {} regions ({:?}, generative: {})",
            metadata.field_count(),
            evidence.regions.len(),
            evidence.source,
            generated.is_some()
        );
        metadata
    }

    /// Attributes and text regions, without refinement or fusion.
    pub fn gather(&self, data: &[u8], cancel: &CancellationToken) -> Evidence {
        let Rasterized {
            attributes,
            geometry,
            raster,
            document,
        } = self.rasterizer.rasterize(data);

        let mut regions = None;
        if cancel.is_cancelled() {
            log::debug!("recognition skipped: cancelled");
        } else if let (Some(raster), Some(recognizer)) = (&raster, &self.recognizer) {
            regions = recognize_or_none(recognizer.as_ref(), raster, &self.options.recognition);
        } else if raster.is_some() {
            log::debug!("no text recognizer configured");
        }

        if let Some(regions) = regions.filter(|r| !r.is_empty()) {
            return Evidence {
                attributes,
                geometry,
                regions,
                source: RegionSource::Ocr,
            };
        }

        if self.options.text_layer_fallback && !cancel.is_cancelled() {
            if let Some(document) = &document {
                match text_layer_regions(document) {
                    Ok(regions) if !regions.is_empty() => {
                        return Evidence {
                            attributes,
                            geometry,
                            regions,
                            source: RegionSource::TextLayer,
                        };
                    }
                    Ok(_) => log::debug!("text layer is empty"),
                    Err(e) => log::debug!("text layer not read: {}", e),
                }
            }
        }

        Evidence {
            attributes,
            geometry,
            regions: Vec::new(),
            source: RegionSource::None,
        }
    }

    /// Extract many documents; results keep input order.
    pub fn extract_batch<D>(&self, documents: &[D]) -> Vec<ExtractedMetadata>
    where
        D: AsRef<[u8]> + Sync,
    {
        self.extract_batch_with_progress(documents, |_, _| {})
    }

    /// Like [`Self::extract_batch`], calling `progress(completed, total)` as
    /// each document finishes.
    pub fn extract_batch_with_progress<D, F>(&self, documents: &[D], progress: F) -> Vec<ExtractedMetadata>
    where
        D: AsRef<[u8]> + Sync,
        F: Fn(usize, usize) + Sync,
    {
        let total = documents.len();
        let completed = AtomicUsize::new(0);

        let run = |data: &D| {
            let metadata = self.extract(data.as_ref());
            let done = completed.fetch_add(1, Ordering::Relaxed) + 1;
            progress(done, total);
            metadata
        };

        if self.options.parallel {
            documents.par_iter().map(run).collect()
        } else {
            documents.iter().map(run).collect()
        }
    }

    /// Run [`Self::extract`] on tokio's blocking pool.
    ///
    /// A panicked or cancelled task yields an all-absent result.
    #[cfg(feature = "async")]
    pub async fn extract_async(&self, data: Vec<u8>) -> ExtractedMetadata {
        let extractor = self.clone();
        match tokio::task::spawn_blocking(move || extractor.extract(&data)).await {
            Ok(metadata) => metadata,
            Err(e) => {
                log::warn!("extraction task failed: {}", e);
                ExtractedMetadata::default()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_options_builder() {
        let options = ExtractOptions::new()
            .with_max_prompt_regions(10)
            .with_generative_timeout(Duration::from_secs(5))
            .with_text_layer_fallback(true)
            .sequential();

        assert_eq!(options.max_prompt_regions, 10);
        assert_eq!(options.generative_timeout, Duration::from_secs(5));
        assert!(options.text_layer_fallback);
        assert!(!options.parallel);
    }

    #[test]
    fn test_defaults() {
        let options = ExtractOptions::default();
        assert_eq!(options.max_prompt_regions, 50);
        assert_eq!(options.generative_timeout, Duration::from_secs(20));
        assert!(!options.text_layer_fallback);
    }

    #[test]
    fn test_garbage_bytes_yield_empty_result() {
        let extractor = MetadataExtractor::new();
        assert!(extractor.extract(b"").is_empty());
        assert!(extractor.extract(b"%PDF-1.4 truncated").is_empty());
    }

    #[test]
    fn test_batch_keeps_order_and_reports_progress() {
        let extractor = MetadataExtractor::new();
        let docs: Vec<Vec<u8>> = vec![b"a".to_vec(), b"b".to_vec(), b"c".to_vec()];
        let seen = AtomicUsize::new(0);

        let results = extractor.extract_batch_with_progress(&docs, |done, total| {
            assert_eq!(total, 3);
            assert!(done >= 1 && done <= 3);
            seen.fetch_add(1, Ordering::Relaxed);
        });

        assert_eq!(results.len(), 3);
        assert_eq!(seen.load(Ordering::Relaxed), 3);
    }
}
