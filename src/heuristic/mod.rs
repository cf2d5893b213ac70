//! Geometry- and confidence-weighted heuristics over OCR regions.
//!
//! Title pages follow loose conventions: the title is large and centered near
//! the top, the composer sits top-right, and key and time signature appear
//! anywhere as short phrases. The extractor encodes those conventions with
//! tunable [`HeuristicThresholds`].

mod composer;
mod patterns;
mod title;

pub use patterns::{find_key, find_time_signature};

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::model::{ExtractedMetadata, OcrRegion};
use crate::names::{LexicalNameTagger, NameTagger};

/// Layout thresholds and score weights.
///
/// Coordinates are unit page coordinates with the origin at the bottom-left.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeuristicThresholds {
    /// Minimum confidence for a title candidate (exclusive)
    pub title_min_confidence: f32,
    /// Minimum vertical center for a title candidate (exclusive)
    pub title_min_mid_y: f32,
    /// Inclusive horizontal center range for a title candidate
    pub title_mid_x_range: (f32, f32),
    /// Weight of box height in the title score
    pub title_height_weight: f32,
    /// Weight of confidence in the title score
    pub title_confidence_weight: f32,

    /// Minimum horizontal center for a composer candidate (exclusive)
    pub composer_min_mid_x: f32,
    /// Minimum vertical center for a composer candidate (exclusive)
    pub composer_min_mid_y: f32,
    /// Minimum confidence for a composer candidate (exclusive)
    pub composer_min_confidence: f32,
    /// Weight of horizontal center in the composer score
    pub composer_mid_x_weight: f32,
    /// Weight of vertical center in the composer score
    pub composer_mid_y_weight: f32,
    /// Weight of confidence in the composer score
    pub composer_confidence_weight: f32,
}

impl Default for HeuristicThresholds {
    fn default() -> Self {
        Self {
            title_min_confidence: 0.25,
            title_min_mid_y: 0.66,
            title_mid_x_range: (0.2, 0.8),
            title_height_weight: 0.5,
            title_confidence_weight: 0.2,

            composer_min_mid_x: 0.5,
            composer_min_mid_y: 0.5,
            composer_min_confidence: 0.2,
            composer_mid_x_weight: 0.6,
            composer_mid_y_weight: 0.3,
            composer_confidence_weight: 0.1,
        }
    }
}

impl HeuristicThresholds {
    /// Score of a title candidate: area, plus weighted height and confidence.
    pub fn title_score(&self, region: &OcrRegion) -> f32 {
        let bbox = &region.bounding_box;
        bbox.area()
            + bbox.height * self.title_height_weight
            + region.confidence * self.title_confidence_weight
    }

    /// Score of a composer candidate, favoring the top-right corner.
    pub fn composer_score(&self, region: &OcrRegion) -> f32 {
        let bbox = &region.bounding_box;
        bbox.mid_x() * self.composer_mid_x_weight
            + bbox.mid_y() * self.composer_mid_y_weight
            + region.confidence * self.composer_confidence_weight
    }
}

/// The default extraction path, available with OCR evidence alone.
#[derive(Clone)]
pub struct HeuristicExtractor {
    thresholds: HeuristicThresholds,
    tagger: Arc<dyn NameTagger>,
    attribution: composer::AttributionPattern,
}

impl Default for HeuristicExtractor {
    fn default() -> Self {
        Self::new(HeuristicThresholds::default(), Arc::new(LexicalNameTagger::new()))
    }
}

impl HeuristicExtractor {
    /// Create an extractor with the given thresholds and name tagger.
    pub fn new(thresholds: HeuristicThresholds, tagger: Arc<dyn NameTagger>) -> Self {
        Self {
            thresholds,
            tagger,
            attribution: composer::AttributionPattern::new(),
        }
    }

    /// Thresholds in use.
    pub fn thresholds(&self) -> &HeuristicThresholds {
        &self.thresholds
    }

    /// Most likely title, if any region qualifies.
    pub fn title(&self, regions: &[OcrRegion]) -> Option<String> {
        title::find_title(regions, &self.thresholds)
    }

    /// Most likely composer, if any region qualifies.
    pub fn composer(&self, regions: &[OcrRegion]) -> Option<String> {
        composer::find_composer(
            regions,
            &self.thresholds,
            self.tagger.as_ref(),
            &self.attribution,
        )
    }

    /// Run every heuristic. Instruments are never guessed here.
    pub fn extract(&self, regions: &[OcrRegion]) -> ExtractedMetadata {
        ExtractedMetadata {
            title: self.title(regions),
            composer: self.composer(regions),
            instruments: Vec::new(),
            key: find_key(regions),
            time_signature: find_time_signature(regions),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::BoundingBox;

    fn region(text: &str, mid_x: f32, mid_y: f32, w: f32, h: f32, conf: f32) -> OcrRegion {
        OcrRegion::new(text, BoundingBox::from_center(mid_x, mid_y, w, h), conf)
    }

    #[test]
    fn test_empty_regions_yield_nothing() {
        let meta = HeuristicExtractor::default().extract(&[]);
        assert!(meta.is_empty());
    }

    #[test]
    fn test_full_title_page() {
        let regions = vec![
            region("Moonlight Sonata", 0.5, 0.9, 0.5, 0.06, 0.95),
            region("Ludwig van Beethoven", 0.8, 0.84, 0.3, 0.02, 0.9),
            region("C# minor", 0.2, 0.78, 0.1, 0.015, 0.8),
            region("Adagio sostenuto 3 / 4", 0.3, 0.75, 0.3, 0.015, 0.7),
            region("1", 0.5, 0.03, 0.02, 0.015, 0.9),
        ];
        let meta = HeuristicExtractor::default().extract(&regions);

        assert_eq!(meta.title.as_deref(), Some("Moonlight Sonata"));
        assert_eq!(meta.composer.as_deref(), Some("Ludwig van Beethoven"));
        assert_eq!(meta.key.as_deref(), Some("C# minor"));
        assert_eq!(meta.time_signature.as_deref(), Some("3/4"));
        assert!(meta.instruments.is_empty());
    }

    #[test]
    fn test_score_weights() {
        let t = HeuristicThresholds::default();
        let r = region("x", 0.5, 0.5, 0.2, 0.1, 1.0);
        assert!((t.title_score(&r) - (0.02 + 0.05 + 0.2)).abs() < 1e-6);
        assert!((t.composer_score(&r) - (0.3 + 0.15 + 0.1)).abs() < 1e-6);
    }

    #[test]
    fn test_custom_thresholds() {
        let thresholds = HeuristicThresholds {
            title_min_mid_y: 0.3,
            ..Default::default()
        };
        let extractor = HeuristicExtractor::new(thresholds, Arc::new(LexicalNameTagger::new()));
        let regions = vec![region("Lower Title", 0.5, 0.5, 0.4, 0.05, 0.9)];
        assert_eq!(extractor.title(&regions).as_deref(), Some("Lower Title"));
        assert_eq!(HeuristicExtractor::default().title(&regions), None);
    }
}
