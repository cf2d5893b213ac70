use regex::Regex;

use super::HeuristicThresholds;
use crate::model::OcrRegion;
use crate::names::{extract_name, is_plausible_name, NameTagger};
use crate::normalize::normalized_str;

/// "composer:", "composed by", "작곡", "편곡" followed by a name-like run.
#[derive(Debug, Clone)]
pub(super) struct AttributionPattern {
    regex: Regex,
}

impl AttributionPattern {
    pub(super) fn new() -> Self {
        Self {
            regex: Regex::new(r"(?i)(composer|composed\s*by|작곡|편곡)\s*[:：-]?\s*([\p{L} .'-]{2,})")
                .unwrap(),
        }
    }

    fn find<'t>(&self, text: &'t str) -> Option<&'t str> {
        self.regex.find(text).map(|m| m.as_str())
    }
}

/// Two tiers over top-right candidates: a plausible personal name by position
/// score, then the first attribution phrase in descending score order.
pub(super) fn find_composer(
    regions: &[OcrRegion],
    thresholds: &HeuristicThresholds,
    tagger: &dyn NameTagger,
    attribution: &AttributionPattern,
) -> Option<String> {
    let candidates: Vec<&OcrRegion> = regions
        .iter()
        .filter(|r| {
            r.bounding_box.mid_x() > thresholds.composer_min_mid_x
                && r.bounding_box.mid_y() > thresholds.composer_min_mid_y
                && r.confidence > thresholds.composer_min_confidence
        })
        .collect();

    let mut best: Option<(&OcrRegion, f32)> = None;
    for region in &candidates {
        if !is_plausible_name(&region.text, tagger) {
            continue;
        }
        let score = thresholds.composer_score(region);
        if best.map_or(true, |(_, top)| score > top) {
            best = Some((region, score));
        }
    }
    if let Some((region, _)) = best {
        return stripped(&region.text);
    }

    let mut ranked = candidates;
    ranked.sort_by(|a, b| {
        thresholds
            .composer_score(b)
            .partial_cmp(&thresholds.composer_score(a))
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    ranked
        .into_iter()
        .find_map(|region| attribution.find(&region.text))
        .and_then(stripped)
}

fn stripped(text: &str) -> Option<String> {
    extract_name(text).or_else(|| normalized_str(text))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::BoundingBox;
    use crate::names::LexicalNameTagger;

    struct RejectAll;

    impl NameTagger for RejectAll {
        fn personal_names(&self, _text: &str) -> Vec<String> {
            Vec::new()
        }
    }

    fn region(text: &str, mid_x: f32, mid_y: f32, conf: f32) -> OcrRegion {
        OcrRegion::new(text, BoundingBox::from_center(mid_x, mid_y, 0.2, 0.02), conf)
    }

    fn composer(regions: &[OcrRegion], tagger: &dyn NameTagger) -> Option<String> {
        find_composer(
            regions,
            &HeuristicThresholds::default(),
            tagger,
            &AttributionPattern::new(),
        )
    }

    #[test]
    fn test_plausible_name_top_right() {
        let regions = vec![
            region("Nocturne", 0.5, 0.9, 0.9),
            region("Frédéric Chopin", 0.8, 0.85, 0.9),
        ];
        assert_eq!(
            composer(&regions, &LexicalNameTagger::new()).as_deref(),
            Some("Frédéric Chopin")
        );
    }

    #[test]
    fn test_attribution_fallback_when_tagger_rejects() {
        let regions = vec![region("composed by Franz Schubert", 0.75, 0.82, 0.9)];
        assert_eq!(
            composer(&regions, &RejectAll).as_deref(),
            Some("Franz Schubert")
        );
    }

    #[test]
    fn test_korean_attribution_is_plausible() {
        let regions = vec![region("작곡 김철수", 0.8, 0.85, 0.8)];
        assert_eq!(composer(&regions, &RejectAll).as_deref(), Some("김철수"));
    }

    #[test]
    fn test_attribution_stripped_from_tier_one() {
        let regions = vec![region("Composer: Erik Satie", 0.8, 0.85, 0.9)];
        assert_eq!(
            composer(&regions, &LexicalNameTagger::new()).as_deref(),
            Some("Erik Satie")
        );
    }

    #[test]
    fn test_bottom_left_names_ignored() {
        let regions = vec![
            region("Johannes Brahms", 0.2, 0.85, 0.9),
            region("Johannes Brahms", 0.8, 0.2, 0.9),
            region("Johannes Brahms", 0.8, 0.85, 0.1),
        ];
        assert_eq!(composer(&regions, &LexicalNameTagger::new()), None);
    }

    #[test]
    fn test_rightmost_name_wins() {
        let regions = vec![
            region("Arranged by Kim", 0.6, 0.8, 0.9),
            region("Johann Pachelbel", 0.85, 0.8, 0.9),
        ];
        assert_eq!(
            composer(&regions, &LexicalNameTagger::new()).as_deref(),
            Some("Johann Pachelbel")
        );
    }

    #[test]
    fn test_no_match() {
        let regions = vec![region("Allegro", 0.8, 0.85, 0.9)];
        assert_eq!(composer(&regions, &LexicalNameTagger::new()), None);
    }

    #[test]
    fn test_attribution_pattern_match() {
        let pattern = AttributionPattern::new();
        assert_eq!(
            pattern.find("Op. 90 composed by Franz Schubert"),
            Some("composed by Franz Schubert")
        );
        assert_eq!(pattern.find("편곡 - 이영희"), Some("편곡 - 이영희"));
        assert_eq!(pattern.find("Sonata"), None);
    }
}
