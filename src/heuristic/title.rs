use super::HeuristicThresholds;
use crate::model::OcrRegion;
use crate::normalize::normalized_str;

/// Pick the largest top-centered region that does not look like a fraction.
///
/// Ties go to the first region encountered. A blank winner means no title.
pub(super) fn find_title(regions: &[OcrRegion], thresholds: &HeuristicThresholds) -> Option<String> {
    let (min_x, max_x) = thresholds.title_mid_x_range;

    let mut best: Option<(&OcrRegion, f32)> = None;
    for region in regions {
        let bbox = &region.bounding_box;
        let qualifies = bbox.mid_y() > thresholds.title_min_mid_y
            && (min_x..=max_x).contains(&bbox.mid_x())
            && region.confidence > thresholds.title_min_confidence
            && !region.text.contains('/');
        if !qualifies {
            continue;
        }

        let score = thresholds.title_score(region);
        if best.map_or(true, |(_, top)| score > top) {
            best = Some((region, score));
        }
    }

    best.and_then(|(region, _)| normalized_str(&region.text))
}
