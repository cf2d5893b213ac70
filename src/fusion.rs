//! Field-by-field merge of the three evidence sources.
//!
//! | field          | first choice | then           | then      |
//! |----------------|--------------|----------------|-----------|
//! | title          | generative   | PDF title      | heuristic |
//! | composer       | generative   | PDF author     | heuristic |
//! | instruments    | generative   |                |           |
//! | key, time sig. | heuristic    |                |           |
//!
//! A source only counts when its value survives normalization.

use crate::generative::GenerativeResult;
use crate::model::{DocumentAttributes, ExtractedMetadata};
use crate::normalize::{normalized, normalized_list};

/// Merge evidence into the final result.
pub fn fuse(
    attributes: &DocumentAttributes,
    heuristic: &ExtractedMetadata,
    generative: Option<&GenerativeResult>,
) -> ExtractedMetadata {
    let generated_title = generative.and_then(|g| normalized(g.title.as_deref()));
    let generated_composer = generative.and_then(|g| normalized(g.composer.as_deref()));

    ExtractedMetadata {
        title: generated_title
            .or_else(|| attributes.title())
            .or_else(|| normalized(heuristic.title.as_deref())),
        composer: generated_composer
            .or_else(|| attributes.author())
            .or_else(|| normalized(heuristic.composer.as_deref())),
        instruments: generative
            .map(|g| normalized_list(&g.instruments))
            .unwrap_or_default(),
        key: normalized(heuristic.key.as_deref()),
        time_signature: normalized(heuristic.time_signature.as_deref()),
    }
}
