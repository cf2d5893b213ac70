//! Prompt construction for the generative pass.
//!
//! Each OCR line is tagged with a coarse position and a size relative to the
//! median line height, which is what the model needs to tell a title from a
//! cue label without seeing the page.

use std::fmt;

use serde_json::{json, Value};

use crate::model::{DocumentAttributes, OcrRegion};

/// Default cap on OCR lines included in a prompt.
pub const MAX_PROMPT_REGIONS: usize = 50;

/// Size ratio above which a line counts as large.
const LARGE_RATIO: f32 = 1.4;

/// Size ratio below which a line counts as small.
const SMALL_RATIO: f32 = 0.7;

/// System instructions for the model.
pub const INSTRUCTIONS: &str = "\
You are a sheet music metadata extractor. Each OCR line has [position, size] tags.

Extract:
- title: The piece name (usually Large text near top center)
- composer: The composer's full name (usually Medium or Large text near top right)
- instruments: Only from Medium or Large text. Ignore Small text (cue labels). Translate any non-English names to standard English. Most parts have 1-4 instruments.

Do NOT guess or infer. Only extract what is literally visible. When in doubt, leave empty.";

/// Vertical band of a region's center.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerticalBand {
    Top,
    Middle,
    Bottom,
}

impl VerticalBand {
    pub fn of(mid_y: f32) -> Self {
        if mid_y > 0.66 {
            Self::Top
        } else if mid_y > 0.33 {
            Self::Middle
        } else {
            Self::Bottom
        }
    }
}

/// Horizontal band of a region's center.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HorizontalBand {
    Left,
    Center,
    Right,
}

impl HorizontalBand {
    pub fn of(mid_x: f32) -> Self {
        if mid_x < 0.33 {
            Self::Left
        } else if mid_x < 0.66 {
            Self::Center
        } else {
            Self::Right
        }
    }
}

/// Text size relative to the median line height.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SizeBand {
    Small,
    Medium,
    Large,
}

impl SizeBand {
    pub fn of(height: f32, median: f32) -> Self {
        if median <= 0.0 {
            return Self::Medium;
        }
        let ratio = height / median;
        if ratio > LARGE_RATIO {
            Self::Large
        } else if ratio < SMALL_RATIO {
            Self::Small
        } else {
            Self::Medium
        }
    }
}

impl fmt::Display for VerticalBand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Top => "Top",
            Self::Middle => "Middle",
            Self::Bottom => "Bottom",
        })
    }
}

impl fmt::Display for HorizontalBand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Left => "Left",
            Self::Center => "Center",
            Self::Right => "Right",
        })
    }
}

impl fmt::Display for SizeBand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Small => "Small",
            Self::Medium => "Medium",
            Self::Large => "Large",
        })
    }
}

/// Upper median of region heights; 0 for no regions.
pub fn median_height(regions: &[OcrRegion]) -> f32 {
    let mut heights: Vec<f32> = regions.iter().map(|r| r.bounding_box.height).collect();
    if heights.is_empty() {
        return 0.0;
    }
    heights.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    heights[heights.len() / 2]
}

/// `[Top, Center, Large] "text"` for one region.
pub fn region_line(region: &OcrRegion, median: f32) -> String {
    let bbox = &region.bounding_box;
    format!(
        "[{}, {}, {}] \"{}\"",
        VerticalBand::of(bbox.mid_y()),
        HorizontalBand::of(bbox.mid_x()),
        SizeBand::of(bbox.height, median),
        region.text
    )
}

/// Tagged OCR lines, top of page first, at most `limit` of them.
///
/// The median is taken over every region, not just the ones shown.
pub fn format_regions(regions: &[OcrRegion], limit: usize) -> String {
    let median = median_height(regions);
    let mut sorted: Vec<&OcrRegion> = regions.iter().collect();
    sorted.sort_by(|a, b| {
        b.bounding_box
            .mid_y()
            .partial_cmp(&a.bounding_box.mid_y())
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    sorted
        .into_iter()
        .take(limit)
        .map(|r| region_line(r, median))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Document attribute lines. Title and author always appear.
pub fn format_attributes(attributes: &DocumentAttributes) -> String {
    let mut lines = vec![
        format!(
            "Title: {}",
            attributes.title().as_deref().unwrap_or("not available")
        ),
        format!(
            "Author: {}",
            attributes.author().as_deref().unwrap_or("not available")
        ),
    ];
    if let Some(subject) = attributes.subject() {
        lines.push(format!("Subject: {}", subject));
    }
    if let Some(creator) = attributes.creator() {
        lines.push(format!("Creator App: {}", creator));
    }
    lines.join("\n")
}

/// The full user prompt.
pub fn build_prompt(attributes: &DocumentAttributes, regions: &[OcrRegion], limit: usize) -> String {
    format!(
        "PDF File Metadata:\n{}\n\nOCR Text from first page:\n{}",
        format_attributes(attributes),
        format_regions(regions, limit)
    )
}

/// JSON schema the model's answer must satisfy.
pub fn output_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "title": {
                "type": "string",
                "description": "The title of the sheet music piece. Extract the full title as written."
            },
            "composer": {
                "type": "string",
                "description": "The full name of the composer as written on the score."
            },
            "instruments": {
                "type": "array",
                "items": { "type": "string" },
                "description": "Instrument names translated to standard English. Only from Medium or Large text. Empty array if none visible."
            }
        },
        "required": ["instruments"]
    })
}
