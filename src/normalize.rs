//! The one string normalizer every component routes its output through.
//!
//! Blank means absent: a value that is empty after cleanup is `None`, never `""`.

use unicode_normalization::UnicodeNormalization;

/// Normalize a candidate value.
///
/// - Unicode NFC (OCR engines and PDF text layers disagree on Hangul composition)
/// - U+FFFD replacement characters removed
/// - whitespace runs collapsed to one ASCII space, ends trimmed
/// - empty result mapped to `None`
pub fn normalized(value: Option<&str>) -> Option<String> {
    let value = value?;
    let composed: String = value.nfc().filter(|c| *c != '\u{FFFD}').collect();
    let collapsed = composed.split_whitespace().collect::<Vec<_>>().join(" ");

    if collapsed.is_empty() {
        None
    } else {
        Some(collapsed)
    }
}

/// Shorthand for [`normalized`] on a borrowed string.
pub fn normalized_str(value: &str) -> Option<String> {
    normalized(Some(value))
}

/// Normalize a list of values, dropping blanks and case-insensitive duplicates.
/// First occurrence wins and keeps its spelling.
pub fn normalized_list<I, S>(values: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut seen: Vec<String> = Vec::new();
    let mut result = Vec::new();

    for value in values {
        if let Some(clean) = normalized_str(value.as_ref()) {
            let key = clean.to_lowercase();
            if !seen.contains(&key) {
                seen.push(key);
                result.push(clean);
            }
        }
    }

    result
}
