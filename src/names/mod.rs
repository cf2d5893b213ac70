//! Personal-name plausibility for composer candidates.
//!
//! A candidate line is first stripped of attribution words ("작곡", "Composer:",
//! "composed by", ...). The remainder is plausible when a [`NameTagger`] finds a
//! personal name in it, or when it has the shape of a Korean name: two to four
//! Hangul syllables and nothing else.

mod tagger;

pub use tagger::LexicalNameTagger;

use std::sync::OnceLock;

use regex::Regex;

use crate::normalize::normalized_str;

/// Attribution words removed before a name is judged.
const KOREAN_ATTRIBUTIONS: [&str; 2] = ["작곡", "편곡"];
const LATIN_ATTRIBUTIONS: [&str; 2] = ["composer", "composed by"];

/// Separators after which the name follows, in priority order.
const SEPARATORS: [&str; 3] = [":", "：", "-"];

/// Finds personal names in short text.
pub trait NameTagger: Send + Sync {
    /// Every personal-name span found in `text`, in order of appearance.
    fn personal_names(&self, text: &str) -> Vec<String>;

    /// Check whether `text` contains at least one personal name.
    fn has_personal_name(&self, text: &str) -> bool {
        !self.personal_names(text).is_empty()
    }
}

/// Strip attribution words and keep what follows the first separator.
///
/// `"작곡 김철수"` becomes `"김철수"`, `"Composer: Erik Satie"` becomes
/// `"Erik Satie"`. Returns `None` when nothing is left.
pub fn extract_name(text: &str) -> Option<String> {
    let mut stripped = text.to_string();
    for word in KOREAN_ATTRIBUTIONS {
        stripped = stripped.replace(word, "");
    }
    for word in LATIN_ATTRIBUTIONS {
        stripped = remove_ignore_ascii_case(&stripped, word);
    }

    let remainder = SEPARATORS
        .iter()
        .find_map(|sep| stripped.find(sep).map(|pos| &stripped[pos + sep.len()..]))
        .unwrap_or(&stripped);

    normalized_str(remainder)
}

/// Check whether `text` is plausibly a personal name.
pub fn is_plausible_name(text: &str, tagger: &dyn NameTagger) -> bool {
    let Some(candidate) = extract_name(text).or_else(|| normalized_str(text)) else {
        return false;
    };

    if tagger.has_personal_name(&candidate) {
        return true;
    }

    is_hangul_name(&candidate)
}

/// Two to four Hangul syllables, nothing else.
pub fn is_hangul_name(text: &str) -> bool {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN
        .get_or_init(|| Regex::new(r"^[가-힣]{2,4}$").unwrap())
        .is_match(text)
}

/// Remove every ASCII-case-insensitive occurrence of an ASCII `needle`.
fn remove_ignore_ascii_case(haystack: &str, needle: &str) -> String {
    // ASCII lowercasing keeps byte offsets aligned with the input
    let lower = haystack.to_ascii_lowercase();
    let needle = needle.to_ascii_lowercase();

    let mut result = String::with_capacity(haystack.len());
    let mut last = 0;
    for (start, _) in lower.match_indices(&needle) {
        result.push_str(&haystack[last..start]);
        last = start + needle.len();
    }
    result.push_str(&haystack[last..]);
    result
}
