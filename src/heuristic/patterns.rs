//! Key and time signature phrases.
//!
//! Both are position-independent: regions are scanned in descending
//! confidence and the first match wins.

use std::sync::OnceLock;

use regex::Regex;

use crate::model::{by_confidence_desc, OcrRegion};
use crate::normalize::normalized_str;

fn key_regex() -> &'static Regex {
    static KEY: OnceLock<Regex> = OnceLock::new();
    KEY.get_or_init(|| {
        Regex::new(r"[A-G](?:#|b|♯|♭)?(?: (?:Major|major|Minor|minor)| ?(?:장조|단조))").unwrap()
    })
}

/// Neighbouring letters are fine ("3/4박자"), neighbouring digits are not.
fn time_signature_regex() -> &'static Regex {
    static TIME: OnceLock<Regex> = OnceLock::new();
    TIME.get_or_init(|| {
        Regex::new(r"(?:^|[^0-9])(12|[2-79])\s*/\s*(16|[248])(?:[^0-9]|$)").unwrap()
    })
}

/// First key phrase such as "E♭ Major" or "A 단조".
pub fn find_key(regions: &[OcrRegion]) -> Option<String> {
    by_confidence_desc(regions)
        .into_iter()
        .find_map(|region| key_regex().find(&region.text))
        .and_then(|m| normalized_str(m.as_str()))
}

/// First time signature, with whitespace around the slash removed.
pub fn find_time_signature(regions: &[OcrRegion]) -> Option<String> {
    by_confidence_desc(regions).into_iter().find_map(|region| {
        time_signature_regex()
            .captures(&region.text)
            .map(|caps| format!("{}/{}", &caps[1], &caps[2]))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::BoundingBox;

    fn regions(texts: &[(&str, f32)]) -> Vec<OcrRegion> {
        texts
            .iter()
            .map(|(text, conf)| OcrRegion::new(*text, BoundingBox::new(0.1, 0.1, 0.1, 0.1), *conf))
            .collect()
    }

    fn time(text: &str) -> Option<String> {
        find_time_signature(&regions(&[(text, 0.9)]))
    }

    fn key(text: &str) -> Option<String> {
        find_key(&regions(&[(text, 0.9)]))
    }

    #[test]
    fn test_time_signature_spacing_removed() {
        assert_eq!(time("3 / 4").as_deref(), Some("3/4"));
        assert_eq!(time("Tempo 6/8").as_deref(), Some("6/8"));
    }

    #[test]
    fn test_compound_meter() {
        assert_eq!(time("12/8").as_deref(), Some("12/8"));
        assert_eq!(time("3/16").as_deref(), Some("3/16"));
    }

    #[test]
    fn test_invalid_time_signatures_rejected() {
        assert_eq!(time("13/4"), None);
        assert_eq!(time("4/5"), None);
        assert_eq!(time("3/48"), None);
        assert_eq!(time("8/8"), None);
        assert_eq!(time("3/45"), None);
        assert_eq!(time("Op. 10"), None);
    }

    #[test]
    fn test_time_signature_next_to_letters() {
        assert_eq!(time("3/4박자").as_deref(), Some("3/4"));
        assert_eq!(time("4/4拍子").as_deref(), Some("4/4"));
        assert_eq!(time("Moderato 6/8time").as_deref(), Some("6/8"));
        assert_eq!(time("in12/8").as_deref(), Some("12/8"));
    }

    #[test]
    fn test_key_variants() {
        assert_eq!(key("Sonata in C# minor").as_deref(), Some("C# minor"));
        assert_eq!(key("E♭ Major").as_deref(), Some("E♭ Major"));
        assert_eq!(key("Bb major").as_deref(), Some("Bb major"));
        assert_eq!(key("A 단조").as_deref(), Some("A 단조"));
        assert_eq!(key("G장조").as_deref(), Some("G장조"));
    }

    #[test]
    fn test_key_requires_mode_word() {
        assert_eq!(key("Concerto in A"), None);
        assert_eq!(key("H minor"), None);
        assert_eq!(key("Majority"), None);
        assert_eq!(key("CMajor"), None);
        assert_eq!(key("Eb  major"), None);
    }

    #[test]
    fn test_key_glued_to_text() {
        assert_eq!(key("소나타C단조").as_deref(), Some("C단조"));
        assert_eq!(key("Sonate(F# minor)").as_deref(), Some("F# minor"));
        assert_eq!(key("CD Minority").as_deref(), Some("D Minor"));
    }

    #[test]
    fn test_highest_confidence_wins() {
        let found = find_key(&regions(&[("D minor", 0.4), ("F Major", 0.8)]));
        assert_eq!(found.as_deref(), Some("F Major"));

        let found = find_time_signature(&regions(&[("2/4", 0.5), ("3/4", 0.5)]));
        assert_eq!(found.as_deref(), Some("2/4"));
    }
}
