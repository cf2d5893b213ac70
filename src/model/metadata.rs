//! Document attributes (input evidence) and the extraction result.

use serde::{Deserialize, Serialize};

use crate::normalize::normalized;

/// Attributes from the PDF Info dictionary.
///
/// Any or all may be absent; scanned scores frequently carry none, or only the
/// name of the scanning application.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentAttributes {
    /// Document title
    pub title: Option<String>,

    /// Document author
    pub author: Option<String>,

    /// Document subject
    pub subject: Option<String>,

    /// Creator application
    pub creator: Option<String>,
}

impl DocumentAttributes {
    /// Normalized title, if any.
    pub fn title(&self) -> Option<String> {
        normalized(self.title.as_deref())
    }

    /// Normalized author, if any.
    pub fn author(&self) -> Option<String> {
        normalized(self.author.as_deref())
    }

    /// Normalized subject, if any.
    pub fn subject(&self) -> Option<String> {
        normalized(self.subject.as_deref())
    }

    /// Normalized creator application, if any.
    pub fn creator(&self) -> Option<String> {
        normalized(self.creator.as_deref())
    }

    /// Check whether every attribute is absent or blank.
    pub fn is_empty(&self) -> bool {
        self.title().is_none()
            && self.author().is_none()
            && self.subject().is_none()
            && self.creator().is_none()
    }
}

/// Proposed score metadata.
///
/// Every field is independently optional and absence is an expected outcome.
/// String fields are either `None` or non-empty, single-spaced and trimmed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractedMetadata {
    /// Piece title
    pub title: Option<String>,

    /// Composer name
    pub composer: Option<String>,

    /// Instruments, in standard English names
    #[serde(default)]
    pub instruments: Vec<String>,

    /// Key (e.g. "E♭ Major", "A 단조")
    pub key: Option<String>,

    /// Time signature (e.g. "3/4")
    pub time_signature: Option<String>,
}

impl ExtractedMetadata {
    /// Check whether nothing was found.
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.composer.is_none()
            && self.instruments.is_empty()
            && self.key.is_none()
            && self.time_signature.is_none()
    }

    /// Instruments joined for a single-field form, or `None` if there are none.
    pub fn instrument_label(&self) -> Option<String> {
        if self.instruments.is_empty() {
            None
        } else {
            Some(self.instruments.join(", "))
        }
    }

    /// Number of populated fields (instruments count once).
    pub fn field_count(&self) -> usize {
        [
            self.title.is_some(),
            self.composer.is_some(),
            !self.instruments.is_empty(),
            self.key.is_some(),
            self.time_signature.is_some(),
        ]
        .iter()
        .filter(|present| **present)
        .count()
    }
}
