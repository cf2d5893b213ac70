//! Error types for scoremeta library.
//!
//! None of these ever reach the caller of [`crate::extract`]: every stage of the
//! pipeline converts its error into "no evidence" at the stage boundary. They are
//! surfaced by the individual components so backends can be tested and composed.

use std::io;
use thiserror::Error;

/// Result type alias for scoremeta operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error types that can occur while gathering metadata evidence.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error when reading or writing files.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The input is not recognized as PDF.
    #[error("Unknown file format: not a valid PDF")]
    UnknownFormat,

    /// The PDF version is not supported.
    #[error("Unsupported PDF version: {0}")]
    UnsupportedVersion(String),

    /// Error parsing PDF structure.
    #[error("PDF parsing error: {0}")]
    PdfParse(String),

    /// The PDF document is encrypted.
    #[error("Document is encrypted")]
    Encrypted,

    /// The document parsed but has no pages.
    #[error("Document has no pages")]
    NoPages,

    /// Page rendering failed.
    #[error("Rendering error: {0}")]
    Render(String),

    /// The text recognition engine failed.
    #[error("Text recognition error: {0}")]
    Recognition(String),

    /// The generative model failed or produced unusable output.
    #[error("Generative model error: {0}")]
    Generative(String),

    /// A bounded wait elapsed.
    #[error("Timed out after {0} ms")]
    Timeout(u64),

    /// The caller cancelled the extraction.
    #[error("Extraction cancelled")]
    Cancelled,
}

impl From<lopdf::Error> for Error {
    fn from(err: lopdf::Error) -> Self {
        match err {
            lopdf::Error::IO(e) => Error::Io(e),
            lopdf::Error::Decryption(_) => Error::Encrypted,
            _ => Error::PdfParse(err.to_string()),
        }
    }
}

impl From<image::ImageError> for Error {
    fn from(err: image::ImageError) -> Self {
        Error::Render(err.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Generative(format!("malformed model output: {}", err))
    }
}
