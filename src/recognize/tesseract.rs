//! OCR through the `tesseract` command.

use std::path::PathBuf;
use std::process::Command;

use image::ImageFormat;

use super::{RecognitionOptions, TextRecognizer};
use crate::error::{Error, Result};
use crate::model::{BoundingBox, OcrRegion, PageRaster};

/// Word-level rows in Tesseract's TSV output.
const WORD_LEVEL: u32 = 5;

/// [`TextRecognizer`] that runs the Tesseract CLI on a temporary PNG.
#[derive(Debug, Clone)]
pub struct TesseractRecognizer {
    command: PathBuf,
}

impl Default for TesseractRecognizer {
    fn default() -> Self {
        Self {
            command: PathBuf::from("tesseract"),
        }
    }
}

impl TesseractRecognizer {
    /// Use `tesseract` from `PATH`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a specific executable.
    pub fn with_command(mut self, command: impl Into<PathBuf>) -> Self {
        self.command = command.into();
        self
    }

    /// Check whether the executable runs.
    pub fn is_available(&self) -> bool {
        Command::new(&self.command)
            .arg("--version")
            .output()
            .map(|o| o.status.success())
            .unwrap_or(false)
    }

    fn arguments(&self, image: &str, options: &RecognitionOptions) -> Vec<String> {
        let mut args = vec![
            image.to_string(),
            "stdout".to_string(),
            "-l".to_string(),
            options.language_spec(),
            "--psm".to_string(),
            "3".to_string(),
        ];
        if options.accurate {
            args.push("--oem".to_string());
            args.push("1".to_string());
        }
        if !options.language_correction {
            for var in ["load_system_dawg=0", "load_freq_dawg=0"] {
                args.push("-c".to_string());
                args.push(var.to_string());
            }
        }
        args.push("tsv".to_string());
        args
    }
}

impl TextRecognizer for TesseractRecognizer {
    fn name(&self) -> &str {
        "tesseract"
    }

    fn recognize(&self, raster: &PageRaster, options: &RecognitionOptions) -> Result<Vec<OcrRegion>> {
        let file = tempfile::Builder::new()
            .prefix("scoremeta-")
            .suffix(".png")
            .tempfile()?;
        raster.image.save_with_format(file.path(), ImageFormat::Png)?;

        let image_path = file.path().to_string_lossy().into_owned();
        let output = Command::new(&self.command)
            .args(self.arguments(&image_path, options))
            .output()
            .map_err(|e| Error::Recognition(format!("cannot run {}: {}", self.command.display(), e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(Error::Recognition(format!(
                "tesseract exited with {}: {}",
                output.status,
                stderr.trim()
            )));
        }

        let tsv = String::from_utf8_lossy(&output.stdout);
        Ok(parse_tsv(&tsv, raster.width(), raster.height()))
    }
}

/// Accumulates the words of one line.
struct LineAccumulator {
    key: (u32, u32, u32, u32),
    words: Vec<String>,
    confidence_sum: f32,
    left: f32,
    top: f32,
    right: f32,
    bottom: f32,
}

impl LineAccumulator {
    fn new(key: (u32, u32, u32, u32)) -> Self {
        Self {
            key,
            words: Vec::new(),
            confidence_sum: 0.0,
            left: f32::INFINITY,
            top: f32::INFINITY,
            right: f32::NEG_INFINITY,
            bottom: f32::NEG_INFINITY,
        }
    }

    fn push(&mut self, word: &str, conf: f32, left: f32, top: f32, width: f32, height: f32) {
        self.words.push(word.to_string());
        self.confidence_sum += conf;
        self.left = self.left.min(left);
        self.top = self.top.min(top);
        self.right = self.right.max(left + width);
        self.bottom = self.bottom.max(top + height);
    }

    fn finish(self, image_width: u32, image_height: u32) -> Option<OcrRegion> {
        if self.words.is_empty() {
            return None;
        }
        let confidence = self.confidence_sum / self.words.len() as f32 / 100.0;
        let bbox = BoundingBox::from_pixels(
            self.left,
            self.top,
            self.right - self.left,
            self.bottom - self.top,
            image_width,
            image_height,
        )?;
        Some(OcrRegion::new(self.words.join(" "), bbox, confidence))
    }
}

/// Group TSV word rows into line regions, in reading order.
pub(crate) fn parse_tsv(tsv: &str, image_width: u32, image_height: u32) -> Vec<OcrRegion> {
    let mut regions = Vec::new();
    let mut current: Option<LineAccumulator> = None;

    for row in tsv.lines().skip(1) {
        let cols: Vec<&str> = row.splitn(12, '\t').collect();
        if cols.len() < 12 {
            continue;
        }

        let int = |i: usize| cols[i].trim().parse::<u32>().ok();
        let float = |i: usize| cols[i].trim().parse::<f32>().ok();

        if int(0) != Some(WORD_LEVEL) {
            continue;
        }
        let text = cols[11].trim();
        let conf = float(10).unwrap_or(-1.0);
        if text.is_empty() || conf < 0.0 {
            continue;
        }
        let (Some(page), Some(block), Some(par), Some(line)) = (int(1), int(2), int(3), int(4))
        else {
            continue;
        };
        let (Some(left), Some(top), Some(width), Some(height)) =
            (float(6), float(7), float(8), float(9))
        else {
            continue;
        };

        let key = (page, block, par, line);
        if current.as_ref().map(|acc| acc.key) != Some(key) {
            if let Some(done) = current.take() {
                regions.extend(done.finish(image_width, image_height));
            }
            current = Some(LineAccumulator::new(key));
        }
        if let Some(acc) = current.as_mut() {
            acc.push(text, conf, left, top, width, height);
        }
    }

    if let Some(done) = current {
        regions.extend(done.finish(image_width, image_height));
    }

    regions
}
