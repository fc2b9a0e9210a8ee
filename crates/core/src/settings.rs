//! Tunable thresholds for a single analysis run.

use serde::{Deserialize, Serialize};

/// Thresholds used by the inspectors and the text-on-image detector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisSettings {
    /// Text shapes shorter than this are ignored by the overlap test.
    pub min_text_length_for_ocr: usize,

    /// Slides with more visible characters than this fail the text check.
    pub max_text_chars: usize,

    /// Shapes covering more than this share of the slide act as a background.
    pub background_area_ratio: f64,

    /// OCR results at or below this confidence are dropped.
    pub ocr_min_confidence: f64,

    /// Merged OCR text is truncated to this many characters.
    pub max_ocr_text_length: usize,

    /// At most this many images per slide go through OCR.
    pub ocr_max_images_per_slide: usize,

    /// Images narrower or shorter than this (pixels) are skipped by OCR.
    pub min_ocr_image_side: u32,

    /// Cleaned OCR text shorter than this does not count as text.
    pub meaningful_text_min_len: usize,
}

impl Default for AnalysisSettings {
    fn default() -> Self {
        Self {
            min_text_length_for_ocr: 3,
            max_text_chars: 1000,
            background_area_ratio: 0.7,
            ocr_min_confidence: 35.0,
            max_ocr_text_length: 5000,
            ocr_max_images_per_slide: 6,
            min_ocr_image_side: 50,
            meaningful_text_min_len: 20,
        }
    }
}

impl AnalysisSettings {
    /// Set the per-slide character limit.
    pub fn with_max_text_chars(mut self, max: usize) -> Self {
        self.max_text_chars = max;
        self
    }
}
