//! OCR for text baked into slide images.
//!
//! [`OcrEnsemble`] runs several preprocessing and page-segmentation
//! strategies over an image and keeps the most confident plausible result.
//! Recognition itself sits behind [`WordRecognizer`]; the production
//! implementation shells out to Tesseract.

pub mod ensemble;
pub mod preprocess;
pub mod tesseract;

pub use ensemble::{pick_best, OcrEnsemble, OcrMethod, DEFAULT_METHODS};
pub use preprocess::Preprocess;
pub use tesseract::{OcrWord, Tesseract};

use deckcheck_core::{Result, Script};
use image::GrayImage;
use std::path::Path;

/// Word-level recognition of a prepared grayscale image.
pub trait WordRecognizer {
    /// Recognize words using the given page segmentation mode.
    fn recognize(&self, image: &GrayImage, psm: u8) -> Result<Vec<OcrWord>>;
}

/// Locate Tesseract and wrap it in the default ensemble.
///
/// Returns `None` when no usable binary exists on this host.
pub fn detect_ensemble(
    tesseract: Option<&Path>,
    language: Option<&str>,
    min_confidence: f64,
) -> Option<OcrEnsemble<Tesseract>> {
    let engine = Tesseract::detect(tesseract, language)?;
    let script = Script::from_language_hint(engine.language());
    Some(OcrEnsemble::new(engine, script).with_min_confidence(min_confidence))
}
