//! Detection of text baked into slide images.
//!
//! A cheap geometric pre-filter (text boxes overlapping pictures) decides
//! whether a slide is at risk. Only at-risk slides go through OCR, and OCR
//! only adds evidence: failing to read text never clears a geometric risk.

use crate::classify::ClassifiedShapes;
use crate::finding::{OcrCandidate, OcrSummary};
use crate::normalize::{clean_ocr_text, is_meaningful};
use crate::settings::AnalysisSettings;
use crate::types::Deck;

/// Separator placed between texts of different images.
pub const MERGE_DIVIDER: &str = "\n\n---\n";

/// Extracts text from a single encoded image.
pub trait ImageTextExtractor {
    /// Best passing OCR result for the image, or `None` when no run
    /// produced plausible text or the image could not be processed.
    fn extract(&self, image: &[u8]) -> Option<OcrCandidate>;
}

/// How OCR participates in a run.
#[derive(Clone, Copy)]
pub enum OcrPolicy<'a> {
    /// OCR switched off for the run; the geometric signal decides.
    Disabled,
    /// OCR requested but no engine on this host.
    Unavailable,
    Enabled(&'a dyn ImageTextExtractor),
}

/// Text-on-image verdict for one slide.
#[derive(Debug, Clone, PartialEq)]
pub struct TextOnImage {
    pub detected: bool,
    pub image_count: usize,
    pub ocr: Option<OcrSummary>,
}

/// Whether any text shape of at least `min_chars` characters overlaps any
/// image. Stops at the first overlap.
pub fn overlap_risk(shapes: &ClassifiedShapes, min_chars: usize) -> bool {
    shapes
        .text_shapes
        .iter()
        .filter(|t| t.char_count >= min_chars)
        .filter_map(|t| t.bounds)
        .any(|text_bounds| {
            shapes
                .image_shapes
                .iter()
                .filter_map(|i| i.bounds)
                .any(|image_bounds| text_bounds.overlaps(&image_bounds))
        })
}

/// Decide whether the slide's images likely carry text.
pub fn detect(
    shapes: &ClassifiedShapes,
    deck: &Deck,
    policy: OcrPolicy<'_>,
    settings: &AnalysisSettings,
) -> TextOnImage {
    let image_count = shapes.image_count();
    let verdict = |detected, ocr| TextOnImage {
        detected,
        image_count,
        ocr,
    };

    if image_count == 0 {
        return verdict(false, None);
    }

    let risk = overlap_risk(shapes, settings.min_text_length_for_ocr);

    let extractor = match policy {
        OcrPolicy::Disabled => return verdict(risk, None),
        _ if !risk => return verdict(false, None),
        OcrPolicy::Unavailable => {
            log::debug!("Text overlaps an image but OCR is unavailable");
            return verdict(true, None);
        }
        OcrPolicy::Enabled(extractor) => extractor,
    };

    let mut candidates = Vec::new();
    for image in shapes
        .image_shapes
        .iter()
        .take(settings.ocr_max_images_per_slide)
    {
        if let Some((w, h)) = image.pixel_size {
            let min = settings.min_ocr_image_side;
            if w < min || h < min {
                log::debug!("Skipping {}x{} image {} for OCR", w, h, image.media.0);
                continue;
            }
        }
        let Some(bytes) = deck.media(&image.media) else {
            log::warn!("Image part {} missing from package", image.media.0);
            continue;
        };
        if let Some(candidate) = extractor.extract(bytes) {
            candidates.push(candidate);
        }
    }

    verdict(true, merge_candidates(candidates, settings))
}

/// Merge per-image OCR results in encounter order.
///
/// Only meaningful results above the confidence floor contribute. The method
/// label is taken from the most confident contributor (first one on ties).
pub fn merge_candidates(
    candidates: Vec<OcrCandidate>,
    settings: &AnalysisSettings,
) -> Option<OcrSummary> {
    let contributing: Vec<OcrCandidate> = candidates
        .into_iter()
        .filter(|c| {
            is_meaningful(&c.text, settings.meaningful_text_min_len)
                && c.confidence > settings.ocr_min_confidence
        })
        .collect();

    if contributing.is_empty() {
        return None;
    }

    let mut best = &contributing[0];
    for c in &contributing[1..] {
        if c.confidence > best.confidence {
            best = c;
        }
    }

    let text = contributing
        .iter()
        .map(|c| clean_ocr_text(&c.text))
        .collect::<Vec<_>>()
        .join(MERGE_DIVIDER);
    let text: String = text.chars().take(settings.max_ocr_text_length).collect();

    let confidence =
        contributing.iter().map(|c| c.confidence).sum::<f64>() / contributing.len() as f64;

    Some(OcrSummary {
        text,
        confidence,
        method: best.method.clone(),
        images_with_text: contributing.len(),
    })
}
