//! Multi-method OCR over one image.
//!
//! Every method is a (preprocessing, page segmentation) pair run on the same
//! decoded image. Runs that fail the quality gate are discarded and the most
//! confident survivor wins.

use crate::preprocess::Preprocess;
use crate::WordRecognizer;
use deckcheck_core::normalize::{clean_ocr_text, passes_quality_gate};
use deckcheck_core::{ImageTextExtractor, OcrCandidate, Script};
use image::DynamicImage;

/// Minimum per-image confidence for the winning run.
pub const DEFAULT_MIN_CONFIDENCE: f64 = 35.0;

/// One named OCR strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OcrMethod {
    pub name: &'static str,
    pub psm: u8,
    pub preprocess: Preprocess,
}

/// Uniform block, automatic layout, sparse text.
pub const DEFAULT_METHODS: [OcrMethod; 3] = [
    OcrMethod {
        name: "PSM6",
        psm: 6,
        preprocess: Preprocess::Standard,
    },
    OcrMethod {
        name: "PSM3",
        psm: 3,
        preprocess: Preprocess::Standard,
    },
    OcrMethod {
        name: "PSM11",
        psm: 11,
        preprocess: Preprocess::HighContrast,
    },
];

pub struct OcrEnsemble<R> {
    recognizer: R,
    methods: Vec<OcrMethod>,
    script: Script,
    min_confidence: f64,
}

impl<R: WordRecognizer> OcrEnsemble<R> {
    pub fn new(recognizer: R, script: Script) -> Self {
        Self {
            recognizer,
            methods: DEFAULT_METHODS.to_vec(),
            script,
            min_confidence: DEFAULT_MIN_CONFIDENCE,
        }
    }

    pub fn with_methods(mut self, methods: Vec<OcrMethod>) -> Self {
        self.methods = methods;
        self
    }

    pub fn with_min_confidence(mut self, min_confidence: f64) -> Self {
        self.min_confidence = min_confidence;
        self
    }

    pub fn recognizer(&self) -> &R {
        &self.recognizer
    }

    /// Run one method and keep the result only if it passes the quality gate.
    pub fn run_method(&self, image: &DynamicImage, method: &OcrMethod) -> Option<OcrCandidate> {
        let prepared = method.preprocess.apply(image);
        let words = match self.recognizer.recognize(&prepared, method.psm) {
            Ok(words) => words,
            Err(e) => {
                log::debug!("OCR method {} failed: {}", method.name, e);
                return None;
            }
        };

        let kept: Vec<(&str, f64)> = words
            .iter()
            .map(|w| (w.text.trim(), w.confidence))
            .filter(|(t, _)| t.chars().count() > 1)
            .collect();
        if kept.is_empty() {
            return None;
        }

        let tokens: Vec<&str> = kept.iter().map(|(t, _)| *t).collect();
        let scores: Vec<f64> = kept
            .iter()
            .map(|(_, c)| *c)
            .filter(|c| *c >= 0.0)
            .collect();
        let confidence = if scores.is_empty() {
            0.0
        } else {
            scores.iter().sum::<f64>() / scores.len() as f64
        };

        let text = clean_ocr_text(&tokens.join(" "));
        if text.is_empty() || !passes_quality_gate(&text, confidence, self.script) {
            log::debug!(
                "OCR method {} ({}) rejected (confidence {:.1}, {} chars)",
                method.name,
                method.preprocess.name(),
                confidence,
                text.chars().count()
            );
            return None;
        }

        Some(OcrCandidate {
            text,
            confidence,
            method: method.name.to_string(),
        })
    }

    /// Best passing run over all methods, if confident enough.
    pub fn best_for_image(&self, image: &DynamicImage) -> Option<OcrCandidate> {
        let best = pick_best(self.methods.iter().filter_map(|m| self.run_method(image, m)))?;
        (best.confidence > self.min_confidence).then_some(best)
    }
}

impl<R: WordRecognizer> ImageTextExtractor for OcrEnsemble<R> {
    fn extract(&self, image: &[u8]) -> Option<OcrCandidate> {
        let decoded = match image::load_from_memory(image) {
            Ok(img) => img,
            Err(e) => {
                log::warn!("Could not decode image for OCR: {}", e);
                return None;
            }
        };
        self.best_for_image(&decoded)
    }
}

/// Highest confidence wins; the first candidate wins ties.
pub fn pick_best<I>(candidates: I) -> Option<OcrCandidate>
where
    I: IntoIterator<Item = OcrCandidate>,
{
    candidates.into_iter().fold(None, |best, c| match best {
        Some(b) if c.confidence <= b.confidence => Some(b),
        _ => Some(c),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::OcrWord;
    use deckcheck_core::{Error, Result};
    use image::{GrayImage, ImageFormat, Luma};
    use std::cell::RefCell;
    use std::collections::HashMap;
    use std::io::Cursor;

    /// Returns canned words per page segmentation mode.
    struct FakeRecognizer {
        by_psm: HashMap<u8, Result<Vec<OcrWord>>>,
        calls: RefCell<Vec<u8>>,
    }

    impl FakeRecognizer {
        fn new() -> Self {
            Self {
                by_psm: HashMap::new(),
                calls: RefCell::new(Vec::new()),
            }
        }

        fn with(mut self, psm: u8, words: &[(&str, f64)]) -> Self {
            let words = words
                .iter()
                .map(|(t, c)| OcrWord {
                    text: t.to_string(),
                    confidence: *c,
                })
                .collect();
            self.by_psm.insert(psm, Ok(words));
            self
        }

        fn failing(mut self, psm: u8) -> Self {
            self.by_psm
                .insert(psm, Err(Error::OcrError("engine crashed".into())));
            self
        }
    }

    impl WordRecognizer for FakeRecognizer {
        fn recognize(&self, _image: &GrayImage, psm: u8) -> Result<Vec<OcrWord>> {
            self.calls.borrow_mut().push(psm);
            match self.by_psm.get(&psm) {
                Some(Ok(words)) => Ok(words.clone()),
                Some(Err(e)) => Err(Error::OcrError(e.to_string())),
                None => Ok(Vec::new()),
            }
        }
    }

    fn png_bytes() -> Vec<u8> {
        let img = GrayImage::from_fn(60, 60, |x, y| Luma([((x + y) * 2) as u8]));
        let mut buf = Cursor::new(Vec::new());
        img.write_to(&mut buf, ImageFormat::Png).unwrap();
        buf.into_inner()
    }

    fn candidate(text: &str, confidence: f64, method: &str) -> OcrCandidate {
        OcrCandidate {
            text: text.into(),
            confidence,
            method: method.into(),
        }
    }

    #[test]
    fn test_pick_best_first_wins_ties() {
        let best = pick_best(vec![
            candidate("a", 60.0, "PSM6"),
            candidate("b", 80.0, "PSM3"),
            candidate("c", 80.0, "PSM11"),
        ])
        .unwrap();
        assert_eq!(best.method, "PSM3");
        assert!(pick_best(Vec::new()).is_none());
    }

    #[test]
    fn test_highest_confidence_method_wins() {
        let fake = FakeRecognizer::new()
            .with(6, &[("Quarterly", 60.0), ("revenue", 62.0), ("growth", 58.0)])
            .with(3, &[("Quarterly", 90.0), ("revenue", 88.0), ("growth", 92.0)])
            .with(11, &[("Quarterly", 70.0), ("revenue", 70.0)]);
        let ensemble = OcrEnsemble::new(fake, Script::Latin);

        let best = ensemble.extract(&png_bytes()).unwrap();
        assert_eq!(best.method, "PSM3");
        assert_eq!(best.text, "Quarterly revenue growth");
        assert_eq!(best.confidence, 90.0);
        assert_eq!(*ensemble.recognizer().calls.borrow(), vec![6, 3, 11]);
    }

    #[test]
    fn test_single_char_tokens_and_structural_rows_dropped() {
        let fake = FakeRecognizer::new().with(
            6,
            &[("a", 10.0), ("Quarterly", 80.0), ("--", -1.0), ("revenue", 60.0)],
        );
        let ensemble =
            OcrEnsemble::new(fake, Script::Latin).with_methods(vec![DEFAULT_METHODS[0]]);
        let best = ensemble.extract(&png_bytes()).unwrap();
        assert_eq!(best.text, "Quarterly -- revenue");
        assert_eq!(best.confidence, 70.0);
    }

    #[test]
    fn test_quality_gate_rejects_noise() {
        let fake = FakeRecognizer::new()
            .with(6, &[("%%", 95.0), ("##", 95.0), ("1234567", 95.0)])
            .with(3, &[("short", 95.0)]);
        let ensemble = OcrEnsemble::new(fake, Script::Latin);
        assert!(ensemble.extract(&png_bytes()).is_none());
    }

    #[test]
    fn test_low_confidence_winner_is_dropped() {
        let fake = FakeRecognizer::new().with(6, &[("Quarterly", 30.0), ("revenue", 30.0)]);
        let ensemble = OcrEnsemble::new(fake, Script::Latin);
        assert!(ensemble.extract(&png_bytes()).is_none());
    }

    #[test]
    fn test_failing_method_does_not_abort_others() {
        let fake = FakeRecognizer::new()
            .failing(6)
            .with(11, &[("Выручка", 70.0), ("растёт", 72.0)]);
        let ensemble = OcrEnsemble::new(fake, Script::Cyrillic);
        let best = ensemble.extract(&png_bytes()).unwrap();
        assert_eq!(best.method, "PSM11");
        assert_eq!(best.text, "Выручка растет");
    }

    #[test]
    fn test_undecodable_image() {
        let fake = FakeRecognizer::new().with(6, &[("Quarterly", 90.0), ("revenue", 90.0)]);
        let ensemble = OcrEnsemble::new(fake, Script::Latin);
        assert!(ensemble.extract(b"not an image").is_none());
        assert!(ensemble.recognizer().calls.borrow().is_empty());
    }
}
