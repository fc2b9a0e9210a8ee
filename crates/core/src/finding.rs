//! Per-slide findings and deck-level statistics produced by an analysis run.

use serde::Serialize;
use std::fmt;

/// Status string for a slide without violations.
pub const STATUS_OK: &str = "OK";

/// One failed criterion on a slide.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Violation {
    Background,
    /// Slide text exceeds the limit; carries the character count.
    TextVolume(usize),
    Animations,
    TextOnImage,
    /// Deck uses too many fonts; carries the distinct font count.
    FontCount(usize),
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Background => write!(f, "BACKGROUND"),
            Self::TextVolume(n) => write!(f, "TEXT({})", n),
            Self::Animations => write!(f, "ANIMATIONS"),
            Self::TextOnImage => write!(f, "TEXT_ON_IMAGE"),
            Self::FontCount(n) => write!(f, "FONTS({})", n),
        }
    }
}

/// Best OCR result for a single image. Discarded once merged.
#[derive(Debug, Clone, PartialEq)]
pub struct OcrCandidate {
    pub text: String,
    pub confidence: f64,
    /// Name of the OCR configuration that produced this result.
    pub method: String,
}

/// Merged OCR payload attached to a slide.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OcrSummary {
    pub text: String,
    /// Mean confidence of the contributing images.
    pub confidence: f64,
    /// Method of the single most confident image.
    pub method: String,
    pub images_with_text: usize,
}

/// Analysis result for one slide.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SlideFinding {
    /// 1-based index in the original deck.
    pub slide: usize,

    violations: Vec<Violation>,
    status: String,

    pub background_ok: bool,

    /// Deck-wide font verdict; `None` until the font inventory is finalized.
    pub fonts_ok: Option<bool>,

    pub text_ok: bool,
    pub char_count: usize,
    /// Human-readable character count, e.g. `"812 chars"`.
    pub text_detail: String,

    pub animations_ok: bool,

    /// Transitions are judged deck-wide; the per-slide column always passes.
    pub transitions_ok: bool,

    pub text_on_image: bool,
    pub ocr: Option<OcrSummary>,

    pub shape_count: usize,
    pub image_count: usize,
}

impl SlideFinding {
    /// Create a passing finding for a slide.
    pub fn new(slide: usize) -> Self {
        Self {
            slide,
            violations: Vec::new(),
            status: STATUS_OK.to_string(),
            background_ok: true,
            fonts_ok: None,
            text_ok: true,
            char_count: 0,
            text_detail: String::new(),
            animations_ok: true,
            transitions_ok: true,
            text_on_image: false,
            ocr: None,
            shape_count: 0,
            image_count: 0,
        }
    }

    /// Record a violation and the matching verdict, keeping the status in sync.
    pub fn record(&mut self, violation: Violation) {
        match violation {
            Violation::Background => self.background_ok = false,
            Violation::TextVolume(n) => {
                self.text_ok = false;
                self.char_count = n;
            }
            Violation::Animations => self.animations_ok = false,
            Violation::TextOnImage => self.text_on_image = true,
            Violation::FontCount(_) => self.fonts_ok = Some(false),
        }
        if !self.violations.contains(&violation) {
            self.violations.push(violation);
        }
        self.status = self
            .violations
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(", ");
    }

    pub fn violations(&self) -> &[Violation] {
        &self.violations
    }

    /// Comma-joined violation tags, or `"OK"`.
    pub fn status(&self) -> &str {
        &self.status
    }

    pub fn has_font_violation(&self) -> bool {
        self.violations
            .iter()
            .any(|v| matches!(v, Violation::FontCount(_)))
    }

    /// Fonts verdict with a pending verdict read as a pass.
    pub fn fonts_pass(&self) -> bool {
        self.fonts_ok.unwrap_or(true)
    }

    /// True when all five per-slide criteria hold at once.
    pub fn is_fully_compliant(&self) -> bool {
        self.background_ok
            && self.fonts_pass()
            && self.text_ok
            && !self.text_on_image
            && self.animations_ok
    }
}

/// Deck-level counters for a run.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DeckStats {
    /// Slides with animation markup.
    pub slides_with_animations: usize,
    /// Any transition on any slide of the deck.
    pub has_transitions: bool,
    /// Distinct non-system fonts across analyzed slides.
    pub font_count: usize,
    pub background_issues: usize,
    pub text_on_image_slides: usize,
    pub total_images: usize,
    pub ocr_enabled: bool,
    pub ocr_available: bool,
    pub ocr_used: bool,
    pub total_ocr_characters: usize,
    /// Selection string as given by the caller.
    pub requested_range: String,
    /// Selection actually honored (`"all"` after a fallback).
    pub effective_range: String,
    pub total_slides: usize,
    pub analyzed_slides: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_finding_is_ok() {
        let f = SlideFinding::new(3);
        assert!(f.violations().is_empty());
        assert_eq!(f.status(), STATUS_OK);
        assert!(f.is_fully_compliant());
    }

    #[test]
    fn test_status_tracks_violations() {
        let mut f = SlideFinding::new(1);
        f.record(Violation::Background);
        f.record(Violation::TextVolume(1500));
        assert_eq!(f.status(), "BACKGROUND, TEXT(1500)");
        assert!(!f.background_ok);
        assert!(!f.text_ok);
        assert_eq!(f.char_count, 1500);
        assert!(!f.is_fully_compliant());
    }

    #[test]
    fn test_record_is_idempotent() {
        let mut f = SlideFinding::new(1);
        f.record(Violation::FontCount(3));
        f.record(Violation::FontCount(3));
        assert_eq!(f.violations().len(), 1);
        assert_eq!(f.status(), "FONTS(3)");
        assert_eq!(f.fonts_ok, Some(false));
        assert!(f.has_font_violation());
    }

    #[test]
    fn test_violation_tags() {
        assert_eq!(Violation::Animations.to_string(), "ANIMATIONS");
        assert_eq!(Violation::TextOnImage.to_string(), "TEXT_ON_IMAGE");
    }
}
