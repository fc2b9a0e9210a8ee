//! Text normalization for slide text and OCR output.
//!
//! Collapses whitespace, folds look-alike punctuation to ASCII, and judges
//! whether OCR output looks like real text rather than noise.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;
use unicode_normalization::UnicodeNormalization;

/// Regex to collapse runs of whitespace (including newlines) into one space.
static WHITESPACE_COLLAPSE_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").unwrap());

/// Look-alike characters and their ASCII replacements.
const PUNCTUATION_FOLDS: &[(char, &str)] = &[
    ('\u{2014}', "-"), // em dash
    ('\u{2013}', "-"), // en dash
    ('«', "\""),
    ('»', "\""),
    ('„', "\""),
    ('\u{201C}', "\""),
    ('\u{201D}', "\""),
    ('\u{2018}', "'"),
    ('\u{2019}', "'"),
];

/// OCR results shorter than this never pass the quality gate.
pub const QUALITY_MIN_LEN: usize = 10;

/// At or above this confidence the stricter script ratio applies.
pub const QUALITY_HIGH_CONFIDENCE: f64 = 50.0;

/// Script ratio required for high-confidence results.
pub const QUALITY_STRICT_RATIO: f64 = 0.6;

/// Script ratio required otherwise.
pub const QUALITY_LENIENT_RATIO: f64 = 0.35;

/// Collapse whitespace runs to single spaces and trim.
pub fn collapse_whitespace(text: &str) -> String {
    WHITESPACE_COLLAPSE_REGEX
        .replace_all(text.trim(), " ")
        .into_owned()
}

/// Clean raw OCR output before it is judged or merged.
///
/// - Trims and composes to NFC
/// - Folds curly quotes, guillemets and em/en dashes to ASCII
/// - Folds `ё`/`Ё` to `е`/`Е`
/// - Collapses whitespace runs
pub fn clean_ocr_text(text: &str) -> String {
    let composed: String = text.trim().nfc().collect();
    let mut out = String::with_capacity(composed.len());

    for c in composed.chars() {
        match c {
            'ё' => out.push('е'),
            'Ё' => out.push('Е'),
            _ => match PUNCTUATION_FOLDS.iter().find(|(from, _)| *from == c) {
                Some((_, to)) => out.push_str(to),
                None => out.push(c),
            },
        }
    }

    collapse_whitespace(&out)
}

/// Letter script expected in slide images.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Script {
    Latin,
    Cyrillic,
}

impl Script {
    /// Pick the script from an OCR language hint such as `rus+eng`.
    pub fn from_language_hint(hint: &str) -> Self {
        if hint.split('+').any(|lang| lang.trim() == "rus") {
            Self::Cyrillic
        } else {
            Self::Latin
        }
    }

    fn contains(&self, c: char) -> bool {
        match self {
            Self::Latin => c.is_ascii_alphabetic(),
            Self::Cyrillic => {
                let lower = c.to_lowercase().next().unwrap_or(c);
                ('а'..='я').contains(&lower) || lower == 'ё'
            }
        }
    }
}

/// Share of alphabetic characters that belong to `script`.
///
/// `None` when the text has no letters at all.
pub fn script_ratio(text: &str, script: Script) -> Option<f64> {
    let letters = text.chars().filter(|c| c.is_alphabetic()).count();
    if letters == 0 {
        return None;
    }
    let in_script = text.chars().filter(|&c| script.contains(c)).count();
    Some(in_script as f64 / letters as f64)
}

/// Quick plausibility gate for one OCR run.
///
/// Rejects short output, output without letters, and output whose letters
/// are mostly outside the expected script. High-confidence output has to
/// clear the stricter ratio, so noise with an inflated score is dropped.
pub fn passes_quality_gate(text: &str, confidence: f64, script: Script) -> bool {
    if text.chars().count() < QUALITY_MIN_LEN {
        return false;
    }
    let Some(ratio) = script_ratio(text, script) else {
        return false;
    };
    if confidence >= QUALITY_HIGH_CONFIDENCE {
        ratio >= QUALITY_STRICT_RATIO
    } else {
        ratio >= QUALITY_LENIENT_RATIO
    }
}

/// Whether cleaned OCR text is long enough to count as baked-in text.
pub fn is_meaningful(text: &str, min_len: usize) -> bool {
    !text.is_empty() && clean_ocr_text(text).chars().count() >= min_len
}
