//! Deck-wide font inventory.
//!
//! Fonts can only be judged once every slide has been seen, so collection
//! and judgment are separate steps: slides feed names in, then
//! [`FontInventory::finalize`] settles the verdict on all findings at once.

use crate::finding::{SlideFinding, Violation};
use std::collections::BTreeSet;

/// Theme placeholders and common system/template fonts that do not count
/// towards the font limit. Matched as case-insensitive substrings.
pub const SYSTEM_FONTS: &[&str] = &[
    "+mj-lt",
    "+mn-lt",
    "calibri",
    "tahoma",
    "arial",
    "times",
    "verdana",
    "cambria",
    "segoe ui",
    "consolas",
    "courier new",
    "georgia",
    "impact",
    "trebuchet ms",
];

/// Most distinct custom fonts a deck may use.
pub const MAX_FONTS: usize = 2;

/// Accumulates font names across the analyzed slides of one run.
#[derive(Debug, Clone, Default)]
pub struct FontInventory {
    used: BTreeSet<String>,
}

impl FontInventory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record font names from one slide. Blank names are ignored.
    pub fn add<I, S>(&mut self, names: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for name in names {
            let name = name.as_ref().trim();
            if !name.is_empty() {
                self.used.insert(name.to_string());
            }
        }
    }

    /// Every font name seen so far.
    pub fn used(&self) -> &BTreeSet<String> {
        &self.used
    }

    /// Fonts that count towards the limit.
    pub fn custom_fonts(&self) -> BTreeSet<&str> {
        self.used
            .iter()
            .map(String::as_str)
            .filter(|name| !is_system_font(name))
            .collect()
    }

    /// Settle the font verdict on every finding and return the distinct
    /// custom font count.
    pub fn finalize(&self, findings: &mut [SlideFinding]) -> usize {
        let count = self.custom_fonts().len();
        let too_many = count > MAX_FONTS;

        if too_many {
            log::info!("Deck uses {} custom fonts (limit {})", count, MAX_FONTS);
        }

        for finding in findings.iter_mut() {
            if too_many {
                if !finding.has_font_violation() {
                    finding.record(Violation::FontCount(count));
                }
            } else {
                finding.fonts_ok = Some(true);
            }
        }

        count
    }
}

/// Whether a font name matches the system/template allowlist.
pub fn is_system_font(name: &str) -> bool {
    let lower = name.to_lowercase();
    SYSTEM_FONTS.iter().any(|s| lower.contains(s))
}
