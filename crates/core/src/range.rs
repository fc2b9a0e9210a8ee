//! Slide selection parsing.
//!
//! Accepts `all` (or an empty string), a single number (`4`), a range
//! (`2-5`) or a comma-separated mix (`1,3,5-7`). Parsing is lenient:
//! malformed pieces are ignored, and anything that resolves to no slides
//! falls back to the whole deck.

/// Selection keyword for the whole deck.
pub const ALL: &str = "all";

/// Resolved slide selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlideSelection {
    /// Sorted, duplicate-free, 1-based slide indices within the deck.
    pub indices: Vec<usize>,

    /// True when the requested expression was not honored and the whole
    /// deck was selected instead.
    pub fell_back: bool,
}

impl SlideSelection {
    /// Resolve a selection expression against a deck of `total` slides.
    pub fn parse(expr: Option<&str>, total: usize) -> Self {
        let expr = expr.map(str::trim).unwrap_or("");
        if expr.is_empty() || expr.eq_ignore_ascii_case(ALL) {
            return Self::all(total, false);
        }

        let mut indices = parse_indices(expr, total);
        indices.retain(|&n| n >= 1 && n <= total);
        indices.sort_unstable();
        indices.dedup();

        if indices.is_empty() {
            log::warn!(
                "Slide selection '{}' matched no slides of {}, analyzing all slides",
                expr,
                total
            );
            return Self::all(total, true);
        }

        Self {
            indices,
            fell_back: false,
        }
    }

    fn all(total: usize, fell_back: bool) -> Self {
        Self {
            indices: (1..=total).collect(),
            fell_back,
        }
    }

    /// Descriptor of the selection actually used: the request, or `all`.
    pub fn effective_range(&self, requested: Option<&str>) -> String {
        match requested.map(str::trim) {
            Some(r) if !self.fell_back && !r.is_empty() => r.to_string(),
            _ => ALL.to_string(),
        }
    }
}

fn parse_indices(expr: &str, total: usize) -> Vec<usize> {
    if let Some(n) = parse_number(expr) {
        return vec![n];
    }

    let compact: String = expr.chars().filter(|c| *c != ' ').collect();
    let mut indices = Vec::new();

    if compact.contains(',') {
        for part in compact.split(',') {
            if part.contains('-') {
                if let Some(range) = parse_range(part, total) {
                    indices.extend(range);
                }
            } else if let Some(n) = parse_number(part) {
                indices.push(n);
            }
        }
    } else if compact.contains('-') {
        if let Some(range) = parse_range(&compact, total) {
            indices.extend(range);
        }
    }

    indices
}

/// `a-b` with the end clamped to the deck size. The start is left to the
/// final clamp.
fn parse_range(part: &str, total: usize) -> Option<std::ops::RangeInclusive<usize>> {
    let (a, b) = part.split_once('-')?;
    let start = parse_number(a)?;
    let end = parse_number(b)?;
    Some(start..=end.min(total))
}

fn parse_number(s: &str) -> Option<usize> {
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    s.parse().ok()
}
