//! Per-slide style inspectors: background, text volume, animations and
//! transitions.

use crate::classify::ClassifiedShapes;
use crate::normalize::collapse_whitespace;
use crate::types::{Color, Deck, Fill, Slide};
use regex::Regex;
use std::sync::LazyLock;

/// Literal hex color tokens in raw markup.
static HEX_COLOR_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"#[0-9a-f]{6}").unwrap());

/// Hex tokens that count as white.
const WHITE_HEX_TOKENS: &[&str] = &["#ffffff", "#ffffff00"];

/// Markup constructs associated with animation timing and effects.
/// Matched against lowercased slide XML.
static ANIMATION_MARKERS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"<p:anim\s",
        r"p:ctn",
        r"p:seq",
        r"p:par",
        r#"dur=['"]"#,
        r#"accel=['"]"#,
        r#"decel=['"]"#,
        r"<p:custanim\s",
        r"<p:set\s",
        r"animate\s",
        r"animation\s",
        r"animbullet\s",
        r"animeffect\s",
    ]
    .iter()
    .map(|p| Regex::new(p).unwrap())
    .collect()
});

/// Transition elements in any namespace (`p:transition`, `p14:...`).
static TRANSITION_MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)<(?:[a-z0-9]+:)?transition[\s/>]").unwrap());

/// Result of a single check.
///
/// `Indeterminate` means the check could not reach a verdict (unresolved
/// color, missing geometry); it is read as no violation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckOutcome {
    Violation,
    NoViolation,
    Indeterminate,
}

impl CheckOutcome {
    pub fn is_violation(&self) -> bool {
        matches!(self, Self::Violation)
    }

    fn worst(self, other: Self) -> Self {
        match (self, other) {
            (Self::Violation, _) | (_, Self::Violation) => Self::Violation,
            (Self::Indeterminate, _) | (_, Self::Indeterminate) => Self::Indeterminate,
            _ => Self::NoViolation,
        }
    }
}

/// The three independent background signals for one slide.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BackgroundChecks {
    pub slide_fill: CheckOutcome,
    pub large_shapes: CheckOutcome,
    pub markup_colors: CheckOutcome,
}

impl BackgroundChecks {
    /// Run all three checks; none short-circuits the others.
    pub fn run(slide: &Slide, deck: &Deck, area_ratio: f64) -> Self {
        let checks = Self {
            slide_fill: check_slide_fill(&slide.background),
            large_shapes: check_large_shapes(slide, deck, area_ratio),
            markup_colors: check_markup_colors(&slide.xml),
        };
        log::debug!("Slide {} background checks: {:?}", slide.number, checks);
        checks
    }

    /// True when no check found a violation.
    pub fn passes(&self) -> bool {
        !(self.slide_fill.is_violation()
            || self.large_shapes.is_violation()
            || self.markup_colors.is_violation())
    }
}

/// Whether the slide's background is pure white.
pub fn inspect_background(slide: &Slide, deck: &Deck, area_ratio: f64) -> bool {
    BackgroundChecks::run(slide, deck, area_ratio).passes()
}

fn check_slide_fill(fill: &Fill) -> CheckOutcome {
    match fill {
        Fill::NoFill | Fill::Inherited => CheckOutcome::NoViolation,
        Fill::Solid(color) => solid_outcome(color),
        Fill::Gradient | Fill::Pattern | Fill::Picture => CheckOutcome::Violation,
    }
}

fn solid_outcome(color: &Color) -> CheckOutcome {
    match color {
        Color::Rgb(..) if color.is_white() => CheckOutcome::NoViolation,
        Color::Rgb(..) => CheckOutcome::Violation,
        Color::Scheme(_) | Color::Unknown => CheckOutcome::Indeterminate,
    }
}

fn check_large_shapes(slide: &Slide, deck: &Deck, area_ratio: f64) -> CheckOutcome {
    let slide_area = deck.slide_area() as f64;
    let mut outcome = CheckOutcome::NoViolation;

    for shape in slide.leaf_shapes() {
        let Some(bounds) = shape.bounds else {
            outcome = outcome.worst(CheckOutcome::Indeterminate);
            continue;
        };
        if (bounds.area() as f64) <= slide_area * area_ratio {
            continue;
        }
        if let Fill::Solid(color) = &shape.fill {
            outcome = outcome.worst(solid_outcome(color));
        }
    }

    outcome
}

fn check_markup_colors(xml: &str) -> CheckOutcome {
    let lower = xml.to_lowercase();
    let off_white = HEX_COLOR_REGEX
        .find_iter(&lower)
        .any(|m| !WHITE_HEX_TOKENS.contains(&m.as_str()));
    if off_white {
        CheckOutcome::Violation
    } else {
        CheckOutcome::NoViolation
    }
}

/// Visible character count over all text shapes, whitespace runs collapsed.
///
/// Returns `(over_limit, total)`.
pub fn inspect_text_volume(shapes: &ClassifiedShapes, max_chars: usize) -> (bool, usize) {
    let total: usize = shapes
        .text_shapes
        .iter()
        .filter(|s| s.char_count > 1)
        .map(|s| collapse_whitespace(&s.text).chars().count())
        .sum();
    (total > max_chars, total)
}

/// Whether the slide markup contains animation constructs.
pub fn has_animations(slide_xml: &str) -> bool {
    let lower = slide_xml.to_lowercase();
    ANIMATION_MARKERS.iter().any(|re| re.is_match(&lower))
}

/// Whether a single slide's markup carries a transition.
pub fn has_transition(slide_xml: &str) -> bool {
    TRANSITION_MARKER.is_match(slide_xml)
}

/// Whether any slide of the deck carries a transition.
pub fn deck_has_transitions(deck: &Deck) -> bool {
    deck.slides.iter().any(|s| has_transition(&s.xml))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::classify;
    use crate::types::{Rect, Shape, TextFrame};

    fn deck() -> Deck {
        Deck::new("test.pptx").with_slide_size(1000, 1000)
    }

    fn filled_shape(bounds: Option<Rect>, fill: Fill) -> Shape {
        Shape {
            bounds,
            fill,
            ..Default::default()
        }
    }

    #[test]
    fn test_white_and_inherited_backgrounds_pass() {
        let deck = deck();
        let mut slide = Slide::new(1);
        assert!(inspect_background(&slide, &deck, 0.7));

        slide.background = Fill::Solid(Color::Rgb(255, 255, 255));
        assert!(inspect_background(&slide, &deck, 0.7));

        slide.background = Fill::NoFill;
        assert!(inspect_background(&slide, &deck, 0.7));
    }

    #[test]
    fn test_colored_background_fails() {
        let deck = deck();
        let mut slide = Slide::new(1);
        slide.background = Fill::Solid(Color::Rgb(250, 250, 250));
        assert!(!inspect_background(&slide, &deck, 0.7));

        slide.background = Fill::Gradient;
        assert!(!inspect_background(&slide, &deck, 0.7));
    }

    #[test]
    fn test_scheme_color_is_indeterminate() {
        let deck = deck();
        let mut slide = Slide::new(1);
        slide.background = Fill::Solid(Color::Scheme("accent1".into()));
        let checks = BackgroundChecks::run(&slide, &deck, 0.7);
        assert_eq!(checks.slide_fill, CheckOutcome::Indeterminate);
        assert!(checks.passes());
    }

    #[test]
    fn test_large_colored_shape_fails() {
        let deck = deck();
        let mut slide = Slide::new(1);
        slide.shapes.push(filled_shape(
            Some(Rect::new(0, 0, 1000, 800)),
            Fill::Solid(Color::Rgb(0, 0, 128)),
        ));
        let checks = BackgroundChecks::run(&slide, &deck, 0.7);
        assert_eq!(checks.slide_fill, CheckOutcome::NoViolation);
        assert_eq!(checks.large_shapes, CheckOutcome::Violation);
        assert!(!checks.passes());
    }

    #[test]
    fn test_small_colored_shape_passes() {
        let deck = deck();
        let mut slide = Slide::new(1);
        slide.shapes.push(filled_shape(
            Some(Rect::new(0, 0, 500, 500)),
            Fill::Solid(Color::Rgb(0, 0, 128)),
        ));
        slide.shapes.push(filled_shape(None, Fill::Solid(Color::Rgb(1, 2, 3))));
        let checks = BackgroundChecks::run(&slide, &deck, 0.7);
        assert_eq!(checks.large_shapes, CheckOutcome::Indeterminate);
        assert!(checks.passes());
    }

    #[test]
    fn test_markup_hex_colors() {
        let deck = deck();
        let mut slide = Slide::new(1);
        slide.xml = r##"<p:sld><x color="#FFFFFF"/></p:sld>"##.into();
        assert!(inspect_background(&slide, &deck, 0.7));

        slide.xml = r##"<p:sld><x color="#FFFFFF00"/><y c="#1a2B3c"/></p:sld>"##.into();
        let checks = BackgroundChecks::run(&slide, &deck, 0.7);
        assert_eq!(checks.markup_colors, CheckOutcome::Violation);
        assert!(!checks.passes());
    }

    #[test]
    fn test_background_is_deterministic() {
        let deck = deck();
        let mut slide = Slide::new(1);
        slide.xml = r#"<a:srgbClr val="123456"/>"#.into();
        slide.background = Fill::Solid(Color::Rgb(255, 255, 255));
        let first = BackgroundChecks::run(&slide, &deck, 0.7);
        let second = BackgroundChecks::run(&slide, &deck, 0.7);
        assert_eq!(first, second);
    }

    fn slide_with_texts(texts: &[&str]) -> Slide {
        let mut slide = Slide::new(1);
        for t in texts {
            slide.shapes.push(Shape {
                text: Some(TextFrame {
                    text: t.to_string(),
                    fonts: Vec::new(),
                }),
                ..Default::default()
            });
        }
        slide
    }

    #[test]
    fn test_text_volume_counts_and_threshold() {
        let slide = slide_with_texts(&["Hello world", "x", "abc"]);
        let (over, total) = inspect_text_volume(&classify(&slide), 1000);
        assert!(!over);
        // Single-character shapes are not counted
        assert_eq!(total, 14);

        let long = "a".repeat(1001);
        let slide = slide_with_texts(&[&long]);
        assert_eq!(inspect_text_volume(&classify(&slide), 1000), (true, 1001));

        let exact = "a".repeat(1000);
        let slide = slide_with_texts(&[&exact]);
        assert_eq!(inspect_text_volume(&classify(&slide), 1000), (false, 1000));
    }

    #[test]
    fn test_text_volume_ignores_whitespace_runs() {
        let a = slide_with_texts(&["Hello world\nagain"]);
        let b = slide_with_texts(&["Hello    world \n\n\t again"]);
        assert_eq!(
            inspect_text_volume(&classify(&a), 1000),
            inspect_text_volume(&classify(&b), 1000)
        );
    }

    #[test]
    fn test_animation_markers() {
        assert!(!has_animations("<p:sld><p:cSld/></p:sld>"));
        assert!(has_animations(
            r#"<p:timing><p:tnLst><p:par><p:cTn id="1" dur="indefinite"/></p:par></p:tnLst></p:timing>"#
        ));
        assert!(has_animations(r#"<P:ANIM calcmode="lin">"#));
    }

    #[test]
    fn test_transition_markers() {
        assert!(!has_transition("<p:sld><p:cSld/></p:sld>"));
        assert!(has_transition(r#"<p:transition spd="slow"><p:fade/></p:transition>"#));
        assert!(has_transition("<p:transition/>"));
        assert!(has_transition(r#"<p14:transition dur="500">"#));

        let mut deck = deck();
        deck.add_slide(Slide::new(1));
        assert!(!deck_has_transitions(&deck));
        let mut slide = Slide::new(2);
        slide.xml = "<p:transition/>".into();
        deck.add_slide(slide);
        assert!(deck_has_transitions(&deck));
    }
}
