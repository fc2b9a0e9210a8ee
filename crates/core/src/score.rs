//! Conformance scoring: turns slide findings and deck statistics into a
//! weighted percentage, a readiness tier and recommendations.

use crate::finding::{DeckStats, SlideFinding};
use crate::fonts::MAX_FONTS;
use serde::Serialize;

pub const WEIGHT_BACKGROUND: f64 = 15.0;
pub const WEIGHT_FONTS: f64 = 15.0;
pub const WEIGHT_TEXT_OVERLOAD: f64 = 10.0;
pub const WEIGHT_TEXT_ON_IMAGES: f64 = 15.0;
pub const WEIGHT_ANIMATIONS: f64 = 15.0;
pub const WEIGHT_TRANSITIONS: f64 = 10.0;
pub const WEIGHT_SLIDE_COMPLIANCE: f64 = 20.0;

/// Sum of all weights.
pub const TOTAL_POSSIBLE: f64 = WEIGHT_BACKGROUND
    + WEIGHT_FONTS
    + WEIGHT_TEXT_OVERLOAD
    + WEIGHT_TEXT_ON_IMAGES
    + WEIGHT_ANIMATIONS
    + WEIGHT_TRANSITIONS
    + WEIGHT_SLIDE_COMPLIANCE;

/// Percentage at or above which the deck can go to designers. Not aligned
/// with any tier edge.
pub const SENDABLE_THRESHOLD: f64 = 57.0;

/// Readiness band of the overall percentage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum ReadinessTier {
    CriticallyLow,
    NeedsWork,
    Satisfactory,
    Good,
    Excellent,
}

impl ReadinessTier {
    /// Tier for a percentage (inclusive lower bounds).
    pub fn from_percentage(percentage: f64) -> Self {
        if percentage >= 90.0 {
            Self::Excellent
        } else if percentage >= 75.0 {
            Self::Good
        } else if percentage >= 60.0 {
            Self::Satisfactory
        } else if percentage >= 40.0 {
            Self::NeedsWork
        } else {
            Self::CriticallyLow
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Excellent => "excellent",
            Self::Good => "good",
            Self::Satisfactory => "satisfactory",
            Self::NeedsWork => "needs work",
            Self::CriticallyLow => "critically low",
        }
    }

    /// Display color as a hex string.
    pub fn color(&self) -> &'static str {
        match self {
            Self::Excellent => "#27ae60",
            Self::Good => "#2ecc71",
            Self::Satisfactory => "#f39c12",
            Self::NeedsWork => "#e74c3c",
            Self::CriticallyLow => "#c0392b",
        }
    }

    pub fn emblem(&self) -> &'static str {
        match self {
            Self::Excellent => "🎉",
            Self::Good => "👍",
            Self::Satisfactory => "⚠️",
            Self::NeedsWork => "🔧",
            Self::CriticallyLow => "🚨",
        }
    }
}

/// Achieved and maximum points for one criterion.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CriterionScore {
    /// Rounded to one decimal.
    pub score: f64,
    pub max: f64,
    /// Violation count behind the score (slides, fonts, or 0/1 for
    /// transitions).
    pub issues: usize,
}

/// Per-criterion breakdown.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CriteriaBreakdown {
    pub background: CriterionScore,
    pub fonts: CriterionScore,
    pub text_overload: CriterionScore,
    pub text_on_images: CriterionScore,
    pub animations: CriterionScore,
    pub transitions: CriterionScore,
    pub slide_compliance: CriterionScore,
}

/// Overall conformance of an analyzed deck.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConformanceReport {
    /// 0–100, one decimal.
    pub percentage: f64,
    pub tier: ReadinessTier,
    pub can_send: bool,
    pub criteria: CriteriaBreakdown,
    /// Slides meeting all five per-slide criteria.
    pub compliant_slides: usize,
    pub total_slides: usize,
    pub achieved_score: f64,
    pub total_possible: f64,
    pub recommendations: Vec<String>,
    pub summary: String,
}

/// Score an analysis run.
///
/// Pure and deterministic. Returns `None` when the inputs are inconsistent
/// (a stats counter larger than the number of findings) or the result is
/// not a finite percentage; callers should show that as "no score".
pub fn score(findings: &[SlideFinding], stats: &DeckStats) -> Option<ConformanceReport> {
    let total = findings.len();

    let bg_issues = stats.background_issues;
    let fonts_count = stats.font_count;
    let text_issues = findings.iter().filter(|f| !f.text_ok).count();
    let image_issues = stats.text_on_image_slides;
    let anim_issues = findings.iter().filter(|f| !f.animations_ok).count();
    let has_transitions = stats.has_transitions;
    let compliant = findings.iter().filter(|f| f.is_fully_compliant()).count();

    if bg_issues > total || image_issues > total {
        log::warn!(
            "Inconsistent stats: {} background / {} image issues for {} slides",
            bg_issues,
            image_issues,
            total
        );
        return None;
    }

    let bg_score = proportional(total, bg_issues, WEIGHT_BACKGROUND);
    let fonts_score = if fonts_count <= MAX_FONTS {
        WEIGHT_FONTS
    } else if fonts_count == MAX_FONTS + 1 {
        WEIGHT_FONTS * 0.5
    } else {
        0.0
    };
    let text_score = proportional(total, text_issues, WEIGHT_TEXT_OVERLOAD);
    let image_score = proportional(total, image_issues, WEIGHT_TEXT_ON_IMAGES);
    let anim_score = proportional(total, anim_issues, WEIGHT_ANIMATIONS);
    let transition_score = if has_transitions {
        0.0
    } else {
        WEIGHT_TRANSITIONS
    };
    let slide_score = if total == 0 {
        WEIGHT_SLIDE_COMPLIANCE
    } else {
        compliant as f64 / total as f64 * WEIGHT_SLIDE_COMPLIANCE
    };

    let achieved = bg_score
        + fonts_score
        + text_score
        + image_score
        + anim_score
        + transition_score
        + slide_score;
    let percentage = round1(achieved / TOTAL_POSSIBLE * 100.0);
    if !percentage.is_finite() {
        return None;
    }

    let tier = ReadinessTier::from_percentage(percentage);
    let can_send = percentage >= SENDABLE_THRESHOLD;

    let mut recommendations = Vec::new();
    if !can_send {
        recommendations
            .push("Rework the presentation before sending it to designers".to_string());
    }
    if bg_issues > 0 {
        recommendations.push(format!("Fix the background on {} slide(s)", bg_issues));
    }
    if fonts_count > MAX_FONTS {
        recommendations.push(format!(
            "Reduce the number of fonts from {} to {}",
            fonts_count, MAX_FONTS
        ));
    }
    if text_issues > 0 {
        recommendations.push(format!("Reduce the text on {} slide(s)", text_issues));
    }
    if image_issues > 0 {
        recommendations.push(format!(
            "Remove text from images on {} slide(s)",
            image_issues
        ));
    }
    if anim_issues > 0 {
        recommendations.push(format!("Remove animations from {} slide(s)", anim_issues));
    }
    if has_transitions {
        recommendations.push("Remove transitions between slides".to_string());
    }

    let summary = if can_send {
        format!(
            "Your presentation meets the criteria at {}%. It is ready to send to designers!",
            percentage
        )
    } else {
        format!(
            "Your presentation meets the criteria at {}%. If you plan to send it to designers, rework is recommended.",
            percentage
        )
    };

    let criterion = |score: f64, max: f64, issues: usize| CriterionScore {
        score: round1(score),
        max,
        issues,
    };

    Some(ConformanceReport {
        percentage,
        tier,
        can_send,
        criteria: CriteriaBreakdown {
            background: criterion(bg_score, WEIGHT_BACKGROUND, bg_issues),
            fonts: criterion(fonts_score, WEIGHT_FONTS, fonts_count),
            text_overload: criterion(text_score, WEIGHT_TEXT_OVERLOAD, text_issues),
            text_on_images: criterion(image_score, WEIGHT_TEXT_ON_IMAGES, image_issues),
            animations: criterion(anim_score, WEIGHT_ANIMATIONS, anim_issues),
            transitions: criterion(
                transition_score,
                WEIGHT_TRANSITIONS,
                usize::from(has_transitions),
            ),
            slide_compliance: criterion(slide_score, WEIGHT_SLIDE_COMPLIANCE, compliant),
        },
        compliant_slides: compliant,
        total_slides: total,
        achieved_score: round1(achieved),
        total_possible: TOTAL_POSSIBLE,
        recommendations,
        summary,
    })
}

/// `(total - issues) / total × weight`, full weight for an empty deck.
fn proportional(total: usize, issues: usize, weight: f64) -> f64 {
    if total == 0 {
        return weight;
    }
    total.saturating_sub(issues) as f64 / total as f64 * weight
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::finding::Violation;

    fn clean_rows(n: usize) -> Vec<SlideFinding> {
        (1..=n)
            .map(|i| {
                let mut f = SlideFinding::new(i);
                f.fonts_ok = Some(true);
                f
            })
            .collect()
    }

    fn stats_for(rows: &[SlideFinding]) -> DeckStats {
        DeckStats {
            background_issues: rows.iter().filter(|r| !r.background_ok).count(),
            text_on_image_slides: rows.iter().filter(|r| r.text_on_image).count(),
            slides_with_animations: rows.iter().filter(|r| !r.animations_ok).count(),
            font_count: 1,
            total_slides: rows.len(),
            analyzed_slides: rows.len(),
            ..Default::default()
        }
    }

    #[test]
    fn test_clean_deck_scores_100() {
        let rows = clean_rows(3);
        let report = score(&rows, &stats_for(&rows)).unwrap();
        assert_eq!(report.percentage, 100.0);
        assert_eq!(report.tier, ReadinessTier::Excellent);
        assert_eq!(report.tier.label(), "excellent");
        assert!(report.can_send);
        assert_eq!(report.compliant_slides, 3);
        assert!(report.recommendations.is_empty());
        assert!(report.summary.contains("ready to send"));
    }

    #[test]
    fn test_background_and_text_issues() {
        let mut rows = clean_rows(3);
        rows[1].record(Violation::Background);
        rows[2].record(Violation::TextVolume(1500));
        let report = score(&rows, &stats_for(&rows)).unwrap();

        assert_eq!(report.criteria.background.score, 10.0);
        assert_eq!(report.criteria.text_overload.score, 6.7);
        assert_eq!(report.criteria.slide_compliance.score, 6.7);
        assert_eq!(report.percentage, 78.3);
        assert_eq!(report.tier, ReadinessTier::Good);
        assert_eq!(
            report.recommendations,
            vec![
                "Fix the background on 1 slide(s)".to_string(),
                "Reduce the text on 1 slide(s)".to_string(),
            ]
        );
    }

    #[test]
    fn test_font_step_function() {
        let rows = clean_rows(2);
        let mut stats = stats_for(&rows);

        stats.font_count = 2;
        assert_eq!(score(&rows, &stats).unwrap().criteria.fonts.score, 15.0);
        stats.font_count = 3;
        let report = score(&rows, &stats).unwrap();
        assert_eq!(report.criteria.fonts.score, 7.5);
        assert!(report
            .recommendations
            .contains(&"Reduce the number of fonts from 3 to 2".to_string()));
        stats.font_count = 4;
        assert_eq!(score(&rows, &stats).unwrap().criteria.fonts.score, 0.0);
    }

    #[test]
    fn test_single_transition_forfeits_weight() {
        let rows = clean_rows(4);
        let mut stats = stats_for(&rows);
        stats.has_transitions = true;
        let report = score(&rows, &stats).unwrap();
        assert_eq!(report.criteria.transitions.score, 0.0);
        assert_eq!(report.percentage, 90.0);
        assert_eq!(
            report.recommendations.last().map(String::as_str),
            Some("Remove transitions between slides")
        );
    }

    #[test]
    fn test_below_sendable_threshold() {
        let mut rows = clean_rows(2);
        for r in rows.iter_mut() {
            r.record(Violation::Background);
            r.record(Violation::Animations);
            r.record(Violation::TextOnImage);
        }
        let mut stats = stats_for(&rows);
        stats.has_transitions = true;
        stats.font_count = 5;
        let report = score(&rows, &stats).unwrap();
        assert_eq!(report.percentage, 10.0);
        assert_eq!(report.tier, ReadinessTier::CriticallyLow);
        assert!(!report.can_send);
        assert_eq!(
            report.recommendations[0],
            "Rework the presentation before sending it to designers"
        );
        assert_eq!(report.recommendations.len(), 6);
        assert!(report.summary.contains("rework is recommended"));
    }

    #[test]
    fn test_tier_bounds_and_sendable_gap() {
        assert_eq!(ReadinessTier::from_percentage(90.0), ReadinessTier::Excellent);
        assert_eq!(ReadinessTier::from_percentage(89.9), ReadinessTier::Good);
        assert_eq!(ReadinessTier::from_percentage(75.0), ReadinessTier::Good);
        assert_eq!(ReadinessTier::from_percentage(60.0), ReadinessTier::Satisfactory);
        assert_eq!(ReadinessTier::from_percentage(40.0), ReadinessTier::NeedsWork);
        assert_eq!(ReadinessTier::from_percentage(39.9), ReadinessTier::CriticallyLow);
        // 57-60 is "needs work" but already sendable
        assert!(58.0 >= SENDABLE_THRESHOLD);
        assert_eq!(ReadinessTier::from_percentage(58.0), ReadinessTier::NeedsWork);
    }

    #[test]
    fn test_score_is_idempotent() {
        let mut rows = clean_rows(5);
        rows[0].record(Violation::Animations);
        let stats = stats_for(&rows);
        assert_eq!(score(&rows, &stats), score(&rows, &stats));
    }

    #[test]
    fn test_more_violations_never_raise_score() {
        let mut rows = clean_rows(5);
        let mut last = score(&rows, &stats_for(&rows)).unwrap().percentage;
        for i in 0..5 {
            rows[i].record(Violation::Background);
            let p = score(&rows, &stats_for(&rows)).unwrap().percentage;
            assert!(p <= last);
            assert!((0.0..=100.0).contains(&p));
            last = p;
        }
    }

    #[test]
    fn test_empty_findings_award_full_weight() {
        let report = score(&[], &DeckStats::default()).unwrap();
        assert_eq!(report.percentage, 100.0);
        assert_eq!(report.total_slides, 0);
    }

    #[test]
    fn test_inconsistent_stats_yield_no_score() {
        let rows = clean_rows(1);
        let mut stats = stats_for(&rows);
        stats.background_issues = 3;
        assert!(score(&rows, &stats).is_none());
    }
}
