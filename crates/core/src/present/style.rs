//! Pure mappings from analysis fields to visual parameters.

use crate::domain::analysis::SentimentLabel;
use serde::Serialize;

pub const GAUGE_MAX_DEGREES: f64 = 90.0;
/// Scores strictly inside (-10, 10) render neutral.
pub const SCORE_DEAD_ZONE: i32 = 10;

/// Bearish / Neutral / Bullish arc segments of the gauge, in percent of the half circle.
pub const GAUGE_SEGMENTS: [(SentimentStyle, u8); 3] = [
    (SentimentStyle::Bearish, 33),
    (SentimentStyle::Neutral, 33),
    (SentimentStyle::Bullish, 34),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SentimentStyle {
    Bullish,
    Bearish,
    Neutral,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ScoreColor {
    Positive,
    Negative,
    Neutral,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    Up,
    Down,
    Flat,
}

impl SentimentStyle {
    pub fn badge_class(self) -> &'static str {
        match self {
            SentimentStyle::Bullish => "border-emerald-500/30 bg-emerald-500/10 text-emerald-400",
            SentimentStyle::Bearish => "border-red-500/30 bg-red-500/10 text-red-400",
            SentimentStyle::Neutral => "border-zinc-700 bg-zinc-800 text-zinc-300",
        }
    }

    pub fn text_class(self) -> &'static str {
        match self {
            SentimentStyle::Bullish => "text-emerald-400",
            SentimentStyle::Bearish => "text-red-400",
            SentimentStyle::Neutral => "text-zinc-400",
        }
    }

    pub fn bar_class(self) -> &'static str {
        match self {
            SentimentStyle::Bullish => "bg-emerald-500",
            SentimentStyle::Bearish => "bg-red-500",
            SentimentStyle::Neutral => "bg-zinc-500",
        }
    }

    pub fn trend(self) -> Trend {
        match self {
            SentimentStyle::Bullish => Trend::Up,
            SentimentStyle::Bearish => Trend::Down,
            SentimentStyle::Neutral => Trend::Flat,
        }
    }
}

impl ScoreColor {
    pub fn text_class(self) -> &'static str {
        match self {
            ScoreColor::Positive => "text-emerald-500",
            ScoreColor::Negative => "text-red-500",
            ScoreColor::Neutral => "text-white",
        }
    }
}

/// Exact table from the closed label set.
pub fn sentiment_style(label: SentimentLabel) -> SentimentStyle {
    match label {
        SentimentLabel::Bullish | SentimentLabel::Optimistic => SentimentStyle::Bullish,
        SentimentLabel::Bearish | SentimentLabel::Cautious => SentimentStyle::Bearish,
        SentimentLabel::Neutral => SentimentStyle::Neutral,
    }
}

/// Style for a free-form label string.
///
/// Known labels go through [`sentiment_style`]. Anything else falls back to a case-insensitive
/// keyword match ("bull"/"optimist" before "bear"/"cautious"), and finally to neutral. The
/// fallback keeps labels like "Slightly Bullish Outlook" readable.
pub fn sentiment_badge_style(label: &str) -> SentimentStyle {
    if let Ok(known) = label.parse::<SentimentLabel>() {
        return sentiment_style(known);
    }

    let l = label.to_lowercase();
    if l.contains("bull") || l.contains("optimist") {
        SentimentStyle::Bullish
    } else if l.contains("bear") || l.contains("cautious") {
        SentimentStyle::Bearish
    } else {
        SentimentStyle::Neutral
    }
}

/// Needle angle in degrees: -100 => -90, 0 => 0, 100 => 90. Out-of-range scores are clamped.
pub fn gauge_rotation(score: i32) -> f64 {
    let clamped = score.clamp(-100, 100);
    f64::from(clamped * 90) / 100.0
}

pub fn score_color(score: i32) -> ScoreColor {
    if score > SCORE_DEAD_ZONE {
        ScoreColor::Positive
    } else if score < -SCORE_DEAD_ZONE {
        ScoreColor::Negative
    } else {
        ScoreColor::Neutral
    }
}

/// Width of a relevance bar in percent. Identity: the contract already bounds relevance, so no
/// clamping happens here.
pub fn relevance_bar_width(relevance_score: i32) -> i32 {
    relevance_score
}

pub fn format_score(score: i32) -> String {
    if score > 0 {
        format!("+{score}")
    } else {
        score.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gauge_rotation_is_linear_inside_range() {
        for score in -100..=100 {
            assert_eq!(gauge_rotation(score), f64::from(score * 9) / 10.0, "score={score}");
        }
        assert_eq!(gauge_rotation(42), 37.8);
        assert_eq!(gauge_rotation(-100), -90.0);
        assert_eq!(gauge_rotation(0), 0.0);
    }

    #[test]
    fn gauge_rotation_clamps_outside_range() {
        assert_eq!(gauge_rotation(150), gauge_rotation(100));
        assert_eq!(gauge_rotation(150), 90.0);
        assert_eq!(gauge_rotation(-1000), -90.0);
        assert_eq!(gauge_rotation(i32::MAX), GAUGE_MAX_DEGREES);
    }

    #[test]
    fn score_color_dead_zone_is_exclusive() {
        assert_eq!(score_color(11), ScoreColor::Positive);
        assert_eq!(score_color(10), ScoreColor::Neutral);
        assert_eq!(score_color(0), ScoreColor::Neutral);
        assert_eq!(score_color(-10), ScoreColor::Neutral);
        assert_eq!(score_color(-11), ScoreColor::Negative);
    }

    #[test]
    fn badge_style_uses_exact_table_for_known_labels() {
        assert_eq!(sentiment_badge_style("Bullish"), SentimentStyle::Bullish);
        assert_eq!(sentiment_badge_style("Optimistic"), SentimentStyle::Bullish);
        assert_eq!(sentiment_badge_style("Bearish"), SentimentStyle::Bearish);
        assert_eq!(sentiment_badge_style("Cautious"), SentimentStyle::Bearish);
        assert_eq!(sentiment_badge_style("Neutral"), SentimentStyle::Neutral);
        for label in SentimentLabel::ALL {
            assert_eq!(sentiment_badge_style(label.as_str()), sentiment_style(label));
        }
    }

    #[test]
    fn badge_style_falls_back_to_keywords() {
        assert_eq!(
            sentiment_badge_style("Slightly Bullish Outlook"),
            SentimentStyle::Bullish
        );
        assert_eq!(sentiment_badge_style("OPTIMISTIC-ish"), SentimentStyle::Bullish);
        assert_eq!(sentiment_badge_style("bearish"), SentimentStyle::Bearish);
        assert_eq!(sentiment_badge_style("Cautiously Positive"), SentimentStyle::Bearish);
        assert_eq!(sentiment_badge_style("cautious"), SentimentStyle::Bearish);
        assert_eq!(sentiment_badge_style("Mixed"), SentimentStyle::Neutral);
        assert_eq!(sentiment_badge_style(""), SentimentStyle::Neutral);
    }

    #[test]
    fn relevance_bar_width_is_not_clamped() {
        assert_eq!(relevance_bar_width(0), 0);
        assert_eq!(relevance_bar_width(73), 73);
        assert_eq!(relevance_bar_width(150), 150);
        assert_eq!(relevance_bar_width(-5), -5);
    }

    #[test]
    fn format_score_signs_positive_values() {
        assert_eq!(format_score(42), "+42");
        assert_eq!(format_score(0), "0");
        assert_eq!(format_score(-7), "-7");
    }

    #[test]
    fn gauge_segments_cover_the_half_circle() {
        let total: u32 = GAUGE_SEGMENTS.iter().map(|(_, pct)| u32::from(*pct)).sum();
        assert_eq!(total, 100);
    }
}
