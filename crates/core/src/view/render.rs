//! Plain-text rendering of a [`DashboardView`] for terminals.

use crate::present::style::{SentimentStyle, Trend, GAUGE_MAX_DEGREES, GAUGE_SEGMENTS};
use crate::view::dashboard::DashboardView;
use std::fmt::Write;

pub const GAUGE_WIDTH: usize = 41;
const BAR_CELLS: usize = 10;

/// Column of the needle on a `GAUGE_WIDTH`-wide track.
pub fn gauge_needle_position(rotation_deg: f64) -> usize {
    let t = ((rotation_deg + GAUGE_MAX_DEGREES) / (2.0 * GAUGE_MAX_DEGREES)).clamp(0.0, 1.0);
    (t * (GAUGE_WIDTH - 1) as f64).round() as usize
}

fn gauge_track(rotation_deg: f64) -> String {
    let needle = gauge_needle_position(rotation_deg);
    let mut bounds = Vec::with_capacity(GAUGE_SEGMENTS.len());
    let mut acc = 0usize;
    for (style, pct) in GAUGE_SEGMENTS {
        acc += usize::from(pct);
        bounds.push((style, acc * GAUGE_WIDTH / 100));
    }

    (0..GAUGE_WIDTH)
        .map(|col| {
            if col == needle {
                return '|';
            }
            let style = bounds
                .iter()
                .find(|(_, end)| col < *end)
                .map(|(style, _)| *style)
                .unwrap_or(SentimentStyle::Bullish);
            match style {
                SentimentStyle::Bearish => '-',
                SentimentStyle::Neutral => '=',
                SentimentStyle::Bullish => '+',
            }
        })
        .collect()
}

fn relevance_bar(width_pct: i32) -> String {
    let pct = usize::try_from(width_pct.max(0)).unwrap_or(0);
    let filled = ((pct * BAR_CELLS + 50) / 100).min(BAR_CELLS);
    format!("{}{}", "#".repeat(filled), ".".repeat(BAR_CELLS - filled))
}

fn trend_glyph(trend: Trend) -> &'static str {
    match trend {
        Trend::Up => "^",
        Trend::Down => "v",
        Trend::Flat => "-",
    }
}

pub fn render_text(view: &DashboardView) -> String {
    let mut out = String::new();

    let _ = writeln!(out, "{}", view.headline);
    let _ = writeln!(out, "[{}]", view.badge.label);
    let _ = writeln!(out);

    let _ = writeln!(out, "MARKET SENTIMENT  {}", view.gauge.display);
    let _ = writeln!(out, "  bearish [{}] bullish", gauge_track(view.gauge.rotation_deg));
    let _ = writeln!(out);

    let _ = writeln!(out, "EXECUTIVE SUMMARY");
    let _ = writeln!(out, "{}", view.executive_summary);
    let _ = writeln!(out);

    let _ = writeln!(out, "INVESTMENT IMPLICATIONS");
    let _ = writeln!(out, "\"{}\"", view.investment_implications);
    let _ = writeln!(out);

    let _ = writeln!(out, "KEY MARKET DRIVERS");
    for driver in &view.key_drivers {
        let _ = writeln!(out, "  + {driver}");
    }
    let _ = writeln!(out);

    let _ = writeln!(out, "RISK FACTORS");
    for risk in &view.risk_factors {
        let _ = writeln!(out, "  ! {risk}");
    }

    if let Some(rows) = &view.entities {
        let _ = writeln!(out);
        let _ = writeln!(out, "DETECTED ENTITIES & ASSETS");
        for row in rows {
            let name = match &row.ticker {
                Some(ticker) => format!("{} ({ticker})", row.name),
                None => row.name.clone(),
            };
            let _ = writeln!(
                out,
                "  {name:<32} {:<10} {} {:<11} {}",
                row.entity_type.as_str(),
                trend_glyph(row.trend),
                row.sentiment.as_str(),
                relevance_bar(row.bar_width_pct)
            );
        }
    }

    out
}
