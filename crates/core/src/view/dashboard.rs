use crate::domain::analysis::{EntityType, FinancialAnalysis, Sentiment};
use crate::present::style::{
    format_score, gauge_rotation, relevance_bar_width, score_color, sentiment_badge_style, ScoreColor,
    SentimentStyle, Trend,
};
use serde::Serialize;

/// Everything a front-end needs to draw one analysis, already mapped to visual parameters.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardView {
    pub headline: String,
    pub badge: BadgeView,
    pub gauge: GaugeView,
    pub executive_summary: String,
    pub investment_implications: String,
    pub key_drivers: Vec<String>,
    pub risk_factors: Vec<String>,
    /// `None` when the analysis names no entities; the table is not drawn at all.
    pub entities: Option<Vec<EntityRow>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BadgeView {
    pub label: Sentiment,
    pub style: SentimentStyle,
    pub class: &'static str,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GaugeView {
    pub score: i32,
    pub display: String,
    pub rotation_deg: f64,
    pub color: ScoreColor,
    pub color_class: &'static str,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityRow {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ticker: Option<String>,
    pub entity_type: EntityType,
    pub sentiment: Sentiment,
    pub style: SentimentStyle,
    pub trend: Trend,
    pub text_class: &'static str,
    pub bar_class: &'static str,
    pub bar_width_pct: i32,
}

impl DashboardView {
    pub fn from_analysis(analysis: &FinancialAnalysis) -> Self {
        let badge_style = sentiment_badge_style(analysis.sentiment_label.as_str());
        let color = score_color(analysis.sentiment_score);

        let entities = if analysis.entities.is_empty() {
            None
        } else {
            Some(
                analysis
                    .entities
                    .iter()
                    .map(|e| {
                        let style = sentiment_badge_style(e.sentiment.as_str());
                        EntityRow {
                            name: e.name.clone(),
                            ticker: e.ticker.clone(),
                            entity_type: e.entity_type,
                            sentiment: e.sentiment.clone(),
                            style,
                            trend: style.trend(),
                            text_class: style.text_class(),
                            bar_class: style.bar_class(),
                            bar_width_pct: relevance_bar_width(e.relevance_score),
                        }
                    })
                    .collect(),
            )
        };

        Self {
            headline: analysis.headline.clone(),
            badge: BadgeView {
                label: analysis.sentiment_label.clone(),
                style: badge_style,
                class: badge_style.badge_class(),
            },
            gauge: GaugeView {
                score: analysis.sentiment_score,
                display: format_score(analysis.sentiment_score),
                rotation_deg: gauge_rotation(analysis.sentiment_score),
                color,
                color_class: color.text_class(),
            },
            executive_summary: analysis.executive_summary.clone(),
            investment_implications: analysis.investment_implications.clone(),
            key_drivers: analysis.key_drivers.clone(),
            risk_factors: analysis.risk_factors.clone(),
            entities,
        }
    }
}
