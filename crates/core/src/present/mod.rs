pub mod report;
pub mod style;

pub use report::clipboard_report;
pub use style::{
    format_score, gauge_rotation, relevance_bar_width, score_color, sentiment_badge_style,
    sentiment_style, ScoreColor, SentimentStyle, Trend,
};
