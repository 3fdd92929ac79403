use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisRequest {
    pub text: String,
}

impl AnalysisRequest {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FinancialAnalysis {
    pub headline: String,
    pub executive_summary: String,
    /// -100 (extremely bearish) ..= 100 (extremely bullish).
    pub sentiment_score: i32,
    pub sentiment_label: Sentiment,
    pub key_drivers: Vec<String>,
    pub investment_implications: String,
    pub risk_factors: Vec<String>,
    pub entities: Vec<Entity>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Entity {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ticker: Option<String>,
    #[serde(rename = "type")]
    pub entity_type: EntityType,
    pub sentiment: Sentiment,
    /// 0 ..= 100.
    pub relevance_score: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SentimentLabel {
    Bullish,
    Bearish,
    Neutral,
    Cautious,
    Optimistic,
}

impl SentimentLabel {
    pub const ALL: [SentimentLabel; 5] = [
        SentimentLabel::Bullish,
        SentimentLabel::Bearish,
        SentimentLabel::Neutral,
        SentimentLabel::Cautious,
        SentimentLabel::Optimistic,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            SentimentLabel::Bullish => "Bullish",
            SentimentLabel::Bearish => "Bearish",
            SentimentLabel::Neutral => "Neutral",
            SentimentLabel::Cautious => "Cautious",
            SentimentLabel::Optimistic => "Optimistic",
        }
    }
}

impl fmt::Display for SentimentLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SentimentLabel {
    type Err = anyhow::Error;

    /// Exact match against the closed set (surrounding whitespace ignored).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        Self::ALL
            .into_iter()
            .find(|label| label.as_str() == s)
            .ok_or_else(|| anyhow::anyhow!("unknown sentiment label: {s:?}"))
    }
}

/// A sentiment as the model reported it.
///
/// `Label` is one of the closed set. `Other` keeps text outside that set verbatim so it can still
/// be displayed; styling falls back to keyword matching for it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Sentiment {
    Label(SentimentLabel),
    Other(String),
}

impl Sentiment {
    /// Exact label if `raw` names one, otherwise the trimmed text.
    pub fn from_raw(raw: &str) -> Self {
        match raw.parse::<SentimentLabel>() {
            Ok(label) => Sentiment::Label(label),
            Err(_) => Sentiment::Other(raw.trim().to_string()),
        }
    }

    pub fn label(&self) -> Option<SentimentLabel> {
        match self {
            Sentiment::Label(label) => Some(*label),
            Sentiment::Other(_) => None,
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Sentiment::Label(label) => label.as_str(),
            Sentiment::Other(text) => text,
        }
    }
}

impl From<SentimentLabel> for Sentiment {
    fn from(label: SentimentLabel) -> Self {
        Sentiment::Label(label)
    }
}

impl PartialEq<SentimentLabel> for Sentiment {
    fn eq(&self, other: &SentimentLabel) -> bool {
        self.label() == Some(*other)
    }
}

impl fmt::Display for Sentiment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityType {
    Company,
    Person,
    Sector,
    Crypto,
    Commodity,
}

impl EntityType {
    pub const ALL: [EntityType; 5] = [
        EntityType::Company,
        EntityType::Person,
        EntityType::Sector,
        EntityType::Crypto,
        EntityType::Commodity,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            EntityType::Company => "Company",
            EntityType::Person => "Person",
            EntityType::Sector => "Sector",
            EntityType::Crypto => "Crypto",
            EntityType::Commodity => "Commodity",
        }
    }
}

impl fmt::Display for EntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EntityType {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        Self::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| anyhow::anyhow!("unknown entity type: {s:?}"))
    }
}
