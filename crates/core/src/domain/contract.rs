use crate::domain::analysis::{Entity, EntityType, FinancialAnalysis, Sentiment, SentimentLabel};
use anyhow::{ensure, Context};
use serde::{Deserialize, Serialize};

pub const SCORE_RANGE: std::ops::RangeInclusive<i32> = -100..=100;
pub const RELEVANCE_RANGE: std::ops::RangeInclusive<i32> = 0..=100;

pub const REQUIRED_FIELDS: [&str; 8] = [
    "headline",
    "executiveSummary",
    "sentimentScore",
    "sentimentLabel",
    "keyDrivers",
    "investmentImplications",
    "riskFactors",
    "entities",
];

pub const REQUIRED_ENTITY_FIELDS: [&str; 4] = ["name", "type", "sentiment", "relevanceScore"];

/// Shape of the model output before validation. Enumerated fields stay as strings so that an
/// out-of-set entity type is reported as a contract violation instead of a generic decode error,
/// and an out-of-set sentiment survives as display text.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LlmFinancialAnalysis {
    pub headline: String,
    pub executive_summary: String,
    pub sentiment_score: i32,
    pub sentiment_label: String,
    pub key_drivers: Vec<String>,
    pub investment_implications: String,
    pub risk_factors: Vec<String>,
    pub entities: Vec<LlmEntity>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LlmEntity {
    pub name: String,
    #[serde(default)]
    pub ticker: Option<String>,
    #[serde(rename = "type")]
    pub entity_type: String,
    pub sentiment: String,
    pub relevance_score: i32,
}

/// Response schema handed to the model (provider's OpenAPI-subset dialect).
pub fn response_schema() -> serde_json::Value {
    let labels: Vec<&str> = SentimentLabel::ALL.iter().map(|l| l.as_str()).collect();
    let entity_types: Vec<&str> = EntityType::ALL.iter().map(|t| t.as_str()).collect();

    serde_json::json!({
        "type": "OBJECT",
        "properties": {
            "headline": {"type": "STRING"},
            "executiveSummary": {"type": "STRING"},
            "sentimentScore": {
                "type": "INTEGER",
                "description": "Integer between -100 and 100"
            },
            "sentimentLabel": {"type": "STRING", "enum": labels},
            "keyDrivers": {"type": "ARRAY", "items": {"type": "STRING"}},
            "investmentImplications": {"type": "STRING"},
            "riskFactors": {"type": "ARRAY", "items": {"type": "STRING"}},
            "entities": {
                "type": "ARRAY",
                "items": {
                    "type": "OBJECT",
                    "properties": {
                        "name": {"type": "STRING"},
                        "ticker": {"type": "STRING", "nullable": true},
                        "type": {"type": "STRING", "enum": entity_types},
                        "sentiment": {"type": "STRING", "enum": labels},
                        "relevanceScore": {
                            "type": "INTEGER",
                            "description": "Integer between 0 and 100"
                        }
                    },
                    "required": REQUIRED_ENTITY_FIELDS
                }
            }
        },
        "required": REQUIRED_FIELDS
    })
}

impl LlmFinancialAnalysis {
    pub fn validate_and_into_analysis(self) -> anyhow::Result<FinancialAnalysis> {
        let headline = self.headline.trim().to_string();
        ensure!(!headline.is_empty(), "headline must be non-empty");

        ensure!(
            SCORE_RANGE.contains(&self.sentiment_score),
            "sentimentScore must be between -100 and 100 (got {})",
            self.sentiment_score
        );

        let sentiment_label = sentiment_from_wire("sentimentLabel", &self.sentiment_label)?;

        let mut entities = Vec::with_capacity(self.entities.len());
        for (index, entity) in self.entities.into_iter().enumerate() {
            entities.push(
                entity
                    .validate_and_into_entity()
                    .with_context(|| format!("invalid entity at index {index}"))?,
            );
        }

        Ok(FinancialAnalysis {
            headline,
            executive_summary: self.executive_summary.trim().to_string(),
            sentiment_score: self.sentiment_score,
            sentiment_label,
            key_drivers: clean_lines(self.key_drivers),
            investment_implications: self.investment_implications.trim().to_string(),
            risk_factors: clean_lines(self.risk_factors),
            entities,
        })
    }
}

impl LlmEntity {
    fn validate_and_into_entity(self) -> anyhow::Result<Entity> {
        let name = self.name.trim().to_string();
        ensure!(!name.is_empty(), "entity name must be non-empty");

        let entity_type = self
            .entity_type
            .parse::<EntityType>()
            .context("entity type outside the allowed set")?;
        let sentiment = sentiment_from_wire("sentiment", &self.sentiment)?;

        ensure!(
            RELEVANCE_RANGE.contains(&self.relevance_score),
            "relevanceScore must be between 0 and 100 (got {})",
            self.relevance_score
        );

        let ticker = self
            .ticker
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty());

        Ok(Entity {
            name,
            ticker,
            entity_type,
            sentiment,
            relevance_score: self.relevance_score,
        })
    }
}

fn sentiment_from_wire(field: &str, raw: &str) -> anyhow::Result<Sentiment> {
    ensure!(!raw.trim().is_empty(), "{field} must be non-empty");
    let sentiment = Sentiment::from_raw(raw);
    if sentiment.label().is_none() {
        tracing::warn!(field, value = %sentiment, "sentiment outside the allowed set, keeping text");
    }
    Ok(sentiment)
}

fn clean_lines(lines: Vec<String>) -> Vec<String> {
    lines
        .into_iter()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn wire(value: serde_json::Value) -> LlmFinancialAnalysis {
        serde_json::from_value(value).unwrap()
    }

    fn valid_wire() -> serde_json::Value {
        json!({
            "headline": "  Chipmaker beats estimates  ",
            "executiveSummary": "Revenue grew 20%.",
            "sentimentScore": 42,
            "sentimentLabel": "Bullish",
            "keyDrivers": ["Data center demand", "  "],
            "investmentImplications": "Accumulate on dips.",
            "riskFactors": ["Export controls"],
            "entities": [
                {"name": "Nvidia", "ticker": "NVDA", "type": "Company", "sentiment": "Bullish", "relevanceScore": 95},
                {"name": "Semiconductors", "ticker": " ", "type": "Sector", "sentiment": "Optimistic", "relevanceScore": 60}
            ]
        })
    }

    #[test]
    fn accepts_valid_output_and_normalizes_strings() {
        let analysis = wire(valid_wire()).validate_and_into_analysis().unwrap();
        assert_eq!(analysis.headline, "Chipmaker beats estimates");
        assert_eq!(analysis.sentiment_label, SentimentLabel::Bullish);
        assert_eq!(analysis.key_drivers, vec!["Data center demand".to_string()]);
        assert_eq!(analysis.entities[0].ticker.as_deref(), Some("NVDA"));
        assert_eq!(analysis.entities[1].ticker, None);
        assert_eq!(analysis.entities[1].entity_type, EntityType::Sector);
    }

    #[test]
    fn accepts_missing_ticker() {
        let mut value = valid_wire();
        value["entities"][0].as_object_mut().unwrap().remove("ticker");
        let analysis = wire(value).validate_and_into_analysis().unwrap();
        assert_eq!(analysis.entities[0].ticker, None);
    }

    #[test]
    fn rejects_score_out_of_range() {
        let mut value = valid_wire();
        value["sentimentScore"] = json!(101);
        assert!(wire(value).validate_and_into_analysis().is_err());

        let mut value = valid_wire();
        value["sentimentScore"] = json!(-100);
        assert!(wire(value).validate_and_into_analysis().is_ok());
    }

    #[test]
    fn keeps_sentiment_outside_closed_set_as_text() {
        let mut value = valid_wire();
        value["sentimentLabel"] = json!("Euphoric");
        value["entities"][0]["sentiment"] = json!("Mixed");
        let analysis = wire(value).validate_and_into_analysis().unwrap();
        assert_eq!(analysis.sentiment_label, Sentiment::Other("Euphoric".to_string()));
        assert_eq!(analysis.entities[0].sentiment.as_str(), "Mixed");
        assert_eq!(analysis.entities[1].sentiment, SentimentLabel::Optimistic);
    }

    #[test]
    fn rejects_blank_sentiment() {
        let mut value = valid_wire();
        value["entities"][1]["sentiment"] = json!("  ");
        let err = wire(value).validate_and_into_analysis().unwrap_err();
        assert!(format!("{err:#}").contains("index 1"));
    }

    #[test]
    fn rejects_entity_with_unknown_type_or_bad_relevance() {
        let mut value = valid_wire();
        value["entities"][1]["type"] = json!("Country");
        assert!(wire(value).validate_and_into_analysis().is_err());

        let mut value = valid_wire();
        value["entities"][0]["relevanceScore"] = json!(120);
        let err = wire(value).validate_and_into_analysis().unwrap_err();
        assert!(format!("{err:#}").contains("index 0"));
    }

    #[test]
    fn rejects_blank_headline() {
        let mut value = valid_wire();
        value["headline"] = json!("   ");
        assert!(wire(value).validate_and_into_analysis().is_err());
    }

    #[test]
    fn missing_required_field_fails_to_decode() {
        let mut value = valid_wire();
        value.as_object_mut().unwrap().remove("riskFactors");
        assert!(serde_json::from_value::<LlmFinancialAnalysis>(value).is_err());
    }

    #[test]
    fn schema_lists_required_fields_and_enums() {
        let schema = response_schema();
        let required: Vec<&str> = schema["required"]
            .as_array()
            .unwrap()
            .iter()
            .map(|v| v.as_str().unwrap())
            .collect();
        assert_eq!(required, REQUIRED_FIELDS);

        let entity = &schema["properties"]["entities"]["items"];
        assert_eq!(entity["required"].as_array().unwrap().len(), 4);
        assert_eq!(entity["properties"]["ticker"]["nullable"], true);
        assert_eq!(
            schema["properties"]["sentimentLabel"]["enum"],
            json!(["Bullish", "Bearish", "Neutral", "Cautious", "Optimistic"])
        );
        assert_eq!(
            entity["properties"]["type"]["enum"],
            json!(["Company", "Person", "Sector", "Crypto", "Commodity"])
        );
    }
}
