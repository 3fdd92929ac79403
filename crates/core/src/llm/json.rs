use crate::domain::analysis::FinancialAnalysis;
use crate::domain::contract::LlmFinancialAnalysis;
use anyhow::Context;

pub fn extract_json(text: &str) -> Option<String> {
    let trimmed = text.trim();
    if let Some(rest) = trimmed.strip_prefix("```") {
        let body = match rest.rfind("```") {
            Some(end) => &rest[..end],
            None => rest,
        };
        // A language tag (```json) sits before the first line break, or runs straight into the
        // payload when the whole fence is on one line.
        let body = match body.split_once('\n') {
            Some((tag, inner)) if !tag.contains(['{', '[']) => inner,
            _ => body.trim_start_matches(|c: char| c.is_ascii_alphanumeric()),
        };
        return Some(body.trim().to_string());
    }

    // Best-effort extraction: first '{' to last '}'.
    let start = trimmed.find('{')?;
    let end = trimmed.rfind('}')?;
    if end <= start {
        return None;
    }
    Some(trimmed[start..=end].trim().to_string())
}

pub fn parse_analysis(text: &str) -> anyhow::Result<FinancialAnalysis> {
    anyhow::ensure!(!text.trim().is_empty(), "empty response");

    let json_str = extract_json(text).unwrap_or_else(|| text.trim().to_string());
    let parsed = serde_json::from_str::<LlmFinancialAnalysis>(&json_str)
        .with_context(|| format!("LLM output is not valid JSON for analysis schema: {json_str}"))?;
    parsed.validate_and_into_analysis()
}
