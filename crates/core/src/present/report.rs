use crate::domain::analysis::FinancialAnalysis;

/// Plaintext report for the clipboard. Section order is fixed.
pub fn clipboard_report(analysis: &FinancialAnalysis) -> String {
    format!(
        "FINANCIAL ANALYSIS REPORT\n\
Headline: {headline}\n\
Sentiment: {label} ({score})\n\n\
EXECUTIVE SUMMARY\n\
{summary}\n\n\
KEY DRIVERS\n\
{drivers}\n\n\
RISKS\n\
{risks}\n\n\
IMPLICATIONS\n\
{implications}\n",
        headline = analysis.headline,
        label = analysis.sentiment_label,
        score = analysis.sentiment_score,
        summary = analysis.executive_summary,
        drivers = bullets(&analysis.key_drivers),
        risks = bullets(&analysis.risk_factors),
        implications = analysis.investment_implications,
    )
    .trim()
    .to_string()
}

fn bullets(lines: &[String]) -> String {
    lines
        .iter()
        .map(|line| format!("- {line}"))
        .collect::<Vec<_>>()
        .join("\n")
}
