use crate::domain::analysis::{AnalysisRequest, FinancialAnalysis};
use crate::llm::error::ExtractionError;

pub mod error;
pub mod gemini;
pub mod json;
pub mod prompt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provider {
    Gemini,
}

#[async_trait::async_trait]
pub trait LlmClient: Send + Sync {
    fn provider(&self) -> Provider;

    /// One request/response exchange. No retries.
    async fn analyze(&self, request: &AnalysisRequest)
        -> Result<FinancialAnalysis, ExtractionError>;
}
