use crate::llm::Provider;
use std::fmt;

/// The only message shown to end users, whatever the underlying failure.
pub const USER_FACING_MESSAGE: &str = "Analysis failed. Please check your API key or try again.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtractionErrorKind {
    /// No credential configured; detected before any network attempt.
    Configuration,
    /// Network, timeout, rate limit or non-2xx status.
    Transport,
    /// Payload missing, empty, not JSON, or violating the analysis contract.
    MalformedResponse,
}

#[derive(Debug, Clone)]
pub struct ExtractionError {
    pub provider: Provider,
    pub kind: ExtractionErrorKind,
    pub stage: &'static str,
    pub detail: String,
    pub raw_output: Option<String>,
}

impl ExtractionError {
    pub fn configuration(provider: Provider, detail: impl Into<String>) -> Self {
        Self {
            provider,
            kind: ExtractionErrorKind::Configuration,
            stage: "config",
            detail: detail.into(),
            raw_output: None,
        }
    }

    pub fn transport(
        provider: Provider,
        stage: &'static str,
        detail: impl Into<String>,
        raw_output: Option<String>,
    ) -> Self {
        Self {
            provider,
            kind: ExtractionErrorKind::Transport,
            stage,
            detail: detail.into(),
            raw_output,
        }
    }

    pub fn malformed(
        provider: Provider,
        stage: &'static str,
        detail: impl Into<String>,
        raw_output: Option<String>,
    ) -> Self {
        Self {
            provider,
            kind: ExtractionErrorKind::MalformedResponse,
            stage,
            detail: detail.into(),
            raw_output,
        }
    }

    pub fn user_message(&self) -> &'static str {
        USER_FACING_MESSAGE
    }
}

impl fmt::Display for ExtractionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "extraction error (provider={:?}, kind={:?}, stage={}): {}",
            self.provider, self.kind, self.stage, self.detail
        )
    }
}

impl std::error::Error for ExtractionError {}
