use crate::config::Settings;
use crate::domain::analysis::{AnalysisRequest, FinancialAnalysis};
use crate::domain::contract::response_schema;
use crate::llm::error::ExtractionError;
use crate::llm::{json, prompt};
use crate::llm::{LlmClient, Provider};
use anyhow::Context;
use reqwest::header::{HeaderMap, HeaderValue};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";
const DEFAULT_MODEL: &str = "gemini-2.5-flash";
const DEFAULT_TIMEOUT_SECS: u64 = 60;

const RESPONSE_MIME_TYPE: &str = "application/json";

/// Seam between request building and the wire. Tests inject a fake here.
#[async_trait::async_trait]
pub trait ModelTransport: Send + Sync {
    async fn generate_content(
        &self,
        api_key: &str,
        model: &str,
        request: &GenerateContentRequest,
    ) -> Result<GenerateContentResponse, ExtractionError>;
}

#[derive(Debug, Clone)]
pub struct HttpTransport {
    http: reqwest::Client,
    base_url: String,
}

impl HttpTransport {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("failed to build reqwest client")?;
        Ok(Self {
            http,
            base_url: base_url.into(),
        })
    }
}

#[async_trait::async_trait]
impl ModelTransport for HttpTransport {
    async fn generate_content(
        &self,
        api_key: &str,
        model: &str,
        request: &GenerateContentRequest,
    ) -> Result<GenerateContentResponse, ExtractionError> {
        let mut headers = HeaderMap::new();
        let key = HeaderValue::from_str(api_key).map_err(|e| {
            ExtractionError::configuration(Provider::Gemini, format!("invalid API key header: {e}"))
        })?;
        headers.insert("x-goog-api-key", key);

        let model = model.strip_prefix("models/").unwrap_or(model);
        let url = format!(
            "{}/v1beta/models/{model}:generateContent",
            self.base_url.trim_end_matches('/')
        );

        let res = self
            .http
            .post(url)
            .headers(headers)
            .json(request)
            .send()
            .await
            .map_err(|e| {
                ExtractionError::transport(
                    Provider::Gemini,
                    "send",
                    format!("Gemini request failed: {e}"),
                    None,
                )
            })?;

        let status = res.status();
        let text = res.text().await.map_err(|e| {
            ExtractionError::transport(
                Provider::Gemini,
                "read_body",
                format!("failed to read Gemini response body: {e}"),
                None,
            )
        })?;
        if !status.is_success() {
            return Err(ExtractionError::transport(
                Provider::Gemini,
                "http",
                format!("status={status}"),
                Some(text),
            ));
        }

        serde_json::from_str::<GenerateContentResponse>(&text).map_err(|e| {
            ExtractionError::malformed(
                Provider::Gemini,
                "decode_envelope",
                format!("failed to decode Gemini response: {e}"),
                Some(text),
            )
        })
    }
}

#[derive(Clone)]
pub struct GeminiClient {
    transport: Arc<dyn ModelTransport>,
    api_key: Option<String>,
    model: String,
}

impl std::fmt::Debug for GeminiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiClient")
            .field("model", &self.model)
            .field("has_api_key", &self.api_key.is_some())
            .finish()
    }
}

impl GeminiClient {
    /// Never fails on a missing key: that is reported by the first `analyze` call.
    pub fn from_settings(settings: &Settings) -> anyhow::Result<Self> {
        let base_url =
            std::env::var("GEMINI_BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());
        let model = std::env::var("GEMINI_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.to_string());
        let timeout_secs = std::env::var("GEMINI_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .unwrap_or(DEFAULT_TIMEOUT_SECS);

        let transport = HttpTransport::new(base_url, Duration::from_secs(timeout_secs))?;
        Ok(Self::with_transport(
            Arc::new(transport),
            settings.gemini_api_key.clone(),
            model,
        ))
    }

    pub fn with_transport(
        transport: Arc<dyn ModelTransport>,
        api_key: Option<String>,
        model: impl Into<String>,
    ) -> Self {
        Self {
            transport,
            api_key,
            model: model.into(),
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn build_request(text: &str) -> GenerateContentRequest {
        GenerateContentRequest {
            system_instruction: Some(Content {
                role: None,
                parts: vec![Part {
                    text: prompt::system_instruction(),
                }],
            }),
            contents: vec![Content {
                role: Some("user".to_string()),
                parts: vec![Part {
                    text: prompt::user_prompt(text),
                }],
            }],
            generation_config: GenerationConfig {
                response_mime_type: RESPONSE_MIME_TYPE,
                response_schema: response_schema(),
            },
        }
    }

    /// Concatenated text parts of the first candidate.
    fn response_text(res: &GenerateContentResponse) -> Option<String> {
        let candidate = res.candidates.first()?;
        let content = candidate.content.as_ref()?;
        let mut out = String::new();
        for part in &content.parts {
            if let Some(text) = part.text.as_deref() {
                out.push_str(text);
            }
        }
        if out.trim().is_empty() {
            None
        } else {
            Some(out)
        }
    }

    fn empty_response_error(res: &GenerateContentResponse) -> ExtractionError {
        let detail = match res
            .prompt_feedback
            .as_ref()
            .and_then(|f| f.block_reason.as_deref())
        {
            Some(reason) => format!("empty response (blockReason={reason})"),
            None => match res.candidates.first().and_then(|c| c.finish_reason.as_deref()) {
                Some(reason) => format!("empty response (finishReason={reason})"),
                None => "empty response".to_string(),
            },
        };
        ExtractionError::malformed(Provider::Gemini, "response_text", detail, None)
    }
}

#[async_trait::async_trait]
impl LlmClient for GeminiClient {
    fn provider(&self) -> Provider {
        Provider::Gemini
    }

    async fn analyze(
        &self,
        request: &AnalysisRequest,
    ) -> Result<FinancialAnalysis, ExtractionError> {
        let Some(api_key) = self.api_key.as_deref() else {
            return Err(ExtractionError::configuration(
                Provider::Gemini,
                "GEMINI_API_KEY is not configured",
            ));
        };

        let req = Self::build_request(&request.text);
        tracing::debug!(model = %self.model, text_len = request.text.len(), "sending Gemini extraction request");

        let res = self
            .transport
            .generate_content(api_key, &self.model, &req)
            .await?;

        let Some(text) = Self::response_text(&res) else {
            return Err(Self::empty_response_error(&res));
        };

        let analysis = json::parse_analysis(&text).map_err(|e| {
            ExtractionError::malformed(Provider::Gemini, "parse", format!("{e:#}"), Some(text))
        })?;

        tracing::info!(
            model = %self.model,
            sentiment_score = analysis.sentiment_score,
            sentiment_label = %analysis.sentiment_label,
            entities = analysis.entities.len(),
            "Gemini extraction succeeded"
        );
        Ok(analysis)
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system_instruction: Option<Content>,
    pub contents: Vec<Content>,
    pub generation_config: GenerationConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Content {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default)]
    pub parts: Vec<Part>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Part {
    pub text: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig {
    pub response_mime_type: &'static str,
    pub response_schema: serde_json::Value,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
    #[serde(default)]
    pub prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    #[serde(default)]
    pub content: Option<CandidateContent>,
    #[serde(default)]
    pub finish_reason: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CandidateContent {
    #[serde(default)]
    pub parts: Vec<ResponsePart>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ResponsePart {
    #[serde(default)]
    pub text: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromptFeedback {
    #[serde(default)]
    pub block_reason: Option<String>,
}
