use crate::domain::analysis::{AnalysisRequest, FinancialAnalysis};
use crate::llm::error::ExtractionError;
use crate::llm::LlmClient;
use crate::present::report::clipboard_report;
use crate::sample::SAMPLE_TEXT;
use crate::view::dashboard::DashboardView;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::{Duration, Instant};

pub const COPIED_INDICATOR_DURATION: Duration = Duration::from_secs(2);

#[derive(Debug, Clone, PartialEq)]
pub enum ViewState {
    Idle,
    Loading,
    Success {
        analysis: Arc<FinancialAnalysis>,
        analyzed_at: DateTime<Utc>,
    },
    Failure {
        message: &'static str,
    },
}

impl ViewState {
    pub fn name(&self) -> &'static str {
        match self {
            ViewState::Idle => "idle",
            ViewState::Loading => "loading",
            ViewState::Success { .. } => "success",
            ViewState::Failure { .. } => "failure",
        }
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, ViewState::Loading)
    }
}

/// One user's view: input text, request lifecycle and the current result slot.
///
/// At most one extraction is in flight: `begin_submit` refuses while `Loading`.
pub struct Session {
    client: Arc<dyn LlmClient>,
    input: String,
    state: ViewState,
    copied_at: Option<Instant>,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("provider", &self.client.provider())
            .field("input_len", &self.input.len())
            .field("state", &self.state.name())
            .finish()
    }
}

impl Session {
    pub fn new(client: Arc<dyn LlmClient>) -> Self {
        Self {
            client,
            input: String::new(),
            state: ViewState::Idle,
            copied_at: None,
        }
    }

    pub fn client(&self) -> Arc<dyn LlmClient> {
        Arc::clone(&self.client)
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn set_input(&mut self, text: impl Into<String>) {
        self.input = text.into();
    }

    pub fn load_sample(&mut self) {
        self.input = SAMPLE_TEXT.to_string();
    }

    pub fn state(&self) -> &ViewState {
        &self.state
    }

    /// Clears input and result. Ignored while a request is in flight.
    pub fn reset(&mut self) {
        if self.state.is_loading() {
            return;
        }
        self.input.clear();
        self.state = ViewState::Idle;
        self.copied_at = None;
    }

    pub fn can_submit(&self) -> bool {
        !self.input.trim().is_empty() && !self.state.is_loading()
    }

    /// `Idle -> Loading`. A finished session drops its previous result first. Returns `None`,
    /// leaving the state untouched, when the input is blank or a request is already in flight.
    pub fn begin_submit(&mut self) -> Option<AnalysisRequest> {
        if !self.can_submit() {
            return None;
        }
        self.copied_at = None;
        self.state = ViewState::Loading;
        tracing::debug!(input_len = self.input.len(), "analysis submitted");
        Some(AnalysisRequest::new(self.input.clone()))
    }

    /// `Loading -> Success | Failure`. Diagnostics go to the log; the view only keeps the generic
    /// message. The input text is left as is so it can be resubmitted.
    pub fn complete(&mut self, result: Result<FinancialAnalysis, ExtractionError>) {
        if !self.state.is_loading() {
            tracing::warn!(state = self.state.name(), "dropping analysis result for a session that is not loading");
            return;
        }

        self.state = match result {
            Ok(analysis) => ViewState::Success {
                analysis: Arc::new(analysis),
                analyzed_at: Utc::now(),
            },
            Err(err) => {
                tracing::error!(
                    provider = ?err.provider,
                    kind = ?err.kind,
                    stage = err.stage,
                    detail = %err.detail,
                    "analysis failed"
                );
                ViewState::Failure {
                    message: err.user_message(),
                }
            }
        };
    }

    /// `Loading -> Idle` for a request whose result will never arrive (the caller gave up on it).
    /// The input is kept so it can be resubmitted.
    pub fn abandon(&mut self) {
        if self.state.is_loading() {
            tracing::warn!(input_len = self.input.len(), "in-flight analysis abandoned");
            self.state = ViewState::Idle;
        }
    }

    pub async fn submit(&mut self) -> &ViewState {
        let Some(request) = self.begin_submit() else {
            return &self.state;
        };
        let result = self.client.analyze(&request).await;
        self.complete(result);
        &self.state
    }

    pub fn analysis(&self) -> Option<&Arc<FinancialAnalysis>> {
        match &self.state {
            ViewState::Success { analysis, .. } => Some(analysis),
            _ => None,
        }
    }

    pub fn dashboard(&self) -> Option<DashboardView> {
        self.analysis().map(|a| DashboardView::from_analysis(a))
    }

    pub fn error_message(&self) -> Option<&'static str> {
        match &self.state {
            ViewState::Failure { message } => Some(*message),
            _ => None,
        }
    }

    /// Report text for the clipboard; arms the "copied" indicator.
    pub fn copy_report(&mut self, now: Instant) -> Option<String> {
        let report = clipboard_report(self.analysis()?);
        self.copied_at = Some(now);
        Some(report)
    }

    pub fn is_copied(&self, now: Instant) -> bool {
        self.copied_at
            .is_some_and(|at| now.saturating_duration_since(at) < COPIED_INDICATOR_DURATION)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::analysis::SentimentLabel;
    use crate::llm::error::{ExtractionErrorKind, USER_FACING_MESSAGE};
    use crate::llm::Provider;
    use crate::present::style::SentimentStyle;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    struct ScriptedClient {
        replies: Mutex<Vec<Result<FinancialAnalysis, ExtractionError>>>,
        calls: AtomicUsize,
    }

    impl ScriptedClient {
        fn new(replies: Vec<Result<FinancialAnalysis, ExtractionError>>) -> Arc<Self> {
            Arc::new(Self {
                replies: Mutex::new(replies),
                calls: AtomicUsize::new(0),
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait::async_trait]
    impl LlmClient for ScriptedClient {
        fn provider(&self) -> Provider {
            Provider::Gemini
        }

        async fn analyze(
            &self,
            _request: &AnalysisRequest,
        ) -> Result<FinancialAnalysis, ExtractionError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.replies.lock().unwrap().remove(0)
        }
    }

    fn bullish_42() -> FinancialAnalysis {
        FinancialAnalysis {
            headline: "Cloud revenue accelerates".to_string(),
            executive_summary: "Azure grew 33%.".to_string(),
            sentiment_score: 42,
            sentiment_label: SentimentLabel::Bullish.into(),
            key_drivers: vec!["AI workloads".to_string()],
            investment_implications: "Buy.".to_string(),
            risk_factors: vec!["Capex intensity".to_string()],
            entities: vec![],
        }
    }

    fn malformed() -> ExtractionError {
        ExtractionError::malformed(Provider::Gemini, "parse", "expected value at line 1", None)
    }

    #[tokio::test]
    async fn empty_input_submit_has_no_effect() {
        let client = ScriptedClient::new(vec![]);
        let mut session = Session::new(client.clone());

        assert!(!session.can_submit());
        assert_eq!(session.submit().await, &ViewState::Idle);

        session.set_input("   \n\t");
        assert!(session.begin_submit().is_none());
        assert_eq!(session.state(), &ViewState::Idle);
        assert_eq!(client.calls(), 0);
    }

    #[tokio::test]
    async fn successful_submission_goes_idle_loading_success() {
        let client = ScriptedClient::new(vec![Ok(bullish_42())]);
        let mut session = Session::new(client.clone());
        session.set_input("Microsoft FY24 Q4 earnings call transcript");

        assert_eq!(session.state(), &ViewState::Idle);
        let request = session.begin_submit().unwrap();
        assert_eq!(session.state(), &ViewState::Loading);
        assert_eq!(request.text, "Microsoft FY24 Q4 earnings call transcript");

        let result = client.analyze(&request).await;
        session.complete(result);
        assert_eq!(session.state().name(), "success");

        let view = session.dashboard().unwrap();
        assert_eq!(view.gauge.rotation_deg, 37.8);
        assert_eq!(view.badge.style, SentimentStyle::Bullish);
        assert_eq!(client.calls(), 1);
    }

    #[tokio::test]
    async fn failure_keeps_input_and_allows_resubmission() {
        let client = ScriptedClient::new(vec![Err(malformed()), Ok(bullish_42())]);
        let mut session = Session::new(client.clone());
        session.set_input("Fed holds rates steady");

        let state = session.submit().await;
        assert_eq!(
            state,
            &ViewState::Failure {
                message: USER_FACING_MESSAGE
            }
        );
        assert_eq!(session.input(), "Fed holds rates steady");
        assert_eq!(session.error_message(), Some(USER_FACING_MESSAGE));
        assert!(session.dashboard().is_none());

        assert!(session.can_submit());
        assert_eq!(session.submit().await.name(), "success");
        assert_eq!(client.calls(), 2);
    }

    #[test]
    fn loading_gate_rejects_second_submission() {
        let client = ScriptedClient::new(vec![]);
        let mut session = Session::new(client);
        session.set_input("text");

        assert!(session.begin_submit().is_some());
        assert!(!session.can_submit());
        assert!(session.begin_submit().is_none());
        assert_eq!(session.state(), &ViewState::Loading);
    }

    #[test]
    fn complete_outside_loading_is_ignored() {
        let client = ScriptedClient::new(vec![]);
        let mut session = Session::new(client);
        session.complete(Ok(bullish_42()));
        assert_eq!(session.state(), &ViewState::Idle);
    }

    #[test]
    fn abandoned_request_returns_to_idle_with_input() {
        let mut session = Session::new(ScriptedClient::new(vec![]));
        session.set_input("Fed holds rates");
        session.begin_submit().unwrap();

        session.abandon();
        assert_eq!(session.state(), &ViewState::Idle);
        assert_eq!(session.input(), "Fed holds rates");
        assert!(session.can_submit());

        session.complete(Ok(bullish_42()));
        assert_eq!(session.state(), &ViewState::Idle);
    }

    #[test]
    fn new_submission_clears_previous_result() {
        let client = ScriptedClient::new(vec![]);
        let mut session = Session::new(client);
        session.set_input("text");
        session.begin_submit();
        session.complete(Ok(bullish_42()));
        assert!(session.analysis().is_some());

        session.begin_submit();
        assert!(session.analysis().is_none());
        assert_eq!(session.state(), &ViewState::Loading);
    }

    #[test]
    fn load_sample_and_reset() {
        let client = ScriptedClient::new(vec![]);
        let mut session = Session::new(client);
        session.load_sample();
        assert_eq!(session.input(), SAMPLE_TEXT);
        assert!(session.can_submit());

        session.reset();
        assert_eq!(session.input(), "");
        assert_eq!(session.state(), &ViewState::Idle);
    }

    #[test]
    fn copied_indicator_resets_after_two_seconds() {
        let client = ScriptedClient::new(vec![]);
        let mut session = Session::new(client);
        let t0 = Instant::now();
        assert!(session.copy_report(t0).is_none());

        session.set_input("text");
        session.begin_submit();
        session.complete(Ok(bullish_42()));

        let report = session.copy_report(t0).unwrap();
        assert!(report.contains("Cloud revenue accelerates"));
        assert!(session.is_copied(t0));
        assert!(session.is_copied(t0 + Duration::from_millis(1999)));
        assert!(!session.is_copied(t0 + COPIED_INDICATOR_DURATION));
    }

    #[test]
    fn failure_state_reports_generic_message_for_every_kind() {
        let client = ScriptedClient::new(vec![]);
        let mut session = Session::new(client);
        session.set_input("text");
        session.begin_submit();
        let err = ExtractionError::configuration(Provider::Gemini, "GEMINI_API_KEY is not configured");
        assert_eq!(err.kind, ExtractionErrorKind::Configuration);
        session.complete(Err(err));
        assert_eq!(session.error_message(), Some(USER_FACING_MESSAGE));
    }
}
