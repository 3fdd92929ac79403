pub mod domain;
pub mod llm;
pub mod present;
pub mod sample;
pub mod view;

pub mod config {
    #[derive(Debug, Clone, Default)]
    pub struct Settings {
        pub gemini_api_key: Option<String>,
        pub sentry_dsn: Option<String>,
    }

    impl Settings {
        pub fn from_env() -> anyhow::Result<Self> {
            Ok(Self {
                gemini_api_key: non_empty_var("GEMINI_API_KEY").or_else(|| non_empty_var("API_KEY")),
                sentry_dsn: non_empty_var("SENTRY_DSN"),
            })
        }

        /// A missing credential is not fatal at startup; the first analysis fails instead.
        pub fn log_missing_credentials(&self) {
            if self.gemini_api_key.is_none() {
                tracing::error!("GEMINI_API_KEY (or API_KEY) is not set; analyses will fail until it is configured");
            }
        }
    }

    fn non_empty_var(key: &str) -> Option<String> {
        std::env::var(key)
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }
}
