use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post, put},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use uuid::Uuid;

use finsight_core::domain::analysis::AnalysisRequest;
use finsight_core::llm::error::{ExtractionError, USER_FACING_MESSAGE};
use finsight_core::llm::gemini::GeminiClient;
use finsight_core::llm::LlmClient;
use finsight_core::present::clipboard_report;
use finsight_core::sample::SAMPLE_TEXT;
use finsight_core::view::DashboardView;

mod sessions;

use sessions::{SessionStore, SessionView};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let settings = finsight_core::config::Settings::from_env()?;
    let _sentry_guard = init_sentry(&settings);

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer())
        .with(sentry_tracing::layer())
        .init();

    settings.log_missing_credentials();
    let client = GeminiClient::from_settings(&settings)?;
    tracing::info!(model = client.model(), "extraction client ready");

    let session_ttl = std::env::var("SESSION_TTL_SECS")
        .ok()
        .and_then(|v| v.parse().ok())
        .map(Duration::from_secs)
        .unwrap_or(sessions::DEFAULT_SESSION_TTL);
    let max_sessions = std::env::var("MAX_SESSIONS")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(sessions::DEFAULT_MAX_SESSIONS);

    let state = AppState {
        client: Arc::new(client),
        sessions: SessionStore::new(session_ttl, max_sessions),
    };

    let app = router(state);

    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(3000);
    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], port));

    tracing::info!(%addr, "api listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

fn router(state: AppState) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/sample", get(get_sample))
        .route("/analyze", post(analyze_once))
        .route("/sessions", post(create_session))
        .route("/sessions/:id", get(get_session).delete(delete_session))
        .route("/sessions/:id/input", put(put_input))
        .route("/sessions/:id/sample", post(load_sample))
        .route("/sessions/:id/analyze", post(analyze_session))
        .route("/sessions/:id/report", get(get_report).post(copy_report))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

async fn healthz() -> &'static str {
    "ok"
}

#[derive(Clone)]
struct AppState {
    client: Arc<dyn LlmClient>,
    sessions: SessionStore,
}

#[derive(Debug, Deserialize)]
struct InputBody {
    text: String,
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: &'static str,
}

type ApiError = (StatusCode, Json<ErrorBody>);

fn api_error(status: StatusCode, error: &'static str) -> ApiError {
    (status, Json(ErrorBody { error }))
}

fn capture_extraction_error(err: &ExtractionError) {
    let err = anyhow::Error::new(err.clone());
    sentry_anyhow::capture_anyhow(&err);
}

async fn get_sample() -> &'static str {
    SAMPLE_TEXT
}

async fn analyze_once(
    State(state): State<AppState>,
    Json(body): Json<InputBody>,
) -> Result<Json<DashboardView>, ApiError> {
    if body.text.trim().is_empty() {
        return Err(api_error(StatusCode::UNPROCESSABLE_ENTITY, "text must be non-empty"));
    }

    let analysis = state
        .client
        .analyze(&AnalysisRequest::new(body.text))
        .await
        .map_err(|e| {
            capture_extraction_error(&e);
            tracing::error!(kind = ?e.kind, stage = e.stage, detail = %e.detail, "one-shot analysis failed");
            api_error(StatusCode::BAD_GATEWAY, USER_FACING_MESSAGE)
        })?;

    Ok(Json(DashboardView::from_analysis(&analysis)))
}

async fn create_session(State(state): State<AppState>) -> (StatusCode, Json<SessionView>) {
    let view = state.sessions.create(Arc::clone(&state.client));
    (StatusCode::CREATED, Json(view))
}

async fn get_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SessionView>, StatusCode> {
    state
        .sessions
        .with_session(id, |s| SessionView::new(id, s, Instant::now()))
        .map(Json)
        .ok_or(StatusCode::NOT_FOUND)
}

async fn delete_session(State(state): State<AppState>, Path(id): Path<Uuid>) -> StatusCode {
    if state.sessions.remove(id) {
        StatusCode::NO_CONTENT
    } else {
        StatusCode::NOT_FOUND
    }
}

async fn put_input(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(body): Json<InputBody>,
) -> Result<Json<SessionView>, StatusCode> {
    state
        .sessions
        .with_session(id, |s| {
            s.set_input(body.text);
            SessionView::new(id, s, Instant::now())
        })
        .map(Json)
        .ok_or(StatusCode::NOT_FOUND)
}

async fn load_sample(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SessionView>, StatusCode> {
    state
        .sessions
        .with_session(id, |s| {
            s.load_sample();
            SessionView::new(id, s, Instant::now())
        })
        .map(Json)
        .ok_or(StatusCode::NOT_FOUND)
}

async fn analyze_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SessionView>, ApiError> {
    // Enter Loading under the lock, call the model without it, then settle under the lock again.
    let (request, client) = state
        .sessions
        .with_session(id, |s| {
            if s.state().is_loading() {
                return Err(api_error(StatusCode::CONFLICT, "analysis already in progress"));
            }
            match s.begin_submit() {
                Some(request) => Ok((request, s.client())),
                None => Err(api_error(StatusCode::UNPROCESSABLE_ENTITY, "text must be non-empty")),
            }
        })
        .ok_or_else(|| api_error(StatusCode::NOT_FOUND, "session not found"))??;

    // Dropping this future mid-call (client disconnect) abandons the request instead of leaving
    // the session Loading.
    let in_flight = state.sessions.in_flight(id);
    let result = client.analyze(&request).await;
    if let Err(e) = &result {
        capture_extraction_error(e);
    }

    in_flight
        .settle(result)
        .map(Json)
        .ok_or_else(|| api_error(StatusCode::NOT_FOUND, "session not found"))
}

/// Report text without side effects.
async fn get_report(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<String, StatusCode> {
    state
        .sessions
        .with_session(id, |s| s.analysis().map(|a| clipboard_report(a)))
        .flatten()
        .ok_or(StatusCode::NOT_FOUND)
}

/// Report text for the clipboard; arms the session's "copied" indicator.
async fn copy_report(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<String, StatusCode> {
    state
        .sessions
        .with_session(id, |s| s.copy_report(Instant::now()))
        .flatten()
        .ok_or(StatusCode::NOT_FOUND)
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
}

fn init_sentry(settings: &finsight_core::config::Settings) -> Option<sentry::ClientInitGuard> {
    let dsn = settings.sentry_dsn.as_deref()?;
    Some(sentry::init((
        dsn,
        sentry::ClientOptions {
            release: sentry::release_name!(),
            ..Default::default()
        },
    )))
}
