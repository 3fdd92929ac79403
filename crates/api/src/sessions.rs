use chrono::{DateTime, Utc};
use finsight_core::domain::analysis::FinancialAnalysis;
use finsight_core::llm::error::ExtractionError;
use finsight_core::llm::LlmClient;
use finsight_core::view::{DashboardView, Session, ViewState};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};
use uuid::Uuid;

pub const DEFAULT_SESSION_TTL: Duration = Duration::from_secs(30 * 60);
pub const DEFAULT_MAX_SESSIONS: usize = 1024;

struct Entry {
    session: Session,
    touched_at: Instant,
}

/// In-memory view sessions. Nothing outlives the process.
///
/// Sessions untouched for longer than the TTL are swept when a new one is created, and the store
/// never holds more than `capacity` sessions; the least recently used one makes room.
#[derive(Clone)]
pub struct SessionStore {
    inner: Arc<Mutex<HashMap<Uuid, Entry>>>,
    ttl: Duration,
    capacity: usize,
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new(DEFAULT_SESSION_TTL, DEFAULT_MAX_SESSIONS)
    }
}

impl SessionStore {
    pub fn new(ttl: Duration, capacity: usize) -> Self {
        Self {
            inner: Arc::default(),
            ttl,
            capacity: capacity.max(1),
        }
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<Uuid, Entry>> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn create(&self, client: Arc<dyn LlmClient>) -> SessionView {
        self.create_at(client, Instant::now())
    }

    fn create_at(&self, client: Arc<dyn LlmClient>, now: Instant) -> SessionView {
        let id = Uuid::new_v4();
        let session = Session::new(client);
        let view = SessionView::new(id, &session, now);

        let mut sessions = self.lock();
        let before = sessions.len();
        sessions.retain(|_, entry| now.saturating_duration_since(entry.touched_at) < self.ttl);
        let expired = before - sessions.len();

        let mut evicted = 0usize;
        while sessions.len() >= self.capacity {
            let Some(oldest) = sessions
                .iter()
                .min_by_key(|(_, entry)| entry.touched_at)
                .map(|(id, _)| *id)
            else {
                break;
            };
            sessions.remove(&oldest);
            evicted += 1;
        }

        sessions.insert(
            id,
            Entry {
                session,
                touched_at: now,
            },
        );
        tracing::debug!(%id, live = sessions.len(), expired, evicted, "session created");
        view
    }

    /// Runs `f` under the store lock. Never hold this across an await.
    pub fn with_session<R>(&self, id: Uuid, f: impl FnOnce(&mut Session) -> R) -> Option<R> {
        let mut sessions = self.lock();
        sessions.get_mut(&id).map(|entry| {
            entry.touched_at = Instant::now();
            f(&mut entry.session)
        })
    }

    pub fn remove(&self, id: Uuid) -> bool {
        self.lock().remove(&id).is_some()
    }

    /// Ties the `Loading` state of session `id` to the returned value; see [`InFlight`].
    pub fn in_flight(&self, id: Uuid) -> InFlight {
        InFlight {
            store: self.clone(),
            id,
            settled: false,
        }
    }
}

/// An analysis running outside the store lock.
///
/// [`InFlight::settle`] records the result. Dropping it unsettled (the request future was
/// cancelled, or the call unwound) abandons the request, so the session never stays `Loading`.
pub struct InFlight {
    store: SessionStore,
    id: Uuid,
    settled: bool,
}

impl InFlight {
    pub fn settle(
        mut self,
        result: Result<FinancialAnalysis, ExtractionError>,
    ) -> Option<SessionView> {
        self.settled = true;
        let id = self.id;
        self.store.with_session(id, |s| {
            s.complete(result);
            SessionView::new(id, s, Instant::now())
        })
    }
}

impl Drop for InFlight {
    fn drop(&mut self) {
        if !self.settled {
            self.store.with_session(self.id, Session::abandon);
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionView {
    pub id: Uuid,
    pub input: String,
    pub state: &'static str,
    pub can_submit: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub analyzed_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dashboard: Option<DashboardView>,
    pub copied: bool,
}

impl SessionView {
    pub fn new(id: Uuid, session: &Session, now: Instant) -> Self {
        let analyzed_at = match session.state() {
            ViewState::Success { analyzed_at, .. } => Some(*analyzed_at),
            _ => None,
        };
        Self {
            id,
            input: session.input().to_string(),
            state: session.state().name(),
            can_submit: session.can_submit(),
            error: session.error_message(),
            analyzed_at,
            dashboard: session.dashboard(),
            copied: session.is_copied(now),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use finsight_core::domain::analysis::AnalysisRequest;
    use finsight_core::llm::Provider;

    struct NoopClient;

    #[async_trait::async_trait]
    impl LlmClient for NoopClient {
        fn provider(&self) -> Provider {
            Provider::Gemini
        }

        async fn analyze(
            &self,
            _request: &AnalysisRequest,
        ) -> Result<FinancialAnalysis, ExtractionError> {
            Err(ExtractionError::configuration(Provider::Gemini, "unused"))
        }
    }

    fn client() -> Arc<dyn LlmClient> {
        Arc::new(NoopClient)
    }

    #[test]
    fn idle_sessions_expire_when_new_ones_are_created() {
        let store = SessionStore::new(Duration::from_secs(60), 16);
        let old = store.create(client());

        let later = Instant::now() + Duration::from_secs(61);
        let fresh = store.create_at(client(), later);

        assert!(store.with_session(old.id, |_| ()).is_none());
        assert!(store.with_session(fresh.id, |_| ()).is_some());
    }

    #[test]
    fn capacity_evicts_least_recently_used() {
        let store = SessionStore::new(Duration::from_secs(3600), 2);
        let now = Instant::now();
        let first = store.create_at(client(), now);
        let second = store.create_at(client(), now + Duration::from_millis(1));
        let third = store.create_at(client(), now + Duration::from_millis(2));

        assert!(store.with_session(first.id, |_| ()).is_none());
        assert!(store.with_session(second.id, |_| ()).is_some());
        assert!(store.with_session(third.id, |_| ()).is_some());
        assert_eq!(store.lock().len(), 2);
    }

    #[test]
    fn dropped_in_flight_abandons_loading_session() {
        let store = SessionStore::default();
        let view = store.create(client());
        store.with_session(view.id, |s| {
            s.set_input("Copper hits record");
            s.begin_submit().unwrap();
        });

        drop(store.in_flight(view.id));

        let (state, can_submit) = store
            .with_session(view.id, |s| (s.state().name(), s.can_submit()))
            .unwrap();
        assert_eq!(state, "idle");
        assert!(can_submit);
    }

    #[test]
    fn settled_in_flight_records_result() {
        let store = SessionStore::default();
        let view = store.create(client());
        store.with_session(view.id, |s| {
            s.set_input("Copper hits record");
            s.begin_submit().unwrap();
        });

        let err = ExtractionError::transport(Provider::Gemini, "http", "timeout", None);
        let settled = store.in_flight(view.id).settle(Err(err)).unwrap();
        assert_eq!(settled.state, "failure");
        assert!(settled.can_submit);
    }
}
