//! cpath-qs library - Questionnaire Service
//!
//! Serves the question bank, runs one questionnaire per student session,
//! scores and persists completed questionnaires, and registers schools.

use axum::Router;
use cpath_common::db::{SqliteSubmissionStore, SubmissionSink};
use cpath_common::{QuestionBank, RecommendationPolicy, TallyScorer};
use sqlx::SqlitePool;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub mod api;
pub mod sessions;

use sessions::SessionRegistry;

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: SqlitePool,
    /// Question bank every session is built from
    pub bank: Arc<QuestionBank>,
    /// Scoring policy applied at submission
    pub scorer: Arc<dyn RecommendationPolicy>,
    /// Where completed submissions go
    pub sink: Arc<dyn SubmissionSink>,
    /// Read access to stored submissions
    pub store: SqliteSubmissionStore,
    pub sessions: SessionRegistry,
    /// Credential issued to newly registered school administrators
    pub default_credential: Arc<str>,
}

impl AppState {
    /// State backed by SQLite, scored with the default tally policy
    pub fn new(db: SqlitePool, bank: Arc<QuestionBank>, default_credential: &str) -> Self {
        let store = SqliteSubmissionStore::new(db.clone());
        Self {
            scorer: Arc::new(TallyScorer::for_bank(&bank)),
            sink: Arc::new(store.clone()),
            store,
            db,
            bank,
            sessions: SessionRegistry::new(),
            default_credential: Arc::from(default_credential),
        }
    }

    /// Replace the scoring policy
    pub fn with_scorer(mut self, scorer: Arc<dyn RecommendationPolicy>) -> Self {
        self.scorer = scorer;
        self
    }

    /// Replace the submission sink
    pub fn with_sink(mut self, sink: Arc<dyn SubmissionSink>) -> Self {
        self.sink = sink;
        self
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    use axum::routing::{get, post};

    let questionnaire = Router::new()
        .route("/api/questions", get(api::get_questions))
        .route("/api/sessions", post(api::start_session))
        .route("/api/sessions/:id", get(api::get_session))
        .route("/api/sessions/:id/answers", post(api::toggle_answer))
        .route("/api/sessions/:id/advance", post(api::advance))
        .route("/api/sessions/:id/retreat", post(api::retreat))
        .route("/api/sessions/:id/jump", post(api::jump))
        .route("/api/sessions/:id/submit", post(api::submit));

    let records = Router::new()
        .route("/api/schools/register", post(api::register_school))
        .route("/api/schools/:id", get(api::get_school))
        .route("/api/schools/:id/submissions", get(api::list_school_submissions))
        .route("/api/submissions/:id", get(api::get_submission));

    Router::new()
        .merge(questionnaire)
        .merge(records)
        .merge(api::health_routes())
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
