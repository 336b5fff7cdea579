//! School registration and school-scoped queries

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use cpath_common::db::{self, RegistrationOutcome, School, SubmissionRecord};
use cpath_common::registration::RegistrationRequest;
use serde::Serialize;
use tracing::info;
use uuid::Uuid;

use super::error::ApiError;
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct SchoolSubmissionsResponse {
    pub school_id: Uuid,
    pub total: usize,
    /// Newest first
    pub submissions: Vec<SubmissionRecord>,
}

/// POST /api/schools/register
///
/// Creates the school and its administrator. The default credential appears
/// in this response only and must be changed on first sign-in.
pub async fn register_school(
    State(state): State<AppState>,
    Json(req): Json<RegistrationRequest>,
) -> Result<(StatusCode, Json<RegistrationOutcome>), ApiError> {
    let registration = req.validate()?;
    let outcome = db::register_school(&state.db, &registration, &state.default_credential).await?;

    info!(
        "School registration accepted: {} ({})",
        registration.school_name, outcome.school_id
    );
    Ok((StatusCode::CREATED, Json(outcome)))
}

/// GET /api/schools/:id
pub async fn get_school(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<School>, ApiError> {
    Ok(Json(db::get_school(&state.db, id).await?))
}

/// GET /api/schools/:id/submissions
pub async fn list_school_submissions(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SchoolSubmissionsResponse>, ApiError> {
    // 404 for unknown schools instead of an empty list
    db::get_school(&state.db, id).await?;

    let submissions = state.store.list_for_school(id).await?;
    Ok(Json(SchoolSubmissionsResponse {
        school_id: id,
        total: submissions.len(),
        submissions,
    }))
}
