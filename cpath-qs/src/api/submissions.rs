//! Stored submission lookup

use axum::{
    extract::{Path, State},
    Json,
};
use cpath_common::db::SubmissionRecord;
use uuid::Uuid;

use super::error::ApiError;
use crate::AppState;

/// GET /api/submissions/:id
pub async fn get_submission(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SubmissionRecord>, ApiError> {
    Ok(Json(state.store.get(id).await?))
}
