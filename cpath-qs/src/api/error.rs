//! HTTP error responses
//!
//! Validation problems are echoed back so the form can show them inline.
//! Integration failures are logged with their cause and answered with a
//! generic retryable message.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use cpath_common::questionnaire::{EngineError, SectionGap};
use cpath_common::registration::ValidationError;
use cpath_common::scoring::ScoreError;
use cpath_common::Error;
use serde_json::json;
use thiserror::Error as ThisError;
use tracing::error;

/// Shown when a submission could not be stored
pub const SUBMISSION_RETRY_MESSAGE: &str =
    "Your answers could not be saved right now. They have been kept; please try submitting again.";

/// Shown for any other integration failure
pub const GENERIC_RETRY_MESSAGE: &str = "Something went wrong on our side. Please try again.";

#[derive(Debug, ThisError)]
pub enum ApiError {
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    /// Form cannot be submitted yet; lists the incomplete sections
    #[error("Incomplete: {message}")]
    Incomplete { message: String, gaps: Vec<SectionGap> },

    /// Persistence unavailable; the caller may retry
    #[error("Unavailable: {0}")]
    Unavailable(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn session_not_found(id: uuid::Uuid) -> Self {
        ApiError::NotFound(format!("session {}", id))
    }
}

impl From<Error> for ApiError {
    fn from(e: Error) -> Self {
        match e {
            Error::NotFound(what) => ApiError::NotFound(what),
            Error::Conflict(msg) => ApiError::Conflict(msg),
            Error::InvalidInput(msg) => ApiError::BadRequest(msg),
            Error::Validation(e) => e.into(),
            Error::Engine(e) => e.into(),
            other => {
                error!("Request failed: {}", other);
                ApiError::Internal(GENERIC_RETRY_MESSAGE.to_string())
            }
        }
    }
}

impl From<ValidationError> for ApiError {
    fn from(e: ValidationError) -> Self {
        ApiError::BadRequest(e.to_string())
    }
}

impl From<EngineError> for ApiError {
    fn from(e: EngineError) -> Self {
        match e {
            EngineError::UnknownQuestion(_) | EngineError::SectionOutOfRange { .. } => {
                ApiError::BadRequest(e.to_string())
            }
            EngineError::Incomplete { .. } => ApiError::Incomplete {
                message: e.to_string(),
                gaps: Vec::new(),
            },
            EngineError::SubmissionInFlight | EngineError::AlreadySubmitted => {
                ApiError::Conflict(e.to_string())
            }
        }
    }
}

impl From<ScoreError> for ApiError {
    fn from(e: ScoreError) -> Self {
        // The engine only releases complete answer maps, so this is a bug
        error!("Scoring precondition violated: {}", e);
        ApiError::Internal(GENERIC_RETRY_MESSAGE.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, json!({ "error": msg })),
            ApiError::NotFound(what) => (
                StatusCode::NOT_FOUND,
                json!({ "error": format!("Not found: {}", what) }),
            ),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, json!({ "error": msg })),
            ApiError::Incomplete { message, gaps } => (
                StatusCode::UNPROCESSABLE_ENTITY,
                json!({ "error": message, "gaps": gaps }),
            ),
            ApiError::Unavailable(msg) => (
                StatusCode::SERVICE_UNAVAILABLE,
                json!({ "error": msg, "retryable": true }),
            ),
            ApiError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, json!({ "error": msg })),
        };

        (status, Json(body)).into_response()
    }
}
