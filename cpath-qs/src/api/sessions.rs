//! Student questionnaire sessions
//!
//! Every navigation and answer call runs the engine under the registry lock
//! and returns the refreshed session view. Submission releases the lock
//! before calling the sink so a slow database never blocks other students.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Utc};
use cpath_common::db::{get_school, SubmissionRecord};
use cpath_common::questionnaire::{
    AdvanceOutcome, EngineError, Progress, SectionGap, SubmissionPhase,
};
use cpath_common::registration::StudentDetails;
use cpath_common::{AnswerMap, Questionnaire, Tag};
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};
use uuid::Uuid;

use super::error::{ApiError, SUBMISSION_RETRY_MESSAGE};
use crate::sessions::{PendingSubmission, SessionRegistry, StudentSession};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct StartSessionRequest {
    #[serde(default)]
    pub student_name: String,
    #[serde(default)]
    pub student_email: String,
    /// Registered school the student belongs to, if any
    #[serde(default)]
    pub school_id: Option<Uuid>,
}

#[derive(Debug, Deserialize)]
pub struct ToggleRequest {
    pub question_id: String,
    pub value: Tag,
}

#[derive(Debug, Deserialize)]
pub struct JumpRequest {
    pub section: usize,
}

/// Completion state of one section, for the navigation bar
#[derive(Debug, Serialize)]
pub struct SectionStatus {
    pub index: usize,
    pub title: String,
    pub unanswered: usize,
    pub complete: bool,
}

/// Everything a client needs to render the current screen
#[derive(Debug, Serialize)]
pub struct SessionView {
    pub session_id: Uuid,
    pub student_name: String,
    pub student_email: String,
    pub school_id: Option<Uuid>,
    pub started_at: DateTime<Utc>,
    pub current_section: usize,
    pub section_count: usize,
    pub phase: SubmissionPhase,
    pub progress: Progress,
    pub answers: AnswerMap,
    pub sections: Vec<SectionStatus>,
    /// Present once the student tried to submit an incomplete form
    #[serde(skip_serializing_if = "Option::is_none")]
    pub validation_summary: Option<Vec<SectionGap>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub submission_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
}

impl SessionView {
    fn new(session_id: Uuid, session: &StudentSession) -> Self {
        let questionnaire: &Questionnaire = &session.questionnaire;
        let bank = questionnaire.bank();

        let sections = bank
            .sections()
            .iter()
            .enumerate()
            .map(|(index, section)| {
                let unanswered = questionnaire.unanswered_in_section(index);
                SectionStatus {
                    index,
                    title: section.title.clone(),
                    unanswered,
                    complete: unanswered == 0,
                }
            })
            .collect();

        Self {
            session_id,
            student_name: session.student.name.clone(),
            student_email: session.student.email.clone(),
            school_id: session.school_id,
            started_at: session.started_at,
            current_section: questionnaire.current_section(),
            section_count: bank.section_count(),
            phase: questionnaire.phase(),
            progress: questionnaire.progress(),
            answers: questionnaire.answers().clone(),
            sections,
            validation_summary: questionnaire
                .validation_requested()
                .then(|| questionnaire.section_gaps()),
            submission_id: session.submission_id,
            last_error: session.last_error.clone(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ToggleResponse {
    pub question_id: String,
    /// Tags now selected for the question, oldest first
    pub selected: Vec<Tag>,
    pub session: SessionView,
}

/// Stored recommendation handed back to the student
#[derive(Debug, Clone, Serialize)]
pub struct SubmissionSummary {
    pub submission_id: Uuid,
    pub recommended_course: Tag,
    pub course_name: String,
    pub confidence_score: f64,
}

impl From<&SubmissionRecord> for SubmissionSummary {
    fn from(record: &SubmissionRecord) -> Self {
        Self {
            submission_id: record.guid,
            recommended_course: record.recommended_course,
            course_name: record.recommended_course.course_name().to_string(),
            confidence_score: record.confidence_score,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum AdvanceResponse {
    Moved {
        session: SessionView,
    },
    Blocked {
        gaps: Vec<SectionGap>,
        session: SessionView,
    },
    Submitted {
        submission: SubmissionSummary,
        session: SessionView,
    },
}

#[derive(Debug, Serialize)]
pub struct SubmitResponse {
    pub submission: SubmissionSummary,
    pub session: SessionView,
}

/// Run `f` against a session, mapping an unknown id to 404
fn with_session<T>(
    state: &AppState,
    id: Uuid,
    f: impl FnOnce(&mut StudentSession) -> Result<T, ApiError>,
) -> Result<T, ApiError> {
    state
        .sessions
        .with_session(id, f)
        .unwrap_or_else(|| Err(ApiError::session_not_found(id)))
}

fn view(state: &AppState, id: Uuid) -> Result<SessionView, ApiError> {
    with_session(state, id, |s| Ok(SessionView::new(id, s)))
}

/// POST /api/sessions
pub async fn start_session(
    State(state): State<AppState>,
    Json(req): Json<StartSessionRequest>,
) -> Result<(StatusCode, Json<SessionView>), ApiError> {
    let student = StudentDetails::new(&req.student_name, &req.student_email)?;

    if let Some(school_id) = req.school_id {
        // Unknown school ids are rejected here rather than at submission
        get_school(&state.db, school_id).await?;
    }

    let session = StudentSession::new(student, req.school_id, Questionnaire::new(state.bank.clone()));
    let id = state.sessions.insert(session);
    info!("Session {} started (school: {:?})", id, req.school_id);

    Ok((StatusCode::CREATED, Json(view(&state, id)?)))
}

/// GET /api/sessions/:id
pub async fn get_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SessionView>, ApiError> {
    Ok(Json(view(&state, id)?))
}

/// POST /api/sessions/:id/answers
///
/// Toggles one option. Selecting a third option drops the oldest selection.
pub async fn toggle_answer(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<ToggleRequest>,
) -> Result<Json<ToggleResponse>, ApiError> {
    let response = with_session(&state, id, |s| {
        let selected = s
            .questionnaire
            .toggle_answer(&req.question_id, req.value)?
            .to_vec();
        Ok(ToggleResponse {
            question_id: req.question_id.clone(),
            selected,
            session: SessionView::new(id, s),
        })
    })?;

    Ok(Json(response))
}

/// POST /api/sessions/:id/advance
///
/// On the last section a complete form is submitted in the same request.
pub async fn advance(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<AdvanceResponse>, ApiError> {
    enum Step {
        Moved(SessionView),
        Blocked(Vec<SectionGap>, SessionView),
        Submit(PendingSubmission),
    }

    let step = with_session(&state, id, |s| {
        Ok(match s.questionnaire.advance()? {
            AdvanceOutcome::Moved { .. } => Step::Moved(SessionView::new(id, s)),
            AdvanceOutcome::Blocked { gaps } => Step::Blocked(gaps, SessionView::new(id, s)),
            AdvanceOutcome::Submit(answers) => Step::Submit(s.pending(answers)),
        })
    })?;

    let response = match step {
        Step::Moved(session) => AdvanceResponse::Moved { session },
        Step::Blocked(gaps, session) => AdvanceResponse::Blocked { gaps, session },
        Step::Submit(pending) => {
            let submission = persist(&state, id, pending).await?;
            AdvanceResponse::Submitted {
                submission,
                session: view(&state, id)?,
            }
        }
    };

    Ok(Json(response))
}

/// POST /api/sessions/:id/retreat
pub async fn retreat(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SessionView>, ApiError> {
    let session = with_session(&state, id, |s| {
        s.questionnaire.retreat()?;
        Ok(SessionView::new(id, s))
    })?;
    Ok(Json(session))
}

/// POST /api/sessions/:id/jump
///
/// Free navigation: any section may be opened regardless of completeness.
pub async fn jump(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<JumpRequest>,
) -> Result<Json<SessionView>, ApiError> {
    let session = with_session(&state, id, |s| {
        s.questionnaire.jump_to(req.section)?;
        Ok(SessionView::new(id, s))
    })?;
    Ok(Json(session))
}

/// POST /api/sessions/:id/submit
///
/// Submits from any section. Also used to retry after a failed submission.
pub async fn submit(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SubmitResponse>, ApiError> {
    let pending = with_session(&state, id, |s| match s.questionnaire.begin_submission() {
        Ok(answers) => Ok(s.pending(answers)),
        Err(e @ EngineError::Incomplete { .. }) => Err(ApiError::Incomplete {
            message: e.to_string(),
            gaps: s.questionnaire.section_gaps(),
        }),
        Err(e) => Err(e.into()),
    })?;

    let submission = persist(&state, id, pending).await?;
    Ok(Json(SubmitResponse {
        submission,
        session: view(&state, id)?,
    }))
}

/// Returns an in-flight session to editing unless disarmed
///
/// Covers every early exit from [`persist`], including the request future
/// being dropped while the sink call is pending.
struct InFlightGuard<'a> {
    sessions: &'a SessionRegistry,
    id: Uuid,
    armed: bool,
}

impl<'a> InFlightGuard<'a> {
    fn new(sessions: &'a SessionRegistry, id: Uuid) -> Self {
        Self {
            sessions,
            id,
            armed: true,
        }
    }

    fn disarm(mut self) {
        self.armed = false;
    }
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        let aborted = self.sessions.with_session(self.id, |s| {
            s.questionnaire.abort_submission();
            s.last_error = Some(SUBMISSION_RETRY_MESSAGE.to_string());
        });
        if aborted.is_some() {
            warn!("Submission for session {} did not complete; answers kept for retry", self.id);
        }
    }
}

/// Score and store an in-flight submission, then settle the session
///
/// On failure, or if the caller stops waiting, the session returns to
/// editing with every answer intact.
async fn persist(
    state: &AppState,
    id: Uuid,
    pending: PendingSubmission,
) -> Result<SubmissionSummary, ApiError> {
    let guard = InFlightGuard::new(&state.sessions, id);

    let recommendation = state.scorer.score(&pending.answers)?;
    let record = SubmissionRecord::new(
        &pending.student,
        pending.school_id,
        recommendation,
        pending.answers,
    );

    if let Err(e) = state.sink.submit(&record).await {
        error!("Failed to store submission for session {}: {}", id, e);
        return Err(ApiError::Unavailable(SUBMISSION_RETRY_MESSAGE.to_string()));
    }

    guard.disarm();
    let settled = state.sessions.with_session(id, |s| {
        s.questionnaire.complete_submission();
        s.submission_id = Some(record.guid);
        s.last_error = None;
    });
    if settled.is_none() {
        warn!("Session {} vanished while submission {} was stored", id, record.guid);
    }
    info!(
        "Session {} submitted: {} ({}%, policy {})",
        id,
        record.recommended_course,
        record.confidence_score,
        state.scorer.name()
    );
    Ok(SubmissionSummary::from(&record))
}
