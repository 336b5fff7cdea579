//! Database models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::questionnaire::{AnswerMap, Tag};
use crate::registration::StudentDetails;
use crate::scoring::Recommendation;

/// Persisted result of one completed questionnaire
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubmissionRecord {
    pub guid: Uuid,
    pub school_id: Option<Uuid>,
    pub student_name: String,
    pub student_email: String,
    pub submitted_at: DateTime<Utc>,
    pub recommended_course: Tag,
    pub confidence_score: f64,
    pub answers: AnswerMap,
}

impl SubmissionRecord {
    /// Build a new record stamped with a fresh id and the current time
    pub fn new(
        student: &StudentDetails,
        school_id: Option<Uuid>,
        recommendation: Recommendation,
        answers: AnswerMap,
    ) -> Self {
        Self {
            guid: Uuid::new_v4(),
            school_id,
            student_name: student.name.clone(),
            student_email: student.email.clone(),
            submitted_at: Utc::now(),
            recommended_course: recommendation.recommended_course,
            confidence_score: recommendation.confidence_score,
            answers,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct School {
    pub guid: Uuid,
    pub name: String,
    pub registration_code: String,
    pub created_at: DateTime<Utc>,
}

/// Result of a successful school registration
///
/// `default_credential` is returned exactly once; only its salted hash is
/// stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RegistrationOutcome {
    pub school_id: Uuid,
    pub admin_id: Uuid,
    pub default_credential: String,
    pub must_change_credential: bool,
}
