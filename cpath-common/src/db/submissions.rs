//! Submission persistence
//!
//! [`SubmissionSink`] is the boundary the questionnaire service hands a
//! completed record to. It is called once per submission and never retried
//! automatically; a failure is reported back so the student can retry.

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use sqlx::SqlitePool;
use tracing::debug;
use uuid::Uuid;

use super::models::SubmissionRecord;
use crate::questionnaire::{AnswerMap, Tag};
use crate::{Error, Result};

/// Destination for completed questionnaire results
#[async_trait]
pub trait SubmissionSink: Send + Sync {
    /// Persist one record; errors leave nothing half-written
    async fn submit(&self, record: &SubmissionRecord) -> Result<()>;
}

/// SQLite-backed submission store
#[derive(Debug, Clone)]
pub struct SqliteSubmissionStore {
    pool: SqlitePool,
}

type SubmissionRow = (String, Option<String>, String, String, String, String, f64, String);

const SELECT_COLUMNS: &str = "SELECT guid, school_id, student_name, student_email, submitted_at, \
     recommended_course, confidence_score, answers_json FROM submissions";

impl SqliteSubmissionStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Load one submission by id
    pub async fn get(&self, guid: Uuid) -> Result<SubmissionRecord> {
        let row: Option<SubmissionRow> = sqlx::query_as(&format!("{} WHERE guid = ?", SELECT_COLUMNS))
            .bind(guid.to_string())
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(row) => row_to_record(row),
            None => Err(Error::NotFound(format!("submission {}", guid))),
        }
    }

    /// Submissions linked to a school, newest first
    pub async fn list_for_school(&self, school_id: Uuid) -> Result<Vec<SubmissionRecord>> {
        let rows: Vec<SubmissionRow> = sqlx::query_as(&format!(
            "{} WHERE school_id = ? ORDER BY submitted_at DESC",
            SELECT_COLUMNS
        ))
        .bind(school_id.to_string())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(row_to_record).collect()
    }
}

#[async_trait]
impl SubmissionSink for SqliteSubmissionStore {
    async fn submit(&self, record: &SubmissionRecord) -> Result<()> {
        let answers_json = serde_json::to_string(&record.answers)?;

        sqlx::query(
            r#"
            INSERT INTO submissions (
                guid, school_id, student_name, student_email, submitted_at,
                recommended_course, confidence_score, answers_json
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(record.guid.to_string())
        .bind(record.school_id.map(|id| id.to_string()))
        .bind(&record.student_name)
        .bind(&record.student_email)
        .bind(format_timestamp(&record.submitted_at))
        .bind(record.recommended_course.as_str())
        .bind(record.confidence_score)
        .bind(answers_json)
        .execute(&self.pool)
        .await?;

        debug!(
            "Stored submission {} ({} -> {})",
            record.guid, record.student_email, record.recommended_course
        );
        Ok(())
    }
}

/// Fixed-width RFC 3339 so text ordering matches time ordering
pub(crate) fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Nanos, true)
}

pub(crate) fn parse_timestamp(value: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|ts| ts.with_timezone(&Utc))
        .map_err(|e| Error::Internal(format!("Invalid timestamp {:?}: {}", value, e)))
}

pub(crate) fn parse_uuid(value: &str, column: &str) -> Result<Uuid> {
    Uuid::parse_str(value)
        .map_err(|e| Error::Internal(format!("Invalid {} {:?}: {}", column, value, e)))
}

fn row_to_record(row: SubmissionRow) -> Result<SubmissionRecord> {
    let (guid, school_id, student_name, student_email, submitted_at, course, confidence, answers_json) =
        row;

    let recommended_course: Tag = course
        .parse()
        .map_err(|e| Error::Internal(format!("Stored submission {}: {}", guid, e)))?;
    let answers: AnswerMap = serde_json::from_str(&answers_json)?;

    Ok(SubmissionRecord {
        guid: parse_uuid(&guid, "submission id")?,
        school_id: school_id
            .as_deref()
            .map(|id| parse_uuid(id, "school id"))
            .transpose()?,
        student_name,
        student_email,
        submitted_at: parse_timestamp(&submitted_at)?,
        recommended_course,
        confidence_score: confidence,
        answers,
    })
}
