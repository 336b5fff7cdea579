//! Integration tests for database initialization and record stores
//!
//! Tests cover:
//! - Automatic database creation on first run
//! - Submission persistence through the sink and read-back
//! - School registration, duplicate detection and credential hashing

use cpath_common::db::{
    get_school, hash_credential, init_database, register_school, SqliteSubmissionStore,
    SubmissionRecord, SubmissionSink,
};
use cpath_common::registration::{RegistrationRequest, StudentDetails};
use cpath_common::scoring::{RecommendationPolicy, TallyScorer};
use cpath_common::{AnswerMap, Error, QuestionBank, Tag};
use sqlx::SqlitePool;
use tempfile::TempDir;
use uuid::Uuid;

async fn setup_db() -> (TempDir, SqlitePool) {
    let dir = tempfile::tempdir().expect("Should create temp dir");
    let pool = init_database(&dir.path().join("coursepath.db"))
        .await
        .expect("Should initialize database");
    (dir, pool)
}

fn registration(code: &str, email: &str) -> RegistrationRequest {
    RegistrationRequest {
        school_name: "Lakeside Academy".to_string(),
        admin_name: "Jordan Lee".to_string(),
        email: email.to_string(),
        registration_code: code.to_string(),
    }
}

fn complete_answers(tag: Tag) -> AnswerMap {
    let bank = QuestionBank::builtin().unwrap();
    let mut answers = AnswerMap::new();
    for question in bank.questions() {
        answers.toggle(&question.id, tag);
    }
    answers
}

fn record_for(school_id: Option<Uuid>, email: &str, tag: Tag) -> SubmissionRecord {
    let answers = complete_answers(tag);
    let recommendation = TallyScorer::new().score(&answers).unwrap();
    let student = StudentDetails::new("Test Student", email).unwrap();
    SubmissionRecord::new(&student, school_id, recommendation, answers)
}

// =============================================================================
// Initialization
// =============================================================================

#[tokio::test]
async fn test_database_creation_when_missing() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("nested").join("coursepath.db");
    assert!(!db_path.exists());

    let result = init_database(&db_path).await;
    assert!(result.is_ok(), "Database initialization failed: {:?}", result.err());
    assert!(db_path.exists(), "Database file was not created");
}

#[tokio::test]
async fn test_database_opens_existing() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("coursepath.db");

    let pool1 = init_database(&db_path).await.unwrap();
    pool1.close().await;

    let pool2 = init_database(&db_path).await;
    assert!(pool2.is_ok(), "Failed to open existing database: {:?}", pool2.err());
}

#[tokio::test]
async fn test_schema_tables_exist() {
    let (_dir, pool) = setup_db().await;

    for table in ["schema_version", "schools", "users", "submissions"] {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = ?",
        )
        .bind(table)
        .fetch_one(&pool)
        .await
        .unwrap();
        assert_eq!(count, 1, "table {} should exist", table);
    }

    let version: i64 = sqlx::query_scalar("SELECT MAX(version) FROM schema_version")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(version, cpath_common::db::SCHEMA_VERSION);
}

// =============================================================================
// Submissions
// =============================================================================

#[tokio::test]
async fn test_submission_round_trip() {
    let (_dir, pool) = setup_db().await;
    let store = SqliteSubmissionStore::new(pool);

    let record = record_for(None, "solo@student.org", Tag::AiSl);
    store.submit(&record).await.expect("Should persist submission");

    let loaded = store.get(record.guid).await.expect("Should load submission");
    assert_eq!(loaded, record);
    assert_eq!(loaded.recommended_course, Tag::AiSl);
    assert_eq!(loaded.confidence_score, 100.0);
    assert_eq!(loaded.answers.answered_count(), 25);
}

#[tokio::test]
async fn test_missing_submission_is_not_found() {
    let (_dir, pool) = setup_db().await;
    let store = SqliteSubmissionStore::new(pool);

    let result = store.get(Uuid::new_v4()).await;
    assert!(matches!(result, Err(Error::NotFound(_))));
}

#[tokio::test]
async fn test_list_for_school_newest_first() {
    let (_dir, pool) = setup_db().await;
    let outcome = register_school(
        &pool,
        &registration("REG-MATH-10001", "admin@lakeside.edu").validate().unwrap(),
        "welcome",
    )
    .await
    .unwrap();
    let store = SqliteSubmissionStore::new(pool);

    let first = record_for(Some(outcome.school_id), "first@lakeside.edu", Tag::AaHl);
    store.submit(&first).await.unwrap();
    let second = record_for(Some(outcome.school_id), "second@lakeside.edu", Tag::AiHl);
    store.submit(&second).await.unwrap();
    store.submit(&record_for(None, "other@elsewhere.org", Tag::AaSl)).await.unwrap();

    let listed = store.list_for_school(outcome.school_id).await.unwrap();
    let emails: Vec<&str> = listed.iter().map(|r| r.student_email.as_str()).collect();
    assert_eq!(emails, vec!["second@lakeside.edu", "first@lakeside.edu"]);
}

#[tokio::test]
async fn test_submission_for_unknown_school_fails() {
    let (_dir, pool) = setup_db().await;
    let store = SqliteSubmissionStore::new(pool);

    let record = record_for(Some(Uuid::new_v4()), "ghost@school.org", Tag::AaHl);
    let result = store.submit(&record).await;
    assert!(matches!(result, Err(Error::Database(_))));
}

// =============================================================================
// Schools
// =============================================================================

#[tokio::test]
async fn test_register_school_stores_hashed_credential() {
    let (_dir, pool) = setup_db().await;
    let validated = registration("REG-MATH-12345", "Head@Lakeside.edu").validate().unwrap();

    let outcome = register_school(&pool, &validated, "Default-Pass-1").await.unwrap();
    assert_eq!(outcome.default_credential, "Default-Pass-1");
    assert!(outcome.must_change_credential);

    let school = get_school(&pool, outcome.school_id).await.unwrap();
    assert_eq!(school.name, "Lakeside Academy");
    assert_eq!(school.registration_code, "REG-MATH-12345");

    let (email, hash, salt, must_change): (String, String, String, i64) = sqlx::query_as(
        "SELECT email, credential_hash, credential_salt, must_change_credential FROM users WHERE guid = ?",
    )
    .bind(outcome.admin_id.to_string())
    .fetch_one(&pool)
    .await
    .unwrap();

    assert_eq!(email, "head@lakeside.edu");
    assert_ne!(hash, "Default-Pass-1");
    assert_eq!(hash, hash_credential(&salt, "Default-Pass-1"));
    assert_eq!(must_change, 1);
}

#[tokio::test]
async fn test_duplicate_registration_code_conflicts() {
    let (_dir, pool) = setup_db().await;
    let first = registration("REG-MATH-22222", "one@school.org").validate().unwrap();
    register_school(&pool, &first, "x").await.unwrap();

    let second = registration("REG-MATH-22222", "two@school.org").validate().unwrap();
    let result = register_school(&pool, &second, "x").await;
    assert!(matches!(result, Err(Error::Conflict(_))));
}

#[tokio::test]
async fn test_duplicate_email_conflicts() {
    let (_dir, pool) = setup_db().await;
    let first = registration("REG-MATH-33333", "same@school.org").validate().unwrap();
    register_school(&pool, &first, "x").await.unwrap();

    let second = registration("REG-MATH-44444", "SAME@school.org").validate().unwrap();
    let result = register_school(&pool, &second, "x").await;
    assert!(matches!(result, Err(Error::Conflict(_))));

    let schools: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM schools")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(schools, 1, "rejected registration must not leave a school behind");
}

#[tokio::test]
async fn test_unknown_school_is_not_found() {
    let (_dir, pool) = setup_db().await;
    let result = get_school(&pool, Uuid::new_v4()).await;
    assert!(matches!(result, Err(Error::NotFound(_))));
}

#[test]
fn test_hash_credential_depends_on_salt() {
    let a = hash_credential("salt-a", "secret");
    let b = hash_credential("salt-b", "secret");
    assert_ne!(a, b);
    assert_eq!(a.len(), 64);
    assert_eq!(a, hash_credential("salt-a", "secret"));
}
