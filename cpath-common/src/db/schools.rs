//! School registration records
//!
//! Registration creates the school and its first administrator in one
//! transaction. The administrator receives the configured default credential;
//! only a salted SHA-256 hash of it is stored, flagged for change on first use.

use chrono::Utc;
use rand::RngCore;
use sha2::{Digest, Sha256};
use sqlx::SqlitePool;
use tracing::info;
use uuid::Uuid;

use super::models::{RegistrationOutcome, School};
use super::submissions::{format_timestamp, parse_timestamp, parse_uuid};
use crate::registration::ValidatedRegistration;
use crate::{Error, Result};

/// Random per-user salt, hex encoded
pub fn generate_salt() -> String {
    let mut bytes = [0u8; 16];
    rand::thread_rng().fill_bytes(&mut bytes);
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}

/// SHA-256 over salt then credential, hex encoded
pub fn hash_credential(salt: &str, credential: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(salt.as_bytes());
    hasher.update(credential.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Create a school and its administrator account
///
/// Fails with [`Error::Conflict`] when the registration code or the email is
/// already in use.
pub async fn register_school(
    pool: &SqlitePool,
    registration: &ValidatedRegistration,
    default_credential: &str,
) -> Result<RegistrationOutcome> {
    let code_taken: Option<(String,)> =
        sqlx::query_as("SELECT guid FROM schools WHERE registration_code = ?")
            .bind(&registration.registration_code)
            .fetch_optional(pool)
            .await?;
    if code_taken.is_some() {
        return Err(Error::Conflict(format!(
            "registration code {} is already in use",
            registration.registration_code
        )));
    }

    let email_taken: Option<(String,)> = sqlx::query_as("SELECT guid FROM users WHERE email = ?")
        .bind(&registration.email)
        .fetch_optional(pool)
        .await?;
    if email_taken.is_some() {
        return Err(Error::Conflict(format!(
            "email {} is already registered",
            registration.email
        )));
    }

    let school_id = Uuid::new_v4();
    let admin_id = Uuid::new_v4();
    let now = format_timestamp(&Utc::now());
    let salt = generate_salt();
    let credential_hash = hash_credential(&salt, default_credential);

    let mut tx = pool.begin().await?;

    sqlx::query(
        "INSERT INTO schools (guid, name, registration_code, created_at) VALUES (?, ?, ?, ?)",
    )
    .bind(school_id.to_string())
    .bind(&registration.school_name)
    .bind(&registration.registration_code)
    .bind(&now)
    .execute(&mut *tx)
    .await
    .map_err(unique_violation_as_conflict)?;

    sqlx::query(
        r#"
        INSERT INTO users (
            guid, school_id, name, email, role,
            credential_hash, credential_salt, must_change_credential, created_at
        ) VALUES (?, ?, ?, ?, 'admin', ?, ?, 1, ?)
        "#,
    )
    .bind(admin_id.to_string())
    .bind(school_id.to_string())
    .bind(&registration.admin_name)
    .bind(&registration.email)
    .bind(&credential_hash)
    .bind(&salt)
    .bind(&now)
    .execute(&mut *tx)
    .await
    .map_err(unique_violation_as_conflict)?;

    tx.commit().await?;

    info!(
        "Registered school {} ({}) with administrator {}",
        registration.school_name, school_id, registration.email
    );

    Ok(RegistrationOutcome {
        school_id,
        admin_id,
        default_credential: default_credential.to_string(),
        must_change_credential: true,
    })
}

// Covers the window between the lookups above and the insert
fn unique_violation_as_conflict(e: sqlx::Error) -> Error {
    if let sqlx::Error::Database(db_err) = &e {
        if db_err.is_unique_violation() {
            return Error::Conflict("school or administrator is already registered".to_string());
        }
    }
    Error::Database(e)
}

/// Look up a school by id
pub async fn get_school(pool: &SqlitePool, school_id: Uuid) -> Result<School> {
    let row: Option<(String, String, String, String)> = sqlx::query_as(
        "SELECT guid, name, registration_code, created_at FROM schools WHERE guid = ?",
    )
    .bind(school_id.to_string())
    .fetch_optional(pool)
    .await?;

    let (guid, name, registration_code, created_at) =
        row.ok_or_else(|| Error::NotFound(format!("school {}", school_id)))?;

    Ok(School {
        guid: parse_uuid(&guid, "school id")?,
        name,
        registration_code,
        created_at: parse_timestamp(&created_at)?,
    })
}
