//! Common error types for CoursePath

use thiserror::Error;

use crate::questionnaire::{BankError, EngineError};
use crate::registration::ValidationError;
use crate::scoring::ScoreError;

/// Common result type for CoursePath operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error types across CoursePath services
#[derive(Error, Debug)]
pub enum Error {
    /// Database operation error (wraps sqlx::Error)
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// TOML document could not be parsed
    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    /// Stored JSON payload could not be encoded or decoded
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Question bank failed structural validation
    #[error("Question bank error: {0}")]
    Bank(#[from] BankError),

    /// Questionnaire state machine rejected an operation
    #[error("Questionnaire error: {0}")]
    Engine(#[from] EngineError),

    /// Scoring precondition violated
    #[error("Scoring error: {0}")]
    Score(#[from] ScoreError),

    /// User-supplied form input rejected before any database call
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Requested resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Record collides with an existing one (duplicate code or email)
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Invalid user input or request parameter
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Internal server error
    #[error("Internal error: {0}")]
    Internal(String),
}
