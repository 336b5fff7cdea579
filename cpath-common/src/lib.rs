//! # CoursePath Common Library
//!
//! Shared code for all CoursePath services including:
//! - Question bank and questionnaire engine
//! - Recommendation scoring policies
//! - Registration input validation
//! - Database initialization and record stores
//! - Configuration loading

pub mod config;
pub mod db;
pub mod error;
pub mod questionnaire;
pub mod registration;
pub mod scoring;

pub use error::{Error, Result};
pub use questionnaire::{AnswerMap, QuestionBank, Questionnaire, Tag};
pub use scoring::{Recommendation, RecommendationPolicy, TallyScorer};
