//! HTTP API handlers for cpath-qs

pub mod error;
pub mod health;
pub mod questions;
pub mod schools;
pub mod sessions;
pub mod submissions;

pub use error::ApiError;
pub use health::health_routes;
pub use questions::get_questions;
pub use schools::{get_school, list_school_submissions, register_school};
pub use sessions::{advance, get_session, jump, retreat, start_session, submit, toggle_answer};
pub use submissions::get_submission;
