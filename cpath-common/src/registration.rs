//! Registration and student detail validation
//!
//! Pure input checks run before any database call. A school registers with a
//! code of the form `REG-MATH-` followed by exactly five ASCII digits; emails
//! must have the `local@domain.tld` shape.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;
use thiserror::Error;

/// Fixed prefix of every registration code
pub const REGISTRATION_CODE_PREFIX: &str = "REG-MATH-";

static REGISTRATION_CODE_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^REG-MATH-[0-9]{5}$").expect("registration code pattern is valid"));

static EMAIL_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern is valid"));

/// Form input rejected before reaching persistence
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{0} is required")]
    MissingField(&'static str),

    #[error("{0:?} is not a valid email address")]
    MalformedEmail(String),

    #[error("{0:?} is not a valid registration code (expected {prefix}#####)", prefix = REGISTRATION_CODE_PREFIX)]
    MalformedRegistrationCode(String),
}

/// Trimmed, non-empty value of a required field
pub fn require<'a>(field: &'static str, value: &'a str) -> Result<&'a str, ValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::MissingField(field));
    }
    Ok(trimmed)
}

/// Check a registration code; case sensitive, surrounding whitespace ignored
pub fn validate_registration_code(code: &str) -> Result<(), ValidationError> {
    let code = require("registration code", code)?;
    if REGISTRATION_CODE_PATTERN.is_match(code) {
        Ok(())
    } else {
        Err(ValidationError::MalformedRegistrationCode(code.to_string()))
    }
}

pub fn validate_email(email: &str) -> Result<(), ValidationError> {
    let email = require("email", email)?;
    if EMAIL_PATTERN.is_match(email) {
        Ok(())
    } else {
        Err(ValidationError::MalformedEmail(email.to_string()))
    }
}

/// Raw school registration form
#[derive(Debug, Clone, Deserialize)]
pub struct RegistrationRequest {
    #[serde(default)]
    pub school_name: String,
    #[serde(default)]
    pub admin_name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub registration_code: String,
}

/// Registration form that passed every check
///
/// Fields are trimmed; the email is lower-cased so uniqueness checks are
/// case-insensitive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedRegistration {
    pub school_name: String,
    pub admin_name: String,
    pub email: String,
    pub registration_code: String,
}

impl RegistrationRequest {
    pub fn validate(&self) -> Result<ValidatedRegistration, ValidationError> {
        let school_name = require("school name", &self.school_name)?;
        let admin_name = require("admin name", &self.admin_name)?;
        let email = require("email", &self.email)?;
        let code = require("registration code", &self.registration_code)?;

        validate_email(email)?;
        validate_registration_code(code)?;

        Ok(ValidatedRegistration {
            school_name: school_name.to_string(),
            admin_name: admin_name.to_string(),
            email: email.to_lowercase(),
            registration_code: code.to_string(),
        })
    }
}

/// Identity of the student filling in a questionnaire
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StudentDetails {
    pub name: String,
    pub email: String,
}

impl StudentDetails {
    pub fn new(name: &str, email: &str) -> Result<Self, ValidationError> {
        let name = require("student name", name)?;
        let email = require("student email", email)?;
        validate_email(email)?;

        Ok(Self {
            name: name.to_string(),
            email: email.to_lowercase(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(code: &str) -> RegistrationRequest {
        RegistrationRequest {
            school_name: "Northfield International".to_string(),
            admin_name: "Sam Rivera".to_string(),
            email: "Admin@Northfield.edu".to_string(),
            registration_code: code.to_string(),
        }
    }

    #[test]
    fn test_registration_code_accepts_five_digits() {
        assert!(validate_registration_code("REG-MATH-12345").is_ok());
        assert!(validate_registration_code("  REG-MATH-00000 ").is_ok());
    }

    #[test]
    fn test_registration_code_rejections() {
        for code in [
            "REG-MATH-1234",
            "REG-MATH-123456",
            "reg-math-12345",
            "REG-MATH-12a45",
            "REG-MAT-12345",
            "XREG-MATH-12345",
            "REG-MATH-１２３４５",
        ] {
            assert_eq!(
                validate_registration_code(code),
                Err(ValidationError::MalformedRegistrationCode(code.trim().to_string())),
                "{} should be rejected",
                code
            );
        }
        assert_eq!(
            validate_registration_code("   "),
            Err(ValidationError::MissingField("registration code"))
        );
    }

    #[test]
    fn test_email_shape() {
        assert!(validate_email("student@school.org").is_ok());
        assert!(validate_email("a.b+c@sub.domain.co.uk").is_ok());

        for bad in ["student", "student@school", "@school.org", "stu dent@school.org", "a@b@c.org"] {
            assert!(validate_email(bad).is_err(), "{} should be rejected", bad);
        }
    }

    #[test]
    fn test_request_validation_normalizes() {
        let validated = request(" REG-MATH-54321 ").validate().unwrap();
        assert_eq!(validated.registration_code, "REG-MATH-54321");
        assert_eq!(validated.email, "admin@northfield.edu");
        assert_eq!(validated.school_name, "Northfield International");
    }

    #[test]
    fn test_request_missing_fields() {
        let mut req = request("REG-MATH-54321");
        req.admin_name = "  ".to_string();
        assert_eq!(req.validate(), Err(ValidationError::MissingField("admin name")));

        let mut req = request("REG-MATH-54321");
        req.school_name.clear();
        assert_eq!(req.validate(), Err(ValidationError::MissingField("school name")));
    }

    #[test]
    fn test_request_lowercase_code_rejected() {
        let err = request("reg-math-12345").validate().unwrap_err();
        assert!(matches!(err, ValidationError::MalformedRegistrationCode(_)));
    }

    #[test]
    fn test_student_details() {
        let student = StudentDetails::new(" Ada Lovelace ", "Ada@Example.com").unwrap();
        assert_eq!(student.name, "Ada Lovelace");
        assert_eq!(student.email, "ada@example.com");

        assert_eq!(
            StudentDetails::new("", "ada@example.com"),
            Err(ValidationError::MissingField("student name"))
        );
        assert!(matches!(
            StudentDetails::new("Ada", "ada.example.com"),
            Err(ValidationError::MalformedEmail(_))
        ));
    }
}
