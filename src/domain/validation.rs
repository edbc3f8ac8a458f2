use derive_more::Display;
use lettre::Address;
use once_cell::sync::Lazy;
use regex::Regex;
use validator::{ValidateEmail, ValidateLength};

use crate::{
    constants::{DEFAULT_SUBJECT, MAX_EMAIL_LEN, MAX_MESSAGE_LEN, MAX_NAME_LEN, MAX_SUBJECT_LEN},
    entities::contact::{ContactSubmission, ValidSubmission},
};

/// `local@domain.tld`: no whitespace, exactly one `@`, at least one dot in the domain.
static EMAIL_SHAPE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[^\s@]+@[^\s@.]+(\.[^\s@.]+)+$").expect("email shape regex is valid")
});

#[derive(Debug, Display, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[display("{_0} is required")]
    MissingField(&'static str),

    #[display("Invalid email address")]
    InvalidEmail,

    #[display("{field} must be at most {max} characters")]
    TooLong { field: &'static str, max: u64 },
}

impl ValidationError {
    pub fn field(&self) -> &'static str {
        match self {
            ValidationError::MissingField(field) => field,
            ValidationError::InvalidEmail => "email",
            ValidationError::TooLong { field, .. } => field,
        }
    }
}

/// Checks presence and shape of every field, collecting all failures.
///
/// A blank or missing subject falls back to [`DEFAULT_SUBJECT`].
pub fn validate(submission: ContactSubmission) -> Result<ValidSubmission, Vec<ValidationError>> {
    let mut errors = Vec::new();

    let name = required("name", submission.name, MAX_NAME_LEN, &mut errors);
    let email = required("email", submission.email, MAX_EMAIL_LEN, &mut errors);
    let message = required("message", submission.message, MAX_MESSAGE_LEN, &mut errors);

    if let Some(email) = email.as_deref() {
        if !is_valid_email(email) {
            errors.push(ValidationError::InvalidEmail);
        }
    }

    let subject = match submission.subject.filter(|s| !is_blank(s)) {
        Some(subject) => {
            check_length("subject", &subject, MAX_SUBJECT_LEN, &mut errors);
            subject
        }
        None => DEFAULT_SUBJECT.to_string(),
    };

    match (name, email, message) {
        (Some(name), Some(email), Some(message)) if errors.is_empty() => {
            Ok(ValidSubmission::new(name, email, subject, message))
        }
        _ => Err(errors),
    }
}

/// An accepted address always parses as a lettre [`Address`].
pub fn is_valid_email(email: &str) -> bool {
    let email = email.trim();
    !email.chars().any(char::is_control)
        && EMAIL_SHAPE.is_match(email)
        && email.validate_email()
        && email.parse::<Address>().is_ok()
}

/// Blank means nothing but whitespace or control characters, which sanitizing would erase.
pub fn is_blank(value: &str) -> bool {
    value.chars().all(|c| c.is_whitespace() || c.is_control())
}

fn required(
    field: &'static str,
    value: Option<String>,
    max: u64,
    errors: &mut Vec<ValidationError>,
) -> Option<String> {
    match value.filter(|v| !is_blank(v)) {
        Some(value) => {
            check_length(field, &value, max, errors);
            Some(value)
        }
        None => {
            errors.push(ValidationError::MissingField(field));
            None
        }
    }
}

fn check_length(field: &'static str, value: &str, max: u64, errors: &mut Vec<ValidationError>) {
    if !value.trim().validate_length(None, Some(max), None) {
        errors.push(ValidationError::TooLong { field, max });
    }
}
