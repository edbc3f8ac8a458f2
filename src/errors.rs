use std::fmt;

use actix_web::{
    error::ResponseError,
    http::{header::{self, ContentType}, StatusCode},
    HttpResponse
};
use serde::Serialize;

use crate::{mail::MailError, validation::ValidationError};

#[derive(Debug)]
pub enum AppError {
    ValidationError(Vec<FieldError>),
    OriginRejected(String),
    RateLimited { retry_after_secs: u64 },
    DispatchError(MailError),
    InternalError(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::ValidationError(errors) => {
                let messages = errors.iter()
                    .map(|e| format!("{}:{}", e.field, e.message))
                    .collect::<Vec<_>>()
                    .join(", ");
                write!(f, "validation error: {}", messages)
            }
            AppError::OriginRejected(origin) => write!(f, "Origin not allowed: {}", origin),
            AppError::RateLimited { retry_after_secs } => {
                write!(f, "Rate limited, retry after {}s", retry_after_secs)
            }
            AppError::DispatchError(err) => write!(f, "Mail dispatch failed: {}", err),
            AppError::InternalError(msg) => write!(f, "Internal server error: {}", msg)
        }
    }
}

impl ResponseError for AppError {
    fn error_response(&self) -> HttpResponse {
        // Only validation failures echo details; everything else gets a fixed message.
        let body = match self {
            AppError::ValidationError(errors) => {
                serde_json::json!({
                    "error": "Validation failed",
                    "details": errors
                })
            }
            AppError::OriginRejected(_) => serde_json::json!({"error": "Origin not allowed"}),
            AppError::RateLimited { .. } => {
                serde_json::json!({"error": "Too many requests, please try again later."})
            }
            AppError::DispatchError(_) => serde_json::json!({"error": "Failed to send email"}),
            AppError::InternalError(_) => serde_json::json!({"error": "Internal server error"}),
        };

        let mut builder = HttpResponse::build(self.status_code());
        builder.insert_header(ContentType::json());
        if let AppError::RateLimited { retry_after_secs } = self {
            builder.insert_header((header::RETRY_AFTER, retry_after_secs.to_string()));
        }
        builder.json(body)
    }

    fn status_code(&self) -> StatusCode {
        match self {
            AppError::ValidationError(_) => StatusCode::BAD_REQUEST,
            AppError::OriginRejected(_) => StatusCode::FORBIDDEN,
            AppError::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
            AppError::DispatchError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<Vec<ValidationError>> for AppError {
    fn from(errors: Vec<ValidationError>) -> Self {
        let field_errors = errors
            .iter()
            .map(|e| FieldError {
                field: e.field().to_string(),
                message: e.to_string(),
            })
            .collect();

        AppError::ValidationError(field_errors)
    }
}

impl From<MailError> for AppError {
    fn from(err: MailError) -> Self {
        AppError::DispatchError(err)
    }
}

#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}
