//! Application error types

use crate::models::ContactField;
use serde::Serialize;
use thiserror::Error;

/// Application-wide error type
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Document store error: {0}")]
    Store(String),

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("SMTP error: {0}")]
    Smtp(#[from] lettre::transport::smtp::Error),

    #[error("Mail build error: {0}")]
    MailBuild(#[from] lettre::error::Error),

    #[error("Mail error: {0}")]
    Mail(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Missing required fields: {}", join_fields(.0))]
    MissingFields(Vec<ContactField>),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Coarse error classes used by the HTTP layer to pick status and detail exposure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// Bad caller input, reported with field-level detail
    Validation,
    /// Missing secret or credential, never reported with detail
    Configuration,
    /// Store or mail failure, detail only in development mode
    Transport,
    /// Requested entity absent
    NotFound,
    /// Shared-secret mismatch
    Unauthorized,
}

impl AppError {
    /// Classify this error for the boundary
    pub fn class(&self) -> ErrorClass {
        match self {
            AppError::Validation(_) | AppError::MissingFields(_) => ErrorClass::Validation,
            AppError::Config(_) => ErrorClass::Configuration,
            AppError::NotFound(_) => ErrorClass::NotFound,
            AppError::Unauthorized(_) => ErrorClass::Unauthorized,
            AppError::Store(_)
            | AppError::Http(_)
            | AppError::Serialization(_)
            | AppError::Smtp(_)
            | AppError::MailBuild(_)
            | AppError::Mail(_)
            | AppError::Io(_)
            | AppError::Internal(_) => ErrorClass::Transport,
        }
    }

    /// Whether this error came from the outbound mail path
    pub fn is_mail_failure(&self) -> bool {
        matches!(
            self,
            AppError::Smtp(_) | AppError::MailBuild(_) | AppError::Mail(_)
        )
    }
}

fn join_fields(fields: &[ContactField]) -> String {
    fields
        .iter()
        .map(|f| f.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Serializable error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub code: String,
    pub message: String,
}

impl From<AppError> for ErrorResponse {
    fn from(err: AppError) -> Self {
        let code = match &err {
            AppError::Store(_) => "STORE_ERROR",
            AppError::Http(_) => "HTTP_ERROR",
            AppError::Serialization(_) => "SERIALIZATION_ERROR",
            AppError::Smtp(_) => "SMTP_ERROR",
            AppError::MailBuild(_) => "MAIL_BUILD_ERROR",
            AppError::Mail(_) => "MAIL_ERROR",
            AppError::Validation(_) => "VALIDATION_ERROR",
            AppError::MissingFields(_) => "MISSING_FIELDS",
            AppError::NotFound(_) => "NOT_FOUND",
            AppError::Config(_) => "CONFIG_ERROR",
            AppError::Unauthorized(_) => "UNAUTHORIZED",
            AppError::Io(_) => "IO_ERROR",
            AppError::Internal(_) => "INTERNAL_ERROR",
        };

        ErrorResponse {
            code: code.to_string(),
            message: err.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_fields_message() {
        let err = AppError::MissingFields(vec![ContactField::Name, ContactField::Phone]);
        assert_eq!(err.to_string(), "Missing required fields: name, phone");
        assert_eq!(err.class(), ErrorClass::Validation);
    }

    #[test]
    fn test_error_classes() {
        assert_eq!(AppError::Config("x".into()).class(), ErrorClass::Configuration);
        assert_eq!(AppError::Store("x".into()).class(), ErrorClass::Transport);
        assert_eq!(AppError::Mail("x".into()).class(), ErrorClass::Transport);
        assert_eq!(AppError::NotFound("car".into()).class(), ErrorClass::NotFound);
        assert!(AppError::Mail("x".into()).is_mail_failure());
        assert!(!AppError::Store("x".into()).is_mail_failure());
    }

    #[test]
    fn test_error_response_code() {
        let response = ErrorResponse::from(AppError::NotFound("car abc".into()));
        assert_eq!(response.code, "NOT_FOUND");
        assert_eq!(response.message, "Not found: car abc");
    }
}
