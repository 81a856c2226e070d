//! Error handling for the roster.
//!
//! `AppError` is what collaborators and the REST surface speak; it maps to HTTP
//! status codes and the JSON error envelope. The editing core never panics or
//! throws on user mistakes: it returns `FieldError`, `UploadError` and
//! `SubmitError` values and keeps fetch/submit failures in a `Banner`.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::models::{MemberField, PhotoSlot};

/// Error codes as constants to avoid stringly-typed errors.
pub mod codes {
    pub const NOT_FOUND: &str = "NOT_FOUND";
    pub const VALIDATION_ERROR: &str = "VALIDATION_ERROR";
    pub const CONFLICT: &str = "CONFLICT";
    pub const INTERNAL_ERROR: &str = "INTERNAL_ERROR";
    pub const DATABASE_ERROR: &str = "DATABASE_ERROR";
    pub const UPLOAD_ERROR: &str = "UPLOAD_ERROR";
    pub const NETWORK_ERROR: &str = "NETWORK_ERROR";
    pub const BAD_REQUEST: &str = "BAD_REQUEST";
}

/// Application error type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppError {
    /// Resource not found
    NotFound(String),
    /// Request data failed validation
    Validation(String),
    /// Uniqueness constraint violated (e.g. duplicate phone number)
    Conflict(String),
    /// Database error
    Database(String),
    /// Photo could not be stored
    Upload(String),
    /// Remote collaborator unreachable or answered garbage
    Network(String),
    /// Internal server error
    Internal(String),
    /// Bad request
    BadRequest(String),
}

impl AppError {
    /// Get the HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Upload(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::Network(_) => StatusCode::BAD_GATEWAY,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
        }
    }

    /// Get the error code for this error.
    pub fn error_code(&self) -> &'static str {
        match self {
            AppError::NotFound(_) => codes::NOT_FOUND,
            AppError::Validation(_) => codes::VALIDATION_ERROR,
            AppError::Conflict(_) => codes::CONFLICT,
            AppError::Database(_) => codes::DATABASE_ERROR,
            AppError::Upload(_) => codes::UPLOAD_ERROR,
            AppError::Network(_) => codes::NETWORK_ERROR,
            AppError::Internal(_) => codes::INTERNAL_ERROR,
            AppError::BadRequest(_) => codes::BAD_REQUEST,
        }
    }

    /// Get the error message.
    pub fn message(&self) -> &str {
        match self {
            AppError::NotFound(msg)
            | AppError::Validation(msg)
            | AppError::Conflict(msg)
            | AppError::Database(msg)
            | AppError::Upload(msg)
            | AppError::Network(msg)
            | AppError::Internal(msg)
            | AppError::BadRequest(msg) => msg,
        }
    }

    /// Rebuild an error from the code and message of a remote error envelope.
    pub fn from_code(code: &str, message: String) -> Self {
        match code {
            codes::NOT_FOUND => AppError::NotFound(message),
            codes::VALIDATION_ERROR => AppError::Validation(message),
            codes::CONFLICT => AppError::Conflict(message),
            codes::DATABASE_ERROR => AppError::Database(message),
            codes::UPLOAD_ERROR => AppError::Upload(message),
            codes::NETWORK_ERROR => AppError::Network(message),
            codes::BAD_REQUEST => AppError::BadRequest(message),
            _ => AppError::Internal(message),
        }
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.error_code(), self.message())
    }
}

impl std::error::Error for AppError {}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_err) = &err {
            if db_err.is_unique_violation() {
                return AppError::Conflict(
                    "Phone number is already used by another member of this group".to_string(),
                );
            }
        }
        tracing::error!("Database error: {:?}", err);
        AppError::Database(format!("Database error: {}", err))
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        tracing::error!("JSON error: {:?}", err);
        AppError::BadRequest(format!("JSON error: {}", err))
    }
}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        tracing::warn!("HTTP client error: {:?}", err);
        AppError::Network(format!("Request failed: {}", err))
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        tracing::error!("I/O error: {:?}", err);
        AppError::Internal(format!("I/O error: {}", err))
    }
}

/// Error details in the response envelope.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorDetails {
    pub code: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

/// Error response envelope.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: ErrorDetails,
}

impl ErrorResponse {
    pub fn new(error: &AppError) -> Self {
        Self {
            success: false,
            error: ErrorDetails {
                code: error.error_code().to_string(),
                message: error.message().to_string(),
                details: None,
            },
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = ErrorResponse::new(&self);
        (status, Json(body)).into_response()
    }
}

// ==================== EDITOR ERRORS ====================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldErrorKind {
    Required,
    DuplicatePhone,
}

/// Validation failure shown inline next to one member field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field: MemberField,
    pub kind: FieldErrorKind,
}

impl FieldError {
    pub fn required(field: MemberField) -> Self {
        Self {
            field,
            kind: FieldErrorKind::Required,
        }
    }

    pub fn duplicate_phone() -> Self {
        Self {
            field: MemberField::PhoneNumber,
            kind: FieldErrorKind::DuplicatePhone,
        }
    }

    pub fn message(&self) -> String {
        match self.kind {
            FieldErrorKind::Required => format!("{} is required", self.field),
            FieldErrorKind::DuplicatePhone => {
                "This phone number is already used by another member".to_string()
            }
        }
    }
}

impl std::fmt::Display for FieldError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message())
    }
}

impl std::error::Error for FieldError {}

/// An upload failure scoped to one photo slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadError {
    pub slot: PhotoSlot,
    pub message: String,
}

impl std::fmt::Display for UploadError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} photo upload failed: {}", self.slot, self.message)
    }
}

impl std::error::Error for UploadError {}

/// Why a submission did not go through. The draft is kept in every case.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitError {
    /// The group name is blank.
    NameRequired,
    /// Edit mode with nothing pending.
    NoChanges,
    /// A submission is already in flight.
    InProgress,
    /// The submission collaborator refused or failed.
    Rejected(AppError),
}

impl std::fmt::Display for SubmitError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SubmitError::NameRequired => f.write_str("Group name is required"),
            SubmitError::NoChanges => f.write_str("There are no changes to save"),
            SubmitError::InProgress => f.write_str("A submission is already in progress"),
            SubmitError::Rejected(err) => write!(f, "Could not save the group: {}", err.message()),
        }
    }
}

impl std::error::Error for SubmitError {}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BannerKind {
    Fetch,
    Submit,
}

/// Dismissible message shown at the top of the form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Banner {
    pub kind: BannerKind,
    pub message: String,
}
