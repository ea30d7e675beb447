use std::collections::BTreeMap;

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use common::storage::StorageError;
use sea_orm::DbErr;
use serde::Serialize;

/// Validation messages keyed by field name.
pub type FieldErrors = BTreeMap<String, Vec<String>>;

/// Structured error response returned by all endpoints on failure.
#[derive(Serialize, utoipa::ToSchema)]
pub struct ErrorBody {
    /// Machine-readable error code. One of: `VALIDATION_ERROR`, `TOKEN_MISSING`,
    /// `TOKEN_INVALID`, `TOKEN_REVOKED`, `INVALID_CREDENTIALS`, `PERMISSION_DENIED`,
    /// `ACCOUNT_INACTIVE`, `NOT_FOUND`, `CONFLICT`, `INTERNAL_ERROR`.
    #[schema(example = "VALIDATION_ERROR")]
    pub code: &'static str,
    /// Human-readable error description.
    #[schema(example = "Validation errors")]
    pub message: String,
    /// Per-field validation messages, present only for field validation failures.
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(example = json!({"blog_title": ["Longer than maximum length 100."]}))]
    pub errors: Option<FieldErrors>,
}

/// Application-level error type.
#[derive(Debug)]
pub enum AppError {
    Validation(String),
    InvalidFields(FieldErrors),
    TokenMissing,
    TokenInvalid,
    TokenRevoked,
    InvalidCredentials,
    PermissionDenied,
    AccountInactive,
    NotFound(String),
    Conflict(String),
    Internal(String),
}

impl AppError {
    fn status_and_body(self) -> (StatusCode, ErrorBody) {
        let (status, code, message, errors) = match self {
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg, None),
            AppError::InvalidFields(errors) => (
                StatusCode::BAD_REQUEST,
                "VALIDATION_ERROR",
                "Validation errors".into(),
                Some(errors),
            ),
            AppError::TokenMissing => (
                StatusCode::UNAUTHORIZED,
                "TOKEN_MISSING",
                "Authentication required".into(),
                None,
            ),
            AppError::TokenInvalid => (
                StatusCode::UNAUTHORIZED,
                "TOKEN_INVALID",
                "Invalid or expired token".into(),
                None,
            ),
            AppError::TokenRevoked => (
                StatusCode::UNAUTHORIZED,
                "TOKEN_REVOKED",
                "Token has been revoked".into(),
                None,
            ),
            AppError::InvalidCredentials => (
                StatusCode::UNAUTHORIZED,
                "INVALID_CREDENTIALS",
                "Email or password is incorrect".into(),
                None,
            ),
            AppError::PermissionDenied => (
                StatusCode::FORBIDDEN,
                "PERMISSION_DENIED",
                "Access is not allowed".into(),
                None,
            ),
            AppError::AccountInactive => (
                StatusCode::FORBIDDEN,
                "ACCOUNT_INACTIVE",
                "The user account is not activated yet".into(),
                None,
            ),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg, None),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, "CONFLICT", msg, None),
            AppError::Internal(detail) => {
                tracing::error!("Internal error: {}", detail);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An unexpected error occurred".into(),
                    None,
                )
            }
        };

        (
            status,
            ErrorBody {
                code,
                message,
                errors,
            },
        )
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, body) = self.status_and_body();
        (status, Json(body)).into_response()
    }
}

impl From<DbErr> for AppError {
    fn from(err: DbErr) -> Self {
        AppError::Internal(err.to_string())
    }
}

impl From<StorageError> for AppError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::SizeLimitExceeded { limit, .. } => {
                AppError::Validation(format!("File exceeds maximum size of {limit} bytes"))
            }
            StorageError::InvalidName(name) => {
                AppError::Validation(format!("Invalid file name: {name}"))
            }
            other => AppError::Internal(other.to_string()),
        }
    }
}
