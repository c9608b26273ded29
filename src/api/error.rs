use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use std::fmt;

use super::{ErrorBody, ValidationErrorBody};
use crate::services::{AccountError, AuthError, BankAccountError};

#[derive(Debug)]
pub enum ApiError {
    NotFound(String),

    DatabaseError(String),

    /// Field-level messages, rendered as `{"errors": [...]}` with 422.
    ValidationError(Vec<String>),

    BadRequest(String),

    Unauthorized(String),

    Forbidden(String),

    InternalError(String),
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::NotFound(msg) => write!(f, "Not found: {msg}"),
            ApiError::DatabaseError(msg) => write!(f, "Database error: {msg}"),
            ApiError::ValidationError(errors) => {
                write!(f, "Validation error: {}", errors.join(", "))
            }
            ApiError::BadRequest(msg) => write!(f, "Bad request: {msg}"),
            ApiError::Unauthorized(msg) => write!(f, "Unauthorized: {msg}"),
            ApiError::Forbidden(msg) => write!(f, "Forbidden: {msg}"),
            ApiError::InternalError(msg) => write!(f, "Internal error: {msg}"),
        }
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            ApiError::ValidationError(errors) => {
                return (
                    StatusCode::UNPROCESSABLE_ENTITY,
                    Json(ValidationErrorBody { errors }),
                )
                    .into_response();
            }
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::DatabaseError(msg) => {
                tracing::error!("Database error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "An internal error occurred".to_string(),
                )
            }
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg),
            ApiError::Forbidden(msg) => (StatusCode::FORBIDDEN, msg),
            ApiError::InternalError(msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "An internal error occurred".to_string(),
                )
            }
        };

        (status, Json(ErrorBody::new(error_message))).into_response()
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        ApiError::InternalError(err.to_string())
    }
}

impl From<tower_sessions::session::Error> for ApiError {
    fn from(err: tower_sessions::session::Error) -> Self {
        ApiError::InternalError(format!("Session error: {err}"))
    }
}

impl From<AccountError> for ApiError {
    fn from(err: AccountError) -> Self {
        match err {
            AccountError::Validation(errors) => ApiError::ValidationError(errors),
            AccountError::NotFound(resource) => ApiError::not_found(resource),
            AccountError::Forbidden(_) => ApiError::Forbidden(err.to_string()),
            AccountError::Database(msg) => ApiError::DatabaseError(msg),
            AccountError::Internal(msg) => ApiError::InternalError(msg),
        }
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::InvalidCredentials
            | AuthError::InvalidCode
            | AuthError::NoPendingSignIn => ApiError::Unauthorized(err.to_string()),
            AuthError::Database(msg) => ApiError::DatabaseError(msg),
            AuthError::Internal(msg) => ApiError::InternalError(msg),
        }
    }
}

impl From<BankAccountError> for ApiError {
    fn from(err: BankAccountError) -> Self {
        match err {
            BankAccountError::Validation(errors) => ApiError::ValidationError(errors),
            BankAccountError::NotFound => ApiError::not_found("Bank account"),
            BankAccountError::Forbidden => ApiError::Forbidden(err.to_string()),
            BankAccountError::Database(msg) => ApiError::DatabaseError(msg),
            BankAccountError::Internal(msg) => ApiError::InternalError(msg),
        }
    }
}

impl ApiError {
    pub fn not_found(resource: &str) -> Self {
        ApiError::NotFound(format!("{resource} not found"))
    }

    pub fn unauthorized() -> Self {
        ApiError::Unauthorized("You need to sign in first".to_string())
    }

    pub fn bad_request(msg: impl Into<String>) -> Self {
        ApiError::BadRequest(msg.into())
    }
}
