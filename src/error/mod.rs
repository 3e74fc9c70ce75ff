//! HTTP error mapping for the token authority
//!
//! Business errors from [`crate::auth`] are mapped to a status code plus the
//! uniform envelope here, at the transport boundary. They are never retried
//! server-side.

use std::collections::HashMap;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use crate::auth::AuthError;

/// API error with HTTP status code mapping
#[derive(Error, Debug)]
pub enum ApiError {
    /// Malformed request shape, with per-field messages
    #[error("Validation failed")]
    Validation(HashMap<String, Vec<String>>),

    /// Uniqueness violation at registration
    #[error("{0} already used")]
    Conflict(&'static str),

    /// Login mismatch, bad refresh token, or missing/invalid bearer token
    #[error("{0}")]
    Unauthorized(String),

    #[error("Internal server error")]
    Internal(String),
}

/// Envelope body for failures; `errors` appears only on validation failures.
#[derive(Serialize)]
struct ErrorBody {
    success: bool,
    message: String,
    data: Option<()>,
    #[serde(skip_serializing_if = "Option::is_none")]
    errors: Option<HashMap<String, Vec<String>>>,
}

impl ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<AuthError> for ApiError {
    fn from(e: AuthError) -> Self {
        match e {
            AuthError::Conflict(field) => ApiError::Conflict(field),
            AuthError::InvalidCredentials | AuthError::InvalidToken | AuthError::UserNotFound => {
                ApiError::Unauthorized(e.to_string())
            }
            AuthError::TokenEncoding(msg) | AuthError::Hashing(msg) | AuthError::Store(msg) => {
                ApiError::Internal(msg)
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        match &self {
            ApiError::Internal(detail) => {
                tracing::error!(detail = %detail, "Internal error");
            }
            other => {
                tracing::debug!(error = %other, status = %status, "Request rejected");
            }
        }

        let (message, errors) = match self {
            ApiError::Validation(errors) => ("Validation failed".to_string(), Some(errors)),
            // Do not leak internal detail to clients.
            ApiError::Internal(_) => ("Internal server error".to_string(), None),
            other => (other.to_string(), None),
        };

        let body = ErrorBody {
            success: false,
            message,
            data: None,
            errors,
        };

        (status, Json(body)).into_response()
    }
}
