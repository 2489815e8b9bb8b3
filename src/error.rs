//! Error types and HTTP error response handling.
//!
//! This module defines all application errors and how they are converted
//! into HTTP responses. The JSON body itself is written by
//! [`crate::middleware::error_envelope`], which knows the request URI; the
//! response produced here only carries the status and an [`ErrorReport`]
//! extension describing the failure.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Application-wide error type.
///
/// Each variant maps to one HTTP status code and one `errorMessage` label.
/// The `String` payloads are user-facing and end up in `errorDetails`.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Database operation failed (e.g., connection error, query error).
    ///
    /// Returns HTTP 500. Details are logged, never sent to the client.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Requested user or card does not exist.
    #[error("{0}")]
    NotFound(String),

    /// Request violates a business rule or carries invalid data.
    #[error("{0}")]
    BadRequest(String),

    /// Email/password pair did not match a user.
    #[error("{0}")]
    InvalidCredentials(String),

    /// Token is malformed, badly signed or carries unreadable claims.
    ///
    /// Returns HTTP 400.
    #[error("{0}")]
    TokenValidation(String),

    /// Token is missing, expired or not usable for this request.
    ///
    /// Returns HTTP 401.
    #[error("{0}")]
    TokenAuthentication(String),

    /// Authenticated caller lacks the role required by the route.
    #[error("Access denied")]
    Forbidden,

    /// Unexpected failure outside the database (hashing, token encoding).
    #[error("{0}")]
    Internal(String),
}

impl AppError {
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest(message.into())
    }

    /// HTTP status code for this error.
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::BadRequest(_) | AppError::TokenValidation(_) => StatusCode::BAD_REQUEST,
            AppError::InvalidCredentials(_) | AppError::TokenAuthentication(_) => {
                StatusCode::UNAUTHORIZED
            }
            AppError::Forbidden => StatusCode::FORBIDDEN,
            AppError::Database(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Short label written to `errorMessage`.
    pub fn label(&self) -> &'static str {
        match self {
            AppError::NotFound(_) => "NOT FOUND",
            AppError::BadRequest(_) => "BAD REQUEST",
            AppError::InvalidCredentials(_) => "INVALID CREDENTIALS",
            AppError::TokenValidation(_) => "JWT VALIDATION ERROR",
            AppError::TokenAuthentication(_) => "JWT AUTH ERROR",
            AppError::Forbidden => "FORBIDDEN",
            AppError::Database(_) | AppError::Internal(_) => "Internal Server Error",
        }
    }

    /// User-facing text written to `errorDetails`.
    fn details(&self) -> String {
        match self {
            AppError::Database(_) | AppError::Internal(_) => {
                "An unexpected error occurred".to_string()
            }
            other => other.to_string(),
        }
    }
}

/// Failure description handed from a handler to the error envelope middleware.
#[derive(Debug, Clone)]
pub struct ErrorReport {
    pub message: &'static str,
    pub details: String,
}

/// Uniform error body returned for every failed request.
///
/// ```json
/// {
///   "uri": "/cards/transfer",
///   "errorStatus": "400 BAD REQUEST",
///   "errorMessage": "BAD REQUEST",
///   "errorDetails": "Insufficient funds on the card",
///   "timestamp": "2025-12-21T16:00:00Z"
/// }
/// ```
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorResponse {
    pub uri: String,
    pub error_status: String,
    pub error_message: String,
    pub error_details: String,
    pub timestamp: DateTime<Utc>,
}

/// Formats a status as `"<code> <REASON>"`, e.g. `"404 NOT FOUND"`.
pub fn format_status(status: StatusCode) -> String {
    format!(
        "{} {}",
        status.as_u16(),
        status.canonical_reason().unwrap_or("").to_uppercase()
    )
}

/// Label used for errors axum produces on its own (rejections, unknown routes).
pub fn default_label(status: StatusCode) -> &'static str {
    match status {
        StatusCode::NOT_FOUND => "NOT FOUND",
        StatusCode::UNAUTHORIZED => "UNAUTHORIZED",
        StatusCode::FORBIDDEN => "FORBIDDEN",
        StatusCode::METHOD_NOT_ALLOWED => "METHOD NOT ALLOWED",
        s if s.is_server_error() => "Internal Server Error",
        _ => "BAD REQUEST",
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        match &self {
            AppError::Database(err) => tracing::error!(error = %err, "database error"),
            AppError::Internal(msg) => tracing::error!(error = %msg, "internal error"),
            other => tracing::debug!(status = status.as_u16(), error = %other, "request rejected"),
        }

        let mut response = status.into_response();
        response.extensions_mut().insert(ErrorReport {
            message: self.label(),
            details: self.details(),
        });
        response
    }
}
