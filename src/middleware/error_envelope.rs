//! Uniform error body middleware.
//!
//! Wraps the whole router. Every 4xx/5xx response leaving the service is
//! rewritten into an [`ErrorResponse`] carrying the request path. Errors
//! raised by handlers arrive with an [`ErrorReport`] extension; errors axum
//! produces itself (unknown route, rejected JSON or path) keep their plain
//! text as `errorDetails`.

use axum::{
    Json,
    body::to_bytes,
    extract::Request,
    middleware::Next,
    response::{IntoResponse, Response},
};
use chrono::Utc;

use crate::error::{ErrorReport, ErrorResponse, default_label, format_status};

/// Upper bound on a framework error body read back for `errorDetails`.
const MAX_DETAILS_BYTES: usize = 16 * 1024;

pub async fn error_envelope(request: Request, next: Next) -> Response {
    let uri = request.uri().path().to_owned();
    let response = next.run(request).await;

    let status = response.status();
    if !(status.is_client_error() || status.is_server_error()) {
        return response;
    }

    let (mut parts, body) = response.into_parts();
    let (message, details) = match parts.extensions.remove::<ErrorReport>() {
        Some(report) => (report.message, report.details),
        None => {
            let bytes = to_bytes(body, MAX_DETAILS_BYTES).await.unwrap_or_default();
            let text = String::from_utf8_lossy(&bytes).trim().to_string();
            let details = if text.is_empty() {
                status.canonical_reason().unwrap_or("Request failed").to_string()
            } else {
                text
            };
            (default_label(status), details)
        }
    };

    let body = ErrorResponse {
        uri,
        error_status: format_status(status),
        error_message: message.to_string(),
        error_details: details,
        timestamp: Utc::now(),
    };

    (status, Json(body)).into_response()
}
