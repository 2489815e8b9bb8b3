//! Authentication request/response types.

use serde::{Deserialize, Serialize};

use crate::models::user::Role;

/// Request body for `POST /auth/login` and `POST /auth/refresh`.
///
/// ```json
/// {
///   "email": "john.smith@example.com",
///   "password": "user123"
/// }
/// ```
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Token pair plus the identity it was issued for.
///
/// ```json
/// {
///   "token": "eyJhbGciOiJIUzI1NiIs...",
///   "refreshToken": "eyJhbGciOiJIUzI1NiIs...",
///   "email": "john.smith@example.com",
///   "role": "USER",
///   "fullName": "John Smith"
/// }
/// ```
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    pub token: String,
    pub refresh_token: String,
    pub email: String,
    pub role: Role,
    pub full_name: String,
}

/// Plain confirmation body, used for transfers and deletions.
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}
