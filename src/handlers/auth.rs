//! Authentication HTTP handlers.
//!
//! - POST /auth/login - Exchange credentials for a token pair
//! - POST /auth/refresh - Re-issue a token pair
//!
//! Both routes are public; they sit outside the JWT middleware.

use axum::{Json, extract::State};

use crate::{
    app::AppState,
    error::AppError,
    models::auth::{AuthResponse, LoginRequest},
    services::auth_service,
};

/// Log in with email and password.
///
/// # Response
///
/// - **Success (200 OK)**: `{token, refreshToken, email, role, fullName}`
/// - **Error (401)**: Invalid credentials
pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<AuthResponse>, AppError> {
    let response = auth_service::login(&state.pool, &state.tokens, request).await?;
    Ok(Json(response))
}

/// Issue a new token pair for the same credentials.
pub async fn refresh(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<AuthResponse>, AppError> {
    let response = auth_service::refresh(&state.pool, &state.tokens, request).await?;
    Ok(Json(response))
}
