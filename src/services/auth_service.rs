//! Authentication service - credential checks and token pair issuance.

use crate::{
    db::DbPool,
    error::AppError,
    models::auth::{AuthResponse, LoginRequest},
    services::{password, token_service::TokenService, user_service},
};

/// Verify credentials and issue a fresh access/refresh pair.
///
/// Unknown email and wrong password are indistinguishable to the caller.
pub async fn login(
    pool: &DbPool,
    tokens: &TokenService,
    request: LoginRequest,
) -> Result<AuthResponse, AppError> {
    tracing::info!("Attempting to log in user");

    let user = user_service::find_by_email(pool, &request.email)
        .await?
        .ok_or_else(invalid_credentials)?;

    if !password::verify(request.password, user.password_hash.clone()).await? {
        tracing::warn!(user_id = %user.id, "invalid credentials");
        return Err(invalid_credentials());
    }

    let pair = tokens.issue(&user)?;
    tracing::info!(user_id = %user.id, "issued tokens");

    Ok(AuthResponse {
        token: pair.access_token,
        refresh_token: pair.refresh_token,
        full_name: user.full_name(),
        email: user.email,
        role: user.role,
    })
}

/// Re-issue a token pair. Takes the same credentials as [`login`].
pub async fn refresh(
    pool: &DbPool,
    tokens: &TokenService,
    request: LoginRequest,
) -> Result<AuthResponse, AppError> {
    login(pool, tokens, request).await
}

fn invalid_credentials() -> AppError {
    AppError::InvalidCredentials("Invalid email or password".to_string())
}
