//! User management HTTP handlers (ADMIN only).
//!
//! - POST /users - Create user
//! - GET /users - List users
//! - GET /users/{id} - Get user
//! - PUT /users/{id} - Update user profile
//! - DELETE /users/{id} - Delete user

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use uuid::Uuid;

use crate::{
    app::AppState,
    error::AppError,
    models::{
        auth::MessageResponse,
        user::{CreateUserRequest, UpdateUserRequest, UserResponse},
    },
    services::user_service,
};

/// Create a new user.
///
/// # Response
///
/// - **Success (201 Created)**: Returns the created user
/// - **Error (400)**: Invalid field or email already in use
pub async fn create_user(
    State(state): State<AppState>,
    Json(request): Json<CreateUserRequest>,
) -> Result<(StatusCode, Json<UserResponse>), AppError> {
    let user = user_service::create_user(&state.pool, request).await?;
    Ok((StatusCode::CREATED, Json(user.into())))
}

pub async fn list_users(State(state): State<AppState>) -> Result<Json<Vec<UserResponse>>, AppError> {
    let users = user_service::list_users(&state.pool).await?;
    Ok(Json(users.into_iter().map(Into::into).collect()))
}

pub async fn get_user(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
) -> Result<Json<UserResponse>, AppError> {
    let user = user_service::get_user(&state.pool, user_id).await?;
    Ok(Json(user.into()))
}

/// Update phone number, names or birth date.
pub async fn update_user(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
    Json(request): Json<UpdateUserRequest>,
) -> Result<Json<UserResponse>, AppError> {
    let user = user_service::update_user(&state.pool, user_id, request).await?;
    Ok(Json(user.into()))
}

/// Delete a user together with their cards.
pub async fn delete_user(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
) -> Result<Json<MessageResponse>, AppError> {
    user_service::delete_user(&state.pool, user_id).await?;
    Ok(Json(MessageResponse::new("User deleted")))
}
