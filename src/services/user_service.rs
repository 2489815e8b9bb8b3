//! User service - account management for administrators.
//!
//! This service handles:
//! - Field validation for create/update requests
//! - Password hashing before storage
//! - Existence checks ahead of updates and hard deletes
//! - Bootstrapping the first administrator

use chrono::{NaiveDate, Utc};
use uuid::Uuid;

use crate::{
    db::DbPool,
    error::AppError,
    models::user::{CreateUserRequest, Role, UpdateUserRequest, User},
    services::password,
};

const USER_COLUMNS: &str = "id, email, phone_number, password_hash, first_name, last_name, \
                            role, birth_date, created_at, updated_at";

const MAX_NAME_LEN: usize = 50;

/// Create a new user.
///
/// # Errors
///
/// - `BadRequest`: invalid field or email already in use
/// - `Database`: Database error occurred
pub async fn create_user(pool: &DbPool, request: CreateUserRequest) -> Result<User, AppError> {
    let email = request.email.trim().to_lowercase();
    validate_email(&email)?;
    validate_non_blank("Phone number", &request.phone_number)?;
    if request.password.trim().is_empty() {
        return Err(AppError::bad_request("Password is required"));
    }
    validate_name("First name", &request.first_name)?;
    validate_name("Last name", &request.last_name)?;
    validate_birth_date(request.birth_date, Utc::now().date_naive())?;

    if find_by_email(pool, &email).await?.is_some() {
        return Err(AppError::bad_request("Email is already in use"));
    }

    let password_hash = password::hash(request.password).await?;

    let user = sqlx::query_as::<_, User>(&format!(
        r#"
        INSERT INTO users (email, phone_number, password_hash, first_name, last_name, role, birth_date)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        RETURNING {USER_COLUMNS}
        "#
    ))
    .bind(&email)
    .bind(request.phone_number.trim())
    .bind(&password_hash)
    .bind(request.first_name.trim())
    .bind(request.last_name.trim())
    .bind(request.role.as_str())
    .bind(request.birth_date)
    .fetch_one(pool)
    .await
    .map_err(|err| match err {
        // Lost a race against a concurrent insert of the same email
        sqlx::Error::Database(ref db) if db.is_unique_violation() => {
            AppError::bad_request("Email is already in use")
        }
        other => AppError::Database(other),
    })?;

    tracing::info!(user_id = %user.id, role = %user.role, "user created");
    Ok(user)
}

/// List every user, oldest first.
pub async fn list_users(pool: &DbPool) -> Result<Vec<User>, AppError> {
    let users = sqlx::query_as::<_, User>(&format!(
        "SELECT {USER_COLUMNS} FROM users ORDER BY created_at"
    ))
    .fetch_all(pool)
    .await?;

    Ok(users)
}

/// Get user by ID, or `NotFound`.
pub async fn get_user(pool: &DbPool, user_id: Uuid) -> Result<User, AppError> {
    sqlx::query_as::<_, User>(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1"))
        .bind(user_id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| AppError::not_found(format!("User with id {} not found", user_id)))
}

/// Look up a user by email (case-insensitive).
pub async fn find_by_email(pool: &DbPool, email: &str) -> Result<Option<User>, AppError> {
    let user = sqlx::query_as::<_, User>(&format!(
        "SELECT {USER_COLUMNS} FROM users WHERE email = $1"
    ))
    .bind(email.trim().to_lowercase())
    .fetch_optional(pool)
    .await?;

    Ok(user)
}

/// Update the mutable profile fields of a user.
///
/// Fields absent from the request keep their stored value.
pub async fn update_user(
    pool: &DbPool,
    user_id: Uuid,
    request: UpdateUserRequest,
) -> Result<User, AppError> {
    if let Some(ref phone) = request.phone_number {
        validate_non_blank("Phone number", phone)?;
    }
    if let Some(ref first_name) = request.first_name {
        validate_name("First name", first_name)?;
    }
    if let Some(ref last_name) = request.last_name {
        validate_name("Last name", last_name)?;
    }
    if let Some(birth_date) = request.birth_date {
        validate_birth_date(birth_date, Utc::now().date_naive())?;
    }

    let user = sqlx::query_as::<_, User>(&format!(
        r#"
        UPDATE users
        SET phone_number = COALESCE($2, phone_number),
            first_name = COALESCE($3, first_name),
            last_name = COALESCE($4, last_name),
            birth_date = COALESCE($5, birth_date),
            updated_at = NOW()
        WHERE id = $1
        RETURNING {USER_COLUMNS}
        "#
    ))
    .bind(user_id)
    .bind(request.phone_number.as_deref().map(str::trim))
    .bind(request.first_name.as_deref().map(str::trim))
    .bind(request.last_name.as_deref().map(str::trim))
    .bind(request.birth_date)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| AppError::not_found(format!("User with id {} not found", user_id)))?;

    tracing::info!(user_id = %user.id, "user updated");
    Ok(user)
}

/// Hard-delete a user and, through the foreign key, their cards.
pub async fn delete_user(pool: &DbPool, user_id: Uuid) -> Result<(), AppError> {
    let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM users WHERE id = $1)")
        .bind(user_id)
        .fetch_one(pool)
        .await?;

    if !exists {
        return Err(AppError::not_found(format!(
            "User with id {} not found",
            user_id
        )));
    }

    sqlx::query("DELETE FROM users WHERE id = $1")
        .bind(user_id)
        .execute(pool)
        .await?;

    tracing::info!(%user_id, "user deleted");
    Ok(())
}

/// Create an administrator with the given credentials unless the email is taken.
pub async fn ensure_admin(pool: &DbPool, email: &str, password: &str) -> Result<(), AppError> {
    if find_by_email(pool, email).await?.is_some() {
        tracing::debug!("bootstrap admin already present");
        return Ok(());
    }

    let birth_date = NaiveDate::from_ymd_opt(1970, 1, 1)
        .ok_or_else(|| AppError::Internal("invalid bootstrap birth date".to_string()))?;

    create_user(
        pool,
        CreateUserRequest {
            email: email.to_string(),
            phone_number: "-".to_string(),
            password: password.to_string(),
            first_name: "System".to_string(),
            last_name: "Administrator".to_string(),
            role: Role::Admin,
            birth_date,
        },
    )
    .await?;

    tracing::info!("bootstrap admin created");
    Ok(())
}

fn validate_email(email: &str) -> Result<(), AppError> {
    let valid = match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.is_empty()
                && !domain.contains('@')
                && !email.chars().any(char::is_whitespace)
        }
        None => false,
    };

    if valid {
        Ok(())
    } else {
        Err(AppError::bad_request("Invalid email format"))
    }
}

fn validate_non_blank(field: &str, value: &str) -> Result<(), AppError> {
    if value.trim().is_empty() {
        return Err(AppError::bad_request(format!("{} is required", field)));
    }
    Ok(())
}

fn validate_name(field: &str, value: &str) -> Result<(), AppError> {
    let len = value.trim().chars().count();
    if len == 0 || len > MAX_NAME_LEN {
        return Err(AppError::bad_request(format!(
            "{} must be between 1 and {} characters",
            field, MAX_NAME_LEN
        )));
    }
    Ok(())
}

fn validate_birth_date(birth_date: NaiveDate, today: NaiveDate) -> Result<(), AppError> {
    if birth_date >= today {
        return Err(AppError::bad_request("Birth date must be in the past"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_plain_emails() {
        assert!(validate_email("user@example.com").is_ok());
        assert!(validate_email("first.last@sub.example.org").is_ok());
    }

    #[test]
    fn rejects_malformed_emails() {
        for email in ["", "user", "@example.com", "user@", "a@b@c", "us er@example.com"] {
            assert!(validate_email(email).is_err(), "{} should be rejected", email);
        }
    }

    #[test]
    fn enforces_name_length() {
        assert!(validate_name("First name", "Ivan").is_ok());
        assert!(validate_name("First name", "   ").is_err());
        assert!(validate_name("First name", &"x".repeat(51)).is_err());
        assert!(validate_name("First name", &"я".repeat(50)).is_ok());
    }

    #[test]
    fn birth_date_must_be_in_the_past() {
        let today = NaiveDate::from_ymd_opt(2025, 6, 1).unwrap();

        assert!(validate_birth_date(NaiveDate::from_ymd_opt(1990, 1, 15).unwrap(), today).is_ok());
        assert!(validate_birth_date(today, today).is_err());
        assert!(validate_birth_date(NaiveDate::from_ymd_opt(2030, 1, 1).unwrap(), today).is_err());
    }
}
