//! User data models and API request/response types.
//!
//! This module defines:
//! - `Role`: coarse permission tier carried in tokens
//! - `User`: database entity representing a card holder or administrator
//! - Request bodies for creating and updating users
//! - `UserResponse`: response body returned to clients

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Permission tier of a user.
///
/// Stored as `'ADMIN'` / `'USER'` text in the `users.role` column and
/// serialized the same way in JSON and JWT claims.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Role {
    Admin,
    User,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "ADMIN",
            Role::User => "USER",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when a stored role or status string is not a known variant.
#[derive(Debug, thiserror::Error)]
#[error("unknown {kind}: {value}")]
pub struct UnknownVariant {
    pub kind: &'static str,
    pub value: String,
}

impl FromStr for Role {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ADMIN" => Ok(Role::Admin),
            "USER" => Ok(Role::User),
            other => Err(UnknownVariant {
                kind: "role",
                value: other.to_string(),
            }),
        }
    }
}

impl TryFrom<String> for Role {
    type Error = UnknownVariant;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// Represents a user record from the database.
///
/// Maps to the `users` table. `password_hash` holds an argon2 PHC string and
/// never leaves the service.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub phone_number: String,
    pub password_hash: String,
    pub first_name: String,
    pub last_name: String,
    #[sqlx(try_from = "String")]
    pub role: Role,
    pub birth_date: NaiveDate,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// First and last name joined by a single space.
    pub fn full_name(&self) -> String {
        full_name(&self.first_name, &self.last_name)
    }
}

pub fn full_name(first_name: &str, last_name: &str) -> String {
    format!("{} {}", first_name, last_name)
}

/// Request body for `POST /users`.
///
/// ```json
/// {
///   "email": "user@example.com",
///   "phoneNumber": "+79991234567",
///   "password": "securePassword123",
///   "firstName": "Ivan",
///   "lastName": "Ivanov",
///   "role": "USER",
///   "birthDate": "1990-01-15"
/// }
/// ```
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserRequest {
    pub email: String,
    pub phone_number: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
    pub role: Role,
    pub birth_date: NaiveDate,
}

/// Request body for `PUT /users/{id}`.
///
/// Every field is optional; absent fields keep their stored value.
/// Email, role and password cannot be changed through this request.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUserRequest {
    pub phone_number: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub birth_date: Option<NaiveDate>,
}

/// Response body for user endpoints.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub id: Uuid,
    pub email: String,
    pub phone_number: String,
    pub first_name: String,
    pub last_name: String,
    pub role: Role,
    pub birth_date: NaiveDate,
    pub full_name: String,
}

/// Convert database User to API UserResponse (drops the password hash).
impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        let full_name = user.full_name();
        Self {
            id: user.id,
            email: user.email,
            phone_number: user.phone_number,
            first_name: user.first_name,
            last_name: user.last_name,
            role: user.role,
            birth_date: user.birth_date,
            full_name,
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn sample_user(email: &str, role: Role) -> User {
        User {
            id: Uuid::new_v4(),
            email: email.to_string(),
            phone_number: "+79991234567".to_string(),
            password_hash: String::new(),
            first_name: "Ivan".to_string(),
            last_name: "Petrov".to_string(),
            role,
            birth_date: NaiveDate::from_ymd_opt(1990, 1, 15).unwrap(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn derives_full_name() {
        let user = sample_user("ivan@example.com", Role::User);
        assert_eq!(user.full_name(), "Ivan Petrov");
    }

    #[test]
    fn parses_roles() {
        assert_eq!("ADMIN".parse::<Role>().unwrap(), Role::Admin);
        assert_eq!(Role::try_from("USER".to_string()).unwrap(), Role::User);
        assert!("admin".parse::<Role>().is_err());
    }

    #[test]
    fn response_omits_password_hash() {
        let mut user = sample_user("ivan@example.com", Role::Admin);
        user.password_hash = "$argon2id$secret".to_string();

        let json = serde_json::to_value(UserResponse::from(user)).unwrap();

        assert_eq!(json["role"], "ADMIN");
        assert_eq!(json["fullName"], "Ivan Petrov");
        assert_eq!(json["birthDate"], "1990-01-15");
        assert!(json.get("passwordHash").is_none());
    }
}
