//! Password hashing and verification utilities.
//!
//! Argon2 is CPU-bound by design. Request paths call the async wrappers,
//! which move the work onto tokio's blocking pool.

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};

use crate::error::AppError;

/// Hash a password on the blocking pool.
pub async fn hash(password: String) -> Result<String, AppError> {
    tokio::task::spawn_blocking(move || hash_password(&password))
        .await
        .map_err(|err| AppError::Internal(format!("Password hashing task failed: {}", err)))?
}

/// Verify a password against its stored hash on the blocking pool.
pub async fn verify(password: String, hash: String) -> Result<bool, AppError> {
    tokio::task::spawn_blocking(move || verify_password(&password, &hash))
        .await
        .map_err(|err| AppError::Internal(format!("Password verification task failed: {}", err)))
}

/// Hash a password using Argon2, returning a PHC string.
fn hash_password(password: &str) -> Result<String, AppError> {
    let salt = SaltString::generate(&mut OsRng);

    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|err| AppError::Internal(format!("Password hashing failed: {}", err)))
}

/// Verify a password against its stored hash.
///
/// An unparsable stored hash counts as a mismatch.
fn verify_password(password: &str, hash: &str) -> bool {
    let Ok(parsed_hash) = PasswordHash::new(hash) else {
        tracing::warn!("stored password hash is not a valid PHC string");
        return false;
    };

    Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_password_hashing() {
        let password = "test_password_123";
        let hash = hash_password(password).unwrap();

        assert!(hash.starts_with("$argon2"));
        assert!(verify_password(password, &hash));
        assert!(!verify_password("wrong_password", &hash));
    }

    #[test]
    fn salts_differ_between_hashes() {
        assert_ne!(hash_password("same").unwrap(), hash_password("same").unwrap());
    }

    #[test]
    fn garbage_hash_never_verifies() {
        assert!(!verify_password("anything", "not-a-phc-string"));
    }

    #[tokio::test]
    async fn blocking_pool_wrappers_round_trip() {
        let stored = hash("s3cret".to_string()).await.unwrap();

        assert!(verify("s3cret".to_string(), stored.clone()).await.unwrap());
        assert!(!verify("wrong".to_string(), stored).await.unwrap());
    }
}
