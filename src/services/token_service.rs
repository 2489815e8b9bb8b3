//! JWT issuance and validation.
//!
//! Tokens are HS256-signed with a shared secret. Access and refresh tokens
//! carry the same claims and differ only in lifetime and the `type` claim.

use chrono::{Duration, Utc};
use jsonwebtoken::{
    Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode, errors::ErrorKind,
};
use serde::{Deserialize, Serialize};

use crate::{
    error::AppError,
    models::user::{Role, User},
};

/// Seconds of clock skew tolerated when checking `exp`.
const LEEWAY_SECS: u64 = 10;

/// Which half of a token pair a token is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenType {
    Access,
    Refresh,
}

/// JWT claims structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user email)
    pub sub: String,
    pub role: Role,
    #[serde(rename = "fullName")]
    pub full_name: String,
    #[serde(rename = "type")]
    pub token_type: TokenType,
    /// Issued at (seconds since epoch)
    pub iat: i64,
    /// Expiration (seconds since epoch)
    pub exp: i64,
}

/// Freshly issued access/refresh pair.
#[derive(Debug, Clone)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

/// Issues and validates session tokens.
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    access_ttl: Duration,
    refresh_ttl: Duration,
}

impl TokenService {
    pub fn new(secret: &str, access_ttl: Duration, refresh_ttl: Duration) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            access_ttl,
            refresh_ttl,
        }
    }

    /// Issue an access and a refresh token for `user`.
    pub fn issue(&self, user: &User) -> Result<TokenPair, AppError> {
        Ok(TokenPair {
            access_token: self.sign(user, TokenType::Access, self.access_ttl)?,
            refresh_token: self.sign(user, TokenType::Refresh, self.refresh_ttl)?,
        })
    }

    fn sign(&self, user: &User, token_type: TokenType, ttl: Duration) -> Result<String, AppError> {
        let now = Utc::now();
        let claims = Claims {
            sub: user.email.clone(),
            role: user.role,
            full_name: user.full_name(),
            token_type,
            iat: now.timestamp(),
            exp: (now + ttl).timestamp(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key).map_err(|err| {
            tracing::error!("Error encoding token: {:?}", err);
            AppError::Internal("Failed to issue token".to_string())
        })
    }

    /// Decode and verify a token of either type.
    ///
    /// An expired token is an authentication error; every other failure
    /// (structure, signature, algorithm, claim shape) is a validation error.
    pub fn validate(&self, token: &str) -> Result<Claims, AppError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = LEEWAY_SECS;
        validation.validate_exp = true;

        decode::<Claims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(|err| {
                tracing::debug!("Error decoding token: {:?}", err);
                match err.kind() {
                    ErrorKind::ExpiredSignature => {
                        AppError::TokenAuthentication("Token has expired".to_string())
                    }
                    ErrorKind::InvalidSignature => {
                        AppError::TokenValidation("Token signature is invalid".to_string())
                    }
                    ErrorKind::InvalidAlgorithm => {
                        AppError::TokenValidation("Unsupported token algorithm".to_string())
                    }
                    _ => AppError::TokenValidation("Malformed token".to_string()),
                }
            })
    }

    /// Like [`TokenService::validate`], but only accepts access tokens.
    pub fn validate_access(&self, token: &str) -> Result<Claims, AppError> {
        let claims = self.validate(token)?;
        if claims.token_type != TokenType::Access {
            return Err(AppError::TokenAuthentication(
                "Refresh token cannot be used to access resources".to_string(),
            ));
        }
        Ok(claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::user::tests::sample_user;

    const SECRET: &str = "test_secret_key_that_is_long_enough_for_hs256";

    fn service() -> TokenService {
        TokenService::new(SECRET, Duration::minutes(15), Duration::days(7))
    }

    #[test]
    fn access_token_round_trips() {
        let user = sample_user("ivan@example.com", Role::User);
        let pair = service().issue(&user).unwrap();

        let claims = service().validate(&pair.access_token).unwrap();

        assert_eq!(claims.sub, user.email);
        assert_eq!(claims.role, Role::User);
        assert_eq!(claims.full_name, "Ivan Petrov");
        assert_eq!(claims.token_type, TokenType::Access);
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn refresh_token_lives_longer_and_is_typed() {
        let user = sample_user("admin@example.com", Role::Admin);
        let pair = service().issue(&user).unwrap();

        let access = service().validate(&pair.access_token).unwrap();
        let refresh = service().validate(&pair.refresh_token).unwrap();

        assert_eq!(refresh.token_type, TokenType::Refresh);
        assert_eq!(refresh.sub, access.sub);
        assert!(refresh.exp > access.exp);
    }

    #[test]
    fn refresh_token_is_not_an_access_token() {
        let user = sample_user("ivan@example.com", Role::User);
        let pair = service().issue(&user).unwrap();

        assert!(service().validate_access(&pair.access_token).is_ok());
        assert!(matches!(
            service().validate_access(&pair.refresh_token),
            Err(AppError::TokenAuthentication(_))
        ));
    }

    #[test]
    fn expired_token_is_an_authentication_error() {
        let expired = TokenService::new(SECRET, Duration::hours(-1), Duration::hours(-1));
        let user = sample_user("ivan@example.com", Role::User);
        let pair = expired.issue(&user).unwrap();

        assert!(matches!(
            service().validate(&pair.access_token),
            Err(AppError::TokenAuthentication(_))
        ));
    }

    #[test]
    fn foreign_signature_is_a_validation_error() {
        let other = TokenService::new(
            "a_completely_different_secret_value",
            Duration::minutes(15),
            Duration::days(7),
        );
        let user = sample_user("ivan@example.com", Role::User);
        let pair = other.issue(&user).unwrap();

        assert!(matches!(
            service().validate(&pair.access_token),
            Err(AppError::TokenValidation(_))
        ));
    }

    #[test]
    fn garbage_is_a_validation_error() {
        for token in ["", "invalid.jwt.token", "not-a-token-at-all"] {
            assert!(matches!(
                service().validate(token),
                Err(AppError::TokenValidation(_))
            ));
        }
    }
}
