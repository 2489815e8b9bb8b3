//! Application configuration management.
//!
//! This module handles loading configuration from environment variables.
//! It uses the `envy` crate to automatically deserialize environment variables into a type-safe struct.

use serde::Deserialize;

/// Application configuration loaded from environment variables.
///
/// # Environment Variables
///
/// - `DATABASE_URL` (required): PostgreSQL connection string
/// - `JWT_SECRET` (required): shared HMAC-SHA256 signing secret
/// - `SERVER_PORT` (optional): HTTP server port, defaults to 3000
/// - `DATABASE_MAX_CONNECTIONS` (optional): pool size, defaults to 5
/// - `JWT_ACCESS_TTL_SECS` / `JWT_REFRESH_TTL_SECS` (optional): token lifetimes
/// - `LOG_FORMAT` (optional): `pretty` or `json`
/// - `BOOTSTRAP_ADMIN_EMAIL` / `BOOTSTRAP_ADMIN_PASSWORD` (optional): first admin account
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub database_url: String,

    pub jwt_secret: String,

    #[serde(default = "default_port")]
    pub server_port: u16,

    #[serde(default = "default_max_connections")]
    pub database_max_connections: u32,

    #[serde(default = "default_access_ttl")]
    pub jwt_access_ttl_secs: i64,

    #[serde(default = "default_refresh_ttl")]
    pub jwt_refresh_ttl_secs: i64,

    #[serde(default)]
    pub log_format: LogFormat,

    pub bootstrap_admin_email: Option<String>,

    pub bootstrap_admin_password: Option<String>,
}

/// Output format of the tracing subscriber.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Default port if SERVER_PORT environment variable is not set.
fn default_port() -> u16 {
    3000
}

fn default_max_connections() -> u32 {
    5
}

/// One hour.
fn default_access_ttl() -> i64 {
    60 * 60
}

/// Seven days.
fn default_refresh_ttl() -> i64 {
    7 * 24 * 60 * 60
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// This method first attempts to load a `.env` file (which is optional),
    /// then reads environment variables and deserializes them into a Config struct.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Required environment variables are missing (e.g., DATABASE_URL, JWT_SECRET)
    /// - Environment variable values cannot be parsed into expected types
    pub fn from_env() -> Result<Self, envy::Error> {
        // Try to load .env file if it exists (does nothing if not found)
        dotenvy::dotenv().ok();

        envy::from_env::<Config>()
    }

    /// Returns the bootstrap admin credentials when both halves are configured.
    pub fn bootstrap_admin(&self) -> Option<(&str, &str)> {
        match (&self.bootstrap_admin_email, &self.bootstrap_admin_password) {
            (Some(email), Some(password)) if !email.is_empty() && !password.is_empty() => {
                Some((email.as_str(), password.as_str()))
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn from_pairs(pairs: &[(&str, &str)]) -> Result<Config, envy::Error> {
        envy::from_iter(
            pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string())),
        )
    }

    #[test]
    fn applies_defaults_for_optional_values() {
        let config = from_pairs(&[
            ("DATABASE_URL", "postgres://localhost/bank"),
            ("JWT_SECRET", "secret"),
        ])
        .unwrap();

        assert_eq!(config.server_port, 3000);
        assert_eq!(config.database_max_connections, 5);
        assert_eq!(config.jwt_access_ttl_secs, 3600);
        assert_eq!(config.jwt_refresh_ttl_secs, 604_800);
        assert_eq!(config.log_format, LogFormat::Pretty);
        assert!(config.bootstrap_admin().is_none());
    }

    #[test]
    fn reads_overrides() {
        let config = from_pairs(&[
            ("DATABASE_URL", "postgres://localhost/bank"),
            ("JWT_SECRET", "secret"),
            ("SERVER_PORT", "8080"),
            ("LOG_FORMAT", "json"),
            ("BOOTSTRAP_ADMIN_EMAIL", "admin@example.com"),
            ("BOOTSTRAP_ADMIN_PASSWORD", "pa55word"),
        ])
        .unwrap();

        assert_eq!(config.server_port, 8080);
        assert_eq!(config.log_format, LogFormat::Json);
        assert_eq!(
            config.bootstrap_admin(),
            Some(("admin@example.com", "pa55word"))
        );
    }

    #[test]
    fn missing_secret_is_an_error() {
        assert!(from_pairs(&[("DATABASE_URL", "postgres://localhost/bank")]).is_err());
    }
}
