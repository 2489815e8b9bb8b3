//! HTTP middleware components.
//!
//! Middleware are functions that run before route handlers.
//! They can:
//! - Authenticate requests
//! - Enforce roles
//! - Rewrite error responses
//! - Short-circuit requests (reject unauthorized)

/// JWT authentication and role gates
pub mod auth;
/// Uniform error body
pub mod error_envelope;

pub use error_envelope::error_envelope;
