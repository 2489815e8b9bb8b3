//! HTTP request handlers (route handlers).
//!
//! Each handler is an async function that:
//! 1. Receives HTTP request data (JSON body, URL params, caller principal)
//! 2. Delegates to the matching service
//! 3. Returns HTTP response (JSON, status code)

/// Login and token refresh
pub mod auth;
/// Card administration, listings, block requests and transfers
pub mod cards;
/// Health check
pub mod health;
/// User administration
pub mod users;
