//! Data models representing database entities and API payloads.

/// Login and token payloads
pub mod auth;
/// Bank card model and transfer rules
pub mod card;
/// User model and roles
pub mod user;
