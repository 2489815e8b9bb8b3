//! Business logic services.
//!
//! Services contain core business logic separated from HTTP handlers.
//! They handle database transactions, validation, and complex operations.

pub mod auth_service;
pub mod card_service;
pub mod password;
pub mod token_service;
pub mod user_service;
