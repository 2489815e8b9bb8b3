//! Bank Cards Service - Main Application Entry Point
//!
//! REST API for issuing and managing bank cards. Administrators manage users
//! and cards; card holders view their own cards, request blocks and move
//! money between cards.
//!
//! # Architecture
//!
//! - **Web Framework**: Axum (async HTTP server)
//! - **Database**: PostgreSQL with sqlx (async queries)
//! - **Authentication**: HS256 JWT bearer tokens with ADMIN/USER roles
//! - **Format**: JSON requests/responses
//!
//! # Startup Flow
//!
//! 1. Load configuration from environment variables
//! 2. Create database connection pool
//! 3. Run database migrations
//! 4. Seed the bootstrap administrator, if configured
//! 5. Build HTTP router with routes and middleware
//! 6. Start server on configured port

mod app;
mod config;
mod db;
mod error;
mod handlers;
mod middleware;
mod models;
mod services;

use chrono::Duration;
use tracing_subscriber::EnvFilter;

use crate::{config::LogFormat, services::token_service::TokenService};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = config::Config::from_env()?;

    // Reads RUST_LOG (defaults to "info" level)
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into());
    match config.log_format {
        LogFormat::Pretty => tracing_subscriber::fmt().with_env_filter(filter).init(),
        LogFormat::Json => tracing_subscriber::fmt().json().with_env_filter(filter).init(),
    }
    tracing::info!("Configuration loaded");

    let pool = db::create_pool(&config.database_url, config.database_max_connections).await?;
    tracing::info!("Database pool created");

    db::run_migrations(&pool).await?;
    tracing::info!("Database migrations complete");

    if let Some((email, password)) = config.bootstrap_admin() {
        services::user_service::ensure_admin(&pool, email, password).await?;
    }

    let tokens = TokenService::new(
        &config.jwt_secret,
        Duration::seconds(config.jwt_access_ttl_secs),
        Duration::seconds(config.jwt_refresh_ttl_secs),
    );
    let app = app::router(app::AppState::new(pool, tokens));

    let addr = format!("0.0.0.0:{}", config.server_port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
