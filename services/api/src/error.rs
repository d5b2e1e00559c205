//! services/api/src/error.rs
//!
//! Errors that stop the `api` binary from starting or serving.

use crate::config::ConfigError;

/// Startup and runtime failures of the `api` service. Errors of individual
/// catalog requests are answered over HTTP instead, see `web::rest`.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Connecting the PostgreSQL pool failed.
    #[error("Database Error: {0}")]
    Database(#[from] sqlx::Error),

    /// Applying the catalog schema failed.
    #[error("Migration Error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// Binding the listener or serving failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Startup values that only turn out invalid when used, such as the CORS origin.
    #[error("An unexpected internal error occurred: {0}")]
    Internal(String),
}
