//! Common error types for the fleet service

use thiserror::Error;

/// Common result type for fleet operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error taxonomy shared by the store and the HTTP layer
#[derive(Error, Debug)]
pub enum Error {
    /// Database operation error (wraps sqlx::Error)
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Requested resource not found
    #[error("{0} not found")]
    NotFound(String),

    /// Missing or malformed field, unknown role or type tag
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Session missing, unknown or past its expiry
    #[error("Unauthenticated: {0}")]
    Unauthenticated(String),

    /// Caller's role does not grant the requested capability
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Internal server error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Shorthand for an InvalidInput error
    pub fn invalid(msg: impl Into<String>) -> Self {
        Error::InvalidInput(msg.into())
    }

    /// Shorthand for a NotFound error naming the entity and id
    pub fn not_found(kind: &str, id: &str) -> Self {
        Error::NotFound(format!("{} {}", kind, id))
    }
}
