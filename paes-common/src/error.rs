//! Common error types for PAES services

use thiserror::Error;

/// Common result type for PAES operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error types across PAES services
#[derive(Error, Debug)]
pub enum Error {
    /// Database operation error (wraps sqlx::Error)
    #[cfg(feature = "sqlx")]
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Requested row not found in the backing store
    #[error("Not found: {0}")]
    NotFound(String),

    /// Invalid input record or request parameter
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Stable machine-readable code, mirrored in API error bodies
    pub fn code(&self) -> &'static str {
        match self {
            #[cfg(feature = "sqlx")]
            Error::Database(sqlx::Error::RowNotFound) => "NO_ROWS",
            #[cfg(feature = "sqlx")]
            Error::Database(_) => "DATABASE_ERROR",
            Error::Io(_) => "IO_ERROR",
            Error::Config(_) => "CONFIG_ERROR",
            Error::NotFound(_) => "NO_ROWS",
            Error::InvalidInput(_) => "INVALID_INPUT",
            Error::Internal(_) => "INTERNAL_ERROR",
        }
    }
}
