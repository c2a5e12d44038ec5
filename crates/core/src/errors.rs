//! Core error types for the chainprice application.
//!
//! This module defines database-agnostic error types. Storage-specific
//! errors (from Diesel, SQLite, etc.) are converted to these types by the
//! storage layer; provider errors are converted at the fetch seam.

use thiserror::Error;

use chainprice_providers::{Network, ProviderError};

/// Type alias for Result using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Root error type for the price service.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Database operation failed: {0}")]
    Database(#[from] DatabaseError),

    #[error("Input validation failed: {0}")]
    Validation(#[from] ValidationError),

    /// No price could be resolved for the query. Recoverable by the
    /// caller: retry later, or after scheduling a backfill.
    #[error("No price found for {token} on {network} at {timestamp}")]
    PriceNotFound {
        token: String,
        network: Network,
        timestamp: i64,
    },

    /// An upstream provider's quota is exhausted. Distinct from
    /// `PriceNotFound`: nothing was learned about the token, and further
    /// requests would only burn more quota.
    #[error("Provider quota exhausted: {provider}")]
    QuotaExceeded { provider: String },

    /// A provider operation failed in a way the fallback chain could not
    /// absorb (e.g. token creation discovery).
    #[error("Provider failure: {0}")]
    Provider(String),

    #[error("Backfill job not found: {0}")]
    JobNotFound(String),

    #[error("Unexpected error: {0}")]
    Unexpected(String),
}

/// Database-agnostic error type for storage operations.
///
/// Uses `String` for all error details, allowing the storage layer to
/// convert storage-specific errors (Diesel, SQLite, etc.) into this
/// format.
#[derive(Error, Debug)]
pub enum DatabaseError {
    /// Failed to establish a database connection.
    #[error("Failed to connect to database: {0}")]
    ConnectionFailed(String),

    /// Failed to create or configure the connection pool.
    #[error("Failed to create database pool: {0}")]
    PoolCreationFailed(String),

    /// A database query failed to execute.
    #[error("Database query failed: {0}")]
    QueryFailed(String),

    /// The requested record was not found.
    #[error("Record not found: {0}")]
    NotFound(String),

    /// A unique constraint was violated (e.g., duplicate key).
    #[error("Unique constraint violation: {0}")]
    UniqueViolation(String),

    /// Database migration failed.
    #[error("Database migration failed: {0}")]
    MigrationFailed(String),

    /// Internal/unexpected database error.
    #[error("Internal database error: {0}")]
    Internal(String),
}

/// Validation errors for user input.
#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Required field '{0}' is missing")]
    MissingField(String),
}

impl From<ProviderError> for Error {
    fn from(err: ProviderError) -> Self {
        match err {
            ProviderError::QuotaExhausted { provider } => Error::QuotaExceeded { provider },
            other => Error::Provider(other.to_string()),
        }
    }
}

impl From<Error> for String {
    fn from(err: Error) -> Self {
        err.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quota_error_converts_distinctly() {
        let err: Error = ProviderError::QuotaExhausted {
            provider: "ALCHEMY".to_string(),
        }
        .into();
        assert!(matches!(err, Error::QuotaExceeded { .. }));
    }

    #[test]
    fn test_transient_provider_error_converts_to_provider() {
        let err: Error = ProviderError::Provider {
            provider: "ALCHEMY".to_string(),
            message: "HTTP 500".to_string(),
        }
        .into();
        assert!(matches!(err, Error::Provider(_)));
    }
}
