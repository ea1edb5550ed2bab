//! Error types for the database layer

use thiserror::Error;

/// Errors that can occur when working with the store
#[derive(Debug, Error)]
pub enum DbError {
    /// Error with the database configuration
    #[error("Database configuration error: {0}")]
    ConfigError(String),

    /// Error with database URL parsing
    #[error("Database URL error: {0}")]
    UrlError(String),

    /// Error with database connection
    #[error("Database connection error: {0}")]
    ConnectionError(String),

    /// Error with database pool creation
    #[error("Database pool error: {0}")]
    PoolError(String),

    /// Error with database query
    #[error("Database query error: {0}")]
    QueryError(String),

    /// Error with database transaction
    #[error("Database transaction error: {0}")]
    TransactionError(String),

    /// A pooled connection or a row lock was not available in time
    #[error("Database timeout: {0}")]
    Timeout(String),

    /// A uniqueness constraint rejected the write
    #[error("Unique constraint violated: {0}")]
    UniqueViolation(String),

    /// A stored value could not be mapped onto the domain model
    #[error("Failed to decode stored value: {0}")]
    Decode(String),

    /// A slot capacity change was refused
    #[error("Invalid capacity: {0}")]
    InvalidCapacity(String),

    /// Other errors
    #[error("Other database error: {0}")]
    Other(String),
}

impl DbError {
    /// Transient failures a caller may retry.
    pub fn is_timeout(&self) -> bool {
        matches!(self, DbError::Timeout(_))
    }
}

// SQLITE_BUSY, SQLITE_LOCKED and their extended codes
const LOCK_CODES: &[&str] = &["5", "6", "261", "517"];

impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::PoolTimedOut => {
                DbError::Timeout("timed out acquiring a pooled connection".to_string())
            }
            sqlx::Error::PoolClosed => DbError::ConnectionError("pool is closed".to_string()),
            sqlx::Error::Database(db_err) => {
                let code = db_err.code();
                if db_err.is_unique_violation()
                    || db_err.message().contains("UNIQUE constraint failed")
                {
                    DbError::UniqueViolation(db_err.message().to_string())
                } else if code.as_deref().is_some_and(|c| LOCK_CODES.contains(&c)) {
                    DbError::Timeout(db_err.message().to_string())
                } else {
                    DbError::QueryError(db_err.message().to_string())
                }
            }
            sqlx::Error::ColumnDecode { .. } | sqlx::Error::Decode(_) => {
                DbError::Decode(err.to_string())
            }
            other => DbError::QueryError(other.to_string()),
        }
    }
}
