// --- File: crates/medibook_common/src/error.rs ---
use std::fmt;
use thiserror::Error;

/// The base error type for request-level failures.
///
/// Crate-specific errors (`DbError`, `NotifyError`, reservation faults) convert
/// into this type at the HTTP boundary.
#[derive(Error, Debug)]
pub enum MedibookError {
    /// Error occurred during database operation
    #[error("Database error: {0}")]
    DatabaseError(String),

    /// A lock or pooled connection could not be acquired in time; safe to retry
    #[error("Contention timeout: {0}")]
    ContentionTimeout(String),

    /// Error occurred due to missing or invalid configuration
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Error occurred due to an internal error
    #[error("Internal error: {0}")]
    InternalError(String),
}

impl MedibookError {
    /// Stable machine-readable code for this error.
    pub fn code(&self) -> &'static str {
        match self {
            MedibookError::DatabaseError(_) => "STORAGE_ERROR",
            MedibookError::ContentionTimeout(_) => "CONTENTION_TIMEOUT",
            MedibookError::ConfigError(_) => "CONFIG_ERROR",
            MedibookError::InternalError(_) => "INTERNAL_ERROR",
        }
    }

    /// Whether a caller may retry the same request unchanged.
    pub fn is_retryable(&self) -> bool {
        matches!(self, MedibookError::ContentionTimeout(_))
    }
}

/// A trait for converting errors to HTTP status codes.
pub trait HttpStatusCode {
    /// Returns the HTTP status code for this error.
    fn status_code(&self) -> u16;
}

impl HttpStatusCode for MedibookError {
    fn status_code(&self) -> u16 {
        match self {
            MedibookError::DatabaseError(_) => 500,
            MedibookError::ContentionTimeout(_) => 503,
            MedibookError::ConfigError(_) => 500,
            MedibookError::InternalError(_) => 500,
        }
    }
}

/// A trait for adding context to errors.
pub trait Context<T, E> {
    /// Adds context to an error.
    fn context<C>(self, context: C) -> Result<T, MedibookError>
    where
        C: fmt::Display + Send + Sync + 'static;

    /// Adds context to an error with a lazy context provider.
    fn with_context<C, F>(self, f: F) -> Result<T, MedibookError>
    where
        C: fmt::Display + Send + Sync + 'static,
        F: FnOnce() -> C;
}

impl<T, E: std::error::Error + Send + Sync + 'static> Context<T, E> for Result<T, E> {
    fn context<C>(self, context: C) -> Result<T, MedibookError>
    where
        C: fmt::Display + Send + Sync + 'static,
    {
        self.map_err(|error| internal_error(format!("{}: {}", context, error)))
    }

    fn with_context<C, F>(self, f: F) -> Result<T, MedibookError>
    where
        C: fmt::Display + Send + Sync + 'static,
        F: FnOnce() -> C,
    {
        self.map_err(|error| internal_error(format!("{}: {}", f(), error)))
    }
}

pub fn config_error<T: fmt::Display>(message: T) -> MedibookError {
    MedibookError::ConfigError(message.to_string())
}

pub fn internal_error<T: fmt::Display>(message: T) -> MedibookError {
    MedibookError::InternalError(message.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(
            MedibookError::ContentionTimeout("slot 1/2025-05-05/T1".into()).status_code(),
            503
        );
        assert_eq!(
            MedibookError::DatabaseError("disk full".into()).status_code(),
            500
        );
        assert_eq!(config_error("missing [server]").status_code(), 500);
    }

    #[test]
    fn test_only_contention_is_retryable() {
        assert!(MedibookError::ContentionTimeout("x".into()).is_retryable());
        assert!(!MedibookError::DatabaseError("x".into()).is_retryable());
        assert!(!config_error("x").is_retryable());
    }

    #[test]
    fn test_context_wraps_source() {
        let result: Result<(), std::io::Error> = Err(std::io::Error::new(
            std::io::ErrorKind::AddrInUse,
            "address in use",
        ));
        let err = result.context("binding listener").unwrap_err();
        assert_eq!(err.code(), "INTERNAL_ERROR");
        assert!(err.to_string().contains("binding listener: address in use"));
    }

    #[test]
    fn test_with_context_is_lazy() {
        let ok: Result<u8, std::io::Error> = Ok(1);
        let value = ok
            .with_context(|| -> String { panic!("context built for a success") })
            .unwrap();
        assert_eq!(value, 1);
    }

    #[test]
    fn test_config_error_code() {
        let err = config_error("missing file");
        assert_eq!(err.code(), "CONFIG_ERROR");
        assert_eq!(err.to_string(), "Configuration error: missing file");
    }
}
